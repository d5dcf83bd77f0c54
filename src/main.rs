use std::{env, error::Error, fs, path::PathBuf};

use quizgen::api::{
    analyse_code, generate_question, AnalyseCodeRequest, GenerateQuestionRequest,
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = get_args()?;

    match args {
        Arguments::Analyse { script_path } => {
            let code = fs::read_to_string(script_path)?;
            let schema = analyse_code(&AnalyseCodeRequest { code })?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Arguments::Generate {
            script_path,
            spec_path,
        } => {
            let code = fs::read_to_string(script_path)?;
            let mut request: serde_json::Value =
                serde_json::from_str(&fs::read_to_string(spec_path)?)?;

            let Some(request_fields) = request.as_object_mut() else {
                return Err("Question spec file must contain a JSON object".into());
            };
            request_fields.insert("code".to_owned(), serde_json::Value::String(code));

            let request: GenerateQuestionRequest = serde_json::from_value(request)?;
            let response = generate_question(&request)?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    return Ok(());
}

enum Arguments {
    Analyse { script_path: PathBuf },
    Generate { script_path: PathBuf, spec_path: PathBuf },
}

fn get_args() -> Result<Arguments, Box<dyn Error>> {
    let args = env::args().collect::<Vec<_>>();

    return match args.as_slice() {
        [_, flag, script] if flag == "--analyse" => Ok(Arguments::Analyse {
            script_path: PathBuf::from(script),
        }),
        [_, script, spec] => Ok(Arguments::Generate {
            script_path: PathBuf::from(script),
            spec_path: PathBuf::from(spec),
        }),
        _ => Err("Usage: quizgen --analyse <script> | quizgen <script> <spec.json>".into()),
    };
}
