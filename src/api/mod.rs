use serde::{Deserialize, Serialize};

use crate::{
    analysis::StaticAnalyser,
    errors::EngineError,
    form::{FormBuilder, FormSchema},
    lexer, parser,
    question::{
        models::{
            ExecutionSpec, GenerationOptions, OutputType, QuestionSpec, QuestionType, TargetElement,
        },
        QuestionGenerator,
    },
};

// Request and response shapes of the service boundary, plus the two entry
// points any transport (the CLI, an HTTP front door) calls into. The `code`
// field arrives escape-encoded and is decoded before parsing.

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyseCodeRequest {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AlgorithmInput {
    pub entry_function: String,
    pub test_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerateQuestionRequest {
    pub code: String,
    pub target: Vec<TargetElement>,
    pub output_type: OutputType,
    pub question_type: QuestionType,
    pub algorithm_input: AlgorithmInput,
    #[serde(default)]
    pub num_distractors: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateQuestionResponse {
    pub question: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_indices: Option<Vec<usize>>,
}

/// Decode-analyse-build: the static analysis form schema for some code.
pub fn analyse_code(request: &AnalyseCodeRequest) -> Result<FormSchema, EngineError> {
    let code = unescape_code(&request.code);
    let tokens = lexer::lex(&code).collect::<Result<Vec<_>, _>>()?;
    let program = parser::parse(&tokens)?;
    let analysis = StaticAnalyser::analyse(&program);
    return Ok(FormBuilder::new(analysis).build_form_schema());
}

/// Trace the code with the requested input, answer the compiled query, and
/// assemble the question.
pub fn generate_question(
    request: &GenerateQuestionRequest,
) -> Result<GenerateQuestionResponse, EngineError> {
    let code = unescape_code(&request.code);

    let question_spec = QuestionSpec {
        target: request.target.clone(),
        output_type: request.output_type,
        question_type: request.question_type,
    };
    let execution_spec = ExecutionSpec {
        entry_function: request.algorithm_input.entry_function.clone(),
        test_data: request.algorithm_input.test_data.clone(),
    };
    let generation_options = match request.num_distractors {
        Some(num_distractors) => GenerationOptions { num_distractors },
        None => GenerationOptions::default(),
    };

    let question = QuestionGenerator::new().generate_question(
        &code,
        &question_spec,
        &execution_spec,
        &generation_options,
    )?;

    return Ok(GenerateQuestionResponse {
        question: question.text,
        answer: question.answer,
        options: question.options,
        correct_indices: question.correct_indices,
    });
}

/// Reverses the transport escaping of the `code` field: `\n`, `\t`, `\r`,
/// `\"` and `\\` become the characters they name. Unknown escapes are kept
/// verbatim.
pub fn unescape_code(code: &str) -> String {
    let mut result = String::with_capacity(code.len());
    let mut characters = code.chars();

    while let Some(character) = characters.next() {
        if character != '\\' {
            result.push(character);
            continue;
        }
        match characters.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    return result;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_unescape_transport_encoded_code() {
        assert_eq!(unescape_code("x = 1;\\ny = 2;"), "x = 1;\ny = 2;");
        assert_eq!(unescape_code("s = \\\"hi\\\";"), "s = \"hi\";");
        assert_eq!(unescape_code("a\\\\b"), "a\\b");
        assert_eq!(unescape_code("plain"), "plain");
    }

    #[test]
    fn analyse_code_should_return_a_form_schema() {
        let request = AnalyseCodeRequest {
            code: "for i in range(3) {\\n  x = i;\\n}".to_owned(),
        };
        let schema = analyse_code(&request).unwrap();
        assert_eq!(schema.code_info.loops.len(), 1);
        assert!(schema.code_info.variables.contains(&"x".to_owned()));
    }

    #[test]
    fn analyse_code_should_reject_invalid_source() {
        let request = AnalyseCodeRequest {
            code: "for for for".to_owned(),
        };
        assert!(analyse_code(&request).is_err());
    }

    #[test]
    fn generate_question_should_answer_end_to_end() {
        let request: GenerateQuestionRequest = serde_json::from_value(serde_json::json!({
            "code": "func f(a, b) {\\n  return a + b;\\n}",
            "target": [{"type": "function", "name": "f", "modifier": "return_value"}],
            "output_type": "list",
            "question_type": "short_answer",
            "algorithm_input": {
                "entry_function": "f",
                "test_data": {"a": 3, "b": 4}
            }
        }))
        .unwrap();

        let response = generate_question(&request).unwrap();
        assert_eq!(response.answer, "[7]");
        assert!(response.options.is_none());
    }
}
