use std::fmt::{Error, Write};

pub use errors::{
    EngineError, ExecutionError, LexerError, ParserError, QueryEngineError, TraceError,
};
pub use executor::{values::Value, ExecutorContext, ExecutorOptions, ExecutorStack};

pub mod analysis;
pub mod api;
mod components;
mod constants;
mod errors;
mod executor;
pub mod form;
mod lexer;
mod parser;
pub mod query;
pub mod question;
pub mod trace;
pub mod tracer;
pub mod transform;
mod utils;

pub use components::program::Program;

use analysis::{CodeAnalysis, StaticAnalyser};
use tracer::StepTracer;

/// Parses `source` without executing it and returns its static structure.
pub fn analyse(source: &str) -> Result<CodeAnalysis, EngineError> {
    let tokens = lexer::lex(source).collect::<Result<Vec<_>, _>>()?;
    let program = parser::parse(&tokens).map_err(|err| {
        eprintln!("Error parsing script:");
        eprintln!(
            "{}",
            format_error(&err, source).expect("Unable to write error information")
        );
        return err;
    })?;
    return Ok(StaticAnalyser::analyse(&program));
}

/// Parses, instruments and executes `source`, returning the executor context
/// with the recorded trace.
pub fn trace(source: &str) -> Result<ExecutorContext, EngineError> {
    let result = StepTracer::new().trace(source);

    if let Err(EngineError::ExecutionError(err)) = &result {
        eprintln!("Error executing script: {err}");
        if let Some(call_stack) = &err.call_stack {
            let formatted_stack = call_stack
                .into_iter()
                .fold("@root".to_owned(), |a, b| format!("{b}\n{a}"));
            eprintln!("Call stack: \n{formatted_stack}");
        }
    }

    return result;
}

fn format_error(error: &ParserError, source_file: &str) -> Result<String, Error> {
    let mut result = String::new();

    if let Some(start) = &error.start {
        if let Some(end) = &error.end {
            writeln!(result, "Unexpected token at index {:}", start)?;

            let mut line = String::new();
            let mut underline_start = 0;

            for (index, char) in source_file.chars().enumerate() {
                if char == '\n' {
                    if index >= *end {
                        break;
                    }
                    line = String::new();
                    underline_start = start - index - 1;
                    continue;
                }

                line += &String::from(char);
            }

            let underline = " ".repeat(underline_start) + &"^".repeat(end - start);
            writeln!(result, "{line}")?;
            writeln!(result, "{underline}")?;
        }
    }

    writeln!(result, "{}", error.message)?;

    return Ok(result);
}
