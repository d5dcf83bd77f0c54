use serde::Serialize;

use crate::{
    errors::{EngineError, ExecutionError},
    executor::{ExecutorContext, ExecutorStack},
    lexer::Token,
    utils::iterators::Backtrackable,
    ParserError,
};

use super::{
    class::ClassDeclaration, function::Function, statement::Statement, ControlFlowOptions,
    EvaluationException,
};

/// A parsed program: top-level statements plus function and class
/// declarations. Declarations are hoisted, so statements may call functions
/// defined later in the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub functions: Vec<Function>,
    pub classes: Vec<ClassDeclaration>,
}

impl Program {
    pub fn parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Self, ParserError> {
        let mut statements = Vec::new();
        let mut functions = Vec::new();
        let mut classes = Vec::new();

        loop {
            let token = tokens.peek();
            if token.is_none() {
                break;
            }

            if let Some(function) = Function::try_parse(tokens)? {
                functions.push(function);
            } else if let Some(class) = ClassDeclaration::try_parse(tokens)? {
                classes.push(class);
            } else {
                statements.push(Statement::parse(tokens)?);
            }
        }

        return Ok(Self {
            statements,
            functions,
            classes,
        });
    }

    pub fn execute(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> Result<(), EngineError> {
        for function in &self.functions {
            stack.declare_function(&function.name.value, function.clone())?;
        }
        for class in &self.classes {
            for method in &class.methods {
                stack.declare_function(&class.method_function_name(method), method.clone())?;
            }
        }

        for statement in &self.statements {
            if let Err(exception) = statement.execute(stack, context) {
                return Err(match exception {
                    EvaluationException::Error(mut error) => {
                        if error.call_stack.is_none() {
                            error.call_stack = Some(stack.get_call_stack().clone());
                        }
                        error.into()
                    }
                    EvaluationException::Trace(error) => error.into(),
                    EvaluationException::ControlFlow(ControlFlowOptions::Return(_)) => {
                        ExecutionError::from("Return statement must be used inside a function")
                            .into()
                    }
                    EvaluationException::ControlFlow(ControlFlowOptions::Break()) => {
                        ExecutionError::from("Break statement must be used inside a loop").into()
                    }
                    EvaluationException::ControlFlow(ControlFlowOptions::Continue()) => {
                        ExecutionError::from("Continue statement must be used inside a loop").into()
                    }
                });
            }
        }

        return Ok(());
    }
}
