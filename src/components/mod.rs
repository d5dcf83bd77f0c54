use crate::{
    errors::{ExecutionError, TraceError},
    executor::values::Value,
    lexer::{Token, TokenValue},
    utils::iterators::Backtrackable,
};

pub mod block;
pub mod class;
pub mod expressions;
pub mod function;
pub mod identifier;
pub mod operator;
pub mod program;
pub mod statement;

pub(crate) trait Tokens<'a> {
    fn next_value(&mut self) -> Option<&'a TokenValue<'a>>;
    fn peek_value(&mut self) -> Option<&'a TokenValue<'a>>;
    fn peek_line(&mut self) -> usize;
    fn backtrack_if_none<T, F: FnOnce(&mut Self) -> Option<T>>(&mut self, action: F) -> Option<T>
    where
        Self: Sized;
}

impl<'a, I: Iterator<Item = &'a Token<'a>>> Tokens<'a> for Backtrackable<I> {
    fn next_value(&mut self) -> Option<&'a TokenValue<'a>> {
        self.next().map(|x| &x.value)
    }

    fn peek_value(&mut self) -> Option<&'a TokenValue<'a>> {
        self.peek().map(|x| &x.value)
    }

    fn peek_line(&mut self) -> usize {
        self.peek().map(|x| x.line).unwrap_or(0)
    }

    fn backtrack_if_none<T, F: FnOnce(&mut Self) -> Option<T>>(&mut self, action: F) -> Option<T>
    where
        Self: Sized,
    {
        let checkpoint = self.checkpoint();
        let result = action(self);
        if result.is_none() {
            self.backtrack(checkpoint);
        }
        return result;
    }
}

/// Control flow that unwinds through `execute` calls as an `Err` variant:
/// `return`, `break` and `continue` travel up to the construct that handles
/// them. Tracked frames pop on the way through, so the trace stays balanced.
#[derive(Debug, PartialEq)]
pub enum ControlFlowOptions {
    Return(Value),
    Break(),
    Continue(),
}

#[derive(Debug, PartialEq)]
pub enum EvaluationException {
    Error(ExecutionError),
    Trace(TraceError),
    ControlFlow(ControlFlowOptions),
}

pub type EvaluationResult<T> = Result<T, EvaluationException>;

impl From<ExecutionError> for EvaluationException {
    fn from(value: ExecutionError) -> Self {
        Self::Error(value)
    }
}

impl From<TraceError> for EvaluationException {
    fn from(value: TraceError) -> Self {
        Self::Trace(value)
    }
}

impl From<ControlFlowOptions> for EvaluationException {
    fn from(value: ControlFlowOptions) -> Self {
        Self::ControlFlow(value)
    }
}

impl From<String> for EvaluationException {
    fn from(value: String) -> Self {
        Self::Error(value.into())
    }
}

impl From<&str> for EvaluationException {
    fn from(value: &str) -> Self {
        Self::Error(value.into())
    }
}
