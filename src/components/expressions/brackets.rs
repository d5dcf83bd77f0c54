use std::fmt::Display;

use serde::Serialize;

use crate::{
    components::{EvaluationResult, Tokens},
    executor::{values::Value, ExecutorContext, ExecutorStack},
    lexer::{Token, TokenValue},
    utils::iterators::Backtrackable,
    ParserError,
};

use super::{Expression, ExpressionComponent};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketExpression {
    pub inner: Box<Expression>,
}

impl ExpressionComponent for BracketExpression {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<Self>, ParserError> {
        let Some(TokenValue::LeftBracket()) = tokens.peek_value() else {
            return Ok(None);
        };
        tokens.next();

        let inner = Expression::parse(tokens)?;
        let Some(TokenValue::RightBracket()) = tokens.next_value() else {
            return Err("Expected closing ) after bracketed expression".into());
        };

        return Ok(Some(Self {
            inner: Box::new(inner),
        }));
    }

    fn evaluate(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        self.inner.evaluate(stack, context)
    }
}

impl Display for BracketExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.inner)
    }
}
