use std::fmt::Display;

use serde::Serialize;

use crate::{
    components::{EvaluationResult, Tokens},
    executor::{values::Value, ExecutorContext, ExecutorStack},
    lexer::{Token, TokenValue},
    utils::iterators::Backtrackable,
    ParserError,
};

use super::{BaseExpression, DependentExpressionComponent, Expression};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexExpression {
    pub inner: Box<BaseExpression>,
    pub index: Box<Expression>,
}

impl DependentExpressionComponent for IndexExpression {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        inner: BaseExpression,
        tokens: &mut Backtrackable<I>,
    ) -> Result<Result<Self, BaseExpression>, ParserError> {
        let Some(TokenValue::LeftSquare()) = tokens.peek_value() else {
            return Ok(Err(inner));
        };
        tokens.next();

        let index = Expression::parse(tokens)?;
        let Some(TokenValue::RightSquare()) = tokens.peek_value() else {
            return Err("Expected closing ] after index expression".into());
        };
        tokens.next();

        return Ok(Ok(IndexExpression {
            inner: Box::new(inner),
            index: Box::new(index),
        }));
    }

    fn evaluate(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        let inner_value = self.inner.evaluate(stack, context)?;
        let index = self.index.evaluate(stack, context)?;

        match (&inner_value, &index) {
            (Value::List(values), Value::Integer(index)) => {
                let values = values.borrow();
                let position = usize::try_from(*index)
                    .map_err(|_| "Index expression must be a non-negative integer")?;
                let result = values.get(position).ok_or(format!(
                    "Index value must be less than list length, list has length {} and got index {}.",
                    values.len(),
                    position
                ))?;
                return Ok(result.clone());
            }
            (Value::Map(_), Value::String(key)) => {
                return Ok(inner_value
                    .get_entry(key)
                    .ok_or::<String>(format!("No entry named {key} in map"))?);
            }
            (inner_value, index) => Err(format!(
                "Cannot index a value of type {} with a value of type {}",
                inner_value.type_name(),
                index.type_name()
            ))?,
        }
    }
}

impl Display for IndexExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.inner, self.index)
    }
}
