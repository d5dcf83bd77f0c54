use std::fmt::Display;

use serde::Serialize;

use crate::{
    components::{EvaluationResult, Tokens},
    executor::{values::Value, ExecutorContext, ExecutorStack},
    lexer::{Token, TokenValue},
    utils::{formatting::fmt_collection, iterators::Backtrackable},
    ParserError,
};

use super::{literals::StringLiteral, Expression, ExpressionComponent};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListExpression {
    pub values: Vec<Expression>,
}

impl ExpressionComponent for ListExpression {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<Self>, ParserError> {
        let Some(TokenValue::LeftSquare()) = tokens.peek_value() else {
            return Ok(None);
        };
        tokens.next();

        let mut values = Vec::new();
        if let Some(TokenValue::RightSquare()) = tokens.peek_value() {
            tokens.next();
        } else {
            loop {
                values.push(Expression::parse(tokens)?);
                let next = tokens.next_value();
                if let Some(TokenValue::RightSquare()) = next {
                    break;
                }
                let Some(TokenValue::Comma()) = next else {
                    return Err("Expected , or ] after list element".into());
                };
            }
        }

        return Ok(Some(Self { values }));
    }

    fn evaluate(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        let values = self
            .values
            .iter()
            .map(|value| value.evaluate(stack, context))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::new_list(values));
    }
}

impl Display for ListExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_collection("[", ", ", "]", self.values.iter(), f)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapExpression {
    pub entries: Vec<(StringLiteral, Expression)>,
}

impl ExpressionComponent for MapExpression {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<Self>, ParserError> {
        let Some(TokenValue::LeftCurly()) = tokens.peek_value() else {
            return Ok(None);
        };
        tokens.next();

        let mut entries = Vec::new();
        if let Some(TokenValue::RightCurly()) = tokens.peek_value() {
            tokens.next();
        } else {
            loop {
                let Some(key) = StringLiteral::try_parse(tokens)? else {
                    return Err("Map keys must be string literals".into());
                };
                let Some(TokenValue::Colon()) = tokens.next_value() else {
                    return Err("Expected : after map key".into());
                };
                entries.push((key, Expression::parse(tokens)?));

                let next = tokens.next_value();
                if let Some(TokenValue::RightCurly()) = next {
                    break;
                }
                let Some(TokenValue::Comma()) = next else {
                    return Err("Expected , or } after map entry".into());
                };
            }
        }

        return Ok(Some(Self { entries }));
    }

    fn evaluate(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        let mut values = Vec::new();
        for (key, value) in &self.entries {
            values.push((key.value.clone(), value.evaluate(stack, context)?));
        }
        return Ok(Value::new_map(values));
    }
}

impl Display for MapExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for (key, value) in &self.entries {
            if !first {
                f.write_str(", ")?;
            } else {
                first = false;
            }
            write!(f, "{key}: {value}")?;
        }
        f.write_str("}")?;
        return Ok(());
    }
}
