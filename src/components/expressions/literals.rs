use std::fmt::Display;

use serde::Serialize;

use crate::{
    components::{EvaluationResult, Tokens},
    constants::{FALSE, NULL, TRUE},
    executor::{values::Value, ExecutorContext, ExecutorStack},
    lexer::{Token, TokenValue},
    utils::iterators::Backtrackable,
    ParserError,
};

use super::ExpressionComponent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringLiteral {
    pub value: String,
}

impl StringLiteral {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
        }
    }

    fn unescape(raw: &str) -> String {
        raw.replace("\\\"", "\"")
            .replace("\\n", "\n")
            .replace("\\t", "\t")
            .replace("\\\\", "\\")
    }

    fn escape(value: &str) -> String {
        value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\t', "\\t")
    }
}

impl ExpressionComponent for StringLiteral {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<Self>, ParserError> {
        let Some(TokenValue::DoubleQuote()) = tokens.peek_value() else {
            return Ok(None);
        };
        tokens.next();

        let mut value = String::new();
        if let Some(TokenValue::StringLiteral(contents)) = tokens.peek_value() {
            tokens.next();
            value = Self::unescape(contents);
        }

        let Some(TokenValue::DoubleQuote()) = tokens.next_value() else {
            return Err("string literal must end with a closing \"".into());
        };

        return Ok(Some(Self { value }));
    }

    fn evaluate(
        &self,
        _stack: &mut ExecutorStack,
        _context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        Ok(self.value.clone().into())
    }
}

impl Display for StringLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\"", Self::escape(&self.value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegerLiteral {
    pub value: i64,
}

impl ExpressionComponent for IntegerLiteral {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<Self>, ParserError> {
        let Some(TokenValue::IntegerLiteral(literal)) = tokens.peek_value() else {
            return Ok(None);
        };
        tokens.next();

        let value = literal
            .parse::<i64>()
            .map_err(|_| format!("Could not parse {literal} as an integer"))?;

        return Ok(Some(Self { value }));
    }

    fn evaluate(
        &self,
        _stack: &mut ExecutorStack,
        _context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        Ok(self.value.into())
    }
}

impl Display for IntegerLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BooleanLiteral {
    pub value: bool,
}

impl ExpressionComponent for BooleanLiteral {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<Self>, ParserError> {
        let value = match tokens.peek_value() {
            Some(TokenValue::Keyword(TRUE)) => true,
            Some(TokenValue::Keyword(FALSE)) => false,
            _ => return Ok(None),
        };
        tokens.next();
        return Ok(Some(Self { value }));
    }

    fn evaluate(
        &self,
        _stack: &mut ExecutorStack,
        _context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        Ok(self.value.into())
    }
}

impl Display for BooleanLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NullLiteral {}

impl ExpressionComponent for NullLiteral {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<Self>, ParserError> {
        let Some(TokenValue::Keyword(NULL)) = tokens.peek_value() else {
            return Ok(None);
        };
        tokens.next();
        return Ok(Some(Self {}));
    }

    fn evaluate(
        &self,
        _stack: &mut ExecutorStack,
        _context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        Ok(Value::Null)
    }
}

impl Display for NullLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("null")
    }
}
