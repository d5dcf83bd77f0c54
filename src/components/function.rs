use serde::Serialize;

use crate::{
    constants::FUNC,
    lexer::{Token, TokenValue},
    utils::iterators::Backtrackable,
    ParserError,
};

use super::{block::Block, identifier::Identifier, Tokens};

/// A function definition. Parameters are untyped; calls bind positional
/// arguments in order and keyword arguments by name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: Identifier,
    pub parameters: Vec<Identifier>,
    pub code: Block,
    pub line: usize,
}

impl Function {
    pub(super) fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<Function>, ParserError> {
        let line = tokens.peek_line();
        let Some(TokenValue::Keyword(FUNC)) = tokens.peek_value() else {
            return Ok(None);
        };

        tokens.next();
        let Some(TokenValue::Identifier(identifier)) = tokens.next_value() else {
            return Err("func must be followed by an identifier".into());
        };

        let Some(TokenValue::LeftBracket()) = tokens.next_value() else {
            return Err("function name must be followed by (".into());
        };

        let mut parameters = Vec::new();
        if let Some(TokenValue::RightBracket()) = tokens.peek_value() {
            tokens.next();
        } else {
            loop {
                let Some(TokenValue::Identifier(parameter)) = tokens.next_value() else {
                    return Err("expected function parameter".into());
                };
                parameters.push((*parameter).into());

                match tokens.next_value() {
                    Some(TokenValue::RightBracket()) => break,
                    Some(TokenValue::Comma()) => {}
                    _ => return Err("expected ) or , after function parameter".into()),
                }
            }
        }

        let code = Block::parse(tokens)?;

        return Ok(Some(Function {
            name: (*identifier).into(),
            parameters,
            code,
            line,
        }));
    }
}
