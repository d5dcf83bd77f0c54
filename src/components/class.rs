use serde::Serialize;

use crate::{
    constants::CLASS,
    lexer::{Token, TokenValue},
    utils::iterators::Backtrackable,
    ParserError,
};

use super::{function::Function, identifier::Identifier, Tokens};

/// A class declaration. Classes are static namespaces: their methods are
/// registered as dotted functions (`Name.method`) and there is no object
/// system. The declaration still contributes a class scope to the static
/// structure and its methods are instrumented like any other function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDeclaration {
    pub name: Identifier,
    pub methods: Vec<Function>,
    pub line: usize,
}

impl ClassDeclaration {
    pub(super) fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<ClassDeclaration>, ParserError> {
        let line = tokens.peek_line();
        let Some(TokenValue::Keyword(CLASS)) = tokens.peek_value() else {
            return Ok(None);
        };

        tokens.next();
        let Some(TokenValue::Identifier(identifier)) = tokens.next_value() else {
            return Err("class must be followed by an identifier".into());
        };

        let Some(TokenValue::LeftCurly()) = tokens.next_value() else {
            return Err("class body must start with {".into());
        };

        let mut methods = Vec::new();
        loop {
            if let Some(TokenValue::RightCurly()) = tokens.peek_value() {
                tokens.next();
                break;
            }

            let Some(method) = Function::try_parse(tokens)? else {
                return Err("class bodies may only contain function definitions".into());
            };
            methods.push(method);
        }

        return Ok(Some(ClassDeclaration {
            name: (*identifier).into(),
            methods,
            line,
        }));
    }

    pub fn method_function_name(&self, method: &Function) -> String {
        format!("{}.{}", self.name.value, method.name.value)
    }
}
