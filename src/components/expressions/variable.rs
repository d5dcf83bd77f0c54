use std::fmt::Display;

use serde::Serialize;

use crate::{
    components::{identifier::Identifier, EvaluationResult, Tokens},
    constants::ARG_PREFIX,
    executor::{values::Value, ExecutorContext, ExecutorStack},
    lexer::{Token, TokenValue},
    trace::StmtRef,
    utils::iterators::Backtrackable,
    ParserError,
};

use super::{Expression, ExpressionComponent};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallArguments {
    pub positional: Vec<Expression>,
    pub keyword: Vec<(Identifier, Expression)>,
}

impl CallArguments {
    pub(super) fn parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Self, ParserError> {
        let mut positional = Vec::new();
        let mut keyword: Vec<(Identifier, Expression)> = Vec::new();

        if let Some(TokenValue::RightBracket()) = tokens.peek_value() {
            tokens.next();
            return Ok(Self {
                positional,
                keyword,
            });
        }

        loop {
            if let Some(name) = try_parse_keyword_name(tokens) {
                keyword.push((name, Expression::parse(tokens)?));
            } else {
                if !keyword.is_empty() {
                    return Err("Positional arguments must come before keyword arguments".into());
                }
                positional.push(Expression::parse(tokens)?);
            }

            let next = tokens.next_value();
            if let Some(TokenValue::RightBracket()) = next {
                break;
            }
            let Some(TokenValue::Comma()) = next else {
                return Err("Expected function argument to be followed by `,` or `)`".into());
            };
        }

        return Ok(Self {
            positional,
            keyword,
        });
    }

    /// Evaluates the arguments once, in source order. When a call frame is
    /// given, every value is also recorded on it as a deep copy under its
    /// positional (`_arg{i}`) or keyword name.
    pub fn evaluate(
        &self,
        frame: Option<&StmtRef>,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<(Vec<Value>, Vec<(String, Value)>)> {
        let mut positional = Vec::new();
        for (index, argument) in self.positional.iter().enumerate() {
            let value = argument.evaluate(stack, context)?;
            if let Some(frame) = frame {
                frame
                    .borrow_mut()
                    .add_arg(&format!("{ARG_PREFIX}{index}"), value.deep_copy())?;
            }
            positional.push(value);
        }

        let mut keyword = Vec::new();
        for (name, argument) in &self.keyword {
            let value = argument.evaluate(stack, context)?;
            if let Some(frame) = frame {
                frame.borrow_mut().add_arg(&name.value, value.deep_copy())?;
            }
            keyword.push((name.value.clone(), value));
        }

        return Ok((positional, keyword));
    }
}

// A keyword argument is `name = expression`, which must be told apart from a
// positional argument that happens to start with `name ==`. Lookahead keeps
// the cursor untouched unless the shape matches.
fn try_parse_keyword_name<'a, I: Iterator<Item = &'a Token<'a>>>(
    tokens: &mut Backtrackable<I>,
) -> Option<Identifier> {
    let Some(TokenValue::Identifier(name)) = tokens.peek_value() else {
        return None;
    };
    let Some(Token {
        value: TokenValue::Equals(),
        ..
    }) = tokens.peek_ahead(1)
    else {
        return None;
    };
    if let Some(Token {
        value: TokenValue::Equals(),
        ..
    }) = tokens.peek_ahead(2)
    {
        return None;
    }

    let name = (*name).into();
    tokens.next();
    tokens.next();
    return Some(name);
}

impl Display for CallArguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for argument in &self.positional {
            if !first {
                f.write_str(", ")?;
            } else {
                first = false;
            }
            argument.fmt(f)?;
        }
        for (name, argument) in &self.keyword {
            if !first {
                f.write_str(", ")?;
            } else {
                first = false;
            }
            write!(f, "{name} = {argument}")?;
        }
        return Ok(());
    }
}

/// A bare name, or a call when followed by an argument list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableExpression {
    pub name: Identifier,
    pub arguments: Option<CallArguments>,
    pub line: usize,
}

impl ExpressionComponent for VariableExpression {
    fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<Self>, ParserError> {
        let line = tokens.peek_line();
        let Some(TokenValue::Identifier(identifier)) = tokens.peek_value() else {
            return Ok(None);
        };
        tokens.next();
        let name = (*identifier).into();
        let mut arguments = None;

        if let Some(TokenValue::LeftBracket()) = tokens.peek_value() {
            tokens.next();
            arguments = Some(CallArguments::parse(tokens)?);
        }

        return Ok(Some(VariableExpression {
            name,
            arguments,
            line,
        }));
    }

    fn evaluate(
        &self,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        if self.arguments.is_some() {
            return self.evaluate_call(None, stack, context);
        }

        return Ok(stack.resolve_variable(&self.name.value)?);
    }
}

impl VariableExpression {
    /// Invokes the named function. A traced call passes its frame so the
    /// arguments are recorded as they are evaluated; the untraced path
    /// passes none and gets identical dispatch.
    pub(super) fn evaluate_call(
        &self,
        frame: Option<&StmtRef>,
        stack: &mut ExecutorStack,
        context: &mut ExecutorContext,
    ) -> EvaluationResult<Value> {
        let Some(arguments) = &self.arguments else {
            return Err(format!("{} is not a call expression", self.name.value))?;
        };
        let (positional, keyword) = arguments.evaluate(frame, stack, context)?;
        return stack.execute_function(&self.name.value, positional, keyword, context);
    }
}

impl Display for VariableExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.name.fmt(f)?;
        if let Some(arguments) = &self.arguments {
            write!(f, "({arguments})")?;
        }
        return Ok(());
    }
}
