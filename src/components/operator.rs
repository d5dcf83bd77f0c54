use std::fmt::Display;

use serde::Serialize;

use crate::{
    executor::values::Value,
    lexer::{Token, TokenValue},
    ExecutionError, ParserError,
};

use super::{Backtrackable, Tokens};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Remainder,
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    And,
    Or,
}

impl Operator {
    pub(super) fn try_parse<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Result<Option<Operator>, ParserError> {
        macro_rules! match_tokens {
            ([$($token:ident),+] => $result:expr) => {
                {
                    'block: {
                        let checkpoint = tokens.checkpoint();
                        $(
                            let Some(TokenValue::$token()) = tokens.next_value() else {
                                tokens.backtrack(checkpoint);
                                break 'block
                            };
                        )*

                        {
                            use Operator::*;
                            return Ok(Some($result));
                        }
                    };
                }
            };
        }

        // Two-token operators must be matched before their one-token prefixes.
        match_tokens!([LeftAngle, Equals] => LessThanOrEqual);
        match_tokens!([RightAngle, Equals] => GreaterThanOrEqual);
        match_tokens!([Equals, Equals] => Equal);
        match_tokens!([Bang, Equals] => NotEqual);
        match_tokens!([Ampersand, Ampersand] => And);
        match_tokens!([Pipe, Pipe] => Or);
        match_tokens!([Plus] => Addition);
        match_tokens!([Dash] => Subtraction);
        match_tokens!([Star] => Multiplication);
        match_tokens!([ForwardSlash] => Division);
        match_tokens!([Percent] => Remainder);
        match_tokens!([LeftAngle] => LessThan);
        match_tokens!([RightAngle] => GreaterThan);

        return Ok(None);
    }

    /// Parses the operator of an augmented assignment (`+=`, `-=`, `*=`,
    /// `/=`, `%=`), consuming both tokens.
    pub(super) fn try_parse_augmented<'a, I: Iterator<Item = &'a Token<'a>>>(
        tokens: &mut Backtrackable<I>,
    ) -> Option<Operator> {
        macro_rules! match_augmented {
            ($token:ident => $result:expr) => {{
                'block: {
                    let checkpoint = tokens.checkpoint();
                    let Some(TokenValue::$token()) = tokens.next_value() else {
                        tokens.backtrack(checkpoint);
                        break 'block;
                    };
                    let Some(TokenValue::Equals()) = tokens.next_value() else {
                        tokens.backtrack(checkpoint);
                        break 'block;
                    };
                    return Some($result);
                };
            }};
        }

        match_augmented!(Plus => Operator::Addition);
        match_augmented!(Dash => Operator::Subtraction);
        match_augmented!(Star => Operator::Multiplication);
        match_augmented!(ForwardSlash => Operator::Division);
        match_augmented!(Percent => Operator::Remainder);

        return None;
    }

    pub fn execute(&self, left: Value, right: Value) -> Result<Value, ExecutionError> {
        use Operator::*;
        use Value::*;

        match (self, left, right) {
            (Addition, Integer(left), Integer(right)) => Ok((left + right).into()),
            (Addition, String(left), String(right)) => Ok((left + right.as_str()).into()),
            (Addition, List(left), List(right)) => {
                let mut values = left.borrow().clone();
                values.extend(right.borrow().iter().cloned());
                Ok(Value::new_list(values))
            }
            (Subtraction, Integer(left), Integer(right)) => Ok((left - right).into()),
            (Multiplication, Integer(left), Integer(right)) => Ok((left * right).into()),
            (Division, Integer(_), Integer(0)) => Err("Division by zero.".into()),
            (Division, Integer(left), Integer(right)) => Ok((left / right).into()),
            (Remainder, Integer(_), Integer(0)) => Err("Division by zero.".into()),
            (Remainder, Integer(left), Integer(right)) => Ok((left % right).into()),
            (Equal, left, right) => Ok((left == right).into()),
            (NotEqual, left, right) => Ok((left != right).into()),
            (LessThan, Integer(left), Integer(right)) => Ok((left < right).into()),
            (GreaterThan, Integer(left), Integer(right)) => Ok((left > right).into()),
            (LessThanOrEqual, Integer(left), Integer(right)) => Ok((left <= right).into()),
            (GreaterThanOrEqual, Integer(left), Integer(right)) => Ok((left >= right).into()),
            (LessThan, String(left), String(right)) => Ok((left < right).into()),
            (GreaterThan, String(left), String(right)) => Ok((left > right).into()),
            (And, Boolean(left), Boolean(right)) => Ok((left && right).into()),
            (Or, Boolean(left), Boolean(right)) => Ok((left || right).into()),
            (operator, left, right) => {
                Err(format!("Invalid operator expression {left:?} {operator:?} {right:?}.").into())
            }
        }
    }

    pub fn chains_with(&self, value: &Self) -> bool {
        macro_rules! return_true_if_match {
            ($pattern:pat) => {{
                if matches!(self, $pattern) && matches!(value, $pattern) {
                    return true;
                }
            }};
        }

        return_true_if_match!(Self::Multiplication | Self::Division | Self::Remainder);
        return_true_if_match!(Self::Addition | Self::Subtraction);
        return_true_if_match!(Self::And | Self::Or);

        return false;
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            Operator::Addition => "+",
            Operator::Subtraction => "-",
            Operator::Multiplication => "*",
            Operator::Division => "/",
            Operator::Remainder => "%",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThanOrEqual => "<=",
            Operator::And => "&&",
            Operator::Or => "||",
        };
        f.write_str(symbol)
    }
}
