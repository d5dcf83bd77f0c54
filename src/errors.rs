use std::{error::Error, fmt::Display};

use crate::lexer::Token;

macro_rules! impl_error {
    ($error:ident) => {
        impl Error for $error {
            fn source(&self) -> Option<&(dyn Error + 'static)> {
                None
            }

            fn description(&self) -> &str {
                "description() is deprecated; use Display"
            }

            fn cause(&self) -> Option<&dyn Error> {
                self.source()
            }
        }

        impl From<&str> for $error {
            fn from(value: &str) -> Self {
                value.to_owned().into()
            }
        }

        impl From<String> for $error {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

macro_rules! engine_error {
    ($($error:ident,)*) => {
        #[derive(Debug, PartialEq, Eq)]
        pub enum EngineError {
            $(
                $error($error),
            )*
            Other(String)
        }

        impl EngineError {
            fn new(value: String) -> Self {
                Self::Other(value)
            }
        }

        impl Display for EngineError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$error(value) => value.fmt(f),
                    )*
                    Self::Other(value) => value.fmt(f),
                }
            }
        }

        $(
            impl From<$error> for EngineError {
                fn from(value: $error) -> Self {
                    Self::$error(value)
                }
            }
        )*

        impl_error!(EngineError);
    };
}

engine_error![LexerError, ParserError, ExecutionError, TraceError, QueryEngineError,];

#[derive(Debug, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub position: Option<usize>,
}

impl LexerError {
    pub fn new(message: String) -> Self {
        Self {
            message,
            position: None,
        }
    }
}

impl Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl_error!(LexerError);

#[derive(Debug, PartialEq, Eq)]
pub struct ParserError {
    pub message: String,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl ParserError {
    pub fn new(message: String) -> Self {
        Self {
            message,
            start: None,
            end: None,
        }
    }

    pub fn set_position<'a>(&mut self, token: &'a Token<'a>) {
        self.start = Some(token.start);
        self.end = Some(token.end);
    }
}

impl Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl_error!(ParserError);

#[derive(Debug, PartialEq, Eq)]
pub struct ExecutionError {
    pub message: String,
    pub call_stack: Option<Vec<String>>,
}

impl ExecutionError {
    fn new(message: String) -> Self {
        Self {
            message,
            call_stack: None,
        }
    }
}

impl Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl_error!(ExecutionError);

/// Raised when tracer primitives are used out of order, e.g. recording a loop
/// iteration without an open loop frame.
#[derive(Debug, PartialEq, Eq)]
pub struct TraceError {
    pub message: String,
}

impl TraceError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl Display for TraceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl_error!(TraceError);

/// Structural misuse of the query pipeline. `InvalidOperator` and
/// `InvalidField` are split out so callers can tell a malformed condition
/// from a field path that does not resolve on a concrete row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEngineError {
    Message(String),
    InvalidOperator(String),
    InvalidField(String),
}

impl QueryEngineError {
    fn new(message: String) -> Self {
        Self::Message(message)
    }

    pub fn invalid_operator(operator: &str) -> Self {
        Self::InvalidOperator(operator.to_owned())
    }

    pub fn invalid_field(field: &str) -> Self {
        Self::InvalidField(field.to_owned())
    }
}

impl Display for QueryEngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(message) => message.fmt(f),
            Self::InvalidOperator(operator) => write!(f, "Unsupported operator: {operator}"),
            Self::InvalidField(field) => write!(f, "Invalid field: {field}"),
        }
    }
}

impl_error!(QueryEngineError);
