use crate::constants::KEYWORDS;

use super::{LexerContext, TokenValue};

const SEMICOLON: &str = ";";
const COMMA: &str = ",";
const HASH: &str = "#";
const EQUALS: &str = "=";
const PLUS: &str = "+";
const DASH: &str = "-";
const STAR: &str = "*";
const FORWARD_SLASH: &str = "/";
const PERCENT: &str = "%";
const AMPERSAND: &str = "&";
const PIPE: &str = "|";
const BANG: &str = "!";
const LEFT_BRACKET: &str = "(";
const RIGHT_BRACKET: &str = ")";
const LEFT_CURLY: &str = "{";
const RIGHT_CURLY: &str = "}";
const LEFT_ANGLE: &str = "<";
const RIGHT_ANGLE: &str = ">";
const LEFT_SQUARE: &str = "[";
const RIGHT_SQUARE: &str = "]";
const DOT: &str = ".";
const COLON: &str = ":";
const DOUBLE_QUOTE: &str = "\"";
const ESCAPED_DOUBLE_QUOTE: &str = "\\\"";
const NEWLINES: [&str; 2] = ["\n", "\r\n"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    StringLiteral,
    IntegerLiteral,
    Identifier,
    Keyword,
    Equals,
    Plus,
    Dash,
    Star,
    ForwardSlash,
    Percent,
    Ampersand,
    Pipe,
    Bang,
    LeftBracket,
    RightBracket,
    LeftCurly,
    RightCurly,
    LeftAngle,
    RightAngle,
    LeftSquare,
    RightSquare,
    Dot,
    Colon,
    Semicolon,
    Comma,
    DoubleQuote,
    Ignored,
}

impl TokenKind {
    pub fn into_token<'a>(&self, value: &'a str) -> Option<TokenValue<'a>> {
        match self {
            TokenKind::StringLiteral => Some(TokenValue::StringLiteral(value)),
            TokenKind::IntegerLiteral => Some(TokenValue::IntegerLiteral(value)),
            TokenKind::Identifier => Some(TokenValue::Identifier(value)),
            TokenKind::Keyword => Some(TokenValue::Keyword(value)),
            TokenKind::Equals => Some(TokenValue::Equals()),
            TokenKind::Plus => Some(TokenValue::Plus()),
            TokenKind::Dash => Some(TokenValue::Dash()),
            TokenKind::Star => Some(TokenValue::Star()),
            TokenKind::ForwardSlash => Some(TokenValue::ForwardSlash()),
            TokenKind::Percent => Some(TokenValue::Percent()),
            TokenKind::Ampersand => Some(TokenValue::Ampersand()),
            TokenKind::Pipe => Some(TokenValue::Pipe()),
            TokenKind::Bang => Some(TokenValue::Bang()),
            TokenKind::LeftBracket => Some(TokenValue::LeftBracket()),
            TokenKind::RightBracket => Some(TokenValue::RightBracket()),
            TokenKind::LeftCurly => Some(TokenValue::LeftCurly()),
            TokenKind::RightCurly => Some(TokenValue::RightCurly()),
            TokenKind::LeftAngle => Some(TokenValue::LeftAngle()),
            TokenKind::RightAngle => Some(TokenValue::RightAngle()),
            TokenKind::LeftSquare => Some(TokenValue::LeftSquare()),
            TokenKind::RightSquare => Some(TokenValue::RightSquare()),
            TokenKind::Dot => Some(TokenValue::Dot()),
            TokenKind::Colon => Some(TokenValue::Colon()),
            TokenKind::Semicolon => Some(TokenValue::Semicolon()),
            TokenKind::Comma => Some(TokenValue::Comma()),
            TokenKind::DoubleQuote => Some(TokenValue::DoubleQuote()),
            TokenKind::Ignored => None,
        }
    }
}

pub fn try_get_token_kind(
    context_stack: &mut Vec<LexerContext>,
    current: &str,
) -> Option<TokenKind> {
    match context_stack.last().unwrap() {
        LexerContext::Root => match current {
            HASH => {
                context_stack.push(LexerContext::Comment);
                Some(TokenKind::Ignored)
            }
            DOUBLE_QUOTE => {
                context_stack.push(LexerContext::String);
                Some(TokenKind::DoubleQuote)
            }
            EQUALS => Some(TokenKind::Equals),
            PLUS => Some(TokenKind::Plus),
            DASH => Some(TokenKind::Dash),
            STAR => Some(TokenKind::Star),
            FORWARD_SLASH => Some(TokenKind::ForwardSlash),
            PERCENT => Some(TokenKind::Percent),
            AMPERSAND => Some(TokenKind::Ampersand),
            PIPE => Some(TokenKind::Pipe),
            BANG => Some(TokenKind::Bang),
            LEFT_BRACKET => Some(TokenKind::LeftBracket),
            RIGHT_BRACKET => Some(TokenKind::RightBracket),
            LEFT_CURLY => Some(TokenKind::LeftCurly),
            RIGHT_CURLY => Some(TokenKind::RightCurly),
            LEFT_ANGLE => Some(TokenKind::LeftAngle),
            RIGHT_ANGLE => Some(TokenKind::RightAngle),
            LEFT_SQUARE => Some(TokenKind::LeftSquare),
            RIGHT_SQUARE => Some(TokenKind::RightSquare),
            DOT => Some(TokenKind::Dot),
            COLON => Some(TokenKind::Colon),
            SEMICOLON => Some(TokenKind::Semicolon),
            COMMA => Some(TokenKind::Comma),
            _ => {
                if KEYWORDS.contains(&current) {
                    Some(TokenKind::Keyword)
                } else if matches_number(current) {
                    Some(TokenKind::IntegerLiteral)
                } else if matches_identifier(current) {
                    Some(TokenKind::Identifier)
                } else if is_whitespace(current) {
                    Some(TokenKind::Ignored)
                } else {
                    None
                }
            }
        },
        LexerContext::Comment => {
            if NEWLINES.contains(&current) {
                context_stack.pop();
                Some(TokenKind::Ignored)
            } else if current.ends_with(NEWLINES[0])
                || current.ends_with(NEWLINES[1])
                || current.starts_with(HASH)
            {
                None
            } else {
                Some(TokenKind::Ignored)
            }
        }
        LexerContext::String => {
            if current == DOUBLE_QUOTE {
                // Single double quote will happen when we are at the end of a string
                context_stack.pop();
                Some(TokenKind::DoubleQuote)
            } else if (current.ends_with(DOUBLE_QUOTE) && !current.ends_with(ESCAPED_DOUBLE_QUOTE))
                || current.starts_with(DOUBLE_QUOTE)
            {
                // Need to detect all the special cases where we have to return the currently
                // matched string. Ending with a double quote is the end of the string, starting
                // with a double quote is the start of the string.
                None
            } else {
                Some(TokenKind::StringLiteral)
            }
        }
    }
}

fn matches_identifier(value: &str) -> bool {
    return value.chars().all(|x| x.is_alphanumeric() || x == '_');
}

fn matches_number(value: &str) -> bool {
    // Individual checking of chars should be fine here, as all digits will be graphemes of one
    // character anyway
    return value.chars().all(|x| x.is_digit(10));
}

fn is_whitespace(value: &str) -> bool {
    // Checking chars individually is fine here, as any valid unicode whitespace should
    // really be a single character, and not a grapheme cluster
    return value.chars().all(|x| x.is_whitespace()) || is_newline(value);
}

fn is_newline(value: &str) -> bool {
    NEWLINES.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_at_root(value: &str) -> Option<TokenKind> {
        let mut context_stack = vec![LexerContext::Root];
        try_get_token_kind(&mut context_stack, value)
    }

    #[test]
    fn should_match_keywords() {
        assert_eq!(kind_at_root("while"), Some(TokenKind::Keyword));
        assert_eq!(kind_at_root("func"), Some(TokenKind::Keyword));
    }

    #[test]
    fn should_match_identifiers_and_numbers() {
        assert_eq!(kind_at_root("whiles"), Some(TokenKind::Identifier));
        assert_eq!(kind_at_root("x1"), Some(TokenKind::Identifier));
        assert_eq!(kind_at_root("42"), Some(TokenKind::IntegerLiteral));
    }

    #[test]
    fn should_not_match_mixed_symbols() {
        assert_eq!(kind_at_root("a+"), None);
    }

    #[test]
    fn should_keep_string_context_until_closing_quote() {
        let mut context_stack = vec![LexerContext::Root];
        assert_eq!(
            try_get_token_kind(&mut context_stack, "\""),
            Some(TokenKind::DoubleQuote)
        );
        assert_eq!(context_stack.last(), Some(&LexerContext::String));
        assert_eq!(
            try_get_token_kind(&mut context_stack, "abc"),
            Some(TokenKind::StringLiteral)
        );
        assert_eq!(
            try_get_token_kind(&mut context_stack, "\""),
            Some(TokenKind::DoubleQuote)
        );
        assert_eq!(context_stack.last(), Some(&LexerContext::Root));
    }
}
