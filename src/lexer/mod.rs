use std::iter::Peekable;

use serde::Serialize;
use unicode_segmentation::{GraphemeIndices, UnicodeSegmentation};

use crate::errors::LexerError;

mod token_kinds;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    pub value: TokenValue<'a>,
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl<'a> Token<'a> {
    pub fn new(value: TokenValue<'a>, start: usize, end: usize, line: usize) -> Self {
        Self {
            value,
            start,
            end,
            line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TokenValue<'a> {
    StringLiteral(&'a str),
    IntegerLiteral(&'a str),
    Identifier(&'a str),
    Keyword(&'a str),
    Equals(),
    Plus(),
    Dash(),
    Star(),
    ForwardSlash(),
    Percent(),
    Ampersand(),
    Pipe(),
    Bang(),
    LeftBracket(),
    RightBracket(),
    LeftCurly(),
    RightCurly(),
    LeftAngle(),
    RightAngle(),
    LeftSquare(),
    RightSquare(),
    Dot(),
    Colon(),
    Semicolon(),
    DoubleQuote(),
    Comma(),
}

#[derive(Debug, PartialEq, Eq)]
enum LexerContext {
    Root,
    Comment,
    String,
}

pub fn lex<'a>(file: &'a str) -> Tokens<'a> {
    Tokens::new(file)
}

pub struct Tokens<'a> {
    buffer: &'a str,
    next: (usize, &'a str),
    iterator: Peekable<GraphemeIndices<'a>>,
    context_stack: Vec<LexerContext>,
    line: usize,
    line_scan_offset: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(file: &'a str) -> Self {
        Self {
            buffer: file,
            next: (0, ""),
            iterator: file.grapheme_indices(true).peekable(),
            context_stack: vec![LexerContext::Root],
            line: 1,
            line_scan_offset: 0,
        }
    }

    fn line_at(&mut self, offset: usize) -> usize {
        self.line += self.buffer[self.line_scan_offset..offset]
            .matches('\n')
            .count();
        self.line_scan_offset = offset;
        return self.line;
    }
}

impl<'a> Tokens<'a> {
    fn next(&mut self) -> Option<Result<Token<'a>, LexerError>> {
        loop {
            // If we are at the end of the file then the iterator is finished.
            let Some(next) = self.iterator.peek() else {
                return None;
            };

            self.next = *next;

            // If the advance method returns None it means that we need to call it again
            // as it found a token that should be ignored (e.g. whitespace)
            let next = self.advance();
            if let Ok(Some(token)) = next {
                return Some(Ok(token));
            }

            if let Err(mut err) = next {
                if err.position.is_none() {
                    err.position = Some(self.next.0);
                }
                return Some(Err(err));
            }
        }
    }

    fn advance(&mut self) -> Result<Option<Token<'a>>, LexerError> {
        let start = self.next.0;
        let mut end = start + self.next.1.len();
        let mut result = None;
        let line = self.line_at(start);

        loop {
            let value = &self.buffer[start..end];

            // Try to parse the next token, returning the previously parsed token if we can't parse
            // it this time.
            let Some(new_result) = token_kinds::try_get_token_kind(&mut self.context_stack, value)
            else {
                return match result {
                    Some(result) => Ok(result),
                    None => Err("Could not parse token.".into()),
                };
            };

            result = Some(
                new_result
                    .into_token(value)
                    .map(|value| Token::new(value, start, end, line)),
            );

            // Advance though the file if we did successfully parse the previous token to see if
            // the next character also makes a valid token.
            self.iterator.next();
            let Some(next) = self.iterator.peek() else {
                return match result {
                    Some(result) => Ok(result),
                    None => Err("Unexpected end of file.".into()),
                };
            };
            self.next = *next;
            end += self.next.1.len();
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Token<'a>, LexerError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values<'a>(file: &'a str) -> Vec<TokenValue<'a>> {
        lex(file)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .into_iter()
            .map(|token| token.value)
            .collect()
    }

    #[test]
    fn should_tokenize_valid_file() {
        let test_file = r#"
# Comments are fun!
func main() {
  test_identifier = "Blue \"cheese\" and rice!";
  if (1 + 1) == 2 {
    out(test_identifier);
  };
}
"#;
        let tokens = values(test_file);
        assert_eq!(
            tokens,
            vec![
                TokenValue::Keyword("func"),
                TokenValue::Identifier("main"),
                TokenValue::LeftBracket(),
                TokenValue::RightBracket(),
                TokenValue::LeftCurly(),
                TokenValue::Identifier("test_identifier"),
                TokenValue::Equals(),
                TokenValue::DoubleQuote(),
                TokenValue::StringLiteral("Blue \\\"cheese\\\" and rice!"),
                TokenValue::DoubleQuote(),
                TokenValue::Semicolon(),
                TokenValue::Keyword("if"),
                TokenValue::LeftBracket(),
                TokenValue::IntegerLiteral("1"),
                TokenValue::Plus(),
                TokenValue::IntegerLiteral("1"),
                TokenValue::RightBracket(),
                TokenValue::Equals(),
                TokenValue::Equals(),
                TokenValue::IntegerLiteral("2"),
                TokenValue::LeftCurly(),
                TokenValue::Identifier("out"),
                TokenValue::LeftBracket(),
                TokenValue::Identifier("test_identifier"),
                TokenValue::RightBracket(),
                TokenValue::Semicolon(),
                TokenValue::RightCurly(),
                TokenValue::Semicolon(),
                TokenValue::RightCurly(),
            ]
        );
    }

    #[test]
    fn should_parse_empty_string() {
        assert_eq!(
            values(r#"test = "";"#),
            vec![
                TokenValue::Identifier("test"),
                TokenValue::Equals(),
                TokenValue::DoubleQuote(),
                TokenValue::DoubleQuote(),
                TokenValue::Semicolon(),
            ]
        );
    }

    #[test]
    fn should_tokenize_operators() {
        assert_eq!(
            values("a <= b - 2 % 3;"),
            vec![
                TokenValue::Identifier("a"),
                TokenValue::LeftAngle(),
                TokenValue::Equals(),
                TokenValue::Identifier("b"),
                TokenValue::Dash(),
                TokenValue::IntegerLiteral("2"),
                TokenValue::Percent(),
                TokenValue::IntegerLiteral("3"),
                TokenValue::Semicolon(),
            ]
        );
    }

    #[test]
    fn should_distinguish_keyword_prefixed_identifiers() {
        assert_eq!(
            values("form = 1;"),
            vec![
                TokenValue::Identifier("form"),
                TokenValue::Equals(),
                TokenValue::IntegerLiteral("1"),
                TokenValue::Semicolon(),
            ]
        );
    }

    #[test]
    fn should_record_line_numbers() {
        let tokens = lex("x = 1;\ny = 2;\n")
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let lines = tokens.iter().map(|token| token.line).collect::<Vec<_>>();
        assert_eq!(lines, vec![1, 1, 1, 1, 2, 2, 2, 2]);
    }
}
