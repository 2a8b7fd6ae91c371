//! XPath 1.0 expression tokenizer.
//!
//! Tokens are read in one pass and then classified using the lexical
//! disambiguation rules of XPath 1.0 section 3.7:
//!
//! - `*` is a multiply operator only after a token that ends an operand;
//!   otherwise it is a name test.
//! - `and`, `or`, `mod` and `div` are operators only after an operand.
//! - A name followed by `(` is a function name or a node type.
//! - A name followed by `::` is an axis name.

use std::fmt;

use crate::error::{Result, XPathError};

const NODE_TYPE_NAMES: &[&str] = &["comment", "text", "processing-instruction", "node"];

/// A token of an XPath expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Dot,
    DotDot,
    At,
    Comma,
    ColonColon,
    Slash,
    DoubleSlash,
    Pipe,
    Plus,
    Minus,
    /// Multiply operator.
    Star,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    And,
    Or,
    Mod,
    Div,
    Number(f64),
    Literal(String),
    /// A name test: `*`, `prefix:*`, `local` or `prefix:local`.
    Name(String),
    /// `$name`, without the dollar sign.
    VariableReference(String),
    FunctionName(String),
    NodeType(String),
    AxisName(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftParen => f.write_str("("),
            Token::RightParen => f.write_str(")"),
            Token::LeftBracket => f.write_str("["),
            Token::RightBracket => f.write_str("]"),
            Token::Dot => f.write_str("."),
            Token::DotDot => f.write_str(".."),
            Token::At => f.write_str("@"),
            Token::Comma => f.write_str(","),
            Token::ColonColon => f.write_str("::"),
            Token::Slash => f.write_str("/"),
            Token::DoubleSlash => f.write_str("//"),
            Token::Pipe => f.write_str("|"),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Equal => f.write_str("="),
            Token::NotEqual => f.write_str("!="),
            Token::LessThan => f.write_str("<"),
            Token::LessThanEqual => f.write_str("<="),
            Token::GreaterThan => f.write_str(">"),
            Token::GreaterThanEqual => f.write_str(">="),
            Token::And => f.write_str("and"),
            Token::Or => f.write_str("or"),
            Token::Mod => f.write_str("mod"),
            Token::Div => f.write_str("div"),
            Token::Number(n) => write!(f, "{}", n),
            Token::Literal(s) => write!(f, "\"{}\"", s),
            Token::Name(s) | Token::FunctionName(s) | Token::NodeType(s) | Token::AxisName(s) => {
                f.write_str(s)
            }
            Token::VariableReference(s) => write!(f, "${}", s),
        }
    }
}

/// A token with the byte range it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
    pub end: usize,
}

/// Tokenize an expression.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    Lexer::new(input).tokenize()
}

struct Lexer<'a> {
    source: &'a str,
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            input: source.as_bytes(),
            pos: 0,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Spanned>> {
        let mut raw = Vec::new();
        loop {
            self.skip_whitespace();
            if self.pos >= self.input.len() {
                break;
            }
            let position = self.pos;
            let token = self.next_raw_token()?;
            raw.push(Spanned {
                token,
                position,
                end: self.pos,
            });
        }
        Ok(disambiguate(raw))
    }

    /// Names come out as `Name` and `*` as `Star`; classification happens later.
    fn next_raw_token(&mut self) -> Result<Token> {
        let Some(ch) = self.peek() else {
            return Err(self.error("unexpected end of expression"));
        };

        let single = match ch {
            b'(' => Some(Token::LeftParen),
            b')' => Some(Token::RightParen),
            b'[' => Some(Token::LeftBracket),
            b']' => Some(Token::RightBracket),
            b'@' => Some(Token::At),
            b',' => Some(Token::Comma),
            b'|' => Some(Token::Pipe),
            b'+' => Some(Token::Plus),
            b'-' => Some(Token::Minus),
            b'=' => Some(Token::Equal),
            b'*' => Some(Token::Star),
            _ => None,
        };
        if let Some(token) = single {
            self.pos += 1;
            return Ok(token);
        }

        match ch {
            b':' => self.read_pair(b':', Token::ColonColon, "expected ':' after ':'"),
            b'!' => self.read_pair(b'=', Token::NotEqual, "expected '=' after '!'"),
            b'.' => self.read_dot_or_number(),
            b'/' => Ok(self.read_optional_pair(b'/', Token::DoubleSlash, Token::Slash)),
            b'<' => Ok(self.read_optional_pair(b'=', Token::LessThanEqual, Token::LessThan)),
            b'>' => Ok(self.read_optional_pair(b'=', Token::GreaterThanEqual, Token::GreaterThan)),
            b'"' | b'\'' => self.read_literal(ch),
            b'$' => self.read_variable_reference(),
            b'0'..=b'9' => self.read_number(),
            _ if is_name_start_byte(ch) => Ok(Token::Name(self.read_qname(true))),
            _ => {
                let found = self.source[self.pos..].chars().next().unwrap_or('?');
                Err(self.error(format!("unexpected character '{}'", found)))
            }
        }
    }

    fn read_pair(&mut self, second: u8, token: Token, message: &str) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        if self.peek() == Some(second) {
            self.pos += 1;
            Ok(token)
        } else {
            Err(XPathError::syntax(message, start, self.source))
        }
    }

    fn read_optional_pair(&mut self, second: u8, pair: Token, single: Token) -> Token {
        self.pos += 1;
        if self.peek() == Some(second) {
            self.pos += 1;
            pair
        } else {
            single
        }
    }

    fn read_dot_or_number(&mut self) -> Result<Token> {
        match self.input.get(self.pos + 1) {
            Some(b'.') => {
                self.pos += 2;
                Ok(Token::DotDot)
            }
            Some(b'0'..=b'9') => self.read_number(),
            _ => {
                self.pos += 1;
                Ok(Token::Dot)
            }
        }
    }

    /// `Digits ('.' Digits?)? | '.' Digits`
    fn read_number(&mut self) -> Result<Token> {
        let start = self.pos;
        self.advance_while(|b| b.is_ascii_digit());
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.advance_while(|b| b.is_ascii_digit());
        }
        let text = &self.source[start..self.pos];
        text.parse::<f64>().map(Token::Number).map_err(|_| {
            XPathError::syntax(format!("invalid number literal '{}'", text), start, self.source)
        })
    }

    fn read_literal(&mut self, quote: u8) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        let content_start = self.pos;
        self.advance_while(|b| b != quote);
        if self.pos >= self.input.len() {
            return Err(XPathError::syntax(
                "unterminated string literal",
                start,
                self.source,
            ));
        }
        let content = self.source[content_start..self.pos].to_string();
        self.pos += 1;
        Ok(Token::Literal(content))
    }

    fn read_variable_reference(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 1;
        if !self.peek().is_some_and(is_name_start_byte) {
            return Err(XPathError::syntax("expected name after '$'", start, self.source));
        }
        Ok(Token::VariableReference(self.read_qname(false)))
    }

    /// Read `NCName`, `NCName:NCName` and, when `allow_wildcard`, `NCName:*`.
    fn read_qname(&mut self, allow_wildcard: bool) -> String {
        let start = self.pos;
        self.advance_while(is_name_byte);
        if self.peek() == Some(b':') {
            match self.input.get(self.pos + 1).copied() {
                Some(b'*') if allow_wildcard => self.pos += 2,
                Some(b) if b != b':' && is_name_start_byte(b) => {
                    self.pos += 1;
                    self.advance_while(is_name_byte);
                }
                _ => {}
            }
        }
        self.source[start..self.pos].to_string()
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.pos < self.input.len() && pred(self.input[self.pos]) {
            self.pos += 1;
        }
    }

    fn skip_whitespace(&mut self) {
        self.advance_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'));
    }

    fn error(&self, message: impl Into<String>) -> XPathError {
        XPathError::syntax(message, self.pos, self.source)
    }
}

/// Classify names and `*` from the token that precedes and follows them.
fn disambiguate(raw: Vec<Spanned>) -> Vec<Spanned> {
    let mut result: Vec<Spanned> = Vec::with_capacity(raw.len());
    for i in 0..raw.len() {
        let after_operand = result.last().is_some_and(|prev| ends_operand(&prev.token));
        let next = raw.get(i + 1).map(|s| &s.token);
        let Spanned {
            token,
            position,
            end,
        } = raw[i].clone();

        let token = match token {
            Token::Star if !after_operand => Token::Name("*".to_string()),
            Token::Name(name) if after_operand => match name.as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "mod" => Token::Mod,
                "div" => Token::Div,
                _ => Token::Name(name),
            },
            Token::Name(name) if matches!(next, Some(Token::LeftParen)) => {
                if NODE_TYPE_NAMES.contains(&name.as_str()) {
                    Token::NodeType(name)
                } else {
                    Token::FunctionName(name)
                }
            }
            Token::Name(name) if matches!(next, Some(Token::ColonColon)) => Token::AxisName(name),
            other => other,
        };
        result.push(Spanned {
            token,
            position,
            end,
        });
    }
    result
}

/// Tokens after which `*` multiplies and `and`/`or`/`mod`/`div` are operators.
fn ends_operand(token: &Token) -> bool {
    matches!(
        token,
        Token::RightParen
            | Token::RightBracket
            | Token::Dot
            | Token::DotDot
            | Token::Number(_)
            | Token::Literal(_)
            | Token::Name(_)
            | Token::VariableReference(_)
    )
}

/// ASCII letters and `_`, plus any byte of a multi-byte UTF-8 sequence.
fn is_name_start_byte(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_name_byte(b: u8) -> bool {
    is_name_start_byte(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|s| s.token).collect()
    }

    fn name(s: &str) -> Token {
        Token::Name(s.to_string())
    }

    #[test]
    fn test_simple_path() {
        assert_eq!(
            tokens("//dependency/version"),
            vec![Token::DoubleSlash, name("dependency"), Token::Slash, name("version")]
        );
    }

    #[test]
    fn test_prefixed_names_and_wildcards() {
        assert_eq!(
            tokens("ui:define | ui:* | *"),
            vec![name("ui:define"), Token::Pipe, name("ui:*"), Token::Pipe, name("*")]
        );
    }

    #[test]
    fn test_star_after_operand_multiplies() {
        assert_eq!(
            tokens("2 * 3"),
            vec![Token::Number(2.0), Token::Star, Token::Number(3.0)]
        );
        assert_eq!(tokens("@*"), vec![Token::At, name("*")]);
        assert_eq!(tokens("child::*"), vec![
            Token::AxisName("child".to_string()),
            Token::ColonColon,
            name("*")
        ]);
    }

    #[test]
    fn test_keyword_operators_depend_on_position() {
        assert_eq!(
            tokens("div div div"),
            vec![name("div"), Token::Div, name("div")]
        );
        assert_eq!(
            tokens("a and not(b)"),
            vec![
                name("a"),
                Token::And,
                Token::FunctionName("not".to_string()),
                Token::LeftParen,
                name("b"),
                Token::RightParen
            ]
        );
    }

    #[test]
    fn test_node_types_and_functions() {
        assert_eq!(
            tokens("text()"),
            vec![Token::NodeType("text".to_string()), Token::LeftParen, Token::RightParen]
        );
        assert_eq!(
            tokens("local-name()")[0],
            Token::FunctionName("local-name".to_string())
        );
    }

    #[test]
    fn test_literals_numbers_and_comparisons() {
        assert_eq!(
            tokens("@name='title' and .5 <= 1.25 != \"x\""),
            vec![
                Token::At,
                name("name"),
                Token::Equal,
                Token::Literal("title".to_string()),
                Token::And,
                Token::Number(0.5),
                Token::LessThanEqual,
                Token::Number(1.25),
                Token::NotEqual,
                Token::Literal("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_dots_and_variables() {
        assert_eq!(
            tokens("../. = $v"),
            vec![
                Token::DotDot,
                Token::Slash,
                Token::Dot,
                Token::Equal,
                Token::VariableReference("v".to_string())
            ]
        );
    }

    #[test]
    fn test_non_ascii_names() {
        assert_eq!(tokens("//données"), vec![Token::DoubleSlash, name("données")]);
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let spans = tokenize("a  |  b").unwrap();
        let positions: Vec<usize> = spans.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 3, 6]);
    }

    #[test]
    fn test_errors() {
        let err = tokenize("'open").unwrap_err();
        assert!(matches!(err, XPathError::Syntax { position: 0, .. }));

        let err = tokenize("a ! b").unwrap_err();
        assert!(matches!(err, XPathError::Syntax { position: 2, .. }));

        assert!(tokenize("a # b").is_err());
        assert!(tokenize("$").is_err());
    }
}
