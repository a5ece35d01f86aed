// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Textual annotations: `list[int]`, `optional[str]`, `int | literal["a"]`.
//!
//! ```text
//! union   := primary ('|' primary)*
//! primary := name ['[' args ']']
//! ```
//!
//! Names are case-insensitive. `literal[..]` takes quoted strings, integers
//! and `true` / `false`; `dict` takes `str` as its key type.

use crate::types::Annotation;
use crate::value::LiteralValue;
use std::str::FromStr;
use thiserror::Error;

/// Annotation text that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid annotation at offset {offset}: {message}")]
pub struct AnnotationParseError {
    /// Byte offset of the offending token.
    pub offset: usize,
    pub message: String,
}

impl AnnotationParseError {
    fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Str(String),
    LBracket,
    RBracket,
    Comma,
    Pipe,
    Ellipsis,
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Ident(name) => format!("`{}`", name),
            Self::Int(v) => format!("`{}`", v),
            Self::Str(v) => format!("{:?}", v),
            Self::LBracket => "`[`".into(),
            Self::RBracket => "`]`".into(),
            Self::Comma => "`,`".into(),
            Self::Pipe => "`|`".into(),
            Self::Ellipsis => "`...`".into(),
            Self::Eof => "end of input".into(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, AnnotationParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' | ']' | ',' | '|' => {
                chars.next();
                let token = match c {
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    ',' => Token::Comma,
                    _ => Token::Pipe,
                };
                tokens.push((token, offset));
            }
            '.' => {
                if input[offset..].starts_with("...") {
                    for _ in 0..3 {
                        chars.next();
                    }
                    tokens.push((Token::Ellipsis, offset));
                } else {
                    return Err(AnnotationParseError::new(offset, "expected `...`"));
                }
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some((_, escaped)) => text.push(escaped),
                            None => break,
                        },
                        c if c == quote => {
                            closed = true;
                            break;
                        }
                        c => text.push(c),
                    }
                }
                if !closed {
                    return Err(AnnotationParseError::new(offset, "unterminated string"));
                }
                tokens.push((Token::Str(text), offset));
            }
            c if c == '-' || c.is_ascii_digit() => {
                let mut end = offset + c.len_utf8();
                chars.next();
                while let Some(&(i, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = i + 1;
                    chars.next();
                }
                let text = &input[offset..end];
                let value = text.parse::<i64>().map_err(|_| {
                    AnnotationParseError::new(offset, format!("invalid integer `{}`", text))
                })?;
                tokens.push((Token::Int(value), offset));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut end = offset;
                while let Some(&(i, d)) = chars.peek() {
                    if !(d.is_alphanumeric() || d == '_') {
                        break;
                    }
                    end = i + d.len_utf8();
                    chars.next();
                }
                tokens.push((Token::Ident(input[offset..end].to_ascii_lowercase()), offset));
            }
            other => {
                return Err(AnnotationParseError::new(
                    offset,
                    format!("unexpected character `{}`", other),
                ));
            }
        }
    }

    tokens.push((Token::Eof, input.len()));
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .map(|(token, _)| token)
            .unwrap_or(&Token::Eof)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, o)| *o).unwrap_or(0)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> AnnotationParseError {
        AnnotationParseError::new(
            self.offset(),
            format!("expected {}, found {}", expected, self.peek().describe()),
        )
    }

    fn expect(&mut self, token: Token, expected: &str) -> Result<(), AnnotationParseError> {
        if *self.peek() == token {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn parse_union(&mut self) -> Result<Annotation, AnnotationParseError> {
        let first = self.parse_primary()?;
        if *self.peek() != Token::Pipe {
            return Ok(first);
        }
        let mut members = vec![first];
        while *self.peek() == Token::Pipe {
            self.advance();
            members.push(self.parse_primary()?);
        }
        Ok(Annotation::Union(members))
    }

    fn parse_primary(&mut self) -> Result<Annotation, AnnotationParseError> {
        let offset = self.offset();
        let name = match self.peek() {
            Token::Ident(name) => name.clone(),
            _ => return Err(self.unexpected("a type name")),
        };
        self.advance();

        let annotation = match name.as_str() {
            "any" => Annotation::Any,
            "never" => Annotation::Never,
            "none" | "null" => Annotation::None,
            "bool" => Annotation::bool(),
            "int" => Annotation::int(),
            "float" => Annotation::float(),
            "str" => Annotation::str(),
            "bytes" => Annotation::bytes(),
            "path" => Annotation::path(),
            "datetime" => Annotation::datetime(),
            "optional" => {
                self.expect(Token::LBracket, "`[`")?;
                let inner = self.parse_union()?;
                self.expect(Token::RBracket, "`]`")?;
                Annotation::optional(inner)
            }
            "union" => Annotation::Union(self.parse_list()?),
            "list" => {
                self.expect(Token::LBracket, "`[`")?;
                let inner = self.parse_union()?;
                self.expect(Token::RBracket, "`]`")?;
                Annotation::list(inner)
            }
            "set" => {
                self.expect(Token::LBracket, "`[`")?;
                let inner = self.parse_union()?;
                self.expect(Token::RBracket, "`]`")?;
                Annotation::set(inner)
            }
            "tuple" => self.parse_tuple()?,
            "dict" => {
                self.expect(Token::LBracket, "`[`")?;
                let key_offset = self.offset();
                let key = self.parse_union()?;
                if key != Annotation::str() {
                    return Err(AnnotationParseError::new(
                        key_offset,
                        "dict keys must be `str`",
                    ));
                }
                self.expect(Token::Comma, "`,`")?;
                let value = self.parse_union()?;
                self.expect(Token::RBracket, "`]`")?;
                Annotation::dict(value)
            }
            "literal" => self.parse_literal()?,
            other => {
                return Err(AnnotationParseError::new(
                    offset,
                    format!("unknown type `{}`", other),
                ))
            }
        };
        Ok(annotation)
    }

    /// `[a, b, ...]`, at least one member.
    fn parse_list(&mut self) -> Result<Vec<Annotation>, AnnotationParseError> {
        self.expect(Token::LBracket, "`[`")?;
        let mut members = vec![self.parse_union()?];
        while *self.peek() == Token::Comma {
            self.advance();
            members.push(self.parse_union()?);
        }
        self.expect(Token::RBracket, "`]`")?;
        Ok(members)
    }

    fn parse_tuple(&mut self) -> Result<Annotation, AnnotationParseError> {
        self.expect(Token::LBracket, "`[`")?;
        let first = self.parse_union()?;
        if *self.peek() == Token::Comma {
            self.advance();
            if *self.peek() == Token::Ellipsis {
                self.advance();
                self.expect(Token::RBracket, "`]`")?;
                return Ok(Annotation::var_tuple(first));
            }
            let mut elements = vec![first, self.parse_union()?];
            while *self.peek() == Token::Comma {
                self.advance();
                elements.push(self.parse_union()?);
            }
            self.expect(Token::RBracket, "`]`")?;
            return Ok(Annotation::Tuple(elements));
        }
        self.expect(Token::RBracket, "`]`")?;
        Ok(Annotation::Tuple(vec![first]))
    }

    fn parse_literal(&mut self) -> Result<Annotation, AnnotationParseError> {
        self.expect(Token::LBracket, "`[`")?;
        let mut values = Vec::new();
        loop {
            let value = match self.peek() {
                Token::Str(s) => LiteralValue::Str(s.clone()),
                Token::Int(v) => LiteralValue::Int(*v),
                Token::Ident(name) if name == "true" => LiteralValue::Bool(true),
                Token::Ident(name) if name == "false" => LiteralValue::Bool(false),
                _ => return Err(self.unexpected("a literal value")),
            };
            self.advance();
            values.push(value);
            if *self.peek() != Token::Comma {
                break;
            }
            self.advance();
        }
        self.expect(Token::RBracket, "`]`")?;
        Ok(Annotation::Literal(values))
    }
}

impl FromStr for Annotation {
    type Err = AnnotationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            tokens: tokenize(s)?,
            pos: 0,
        };
        let annotation = parser.parse_union()?;
        if *parser.peek() != Token::Eof {
            return Err(parser.unexpected("end of input"));
        }
        Ok(annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Annotation {
        s.parse().unwrap()
    }

    #[test]
    fn test_scalars_and_containers() {
        assert_eq!(parse("int"), Annotation::int());
        assert_eq!(parse("List[Str]"), Annotation::list(Annotation::str()));
        assert_eq!(
            parse("dict[str, optional[float]]"),
            Annotation::dict(Annotation::optional(Annotation::float()))
        );
        assert_eq!(
            parse("tuple[int, str]"),
            Annotation::tuple([Annotation::int(), Annotation::str()])
        );
        assert_eq!(parse("tuple[int, ...]"), Annotation::var_tuple(Annotation::int()));
        assert_eq!(parse("set[float]"), Annotation::set(Annotation::float()));
    }

    #[test]
    fn test_unions_and_literals() {
        assert_eq!(
            parse("int | none"),
            Annotation::union([Annotation::int(), Annotation::None])
        );
        assert_eq!(
            parse("union[float, int]"),
            Annotation::union([Annotation::float(), Annotation::int()])
        );
        assert_eq!(
            parse(r#"literal["cat", 'dog', 3, true]"#),
            Annotation::Literal(vec![
                "cat".into(),
                "dog".into(),
                LiteralValue::Int(3),
                LiteralValue::Bool(true),
            ])
        );
    }

    #[test]
    fn test_display_parses_back() {
        let ann = parse(r#"dict[str, list[int | literal["a", -1]]]"#);
        assert_eq!(parse(&ann.to_string()), ann);
    }

    #[test]
    fn test_error_offsets() {
        let err = "list[int".parse::<Annotation>().unwrap_err();
        assert_eq!(err.offset, 8);

        let err = "list[integer]".parse::<Annotation>().unwrap_err();
        assert_eq!(err.offset, 5);
        assert!(err.message.contains("integer"));

        let err = "dict[int, str]".parse::<Annotation>().unwrap_err();
        assert_eq!(err.offset, 5);

        let err = "int str".parse::<Annotation>().unwrap_err();
        assert_eq!(err.offset, 4);
    }
}
