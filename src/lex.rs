use std::fmt::Display;

use crate::error::{LangError, span};

pub const KEYWORDS: [&str; 4] = ["let", "if", "then", "else"];

const TWO_CHAR_OPERATORS: [&str; 5] = ["->", ":=", "<=", ">=", "!="];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Operator,
    Number,
    Paren,
    Ident,
    Symbol,
    Keyword,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Operator => write!(f, "OP"),
            TokenKind::Number => write!(f, "NUM"),
            TokenKind::Paren => write!(f, "PAREN"),
            TokenKind::Ident => write!(f, "IDENT"),
            TokenKind::Symbol => write!(f, "SYMBOL"),
            TokenKind::Keyword => write!(f, "KEYWORD"),
        }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.kind, self.literal, self.offset)
    }
}

impl Token<'_> {
    pub fn is(&self, kind: TokenKind, literals: &[&str]) -> bool {
        self.kind == kind && (literals.is_empty() || literals.contains(&self.literal))
    }

    pub fn end(&self) -> usize {
        self.offset + self.literal.len()
    }
}

fn is_ident_char(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
}

pub struct Lexer<'de> {
    rest: &'de str,
    pub byte: usize,
}

impl<'de> Lexer<'de> {
    pub fn new(input: &'de str) -> Self {
        Lexer {
            rest: input,
            byte: 0,
        }
    }

    fn take(&mut self, len: usize, kind: TokenKind) -> Token<'de> {
        let token = Token {
            kind,
            literal: &self.rest[..len],
            offset: self.byte,
        };
        self.rest = &self.rest[len..];
        self.byte += len;
        token
    }

    fn skip(&mut self, len: usize) {
        self.rest = &self.rest[len..];
        self.byte += len;
    }

    /// Keywords win on a plain prefix match, so `letx` lexes as `let x`.
    fn keyword(&self) -> Option<&'static str> {
        KEYWORDS
            .into_iter()
            .find(|keyword| self.rest.starts_with(keyword))
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, LangError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let c = self.rest.chars().next()?;

            if matches!(c, ' ' | '\t' | '\r' | '\n') {
                self.skip(1);
                continue;
            }

            if let Some(keyword) = self.keyword() {
                return Some(Ok(self.take(keyword.len(), TokenKind::Keyword)));
            }

            if c.is_ascii_digit() {
                let len = self
                    .rest
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(self.rest.len());
                return Some(Ok(self.take(len, TokenKind::Number)));
            }

            if self.rest.starts_with("--") {
                let len = self
                    .rest
                    .find(['\n', '\r'])
                    .unwrap_or(self.rest.len());
                self.skip(len);
                continue;
            }

            let token = match c {
                '\\' | ';' => self.take(1, TokenKind::Symbol),
                _ if TWO_CHAR_OPERATORS.iter().any(|op| self.rest.starts_with(op)) => {
                    self.take(2, TokenKind::Operator)
                }
                '=' | '+' | '-' | '*' | '/' | '<' | '>' => self.take(1, TokenKind::Operator),
                '(' | ')' | '{' | '}' => self.take(1, TokenKind::Paren),
                c if is_ident_char(c) => {
                    let len = self
                        .rest
                        .find(|c: char| !is_ident_char(c))
                        .unwrap_or(self.rest.len());
                    self.take(len, TokenKind::Ident)
                }
                c => {
                    let err = LangError::UnexpectedCharacter {
                        ch: c,
                        span: span(self.byte, c.len_utf8()),
                    };
                    self.skip(c.len_utf8());
                    return Some(Err(err));
                }
            };
            return Some(Ok(token));
        }
    }
}

/// Lexes the whole source, stopping at the first error.
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LangError> {
    Lexer::new(source).collect()
}
