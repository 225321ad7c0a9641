//! Tokenizer for filter expressions.

use crate::error::FilterError;

/// Byte range of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    Minus,
    LParen,
    RParen,
    Eof,
}

impl TokenKind {
    /// Human-readable form for error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => format!("'{s}'"),
            Self::Ident(name) => name.clone(),
            Self::True => "true".into(),
            Self::False => "false".into(),
            Self::Null => "null".into(),
            Self::Eq => "==".into(),
            Self::Ne => "!=".into(),
            Self::Lt => "<".into(),
            Self::Le => "<=".into(),
            Self::Gt => ">".into(),
            Self::Ge => ">=".into(),
            Self::And => "&&".into(),
            Self::Or => "||".into(),
            Self::Not => "!".into(),
            Self::Minus => "-".into(),
            Self::LParen => "(".into(),
            Self::RParen => ")".into(),
            Self::Eof => "end of input".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

/// Split `source` into tokens, ending with [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, FilterError> {
    Lexer {
        source,
        bytes: source.as_bytes(),
        pos: 0,
    }
    .run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Lexer<'_> {
    fn run(mut self) -> Result<Vec<Token>, FilterError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(&byte) = self.bytes.get(self.pos) else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span { start, end: start },
                });
                return Ok(tokens);
            };

            let kind = match byte {
                b'(' => self.single(TokenKind::LParen),
                b')' => self.single(TokenKind::RParen),
                b'-' => self.single(TokenKind::Minus),
                b'=' => {
                    // `=`, `==` and `===` all mean equality.
                    self.pos += 1;
                    while self.peek() == Some(b'=') && self.pos - start < 3 {
                        self.pos += 1;
                    }
                    TokenKind::Eq
                }
                b'!' => {
                    self.pos += 1;
                    if self.peek() == Some(b'=') {
                        self.pos += 1;
                        if self.peek() == Some(b'=') {
                            self.pos += 1;
                        }
                        TokenKind::Ne
                    } else {
                        TokenKind::Not
                    }
                }
                b'<' => self.with_optional_eq(TokenKind::Lt, TokenKind::Le),
                b'>' => self.with_optional_eq(TokenKind::Gt, TokenKind::Ge),
                b'&' => self.doubled(b'&', TokenKind::And)?,
                b'|' => self.doubled(b'|', TokenKind::Or)?,
                b'\'' | b'"' => self.string(byte)?,
                b'0'..=b'9' => self.number()?,
                b'.' if self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit) => {
                    self.number()?
                }
                b if b == b'_' || b.is_ascii_alphabetic() => self.word(),
                _ => {
                    let ch = self.source[start..].chars().next().unwrap_or('?');
                    return Err(FilterError::new(start, format!("unexpected character '{ch}'")));
                }
            };

            tokens.push(Token {
                kind,
                span: Span {
                    start,
                    end: self.pos,
                },
            });
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn with_optional_eq(&mut self, bare: TokenKind, with_eq: TokenKind) -> TokenKind {
        self.pos += 1;
        if self.peek() == Some(b'=') {
            self.pos += 1;
            with_eq
        } else {
            bare
        }
    }

    fn doubled(&mut self, byte: u8, kind: TokenKind) -> Result<TokenKind, FilterError> {
        let start = self.pos;
        self.pos += 1;
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(kind)
        } else {
            Err(FilterError::new(
                start,
                format!("expected '{0}{0}'", byte as char),
            ))
        }
    }

    fn string(&mut self, quote: u8) -> Result<TokenKind, FilterError> {
        let start = self.pos;
        self.pos += 1;
        let source = self.source;
        let mut text = String::new();
        let mut chars = source[self.pos..].char_indices();
        while let Some((offset, ch)) = chars.next() {
            match ch {
                c if c as u32 == quote as u32 => {
                    self.pos += offset + 1;
                    return Ok(TokenKind::Str(text));
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => text.push('\n'),
                    Some((_, 't')) => text.push('\t'),
                    Some((_, escaped)) => text.push(escaped),
                    None => break,
                },
                c => text.push(c),
            }
        }
        Err(FilterError::new(start, "unterminated string"))
    }

    fn number(&mut self) -> Result<TokenKind, FilterError> {
        let start = self.pos;
        let mut is_float = false;
        self.digits();
        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            self.digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if self.peek().is_some_and(|b| b.is_ascii_digit()) {
                is_float = true;
                self.digits();
            } else {
                self.pos = mark;
            }
        }

        let text = &self.source[start..self.pos];
        if self.peek().is_some_and(|b| b == b'_' || b.is_ascii_alphabetic()) {
            return Err(FilterError::new(start, format!("invalid number '{text}'")));
        }
        if !is_float && let Ok(value) = text.parse::<i64>() {
            return Ok(TokenKind::Int(value));
        }
        text.parse::<f64>()
            .map(TokenKind::Float)
            .map_err(|_| FilterError::new(start, format!("invalid number '{text}'")))
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn word(&mut self) -> TokenKind {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b == b'_' || b.is_ascii_alphanumeric())
        {
            self.pos += 1;
        }
        match &self.source[start..self.pos] {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            name => TokenKind::Ident(name.to_owned()),
        }
    }
}
