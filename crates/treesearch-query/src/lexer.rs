//! Query-text lexer. Whitespace-insignificant; `//` and `#` start line
//! comments inside queries.

use crate::error::{QueryError, QueryResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tok {
    Ident(String),
    Str(String),
    Match,
    Except,
    Optional,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Amp,
    Eq,
    NotEq,
    Tilde,
    NotTilde,
    Dot,
    Arrow,       // ->
    NegArrow,    // !->
    EdgeOpen,    // -[
    NegEdgeOpen, // !-[
    EdgeClose,   // ]->
    PrecBefore,      // <<
    PrecImmBefore,   // <
    PrecAfter,       // >>
    PrecImmAfter,    // >
    Eof,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub tok: Tok,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.advance();
                }
                Some(b'#') => {
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.src[self.pos..].starts_with(s.as_bytes())
    }

    pub fn tokenize(mut self) -> QueryResult<Vec<Spanned>> {
        let mut out = Vec::new();
        loop {
            self.skip_trivia();
            let (line, column) = (self.line, self.col);
            let Some(b) = self.peek_byte() else {
                out.push(Spanned {
                    tok: Tok::Eof,
                    line,
                    column,
                });
                break;
            };

            let tok = if self.starts_with("!->") {
                self.pos += 3;
                self.col += 3;
                Tok::NegArrow
            } else if self.starts_with("!-[") {
                self.pos += 3;
                self.col += 3;
                Tok::NegEdgeOpen
            } else if self.starts_with("]->") {
                self.pos += 3;
                self.col += 3;
                Tok::EdgeClose
            } else if self.starts_with("->") {
                self.pos += 2;
                self.col += 2;
                Tok::Arrow
            } else if self.starts_with("-[") {
                self.pos += 2;
                self.col += 2;
                Tok::EdgeOpen
            } else if self.starts_with("<<") {
                self.pos += 2;
                self.col += 2;
                Tok::PrecBefore
            } else if self.starts_with(">>") {
                self.pos += 2;
                self.col += 2;
                Tok::PrecAfter
            } else if self.starts_with("!=") {
                self.pos += 2;
                self.col += 2;
                Tok::NotEq
            } else if self.starts_with("!~") {
                self.pos += 2;
                self.col += 2;
                Tok::NotTilde
            } else if b == b'"' {
                self.lex_string(line, column)?
            } else if b.is_ascii_alphabetic() || b == b'_' {
                self.lex_ident()
            } else {
                self.advance();
                match b {
                    b'{' => Tok::LBrace,
                    b'}' => Tok::RBrace,
                    b'[' => Tok::LBracket,
                    b']' => Tok::RBracket,
                    b';' => Tok::Semi,
                    b'&' => Tok::Amp,
                    b'=' => Tok::Eq,
                    b'~' => Tok::Tilde,
                    b'.' => Tok::Dot,
                    b'<' => Tok::PrecImmBefore,
                    b'>' => Tok::PrecImmAfter,
                    other => {
                        return Err(QueryError::syntax(
                            line,
                            column,
                            format!("unexpected character `{}`", other as char),
                        ))
                    }
                }
            };

            out.push(Spanned { tok, line, column });
        }
        Ok(out)
    }

    fn lex_ident(&mut self) -> Tok {
        let start = self.pos;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap();
        match text {
            "MATCH" => Tok::Match,
            "EXCEPT" => Tok::Except,
            "OPTIONAL" => Tok::Optional,
            _ => Tok::Ident(text.to_string()),
        }
    }

    fn lex_string(&mut self, line: usize, column: usize) -> QueryResult<Tok> {
        self.advance(); // opening quote
        let mut buf: Vec<u8> = Vec::new();
        loop {
            match self.advance() {
                None => {
                    return Err(QueryError::syntax(line, column, "unterminated string literal"))
                }
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(b'"') => buf.push(b'"'),
                    Some(b'\\') => buf.push(b'\\'),
                    Some(b'n') => buf.push(b'\n'),
                    Some(b't') => buf.push(b'\t'),
                    Some(other) => buf.push(other),
                    None => {
                        return Err(QueryError::syntax(
                            line,
                            column,
                            "unterminated escape sequence",
                        ))
                    }
                },
                Some(b) => buf.push(b),
            }
        }
        let s = String::from_utf8(buf).map_err(|_| {
            QueryError::syntax(line, column, "string literal is not valid UTF-8")
        })?;
        Ok(Tok::Str(s))
    }
}
