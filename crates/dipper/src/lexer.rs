//! Tokenizer for Dipper source text.
//!
//! Newlines are significant (they terminate statements) and are emitted as
//! tokens; the parser decides where they matter. Comments run from `#` to
//! end of line. Integer literals take an optional `i` suffix, float
//! literals an optional `f` suffix.

use crate::errors::{ParseError, SourcePos};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),

    // keywords
    Fn,
    Struct,
    If,
    Elif,
    Else,
    For,
    In,
    Return,
    Print,

    // punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Dot,
    DotDot,
    Arrow,

    // operators
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Lte,
    Gte,

    Newline,
    Eof,
}

impl Token {
    /// Short form for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Int(v) => format!("integer {v}"),
            Self::Float(v) => format!("float {v}"),
            Self::Str(_) => "string literal".to_owned(),
            Self::Ident(name) => format!("'{name}'"),
            Self::Newline => "end of line".to_owned(),
            Self::Eof => "end of file".to_owned(),
            other => format!("{other:?}"),
        }
    }
}

/// A token with the position of its first character.
#[derive(Debug, Clone)]
pub struct TokenPos {
    pub token: Token,
    pub pos: SourcePos,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    col: u32,
}

/// Tokenizes a whole source file. The output always ends with `Eof`.
pub fn tokenize(source: &str) -> Result<Vec<TokenPos>, ParseError> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
        col: 1,
    };
    let mut tokens = Vec::new();
    while let Some(tok) = lexer.next_token()? {
        tokens.push(tok);
    }
    tokens.push(TokenPos {
        token: Token::Eof,
        pos: lexer.pos(),
    });
    Ok(tokens)
}

impl Lexer<'_> {
    fn pos(&self) -> SourcePos {
        SourcePos::new(self.line, self.col)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn next_token(&mut self) -> Result<Option<TokenPos>, ParseError> {
        // skip horizontal whitespace and comments
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('#') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }

        let pos = self.pos();
        let Some(ch) = self.peek() else {
            return Ok(None);
        };

        let token = match ch {
            '\n' => {
                self.bump();
                Token::Newline
            }
            '"' => self.string(pos)?,
            '0'..='9' => self.number(pos)?,
            'a'..='z' | 'A'..='Z' | '_' => self.ident(),
            _ => self.symbol(pos)?,
        };
        Ok(Some(TokenPos { token, pos }))
    }

    fn string(&mut self, pos: SourcePos) -> Result<Token, ParseError> {
        self.bump(); // opening quote
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Token::Str(text)),
                Some('\n') | None => {
                    return Err(ParseError::new("unterminated string literal", pos))
                }
                Some(ch) => text.push(ch),
            }
        }
    }

    fn number(&mut self, pos: SourcePos) -> Result<Token, ParseError> {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }

        // a '.' introduces a fraction only when followed by a digit;
        // ".." belongs to the enclosing range expression
        let mut is_float = false;
        if self.peek() == Some('.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(char::is_ascii_digit) {
                is_float = true;
                text.push('.');
                self.bump();
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                        self.bump();
                    } else {
                        break;
                    }
                }
            }
        }

        if self.eat('f') {
            is_float = true;
        } else if self.eat('i') {
            if is_float {
                return Err(ParseError::new("'i' suffix on a float literal", pos));
            }
        }

        if is_float {
            text.parse()
                .map(Token::Float)
                .map_err(|_| ParseError::new(format!("bad float literal '{text}'"), pos))
        } else {
            text.parse()
                .map(Token::Int)
                .map_err(|_| ParseError::new(format!("bad integer literal '{text}'"), pos))
        }
    }

    fn ident(&mut self) -> Token {
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        match text.as_str() {
            "fn" => Token::Fn,
            "struct" => Token::Struct,
            "if" => Token::If,
            "elif" => Token::Elif,
            "else" => Token::Else,
            "for" => Token::For,
            "in" => Token::In,
            "return" => Token::Return,
            "print" => Token::Print,
            _ => Token::Ident(text),
        }
    }

    fn symbol(&mut self, pos: SourcePos) -> Result<Token, ParseError> {
        let ch = self.bump().expect("symbol() called with a pending char");
        let token = match ch {
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ':' => Token::Colon,
            ',' => Token::Comma,
            '.' => {
                if self.eat('.') {
                    Token::DotDot
                } else {
                    Token::Dot
                }
            }
            '=' => {
                if self.eat('=') {
                    Token::EqEq
                } else {
                    Token::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    Token::NotEq
                } else {
                    return Err(ParseError::new("unexpected character '!'", pos));
                }
            }
            '<' => {
                if self.eat('=') {
                    Token::Lte
                } else {
                    Token::Lt
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Gte
                } else {
                    Token::Gt
                }
            }
            '+' => {
                if self.eat('=') {
                    Token::PlusAssign
                } else {
                    Token::Plus
                }
            }
            '-' => {
                if self.eat('=') {
                    Token::MinusAssign
                } else if self.eat('>') {
                    Token::Arrow
                } else {
                    Token::Minus
                }
            }
            '*' => {
                if self.eat('=') {
                    Token::StarAssign
                } else {
                    Token::Star
                }
            }
            '/' => {
                if self.eat('=') {
                    Token::SlashAssign
                } else {
                    Token::Slash
                }
            }
            other => {
                return Err(ParseError::new(
                    format!("unexpected character '{other}'"),
                    pos,
                ))
            }
        };
        Ok(token)
    }
}
