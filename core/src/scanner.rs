//! Scanner: turns condition source text into [`Token`]s.
//!
//! Errors are not raised immediately. They are handed to a caller-supplied
//! handler together with the byte offset where they occurred, and the scanner
//! keeps going. The parser decides which error to surface.

use crate::token::{is_reserved, Pos, Token, TokenKind};

/// Receives `(position, message)` for every lexical error.
pub type ErrorHandler<'h> = &'h mut dyn FnMut(Pos, &str);

/// Hand-written scanner over UTF-8 input.
pub struct Scanner<'a, 'h> {
    src: &'a str,
    offset: usize,
    handler: Option<ErrorHandler<'h>>,
    error_count: usize,
}

impl<'a, 'h> Scanner<'a, 'h> {
    /// Create a scanner. Without a handler, errors are only counted.
    pub fn new(src: &'a str, handler: Option<ErrorHandler<'h>>) -> Self {
        Self {
            src,
            offset: 0,
            handler,
            error_count: 0,
        }
    }

    /// Number of errors reported so far.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    fn error(&mut self, pos: Pos, msg: &str) {
        self.error_count += 1;
        if let Some(handler) = self.handler.as_mut() {
            handler(pos, msg);
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.offset += c.len_utf8();
            } else {
                break;
            }
        }
    }

    /// Scan the next token. Returns `Eof` forever once input is exhausted.
    pub fn scan(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.offset;
        let pos = Pos(start);

        let Some(c) = self.bump() else {
            return Token::new(TokenKind::Eof, "", pos);
        };

        match c {
            c if is_letter(c) => self.scan_identifier(start),
            '0'..='9' => self.scan_number(start),
            '"' => self.scan_string(start),
            '`' => self.scan_raw_string(start),
            '(' => Token::new(TokenKind::LParen, "(", pos),
            ')' => Token::new(TokenKind::RParen, ")", pos),
            ',' => Token::new(TokenKind::Comma, ",", pos),
            '!' => Token::new(TokenKind::Not, "!", pos),
            '&' => self.scan_double(c, TokenKind::And, pos),
            '|' => self.scan_double(c, TokenKind::Or, pos),
            other => {
                self.error(pos, &format!("illegal character {other:?}"));
                Token::new(TokenKind::Illegal, other.to_string(), pos)
            }
        }
    }

    fn scan_double(&mut self, c: char, kind: TokenKind, pos: Pos) -> Token {
        if self.peek() == Some(c) {
            self.bump();
            Token::new(kind, kind.as_str(), pos)
        } else {
            self.error(pos, &format!("illegal character {c:?}, did you mean \"{c}{c}\"?"));
            Token::new(TokenKind::Illegal, c.to_string(), pos)
        }
    }

    fn scan_identifier(&mut self, start: usize) -> Token {
        while let Some(c) = self.peek() {
            if is_letter(c) || c.is_numeric() {
                self.offset += c.len_utf8();
            } else {
                break;
            }
        }
        let text = &self.src[start..self.offset];
        let pos = Pos(start);

        if text == "true" || text == "false" {
            return Token::new(TokenKind::Bool, text, pos);
        }
        if is_reserved(text) {
            self.error(pos, &format!("reserved keyword `{text}` cannot be used"));
            return Token::new(TokenKind::Illegal, text, pos);
        }
        Token::new(TokenKind::Ident, text, pos)
    }

    fn scan_number(&mut self, start: usize) -> Token {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.offset += 1;
            } else {
                break;
            }
        }
        let text = &self.src[start..self.offset];
        if text.parse::<i64>().is_err() {
            self.error(Pos(start), "integer literal out of range");
        }
        Token::new(TokenKind::Int, text, Pos(start))
    }

    fn scan_string(&mut self, start: usize) -> Token {
        let pos = Pos(start);
        let mut value = String::new();

        loop {
            let Some(c) = self.bump() else {
                self.error(pos, "string literal not terminated");
                return Token::new(TokenKind::Illegal, &self.src[start..], pos);
            };
            match c {
                '"' => break,
                '\n' => {
                    self.error(pos, "string literal not terminated");
                    return Token::new(TokenKind::Illegal, &self.src[start..self.offset], pos);
                }
                '\\' => {
                    let esc_pos = Pos(self.offset - 1);
                    match self.scan_escape() {
                        Ok(decoded) => value.push(decoded),
                        Err(msg) => self.error(esc_pos, &msg),
                    }
                }
                c => value.push(c),
            }
        }

        Token::new(TokenKind::String, value, pos)
    }

    fn scan_escape(&mut self) -> Result<char, String> {
        let Some(c) = self.bump() else {
            return Err("escape sequence not terminated".to_string());
        };
        let decoded = match c {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0B}',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'x' => return self.scan_code_point(2, 16, 0x7F),
            'u' => return self.scan_code_point(4, 16, 0x10FFFF),
            'U' => return self.scan_code_point(8, 16, 0x10FFFF),
            '0'..='7' => {
                self.offset -= 1;
                return self.scan_code_point(3, 8, 0x7F);
            }
            other => return Err(format!("unknown escape sequence \\{other}")),
        };
        Ok(decoded)
    }

    fn scan_code_point(&mut self, digits: usize, radix: u32, max: u32) -> Result<char, String> {
        let mut value: u32 = 0;
        for _ in 0..digits {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(radix))
                .ok_or_else(|| "illegal character in escape sequence".to_string())?;
            self.offset += 1;
            value = value * radix + digit;
        }
        if value > max {
            return Err("escape sequence is invalid Unicode code point".to_string());
        }
        char::from_u32(value).ok_or_else(|| "escape sequence is invalid Unicode code point".into())
    }

    fn scan_raw_string(&mut self, start: usize) -> Token {
        let pos = Pos(start);
        let mut value = String::new();

        loop {
            match self.bump() {
                Some('`') => break,
                Some('\r') => {}
                Some(c) => value.push(c),
                None => {
                    self.error(pos, "raw string literal not terminated");
                    return Token::new(TokenKind::Illegal, &self.src[start..], pos);
                }
            }
        }

        Token::new(TokenKind::String, value, pos)
    }
}

fn is_letter(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

/// Scan `src` to completion, returning every token up to and including `Eof`.
///
/// Errors are collected as `(position, message)` pairs.
#[must_use]
pub fn tokenize(src: &str) -> (Vec<Token>, Vec<(Pos, String)>) {
    let mut errors = Vec::new();
    let mut tokens = Vec::new();
    {
        let mut collect = |pos: Pos, msg: &str| errors.push((pos, msg.to_string()));
        let handler: ErrorHandler<'_> = &mut collect;
        let mut scanner = Scanner::new(src, Some(handler));
        loop {
            let tok = scanner.scan();
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
    }
    (tokens, errors)
}
