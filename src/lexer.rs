//! Single-pass Luau tokenizer.
//!
//! Lexing is permissive: an unterminated string or block comment consumes to
//! the end of the source and is surfaced as a tracing warning, never an
//! error. The emitted stream is lossless — every byte of the input, whitespace
//! and comments included, lands in exactly one token.

use tracing::warn;

use crate::names;
use crate::token::{Token, TokenKind};

/// Two-character operators, matched greedily after `...`.
const TWO_CHAR_OPERATORS: [&str; 8] = ["==", "~=", "<=", ">=", "..", "//", "<<", ">>"];

/// Single characters still classified as operators; everything else that is
/// not matched earlier becomes punctuation.
const SINGLE_CHAR_OPERATORS: &[u8] = b"+-*/%^#<>=&|~";

/// Tokenize Luau source into a contiguous, order-preserving token stream.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b.is_ascii_whitespace() {
                self.whitespace();
            } else if b == b'-' && self.peek(1) == Some(b'-') {
                self.comment();
            } else if b == b'"' || b == b'\'' {
                self.quoted_string(b);
            } else if b == b'[' && self.block_open_level(self.pos).is_some() {
                self.block_string();
            } else if b.is_ascii_digit() {
                self.number();
            } else if is_identifier_start(b) {
                self.identifier();
            } else {
                self.operator();
            }
        }
        debug_assert_eq!(crate::token::reconstruct(&self.tokens), self.src);
        self.tokens
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn char_at(&self, pos: usize) -> char {
        self.src[pos..].chars().next().unwrap_or('\u{0}')
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let text = &self.src[start..self.pos];
        self.tokens.push(Token::new(kind, text, start, self.pos));
    }

    fn whitespace(&mut self) {
        let start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        self.push(TokenKind::Whitespace, start);
    }

    /// Bracket level of a `[=*[` opener at `at`, or None if the sequence is
    /// incomplete and `[` is ordinary punctuation.
    fn block_open_level(&self, at: usize) -> Option<usize> {
        let mut i = at + 1;
        let mut level = 0;
        while self.bytes.get(i) == Some(&b'=') {
            level += 1;
            i += 1;
        }
        (self.bytes.get(i) == Some(&b'[')).then_some(level)
    }

    /// Advances past the matching `]=*]`. A close candidate with the wrong
    /// level is not a match and scanning continues past it. Returns the byte
    /// offset where the enclosed content ends and whether a close was found.
    fn consume_until_block_close(&mut self, level: usize) -> (usize, bool) {
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b']' {
                let mut i = self.pos + 1;
                let mut close_level = 0;
                while self.bytes.get(i) == Some(&b'=') {
                    close_level += 1;
                    i += 1;
                }
                if close_level == level && self.bytes.get(i) == Some(&b']') {
                    let content_end = self.pos;
                    self.pos = i + 1;
                    return (content_end, true);
                }
            }
            self.pos += 1;
        }
        (self.pos, false)
    }

    fn comment(&mut self) {
        let start = self.pos;
        self.pos += 2;
        if self.pos < self.bytes.len() && self.bytes[self.pos] == b'[' {
            if let Some(level) = self.block_open_level(self.pos) {
                self.pos += level + 2;
                let (_, closed) = self.consume_until_block_close(level);
                if !closed {
                    warn!(offset = start, "unterminated block comment");
                }
                self.push(TokenKind::Comment, start);
                return;
            }
        }
        // Line comment: runs to, but does not consume, the newline.
        while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
            self.pos += 1;
        }
        self.push(TokenKind::Comment, start);
    }

    fn quoted_string(&mut self, quote: u8) {
        let start = self.pos;
        self.pos += 1;
        let mut decoded = String::new();
        let mut closed = false;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b == quote {
                self.pos += 1;
                closed = true;
                break;
            }
            if b == b'\\' {
                // The escape consumes exactly one following character.
                self.pos += 1;
                if self.pos >= self.bytes.len() {
                    break;
                }
                let c = self.char_at(self.pos);
                decoded.push(resolve_escape(c));
                self.pos += c.len_utf8();
            } else {
                let c = self.char_at(self.pos);
                decoded.push(c);
                self.pos += c.len_utf8();
            }
        }
        if !closed {
            warn!(offset = start, "unterminated string literal");
        }
        let text = &self.src[start..self.pos];
        let mut token = Token::new(TokenKind::Str, text, start, self.pos);
        token.decoded = Some(decoded);
        self.tokens.push(token);
    }

    fn block_string(&mut self) {
        let start = self.pos;
        let level = self.block_open_level(self.pos).unwrap_or(0);
        self.pos += level + 2;
        let content_start = self.pos;
        let (content_end, closed) = self.consume_until_block_close(level);
        if !closed {
            warn!(offset = start, "unterminated block string");
        }
        let mut decoded = &self.src[content_start..content_end];
        // A long string drops one newline immediately after the opener.
        if let Some(rest) = decoded.strip_prefix("\r\n") {
            decoded = rest;
        } else if let Some(rest) = decoded.strip_prefix('\n') {
            decoded = rest;
        }
        let text = &self.src[start..self.pos];
        let mut token = Token::new(TokenKind::Str, text, start, self.pos);
        token.decoded = Some(decoded.to_string());
        self.tokens.push(token);
    }

    fn digits(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
    }

    fn number(&mut self) {
        let start = self.pos;
        if self.bytes[self.pos] == b'0' && matches!(self.peek(1), Some(b'x' | b'X')) {
            self.pos += 2;
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_hexdigit() {
                self.pos += 1;
            }
        } else {
            self.digits();
            if self.peek(0) == Some(b'.') && self.peek(1).is_some_and(|b| b.is_ascii_digit()) {
                self.pos += 1;
                self.digits();
            }
            if matches!(self.peek(0), Some(b'e' | b'E')) {
                // Exponent only when digits actually follow, so `1end` still
                // lexes as a number and a keyword.
                let mut i = self.pos + 1;
                if matches!(self.bytes.get(i), Some(b'+' | b'-')) {
                    i += 1;
                }
                if self.bytes.get(i).is_some_and(|b| b.is_ascii_digit()) {
                    self.pos = i;
                    self.digits();
                }
            }
        }
        self.push(TokenKind::Number, start);
    }

    fn identifier(&mut self) {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_identifier_part(self.bytes[self.pos]) {
            self.pos += 1;
        }
        let text = &self.src[start..self.pos];
        let kind = if names::is_keyword(text) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.push(kind, start);
    }

    fn operator(&mut self) {
        let start = self.pos;
        let rest = &self.src[self.pos..];
        if rest.starts_with("...") {
            self.pos += 3;
            self.push(TokenKind::Operator, start);
            return;
        }
        if let Some(op) = TWO_CHAR_OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            self.pos += op.len();
            self.push(TokenKind::Operator, start);
            return;
        }
        let c = self.char_at(self.pos);
        self.pos += c.len_utf8();
        let kind = if c.is_ascii() && SINGLE_CHAR_OPERATORS.contains(&(c as u8)) {
            TokenKind::Operator
        } else {
            TokenKind::Punct
        };
        self.push(kind, start);
    }
}

fn is_identifier_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_identifier_part(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn resolve_escape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        // `\"`, `\'`, `\\` and anything else resolve to the escaped
        // character itself.
        other => other,
    }
}
