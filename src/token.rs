//! Token model and token-stream helpers.

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Keyword,
    Str,
    Number,
    Comment,
    Operator,
    Punct,
    Whitespace,
}

/// A classified, positioned substring of the source text.
///
/// Tokens are contiguous and order-preserving: concatenating `text` over a
/// stream (whitespace and comments included) reproduces the original source
/// byte-for-byte. `start`/`end` are half-open byte offsets.
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
    pub end: usize,
    /// Literal content with escape sequences resolved; `Str` tokens only.
    pub decoded: Option<String>,
    /// Substitute text attached by rewrite passes.
    pub replacement: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            start,
            end,
            decoded: None,
            replacement: None,
        }
    }

    /// Text this token contributes to rewritten output.
    pub fn rendered(&self) -> &str {
        self.replacement.as_deref().unwrap_or(&self.text)
    }

    /// Whitespace and comments carry no lexical context.
    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// Concatenation of original token text; equals the tokenized source.
pub fn reconstruct(tokens: &[Token]) -> String {
    let mut out = String::with_capacity(tokens.iter().map(|t| t.text.len()).sum());
    for token in tokens {
        out.push_str(&token.text);
    }
    out
}

/// Concatenation of rendered token text, with replacements applied.
pub fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push_str(token.rendered());
    }
    out
}

/// Index of the nearest non-trivia token before `index`.
pub fn prev_significant(tokens: &[Token], index: usize) -> Option<usize> {
    tokens[..index].iter().rposition(|t| !t.is_trivia())
}

/// Index of the nearest non-trivia token after `index`.
pub fn next_significant(tokens: &[Token], index: usize) -> Option<usize> {
    tokens
        .get(index + 1..)?
        .iter()
        .position(|t| !t.is_trivia())
        .map(|offset| index + 1 + offset)
}
