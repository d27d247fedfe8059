//! Tokens of the condition language.
//!
//! The scanner turns source text into a stream of [`Token`]s, each tagged with
//! the byte offset ([`Pos`]) where it starts.

use std::fmt;

/// Byte offset into the condition source text (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos(pub usize);

impl Pos {
    /// The raw byte offset.
    #[must_use]
    pub fn offset(self) -> usize {
        self.0
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Malformed input, reserved keyword, or stray character.
    Illegal,
    /// End of input.
    Eof,

    /// `req_path_in`, `a`, ...
    Ident,
    /// `"abc"` or `` `abc` `` (value is the decoded string).
    String,
    /// `true` / `false`.
    Bool,
    /// `12345`.
    Int,

    /// `&&`
    And,
    /// `||`
    Or,
    /// `!`
    Not,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
}

impl TokenKind {
    /// Returns `true` for literal kinds that may appear as call arguments.
    #[must_use]
    pub fn is_literal(self) -> bool {
        matches!(self, Self::String | Self::Bool | Self::Int)
    }

    /// Symbolic text for operators and delimiters, a category name otherwise.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Illegal => "ILLEGAL",
            Self::Eof => "EOF",
            Self::Ident => "IDENT",
            Self::String => "STRING",
            Self::Bool => "BOOL",
            Self::Int => "INT",
            Self::And => "&&",
            Self::Or => "||",
            Self::Not => "!",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Comma => ",",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scanned token: kind, text, and start position.
///
/// For `String` tokens `text` holds the decoded value; for every other kind it
/// is the source text of the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lexical category.
    pub kind: TokenKind,
    /// Token text (decoded for strings).
    pub text: String,
    /// Start offset in the source.
    pub pos: Pos,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, text: impl Into<String>, pos: Pos) -> Self {
        Self {
            kind,
            text: text.into(),
            pos,
        }
    }
}

/// Words that may not be used as identifiers.
///
/// Rejecting them keeps rule text portable to tooling that embeds conditions
/// in general-purpose source files.
pub const RESERVED_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Returns `true` if `ident` is a reserved keyword.
#[must_use]
pub fn is_reserved(ident: &str) -> bool {
    RESERVED_KEYWORDS.contains(&ident)
}
