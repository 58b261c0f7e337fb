//! SQL tokens.
//!
//! Keywords are not a separate token kind: an identifier carries its
//! canonical upper-case form alongside the original spelling, and the
//! parser matches keywords against the upper-case form. Every token
//! remembers its byte position for syntax errors.

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Identifier,
    /// Unsigned or signed numeric literal, optionally with one dot.
    Number,
    /// Single-quoted string literal ('' unescaped to ').
    Str,
    /// One- or two-character symbol.
    Symbol,
    /// End of input.
    Eof,
}

/// One lexed token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Original text (string literals hold the unescaped value).
    pub text: String,
    /// Canonical upper-case form, used for keyword matching.
    pub upper: String,
    /// Byte offset of the token in the input.
    pub position: usize,
}

impl Token {
    pub fn eof(position: usize) -> Token {
        Token {
            kind: TokenKind::Eof,
            text: String::new(),
            upper: String::new(),
            position,
        }
    }

    /// Is this identifier the given keyword (case-insensitive)?
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Identifier && self.upper == keyword
    }

    /// Is this the given symbol text?
    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == symbol
    }
}
