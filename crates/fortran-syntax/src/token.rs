// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Token definitions for the lexer.
//!
//! Keywords are not reserved in Fortran, so every word lexes as
//! [`TokenKind::Name`]; the parser recognises keywords by position and
//! compares them case-insensitively with [`Token::is_keyword`].

use compact_str::CompactString;

use crate::Span;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    /// Source text exactly as written, casing preserved.
    pub text: CompactString,
    pub span: Span,
    /// 1-based line of the first byte.
    pub line: u32,
    /// 1-based byte column of the first byte.
    pub col: u32,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<CompactString>, span: Span, line: u32, col: u32) -> Self {
        Self { kind, text: text.into(), span, line, col }
    }

    /// True if this is a name spelled like `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Name && self.text.eq_ignore_ascii_case(keyword)
    }

    pub fn is_trivia(&self) -> bool {
        self.kind.is_trivia()
    }

    /// Lowercased text, the form used for every name comparison.
    pub fn key(&self) -> CompactString {
        self.text.to_ascii_lowercase().into()
    }
}

/// The kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    // Words and literals
    Name,
    IntLiteral,
    RealLiteral,
    StringLiteral,
    /// `.true.` / `.false.`, optionally with a kind suffix.
    LogicalLiteral,
    /// `.and.`, `.eq.`, ... and user-defined `.op.` operators.
    DotOperator,

    // Operators
    Plus,
    Minus,
    Star,
    /// `**`
    Power,
    Slash,
    /// `//`
    Concat,
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `/=`
    SlashEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `=>`
    Arrow,
    Percent,

    // Delimiters
    LParen,
    RParen,
    /// `(/`
    LArrayParen,
    /// `/)`
    RArrayParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    ColonColon,
    Semi,

    // Layout
    Newline,
    Whitespace,
    Comment,
    /// A continuation marker: free-form `&`, the fixed-form column-6 field,
    /// or a line break joined to the next line.
    Continuation,

    /// Input the lexer could not classify.
    Unknown,
    Eof,
}

impl TokenKind {
    /// Trivia tokens carry no grammar meaning but stay in the tree.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Comment | TokenKind::Continuation)
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::RealLiteral
                | TokenKind::StringLiteral
                | TokenKind::LogicalLiteral
        )
    }

    /// Tokens that end a statement.
    pub fn is_terminator(self) -> bool {
        matches!(self, TokenKind::Newline | TokenKind::Semi | TokenKind::Eof)
    }

    /// Get a human-readable name for error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            TokenKind::Name => "a name",
            TokenKind::IntLiteral => "an integer literal",
            TokenKind::RealLiteral => "a real literal",
            TokenKind::StringLiteral => "a character literal",
            TokenKind::LogicalLiteral => "a logical literal",
            TokenKind::DotOperator => "a dot operator",

            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Power => "'**'",
            TokenKind::Slash => "'/'",
            TokenKind::Concat => "'//'",
            TokenKind::Eq => "'='",
            TokenKind::EqEq => "'=='",
            TokenKind::SlashEq => "'/='",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::Arrow => "'=>'",
            TokenKind::Percent => "'%'",

            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LArrayParen => "'(/'",
            TokenKind::RArrayParen => "'/)'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::ColonColon => "'::'",
            TokenKind::Semi => "';'",

            TokenKind::Newline => "end of line",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "a comment",
            TokenKind::Continuation => "a continuation",
            TokenKind::Unknown => "an unknown character",
            TokenKind::Eof => "end of file",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_match_ignores_case() {
        let tok = Token::new(TokenKind::Name, "SubRoutine", Span::new(0, 10), 1, 1);
        assert!(tok.is_keyword("subroutine"));
        assert!(!tok.is_keyword("function"));
        assert_eq!(tok.text, "SubRoutine");
        assert_eq!(tok.key(), "subroutine");
    }

    #[test]
    fn keywords_only_match_names() {
        let tok = Token::new(TokenKind::StringLiteral, "'end'", Span::new(0, 5), 1, 1);
        assert!(!tok.is_keyword("'end'"));
    }
}
