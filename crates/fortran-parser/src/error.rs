// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parse results and syntax errors.

use fortran_syntax::{Span, SyntaxTree, Token, TokenKind};
use thiserror::Error;

/// Result of parsing: the tree plus any errors found.
///
/// A tree is always produced; malformed input ends up in
/// [`NodeKind::Error`](fortran_syntax::NodeKind::Error) nodes.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub tree: SyntaxTree,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    /// Returns true if parsing completed without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A syntax error with location and an optional fix-it hint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },

    #[error("unexpected character `{0}`")]
    UnknownCharacter(String),

    #[error("unterminated character literal")]
    UnterminatedString,

    #[error("missing `{0}`")]
    MissingEnd(String),

    #[error("`{found}` does not match `{expected}`")]
    MismatchedEnd { expected: String, found: String },

    #[error("`{0}` has no matching construct here")]
    Misplaced(String),

    #[error("comparison operators cannot be chained")]
    ChainedComparison,

    #[error("unsupported construct: {0}")]
    Unsupported(String),

    #[error("unrecognised statement")]
    UnknownStatement,

    #[error("nesting too deep: more than {0} levels")]
    NestingTooDeep(usize),
}

impl ParseErrorKind {
    /// Errors that stand for lexer-level problems.
    pub fn is_lexical(&self) -> bool {
        matches!(self, ParseErrorKind::UnknownCharacter(_) | ParseErrorKind::UnterminatedString)
    }
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span, hint: None }
    }

    /// "expected X, found Y". An unknown token is reported as what it is
    /// instead.
    pub(crate) fn expected(expected: &str, found: &Token) -> Self {
        if found.kind == TokenKind::Unknown {
            return Self::unknown(found);
        }
        let hint = crate::hints::for_expected(expected, found.kind).map(String::from);
        Self {
            kind: ParseErrorKind::Expected {
                expected: expected.to_string(),
                found: describe(found),
            },
            span: found.span,
            hint,
        }
    }

    pub(crate) fn unknown(token: &Token) -> Self {
        if token.text.starts_with(['\'', '"']) {
            Self::new(ParseErrorKind::UnterminatedString, token.span)
                .with_hint(format!("add a closing {}", &token.text[..1]))
        } else {
            Self::new(ParseErrorKind::UnknownCharacter(token.text.to_string()), token.span)
        }
    }

    pub(crate) fn unsupported(what: &str, span: Span) -> Self {
        let hint = crate::hints::for_unsupported(what).map(String::from);
        Self { kind: ParseErrorKind::Unsupported(what.to_string()), span, hint }
    }

    pub(crate) fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Describe a token for "found ..." messages: names and literals are
/// quoted, everything else uses its display name.
fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Name
        | TokenKind::IntLiteral
        | TokenKind::RealLiteral
        | TokenKind::LogicalLiteral
        | TokenKind::DotOperator => format!("`{}`", token.text),
        _ => token.kind.display_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, Span::new(4, 4 + text.len()), 1, 5)
    }

    #[test]
    fn expected_message_quotes_names() {
        let err = ParseError::expected("'='", &tok(TokenKind::Name, "foo"));
        assert_eq!(err.to_string(), "expected '=', found `foo`");
        assert_eq!(err.span, Span::new(4, 7));
    }

    #[test]
    fn unknown_tokens_report_themselves() {
        let err = ParseError::expected("an expression", &tok(TokenKind::Unknown, "@"));
        assert_eq!(err.kind, ParseErrorKind::UnknownCharacter("@".into()));
        let err = ParseError::expected("an expression", &tok(TokenKind::Unknown, "'abc"));
        assert_eq!(err.kind, ParseErrorKind::UnterminatedString);
        assert!(err.kind.is_lexical());
        assert_eq!(err.hint.as_deref(), Some("add a closing '"));
    }
}
