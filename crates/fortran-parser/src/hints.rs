// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error hints - suggestions for fixing common mistakes.
//!
//! Kept separate from the main parser to avoid clutter.

use fortran_syntax::TokenKind;

/// Get a hint for an "expected X" error based on context.
pub fn for_expected(expected: &str, found: TokenKind) -> Option<&'static str> {
    match (expected, found) {
        // Parentheses
        ("')'", TokenKind::Newline | TokenKind::Eof) => Some("add ')' to close the parenthesis"),
        ("'/)'", TokenKind::Newline | TokenKind::Eof) => Some("close the array constructor with '/)'"),
        ("']'", TokenKind::Newline | TokenKind::Eof) => Some("close the array constructor with ']'"),
        ("'('", _) => None,

        // Names
        ("a name", TokenKind::IntLiteral) => Some("names can't start with a digit"),
        ("a name", TokenKind::Newline | TokenKind::Eof) => Some("this statement needs a name"),
        ("a name", _) => Some("names start with a letter"),

        // Expressions
        ("an expression", TokenKind::Newline | TokenKind::Semi | TokenKind::Eof) => {
            Some("statement is incomplete; continue it on the next line with '&'")
        }
        ("an expression", TokenKind::Eq) => Some("put the value after '='"),
        ("an expression", _) => Some("try a literal, a variable or a function reference"),

        // Statements
        ("'then'", TokenKind::Newline | TokenKind::Eof) => {
            Some("a block IF needs 'then'; a one-line IF needs a statement after the condition")
        }
        ("an action statement", _) => Some("a one-line IF can only guard a simple executable statement"),
        ("'='", _) => Some("assignments are written `name = value`"),
        ("'::'", _) => Some("separate attributes from the entity list with '::'"),
        ("a label", _) => Some("statement labels are 1 to 5 digits"),
        ("'/'", _) => Some("enclose DATA values and COMMON block names in slashes"),
        ("end of statement", TokenKind::Comma) => Some("a comma cannot follow this statement"),
        ("end of statement", _) => Some("separate statements with a newline or ';'"),

        _ => None,
    }
}

/// Get a hint for an unsupported construct.
pub fn for_unsupported(what: &str) -> Option<&'static str> {
    match what {
        "Hollerith constant" => Some("write the constant as a quoted character literal"),
        "DO statement without blanks" => Some("write it as `DO 10 I = 1, 10`"),
        "include line" => Some("include files are not expanded; parse the included file on its own"),
        _ => None,
    }
}
