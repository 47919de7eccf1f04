// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Operator classification shared by the parser and later passes.

use crate::token::{Token, TokenKind};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Eqv,
    Neqv,
    /// A user-defined `.op.`.
    Defined,
}

impl BinaryOp {
    /// Classify an operator token. Any unrecognised dot operator is a
    /// defined operator.
    pub fn from_token(token: &Token) -> Option<BinaryOp> {
        Some(match token.kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Power => BinaryOp::Pow,
            TokenKind::Concat => BinaryOp::Concat,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::SlashEq => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::GtEq => BinaryOp::Ge,
            TokenKind::DotOperator => match dot_name(&token.text).as_str() {
                "eq" => BinaryOp::Eq,
                "ne" => BinaryOp::Ne,
                "lt" => BinaryOp::Lt,
                "le" => BinaryOp::Le,
                "gt" => BinaryOp::Gt,
                "ge" => BinaryOp::Ge,
                "and" => BinaryOp::And,
                "or" => BinaryOp::Or,
                "eqv" => BinaryOp::Eqv,
                "neqv" => BinaryOp::Neqv,
                "not" => return None,
                _ => BinaryOp::Defined,
            },
            _ => return None,
        })
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Pow)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Eqv | BinaryOp::Neqv)
    }

    /// Word used in diagnostics ("addition expression").
    pub fn describe(self) -> &'static str {
        match self {
            BinaryOp::Add => "addition",
            BinaryOp::Sub => "subtraction",
            BinaryOp::Mul => "multiplication",
            BinaryOp::Div => "division",
            BinaryOp::Pow => "power",
            BinaryOp::Concat => "concatenation",
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Le
            | BinaryOp::Gt
            | BinaryOp::Ge => "binary relation",
            BinaryOp::And | BinaryOp::Or | BinaryOp::Eqv | BinaryOp::Neqv => "logical",
            BinaryOp::Defined => "defined operator",
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    Defined,
}

impl UnaryOp {
    pub fn from_token(token: &Token) -> Option<UnaryOp> {
        match token.kind {
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::DotOperator => match dot_name(&token.text).as_str() {
                "not" => Some(UnaryOp::Not),
                "eq" | "ne" | "lt" | "le" | "gt" | "ge" | "and" | "or" | "eqv" | "neqv" => None,
                _ => Some(UnaryOp::Defined),
            },
            _ => None,
        }
    }
}

/// `.AND.` → `and`
fn dot_name(text: &str) -> String {
    text.trim_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Span;

    fn tok(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, Span::new(0, text.len()), 1, 1)
    }

    #[test]
    fn dot_operators_ignore_case() {
        assert_eq!(BinaryOp::from_token(&tok(TokenKind::DotOperator, ".EQ.")), Some(BinaryOp::Eq));
        assert_eq!(BinaryOp::from_token(&tok(TokenKind::DotOperator, ".Or.")), Some(BinaryOp::Or));
        assert_eq!(BinaryOp::from_token(&tok(TokenKind::DotOperator, ".cross.")), Some(BinaryOp::Defined));
        assert_eq!(BinaryOp::from_token(&tok(TokenKind::DotOperator, ".not.")), None);
        assert_eq!(UnaryOp::from_token(&tok(TokenKind::DotOperator, ".NOT.")), Some(UnaryOp::Not));
        assert_eq!(UnaryOp::from_token(&tok(TokenKind::DotOperator, ".and.")), None);
    }

    #[test]
    fn symbolic_relations_match_dot_forms() {
        assert_eq!(BinaryOp::from_token(&tok(TokenKind::SlashEq, "/=")), Some(BinaryOp::Ne));
        assert!(BinaryOp::Le.is_relational());
        assert!(!BinaryOp::Concat.is_relational());
    }
}
