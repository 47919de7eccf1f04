// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression parsing using Pratt parsing.

use fortran_syntax::{BinaryOp, Checkpoint, NodeKind, TokenKind, UnaryOp};

use crate::error::{ParseError, ParseErrorKind};
use crate::parser::{PResult, Parser};

/// Binding power of `.not.`.
const NOT_BP: u8 = 9;
/// Binding power of unary `+` and `-`.
const SIGN_BP: u8 = 17;
/// Binding power of a defined unary operator.
const DEFINED_UNARY_BP: u8 = 23;

/// Left and right binding power of each binary operator, lowest first.
/// Relational operators do not associate; `**` associates to the right.
pub fn infix_binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Defined => (1, 2),
        BinaryOp::Eqv | BinaryOp::Neqv => (3, 4),
        BinaryOp::Or => (5, 6),
        BinaryOp::And => (7, 8),
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => (11, 12),
        BinaryOp::Concat => (13, 14),
        BinaryOp::Add | BinaryOp::Sub => (15, 16),
        BinaryOp::Mul | BinaryOp::Div => (19, 20),
        BinaryOp::Pow => (22, 21),
    }
}

/// What an opening parenthesis in expression position starts.
enum ParenKind {
    Paren,
    Complex,
    ImpliedDo,
}

impl Parser<'_> {
    pub(crate) fn expr(&mut self) -> PResult {
        self.expr_bp(0)
    }

    fn expr_bp(&mut self, min_bp: u8) -> PResult {
        self.enter_nested()?;
        let cp = self.checkpoint();
        if let Some(rbp) = self.prefix_bp() {
            self.start(NodeKind::UnaryExpr);
            self.bump();
            self.expr_bp(rbp)?;
            self.finish();
        } else {
            self.primary()?;
        }

        let mut after_relational = false;
        loop {
            let Some(op) = self.infix_op() else {
                break;
            };
            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                break;
            }
            if op.is_relational() && after_relational {
                return Err(ParseError::new(ParseErrorKind::ChainedComparison, self.current().span)
                    .with_hint("join the comparisons with .and."));
            }
            after_relational = op.is_relational();

            self.start_at(cp, NodeKind::BinaryExpr);
            self.bump();
            self.expr_bp(r_bp)?;
            self.finish();
            self.check_expr_height()?;
        }
        Ok(())
    }

    fn prefix_bp(&self) -> Option<u8> {
        match UnaryOp::from_token(self.current())? {
            UnaryOp::Plus | UnaryOp::Minus => Some(SIGN_BP),
            UnaryOp::Not => Some(NOT_BP),
            UnaryOp::Defined => Some(DEFINED_UNARY_BP),
        }
    }

    fn infix_op(&self) -> Option<BinaryOp> {
        if self.no_slash && self.at(TokenKind::Slash) {
            return None;
        }
        BinaryOp::from_token(self.current())
    }

    fn primary(&mut self) -> PResult {
        match self.kind() {
            TokenKind::IntLiteral => {
                let int = self.current();
                let next = self.nth(1);
                if next.kind == TokenKind::Name
                    && next.span.start == int.span.end
                    && next.text.starts_with(['h', 'H'])
                {
                    return Err(ParseError::unsupported("Hollerith constant", int.span));
                }
                self.token_node(NodeKind::Literal);
                Ok(())
            }
            TokenKind::RealLiteral | TokenKind::StringLiteral | TokenKind::LogicalLiteral => {
                self.token_node(NodeKind::Literal);
                Ok(())
            }
            TokenKind::Name => self.designator(),
            TokenKind::LParen => self.with_slash(Self::paren_primary),
            TokenKind::LArrayParen => self.array_constructor(TokenKind::RArrayParen),
            TokenKind::LBracket => self.array_constructor(TokenKind::RBracket),
            _ => Err(ParseError::expected("an expression", self.current())),
        }
    }

    /// A name followed by any argument lists and component selections.
    pub(crate) fn designator(&mut self) -> PResult {
        let cp = self.checkpoint();
        self.name_ref()?;
        self.postfix(cp)
    }

    fn postfix(&mut self, cp: Checkpoint) -> PResult {
        loop {
            match self.kind() {
                TokenKind::LParen => {
                    self.start_at(cp, NodeKind::CallExpr);
                    self.arg_list()?;
                    self.finish();
                    self.check_expr_height()?;
                }
                TokenKind::Percent => {
                    self.start_at(cp, NodeKind::ComponentExpr);
                    self.bump();
                    self.expect(TokenKind::Name)?;
                    self.finish();
                    self.check_expr_height()?;
                }
                _ => return Ok(()),
            }
        }
    }

    /// Run `f` with `/` allowed as an operator again.
    fn with_slash(&mut self, f: impl FnOnce(&mut Self) -> PResult) -> PResult {
        let saved = std::mem::replace(&mut self.no_slash, false);
        let result = f(self);
        self.no_slash = saved;
        result
    }

    /// `(args)`
    pub(crate) fn arg_list(&mut self) -> PResult {
        self.start(NodeKind::ArgList);
        self.expect(TokenKind::LParen)?;
        self.with_slash(|p| {
            if !p.at(TokenKind::RParen) {
                loop {
                    p.arg()?;
                    if !p.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            Ok(())
        })?;
        self.expect(TokenKind::RParen)?;
        self.finish();
        Ok(())
    }

    /// `[keyword =] value`, where value may be a section subscript, `*` or
    /// an alternate-return label `*10`.
    pub(crate) fn arg(&mut self) -> PResult {
        self.start(NodeKind::Arg);
        if self.at(TokenKind::Name) && self.nth_kind(1) == TokenKind::Eq {
            self.bump();
            self.bump();
        }
        match self.kind() {
            TokenKind::Star if self.nth_kind(1) == TokenKind::IntLiteral => {
                self.bump();
                self.label_ref()?;
            }
            TokenKind::Star => self.bump(),
            TokenKind::Colon => {
                self.start(NodeKind::SectionSubscript);
                self.section_tail()?;
                self.finish();
            }
            _ => {
                let cp = self.checkpoint();
                self.expr()?;
                if self.at(TokenKind::Colon) {
                    self.start_at(cp, NodeKind::SectionSubscript);
                    self.section_tail()?;
                    self.finish();
                }
            }
        }
        self.finish();
        Ok(())
    }

    /// `:[upper][:stride]`
    fn section_tail(&mut self) -> PResult {
        self.bump();
        if !matches!(self.kind(), TokenKind::Comma | TokenKind::RParen | TokenKind::Colon) {
            self.expr()?;
        }
        if self.eat(TokenKind::Colon) {
            self.expr()?;
        }
        Ok(())
    }

    /// `(expr)` as part of a statement, without a node of its own.
    pub(crate) fn paren_expr(&mut self) -> PResult {
        self.expect(TokenKind::LParen)?;
        self.with_slash(Self::expr)?;
        self.expect(TokenKind::RParen)
    }

    fn paren_primary(&mut self) -> PResult {
        match self.classify_paren() {
            ParenKind::ImpliedDo => {
                self.start(NodeKind::ImpliedDo);
                self.bump();
                while !(self.at(TokenKind::Name) && self.nth_kind(1) == TokenKind::Eq) {
                    self.expr()?;
                    self.expect(TokenKind::Comma)?;
                }
                self.loop_control()?;
            }
            ParenKind::Complex => {
                self.start(NodeKind::ComplexLiteral);
                self.bump();
                self.expr()?;
                self.expect(TokenKind::Comma)?;
                self.expr()?;
            }
            ParenKind::Paren => {
                self.start(NodeKind::ParenExpr);
                self.bump();
                self.expr()?;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.finish();
        Ok(())
    }

    /// `(a(i), i = 1, n)` has `, name =` at the top level; `(1.0, 2.0)`
    /// has a single top-level comma.
    fn classify_paren(&self) -> ParenKind {
        let mut depth = 0usize;
        let mut commas = 0;
        let mut n = 1;
        loop {
            match self.nth_kind(n) {
                TokenKind::LParen | TokenKind::LArrayParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RArrayParen | TokenKind::RBracket => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                TokenKind::Comma if depth == 0 => {
                    if self.nth_kind(n + 1) == TokenKind::Name && self.nth_kind(n + 2) == TokenKind::Eq {
                        return ParenKind::ImpliedDo;
                    }
                    commas += 1;
                }
                k if k.is_terminator() => break,
                _ => {}
            }
            n += 1;
        }
        if commas == 1 {
            ParenKind::Complex
        } else {
            ParenKind::Paren
        }
    }

    /// `(/ items /)` or `[ items ]`
    fn array_constructor(&mut self, close: TokenKind) -> PResult {
        self.start(NodeKind::ArrayConstructor);
        self.bump();
        self.with_slash(|p| {
            if !p.at(close) {
                loop {
                    p.expr()?;
                    if !p.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            Ok(())
        })?;
        self.expect(close)?;
        self.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_is_right_associative_and_tightest_binary() {
        let (l, r) = infix_binding_power(BinaryOp::Pow);
        assert!(l > r);
        assert!(r > SIGN_BP);
        assert!(infix_binding_power(BinaryOp::Mul).0 > SIGN_BP);
        assert!(infix_binding_power(BinaryOp::Add).0 < SIGN_BP);
    }

    #[test]
    fn not_sits_between_and_and_relational() {
        assert!(NOT_BP > infix_binding_power(BinaryOp::And).0);
        assert!(NOT_BP < infix_binding_power(BinaryOp::Eq).0);
        assert!(infix_binding_power(BinaryOp::Defined).0 < infix_binding_power(BinaryOp::Eqv).0);
        assert!(DEFINED_UNARY_BP > infix_binding_power(BinaryOp::Pow).0);
    }
}
