// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Specification statements: declarations, `use`, `implicit`, storage and
//! attribute statements, derived type and interface headers.

use fortran_syntax::{NodeKind, TokenKind};

use crate::error::ParseError;
use crate::parser::{PResult, Parser};

impl Parser<'_> {
    pub(crate) fn at_type_keyword(&self) -> bool {
        let token = self.current();
        if token.kind != TokenKind::Name {
            return false;
        }
        match token.key().as_str() {
            "integer" | "real" | "complex" | "logical" | "character" | "doubleprecision" | "doublecomplex" => true,
            "double" => self.nth_is(1, "precision") || self.nth_is(1, "complex"),
            "type" => self.nth_kind(1) == TokenKind::LParen,
            _ => false,
        }
    }

    /// A type specifier. With `kind_paren` a parenthesis after the keyword
    /// is a kind selector.
    pub(crate) fn type_spec(&mut self, kind_paren: bool) -> PResult {
        self.start(NodeKind::TypeSpec);
        if self.eat_keyword("double") {
            self.bump();
        } else if self.eat_keyword("type") {
            self.expect(TokenKind::LParen)?;
            self.name_ref()?;
            self.expect(TokenKind::RParen)?;
        } else {
            self.bump();
            if kind_paren && self.at(TokenKind::LParen) {
                self.start(NodeKind::KindSelector);
                self.bump();
                loop {
                    self.arg()?;
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
                self.finish();
            }
            if self.at(TokenKind::Star) {
                self.char_length()?;
            }
        }
        self.finish();
        Ok(())
    }

    /// `*10`, `*(20)`, `*(*)`, `*(:)`
    fn char_length(&mut self) -> PResult {
        self.start(NodeKind::CharLength);
        self.bump();
        match self.kind() {
            TokenKind::LParen => {
                self.bump();
                if !(self.eat(TokenKind::Star) || self.eat(TokenKind::Colon)) {
                    self.expr()?;
                }
                self.expect(TokenKind::RParen)?;
            }
            TokenKind::IntLiteral => self.token_node(NodeKind::Literal),
            _ => return Err(ParseError::expected("a length", self.current())),
        }
        self.finish();
        Ok(())
    }

    /// `type-spec [, attr]... [::] entity [, entity]...`
    pub(crate) fn type_decl_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::TypeDeclStmt);
        self.type_spec(true)?;
        while self.eat(TokenKind::Comma) {
            self.attr_spec()?;
        }
        self.eat(TokenKind::ColonColon);
        self.entity_list()
    }

    fn attr_spec(&mut self) -> PResult {
        if !self.at(TokenKind::Name) {
            return Err(ParseError::expected("an attribute", self.current()));
        }
        self.start(NodeKind::AttrSpec);
        let is_dimension = self.at_keyword("dimension");
        self.bump();
        if is_dimension {
            self.array_spec()?;
        } else if self.at(TokenKind::LParen) {
            self.bump_balanced()?;
        }
        self.finish();
        Ok(())
    }

    fn entity_list(&mut self) -> PResult {
        loop {
            self.entity_decl()?;
            if !self.eat(TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    /// `name [(dims)] [*len] [= init | => init]`
    fn entity_decl(&mut self) -> PResult {
        self.start(NodeKind::EntityDecl);
        self.declared_name()?;
        if self.at(TokenKind::LParen) {
            self.array_spec()?;
        }
        if self.at(TokenKind::Star) {
            self.char_length()?;
        }
        if self.at(TokenKind::Eq) || self.at(TokenKind::Arrow) {
            self.start(NodeKind::Initializer);
            self.bump();
            self.expr()?;
            self.finish();
        }
        self.finish();
        Ok(())
    }

    pub(crate) fn array_spec(&mut self) -> PResult {
        self.start(NodeKind::ArraySpec);
        self.expect(TokenKind::LParen)?;
        loop {
            self.dim_spec()?;
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.finish();
        Ok(())
    }

    /// `n`, `lo:hi`, `lo:`, `:`, `*`, `lo:*`
    fn dim_spec(&mut self) -> PResult {
        self.start(NodeKind::DimSpec);
        if !self.eat(TokenKind::Star) {
            if !self.at(TokenKind::Colon) {
                self.expr()?;
            }
            if self.eat(TokenKind::Colon) && !self.eat(TokenKind::Star) {
                if !matches!(self.kind(), TokenKind::Comma | TokenKind::RParen) {
                    self.expr()?;
                }
            }
        }
        self.finish();
        Ok(())
    }

    /// `use [, intrinsic ::] name [, only: list | , renames]`
    pub(crate) fn use_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::UseStmt);
        self.bump();
        if self.eat(TokenKind::Comma) {
            self.expect(TokenKind::Name)?;
            self.expect(TokenKind::ColonColon)?;
        } else {
            self.eat(TokenKind::ColonColon);
        }
        if !self.at(TokenKind::Name) {
            return Err(ParseError::expected("a name", self.current()));
        }
        self.token_node(NodeKind::ModuleRef);

        if !self.eat(TokenKind::Comma) {
            return Ok(());
        }
        if self.at_keyword("only") && self.nth_kind(1) == TokenKind::Colon {
            self.bump();
            self.bump();
            self.start(NodeKind::OnlyList);
            if !self.at_terminator() {
                loop {
                    self.only_item()?;
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.finish();
        } else {
            loop {
                self.rename()?;
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        Ok(())
    }

    fn only_item(&mut self) -> PResult {
        if self.nth_kind(1) == TokenKind::Arrow {
            self.rename()
        } else if (self.at_keyword("operator") || self.at_keyword("assignment")) && self.nth_kind(1) == TokenKind::LParen {
            self.bump();
            self.bump_balanced()
        } else {
            self.name_ref()
        }
    }

    /// `local => remote`
    fn rename(&mut self) -> PResult {
        self.start(NodeKind::Rename);
        self.declared_name()?;
        self.expect(TokenKind::Arrow)?;
        self.name_ref()?;
        self.finish();
        Ok(())
    }

    /// `implicit none` or `implicit type (a-h, o-z), ...`
    pub(crate) fn implicit_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::ImplicitStmt);
        self.bump();
        if self.eat_keyword("none") {
            if self.at(TokenKind::LParen) {
                self.bump_balanced()?;
            }
            return Ok(());
        }
        loop {
            self.implicit_spec()?;
            if !self.eat(TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    fn implicit_spec(&mut self) -> PResult {
        if !self.at_type_keyword() {
            return Err(ParseError::expected("a type", self.current()));
        }
        self.start(NodeKind::ImplicitSpec);
        // `real(8) (a-h)` has a kind selector; in `real (a-h)` the
        // parenthesis holds the letters.
        let keyword_len = if self.at_keyword("double") { 2 } else { 1 };
        let kind_paren = self.nth_kind(keyword_len) == TokenKind::LParen
            && self
                .skip_parens(keyword_len)
                .is_some_and(|after| self.nth_kind(after) == TokenKind::LParen);
        self.type_spec(kind_paren)?;
        self.expect(TokenKind::LParen)?;
        loop {
            self.start(NodeKind::LetterRange);
            self.expect(TokenKind::Name)?;
            if self.eat(TokenKind::Minus) {
                self.expect(TokenKind::Name)?;
            }
            self.finish();
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.finish();
        Ok(())
    }

    /// `parameter (name = value, ...)`
    pub(crate) fn parameter_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::ParameterStmt);
        self.bump();
        self.expect(TokenKind::LParen)?;
        loop {
            self.start(NodeKind::NamedConstantDef);
            self.declared_name()?;
            self.expect(TokenKind::Eq)?;
            self.expr()?;
            self.finish();
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)
    }

    /// `dimension`, `external`, `intrinsic`: keyword then entities.
    pub(crate) fn entity_list_stmt(&mut self, kind: NodeKind) -> PResult {
        self.open_stmt(kind);
        self.bump();
        self.eat(TokenKind::ColonColon);
        self.entity_list()
    }

    /// `common [/name/] objects [[,] /name/ objects]...`; `//` or no
    /// name at all is blank common.
    pub(crate) fn common_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::CommonStmt);
        self.bump();
        loop {
            self.start(NodeKind::CommonBlock);
            if !self.eat(TokenKind::Concat) && self.eat(TokenKind::Slash) {
                if self.at(TokenKind::Name) {
                    self.declared_name()?;
                }
                self.expect(TokenKind::Slash)?;
            }
            loop {
                self.entity_decl()?;
                if self.at(TokenKind::Comma) && matches!(self.nth_kind(1), TokenKind::Slash | TokenKind::Concat) {
                    self.bump();
                    break;
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.finish();
            if !matches!(self.kind(), TokenKind::Slash | TokenKind::Concat) {
                return Ok(());
            }
        }
    }

    /// `data objects /values/ [[,] objects /values/]...`
    pub(crate) fn data_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::DataStmt);
        self.bump();
        self.no_slash = true;
        loop {
            self.start(NodeKind::DataSet);
            loop {
                self.expr()?;
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Slash)?;
            loop {
                self.expr()?;
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Slash)?;
            self.finish();
            self.eat(TokenKind::Comma);
            if self.at_terminator() {
                break;
            }
        }
        self.no_slash = false;
        Ok(())
    }

    /// `save`, `public`, `intent(in)`, ... with an optional name list.
    pub(crate) fn attr_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::AttrStmt);
        self.bump();
        if self.at(TokenKind::LParen) {
            self.bump_balanced()?;
        }
        self.eat(TokenKind::ColonColon);
        if self.at_terminator() {
            return Ok(());
        }
        loop {
            if self.at(TokenKind::Slash) {
                self.start(NodeKind::CommonBlockRef);
                self.bump();
                self.expect(TokenKind::Name)?;
                self.expect(TokenKind::Slash)?;
                self.finish();
            } else if (self.at_keyword("operator") || self.at_keyword("assignment"))
                && self.nth_kind(1) == TokenKind::LParen
            {
                self.bump();
                self.bump_balanced()?;
            } else {
                self.name_ref()?;
                if self.at(TokenKind::LParen) {
                    self.array_spec()?;
                }
            }
            if !self.eat(TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    /// `format (...)`: the edit descriptors are kept as opaque tokens.
    pub(crate) fn format_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::FormatStmt);
        self.bump();
        self.start(NodeKind::FormatSpec);
        self.bump_rest();
        self.finish();
        Ok(())
    }

    pub(crate) fn module_procedure_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::ModuleProcedureStmt);
        self.bump();
        self.bump();
        self.eat(TokenKind::ColonColon);
        loop {
            self.name_ref()?;
            if !self.eat(TokenKind::Comma) {
                return Ok(());
            }
        }
    }

    /// `type [, attrs ::] name`
    pub(crate) fn derived_type_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::DerivedTypeStmt);
        self.bump();
        if self.eat(TokenKind::Comma) {
            while !self.at(TokenKind::ColonColon) && !self.at_terminator() {
                if self.at_keyword("extends") && self.nth_kind(1) == TokenKind::LParen {
                    self.bump();
                    self.bump();
                    self.name_ref()?;
                    self.expect(TokenKind::RParen)?;
                } else if self.at(TokenKind::LParen) {
                    self.bump_balanced()?;
                } else {
                    self.bump();
                }
            }
        }
        self.eat(TokenKind::ColonColon);
        self.declared_name()
    }

    /// `[abstract] interface [name | operator(op) | assignment(=)]`
    pub(crate) fn interface_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::InterfaceStmt);
        self.eat_keyword("abstract");
        self.bump();
        if (self.at_keyword("operator") || self.at_keyword("assignment")) && self.nth_kind(1) == TokenKind::LParen {
            self.bump();
            self.bump_balanced()?;
        } else if self.at(TokenKind::Name) {
            self.declared_name()?;
        }
        Ok(())
    }
}
