// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Program units: headers, `contains` sections and end statements.

use compact_str::CompactString;
use fortran_syntax::{Cancelled, NodeKind, TokenKind};
use log::trace;

use crate::classify::StmtClass;
use crate::error::{ParseError, ParseErrorKind};
use crate::parser::{Frame, PResult, Parser, MAX_NESTING};

/// Keywords after `end` that close a unit of this kind.
fn unit_words(kind: NodeKind) -> &'static [&'static str] {
    match kind {
        NodeKind::MainProgram => &["program"],
        NodeKind::Module => &["module"],
        NodeKind::Subroutine => &["subroutine"],
        NodeKind::Function => &["function"],
        NodeKind::BlockData => &["block", "data"],
        _ => &[],
    }
}

fn end_spelling(kind: Option<NodeKind>) -> String {
    let words = kind.map_or(&[][..], unit_words);
    if words.is_empty() {
        "end".to_string()
    } else {
        format!("end {}", words.join(" "))
    }
}

impl Parser<'_> {
    /// A program unit starting with `class`. Anything that is not a unit
    /// header starts a main program without a `program` statement.
    pub(crate) fn program_unit(&mut self, class: StmtClass) -> Result<(), Cancelled> {
        let kind = match class {
            StmtClass::Program => NodeKind::MainProgram,
            StmtClass::Module => NodeKind::Module,
            StmtClass::Subroutine => NodeKind::Subroutine,
            StmtClass::Function => NodeKind::Function,
            StmtClass::BlockData => NodeKind::BlockData,
            _ => NodeKind::MainProgram,
        };
        if self.builder.depth() >= MAX_NESTING {
            return self.skip_too_deep();
        }
        let open = self.current().span;
        self.start(kind);

        let mut name = None;
        if class.is_unit_start() {
            self.header_name = None;
            self.stmt(|p| p.unit_header(class))?;
            name = self.header_name.take();
        }
        trace!("unit {:?} {:?}", kind, name);

        self.frames.push(Frame::Unit(kind));
        let mut end = self.statements()?;
        if end == StmtClass::Contains {
            self.stmt(|p| {
                p.open_stmt(NodeKind::ContainsStmt);
                p.bump();
                Ok(())
            })?;
            loop {
                end = self.statements()?;
                match end {
                    StmtClass::Subroutine | StmtClass::Function => self.program_unit(end)?,
                    _ => break,
                }
            }
        }
        self.frames.pop();

        match end {
            StmtClass::End(Some(written))
                if written != kind && self.frames.contains(&Frame::Unit(written)) =>
            {
                // The end statement closes an enclosing unit.
                self.missing_end(&end_spelling(Some(kind)), open);
            }
            StmtClass::End(written) => {
                self.stmt(|p| p.end_stmt(kind, written, name.as_deref()))?;
            }
            _ => self.missing_end(&end_spelling(Some(kind)), open),
        }
        self.finish();
        Ok(())
    }

    fn unit_header(&mut self, class: StmtClass) -> PResult {
        let kind = match class {
            StmtClass::Program => NodeKind::ProgramStmt,
            StmtClass::Module => NodeKind::ModuleStmt,
            StmtClass::Subroutine => NodeKind::SubroutineStmt,
            StmtClass::Function => NodeKind::FunctionStmt,
            _ => NodeKind::BlockDataStmt,
        };
        self.open_stmt(kind);
        match class {
            StmtClass::Program | StmtClass::Module => {
                self.bump();
                self.unit_name()
            }
            StmtClass::Subroutine | StmtClass::Function => self.procedure_header(),
            _ => {
                if self.eat_keyword("block") {
                    self.expect_keyword("data")?;
                } else {
                    self.bump();
                }
                if self.at(TokenKind::Name) {
                    self.unit_name()?;
                }
                Ok(())
            }
        }
    }

    fn unit_name(&mut self) -> PResult {
        if self.at(TokenKind::Name) {
            self.header_name = Some(self.current().key());
        }
        self.declared_name()
    }

    /// `[prefix] function|subroutine name [(args)] [result(r)] [bind(...)]`
    fn procedure_header(&mut self) -> PResult {
        if !(self.at_keyword("function") || self.at_keyword("subroutine")) {
            self.start(NodeKind::Prefix);
            while !(self.at_keyword("function") || self.at_keyword("subroutine")) && !self.at_terminator() {
                if self.at_type_keyword() {
                    self.type_spec(true)?;
                } else {
                    self.bump();
                }
            }
            self.finish();
        }
        self.bump();
        self.unit_name()?;

        if self.at(TokenKind::LParen) {
            self.start(NodeKind::DummyArgList);
            self.bump();
            if !self.at(TokenKind::RParen) {
                loop {
                    self.start(NodeKind::DummyArg);
                    let arg = if self.at(TokenKind::Star) {
                        self.bump();
                        Ok(())
                    } else {
                        self.declared_name()
                    };
                    self.finish();
                    arg?;
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen)?;
            self.finish();
        }

        loop {
            if self.at_keyword("result") {
                self.start(NodeKind::ResultSpec);
                self.bump();
                self.expect(TokenKind::LParen)?;
                self.declared_name()?;
                self.expect(TokenKind::RParen)?;
                self.finish();
            } else if self.at_keyword("bind") {
                self.bump();
                self.bump_balanced()?;
            } else {
                return Ok(());
            }
        }
    }

    /// `end [unit-keyword [name]]`. A kind or name that does not match the
    /// unit is reported without failing the statement.
    fn end_stmt(&mut self, kind: NodeKind, written: Option<NodeKind>, name: Option<&str>) -> PResult {
        self.open_stmt(NodeKind::EndStmt);
        let start = self.current().span;
        self.bump_end_words(written.map_or(&[][..], unit_words));

        if let Some(written) = written.filter(|w| *w != kind) {
            self.soft_error(ParseError::new(
                ParseErrorKind::MismatchedEnd {
                    expected: end_spelling(Some(kind)),
                    found: end_spelling(Some(written)),
                },
                start,
            ));
        }

        if self.at(TokenKind::Name) {
            let found: CompactString = self.current().key();
            let span = self.current().span;
            self.name_ref()?;
            if let Some(expected) = name.filter(|n| *n != found) {
                self.soft_error(ParseError::new(
                    ParseErrorKind::MismatchedEnd { expected: expected.to_string(), found: found.to_string() },
                    span,
                ));
            }
        }
        Ok(())
    }
}
