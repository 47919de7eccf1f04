// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement dispatch, executable statements and constructs.

use fortran_syntax::{Cancelled, NodeKind, TokenKind};

use crate::classify::StmtClass;
use crate::error::{ParseError, ParseErrorKind};
use crate::parser::{Frame, PResult, Parser, MAX_NESTING};

impl Parser<'_> {
    /// Parse the statement or construct at the cursor.
    pub(crate) fn statement(&mut self, class: StmtClass) -> Result<(), Cancelled> {
        if class.opens_block() && self.builder.depth() >= MAX_NESTING {
            self.skip_too_deep()?;
            self.closed_label = None;
            return Ok(());
        }
        let construct: fn(&mut Self) -> Result<(), Cancelled> = match class {
            // Keeps `closed_label` when it ended on a terminal statement
            // shared with an enclosing DO.
            StmtClass::Do => return self.do_construct(),
            StmtClass::IfThen => Self::if_construct,
            StmtClass::SelectCase => Self::select_construct,
            StmtClass::TypeDef => Self::derived_type_def,
            StmtClass::Interface => Self::interface_block,
            _ => return self.non_construct(class),
        };
        construct(self)?;
        self.closed_label = None;
        Ok(())
    }

    fn non_construct(&mut self, class: StmtClass) -> Result<(), Cancelled> {
        match class {
            StmtClass::ElseIf
            | StmtClass::Else
            | StmtClass::EndIf
            | StmtClass::EndDo
            | StmtClass::Case
            | StmtClass::EndSelect
            | StmtClass::EndType
            | StmtClass::EndInterface
            | StmtClass::Contains => self.stmt(|p| {
                Err(ParseError::new(ParseErrorKind::Misplaced(class.spelling().to_string()), p.current().span))
            }),
            _ => {
                self.stmt(|p| p.simple_statement(class))?;
                self.closed_label = self.stmt_label;
                Ok(())
            }
        }
    }

    pub(crate) fn simple_statement(&mut self, class: StmtClass) -> PResult {
        match class {
            StmtClass::Assignment => self.assignment_stmt(),
            StmtClass::Call => self.call_stmt(),
            StmtClass::If => self.if_stmt(),
            StmtClass::ArithmeticIf => self.arithmetic_if_stmt(),
            StmtClass::Cycle => self.jump_stmt(NodeKind::CycleStmt),
            StmtClass::Exit => self.jump_stmt(NodeKind::ExitStmt),
            StmtClass::Goto => self.goto_stmt(),
            StmtClass::Continue => {
                self.open_stmt(NodeKind::ContinueStmt);
                self.bump();
                Ok(())
            }
            StmtClass::Return => self.keyword_expr_stmt(NodeKind::ReturnStmt),
            StmtClass::Stop => {
                self.open_stmt(NodeKind::StopStmt);
                self.eat_keyword("error");
                self.keyword_operand()
            }
            StmtClass::Print => self.print_stmt(),
            StmtClass::Read => self.read_write_stmt(NodeKind::ReadStmt),
            StmtClass::Write => self.read_write_stmt(NodeKind::WriteStmt),
            StmtClass::Io => self.io_stmt(),
            StmtClass::Allocate => self.allocate_stmt(),

            StmtClass::Use => self.use_stmt(),
            StmtClass::Implicit => self.implicit_stmt(),
            StmtClass::TypeDecl => self.type_decl_stmt(),
            StmtClass::Parameter => self.parameter_stmt(),
            StmtClass::Dimension => self.entity_list_stmt(NodeKind::DimensionStmt),
            StmtClass::External => self.entity_list_stmt(NodeKind::ExternalStmt),
            StmtClass::Intrinsic => self.entity_list_stmt(NodeKind::IntrinsicStmt),
            StmtClass::Common => self.common_stmt(),
            StmtClass::Data => self.data_stmt(),
            StmtClass::Attr => self.attr_stmt(),
            StmtClass::Format => self.format_stmt(),
            StmtClass::ModuleProcedure => self.module_procedure_stmt(),

            StmtClass::Unsupported(what) => {
                let span = self.current().span;
                Err(ParseError::unsupported(what, span))
            }
            _ => Err(self.unknown_statement()),
        }
    }

    fn unknown_statement(&self) -> ParseError {
        let token = self.current();
        if token.kind == TokenKind::Unknown {
            ParseError::unknown(token)
        } else {
            ParseError::new(ParseErrorKind::UnknownStatement, token.span)
        }
    }

    // =========================================================================
    // Constructs
    // =========================================================================

    /// `if (...) then` block {`else if` block} [`else` block] `end if`
    fn if_construct(&mut self) -> Result<(), Cancelled> {
        let open = self.current().span;
        let cp = self.checkpoint();
        self.stmt(|p| p.if_then_stmt())?;
        self.start_at(cp, NodeKind::IfConstruct);
        self.frames.push(Frame::If);

        let mut end = self.block()?;
        loop {
            match end {
                StmtClass::ElseIf => {
                    self.stmt(|p| p.else_if_stmt())?;
                    end = self.block()?;
                }
                StmtClass::Else => {
                    self.stmt(|p| p.else_stmt())?;
                    end = self.block()?;
                }
                StmtClass::EndIf => {
                    self.stmt(|p| p.end_construct_stmt(NodeKind::EndIfStmt, &["if"]))?;
                    break;
                }
                _ => {
                    self.missing_end("end if", open);
                    break;
                }
            }
        }

        self.frames.pop();
        self.finish();
        Ok(())
    }

    /// A DO construct. A labelled DO ends with the statement carrying its
    /// label; nested labelled DOs may share that statement.
    fn do_construct(&mut self) -> Result<(), Cancelled> {
        let open = self.current().span;
        let cp = self.checkpoint();
        self.pending_do_label = None;
        self.stmt(|p| p.do_stmt())?;
        let label = self.pending_do_label.take();
        self.start_at(cp, NodeKind::DoConstruct);
        self.frames.push(Frame::Do(label));

        match self.block()? {
            StmtClass::Terminal => {}
            StmtClass::EndDo => {
                self.stmt(|p| p.end_construct_stmt(NodeKind::EndDoStmt, &["do"]))?;
                self.closed_label = None;
            }
            _ => {
                match label {
                    Some(label) => self.missing_end(&format!("statement labelled {}", label), open),
                    None => self.missing_end("end do", open),
                }
                self.closed_label = None;
            }
        }

        self.frames.pop();
        self.finish();
        Ok(())
    }

    /// `select case (...)` {`case` block} `end select`
    fn select_construct(&mut self) -> Result<(), Cancelled> {
        let open = self.current().span;
        let cp = self.checkpoint();
        self.stmt(|p| p.select_case_stmt())?;
        self.start_at(cp, NodeKind::SelectCaseConstruct);
        self.frames.push(Frame::Select);

        let mut end = self.block()?;
        loop {
            match end {
                StmtClass::Case => {
                    self.stmt(|p| p.case_stmt())?;
                    end = self.block()?;
                }
                StmtClass::EndSelect => {
                    self.stmt(|p| p.end_construct_stmt(NodeKind::EndSelectStmt, &["select"]))?;
                    break;
                }
                _ => {
                    self.missing_end("end select", open);
                    break;
                }
            }
        }

        self.frames.pop();
        self.finish();
        Ok(())
    }

    /// `type name` components [`contains` bindings] `end type`
    fn derived_type_def(&mut self) -> Result<(), Cancelled> {
        let open = self.current().span;
        let cp = self.checkpoint();
        self.stmt(|p| p.derived_type_stmt())?;
        self.start_at(cp, NodeKind::DerivedTypeDef);
        self.frames.push(Frame::Type);

        let end = loop {
            let end = self.block()?;
            if end == StmtClass::Contains && self.frames.last() == Some(&Frame::Type) {
                self.stmt(|p| {
                    p.open_stmt(NodeKind::ContainsStmt);
                    p.bump();
                    Ok(())
                })?;
                continue;
            }
            break end;
        };
        if end == StmtClass::EndType {
            self.stmt(|p| {
                p.open_stmt(NodeKind::EndTypeStmt);
                p.bump_end_words(&["type"]);
                if p.at(TokenKind::Name) {
                    p.bump();
                }
                Ok(())
            })?;
        } else {
            self.missing_end("end type", open);
        }

        self.frames.pop();
        self.finish();
        Ok(())
    }

    /// `interface [name]` {procedure bodies | `module procedure`} `end interface`
    fn interface_block(&mut self) -> Result<(), Cancelled> {
        let open = self.current().span;
        let cp = self.checkpoint();
        self.stmt(|p| p.interface_stmt())?;
        self.start_at(cp, NodeKind::InterfaceBlock);
        self.frames.push(Frame::Interface);

        loop {
            match self.statements()? {
                class @ (StmtClass::Subroutine | StmtClass::Function) => self.program_unit(class)?,
                StmtClass::EndInterface => {
                    self.stmt(|p| {
                        p.open_stmt(NodeKind::EndInterfaceStmt);
                        p.bump_end_words(&["interface"]);
                        p.bump_rest();
                        Ok(())
                    })?;
                    break;
                }
                _ => {
                    self.missing_end("end interface", open);
                    break;
                }
            }
        }

        self.frames.pop();
        self.finish();
        Ok(())
    }

    // =========================================================================
    // Construct statements
    // =========================================================================

    fn if_then_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::IfThenStmt);
        self.bump();
        self.paren_expr()?;
        self.expect_keyword("then")
    }

    fn else_if_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::ElseIfStmt);
        if !self.eat_keyword("elseif") {
            self.bump();
            self.expect_keyword("if")?;
        }
        self.paren_expr()?;
        self.expect_keyword("then")?;
        self.construct_name_ref();
        Ok(())
    }

    fn else_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::ElseStmt);
        self.bump();
        self.construct_name_ref();
        Ok(())
    }

    /// `end if`, `end do`, `end select`, with an optional construct name.
    fn end_construct_stmt(&mut self, kind: NodeKind, words: &[&str]) -> PResult {
        self.open_stmt(kind);
        self.bump_end_words(words);
        self.construct_name_ref();
        Ok(())
    }

    fn construct_name_ref(&mut self) {
        if self.at(TokenKind::Name) {
            self.token_node(NodeKind::ConstructNameRef);
        }
    }

    /// `do [label [,]] [var = e1, e2 [, e3] | while (cond)]`
    fn do_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::DoStmt);
        self.bump();
        if self.at(TokenKind::IntLiteral) {
            self.pending_do_label = self.current().text.parse().ok();
            self.label_ref()?;
            self.eat(TokenKind::Comma);
        }
        if self.at_keyword("while") && self.nth_kind(1) == TokenKind::LParen {
            self.start(NodeKind::WhileControl);
            self.bump();
            self.paren_expr()?;
            self.finish();
        } else if !self.at_terminator() {
            self.loop_control()?;
        }
        Ok(())
    }

    /// `var = start, end [, stride]`
    pub(crate) fn loop_control(&mut self) -> PResult {
        self.start(NodeKind::LoopControl);
        self.name_ref()?;
        self.expect(TokenKind::Eq)?;
        self.expr()?;
        self.expect(TokenKind::Comma)?;
        self.expr()?;
        if self.eat(TokenKind::Comma) {
            self.expr()?;
        }
        self.finish();
        Ok(())
    }

    fn select_case_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::SelectCaseStmt);
        if !self.eat_keyword("selectcase") {
            self.bump();
            self.expect_keyword("case")?;
        }
        self.paren_expr()
    }

    /// `case default` or `case (v, lo:hi, :hi, lo:)`
    fn case_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::CaseStmt);
        self.bump();
        if !self.eat_keyword("default") {
            self.start(NodeKind::CaseSelector);
            self.expect(TokenKind::LParen)?;
            loop {
                if self.eat(TokenKind::Colon) {
                    self.expr()?;
                } else {
                    self.expr()?;
                    if self.eat(TokenKind::Colon) && !matches!(self.kind(), TokenKind::Comma | TokenKind::RParen) {
                        self.expr()?;
                    }
                }
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
            self.finish();
        }
        self.construct_name_ref();
        Ok(())
    }

    // =========================================================================
    // Executable statements
    // =========================================================================

    /// `target = value` or `pointer => target`
    fn assignment_stmt(&mut self) -> PResult {
        // The target is parsed before the statement kind is known; opening
        // the node afterwards adopts it.
        self.designator()?;
        let kind = if self.at(TokenKind::Arrow) {
            NodeKind::PointerAssignmentStmt
        } else {
            NodeKind::AssignmentStmt
        };
        self.open_stmt(kind);
        self.bump();
        self.expr()
    }

    /// `call designator [(args)]`
    fn call_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::CallStmt);
        self.bump();
        self.designator()
    }

    /// Logical IF: the guarded statement is nested inside the IF node.
    fn if_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::IfStmt);
        self.bump();
        self.paren_expr()?;
        self.stmt_cp = self.checkpoint();
        let class = self.classify();
        if class.is_action() {
            self.simple_statement(class)
        } else {
            Err(ParseError::expected("an action statement", self.current()))
        }
    }

    /// `if (e) l1, l2, l3`
    fn arithmetic_if_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::ArithmeticIfStmt);
        self.bump();
        self.paren_expr()?;
        self.label_ref()?;
        self.expect(TokenKind::Comma)?;
        self.label_ref()?;
        self.expect(TokenKind::Comma)?;
        self.label_ref()
    }

    fn jump_stmt(&mut self, kind: NodeKind) -> PResult {
        self.open_stmt(kind);
        self.bump();
        self.construct_name_ref();
        Ok(())
    }

    /// `goto 10`, `goto (10, 20) i`, `goto var`
    fn goto_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::GotoStmt);
        if self.eat_keyword("go") {
            self.expect_keyword("to")?;
        } else {
            self.bump();
        }
        match self.kind() {
            TokenKind::IntLiteral => self.label_ref(),
            TokenKind::LParen => {
                self.bump();
                loop {
                    self.label_ref()?;
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
                self.eat(TokenKind::Comma);
                self.expr()
            }
            _ => {
                self.name_ref()?;
                if self.eat(TokenKind::Comma) || self.at(TokenKind::LParen) {
                    self.bump_balanced()?;
                }
                Ok(())
            }
        }
    }

    fn keyword_expr_stmt(&mut self, kind: NodeKind) -> PResult {
        self.open_stmt(kind);
        self.keyword_operand()
    }

    /// Keyword followed by an optional expression.
    fn keyword_operand(&mut self) -> PResult {
        self.bump();
        if !self.at_terminator() {
            self.expr()?;
        }
        Ok(())
    }

    /// `print fmt [, items]`
    fn print_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::PrintStmt);
        self.bump();
        self.format_item()?;
        if self.eat(TokenKind::Comma) {
            self.item_list()?;
        }
        Ok(())
    }

    /// `read (controls) [items]`, `read fmt [, items]`, `write (controls) [items]`
    fn read_write_stmt(&mut self, kind: NodeKind) -> PResult {
        self.open_stmt(kind);
        self.bump();
        if self.at(TokenKind::LParen) {
            self.io_control_list()?;
            if !self.at_terminator() {
                self.eat(TokenKind::Comma);
                self.item_list()?;
            }
        } else {
            self.format_item()?;
            if self.eat(TokenKind::Comma) {
                self.item_list()?;
            }
        }
        Ok(())
    }

    /// `open (...)`, `close (...)`, `rewind 10`, ...
    fn io_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::IoStmt);
        self.bump_end_words(&["file"]);
        if self.at(TokenKind::LParen) {
            self.io_control_list()?;
            if !self.at_terminator() {
                self.item_list()?;
            }
        } else if !self.at_terminator() {
            self.expr()?;
        }
        Ok(())
    }

    /// `allocate (a(n), b(m), stat=ierr)`
    fn allocate_stmt(&mut self) -> PResult {
        self.open_stmt(NodeKind::AllocateStmt);
        self.bump();
        self.arg_list()
    }

    /// Format position: `*`, a label or a character expression.
    fn format_item(&mut self) -> PResult {
        self.start(NodeKind::FormatSpec);
        let result = match self.kind() {
            TokenKind::Star => {
                self.bump();
                Ok(())
            }
            TokenKind::IntLiteral => self.label_ref(),
            _ => self.expr(),
        };
        self.finish();
        result
    }

    fn item_list(&mut self) -> PResult {
        self.start(NodeKind::ItemList);
        loop {
            self.expr()?;
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.finish();
        Ok(())
    }

    /// `(unit, fmt, key=value, ...)`. The second positional item and the
    /// `fmt`, `err`, `end` and `eor` specifiers take labels.
    fn io_control_list(&mut self) -> PResult {
        self.start(NodeKind::IoControlList);
        self.bump();
        let mut position = 0;
        loop {
            self.start(NodeKind::IoControl);
            let mut takes_label = position == 1;
            if self.at(TokenKind::Name) && self.nth_kind(1) == TokenKind::Eq {
                let key = self.current().key();
                takes_label = matches!(key.as_str(), "fmt" | "err" | "end" | "eor");
                self.bump();
                self.bump();
            }
            let result = match self.kind() {
                TokenKind::Star => {
                    self.bump();
                    Ok(())
                }
                TokenKind::IntLiteral if takes_label => self.label_ref(),
                _ => self.expr(),
            };
            self.finish();
            result?;
            position += 1;
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.finish();
        Ok(())
    }
}
