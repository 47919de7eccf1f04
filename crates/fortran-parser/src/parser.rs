// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser state, token navigation and statement-level recovery.
//!
//! The parser walks the significant tokens and builds the tree through a
//! [`TreeBuilder`]. Trivia between significant tokens is flushed into
//! whichever node is open when the next token or node arrives, so every
//! input byte lands in the tree exactly once.

use compact_str::CompactString;
use fortran_syntax::{
    CancelCheck, Cancelled, Checkpoint, NodeKind, Span, Token, TokenKind, TreeBuilder,
};
use log::debug;

use crate::classify::StmtClass;
use crate::error::{ParseError, ParseErrorKind, ParseResult};

/// Maximum number of open nodes. Every level of recursion in the parser
/// opens a node, so this bounds the parser's stack use.
pub(crate) const MAX_NESTING: usize = 128;

/// Maximum height of an expression tree. Operator chains such as
/// `a + b + ...` deepen the tree without recursing in the parser, but
/// later passes walk them recursively.
pub(crate) const MAX_EXPR_HEIGHT: u32 = 256;

pub(crate) type PResult = Result<(), ParseError>;

/// An open construct or unit, innermost last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Frame {
    Unit(NodeKind),
    If,
    /// A DO construct, with the terminal label of a labelled DO.
    Do(Option<u64>),
    Select,
    Type,
    Interface,
}

/// The parser for Fortran token streams.
pub struct Parser<'c> {
    tokens: Vec<Token>,
    /// Indices into `tokens` of the significant tokens. The last one is
    /// always the end-of-file token.
    sig: Vec<usize>,
    cursor: usize,
    /// First token not yet handed to the builder.
    raw_pos: usize,
    pub(crate) builder: TreeBuilder,
    errors: Vec<ParseError>,
    cancel: &'c dyn CancelCheck,
    /// The current statement already has an error.
    pub(crate) stmt_error: bool,
    /// Taken before a statement's label, so the statement node can adopt it.
    pub(crate) stmt_cp: Checkpoint,
    /// Label of the statement parsed last.
    pub(crate) stmt_label: Option<u64>,
    pub(crate) frames: Vec<Frame>,
    /// Label of the simple statement that was just completed.
    pub(crate) closed_label: Option<u64>,
    /// Terminal label written in the DO statement just parsed.
    pub(crate) pending_do_label: Option<u64>,
    /// Name declared by the unit header just parsed.
    pub(crate) header_name: Option<CompactString>,
    /// A bare `/` ends the expression (DATA value lists).
    pub(crate) no_slash: bool,
}

impl<'c> Parser<'c> {
    pub fn new(input: impl IntoIterator<Item = Token>, cancel: &'c dyn CancelCheck) -> Self {
        let mut tokens: Vec<Token> = Vec::new();
        let mut end = 0;
        for token in tokens_until_eof(input) {
            end = token.span.end;
            tokens.push(token);
        }
        if tokens.last().map_or(true, |t| t.kind != TokenKind::Eof) {
            let (line, col) = tokens.last().map_or((1, 1), |t| (t.line, t.col + t.text.len() as u32));
            tokens.push(Token::new(TokenKind::Eof, "", Span::empty(end), line, col));
        }
        let sig = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_trivia())
            .map(|(i, _)| i)
            .collect();
        let builder = TreeBuilder::new();
        let stmt_cp = builder.checkpoint();
        Self {
            tokens,
            sig,
            cursor: 0,
            raw_pos: 0,
            builder,
            errors: Vec::new(),
            cancel,
            stmt_error: false,
            stmt_cp,
            stmt_label: None,
            frames: Vec::new(),
            closed_label: None,
            pending_do_label: None,
            header_name: None,
            no_slash: false,
        }
    }

    /// Parse the whole token stream. Fails only when the cancellation check
    /// fires.
    pub fn parse(mut self) -> Result<ParseResult, Cancelled> {
        self.run()?;
        Ok(self.into_result())
    }

    pub(crate) fn run(&mut self) -> Result<(), Cancelled> {
        self.file()
    }

    pub(crate) fn into_result(self) -> ParseResult {
        let tree = self.builder.finish();
        debug!(
            "parsed {} tokens into {} nodes with {} errors",
            tree.token_count(),
            tree.node_count(),
            self.errors.len()
        );
        ParseResult { tree, errors: self.errors }
    }

    // =========================================================================
    // Error Handling
    // =========================================================================

    pub(crate) fn record_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    fn too_deep(&self) -> ParseError {
        ParseError::new(ParseErrorKind::NestingTooDeep(MAX_NESTING), self.current().span)
            .with_hint("split the expression or construct into smaller pieces")
    }

    /// Fails when one more level of nesting would pass [`MAX_NESTING`].
    pub(crate) fn enter_nested(&self) -> PResult {
        if self.builder.depth() >= MAX_NESTING {
            Err(self.too_deep())
        } else {
            Ok(())
        }
    }

    /// Fails when the expression node just finished is taller than
    /// [`MAX_EXPR_HEIGHT`].
    pub(crate) fn check_expr_height(&self) -> PResult {
        if self.builder.last_height() > MAX_EXPR_HEIGHT {
            Err(ParseError::new(ParseErrorKind::NestingTooDeep(MAX_EXPR_HEIGHT as usize), self.current().span)
                .with_hint("split the expression into smaller pieces"))
        } else {
            Ok(())
        }
    }

    /// Record an error that does not interrupt the statement.
    pub(crate) fn soft_error(&mut self, error: ParseError) {
        if !self.stmt_error {
            self.stmt_error = true;
            self.record_error(error);
        }
    }

    // =========================================================================
    // Token Navigation
    // =========================================================================

    pub(crate) fn current(&self) -> &Token {
        self.nth(0)
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    /// The `n`th significant token ahead; end of file once past the end.
    pub(crate) fn nth(&self, n: usize) -> &Token {
        let index = (self.cursor + n).min(self.sig.len() - 1);
        &self.tokens[self.sig[index]]
    }

    pub(crate) fn nth_kind(&self, n: usize) -> TokenKind {
        self.nth(n).kind
    }

    pub(crate) fn nth_is(&self, n: usize, keyword: &str) -> bool {
        self.nth(n).is_keyword(keyword)
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn at_keyword(&self, keyword: &str) -> bool {
        self.current().is_keyword(keyword)
    }

    pub(crate) fn at_terminator(&self) -> bool {
        self.kind().is_terminator()
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.at(TokenKind::Eof)
    }

    pub(crate) fn position(&self) -> usize {
        self.cursor
    }

    /// Hand pending trivia to the builder.
    fn flush_trivia(&mut self) {
        let next = self.sig[self.cursor];
        while self.raw_pos < next {
            let token = self.tokens[self.raw_pos].clone();
            self.builder.token(token);
            self.raw_pos += 1;
        }
    }

    /// Consume the current token into the open node. End of file is never
    /// consumed.
    pub(crate) fn bump(&mut self) {
        if self.at_eof() {
            return;
        }
        self.flush_trivia();
        let index = self.sig[self.cursor];
        let token = self.tokens[index].clone();
        self.builder.token(token);
        self.raw_pos = index + 1;
        self.cursor += 1;
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> PResult {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(ParseError::expected(kind.display_name(), self.current()))
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: &str) -> PResult {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(ParseError::expected(&format!("'{}'", keyword), self.current()))
        }
    }

    /// Consume tokens up to the end of the statement, tracking nothing.
    pub(crate) fn bump_rest(&mut self) {
        while !self.at_terminator() {
            self.bump();
        }
    }

    /// Consume a parenthesised token run without interpreting it.
    pub(crate) fn bump_balanced(&mut self) -> PResult {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::LParen | TokenKind::LArrayParen => depth += 1,
                TokenKind::RParen | TokenKind::RArrayParen => depth = depth.saturating_sub(1),
                k if k.is_terminator() => return Err(ParseError::expected("')'", self.current())),
                _ => {}
            }
            self.bump();
            if depth == 0 {
                return Ok(());
            }
        }
    }

    // =========================================================================
    // Tree Building
    // =========================================================================

    pub(crate) fn start(&mut self, kind: NodeKind) {
        self.flush_trivia();
        self.builder.start_node(kind);
    }

    pub(crate) fn finish(&mut self) {
        self.builder.finish_node();
    }

    pub(crate) fn checkpoint(&mut self) -> Checkpoint {
        self.flush_trivia();
        self.builder.checkpoint()
    }

    pub(crate) fn start_at(&mut self, checkpoint: Checkpoint, kind: NodeKind) {
        self.builder.start_node_at(checkpoint, kind);
    }

    /// Open the node of the statement being parsed, adopting its label and
    /// construct name.
    pub(crate) fn open_stmt(&mut self, kind: NodeKind) {
        let cp = self.stmt_cp;
        self.start_at(cp, kind);
    }

    /// A single-token node.
    pub(crate) fn token_node(&mut self, kind: NodeKind) {
        self.start(kind);
        self.bump();
        self.finish();
    }

    /// A declared name: a [`NodeKind::Name`] node around a name token.
    pub(crate) fn declared_name(&mut self) -> PResult {
        if self.at(TokenKind::Name) {
            self.token_node(NodeKind::Name);
            Ok(())
        } else {
            Err(ParseError::expected("a name", self.current()))
        }
    }

    pub(crate) fn name_ref(&mut self) -> PResult {
        if self.at(TokenKind::Name) {
            self.token_node(NodeKind::NameRef);
            Ok(())
        } else {
            Err(ParseError::expected("a name", self.current()))
        }
    }

    pub(crate) fn label_ref(&mut self) -> PResult {
        if self.at(TokenKind::IntLiteral) {
            self.token_node(NodeKind::LabelRef);
            Ok(())
        } else {
            Err(ParseError::expected("a label", self.current()))
        }
    }

    /// `end <word>` or the fused `end<word>`.
    pub(crate) fn bump_end_words(&mut self, words: &[&str]) {
        if !self.at_keyword("end") {
            self.bump();
            return;
        }
        self.bump();
        if !words.is_empty() && self.at_keyword(&words.concat()) {
            self.bump();
            return;
        }
        for word in words {
            if !self.eat_keyword(word) {
                break;
            }
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Parse one statement: optional label and construct name, then `body`,
    /// then the terminator. `body` opens the statement node with
    /// [`Parser::open_stmt`]. On error the rest of the line goes into an
    /// `Error` node and parsing resumes after the terminator.
    pub(crate) fn stmt(&mut self, body: impl FnOnce(&mut Self) -> PResult) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        self.stmt_error = false;
        self.stmt_label = None;
        self.no_slash = false;
        self.stmt_cp = self.checkpoint();
        let depth = self.builder.depth();

        let result = match self.stmt_prefix() {
            Ok(()) => body(self),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) if self.at_terminator() => {
                self.bump_terminator();
                self.builder.finish_to(depth);
            }
            Ok(()) => {
                let error = ParseError::expected("end of statement", self.current());
                self.recover(depth, error);
            }
            Err(error) => self.recover(depth, error),
        }
        Ok(())
    }

    /// Statement label and construct name.
    fn stmt_prefix(&mut self) -> PResult {
        if self.at(TokenKind::IntLiteral) {
            self.stmt_label = self.current().text.parse().ok();
            self.token_node(NodeKind::Label);
        }
        if self.at(TokenKind::Name) && self.nth_kind(1) == TokenKind::Colon {
            self.start(NodeKind::ConstructName);
            self.declared_name()?;
            self.bump();
            self.finish();
        }
        Ok(())
    }

    fn bump_terminator(&mut self) {
        if matches!(self.kind(), TokenKind::Newline | TokenKind::Semi) {
            self.bump();
        }
    }

    fn recover(&mut self, depth: usize, error: ParseError) {
        let error = match self.kind() {
            TokenKind::Unknown if !error.kind.is_lexical() => ParseError::unknown(self.current()),
            _ => error,
        };
        if !self.stmt_error {
            self.stmt_error = true;
            self.record_error(error);
        }
        if self.builder.depth() > depth {
            self.builder.finish_to(depth + 1);
            if !self.at_terminator() {
                self.start(NodeKind::Error);
                self.bump_rest();
                self.finish();
            }
        } else {
            let cp = self.stmt_cp;
            self.start_at(cp, NodeKind::Error);
            self.bump_rest();
        }
        self.bump_terminator();
        self.builder.finish_to(depth);
    }

    /// Skip empty statements.
    pub(crate) fn skip_blank_lines(&mut self) {
        while matches!(self.kind(), TokenKind::Newline | TokenKind::Semi) {
            self.bump();
        }
    }

    /// Statements until one that belongs to an enclosing construct or unit,
    /// whose class is returned unconsumed.
    pub(crate) fn statements(&mut self) -> Result<StmtClass, Cancelled> {
        loop {
            self.skip_blank_lines();
            let class = self.classify();
            if self.stops(class) {
                return Ok(class);
            }
            let before = self.position();
            self.closed_label = None;
            self.statement(class)?;
            if self.position() == before {
                // Always make progress.
                self.stmt(|p| Err(ParseError::new(ParseErrorKind::UnknownStatement, p.current().span)))?;
            }
            if let Some(label) = self.closed_label {
                if self.frames.last() == Some(&Frame::Do(Some(label))) {
                    return Ok(StmtClass::Terminal);
                }
            }
        }
    }

    /// Statements wrapped in a `Block` node, unless there are none.
    pub(crate) fn block(&mut self) -> Result<StmtClass, Cancelled> {
        let cp = self.checkpoint();
        let end = self.statements()?;
        if !self.builder.is_empty_since(cp) {
            self.start_at(cp, NodeKind::Block);
            self.finish();
        }
        Ok(end)
    }

    fn stops(&self, class: StmtClass) -> bool {
        let open = |frame: Frame| self.frames.iter().any(|f| *f == frame);
        let do_open = self.frames.iter().any(|f| matches!(f, Frame::Do(_)));
        match class {
            StmtClass::Eof
            | StmtClass::End(_)
            | StmtClass::Contains
            | StmtClass::Program
            | StmtClass::Module
            | StmtClass::Subroutine
            | StmtClass::Function
            | StmtClass::BlockData => true,
            StmtClass::EndDo => do_open,
            StmtClass::EndIf | StmtClass::Else | StmtClass::ElseIf => open(Frame::If),
            StmtClass::Case | StmtClass::EndSelect => open(Frame::Select),
            StmtClass::EndType => open(Frame::Type),
            StmtClass::EndInterface => open(Frame::Interface),
            _ => false,
        }
    }

    /// Report a construct or unit that ends without its end statement.
    pub(crate) fn missing_end(&mut self, what: &str, open: Span) {
        let error = ParseError::new(ParseErrorKind::MissingEnd(what.to_string()), open)
            .with_hint(format!("add `{}` to close this", what));
        self.record_error(error);
    }

    /// Swallow a construct or unit nested deeper than [`MAX_NESTING`] into
    /// one `Error` node. End statements are matched by kind only.
    pub(crate) fn skip_too_deep(&mut self) -> Result<(), Cancelled> {
        let error = self.too_deep();
        self.record_error(error);
        self.start(NodeKind::Error);
        let mut open = 0usize;
        loop {
            if self.cancel.is_cancelled() {
                return Err(Cancelled);
            }
            self.skip_blank_lines();
            let class = self.classify();
            if class == StmtClass::Eof {
                break;
            }
            if class.opens_block() && !(class == StmtClass::Do && self.at_labelled_do()) {
                open += 1;
            } else if class.closes_block() {
                open = open.saturating_sub(1);
            }
            self.bump_rest();
            self.bump_terminator();
            if open == 0 {
                break;
            }
        }
        self.finish();
        Ok(())
    }

    // =========================================================================
    // Source File
    // =========================================================================

    fn file(&mut self) -> Result<(), Cancelled> {
        self.start(NodeKind::Root);
        loop {
            self.skip_blank_lines();
            let class = self.classify();
            if class == StmtClass::Eof {
                break;
            }
            let before = self.position();
            self.program_unit(class)?;
            if self.position() == before {
                self.stmt(|p| Err(ParseError::expected("a program unit", p.current())))?;
            }
        }
        self.flush_trivia();
        self.finish();
        Ok(())
    }
}

/// Tokens up to and including the first end-of-file token.
fn tokens_until_eof(tokens: impl IntoIterator<Item = Token>) -> impl Iterator<Item = Token> {
    let mut done = false;
    tokens.into_iter().take_while(move |t| {
        let keep = !done;
        done |= t.kind == TokenKind::Eof;
        keep
    })
}
