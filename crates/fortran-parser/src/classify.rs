// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement classification.
//!
//! Keywords are not reserved, so the kind of a statement is decided by
//! looking ahead over its significant tokens before anything is consumed.
//! Assignments are recognised first: `if (i) = 3` assigns to an array
//! named `if`.

use compact_str::CompactString;
use fortran_syntax::{NodeKind, TokenKind};

use crate::parser::Parser;

/// What the statement at the cursor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StmtClass {
    Eof,
    /// The labelled statement that ends a labelled DO. Never produced by
    /// classification.
    Terminal,

    // Units
    Program,
    Module,
    Subroutine,
    Function,
    BlockData,
    /// `end` with the unit keyword that follows it, if any.
    End(Option<NodeKind>),
    Contains,

    // Specification
    Use,
    Implicit,
    TypeDecl,
    Parameter,
    Dimension,
    Common,
    Data,
    External,
    Intrinsic,
    Attr,
    Format,
    TypeDef,
    EndType,
    Interface,
    EndInterface,
    ModuleProcedure,

    // Executable
    Assignment,
    Call,
    IfThen,
    If,
    ArithmeticIf,
    ElseIf,
    Else,
    EndIf,
    Do,
    EndDo,
    SelectCase,
    Case,
    EndSelect,
    Cycle,
    Exit,
    Goto,
    Continue,
    Return,
    Stop,
    Print,
    Read,
    Write,
    Io,
    Allocate,

    Unsupported(&'static str),
    Unknown,
}

impl StmtClass {
    pub(crate) fn is_unit_start(self) -> bool {
        matches!(
            self,
            StmtClass::Program
                | StmtClass::Module
                | StmtClass::Subroutine
                | StmtClass::Function
                | StmtClass::BlockData
        )
    }

    /// Statements that open a construct, unit or block closed by an end
    /// statement.
    pub(crate) fn opens_block(self) -> bool {
        self.is_unit_start()
            || matches!(
                self,
                StmtClass::IfThen | StmtClass::Do | StmtClass::SelectCase | StmtClass::TypeDef | StmtClass::Interface
            )
    }

    pub(crate) fn closes_block(self) -> bool {
        matches!(
            self,
            StmtClass::End(_)
                | StmtClass::EndIf
                | StmtClass::EndDo
                | StmtClass::EndSelect
                | StmtClass::EndType
                | StmtClass::EndInterface
        )
    }

    /// Statements allowed after a logical IF.
    pub(crate) fn is_action(self) -> bool {
        matches!(
            self,
            StmtClass::Assignment
                | StmtClass::Call
                | StmtClass::Cycle
                | StmtClass::Exit
                | StmtClass::Goto
                | StmtClass::Continue
                | StmtClass::Return
                | StmtClass::Stop
                | StmtClass::Print
                | StmtClass::Read
                | StmtClass::Write
                | StmtClass::Io
                | StmtClass::Allocate
        )
    }

    /// Spelling used when the statement shows up where it does not belong.
    pub(crate) fn spelling(self) -> &'static str {
        match self {
            StmtClass::ElseIf => "else if",
            StmtClass::Else => "else",
            StmtClass::EndIf => "end if",
            StmtClass::EndDo => "end do",
            StmtClass::Case => "case",
            StmtClass::EndSelect => "end select",
            StmtClass::EndType => "end type",
            StmtClass::EndInterface => "end interface",
            StmtClass::Contains => "contains",
            _ => "statement",
        }
    }
}

const TYPE_KEYWORDS: &[&str] = &["integer", "real", "complex", "logical", "character", "doubleprecision", "doublecomplex"];

const PREFIX_KEYWORDS: &[&str] = &["recursive", "pure", "elemental", "impure", "module", "non_recursive"];

const ATTR_KEYWORDS: &[&str] = &[
    "save",
    "public",
    "private",
    "allocatable",
    "pointer",
    "target",
    "optional",
    "intent",
    "sequence",
    "value",
    "volatile",
    "protected",
    "asynchronous",
    "contiguous",
];

const IO_KEYWORDS: &[&str] = &["open", "close", "inquire", "rewind", "backspace", "endfile", "flush", "wait"];

const UNSUPPORTED: &[(&str, &str)] = &[
    ("equivalence", "equivalence statement"),
    ("namelist", "namelist statement"),
    ("entry", "entry statement"),
    ("where", "where construct"),
    ("elsewhere", "where construct"),
    ("forall", "forall construct"),
    ("associate", "associate construct"),
    ("block", "block construct"),
    ("critical", "critical construct"),
    ("enum", "enum definition"),
    ("enumerator", "enum definition"),
    ("assign", "assign statement"),
    ("procedure", "procedure statement"),
    ("generic", "generic binding"),
    ("final", "final binding"),
    ("import", "import statement"),
    ("class", "class declaration"),
    ("submodule", "submodule"),
    ("include", "include line"),
    ("selecttype", "select type construct"),
];

impl Parser<'_> {
    /// Significant-token offset where the statement keyword starts, past
    /// any label and construct name.
    /// A DO statement naming its terminal label, which has no `end do`.
    pub(crate) fn at_labelled_do(&self) -> bool {
        self.nth_kind(self.keyword_offset() + 1) == TokenKind::IntLiteral
    }

    fn keyword_offset(&self) -> usize {
        let mut n = 0;
        if self.nth_kind(0) == TokenKind::IntLiteral {
            n = 1;
        }
        if self.nth_kind(n) == TokenKind::Name && self.nth_kind(n + 1) == TokenKind::Colon {
            n += 2;
        }
        n
    }

    fn word(&self, n: usize) -> Option<CompactString> {
        let token = self.nth(n);
        (token.kind == TokenKind::Name).then(|| token.key())
    }

    /// Offset just past the parenthesis that opens at `n`.
    pub(crate) fn skip_parens(&self, mut n: usize) -> Option<usize> {
        let mut depth = 0usize;
        loop {
            match self.nth_kind(n) {
                TokenKind::LParen | TokenKind::LArrayParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RArrayParen | TokenKind::RBracket => {
                    depth = depth.checked_sub(1)?;
                }
                k if k.is_terminator() => return None,
                _ => {}
            }
            n += 1;
            if depth == 0 {
                return Some(n);
            }
        }
    }

    pub(crate) fn classify(&self) -> StmtClass {
        if self.at_eof() {
            return StmtClass::Eof;
        }
        let n = self.keyword_offset();
        if let Some(class) = self.classify_assignment(n) {
            return class;
        }
        if let Some(class) = self.classify_procedure_header(n) {
            return class;
        }
        let Some(first) = self.word(n) else {
            return StmtClass::Unknown;
        };
        let second = self.word(n + 1);
        let second = second.as_deref();
        let next_kind = self.nth_kind(n + 1);

        match first.as_str() {
            "program" => StmtClass::Program,
            "module" if second == Some("procedure") => StmtClass::ModuleProcedure,
            "module" => StmtClass::Module,
            "blockdata" => StmtClass::BlockData,
            "block" if second == Some("data") => StmtClass::BlockData,
            "end" => match second {
                None => StmtClass::End(None),
                Some("block") if self.nth_is(n + 2, "data") => StmtClass::End(Some(NodeKind::BlockData)),
                Some(word) => end_class(word).unwrap_or(StmtClass::End(None)),
            },
            word if word.len() > 3 && word.starts_with("end") => {
                end_class(&word[3..]).unwrap_or(StmtClass::Unknown)
            }
            "contains" => StmtClass::Contains,

            "if" if next_kind == TokenKind::LParen => match self.skip_parens(n + 1) {
                Some(after) if self.nth_is(after, "then") && self.nth_kind(after + 1).is_terminator() => {
                    StmtClass::IfThen
                }
                Some(after) if self.nth_kind(after) == TokenKind::IntLiteral => StmtClass::ArithmeticIf,
                _ => StmtClass::If,
            },
            "elseif" => StmtClass::ElseIf,
            "else" if second == Some("if") => StmtClass::ElseIf,
            "else" if second == Some("where") => StmtClass::Unsupported("where construct"),
            "else" => StmtClass::Else,
            "do" => StmtClass::Do,
            "selectcase" => StmtClass::SelectCase,
            "select" if second == Some("case") => StmtClass::SelectCase,
            "select" if second == Some("type") => StmtClass::Unsupported("select type construct"),
            "case" => StmtClass::Case,

            "type" if next_kind == TokenKind::LParen => StmtClass::TypeDecl,
            "type" if second == Some("is") => StmtClass::Unsupported("select type construct"),
            "type" => StmtClass::TypeDef,
            "interface" => StmtClass::Interface,
            "abstract" if second == Some("interface") => StmtClass::Interface,
            "double" if matches!(second, Some("precision" | "complex")) => StmtClass::TypeDecl,
            word if TYPE_KEYWORDS.contains(&word) => StmtClass::TypeDecl,

            "use" => StmtClass::Use,
            "implicit" => StmtClass::Implicit,
            "parameter" => StmtClass::Parameter,
            "dimension" => StmtClass::Dimension,
            "common" => StmtClass::Common,
            "data" => StmtClass::Data,
            "external" => StmtClass::External,
            "intrinsic" => StmtClass::Intrinsic,
            word if ATTR_KEYWORDS.contains(&word) => StmtClass::Attr,
            "format" if next_kind == TokenKind::LParen => StmtClass::Format,

            "call" => StmtClass::Call,
            "cycle" => StmtClass::Cycle,
            "exit" => StmtClass::Exit,
            "goto" => StmtClass::Goto,
            "go" if second == Some("to") => StmtClass::Goto,
            "continue" => StmtClass::Continue,
            "return" => StmtClass::Return,
            "stop" | "pause" => StmtClass::Stop,
            "error" if second == Some("stop") => StmtClass::Stop,
            "print" => StmtClass::Print,
            "read" => StmtClass::Read,
            "write" => StmtClass::Write,
            word if IO_KEYWORDS.contains(&word) => StmtClass::Io,
            "allocate" | "deallocate" | "nullify" => StmtClass::Allocate,

            word => UNSUPPORTED
                .iter()
                .find(|(kw, _)| *kw == word)
                .map_or(StmtClass::Unknown, |(_, what)| StmtClass::Unsupported(what)),
        }
    }

    /// `name`, then any subscripts and components, then `=` or `=>`.
    fn classify_assignment(&self, start: usize) -> Option<StmtClass> {
        if self.nth_kind(start) != TokenKind::Name {
            return None;
        }
        let mut n = start + 1;
        loop {
            match self.nth_kind(n) {
                TokenKind::LParen => n = self.skip_parens(n)?,
                TokenKind::Percent if self.nth_kind(n + 1) == TokenKind::Name => n += 2,
                TokenKind::Eq | TokenKind::Arrow => break,
                _ => return None,
            }
        }
        // `DO10I=1,10` with the blanks squeezed out.
        let name = self.nth(start).key();
        let fused_do = name.len() > 2 && name.starts_with("do") && name.as_bytes()[2].is_ascii_digit();
        if fused_do && n == start + 1 && self.has_top_level_comma(n + 1) {
            return Some(StmtClass::Unsupported("DO statement without blanks"));
        }
        Some(StmtClass::Assignment)
    }

    fn has_top_level_comma(&self, mut n: usize) -> bool {
        let mut depth = 0usize;
        loop {
            match self.nth_kind(n) {
                TokenKind::LParen | TokenKind::LArrayParen | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RArrayParen | TokenKind::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Comma if depth == 0 => return true,
                k if k.is_terminator() => return false,
                _ => {}
            }
            n += 1;
        }
    }

    /// Prefix words and a type, then `function` or `subroutine` and a name.
    fn classify_procedure_header(&self, start: usize) -> Option<StmtClass> {
        let mut n = start;
        loop {
            let word = self.word(n)?;
            match word.as_str() {
                "function" | "subroutine" if self.nth_kind(n + 1) == TokenKind::Name => {
                    return Some(if word == "function" { StmtClass::Function } else { StmtClass::Subroutine });
                }
                w if PREFIX_KEYWORDS.contains(&w) => n += 1,
                "double" if matches!(self.word(n + 1).as_deref(), Some("precision" | "complex")) => n += 2,
                "type" if self.nth_kind(n + 1) == TokenKind::LParen => n = self.skip_parens(n + 1)?,
                w if TYPE_KEYWORDS.contains(&w) => {
                    n += 1;
                    if self.nth_kind(n) == TokenKind::LParen {
                        n = self.skip_parens(n)?;
                    } else if self.nth_kind(n) == TokenKind::Star {
                        n += 1;
                        n = match self.nth_kind(n) {
                            TokenKind::LParen => self.skip_parens(n)?,
                            TokenKind::IntLiteral => n + 1,
                            _ => return None,
                        };
                    }
                }
                _ => return None,
            }
        }
    }
}

/// Class of `end <word>` (or `end<word>`).
fn end_class(word: &str) -> Option<StmtClass> {
    Some(match word {
        "program" => StmtClass::End(Some(NodeKind::MainProgram)),
        "module" => StmtClass::End(Some(NodeKind::Module)),
        "subroutine" => StmtClass::End(Some(NodeKind::Subroutine)),
        "function" => StmtClass::End(Some(NodeKind::Function)),
        "blockdata" => StmtClass::End(Some(NodeKind::BlockData)),
        "do" => StmtClass::EndDo,
        "if" => StmtClass::EndIf,
        "select" => StmtClass::EndSelect,
        "type" => StmtClass::EndType,
        "interface" => StmtClass::EndInterface,
        "file" => StmtClass::Io,
        "where" => StmtClass::Unsupported("where construct"),
        "forall" => StmtClass::Unsupported("forall construct"),
        "associate" => StmtClass::Unsupported("associate construct"),
        "block" => StmtClass::Unsupported("block construct"),
        "critical" => StmtClass::Unsupported("critical construct"),
        "enum" => StmtClass::Unsupported("enum definition"),
        "submodule" => StmtClass::Unsupported("submodule"),
        _ => return None,
    })
}
