// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! One-call analysis of a Fortran source file.
//!
//! Runs the lexer, parser, resolver and (optionally) the type checker over
//! a text and bundles the tree, the resolved program and the ordered
//! diagnostics with the queries tools ask of them.

mod analysis;
mod folding;

pub use analysis::Analysis;
pub use folding::{folding_ranges, FoldingRange};

use fortran_lexer::{tokenize, LexOptions};
use fortran_syntax::{CancelCheck, Cancelled, NeverCancel, SourceForm};
use log::debug;

/// What to run over a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub lex: LexOptions,
    /// Run the type checker and report its warnings.
    pub check_types: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            lex: LexOptions::default(),
            check_types: true,
        }
    }
}

impl AnalysisOptions {
    pub fn new(form: SourceForm) -> Self {
        Self {
            lex: LexOptions::new(form),
            ..Self::default()
        }
    }
}

/// Analyze `text`. Never cancelled.
pub fn analyze(text: &str, options: &AnalysisOptions) -> Result<Analysis, Cancelled> {
    analyze_with_cancel(text, options, &NeverCancel)
}

/// Analyze `text`, polling `cancel` at every statement boundary while
/// parsing and type checking, and every declaration boundary while
/// resolving.
pub fn analyze_with_cancel(
    text: &str,
    options: &AnalysisOptions,
    cancel: &dyn CancelCheck,
) -> Result<Analysis, Cancelled> {
    debug!("analyzing {} bytes of {} form source", text.len(), options.lex.form);
    let parsed = fortran_parser::parse_with_cancel(tokenize(text, options.lex), cancel)?;
    let resolved = fortran_resolve::resolve_with_cancel(&parsed.tree, cancel)?;
    let typed = if options.check_types {
        Some(fortran_types::typecheck_with_cancel(&parsed.tree, &resolved, cancel)?)
    } else {
        None
    };
    Ok(Analysis::new(text, parsed, resolved, typed))
}
