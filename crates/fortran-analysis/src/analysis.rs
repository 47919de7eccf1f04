// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The analysis result and its queries.

use fortran_diagnostics::suggestions::closest;
use fortran_diagnostics::{Diagnostic, ToDiagnostic};
use fortran_parser::{ParseError, ParseResult};
use fortran_resolve::{ResolveError, ResolveErrorKind, ResolvedProgram, Symbol};
use fortran_syntax::{SyntaxNode, SyntaxTree};
use fortran_types::{Ty, TypedProgram};
use log::debug;

use crate::folding::{folding_ranges, FoldingRange};

/// Everything known about one source file.
#[derive(Debug)]
pub struct Analysis {
    source: String,
    tree: SyntaxTree,
    parse_errors: Vec<ParseError>,
    resolved: ResolvedProgram,
    typed: Option<TypedProgram>,
    diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub(crate) fn new(
        source: &str,
        parsed: ParseResult,
        resolved: ResolvedProgram,
        typed: Option<TypedProgram>,
    ) -> Self {
        let ParseResult { tree, errors } = parsed;
        let mut diagnostics: Vec<Diagnostic> = errors.iter().map(|e| e.to_diagnostic()).collect();
        diagnostics.extend(resolved.errors.iter().map(|e| resolve_diagnostic(e, &tree, &resolved)));
        if let Some(typed) = &typed {
            diagnostics.extend(typed.errors.iter().map(|e| e.to_diagnostic()));
        }
        // Stable, so diagnostics at one offset keep their stage order.
        diagnostics.sort_by_key(|d| d.primary_span().map_or(usize::MAX, |s| s.start));
        debug!(
            "{} diagnostics ({} errors)",
            diagnostics.len(),
            diagnostics.iter().filter(|d| d.is_error()).count()
        );

        Self {
            source: source.to_string(),
            tree,
            parse_errors: errors,
            resolved,
            typed,
            diagnostics,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn parse_errors(&self) -> &[ParseError] {
        &self.parse_errors
    }

    pub fn resolved(&self) -> &ResolvedProgram {
        &self.resolved
    }

    /// `None` when type checking was switched off.
    pub fn typed(&self) -> Option<&TypedProgram> {
        self.typed.as_ref()
    }

    /// All diagnostics ordered by position.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// The innermost node whose span contains `offset`.
    pub fn node_at(&self, offset: usize) -> Option<SyntaxNode<'_>> {
        self.tree.node_at_offset(offset)
    }

    /// Entities visible as `name` from the scope enclosing `offset`,
    /// innermost first.
    pub fn entries(&self, name: &str, offset: usize) -> Vec<&Symbol> {
        let scope = self.resolved.scope_at_offset(&self.tree, offset);
        self.resolved
            .lookup(name, scope)
            .into_iter()
            .filter_map(|id| self.resolved.symbol(id))
            .collect()
    }

    /// The entity a name reference binds to, or the one a declaration
    /// introduces.
    pub fn declaration_of(&self, node: SyntaxNode<'_>) -> Option<&Symbol> {
        self.resolved.declaration_of(node.id())
    }

    /// The entity named at `offset`: the binding of the reference there, or
    /// the entity declared there.
    pub fn declaration_at(&self, offset: usize) -> Option<&Symbol> {
        let node = self.node_at(offset)?;
        for n in std::iter::once(node).chain(node.ancestors()) {
            if let Some(symbol) = self.declaration_of(n) {
                return Some(symbol);
            }
            if n.kind().is_statement() {
                break;
            }
        }
        None
    }

    /// Every reference to the entity declared or referenced at `offset`.
    pub fn references_at(&self, offset: usize) -> Vec<SyntaxNode<'_>> {
        let Some(symbol) = self.declaration_at(offset) else {
            return Vec::new();
        };
        self.resolved
            .references_to(symbol.id)
            .into_iter()
            .filter_map(|id| self.tree.node(id))
            .collect()
    }

    /// Inferred type of an expression.
    pub fn type_of(&self, node: SyntaxNode<'_>) -> Option<&Ty> {
        self.typed.as_ref()?.type_of(node.id())
    }

    pub fn folding_ranges(&self) -> Vec<FoldingRange> {
        folding_ranges(&self.tree)
    }
}

/// A resolve error as a diagnostic. Undefined names get a did-you-mean
/// help from the names visible where they occur.
fn resolve_diagnostic(error: &ResolveError, tree: &SyntaxTree, resolved: &ResolvedProgram) -> Diagnostic {
    let diag = error.to_diagnostic();
    let ResolveErrorKind::UndefinedName { name } = &error.kind else {
        return diag;
    };
    let scope = resolved.scope_at_offset(tree, error.span.start);
    let mut candidates: Vec<&str> = resolved
        .scopes
        .chain(scope)
        .flat_map(|s| s.bindings.values())
        .filter_map(|id| resolved.symbol(*id))
        .filter(|symbol| symbol.kind.is_data() || symbol.kind.is_procedure())
        .map(|symbol| symbol.name.as_str())
        .collect();
    // Bindings are hashed; sort so ties pick the same name every run.
    candidates.sort_unstable();
    candidates.dedup();
    match closest(name, candidates) {
        Some(best) => diag
            .with_help(format!("did you mean `{}`?", best))
            .with_suggestion(error.span, best),
        None => diag,
    }
}
