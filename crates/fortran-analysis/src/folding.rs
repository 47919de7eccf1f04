// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Folding ranges for program units and executable constructs.

use fortran_syntax::{NodeId, NodeKind, Span, SyntaxNode, SyntaxTree};

/// A foldable region: the text between a construct's begin and end
/// statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoldingRange {
    /// The unit or construct being folded.
    pub node: NodeId,
    pub span: Span,
}

/// Collect the folding ranges of a file in source order. Constructs
/// missing either their begin or their end statement do not fold.
pub fn folding_ranges(tree: &SyntaxTree) -> Vec<FoldingRange> {
    tree.root()
        .descendants()
        .filter_map(|node| {
            let (begin, end) = delimiters(node)?;
            let start = statement_text(begin)?.end;
            let end = statement_text(end)?.start;
            (start < end).then(|| FoldingRange {
                node: node.id(),
                span: Span::new(start, end),
            })
        })
        .collect()
}

/// The begin and end statements of a unit or construct.
fn delimiters(node: SyntaxNode<'_>) -> Option<(SyntaxNode<'_>, SyntaxNode<'_>)> {
    let (begin, end): (&[NodeKind], NodeKind) = match node.kind() {
        kind if kind.is_program_unit() => (
            &[
                NodeKind::ProgramStmt,
                NodeKind::ModuleStmt,
                NodeKind::SubroutineStmt,
                NodeKind::FunctionStmt,
                NodeKind::BlockDataStmt,
            ],
            NodeKind::EndStmt,
        ),
        NodeKind::IfConstruct => (&[NodeKind::IfThenStmt], NodeKind::EndIfStmt),
        NodeKind::DoConstruct => (&[NodeKind::DoStmt], NodeKind::EndDoStmt),
        NodeKind::SelectCaseConstruct => (&[NodeKind::SelectCaseStmt], NodeKind::EndSelectStmt),
        _ => return None,
    };
    let first = node.child_nodes().find(|c| c.kind().is_statement())?;
    if !begin.contains(&first.kind()) {
        return None;
    }
    let last = node.child_nodes().filter(|c| c.kind() == end).last()?;
    Some((first, last))
}

/// Span of a statement's text without its label, trivia and terminator.
fn statement_text(stmt: SyntaxNode<'_>) -> Option<Span> {
    stmt.tokens()
        .filter(|t| !t.is_trivia() && !t.kind().is_terminator() && t.parent().kind() != NodeKind::Label)
        .map(|t| t.span())
        .reduce(Span::cover)
}
