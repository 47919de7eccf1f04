// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The "named element" capability.
//!
//! Declaring nodes keep their name in a child [`NodeKind::Name`] node. Which
//! kinds qualify is decided by [`NodeKind::is_named_element`], so any pass
//! can ask a node for its identifier without knowing its concrete kind.

use compact_str::CompactString;

use crate::kind::NodeKind;
use crate::token::TokenKind;
use crate::tree::{SyntaxNode, SyntaxToken};
use crate::Span;

/// A node that declares a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedElement<'t>(SyntaxNode<'t>);

impl<'t> NamedElement<'t> {
    pub fn cast(node: SyntaxNode<'t>) -> Option<Self> {
        node.kind().is_named_element().then_some(Self(node))
    }

    pub fn syntax(&self) -> SyntaxNode<'t> {
        self.0
    }

    /// The name token. Absent when error recovery dropped it.
    pub fn identifier(&self) -> Option<SyntaxToken<'t>> {
        self.0
            .first_child(NodeKind::Name)?
            .first_token(TokenKind::Name)
    }

    pub fn name(&self) -> Option<&'t str> {
        self.identifier().map(|t| t.text())
    }

    /// Case-folded name used for lookup.
    pub fn key(&self) -> Option<CompactString> {
        self.identifier().map(|t| t.token().key())
    }

    /// Span of the identifier, falling back to the whole node.
    pub fn name_span(&self) -> Span {
        self.identifier().map_or(self.0.span(), |t| t.span())
    }

    /// Renaming is not supported on an immutable tree; the element is
    /// returned unchanged.
    pub fn set_name(self, _name: &str) -> Self {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::token::Token;

    fn tok(kind: TokenKind, text: &str, start: usize) -> Token {
        Token::new(kind, text, Span::new(start, start + text.len()), 1, start as u32 + 1)
    }

    #[test]
    fn identifier_comes_from_name_child() {
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::Root);
        b.start_node(NodeKind::SubroutineStmt);
        b.token(tok(TokenKind::Name, "subroutine", 0));
        b.token(tok(TokenKind::Whitespace, " ", 10));
        b.start_node(NodeKind::Name);
        b.token(tok(TokenKind::Name, "Solve", 11));
        b.finish_node();
        b.finish_node();
        let tree = b.finish();

        let stmt = tree.root().child_nodes().next().unwrap();
        let named = NamedElement::cast(stmt).unwrap();
        assert_eq!(named.name(), Some("Solve"));
        assert_eq!(named.key().as_deref(), Some("solve"));
        assert_eq!(named.name_span(), Span::new(11, 16));
        assert_eq!(named.set_name("other").name(), Some("Solve"));
    }

    #[test]
    fn missing_name_is_none() {
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::Root);
        b.start_node(NodeKind::ProgramStmt);
        b.token(tok(TokenKind::Name, "program", 0));
        b.finish_node();
        let tree = b.finish();

        let stmt = tree.root().child_nodes().next().unwrap();
        let named = NamedElement::cast(stmt).unwrap();
        assert!(named.identifier().is_none());
        assert_eq!(named.name_span(), stmt.span());
        assert!(NamedElement::cast(tree.root()).is_none());
    }
}
