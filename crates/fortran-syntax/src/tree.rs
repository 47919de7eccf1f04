// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The immutable concrete syntax tree.
//!
//! Nodes and tokens live in two arenas owned by [`SyntaxTree`]. Each node
//! stores its ordered children and a back-link to its parent, recorded once
//! at construction time. Nothing in this module mutates a finished tree.
//!
//! [`SyntaxNode`] and [`SyntaxToken`] are cheap `Copy` views borrowing the
//! tree; all traversals over them are lazy iterators.

use std::fmt;

use crate::kind::NodeKind;
use crate::token::{Token, TokenKind};
use crate::Span;

/// Index of a node in its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

/// Index of a leaf token in its tree. Token ids follow source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TokenId(pub u32);

/// A child slot: either an interior node or a leaf token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Node(NodeId),
    Token(TokenId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) span: Span,
    pub(crate) parent: Option<NodeId>,
    /// Position in the parent's child list.
    pub(crate) index: u32,
    pub(crate) children: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TokenData {
    pub(crate) token: Token,
    pub(crate) parent: NodeId,
    pub(crate) index: u32,
}

/// A finished syntax tree. Cloning copies the arenas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    pub(crate) nodes: Vec<NodeData>,
    pub(crate) tokens: Vec<TokenData>,
}

impl SyntaxTree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode { tree: self, id: Self::ROOT }
    }

    pub fn node(&self, id: NodeId) -> Option<SyntaxNode<'_>> {
        self.nodes.get(id.0 as usize).map(|_| SyntaxNode { tree: self, id })
    }

    pub fn token(&self, id: TokenId) -> Option<SyntaxToken<'_>> {
        self.tokens.get(id.0 as usize).map(|_| SyntaxToken { tree: self, id })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Every leaf token in source order.
    pub fn tokens(&self) -> impl Iterator<Item = SyntaxToken<'_>> + '_ {
        (0..self.tokens.len() as u32).map(move |i| SyntaxToken { tree: self, id: TokenId(i) })
    }

    /// The source text, rebuilt from the leaves.
    pub fn text(&self) -> String {
        self.root().text()
    }

    /// Deepest node whose span contains `offset`.
    pub fn node_at_offset(&self, offset: usize) -> Option<SyntaxNode<'_>> {
        self.root().node_at_offset(offset)
    }

    /// Leaf token whose span contains `offset`.
    pub fn token_at_offset(&self, offset: usize) -> Option<SyntaxToken<'_>> {
        self.root().token_at_offset(offset)
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }

    fn token_data(&self, id: TokenId) -> &TokenData {
        &self.tokens[id.0 as usize]
    }

    fn element_span(&self, element: Element) -> Span {
        match element {
            Element::Node(id) => self.data(id).span,
            Element::Token(id) => self.token_data(id).token.span,
        }
    }

    fn wrap(&self, element: Element) -> SyntaxElement<'_> {
        match element {
            Element::Node(id) => SyntaxElement::Node(SyntaxNode { tree: self, id }),
            Element::Token(id) => SyntaxElement::Token(SyntaxToken { tree: self, id }),
        }
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A borrowed view of one interior node.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let span = self.span();
        write!(f, "{:?}@{}..{}", self.kind(), span.start, span.end)
    }
}

impl<'t> SyntaxNode<'t> {
    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn tree(self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(self) -> NodeKind {
        self.tree.data(self.id).kind
    }

    pub fn span(self) -> Span {
        self.tree.data(self.id).span
    }

    /// O(1) through the construction-time back-link.
    pub fn parent(self) -> Option<SyntaxNode<'t>> {
        let tree = self.tree;
        tree.data(self.id).parent.map(|id| SyntaxNode { tree, id })
    }

    /// Strict ancestors, innermost first.
    pub fn ancestors(self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    /// All children, nodes and tokens, in source order.
    pub fn children(self) -> impl Iterator<Item = SyntaxElement<'t>> + 't {
        let tree = self.tree;
        tree.data(self.id).children.iter().map(move |&e| tree.wrap(e))
    }

    pub fn child_nodes(self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.children().filter_map(SyntaxElement::into_node)
    }

    pub fn child_tokens(self) -> impl Iterator<Item = SyntaxToken<'t>> + 't {
        self.children().filter_map(SyntaxElement::into_token)
    }

    pub fn children_of_kind(self, kind: NodeKind) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.child_nodes().filter(move |n| n.kind() == kind)
    }

    pub fn first_child(self, kind: NodeKind) -> Option<SyntaxNode<'t>> {
        self.children_of_kind(kind).next()
    }

    /// First direct child token of the given kind.
    pub fn first_token(self, kind: TokenKind) -> Option<SyntaxToken<'t>> {
        self.child_tokens().find(|t| t.kind() == kind)
    }

    /// Direct child tokens that are not trivia.
    pub fn significant_tokens(self) -> impl Iterator<Item = SyntaxToken<'t>> + 't {
        self.child_tokens().filter(|t| !t.is_trivia())
    }

    pub fn next_sibling_or_token(self) -> Option<SyntaxElement<'t>> {
        let data = self.tree.data(self.id);
        let parent = self.tree.data(data.parent?);
        parent.children.get(data.index as usize + 1).map(|&e| self.tree.wrap(e))
    }

    pub fn prev_sibling_or_token(self) -> Option<SyntaxElement<'t>> {
        let data = self.tree.data(self.id);
        let parent = self.tree.data(data.parent?);
        let index = (data.index as usize).checked_sub(1)?;
        parent.children.get(index).map(|&e| self.tree.wrap(e))
    }

    pub fn next_sibling(self) -> Option<SyntaxNode<'t>> {
        let data = self.tree.data(self.id);
        let parent = self.tree.data(data.parent?);
        parent.children[data.index as usize + 1..].iter().find_map(|&e| match e {
            Element::Node(id) => Some(SyntaxNode { tree: self.tree, id }),
            Element::Token(_) => None,
        })
    }

    pub fn prev_sibling(self) -> Option<SyntaxNode<'t>> {
        let data = self.tree.data(self.id);
        let parent = self.tree.data(data.parent?);
        parent.children[..data.index as usize].iter().rev().find_map(|&e| match e {
            Element::Node(id) => Some(SyntaxNode { tree: self.tree, id }),
            Element::Token(_) => None,
        })
    }

    /// Preorder walk over this node and every node below it.
    pub fn descendants(self) -> Descendants<'t> {
        Descendants { tree: self.tree, root: self.id, next: Some(self.id) }
    }

    pub fn descendants_of_kind(self, kind: NodeKind) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.descendants().filter(move |n| n.kind() == kind)
    }

    /// Every leaf token under this node, in source order.
    pub fn tokens(self) -> impl Iterator<Item = SyntaxToken<'t>> + 't {
        let tree = self.tree;
        let range = match (self.first_leaf(), self.last_leaf()) {
            (Some(first), Some(last)) => first.id.0..last.id.0 + 1,
            _ => 0..0,
        };
        range.map(move |i| SyntaxToken { tree, id: TokenId(i) })
    }

    pub fn first_leaf(self) -> Option<SyntaxToken<'t>> {
        self.tree.data(self.id).children.iter().find_map(|&e| match e {
            Element::Token(id) => Some(SyntaxToken { tree: self.tree, id }),
            Element::Node(id) => SyntaxNode { tree: self.tree, id }.first_leaf(),
        })
    }

    pub fn last_leaf(self) -> Option<SyntaxToken<'t>> {
        self.tree.data(self.id).children.iter().rev().find_map(|&e| match e {
            Element::Token(id) => Some(SyntaxToken { tree: self.tree, id }),
            Element::Node(id) => SyntaxNode { tree: self.tree, id }.last_leaf(),
        })
    }

    /// Source text covered by this node, trivia included.
    pub fn text(self) -> String {
        self.tokens().map(|t| t.text()).collect()
    }

    /// Deepest node inside this one whose span contains `offset`.
    ///
    /// Descends structurally with a binary search over each child list,
    /// so the cost is O(depth · log(children)).
    pub fn node_at_offset(self, offset: usize) -> Option<SyntaxNode<'t>> {
        if !self.span().contains(offset) {
            return None;
        }
        let mut node = self;
        loop {
            match node.child_at_offset(offset) {
                Some(Element::Node(id)) => node = SyntaxNode { tree: self.tree, id },
                _ => return Some(node),
            }
        }
    }

    /// Leaf token inside this node whose span contains `offset`.
    pub fn token_at_offset(self, offset: usize) -> Option<SyntaxToken<'t>> {
        if !self.span().contains(offset) {
            return None;
        }
        let mut node = self;
        loop {
            match node.child_at_offset(offset)? {
                Element::Node(id) => node = SyntaxNode { tree: self.tree, id },
                Element::Token(id) => return Some(SyntaxToken { tree: self.tree, id }),
            }
        }
    }

    fn child_at_offset(self, offset: usize) -> Option<Element> {
        let tree = self.tree;
        let children = &tree.data(self.id).children;
        let idx = children.partition_point(|&c| tree.element_span(c).end <= offset);
        children
            .get(idx)
            .copied()
            .filter(|&c| tree.element_span(c).contains(offset))
    }
}

/// Lazy preorder iterator returned by [`SyntaxNode::descendants`].
///
/// Walks with the parent links instead of an explicit stack.
#[derive(Clone)]
pub struct Descendants<'t> {
    tree: &'t SyntaxTree,
    root: NodeId,
    next: Option<NodeId>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<SyntaxNode<'t>> {
        let current = self.next?;
        self.next = self.successor(current);
        Some(SyntaxNode { tree: self.tree, id: current })
    }
}

impl Descendants<'_> {
    fn successor(&self, current: NodeId) -> Option<NodeId> {
        let tree = self.tree;
        if let Some(child) = first_node_in(&tree.data(current).children) {
            return Some(child);
        }
        let mut node = current;
        while node != self.root {
            let data = tree.data(node);
            let parent = data.parent?;
            let siblings = &tree.data(parent).children[data.index as usize + 1..];
            if let Some(sibling) = first_node_in(siblings) {
                return Some(sibling);
            }
            node = parent;
        }
        None
    }
}

fn first_node_in(elements: &[Element]) -> Option<NodeId> {
    elements.iter().find_map(|&e| match e {
        Element::Node(id) => Some(id),
        Element::Token(_) => None,
    })
}

// ============================================================================
// Tokens
// ============================================================================

/// A borrowed view of one leaf token.
#[derive(Clone, Copy)]
pub struct SyntaxToken<'t> {
    tree: &'t SyntaxTree,
    id: TokenId,
}

impl PartialEq for SyntaxToken<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxToken<'_> {}

impl fmt::Debug for SyntaxToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let span = self.span();
        write!(f, "{:?}@{}..{} {:?}", self.kind(), span.start, span.end, self.text())
    }
}

impl<'t> SyntaxToken<'t> {
    pub fn id(self) -> TokenId {
        self.id
    }

    pub fn token(self) -> &'t Token {
        &self.tree.token_data(self.id).token
    }

    pub fn kind(self) -> TokenKind {
        self.token().kind
    }

    pub fn text(self) -> &'t str {
        self.token().text.as_str()
    }

    pub fn span(self) -> Span {
        self.token().span
    }

    pub fn is_trivia(self) -> bool {
        self.kind().is_trivia()
    }

    pub fn parent(self) -> SyntaxNode<'t> {
        SyntaxNode { tree: self.tree, id: self.tree.token_data(self.id).parent }
    }

    pub fn ancestors(self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        std::iter::successors(Some(self.parent()), |n| n.parent())
    }

    pub fn next_sibling_or_token(self) -> Option<SyntaxElement<'t>> {
        let data = self.tree.token_data(self.id);
        let parent = self.tree.data(data.parent);
        parent.children.get(data.index as usize + 1).map(|&e| self.tree.wrap(e))
    }

    pub fn prev_sibling_or_token(self) -> Option<SyntaxElement<'t>> {
        let data = self.tree.token_data(self.id);
        let parent = self.tree.data(data.parent);
        let index = (data.index as usize).checked_sub(1)?;
        parent.children.get(index).map(|&e| self.tree.wrap(e))
    }

    /// Next leaf in source order, crossing node boundaries.
    pub fn next_token(self) -> Option<SyntaxToken<'t>> {
        self.tree.token(TokenId(self.id.0 + 1))
    }

    pub fn prev_token(self) -> Option<SyntaxToken<'t>> {
        self.tree.token(TokenId(self.id.0.checked_sub(1)?))
    }
}

// ============================================================================
// Elements
// ============================================================================

/// A child of a node: an interior node or a leaf token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxElement<'t> {
    Node(SyntaxNode<'t>),
    Token(SyntaxToken<'t>),
}

impl<'t> SyntaxElement<'t> {
    pub fn span(self) -> Span {
        match self {
            SyntaxElement::Node(n) => n.span(),
            SyntaxElement::Token(t) => t.span(),
        }
    }

    pub fn into_node(self) -> Option<SyntaxNode<'t>> {
        match self {
            SyntaxElement::Node(n) => Some(n),
            SyntaxElement::Token(_) => None,
        }
    }

    pub fn into_token(self) -> Option<SyntaxToken<'t>> {
        match self {
            SyntaxElement::Token(t) => Some(t),
            SyntaxElement::Node(_) => None,
        }
    }

    pub fn parent(self) -> Option<SyntaxNode<'t>> {
        match self {
            SyntaxElement::Node(n) => n.parent(),
            SyntaxElement::Token(t) => Some(t.parent()),
        }
    }
}
