// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Bottom-up construction of a [`SyntaxTree`].
//!
//! The parser opens and closes nodes as it recognises them and pushes every
//! token it consumes. A [`Checkpoint`] lets it wrap already-built children
//! in a new node after the fact, which the expression parser needs for
//! binary operators.

use crate::kind::NodeKind;
use crate::token::Token;
use crate::tree::{Element, NodeData, NodeId, SyntaxTree, TokenData, TokenId};
use crate::Span;

/// Position in the currently open node, taken before parsing a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    parent: NodeId,
    len: usize,
}

#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
    tokens: Vec<TokenData>,
    stack: Vec<NodeId>,
    /// Height of every finished node, indexed like `nodes`. A node with no
    /// child nodes has height 1.
    heights: Vec<u32>,
    /// Height of the node closed last.
    last_height: u32,
    /// End of the last pushed token.
    offset: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently open nodes.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Height of the subtree rooted at the node closed last.
    pub fn last_height(&self) -> u32 {
        self.last_height
    }

    /// Kind of the innermost open node.
    pub fn current_kind(&self) -> Option<NodeKind> {
        self.stack.last().map(|id| self.nodes[id.0 as usize].kind)
    }

    pub fn start_node(&mut self, kind: NodeKind) {
        let id = NodeId(self.nodes.len() as u32);
        let parent = self.stack.last().copied();
        let index = match parent {
            Some(p) => {
                let children = &mut self.nodes[p.0 as usize].children;
                children.push(Element::Node(id));
                children.len() as u32 - 1
            }
            None => 0,
        };
        self.heights.push(1);
        self.nodes.push(NodeData {
            kind,
            span: Span::empty(self.offset),
            parent,
            index,
            children: Vec::new(),
        });
        self.stack.push(id);
    }

    pub fn token(&mut self, token: Token) {
        if self.stack.is_empty() {
            self.start_node(NodeKind::Root);
        }
        let parent = self.stack[self.stack.len() - 1];
        let id = TokenId(self.tokens.len() as u32);
        let children = &mut self.nodes[parent.0 as usize].children;
        children.push(Element::Token(id));
        let index = children.len() as u32 - 1;
        self.offset = token.span.end;
        self.tokens.push(TokenData { token, parent, index });
    }

    pub fn finish_node(&mut self) {
        let Some(id) = self.stack.pop() else {
            return;
        };
        let children = &self.nodes[id.0 as usize].children;
        let span = match (children.first(), children.last()) {
            (Some(&first), Some(&last)) => Span::new(self.element_span(first).start, self.element_span(last).end),
            _ => self.nodes[id.0 as usize].span,
        };
        let height = 1 + children
            .iter()
            .filter_map(|c| match c {
                Element::Node(n) => Some(self.heights[n.0 as usize]),
                Element::Token(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.nodes[id.0 as usize].span = span;
        self.heights[id.0 as usize] = height;
        self.last_height = height;
    }

    /// Close open nodes until only `depth` remain.
    pub fn finish_to(&mut self, depth: usize) {
        while self.stack.len() > depth {
            self.finish_node();
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        let parent = self.stack.last().copied().unwrap_or(SyntaxTree::ROOT);
        let len = self.nodes.get(parent.0 as usize).map_or(0, |n| n.children.len());
        Checkpoint { parent, len }
    }

    /// True if nothing was added to the checkpoint's parent since it was
    /// taken.
    pub fn is_empty_since(&self, checkpoint: Checkpoint) -> bool {
        self.stack.last() == Some(&checkpoint.parent)
            && self.nodes[checkpoint.parent.0 as usize].children.len() <= checkpoint.len
    }

    /// Open a node that adopts every child added to the checkpoint's
    /// parent since the checkpoint was taken.
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: NodeKind) {
        let Checkpoint { parent, len } = checkpoint;
        if self.stack.last() != Some(&parent) {
            self.start_node(kind);
            return;
        }
        let id = NodeId(self.nodes.len() as u32);
        let moved = self.nodes[parent.0 as usize].children.split_off(len);
        for (i, &child) in moved.iter().enumerate() {
            match child {
                Element::Node(c) => {
                    let data = &mut self.nodes[c.0 as usize];
                    data.parent = Some(id);
                    data.index = i as u32;
                }
                Element::Token(t) => {
                    let data = &mut self.tokens[t.0 as usize];
                    data.parent = id;
                    data.index = i as u32;
                }
            }
        }
        let start = moved.first().map_or(self.offset, |&c| self.element_span(c).start);
        let parent_children = &mut self.nodes[parent.0 as usize].children;
        parent_children.push(Element::Node(id));
        let index = parent_children.len() as u32 - 1;
        self.heights.push(1);
        self.nodes.push(NodeData {
            kind,
            span: Span::empty(start),
            parent: Some(parent),
            index,
            children: moved,
        });
        self.stack.push(id);
    }

    /// Close every open node and hand out the tree.
    pub fn finish(mut self) -> SyntaxTree {
        if self.nodes.is_empty() {
            self.start_node(NodeKind::Root);
        }
        self.finish_to(0);
        SyntaxTree { nodes: self.nodes, tokens: self.tokens }
    }

    fn element_span(&self, element: Element) -> Span {
        match element {
            Element::Node(id) => self.nodes[id.0 as usize].span,
            Element::Token(id) => self.tokens[id.0 as usize].token.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn tok(kind: TokenKind, text: &str, start: usize) -> Token {
        Token::new(kind, text, Span::new(start, start + text.len()), 1, start as u32 + 1)
    }

    #[test]
    fn nested_nodes_get_spans_and_parents() {
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::Root);
        b.start_node(NodeKind::AssignmentStmt);
        b.start_node(NodeKind::NameRef);
        b.token(tok(TokenKind::Name, "x", 0));
        b.finish_node();
        b.token(tok(TokenKind::Whitespace, " ", 1));
        b.token(tok(TokenKind::Eq, "=", 2));
        b.finish_node();
        let tree = b.finish();

        let root = tree.root();
        assert_eq!(root.span(), Span::new(0, 3));
        let stmt = root.child_nodes().next().unwrap();
        assert_eq!(stmt.kind(), NodeKind::AssignmentStmt);
        let name = stmt.first_child(NodeKind::NameRef).unwrap();
        assert_eq!(name.parent(), Some(stmt));
        assert_eq!(name.text(), "x");
        assert_eq!(stmt.text(), "x =");
    }

    #[test]
    fn checkpoint_wraps_earlier_children() {
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::Root);
        let cp = b.checkpoint();
        b.start_node(NodeKind::NameRef);
        b.token(tok(TokenKind::Name, "a", 0));
        b.finish_node();
        b.start_node_at(cp, NodeKind::BinaryExpr);
        b.token(tok(TokenKind::Plus, "+", 1));
        b.start_node(NodeKind::NameRef);
        b.token(tok(TokenKind::Name, "b", 2));
        b.finish_node();
        b.finish_node();
        let tree = b.finish();

        let bin = tree.root().child_nodes().next().unwrap();
        assert_eq!(bin.kind(), NodeKind::BinaryExpr);
        assert_eq!(bin.span(), Span::new(0, 3));
        let operands: Vec<_> = bin.children_of_kind(NodeKind::NameRef).collect();
        assert_eq!(operands.len(), 2);
        assert_eq!(operands[0].parent(), Some(bin));
        assert_eq!(operands[0].next_sibling(), Some(operands[1]));
        assert_eq!(operands[1].prev_sibling(), Some(operands[0]));
    }

    #[test]
    fn heights_count_nested_nodes() {
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::Root);
        let cp = b.checkpoint();
        b.start_node(NodeKind::NameRef);
        b.token(tok(TokenKind::Name, "a", 0));
        b.finish_node();
        assert_eq!(b.last_height(), 1);
        b.start_node_at(cp, NodeKind::BinaryExpr);
        b.token(tok(TokenKind::Plus, "+", 1));
        b.start_node(NodeKind::ParenExpr);
        b.token(tok(TokenKind::LParen, "(", 2));
        b.start_node(NodeKind::NameRef);
        b.token(tok(TokenKind::Name, "b", 3));
        b.finish_node();
        b.token(tok(TokenKind::RParen, ")", 4));
        b.finish_node();
        assert_eq!(b.last_height(), 2);
        b.finish_node();
        assert_eq!(b.last_height(), 3);
    }

    #[test]
    fn empty_builder_yields_empty_root() {
        let tree = TreeBuilder::new().finish();
        assert_eq!(tree.root().kind(), NodeKind::Root);
        assert_eq!(tree.root().span(), Span::new(0, 0));
        assert_eq!(tree.text(), "");
    }
}
