// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! S-expression dump of a syntax tree, used by `fortran parse` and tests.

use std::fmt::Write;

use crate::tree::{SyntaxElement, SyntaxNode, SyntaxTree};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SexprOptions {
    /// Print whitespace, comments and continuation tokens.
    pub trivia: bool,
    /// Append `@start..end` to every node.
    pub spans: bool,
}

pub fn to_sexpr(tree: &SyntaxTree, options: SexprOptions) -> String {
    let mut out = String::new();
    write_node(&mut out, tree.root(), 0, options);
    out
}

fn write_node(out: &mut String, node: SyntaxNode<'_>, depth: usize, options: SexprOptions) {
    indent(out, depth);
    let _ = write!(out, "({:?}", node.kind());
    if options.spans {
        let span = node.span();
        let _ = write!(out, "@{}..{}", span.start, span.end);
    }
    for child in node.children() {
        match child {
            SyntaxElement::Node(n) => {
                out.push('\n');
                write_node(out, n, depth + 1, options);
            }
            SyntaxElement::Token(t) => {
                if t.is_trivia() && !options.trivia {
                    continue;
                }
                out.push('\n');
                indent(out, depth + 1);
                let _ = write!(out, "{:?} {:?}", t.kind(), t.text());
            }
        }
    }
    out.push(')');
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::kind::NodeKind;
    use crate::token::{Token, TokenKind};
    use crate::Span;

    #[test]
    fn prints_nested_nodes() {
        let mut b = TreeBuilder::new();
        b.start_node(NodeKind::Root);
        b.start_node(NodeKind::NameRef);
        b.token(Token::new(TokenKind::Name, "x", Span::new(0, 1), 1, 1));
        b.finish_node();
        b.token(Token::new(TokenKind::Whitespace, " ", Span::new(1, 2), 1, 2));
        let tree = b.finish();

        assert_eq!(to_sexpr(&tree, SexprOptions::default()), "(Root\n  (NameRef\n    Name \"x\"))");
        let with_trivia = to_sexpr(&tree, SexprOptions { trivia: true, spans: true });
        assert_eq!(with_trivia, "(Root@0..2\n  (NameRef@0..1\n    Name \"x\")\n  Whitespace \" \")");
    }
}
