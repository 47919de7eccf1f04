// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Concrete syntax tree types for Fortran sources.
//!
//! This crate defines the tokens, node kinds and the lossless tree shared
//! between the lexer, parser, resolver and type inference. Every byte of
//! the input ends up in exactly one token of the tree, so
//! `tree.text() == source` always holds.

pub mod ast;
pub mod builder;
pub mod cancel;
pub mod form;
pub mod kind;
pub mod named;
pub mod ops;
pub mod sexpr;
pub mod span;
pub mod token;
pub mod tree;

pub use ast::AstNode;
pub use builder::{Checkpoint, TreeBuilder};
pub use cancel::{CancelCheck, Cancelled, NeverCancel};
pub use form::SourceForm;
pub use kind::NodeKind;
pub use named::NamedElement;
pub use ops::{BinaryOp, UnaryOp};
pub use sexpr::{to_sexpr, SexprOptions};
pub use span::{LineMap, Span};
pub use token::{Token, TokenKind};
pub use tree::{NodeId, SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTree, TokenId};
