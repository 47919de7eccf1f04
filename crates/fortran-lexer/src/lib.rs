// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lexer for Fortran sources.
//!
//! Tokenizes fixed or free form source text into a lossless token stream
//! for the parser. Keywords are not reserved; every word is a
//! [`TokenKind::Name`](fortran_syntax::TokenKind::Name).

mod lexer;
mod raw;

pub use lexer::{tokenize, LexOptions, Lexer, DEFAULT_FIXED_LINE_LENGTH};
