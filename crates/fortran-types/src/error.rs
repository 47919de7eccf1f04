// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type check warnings.

use fortran_syntax::Span;
use thiserror::Error;

use crate::types::Ty;

/// A problem found by the type checker. All of them are warnings: the
/// checker never rejects a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("Assigning {found} value to a variable of {expected} type")]
    Mismatch { expected: Ty, found: Ty, span: Span },
    #[error("Can't infer type of this {op} expression where arguments are: {left}, {right}")]
    MalformedBinary {
        op: &'static str,
        left: Ty,
        right: Ty,
        span: Span,
    },
    #[error("Can't infer type of this {op} expression where the argument is: {operand}")]
    MalformedUnary { op: &'static str, operand: Ty, span: Span },
    #[error("Array constructor element of {element} type does not fit an array of {expected} elements")]
    ArrayConstructorElement { expected: Ty, element: Ty, span: Span },
    #[error("Implied do loop bound must be integer, found {found}")]
    ImpliedDoBound { found: Ty, span: Span },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::Mismatch { span, .. }
            | TypeError::MalformedBinary { span, .. }
            | TypeError::MalformedUnary { span, .. }
            | TypeError::ArrayConstructorElement { span, .. }
            | TypeError::ImpliedDoBound { span, .. } => *span,
        }
    }
}
