// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Resolution error types.

use fortran_syntax::Span;
use thiserror::Error;

/// A name resolution problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ResolveError {
    pub kind: ResolveErrorKind,
    pub span: Span,
}

impl ResolveError {
    pub fn undefined(name: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ResolveErrorKind::UndefinedName { name: name.into() },
            span,
        }
    }

    pub fn duplicate(name: impl Into<String>, span: Span, previous: Span) -> Self {
        Self {
            kind: ResolveErrorKind::DuplicateDeclaration { name: name.into(), previous },
            span,
        }
    }

    pub fn unknown_module(name: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ResolveErrorKind::UnknownModule { name: name.into() },
            span,
        }
    }

    pub fn not_exported(name: impl Into<String>, module: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ResolveErrorKind::NotExported { name: name.into(), module: module.into() },
            span,
        }
    }

    pub fn no_implicit_type(name: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ResolveErrorKind::NoImplicitType { name: name.into() },
            span,
        }
    }

    pub fn undefined_construct(name: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ResolveErrorKind::UndefinedConstructName { name: name.into() },
            span,
        }
    }

    pub fn undefined_label(label: u64, span: Span) -> Self {
        Self {
            kind: ResolveErrorKind::UndefinedLabel { label },
            span,
        }
    }

    pub fn duplicate_label(label: u64, span: Span, previous: Span) -> Self {
        Self {
            kind: ResolveErrorKind::DuplicateLabel { label, previous },
            span,
        }
    }

    pub fn unresolved_call(name: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ResolveErrorKind::UnresolvedCall { name: name.into() },
            span,
        }
    }

    /// Warnings do not make a program invalid.
    pub fn is_warning(&self) -> bool {
        matches!(self.kind, ResolveErrorKind::UnresolvedCall { .. })
    }
}

/// The kind of resolution problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveErrorKind {
    #[error("undefined name: {name}")]
    UndefinedName { name: String },

    #[error("duplicate declaration: {name} (previously declared at {}..{})", previous.start, previous.end)]
    DuplicateDeclaration { name: String, previous: Span },

    #[error("unknown module: {name}")]
    UnknownModule { name: String },

    #[error("`{name}` is not a public entity of module `{module}`")]
    NotExported { name: String, module: String },

    #[error("`{name}` has no implicit type")]
    NoImplicitType { name: String },

    #[error("undefined construct name: {name}")]
    UndefinedConstructName { name: String },

    #[error("undefined label: {label}")]
    UndefinedLabel { label: u64 },

    #[error("duplicate label: {label} (previously defined at {}..{})", previous.start, previous.end)]
    DuplicateLabel { label: u64, previous: Span },

    #[error("procedure `{name}` is not declared here; assuming an external procedure")]
    UnresolvedCall { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_subject() {
        let err = ResolveError::undefined("x", Span::new(3, 4));
        assert_eq!(err.to_string(), "undefined name: x");
        let err = ResolveError::duplicate("n", Span::new(10, 11), Span::new(2, 3));
        assert_eq!(err.to_string(), "duplicate declaration: n (previously declared at 2..3)");
        assert_eq!(ResolveError::undefined_label(10, Span::empty(0)).to_string(), "undefined label: 10");
    }

    #[test]
    fn only_unresolved_calls_are_warnings() {
        assert!(ResolveError::unresolved_call("solve", Span::empty(0)).is_warning());
        assert!(!ResolveError::unknown_module("m", Span::empty(0)).is_warning());
    }
}
