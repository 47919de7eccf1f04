// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Conversions from stage error types to `Diagnostic`.

use crate::{Diagnostic, ToDiagnostic};

// ============================================================================
// Parse Errors
// ============================================================================

impl ToDiagnostic for fortran_parser::ParseError {
    fn to_diagnostic(&self) -> Diagnostic {
        use fortran_parser::ParseErrorKind::*;

        let (code, label) = match &self.kind {
            UnknownCharacter(_) => ("E0001", "unexpected character"),
            UnterminatedString => ("E0002", "literal starts here"),
            Expected { .. } => ("E0100", "here"),
            MissingEnd(_) => ("E0101", "construct is not closed"),
            MismatchedEnd { .. } => ("E0102", "wrong name"),
            Misplaced(_) => ("E0103", "not inside a matching construct"),
            ChainedComparison => ("E0104", "second comparison"),
            Unsupported(_) => ("E0105", "not supported"),
            UnknownStatement => ("E0106", "not a statement"),
            NestingTooDeep(_) => ("E0107", "nested too deeply"),
        };
        let mut diag = Diagnostic::error(self.to_string())
            .with_code(code)
            .with_primary(self.span, label);

        if let Some(ref hint) = self.hint {
            diag = diag.with_help(hint.as_str());
        }
        if let ChainedComparison = self.kind {
            diag = diag.with_note("combine comparisons with `.and.`");
        }

        diag
    }
}

// ============================================================================
// Resolve Errors
// ============================================================================

impl ToDiagnostic for fortran_resolve::ResolveError {
    fn to_diagnostic(&self) -> Diagnostic {
        use fortran_resolve::ResolveErrorKind::*;

        match &self.kind {
            UndefinedName { name } => Diagnostic::error(format!("undefined name: `{}`", name))
                .with_code("E0200")
                .with_primary(self.span, "not found in this scope"),

            DuplicateDeclaration { name, previous } => {
                Diagnostic::error(format!("duplicate declaration: `{}`", name))
                    .with_code("E0201")
                    .with_primary(self.span, "declared again here")
                    .with_secondary(*previous, "previously declared here")
            }

            UnknownModule { name } => Diagnostic::error(format!("unknown module: `{}`", name))
                .with_code("E0202")
                .with_primary(self.span, "module not found in this file")
                .with_note("only modules defined in the same file are resolved"),

            NotExported { name, module } => {
                Diagnostic::error(format!("`{}` is not a public entity of module `{}`", name, module))
                    .with_code("E0203")
                    .with_primary(self.span, "not visible through this use statement")
            }

            NoImplicitType { name } => Diagnostic::error(format!("`{}` has no implicit type", name))
                .with_code("E0204")
                .with_primary(self.span, "used here")
                .with_help(format!("declare the type of `{}`", name)),

            UndefinedConstructName { name } => {
                Diagnostic::error(format!("undefined construct name: `{}`", name))
                    .with_code("E0205")
                    .with_primary(self.span, "no enclosing construct has this name")
            }

            UndefinedLabel { label } => Diagnostic::error(format!("undefined label: {}", label))
                .with_code("E0206")
                .with_primary(self.span, "no statement has this label"),

            DuplicateLabel { label, previous } => Diagnostic::error(format!("duplicate label: {}", label))
                .with_code("E0207")
                .with_primary(self.span, "label used again here")
                .with_secondary(*previous, "first used here"),

            UnresolvedCall { name } => {
                Diagnostic::warning(format!("procedure `{}` is not declared in this file", name))
                    .with_code("W0208")
                    .with_primary(self.span, "assumed to be an external procedure")
            }
        }
    }
}

// ============================================================================
// Type Warnings
// ============================================================================

impl ToDiagnostic for fortran_types::TypeError {
    fn to_diagnostic(&self) -> Diagnostic {
        use fortran_types::TypeError::*;

        let diag = Diagnostic::warning(self.to_string());
        match self {
            Mismatch { expected, found, span } => diag
                .with_code("W0301")
                .with_primary(*span, format!("expected {}, found {}", expected, found)),
            MalformedBinary { span, .. } => diag.with_code("W0302").with_primary(*span, "operands do not fit"),
            MalformedUnary { span, .. } => diag.with_code("W0303").with_primary(*span, "operand does not fit"),
            ArrayConstructorElement { element, span, .. } => diag
                .with_code("W0304")
                .with_primary(*span, format!("this element is {}", element)),
            ImpliedDoBound { span, .. } => diag.with_code("W0305").with_primary(*span, "not an integer"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LabelStyle, Severity};
    use fortran_lexer::{tokenize, LexOptions};
    use fortran_resolve::ResolveError;
    use fortran_syntax::Span;
    use fortran_types::{Ty, TypeError};

    #[test]
    fn lexical_errors_use_lexer_codes() {
        let result = fortran_parser::parse(tokenize("program p\n  x = 1 @ 2\nend\n", LexOptions::default()));
        let diag = result.errors[0].to_diagnostic();
        assert_eq!(diag.code.unwrap().0, "E0001");
        assert_eq!(diag.severity, Severity::Error);

        let result = fortran_parser::parse(tokenize("program p\n  print *, 'abc\nend\n", LexOptions::default()));
        let diag = result.errors[0].to_diagnostic();
        assert_eq!(diag.code.unwrap().0, "E0002");
        assert_eq!(diag.help.unwrap().message, "add a closing '");
    }

    #[test]
    fn deep_nesting_has_its_own_code() {
        let src = format!("x = {}1{}\nend\n", "(".repeat(400), ")".repeat(400));
        let result = fortran_parser::parse(tokenize(&src, LexOptions::default()));
        let diag = result.errors[0].to_diagnostic();
        assert_eq!(diag.code.unwrap().0, "E0107");
        assert!(diag.message.starts_with("nesting too deep"), "{}", diag.message);
        assert!(diag.help.is_some());
    }

    #[test]
    fn duplicates_point_at_both_declarations() {
        let err = ResolveError::duplicate("n", Span::new(20, 21), Span::new(12, 13));
        let diag = err.to_diagnostic();
        assert_eq!(diag.message, "duplicate declaration: `n`");
        assert_eq!(diag.labels.len(), 2);
        assert_eq!(diag.labels[0].style, LabelStyle::Primary);
        assert_eq!(diag.labels[1].span, Span::new(12, 13));
    }

    #[test]
    fn unresolved_calls_are_warnings() {
        let diag = ResolveError::unresolved_call("solve", Span::new(5, 10)).to_diagnostic();
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.code.unwrap().0, "W0208");
    }

    #[test]
    fn type_warnings_keep_their_message() {
        let err = TypeError::Mismatch {
            expected: Ty::Integer,
            found: Ty::Character,
            span: Span::new(14, 25),
        };
        let diag = err.to_diagnostic();
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.message, "Assigning character value to a variable of integer type");
        assert_eq!(diag.primary_span(), Some(Span::new(14, 25)));
    }
}
