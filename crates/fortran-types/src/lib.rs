// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type inference and type checking for Fortran sources.
//!
//! Infers a type for every expression of a resolved file and reports
//! assignments and expressions whose types do not fit as warnings.

mod checker;
mod error;
mod types;

pub use checker::{TypeChecker, TypedProgram};
pub use error::TypeError;
pub use types::Ty;

use fortran_resolve::ResolvedProgram;
use fortran_syntax::{CancelCheck, Cancelled, NeverCancel, SyntaxTree};

/// Type check a resolved file.
pub fn typecheck(tree: &SyntaxTree, resolved: &ResolvedProgram) -> TypedProgram {
    let mut checker = TypeChecker::new(resolved, &NeverCancel);
    // NeverCancel never fires, so the run always completes.
    let _ = checker.run(tree);
    checker.into_program()
}

/// Like [`typecheck`], checking `cancel` before every statement.
pub fn typecheck_with_cancel(
    tree: &SyntaxTree,
    resolved: &ResolvedProgram,
    cancel: &dyn CancelCheck,
) -> Result<TypedProgram, Cancelled> {
    TypeChecker::new(resolved, cancel).check(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fortran_lexer::{tokenize, LexOptions};
    use fortran_syntax::NodeKind;

    fn check(src: &str) -> (SyntaxTree, TypedProgram) {
        let result = fortran_parser::parse(tokenize(src, LexOptions::default()));
        assert!(result.is_ok(), "Parse errors: {:?}", result.errors);
        let resolved = fortran_resolve::resolve(&result.tree);
        let typed = typecheck(&result.tree, &resolved);
        (result.tree, typed)
    }

    fn messages(src: &str) -> Vec<String> {
        check(src).1.errors.iter().map(|e| e.to_string()).collect()
    }

    /// Type of the value assigned by the first assignment statement.
    fn value_type(src: &str) -> Ty {
        let (tree, typed) = check(src);
        let stmt = tree.root().descendants_of_kind(NodeKind::AssignmentStmt).next().unwrap();
        let value = stmt.child_nodes().filter(|n| n.kind().is_expression()).nth(1).unwrap();
        typed.type_of(value.id()).cloned().unwrap()
    }

    #[test]
    fn character_initializer_for_integer() {
        assert_eq!(
            messages("program p\n  integer :: a = \"a\"\nend program\n"),
            ["Assigning character value to a variable of integer type"]
        );
    }

    #[test]
    fn integer_initializer_for_complex() {
        assert_eq!(
            messages("program p\n  complex :: a = 1\nend program\n"),
            ["Assigning integer value to a variable of complex type"]
        );
    }

    #[test]
    fn logical_expression_for_real() {
        assert_eq!(
            messages("program p\n  real :: a = .true. .AND. (.false. .OR. .true.)\nend program\n"),
            ["Assigning logical value to a variable of real type"]
        );
    }

    #[test]
    fn complex_sum_for_character() {
        assert_eq!(
            messages("program p\n  character(len=17) :: a = (0.3, 2) + (1, 0)\nend program\n"),
            ["Assigning complex value to a variable of character type"]
        );
    }

    #[test]
    fn malformed_addition() {
        let src = "program p\n  real(kind=8) :: a = (2 + 9.0) + .true.\nend program\n";
        let (_, typed) = check(src);
        assert_eq!(typed.errors.len(), 1);
        assert_eq!(
            typed.errors[0].to_string(),
            "Can't infer type of this addition expression where arguments are: real, logical"
        );
        let span = typed.errors[0].span();
        assert_eq!(&src[span.start..span.end], "(2 + 9.0) + .true.");
    }

    #[test]
    fn assignment_of_complex_to_character() {
        let src = "program p\n  character(len=6) :: a\n  a = (1, 2)\nend program p\n";
        let (_, typed) = check(src);
        assert_eq!(typed.errors.len(), 1);
        assert_eq!(typed.errors[0].to_string(), "Assigning complex value to a variable of character type");
        let span = typed.errors[0].span();
        assert_eq!(&src[span.start..span.end], "a = (1, 2)");
    }

    #[test]
    fn assignment_to_array_element() {
        assert_eq!(
            messages("program p\n  integer, dimension(6) :: a\n  a(3) = \"string\"\nend program p\n"),
            ["Assigning character value to a variable of integer type"]
        );
    }

    #[test]
    fn valid_programs_have_no_warnings() {
        let src = "program p
  implicit none
  integer :: i, n
  real :: x, v(3)
  real, dimension(3) :: w = (/ 1.0, 2.0, 3.0 /)
  logical :: ok
  character(len=10) :: s
  n = 3
  x = n
  x = x ** 2 + 2 * n
  v = 0
  v = w * 2.0 + v
  ok = x > 1.0 .and. n /= 2
  s = 'ab' // 'cd'
  do i = 1, n
    v(i) = sqrt(w(i)) + abs(x)
  end do
  n = size(v) + len_trim(s)
end program p
";
        assert!(messages(src).is_empty(), "{:?}", messages(src));
    }

    #[test]
    fn promotion() {
        assert_eq!(value_type("program p\n  x = 1 + 2.0\nend\n"), Ty::Real);
        assert_eq!(value_type("program p\n  n = 2 * 3\nend\n"), Ty::Integer);
        assert_eq!(value_type("program p\n  x = 2 ** 3\nend\n"), Ty::Integer);
        assert_eq!(value_type("program p\n  x = 2.0 ** 0.5\nend\n"), Ty::Real);
        assert_eq!(value_type("program p\n  x = -(1.5)\nend\n"), Ty::Real);
        assert_eq!(value_type("program p\n  l = 1 < 2\nend\n"), Ty::Logical);
    }

    #[test]
    fn array_types() {
        let src = "program p\n  integer :: a(4)\n  real :: r(4)\n  r = a + 1\nend\n";
        assert_eq!(value_type(src), Ty::array(Ty::Integer, Some(4)));
        let src = "program p\n  integer :: a(2, 3)\n  integer :: t(6)\n  t = a\nend\n";
        assert_eq!(value_type(src), Ty::array(Ty::Integer, Some(6)));
    }

    #[test]
    fn array_sizes_must_match() {
        let src = "program p\n  integer :: a(3), b(4)\n  a = a + b\nend\n";
        assert_eq!(
            messages(src),
            ["Can't infer type of this addition expression where arguments are: integer array(3), integer array(4)"]
        );
    }

    #[test]
    fn array_constructors() {
        assert_eq!(
            messages("program p\n  integer :: a(3) = (/ 1, 'x', 3 /)\nend\n"),
            ["Array constructor element of character type does not fit an array of integer elements"]
        );
        assert_eq!(
            messages("program p\n  real :: a(2) = (/ 1.0, 2.0, 3.0 /)\nend\n"),
            ["Assigning real array(3) value to a variable of real array(2) type"]
        );
        assert!(messages("program p\n  real :: a(5) = (/ (i, i = 1, 5) /)\nend\n").is_empty());
        assert_eq!(
            messages("program p\n  integer :: a(3) = (/ (i, i = 1.0, 3) /)\nend\n"),
            ["Implied do loop bound must be integer, found real"]
        );
    }

    #[test]
    fn operator_errors() {
        assert_eq!(
            messages("program p\n  logical :: l\n  l = .not. 1\nend\n"),
            ["Can't infer type of this logical negation expression where the argument is: integer"]
        );
        assert_eq!(
            messages("program p\n  character(len=4) :: s\n  s = 'a' // 1\nend\n"),
            ["Can't infer type of this concatenation expression where arguments are: character, integer"]
        );
        assert_eq!(
            messages("program p\n  logical :: l\n  l = .true. .and. 1\nend\n"),
            ["Can't infer type of this logical expression where arguments are: logical, integer"]
        );
        assert_eq!(
            messages("program p\n  logical :: l\n  l = 'a' < 1\nend\n"),
            ["Can't infer type of this binary relation expression where arguments are: character, integer"]
        );
    }

    #[test]
    fn cancellation_before_every_statement() {
        use std::cell::Cell;

        let src = "program p\n  integer :: a = 'a'\n  real :: x\n  x = 1.0\n  a = x .and. 1\nend program p\n";
        let tree = fortran_parser::parse(tokenize(src, LexOptions::default())).tree;
        let resolved = fortran_resolve::resolve(&tree);

        let polls = Cell::new(0);
        let counting = || {
            polls.set(polls.get() + 1);
            false
        };
        let typed = typecheck_with_cancel(&tree, &resolved, &counting).unwrap();
        assert_eq!(typed.errors.len(), typecheck(&tree, &resolved).errors.len());
        let boundaries = polls.get();
        assert!(boundaries >= 5, "{}", boundaries);

        for limit in 0..boundaries {
            let polls = Cell::new(0);
            let cancel = || {
                polls.set(polls.get() + 1);
                polls.get() > limit
            };
            assert_eq!(typecheck_with_cancel(&tree, &resolved, &cancel).err(), Some(Cancelled), "limit {}", limit);
        }
    }

    #[test]
    fn unknown_types_do_not_cascade() {
        // `q` comes from a module outside the file.
        let src = "program p\n  use outside\n  integer :: n\n  n = q + 1\n  n = n + .true. + q\nend\n";
        let (_, typed) = check(src);
        assert_eq!(typed.errors.len(), 1, "{:?}", typed.errors);
    }

    #[test]
    fn derived_type_components() {
        let src = "module m
  type point
    real :: x, y
  end type point
contains
  subroutine s(p, n)
    type(point) :: p
    integer :: n
    n = p%x
    p%y = 'text'
  end subroutine s
end module m
";
        assert_eq!(
            messages(src),
            [
                "Assigning real value to a variable of integer type",
                "Assigning character value to a variable of real type",
            ]
        );
    }

    #[test]
    fn function_results() {
        let src = "program p
  integer :: k
  logical :: flag
  k = twice(2)
  flag = twice(3)
contains
  integer function twice(i)
    integer :: i
    twice = 2 * i
  end function twice
end program p
";
        assert_eq!(messages(src), ["Assigning integer value to a variable of logical type"]);
    }
}
