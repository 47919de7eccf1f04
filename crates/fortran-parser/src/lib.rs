// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Parser for Fortran sources.
//!
//! Transforms a token stream into a lossless concrete syntax tree. Parsing
//! never gives up: malformed statements become `Error` nodes and the
//! problems are returned next to the tree.

mod classify;
mod decl;
mod error;
mod expr;
mod hints;
mod parser;
mod stmt;
mod units;

use fortran_syntax::{CancelCheck, Cancelled, NeverCancel, Token};

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use expr::infix_binding_power;
pub use parser::Parser;

/// Parse a token stream into a syntax tree.
pub fn parse(tokens: impl IntoIterator<Item = Token>) -> ParseResult {
    let mut parser = Parser::new(tokens, &NeverCancel);
    // NeverCancel never fires, so the run always completes.
    let _ = parser.run();
    parser.into_result()
}

/// Like [`parse`], checking `cancel` before every statement.
pub fn parse_with_cancel(
    tokens: impl IntoIterator<Item = Token>,
    cancel: &dyn CancelCheck,
) -> Result<ParseResult, Cancelled> {
    Parser::new(tokens, cancel).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fortran_lexer::{tokenize, LexOptions};
    use fortran_syntax::ast::{AssignmentStmt, BinaryExpr, ImplicitStmt, ProgramUnit, SourceFile, UnaryExpr, UseStmt};
    use fortran_syntax::{AstNode, BinaryOp, NamedElement, NodeKind, SourceForm, SyntaxNode, UnaryOp};
    use std::cell::Cell;

    fn parse(src: &str) -> ParseResult {
        let result = super::parse(tokenize(src, LexOptions::default()));
        assert_eq!(result.tree.text(), src, "tree does not cover the input");
        result
    }

    fn parse_ok(src: &str) -> ParseResult {
        let result = parse(src);
        assert!(result.is_ok(), "Parse errors: {:?}", result.errors);
        result
    }

    /// Statements wrapped into a main program.
    fn program(body: &str) -> String {
        format!("{}end\n", body)
    }

    fn first(result: &ParseResult, kind: NodeKind) -> SyntaxNode<'_> {
        result
            .tree
            .root()
            .descendants_of_kind(kind)
            .next()
            .unwrap_or_else(|| panic!("no {:?} node", kind))
    }

    fn count(result: &ParseResult, kind: NodeKind) -> usize {
        result.tree.root().descendants_of_kind(kind).count()
    }

    fn value_of(result: &ParseResult) -> SyntaxNode<'_> {
        let stmt = AssignmentStmt::cast(first(result, NodeKind::AssignmentStmt)).unwrap();
        stmt.value().unwrap()
    }

    #[test]
    fn parse_program_units() {
        let src = "\
module m
  implicit none
  integer, parameter :: n = 10
contains
  subroutine s(a, b)
    real, intent(in) :: a(n)
    real :: b
    b = a(1)
  end subroutine s
  integer function f(x) result(r)
    integer :: x
    r = x * 2
  end function f
end module m
x = 1
end
";
        let result = parse_ok(src);
        let file = SourceFile::cast(result.tree.root()).unwrap();
        let units: Vec<_> = file.units().map(|u| u.syntax().kind()).collect();
        assert_eq!(units, vec![NodeKind::Module, NodeKind::MainProgram]);

        let module = file.units().next().unwrap();
        let contained: Vec<_> = module.contained().map(|u| u.syntax().kind()).collect();
        assert_eq!(contained, vec![NodeKind::Subroutine, NodeKind::Function]);
        let name = NamedElement::cast(module.header().unwrap().syntax()).unwrap();
        assert_eq!(name.name(), Some("m"));
    }

    #[test]
    fn parse_fixed_form() {
        let src = "      PROGRAM MAIN\nC     comment\n      X = 1 +\n     &    2\n   10 CONTINUE\n      END\n";
        let result = super::parse(tokenize(src, LexOptions::new(SourceForm::Fixed)));
        assert!(result.is_ok(), "Parse errors: {:?}", result.errors);
        assert_eq!(result.tree.text(), src);
        assert_eq!(count(&result, NodeKind::Label), 1);
        assert_eq!(count(&result, NodeKind::AssignmentStmt), 1);
    }

    #[test]
    fn power_binds_tighter_than_sign() {
        let result = parse_ok(&program("x = -a**2\n"));
        let unary = UnaryExpr::cast(value_of(&result)).unwrap();
        assert_eq!(unary.op(), Some(UnaryOp::Minus));
        let power = BinaryExpr::cast(unary.operand().unwrap()).unwrap();
        assert_eq!(power.op(), Some(BinaryOp::Pow));
    }

    #[test]
    fn sign_binds_tighter_than_addition() {
        let result = parse_ok(&program("x = -a + b\n"));
        let add = BinaryExpr::cast(value_of(&result)).unwrap();
        assert_eq!(add.op(), Some(BinaryOp::Add));
        assert_eq!(add.lhs().unwrap().kind(), NodeKind::UnaryExpr);
    }

    #[test]
    fn power_is_right_associative() {
        let result = parse_ok(&program("x = a ** b ** c\n"));
        let outer = BinaryExpr::cast(value_of(&result)).unwrap();
        assert_eq!(outer.lhs().unwrap().kind(), NodeKind::NameRef);
        assert_eq!(outer.rhs().unwrap().kind(), NodeKind::BinaryExpr);
    }

    #[test]
    fn sign_after_operator_is_accepted() {
        let result = parse_ok(&program("x = a * -b\n"));
        let mul = BinaryExpr::cast(value_of(&result)).unwrap();
        assert_eq!(mul.op(), Some(BinaryOp::Mul));
        assert_eq!(mul.rhs().unwrap().kind(), NodeKind::UnaryExpr);
    }

    #[test]
    fn logical_operators_nest_by_precedence() {
        let result = parse_ok(&program("l = .not. a .and. b .or. c == d\n"));
        let or = BinaryExpr::cast(value_of(&result)).unwrap();
        assert_eq!(or.op(), Some(BinaryOp::Or));
        let and = BinaryExpr::cast(or.lhs().unwrap()).unwrap();
        assert_eq!(and.op(), Some(BinaryOp::And));
        assert_eq!(and.lhs().unwrap().kind(), NodeKind::UnaryExpr);
        let eq = BinaryExpr::cast(or.rhs().unwrap()).unwrap();
        assert_eq!(eq.op(), Some(BinaryOp::Eq));
    }

    #[test]
    fn chained_comparison_is_an_error() {
        let result = parse(&program("l = a < b < c\n"));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ParseErrorKind::ChainedComparison);
        assert_eq!(count(&result, NodeKind::Error), 1);
    }

    #[test]
    fn primary_expressions() {
        let result = parse_ok(&program(
            "z = (1.0, 2.0)\nv = (/ 1, 2, 3 /)\nw = [(i, i = 1, 3)]\nq = p%x(1:n:2) + f(kind=8)\n",
        ));
        assert_eq!(count(&result, NodeKind::ComplexLiteral), 1);
        assert_eq!(count(&result, NodeKind::ArrayConstructor), 2);
        assert_eq!(count(&result, NodeKind::ImpliedDo), 1);
        assert_eq!(count(&result, NodeKind::ComponentExpr), 1);
        assert_eq!(count(&result, NodeKind::SectionSubscript), 1);
        assert_eq!(count(&result, NodeKind::CallExpr), 2);
    }

    #[test]
    fn labelled_do_loops_share_terminal() {
        let src = "\
program p
  do 10 i = 1, 3
    do 10 j = 1, 3
      x = i + j
10 continue
  y = 1
end program p
";
        let result = parse_ok(src);
        assert_eq!(count(&result, NodeKind::DoConstruct), 2);
        let cont = first(&result, NodeKind::ContinueStmt);
        assert_eq!(cont.ancestors().filter(|n| n.kind() == NodeKind::DoConstruct).count(), 2);
        let y = result
            .tree
            .root()
            .descendants_of_kind(NodeKind::AssignmentStmt)
            .nth(1)
            .unwrap();
        assert_eq!(y.parent().unwrap().kind(), NodeKind::MainProgram);
    }

    #[test]
    fn constructs_nest() {
        let src = "\
outer: do i = 1, n
  if (i > 2) then
    exit outer
  else if (i == 1) then
    cycle
  else
    select case (i)
    case (1, 3:4)
      x = 1
    case default
      x = 2
    end select
  end if
end do outer
do while (x < 10)
  x = x + 1
end do
end
";
        let result = parse_ok(src);
        assert_eq!(count(&result, NodeKind::DoConstruct), 2);
        assert_eq!(count(&result, NodeKind::IfConstruct), 1);
        assert_eq!(count(&result, NodeKind::SelectCaseConstruct), 1);
        assert_eq!(count(&result, NodeKind::ConstructName), 1);
        assert_eq!(count(&result, NodeKind::ConstructNameRef), 2);
        assert_eq!(count(&result, NodeKind::WhileControl), 1);
    }

    #[test]
    fn missing_name_recovers() {
        let result = parse("program\n  x = 1\nend program\n");
        assert_eq!(result.errors.len(), 1);
        let header = first(&result, NodeKind::ProgramStmt);
        assert!(NamedElement::cast(header).unwrap().identifier().is_none());
        assert_eq!(count(&result, NodeKind::AssignmentStmt), 1);
        assert_eq!(count(&result, NodeKind::EndStmt), 1);
    }

    #[test]
    fn bad_statement_recovers_at_next_line() {
        let result = parse(&program("x = = 1\ny = 2\n"));
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.errors[0].kind, ParseErrorKind::Expected { .. }));
        assert_eq!(count(&result, NodeKind::Error), 1);
        assert_eq!(count(&result, NodeKind::AssignmentStmt), 2);
    }

    #[test]
    fn missing_end_is_reported() {
        let result = parse("subroutine s\n  x = 1\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ParseErrorKind::MissingEnd("end subroutine".into()));
        assert!(result.errors[0].hint.is_some());
    }

    #[test]
    fn missing_end_do_is_reported() {
        let result = parse("do i = 1, 2\n  x = i\nend\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ParseErrorKind::MissingEnd("end do".into()));
        assert_eq!(count(&result, NodeKind::EndStmt), 1);
    }

    #[test]
    fn mismatched_end_is_reported() {
        let result = parse("subroutine s\nend function s\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].kind,
            ParseErrorKind::MismatchedEnd { expected: "end subroutine".into(), found: "end function".into() }
        );

        let result = parse("subroutine s\nend subroutine t\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].kind,
            ParseErrorKind::MismatchedEnd { expected: "s".into(), found: "t".into() }
        );
    }

    #[test]
    fn misplaced_end_if() {
        let result = parse("x = 1\nend if\nend\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ParseErrorKind::Misplaced("end if".into()));
    }

    #[test]
    fn unknown_characters_are_reported() {
        let result = parse(&program("x = 1 @ 2\n"));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ParseErrorKind::UnknownCharacter("@".into()));

        let result = parse(&program("print *, 'abc\n"));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ParseErrorKind::UnterminatedString);
    }

    #[test]
    fn unsupported_constructs_are_not_guessed() {
        let result = parse(&program("x = 3habc\n"));
        assert_eq!(result.errors[0].kind, ParseErrorKind::Unsupported("Hollerith constant".into()));

        let result = parse(&program("DO10I=1,10\n"));
        assert_eq!(
            result.errors[0].kind,
            ParseErrorKind::Unsupported("DO statement without blanks".into())
        );

        let result = parse(&program("equivalence (a, b)\n"));
        assert_eq!(result.errors[0].kind, ParseErrorKind::Unsupported("equivalence statement".into()));
    }

    #[test]
    fn every_bad_statement_is_reported() {
        let src = program(&"x = = 1\n".repeat(40));
        let result = parse(&src);
        assert_eq!(result.errors.len(), 40);
        assert_eq!(count(&result, NodeKind::Error), 40);
        let lines: Vec<usize> = result.errors.iter().map(|e| src[..e.span.start].matches('\n').count()).collect();
        assert_eq!(lines, (0..40).collect::<Vec<_>>());
    }

    fn nesting_errors(result: &ParseResult) -> usize {
        result.errors.iter().filter(|e| matches!(e.kind, ParseErrorKind::NestingTooDeep(_))).count()
    }

    #[test]
    fn deeply_nested_parentheses_are_rejected() {
        let depth = 10_000;
        let src = program(&format!("x = {}1{}\ny = 2\n", "(".repeat(depth), ")".repeat(depth)));
        let result = parse(&src);
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        assert_eq!(result.errors[0].kind, ParseErrorKind::NestingTooDeep(128));
        assert!(result.errors[0].hint.is_some());
        assert_eq!(count(&result, NodeKind::Error), 1);
        assert_eq!(count(&result, NodeKind::AssignmentStmt), 2);
    }

    #[test]
    fn moderately_nested_parentheses_parse() {
        let src = program(&format!("x = {}1{}\n", "(".repeat(100), ")".repeat(100)));
        let result = parse_ok(&src);
        assert_eq!(count(&result, NodeKind::ParenExpr), 100);
    }

    #[test]
    fn deeply_nested_constructs_are_rejected() {
        let depth = 5_000;
        let src = program(&format!(
            "logical :: c\n{}y = 1\n{}z = 2\n",
            "if (c) then\n".repeat(depth),
            "end if\n".repeat(depth)
        ));
        let result = parse(&src);
        assert_eq!(result.errors.len(), 1, "{:?}", &result.errors[..result.errors.len().min(5)]);
        assert_eq!(nesting_errors(&result), 1);
        assert_eq!(count(&result, NodeKind::Error), 1);
        // The outer constructs close normally and parsing carries on.
        let z = result.tree.root().descendants_of_kind(NodeKind::AssignmentStmt).last().unwrap();
        assert_eq!(z.text().trim(), "z = 2");
        assert!(count(&result, NodeKind::IfConstruct) > 1);
    }

    #[test]
    fn deeply_nested_do_loops_are_rejected() {
        let depth = 3_000;
        let src = program(&format!("{}x = 1\n{}", "do\n".repeat(depth), "end do\n".repeat(depth)));
        let result = parse(&src);
        assert_eq!(result.errors.len(), 1, "{:?}", &result.errors[..result.errors.len().min(5)]);
        assert_eq!(nesting_errors(&result), 1);
    }

    #[test]
    fn long_operator_chain_is_rejected() {
        let src = program(&format!("x = 1{}\ny = 2\n", " + 1".repeat(2_000)));
        let result = parse(&src);
        assert_eq!(result.errors.len(), 1, "{:?}", result.errors);
        assert_eq!(result.errors[0].kind, ParseErrorKind::NestingTooDeep(256));
        assert_eq!(count(&result, NodeKind::AssignmentStmt), 2);

        let result = parse_ok(&program(&format!("x = 1{}\n", " + 1".repeat(200))));
        assert_eq!(count(&result, NodeKind::BinaryExpr), 200);
    }

    #[test]
    fn long_component_chain_is_rejected() {
        let src = program(&format!("x = a{}\n", "%b".repeat(1_000)));
        let result = parse(&src);
        assert_eq!(nesting_errors(&result), 1);
    }

    #[test]
    fn implicit_kind_selector_and_letters() {
        let result = parse_ok(&program("implicit real(8) (a-h), integer (i-n)\n"));
        let stmt = ImplicitStmt::cast(first(&result, NodeKind::ImplicitStmt)).unwrap();
        let specs: Vec<_> = stmt.specs().collect();
        assert_eq!(specs.len(), 2);
        assert!(specs[0].type_spec().unwrap().kind_selector().is_some());
        assert_eq!(specs[0].letters(), vec![('a', 'h')]);
        assert!(specs[1].type_spec().unwrap().kind_selector().is_none());
        assert_eq!(specs[1].letters(), vec![('i', 'n')]);

        let result = parse_ok(&program("implicit none\n"));
        let stmt = ImplicitStmt::cast(first(&result, NodeKind::ImplicitStmt)).unwrap();
        assert!(stmt.is_none());
    }

    #[test]
    fn use_with_only_and_renames() {
        let result = parse_ok(&program("use m, only: a, b => c\nuse n, x => y\nuse, intrinsic :: iso_c_binding\n"));
        let uses: Vec<_> = result
            .tree
            .root()
            .descendants()
            .filter_map(UseStmt::cast)
            .collect();
        assert_eq!(uses.len(), 3);
        assert_eq!(uses[0].module_name().unwrap().text(), "m");
        assert!(uses[0].only_list().is_some());
        assert_eq!(uses[1].renames().count(), 1);
        assert!(uses[2].is_intrinsic());
    }

    #[test]
    fn declarations_and_storage() {
        let src = "\
integer :: i, j(10) = 0
character(len=*), intent(in) :: s
character*8 name
double precision, dimension(3, 0:2) :: m
type(point) :: p
parameter (n = 3, pi = 3.14)
dimension k(n)
common /blk/ a, b, // c
data a, b /1.0, 2.0/, c /3*0.0/
save /blk/, i
external f
end
";
        let result = parse_ok(src);
        assert_eq!(count(&result, NodeKind::TypeDeclStmt), 5);
        assert_eq!(count(&result, NodeKind::NamedConstantDef), 2);
        assert_eq!(count(&result, NodeKind::CommonBlock), 2);
        assert_eq!(count(&result, NodeKind::DataSet), 2);
        assert_eq!(count(&result, NodeKind::CommonBlockRef), 1);
        assert_eq!(count(&result, NodeKind::ExternalStmt), 1);
    }

    #[test]
    fn derived_types_and_interfaces() {
        let src = "\
module shapes
  type, extends(base) :: circle
    real :: r
  end type circle
  interface area
    module procedure circle_area
  end interface
  interface
    subroutine ext(x)
      real :: x
    end subroutine
  end interface
end module
";
        let result = parse_ok(src);
        assert_eq!(count(&result, NodeKind::DerivedTypeDef), 1);
        assert_eq!(count(&result, NodeKind::InterfaceBlock), 2);
        assert_eq!(count(&result, NodeKind::Subroutine), 1);
    }

    #[test]
    fn io_statements() {
        let src = "\
write(*, '(a)') 'hi'
read(5, 100, err=200) x, (y(i), i = 1, 3)
print 100, x
100 format(a, i5)
200 open(unit=10, file='out.txt')
rewind 10
allocate(a(n), stat=ierr)
end
";
        let result = parse_ok(src);
        assert_eq!(count(&result, NodeKind::IoControlList), 3);
        assert_eq!(count(&result, NodeKind::FormatStmt), 1);
        assert_eq!(count(&result, NodeKind::IoStmt), 2);
        assert_eq!(count(&result, NodeKind::AllocateStmt), 1);
        // `100` and `200` in read, `100` in print.
        assert_eq!(count(&result, NodeKind::LabelRef), 3);
    }

    #[test]
    fn logical_and_arithmetic_if() {
        let result = parse_ok(&program("if (x > 0) y = 1\nif (x) 10, 20, 30\n"));
        let if_stmt = first(&result, NodeKind::IfStmt);
        assert_eq!(if_stmt.child_nodes().filter(|n| n.kind() == NodeKind::AssignmentStmt).count(), 1);
        assert_eq!(count(&result, NodeKind::ArithmeticIfStmt), 1);

        let result = parse(&program("if (x > 0) integer y\n"));
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn empty_source() {
        let result = parse_ok("");
        assert_eq!(result.tree.root().kind(), NodeKind::Root);
        assert_eq!(SourceFile::cast(result.tree.root()).unwrap().units().count(), 0);

        let result = parse_ok("! only a comment\n\n");
        assert_eq!(result.tree.root().child_nodes().filter_map(ProgramUnit::cast).count(), 0);
    }

    #[test]
    fn cancellation_at_every_boundary() {
        let src = "program p\n  x = 1\n  if (x > 0) then\n    y = 2\n  end if\nend program p\n";
        let calls = Cell::new(0);
        let counting = || {
            calls.set(calls.get() + 1);
            false
        };
        let full = parse_with_cancel(tokenize(src, LexOptions::default()), &counting);
        assert!(full.is_ok());
        let boundaries = calls.get();
        assert!(boundaries >= 6);

        for n in 1..=boundaries {
            let calls = Cell::new(0);
            let check = || {
                calls.set(calls.get() + 1);
                calls.get() >= n
            };
            let result = parse_with_cancel(tokenize(src, LexOptions::default()), &check);
            assert_eq!(result.err(), Some(Cancelled), "boundary {}", n);
        }
    }

    #[test]
    fn parsing_is_deterministic() {
        let src = "subroutine s(a)\n  real :: a(:)\n  a = a * 2 + 1\nend subroutine\n";
        let one = parse_ok(src);
        let two = parse_ok(src);
        let opts = fortran_syntax::SexprOptions { trivia: true, spans: true };
        assert_eq!(fortran_syntax::to_sexpr(&one.tree, opts), fortran_syntax::to_sexpr(&two.tree, opts));
    }
}
