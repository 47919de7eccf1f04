// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! End-to-end tests of the analysis facade.

use std::cell::Cell;

use fortran_analysis::{analyze, analyze_with_cancel, AnalysisOptions};
use fortran_diagnostics::Severity;
use fortran_resolve::SymbolKind;
use fortran_syntax::{NodeKind, SourceForm};

const SOLVER: &str = "\
module constants
  implicit none
  real, parameter :: pi = 3.14159
end module constants

program solver
  use constants
  implicit none
  integer :: count
  real :: total
  total = 0.0
  do count = 1, 10
    total = total + pi * count
  end do
  print *, totl
contains
  subroutine report(n)
    integer :: n
    integer :: total
    total = n
  end subroutine report
end program solver
";

fn offset_of(src: &str, needle: &str, nth: usize) -> usize {
    src.match_indices(needle).nth(nth).map(|(i, _)| i).unwrap()
}

#[test]
fn diagnostics_are_ordered_and_helpful() {
    let analysis = analyze(SOLVER, &AnalysisOptions::default()).unwrap();
    assert!(analysis.parse_errors().is_empty());
    let diagnostics = analysis.diagnostics();
    assert_eq!(diagnostics.len(), 1, "{:?}", diagnostics);
    let undefined = &diagnostics[0];
    assert_eq!(undefined.severity, Severity::Error);
    assert_eq!(undefined.message, "undefined name: `totl`");
    let help = undefined.help.as_ref().unwrap();
    assert_eq!(help.message, "did you mean `total`?");
    assert_eq!(help.suggestion.as_ref().unwrap().replacement, "total");
    assert!(analysis.has_errors());
}

#[test]
fn name_lookup_from_an_offset() {
    let analysis = analyze(SOLVER, &AnalysisOptions::default()).unwrap();

    // Inside the program, `total` is the program's real variable.
    let in_program = offset_of(SOLVER, "total = 0.0", 0);
    let entries = analysis.entries("TOTAL", in_program);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, SymbolKind::Variable);

    // Inside the subroutine, the local declaration shadows it.
    let in_report = offset_of(SOLVER, "total = n", 0);
    let local = analysis.entries("total", in_report)[0];
    assert_ne!(local.id, entries[0].id);

    // Use association makes the module constant visible.
    let pi = analysis.entries("pi", in_program);
    assert_eq!(pi.len(), 1);
    assert_eq!(pi[0].kind, SymbolKind::NamedConstant);
}

#[test]
fn declaration_and_references() {
    let analysis = analyze(SOLVER, &AnalysisOptions::default()).unwrap();

    let use_of_pi = offset_of(SOLVER, "pi * count", 0);
    let pi = analysis.declaration_at(use_of_pi).unwrap();
    assert_eq!(pi.name.as_str(), "pi");
    assert_eq!(&SOLVER[pi.span.start..pi.span.end], "pi");

    // From the declaration itself.
    let decl = offset_of(SOLVER, "pi = 3.14159", 0);
    assert_eq!(analysis.declaration_at(decl).map(|s| s.id), Some(pi.id));

    let count_refs = analysis.references_at(offset_of(SOLVER, "count = 1", 0));
    assert_eq!(count_refs.len(), 2);
    assert!(count_refs.iter().all(|n| n.kind() == NodeKind::NameRef));

    // A literal names nothing.
    assert!(analysis.declaration_at(offset_of(SOLVER, "0.0", 0)).is_none());
}

#[test]
fn enclosing_node_and_types() {
    let analysis = analyze(SOLVER, &AnalysisOptions::default()).unwrap();
    let at = offset_of(SOLVER, "pi * count", 0) + 3;
    let node = analysis.node_at(at).unwrap();
    assert_eq!(node.kind(), NodeKind::BinaryExpr);
    assert_eq!(analysis.type_of(node).map(|t| t.to_string()), Some("real".to_string()));
    assert!(node.ancestors().any(|n| n.kind() == NodeKind::DoConstruct));
}

#[test]
fn folding() {
    let analysis = analyze(SOLVER, &AnalysisOptions::default()).unwrap();
    let kinds: Vec<NodeKind> = analysis
        .folding_ranges()
        .iter()
        .filter_map(|r| analysis.tree().node(r.node))
        .map(|n| n.kind())
        .collect();
    assert_eq!(
        kinds,
        [NodeKind::Module, NodeKind::MainProgram, NodeKind::DoConstruct, NodeKind::Subroutine]
    );
}

#[test]
fn type_warnings_can_be_switched_off() {
    let src = "program p\n  integer :: a = 'a'\nend program p\n";
    let checked = analyze(src, &AnalysisOptions::default()).unwrap();
    assert_eq!(checked.diagnostics().len(), 1);
    assert_eq!(checked.diagnostics()[0].severity, Severity::Warning);
    assert!(!checked.has_errors());

    let options = AnalysisOptions {
        check_types: false,
        ..AnalysisOptions::default()
    };
    let unchecked = analyze(src, &options).unwrap();
    assert!(unchecked.diagnostics().is_empty());
    assert!(unchecked.typed().is_none());
}

#[test]
fn fixed_form() {
    let src = "      PROGRAM P\n      INTEGER N\n      N = 1\n      END\n";
    let analysis = analyze(src, &AnalysisOptions::new(SourceForm::Fixed)).unwrap();
    assert!(analysis.diagnostics().is_empty(), "{:?}", analysis.diagnostics());
    let n = analysis.declaration_at(offset_of(src, "N = 1", 0)).unwrap();
    assert_eq!(n.kind, SymbolKind::Variable);
}

#[test]
fn cancellation() {
    let polls = Cell::new(0);
    let counting = || {
        polls.set(polls.get() + 1);
        false
    };
    analyze_with_cancel(SOLVER, &AnalysisOptions::default(), &counting).unwrap();
    let boundaries = polls.get();
    assert!(boundaries > 0);

    for limit in 0..boundaries {
        let polls = Cell::new(0);
        let cancel = || {
            polls.set(polls.get() + 1);
            polls.get() > limit
        };
        assert!(analyze_with_cancel(SOLVER, &AnalysisOptions::default(), &cancel).is_err());
    }
}

#[test]
fn type_checking_polls_for_cancellation() {
    let polls = |options: &AnalysisOptions| {
        let count = Cell::new(0);
        let counting = || {
            count.set(count.get() + 1);
            false
        };
        analyze_with_cancel(SOLVER, options, &counting).unwrap();
        count.get()
    };
    let without_types = AnalysisOptions { check_types: false, ..AnalysisOptions::default() };
    assert!(polls(&AnalysisOptions::default()) > polls(&without_types) + 1);
}

#[test]
fn deep_nesting_is_a_diagnostic() {
    let src = format!(
        "program p\n  real :: x\n  x = {}1.0{}\n  x = {}\nend program p\n",
        "(".repeat(10_000),
        ")".repeat(10_000),
        vec!["x"; 3_000].join(" + ")
    );
    let analysis = analyze(&src, &AnalysisOptions::default()).unwrap();
    let codes: Vec<_> = analysis
        .diagnostics()
        .iter()
        .map(|d| d.code.as_ref().map(|c| c.0.to_string()))
        .collect();
    assert_eq!(codes, [Some("E0107".to_string()), Some("E0107".to_string())]);
}

#[test]
fn files_analyse_on_separate_threads() {
    fn shareable<T: Send + Sync>() {}
    shareable::<fortran_analysis::Analysis>();

    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| analyze(SOLVER, &AnalysisOptions::default()).unwrap().diagnostics().len()))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 1);
    }
}
