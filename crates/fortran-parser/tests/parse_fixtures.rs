// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Parses every source under `tests/fixtures` and checks that the tree is
//! lossless and error free.

use std::path::{Path, PathBuf};

use fortran_lexer::{tokenize, LexOptions};
use fortran_parser::parse;
use fortran_syntax::{NodeKind, SourceForm};

fn fixtures() -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
    let mut paths: Vec<_> = std::fs::read_dir(&dir)
        .expect("fixtures directory not found")
        .map(|entry| entry.unwrap().path())
        .filter(|path| SourceForm::from_path(path).is_some())
        .collect();
    paths.sort();
    paths
}

fn parse_fixture(path: &Path) -> (String, fortran_parser::ParseResult) {
    let src = std::fs::read_to_string(path).unwrap_or_else(|_| panic!("failed to read {}", path.display()));
    let form = SourceForm::from_path(path).unwrap();
    let result = parse(tokenize(&src, LexOptions::new(form)));
    (src, result)
}

#[test]
fn parse_all_fixtures() {
    let paths = fixtures();
    assert!(paths.len() >= 3, "expected fixtures in tests/fixtures");
    for path in paths {
        let (src, result) = parse_fixture(&path);
        assert!(result.is_ok(), "Parse errors in {}: {:?}", path.display(), result.errors);
        assert_eq!(result.tree.text(), src, "tree of {} is not lossless", path.display());
    }
}

#[test]
fn legacy_loops_close_on_labels() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/legacy.f");
    let (_, result) = parse_fixture(&path);
    let root = result.tree.root();
    assert_eq!(root.descendants_of_kind(NodeKind::DoConstruct).count(), 3);
    // The outer loop owns both inner loops.
    let outer = root.descendants_of_kind(NodeKind::DoConstruct).next().unwrap();
    assert_eq!(outer.descendants_of_kind(NodeKind::DoConstruct).count(), 3);
    assert_eq!(root.descendants_of_kind(NodeKind::IfStmt).count(), 1);
}

#[test]
fn node_lookup_by_offset() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/shapes.f90");
    let (src, result) = parse_fixture(&path);
    let offset = src.find("c%radius**2").unwrap();
    let node = result.tree.node_at_offset(offset).unwrap();
    assert_eq!(node.kind(), NodeKind::NameRef);
    assert_eq!(node.text(), "c");
    let token = result.tree.token_at_offset(offset + 2).unwrap();
    assert_eq!(token.text(), "radius");
    assert!(node.ancestors().any(|n| n.kind() == NodeKind::Function));
}
