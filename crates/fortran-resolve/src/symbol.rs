// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Symbol table for name resolution.

use compact_str::CompactString;
use fortran_syntax::{NodeId, Span};

use crate::scope::ScopeId;

/// Unique identifier for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// The kind of symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Program,
    Module,
    Subroutine,
    Function,
    BlockData,
    /// The result variable of a function.
    FunctionResult,
    DummyArgument,
    Variable,
    NamedConstant,
    DerivedType,
    /// A component of a derived type.
    Component,
    CommonBlock,
    /// A procedure named by `external`, an interface body or an
    /// undeclared call target.
    ExternalProcedure,
    Intrinsic,
    /// A named generic interface.
    Interface,
    ConstructName,
}

impl SymbolKind {
    /// Kinds that hold a value and take a type.
    pub fn is_data(self) -> bool {
        matches!(
            self,
            SymbolKind::FunctionResult
                | SymbolKind::DummyArgument
                | SymbolKind::Variable
                | SymbolKind::NamedConstant
                | SymbolKind::Component
        )
    }

    pub fn is_procedure(self) -> bool {
        matches!(
            self,
            SymbolKind::Subroutine
                | SymbolKind::Function
                | SymbolKind::ExternalProcedure
                | SymbolKind::Intrinsic
                | SymbolKind::Interface
        )
    }

    pub fn describe(self) -> &'static str {
        match self {
            SymbolKind::Program => "program",
            SymbolKind::Module => "module",
            SymbolKind::Subroutine => "subroutine",
            SymbolKind::Function => "function",
            SymbolKind::BlockData => "block data",
            SymbolKind::FunctionResult => "function result",
            SymbolKind::DummyArgument => "dummy argument",
            SymbolKind::Variable => "variable",
            SymbolKind::NamedConstant => "named constant",
            SymbolKind::DerivedType => "derived type",
            SymbolKind::Component => "component",
            SymbolKind::CommonBlock => "common block",
            SymbolKind::ExternalProcedure => "external procedure",
            SymbolKind::Intrinsic => "intrinsic",
            SymbolKind::Interface => "interface",
            SymbolKind::ConstructName => "construct name",
        }
    }
}

/// The base type of a declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    Integer,
    Real,
    DoublePrecision,
    Complex,
    Logical,
    Character,
    Derived(CompactString),
}

impl TypeName {
    /// Map a lowercased type keyword, as returned by
    /// [`TypeSpec::keyword`](fortran_syntax::ast::TypeSpec::keyword).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "integer" => TypeName::Integer,
            "real" => TypeName::Real,
            "doubleprecision" => TypeName::DoublePrecision,
            "complex" | "doublecomplex" => TypeName::Complex,
            "logical" => TypeName::Logical,
            "character" => TypeName::Character,
            _ => return None,
        })
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeName::Integer => f.write_str("integer"),
            TypeName::Real => f.write_str("real"),
            TypeName::DoublePrecision => f.write_str("double precision"),
            TypeName::Complex => f.write_str("complex"),
            TypeName::Logical => f.write_str("logical"),
            TypeName::Character => f.write_str("character"),
            TypeName::Derived(name) => write!(f, "type({})", name),
        }
    }
}

/// A declared entity.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    /// The name as first written.
    pub name: CompactString,
    pub kind: SymbolKind,
    /// Declared type, or the implicit type once collection has finished.
    pub ty: Option<TypeName>,
    /// Extents for arrays; `None` for scalars.
    pub dims: Option<Vec<Option<u64>>>,
    /// The node that first declared the symbol.
    pub node: NodeId,
    pub scope: ScopeId,
    pub span: Span,
    /// Declared by first use rather than by a statement.
    pub implicit: bool,
    /// The scope a unit, module or derived type opens.
    pub owned_scope: Option<ScopeId>,
}

impl Symbol {
    pub fn key(&self) -> CompactString {
        self.name.to_ascii_lowercase().into()
    }

    pub fn is_array(&self) -> bool {
        self.dims.is_some()
    }
}

/// Table of all symbols, indexed by [`SymbolId`].
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: &str,
        kind: SymbolKind,
        ty: Option<TypeName>,
        node: NodeId,
        scope: ScopeId,
        span: Span,
    ) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            id,
            name: name.into(),
            kind,
            ty,
            dims: None,
            node,
            scope,
            span,
            implicit: false,
            owned_scope: None,
        });
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_insertion_order() {
        let mut table = SymbolTable::new();
        let a = table.insert("A", SymbolKind::Variable, None, NodeId(1), ScopeId(0), Span::new(0, 1));
        let b = table.insert("b", SymbolKind::NamedConstant, Some(TypeName::Integer), NodeId(2), ScopeId(0), Span::new(2, 3));
        assert_eq!((a, b), (SymbolId(0), SymbolId(1)));
        assert_eq!(table.get(a).unwrap().key(), "a");
        assert_eq!(table.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(), ["A", "b"]);
    }

    #[test]
    fn type_keywords() {
        assert_eq!(TypeName::from_keyword("doubleprecision"), Some(TypeName::DoublePrecision));
        assert_eq!(TypeName::from_keyword("doublecomplex"), Some(TypeName::Complex));
        assert_eq!(TypeName::from_keyword("type"), None);
        assert_eq!(TypeName::Derived("point".into()).to_string(), "type(point)");
    }
}
