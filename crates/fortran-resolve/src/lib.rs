// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Name resolution for Fortran sources.
//!
//! This crate builds the scope tree and symbol table of a parsed file and
//! binds every name reference, statement label and construct name to its
//! declaration. Problems are collected as data; resolution always produces
//! a table unless it is cancelled.

mod error;
mod intrinsics;
mod resolver;
mod scope;
mod symbol;

pub use error::{ResolveError, ResolveErrorKind};
pub use intrinsics::{intrinsic, is_intrinsic_module, Intrinsic, IntrinsicKind, IntrinsicResult};
pub use resolver::Resolver;
pub use scope::{ImplicitRules, Import, LabelDef, Scope, ScopeId, ScopeKind, ScopeTree};
pub use symbol::{Symbol, SymbolId, SymbolKind, SymbolTable, TypeName};

use std::collections::HashMap;

use compact_str::CompactString;
use fortran_syntax::{CancelCheck, Cancelled, NeverCancel, NodeId, SyntaxNode, SyntaxTree};

/// What a name reference was bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Bound(SymbolId),
    Unresolved,
}

impl Resolution {
    pub fn symbol(self) -> Option<SymbolId> {
        match self {
            Resolution::Bound(id) => Some(id),
            Resolution::Unresolved => None,
        }
    }
}

/// The result of name resolution.
#[derive(Debug)]
pub struct ResolvedProgram {
    /// All symbols declared in the program.
    pub symbols: SymbolTable,
    pub scopes: ScopeTree,
    /// Errors and warnings in the order they were found.
    pub errors: Vec<ResolveError>,
    resolutions: HashMap<NodeId, Resolution>,
    label_targets: HashMap<NodeId, NodeId>,
    declared_by: HashMap<NodeId, Vec<SymbolId>>,
    scope_nodes: HashMap<NodeId, ScopeId>,
    modules: HashMap<CompactString, ScopeId>,
}

/// Resolve all names in a parsed file.
pub fn resolve(tree: &SyntaxTree) -> ResolvedProgram {
    let mut resolver = Resolver::new(&NeverCancel);
    // NeverCancel never fires, so every pass runs.
    let _ = resolver.run(tree);
    resolver.into_program()
}

/// Like [`resolve`], checking `cancel` at every declaration and statement.
pub fn resolve_with_cancel(tree: &SyntaxTree, cancel: &dyn CancelCheck) -> Result<ResolvedProgram, Cancelled> {
    Resolver::new(cancel).resolve(tree)
}

impl ResolvedProgram {
    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id)
    }

    /// Every entry named `name` visible from `scope`, in resolution order:
    /// the lexical chain innermost first, then `use` edges.
    pub fn lookup(&self, name: &str, scope: ScopeId) -> Vec<SymbolId> {
        let key = name.to_ascii_lowercase();
        let mut found: Vec<SymbolId> = self
            .scopes
            .chain(scope)
            .filter_map(|s| s.bindings.get(key.as_str()).copied())
            .collect();
        for id in self.scopes.imported(&key, scope) {
            if !found.contains(&id) {
                found.push(id);
            }
        }
        found
    }

    /// The binding recorded for a name reference, construct name reference
    /// or common block reference.
    pub fn resolution(&self, node: NodeId) -> Option<Resolution> {
        self.resolutions.get(&node).copied()
    }

    /// The declaration a node refers to, or the first one it makes.
    pub fn declaration_of(&self, node: NodeId) -> Option<&Symbol> {
        match self.resolutions.get(&node) {
            Some(Resolution::Bound(id)) => self.symbols.get(*id),
            Some(Resolution::Unresolved) => None,
            None => self
                .declared_by
                .get(&node)
                .and_then(|ids| ids.first())
                .and_then(|id| self.symbols.get(*id)),
        }
    }

    /// Symbols declared or completed by a declaring node.
    pub fn symbols_declared_by(&self, node: NodeId) -> &[SymbolId] {
        self.declared_by.get(&node).map_or(&[], Vec::as_slice)
    }

    /// The statement a label reference jumps to.
    pub fn label_target(&self, node: NodeId) -> Option<NodeId> {
        self.label_targets.get(&node).copied()
    }

    /// The innermost scope containing `node`.
    pub fn scope_of(&self, node: SyntaxNode<'_>) -> ScopeId {
        std::iter::once(node)
            .chain(node.ancestors())
            .find_map(|n| self.scope_nodes.get(&n.id()).copied())
            .unwrap_or(ScopeId::GLOBAL)
    }

    /// The innermost scope around a byte offset.
    pub fn scope_at_offset(&self, tree: &SyntaxTree, offset: usize) -> ScopeId {
        tree.node_at_offset(offset)
            .map_or(ScopeId::GLOBAL, |node| self.scope_of(node))
    }

    /// Nodes bound to `symbol`, in tree order.
    pub fn references_to(&self, symbol: SymbolId) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .resolutions
            .iter()
            .filter(|(_, r)| **r == Resolution::Bound(symbol))
            .map(|(node, _)| *node)
            .collect();
        nodes.sort();
        nodes
    }

    /// The scope of a module defined in the file.
    pub fn module_scope(&self, name: &str) -> Option<ScopeId> {
        self.modules.get(name.to_ascii_lowercase().as_str()).copied()
    }

    /// The component `name` of a derived type, looked up from `scope`.
    pub fn component(&self, ty: &TypeName, name: &str, scope: ScopeId) -> Option<&Symbol> {
        let TypeName::Derived(type_name) = ty else {
            return None;
        };
        let type_symbol = self
            .lookup(type_name, scope)
            .into_iter()
            .filter_map(|id| self.symbols.get(id))
            .find(|s| s.kind == SymbolKind::DerivedType)?;
        let components = self.scopes.get(type_symbol.owned_scope?)?;
        let id = components.bindings.get(name.to_ascii_lowercase().as_str())?;
        self.symbols.get(*id)
    }

    /// Whether any problem other than a warning was found.
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| !e.is_warning())
    }
}
