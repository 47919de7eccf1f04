// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scope tree for name resolution.

use std::collections::{HashMap, HashSet};

use compact_str::CompactString;
use fortran_syntax::{NodeId, Span};

use crate::symbol::{SymbolId, TypeName};

/// Unique identifier for a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

/// The kind of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Top level: the program units of the file.
    Global,
    Program,
    Module,
    Subroutine,
    Function,
    BlockData,
    /// Components of a derived type.
    DerivedType,
    /// Holds the intrinsic procedures referenced by the file.
    Intrinsics,
}

impl ScopeKind {
    /// Scopes that own implicit rules, labels and construct names.
    pub fn is_program_unit(self) -> bool {
        matches!(
            self,
            ScopeKind::Program | ScopeKind::Module | ScopeKind::Subroutine | ScopeKind::Function | ScopeKind::BlockData
        )
    }
}

/// Implicit typing rules of a program unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplicitRules {
    none: bool,
    letters: [Option<TypeName>; 26],
}

impl Default for ImplicitRules {
    /// `i` to `n` are integer, everything else real.
    fn default() -> Self {
        let letters = std::array::from_fn(|i| {
            if (8..=13).contains(&i) {
                Some(TypeName::Integer)
            } else {
                Some(TypeName::Real)
            }
        });
        Self { none: false, letters }
    }
}

impl ImplicitRules {
    pub fn none() -> Self {
        Self {
            none: true,
            letters: std::array::from_fn(|_| None),
        }
    }

    pub fn is_none(&self) -> bool {
        self.none
    }

    /// Map the inclusive letter range `first..=last` to `ty`.
    pub fn set(&mut self, first: char, last: char, ty: TypeName) {
        let (Some(first), Some(last)) = (letter_index(first), letter_index(last)) else {
            return;
        };
        for slot in &mut self.letters[first.min(last)..=first.max(last)] {
            *slot = Some(ty.clone());
        }
    }

    /// The implicit type of `name`, from its first letter.
    pub fn type_for(&self, name: &str) -> Option<TypeName> {
        let index = letter_index(name.chars().next()?)?;
        self.letters[index].clone()
    }
}

fn letter_index(c: char) -> Option<usize> {
    let c = c.to_ascii_lowercase();
    c.is_ascii_lowercase().then(|| (c as u8 - b'a') as usize)
}

/// A `use` edge from a scope to a module.
#[derive(Debug, Clone)]
pub struct Import {
    pub module: CompactString,
    pub span: Span,
    /// `use, intrinsic ::` or a module the compiler provides.
    pub intrinsic: bool,
    /// `(local, remote)` pairs of an `only:` list.
    pub only: Option<Vec<(CompactString, CompactString)>>,
    /// `(local, remote)` renames outside an `only:` list.
    pub renames: Vec<(CompactString, CompactString)>,
    /// The module scope, once imports are linked.
    pub target: Option<ScopeId>,
}

impl Import {
    /// The module-side name that `local` refers to through this edge.
    pub fn remote_for(&self, local: &str) -> Option<CompactString> {
        if let Some(only) = &self.only {
            return only.iter().find(|(l, _)| l.as_str() == local).map(|(_, r)| r.clone());
        }
        if let Some((_, remote)) = self.renames.iter().find(|(l, _)| l.as_str() == local) {
            return Some(remote.clone());
        }
        // A renamed entity is not visible under its original name.
        if self.renames.iter().any(|(_, r)| r.as_str() == local) {
            return None;
        }
        Some(local.into())
    }
}

/// A statement label definition.
#[derive(Debug, Clone, Copy)]
pub struct LabelDef {
    /// The labelled statement.
    pub stmt: NodeId,
    pub span: Span,
}

/// A scope in the scope tree.
#[derive(Debug)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    /// The unit or type definition that opens the scope.
    pub node: Option<NodeId>,
    pub bindings: HashMap<CompactString, SymbolId>,
    pub imports: Vec<Import>,
    pub implicit: ImplicitRules,
    pub(crate) construct_names: HashMap<CompactString, SymbolId>,
    pub(crate) common_blocks: HashMap<CompactString, SymbolId>,
    pub(crate) labels: HashMap<u64, LabelDef>,
    pub(crate) default_private: bool,
    pub(crate) public: HashSet<CompactString>,
    pub(crate) private: HashSet<CompactString>,
}

impl Scope {
    fn new(id: ScopeId, parent: Option<ScopeId>, kind: ScopeKind, node: Option<NodeId>, implicit: ImplicitRules) -> Self {
        Self {
            id,
            parent,
            kind,
            node,
            bindings: HashMap::new(),
            imports: Vec::new(),
            implicit,
            construct_names: HashMap::new(),
            common_blocks: HashMap::new(),
            labels: HashMap::new(),
            default_private: false,
            public: HashSet::new(),
            private: HashSet::new(),
        }
    }

    /// Whether a module entity is visible to `use`.
    pub fn exports(&self, key: &str) -> bool {
        if self.public.contains(key) {
            true
        } else if self.private.contains(key) {
            false
        } else {
            !self.default_private
        }
    }

    pub fn label(&self, label: u64) -> Option<LabelDef> {
        self.labels.get(&label).copied()
    }

    pub fn construct_name(&self, key: &str) -> Option<SymbolId> {
        self.construct_names.get(key).copied()
    }

    pub fn common_block(&self, key: &str) -> Option<SymbolId> {
        self.common_blocks.get(key).copied()
    }
}

/// Tree of scopes for name lookup.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Create a new scope tree with a global scope.
    pub fn new() -> Self {
        let global = Scope::new(ScopeId::GLOBAL, None, ScopeKind::Global, None, ImplicitRules::default());
        Self {
            scopes: vec![global],
            stack: vec![ScopeId::GLOBAL],
        }
    }

    /// Push a child of the current scope.
    pub fn push(&mut self, kind: ScopeKind, node: Option<NodeId>) -> ScopeId {
        let parent = self.current();
        self.push_with_parent(kind, node, parent)
    }

    /// Push a scope whose lexical parent is not the current scope, as for
    /// interface bodies. Implicit rules start from the parent's.
    pub fn push_with_parent(&mut self, kind: ScopeKind, node: Option<NodeId>, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        let implicit = match self.get(parent) {
            Some(p) if p.kind.is_program_unit() => p.implicit.clone(),
            _ => ImplicitRules::default(),
        };
        self.scopes.push(Scope::new(id, Some(parent), kind, node, implicit));
        self.stack.push(id);
        id
    }

    /// Detached scope that never becomes current.
    pub(crate) fn add_detached(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(id, None, kind, None, ImplicitRules::default()));
        id
    }

    /// Pop the current scope. The global scope is never popped.
    pub fn pop(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn current(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(ScopeId::GLOBAL)
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        self.scopes.get_mut(id.0 as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Scopes from `id` out to the global scope.
    pub fn chain(&self, id: ScopeId) -> impl Iterator<Item = &Scope> + '_ {
        std::iter::successors(self.get(id), move |s| s.parent.and_then(|p| self.get(p)))
    }

    /// Look up `key` along the lexical chain starting at `scope`.
    pub fn lookup(&self, key: &str, scope: ScopeId) -> Option<SymbolId> {
        self.chain(scope).find_map(|s| s.bindings.get(key).copied())
    }

    /// Entities reachable as `key` through the `use` edges of `scope` and
    /// its hosts, innermost scope's edges first.
    pub fn imported(&self, key: &str, scope: ScopeId) -> Vec<SymbolId> {
        let mut found = Vec::new();
        for s in self.chain(scope) {
            for import in &s.imports {
                let mut visited = Vec::new();
                if let Some(id) = self.through_import(import, key, &mut visited) {
                    if !found.contains(&id) {
                        found.push(id);
                    }
                }
            }
        }
        found
    }

    /// The public entity `key` of a module, following the module's own
    /// `use` edges. Cycles end the search.
    pub fn exported(&self, module: ScopeId, key: &str) -> Option<SymbolId> {
        self.exported_from(module, key, &mut Vec::new())
    }

    fn exported_from(&self, module: ScopeId, key: &str, visited: &mut Vec<ScopeId>) -> Option<SymbolId> {
        if visited.contains(&module) {
            return None;
        }
        visited.push(module);
        let scope = self.get(module)?;
        if !scope.exports(key) {
            return None;
        }
        if let Some(&id) = scope.bindings.get(key) {
            return Some(id);
        }
        scope.imports.iter().find_map(|import| self.through_import(import, key, visited))
    }

    fn through_import(&self, import: &Import, key: &str, visited: &mut Vec<ScopeId>) -> Option<SymbolId> {
        let remote = import.remote_for(key)?;
        self.exported_from(import.target?, &remote, visited)
    }

    /// Whether names may come from a module whose contents are unknown:
    /// an intrinsic module or one missing from the file.
    pub fn has_opaque_import(&self, scope: ScopeId) -> bool {
        let mut visited = Vec::new();
        self.chain(scope)
            .any(|s| s.imports.iter().any(|import| self.import_is_opaque(import, &mut visited)))
    }

    fn import_is_opaque(&self, import: &Import, visited: &mut Vec<ScopeId>) -> bool {
        let Some(target) = import.target else {
            return true;
        };
        if visited.contains(&target) {
            return false;
        }
        visited.push(target);
        self.get(target)
            .is_some_and(|m| m.imports.iter().any(|inner| self.import_is_opaque(inner, visited)))
    }

    /// The innermost program-unit scope around `scope`.
    pub fn unit_of(&self, scope: ScopeId) -> Option<ScopeId> {
        self.chain(scope).find(|s| s.kind.is_program_unit()).map(|s| s.id)
    }

    /// Bind `key` in `scope`. The first binding wins; an existing one is
    /// returned as the error.
    pub fn define(&mut self, scope: ScopeId, key: CompactString, symbol: SymbolId) -> Result<(), SymbolId> {
        let Some(scope) = self.get_mut(scope) else {
            return Ok(());
        };
        match scope.bindings.get(&key) {
            Some(&existing) => Err(existing),
            None => {
                scope.bindings.insert(key, symbol);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward_and_first_binding_wins() {
        let mut tree = ScopeTree::new();
        tree.define(ScopeId::GLOBAL, "x".into(), SymbolId(0)).unwrap();
        let inner = tree.push(ScopeKind::Subroutine, None);
        assert_eq!(tree.lookup("x", inner), Some(SymbolId(0)));
        tree.define(inner, "x".into(), SymbolId(1)).unwrap();
        assert_eq!(tree.lookup("x", inner), Some(SymbolId(1)));
        assert_eq!(tree.define(inner, "x".into(), SymbolId(2)), Err(SymbolId(1)));
        tree.pop();
        assert_eq!(tree.current(), ScopeId::GLOBAL);
        tree.pop();
        assert_eq!(tree.current(), ScopeId::GLOBAL);
    }

    #[test]
    fn default_implicit_rules() {
        let rules = ImplicitRules::default();
        assert_eq!(rules.type_for("index"), Some(TypeName::Integer));
        assert_eq!(rules.type_for("N"), Some(TypeName::Integer));
        assert_eq!(rules.type_for("x"), Some(TypeName::Real));
        assert_eq!(rules.type_for("_"), None);
        assert_eq!(ImplicitRules::none().type_for("i"), None);
    }

    #[test]
    fn implicit_ranges_override_letters() {
        let mut rules = ImplicitRules::default();
        rules.set('a', 'h', TypeName::DoublePrecision);
        rules.set('z', 'z', TypeName::Logical);
        assert_eq!(rules.type_for("alpha"), Some(TypeName::DoublePrecision));
        assert_eq!(rules.type_for("zeta"), Some(TypeName::Logical));
        assert_eq!(rules.type_for("omega"), Some(TypeName::Real));
    }

    #[test]
    fn imports_restrict_and_rename() {
        let mut import = Import {
            module: "m".into(),
            span: Span::empty(0),
            intrinsic: false,
            only: None,
            renames: vec![("local".into(), "remote".into())],
            target: None,
        };
        assert_eq!(import.remote_for("local").as_deref(), Some("remote"));
        assert_eq!(import.remote_for("remote"), None);
        assert_eq!(import.remote_for("other").as_deref(), Some("other"));
        import.only = Some(vec![("a".into(), "a".into())]);
        assert_eq!(import.remote_for("a").as_deref(), Some("a"));
        assert_eq!(import.remote_for("other"), None);
    }
}
