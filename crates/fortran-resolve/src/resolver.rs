// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The name resolver: declaration collection, import linking and use-site
//! resolution over a finished syntax tree.

use std::collections::HashMap;

use compact_str::CompactString;
use fortran_syntax::ast::{
    AttrStmt, CallExpr, CallStmt, CommonBlock, EndStmt, EntityDecl, FunctionStmt, ImplicitStmt, Label, LabelRef,
    NameRef, ProgramUnit, Rename, SubroutineStmt, TypeDeclStmt, TypeSpec, UseStmt,
};
use fortran_syntax::{
    AstNode, CancelCheck, Cancelled, NamedElement, NodeId, NodeKind, Span, SyntaxNode, SyntaxTree, TokenKind,
};
use log::{debug, trace};

use crate::error::ResolveError;
use crate::intrinsics::{intrinsic, is_intrinsic_module, IntrinsicKind, IntrinsicResult};
use crate::scope::{ImplicitRules, Import, LabelDef, ScopeId, ScopeKind, ScopeTree};
use crate::symbol::{SymbolId, SymbolKind, SymbolTable, TypeName};
use crate::{ResolvedProgram, Resolution};

/// How a declaration statement may complete an earlier entry for the same
/// name instead of duplicating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completes {
    Type,
    Dimension,
    External,
    Parameter,
    Common,
}

/// The position a name reference appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameUse {
    Value,
    /// `f` in `f(x)` inside an expression.
    Callee,
    /// The procedure after `call`.
    CallTarget,
    /// `point` in `type(point)`.
    Type,
    /// A name in `module procedure`.
    Procedure,
}

/// The name resolver.
pub struct Resolver<'a> {
    cancel: &'a dyn CancelCheck,
    symbols: SymbolTable,
    scopes: ScopeTree,
    resolutions: HashMap<NodeId, Resolution>,
    label_targets: HashMap<NodeId, NodeId>,
    declared_by: HashMap<NodeId, Vec<SymbolId>>,
    scope_nodes: HashMap<NodeId, ScopeId>,
    unit_symbols: HashMap<NodeId, SymbolId>,
    function_results: Vec<(SymbolId, SymbolId)>,
    modules: HashMap<CompactString, ScopeId>,
    intrinsics: ScopeId,
    /// Scope of the node being resolved in the use-site pass.
    current: ScopeId,
    errors: Vec<ResolveError>,
}

impl<'a> Resolver<'a> {
    pub fn new(cancel: &'a dyn CancelCheck) -> Self {
        let mut scopes = ScopeTree::new();
        let intrinsics = scopes.add_detached(ScopeKind::Intrinsics);
        Self {
            cancel,
            symbols: SymbolTable::new(),
            scopes,
            resolutions: HashMap::new(),
            label_targets: HashMap::new(),
            declared_by: HashMap::new(),
            scope_nodes: HashMap::new(),
            unit_symbols: HashMap::new(),
            function_results: Vec::new(),
            modules: HashMap::new(),
            intrinsics,
            current: ScopeId::GLOBAL,
            errors: Vec::new(),
        }
    }

    /// Resolve every name in `tree`.
    pub fn resolve(mut self, tree: &'a SyntaxTree) -> Result<ResolvedProgram, Cancelled> {
        self.run(tree)?;
        Ok(self.into_program())
    }

    /// Run all passes. After cancellation the tables hold whatever was
    /// resolved so far.
    pub fn run(&mut self, tree: &'a SyntaxTree) -> Result<(), Cancelled> {
        self.collect(tree.root())?;
        self.finish_types();
        self.link_imports();
        self.resolve_node(tree.root())?;
        debug!(
            "resolved {} symbols in {} scopes with {} problems",
            self.symbols.len(),
            self.scopes.len(),
            self.errors.len()
        );
        Ok(())
    }

    pub fn into_program(self) -> ResolvedProgram {
        ResolvedProgram {
            symbols: self.symbols,
            scopes: self.scopes,
            errors: self.errors,
            resolutions: self.resolutions,
            label_targets: self.label_targets,
            declared_by: self.declared_by,
            scope_nodes: self.scope_nodes,
            modules: self.modules,
        }
    }

    fn check_cancel(&self) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // Pass 1: Collect declarations
    // =========================================================================

    fn collect(&mut self, node: SyntaxNode<'a>) -> Result<(), Cancelled> {
        let kind = node.kind();
        if kind.is_statement() {
            self.check_cancel()?;
            self.collect_stmt_prefix(node);
        }
        match kind {
            NodeKind::MainProgram
            | NodeKind::Module
            | NodeKind::Subroutine
            | NodeKind::Function
            | NodeKind::BlockData => self.collect_unit(node),
            NodeKind::DerivedTypeDef => self.collect_derived_type(node),
            NodeKind::InterfaceBlock => self.collect_interface(node),
            NodeKind::TypeDeclStmt => {
                self.collect_type_decl(node);
                Ok(())
            }
            NodeKind::DimensionStmt => {
                self.collect_entity_stmt(node, SymbolKind::Variable, Completes::Dimension);
                Ok(())
            }
            NodeKind::ExternalStmt => {
                self.collect_entity_stmt(node, SymbolKind::ExternalProcedure, Completes::External);
                Ok(())
            }
            NodeKind::IntrinsicStmt => {
                self.collect_intrinsic_stmt(node);
                Ok(())
            }
            NodeKind::ParameterStmt => {
                self.collect_parameters(node);
                Ok(())
            }
            NodeKind::CommonStmt => {
                self.collect_common(node);
                Ok(())
            }
            NodeKind::UseStmt => {
                self.collect_use(node);
                Ok(())
            }
            NodeKind::ImplicitStmt => {
                self.collect_implicit(node);
                Ok(())
            }
            NodeKind::AttrStmt => {
                self.collect_access(node);
                Ok(())
            }
            _ => {
                for child in node.child_nodes() {
                    self.collect(child)?;
                }
                Ok(())
            }
        }
    }

    /// Statement label and construct name in front of a statement.
    fn collect_stmt_prefix(&mut self, stmt: SyntaxNode<'a>) {
        for child in stmt.child_nodes() {
            match child.kind() {
                NodeKind::Label => self.define_label(stmt, child),
                NodeKind::ConstructName => self.define_construct_name(child),
                _ => {}
            }
        }
    }

    fn collect_unit(&mut self, node: SyntaxNode<'a>) -> Result<(), Cancelled> {
        let (symbol_kind, scope_kind) = match node.kind() {
            NodeKind::Module => (SymbolKind::Module, ScopeKind::Module),
            NodeKind::Subroutine => (SymbolKind::Subroutine, ScopeKind::Subroutine),
            NodeKind::Function => (SymbolKind::Function, ScopeKind::Function),
            NodeKind::BlockData => (SymbolKind::BlockData, ScopeKind::BlockData),
            _ => (SymbolKind::Program, ScopeKind::Program),
        };
        // Interface bodies describe external procedures and do not see
        // their host.
        let in_interface = node.parent().is_some_and(|p| p.kind() == NodeKind::InterfaceBlock);
        let symbol_kind = if in_interface { SymbolKind::ExternalProcedure } else { symbol_kind };

        let unit = ProgramUnit::cast(node);
        let header = unit.and_then(|u| u.header()).map(|h| h.syntax());
        if let Some(header) = header {
            self.check_cancel()?;
            self.collect_stmt_prefix(header);
        }
        let unit_symbol = header
            .and_then(NamedElement::cast)
            .and_then(|named| self.declare(named, symbol_kind, None));

        let scope = if in_interface {
            self.scopes.push_with_parent(scope_kind, Some(node.id()), ScopeId::GLOBAL)
        } else {
            self.scopes.push(scope_kind, Some(node.id()))
        };
        trace!("push {:?} scope {:?}", scope_kind, scope);
        self.scope_nodes.insert(node.id(), scope);
        if let Some(id) = unit_symbol {
            self.unit_symbols.insert(node.id(), id);
            if let Some(symbol) = self.symbols.get_mut(id) {
                symbol.owned_scope = Some(scope);
            }
            if symbol_kind == SymbolKind::Module {
                if let Some(symbol) = self.symbols.get(id) {
                    self.modules.entry(symbol.key()).or_insert(scope);
                }
            }
        }

        if let Some(header) = header {
            self.collect_header(header, unit_symbol);
        }
        for child in node.child_nodes() {
            if child.kind().is_name_stmt() {
                continue;
            }
            self.collect(child)?;
        }

        self.scopes.pop();
        trace!("pop {:?} scope {:?}", scope_kind, scope);
        Ok(())
    }

    /// Dummy arguments and the function result.
    fn collect_header(&mut self, header: SyntaxNode<'a>, unit_symbol: Option<SymbolId>) {
        if let Some(stmt) = SubroutineStmt::cast(header) {
            for arg in stmt.dummy_args().filter(|a| !a.is_alternate_return()) {
                if let Some(named) = NamedElement::cast(arg.syntax()) {
                    self.declare(named, SymbolKind::DummyArgument, None);
                }
            }
            return;
        }
        let Some(stmt) = FunctionStmt::cast(header) else {
            return;
        };
        let ty = stmt.prefix_type().and_then(type_name);
        for arg in stmt.dummy_args().filter(|a| !a.is_alternate_return()) {
            if let Some(named) = NamedElement::cast(arg.syntax()) {
                self.declare(named, SymbolKind::DummyArgument, None);
            }
        }
        // Without a result clause the result variable takes the function's
        // own name inside its scope.
        let result_element = match stmt.result() {
            Some(result) => NamedElement::cast(result.syntax()),
            None => NamedElement::cast(header),
        };
        let result = result_element.and_then(|named| self.declare(named, SymbolKind::FunctionResult, ty.clone()));
        if let Some(function) = unit_symbol {
            if let Some(symbol) = self.symbols.get_mut(function) {
                symbol.ty = ty;
            }
            if let Some(result) = result {
                self.function_results.push((function, result));
            }
        }
    }

    fn collect_derived_type(&mut self, node: SyntaxNode<'a>) -> Result<(), Cancelled> {
        let stmt = node.first_child(NodeKind::DerivedTypeStmt);
        if let Some(stmt) = stmt {
            self.check_cancel()?;
            self.collect_stmt_prefix(stmt);
        }
        let named = stmt.and_then(NamedElement::cast);
        let ty = named.and_then(|n| n.key()).map(TypeName::Derived);
        let symbol = named.and_then(|n| self.declare(n, SymbolKind::DerivedType, ty));

        let scope = self.scopes.push(ScopeKind::DerivedType, Some(node.id()));
        self.scope_nodes.insert(node.id(), scope);
        if let Some(symbol) = symbol.and_then(|id| self.symbols.get_mut(id)) {
            symbol.owned_scope = Some(scope);
        }
        for child in node.child_nodes() {
            if child.kind() == NodeKind::DerivedTypeStmt {
                continue;
            }
            self.collect(child)?;
        }
        self.scopes.pop();
        Ok(())
    }

    fn collect_interface(&mut self, node: SyntaxNode<'a>) -> Result<(), Cancelled> {
        for child in node.child_nodes() {
            if child.kind() == NodeKind::InterfaceStmt {
                self.check_cancel()?;
                self.collect_stmt_prefix(child);
                if let Some(named) = NamedElement::cast(child).filter(|n| n.identifier().is_some()) {
                    self.declare(named, SymbolKind::Interface, None);
                }
                continue;
            }
            self.collect(child)?;
        }
        Ok(())
    }

    fn collect_type_decl(&mut self, node: SyntaxNode<'a>) {
        let Some(stmt) = TypeDeclStmt::cast(node) else {
            return;
        };
        let ty = stmt.type_spec().and_then(type_name);
        let in_type = self.current_kind() == ScopeKind::DerivedType;
        let kind = if in_type {
            SymbolKind::Component
        } else if stmt.has_attr("parameter") {
            SymbolKind::NamedConstant
        } else if stmt.has_attr("external") {
            SymbolKind::ExternalProcedure
        } else {
            SymbolKind::Variable
        };
        let shared_dims = stmt
            .attrs()
            .find(|a| a.name().is_some_and(|n| n == "dimension"))
            .and_then(|a| a.array_spec())
            .map(|spec| spec.extents());
        let access = if stmt.has_attr("public") {
            Some(true)
        } else if stmt.has_attr("private") {
            Some(false)
        } else {
            None
        };

        for entity in stmt.entities() {
            let Some(named) = NamedElement::cast(entity.syntax()) else {
                continue;
            };
            let dims = entity.array_spec().map(|spec| spec.extents()).or_else(|| shared_dims.clone());
            self.declare_entity(named, kind, ty.clone(), dims, Completes::Type);
            if let (Some(public), Some(key), false) = (access, named.key(), in_type) {
                self.set_access(key, public);
            }
        }
    }

    /// `dimension` and `external` statements.
    fn collect_entity_stmt(&mut self, node: SyntaxNode<'a>, kind: SymbolKind, how: Completes) {
        for entity in node.child_nodes().filter_map(EntityDecl::cast) {
            let Some(named) = NamedElement::cast(entity.syntax()) else {
                continue;
            };
            let dims = entity.array_spec().map(|spec| spec.extents());
            self.declare_entity(named, kind, None, dims, how);
        }
    }

    fn collect_intrinsic_stmt(&mut self, node: SyntaxNode<'a>) {
        for entity in node.children_of_kind(NodeKind::EntityDecl) {
            if let Some(named) = NamedElement::cast(entity) {
                let ty = named
                    .key()
                    .and_then(|key| intrinsic(&key))
                    .and_then(|i| fixed_result(i.result));
                self.declare(named, SymbolKind::Intrinsic, ty);
            }
        }
    }

    fn collect_parameters(&mut self, node: SyntaxNode<'a>) {
        for def in node.children_of_kind(NodeKind::NamedConstantDef) {
            if let Some(named) = NamedElement::cast(def) {
                self.declare_entity(named, SymbolKind::NamedConstant, None, None, Completes::Parameter);
            }
        }
    }

    fn collect_common(&mut self, node: SyntaxNode<'a>) {
        for block in node.children_of_kind(NodeKind::CommonBlock) {
            let Some(common) = CommonBlock::cast(block) else {
                continue;
            };
            if let Some(named) = NamedElement::cast(block).filter(|n| n.identifier().is_some()) {
                self.declare_common_block(named);
            }
            for object in common.objects() {
                if let Some(named) = NamedElement::cast(object.syntax()) {
                    let dims = object.array_spec().map(|spec| spec.extents());
                    self.declare_entity(named, SymbolKind::Variable, None, dims, Completes::Common);
                }
            }
        }
    }

    /// Common block names live in their own namespace, and a block may be
    /// continued by later `common` statements.
    fn declare_common_block(&mut self, named: NamedElement<'a>) {
        let (Some(key), Some(name)) = (named.key(), named.name()) else {
            return;
        };
        let Some(unit) = self.scopes.unit_of(self.scopes.current()) else {
            return;
        };
        let node = named.syntax().id();
        let existing = self.scopes.get(unit).and_then(|s| s.common_block(&key));
        let id = match existing {
            Some(id) => id,
            None => {
                let id = self.symbols.insert(name, SymbolKind::CommonBlock, None, node, unit, named.name_span());
                if let Some(scope) = self.scopes.get_mut(unit) {
                    scope.common_blocks.insert(key, id);
                }
                id
            }
        };
        self.declared_by.entry(node).or_default().push(id);
    }

    fn collect_use(&mut self, node: SyntaxNode<'a>) {
        let Some(stmt) = UseStmt::cast(node) else {
            return;
        };
        let Some(module) = stmt.module_name() else {
            return;
        };
        let key = module.token().key();
        let only = stmt.only_list().map(|list| {
            list.child_nodes()
                .filter_map(|item| match item.kind() {
                    NodeKind::NameRef => NameRef::cast(item).and_then(|n| n.key()).map(|k| (k.clone(), k)),
                    NodeKind::Rename => Rename::cast(item).and_then(rename_pair),
                    _ => None,
                })
                .collect()
        });
        let renames = stmt.renames().filter_map(rename_pair).collect();
        let import = Import {
            intrinsic: stmt.is_intrinsic() || is_intrinsic_module(&key),
            module: key,
            span: module.span(),
            only,
            renames,
            target: None,
        };
        trace!("use {} from scope {:?}", import.module, self.scopes.current());
        let current = self.scopes.current();
        if let Some(scope) = self.scopes.get_mut(current) {
            scope.imports.push(import);
        }
    }

    fn collect_implicit(&mut self, node: SyntaxNode<'a>) {
        let Some(stmt) = ImplicitStmt::cast(node) else {
            return;
        };
        let Some(unit) = self.scopes.unit_of(self.scopes.current()) else {
            return;
        };
        let Some(scope) = self.scopes.get_mut(unit) else {
            return;
        };
        if stmt.is_none() {
            scope.implicit = ImplicitRules::none();
            return;
        }
        for spec in stmt.specs() {
            let Some(ty) = spec.type_spec().and_then(type_name) else {
                continue;
            };
            for (first, last) in spec.letters() {
                scope.implicit.set(first, last, ty.clone());
            }
        }
    }

    /// `public` and `private` statements of a module.
    fn collect_access(&mut self, node: SyntaxNode<'a>) {
        let Some(stmt) = AttrStmt::cast(node) else {
            return;
        };
        let public = match stmt.keyword().as_deref() {
            Some("public") => true,
            Some("private") => false,
            _ => return,
        };
        if self.current_kind() != ScopeKind::Module {
            return;
        }
        let mut names = stmt.names().filter_map(|n| n.key()).peekable();
        if names.peek().is_none() {
            let current = self.scopes.current();
            if let Some(scope) = self.scopes.get_mut(current) {
                scope.default_private = !public;
            }
            return;
        }
        for key in names {
            self.set_access(key, public);
        }
    }

    fn set_access(&mut self, key: CompactString, public: bool) {
        let current = self.scopes.current();
        let Some(scope) = self.scopes.get_mut(current).filter(|s| s.kind == ScopeKind::Module) else {
            return;
        };
        if public {
            scope.public.insert(key);
        } else {
            scope.private.insert(key);
        }
    }

    fn define_label(&mut self, stmt: SyntaxNode<'a>, label: SyntaxNode<'a>) {
        let Some(value) = Label::cast(label).and_then(|l| l.value()) else {
            return;
        };
        let Some(unit) = self.scopes.unit_of(self.scopes.current()) else {
            return;
        };
        let Some(scope) = self.scopes.get_mut(unit) else {
            return;
        };
        match scope.labels.get(&value) {
            Some(previous) => {
                let previous = previous.span;
                self.errors.push(ResolveError::duplicate_label(value, label.span(), previous));
            }
            None => {
                scope.labels.insert(value, LabelDef { stmt: stmt.id(), span: label.span() });
            }
        }
    }

    fn define_construct_name(&mut self, node: SyntaxNode<'a>) {
        let Some(named) = NamedElement::cast(node) else {
            return;
        };
        let (Some(key), Some(name)) = (named.key(), named.name()) else {
            return;
        };
        let Some(unit) = self.scopes.unit_of(self.scopes.current()) else {
            return;
        };
        let existing = self.scopes.get(unit).and_then(|s| s.construct_name(&key));
        if let Some(existing) = existing {
            let previous = self.symbols.get(existing).map_or(named.name_span(), |s| s.span);
            self.errors.push(ResolveError::duplicate(name, named.name_span(), previous));
            return;
        }
        let id = self.symbols.insert(name, SymbolKind::ConstructName, None, node.id(), unit, named.name_span());
        if let Some(scope) = self.scopes.get_mut(unit) {
            scope.construct_names.insert(key, id);
        }
        self.declared_by.entry(node.id()).or_default().push(id);
    }

    fn current_kind(&self) -> ScopeKind {
        self.scopes
            .get(self.scopes.current())
            .map_or(ScopeKind::Global, |s| s.kind)
    }

    /// Declare `named` in the current scope. The first declaration wins.
    fn declare(&mut self, named: NamedElement<'a>, kind: SymbolKind, ty: Option<TypeName>) -> Option<SymbolId> {
        let key = named.key()?;
        let name = named.name()?;
        let scope = self.scopes.current();
        let node = named.syntax().id();
        let span = named.name_span();

        if let Some(existing) = self.scopes.get(scope).and_then(|s| s.bindings.get(&key).copied()) {
            let previous = self.symbols.get(existing).map_or(span, |s| s.span);
            self.errors.push(ResolveError::duplicate(name, span, previous));
            return None;
        }
        let id = self.symbols.insert(name, kind, ty, node, scope, span);
        // Cannot fail: the binding was checked above.
        let _ = self.scopes.define(scope, key, id);
        self.declared_by.entry(node).or_default().push(id);
        trace!("declare {} {} in {:?}", kind.describe(), name, scope);
        Some(id)
    }

    /// Declare an entity, or complete an earlier entry for it when the
    /// statement is allowed to.
    fn declare_entity(
        &mut self,
        named: NamedElement<'a>,
        kind: SymbolKind,
        ty: Option<TypeName>,
        dims: Option<Vec<Option<u64>>>,
        how: Completes,
    ) -> Option<SymbolId> {
        let key = named.key()?;
        let scope = self.scopes.current();
        let existing = self.scopes.get(scope).and_then(|s| s.bindings.get(&key).copied());
        let Some(existing) = existing else {
            let id = self.declare(named, kind, ty)?;
            if let Some(symbol) = self.symbols.get_mut(id) {
                symbol.dims = dims;
            }
            return Some(id);
        };

        let symbol = self.symbols.get_mut(existing)?;
        let merges = match how {
            Completes::Type => {
                symbol.ty.is_none()
                    && matches!(
                        symbol.kind,
                        SymbolKind::DummyArgument
                            | SymbolKind::FunctionResult
                            | SymbolKind::Variable
                            | SymbolKind::ExternalProcedure
                            | SymbolKind::NamedConstant
                    )
            }
            Completes::Dimension => symbol.dims.is_none() && symbol.kind.is_data(),
            Completes::External => matches!(symbol.kind, SymbolKind::Variable | SymbolKind::DummyArgument),
            Completes::Parameter => symbol.kind == SymbolKind::Variable,
            Completes::Common => symbol.kind == SymbolKind::Variable,
        };
        if !merges {
            let previous = symbol.span;
            let name = named.name().unwrap_or_default();
            self.errors.push(ResolveError::duplicate(name, named.name_span(), previous));
            return None;
        }

        if symbol.ty.is_none() {
            symbol.ty = ty;
        }
        if symbol.dims.is_none() {
            symbol.dims = dims;
        }
        if symbol.kind == SymbolKind::Variable && kind != SymbolKind::Variable {
            symbol.kind = kind;
        }
        trace!("complete {} with {:?}", symbol.name, how);
        self.declared_by.entry(named.syntax().id()).or_default().push(existing);
        Some(existing)
    }

    /// Give untyped data entities their implicit type, and functions the
    /// type of their result.
    fn finish_types(&mut self) {
        for index in 0..self.symbols.len() {
            let id = SymbolId(index as u32);
            let Some(symbol) = self.symbols.get(id).filter(|s| s.ty.is_none() && s.kind.is_data()) else {
                continue;
            };
            let (name, span) = (symbol.name.clone(), symbol.span);
            match self.implicit_type(symbol.scope, &name) {
                Some(Some(ty)) => self.set_type(id, ty),
                Some(None) => self.errors.push(ResolveError::no_implicit_type(name, span)),
                None => {}
            }
        }
        for index in 0..self.function_results.len() {
            let (function, result) = self.function_results[index];
            if let Some(ty) = self.symbols.get(result).and_then(|s| s.ty.clone()) {
                if self.symbols.get(function).is_some_and(|s| s.ty.is_none()) {
                    self.set_type(function, ty);
                }
            }
        }
        // Procedures declared only by `external` or an interface body.
        for index in 0..self.symbols.len() {
            let id = SymbolId(index as u32);
            let Some(symbol) = self
                .symbols
                .get(id)
                .filter(|s| s.ty.is_none() && s.kind == SymbolKind::ExternalProcedure)
            else {
                continue;
            };
            if let Some(Some(ty)) = self.implicit_type(symbol.scope, &symbol.name) {
                self.set_type(id, ty);
            }
        }
    }

    /// `None` outside a program unit; `Some(None)` under `implicit none`.
    fn implicit_type(&self, scope: ScopeId, name: &str) -> Option<Option<TypeName>> {
        let unit = self.scopes.unit_of(scope)?;
        Some(self.scopes.get(unit)?.implicit.type_for(name))
    }

    fn set_type(&mut self, id: SymbolId, ty: TypeName) {
        if let Some(symbol) = self.symbols.get_mut(id) {
            symbol.ty = Some(ty);
        }
    }

    // =========================================================================
    // Pass 2: Link imports
    // =========================================================================

    fn link_imports(&mut self) {
        let mut errors = Vec::new();
        for index in 0..self.scopes.len() {
            let Some(scope) = self.scopes.get_mut(ScopeId(index as u32)) else {
                continue;
            };
            for import in &mut scope.imports {
                import.target = self.modules.get(&import.module).copied();
                if import.target.is_none() && !import.intrinsic {
                    errors.push(ResolveError::unknown_module(import.module.as_str(), import.span));
                }
            }
        }
        self.errors.extend(errors);
    }

    // =========================================================================
    // Pass 3: Resolve use sites
    // =========================================================================

    fn resolve_node(&mut self, node: SyntaxNode<'a>) -> Result<(), Cancelled> {
        let kind = node.kind();
        if kind.is_statement() {
            self.check_cancel()?;
        }
        let saved = self.current;
        if let Some(&scope) = self.scope_nodes.get(&node.id()) {
            self.current = scope;
        }
        let result = self.resolve_kind(node, kind);
        self.current = saved;
        result
    }

    fn resolve_kind(&mut self, node: SyntaxNode<'a>, kind: NodeKind) -> Result<(), Cancelled> {
        match kind {
            NodeKind::NameRef => {
                if !self.resolutions.contains_key(&node.id()) {
                    self.resolve_name(node, NameUse::Value);
                }
                return Ok(());
            }
            NodeKind::LabelRef => {
                self.resolve_label(node);
                return Ok(());
            }
            NodeKind::ConstructNameRef => {
                self.resolve_construct_name(node);
                return Ok(());
            }
            NodeKind::CommonBlockRef => {
                self.resolve_common_block_ref(node);
                return Ok(());
            }
            NodeKind::EndStmt => {
                self.resolve_end_name(node);
                return Ok(());
            }
            NodeKind::UseStmt => {
                self.resolve_use(node);
                return Ok(());
            }
            NodeKind::CallStmt => {
                if let Some(target) = CallStmt::cast(node).and_then(|c| c.callee()).and_then(callee_name) {
                    self.resolve_name(target, NameUse::CallTarget);
                }
            }
            NodeKind::CallExpr => {
                let callee = CallExpr::cast(node).and_then(|c| c.callee());
                if let Some(callee) = callee.filter(|c| c.kind() == NodeKind::NameRef) {
                    if !self.resolutions.contains_key(&callee.id()) {
                        self.resolve_name(callee, NameUse::Callee);
                    }
                }
            }
            NodeKind::TypeSpec => {
                if let Some(name) = TypeSpec::cast(node).and_then(|t| t.derived_name()) {
                    self.resolve_name(name.syntax(), NameUse::Type);
                }
            }
            NodeKind::DerivedTypeStmt => {
                for name in node.children_of_kind(NodeKind::NameRef) {
                    self.resolve_name(name, NameUse::Type);
                }
            }
            NodeKind::ModuleProcedureStmt => {
                for name in node.children_of_kind(NodeKind::NameRef) {
                    self.resolve_name(name, NameUse::Procedure);
                }
            }
            _ => {}
        }
        for child in node.child_nodes() {
            self.resolve_node(child)?;
        }
        Ok(())
    }

    fn resolve_name(&mut self, node: SyntaxNode<'a>, usage: NameUse) {
        let Some(name_ref) = NameRef::cast(node) else {
            return;
        };
        let (Some(key), Some(text)) = (name_ref.key(), name_ref.text()) else {
            return;
        };
        let scope = self.current;

        let found = self
            .scopes
            .lookup(&key, scope)
            .or_else(|| self.scopes.imported(&key, scope).first().copied());
        if let Some(id) = found {
            self.bind(node, id);
            return;
        }

        let wanted = match usage {
            NameUse::Callee => Some(IntrinsicKind::Function),
            NameUse::CallTarget => Some(IntrinsicKind::Subroutine),
            _ => None,
        };
        if let Some(intrinsic) = intrinsic(&key).filter(|i| Some(i.kind) == wanted) {
            let id = self.intrinsic_symbol(intrinsic.name, fixed_result(intrinsic.result), node.id(), node.span());
            self.bind(node, id);
            return;
        }

        match usage {
            NameUse::CallTarget => {
                debug!("call to undeclared procedure {}", text);
                self.errors.push(ResolveError::unresolved_call(text, node.span()));
                self.unresolved(node);
            }
            NameUse::Type | NameUse::Procedure => {
                self.errors.push(ResolveError::undefined(text, node.span()));
                self.unresolved(node);
            }
            NameUse::Value | NameUse::Callee => {
                if self.scopes.has_opaque_import(scope) {
                    debug!("{} may come from a module outside the file", text);
                    self.unresolved(node);
                    return;
                }
                let rules = self
                    .scopes
                    .unit_of(scope)
                    .and_then(|u| self.scopes.get(u))
                    .filter(|s| !s.implicit.is_none())
                    .map(|s| (s.id, s.implicit.type_for(text)));
                match rules {
                    Some((unit, ty)) => {
                        let kind = if usage == NameUse::Callee {
                            SymbolKind::ExternalProcedure
                        } else {
                            SymbolKind::Variable
                        };
                        let id = self.declare_implicit(unit, text, key, kind, ty, node);
                        self.bind(node, id);
                    }
                    _ => {
                        debug!("undefined name {}", text);
                        self.errors.push(ResolveError::undefined(text, node.span()));
                        self.unresolved(node);
                    }
                }
            }
        }
    }

    fn declare_implicit(
        &mut self,
        unit: ScopeId,
        name: &str,
        key: CompactString,
        kind: SymbolKind,
        ty: Option<TypeName>,
        node: SyntaxNode<'a>,
    ) -> SymbolId {
        let id = self.symbols.insert(name, kind, ty, node.id(), unit, node.span());
        if let Some(symbol) = self.symbols.get_mut(id) {
            symbol.implicit = true;
        }
        let _ = self.scopes.define(unit, key, id);
        self.declared_by.entry(node.id()).or_default().push(id);
        trace!("implicitly declare {} in {:?}", name, unit);
        id
    }

    fn intrinsic_symbol(&mut self, name: &str, ty: Option<TypeName>, node: NodeId, span: Span) -> SymbolId {
        if let Some(id) = self.scopes.lookup(name, self.intrinsics) {
            return id;
        }
        let id = self.symbols.insert(name, SymbolKind::Intrinsic, ty, node, self.intrinsics, span);
        let _ = self.scopes.define(self.intrinsics, name.into(), id);
        id
    }

    fn bind(&mut self, node: SyntaxNode<'a>, symbol: SymbolId) {
        self.resolutions.insert(node.id(), Resolution::Bound(symbol));
    }

    fn unresolved(&mut self, node: SyntaxNode<'a>) {
        self.resolutions.insert(node.id(), Resolution::Unresolved);
    }

    fn resolve_label(&mut self, node: SyntaxNode<'a>) {
        let Some(value) = LabelRef::cast(node).and_then(|l| l.value()) else {
            return;
        };
        let target = self
            .scopes
            .unit_of(self.current)
            .and_then(|u| self.scopes.get(u))
            .and_then(|s| s.label(value));
        match target {
            Some(def) => {
                self.label_targets.insert(node.id(), def.stmt);
            }
            None => self.errors.push(ResolveError::undefined_label(value, node.span())),
        }
    }

    fn resolve_construct_name(&mut self, node: SyntaxNode<'a>) {
        let Some(token) = node.first_token(TokenKind::Name) else {
            return;
        };
        let key = token.token().key();
        let target = self
            .scopes
            .unit_of(self.current)
            .and_then(|u| self.scopes.get(u))
            .and_then(|s| s.construct_name(&key));
        match target {
            Some(id) => self.bind(node, id),
            None => {
                self.errors.push(ResolveError::undefined_construct(token.text(), token.span()));
                self.unresolved(node);
            }
        }
    }

    fn resolve_common_block_ref(&mut self, node: SyntaxNode<'a>) {
        let Some(token) = node.first_token(TokenKind::Name) else {
            return;
        };
        let key = token.token().key();
        let target = self
            .scopes
            .unit_of(self.current)
            .and_then(|u| self.scopes.get(u))
            .and_then(|s| s.common_block(&key));
        match target {
            Some(id) => self.bind(node, id),
            None => {
                self.errors.push(ResolveError::undefined(token.text(), token.span()));
                self.unresolved(node);
            }
        }
    }

    /// `end subroutine name` refers to the unit it closes.
    fn resolve_end_name(&mut self, node: SyntaxNode<'a>) {
        let Some(name_ref) = EndStmt::cast(node).and_then(|e| e.name_ref()) else {
            return;
        };
        let unit = node.parent().and_then(|p| self.unit_symbols.get(&p.id()).copied());
        let matches = unit
            .and_then(|id| self.symbols.get(id))
            .is_some_and(|s| name_ref.key().is_some_and(|k| k == s.key()));
        match unit {
            Some(id) if matches => self.bind(name_ref.syntax(), id),
            _ => self.unresolved(name_ref.syntax()),
        }
    }

    /// Names in `only:` lists and rename targets refer to module entities.
    fn resolve_use(&mut self, node: SyntaxNode<'a>) {
        let Some(stmt) = UseStmt::cast(node) else {
            return;
        };
        let Some(module) = stmt.module_name() else {
            return;
        };
        let module_key = module.token().key();
        let target = self.modules.get(&module_key).copied();
        let module_symbol = self
            .scopes
            .get(ScopeId::GLOBAL)
            .and_then(|g| g.bindings.get(&module_key).copied())
            .filter(|_| target.is_some());
        if let (Some(module_ref), Some(symbol)) = (node.first_child(NodeKind::ModuleRef), module_symbol) {
            self.bind(module_ref, symbol);
        }

        for name in node.descendants_of_kind(NodeKind::NameRef) {
            let Some(key) = NameRef::cast(name).and_then(|n| n.key()) else {
                continue;
            };
            let Some(target) = target else {
                self.unresolved(name);
                continue;
            };
            match self.scopes.exported(target, &key) {
                Some(id) => self.bind(name, id),
                None => {
                    self.errors.push(ResolveError::not_exported(name.text(), module.text(), name.span()));
                    self.unresolved(name);
                }
            }
        }
    }
}

/// `point` in `type(point)` or the base keyword of an intrinsic type.
fn type_name(spec: TypeSpec<'_>) -> Option<TypeName> {
    let keyword = spec.keyword()?;
    if keyword == "type" {
        return spec.derived_name().and_then(|n| n.key()).map(TypeName::Derived);
    }
    TypeName::from_keyword(&keyword)
}

fn fixed_result(result: IntrinsicResult) -> Option<TypeName> {
    Some(match result {
        IntrinsicResult::Integer => TypeName::Integer,
        IntrinsicResult::Real => TypeName::Real,
        IntrinsicResult::Double => TypeName::DoublePrecision,
        IntrinsicResult::Complex => TypeName::Complex,
        IntrinsicResult::Logical => TypeName::Logical,
        IntrinsicResult::Character => TypeName::Character,
        IntrinsicResult::FirstArgument | IntrinsicResult::Element | IntrinsicResult::NoResult => return None,
    })
}

fn rename_pair(rename: Rename<'_>) -> Option<(CompactString, CompactString)> {
    let local = NamedElement::cast(rename.syntax())?.key()?;
    let remote = rename.remote()?.key()?;
    Some((local, remote))
}

/// The procedure name of a `call` designator, when it is a plain name.
fn callee_name(callee: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    match callee.kind() {
        NodeKind::NameRef => Some(callee),
        NodeKind::CallExpr => CallExpr::cast(callee)
            .and_then(|c| c.callee())
            .filter(|n| n.kind() == NodeKind::NameRef),
        _ => None,
    }
}
