// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Type checker implementation.

use std::collections::HashMap;

use fortran_resolve::{intrinsic, IntrinsicResult, ResolvedProgram, Resolution, Symbol, SymbolKind, TypeName};
use fortran_syntax::ast::{
    ArgList, ArrayConstructor, AssignmentStmt, BinaryExpr, CallExpr, ComponentExpr, ImpliedDo, Literal, LiteralKind,
    ParenExpr, TypeDeclStmt, UnaryExpr,
};
use fortran_syntax::{
    AstNode, BinaryOp, CancelCheck, Cancelled, NodeId, NodeKind, Span, SyntaxNode, SyntaxTree, UnaryOp,
};
use log::{debug, trace};

use crate::error::TypeError;
use crate::types::Ty;

/// The result of type checking.
#[derive(Debug, Default)]
pub struct TypedProgram {
    /// Computed type for each expression node.
    pub node_types: HashMap<NodeId, Ty>,
    /// Warnings in source order.
    pub errors: Vec<TypeError>,
}

impl TypedProgram {
    pub fn type_of(&self, node: NodeId) -> Option<&Ty> {
        self.node_types.get(&node)
    }
}

/// The type checker.
pub struct TypeChecker<'a> {
    resolved: &'a ResolvedProgram,
    cancel: &'a dyn CancelCheck,
    node_types: HashMap<NodeId, Ty>,
    errors: Vec<TypeError>,
}

impl<'a> TypeChecker<'a> {
    pub fn new(resolved: &'a ResolvedProgram, cancel: &'a dyn CancelCheck) -> Self {
        Self {
            resolved,
            cancel,
            node_types: HashMap::new(),
            errors: Vec::new(),
        }
    }

    /// Check every statement of `tree`.
    pub fn check(mut self, tree: &SyntaxTree) -> Result<TypedProgram, Cancelled> {
        self.run(tree)?;
        Ok(self.into_program())
    }

    /// Check every statement, polling for cancellation before each one.
    /// After cancellation the tables hold whatever was typed so far.
    pub fn run(&mut self, tree: &SyntaxTree) -> Result<(), Cancelled> {
        self.visit(tree.root())?;
        debug!("typed {} expressions with {} warnings", self.node_types.len(), self.errors.len());
        Ok(())
    }

    pub fn into_program(self) -> TypedProgram {
        TypedProgram {
            node_types: self.node_types,
            errors: self.errors,
        }
    }

    fn visit(&mut self, node: SyntaxNode<'_>) -> Result<(), Cancelled> {
        let kind = node.kind();
        if kind.is_expression() {
            if !self.node_types.contains_key(&node.id()) {
                self.infer(node, None);
            }
            return Ok(());
        }
        if kind.is_statement() && self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        match kind {
            NodeKind::TypeDeclStmt => self.check_declaration(node),
            NodeKind::AssignmentStmt => self.check_assignment(node),
            _ => {}
        }
        for child in node.child_nodes() {
            self.visit(child)?;
        }
        Ok(())
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn check_declaration(&mut self, node: SyntaxNode<'_>) {
        let Some(stmt) = TypeDeclStmt::cast(node) else {
            return;
        };
        for entity in stmt.entities() {
            let Some(init) = entity.initializer() else {
                continue;
            };
            let expected = self
                .resolved
                .symbols_declared_by(entity.syntax().id())
                .first()
                .and_then(|id| self.resolved.symbol(*id))
                .map_or(Ty::Unknown, Ty::of_symbol);
            self.check_value(&expected, init, trimmed_span(entity.syntax()));
        }
    }

    fn check_assignment(&mut self, node: SyntaxNode<'_>) {
        let Some(stmt) = AssignmentStmt::cast(node) else {
            return;
        };
        let (Some(target), Some(value)) = (stmt.target(), stmt.value()) else {
            return;
        };
        let expected = self.infer(target, None);
        if expected.is_unknown() {
            return;
        }
        self.check_value(&expected, value, trimmed_span(node));
    }

    fn check_value(&mut self, expected: &Ty, value: SyntaxNode<'_>, span: Span) {
        let found = self.infer(value, Some(expected));
        // Array constructors report their own elements.
        if value.kind() == NodeKind::ArrayConstructor || expected.accepts(&found) {
            return;
        }
        let expected = if found.is_array() { expected.clone() } else { expected.element().clone() };
        trace!("mismatch: {} <- {}", expected, found);
        self.errors.push(TypeError::Mismatch { expected, found, span });
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Infer the type of an expression. `expected` is the type of the
    /// entity the value is assigned to, if any.
    fn infer(&mut self, node: SyntaxNode<'_>, expected: Option<&Ty>) -> Ty {
        let ty = match node.kind() {
            NodeKind::Literal => literal_type(node),
            NodeKind::ComplexLiteral => Ty::Complex,
            NodeKind::ParenExpr => match ParenExpr::cast(node).and_then(|p| p.inner()) {
                Some(inner) => self.infer(inner, None),
                None => Ty::Unknown,
            },
            NodeKind::UnaryExpr => self.infer_unary(node),
            NodeKind::BinaryExpr => self.infer_binary(node),
            NodeKind::NameRef => self.name_type(node),
            NodeKind::CallExpr => self.infer_call(node),
            NodeKind::ComponentExpr => self.infer_component(node),
            NodeKind::ArrayConstructor => self.infer_constructor(node, expected),
            NodeKind::ImpliedDo => self.infer_implied_do(node),
            _ => {
                // Expressions hold no statements, so nothing here polls.
                for child in node.child_nodes() {
                    let _ = self.visit(child);
                }
                Ty::Unknown
            }
        };
        self.node_types.insert(node.id(), ty.clone());
        ty
    }

    fn symbol_of(&self, node: SyntaxNode<'_>) -> Option<&'a Symbol> {
        let id = self.resolved.resolution(node.id()).and_then(Resolution::symbol)?;
        self.resolved.symbol(id)
    }

    fn name_type(&self, node: SyntaxNode<'_>) -> Ty {
        match self.symbol_of(node) {
            Some(symbol) if symbol.kind.is_data() => Ty::of_symbol(symbol),
            _ => Ty::Unknown,
        }
    }

    fn infer_unary(&mut self, node: SyntaxNode<'_>) -> Ty {
        let Some(expr) = UnaryExpr::cast(node) else {
            return Ty::Unknown;
        };
        let operand = match expr.operand() {
            Some(operand) => self.infer(operand, None),
            None => return Ty::Unknown,
        };
        let (op, fits) = match expr.op() {
            Some(UnaryOp::Plus) => ("unary plus", operand.element().is_numeric()),
            Some(UnaryOp::Minus) => ("negation", operand.element().is_numeric()),
            Some(UnaryOp::Not) => ("logical negation", *operand.element() == Ty::Logical),
            Some(UnaryOp::Defined) | None => return Ty::Unknown,
        };
        if fits || operand.is_unknown() || matches!(operand.element(), Ty::Derived(_)) {
            return if fits { operand } else { Ty::Unknown };
        }
        self.errors.push(TypeError::MalformedUnary { op, operand, span: trimmed_span(node) });
        Ty::Unknown
    }

    fn infer_binary(&mut self, node: SyntaxNode<'_>) -> Ty {
        let Some(expr) = BinaryExpr::cast(node) else {
            return Ty::Unknown;
        };
        let left = match expr.lhs() {
            Some(lhs) => self.infer(lhs, None),
            None => Ty::Unknown,
        };
        let right = match expr.rhs() {
            Some(rhs) => self.infer(rhs, None),
            None => Ty::Unknown,
        };
        let op = match expr.op() {
            Some(BinaryOp::Defined) | None => return Ty::Unknown,
            Some(op) => op,
        };
        // Derived types may overload intrinsic operators.
        let opaque = |ty: &Ty| ty.element().is_unknown() || matches!(ty.element(), Ty::Derived(_));
        if opaque(&left) || opaque(&right) {
            return Ty::Unknown;
        }
        match binary_result(op, &left, &right) {
            Some(ty) => ty,
            None => {
                self.errors.push(TypeError::MalformedBinary {
                    op: op.describe(),
                    left,
                    right,
                    span: trimmed_span(node),
                });
                Ty::Unknown
            }
        }
    }

    /// A function reference or an array element reference.
    fn infer_call(&mut self, node: SyntaxNode<'_>) -> Ty {
        let Some(call) = CallExpr::cast(node) else {
            return Ty::Unknown;
        };
        let args = call.arg_list().map(|list| self.infer_args(list)).unwrap_or_default();
        let Some(callee) = call.callee() else {
            return Ty::Unknown;
        };
        if callee.kind() != NodeKind::NameRef {
            self.infer(callee, None);
            return Ty::Unknown;
        }
        let Some(symbol) = self.symbol_of(callee) else {
            return Ty::Unknown;
        };
        let section = args.iter().any(|(kind, _)| *kind == NodeKind::SectionSubscript);
        match symbol.kind {
            kind if kind.is_data() => match Ty::of_symbol(symbol) {
                Ty::Array { elem, .. } if section => Ty::array(*elem, None),
                Ty::Array { elem, .. } => *elem,
                // A substring.
                Ty::Character => Ty::Character,
                _ => Ty::Unknown,
            },
            SymbolKind::Function | SymbolKind::ExternalProcedure => {
                symbol.ty.as_ref().map_or(Ty::Unknown, Ty::from_type_name)
            }
            SymbolKind::Intrinsic => {
                let first = args.first().map(|(_, ty)| ty);
                intrinsic(&symbol.key()).map_or(Ty::Unknown, |i| intrinsic_result(i.result, first))
            }
            _ => Ty::Unknown,
        }
    }

    fn infer_args(&mut self, list: ArgList<'_>) -> Vec<(NodeKind, Ty)> {
        list.args()
            .filter_map(|arg| arg.value())
            .map(|value| (value.kind(), self.infer(value, None)))
            .collect()
    }

    fn infer_component(&mut self, node: SyntaxNode<'_>) -> Ty {
        let Some(expr) = ComponentExpr::cast(node) else {
            return Ty::Unknown;
        };
        let base = match expr.base() {
            Some(base) => self.infer(base, None),
            None => return Ty::Unknown,
        };
        let (Ty::Derived(type_name), Some(component)) = (base.element(), expr.component()) else {
            return Ty::Unknown;
        };
        let scope = self.resolved.scope_of(node);
        let ty = self
            .resolved
            .component(&TypeName::Derived(type_name.clone()), component.text(), scope)
            .map_or(Ty::Unknown, Ty::of_symbol);
        match (&base, ty) {
            (_, Ty::Unknown) => Ty::Unknown,
            (Ty::Array { size, .. }, ty) if !ty.is_array() => Ty::array(ty, *size),
            (_, ty) => ty,
        }
    }

    fn infer_constructor(&mut self, node: SyntaxNode<'_>, expected: Option<&Ty>) -> Ty {
        let Some(constructor) = ArrayConstructor::cast(node) else {
            return Ty::Unknown;
        };
        let items: Vec<_> = constructor.items().map(|item| (item, self.infer(item, None))).collect();

        let mut elem: Option<Ty> = None;
        let mut size = Some(0u64);
        for (_, ty) in &items {
            let (item_elem, item_size) = match ty {
                Ty::Array { elem, size } => (elem.as_ref().clone(), *size),
                other => (other.clone(), Some(1)),
            };
            elem = Some(match elem {
                Some(prev) => prev.unify(&item_elem),
                None => item_elem,
            });
            size = size.zip(item_size).map(|(a, b)| a + b);
        }
        let elem = elem.unwrap_or(Ty::Unknown);
        let ty = Ty::array(elem, size);

        let Some(expected) = expected.filter(|e| !e.is_unknown()) else {
            return ty;
        };
        if !expected.is_array() {
            self.errors.push(TypeError::Mismatch {
                expected: expected.clone(),
                found: ty.clone(),
                span: trimmed_span(node),
            });
            return ty;
        }
        let base = expected.element();
        for (item, item_ty) in &items {
            let element = item_ty.element();
            if !base.accepts(element) {
                self.errors.push(TypeError::ArrayConstructorElement {
                    expected: base.clone(),
                    element: element.clone(),
                    span: trimmed_span(*item),
                });
            }
        }
        if let (Ty::Array { size: Some(want), .. }, Some(got)) = (expected, size) {
            if *want != got {
                self.errors.push(TypeError::Mismatch {
                    expected: expected.clone(),
                    found: ty.clone(),
                    span: trimmed_span(node),
                });
            }
        }
        ty
    }

    /// `(item, i = start, end [, stride])` inside an array constructor.
    fn infer_implied_do(&mut self, node: SyntaxNode<'_>) -> Ty {
        let Some(implied) = ImpliedDo::cast(node) else {
            return Ty::Unknown;
        };
        let mut trips = None;
        if let Some(control) = implied.loop_control() {
            if let Some(var) = control.variable() {
                self.infer(var.syntax(), None);
            }
            let bounds: Vec<_> = control.bounds().collect();
            for bound in &bounds {
                let ty = self.infer(*bound, None);
                if !ty.is_unknown() && ty != Ty::Integer {
                    self.errors.push(TypeError::ImpliedDoBound { found: ty, span: trimmed_span(*bound) });
                }
            }
            let literal = |n: &SyntaxNode<'_>| Literal::cast(*n).and_then(|l| l.int_value());
            trips = match bounds.as_slice() {
                [start, end] => literal(start).zip(literal(end)).map(|(s, e)| trip_count(s, e, 1)),
                [start, end, stride] => match (literal(start), literal(end), literal(stride)) {
                    (Some(s), Some(e), Some(step)) if step > 0 => Some(trip_count(s, e, step)),
                    _ => None,
                },
                _ => None,
            };
        }
        let items: Vec<Ty> = implied.items().map(|item| self.infer(item, None)).collect();
        let elem = items
            .iter()
            .map(|ty| ty.element().clone())
            .reduce(|a, b| a.unify(&b))
            .unwrap_or(Ty::Unknown);
        let per_trip = items
            .iter()
            .try_fold(0u64, |acc, ty| match ty {
                Ty::Array { size, .. } => size.map(|s| acc + s),
                _ => Some(acc + 1),
            });
        Ty::array(elem, trips.zip(per_trip).map(|(t, p)| t * p))
    }
}

fn literal_type(node: SyntaxNode<'_>) -> Ty {
    match Literal::cast(node).and_then(|l| l.kind()) {
        Some(LiteralKind::Int) => Ty::Integer,
        Some(LiteralKind::Real | LiteralKind::Double) => Ty::Real,
        Some(LiteralKind::String) => Ty::Character,
        Some(LiteralKind::Logical) => Ty::Logical,
        None => Ty::Unknown,
    }
}

fn trip_count(start: u64, end: u64, step: u64) -> u64 {
    if end < start {
        0
    } else {
        (end - start) / step + 1
    }
}

/// Result of a binary operator, elementwise over arrays. `None` when the
/// operands do not fit the operator.
fn binary_result(op: BinaryOp, left: &Ty, right: &Ty) -> Option<Ty> {
    match (left, right) {
        (Ty::Array { elem: a, size: sa }, Ty::Array { elem: b, size: sb }) => {
            if let (Some(sa), Some(sb)) = (sa, sb) {
                if sa != sb {
                    return None;
                }
            }
            Some(Ty::array(scalar_result(op, a, b)?, sa.or(*sb)))
        }
        (Ty::Array { elem, size }, scalar) => Some(Ty::array(scalar_result(op, elem, scalar)?, *size)),
        (scalar, Ty::Array { elem, size }) => Some(Ty::array(scalar_result(op, scalar, elem)?, *size)),
        _ => scalar_result(op, left, right),
    }
}

fn scalar_result(op: BinaryOp, left: &Ty, right: &Ty) -> Option<Ty> {
    if op.is_arithmetic() {
        let rank = left.numeric_rank()?.max(right.numeric_rank()?);
        return Some(match rank {
            0 => Ty::Integer,
            1 => Ty::Real,
            _ => Ty::Complex,
        });
    }
    if op.is_relational() {
        let comparable = (left.is_numeric() && right.is_numeric())
            || (*left == Ty::Character && *right == Ty::Character);
        return comparable.then_some(Ty::Logical);
    }
    if op.is_logical() {
        return (*left == Ty::Logical && *right == Ty::Logical).then_some(Ty::Logical);
    }
    match op {
        BinaryOp::Concat => (*left == Ty::Character && *right == Ty::Character).then_some(Ty::Character),
        _ => None,
    }
}

fn intrinsic_result(result: IntrinsicResult, first: Option<&Ty>) -> Ty {
    match result {
        IntrinsicResult::Integer => Ty::Integer,
        IntrinsicResult::Real | IntrinsicResult::Double => Ty::Real,
        IntrinsicResult::Complex => Ty::Complex,
        IntrinsicResult::Logical => Ty::Logical,
        IntrinsicResult::Character => Ty::Character,
        IntrinsicResult::FirstArgument => first.cloned().unwrap_or(Ty::Unknown),
        IntrinsicResult::Element => first.map_or(Ty::Unknown, |ty| ty.element().clone()),
        IntrinsicResult::NoResult => Ty::Unknown,
    }
}

/// The span of a node's significant text: no surrounding trivia, no
/// statement label and no terminator.
fn trimmed_span(node: SyntaxNode<'_>) -> Span {
    let mut tokens = node
        .tokens()
        .filter(|t| !t.is_trivia() && !t.kind().is_terminator() && t.parent().kind() != NodeKind::Label);
    match tokens.next() {
        Some(first) => tokens.fold(first.span(), |span, t| span.cover(t.span())),
        None => node.span(),
    }
}
