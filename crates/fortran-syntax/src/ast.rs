// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Typed views over untyped syntax nodes.
//!
//! Each view wraps a [`SyntaxNode`] of a known kind and offers structural
//! accessors. Accessors return `Option` because recovery may have left the
//! part missing.

use compact_str::CompactString;

use crate::kind::NodeKind;
use crate::ops::{BinaryOp, UnaryOp};
use crate::token::TokenKind;
use crate::tree::{SyntaxNode, SyntaxToken};

/// A typed view that can be recovered from an untyped node.
pub trait AstNode<'t>: Sized + Copy {
    fn can_cast(kind: NodeKind) -> bool;

    fn cast(node: SyntaxNode<'t>) -> Option<Self>;

    fn syntax(&self) -> SyntaxNode<'t>;
}

macro_rules! ast_node {
    ($($(#[$meta:meta])* $name:ident => $($kind:ident)|+;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct $name<'t>(SyntaxNode<'t>);

            impl<'t> AstNode<'t> for $name<'t> {
                fn can_cast(kind: NodeKind) -> bool {
                    matches!(kind, $(NodeKind::$kind)|+)
                }

                fn cast(node: SyntaxNode<'t>) -> Option<Self> {
                    Self::can_cast(node.kind()).then_some(Self(node))
                }

                fn syntax(&self) -> SyntaxNode<'t> {
                    self.0
                }
            }
        )*
    };
}

ast_node! {
    SourceFile => Root;
    /// Any program unit: main program, module, procedure or block data.
    ProgramUnit => MainProgram | Module | Subroutine | Function | BlockData;
    /// A statement that opens a unit or a derived type and names it.
    NameStmt => ProgramStmt | ModuleStmt | SubroutineStmt | FunctionStmt | BlockDataStmt | DerivedTypeStmt;
    FunctionStmt => FunctionStmt;
    SubroutineStmt => SubroutineStmt;
    DummyArg => DummyArg;
    ResultSpec => ResultSpec;
    EndStmt => EndStmt;
    UseStmt => UseStmt;
    Rename => Rename;
    ImplicitStmt => ImplicitStmt;
    ImplicitSpec => ImplicitSpec;
    TypeDeclStmt => TypeDeclStmt;
    TypeSpec => TypeSpec;
    AttrSpec => AttrSpec;
    EntityDecl => EntityDecl;
    ArraySpec => ArraySpec;
    NamedConstantDef => NamedConstantDef;
    CommonBlock => CommonBlock;
    AttrStmt => AttrStmt;
    NameRef => NameRef;
    Label => Label;
    LabelRef => LabelRef;
    ConstructName => ConstructName;
    ConstructNameRef => ConstructNameRef;
    AssignmentStmt => AssignmentStmt | PointerAssignmentStmt;
    CallStmt => CallStmt;
    DoStmt => DoStmt;
    LoopControl => LoopControl;
    Literal => Literal;
    BinaryExpr => BinaryExpr;
    UnaryExpr => UnaryExpr;
    CallExpr => CallExpr;
    ArgList => ArgList;
    Arg => Arg;
    ComponentExpr => ComponentExpr;
    ArrayConstructor => ArrayConstructor;
    ImpliedDo => ImpliedDo;
    ParenExpr => ParenExpr;
}

/// Expression children of a node, in order.
pub fn expr_children<'t>(node: SyntaxNode<'t>) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
    node.child_nodes().filter(|n| n.kind().is_expression())
}

fn name_token<'t>(node: SyntaxNode<'t>) -> Option<SyntaxToken<'t>> {
    node.first_token(TokenKind::Name)
}

fn lower(text: &str) -> CompactString {
    text.to_ascii_lowercase().into()
}

// ============================================================================
// Units
// ============================================================================

impl<'t> SourceFile<'t> {
    pub fn units(&self) -> impl Iterator<Item = ProgramUnit<'t>> + 't {
        self.0.child_nodes().filter_map(ProgramUnit::cast)
    }
}

impl<'t> ProgramUnit<'t> {
    /// The opening statement; absent for a main program without `program`.
    pub fn header(&self) -> Option<NameStmt<'t>> {
        self.0.child_nodes().find_map(NameStmt::cast)
    }

    pub fn end_stmt(&self) -> Option<EndStmt<'t>> {
        self.0.child_nodes().find_map(EndStmt::cast)
    }

    /// Statements and constructs between the header and `contains`/`end`.
    pub fn body(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.0
            .child_nodes()
            .skip_while(|n| n.kind().is_name_stmt())
            .take_while(|n| !matches!(n.kind(), NodeKind::ContainsStmt | NodeKind::EndStmt))
            .filter(|n| !n.kind().is_program_unit())
    }

    /// Procedures after `contains`.
    pub fn contained(&self) -> impl Iterator<Item = ProgramUnit<'t>> + 't {
        self.0.child_nodes().filter_map(ProgramUnit::cast)
    }
}

impl<'t> FunctionStmt<'t> {
    pub fn dummy_args(&self) -> impl Iterator<Item = DummyArg<'t>> + 't {
        self.0
            .first_child(NodeKind::DummyArgList)
            .into_iter()
            .flat_map(|list| list.child_nodes().filter_map(DummyArg::cast))
    }

    pub fn result(&self) -> Option<ResultSpec<'t>> {
        self.0.child_nodes().find_map(ResultSpec::cast)
    }

    /// `integer` in `integer function f(x)`.
    pub fn prefix_type(&self) -> Option<TypeSpec<'t>> {
        self.0
            .first_child(NodeKind::Prefix)
            .and_then(|p| p.child_nodes().find_map(TypeSpec::cast))
    }
}

impl<'t> SubroutineStmt<'t> {
    pub fn dummy_args(&self) -> impl Iterator<Item = DummyArg<'t>> + 't {
        self.0
            .first_child(NodeKind::DummyArgList)
            .into_iter()
            .flat_map(|list| list.child_nodes().filter_map(DummyArg::cast))
    }
}

impl DummyArg<'_> {
    /// `*` alternate-return placeholder.
    pub fn is_alternate_return(&self) -> bool {
        self.0.first_token(TokenKind::Star).is_some()
    }
}

impl<'t> EndStmt<'t> {
    /// Name repeated after `end subroutine`, if any.
    pub fn name_ref(&self) -> Option<NameRef<'t>> {
        self.0.child_nodes().find_map(NameRef::cast)
    }
}

// ============================================================================
// Specification statements
// ============================================================================

impl<'t> UseStmt<'t> {
    pub fn module_name(&self) -> Option<SyntaxToken<'t>> {
        self.0.first_child(NodeKind::ModuleRef).and_then(name_token)
    }

    pub fn is_intrinsic(&self) -> bool {
        self.0.child_tokens().any(|t| t.token().is_keyword("intrinsic"))
    }

    pub fn only_list(&self) -> Option<SyntaxNode<'t>> {
        self.0.first_child(NodeKind::OnlyList)
    }

    /// Renames outside an `only:` list.
    pub fn renames(&self) -> impl Iterator<Item = Rename<'t>> + 't {
        self.0.child_nodes().filter_map(Rename::cast)
    }
}

impl<'t> Rename<'t> {
    /// The module-side name after `=>`.
    pub fn remote(&self) -> Option<NameRef<'t>> {
        self.0.child_nodes().find_map(NameRef::cast)
    }
}

impl<'t> ImplicitStmt<'t> {
    /// `implicit none`, possibly with a `(type, external)` list.
    pub fn is_none(&self) -> bool {
        self.0.first_child(NodeKind::ImplicitSpec).is_none()
            && self.0.child_tokens().any(|t| t.token().is_keyword("none"))
    }

    pub fn specs(&self) -> impl Iterator<Item = ImplicitSpec<'t>> + 't {
        self.0.child_nodes().filter_map(ImplicitSpec::cast)
    }
}

impl<'t> ImplicitSpec<'t> {
    pub fn type_spec(&self) -> Option<TypeSpec<'t>> {
        self.0.child_nodes().find_map(TypeSpec::cast)
    }

    /// Inclusive letter ranges, lowercased.
    pub fn letters(&self) -> Vec<(char, char)> {
        self.0
            .children_of_kind(NodeKind::LetterRange)
            .filter_map(|range| {
                let mut names = range.child_tokens().filter(|t| t.kind() == TokenKind::Name);
                let first = single_letter(names.next()?.text())?;
                let last = match names.next() {
                    Some(t) => single_letter(t.text())?,
                    None => first,
                };
                Some((first, last))
            })
            .collect()
    }
}

fn single_letter(text: &str) -> Option<char> {
    let mut chars = text.chars();
    let c = chars.next()?.to_ascii_lowercase();
    (chars.next().is_none() && c.is_ascii_alphabetic()).then_some(c)
}

impl<'t> TypeDeclStmt<'t> {
    pub fn type_spec(&self) -> Option<TypeSpec<'t>> {
        self.0.child_nodes().find_map(TypeSpec::cast)
    }

    pub fn attrs(&self) -> impl Iterator<Item = AttrSpec<'t>> + 't {
        self.0.child_nodes().filter_map(AttrSpec::cast)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs().any(|a| a.name().is_some_and(|n| n == name))
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityDecl<'t>> + 't {
        self.0.child_nodes().filter_map(EntityDecl::cast)
    }
}

impl<'t> TypeSpec<'t> {
    /// Lowercased base keyword, with `double precision` folded to
    /// `doubleprecision`.
    pub fn keyword(&self) -> Option<CompactString> {
        let mut words = self.0.child_tokens().filter(|t| t.kind() == TokenKind::Name);
        let first = lower(words.next()?.text());
        if first == "double" {
            let second = words.next().map(|t| lower(t.text())).unwrap_or_default();
            return Some(format!("double{}", second).into());
        }
        Some(first)
    }

    /// Derived type named by `type(point)`.
    pub fn derived_name(&self) -> Option<NameRef<'t>> {
        self.0.child_nodes().find_map(NameRef::cast)
    }

    pub fn kind_selector(&self) -> Option<SyntaxNode<'t>> {
        self.0.first_child(NodeKind::KindSelector)
    }
}

impl<'t> AttrSpec<'t> {
    pub fn name(&self) -> Option<CompactString> {
        name_token(self.0).map(|t| lower(t.text()))
    }

    pub fn array_spec(&self) -> Option<ArraySpec<'t>> {
        self.0.child_nodes().find_map(ArraySpec::cast)
    }
}

impl<'t> EntityDecl<'t> {
    pub fn array_spec(&self) -> Option<ArraySpec<'t>> {
        self.0.child_nodes().find_map(ArraySpec::cast)
    }

    /// Initial value after `=` or `=>`.
    pub fn initializer(&self) -> Option<SyntaxNode<'t>> {
        self.0
            .first_child(NodeKind::Initializer)
            .and_then(|init| expr_children(init).next())
    }
}

impl<'t> ArraySpec<'t> {
    pub fn dims(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.0.children_of_kind(NodeKind::DimSpec)
    }

    pub fn rank(&self) -> usize {
        self.dims().count()
    }

    /// Constant extent of each dimension, when it is written as literals.
    pub fn extents(&self) -> Vec<Option<u64>> {
        self.dims().map(dim_extent).collect()
    }
}

fn dim_extent(dim: SyntaxNode<'_>) -> Option<u64> {
    let bounds: Vec<_> = expr_children(dim).collect();
    let has_colon = dim.first_token(TokenKind::Colon).is_some();
    match (bounds.as_slice(), has_colon) {
        ([upper], false) => literal_int(*upper),
        ([lower, upper], true) => {
            let (lo, hi) = (literal_int(*lower)?, literal_int(*upper)?);
            Some(hi.checked_sub(lo)? + 1)
        }
        _ => None,
    }
}

fn literal_int(node: SyntaxNode<'_>) -> Option<u64> {
    Literal::cast(node)?.int_value()
}

impl<'t> NamedConstantDef<'t> {
    pub fn value(&self) -> Option<SyntaxNode<'t>> {
        expr_children(self.0).next()
    }
}

impl<'t> CommonBlock<'t> {
    pub fn objects(&self) -> impl Iterator<Item = EntityDecl<'t>> + 't {
        self.0.child_nodes().filter_map(EntityDecl::cast)
    }
}

impl<'t> AttrStmt<'t> {
    /// Lowercased statement keyword (`save`, `public`, `intent`, ...).
    pub fn keyword(&self) -> Option<CompactString> {
        name_token(self.0).map(|t| lower(t.text()))
    }

    pub fn names(&self) -> impl Iterator<Item = NameRef<'t>> + 't {
        self.0.child_nodes().filter_map(NameRef::cast)
    }
}

// ============================================================================
// Names and labels
// ============================================================================

impl<'t> NameRef<'t> {
    pub fn token(&self) -> Option<SyntaxToken<'t>> {
        name_token(self.0)
    }

    pub fn text(&self) -> Option<&'t str> {
        self.token().map(|t| t.text())
    }

    pub fn key(&self) -> Option<CompactString> {
        self.text().map(lower)
    }
}

impl<'t> Label<'t> {
    pub fn value(&self) -> Option<u64> {
        label_value(self.0)
    }
}

impl<'t> LabelRef<'t> {
    pub fn value(&self) -> Option<u64> {
        label_value(self.0)
    }
}

fn label_value(node: SyntaxNode<'_>) -> Option<u64> {
    node.first_token(TokenKind::IntLiteral)?.text().parse().ok()
}

impl<'t> ConstructNameRef<'t> {
    pub fn key(&self) -> Option<CompactString> {
        name_token(self.0).map(|t| lower(t.text()))
    }
}

// ============================================================================
// Executable statements
// ============================================================================

impl<'t> AssignmentStmt<'t> {
    pub fn target(&self) -> Option<SyntaxNode<'t>> {
        expr_children(self.0).next()
    }

    pub fn value(&self) -> Option<SyntaxNode<'t>> {
        expr_children(self.0).nth(1)
    }

    pub fn is_pointer(&self) -> bool {
        self.0.kind() == NodeKind::PointerAssignmentStmt
    }
}

impl<'t> CallStmt<'t> {
    /// The procedure designator after `call`.
    pub fn callee(&self) -> Option<SyntaxNode<'t>> {
        expr_children(self.0).next()
    }

    /// Leftmost name of the designator: `foo` in `call foo(x)`.
    pub fn callee_name(&self) -> Option<NameRef<'t>> {
        let mut node = self.callee()?;
        loop {
            match node.kind() {
                NodeKind::NameRef => return NameRef::cast(node),
                NodeKind::CallExpr | NodeKind::ComponentExpr => node = expr_children(node).next()?,
                _ => return None,
            }
        }
    }
}

impl<'t> DoStmt<'t> {
    pub fn label_ref(&self) -> Option<LabelRef<'t>> {
        self.0.child_nodes().find_map(LabelRef::cast)
    }

    pub fn loop_control(&self) -> Option<LoopControl<'t>> {
        self.0.child_nodes().find_map(LoopControl::cast)
    }
}

impl<'t> LoopControl<'t> {
    pub fn variable(&self) -> Option<NameRef<'t>> {
        self.0.child_nodes().find_map(NameRef::cast)
    }

    /// Start, end and optional stride.
    pub fn bounds(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        expr_children(self.0).skip(1)
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// Classification of a literal token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Int,
    Real,
    Double,
    String,
    Logical,
}

impl<'t> Literal<'t> {
    pub fn token(&self) -> Option<SyntaxToken<'t>> {
        self.0.child_tokens().find(|t| t.kind().is_literal())
    }

    pub fn kind(&self) -> Option<LiteralKind> {
        let token = self.token()?;
        Some(match token.kind() {
            TokenKind::IntLiteral => LiteralKind::Int,
            TokenKind::RealLiteral => {
                let text = token.text();
                let mantissa = text.split('_').next().unwrap_or(text);
                if mantissa.contains(['d', 'D']) {
                    LiteralKind::Double
                } else {
                    LiteralKind::Real
                }
            }
            TokenKind::StringLiteral => LiteralKind::String,
            TokenKind::LogicalLiteral => LiteralKind::Logical,
            _ => return None,
        })
    }

    pub fn int_value(&self) -> Option<u64> {
        let token = self.token()?;
        if token.kind() != TokenKind::IntLiteral {
            return None;
        }
        token.text().split('_').next()?.parse().ok()
    }
}

impl<'t> BinaryExpr<'t> {
    pub fn lhs(&self) -> Option<SyntaxNode<'t>> {
        expr_children(self.0).next()
    }

    /// The right operand; absent when recovery cut the expression short.
    pub fn rhs(&self) -> Option<SyntaxNode<'t>> {
        expr_children(self.0).nth(1)
    }

    pub fn op_token(&self) -> Option<SyntaxToken<'t>> {
        self.0
            .significant_tokens()
            .find(|t| BinaryOp::from_token(t.token()).is_some())
    }

    pub fn op(&self) -> Option<BinaryOp> {
        self.op_token().and_then(|t| BinaryOp::from_token(t.token()))
    }
}

impl<'t> UnaryExpr<'t> {
    pub fn op(&self) -> Option<UnaryOp> {
        self.0.significant_tokens().find_map(|t| UnaryOp::from_token(t.token()))
    }

    pub fn operand(&self) -> Option<SyntaxNode<'t>> {
        expr_children(self.0).next()
    }
}

impl<'t> ParenExpr<'t> {
    pub fn inner(&self) -> Option<SyntaxNode<'t>> {
        expr_children(self.0).next()
    }
}

impl<'t> CallExpr<'t> {
    pub fn callee(&self) -> Option<SyntaxNode<'t>> {
        expr_children(self.0).next()
    }

    pub fn arg_list(&self) -> Option<ArgList<'t>> {
        self.0.child_nodes().find_map(ArgList::cast)
    }
}

impl<'t> ArgList<'t> {
    pub fn args(&self) -> impl Iterator<Item = Arg<'t>> + 't {
        self.0.child_nodes().filter_map(Arg::cast)
    }
}

impl<'t> Arg<'t> {
    /// `kind` in `int(x, kind=8)`.
    pub fn keyword(&self) -> Option<SyntaxToken<'t>> {
        let eq = self.0.first_token(TokenKind::Eq)?;
        self.0
            .child_tokens()
            .take_while(|t| *t != eq)
            .find(|t| t.kind() == TokenKind::Name)
    }

    pub fn value(&self) -> Option<SyntaxNode<'t>> {
        expr_children(self.0).next()
    }
}

impl<'t> ComponentExpr<'t> {
    pub fn base(&self) -> Option<SyntaxNode<'t>> {
        expr_children(self.0).next()
    }

    pub fn component(&self) -> Option<SyntaxToken<'t>> {
        name_token(self.0)
    }
}

impl<'t> ArrayConstructor<'t> {
    pub fn items(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        expr_children(self.0)
    }
}

impl<'t> ImpliedDo<'t> {
    pub fn loop_control(&self) -> Option<LoopControl<'t>> {
        self.0.child_nodes().find_map(LoopControl::cast)
    }

    pub fn items(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        expr_children(self.0)
    }
}
