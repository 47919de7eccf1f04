// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Node kinds of the concrete syntax tree.

/// The kind of an interior tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Root,

    // Program units
    MainProgram,
    Module,
    Subroutine,
    Function,
    BlockData,

    // Unit boundaries
    ProgramStmt,
    ModuleStmt,
    SubroutineStmt,
    FunctionStmt,
    BlockDataStmt,
    EndStmt,
    ContainsStmt,
    Prefix,
    DummyArgList,
    DummyArg,
    ResultSpec,

    // Names
    /// The identifier of a declaration.
    Name,
    /// A use of a name that resolves through scopes.
    NameRef,
    /// The module named by a `use` statement.
    ModuleRef,
    /// A statement label definition.
    Label,
    /// A statement label reference, as in `goto 10`.
    LabelRef,
    /// `outer:` in front of a construct.
    ConstructName,
    /// A construct name after `exit`, `cycle` or an end statement.
    ConstructNameRef,
    /// `/name/` in a `save` list.
    CommonBlockRef,

    // Specification statements
    UseStmt,
    OnlyList,
    Rename,
    ImplicitStmt,
    ImplicitSpec,
    LetterRange,
    TypeDeclStmt,
    TypeSpec,
    KindSelector,
    AttrSpec,
    EntityDecl,
    ArraySpec,
    DimSpec,
    CharLength,
    Initializer,
    ParameterStmt,
    NamedConstantDef,
    DimensionStmt,
    CommonStmt,
    CommonBlock,
    DataStmt,
    DataSet,
    ExternalStmt,
    IntrinsicStmt,
    /// `save`, `public`, `private`, `intent(in)`, `allocatable`, ...
    AttrStmt,
    FormatStmt,

    // Derived types and interfaces
    DerivedTypeDef,
    DerivedTypeStmt,
    EndTypeStmt,
    InterfaceBlock,
    InterfaceStmt,
    EndInterfaceStmt,
    ModuleProcedureStmt,

    // Executable statements and constructs
    Block,
    AssignmentStmt,
    PointerAssignmentStmt,
    CallStmt,
    IfConstruct,
    IfThenStmt,
    ElseIfStmt,
    ElseStmt,
    EndIfStmt,
    IfStmt,
    ArithmeticIfStmt,
    DoConstruct,
    DoStmt,
    LoopControl,
    WhileControl,
    EndDoStmt,
    SelectCaseConstruct,
    SelectCaseStmt,
    CaseStmt,
    CaseSelector,
    EndSelectStmt,
    CycleStmt,
    ExitStmt,
    GotoStmt,
    ContinueStmt,
    ReturnStmt,
    StopStmt,
    PrintStmt,
    ReadStmt,
    WriteStmt,
    /// `open`, `close`, `inquire`, `rewind`, `backspace`, `endfile`, `flush`.
    IoStmt,
    IoControlList,
    IoControl,
    FormatSpec,
    ItemList,
    /// `allocate`, `deallocate`, `nullify`.
    AllocateStmt,

    // Expressions
    Literal,
    ComplexLiteral,
    ParenExpr,
    UnaryExpr,
    BinaryExpr,
    /// `f(x)` or `a(i)`: call and array reference share one shape.
    CallExpr,
    ArgList,
    Arg,
    SectionSubscript,
    ComponentExpr,
    ArrayConstructor,
    ImpliedDo,

    /// Input that could not be parsed.
    Error,
}

impl NodeKind {
    pub fn is_program_unit(self) -> bool {
        matches!(
            self,
            NodeKind::MainProgram
                | NodeKind::Module
                | NodeKind::Subroutine
                | NodeKind::Function
                | NodeKind::BlockData
        )
    }

    /// Statement nodes always end with their terminator (when one exists).
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeKind::ProgramStmt
                | NodeKind::ModuleStmt
                | NodeKind::SubroutineStmt
                | NodeKind::FunctionStmt
                | NodeKind::BlockDataStmt
                | NodeKind::EndStmt
                | NodeKind::ContainsStmt
                | NodeKind::UseStmt
                | NodeKind::ImplicitStmt
                | NodeKind::TypeDeclStmt
                | NodeKind::ParameterStmt
                | NodeKind::DimensionStmt
                | NodeKind::CommonStmt
                | NodeKind::DataStmt
                | NodeKind::ExternalStmt
                | NodeKind::IntrinsicStmt
                | NodeKind::AttrStmt
                | NodeKind::FormatStmt
                | NodeKind::DerivedTypeStmt
                | NodeKind::EndTypeStmt
                | NodeKind::InterfaceStmt
                | NodeKind::EndInterfaceStmt
                | NodeKind::ModuleProcedureStmt
                | NodeKind::AssignmentStmt
                | NodeKind::PointerAssignmentStmt
                | NodeKind::CallStmt
                | NodeKind::IfThenStmt
                | NodeKind::ElseIfStmt
                | NodeKind::ElseStmt
                | NodeKind::EndIfStmt
                | NodeKind::IfStmt
                | NodeKind::ArithmeticIfStmt
                | NodeKind::DoStmt
                | NodeKind::EndDoStmt
                | NodeKind::SelectCaseStmt
                | NodeKind::CaseStmt
                | NodeKind::EndSelectStmt
                | NodeKind::CycleStmt
                | NodeKind::ExitStmt
                | NodeKind::GotoStmt
                | NodeKind::ContinueStmt
                | NodeKind::ReturnStmt
                | NodeKind::StopStmt
                | NodeKind::PrintStmt
                | NodeKind::ReadStmt
                | NodeKind::WriteStmt
                | NodeKind::IoStmt
                | NodeKind::AllocateStmt
        )
    }

    /// Multi-statement constructs with a begin and an end statement.
    pub fn is_construct(self) -> bool {
        matches!(
            self,
            NodeKind::IfConstruct
                | NodeKind::DoConstruct
                | NodeKind::SelectCaseConstruct
                | NodeKind::DerivedTypeDef
                | NodeKind::InterfaceBlock
        )
    }

    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::NameRef
                | NodeKind::Literal
                | NodeKind::ComplexLiteral
                | NodeKind::ParenExpr
                | NodeKind::UnaryExpr
                | NodeKind::BinaryExpr
                | NodeKind::CallExpr
                | NodeKind::SectionSubscript
                | NodeKind::ComponentExpr
                | NodeKind::ArrayConstructor
                | NodeKind::ImpliedDo
        )
    }

    /// Kinds that declare a name and expose it through
    /// [`NamedElement`](crate::NamedElement).
    pub fn is_named_element(self) -> bool {
        matches!(
            self,
            NodeKind::ProgramStmt
                | NodeKind::ModuleStmt
                | NodeKind::SubroutineStmt
                | NodeKind::FunctionStmt
                | NodeKind::BlockDataStmt
                | NodeKind::DummyArg
                | NodeKind::ResultSpec
                | NodeKind::EntityDecl
                | NodeKind::NamedConstantDef
                | NodeKind::CommonBlock
                | NodeKind::DerivedTypeStmt
                | NodeKind::InterfaceStmt
                | NodeKind::ConstructName
                | NodeKind::Rename
        )
    }

    /// Statements that open a program unit and carry its name.
    pub fn is_name_stmt(self) -> bool {
        matches!(
            self,
            NodeKind::ProgramStmt
                | NodeKind::ModuleStmt
                | NodeKind::SubroutineStmt
                | NodeKind::FunctionStmt
                | NodeKind::BlockDataStmt
                | NodeKind::DerivedTypeStmt
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_do_not_overlap_for_units() {
        for kind in [NodeKind::MainProgram, NodeKind::Subroutine, NodeKind::Module] {
            assert!(kind.is_program_unit());
            assert!(!kind.is_statement());
            assert!(!kind.is_expression());
        }
    }

    #[test]
    fn name_statements_are_named_elements() {
        for kind in [
            NodeKind::ProgramStmt,
            NodeKind::ModuleStmt,
            NodeKind::SubroutineStmt,
            NodeKind::FunctionStmt,
            NodeKind::BlockDataStmt,
            NodeKind::DerivedTypeStmt,
        ] {
            assert!(kind.is_name_stmt());
            assert!(kind.is_named_element());
        }
        assert!(!NodeKind::NameRef.is_named_element());
    }
}
