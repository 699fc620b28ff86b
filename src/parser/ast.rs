// AST (Abstract Syntax Tree) definitions for Sable
//
// Every node borrows the tokens it was built from, so a parsed [`Module`]
// lives as long as the token buffer handed to the parser. Nodes are plain
// data: once a parsing function returns a node it is never modified.
//
// The structured form used for golden tests is the serde serialization of
// these types. Enums are externally tagged, so each concrete node appears
// keyed by its variant name, e.g. `{"Binary": {...}}`.

use super::token::{Token, TokenKind};
use serde::Serialize;
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

// ===== Module =====

/// Root of a parsed source file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Module<'a> {
    pub statements: Vec<Stmt<'a>>,
}

impl<'a> Module<'a> {
    pub fn new() -> Self {
        Module::default()
    }

    /// Compact structured form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Indented structured form, as written to golden files.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

// ===== Decorations =====

/// `[@a, @b]` in front of a declaration.
#[derive(Debug, Clone, Serialize)]
pub struct MetaAnnotations<'a> {
    pub open: &'a Token,
    pub annotations: Vec<&'a Token>,
}

impl<'a> MetaAnnotations<'a> {
    pub fn contains(&self, name: &str) -> bool {
        self.annotations
            .iter()
            .any(|a| a.lexeme.strip_prefix('@') == Some(name))
    }
}

/// `template<T, U>` in front of a declaration.
#[derive(Debug, Clone, Serialize)]
pub struct Template<'a> {
    pub keyword: &'a Token,
    pub parameters: Vec<&'a Token>,
}

// ===== Type annotations =====

#[derive(Debug, Clone, Serialize)]
pub enum TypeAnnotation<'a> {
    Atomic(AtomicType<'a>),
    Array(ArrayType<'a>),
    Tuple(TupleType<'a>),
    Function(FunctionType<'a>),
}

/// `Name`, `Name<Args>`, optionally followed by a pointer marker `*`.
#[derive(Debug, Clone, Serialize)]
pub struct AtomicType<'a> {
    pub name: &'a Token,
    pub arguments: Vec<TypeAnnotation<'a>>,
    pub pointer: bool,
}

/// `[Element; size]`
#[derive(Debug, Clone, Serialize)]
pub struct ArrayType<'a> {
    pub open: &'a Token,
    pub element: Box<TypeAnnotation<'a>>,
    pub size: Box<Expr<'a>>,
}

/// `(A, B, C)`
#[derive(Debug, Clone, Serialize)]
pub struct TupleType<'a> {
    pub open: &'a Token,
    pub elements: Vec<TypeAnnotation<'a>>,
}

/// `fn(A, B) -> R`
#[derive(Debug, Clone, Serialize)]
pub struct FunctionType<'a> {
    pub keyword: &'a Token,
    pub parameters: Vec<TypeAnnotation<'a>>,
    pub return_type: Box<TypeAnnotation<'a>>,
}

impl<'a> TypeAnnotation<'a> {
    pub fn location(&self) -> SourceLocation {
        match self {
            TypeAnnotation::Atomic(t) => t.name.location(),
            TypeAnnotation::Array(t) => t.open.location(),
            TypeAnnotation::Tuple(t) => t.open.location(),
            TypeAnnotation::Function(t) => t.keyword.location(),
        }
    }
}

/// Function / lambda / constructor parameter
#[derive(Debug, Clone, Serialize)]
pub struct Parameter<'a> {
    pub name: &'a Token,
    pub type_annotation: TypeAnnotation<'a>,
}

// ===== Statements =====

#[derive(Debug, Clone, Serialize)]
pub enum Stmt<'a> {
    Block(BlockStmt<'a>),
    Import(ImportStmt<'a>),
    FromImport(FromImportStmt<'a>),
    Export(ExportStmt<'a>),
    Interface(InterfaceDecl<'a>),
    Implementation(ImplementationDecl<'a>),
    Class(ClassDecl<'a>),
    Struct(StructDecl<'a>),
    Union(UnionDecl<'a>),
    Enum(EnumDecl<'a>),
    Constructor(ConstructorDecl<'a>),
    Destructor(DestructorDecl<'a>),
    Function(FunctionDecl<'a>),
    Variable(VariableDecl<'a>),
    If(IfStmt<'a>),
    Switch(SwitchStmt<'a>),
    While(WhileStmt<'a>),
    DoWhile(DoWhileStmt<'a>),
    For(ForStmt<'a>),
    Break(BreakStmt<'a>),
    Continue(ContinueStmt<'a>),
    Return(ReturnStmt<'a>),
    Expression(ExpressionStmt<'a>),
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockStmt<'a> {
    pub open: &'a Token,
    pub statements: Vec<Stmt<'a>>,
}

/// `import a.b.c as d;`
#[derive(Debug, Clone, Serialize)]
pub struct ImportStmt<'a> {
    pub keyword: &'a Token,
    pub path: Vec<&'a Token>,
    pub alias: Option<&'a Token>,
}

/// `from a.b import x, y as z;`
#[derive(Debug, Clone, Serialize)]
pub struct FromImportStmt<'a> {
    pub keyword: &'a Token,
    pub path: Vec<&'a Token>,
    pub symbols: Vec<ImportedSymbol<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportedSymbol<'a> {
    pub name: &'a Token,
    pub alias: Option<&'a Token>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportStmt<'a> {
    pub keyword: &'a Token,
    pub declaration: Box<Stmt<'a>>,
}

/// Interfaces only carry method signatures.
#[derive(Debug, Clone, Serialize)]
pub struct InterfaceDecl<'a> {
    pub meta: Option<MetaAnnotations<'a>>,
    pub template: Option<Template<'a>>,
    pub name: &'a Token,
    pub methods: Vec<FunctionSignature<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionSignature<'a> {
    pub meta: Option<MetaAnnotations<'a>>,
    pub name: &'a Token,
    pub parameters: Vec<Parameter<'a>>,
    pub return_type: Option<TypeAnnotation<'a>>,
}

/// `impl Interface for Type { ... }`
#[derive(Debug, Clone, Serialize)]
pub struct ImplementationDecl<'a> {
    pub meta: Option<MetaAnnotations<'a>>,
    pub interface: &'a Token,
    pub target: &'a Token,
    pub methods: Vec<FunctionDecl<'a>>,
}

/// Members shared by class and struct bodies.
///
/// Declaration order between different member kinds is not kept; order
/// within each kind is.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TypeBody<'a> {
    pub fields: Vec<VariableDecl<'a>>,
    pub methods: Vec<FunctionDecl<'a>>,
    pub constructor: Option<ConstructorDecl<'a>>,
    pub destructor: Option<DestructorDecl<'a>>,
    pub unions: Vec<UnionDecl<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDecl<'a> {
    pub meta: Option<MetaAnnotations<'a>>,
    pub template: Option<Template<'a>>,
    pub partial: bool,
    pub name: &'a Token,
    pub body: TypeBody<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StructDecl<'a> {
    pub meta: Option<MetaAnnotations<'a>>,
    pub template: Option<Template<'a>>,
    pub name: &'a Token,
    pub body: TypeBody<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnionDecl<'a> {
    pub meta: Option<MetaAnnotations<'a>>,
    pub name: &'a Token,
    pub fields: Vec<UnionField<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnionField<'a> {
    pub name: &'a Token,
    pub type_annotation: TypeAnnotation<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumDecl<'a> {
    pub meta: Option<MetaAnnotations<'a>>,
    pub name: &'a Token,
    pub variants: Vec<EnumVariant<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnumVariant<'a> {
    pub name: &'a Token,
    pub value: Option<Expr<'a>>,
}

/// `constructor(params) : a = x, b = y { ... }`
///
/// Each initializer is an assignment expression.
#[derive(Debug, Clone, Serialize)]
pub struct ConstructorDecl<'a> {
    pub meta: Option<MetaAnnotations<'a>>,
    pub keyword: &'a Token,
    pub parameters: Vec<Parameter<'a>>,
    pub initializers: Vec<Expr<'a>>,
    pub body: BlockStmt<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DestructorDecl<'a> {
    pub meta: Option<MetaAnnotations<'a>>,
    pub keyword: &'a Token,
    pub body: BlockStmt<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDecl<'a> {
    pub meta: Option<MetaAnnotations<'a>>,
    pub template: Option<Template<'a>>,
    pub storage: Option<&'a Token>,
    pub execution: Option<&'a Token>,
    pub name: &'a Token,
    pub parameters: Vec<Parameter<'a>>,
    pub return_type: Option<TypeAnnotation<'a>>,
    pub body: BlockStmt<'a>,
}

/// `[static] const|var name [: Type] [= init];`
#[derive(Debug, Clone, Serialize)]
pub struct VariableDecl<'a> {
    pub meta: Option<MetaAnnotations<'a>>,
    pub storage: Option<&'a Token>,
    pub mutability: &'a Token,
    pub name: &'a Token,
    pub type_annotation: Option<TypeAnnotation<'a>>,
    pub initializer: Option<Expr<'a>>,
}

impl<'a> VariableDecl<'a> {
    pub fn is_const(&self) -> bool {
        self.mutability.kind == TokenKind::Const
    }
}

/// `if` with any number of `else if` branches and an optional `else`.
#[derive(Debug, Clone, Serialize)]
pub struct IfStmt<'a> {
    pub keyword: &'a Token,
    pub branches: Vec<ConditionalBranch<'a>>,
    pub otherwise: Option<Box<Stmt<'a>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConditionalBranch<'a> {
    pub condition: Expr<'a>,
    pub body: Box<Stmt<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchStmt<'a> {
    pub keyword: &'a Token,
    pub subject: Expr<'a>,
    pub cases: Vec<SwitchCase<'a>>,
}

/// Switch case
#[derive(Debug, Clone, Serialize)]
pub enum SwitchCase<'a> {
    Case {
        keyword: &'a Token,
        value: Expr<'a>,
        body: Vec<Stmt<'a>>,
    },
    Default {
        keyword: &'a Token,
        body: Vec<Stmt<'a>>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct WhileStmt<'a> {
    pub keyword: &'a Token,
    pub condition: Expr<'a>,
    pub body: Box<Stmt<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoWhileStmt<'a> {
    pub keyword: &'a Token,
    pub body: Box<Stmt<'a>>,
    pub condition: Expr<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForStmt<'a> {
    pub keyword: &'a Token,
    pub initializer: Option<Box<Stmt<'a>>>,
    pub condition: Option<Expr<'a>>,
    pub increment: Option<Expr<'a>>,
    pub body: Box<Stmt<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakStmt<'a> {
    pub keyword: &'a Token,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContinueStmt<'a> {
    pub keyword: &'a Token,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnStmt<'a> {
    pub keyword: &'a Token,
    pub value: Option<Expr<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpressionStmt<'a> {
    pub expression: Expr<'a>,
}

impl<'a> Stmt<'a> {
    /// Location of the token that anchors this statement.
    pub fn location(&self) -> SourceLocation {
        match self {
            Stmt::Block(s) => s.open.location(),
            Stmt::Import(s) => s.keyword.location(),
            Stmt::FromImport(s) => s.keyword.location(),
            Stmt::Export(s) => s.keyword.location(),
            Stmt::Interface(s) => s.name.location(),
            Stmt::Implementation(s) => s.interface.location(),
            Stmt::Class(s) => s.name.location(),
            Stmt::Struct(s) => s.name.location(),
            Stmt::Union(s) => s.name.location(),
            Stmt::Enum(s) => s.name.location(),
            Stmt::Constructor(s) => s.keyword.location(),
            Stmt::Destructor(s) => s.keyword.location(),
            Stmt::Function(s) => s.name.location(),
            Stmt::Variable(s) => s.name.location(),
            Stmt::If(s) => s.keyword.location(),
            Stmt::Switch(s) => s.keyword.location(),
            Stmt::While(s) => s.keyword.location(),
            Stmt::DoWhile(s) => s.keyword.location(),
            Stmt::For(s) => s.keyword.location(),
            Stmt::Break(s) => s.keyword.location(),
            Stmt::Continue(s) => s.keyword.location(),
            Stmt::Return(s) => s.keyword.location(),
            Stmt::Expression(s) => s.expression.location(),
        }
    }

    /// Variant name, as used as the key in the structured form.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::Block(_) => "Block",
            Stmt::Import(_) => "Import",
            Stmt::FromImport(_) => "FromImport",
            Stmt::Export(_) => "Export",
            Stmt::Interface(_) => "Interface",
            Stmt::Implementation(_) => "Implementation",
            Stmt::Class(_) => "Class",
            Stmt::Struct(_) => "Struct",
            Stmt::Union(_) => "Union",
            Stmt::Enum(_) => "Enum",
            Stmt::Constructor(_) => "Constructor",
            Stmt::Destructor(_) => "Destructor",
            Stmt::Function(_) => "Function",
            Stmt::Variable(_) => "Variable",
            Stmt::If(_) => "If",
            Stmt::Switch(_) => "Switch",
            Stmt::While(_) => "While",
            Stmt::DoWhile(_) => "DoWhile",
            Stmt::For(_) => "For",
            Stmt::Break(_) => "Break",
            Stmt::Continue(_) => "Continue",
            Stmt::Return(_) => "Return",
            Stmt::Expression(_) => "Expression",
        }
    }
}

// ===== Expressions =====

#[derive(Debug, Clone, Serialize)]
pub enum Expr<'a> {
    Lambda(LambdaExpr<'a>),
    Ternary(TernaryExpr<'a>),
    Assignment(AssignmentExpr<'a>),
    Binary(BinaryExpr<'a>),
    Unary(UnaryExpr<'a>),
    Postfix(PostfixExpr<'a>),
    Member(MemberExpr<'a>),
    Index(IndexExpr<'a>),
    TupleAccess(TupleAccessExpr<'a>),
    Call(CallExpr<'a>),
    Allocation(AllocationExpr<'a>),
    Deallocation(DeallocationExpr<'a>),
    Number(NumberLiteral<'a>),
    String(StringLiteral<'a>),
    StringFragment(StringFragment<'a>),
    Interpolation(InterpolationExpr<'a>),
    Array(ArrayLiteral<'a>),
    Tuple(TupleLiteral<'a>),
    Grouping(GroupingExpr<'a>),
    Identifier(Identifier<'a>),
}

/// `fn(params) -> T => expr` or `fn(params) { ... }`
#[derive(Debug, Clone, Serialize)]
pub struct LambdaExpr<'a> {
    pub keyword: &'a Token,
    pub parameters: Vec<Parameter<'a>>,
    pub return_type: Option<TypeAnnotation<'a>>,
    pub body: LambdaBody<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub enum LambdaBody<'a> {
    Expression(Box<Expr<'a>>),
    Block(BlockStmt<'a>),
}

#[derive(Debug, Clone, Serialize)]
pub struct TernaryExpr<'a> {
    pub condition: Box<Expr<'a>>,
    pub question: &'a Token,
    pub then_branch: Box<Expr<'a>>,
    pub else_branch: Box<Expr<'a>>,
}

/// Target is always an identifier, member access or index access.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentExpr<'a> {
    pub target: Box<Expr<'a>>,
    pub operator: &'a Token,
    pub value: Box<Expr<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryExpr<'a> {
    pub left: Box<Expr<'a>>,
    pub operator: &'a Token,
    pub right: Box<Expr<'a>>,
}

/// Prefix operator: `& * - ! ++ --`
#[derive(Debug, Clone, Serialize)]
pub struct UnaryExpr<'a> {
    pub operator: &'a Token,
    pub operand: Box<Expr<'a>>,
}

/// Postfix `++` / `--`
#[derive(Debug, Clone, Serialize)]
pub struct PostfixExpr<'a> {
    pub operand: Box<Expr<'a>>,
    pub operator: &'a Token,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberExpr<'a> {
    pub object: Box<Expr<'a>>,
    pub property: &'a Token,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexExpr<'a> {
    pub object: Box<Expr<'a>>,
    pub open: &'a Token,
    pub index: Box<Expr<'a>>,
}

/// `tuple.0`
#[derive(Debug, Clone, Serialize)]
pub struct TupleAccessExpr<'a> {
    pub tuple: Box<Expr<'a>>,
    pub token: &'a Token,
    pub index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallExpr<'a> {
    pub callee: Box<Expr<'a>>,
    pub open: &'a Token,
    pub arguments: Vec<Expr<'a>>,
}

/// `new T(args)` or `new T[count]`
#[derive(Debug, Clone, Serialize)]
pub struct AllocationExpr<'a> {
    pub keyword: &'a Token,
    pub type_annotation: TypeAnnotation<'a>,
    pub arguments: Option<Vec<Expr<'a>>>,
    pub count: Option<Box<Expr<'a>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeallocationExpr<'a> {
    pub keyword: &'a Token,
    pub target: Box<Expr<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumberLiteral<'a> {
    pub token: &'a Token,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StringLiteral<'a> {
    pub token: &'a Token,
    pub value: &'a str,
}

/// Literal text between interpolations.
#[derive(Debug, Clone, Serialize)]
pub struct StringFragment<'a> {
    pub token: &'a Token,
    pub value: &'a str,
}

/// `"a $b ${c + d}"`: ordered parts, each a [`StringFragment`], an
/// [`Identifier`] or an arbitrary sub-expression.
#[derive(Debug, Clone, Serialize)]
pub struct InterpolationExpr<'a> {
    pub start: &'a Token,
    pub parts: Vec<Expr<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrayLiteral<'a> {
    pub open: &'a Token,
    pub elements: Vec<Expr<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TupleLiteral<'a> {
    pub open: &'a Token,
    pub elements: Vec<Expr<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupingExpr<'a> {
    pub open: &'a Token,
    pub expression: Box<Expr<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Identifier<'a> {
    pub token: &'a Token,
}

impl<'a> Identifier<'a> {
    pub fn name(&self) -> &'a str {
        &self.token.lexeme
    }
}

impl<'a> Expr<'a> {
    /// Get the source location of this node
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::Lambda(e) => e.keyword.location(),
            Expr::Ternary(e) => e.condition.location(),
            Expr::Assignment(e) => e.target.location(),
            Expr::Binary(e) => e.left.location(),
            Expr::Unary(e) => e.operator.location(),
            Expr::Postfix(e) => e.operand.location(),
            Expr::Member(e) => e.object.location(),
            Expr::Index(e) => e.object.location(),
            Expr::TupleAccess(e) => e.tuple.location(),
            Expr::Call(e) => e.callee.location(),
            Expr::Allocation(e) => e.keyword.location(),
            Expr::Deallocation(e) => e.keyword.location(),
            Expr::Number(e) => e.token.location(),
            Expr::String(e) => e.token.location(),
            Expr::StringFragment(e) => e.token.location(),
            Expr::Interpolation(e) => e.start.location(),
            Expr::Array(e) => e.open.location(),
            Expr::Tuple(e) => e.open.location(),
            Expr::Grouping(e) => e.open.location(),
            Expr::Identifier(e) => e.token.location(),
        }
    }

    /// Whether this expression may appear on the left of an assignment.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Expr::Identifier(_) | Expr::Member(_) | Expr::Index(_))
    }

    /// Variant name, as used as the key in the structured form.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Lambda(_) => "Lambda",
            Expr::Ternary(_) => "Ternary",
            Expr::Assignment(_) => "Assignment",
            Expr::Binary(_) => "Binary",
            Expr::Unary(_) => "Unary",
            Expr::Postfix(_) => "Postfix",
            Expr::Member(_) => "Member",
            Expr::Index(_) => "Index",
            Expr::TupleAccess(_) => "TupleAccess",
            Expr::Call(_) => "Call",
            Expr::Allocation(_) => "Allocation",
            Expr::Deallocation(_) => "Deallocation",
            Expr::Number(_) => "Number",
            Expr::String(_) => "String",
            Expr::StringFragment(_) => "StringFragment",
            Expr::Interpolation(_) => "Interpolation",
            Expr::Array(_) => "Array",
            Expr::Tuple(_) => "Tuple",
            Expr::Grouping(_) => "Grouping",
            Expr::Identifier(_) => "Identifier",
        }
    }
}
