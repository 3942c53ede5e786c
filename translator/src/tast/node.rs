//! Typed tree: expressions and statements of one class after lowering.
//!
//! Every [`Expr`] carries the scope it was lowered in and a write-once type
//! slot. The slot is filled by the resolver on first request, or seeded by
//! a parent that already knows the type.

use super::overload::Resolution;
use super::scopes::ScopeId;
use super::types::Type;
use std::cell::{Cell, OnceCell};

#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub scope: ScopeId,
    ty: OnceCell<Type>,
    resolving: Cell<bool>,
}

impl Expr {
    pub fn new(kind: ExprKind, scope: ScopeId) -> Self {
        Self {
            kind,
            scope,
            ty: OnceCell::new(),
            resolving: Cell::new(false),
        }
    }

    pub fn cached_type(&self) -> Option<&Type> {
        self.ty.get()
    }

    /// Store the type unless one is already set. Returns the stored type.
    pub fn seed_type(&self, ty: Type) -> &Type {
        self.ty.get_or_init(|| ty)
    }

    /// Mark resolution as in progress; false if it already was.
    pub(crate) fn begin_resolution(&self) -> bool {
        !self.resolving.replace(true)
    }

    pub(crate) fn end_resolution(&self) {
        self.resolving.set(false);
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_))
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Literal(Literal {
                kind: LiteralKind::Null,
                ..
            })
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ExprKind::Literal(_) => "Literal",
            ExprKind::Identifier(_) => "PrimaryIdentifier",
            ExprKind::This => "ThisExpression",
            ExprKind::Super => "SuperExpression",
            ExprKind::Binary { .. } => "BinaryExpression",
            ExprKind::Assign { .. } => "Expression",
            ExprKind::Unary { .. } => "UnaryExpression",
            ExprKind::Postfix { .. } => "PostfixExpression",
            ExprKind::Conditional { .. } => "ConditionalExpression",
            ExprKind::Call(_) => "CallExpression",
            ExprKind::Selection(_) => "SelectionExpression",
            ExprKind::Subscript { .. } => "SubscriptExpression",
            ExprKind::Cast { .. } => "CastExpression",
            ExprKind::InstanceOf { .. } => "InstanceOfExpression",
            ExprKind::NewObject(_) => "NewClassExpression",
            ExprKind::NewArray(_) => "NewArrayExpression",
            ExprKind::ArrayInit { .. } => "ArrayInitializer",
            ExprKind::ClassLiteral(_) => "ClassLiteralExpression",
            ExprKind::Unsupported(_) => "Unsupported",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    Long,
    Float,
    Double,
    Char,
    String,
    Boolean,
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub kind: LiteralKind,
    /// Source spelling, quotes included
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryCategory {
    Additive,
    Multiplicative,
    Shift,
    Relational,
    Equality,
    LogicalAnd,
    LogicalOr,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
}

impl BinaryCategory {
    pub fn from_node_kind(kind: &str) -> Option<Self> {
        Some(match kind {
            "AdditiveExpression" => BinaryCategory::Additive,
            "MultiplicativeExpression" => BinaryCategory::Multiplicative,
            "ShiftExpression" => BinaryCategory::Shift,
            "RelationalExpression" => BinaryCategory::Relational,
            "EqualityExpression" => BinaryCategory::Equality,
            "LogicalAndExpression" => BinaryCategory::LogicalAnd,
            "LogicalOrExpression" => BinaryCategory::LogicalOr,
            "BitwiseAndExpression" => BinaryCategory::BitwiseAnd,
            "BitwiseOrExpression" => BinaryCategory::BitwiseOr,
            "BitwiseXorExpression" => BinaryCategory::BitwiseXor,
            _ => return None,
        })
    }

    /// Operator of the two-child forms, which carry no operator token.
    pub fn implied_operator(self) -> Option<&'static str> {
        match self {
            BinaryCategory::LogicalAnd => Some("&&"),
            BinaryCategory::LogicalOr => Some("||"),
            BinaryCategory::BitwiseAnd => Some("&"),
            BinaryCategory::BitwiseOr => Some("|"),
            BinaryCategory::BitwiseXor => Some("^"),
            _ => None,
        }
    }
}

/// What a name or a selected member denotes, decided during resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTarget {
    /// Local variable or parameter
    Local,
    Field { owner: String, is_static: bool },
    /// A class named for static access
    Class(String),
    /// A static field of a runtime class
    RuntimeStatic { class: String },
    ArrayLength,
    Unresolved,
}

#[derive(Debug)]
pub struct Identifier {
    pub name: String,
    pub target: OnceCell<NameTarget>,
}

#[derive(Debug)]
pub struct Selection {
    pub base: Expr,
    pub name: String,
    pub target: OnceCell<NameTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintKind {
    Print,
    Println,
}

#[derive(Debug)]
pub struct Call {
    pub receiver: Option<Expr>,
    pub name: String,
    pub args: Vec<Expr>,
    /// `System.out.print`/`println`; the receiver is dropped
    pub print: Option<PrintKind>,
    pub target: OnceCell<Resolution>,
}

#[derive(Debug)]
pub struct NewObject {
    pub class: Type,
    pub args: Vec<Expr>,
    pub target: OnceCell<Resolution>,
}

#[derive(Debug)]
pub struct NewArray {
    /// Non-array element type as written
    pub element: Type,
    pub sizes: Vec<Expr>,
    pub extra_dims: u32,
    pub init: Option<Expr>,
}

#[derive(Debug)]
pub enum ExprKind {
    Literal(Literal),
    Identifier(Identifier),
    This,
    Super,
    Binary {
        category: BinaryCategory,
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: String,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Postfix {
        op: String,
        operand: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call(Box<Call>),
    Selection(Box<Selection>),
    Subscript {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    /// `basic` for the keyword-typed form `(int) x`
    Cast {
        target: Type,
        operand: Box<Expr>,
        basic: bool,
    },
    InstanceOf {
        operand: Box<Expr>,
        target: Type,
    },
    NewObject(Box<NewObject>),
    NewArray(Box<NewArray>),
    ArrayInit {
        elements: Vec<Expr>,
    },
    ClassLiteral(Type),
    /// Node kind with no lowering
    Unsupported(String),
}

#[derive(Debug)]
pub struct Block {
    pub scope: ScopeId,
    pub stmts: Vec<Stmt>,
}

#[derive(Debug)]
pub struct LocalVar {
    pub name: String,
    pub ty: Type,
    pub init: Option<Expr>,
}

#[derive(Debug)]
pub enum ForInit {
    Decls(Vec<LocalVar>),
    Exprs(Vec<Expr>),
}

#[derive(Debug)]
pub struct SwitchClause {
    /// None for `default`
    pub label: Option<Expr>,
    pub body: Vec<Stmt>,
}

#[derive(Debug)]
pub struct CatchClause {
    pub ty: Type,
    pub name: String,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegation {
    This,
    Super,
}

/// `this(...)` or `super(...)` inside a constructor.
#[derive(Debug)]
pub struct ConstructorCall {
    pub kind: Delegation,
    pub args: Vec<Expr>,
    pub scope: ScopeId,
    pub target: OnceCell<Resolution>,
}

#[derive(Debug)]
pub enum Stmt {
    Block(Block),
    Expr(Expr),
    Return(Option<Expr>),
    Local(Vec<LocalVar>),
    If {
        cond: Expr,
        then: Box<Stmt>,
        otherwise: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<ForInit>,
        cond: Option<Expr>,
        update: Vec<Expr>,
        body: Box<Stmt>,
    },
    Switch {
        selector: Expr,
        clauses: Vec<SwitchClause>,
    },
    Break,
    Continue,
    Synchronized {
        lock: Expr,
        body: Block,
    },
    Try {
        body: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
    },
    Throw(Expr),
    Delegate(ConstructorCall),
    Empty,
    Unsupported(String),
}

impl Block {
    /// The leading `this(...)`/`super(...)`, if the block starts with one.
    pub fn leading_delegation(&self) -> Option<&ConstructorCall> {
        match self.stmts.first() {
            Some(Stmt::Delegate(call)) => Some(call),
            _ => None,
        }
    }
}
