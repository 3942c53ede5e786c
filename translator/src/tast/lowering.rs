//! Pass 2 front half: member bodies into the typed tree.
//!
//! Each translated class becomes a [`ClassUnit`] owning its scope tree.
//! Parameters and locals are declared as their declarations are visited, so
//! every expression records a scope that sees exactly the names in effect at
//! that point. Types are not computed here; see `type_resolution`.

use super::node::*;
use super::scopes::{Binding, ScopeId, ScopeKind, ScopeTree};
use super::symbols::{ClassDecl, CompilationContext, ConstructorDecl, FieldDecl, FileEnv, MethodDecl};
use super::type_syntax::{dimension_count, TypeSyntax};
use super::types::Type;
use crate::error::Reporter;
use crate::error_codes::{INTERNAL, MISPLACED_DELEGATION, REDECLARED_VARIABLE, UNSUPPORTED_NODE};
use log::{debug, trace};
use std::cell::OnceCell;
use tree::Node;

pub struct LoweredField<'c> {
    pub decl: &'c FieldDecl,
    pub init: Option<Expr>,
}

pub struct LoweredConstructor<'c> {
    pub decl: &'c ConstructorDecl,
    pub scope: ScopeId,
    pub body: Block,
}

impl LoweredConstructor<'_> {
    pub fn delegation(&self) -> Option<&ConstructorCall> {
        self.body.leading_delegation()
    }
}

pub struct LoweredMethod<'c> {
    pub decl: &'c MethodDecl,
    pub scope: ScopeId,
    /// None for abstract methods
    pub body: Option<Block>,
}

/// One class with all bodies lowered.
pub struct ClassUnit<'c> {
    pub class: &'c ClassDecl,
    pub file: &'c FileEnv,
    pub scopes: ScopeTree,
    pub class_scope: ScopeId,
    pub fields: Vec<LoweredField<'c>>,
    pub constructors: Vec<LoweredConstructor<'c>>,
    pub methods: Vec<LoweredMethod<'c>>,
}

impl ClassUnit<'_> {
    pub fn qualified_name(&self) -> String {
        self.class.qualified_name()
    }
}

pub struct Lowering<'a> {
    ctx: &'a CompilationContext,
    reporter: &'a Reporter,
}

impl<'a> Lowering<'a> {
    pub fn new(ctx: &'a CompilationContext, reporter: &'a Reporter) -> Self {
        Self { ctx, reporter }
    }

    /// Lower one class. Runtime classes have no bodies and give `None`.
    pub fn lower_class(&self, class: &'a ClassDecl) -> Option<ClassUnit<'a>> {
        if class.is_runtime() {
            return None;
        }
        let qualified = class.qualified_name();
        let Some(file) = class.file.and_then(|index| self.ctx.file(index)) else {
            self.reporter
                .report(INTERNAL, format!("{} has no source unit", qualified));
            return None;
        };
        self.reporter.set_file(&file.name);
        self.reporter.set_class(Some(&qualified));
        debug!("lowering {}", qualified);

        let mut scopes = ScopeTree::new();
        let class_scope = scopes.create_class_scope(&qualified);
        self.populate_class_scope(&mut scopes, class_scope, class);

        let mut body = BodyLowering {
            types: TypeSyntax::new(self.ctx, file, self.reporter),
            reporter: self.reporter,
            scopes: &mut scopes,
        };

        let fields = class
            .fields
            .values()
            .map(|decl| LoweredField {
                decl,
                init: decl
                    .initializer
                    .as_ref()
                    .map(|init| body.field_initializer(decl, init, class_scope)),
            })
            .collect();

        let constructors = class
            .constructors
            .values()
            .map(|decl| {
                self.reporter.set_member(Some(&decl.mangled_name()));
                let scope = body.member_scope(ScopeKind::Constructor, class_scope, false);
                body.declare_parameters(scope, &decl.param_names, &decl.signature.params);
                let block = body.constructor_body(&decl.body, scope);
                LoweredConstructor {
                    decl,
                    scope,
                    body: block,
                }
            })
            .collect();

        let methods = class
            .methods
            .values()
            .map(|decl| {
                self.reporter.set_member(Some(&decl.mangled_name()));
                let scope = body.member_scope(ScopeKind::Method, class_scope, decl.is_static());
                body.declare_parameters(scope, &decl.param_names, &decl.signature.params);
                let block = decl.body.as_ref().map(|b| body.block(b, scope));
                LoweredMethod {
                    decl,
                    scope,
                    body: block,
                }
            })
            .collect();

        self.reporter.set_member(None);
        Some(ClassUnit {
            class,
            file,
            scopes,
            class_scope,
            fields,
            constructors,
            methods,
        })
    }

    /// Own fields are declared; inherited ones only fill names not yet bound.
    fn populate_class_scope(&self, scopes: &mut ScopeTree, scope: ScopeId, class: &ClassDecl) {
        let qualified = class.qualified_name();
        for field in class.fields.values() {
            let binding = Binding::field(field.ty.clone(), field.is_static(), &qualified);
            if scopes.declare(scope, &field.name, binding).is_err() {
                self.reporter.report(
                    REDECLARED_VARIABLE,
                    format!("field {} declared twice", field.name),
                );
            }
        }
        for ancestor in self.ctx.hierarchy.ancestor_chain(&qualified).iter().skip(1) {
            let Some(decl) = self.ctx.class(ancestor) else {
                continue;
            };
            for field in decl.fields.values() {
                let binding = Binding::field(field.ty.clone(), field.is_static(), ancestor);
                scopes.inherit(scope, &field.name, binding);
            }
        }
    }
}

/// Lowers the bodies of one class, declaring into its scope tree.
struct BodyLowering<'a, 's> {
    types: TypeSyntax<'a>,
    reporter: &'a Reporter,
    scopes: &'s mut ScopeTree,
}

impl BodyLowering<'_, '_> {
    fn member_scope(&mut self, kind: ScopeKind, class_scope: ScopeId, is_static: bool) -> ScopeId {
        self.scopes.create_scope(kind, class_scope, is_static)
    }

    fn declare_parameters(&mut self, scope: ScopeId, names: &[String], types: &[Type]) {
        for (name, ty) in names.iter().zip(types) {
            if self
                .scopes
                .declare(scope, name, Binding::parameter(ty.clone()))
                .is_err()
            {
                self.reporter
                    .report(REDECLARED_VARIABLE, format!("parameter {} declared twice", name));
            }
        }
    }

    /// Instance initializers run inside constructors; static ones in a
    /// static context of their own.
    fn field_initializer(&mut self, decl: &FieldDecl, init: &Node, class_scope: ScopeId) -> Expr {
        let kind = if decl.is_static() {
            ScopeKind::Method
        } else {
            ScopeKind::Constructor
        };
        let scope = self.scopes.create_scope(kind, class_scope, decl.is_static());
        let expr = self.expr(init, scope);
        seed_initializer(&expr, &decl.ty);
        expr
    }

    fn block(&mut self, node: &Node, parent: ScopeId) -> Block {
        let scope = self.scopes.create_scope(ScopeKind::Block, parent, false);
        let stmts = node.nodes().map(|stmt| self.stmt(stmt, scope)).collect();
        Block { scope, stmts }
    }

    /// Like `block`, but a leading `this(...)`/`super(...)` is expected.
    fn constructor_body(&mut self, node: &Node, parent: ScopeId) -> Block {
        let scope = self.scopes.create_scope(ScopeKind::Block, parent, false);
        let mut stmts = Vec::new();
        for (index, stmt) in node.nodes().enumerate() {
            if index == 0 {
                if let Some(call) = self.delegation(stmt, scope) {
                    stmts.push(Stmt::Delegate(call));
                    continue;
                }
            }
            stmts.push(self.stmt(stmt, scope));
        }
        Block { scope, stmts }
    }

    /// `ExpressionStatement(CallExpression(-, -, "this" | "super", Arguments))`
    fn delegation(&mut self, stmt: &Node, scope: ScopeId) -> Option<ConstructorCall> {
        if !stmt.has_kind("ExpressionStatement") {
            return None;
        }
        let call = stmt.node(0).filter(|c| c.has_kind("CallExpression"))?;
        if call.node(0).is_some() {
            return None;
        }
        let kind = match call.token(2)? {
            "this" => Delegation::This,
            "super" => Delegation::Super,
            _ => return None,
        };
        Some(ConstructorCall {
            kind,
            args: self.args(call.node(3), scope),
            scope,
            target: OnceCell::new(),
        })
    }

    fn stmt(&mut self, node: &Node, scope: ScopeId) -> Stmt {
        trace!("lowering {}", node.kind());
        match node.kind() {
            "Block" => Stmt::Block(self.block(node, scope)),
            "ExpressionStatement" => match self.delegation(node, scope) {
                Some(call) => {
                    self.reporter.report(
                        MISPLACED_DELEGATION,
                        "this(...) or super(...) must be the first statement of a constructor",
                    );
                    Stmt::Delegate(call)
                }
                None => Stmt::Expr(self.operand(node, 0, scope)),
            },
            "ReturnStatement" => Stmt::Return(node.node(0).map(|e| self.expr(e, scope))),
            "FieldDeclaration" => Stmt::Local(self.locals(node, scope)),
            "ConditionalStatement" => Stmt::If {
                cond: self.operand(node, 0, scope),
                then: Box::new(self.nested(node.node(1), scope)),
                otherwise: node.node(2).map(|s| Box::new(self.stmt(s, scope))),
            },
            "WhileStatement" => Stmt::While {
                cond: self.operand(node, 0, scope),
                body: Box::new(self.nested(node.node(1), scope)),
            },
            "DoWhileStatement" => Stmt::DoWhile {
                body: Box::new(self.nested(node.node(0), scope)),
                cond: self.operand(node, 1, scope),
            },
            "ForStatement" => self.for_stmt(node, scope),
            "SwitchStatement" => self.switch_stmt(node, scope),
            "BreakStatement" => Stmt::Break,
            "ContinueStatement" => Stmt::Continue,
            "SynchronizedStatement" => Stmt::Synchronized {
                lock: self.operand(node, 0, scope),
                body: self.block_at(node.node(1), scope),
            },
            "TryCatchFinallyStatement" => self.try_stmt(node, scope),
            "ThrowStatement" => Stmt::Throw(self.operand(node, 0, scope)),
            "EmptyStatement" => Stmt::Empty,
            other => {
                self.reporter
                    .report(UNSUPPORTED_NODE, format!("statement {} is not translated", other));
                Stmt::Unsupported(other.to_string())
            }
        }
    }

    fn nested(&mut self, node: Option<&Node>, scope: ScopeId) -> Stmt {
        match node {
            Some(node) => self.stmt(node, scope),
            None => Stmt::Empty,
        }
    }

    fn block_at(&mut self, node: Option<&Node>, scope: ScopeId) -> Block {
        match node {
            Some(node) => self.block(node, scope),
            None => Block {
                scope,
                stmts: Vec::new(),
            },
        }
    }

    /// `FieldDeclaration(Modifiers, Type, Declarators)` inside a body.
    fn locals(&mut self, node: &Node, scope: ScopeId) -> Vec<LocalVar> {
        let base = node
            .node(1)
            .map(|t| self.types.resolve(t))
            .unwrap_or_else(Type::void);
        let mut vars = Vec::new();
        for declarator in node.node(2).into_iter().flat_map(|d| d.nodes()) {
            let name = declarator.token(0).unwrap_or_default();
            let ty = self
                .types
                .with_dimensions(base.clone(), dimension_count(declarator.node(1)));
            let init = declarator.node(2).map(|e| self.expr(e, scope));
            if let Some(init) = &init {
                seed_initializer(init, &ty);
            }
            if self
                .scopes
                .declare(scope, name, Binding::local(ty.clone()))
                .is_err()
            {
                self.reporter.report(
                    REDECLARED_VARIABLE,
                    format!("variable {} is already defined in this scope", name),
                );
                continue;
            }
            vars.push(LocalVar {
                name: name.to_string(),
                ty,
                init,
            });
        }
        vars
    }

    /// `ForStatement(BasicForControl(Modifiers?, Type?, Declarators | ExpressionList, cond?, update?), body)`
    fn for_stmt(&mut self, node: &Node, scope: ScopeId) -> Stmt {
        let scope = self.scopes.create_scope(ScopeKind::Block, scope, false);
        let control = node.node(0);
        let init = control.and_then(|c| {
            let init = c.node(2)?;
            Some(if init.has_kind("Declarators") {
                ForInit::Decls(self.locals(c, scope))
            } else {
                ForInit::Exprs(init.nodes().map(|e| self.expr(e, scope)).collect())
            })
        });
        let cond = control.and_then(|c| c.node(3)).map(|e| self.expr(e, scope));
        let update = control
            .and_then(|c| c.node(4))
            .into_iter()
            .flat_map(|list| list.nodes())
            .map(|e| self.expr(e, scope))
            .collect();
        Stmt::For {
            init,
            cond,
            update,
            body: Box::new(self.nested(node.node(1), scope)),
        }
    }

    fn switch_stmt(&mut self, node: &Node, scope: ScopeId) -> Stmt {
        let selector = self.operand(node, 0, scope);
        let body_scope = self.scopes.create_scope(ScopeKind::Block, scope, false);
        let mut clauses = Vec::new();
        for clause in node.nodes().skip(1) {
            let (label, stmts) = match clause.kind() {
                "CaseClause" => (
                    Some(self.operand(clause, 0, body_scope)),
                    clause.nodes().skip(1).collect::<Vec<_>>(),
                ),
                "DefaultClause" => (None, clause.nodes().collect()),
                other => {
                    self.reporter
                        .report(UNSUPPORTED_NODE, format!("switch clause {}", other));
                    continue;
                }
            };
            let body = stmts
                .into_iter()
                .map(|stmt| self.stmt(stmt, body_scope))
                .collect();
            clauses.push(SwitchClause { label, body });
        }
        Stmt::Switch { selector, clauses }
    }

    fn try_stmt(&mut self, node: &Node, scope: ScopeId) -> Stmt {
        let body = self.block_at(node.node(0), scope);
        let mut catches = Vec::new();
        let mut finally = None;
        for child in node.nodes().skip(1) {
            match child.kind() {
                "CatchClause" => {
                    let catch_scope = self.scopes.create_scope(ScopeKind::Block, scope, false);
                    let param = child.node(0);
                    let ty = param
                        .and_then(|p| p.node(1))
                        .map(|t| self.types.resolve(t))
                        .unwrap_or_else(Type::object);
                    let name = param.and_then(|p| p.token(3)).unwrap_or_default();
                    let _ = self.scopes.declare(catch_scope, name, Binding::local(ty.clone()));
                    catches.push(CatchClause {
                        ty,
                        name: name.to_string(),
                        body: self.block_at(child.node(1), catch_scope),
                    });
                }
                "Block" => finally = Some(self.block(child, scope)),
                other => self
                    .reporter
                    .report(UNSUPPORTED_NODE, format!("try clause {}", other)),
            }
        }
        Stmt::Try {
            body,
            catches,
            finally,
        }
    }

    fn operand(&self, node: &Node, index: usize, scope: ScopeId) -> Expr {
        match node.node(index) {
            Some(child) => self.expr(child, scope),
            None => {
                self.reporter.report(
                    UNSUPPORTED_NODE,
                    format!("{} is missing operand {}", node.kind(), index),
                );
                Expr::new(ExprKind::Unsupported(node.kind().to_string()), scope)
            }
        }
    }

    fn boxed(&self, node: &Node, index: usize, scope: ScopeId) -> Box<Expr> {
        Box::new(self.operand(node, index, scope))
    }

    fn args(&self, node: Option<&Node>, scope: ScopeId) -> Vec<Expr> {
        node.into_iter()
            .flat_map(|args| args.nodes())
            .map(|arg| self.expr(arg, scope))
            .collect()
    }

    fn expr(&self, node: &Node, scope: ScopeId) -> Expr {
        let kind = match node.kind() {
            "IntegerLiteral" => literal(node, |text| {
                if text.ends_with(['l', 'L']) {
                    LiteralKind::Long
                } else {
                    LiteralKind::Integer
                }
            }),
            "FloatingPointLiteral" => literal(node, |text| {
                if text.ends_with(['f', 'F']) {
                    LiteralKind::Float
                } else {
                    LiteralKind::Double
                }
            }),
            "CharacterLiteral" => literal(node, |_| LiteralKind::Char),
            "StringLiteral" => literal(node, |_| LiteralKind::String),
            "BooleanLiteral" => literal(node, |_| LiteralKind::Boolean),
            "NullLiteral" => ExprKind::Literal(Literal {
                kind: LiteralKind::Null,
                text: "null".to_string(),
            }),
            "PrimaryIdentifier" => ExprKind::Identifier(Identifier {
                name: node.token(0).unwrap_or_default().to_string(),
                target: OnceCell::new(),
            }),
            "ThisExpression" => ExprKind::This,
            "SuperExpression" => ExprKind::Super,
            "Expression" => ExprKind::Assign {
                op: node.token(1).unwrap_or("=").to_string(),
                target: self.boxed(node, 0, scope),
                value: self.boxed(node, 2, scope),
            },
            "UnaryExpression" => ExprKind::Unary {
                op: node.token(0).unwrap_or_default().to_string(),
                operand: self.boxed(node, 1, scope),
            },
            "LogicalNegationExpression" => ExprKind::Unary {
                op: "!".to_string(),
                operand: self.boxed(node, 0, scope),
            },
            "BitwiseNegationExpression" => ExprKind::Unary {
                op: "~".to_string(),
                operand: self.boxed(node, 0, scope),
            },
            "PostfixExpression" => ExprKind::Postfix {
                op: node.token(1).unwrap_or_default().to_string(),
                operand: self.boxed(node, 0, scope),
            },
            "ConditionalExpression" => ExprKind::Conditional {
                cond: self.boxed(node, 0, scope),
                then: self.boxed(node, 1, scope),
                otherwise: self.boxed(node, 2, scope),
            },
            "CallExpression" => ExprKind::Call(Box::new(self.call(node, scope))),
            "SelectionExpression" => ExprKind::Selection(Box::new(Selection {
                base: self.operand(node, 0, scope),
                name: node.token(1).unwrap_or_default().to_string(),
                target: OnceCell::new(),
            })),
            "SubscriptExpression" => return self.subscript(node, scope),
            "CastExpression" => ExprKind::Cast {
                target: self.type_at(node, 0),
                operand: self.boxed(node, 1, scope),
                basic: false,
            },
            "BasicCastExpression" => {
                let base = self.type_at(node, 0);
                ExprKind::Cast {
                    target: self.types.with_dimensions(base, dimension_count(node.node(1))),
                    operand: self.boxed(node, 2, scope),
                    basic: true,
                }
            }
            "InstanceOfExpression" => ExprKind::InstanceOf {
                operand: self.boxed(node, 0, scope),
                target: self.type_at(node, 1),
            },
            "NewClassExpression" => {
                if node.node(4).is_some() {
                    self.reporter
                        .report(UNSUPPORTED_NODE, "anonymous classes are not translated");
                    ExprKind::Unsupported(node.kind().to_string())
                } else {
                    ExprKind::NewObject(Box::new(NewObject {
                        class: self.type_at(node, 2),
                        args: self.args(node.node(3), scope),
                        target: OnceCell::new(),
                    }))
                }
            }
            "NewArrayExpression" => ExprKind::NewArray(Box::new(self.new_array(node, scope))),
            "ArrayInitializer" => ExprKind::ArrayInit {
                elements: node.nodes().map(|e| self.expr(e, scope)).collect(),
            },
            "ClassLiteralExpression" => ExprKind::ClassLiteral(self.type_at(node, 0)),
            kind => match BinaryCategory::from_node_kind(kind) {
                Some(category) => self.binary(node, category, scope),
                None => {
                    self.reporter
                        .report(UNSUPPORTED_NODE, format!("expression {} is not translated", kind));
                    ExprKind::Unsupported(kind.to_string())
                }
            },
        };
        Expr::new(kind, scope)
    }

    fn binary(&self, node: &Node, category: BinaryCategory, scope: ScopeId) -> ExprKind {
        match category.implied_operator() {
            Some(op) => ExprKind::Binary {
                category,
                op: op.to_string(),
                left: self.boxed(node, 0, scope),
                right: self.boxed(node, 1, scope),
            },
            None => ExprKind::Binary {
                category,
                op: node.token(1).unwrap_or_default().to_string(),
                left: self.boxed(node, 0, scope),
                right: self.boxed(node, 2, scope),
            },
        }
    }

    /// `CallExpression(receiver?, typeArgs?, name, Arguments)`
    fn call(&self, node: &Node, scope: ScopeId) -> Call {
        let name = node.token(2).unwrap_or_default().to_string();
        let receiver = node.node(0);
        let print = match name.as_str() {
            "print" if receiver.is_some_and(is_system_out) => Some(PrintKind::Print),
            "println" if receiver.is_some_and(is_system_out) => Some(PrintKind::Println),
            _ => None,
        };
        Call {
            receiver: match print {
                Some(_) => None,
                None => receiver.map(|r| self.expr(r, scope)),
            },
            name,
            args: self.args(node.node(3), scope),
            print,
            target: OnceCell::new(),
        }
    }

    /// `a[i][j]` arrives either nested or as one node with several indices.
    fn subscript(&self, node: &Node, scope: ScopeId) -> Expr {
        let mut expr = self.operand(node, 0, scope);
        for index in 1..node.size().max(2) {
            let index = self.operand(node, index, scope);
            expr = Expr::new(
                ExprKind::Subscript {
                    base: Box::new(expr),
                    index: Box::new(index),
                },
                scope,
            );
        }
        expr
    }

    /// `NewArrayExpression(elementType, ConcreteDimensions?, Dimensions?, ArrayInitializer?)`
    fn new_array(&self, node: &Node, scope: ScopeId) -> NewArray {
        let element = self.type_at(node, 0);
        let sizes: Vec<Expr> = node
            .node(1)
            .into_iter()
            .flat_map(|dims| dims.nodes())
            .map(|size| self.expr(size, scope))
            .collect();
        let extra_dims = dimension_count(node.node(2)).max(0) as u32;
        let init = node.node(3).map(|init| {
            let init = self.expr(init, scope);
            let total = sizes.len() as u32 + extra_dims;
            seed_initializer(&init, &Type::array(element.clone(), total));
            init
        });
        NewArray {
            element,
            sizes,
            extra_dims,
            init,
        }
    }

    fn type_at(&self, node: &Node, index: usize) -> Type {
        match node.node(index) {
            Some(ty) => self.types.resolve(ty),
            None => {
                self.reporter
                    .report(UNSUPPORTED_NODE, format!("{} has no type", node.kind()));
                Type::void()
            }
        }
    }
}

fn literal(node: &Node, kind: impl Fn(&str) -> LiteralKind) -> ExprKind {
    let text = node.token(0).unwrap_or_default();
    ExprKind::Literal(Literal {
        kind: kind(text),
        text: text.to_string(),
    })
}

/// `System.out`
fn is_system_out(node: &Node) -> bool {
    node.has_kind("SelectionExpression")
        && node.token(1) == Some("out")
        && node
            .node(0)
            .is_some_and(|base| base.has_kind("PrimaryIdentifier") && base.token(0) == Some("System"))
}

/// Give a (possibly nested) array initializer the type its context declares.
fn seed_initializer(expr: &Expr, ty: &Type) {
    let ExprKind::ArrayInit { elements } = &expr.kind else {
        return;
    };
    if !ty.is_array() {
        return;
    }
    expr.seed_type(ty.clone());
    if let Some(element) = ty.element_type() {
        for child in elements {
            seed_initializer(child, &element);
        }
    }
}
