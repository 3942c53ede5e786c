//! Static types of expressions, computed on demand and memoized.
//!
//! [`Resolver::resolve`] fills an expression's type slot the first time it
//! is asked and answers from the slot afterwards. Names, selected members
//! and call targets are memoized the same way on the nodes that carry them.

use super::builtins::{fallback_return_type, static_field};
use super::lowering::ClassUnit;
use super::node::*;
use super::overload::{OverloadResolver, Resolution};
use super::scopes::{BindingKind, ScopeId, ScopeTree};
use super::symbols::{ClassDecl, ClassLookup, CompilationContext, FileEnv};
use super::types::{
    additive_result, bitwise_result, numeric_promotion, ClassType, Type, ROOT_CLASS_QUALIFIED,
};
use crate::error::Reporter;
use crate::error_codes::{
    AMBIGUOUS_TYPE, NEGATIVE_DIMENSIONS, RECURSIVE_RESOLUTION, UNRESOLVED_FIELD,
    UNRESOLVED_IDENTIFIER,
};
use log::trace;

/// Resolves expressions of one class unit.
pub struct Resolver<'a> {
    ctx: &'a CompilationContext,
    scopes: &'a ScopeTree,
    file: &'a FileEnv,
    reporter: &'a Reporter,
}

impl<'a> Resolver<'a> {
    pub fn new(ctx: &'a CompilationContext, unit: &'a ClassUnit<'a>, reporter: &'a Reporter) -> Self {
        Self {
            ctx,
            scopes: &unit.scopes,
            file: unit.file,
            reporter,
        }
    }

    pub fn context(&self) -> &'a CompilationContext {
        self.ctx
    }

    pub fn scopes(&self) -> &'a ScopeTree {
        self.scopes
    }

    pub fn reporter(&self) -> &'a Reporter {
        self.reporter
    }

    /// The static type of `expr`.
    pub fn resolve(&self, expr: &Expr) -> Type {
        if let Some(ty) = expr.cached_type() {
            return ty.clone();
        }
        if !expr.begin_resolution() {
            self.reporter.report(
                RECURSIVE_RESOLUTION,
                format!("{} depends on its own type", expr.kind_name()),
            );
            return Type::void();
        }
        let ty = self.compute(expr);
        expr.end_resolution();
        trace!("{} : {}", expr.kind_name(), ty);
        expr.seed_type(ty).clone()
    }

    fn compute(&self, expr: &Expr) -> Type {
        let scope = expr.scope;
        match &expr.kind {
            ExprKind::Literal(literal) => literal_type(literal.kind),
            ExprKind::Identifier(ident) => {
                let (target, ty) = self.resolve_name(&ident.name, scope);
                ident.target.get_or_init(|| target);
                ty
            }
            ExprKind::This => self.enclosing_type(scope),
            ExprKind::Super => self.superclass_type(scope),
            ExprKind::Binary {
                category,
                op,
                left,
                right,
            } => {
                let left = self.resolve(left);
                let right = self.resolve(right);
                match category {
                    BinaryCategory::Additive if op == "+" => additive_result(&left, &right),
                    BinaryCategory::Additive | BinaryCategory::Multiplicative => {
                        numeric_promotion(&left, &right)
                    }
                    BinaryCategory::Shift => left,
                    BinaryCategory::Relational
                    | BinaryCategory::Equality
                    | BinaryCategory::LogicalAnd
                    | BinaryCategory::LogicalOr => Type::boolean(),
                    BinaryCategory::BitwiseAnd
                    | BinaryCategory::BitwiseOr
                    | BinaryCategory::BitwiseXor => bitwise_result(&left, &right),
                }
            }
            ExprKind::Assign { target, value, .. } => {
                self.resolve(value);
                self.resolve(target)
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.resolve(operand);
                match op.as_str() {
                    "!" => Type::boolean(),
                    "++" | "--" => ty,
                    _ if ty.is_numeric() => numeric_promotion(&ty, &Type::int()),
                    _ => ty,
                }
            }
            ExprKind::Postfix { operand, .. } => self.resolve(operand),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => {
                self.resolve(cond);
                let other = self.resolve(otherwise);
                let ty = self.resolve(then);
                if then.is_null_literal() {
                    other
                } else {
                    ty
                }
            }
            ExprKind::Call(call) => self.call_type(call, scope),
            ExprKind::Selection(selection) => {
                let (target, ty) = self.resolve_selection(selection);
                selection.target.get_or_init(|| target);
                ty
            }
            ExprKind::Subscript { base, index } => {
                self.resolve(index);
                let base = self.resolve(base);
                match base.adjust_dimensions(-1) {
                    Ok(element) => element,
                    Err(err) => {
                        self.reporter.report(
                            NEGATIVE_DIMENSIONS,
                            format!("subscript of non-array {}: {}", base, err),
                        );
                        base
                    }
                }
            }
            ExprKind::Cast {
                target, operand, ..
            } => {
                self.resolve(operand);
                target.clone()
            }
            ExprKind::InstanceOf { operand, .. } => {
                self.resolve(operand);
                Type::boolean()
            }
            ExprKind::NewObject(new) => {
                self.constructor_target(new);
                new.class.clone()
            }
            ExprKind::NewArray(array) => {
                for size in &array.sizes {
                    self.resolve(size);
                }
                let dims = array.sizes.len() as u32 + array.extra_dims;
                let ty = Type::array(array.element.clone(), dims);
                if let Some(init) = &array.init {
                    init.seed_type(ty.clone());
                    self.resolve(init);
                }
                ty
            }
            ExprKind::ArrayInit { elements } => {
                let types: Vec<Type> = elements.iter().map(|e| self.resolve(e)).collect();
                types
                    .first()
                    .map(Type::array_of)
                    .unwrap_or_else(|| Type::object().array_of())
            }
            ExprKind::ClassLiteral(_) => Type::class_token(),
            ExprKind::Unsupported(_) => Type::void(),
        }
    }

    /// Scope chain first, then a visible class, then nothing.
    fn resolve_name(&self, name: &str, scope: ScopeId) -> (NameTarget, Type) {
        if let Some((binding, _)) = self.scopes.lookup(scope, name) {
            let target = match binding.kind {
                BindingKind::Field => NameTarget::Field {
                    owner: binding.owner.clone().unwrap_or_default(),
                    is_static: binding.is_static,
                },
                BindingKind::Local | BindingKind::Parameter => NameTarget::Local,
            };
            return (target, binding.ty.clone());
        }

        match self.ctx.lookup_class(name, self.file) {
            ClassLookup::Found(qualified) => self.class_target(qualified),
            ClassLookup::Ambiguous(candidates) => {
                self.reporter.report(
                    AMBIGUOUS_TYPE,
                    format!("{} may be any of {}", name, candidates.join(", ")),
                );
                self.class_target(candidates[0].clone())
            }
            ClassLookup::Missing => {
                self.reporter
                    .report(UNRESOLVED_IDENTIFIER, format!("cannot find symbol {}", name));
                (NameTarget::Unresolved, Type::void())
            }
        }
    }

    fn class_target(&self, qualified: String) -> (NameTarget, Type) {
        let ty = Type::Class(ClassType::from_qualified(&qualified));
        (NameTarget::Class(qualified), ty)
    }

    fn resolve_selection(&self, selection: &Selection) -> (NameTarget, Type) {
        let base = self.resolve(&selection.base);
        let name = selection.name.as_str();

        if let Some(class) = self.class_name(&selection.base) {
            if let Some(field) = self.ctx.find_field(&class, name) {
                let target = NameTarget::Field {
                    owner: field.owner.clone(),
                    is_static: field.is_static(),
                };
                return (target, field.ty.clone());
            }
            let simple = ClassType::from_qualified(&class).name;
            if let Some(ty) = static_field(&simple, name) {
                return (NameTarget::RuntimeStatic { class }, ty);
            }
            self.reporter
                .report(UNRESOLVED_FIELD, format!("{} has no static field {}", class, name));
            return (NameTarget::Unresolved, Type::void());
        }

        if base.is_array() && name == "length" {
            return (NameTarget::ArrayLength, Type::int());
        }
        if let Some(class) = base.class_type() {
            let qualified = class.qualified_name();
            if let Some(field) = self.ctx.find_field(&qualified, name) {
                let target = NameTarget::Field {
                    owner: field.owner.clone(),
                    is_static: field.is_static(),
                };
                return (target, field.ty.clone());
            }
        }
        if !base.is_void() {
            self.reporter
                .report(UNRESOLVED_FIELD, format!("{} has no field {}", base, name));
        }
        (NameTarget::Unresolved, Type::void())
    }

    /// The class an expression names, when it is used for static access.
    pub fn class_name(&self, expr: &Expr) -> Option<String> {
        let ExprKind::Identifier(ident) = &expr.kind else {
            return None;
        };
        self.resolve(expr);
        match ident.target.get() {
            Some(NameTarget::Class(qualified)) => Some(qualified.clone()),
            _ => None,
        }
    }

    /// What an identifier denotes; resolves it first if needed.
    pub fn name_target(&self, ident: &Identifier, expr: &Expr) -> NameTarget {
        self.resolve(expr);
        ident.target.get().cloned().unwrap_or(NameTarget::Unresolved)
    }

    pub fn selection_target(&self, selection: &Selection, expr: &Expr) -> NameTarget {
        self.resolve(expr);
        selection
            .target
            .get()
            .cloned()
            .unwrap_or(NameTarget::Unresolved)
    }

    fn call_type(&self, call: &Call, scope: ScopeId) -> Type {
        if call.print.is_some() {
            for arg in &call.args {
                self.resolve(arg);
            }
            return Type::void();
        }
        let resolution = self.call_target(call, scope);
        match resolution.return_type() {
            Some(ty) => ty.clone(),
            None => fallback_return_type(resolution.base_name(), &resolution.mangled),
        }
    }

    /// The method a call invokes, memoized on the call.
    pub fn call_target<'e>(&self, call: &'e Call, scope: ScopeId) -> &'e Resolution {
        if let Some(resolution) = call.target.get() {
            return resolution;
        }
        let args: Vec<Type> = call.args.iter().map(|arg| self.resolve(arg)).collect();
        let class = self.call_class(call, scope);
        let resolution =
            OverloadResolver::new(self.ctx).resolve_method(class.as_deref(), &call.name, &args);
        trace!(
            "call {} in {:?} -> {} (level {})",
            call.name,
            class,
            resolution.mangled,
            resolution.level
        );
        call.target.get_or_init(|| resolution)
    }

    /// The receiver's static class, or the enclosing class without one.
    fn call_class(&self, call: &Call, scope: ScopeId) -> Option<String> {
        let Some(receiver) = &call.receiver else {
            return self.scopes.enclosing_class(scope).map(str::to_string);
        };
        match self.resolve(receiver) {
            Type::Class(class) => Some(class.qualified_name()),
            Type::Array { .. } => Some(ROOT_CLASS_QUALIFIED.to_string()),
            Type::Primitive(_) => None,
        }
    }

    pub fn constructor_target<'e>(&self, new: &'e NewObject) -> &'e Resolution {
        if let Some(resolution) = new.target.get() {
            return resolution;
        }
        let args: Vec<Type> = new.args.iter().map(|arg| self.resolve(arg)).collect();
        let class = match new.class.class_type() {
            Some(class) => class.qualified_name(),
            None => new.class.canonical_tag(),
        };
        let resolution = OverloadResolver::new(self.ctx).resolve_constructor(&class, &args);
        new.target.get_or_init(|| resolution)
    }

    /// Target of `this(...)` or `super(...)`.
    pub fn delegation_target<'e>(&self, call: &'e ConstructorCall) -> &'e Resolution {
        if let Some(resolution) = call.target.get() {
            return resolution;
        }
        let args: Vec<Type> = call.args.iter().map(|arg| self.resolve(arg)).collect();
        let class = match call.kind {
            Delegation::This => self.scopes.enclosing_class(call.scope).map(str::to_string),
            Delegation::Super => self.superclass_name(call.scope),
        }
        .unwrap_or_else(|| ROOT_CLASS_QUALIFIED.to_string());
        let resolution = OverloadResolver::new(self.ctx).resolve_constructor(&class, &args);
        call.target.get_or_init(|| resolution)
    }

    pub fn enclosing_class(&self, scope: ScopeId) -> Option<&'a ClassDecl> {
        self.scopes
            .enclosing_class(scope)
            .and_then(|name| self.ctx.class(name))
    }

    pub fn superclass_name(&self, scope: ScopeId) -> Option<String> {
        self.enclosing_class(scope)
            .and_then(|class| class.superclass.clone())
    }

    fn enclosing_type(&self, scope: ScopeId) -> Type {
        self.enclosing_class(scope)
            .map(ClassDecl::as_type)
            .unwrap_or_else(Type::void)
    }

    fn superclass_type(&self, scope: ScopeId) -> Type {
        let name = self
            .superclass_name(scope)
            .unwrap_or_else(|| ROOT_CLASS_QUALIFIED.to_string());
        Type::Class(ClassType::from_qualified(&name))
    }
}

fn literal_type(kind: LiteralKind) -> Type {
    match kind {
        LiteralKind::Integer => Type::int(),
        LiteralKind::Long => Type::long(),
        LiteralKind::Float => Type::float(),
        LiteralKind::Double => Type::double(),
        LiteralKind::Char => Type::char(),
        LiteralKind::String => Type::string(),
        LiteralKind::Boolean => Type::boolean(),
        LiteralKind::Null => Type::object(),
    }
}
