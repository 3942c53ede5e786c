//! Which references a statement dereferences, so guards can precede it.
//!
//! Guards are collected for the receivers of instance calls, the bases of
//! field selections and identifiers that are subscripted. Class names,
//! `this`, `super`, literals and primitive values are never guarded. Operands
//! that run only conditionally (the right side of `&&`/`||` and the arms of
//! `?:`) are not entered, since guarding them up front would fire on paths
//! the source never takes.

use super::node::*;
use super::type_resolution::Resolver;
use crate::error_codes::NULL_CHECK_DEPTH;
use log::trace;

pub struct NullCheckPass<'r, 'a> {
    resolver: &'r Resolver<'a>,
    max_depth: usize,
}

impl<'r, 'a> NullCheckPass<'r, 'a> {
    pub fn new(resolver: &'r Resolver<'a>, max_depth: usize) -> Self {
        Self {
            resolver,
            max_depth,
        }
    }

    /// Sub-expressions of `expr` to guard, innermost first.
    pub fn collect<'e>(&self, expr: &'e Expr) -> Vec<&'e Expr> {
        let mut guards = Vec::new();
        let mut truncated = false;
        self.walk(expr, 0, &mut guards, &mut truncated);
        if truncated {
            self.resolver.reporter().report(
                NULL_CHECK_DEPTH,
                format!("expression nested deeper than {} levels", self.max_depth),
            );
        }
        trace!("{} null guard(s) for {}", guards.len(), expr.kind_name());
        guards
    }

    /// Whether `expr` denotes a reference that may be null.
    pub fn is_guardable(&self, expr: &Expr) -> bool {
        let guardable = match &expr.kind {
            ExprKind::Identifier(ident) => !matches!(
                self.resolver.name_target(ident, expr),
                NameTarget::Class(_) | NameTarget::Unresolved
            ),
            ExprKind::Selection(selection) => !matches!(
                self.resolver.selection_target(selection, expr),
                NameTarget::RuntimeStatic { .. } | NameTarget::Unresolved
            ),
            ExprKind::Subscript { .. } => true,
            _ => false,
        };
        guardable && is_repeatable(expr) && self.resolver.resolve(expr).is_reference()
    }

    fn walk<'e>(&self, expr: &'e Expr, depth: usize, out: &mut Vec<&'e Expr>, truncated: &mut bool) {
        if depth > self.max_depth {
            *truncated = true;
            return;
        }
        let next = depth + 1;
        match &expr.kind {
            ExprKind::Call(call) => {
                if let Some(receiver) = &call.receiver {
                    self.walk(receiver, next, out, truncated);
                    let target = self.resolver.call_target(call, expr.scope);
                    if !target.is_static() && self.is_guardable(receiver) {
                        out.push(receiver);
                    }
                }
                for arg in &call.args {
                    self.walk(arg, next, out, truncated);
                }
            }
            ExprKind::Selection(selection) => {
                self.walk(&selection.base, next, out, truncated);
                let dereferences = match self.resolver.selection_target(selection, expr) {
                    NameTarget::Field { is_static, .. } => !is_static,
                    NameTarget::ArrayLength => true,
                    _ => false,
                };
                if dereferences && self.is_guardable(&selection.base) {
                    out.push(&selection.base);
                }
            }
            ExprKind::Subscript { base, index } => {
                self.walk(base, next, out, truncated);
                if matches!(base.kind, ExprKind::Identifier(_)) && self.is_guardable(base) {
                    out.push(base);
                }
                self.walk(index, next, out, truncated);
            }
            ExprKind::Binary {
                category, left, right, ..
            } => {
                self.walk(left, next, out, truncated);
                if !matches!(category, BinaryCategory::LogicalAnd | BinaryCategory::LogicalOr) {
                    self.walk(right, next, out, truncated);
                }
            }
            ExprKind::Conditional { cond, .. } => self.walk(cond, next, out, truncated),
            ExprKind::Assign { target, value, .. } => {
                self.walk(target, next, out, truncated);
                self.walk(value, next, out, truncated);
            }
            ExprKind::Unary { operand, .. }
            | ExprKind::Postfix { operand, .. }
            | ExprKind::Cast { operand, .. }
            | ExprKind::InstanceOf { operand, .. } => self.walk(operand, next, out, truncated),
            ExprKind::NewObject(new) => {
                for arg in &new.args {
                    self.walk(arg, next, out, truncated);
                }
            }
            ExprKind::NewArray(array) => {
                for size in &array.sizes {
                    self.walk(size, next, out, truncated);
                }
                if let Some(init) = &array.init {
                    self.walk(init, next, out, truncated);
                }
            }
            ExprKind::ArrayInit { elements } => {
                for element in elements {
                    self.walk(element, next, out, truncated);
                }
            }
            ExprKind::Literal(_)
            | ExprKind::Identifier(_)
            | ExprKind::This
            | ExprKind::Super
            | ExprKind::ClassLiteral(_)
            | ExprKind::Unsupported(_) => {}
        }
    }
}

/// A guard evaluates its operand a second time, so the operand must be free
/// of side effects.
fn is_repeatable(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Identifier(_) | ExprKind::This | ExprKind::Super => true,
        ExprKind::Selection(selection) => is_repeatable(&selection.base),
        ExprKind::Subscript { base, index } => is_repeatable(base) && is_repeatable(index),
        ExprKind::Binary { left, right, .. } => is_repeatable(left) && is_repeatable(right),
        ExprKind::Unary { op, operand } => op != "++" && op != "--" && is_repeatable(operand),
        ExprKind::Cast { operand, .. } => is_repeatable(operand),
        _ => false,
    }
}
