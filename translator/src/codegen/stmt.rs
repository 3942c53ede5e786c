//! Statement lowering. Control flow maps one to one onto the target's
//! native constructs; only `synchronized` and `finally` need support code.

use super::expr::{with_this, ExprEmitter};
use super::names::Naming;
use super::printer::Printer;
use crate::tast::node::*;
use crate::tast::null_check::NullCheckPass;
use crate::tast::type_resolution::Resolver;
use crate::tast::types::{Type, ROOT_CLASS_QUALIFIED};

pub struct StmtEmitter<'r, 'a> {
    exprs: ExprEmitter<'r, 'a>,
    null_checks: Option<NullCheckPass<'r, 'a>>,
    names: &'r Naming<'r>,
    return_type: Type,
}

impl<'r, 'a> StmtEmitter<'r, 'a> {
    /// Emitter for the body of a member returning `return_type`.
    pub fn new(resolver: &'r Resolver<'a>, names: &'r Naming<'r>, return_type: Type) -> Self {
        let config = names.config();
        let null_checks = config
            .null_checks
            .then(|| NullCheckPass::new(resolver, config.max_null_check_depth));
        Self {
            exprs: ExprEmitter::new(resolver, names),
            null_checks,
            names,
            return_type,
        }
    }

    pub fn exprs(&self) -> &ExprEmitter<'r, 'a> {
        &self.exprs
    }

    /// The statements of `block`, without braces.
    pub fn emit_statements(&self, stmts: &[Stmt], out: &mut Printer) {
        for stmt in stmts {
            self.emit(stmt, out);
        }
    }

    pub fn emit(&self, stmt: &Stmt, out: &mut Printer) {
        match stmt {
            Stmt::Block(block) => {
                out.open("{");
                self.emit_statements(&block.stmts, out);
                out.close("}");
            }
            Stmt::Expr(expr) => {
                self.guards(expr, out);
                out.line(&format!("{};", self.exprs.emit(expr)));
            }
            Stmt::Return(None) => {
                out.line("return;");
            }
            Stmt::Return(Some(expr)) => {
                self.guards(expr, out);
                out.line(&format!("return {};", self.exprs.coerce(expr, &self.return_type)));
            }
            Stmt::Local(vars) => {
                for var in vars {
                    if let Some(init) = &var.init {
                        self.guards(init, out);
                    }
                    out.line(&format!("{};", self.local(var)));
                }
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                self.guards(cond, out);
                out.open(&format!("if ({}) {{", self.exprs.emit(cond)));
                self.emit_body(then, out);
                let mut otherwise = otherwise.as_deref();
                while let Some(next) = otherwise {
                    match next {
                        Stmt::If {
                            cond,
                            then,
                            otherwise: rest,
                        } => {
                            out.decr()
                                .open(&format!("}} else if ({}) {{", self.guarded(cond)));
                            self.emit_body(then, out);
                            otherwise = rest.as_deref();
                        }
                        other => {
                            out.decr().open("} else {");
                            self.emit_body(other, out);
                            otherwise = None;
                        }
                    }
                }
                out.close("}");
            }
            Stmt::While { cond, body } => {
                out.open(&format!("while ({}) {{", self.guarded(cond)));
                self.emit_body(body, out);
                out.close("}");
            }
            Stmt::DoWhile { body, cond } => {
                out.open("do {");
                self.emit_body(body, out);
                out.close(&format!("}} while ({});", self.guarded(cond)));
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => self.for_stmt(init.as_ref(), cond.as_ref(), update, body, out),
            Stmt::Switch { selector, clauses } => {
                self.guards(selector, out);
                out.open(&format!("switch ({}) {{", self.exprs.emit(selector)));
                for clause in clauses {
                    match &clause.label {
                        Some(label) => out.line(&format!("case {}:", self.exprs.emit(label))),
                        None => out.line("default:"),
                    };
                    out.incr();
                    self.emit_statements(&clause.body, out);
                    out.decr();
                }
                out.close("}");
            }
            Stmt::Break => {
                out.line("break;");
            }
            Stmt::Continue => {
                out.line("continue;");
            }
            Stmt::Synchronized { lock, body } => {
                self.guards(lock, out);
                out.open("{");
                out.line(&format!(
                    "{} $monitor$({});",
                    self.names.rt("Monitor"),
                    self.exprs.coerce(lock, &Type::object())
                ));
                self.emit_statements(&body.stmts, out);
                out.close("}");
            }
            Stmt::Try {
                body,
                catches,
                finally,
            } => self.try_stmt(body, catches, finally.as_ref(), out),
            Stmt::Throw(expr) => {
                self.guards(expr, out);
                out.line(&format!("throw {};", self.exprs.emit(expr)));
            }
            Stmt::Delegate(call) => self.delegation(call, out),
            Stmt::Empty => {
                out.line(";");
            }
            Stmt::Unsupported(kind) => {
                out.line(&format!("// unsupported: {}", kind));
            }
        }
    }

    /// The body of a compound statement, inside braces its parent opened.
    fn emit_body(&self, stmt: &Stmt, out: &mut Printer) {
        match stmt {
            Stmt::Block(block) => self.emit_statements(&block.stmts, out),
            Stmt::Empty => {}
            other => self.emit(other, out),
        }
    }

    /// `T $x = init` without the semicolon.
    fn local(&self, var: &LocalVar) -> String {
        let name = self.names.variable(&var.name);
        let ty = self.names.ty(&var.ty);
        match &var.init {
            Some(init) => format!("{} {} = {}", ty, name, self.exprs.coerce(init, &var.ty)),
            None => format!("{} {}", ty, name),
        }
    }

    fn for_stmt(
        &self,
        init: Option<&ForInit>,
        cond: Option<&Expr>,
        update: &[Expr],
        body: &Stmt,
        out: &mut Printer,
    ) {
        let cond = cond.map(|c| self.guarded(c)).unwrap_or_default();
        let update: Vec<String> = update.iter().map(|u| self.guarded(u)).collect();
        let header = |init: &str| format!("for ({}; {}; {}) {{", init, cond, update.join(", "));

        match init {
            // Declarations of differing types cannot share one clause, and a
            // declarator list binds `*` to the first name only.
            Some(ForInit::Decls(vars))
                if vars.len() > 1
                    && (vars.iter().any(|v| v.ty.is_array())
                        || vars.windows(2).any(|w| w[0].ty != w[1].ty)) =>
            {
                out.open("{");
                for var in vars {
                    if let Some(init) = &var.init {
                        self.guards(init, out);
                    }
                    out.line(&format!("{};", self.local(var)));
                }
                out.open(&header(""));
                self.emit_body(body, out);
                out.close("}");
                out.close("}");
                return;
            }
            Some(ForInit::Decls(vars)) => {
                for init in vars.iter().filter_map(|var| var.init.as_ref()) {
                    self.guards(init, out);
                }
                let mut clause = String::new();
                for (index, var) in vars.iter().enumerate() {
                    if index == 0 {
                        clause.push_str(&self.local(var));
                    } else {
                        let declared = self.local(var);
                        let ty = self.names.ty(&var.ty);
                        clause.push_str(", ");
                        clause.push_str(declared.trim_start_matches(ty.as_str()).trim_start());
                    }
                }
                out.open(&header(&clause));
            }
            Some(ForInit::Exprs(exprs)) => {
                for expr in exprs {
                    self.guards(expr, out);
                }
                let clause: Vec<String> = exprs.iter().map(|e| self.exprs.emit(e)).collect();
                out.open(&header(&clause.join(", ")));
            }
            None => {
                out.open(&header(""));
            }
        }
        self.emit_body(body, out);
        out.close("}");
    }

    /// Native try/catch; the finally block runs after it. Without a catch
    /// clause, a catch-all runs the finally block and rethrows.
    fn try_stmt(&self, body: &Block, catches: &[CatchClause], finally: Option<&Block>, out: &mut Printer) {
        out.open("try {");
        self.emit_statements(&body.stmts, out);
        for catch in catches {
            out.decr().open(&format!(
                "}} catch ({} {}) {{",
                self.names.ty(&catch.ty),
                self.names.variable(&catch.name)
            ));
            self.emit_statements(&catch.body.stmts, out);
        }
        if catches.is_empty() {
            out.decr().open("} catch (...) {");
            if let Some(finally) = finally {
                self.emit_statements(&finally.stmts, out);
            }
            out.line("throw;");
        }
        out.close("}");
        if let Some(finally) = finally {
            out.open("{");
            self.emit_statements(&finally.stmts, out);
            out.close("}");
        }
    }

    /// `this(...)` or `super(...)`.
    pub fn delegation(&self, call: &ConstructorCall, out: &mut Printer) {
        let resolver = self.exprs.resolver();
        let resolution = resolver.delegation_target(call);
        let class = match call.kind {
            Delegation::This => resolver
                .scopes()
                .enclosing_class(call.scope)
                .map(str::to_string),
            Delegation::Super => resolver.superclass_name(call.scope),
        }
        .unwrap_or_else(|| ROOT_CLASS_QUALIFIED.to_string());

        for arg in &call.args {
            self.guards(arg, out);
        }
        let this = match call.kind {
            Delegation::This => "__this".to_string(),
            Delegation::Super => format!("({}) __this", self.names.class_of(&class)),
        };
        let args = self.exprs.arguments(&call.args, resolution);
        out.line(&format!(
            "{}::{}({});",
            self.names.struct_of(&class),
            resolution.mangled,
            with_this(&this, &args)
        ));
    }

    /// `__this->$x = init;` for an instance field initializer.
    pub fn field_init(&self, name: &str, init: &Expr, ty: &Type, out: &mut Printer) {
        self.guards(init, out);
        out.line(&format!(
            "__this->{} = {};",
            self.names.variable(name),
            self.exprs.coerce(init, ty)
        ));
    }

    /// `__rt::checkNotNull(x);` for each reference `expr` dereferences.
    fn guard_calls(&self, expr: &Expr) -> Vec<String> {
        let Some(pass) = &self.null_checks else {
            return Vec::new();
        };
        let mut calls: Vec<String> = Vec::new();
        for guard in pass.collect(expr) {
            let call = format!("{}({});", self.names.rt("checkNotNull"), self.exprs.emit(guard));
            if !calls.contains(&call) {
                calls.push(call);
            }
        }
        calls
    }

    fn guards(&self, expr: &Expr, out: &mut Printer) {
        for call in self.guard_calls(expr) {
            out.line(&call);
        }
    }

    /// `expr` with its guards folded into a statement expression, so they
    /// run each time a loop or `else if` condition is evaluated.
    fn guarded(&self, expr: &Expr) -> String {
        let text = self.exprs.emit(expr);
        let calls = self.guard_calls(expr);
        if calls.is_empty() {
            text
        } else {
            format!("({{ {} {}; }})", calls.join(" "), text)
        }
    }
}
