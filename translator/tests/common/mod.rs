//! Shared setup for the integration tests.

#![allow(dead_code)]

use translator::config::TranslatorConfig;
use translator::error::Reporter;
use translator::pipeline::SourceUnit;
use translator::tast::lowering::Lowering;
use translator::tast::node::{Expr, Stmt};
use translator::tast::symbols::CompilationContext;
use translator::tast::type_resolution::Resolver;
use translator::tast::Discovery;
use tree::Node;

pub fn discover(units: Vec<Node>) -> (CompilationContext, Reporter) {
    translator::logging::init_test();
    let config = TranslatorConfig::default();
    let reporter = Reporter::new();
    let sources: Vec<SourceUnit> = units
        .into_iter()
        .enumerate()
        .map(|(i, tree)| SourceUnit::new(format!("Unit{}.java", i), tree))
        .collect();
    let ctx = Discovery::new(&config, &reporter).run(&sources).unwrap();
    (ctx, reporter)
}

/// Lower `class` and hand the statements of its method `method` to `check`.
pub fn with_method<F>(units: Vec<Node>, class: &str, method: &str, check: F)
where
    F: FnOnce(&Resolver<'_>, &[Stmt], &Reporter),
{
    let (ctx, reporter) = discover(units);
    let unit = Lowering::new(&ctx, &reporter)
        .lower_class(ctx.class(class).unwrap())
        .unwrap();
    let resolver = Resolver::new(&ctx, &unit, &reporter);
    let body = unit
        .methods
        .iter()
        .find(|m| m.decl.signature.base_name == method)
        .and_then(|m| m.body.as_ref())
        .unwrap();
    check(&resolver, &body.stmts, &reporter);
}

/// The expression a statement evaluates.
pub fn expr_of(stmt: &Stmt) -> &Expr {
    match stmt {
        Stmt::Expr(expr) => expr,
        Stmt::Local(vars) => vars[0].init.as_ref().unwrap(),
        Stmt::Return(Some(expr)) => expr,
        other => panic!("no expression in {:?}", other),
    }
}
