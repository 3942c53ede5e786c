//! Properties that hold for every program, checked over a small class zoo.

mod common;

use common::{discover, expr_of, with_method};
use std::collections::HashSet;
use translator::codegen::{ExprEmitter, Naming};
use translator::config::TranslatorConfig;
use translator::error::TranslateError;
use translator::error_codes::UNRESOLVED_IDENTIFIER;
use translator::pipeline::{SourceUnit, Translator};
use translator::tast::node::ExprKind;
use translator::tast::types::{additive_result, numeric_promotion, ROOT_CLASS_QUALIFIED};
use translator::tast::{mangle, OverloadResolver, Type};
use tree::build::*;
use tree::Node;

/// Animal <- Mammal <- Dog <- Puppy, Animal <- Bird, plus a `Zoo` with
/// overloads over them.
fn zoo() -> Node {
    let overload = |params: Vec<Node>| {
        method(&["public"], void_type(), "feed", params, Some(block(vec![])))
    };
    compilation_unit(
        Some("zoo"),
        vec![],
        vec![
            class_decl(&[], "Animal", None, vec![]),
            class_decl(&[], "Mammal", Some("Animal"), vec![]),
            class_decl(&[], "Dog", Some("Mammal"), vec![]),
            class_decl(&[], "Puppy", Some("Dog"), vec![]),
            class_decl(&[], "Bird", Some("Animal"), vec![]),
            class_decl(
                &["public"],
                "Zoo",
                None,
                vec![
                    overload(vec![param(ty("Animal", 0), "a")]),
                    overload(vec![param(ty("Mammal", 0), "a"), param(ty("Animal", 0), "b")]),
                    overload(vec![param(ty("int", 0), "n"), param(ty("Dog", 0), "d")]),
                    overload(vec![param(ty("Bird", 0), "b"), param(ty("int", 1), "xs")]),
                ],
            ),
        ],
    )
}

#[test]
fn test_depth_grows_by_one_per_edge() {
    let (ctx, _) = discover(vec![zoo()]);
    assert_eq!(ctx.hierarchy.depth(ROOT_CLASS_QUALIFIED), 0);
    for class in ctx.hierarchy.classes() {
        if let Some(parent) = ctx.hierarchy.parent(class) {
            assert_eq!(
                ctx.hierarchy.depth(class),
                ctx.hierarchy.depth(parent) + 1,
                "{} -> {}",
                class,
                parent
            );
        }
    }
    assert_eq!(ctx.hierarchy.depth("zoo.Puppy"), 4);
}

#[test]
fn test_declared_overloads_have_distinct_mangled_names() {
    let (ctx, _) = discover(vec![zoo()]);
    let zoo = ctx.class("zoo.Zoo").unwrap();
    let mangled: HashSet<String> = zoo.methods.values().map(|m| m.mangled_name()).collect();
    assert_eq!(mangled.len(), 4);
    for method in zoo.methods.values() {
        assert_eq!(
            mangle(&method.signature.base_name, &method.signature.params),
            method.mangled_name()
        );
    }
}

#[test]
fn test_overload_search_terminates_without_repeats() {
    let (ctx, _) = discover(vec![zoo()]);
    let resolver = OverloadResolver::new(&ctx);
    let classes = ["Animal", "Mammal", "Dog", "Puppy", "Bird"];
    let class = |name: &str| Type::class(name, "zoo");
    let mut argument_lists: Vec<Vec<Type>> = Vec::new();
    for a in classes {
        argument_lists.push(vec![class(a)]);
        argument_lists.push(vec![Type::int(), class(a)]);
        argument_lists.push(vec![class(a), Type::array(Type::int(), 1)]);
        for b in classes {
            argument_lists.push(vec![class(a), class(b)]);
        }
    }

    for args in argument_lists {
        let resolution = resolver.resolve_method(Some("zoo.Zoo"), "feed", &args);
        let max_level = args
            .iter()
            .filter_map(|arg| arg.class_type())
            .map(|c| ctx.hierarchy.depth(&c.qualified_name()))
            .max()
            .unwrap_or(0);
        assert!(resolution.level <= max_level);
        assert!(resolution.candidates.len() <= (max_level + 1) * args.len().max(1));
        let unique: HashSet<&String> = resolution.candidates.iter().collect();
        assert_eq!(unique.len(), resolution.candidates.len(), "{:?}", resolution.candidates);
        if let Some(method) = &resolution.method {
            assert_eq!(mangle("feed", &method.params), resolution.mangled);
        }
    }
}

#[test]
fn test_widening_finds_the_nearest_declared_overload() {
    let (ctx, _) = discover(vec![zoo()]);
    let resolver = OverloadResolver::new(&ctx);
    let class = |name: &str| Type::class(name, "zoo");

    let puppy = resolver.resolve_method(Some("zoo.Zoo"), "feed", &[Type::int(), class("Puppy")]);
    assert_eq!(puppy.mangled, "feed$int32_t$Dog");
    assert_eq!(puppy.level, 1);

    let bird = resolver.resolve_method(Some("zoo.Zoo"), "feed", &[class("Bird")]);
    assert_eq!(bird.mangled, "feed$Animal");

    let pair = resolver.resolve_method(Some("zoo.Zoo"), "feed", &[class("Mammal"), class("Mammal")]);
    assert_eq!(pair.mangled, "feed$Mammal$Animal");
    assert_eq!(pair.level, 1);

    // Reaching feed(Mammal, Animal) from (Dog, Bird) would need both
    // arguments widened at the same level, which the search never tries.
    let apart = resolver.resolve_method(Some("zoo.Zoo"), "feed", &[class("Dog"), class("Bird")]);
    assert!(!apart.is_resolved());
    assert_eq!(apart.mangled, "feed$Dog$Bird");
    assert!(!apart.candidates.iter().any(|c| c == "feed$Mammal$Animal"));
}

#[test]
fn test_numeric_widening_order() {
    let order = [Type::string(), Type::double(), Type::float(), Type::long(), Type::int()];
    for (i, left) in order.iter().enumerate() {
        for (j, right) in order.iter().enumerate() {
            let expected = &order[i.min(j)];
            assert_eq!(&additive_result(left, right), expected, "{} + {}", left, right);
            if !left.is_string() && !right.is_string() {
                assert_eq!(&numeric_promotion(left, right), expected);
            }
        }
    }
}

#[test]
fn test_resolution_and_emission_are_idempotent() {
    let body = vec![
        expr_stmt(assign(ident("total"), "=", ident("missing"))),
        expr_stmt(call(Some(ident("other")), "toString", vec![])),
    ];
    let main = compilation_unit(
        Some("demo"),
        vec![],
        vec![class_decl(
            &["public"],
            "Main",
            None,
            vec![
                field(&[], ty("int", 0), vec![declarator("total", None)]),
                method(
                    &["public"],
                    void_type(),
                    "run",
                    vec![param(ty("Main", 0), "other")],
                    Some(block(body)),
                ),
            ],
        )],
    );
    with_method(vec![main], "demo.Main", "run", |resolver, stmts, reporter| {
        let config = TranslatorConfig::default();
        let names = Naming::new(&config);
        let emitter = ExprEmitter::new(resolver, &names);
        for stmt in stmts {
            let expr = expr_of(stmt);
            let first = resolver.resolve(expr);
            let text = emitter.emit(expr);
            assert_eq!(resolver.resolve(expr), first);
            assert_eq!(emitter.emit(expr), text);
        }
        // Reported once however often the node is resolved
        assert_eq!(reporter.count(UNRESOLVED_IDENTIFIER), 1);

        let ExprKind::Call(call) = &expr_of(&stmts[1]).kind else {
            panic!("expected a call");
        };
        let first = resolver.call_target(call, expr_of(&stmts[1]).scope) as *const _;
        let second = resolver.call_target(call, expr_of(&stmts[1]).scope) as *const _;
        assert_eq!(first, second);
    });
}

#[test]
fn test_separator_in_method_name_aborts_the_run() {
    let unit = compilation_unit(
        None,
        vec![],
        vec![class_decl(
            &[],
            "Bad",
            None,
            vec![method(&[], void_type(), "a$b", vec![], Some(block(vec![])))],
        )],
    );
    let err = Translator::default()
        .translate(&[SourceUnit::new("Bad.java", unit)])
        .unwrap_err();
    assert!(matches!(err, TranslateError::SeparatorInName { .. }));
    assert_eq!(err.to_diagnostic().code.as_deref(), Some("E2001"));
}

#[test]
fn test_output_is_deterministic() {
    let translate = || {
        Translator::default()
            .translate(&[SourceUnit::new("Zoo.java", zoo())])
            .unwrap()
    };
    let first = translate();
    let second = translate();
    assert_eq!(first.header, second.header);
    assert_eq!(first.source, second.source);
}
