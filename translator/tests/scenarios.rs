//! End-to-end behavior of resolution and emission on small programs.

mod common;

use common::{expr_of, with_method};
use translator::pipeline::{SourceUnit, Translator};
use translator::tast::node::ExprKind;
use translator::tast::Type;
use tree::build::*;
use tree::{Child, Node};

fn super_and_sub(extra: Vec<Node>) -> Vec<Node> {
    let mut super_members = vec![
        field(&[], ty("int", 0), vec![declarator("count", Some(int_lit("7")))]),
        method(&["public"], void_type(), "printMessage", vec![], Some(block(vec![]))),
    ];
    super_members.extend(extra);
    vec![
        class_decl(&["public"], "Super", None, super_members),
        class_decl(
            &["public"],
            "Sub",
            Some("Super"),
            vec![field(&[], ty("int", 0), vec![declarator("extra", Some(int_lit("3")))])],
        ),
    ]
}

fn program(classes: Vec<Node>) -> Node {
    compilation_unit(Some("demo"), vec![], classes)
}

fn with_main(body: Vec<Node>, params: Vec<Node>) -> Vec<Node> {
    let mut classes = super_and_sub(vec![]);
    classes.push(class_decl(
        &["public"],
        "Main",
        None,
        vec![method(&["public"], ty("boolean", 0), "run", params, Some(block(body)))],
    ));
    vec![program(classes)]
}

fn translate(units: Vec<Node>) -> translator::TranslationOutput {
    let sources: Vec<SourceUnit> = units
        .into_iter()
        .enumerate()
        .map(|(i, tree)| SourceUnit::new(format!("Unit{}.java", i), tree))
        .collect();
    let output = Translator::default().translate(&sources).unwrap();
    assert!(!output.has_errors(), "{:?}", output.diagnostics);
    output
}

#[test]
fn test_implicit_super_constructor_precedes_field_initializers() {
    let output = translate(vec![program(super_and_sub(vec![]))]);
    let expected = "Sub __Sub::$__Sub$void(Sub __this) {\n  \
                    demo::__Super::$__Super$void((demo::Super) __this);\n  \
                    __this->$extra = 3;\n  \
                    return __this;\n}\n";
    assert!(output.source.contains(expected), "{}", output.source);
}

#[test]
fn test_class_without_superclass_calls_root_constructor() {
    let base = class_decl(
        &[],
        "Base",
        None,
        vec![
            field(&[], ty("int", 0), vec![declarator("x", Some(int_lit("1")))]),
            constructor(&["public"], "Base", vec![], block(vec![])),
        ],
    );
    let output = translate(vec![program(vec![base])]);
    let expected = "Base __Base::$__Base$void(Base __this) {\n  \
                    __Object::$__Object$void((Object) __this);\n  \
                    __this->$x = 1;\n  \
                    return __this;\n}\n";
    assert!(output.source.contains(expected), "{}", output.source);
}

#[test]
fn test_zero_argument_call_resolves_directly() {
    let body = vec![
        local(ty("Super", 0), "sup", Some(new_object("Super", vec![]))),
        expr_stmt(call(Some(ident("sup")), "printMessage", vec![])),
        return_stmt(Some(bool_lit(true))),
    ];
    with_method(with_main(body.clone(), vec![]), "demo.Main", "run", |resolver, stmts, _| {
        let expr = expr_of(&stmts[1]);
        let ExprKind::Call(call) = &expr.kind else {
            panic!("expected a call, found {}", expr.kind_name());
        };
        let resolution = resolver.call_target(call, expr.scope);
        assert_eq!(resolution.mangled, "printMessage$void");
        assert_eq!(resolution.level, 0);
        assert_eq!(resolution.candidates, vec!["printMessage$void"]);
        assert_eq!(resolution.owner.as_deref(), Some("demo.Super"));
    });

    let output = translate(with_main(body, vec![]));
    assert!(output.source.contains("$sup->__vptr->printMessage$void($sup);"));
}

#[test]
fn test_string_concatenation_builds_a_stream() {
    let concat = binary(string_lit("test "), "+", call(Some(ident("sup")), "toString", vec![]));
    let body = vec![
        local(ty("Super", 0), "sup", Some(new_object("Super", vec![]))),
        local(ty("String", 0), "s", Some(concat)),
        return_stmt(Some(bool_lit(true))),
    ];
    with_method(with_main(body.clone(), vec![]), "demo.Main", "run", |resolver, stmts, _| {
        assert_eq!(resolver.resolve(expr_of(&stmts[1])), Type::string());
    });

    let output = translate(with_main(body, vec![]));
    assert!(output.source.contains(
        "String $s = ({ std::ostringstream $sout$; $sout$ << \"test \" << $sup->__vptr->toString$void($sup); __rt::literal($sout$.str()); });"
    ));
    assert!(!output.source.contains("\"test \" +"));
}

#[test]
fn test_array_allocation_and_element_assignment() {
    // int a[] = new int[5];
    let declarator = Node::new(
        "Declarator",
        vec![
            Child::from("a"),
            Node::new("Dimensions", vec![Child::from("[")]).into(),
            new_array("int", vec![int_lit("5")], 0, None).into(),
        ],
    );
    let body = vec![
        field(&[], ty("int", 0), vec![declarator]),
        expr_stmt(assign(subscript(ident("a"), int_lit("1")), "=", int_lit("1"))),
        return_stmt(Some(bool_lit(true))),
    ];
    with_method(with_main(body.clone(), vec![]), "demo.Main", "run", |resolver, stmts, _| {
        let allocation = resolver.resolve(expr_of(&stmts[0]));
        assert_eq!(allocation, Type::array(Type::int(), 1));
        assert_eq!(allocation.dimensions(), 1);

        let assignment = expr_of(&stmts[1]);
        let ExprKind::Assign { target, .. } = &assignment.kind else {
            panic!("expected an assignment");
        };
        assert_eq!(resolver.resolve(target), Type::int());
        assert_eq!(resolver.resolve(assignment), Type::int());
    });

    let output = translate(with_main(body, vec![]));
    assert!(output.source.contains("__rt::Array<int32_t>* $a = __rt::newArray<int32_t>(5);"));
    assert!(output.source.contains("__rt::checkNotNull($a);\n  (*$a)[1] = 1;"));
}

#[test]
fn test_equals_shortcut_bypasses_hierarchy_search() {
    let params = vec![param(ty("Sub", 0), "a"), param(ty("Sub", 0), "b")];
    let body = vec![return_stmt(Some(call(Some(ident("a")), "equals", vec![ident("b")])))];

    // No user declaration at all
    with_method(with_main(body.clone(), params.clone()), "demo.Main", "run", |resolver, stmts, _| {
        let expr = expr_of(&stmts[0]);
        let ExprKind::Call(call) = &expr.kind else {
            panic!("expected a call");
        };
        let resolution = resolver.call_target(call, expr.scope);
        assert_eq!(resolution.mangled, "equals$Object");
        assert!(resolution.method.is_none());
        assert_eq!(resolver.resolve(expr), Type::boolean());
    });

    // A declared equals(Object) is not consulted either
    let declared = method(
        &["public"],
        ty("boolean", 0),
        "equals",
        vec![param(ty("Object", 0), "other")],
        Some(block(vec![return_stmt(Some(bool_lit(false)))])),
    );
    let mut classes = super_and_sub(vec![declared]);
    classes.push(class_decl(
        &["public"],
        "Main",
        None,
        vec![method(&["public"], ty("boolean", 0), "run", params.clone(), Some(block(body.clone())))],
    ));
    with_method(vec![program(classes)], "demo.Main", "run", |resolver, stmts, _| {
        let expr = expr_of(&stmts[0]);
        let ExprKind::Call(call) = &expr.kind else {
            panic!("expected a call");
        };
        let resolution = resolver.call_target(call, expr.scope);
        assert_eq!(resolution.mangled, "equals$Object");
        assert!(resolution.candidates.len() > 1);
        assert_eq!(resolution.candidates[0], "equals$Sub");
    });

    let output = translate(with_main(body, params));
    assert!(output
        .source
        .contains("return $a->__vptr->equals$Object($a, ((Object) $b));"));
}

#[test]
fn test_resolution_climbs_exactly_one_level() {
    let host = class_decl(
        &["public"],
        "Host",
        None,
        vec![
            method(
                &["public", "static"],
                void_type(),
                "take",
                vec![param(ty("B", 0), "b")],
                Some(block(vec![])),
            ),
            method(
                &["public"],
                void_type(),
                "run",
                vec![],
                Some(block(vec![
                    local(ty("C", 0), "c", Some(new_object("C", vec![]))),
                    expr_stmt(call(None, "take", vec![ident("c")])),
                ])),
            ),
        ],
    );
    let unit = program(vec![
        class_decl(&[], "A", None, vec![]),
        class_decl(&[], "B", Some("A"), vec![]),
        class_decl(&[], "C", Some("B"), vec![]),
        host,
    ]);
    with_method(vec![unit.clone()], "demo.Host", "run", |resolver, stmts, _| {
        let expr = expr_of(&stmts[1]);
        let ExprKind::Call(call) = &expr.kind else {
            panic!("expected a call");
        };
        let resolution = resolver.call_target(call, expr.scope);
        assert_eq!(resolution.mangled, "take$B");
        assert_eq!(resolution.level, 1);
        assert_eq!(resolution.candidates, vec!["take$C", "take$B"]);
    });

    let output = translate(vec![unit]);
    assert!(output
        .source
        .contains("demo::__Host::take$B(((demo::B) $c));"));
}

#[test]
fn test_classes_across_files_and_imports() {
    let shapes = compilation_unit(
        Some("geo.shapes"),
        vec![],
        vec![class_decl(
            &["public"],
            "Point",
            None,
            vec![field(&["public"], ty("int", 0), vec![declarator("x", None)])],
        )],
    );
    let app = compilation_unit(
        Some("app"),
        vec![import("geo.shapes.Point", false)],
        vec![class_decl(
            &["public"],
            "App",
            None,
            vec![method(
                &["public", "static"],
                void_type(),
                "main",
                vec![param(ty("String", 1), "args")],
                Some(block(vec![
                    local(ty("Point", 0), "p", Some(new_object("Point", vec![]))),
                    expr_stmt(assign(select(ident("p"), "x"), "=", int_lit("2"))),
                ])),
            )],
        )],
    );
    let output = translate(vec![app, shapes]);
    assert!(output.header.contains("namespace geo { namespace shapes {"));
    assert!(output
        .source
        .contains("geo::shapes::Point $p = geo::shapes::__Point::$__Point$void(new geo::shapes::__Point());"));
    assert!(output.source.contains("__rt::checkNotNull($p);\n  $p->$x = 2;"));
    assert!(output
        .source
        .contains("int main(int argc, char** argv) {\n  app::__App::main$StringArray(__rt::args(argc, argv));\n  return 0;\n}"));
    assert_eq!(output.stats.classes, 2);
    assert_eq!(output.stats.units, 2);
}
