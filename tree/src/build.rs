//! Constructors for trees in the shapes the translator consumes.
//!
//! These mirror the node layouts an external Java grammar produces, so an
//! in-process front end or a test can assemble input without a parser.

use crate::{Child, Node};

const PRIMITIVES: &[&str] = &[
    "byte", "short", "int", "long", "float", "double", "boolean", "char",
];

fn node(kind: &str, children: Vec<Child>) -> Node {
    Node::new(kind, children)
}

fn nodes(kind: &str, items: Vec<Node>) -> Node {
    node(kind, items.into_iter().map(Child::from).collect())
}

// ---------------------------------------------------------------------------
// Units and declarations
// ---------------------------------------------------------------------------

pub fn compilation_unit(package: Option<&str>, imports: Vec<Node>, decls: Vec<Node>) -> Node {
    let mut children = vec![Child::from(package.map(package_decl))];
    children.extend(imports.into_iter().map(Child::from));
    children.extend(decls.into_iter().map(Child::from));
    node("CompilationUnit", children)
}

pub fn package_decl(name: &str) -> Node {
    node(
        "PackageDeclaration",
        vec![Child::Absent, qualified_identifier(name).into()],
    )
}

/// `import a.b.C;` or, with `on_demand`, `import a.b.*;`
pub fn import(name: &str, on_demand: bool) -> Node {
    node(
        "ImportDeclaration",
        vec![
            Child::Absent,
            qualified_identifier(name).into(),
            if on_demand { "*".into() } else { Child::Absent },
        ],
    )
}

pub fn qualified_identifier(name: &str) -> Node {
    node(
        "QualifiedIdentifier",
        name.split('.').map(Child::from).collect(),
    )
}

pub fn modifiers(keywords: &[&str]) -> Node {
    nodes(
        "Modifiers",
        keywords
            .iter()
            .map(|kw| node("Modifier", vec![(*kw).into()]))
            .collect(),
    )
}

pub fn class_decl(mods: &[&str], name: &str, extends: Option<&str>, members: Vec<Node>) -> Node {
    node(
        "ClassDeclaration",
        vec![
            modifiers(mods).into(),
            name.into(),
            Child::Absent,
            extends
                .map(|sup| node("Extension", vec![ty(sup, 0).into()]))
                .into(),
            Child::Absent,
            nodes("ClassBody", members).into(),
        ],
    )
}

fn dimensions(dims: usize) -> Child {
    if dims == 0 {
        Child::Absent
    } else {
        node("Dimensions", (0..dims).map(|_| Child::from("[")).collect()).into()
    }
}

/// A `Type` node; `name` is a primitive keyword or a (qualified) class name.
pub fn ty(name: &str, dims: usize) -> Node {
    let base = if PRIMITIVES.contains(&name) {
        node("PrimitiveType", vec![name.into()])
    } else {
        qualified_identifier(name)
    };
    node("Type", vec![base.into(), dimensions(dims)])
}

pub fn void_type() -> Node {
    Node::leaf("VoidType")
}

pub fn declarator(name: &str, init: Option<Node>) -> Node {
    node(
        "Declarator",
        vec![name.into(), Child::Absent, init.into()],
    )
}

pub fn field(mods: &[&str], field_ty: Node, declarators: Vec<Node>) -> Node {
    node(
        "FieldDeclaration",
        vec![
            modifiers(mods).into(),
            field_ty.into(),
            nodes("Declarators", declarators).into(),
        ],
    )
}

pub fn param(param_ty: Node, name: &str) -> Node {
    node(
        "FormalParameter",
        vec![
            modifiers(&[]).into(),
            param_ty.into(),
            Child::Absent,
            name.into(),
            Child::Absent,
        ],
    )
}

pub fn method(
    mods: &[&str],
    ret: Node,
    name: &str,
    params: Vec<Node>,
    body: Option<Node>,
) -> Node {
    node(
        "MethodDeclaration",
        vec![
            modifiers(mods).into(),
            Child::Absent,
            ret.into(),
            name.into(),
            nodes("FormalParameters", params).into(),
            Child::Absent,
            Child::Absent,
            body.into(),
        ],
    )
}

pub fn constructor(mods: &[&str], name: &str, params: Vec<Node>, body: Node) -> Node {
    node(
        "ConstructorDeclaration",
        vec![
            modifiers(mods).into(),
            Child::Absent,
            name.into(),
            nodes("FormalParameters", params).into(),
            Child::Absent,
            body.into(),
        ],
    )
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

pub fn block(stmts: Vec<Node>) -> Node {
    nodes("Block", stmts)
}

pub fn expr_stmt(expr: Node) -> Node {
    node("ExpressionStatement", vec![expr.into()])
}

pub fn return_stmt(expr: Option<Node>) -> Node {
    node("ReturnStatement", vec![expr.into()])
}

pub fn local(local_ty: Node, name: &str, init: Option<Node>) -> Node {
    field(&[], local_ty, vec![declarator(name, init)])
}

pub fn if_stmt(cond: Node, then: Node, otherwise: Option<Node>) -> Node {
    node(
        "ConditionalStatement",
        vec![cond.into(), then.into(), otherwise.into()],
    )
}

pub fn while_stmt(cond: Node, body: Node) -> Node {
    node("WhileStatement", vec![cond.into(), body.into()])
}

pub fn do_while_stmt(body: Node, cond: Node) -> Node {
    node("DoWhileStatement", vec![body.into(), cond.into()])
}

/// `for (T name = init; cond; update...) body`
pub fn for_stmt(
    init: Option<(Node, &str, Node)>,
    cond: Option<Node>,
    update: Vec<Node>,
    body: Node,
) -> Node {
    let (mods, init_ty, decls) = match init {
        Some((init_ty, name, value)) => (
            modifiers(&[]).into(),
            init_ty.into(),
            nodes("Declarators", vec![declarator(name, Some(value))]).into(),
        ),
        None => (Child::Absent, Child::Absent, Child::Absent),
    };
    let update = if update.is_empty() {
        Child::Absent
    } else {
        nodes("ExpressionList", update).into()
    };
    let control = node(
        "BasicForControl",
        vec![mods, init_ty, decls, cond.into(), update],
    );
    node("ForStatement", vec![control.into(), body.into()])
}

pub fn switch_stmt(selector: Node, clauses: Vec<Node>) -> Node {
    let mut children = vec![Child::from(selector)];
    children.extend(clauses.into_iter().map(Child::from));
    node("SwitchStatement", children)
}

pub fn case_clause(label: Node, stmts: Vec<Node>) -> Node {
    let mut children = vec![Child::from(label)];
    children.extend(stmts.into_iter().map(Child::from));
    node("CaseClause", children)
}

pub fn default_clause(stmts: Vec<Node>) -> Node {
    nodes("DefaultClause", stmts)
}

pub fn break_stmt() -> Node {
    node("BreakStatement", vec![Child::Absent])
}

pub fn continue_stmt() -> Node {
    node("ContinueStatement", vec![Child::Absent])
}

pub fn synchronized_stmt(lock: Node, body: Node) -> Node {
    node("SynchronizedStatement", vec![lock.into(), body.into()])
}

pub fn try_stmt(body: Node, catches: Vec<Node>, finally: Option<Node>) -> Node {
    let mut children = vec![Child::from(body)];
    children.extend(catches.into_iter().map(Child::from));
    children.push(finally.into());
    node("TryCatchFinallyStatement", children)
}

pub fn catch_clause(param_ty: Node, name: &str, body: Node) -> Node {
    node("CatchClause", vec![param(param_ty, name).into(), body.into()])
}

pub fn throw_stmt(expr: Node) -> Node {
    node("ThrowStatement", vec![expr.into()])
}

pub fn empty_stmt() -> Node {
    Node::leaf("EmptyStatement")
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

pub fn int_lit(text: &str) -> Node {
    node("IntegerLiteral", vec![text.into()])
}

pub fn float_lit(text: &str) -> Node {
    node("FloatingPointLiteral", vec![text.into()])
}

/// A string literal; the quotes are added here.
pub fn string_lit(text: &str) -> Node {
    node("StringLiteral", vec![format!("\"{}\"", text).into()])
}

/// A character literal; the quotes are added here.
pub fn char_lit(c: char) -> Node {
    node("CharacterLiteral", vec![format!("'{}'", c).into()])
}

pub fn bool_lit(value: bool) -> Node {
    node("BooleanLiteral", vec![if value { "true" } else { "false" }.into()])
}

pub fn null_lit() -> Node {
    Node::leaf("NullLiteral")
}

pub fn ident(name: &str) -> Node {
    node("PrimaryIdentifier", vec![name.into()])
}

pub fn this() -> Node {
    node("ThisExpression", vec![Child::Absent])
}

pub fn super_expr() -> Node {
    node("SuperExpression", vec![Child::Absent])
}

pub fn call(receiver: Option<Node>, name: &str, args: Vec<Node>) -> Node {
    node(
        "CallExpression",
        vec![
            receiver.into(),
            Child::Absent,
            name.into(),
            nodes("Arguments", args).into(),
        ],
    )
}

pub fn select(base: Node, name: &str) -> Node {
    node("SelectionExpression", vec![base.into(), name.into()])
}

pub fn subscript(base: Node, index: Node) -> Node {
    node("SubscriptExpression", vec![base.into(), index.into()])
}

pub fn new_object(class: &str, args: Vec<Node>) -> Node {
    node(
        "NewClassExpression",
        vec![
            Child::Absent,
            Child::Absent,
            qualified_identifier(class).into(),
            nodes("Arguments", args).into(),
            Child::Absent,
        ],
    )
}

/// `new T[d0][d1]...[]...`, or `new T[]{...}` when `init` is given.
pub fn new_array(elem: &str, sizes: Vec<Node>, extra_dims: usize, init: Option<Node>) -> Node {
    let base = if PRIMITIVES.contains(&elem) {
        node("PrimitiveType", vec![elem.into()])
    } else {
        qualified_identifier(elem)
    };
    let concrete = if sizes.is_empty() {
        Child::Absent
    } else {
        nodes("ConcreteDimensions", sizes).into()
    };
    node(
        "NewArrayExpression",
        vec![base.into(), concrete, dimensions(extra_dims), init.into()],
    )
}

pub fn array_init(elems: Vec<Node>) -> Node {
    nodes("ArrayInitializer", elems)
}

pub fn cast(target: Node, expr: Node) -> Node {
    node("CastExpression", vec![target.into(), expr.into()])
}

pub fn basic_cast(keyword: &str, expr: Node) -> Node {
    node(
        "BasicCastExpression",
        vec![
            node("PrimitiveType", vec![keyword.into()]).into(),
            Child::Absent,
            expr.into(),
        ],
    )
}

pub fn instance_of(expr: Node, target: Node) -> Node {
    node("InstanceOfExpression", vec![expr.into(), target.into()])
}

pub fn class_lit(target: Node) -> Node {
    node("ClassLiteralExpression", vec![target.into()])
}

/// A binary expression; the node kind is chosen from the operator.
pub fn binary(left: Node, op: &str, right: Node) -> Node {
    let kind = match op {
        "+" | "-" => "AdditiveExpression",
        "*" | "/" | "%" => "MultiplicativeExpression",
        "<<" | ">>" | ">>>" => "ShiftExpression",
        "<" | ">" | "<=" | ">=" => "RelationalExpression",
        "==" | "!=" => "EqualityExpression",
        "&&" => return node("LogicalAndExpression", vec![left.into(), right.into()]),
        "||" => return node("LogicalOrExpression", vec![left.into(), right.into()]),
        "&" => return node("BitwiseAndExpression", vec![left.into(), right.into()]),
        "|" => return node("BitwiseOrExpression", vec![left.into(), right.into()]),
        "^" => return node("BitwiseXorExpression", vec![left.into(), right.into()]),
        _ => "Expression",
    };
    node(kind, vec![left.into(), op.into(), right.into()])
}

/// An assignment such as `a = b` or `a += b`.
pub fn assign(target: Node, op: &str, value: Node) -> Node {
    node("Expression", vec![target.into(), op.into(), value.into()])
}

pub fn unary(op: &str, expr: Node) -> Node {
    match op {
        "!" => node("LogicalNegationExpression", vec![expr.into()]),
        "~" => node("BitwiseNegationExpression", vec![expr.into()]),
        _ => node("UnaryExpression", vec![op.into(), expr.into()]),
    }
}

pub fn postfix(expr: Node, op: &str) -> Node {
    node("PostfixExpression", vec![expr.into(), op.into()])
}

pub fn conditional(cond: Node, then: Node, otherwise: Node) -> Node {
    node(
        "ConditionalExpression",
        vec![cond.into(), then.into(), otherwise.into()],
    )
}
