//! Expression lowering to target text.
//!
//! Every expression is resolved before it is emitted. Emission returns a
//! string so that parents can splice operands into their own forms; the
//! statement emitter places the results through the printer.

use super::names::Naming;
use crate::tast::builtins::root_methods;
use crate::tast::node::*;
use crate::tast::overload::Resolution;
use crate::tast::scopes::ScopeId;
use crate::tast::type_resolution::Resolver;
use crate::tast::types::{ClassType, PrimitiveKind, Type};

/// Temporary holding a compound call receiver.
const RECEIVER_TEMP: &str = "$c$";

pub struct ExprEmitter<'r, 'a> {
    resolver: &'r Resolver<'a>,
    names: &'r Naming<'r>,
}

impl<'r, 'a> ExprEmitter<'r, 'a> {
    pub fn new(resolver: &'r Resolver<'a>, names: &'r Naming<'r>) -> Self {
        Self { resolver, names }
    }

    pub fn resolver(&self) -> &'r Resolver<'a> {
        self.resolver
    }

    pub fn emit(&self, expr: &Expr) -> String {
        let ty = self.resolver.resolve(expr);
        match &expr.kind {
            ExprKind::Literal(literal) => self.literal(literal),
            ExprKind::Identifier(ident) => {
                let target = self.resolver.name_target(ident, expr);
                self.name(&ident.name, &target)
            }
            ExprKind::This => "__this".to_string(),
            ExprKind::Super => format!("(({}) __this)", self.names.ty(&ty)),
            ExprKind::Binary {
                category,
                op,
                left,
                right,
            } => self.binary(*category, op, left, right, &ty),
            ExprKind::Assign { op, target, value } => self.assign(op, target, value),
            ExprKind::Unary { op, operand } => format!("{}{}", op, self.operand(operand)),
            ExprKind::Postfix { op, operand } => format!("{}{}", self.operand(operand), op),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => format!(
                "({} ? {} : {})",
                self.emit(cond),
                self.coerce(then, &ty),
                self.coerce(otherwise, &ty)
            ),
            ExprKind::Call(call) => self.call(call, expr.scope),
            ExprKind::Selection(selection) => self.selection(selection, expr),
            ExprKind::Subscript { base, index } => {
                format!("(*{})[{}]", self.emit(base), self.emit(index))
            }
            ExprKind::Cast {
                target, operand, ..
            } => {
                if target.is_primitive() {
                    format!("(({}) {})", self.names.ty(target), self.emit(operand))
                } else {
                    format!(
                        "{}<{}>({})",
                        self.names.rt("java_cast"),
                        self.names.ty(target),
                        self.emit(operand)
                    )
                }
            }
            ExprKind::InstanceOf { operand, target } => format!(
                "({{ Class $k$ = {}; $k$->__vptr->isInstance$Object($k$, (Object) {}); }})",
                self.names.class_token(target),
                self.emit(operand)
            ),
            ExprKind::NewObject(new) => self.new_object(new),
            ExprKind::NewArray(array) => self.new_array(array, &ty),
            ExprKind::ArrayInit { elements } => self.array_init(elements, &ty),
            ExprKind::ClassLiteral(target) => self.names.class_token(target),
            ExprKind::Unsupported(kind) => format!("/* {} */ 0", kind),
        }
    }

    /// Emit `expr` as a value of type `to`, casting between class types.
    pub fn coerce(&self, expr: &Expr, to: &Type) -> String {
        let from = self.resolver.resolve(expr);
        let text = self.emit(expr);
        if to.is_reference() && from.is_reference() && from != *to && !expr.is_null_literal() {
            format!("(({}) {})", self.names.ty(to), text)
        } else {
            text
        }
    }

    /// An operand of a prefix or postfix operator.
    fn operand(&self, expr: &Expr) -> String {
        let text = self.emit(expr);
        match &expr.kind {
            ExprKind::Identifier(_) | ExprKind::Selection(_) | ExprKind::Subscript { .. } => text,
            ExprKind::Literal(_) if !text.starts_with(['-', '+']) => text,
            _ => format!("({})", text),
        }
    }

    fn literal(&self, literal: &Literal) -> String {
        let text = literal.text.replace('_', "");
        match literal.kind {
            LiteralKind::Integer | LiteralKind::Float | LiteralKind::Char | LiteralKind::Boolean => {
                text
            }
            LiteralKind::Long => format!("{}LL", text.trim_end_matches(['l', 'L'])),
            LiteralKind::Double => text.trim_end_matches(['d', 'D']).to_string(),
            LiteralKind::String => format!("{}({})", self.names.rt("literal"), literal.text),
            LiteralKind::Null => format!("{}()", self.names.rt("null")),
        }
    }

    fn name(&self, name: &str, target: &NameTarget) -> String {
        let variable = self.names.variable(name);
        match target {
            NameTarget::Local | NameTarget::Unresolved | NameTarget::ArrayLength => variable,
            NameTarget::Field {
                is_static: false, ..
            } => format!("__this->{}", variable),
            NameTarget::Field {
                owner,
                is_static: true,
            } => format!("{}::{}", self.names.struct_of(owner), variable),
            NameTarget::RuntimeStatic { class } => {
                format!("{}::{}", self.names.struct_of(class), variable)
            }
            NameTarget::Class(qualified) => self.names.struct_of(qualified),
        }
    }

    fn selection(&self, selection: &Selection, expr: &Expr) -> String {
        let variable = self.names.variable(&selection.name);
        match self.resolver.selection_target(selection, expr) {
            NameTarget::Field {
                owner,
                is_static: true,
            } => format!("{}::{}", self.names.struct_of(&owner), variable),
            NameTarget::RuntimeStatic { class } => {
                format!("{}::{}", self.names.struct_of(&class), variable)
            }
            NameTarget::ArrayLength => format!("{}->length", self.emit(&selection.base)),
            _ => format!("{}->{}", self.emit(&selection.base), variable),
        }
    }

    fn binary(&self, category: BinaryCategory, op: &str, left: &Expr, right: &Expr, ty: &Type) -> String {
        if category == BinaryCategory::Additive && ty.is_string() {
            let mut parts = Vec::new();
            self.flatten_concat(left, &mut parts);
            self.flatten_concat(right, &mut parts);
            return self.concat(&parts);
        }

        let left_ty = self.resolver.resolve(left);
        let right_ty = self.resolver.resolve(right);
        match (category, op) {
            (BinaryCategory::Shift, ">>>") => self.unsigned_shift(&self.emit(left), &self.emit(right), &left_ty),
            (BinaryCategory::Multiplicative, "%") if ty.primitive_kind().is_some_and(PrimitiveKind::is_floating) => {
                format!("std::fmod({}, {})", self.emit(left), self.emit(right))
            }
            (BinaryCategory::Equality, _)
                if left_ty.is_reference() && right_ty.is_reference() && left_ty != right_ty =>
            {
                format!(
                    "((Object) {} {} (Object) {})",
                    self.emit(left),
                    op,
                    self.emit(right)
                )
            }
            _ => format!("({} {} {})", self.emit(left), op, self.emit(right)),
        }
    }

    fn unsigned_shift(&self, left: &str, right: &str, left_ty: &Type) -> String {
        let (signed, unsigned) = if left_ty.primitive_kind() == Some(PrimitiveKind::Long) {
            ("int64_t", "uint64_t")
        } else {
            ("int32_t", "uint32_t")
        };
        format!("(({}) (({}) {} >> {}))", signed, unsigned, left, right)
    }

    /// Operands of a string concatenation chain, left to right.
    fn flatten_concat<'e>(&self, expr: &'e Expr, parts: &mut Vec<&'e Expr>) {
        if let ExprKind::Binary {
            category: BinaryCategory::Additive,
            op,
            left,
            right,
        } = &expr.kind
        {
            if op == "+" && self.resolver.resolve(expr).is_string() {
                self.flatten_concat(left, parts);
                self.flatten_concat(right, parts);
                return;
            }
        }
        parts.push(expr);
    }

    /// `({ std::ostringstream $sout$; $sout$ << a << b; __rt::literal($sout$.str()); })`
    fn concat(&self, parts: &[&Expr]) -> String {
        let streamed: Vec<String> = parts.iter().map(|part| self.stream_operand(part)).collect();
        format!(
            "({{ std::ostringstream $sout$; $sout$ << {}; {}($sout$.str()); }})",
            streamed.join(" << "),
            self.names.rt("literal")
        )
    }

    /// How a value is written to an output stream.
    fn stream_operand(&self, expr: &Expr) -> String {
        if let ExprKind::Literal(Literal {
            kind: LiteralKind::String,
            text,
        }) = &expr.kind
        {
            return text.clone();
        }
        let ty = self.resolver.resolve(expr);
        let text = self.emit(expr);
        match ty.primitive_kind() {
            Some(PrimitiveKind::Boolean) => format!("({} ? \"true\" : \"false\")", text),
            Some(kind) if kind.is_floating() => format!("{}({})", self.names.rt("stringify"), text),
            Some(PrimitiveKind::Byte) => format!("((int32_t) {})", text),
            Some(_) => text,
            None if ty.is_string() => text,
            None => format!("{}({})", self.names.rt("stringify"), text),
        }
    }

    fn assign(&self, op: &str, target: &Expr, value: &Expr) -> String {
        let ty = self.resolver.resolve(target);
        let lhs = self.emit(target);
        match op {
            "+=" if ty.is_string() => {
                let mut parts = vec![target];
                self.flatten_concat(value, &mut parts);
                format!("{} = {}", lhs, self.concat(&parts))
            }
            ">>>=" => format!(
                "{} = {}",
                lhs,
                self.unsigned_shift(&lhs, &self.emit(value), &ty)
            ),
            "%=" if ty.primitive_kind().is_some_and(PrimitiveKind::is_floating) => {
                format!("{} = std::fmod({}, {})", lhs, lhs, self.emit(value))
            }
            "=" => format!("{} = {}", lhs, self.coerce(value, &ty)),
            _ => format!("{} {} {}", lhs, op, self.emit(value)),
        }
    }

    /// Arguments converted to the parameter types of the callee. Calls that
    /// resolve to no declaration take the root class's signature when one
    /// matches.
    pub fn arguments(&self, args: &[Expr], resolution: &Resolution) -> Vec<String> {
        let params = match &resolution.method {
            Some(method) => Some(method.params.clone()),
            None => root_methods()
                .into_iter()
                .find(|m| m.mangled_name() == resolution.mangled)
                .map(|m| m.params),
        };
        match params {
            Some(params) => args
                .iter()
                .zip(params.iter())
                .map(|(arg, param)| self.coerce(arg, param))
                .collect(),
            None => args.iter().map(|arg| self.emit(arg)).collect(),
        }
    }

    fn call(&self, call: &Call, scope: ScopeId) -> String {
        if let Some(print) = call.print {
            return self.print(call, print);
        }
        let resolution = self.resolver.call_target(call, scope);
        let args = self.arguments(&call.args, resolution);
        let method = &resolution.mangled;

        let Some(receiver) = &call.receiver else {
            let enclosing = self
                .resolver
                .scopes()
                .enclosing_class(scope)
                .unwrap_or_default()
                .to_string();
            let owner = resolution.owner.clone().unwrap_or(enclosing.clone());
            if resolution.is_static() || self.resolver.scopes().is_static_context(scope) {
                return format!("{}::{}({})", self.names.struct_of(&owner), method, args.join(", "));
            }
            let this = if owner == enclosing {
                "__this".to_string()
            } else {
                format!("(({}) __this)", self.names.class_of(&owner))
            };
            return if resolution.is_virtual() {
                invoke_virtual("__this", method, &args)
            } else {
                format!("{}::{}({})", self.names.struct_of(&owner), method, with_this(&this, &args))
            };
        };

        if matches!(receiver.kind, ExprKind::Super) {
            // Without a declaration the implementation is whatever fills the
            // superclass's own vtable slot.
            let (owner, slot) = match &resolution.owner {
                Some(owner) => (owner.clone(), ""),
                None => (self.resolver.superclass_name(scope).unwrap_or_default(), "__vtable."),
            };
            let this = format!("(({}) __this)", self.names.class_of(&owner));
            return format!(
                "{}::{}{}({})",
                self.names.struct_of(&owner),
                slot,
                method,
                with_this(&this, &args)
            );
        }

        if let Some(class) = self.resolver.class_name(receiver) {
            let owner = resolution.owner.clone().unwrap_or(class);
            return format!("{}::{}({})", self.names.struct_of(&owner), method, args.join(", "));
        }
        if resolution.is_static() {
            let owner = resolution.owner.clone().unwrap_or_default();
            return format!("{}::{}({})", self.names.struct_of(&owner), method, args.join(", "));
        }

        let receiver_ty = self.resolver.resolve(receiver);
        if is_compound(receiver) {
            let guard = if self.names.config().null_checks {
                format!("{}({}); ", self.names.rt("checkNotNull"), RECEIVER_TEMP)
            } else {
                String::new()
            };
            let invoke = self.invoke_on(RECEIVER_TEMP, &receiver_ty, resolution, &args);
            return format!(
                "({{ {} {} = {}; {}{}; }})",
                self.names.ty(&receiver_ty),
                RECEIVER_TEMP,
                self.emit(receiver),
                guard,
                invoke
            );
        }
        self.invoke_on(&self.emit(receiver), &receiver_ty, resolution, &args)
    }

    /// Call an instance method on an already evaluated receiver.
    fn invoke_on(&self, receiver: &str, receiver_ty: &Type, resolution: &Resolution, args: &[String]) -> String {
        if resolution.is_virtual() {
            return invoke_virtual(receiver, &resolution.mangled, args);
        }
        let owner = resolution.owner.clone().unwrap_or_default();
        let this = match receiver_ty.class_type() {
            Some(class) if class.qualified_name() == owner => receiver.to_string(),
            _ => format!("(({}) {})", self.names.class_of(&owner), receiver),
        };
        format!(
            "{}::{}({})",
            self.names.struct_of(&owner),
            resolution.mangled,
            with_this(&this, args)
        )
    }

    /// `System.out.print(x)` as stream output.
    fn print(&self, call: &Call, kind: PrintKind) -> String {
        let mut out = String::from("std::cout");
        for arg in &call.args {
            out.push_str(" << ");
            out.push_str(&self.print_operand(arg));
        }
        if kind == PrintKind::Println {
            out.push_str(" << std::endl");
        }
        out
    }

    /// Objects other than strings print through their `toString$void` slot.
    fn print_operand(&self, expr: &Expr) -> String {
        let ty = self.resolver.resolve(expr);
        if !ty.is_reference() || ty.is_string() || expr.is_literal() {
            return self.stream_operand(expr);
        }
        let text = self.emit(expr);
        if is_compound(expr) {
            format!(
                "({{ {} $o$ = {}; $o$->__vptr->toString$void($o$); }})",
                self.names.ty(&ty),
                text
            )
        } else {
            invoke_virtual(&text, "toString$void", &[])
        }
    }

    fn new_object(&self, new: &NewObject) -> String {
        let resolution = self.resolver.constructor_target(new);
        let mut args = vec![format!("new {}()", self.struct_for(&new.class))];
        args.extend(self.arguments(&new.args, resolution));
        format!(
            "{}::{}({})",
            self.struct_for(&new.class),
            resolution.mangled,
            args.join(", ")
        )
    }

    fn struct_for(&self, ty: &Type) -> String {
        match ty.class_type() {
            Some(class) => self.names.struct_ref(class),
            None => self.names.struct_ref(&ClassType::new(ty.canonical_tag(), "")),
        }
    }

    /// `new T[n]` allocates directly; `new T[n][m]` fills each row in a loop.
    fn new_array(&self, array: &NewArray, ty: &Type) -> String {
        if let Some(init) = &array.init {
            return self.emit(init);
        }
        let sizes: Vec<String> = array.sizes.iter().map(|size| self.emit(size)).collect();
        self.allocate(ty, &sizes, 0)
    }

    fn allocate(&self, ty: &Type, sizes: &[String], depth: usize) -> String {
        let Some(element) = ty.element_type() else {
            return format!("{}()", self.names.rt("null"));
        };
        let element_name = self.names.ty(&element);
        let new_array = format!("{}<{}>", self.names.rt("newArray"), element_name);
        let Some((size, rest)) = sizes.split_first() else {
            return format!("{}()", self.names.rt("null"));
        };
        if rest.is_empty() {
            return format!("{}({})", new_array, size);
        }
        let array = format!("$a{}$", depth);
        let index = format!("$i{}$", depth);
        format!(
            "({{ {ty} {array} = {new_array}({size}); for (int32_t {index} = 0; {index} < {array}->length; {index}++) {{ (*{array})[{index}] = {inner}; }} {array}; }})",
            ty = self.names.ty(ty),
            array = array,
            new_array = new_array,
            size = size,
            index = index,
            inner = self.allocate(&element, rest, depth + 1)
        )
    }

    /// Allocate, then assign each element by index in order.
    fn array_init(&self, elements: &[Expr], ty: &Type) -> String {
        let element = ty.element_type().unwrap_or_else(Type::object);
        let element_name = self.names.ty(&element);
        let mut out = format!(
            "({{ {} $a$ = {}<{}>({}); ",
            self.names.ty(ty),
            self.names.rt("newArray"),
            element_name,
            elements.len()
        );
        for (index, value) in elements.iter().enumerate() {
            out.push_str(&format!("(*$a$)[{}] = {}; ", index, self.coerce(value, &element)));
        }
        out.push_str("$a$; })");
        out
    }
}

pub(crate) fn with_this(this: &str, args: &[String]) -> String {
    let mut all = vec![this.to_string()];
    all.extend(args.iter().cloned());
    all.join(", ")
}

/// `r->__vptr->m(r, args)`
fn invoke_virtual(receiver: &str, method: &str, args: &[String]) -> String {
    format!("{}->__vptr->{}({})", receiver, method, with_this(receiver, args))
}

/// Receivers that must not be evaluated twice.
fn is_compound(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Identifier(_) | ExprKind::This | ExprKind::Super | ExprKind::Literal(_) => false,
        ExprKind::Selection(selection) => is_compound(&selection.base),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use crate::codegen::fixtures::{emit_run, lines};
    use crate::config::TranslatorConfig;
    use tree::build::*;

    fn run(body: Vec<tree::Node>) -> String {
        let (text, _) = emit_run(&TranslatorConfig::default(), body);
        text
    }

    #[test]
    fn test_arithmetic_and_unsigned_shift() {
        let text = run(vec![
            local(ty("int", 0), "x", Some(binary(int_lit("1"), "+", int_lit("2")))),
            expr_stmt(assign(ident("x"), "=", binary(ident("x"), ">>>", int_lit("2")))),
        ]);
        assert_eq!(
            lines(&text),
            vec![
                "int32_t $x = (1 + 2);",
                "$x = ((int32_t) ((uint32_t) $x >> 2));",
            ]
        );
    }

    #[test]
    fn test_string_concatenation_streams_every_operand() {
        let text = run(vec![
            local(ty("int", 0), "x", Some(int_lit("1"))),
            local(
                ty("String", 0),
                "s",
                Some(binary(binary(string_lit("a"), "+", ident("x")), "+", bool_lit(true))),
            ),
        ]);
        assert_eq!(
            lines(&text)[1],
            "String $s = ({ std::ostringstream $sout$; $sout$ << \"a\" << $x << (true ? \"true\" : \"false\"); __rt::literal($sout$.str()); });"
        );
    }

    #[test]
    fn test_field_access_forms() {
        let text = run(vec![
            expr_stmt(assign(ident("total"), "+=", int_lit("1"))),
            expr_stmt(assign(ident("instances"), "=", int_lit("0"))),
        ]);
        assert_eq!(
            lines(&text),
            vec!["__this->$total += 1;", "demo::__Main::$instances = 0;"]
        );
    }

    #[test]
    fn test_virtual_call_is_guarded() {
        let text = run(vec![
            local(ty("Sub", 0), "s", Some(new_object("Sub", vec![]))),
            expr_stmt(call(Some(ident("s")), "printMessage", vec![])),
        ]);
        assert_eq!(
            lines(&text),
            vec![
                "demo::Sub $s = demo::__Sub::$__Sub$void(new demo::__Sub());",
                "__rt::checkNotNull($s);",
                "$s->__vptr->printMessage$void($s);",
            ]
        );
    }

    #[test]
    fn test_guards_can_be_disabled() {
        let config = TranslatorConfig {
            null_checks: false,
            ..TranslatorConfig::default()
        };
        let (text, _) = emit_run(
            &config,
            vec![
                local(ty("Sub", 0), "s", Some(new_object("Sub", vec![]))),
                expr_stmt(call(Some(ident("s")), "printMessage", vec![])),
            ],
        );
        assert!(!text.contains("checkNotNull"));
    }

    #[test]
    fn test_array_subscript_and_length() {
        let text = run(vec![
            local(ty("int", 1), "a", Some(new_array("int", vec![int_lit("3")], 0, None))),
            expr_stmt(assign(
                subscript(ident("a"), int_lit("0")),
                "=",
                select(ident("a"), "length"),
            )),
        ]);
        assert_eq!(
            lines(&text),
            vec![
                "__rt::Array<int32_t>* $a = __rt::newArray<int32_t>(3);",
                "__rt::checkNotNull($a);",
                "(*$a)[0] = $a->length;",
            ]
        );
    }

    #[test]
    fn test_rows_of_multi_dimensional_arrays_are_allocated() {
        let text = run(vec![local(
            ty("int", 2),
            "m",
            Some(new_array("int", vec![int_lit("2"), int_lit("3")], 0, None)),
        )]);
        assert!(text.contains("__rt::newArray<__rt::Array<int32_t>*>(2)"));
        assert!(text.contains("(*$a0$)[$i0$] = __rt::newArray<int32_t>(3);"));
    }

    #[test]
    fn test_array_initializer() {
        let text = run(vec![local(
            ty("int", 1),
            "a",
            Some(array_init(vec![int_lit("4"), int_lit("5")])),
        )]);
        assert_eq!(
            lines(&text),
            vec!["__rt::Array<int32_t>* $a = ({ __rt::Array<int32_t>* $a$ = __rt::newArray<int32_t>(2); (*$a$)[0] = 4; (*$a$)[1] = 5; $a$; });"]
        );
    }

    #[test]
    fn test_print_forms() {
        let out = || Some(select(ident("System"), "out"));
        let text = run(vec![
            expr_stmt(call(out(), "print", vec![ident("total")])),
            expr_stmt(call(out(), "println", vec![bool_lit(false)])),
            expr_stmt(call(out(), "println", vec![ident("name")])),
        ]);
        assert_eq!(
            lines(&text),
            vec![
                "std::cout << __this->$total;",
                "std::cout << (false ? \"true\" : \"false\") << std::endl;",
                "std::cout << __this->$name << std::endl;",
            ]
        );
    }

    #[test]
    fn test_casts_and_instanceof() {
        let text = run(vec![
            local(ty("Object", 0), "o", Some(ident("name"))),
            local(ty("Sub", 0), "t", Some(cast(ty("Sub", 0), ident("o")))),
            local(ty("boolean", 0), "b", Some(instance_of(ident("o"), ty("Sub", 0)))),
            local(ty("long", 0), "l", Some(basic_cast("long", ident("total")))),
        ]);
        assert_eq!(
            lines(&text),
            vec![
                "Object $o = ((Object) __this->$name);",
                "demo::Sub $t = __rt::java_cast<demo::Sub>($o);",
                "bool $b = ({ Class $k$ = demo::__Sub::__class(); $k$->__vptr->isInstance$Object($k$, (Object) $o); });",
                "int64_t $l = ((int64_t) __this->$total);",
            ]
        );
    }

    #[test]
    fn test_literal_spelling() {
        let text = run(vec![
            local(ty("long", 0), "l", Some(int_lit("5L"))),
            local(ty("double", 0), "d", Some(float_lit("1.5d"))),
            local(ty("String", 0), "s", Some(null_lit())),
        ]);
        assert_eq!(
            lines(&text),
            vec![
                "int64_t $l = 5LL;",
                "double $d = 1.5;",
                "String $s = __rt::null();",
            ]
        );
    }
}
