//! Class layout: the data struct, the vtable struct and the out-of-line
//! member definitions of one translated class.

use super::names::{namespace, vtable_struct, Naming};
use super::printer::Printer;
use super::stmt::StmtEmitter;
use crate::tast::builtins::root_methods;
use crate::tast::lowering::{ClassUnit, LoweredConstructor, LoweredMethod};
use crate::tast::node::{Delegation, Stmt};
use crate::tast::overload::OverloadResolver;
use crate::tast::symbols::{constructor_base, mangle, CompilationContext, MethodSignature};
use crate::tast::type_resolution::Resolver;
use crate::tast::types::{Type, ROOT_CLASS_QUALIFIED};
use indexmap::IndexMap;
use log::trace;

/// One vtable entry.
#[derive(Debug, Clone)]
pub struct Slot {
    pub mangled: String,
    pub signature: MethodSignature,
    /// Class whose implementation fills the slot
    pub owner: String,
}

/// Vtable of `class`: the root's slots, then each ancestor's new virtual
/// methods, root first. An override keeps the slot of the method it replaces.
pub fn vtable_layout(ctx: &CompilationContext, class: &str) -> Vec<Slot> {
    let mut slots: IndexMap<String, Slot> = IndexMap::new();
    for signature in root_methods() {
        let mangled = signature.mangled_name();
        slots.insert(
            mangled.clone(),
            Slot {
                mangled,
                signature,
                owner: ROOT_CLASS_QUALIFIED.to_string(),
            },
        );
    }

    let mut chain = ctx.hierarchy.ancestor_chain(class);
    chain.reverse();
    for decl in chain.iter().filter_map(|name| ctx.class(name)) {
        for (mangled, method) in decl.methods.iter().filter(|(_, m)| m.is_virtual()) {
            let slot = Slot {
                mangled: mangled.clone(),
                signature: method.signature.clone(),
                owner: decl.qualified_name(),
            };
            match slots.get_mut(mangled) {
                Some(existing) => *existing = slot,
                None => {
                    slots.insert(mangled.clone(), slot);
                }
            }
        }
    }
    slots.into_values().collect()
}

/// `namespace a { namespace b {` for package `a.b`; nothing for the
/// default package.
pub fn open_namespace(package: &str, out: &mut Printer) {
    if package.is_empty() {
        return;
    }
    let opening: Vec<String> = package
        .split('.')
        .map(|segment| format!("namespace {} {{", segment))
        .collect();
    out.line(&opening.join(" "));
    out.newline();
}

pub fn close_namespace(package: &str, out: &mut Printer) {
    if package.is_empty() {
        return;
    }
    let closing = vec!["}"; package.split('.').count()];
    out.line(&closing.join(" "));
    out.newline();
}

pub struct ClassEmitter<'r, 'a> {
    unit: &'a ClassUnit<'a>,
    resolver: &'r Resolver<'a>,
    names: &'r Naming<'r>,
    vtable: Vec<Slot>,
}

impl<'r, 'a> ClassEmitter<'r, 'a> {
    pub fn new(unit: &'a ClassUnit<'a>, resolver: &'r Resolver<'a>, names: &'r Naming<'r>) -> Self {
        let vtable = vtable_layout(resolver.context(), &unit.qualified_name());
        trace!("{}: {} vtable slots", unit.qualified_name(), vtable.len());
        Self {
            unit,
            resolver,
            names,
            vtable,
        }
    }

    pub fn vtable(&self) -> &[Slot] {
        &self.vtable
    }

    fn simple(&self) -> &str {
        &self.unit.class.name
    }

    fn data_struct(&self) -> String {
        format!("__{}", self.simple())
    }

    /// Parameter list of a member, with `Foo __this` first unless static.
    fn parameters(&self, signature: &MethodSignature, names: &[String], receiver: Option<&str>) -> String {
        let mut params: Vec<String> = receiver
            .map(|ty| format!("{} __this", ty))
            .into_iter()
            .collect();
        params.extend(
            signature
                .params
                .iter()
                .zip(names)
                .map(|(ty, name)| format!("{} {}", self.names.ty(ty), self.names.variable(name))),
        );
        params.join(", ")
    }

    /// Parameter types of a vtable slot, receiver first.
    fn slot_parameters(&self, signature: &MethodSignature) -> String {
        let mut params = vec![self.simple().to_string()];
        params.extend(signature.params.iter().map(|ty| self.names.ty(ty)));
        params.join(", ")
    }

    fn receiver(&self, is_static: bool) -> Option<&str> {
        (!is_static).then(|| self.simple())
    }

    /// Instance fields of the class and its ancestors, root first. A field
    /// hidden by a subclass keeps the ancestor's slot.
    fn instance_fields(&self) -> Vec<(String, Type)> {
        let ctx = self.resolver.context();
        let mut chain = ctx.hierarchy.ancestor_chain(&self.unit.qualified_name());
        chain.reverse();
        let mut fields: IndexMap<String, Type> = IndexMap::new();
        for decl in chain.iter().filter_map(|name| ctx.class(name)) {
            for field in decl.instance_fields() {
                fields
                    .entry(field.name.clone())
                    .or_insert_with(|| field.ty.clone());
            }
        }
        fields.into_iter().collect()
    }

    /// Header part: data struct and vtable struct.
    pub fn declare(&self, out: &mut Printer) {
        let data = self.data_struct();
        let vt = vtable_struct(self.simple());

        out.open(&format!("struct {} {{", data));
        out.line(&format!("{}* __vptr;", vt));
        for (name, ty) in self.instance_fields() {
            out.line(&format!("{} {};", self.names.ty(&ty), self.names.variable(&name)));
        }
        for field in self.unit.class.static_fields() {
            out.line(&format!(
                "static {} {};",
                self.names.ty(&field.ty),
                self.names.variable(&field.name)
            ));
        }
        out.newline();
        out.line(&format!("{}();", data));
        out.newline();

        for ctor in &self.unit.constructors {
            let decl = ctor.decl;
            out.line(&format!(
                "static {} {}({});",
                self.simple(),
                decl.mangled_name(),
                self.parameters(&decl.signature, &decl.param_names, Some(self.simple()))
            ));
        }
        for method in &self.unit.methods {
            let decl = method.decl;
            out.line(&format!(
                "static {} {}({});",
                self.names.ty(&decl.signature.return_type),
                decl.mangled_name(),
                self.parameters(&decl.signature, &decl.param_names, self.receiver(decl.is_static()))
            ));
        }
        out.newline();
        out.line("static Class __class();");
        out.line(&format!("static {} __vtable;", vt));
        out.close("};");
        out.newline();

        self.declare_vtable(out);
    }

    fn declare_vtable(&self, out: &mut Printer) {
        let own = self.unit.qualified_name();
        out.open(&format!("struct {} {{", vtable_struct(self.simple())));
        out.line("Class __isa;");
        for slot in &self.vtable {
            out.line(&format!(
                "{} (*{})({});",
                self.names.ty(&slot.signature.return_type),
                slot.mangled,
                self.slot_parameters(&slot.signature)
            ));
        }
        out.newline();

        let mut inits = vec![format!("__isa({}::__class())", self.data_struct())];
        for slot in &self.vtable {
            let init = if slot.owner != own {
                format!(
                    "{}(({}(*)({}))&{}::{})",
                    slot.mangled,
                    self.names.ty(&slot.signature.return_type),
                    self.slot_parameters(&slot.signature),
                    self.names.struct_of(&slot.owner),
                    slot.mangled
                )
            } else if slot.signature.is_abstract {
                format!("{}(0)", slot.mangled)
            } else {
                format!("{}(&{}::{})", slot.mangled, self.data_struct(), slot.mangled)
            };
            inits.push(init);
        }
        out.line(&format!("{}()", vtable_struct(self.simple())));
        let last = inits.len() - 1;
        for (index, init) in inits.iter().enumerate() {
            let lead = if index == 0 { ": " } else { "  " };
            let tail = if index == last { " {" } else { "," };
            out.line(&format!("{}{}{}", lead, init, tail));
        }
        out.line("}");
        out.close("};");
        out.newline();
    }

    /// Source part: static storage, constructors, methods and the class
    /// object.
    pub fn define(&self, out: &mut Printer) {
        let data = self.data_struct();
        let reporter = self.resolver.reporter();

        for field in &self.unit.fields {
            let decl = field.decl;
            if !decl.is_static() {
                continue;
            }
            let value = match &field.init {
                Some(init) => StmtEmitter::new(self.resolver, self.names, decl.ty.clone())
                    .exprs()
                    .coerce(init, &decl.ty),
                None => self.names.zero_value(&decl.ty),
            };
            out.line(&format!(
                "{} {}::{} = {};",
                self.names.ty(&decl.ty),
                data,
                self.names.variable(&decl.name),
                value
            ));
        }
        if self.unit.class.static_fields().next().is_some() {
            out.newline();
        }

        self.default_constructor(out);
        for ctor in &self.unit.constructors {
            reporter.set_member(Some(&ctor.decl.mangled_name()));
            self.constructor(ctor, out);
        }
        for method in &self.unit.methods {
            reporter.set_member(Some(&method.decl.mangled_name()));
            self.method(method, out);
        }
        reporter.set_member(None);
        self.class_object(out);
        out.line(&format!("{} {}::__vtable;", vtable_struct(self.simple()), data));
        out.newline();
    }

    fn default_constructor(&self, out: &mut Printer) {
        let data = self.data_struct();
        let mut inits = vec!["__vptr(&__vtable)".to_string()];
        inits.extend(self.instance_fields().iter().map(|(name, ty)| {
            format!("{}({})", self.names.variable(name), self.names.zero_value(ty))
        }));
        out.line(&format!("{}::{}()", data, data));
        out.line(&format!(": {} {{", inits.join(", ")));
        out.line("}");
        out.newline();
    }

    fn constructor(&self, ctor: &LoweredConstructor<'_>, out: &mut Printer) {
        let decl = ctor.decl;
        let stmts = StmtEmitter::new(self.resolver, self.names, self.unit.class.as_type());
        out.open(&format!(
            "{} {}::{}({}) {{",
            self.simple(),
            self.data_struct(),
            decl.mangled_name(),
            self.parameters(&decl.signature, &decl.param_names, Some(self.simple()))
        ));

        let delegation = ctor.delegation();
        let rest = match delegation {
            Some(call) => {
                stmts.delegation(call, out);
                &ctor.body.stmts[1..]
            }
            None => {
                self.implicit_super(out);
                &ctor.body.stmts[..]
            }
        };

        // Fields are initialized once, by the constructor that reaches super.
        if !matches!(delegation.map(|call| call.kind), Some(Delegation::This)) {
            for field in &self.unit.fields {
                if let (false, Some(init)) = (field.decl.is_static(), &field.init) {
                    stmts.field_init(&field.decl.name, init, &field.decl.ty, out);
                }
            }
        }

        for stmt in rest.iter().filter(|stmt| !matches!(stmt, Stmt::Empty)) {
            stmts.emit(stmt, out);
        }
        out.line("return __this;");
        out.close("}");
        out.newline();
    }

    /// `super()` for a constructor that does not delegate. Runtime
    /// superclasses, the root among them, are entered through their
    /// zero-argument helper without overload search.
    fn implicit_super(&self, out: &mut Printer) {
        let ctx = self.resolver.context();
        let superclass = self
            .unit
            .class
            .superclass
            .as_deref()
            .unwrap_or(ROOT_CLASS_QUALIFIED);
        let mangled = match ctx.class(superclass) {
            Some(class) if !class.is_runtime() => {
                OverloadResolver::new(ctx).resolve_constructor(superclass, &[]).mangled
            }
            _ => {
                let simple = superclass.rsplit('.').next().unwrap_or(superclass);
                mangle(&constructor_base(simple), &[] as &[Type])
            }
        };
        out.line(&format!(
            "{}::{}(({}) __this);",
            self.names.struct_of(superclass),
            mangled,
            self.names.class_of(superclass)
        ));
    }

    fn method(&self, method: &LoweredMethod<'_>, out: &mut Printer) {
        let decl = method.decl;
        let Some(body) = &method.body else {
            return;
        };
        let ret = &decl.signature.return_type;
        let stmts = StmtEmitter::new(self.resolver, self.names, ret.clone());
        out.open(&format!(
            "{} {}::{}({}) {{",
            self.names.ty(ret),
            self.data_struct(),
            decl.mangled_name(),
            self.parameters(&decl.signature, &decl.param_names, self.receiver(decl.is_static()))
        ));
        stmts.emit_statements(&body.stmts, out);
        out.close("}");
        out.newline();
    }

    fn class_object(&self, out: &mut Printer) {
        let parent = self
            .unit
            .class
            .superclass
            .as_deref()
            .unwrap_or(ROOT_CLASS_QUALIFIED);
        out.open(&format!("Class {}::__class() {{", self.data_struct()));
        out.line(&format!(
            "static Class k = new {}({}(\"{}\"), {}::__class());",
            self.names.struct_of("java.lang.Class"),
            self.names.rt("literal"),
            self.unit.qualified_name(),
            self.names.struct_of(parent)
        ));
        out.line("return k;");
        out.close("}");
        out.newline();
    }
}

/// `int main` calling the entry point of `class`.
pub fn entry_point(class: &str, names: &Naming<'_>, out: &mut Printer) {
    out.open("int main(int argc, char** argv) {");
    out.line(&format!(
        "{}::{}({}(argc, argv));",
        names.struct_of(class),
        mangle("main", &[Type::array(Type::string(), 1)]),
        names.rt("args")
    ));
    out.line("return 0;");
    out.close("}");
}
