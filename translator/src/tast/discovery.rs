//! Pass 1: class discovery
//!
//! Two sweeps over every compilation unit. The first registers each class
//! name under its package so that any class can refer to any other. The
//! second records hierarchy edges and member signatures. The returned
//! context is complete before any body is looked at.

use super::symbols::{
    constructor_base, ClassDecl, ClassLookup, CompilationContext, ConstructorDecl, FieldDecl,
    FileEnv, MethodDecl, MethodSignature, Modifiers, Visibility, MANGLE_SEPARATOR,
};
use super::type_syntax::{dimension_count, TypeSyntax};
use super::types::{Type, ROOT_CLASS, ROOT_CLASS_QUALIFIED, RUNTIME_PACKAGE};
use crate::config::TranslatorConfig;
use crate::error::{Reporter, TranslateError, TranslateResult};
use crate::error_codes::{DUPLICATE_MEMBER, UNKNOWN_SUPERCLASS, UNSUPPORTED_NODE};
use crate::pipeline::SourceUnit;
use log::{debug, info};
use tree::Node;

/// Members of one class, collected before the context is mutated.
#[derive(Default)]
struct Members {
    fields: Vec<FieldDecl>,
    constructors: Vec<ConstructorDecl>,
    methods: Vec<MethodDecl>,
}

/// A class found in sweep one, waiting for sweep two.
struct Pending<'u> {
    qualified: String,
    file: usize,
    node: &'u Node,
}

pub struct Discovery<'a> {
    config: &'a TranslatorConfig,
    reporter: &'a Reporter,
}

impl<'a> Discovery<'a> {
    pub fn new(config: &'a TranslatorConfig, reporter: &'a Reporter) -> Self {
        Self { config, reporter }
    }

    pub fn run(&self, units: &[SourceUnit]) -> TranslateResult<CompilationContext> {
        info!("discovery: {} compilation unit(s)", units.len());
        let mut ctx = CompilationContext::new();
        self.register_runtime_classes(&mut ctx);

        let pending = self.register_classes(&mut ctx, units)?;
        self.register_edges(&mut ctx, &pending);

        if let Some(chain) = ctx.hierarchy.find_cycle() {
            return Err(TranslateError::CyclicInheritance { chain });
        }

        for class in &pending {
            let members = self.collect_members(&ctx, class)?;
            self.install_members(&mut ctx, &class.qualified, members);
        }

        self.reporter.set_class(None);
        info!(
            "discovery: {} class(es) in {} package(s)",
            ctx.classes.len(),
            ctx.packages.len()
        );
        Ok(ctx)
    }

    fn register_runtime_classes(&self, ctx: &mut CompilationContext) {
        ctx.hierarchy.register_edge(ROOT_CLASS_QUALIFIED, None);
        ctx.add_class(ClassDecl::new(ROOT_CLASS, RUNTIME_PACKAGE, None));

        for name in &self.config.runtime_classes {
            if name == ROOT_CLASS {
                continue;
            }
            let mut class = ClassDecl::new(name, RUNTIME_PACKAGE, None);
            class.superclass = Some(ROOT_CLASS_QUALIFIED.to_string());
            ctx.hierarchy
                .register_edge(&class.qualified_name(), Some(ROOT_CLASS_QUALIFIED));
            ctx.add_class(class);
        }
    }

    /// Sweep one: file environments and class names.
    fn register_classes<'u>(
        &self,
        ctx: &mut CompilationContext,
        units: &'u [SourceUnit],
    ) -> TranslateResult<Vec<Pending<'u>>> {
        let mut pending = Vec::new();

        for unit in units {
            if !unit.tree.has_kind("CompilationUnit") {
                return Err(TranslateError::MalformedInput {
                    file: unit.name.clone(),
                    message: format!("expected CompilationUnit, found {}", unit.tree.kind()),
                });
            }
            self.reporter.set_file(&unit.name);

            let file_index = ctx.files.len();
            let env = file_env(&unit.name, &unit.tree);
            debug!("file {} in package '{}'", unit.name, env.package);

            for decl in unit.tree.nodes() {
                match decl.kind() {
                    "PackageDeclaration" | "ImportDeclaration" => {}
                    "ClassDeclaration" => {
                        let name = decl.token(1).unwrap_or_default();
                        let mut class = ClassDecl::new(name, &env.package, Some(file_index));
                        class.modifiers = Modifiers::from_node(decl.node(0));
                        let qualified = class.qualified_name();

                        if ctx.class(&qualified).is_some_and(|c| !c.is_runtime()) {
                            return Err(TranslateError::DuplicateClass { name: qualified });
                        }
                        debug!("discovered class {}", qualified);
                        ctx.add_class(class);
                        pending.push(Pending {
                            qualified,
                            file: file_index,
                            node: decl,
                        });
                    }
                    other => self.reporter.report(
                        UNSUPPORTED_NODE,
                        format!("top-level {} is not translated", other),
                    ),
                }
            }
            ctx.files.push(env);
        }

        Ok(pending)
    }

    /// Sweep two, first half: superclass edges. An unknown superclass is
    /// reported and replaced by the root class.
    fn register_edges(&self, ctx: &mut CompilationContext, pending: &[Pending<'_>]) {
        for class in pending {
            self.enter(ctx, class);
            let superclass = match class.node.node(3).and_then(extension_name) {
                None => ROOT_CLASS_QUALIFIED.to_string(),
                Some(name) => match ctx.files.get(class.file).map(|f| ctx.lookup_class(&name, f)) {
                    Some(ClassLookup::Found(q)) => q,
                    Some(ClassLookup::Ambiguous(candidates)) => candidates[0].clone(),
                    _ => {
                        self.reporter.report(
                            UNKNOWN_SUPERCLASS,
                            format!("superclass {} of {} not found", name, class.qualified),
                        );
                        ROOT_CLASS_QUALIFIED.to_string()
                    }
                },
            };

            ctx.hierarchy
                .register_edge(&class.qualified, Some(&superclass));
            if let Some(decl) = ctx.classes.get_mut(&class.qualified) {
                decl.superclass = Some(superclass);
            }
        }
    }

    fn enter(&self, ctx: &CompilationContext, class: &Pending<'_>) {
        if let Some(file) = ctx.file(class.file) {
            self.reporter.set_file(&file.name);
        }
        self.reporter.set_class(Some(&class.qualified));
    }

    /// Sweep two, second half: member signatures.
    fn collect_members(&self, ctx: &CompilationContext, class: &Pending<'_>) -> TranslateResult<Members> {
        self.enter(ctx, class);
        let Some(file) = ctx.file(class.file) else {
            return Ok(Members::default());
        };
        let types = TypeSyntax::new(ctx, file, self.reporter);
        let simple_name = class.node.token(1).unwrap_or_default();
        let mut members = Members::default();

        let body = class.node.node(5);
        for member in body.into_iter().flat_map(|b| b.nodes()) {
            match member.kind() {
                "FieldDeclaration" => {
                    let modifiers = Modifiers::from_node(member.node(0));
                    let base = member
                        .node(1)
                        .map(|t| types.resolve(t))
                        .unwrap_or_else(Type::void);
                    for declarator in member.node(2).into_iter().flat_map(|d| d.nodes()) {
                        let name = declarator.token(0).unwrap_or_default();
                        let ty = types
                            .with_dimensions(base.clone(), dimension_count(declarator.node(1)));
                        members.fields.push(FieldDecl {
                            name: name.to_string(),
                            ty,
                            modifiers,
                            owner: class.qualified.clone(),
                            initializer: declarator.node(2).cloned(),
                        });
                    }
                }
                "MethodDeclaration" => {
                    let name = member.token(3).unwrap_or_default();
                    if name.contains(MANGLE_SEPARATOR) {
                        return Err(TranslateError::SeparatorInName {
                            class: class.qualified.clone(),
                            name: name.to_string(),
                        });
                    }
                    let ret = member
                        .node(2)
                        .map(|t| types.resolve(t))
                        .unwrap_or_else(Type::void);
                    let ret = types.with_dimensions(ret, dimension_count(member.node(5)));
                    let (param_types, param_names) = parameters(&types, member.node(4));
                    let modifiers = Modifiers::from_node(member.node(0));
                    members.methods.push(MethodDecl {
                        signature: MethodSignature::new(name, param_types, ret, modifiers),
                        param_names,
                        owner: class.qualified.clone(),
                        body: member.node(7).cloned(),
                    });
                }
                "ConstructorDeclaration" => {
                    let (param_types, param_names) = parameters(&types, member.node(3));
                    let modifiers = Modifiers::from_node(member.node(0));
                    let own_type = types.class_named(&class.qualified);
                    members.constructors.push(ConstructorDecl {
                        signature: MethodSignature::new(
                            constructor_base(simple_name),
                            param_types,
                            own_type,
                            modifiers,
                        ),
                        param_names,
                        owner: class.qualified.clone(),
                        body: member
                            .node(5)
                            .cloned()
                            .unwrap_or_else(|| Node::leaf("Block")),
                        synthesized: false,
                    });
                }
                "EmptyDeclaration" => {}
                other => self.reporter.report(
                    UNSUPPORTED_NODE,
                    format!("class member {} is not translated", other),
                ),
            }
        }

        if members.constructors.is_empty() {
            members.constructors.push(ConstructorDecl {
                signature: MethodSignature::new(
                    constructor_base(simple_name),
                    [],
                    types.class_named(&class.qualified),
                    Modifiers {
                        visibility: Visibility::Public,
                        ..Modifiers::default()
                    },
                ),
                param_names: Vec::new(),
                owner: class.qualified.clone(),
                body: Node::leaf("Block"),
                synthesized: true,
            });
        }

        Ok(members)
    }

    fn install_members(&self, ctx: &mut CompilationContext, qualified: &str, members: Members) {
        let Some(class) = ctx.classes.get_mut(qualified) else {
            return;
        };

        for field in members.fields {
            if class.fields.contains_key(&field.name) {
                self.reporter.report(
                    DUPLICATE_MEMBER,
                    format!("field {} declared twice", field.name),
                );
                continue;
            }
            class.fields.insert(field.name.clone(), field);
        }
        for ctor in members.constructors {
            let mangled = ctor.mangled_name();
            if class.constructors.contains_key(&mangled) {
                self.reporter
                    .report(DUPLICATE_MEMBER, format!("constructor {} declared twice", mangled));
                continue;
            }
            class.constructors.insert(mangled, ctor);
        }
        for method in members.methods {
            let mangled = method.mangled_name();
            if class.methods.contains_key(&mangled) {
                self.reporter
                    .report(DUPLICATE_MEMBER, format!("method {} declared twice", mangled));
                continue;
            }
            debug!("  {} {}", qualified, mangled);
            class.methods.insert(mangled, method);
        }
    }
}

/// Package and imports of one compilation unit.
fn file_env(name: &str, unit: &Node) -> FileEnv {
    let mut env = FileEnv {
        name: name.to_string(),
        ..FileEnv::default()
    };
    for decl in unit.nodes() {
        match decl.kind() {
            "PackageDeclaration" => {
                if let Some(qid) = decl.find("QualifiedIdentifier") {
                    env.package = join_identifier(qid);
                }
            }
            "ImportDeclaration" => {
                let Some(qid) = decl.find("QualifiedIdentifier") else {
                    continue;
                };
                let target = join_identifier(qid);
                if decl.tokens().any(|t| t == "*") {
                    env.on_demand_imports.push(target);
                } else if let Some(simple) = qid.tokens().last() {
                    env.single_imports.insert(simple.to_string(), target);
                }
            }
            _ => {}
        }
    }
    env
}

fn join_identifier(qid: &Node) -> String {
    qid.tokens().collect::<Vec<_>>().join(".")
}

/// Name in an `Extension(Type(QualifiedIdentifier))` node.
fn extension_name(extension: &Node) -> Option<String> {
    let ty = extension.node(0)?;
    let qid = if ty.has_kind("Type") { ty.node(0)? } else { ty };
    qid.has_kind("QualifiedIdentifier")
        .then(|| join_identifier(qid))
}

/// Parameter types and names from a `FormalParameters` node.
fn parameters(types: &TypeSyntax<'_>, params: Option<&Node>) -> (Vec<Type>, Vec<String>) {
    let mut param_types = Vec::new();
    let mut names = Vec::new();
    for param in params.into_iter().flat_map(|p| p.nodes()) {
        let base = param
            .node(1)
            .map(|t| types.resolve(t))
            .unwrap_or_else(Type::void);
        let varargs = i64::from(param.token(2).is_some());
        let dims = dimension_count(param.node(4)) + varargs;
        param_types.push(types.with_dimensions(base, dims));
        names.push(param.token(3).unwrap_or_default().to_string());
    }
    (param_types, names)
}
