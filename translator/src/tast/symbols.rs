//! Declarations and the compilation context
//!
//! Discovery fills a [`CompilationContext`] with one [`ClassDecl`] per class,
//! keyed by fully-qualified name, together with the hierarchy registry and
//! the package table. Resolution only reads it.

use super::hierarchy::HierarchyRegistry;
use super::types::{ClassType, Type, ROOT_CLASS_QUALIFIED, RUNTIME_PACKAGE};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::fmt;
use tree::Node;

/// Separator between a base name and each parameter tag.
pub const MANGLE_SEPARATOR: char = '$';

/// Tag used for a signature with no parameters.
pub const VOID_TAG: &str = "void";

/// Build a mangled name: `base$tag1$tag2`, or `base$void` with no parameters.
pub fn mangle<'a>(base: &str, params: impl IntoIterator<Item = &'a Type>) -> String {
    let mut mangled = base.to_string();
    let mut any = false;
    for param in params {
        mangled.push(MANGLE_SEPARATOR);
        mangled.push_str(&param.canonical_tag());
        any = true;
    }
    if !any {
        mangled.push(MANGLE_SEPARATOR);
        mangled.push_str(VOID_TAG);
    }
    mangled
}

/// Mangled constructors share the base `$__Name`.
pub fn constructor_base(class_name: &str) -> String {
    format!("$__{}", class_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Public,
    Protected,
    #[default]
    PackagePrivate,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::PackagePrivate => "package-private",
            Visibility::Private => "private",
        };
        write!(f, "{}", name)
    }
}

/// Modifier keywords that matter for translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
}

impl Modifiers {
    /// Read a `Modifiers` node; an absent node gives the defaults.
    pub fn from_node(node: Option<&Node>) -> Self {
        let mut modifiers = Modifiers::default();
        for keyword in node
            .into_iter()
            .flat_map(|n| n.nodes())
            .filter_map(|m| m.token(0))
        {
            match keyword {
                "public" => modifiers.visibility = Visibility::Public,
                "protected" => modifiers.visibility = Visibility::Protected,
                "private" => modifiers.visibility = Visibility::Private,
                "static" => modifiers.is_static = true,
                "final" => modifiers.is_final = true,
                "abstract" => modifiers.is_abstract = true,
                _ => {}
            }
        }
        modifiers
    }

    pub fn public_static() -> Self {
        Self {
            visibility: Visibility::Public,
            is_static: true,
            ..Self::default()
        }
    }
}

/// `{baseName, orderedParamTypes, returnType, visibility, isStatic, isFinal, isAbstract}`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub base_name: String,
    pub params: SmallVec<[Type; 4]>,
    pub return_type: Type,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_abstract: bool,
}

impl MethodSignature {
    pub fn new(
        base_name: impl Into<String>,
        params: impl IntoIterator<Item = Type>,
        return_type: Type,
        modifiers: Modifiers,
    ) -> Self {
        Self {
            base_name: base_name.into(),
            params: params.into_iter().collect(),
            return_type,
            visibility: modifiers.visibility,
            is_static: modifiers.is_static,
            is_final: modifiers.is_final,
            is_abstract: modifiers.is_abstract,
        }
    }

    pub fn mangled_name(&self) -> String {
        mangle(&self.base_name, &self.params)
    }

    /// Dispatched through the vtable: non-static and public or protected.
    pub fn is_virtual(&self) -> bool {
        !self.is_static
            && matches!(self.visibility, Visibility::Public | Visibility::Protected)
    }
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub ty: Type,
    pub modifiers: Modifiers,
    /// Qualified name of the declaring class
    pub owner: String,
    pub initializer: Option<Node>,
}

impl FieldDecl {
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static
    }
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub signature: MethodSignature,
    pub param_names: Vec<String>,
    pub owner: String,
    pub body: Option<Node>,
}

impl MethodDecl {
    pub fn mangled_name(&self) -> String {
        self.signature.mangled_name()
    }

    pub fn is_static(&self) -> bool {
        self.signature.is_static
    }

    pub fn is_virtual(&self) -> bool {
        self.signature.is_virtual()
    }

    /// `public static void main(String[])`
    pub fn is_entry_point(&self) -> bool {
        let sig = &self.signature;
        sig.base_name == "main"
            && sig.is_static
            && sig.visibility == Visibility::Public
            && sig.return_type.is_void()
            && sig.params.len() == 1
            && sig.params[0] == Type::array(Type::string(), 1)
    }
}

#[derive(Debug, Clone)]
pub struct ConstructorDecl {
    /// Base name is `$__Name`; the return type is the class itself
    pub signature: MethodSignature,
    pub param_names: Vec<String>,
    pub owner: String,
    pub body: Node,
    /// No declaration in the source
    pub synthesized: bool,
}

impl ConstructorDecl {
    pub fn mangled_name(&self) -> String {
        self.signature.mangled_name()
    }
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub package: String,
    pub modifiers: Modifiers,
    /// Qualified name of the immediate superclass; `None` only for the root
    pub superclass: Option<String>,
    pub fields: IndexMap<String, FieldDecl>,
    pub constructors: IndexMap<String, ConstructorDecl>,
    /// Keyed by mangled name
    pub methods: IndexMap<String, MethodDecl>,
    /// Index into [`CompilationContext::files`]; `None` for runtime classes
    pub file: Option<usize>,
}

impl ClassDecl {
    pub fn new(name: &str, package: &str, file: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            package: package.to_string(),
            modifiers: Modifiers::default(),
            superclass: None,
            fields: IndexMap::new(),
            constructors: IndexMap::new(),
            methods: IndexMap::new(),
            file,
        }
    }

    pub fn qualified_name(&self) -> String {
        self.class_type().qualified_name()
    }

    pub fn class_type(&self) -> ClassType {
        ClassType::new(&self.name, &self.package)
    }

    pub fn as_type(&self) -> Type {
        Type::Class(self.class_type())
    }

    /// Provided by the runtime library rather than translated.
    pub fn is_runtime(&self) -> bool {
        self.file.is_none()
    }

    pub fn get_method(&self, mangled: &str) -> Option<&MethodDecl> {
        self.methods.get(mangled)
    }

    pub fn instance_fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields.values().filter(|f| !f.is_static())
    }

    pub fn static_fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.fields.values().filter(|f| f.is_static())
    }
}

/// Per-file name environment: package and imports.
#[derive(Debug, Clone, Default)]
pub struct FileEnv {
    pub name: String,
    pub package: String,
    /// simple name -> qualified name
    pub single_imports: IndexMap<String, String>,
    pub on_demand_imports: Vec<String>,
}

/// Outcome of looking up a class name from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassLookup {
    Found(String),
    /// Several on-demand imports expose the name; the first is used.
    Ambiguous(Vec<String>),
    Missing,
}

impl ClassLookup {
    pub fn qualified(&self) -> Option<&str> {
        match self {
            ClassLookup::Found(name) => Some(name),
            ClassLookup::Ambiguous(names) => names.first().map(String::as_str),
            ClassLookup::Missing => None,
        }
    }
}

/// Everything discovery learned about the program.
#[derive(Debug, Clone, Default)]
pub struct CompilationContext {
    pub hierarchy: HierarchyRegistry,
    pub classes: IndexMap<String, ClassDecl>,
    /// package -> qualified class names
    pub packages: IndexMap<String, Vec<String>>,
    pub files: Vec<FileEnv>,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&mut self, class: ClassDecl) {
        let qualified = class.qualified_name();
        self.packages
            .entry(class.package.clone())
            .or_default()
            .push(qualified.clone());
        self.classes.insert(qualified, class);
    }

    pub fn class(&self, qualified: &str) -> Option<&ClassDecl> {
        self.classes.get(qualified)
    }

    pub fn class_of(&self, ty: &Type) -> Option<&ClassDecl> {
        ty.class_type()
            .and_then(|class| self.class(&class.qualified_name()))
    }

    pub fn root(&self) -> Option<&ClassDecl> {
        self.class(ROOT_CLASS_QUALIFIED)
    }

    pub fn file(&self, index: usize) -> Option<&FileEnv> {
        self.files.get(index)
    }

    /// Every qualified class a simple name may denote from `file`, most
    /// specific first: single-type imports, the file's own package, the
    /// on-demand imports, then the runtime package.
    pub fn visible_candidates(&self, name: &str, file: &FileEnv) -> Vec<String> {
        let mut candidates = Vec::new();
        let mut push = |qualified: String| {
            if self.classes.contains_key(&qualified) && !candidates.contains(&qualified) {
                candidates.push(qualified);
            }
        };

        if let Some(qualified) = file.single_imports.get(name) {
            push(qualified.clone());
        }
        push(ClassType::new(name, &file.package).qualified_name());
        for package in &file.on_demand_imports {
            push(ClassType::new(name, package).qualified_name());
        }
        push(ClassType::new(name, RUNTIME_PACKAGE).qualified_name());
        candidates
    }

    /// Resolve a simple or qualified class name as seen from `file`.
    pub fn lookup_class(&self, name: &str, file: &FileEnv) -> ClassLookup {
        if name.contains('.') {
            return if self.classes.contains_key(name) {
                ClassLookup::Found(name.to_string())
            } else {
                ClassLookup::Missing
            };
        }

        if let Some(qualified) = file.single_imports.get(name) {
            if self.classes.contains_key(qualified) {
                return ClassLookup::Found(qualified.clone());
            }
        }
        let local = ClassType::new(name, &file.package).qualified_name();
        if self.classes.contains_key(&local) {
            return ClassLookup::Found(local);
        }

        let imported: Vec<String> = file
            .on_demand_imports
            .iter()
            .map(|package| ClassType::new(name, package).qualified_name())
            .filter(|qualified| self.classes.contains_key(qualified))
            .collect();
        match imported.len() {
            0 => {}
            1 => return ClassLookup::Found(imported[0].clone()),
            _ => return ClassLookup::Ambiguous(imported),
        }

        let runtime = ClassType::new(name, RUNTIME_PACKAGE).qualified_name();
        if self.classes.contains_key(&runtime) {
            return ClassLookup::Found(runtime);
        }
        ClassLookup::Missing
    }

    /// Find a method by mangled name in `class` or its ancestors.
    pub fn find_method(&self, class: &str, mangled: &str) -> Option<&MethodDecl> {
        self.hierarchy
            .ancestor_chain(class)
            .iter()
            .filter_map(|c| self.class(c))
            .find_map(|c| c.get_method(mangled))
    }

    /// Find a field by name in `class` or its ancestors.
    pub fn find_field(&self, class: &str, name: &str) -> Option<&FieldDecl> {
        self.hierarchy
            .ancestor_chain(class)
            .iter()
            .filter_map(|c| self.class(c))
            .find_map(|c| c.fields.get(name))
    }

    /// Constructors are never inherited.
    pub fn find_constructor(&self, class: &str, mangled: &str) -> Option<&ConstructorDecl> {
        self.class(class).and_then(|c| c.constructors.get(mangled))
    }

    /// Classes that are translated, ancestors first.
    pub fn translated_classes(&self) -> Vec<&ClassDecl> {
        self.hierarchy
            .ancestors_first()
            .iter()
            .filter_map(|name| self.class(name))
            .filter(|class| !class.is_runtime())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mangling() {
        assert_eq!(mangle("printMessage", &[]), "printMessage$void");
        assert_eq!(
            mangle("add", &[Type::int(), Type::class("Sub", "p")]),
            "add$int32_t$Sub"
        );
        assert_eq!(mangle(&constructor_base("Foo"), &[]), "$__Foo$void");
    }

    #[test]
    fn test_mangling_uniqueness() {
        let sequences = [
            vec![Type::int()],
            vec![Type::long()],
            vec![Type::int(), Type::int()],
            vec![Type::string()],
            vec![Type::array(Type::int(), 1)],
        ];
        for (i, a) in sequences.iter().enumerate() {
            for (j, b) in sequences.iter().enumerate() {
                assert_eq!(i == j, mangle("m", a) == mangle("m", b));
            }
        }
    }

    #[test]
    fn test_virtual_rule() {
        let public = MethodSignature::new(
            "run",
            [],
            Type::void(),
            Modifiers {
                visibility: Visibility::Public,
                ..Modifiers::default()
            },
        );
        assert!(public.is_virtual());

        let private = MethodSignature { visibility: Visibility::Private, ..public.clone() };
        assert!(!private.is_virtual());

        let stat = MethodSignature { is_static: true, ..public };
        assert!(!stat.is_virtual());
    }

    #[test]
    fn test_modifiers_from_node() {
        let node = tree::build::modifiers(&["protected", "static", "final"]);
        let modifiers = Modifiers::from_node(Some(&node));
        assert_eq!(modifiers.visibility, Visibility::Protected);
        assert!(modifiers.is_static && modifiers.is_final && !modifiers.is_abstract);
        assert_eq!(Modifiers::from_node(None), Modifiers::default());
    }

    fn context() -> (CompilationContext, FileEnv) {
        let mut ctx = CompilationContext::new();
        ctx.add_class(ClassDecl::new("Object", "java.lang", None));
        ctx.add_class(ClassDecl::new("String", "java.lang", None));
        ctx.add_class(ClassDecl::new("A", "p", Some(0)));
        ctx.add_class(ClassDecl::new("B", "q", Some(0)));
        ctx.add_class(ClassDecl::new("B", "r", Some(0)));
        ctx.add_class(ClassDecl::new("C", "r", Some(0)));
        let file = FileEnv {
            name: "A.java".into(),
            package: "p".into(),
            single_imports: IndexMap::new(),
            on_demand_imports: vec!["q".into(), "r".into()],
        };
        (ctx, file)
    }

    #[test]
    fn test_class_lookup() {
        let (ctx, mut file) = context();
        assert_eq!(ctx.lookup_class("A", &file), ClassLookup::Found("p.A".into()));
        assert_eq!(ctx.lookup_class("C", &file), ClassLookup::Found("r.C".into()));
        assert_eq!(
            ctx.lookup_class("String", &file),
            ClassLookup::Found("java.lang.String".into())
        );
        assert_eq!(
            ctx.lookup_class("B", &file),
            ClassLookup::Ambiguous(vec!["q.B".into(), "r.B".into()])
        );
        assert_eq!(ctx.lookup_class("Nope", &file), ClassLookup::Missing);
        assert_eq!(ctx.lookup_class("q.B", &file), ClassLookup::Found("q.B".into()));

        file.single_imports.insert("B".into(), "r.B".into());
        assert_eq!(ctx.lookup_class("B", &file), ClassLookup::Found("r.B".into()));
        assert_eq!(ctx.visible_candidates("B", &file), vec!["r.B", "q.B"]);
    }
}
