//! Scope chain for name resolution
//!
//! Scopes live in an arena owned by a [`ScopeTree`] and point at their parent
//! by id. Every chain ends in exactly one class scope. Names are stored with
//! the `$` prefix used for variables in emitted code, so a source name can
//! never clash with a target keyword.

use super::types::Type;
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn from_raw(raw: u32) -> Self {
        ScopeId(raw)
    }

    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Class body; holds fields, inherited ones included
    Class,
    /// Method parameters
    Method,
    /// Constructor parameters
    Constructor,
    /// Block, loop header, catch clause
    Block,
}

impl ScopeKind {
    pub fn is_member(self) -> bool {
        matches!(self, ScopeKind::Method | ScopeKind::Constructor)
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeKind::Class => "class",
            ScopeKind::Method => "method",
            ScopeKind::Constructor => "constructor",
            ScopeKind::Block => "block",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Field,
    Parameter,
    Local,
}

/// What a name denotes inside one scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub ty: Type,
    pub kind: BindingKind,
    pub is_static: bool,
    /// Declaring class, for fields
    pub owner: Option<String>,
}

impl Binding {
    pub fn local(ty: Type) -> Self {
        Self {
            ty,
            kind: BindingKind::Local,
            is_static: false,
            owner: None,
        }
    }

    pub fn parameter(ty: Type) -> Self {
        Self {
            kind: BindingKind::Parameter,
            ..Self::local(ty)
        }
    }

    pub fn field(ty: Type, is_static: bool, owner: &str) -> Self {
        Self {
            ty,
            kind: BindingKind::Field,
            is_static,
            owner: Some(owner.to_string()),
        }
    }
}

/// Prefix a source name the way variables are spelled in emitted code.
pub fn scoped_name(name: &str) -> String {
    format!("${}", name)
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    /// None only for the class scope of a top-level class
    pub parent_id: Option<ScopeId>,
    /// Depth in the scope tree (0 for a class scope)
    pub depth: u32,
    /// Qualified class name, set on class scopes
    pub class_name: Option<String>,
    /// Member scopes of static methods
    pub is_static: bool,
    bindings: IndexMap<String, Binding>,
}

impl Scope {
    pub fn has_binding(&self, name: &str) -> bool {
        self.bindings.contains_key(&scoped_name(name))
    }

    pub fn get_binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(&scoped_name(name))
    }

    /// Declared names with their prefix, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}

/// Errors that can occur during scope operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    ScopeNotFound { scope_id: ScopeId },
    AlreadyDeclared { name: String, scope_id: ScopeId },
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeError::ScopeNotFound { scope_id } => write!(f, "scope {} not found", scope_id),
            ScopeError::AlreadyDeclared { name, scope_id } => {
                write!(f, "'{}' is already declared in scope {}", name, scope_id)
            }
        }
    }
}

impl std::error::Error for ScopeError {}

#[derive(Debug, Clone, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the class scope at the root of a chain.
    pub fn create_class_scope(&mut self, class_name: &str) -> ScopeId {
        let id = self.push(ScopeKind::Class, None, false);
        if let Some(scope) = self.scopes.get_mut(id.0 as usize) {
            scope.class_name = Some(class_name.to_string());
        }
        id
    }

    /// Open a nested scope. Static-ness is inherited from the parent unless
    /// `is_static` is set.
    pub fn create_scope(&mut self, kind: ScopeKind, parent: ScopeId, is_static: bool) -> ScopeId {
        let inherited = self.get_scope(parent).map(|p| p.is_static).unwrap_or(false);
        self.push(kind, Some(parent), is_static || inherited)
    }

    fn push(&mut self, kind: ScopeKind, parent_id: Option<ScopeId>, is_static: bool) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        let depth = parent_id
            .and_then(|p| self.get_scope(p))
            .map(|p| p.depth + 1)
            .unwrap_or(0);
        self.scopes.push(Scope {
            id,
            kind,
            parent_id,
            depth,
            class_name: None,
            is_static,
            bindings: IndexMap::new(),
        });
        id
    }

    pub fn get_scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Declare `name` in exactly this scope. Redeclaring in the same scope is
    /// a collision; shadowing an outer scope is allowed.
    pub fn declare(&mut self, scope_id: ScopeId, name: &str, binding: Binding) -> Result<(), ScopeError> {
        let scope = self
            .scopes
            .get_mut(scope_id.0 as usize)
            .ok_or(ScopeError::ScopeNotFound { scope_id })?;
        let key = scoped_name(name);
        if scope.bindings.contains_key(&key) {
            return Err(ScopeError::AlreadyDeclared {
                name: name.to_string(),
                scope_id,
            });
        }
        scope.bindings.insert(key, binding);
        Ok(())
    }

    /// Add an inherited member unless the scope already declares the name.
    pub fn inherit(&mut self, scope_id: ScopeId, name: &str, binding: Binding) {
        if let Some(scope) = self.scopes.get_mut(scope_id.0 as usize) {
            scope.bindings.entry(scoped_name(name)).or_insert(binding);
        }
    }

    /// The scope ids from `scope_id` up to the class scope, inclusive.
    pub fn chain(&self, scope_id: ScopeId) -> Vec<ScopeId> {
        let mut chain = Vec::new();
        let mut current = self.get_scope(scope_id);
        while let Some(scope) = current {
            chain.push(scope.id);
            current = scope.parent_id.and_then(|p| self.get_scope(p));
        }
        chain
    }

    /// The binding for `name` and the scope that declared it.
    pub fn lookup(&self, scope_id: ScopeId, name: &str) -> Option<(&Binding, ScopeId)> {
        self.chain(scope_id).into_iter().find_map(|id| {
            self.get_scope(id)
                .and_then(|scope| scope.get_binding(name))
                .map(|binding| (binding, id))
        })
    }

    pub fn is_in_scope(&self, scope_id: ScopeId, name: &str) -> bool {
        self.lookup(scope_id, name).is_some()
    }

    pub fn type_of(&self, scope_id: ScopeId, name: &str) -> Option<&Type> {
        self.lookup(scope_id, name).map(|(binding, _)| &binding.ty)
    }

    pub fn owning_scope(&self, scope_id: ScopeId, name: &str) -> Option<ScopeId> {
        self.lookup(scope_id, name).map(|(_, id)| id)
    }

    /// Qualified name of the class whose scope ends this chain.
    pub fn enclosing_class(&self, scope_id: ScopeId) -> Option<&str> {
        self.chain(scope_id)
            .into_iter()
            .filter_map(|id| self.get_scope(id))
            .find(|scope| scope.kind == ScopeKind::Class)
            .and_then(|scope| scope.class_name.as_deref())
    }

    /// Kind of the nearest method or constructor scope.
    pub fn enclosing_member(&self, scope_id: ScopeId) -> Option<ScopeKind> {
        self.chain(scope_id)
            .into_iter()
            .filter_map(|id| self.get_scope(id))
            .map(|scope| scope.kind)
            .find(|kind| kind.is_member())
    }

    pub fn is_static_context(&self, scope_id: ScopeId) -> bool {
        self.get_scope(scope_id).map(|s| s.is_static).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ScopeTree, ScopeId, ScopeId, ScopeId) {
        let mut tree = ScopeTree::new();
        let class = tree.create_class_scope("p.Sub");
        tree.declare(class, "count", Binding::field(Type::int(), false, "p.Sub"))
            .unwrap();
        let method = tree.create_scope(ScopeKind::Method, class, false);
        tree.declare(method, "arg", Binding::parameter(Type::string()))
            .unwrap();
        let block = tree.create_scope(ScopeKind::Block, method, false);
        tree.declare(block, "count", Binding::local(Type::long()))
            .unwrap();
        (tree, class, method, block)
    }

    #[test]
    fn test_lookup_walks_parents() {
        let (tree, class, method, block) = setup();

        assert!(tree.is_in_scope(block, "arg"));
        assert_eq!(tree.owning_scope(block, "arg"), Some(method));
        assert_eq!(tree.type_of(block, "count"), Some(&Type::long()));
        assert_eq!(tree.type_of(method, "count"), Some(&Type::int()));
        assert_eq!(tree.owning_scope(method, "count"), Some(class));
        assert!(!tree.is_in_scope(class, "arg"));
    }

    #[test]
    fn test_redeclaration_collides() {
        let (mut tree, _, _, block) = setup();
        let err = tree
            .declare(block, "count", Binding::local(Type::int()))
            .unwrap_err();
        assert_eq!(
            err,
            ScopeError::AlreadyDeclared {
                name: "count".into(),
                scope_id: block
            }
        );
        // the first declaration wins
        assert_eq!(tree.type_of(block, "count"), Some(&Type::long()));
    }

    #[test]
    fn test_inherit_does_not_override() {
        let (mut tree, class, _, _) = setup();
        tree.inherit(class, "count", Binding::field(Type::double(), false, "p.Base"));
        tree.inherit(class, "base", Binding::field(Type::char(), true, "p.Base"));
        assert_eq!(tree.type_of(class, "count"), Some(&Type::int()));
        let (binding, _) = tree.lookup(class, "base").unwrap();
        assert!(binding.is_static);
        assert_eq!(binding.owner.as_deref(), Some("p.Base"));
    }

    #[test]
    fn test_enclosing_queries() {
        let (mut tree, class, method, block) = setup();
        assert_eq!(tree.enclosing_class(block), Some("p.Sub"));
        assert_eq!(tree.enclosing_member(block), Some(ScopeKind::Method));
        assert_eq!(tree.enclosing_member(class), None);
        assert_eq!(tree.chain(block), vec![block, method, class]);
        assert_eq!(tree.get_scope(block).map(|s| s.depth), Some(2));

        let stat = tree.create_scope(ScopeKind::Method, class, true);
        let inner = tree.create_scope(ScopeKind::Block, stat, false);
        assert!(tree.is_static_context(inner));
        assert!(!tree.is_static_context(block));
    }

    #[test]
    fn test_names_are_prefixed() {
        let (tree, _, method, _) = setup();
        let names: Vec<&str> = tree.get_scope(method).unwrap().names().collect();
        assert_eq!(names, vec!["$arg"]);
    }
}
