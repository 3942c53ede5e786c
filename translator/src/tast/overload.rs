//! Overload resolution by widening class-typed arguments.
//!
//! Level 0 tries the exact argument tags. Each further level climbs every
//! class-typed argument `level - 1` steps, and within the level the `i`-th
//! candidate climbs argument `i` one step more. Primitive and array
//! arguments keep their tag at every level. The first candidate found in
//! the target class (or its ancestors) wins.

use super::builtins::SHORTCUT_METHODS;
use super::symbols::{constructor_base, mangle, CompilationContext, MethodSignature, MANGLE_SEPARATOR};
use super::types::{ClassType, Type};
use log::trace;

/// Outcome of one overload search.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Mangled name to emit. For an unresolved call, the exact-argument name.
    pub mangled: String,
    /// Declared signature, when a declaration was found
    pub method: Option<MethodSignature>,
    /// Class that declares the method
    pub owner: Option<String>,
    /// Widening level the search stopped at
    pub level: usize,
    /// Every distinct mangled name tried, in order
    pub candidates: Vec<String>,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.method.is_some()
    }

    pub fn is_static(&self) -> bool {
        self.method.as_ref().is_some_and(|m| m.is_static)
    }

    /// Unresolved and shortcut calls dispatch virtually.
    pub fn is_virtual(&self) -> bool {
        self.method.as_ref().map_or(true, |m| m.is_virtual())
    }

    pub fn base_name(&self) -> &str {
        self.mangled
            .split(MANGLE_SEPARATOR)
            .next()
            .unwrap_or(&self.mangled)
    }

    pub fn return_type(&self) -> Option<&Type> {
        self.method.as_ref().map(|m| &m.return_type)
    }
}

pub struct OverloadResolver<'a> {
    ctx: &'a CompilationContext,
}

impl<'a> OverloadResolver<'a> {
    pub fn new(ctx: &'a CompilationContext) -> Self {
        Self { ctx }
    }

    /// Resolve a method call. With no target class (a primitive receiver)
    /// nothing can be found and the exact-argument name is returned.
    pub fn resolve_method(&self, class: Option<&str>, base: &str, args: &[Type]) -> Resolution {
        let lookup = |mangled: &str| {
            let class = class?;
            self.ctx
                .find_method(class, mangled)
                .map(|m| (m.signature.clone(), m.owner.clone()))
        };
        self.search(base, args, lookup, true)
    }

    /// Resolve a constructor of `class`. Constructors are not inherited.
    pub fn resolve_constructor(&self, class: &str, args: &[Type]) -> Resolution {
        let simple = ClassType::from_qualified(class).name;
        let lookup = |mangled: &str| {
            self.ctx
                .find_constructor(class, mangled)
                .map(|c| (c.signature.clone(), c.owner.clone()))
        };
        self.search(&constructor_base(&simple), args, lookup, false)
    }

    fn search<F>(&self, base: &str, args: &[Type], lookup: F, shortcuts: bool) -> Resolution
    where
        F: Fn(&str) -> Option<(MethodSignature, String)>,
    {
        let exact = mangle(base, args);
        let classes: Vec<Option<String>> = args
            .iter()
            .map(|arg| arg.class_type().map(ClassType::qualified_name))
            .collect();
        let max_level = classes
            .iter()
            .flatten()
            .map(|class| self.ctx.hierarchy.depth(class))
            .max()
            .unwrap_or(0);

        let mut candidates: Vec<String> = Vec::new();
        for level in 0..=max_level {
            // At level 0 every candidate is the exact name.
            let rounds = if level == 0 { 1 } else { args.len().max(1) };
            for i in 0..rounds {
                let name = self.candidate(base, args, &classes, level, i);
                if candidates.contains(&name) {
                    continue;
                }
                trace!("overload: trying {} at level {}", name, level);
                candidates.push(name.clone());

                if shortcuts && SHORTCUT_METHODS.contains(&name.as_str()) {
                    return Resolution {
                        mangled: name,
                        method: None,
                        owner: None,
                        level,
                        candidates,
                    };
                }
                if let Some((method, owner)) = lookup(&name) {
                    return Resolution {
                        mangled: name,
                        method: Some(method),
                        owner: Some(owner),
                        level,
                        candidates,
                    };
                }
            }
        }

        Resolution {
            mangled: exact,
            method: None,
            owner: None,
            level: max_level,
            candidates,
        }
    }

    fn candidate(
        &self,
        base: &str,
        args: &[Type],
        classes: &[Option<String>],
        level: usize,
        widened: usize,
    ) -> String {
        let hierarchy = &self.ctx.hierarchy;
        let tags: Vec<Type> = args
            .iter()
            .zip(classes)
            .enumerate()
            .map(|(j, (arg, class))| match class {
                None => arg.clone(),
                Some(class) => {
                    let mut current = hierarchy.climb(class, level.saturating_sub(1));
                    if level > 0 && j == widened {
                        current = hierarchy.climb(current, 1);
                    }
                    Type::Class(ClassType::from_qualified(current))
                }
            })
            .collect();
        mangle(base, &tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tast::symbols::{ClassDecl, ConstructorDecl, MethodDecl, Modifiers, Visibility};
    use tree::Node;

    fn public() -> Modifiers {
        Modifiers {
            visibility: Visibility::Public,
            ..Modifiers::default()
        }
    }

    fn add(ctx: &mut CompilationContext, name: &str, parent: Option<&str>) {
        ctx.add_class(ClassDecl::new(name, "", if parent.is_some() { Some(0) } else { None }));
        ctx.hierarchy.register_edge(name, parent);
    }

    fn add_method(ctx: &mut CompilationContext, class: &str, base: &str, params: Vec<Type>, ret: Type) {
        let signature = MethodSignature::new(base, params, ret, public());
        let decl = MethodDecl {
            param_names: signature.params.iter().enumerate().map(|(i, _)| format!("p{}", i)).collect(),
            signature,
            owner: class.to_string(),
            body: None,
        };
        if let Some(c) = ctx.classes.get_mut(class) {
            c.methods.insert(decl.mangled_name(), decl);
        }
    }

    /// Root <- A <- B <- C
    fn chain() -> CompilationContext {
        let mut ctx = CompilationContext::new();
        add(&mut ctx, "Root", None);
        add(&mut ctx, "A", Some("Root"));
        add(&mut ctx, "B", Some("A"));
        add(&mut ctx, "C", Some("B"));
        add(&mut ctx, "Host", Some("Root"));
        ctx
    }

    fn class(name: &str) -> Type {
        Type::class(name, "")
    }

    #[test]
    fn test_exact_match_at_level_zero() {
        let mut ctx = chain();
        add_method(&mut ctx, "Host", "m", vec![class("C"), Type::int()], Type::void());
        let r = OverloadResolver::new(&ctx).resolve_method(Some("Host"), "m", &[class("C"), Type::int()]);
        assert_eq!(r.mangled, "m$C$int32_t");
        assert_eq!(r.level, 0);
        assert_eq!(r.owner.as_deref(), Some("Host"));
    }

    #[test]
    fn test_widening_order() {
        let mut ctx = chain();
        add_method(&mut ctx, "Host", "m", vec![class("B"), class("A")], Type::int());
        let r = OverloadResolver::new(&ctx).resolve_method(Some("Host"), "m", &[class("C"), class("C")]);
        assert_eq!(r.mangled, "m$B$A");
        assert_eq!(r.candidates, vec!["m$C$C", "m$B$C", "m$C$B", "m$A$B", "m$B$A"]);
        assert_eq!(r.level, 2);
        assert_eq!(r.return_type(), Some(&Type::int()));
    }

    #[test]
    fn test_both_arguments_never_widen_to_the_same_level() {
        let mut ctx = chain();
        add_method(&mut ctx, "Host", "m", vec![class("A"), class("A")], Type::int());
        let r = OverloadResolver::new(&ctx).resolve_method(Some("Host"), "m", &[class("C"), class("C")]);
        assert!(!r.is_resolved());
        assert_eq!(r.mangled, "m$C$C");
        assert!(!r.candidates.contains(&"m$A$A".to_string()));
        assert_eq!(r.level, 3);
    }

    #[test]
    fn test_climbing_saturates_at_root() {
        let ctx = chain();
        let r = OverloadResolver::new(&ctx).resolve_method(Some("Host"), "m", &[class("A")]);
        assert_eq!(r.candidates, vec!["m$A", "m$Root"]);
    }

    #[test]
    fn test_shallow_argument_stays_at_root_while_deeper_one_widens() {
        let mut ctx = chain();
        add_method(&mut ctx, "Host", "m", vec![class("B"), class("Root")], Type::void());
        let r = OverloadResolver::new(&ctx).resolve_method(Some("Host"), "m", &[class("C"), class("A")]);
        assert_eq!(r.mangled, "m$B$Root");
        assert_eq!(r.level, 2);
        assert_eq!(r.candidates, vec!["m$C$A", "m$B$A", "m$C$Root", "m$A$Root", "m$B$Root"]);
    }

    #[test]
    fn test_primitive_arguments_keep_their_tag() {
        let mut ctx = chain();
        add_method(&mut ctx, "Host", "m", vec![Type::int(), class("A")], Type::void());
        let r = OverloadResolver::new(&ctx).resolve_method(Some("Host"), "m", &[Type::int(), class("B")]);
        assert_eq!(r.mangled, "m$int32_t$A");
        assert!(r.candidates.iter().all(|c| c.starts_with("m$int32_t$")));
    }

    #[test]
    fn test_inherited_method_is_found() {
        let mut ctx = chain();
        add_method(&mut ctx, "A", "run", vec![], Type::void());
        let r = OverloadResolver::new(&ctx).resolve_method(Some("C"), "run", &[]);
        assert_eq!(r.mangled, "run$void");
        assert_eq!(r.owner.as_deref(), Some("A"));
    }

    #[test]
    fn test_shortcut_resolves_without_declaration() {
        let ctx = chain();
        let r = OverloadResolver::new(&ctx).resolve_method(Some("A"), "equals", &[class("Root")]);
        assert_eq!(r.mangled, "equals$Object");
        assert!(!r.is_resolved());
        assert!(r.is_virtual());
    }

    #[test]
    fn test_unresolved_uses_exact_name() {
        let ctx = chain();
        let r = OverloadResolver::new(&ctx).resolve_method(Some("Host"), "missing", &[class("B")]);
        assert_eq!(r.mangled, "missing$B");
        assert!(!r.is_resolved());
        assert_eq!(r.level, 2);
        assert_eq!(r.base_name(), "missing");
    }

    #[test]
    fn test_no_target_class() {
        let ctx = chain();
        let r = OverloadResolver::new(&ctx).resolve_method(None, "f", &[Type::int()]);
        assert_eq!(r.mangled, "f$int32_t");
        assert_eq!(r.candidates, vec!["f$int32_t"]);
    }

    #[test]
    fn test_constructors_are_not_inherited() {
        let mut ctx = chain();
        let signature = MethodSignature::new(constructor_base("A"), [], Type::void(), public());
        let ctor = ConstructorDecl {
            signature,
            param_names: Vec::new(),
            owner: "A".to_string(),
            body: Node::new("Block", Vec::new()),
            synthesized: true,
        };
        if let Some(a) = ctx.classes.get_mut("A") {
            a.constructors.insert(ctor.mangled_name(), ctor);
        }
        let resolver = OverloadResolver::new(&ctx);
        assert!(resolver.resolve_constructor("A", &[]).is_resolved());
        let r = resolver.resolve_constructor("B", &[]);
        assert!(!r.is_resolved());
        assert_eq!(r.mangled, "$__B$void");
    }
}
