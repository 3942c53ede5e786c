//! Turning syntactic type descriptions into [`Type`] values.

use super::symbols::{ClassLookup, CompilationContext, FileEnv};
use super::types::{PrimitiveKind, Type};
use crate::error::Reporter;
use crate::error_codes::{AMBIGUOUS_TYPE, NEGATIVE_DIMENSIONS, UNRESOLVED_TYPE, UNSUPPORTED_NODE};
use tree::Node;

/// Resolves type syntax against the classes visible from one file.
pub struct TypeSyntax<'a> {
    ctx: &'a CompilationContext,
    file: &'a FileEnv,
    reporter: &'a Reporter,
}

impl<'a> TypeSyntax<'a> {
    pub fn new(ctx: &'a CompilationContext, file: &'a FileEnv, reporter: &'a Reporter) -> Self {
        Self {
            ctx,
            file,
            reporter,
        }
    }

    /// Resolve a `Type`, `PrimitiveType`, `QualifiedIdentifier` or
    /// `VoidType` node.
    pub fn resolve(&self, node: &Node) -> Type {
        match node.kind() {
            "Type" => {
                let base = node
                    .node(0)
                    .map(|base| self.resolve(base))
                    .unwrap_or_else(Type::void);
                self.with_dimensions(base, dimension_count(node.node(1)))
            }
            "PrimitiveType" => node
                .token(0)
                .and_then(PrimitiveKind::from_keyword)
                .map(Type::primitive)
                .unwrap_or_else(Type::void),
            "VoidType" => Type::void(),
            "QualifiedIdentifier" => {
                let name: Vec<&str> = node.tokens().collect();
                self.class_named(&name.join("."))
            }
            other => {
                self.reporter
                    .report(UNSUPPORTED_NODE, format!("unexpected type node {}", other));
                Type::void()
            }
        }
    }

    /// A class type by simple or qualified name. Unknown names degrade to
    /// `void`.
    pub fn class_named(&self, name: &str) -> Type {
        match self.ctx.lookup_class(name, self.file) {
            ClassLookup::Found(qualified) => self.class_type(&qualified),
            ClassLookup::Ambiguous(candidates) => {
                self.reporter.report(
                    AMBIGUOUS_TYPE,
                    format!("{} may be any of {}", name, candidates.join(", ")),
                );
                self.class_type(&candidates[0])
            }
            ClassLookup::Missing => {
                self.reporter
                    .report(UNRESOLVED_TYPE, format!("type not found: {}", name));
                Type::void()
            }
        }
    }

    fn class_type(&self, qualified: &str) -> Type {
        self.ctx
            .class(qualified)
            .map(|class| class.as_type())
            .unwrap_or_else(Type::void)
    }

    /// Add `dims` array levels, reporting a negative count and keeping `ty`.
    pub fn with_dimensions(&self, ty: Type, dims: i64) -> Type {
        match ty.clone().with_dimensions(dims) {
            Ok(ty) => ty,
            Err(err) => {
                self.reporter.report(NEGATIVE_DIMENSIONS, err.to_string());
                ty
            }
        }
    }
}

/// Number of `[]` pairs in an optional `Dimensions` node.
pub fn dimension_count(node: Option<&Node>) -> i64 {
    node.map(|dims| dims.size() as i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tast::symbols::ClassDecl;
    use tree::build;

    fn context() -> CompilationContext {
        let mut ctx = CompilationContext::new();
        ctx.add_class(ClassDecl::new("Object", "java.lang", None));
        ctx.add_class(ClassDecl::new("String", "java.lang", None));
        ctx.add_class(ClassDecl::new("Shape", "geo", Some(0)));
        ctx
    }

    #[test]
    fn test_resolve_syntax() {
        let ctx = context();
        let file = FileEnv {
            package: "geo".into(),
            ..FileEnv::default()
        };
        let reporter = Reporter::new();
        let types = TypeSyntax::new(&ctx, &file, &reporter);

        assert_eq!(types.resolve(&build::ty("int", 0)), Type::int());
        assert_eq!(
            types.resolve(&build::ty("int", 2)),
            Type::array(Type::int(), 2)
        );
        assert_eq!(types.resolve(&build::ty("Shape", 0)), Type::class("Shape", "geo"));
        assert_eq!(types.resolve(&build::ty("String", 1)), Type::array(Type::string(), 1));
        assert_eq!(types.resolve(&build::void_type()), Type::void());
        assert!(!reporter.has_errors());
    }

    #[test]
    fn test_unresolved_degrades_to_void() {
        let ctx = context();
        let file = FileEnv::default();
        let reporter = Reporter::new();
        let types = TypeSyntax::new(&ctx, &file, &reporter);

        assert_eq!(types.resolve(&build::ty("Missing", 0)), Type::void());
        assert_eq!(reporter.count(UNRESOLVED_TYPE), 1);
    }

    #[test]
    fn test_negative_dimensions_reported() {
        let ctx = context();
        let file = FileEnv::default();
        let reporter = Reporter::new();
        let types = TypeSyntax::new(&ctx, &file, &reporter);

        assert_eq!(types.with_dimensions(Type::int(), -2), Type::int());
        assert_eq!(reporter.count(NEGATIVE_DIMENSIONS), 1);
    }
}
