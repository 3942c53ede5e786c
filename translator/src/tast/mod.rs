pub mod types;
pub mod hierarchy;
pub mod symbols;
pub mod builtins;
pub mod scopes;
pub mod type_syntax;
pub mod discovery;
pub mod node;
pub mod lowering;
pub mod overload;
pub mod type_resolution;
pub mod null_check;

pub use types::{ClassType, PrimitiveKind, Type, TypeError};
pub use hierarchy::HierarchyRegistry;
pub use symbols::{
    mangle, ClassDecl, ClassLookup, CompilationContext, ConstructorDecl, FieldDecl, FileEnv,
    MethodDecl, MethodSignature, Modifiers, Visibility,
};
pub use scopes::{Binding, BindingKind, Scope, ScopeError, ScopeId, ScopeKind, ScopeTree};
pub use discovery::Discovery;
pub use node::{Block, Expr, ExprKind, Stmt};
pub use lowering::{ClassUnit, Lowering};
pub use overload::{OverloadResolver, Resolution};
pub use type_resolution::Resolver;
pub use null_check::NullCheckPass;
