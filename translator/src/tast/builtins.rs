//! Library members the translator knows without a declaration.
//!
//! The runtime classes carry no member declarations. Calls that resolve to
//! none of the declared methods fall back to these tables.

use super::symbols::{MethodSignature, Modifiers, Visibility};
use super::types::Type;

/// Mangled names that resolve immediately during overload search.
pub const SHORTCUT_METHODS: [&str; 2] = ["equals$Object", "charAt$int32_t"];

/// Virtual methods every class inherits from the root class, in slot order.
pub fn root_methods() -> Vec<MethodSignature> {
    let public = Modifiers {
        visibility: Visibility::Public,
        ..Modifiers::default()
    };
    vec![
        MethodSignature::new("hashCode", [], Type::int(), public),
        MethodSignature::new("equals", [Type::object()], Type::boolean(), public),
        MethodSignature::new("getClass", [], Type::class_token(), public),
        MethodSignature::new("toString", [], Type::string(), public),
    ]
}

/// Return type of an unresolved call, chosen by method name.
pub fn fallback_return_type(base_name: &str, mangled: &str) -> Type {
    match base_name {
        "hashCode" | "length" => return Type::int(),
        "equals" | "isPrimitive" | "isArray" => return Type::boolean(),
        "getClass" | "getComponentType" | "getSuperclass" => return Type::class_token(),
        "toString" | "getName" => return Type::string(),
        _ => {}
    }
    match mangled {
        "charAt$int32_t" => Type::char(),
        _ => Type::void(),
    }
}

/// Static fields of runtime classes.
pub fn static_field(class: &str, field: &str) -> Option<Type> {
    match (class, field) {
        ("System", "out") | ("System", "err") => Some(Type::runtime("PrintStream")),
        ("Math", "PI") | ("Math", "E") => Some(Type::double()),
        _ => None,
    }
}
