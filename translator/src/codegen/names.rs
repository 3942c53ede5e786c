//! Target spelling of types and names.
//!
//! A class `p.q.Foo` is the data struct `p::q::__Foo`, its pointer typedef
//! `p::q::Foo` and its vtable struct `p::q::__Foo_VT`. Classes of the runtime
//! package and of the default package are not qualified. Variables and
//! fields carry a `$` prefix.

use crate::config::TranslatorConfig;
use crate::tast::scopes::scoped_name;
use crate::tast::types::{ClassType, PrimitiveKind, Type};

pub struct Naming<'c> {
    config: &'c TranslatorConfig,
}

impl<'c> Naming<'c> {
    pub fn new(config: &'c TranslatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'c TranslatorConfig {
        self.config
    }

    /// A runtime support name, e.g. `__rt::literal`.
    pub fn rt(&self, name: &str) -> String {
        self.config.rt(name)
    }

    fn qualifier(class: &ClassType) -> String {
        if class.is_runtime() || class.package.is_empty() {
            String::new()
        } else {
            format!("{}::", namespace(&class.package))
        }
    }

    /// The pointer typedef, `ns::Foo`.
    pub fn class_ref(&self, class: &ClassType) -> String {
        format!("{}{}", Self::qualifier(class), class.name)
    }

    /// The data struct, `ns::__Foo`.
    pub fn struct_ref(&self, class: &ClassType) -> String {
        format!("{}__{}", Self::qualifier(class), class.name)
    }

    pub fn struct_of(&self, qualified: &str) -> String {
        self.struct_ref(&ClassType::from_qualified(qualified))
    }

    pub fn class_of(&self, qualified: &str) -> String {
        self.class_ref(&ClassType::from_qualified(qualified))
    }

    /// Target type. Arrays nest one `__rt::Array` per dimension.
    pub fn ty(&self, ty: &Type) -> String {
        match ty {
            Type::Primitive(kind) => kind.target_name().to_string(),
            Type::Class(class) => self.class_ref(class),
            Type::Array { .. } => match ty.element_type() {
                Some(element) => format!("{}<{}>*", self.rt("Array"), self.ty(&element)),
                None => self.rt("Array"),
            },
        }
    }

    /// Expression yielding the `Class` token of `ty`.
    pub fn class_token(&self, ty: &Type) -> String {
        match ty {
            Type::Class(class) => format!("{}::__class()", self.struct_ref(class)),
            Type::Array { .. } => match ty.element_type() {
                Some(element) => format!("{}<{}>::__class()", self.rt("Array"), self.ty(&element)),
                None => self.rt("Array"),
            },
            Type::Primitive(kind) => format!("{}(\"{}\")", self.rt("primitiveClass"), kind.keyword()),
        }
    }

    /// The value a field holds before any initializer runs.
    pub fn zero_value(&self, ty: &Type) -> String {
        match ty.primitive_kind() {
            Some(PrimitiveKind::Boolean) => "false".to_string(),
            Some(_) => "0".to_string(),
            None => format!("{}()", self.rt("null")),
        }
    }

    pub fn variable(&self, name: &str) -> String {
        scoped_name(name)
    }
}

/// `a.b.c` as `a::b::c`.
pub fn namespace(package: &str) -> String {
    package.replace('.', "::")
}

/// `__Foo_VT` for simple name `Foo`.
pub fn vtable_struct(simple: &str) -> String {
    format!("__{}_VT", simple)
}
