//! Type model: primitive, class, and array types.
//!
//! Types are immutable values. Array types always wrap a non-array element
//! with a dimension count of at least one.

use std::fmt;

/// Package whose classes are visible everywhere without an import.
pub const RUNTIME_PACKAGE: &str = "java.lang";

/// Simple name of the universal base class.
pub const ROOT_CLASS: &str = "Object";

/// Fully-qualified name of the universal base class.
pub const ROOT_CLASS_QUALIFIED: &str = "java.lang.Object";

/// Marker appended to an element tag to form an array's canonical tag.
pub const ARRAY_TAG: &str = "Array";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Char,
    Void,
}

impl PrimitiveKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "byte" => PrimitiveKind::Byte,
            "short" => PrimitiveKind::Short,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            "boolean" => PrimitiveKind::Boolean,
            "char" => PrimitiveKind::Char,
            "void" => PrimitiveKind::Void,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Void => "void",
        }
    }

    /// Fixed-width target representation.
    pub fn target_name(self) -> &'static str {
        match self {
            PrimitiveKind::Byte => "int8_t",
            PrimitiveKind::Short => "int16_t",
            PrimitiveKind::Int => "int32_t",
            PrimitiveKind::Long => "int64_t",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Boolean => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Void => "void",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean | PrimitiveKind::Void)
    }

    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }
}

/// A class reference: simple name plus owning package (empty for the
/// default package).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassType {
    pub name: String,
    pub package: String,
}

impl ClassType {
    pub fn new(name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
        }
    }

    /// Split `a.b.C` into package `a.b` and name `C`.
    pub fn from_qualified(qualified: &str) -> Self {
        match qualified.rsplit_once('.') {
            Some((package, name)) => Self::new(name, package),
            None => Self::new(qualified, ""),
        }
    }

    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    pub fn is_runtime(&self) -> bool {
        self.package == RUNTIME_PACKAGE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(PrimitiveKind),
    Class(ClassType),
    Array { element: Box<Type>, dimensions: u32 },
}

/// Recoverable type construction failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    NegativeDimensions(i64),
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::NegativeDimensions(dims) => {
                write!(f, "invalid array dimensions: {}", dims)
            }
        }
    }
}

impl std::error::Error for TypeError {}

impl Type {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Type::Primitive(kind)
    }

    pub fn void() -> Self {
        Type::Primitive(PrimitiveKind::Void)
    }

    pub fn int() -> Self {
        Type::Primitive(PrimitiveKind::Int)
    }

    pub fn long() -> Self {
        Type::Primitive(PrimitiveKind::Long)
    }

    pub fn float() -> Self {
        Type::Primitive(PrimitiveKind::Float)
    }

    pub fn double() -> Self {
        Type::Primitive(PrimitiveKind::Double)
    }

    pub fn boolean() -> Self {
        Type::Primitive(PrimitiveKind::Boolean)
    }

    pub fn char() -> Self {
        Type::Primitive(PrimitiveKind::Char)
    }

    pub fn class(name: impl Into<String>, package: impl Into<String>) -> Self {
        Type::Class(ClassType::new(name, package))
    }

    /// A class of the implicit runtime package.
    pub fn runtime(name: &str) -> Self {
        Type::class(name, RUNTIME_PACKAGE)
    }

    pub fn object() -> Self {
        Type::runtime(ROOT_CLASS)
    }

    pub fn string() -> Self {
        Type::runtime("String")
    }

    pub fn class_token() -> Self {
        Type::runtime("Class")
    }

    /// `element` with `dimensions` array levels; zero dimensions is `element`.
    pub fn array(element: Type, dimensions: u32) -> Self {
        if dimensions == 0 {
            return element;
        }
        match element {
            Type::Array {
                element,
                dimensions: inner,
            } => Type::Array {
                element,
                dimensions: inner + dimensions,
            },
            element => Type::Array {
                element: Box::new(element),
                dimensions,
            },
        }
    }

    /// Add a syntactic dimension count. A negative count is rejected and the
    /// caller keeps the type it had.
    pub fn with_dimensions(self, dimensions: i64) -> Result<Type, TypeError> {
        match u32::try_from(dimensions) {
            Ok(dims) => Ok(Type::array(self, dims)),
            Err(_) => Err(TypeError::NegativeDimensions(dimensions)),
        }
    }

    /// Add `delta` (possibly negative) to the dimension count. A result below
    /// zero is rejected.
    pub fn adjust_dimensions(&self, delta: i64) -> Result<Type, TypeError> {
        let total = i64::from(self.dimensions()) + delta;
        if total < 0 {
            return Err(TypeError::NegativeDimensions(total));
        }
        Ok(Type::array(self.base().clone(), total as u32))
    }

    pub fn dimensions(&self) -> u32 {
        match self {
            Type::Array { dimensions, .. } => *dimensions,
            _ => 0,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    /// Non-array primitive, including `void`.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Primitive(PrimitiveKind::Void))
    }

    /// Non-array class type.
    pub fn is_class(&self) -> bool {
        matches!(self, Type::Class(_))
    }

    /// Values of this type are pointers in the target language.
    pub fn is_reference(&self) -> bool {
        self.is_class() || self.is_array()
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Primitive(kind) if kind.is_numeric())
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Type::Class(class) if class.name == "String" && class.is_runtime())
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn class_type(&self) -> Option<&ClassType> {
        match self {
            Type::Class(class) => Some(class),
            _ => None,
        }
    }

    /// The non-array type at the bottom of an array.
    pub fn base(&self) -> &Type {
        match self {
            Type::Array { element, .. } => element,
            other => other,
        }
    }

    /// One dimension removed; `None` for non-arrays.
    pub fn element_type(&self) -> Option<Type> {
        match self {
            Type::Array {
                element,
                dimensions,
            } => Some(Type::array((**element).clone(), dimensions - 1)),
            _ => None,
        }
    }

    /// One dimension added.
    pub fn array_of(&self) -> Type {
        Type::array(self.clone(), 1)
    }

    /// The string used to build mangled names.
    pub fn canonical_tag(&self) -> String {
        match self {
            Type::Primitive(kind) => kind.target_name().to_string(),
            Type::Class(class) => class.name.clone(),
            Type::Array { element, .. } => format!("{}{}", element.canonical_tag(), ARRAY_TAG),
        }
    }

    /// Whether this non-array type is named `name`, by source keyword, target
    /// name, simple class name, or qualified class name.
    pub fn is_named(&self, name: &str) -> bool {
        match self {
            Type::Primitive(kind) => kind.keyword() == name || kind.target_name() == name,
            Type::Class(class) => class.name == name || class.qualified_name() == name,
            Type::Array { .. } => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Primitive(kind) => write!(f, "{}", kind.keyword()),
            Type::Class(class) => write!(f, "{}", class.qualified_name()),
            Type::Array {
                element,
                dimensions,
            } => {
                write!(f, "{}", element)?;
                for _ in 0..*dimensions {
                    write!(f, "[]")?;
                }
                Ok(())
            }
        }
    }
}

/// Result of `+`: string if either side is a string, otherwise the numeric
/// promotion of both sides.
pub fn additive_result(left: &Type, right: &Type) -> Type {
    if left.is_string() || right.is_string() {
        Type::string()
    } else {
        numeric_promotion(left, right)
    }
}

/// double > float > long > int.
pub fn numeric_promotion(left: &Type, right: &Type) -> Type {
    let has = |kind: PrimitiveKind| {
        left.primitive_kind() == Some(kind) || right.primitive_kind() == Some(kind)
    };
    if has(PrimitiveKind::Double) {
        Type::double()
    } else if has(PrimitiveKind::Float) {
        Type::float()
    } else if has(PrimitiveKind::Long) {
        Type::long()
    } else {
        Type::int()
    }
}

/// Bitwise results are `long` if either operand is `long`, else `int`.
/// Boolean operands keep the logical meaning.
pub fn bitwise_result(left: &Type, right: &Type) -> Type {
    let is = |ty: &Type, kind| ty.primitive_kind() == Some(kind);
    if is(left, PrimitiveKind::Boolean) && is(right, PrimitiveKind::Boolean) {
        Type::boolean()
    } else if is(left, PrimitiveKind::Long) || is(right, PrimitiveKind::Long) {
        Type::long()
    } else {
        Type::int()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_table() {
        let expected = [
            ("byte", "int8_t"),
            ("short", "int16_t"),
            ("int", "int32_t"),
            ("long", "int64_t"),
            ("float", "float"),
            ("double", "double"),
            ("boolean", "bool"),
            ("char", "char"),
            ("void", "void"),
        ];
        for (keyword, target) in expected {
            let kind = PrimitiveKind::from_keyword(keyword).unwrap();
            assert_eq!(kind.target_name(), target);
            assert_eq!(kind.keyword(), keyword);
        }
        assert!(PrimitiveKind::from_keyword("String").is_none());
    }

    #[test]
    fn test_array_dimensions() {
        let int_array = Type::int().with_dimensions(1).unwrap();
        assert!(int_array.is_array());
        assert_eq!(int_array.dimensions(), 1);
        assert_eq!(int_array.element_type(), Some(Type::int()));

        let nested = int_array.with_dimensions(2).unwrap();
        assert_eq!(nested.dimensions(), 3);
        assert_eq!(nested.base(), &Type::int());

        assert_eq!(Type::int().with_dimensions(0).unwrap(), Type::int());
        assert_eq!(nested.adjust_dimensions(-3).unwrap(), Type::int());
        assert_eq!(
            Type::int().adjust_dimensions(-1),
            Err(TypeError::NegativeDimensions(-1))
        );
        assert_eq!(
            Type::int().with_dimensions(-1),
            Err(TypeError::NegativeDimensions(-1))
        );
    }

    #[test]
    fn test_dimensions_iff_array() {
        for ty in [
            Type::int(),
            Type::string(),
            Type::void(),
            Type::array(Type::object(), 2),
        ] {
            assert_eq!(ty.dimensions() > 0, ty.is_array());
        }
    }

    #[test]
    fn test_canonical_tags() {
        assert_eq!(Type::int().canonical_tag(), "int32_t");
        assert_eq!(Type::boolean().canonical_tag(), "bool");
        assert_eq!(Type::class("Sub", "pkg").canonical_tag(), "Sub");
        assert_eq!(Type::array(Type::int(), 1).canonical_tag(), "int32_tArray");
        assert_eq!(Type::array(Type::int(), 3).canonical_tag(), "int32_tArray");
        assert_eq!(Type::array(Type::string(), 1).canonical_tag(), "StringArray");
    }

    #[test]
    fn test_is_named() {
        assert!(Type::int().is_named("int"));
        assert!(Type::int().is_named("int32_t"));
        assert!(Type::string().is_named("String"));
        assert!(Type::string().is_named("java.lang.String"));
        assert!(!Type::array(Type::string(), 1).is_named("String"));
        assert!(!Type::class("String", "my.pkg").is_string());
    }

    #[test]
    fn test_widening_table() {
        let numeric = [Type::int(), Type::long(), Type::float(), Type::double()];
        let rank = |ty: &Type| numeric.iter().position(|t| t == ty).unwrap();
        for left in &numeric {
            for right in &numeric {
                let expected = &numeric[rank(left).max(rank(right))];
                assert_eq!(&additive_result(left, right), expected);
                assert_eq!(&numeric_promotion(left, right), expected);
            }
            assert_eq!(additive_result(left, &Type::string()), Type::string());
            assert_eq!(additive_result(&Type::string(), left), Type::string());
        }
        assert_eq!(numeric_promotion(&Type::char(), &Type::char()), Type::int());
    }

    #[test]
    fn test_bitwise_result() {
        assert_eq!(bitwise_result(&Type::int(), &Type::long()), Type::long());
        assert_eq!(bitwise_result(&Type::int(), &Type::char()), Type::int());
        assert_eq!(bitwise_result(&Type::boolean(), &Type::boolean()), Type::boolean());
    }

    #[test]
    fn test_display() {
        assert_eq!(Type::array(Type::int(), 2).to_string(), "int[][]");
        assert_eq!(Type::class("A", "").to_string(), "A");
        assert_eq!(ClassType::from_qualified("a.b.C").package, "a.b");
    }
}
