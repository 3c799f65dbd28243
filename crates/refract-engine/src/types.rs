//! Type references used in signatures, field types and return types

use std::fmt;

/// Qualified name of the built-in string type
pub const STRING_TYPE: &str = "lang.String";

/// A reference to a type as it appears in a declaration.
///
/// Identity is exact: `Int` and `Long` are different types, and a named type
/// only equals a named type with the same qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No value (method return only)
    Void,
    /// `boolean`
    Boolean,
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// 64-bit float
    Double,
    /// The built-in string type
    String,
    /// A registered class or interface, by qualified name
    Named(String),
}

impl TypeRef {
    /// Create a named type reference
    pub fn named(qualified_name: impl Into<String>) -> Self {
        TypeRef::Named(qualified_name.into())
    }

    /// Parse a type name as written in a manifest.
    ///
    /// Primitive keywords and `String` map to their variants, anything else
    /// is a qualified type name.
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "void" => TypeRef::Void,
            "boolean" | "bool" => TypeRef::Boolean,
            "int" => TypeRef::Int,
            "long" => TypeRef::Long,
            "double" => TypeRef::Double,
            "String" | STRING_TYPE => TypeRef::String,
            other => TypeRef::Named(other.to_string()),
        }
    }

    /// Whether `null` is an acceptable value of this type
    pub fn is_reference(&self) -> bool {
        matches!(self, TypeRef::String | TypeRef::Named(_))
    }

    /// Whether this is one of the primitive value types
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            TypeRef::Boolean | TypeRef::Int | TypeRef::Long | TypeRef::Double
        )
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Boolean => write!(f, "boolean"),
            TypeRef::Int => write!(f, "int"),
            TypeRef::Long => write!(f, "long"),
            TypeRef::Double => write!(f, "double"),
            TypeRef::String => write!(f, "String"),
            TypeRef::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Render a parameter list as `(T1, T2)`
pub fn format_signature(params: &[TypeRef]) -> String {
    let parts: Vec<String> = params.iter().map(|p| p.to_string()).collect();
    format!("({})", parts.join(", "))
}

/// Split a qualified name into `(package, simple_name)`.
///
/// Names without a dot live in the unnamed package `""`.
pub fn split_qualified_name(qualified_name: &str) -> (&str, &str) {
    match qualified_name.rfind('.') {
        Some(idx) => (&qualified_name[..idx], &qualified_name[idx + 1..]),
        None => ("", qualified_name),
    }
}
