//! Type declarations: the input the type registry builds descriptors from
//!
//! A declaration is the abstract equivalent of a class body. It names the
//! type's supertype and directly implemented interfaces and lists only the
//! members declared on the type itself.

use serde::{Deserialize, Serialize};

use crate::error::TargetError;
use crate::invoke::Invocation;
use crate::modifiers::Modifiers;
use crate::natives::Body;
use crate::types::TypeRef;
use crate::value::Value;

/// Class or interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// Instantiable unless abstract; has exactly one supertype
    #[default]
    Class,
    /// Capability tag with abstract method signatures only
    Interface,
}

/// Declaration of a single type
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    /// Qualified name (`package.SimpleName`)
    pub name: String,
    /// Class or interface
    pub kind: TypeKind,
    /// Qualified name of the supertype; `None` means the root type for classes
    pub supertype: Option<String>,
    /// Type modifiers
    pub modifiers: Modifiers,
    /// Interfaces named in this type's own implementation clause
    pub interfaces: Vec<String>,
    /// Own fields
    pub fields: Vec<FieldDecl>,
    /// Own constructors
    pub constructors: Vec<ConstructorDecl>,
    /// Own methods
    pub methods: Vec<MethodDecl>,
}

impl TypeDeclaration {
    fn new(name: impl Into<String>, kind: TypeKind, modifiers: Modifiers) -> Self {
        Self {
            name: name.into(),
            kind,
            supertype: None,
            modifiers,
            interfaces: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Start a class declaration (package-private until `modifiers` is called)
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class, Modifiers::empty())
    }

    /// Start an interface declaration
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(
            name,
            TypeKind::Interface,
            Modifiers::PUBLIC | Modifiers::ABSTRACT,
        )
    }

    /// Set the supertype
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertype = Some(supertype.into());
        self
    }

    /// Set the type modifiers
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Add an interface to the implementation clause
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Add a field
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a constructor
    pub fn constructor(mut self, ctor: ConstructorDecl) -> Self {
        self.constructors.push(ctor);
        self
    }

    /// Add a method
    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }
}

/// Declaration of a field
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Field modifiers
    pub modifiers: Modifiers,
    /// Initial value; the type's zero value when absent
    pub initial: Option<Value>,
}

impl FieldDecl {
    /// Create a package-private field
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Modifiers::empty(),
            initial: None,
        }
    }

    /// Set the modifiers
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the initial value
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }
}

/// Declaration of a constructor
#[derive(Debug, Clone)]
pub struct ConstructorDecl {
    /// Parameter types in order
    pub params: Vec<TypeRef>,
    /// Constructor modifiers
    pub modifiers: Modifiers,
    /// Initialization logic
    pub body: Body,
}

impl ConstructorDecl {
    /// Create a package-private constructor with no body
    pub fn new(params: impl IntoIterator<Item = TypeRef>) -> Self {
        Self {
            params: params.into_iter().collect(),
            modifiers: Modifiers::empty(),
            body: Body::Empty,
        }
    }

    /// Set the modifiers
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Attach a closure body
    pub fn body<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value, TargetError> + Send + Sync + 'static,
    {
        self.body = Body::native(f);
        self
    }

    /// Refer to a body registered in a native body registry
    pub fn body_named(mut self, name: impl Into<String>) -> Self {
        self.body = Body::Named(name.into());
        self
    }
}

/// Declaration of a method
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Method name
    pub name: String,
    /// Parameter types in order
    pub params: Vec<TypeRef>,
    /// Return type
    pub return_type: TypeRef,
    /// Method modifiers
    pub modifiers: Modifiers,
    /// Method logic; `Body::Empty` for abstract methods
    pub body: Body,
}

impl MethodDecl {
    /// Create a package-private method with no body
    pub fn new(
        name: impl Into<String>,
        params: impl IntoIterator<Item = TypeRef>,
        return_type: TypeRef,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into_iter().collect(),
            return_type,
            modifiers: Modifiers::empty(),
            body: Body::Empty,
        }
    }

    /// Set the modifiers
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Attach a closure body
    pub fn body<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value, TargetError> + Send + Sync + 'static,
    {
        self.body = Body::native(f);
        self
    }

    /// Refer to a body registered in a native body registry
    pub fn body_named(mut self, name: impl Into<String>) -> Self {
        self.body = Body::Named(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_builder() {
        let decl = TypeDeclaration::class("com.lou.reflect.test.Goat")
            .extends("com.lou.reflect.test.Animal")
            .modifiers(Modifiers::PUBLIC)
            .implements("com.lou.reflect.test.Locomotion")
            .constructor(ConstructorDecl::new([TypeRef::String]).modifiers(Modifiers::PUBLIC));

        assert_eq!(decl.kind, TypeKind::Class);
        assert_eq!(decl.supertype.as_deref(), Some("com.lou.reflect.test.Animal"));
        assert_eq!(decl.interfaces, vec!["com.lou.reflect.test.Locomotion"]);
        assert_eq!(decl.constructors[0].params, vec![TypeRef::String]);
        assert!(matches!(decl.constructors[0].body, Body::Empty));
    }

    #[test]
    fn test_interface_defaults() {
        let decl = TypeDeclaration::interface("com.lou.reflect.test.Eating");
        assert_eq!(decl.kind, TypeKind::Interface);
        assert!(decl.modifiers.is_public());
        assert!(decl.modifiers.is_abstract());
        assert!(decl.supertype.is_none());
    }

    #[test]
    fn test_field_initial_value() {
        let field = FieldDecl::new("CATEGORY", TypeRef::String)
            .modifiers(Modifiers::PUBLIC | Modifiers::STATIC)
            .initial("domestic");
        assert_eq!(field.initial, Some(Value::from("domestic")));
        assert!(field.modifiers.is_static());
    }
}
