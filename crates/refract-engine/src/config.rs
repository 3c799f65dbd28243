//! Registry configuration and TOML manifests
//!
//! A manifest carries the registry settings under `[registry]` and one
//! `[[types]]` table per declaration. Bodies are referenced by name and
//! linked against a [`NativeBodyRegistry`] when the registry is built.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::declaration::{ConstructorDecl, FieldDecl, MethodDecl, TypeDeclaration, TypeKind};
use crate::error::ReflectError;
use crate::modifiers::Modifiers;
use crate::natives::{LinkMode, NativeBodyRegistry};
use crate::registry::TypeRegistry;
use crate::types::TypeRef;
use crate::value::Value;

/// Errors that can occur while loading a manifest
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the manifest file
    #[error("Failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    /// The manifest parsed but describes something unusable
    #[error("Invalid manifest: {0}")]
    Invalid(String),

    /// A declaration was rejected by the registry or the linker
    #[error(transparent)]
    Reflect(#[from] ReflectError),
}

/// Registry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Qualified name of the root type every class ultimately extends
    pub root: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            root: "lang.Object".to_string(),
        }
    }
}

/// A parsed manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Type declarations
    #[serde(default)]
    pub types: Vec<TypeDoc>,
}

/// `[[types]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDoc {
    /// Qualified name
    pub name: String,
    /// `class` (default) or `interface`
    #[serde(default)]
    pub kind: TypeKind,
    /// Supertype; the root type when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Modifier keywords
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// Directly implemented interfaces
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Own fields
    #[serde(default)]
    pub fields: Vec<FieldDoc>,
    /// Own constructors
    #[serde(default)]
    pub constructors: Vec<ConstructorDoc>,
    /// Own methods
    #[serde(default)]
    pub methods: Vec<MethodDoc>,
}

/// `[[types.fields]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDoc {
    /// Field name
    pub name: String,
    /// Type name (`int`, `String`, `pkg.Type`, ...)
    #[serde(rename = "type")]
    pub ty: String,
    /// Modifier keywords
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// Initial value, converted to the declared type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<InitialValue>,
}

/// `[[types.constructors]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorDoc {
    /// Parameter type names
    #[serde(default)]
    pub params: Vec<String>,
    /// Modifier keywords
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// Native body name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// `[[types.methods]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodDoc {
    /// Method name
    pub name: String,
    /// Parameter type names
    #[serde(default)]
    pub params: Vec<String>,
    /// Return type name
    #[serde(default = "default_return")]
    pub returns: String,
    /// Modifier keywords
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// Native body name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

fn default_return() -> String {
    "void".to_string()
}

/// A literal initial value as written in TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InitialValue {
    /// `true` / `false`
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal
    Str(String),
}

impl InitialValue {
    /// Convert to a value of type `ty`
    pub fn to_value(&self, ty: &TypeRef) -> Option<Value> {
        match (ty, self) {
            (TypeRef::Boolean, InitialValue::Bool(b)) => Some(Value::Bool(*b)),
            (TypeRef::Int, InitialValue::Int(i)) => i32::try_from(*i).ok().map(Value::Int),
            (TypeRef::Long, InitialValue::Int(i)) => Some(Value::Long(*i)),
            (TypeRef::Double, InitialValue::Float(d)) => Some(Value::Double(*d)),
            (TypeRef::Double, InitialValue::Int(i)) => Some(Value::Double(*i as f64)),
            (TypeRef::String, InitialValue::Str(s)) => Some(Value::str(s)),
            _ => None,
        }
    }
}

impl Manifest {
    /// Load a manifest from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(content.as_str())
    }

    /// Parse a manifest from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let manifest: Manifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check the settings that do not depend on other declarations
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.root.trim().is_empty() {
            return Err(ConfigError::Invalid("registry root must not be empty".to_string()));
        }
        for ty in &self.types {
            if ty.name.trim().is_empty() {
                return Err(ConfigError::Invalid("type with an empty name".to_string()));
            }
        }
        Ok(())
    }

    /// Convert every `[[types]]` entry into a declaration with named bodies
    pub fn declarations(&self) -> Result<Vec<TypeDeclaration>, ConfigError> {
        self.types.iter().map(TypeDoc::to_declaration).collect()
    }

    /// Build a registry from this manifest, linking bodies against `natives`
    pub fn build_registry(
        &self,
        natives: &NativeBodyRegistry,
        mode: LinkMode,
    ) -> Result<TypeRegistry, ConfigError> {
        let registry = TypeRegistry::new(self.registry.clone());
        registry.declare_manifest(self, natives, mode)?;
        Ok(registry)
    }
}

impl TypeRegistry {
    /// Declare every type of `manifest`, linking bodies against `natives`.
    ///
    /// The manifest's `[registry]` settings are ignored here; they only
    /// apply when the registry is created from the manifest.
    pub fn declare_manifest(
        &self,
        manifest: &Manifest,
        natives: &NativeBodyRegistry,
        mode: LinkMode,
    ) -> Result<(), ConfigError> {
        for decl in manifest.declarations()? {
            let linked = natives.link(decl, mode)?;
            self.declare(linked)?;
        }
        Ok(())
    }
}

fn parse_modifiers(owner: &str, keywords: &[String]) -> Result<Modifiers, ConfigError> {
    Modifiers::from_keywords(keywords)
        .map_err(|e| ConfigError::Invalid(format!("{}: {}", owner, e)))
}

fn parse_types(names: &[String]) -> Vec<TypeRef> {
    names.iter().map(|n| TypeRef::parse(n)).collect()
}

impl TypeDoc {
    /// Convert to a declaration; bodies stay as names
    pub fn to_declaration(&self) -> Result<TypeDeclaration, ConfigError> {
        let mut decl = match self.kind {
            TypeKind::Class => TypeDeclaration::class(self.name.clone()),
            TypeKind::Interface => TypeDeclaration::interface(self.name.clone()),
        };
        if !self.modifiers.is_empty() {
            let mut modifiers = parse_modifiers(&self.name, &self.modifiers)?;
            if self.kind == TypeKind::Interface {
                modifiers |= Modifiers::ABSTRACT;
            }
            decl = decl.modifiers(modifiers);
        }
        if let Some(sup) = &self.extends {
            decl = decl.extends(sup.clone());
        }
        for iface in &self.interfaces {
            decl = decl.implements(iface.clone());
        }

        for field in &self.fields {
            let ty = TypeRef::parse(&field.ty);
            let owner = format!("{}.{}", self.name, field.name);
            let mut fd = FieldDecl::new(field.name.clone(), ty.clone())
                .modifiers(parse_modifiers(&owner, &field.modifiers)?);
            if let Some(initial) = &field.initial {
                let value = initial.to_value(&ty).ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "{}: initial value {:?} is not a {}",
                        owner, initial, ty
                    ))
                })?;
                fd = fd.initial(value);
            }
            decl = decl.field(fd);
        }

        for ctor in &self.constructors {
            let owner = format!("{}.<init>", self.name);
            let mut cd = ConstructorDecl::new(parse_types(&ctor.params))
                .modifiers(parse_modifiers(&owner, &ctor.modifiers)?);
            if let Some(body) = &ctor.body {
                cd = cd.body_named(body.clone());
            }
            decl = decl.constructor(cd);
        }

        for method in &self.methods {
            let owner = format!("{}.{}", self.name, method.name);
            let mut md = MethodDecl::new(
                method.name.clone(),
                parse_types(&method.params),
                TypeRef::parse(&method.returns),
            )
            .modifiers(parse_modifiers(&owner, &method.modifiers)?);
            if let Some(body) = &method.body {
                md = md.body_named(body.clone());
            }
            decl = decl.method(md);
        }

        Ok(decl)
    }
}
