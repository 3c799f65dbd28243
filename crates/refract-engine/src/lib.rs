//! Refract Reflection Engine
//!
//! Runtime type metadata and reflective invocation for a registered set of
//! classes and interfaces:
//! - **Registry**: declarations in, cached immutable descriptors out (`registry` module)
//! - **Metadata**: type, field, constructor and method descriptors (`metadata` module)
//! - **Invocation**: construct, invoke, read and write fields (`invoke` module)
//! - **Access**: visibility checks and per-member override tokens (`access` module)
//! - **Manifests**: TOML declarations linked against native bodies (`config` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use refract_engine::{
//!     ConstructorDecl, InvocationEngine, MethodDecl, Modifiers, TypeDeclaration, TypeRef,
//!     TypeRegistry,
//! };
//!
//! let registry = Arc::new(TypeRegistry::default());
//! registry.declare(
//!     TypeDeclaration::class("zoo.Goat")
//!         .modifiers(Modifiers::PUBLIC)
//!         .constructor(ConstructorDecl::new([]).modifiers(Modifiers::PUBLIC))
//!         .method(
//!             MethodDecl::new("eats", [], TypeRef::String)
//!                 .modifiers(Modifiers::PUBLIC)
//!                 .body(|_| Ok("grass".into())),
//!         ),
//! )?;
//!
//! let engine = InvocationEngine::new(registry.clone());
//! let goat = engine.new_instance("zoo.Goat")?;
//! let eats = goat.type_descriptor().find_method("eats", &[])?;
//! let food = engine.invoke(eats, Some(&goat), &[], None)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Access checks and override tokens
pub mod access;

/// Registry configuration and TOML manifests
pub mod config;

/// Type declarations fed to the registry
pub mod declaration;

/// Error types
pub mod error;

/// Hierarchy walks over descriptors
pub mod introspection;

/// Construction, invocation and field access
pub mod invoke;

/// Type and member descriptors
pub mod metadata;

/// Member and type modifiers
pub mod modifiers;

/// Native bodies and linking
pub mod natives;

/// Exact-signature overload selection
pub mod overload;

/// Declaration registry and descriptor cache
pub mod registry;

/// Type references
pub mod types;

/// Values and instances
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use access::{override_access, AccessToken};
pub use config::{ConfigError, Manifest, RegistryConfig};
pub use declaration::{ConstructorDecl, FieldDecl, MethodDecl, TypeDeclaration, TypeKind};
pub use error::{ReflectError, ReflectResult, TargetError};
pub use invoke::{Invocation, InvocationEngine};
pub use metadata::{
    ConstructorDescriptor, FieldDescriptor, Member, MemberId, MethodDescriptor, Parameterized,
    TypeDescriptor,
};
pub use modifiers::Modifiers;
pub use natives::{Body, LinkMode, NativeBody, NativeBodyRegistry};
pub use registry::TypeRegistry;
pub use types::{TypeRef, STRING_TYPE};
pub use value::{Instance, ObjectRef, Value};
