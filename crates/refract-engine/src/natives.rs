//! Native body registry
//!
//! Constructor and method bodies are Rust closures. Declarations built in
//! code attach them directly; manifest declarations refer to them by a
//! symbolic name (e.g. `"bird.init.named"`) which is linked against a
//! [`NativeBodyRegistry`] before the declaration reaches the type registry.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::declaration::TypeDeclaration;
use crate::error::{ReflectError, ReflectResult, TargetError};
use crate::invoke::Invocation;
use crate::value::Value;

/// A constructor or method body.
///
/// Constructor bodies return [`Value::Void`]; the value is ignored.
pub type NativeBody =
    Arc<dyn Fn(&mut Invocation<'_>) -> Result<Value, TargetError> + Send + Sync>;

/// The executable part of a constructor or method
#[derive(Clone, Default)]
pub enum Body {
    /// No body: abstract methods, or constructors that only zero their slots
    #[default]
    Empty,
    /// A linked closure
    Native(NativeBody),
    /// A symbolic body name not linked to any closure
    Named(String),
}

impl Body {
    /// Wrap a closure
    pub fn native<F>(f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value, TargetError> + Send + Sync + 'static,
    {
        Body::Native(Arc::new(f))
    }

    /// Whether this body is a closure ready to run
    pub fn is_linked(&self) -> bool {
        matches!(self, Body::Native(_))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => write!(f, "Empty"),
            Body::Native(_) => write!(f, "Native(..)"),
            Body::Named(name) => write!(f, "Named({:?})", name),
        }
    }
}

/// How to treat body names that are not registered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// Unknown names fail the link
    Strict,
    /// Unknown names stay as [`Body::Named`]; invoking them fails later
    Lenient,
}

/// Registry of native bodies indexed by symbolic name
#[derive(Default)]
pub struct NativeBodyRegistry {
    bodies: FxHashMap<String, NativeBody>,
}

impl fmt::Debug for NativeBodyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBodyRegistry")
            .field("count", &self.bodies.len())
            .finish()
    }
}

impl NativeBodyRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body by name, replacing any previous one
    pub fn register<F>(&mut self, name: &str, body: F)
    where
        F: Fn(&mut Invocation<'_>) -> Result<Value, TargetError> + Send + Sync + 'static,
    {
        self.bodies.insert(name.to_string(), Arc::new(body));
    }

    /// Get a body by name
    pub fn get(&self, name: &str) -> Option<NativeBody> {
        self.bodies.get(name).cloned()
    }

    /// Check if a body is registered
    pub fn contains(&self, name: &str) -> bool {
        self.bodies.contains_key(name)
    }

    /// Number of registered bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Replace every named body in `decl` with its registered closure.
    pub fn link(
        &self,
        mut decl: TypeDeclaration,
        mode: LinkMode,
    ) -> ReflectResult<TypeDeclaration> {
        let type_name = decl.name.clone();
        for ctor in &mut decl.constructors {
            ctor.body = self.link_body(&type_name, "<init>", std::mem::take(&mut ctor.body), mode)?;
        }
        for method in &mut decl.methods {
            method.body =
                self.link_body(&type_name, &method.name, std::mem::take(&mut method.body), mode)?;
        }
        Ok(decl)
    }

    fn link_body(
        &self,
        type_name: &str,
        member: &str,
        body: Body,
        mode: LinkMode,
    ) -> ReflectResult<Body> {
        let Body::Named(name) = body else {
            return Ok(body);
        };
        match (self.get(&name), mode) {
            (Some(native), _) => Ok(Body::Native(native)),
            (None, LinkMode::Lenient) => Ok(Body::Named(name)),
            (None, LinkMode::Strict) => Err(ReflectError::invalid(
                type_name,
                format!("unknown native body `{}` for {}", name, member),
            )),
        }
    }
}
