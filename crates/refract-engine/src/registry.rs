//! Type registry: declarations in, cached descriptors out
//!
//! Declarations are registered eagerly; descriptors are built lazily on the
//! first `resolve` of a name and cached for the registry's lifetime.
//! Building a type first builds its supertype and interfaces, so a lookup of
//! a leaf type materialises its whole ancestry once.
//!
//! Readers hit the cache without taking the build lock. A cache miss takes
//! the build lock, re-checks the cache and only then builds, so concurrent
//! resolutions of one name all observe the same `Arc`.

use std::hash::BuildHasherDefault;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rustc_hash::{FxHashSet, FxHasher};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::declaration::{ConstructorDecl, TypeDeclaration, TypeKind};
use crate::error::{ReflectError, ReflectResult};
use crate::introspection::is_subtype_named;
use crate::metadata::{ConstructorParts, FieldParts, MethodParts, TypeDescriptor, TypeParts};
use crate::modifiers::Modifiers;
use crate::natives::Body;
use crate::types::{split_qualified_name, TypeRef, STRING_TYPE};
use crate::value::Value;

type FxBuild = BuildHasherDefault<FxHasher>;

/// Registry of type declarations and their built descriptors
pub struct TypeRegistry {
    config: RegistryConfig,
    declarations: DashMap<String, Arc<TypeDeclaration>, FxBuild>,
    cache: DashMap<String, Arc<TypeDescriptor>, FxBuild>,
    build_lock: Mutex<()>,
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("root", &self.config.root)
            .field("declared", &self.declarations.len())
            .field("resolved", &self.cache.len())
            .finish()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl TypeRegistry {
    /// Create a registry holding only the built-in types
    pub fn new(config: RegistryConfig) -> Self {
        let registry = Self {
            declarations: DashMap::with_hasher(FxBuild::default()),
            cache: DashMap::with_hasher(FxBuild::default()),
            build_lock: Mutex::new(()),
            config,
        };
        registry.install_builtins();
        registry
    }

    fn install_builtins(&self) {
        let root = TypeDeclaration::class(self.config.root.clone())
            .modifiers(Modifiers::PUBLIC)
            .constructor(ConstructorDecl::new([]).modifiers(Modifiers::PUBLIC));
        let string =
            TypeDeclaration::class(STRING_TYPE).modifiers(Modifiers::PUBLIC | Modifiers::FINAL);

        for decl in [root, string] {
            self.declarations.insert(decl.name.clone(), Arc::new(decl));
        }
    }

    /// Registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Qualified name of the root type
    pub fn root_name(&self) -> &str {
        &self.config.root
    }

    /// Register a declaration.
    ///
    /// The descriptor is not built until the name is first resolved.
    pub fn declare(&self, decl: TypeDeclaration) -> ReflectResult<()> {
        if decl.name.trim().is_empty() {
            return Err(ReflectError::invalid(&decl.name, "empty type name"));
        }
        match self.declarations.entry(decl.name.clone()) {
            Entry::Occupied(_) => Err(ReflectError::DuplicateType(decl.name)),
            Entry::Vacant(slot) => {
                debug!(type_name = %decl.name, kind = ?decl.kind, "declared type");
                slot.insert(Arc::new(decl));
                Ok(())
            }
        }
    }

    /// Register several declarations, stopping at the first failure
    pub fn declare_all(
        &self,
        decls: impl IntoIterator<Item = TypeDeclaration>,
    ) -> ReflectResult<()> {
        for decl in decls {
            self.declare(decl)?;
        }
        Ok(())
    }

    /// Whether a declaration exists for `name`
    pub fn is_declared(&self, name: &str) -> bool {
        self.declarations.contains_key(name)
    }

    /// Whether the descriptor for `name` has been built
    pub fn is_resolved(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Number of built descriptors
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if no descriptor has been built yet
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Every declared name, sorted
    pub fn declared_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.declarations.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Get the descriptor for `name`, building it (and its ancestry) on first use.
    pub fn resolve(&self, name: &str) -> ReflectResult<Arc<TypeDescriptor>> {
        if let Some(found) = self.cache.get(name) {
            return Ok(found.value().clone());
        }

        let _guard = self.build_lock.lock();
        let mut visiting = Vec::new();
        self.build(name, &mut visiting)
    }

    /// Build `name` with the build lock held.
    fn build(&self, name: &str, visiting: &mut Vec<String>) -> ReflectResult<Arc<TypeDescriptor>> {
        if let Some(found) = self.cache.get(name) {
            return Ok(found.value().clone());
        }
        if visiting.iter().any(|v| v == name) {
            return Err(ReflectError::CyclicInheritance(name.to_string()));
        }
        let decl = self
            .declarations
            .get(name)
            .map(|d| d.value().clone())
            .ok_or_else(|| ReflectError::TypeNotFound(name.to_string()))?;

        visiting.push(name.to_string());
        let built = self.build_declaration(&decl, visiting);
        visiting.pop();
        let descriptor = built?;

        debug!(
            type_name = %descriptor.name(),
            supertype = descriptor.supertype().map(|s| s.name()).unwrap_or("-"),
            fields = descriptor.declared_fields().len(),
            constructors = descriptor.declared_constructors().len(),
            methods = descriptor.declared_methods().len(),
            "built type descriptor"
        );
        self.cache.insert(name.to_string(), descriptor.clone());
        Ok(descriptor)
    }

    fn build_declaration(
        &self,
        decl: &TypeDeclaration,
        visiting: &mut Vec<String>,
    ) -> ReflectResult<Arc<TypeDescriptor>> {
        let name = decl.name.as_str();
        if decl.modifiers.has_conflicting_visibility() {
            return Err(ReflectError::invalid(name, "conflicting visibility modifiers"));
        }

        let mut modifiers = decl.modifiers;
        let supertype = match decl.kind {
            TypeKind::Interface => {
                if let Some(sup) = &decl.supertype {
                    return Err(ReflectError::invalid(
                        name,
                        format!("interface cannot extend class `{}`", sup),
                    ));
                }
                modifiers |= Modifiers::ABSTRACT;
                None
            }
            TypeKind::Class if name == self.config.root => None,
            TypeKind::Class => {
                let super_name = decl.supertype.as_deref().unwrap_or(&self.config.root);
                let sup = self.build(super_name, visiting)?;
                if sup.is_interface() {
                    return Err(ReflectError::invalid(
                        name,
                        format!("cannot extend interface `{}`", super_name),
                    ));
                }
                if sup.modifiers().is_final() {
                    return Err(ReflectError::invalid(
                        name,
                        format!("cannot extend final type `{}`", super_name),
                    ));
                }
                Some(sup)
            }
        };

        let mut seen = FxHashSet::default();
        let mut interfaces = Vec::with_capacity(decl.interfaces.len());
        for iface_name in &decl.interfaces {
            if !seen.insert(iface_name.as_str()) {
                return Err(ReflectError::invalid(
                    name,
                    format!("interface `{}` listed twice", iface_name),
                ));
            }
            let iface = self.build(iface_name, visiting)?;
            if !iface.is_interface() {
                return Err(ReflectError::invalid(
                    name,
                    format!("`{}` is not an interface", iface_name),
                ));
            }
            interfaces.push(iface);
        }

        let fields = self.field_parts(decl, supertype.as_deref())?;
        let constructors = self.constructor_parts(decl)?;
        let methods = self.method_parts(decl, modifiers)?;

        let (package, simple_name) = split_qualified_name(name);
        Ok(TypeDescriptor::assemble(TypeParts {
            name: name.to_string(),
            simple_name: simple_name.to_string(),
            package: package.to_string(),
            kind: decl.kind,
            modifiers,
            supertype,
            interfaces,
            fields,
            constructors,
            methods,
        }))
    }

    fn field_parts(
        &self,
        decl: &TypeDeclaration,
        supertype: Option<&TypeDescriptor>,
    ) -> ReflectResult<Vec<FieldParts>> {
        let name = decl.name.as_str();
        if decl.kind == TypeKind::Interface && !decl.fields.is_empty() {
            return Err(ReflectError::invalid(name, "interfaces cannot declare fields"));
        }

        let mut next_instance_slot = supertype.map(|s| s.instance_slot_count()).unwrap_or(0);
        let mut next_static_slot = 0;
        let mut seen = FxHashSet::default();
        let mut parts = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ReflectError::invalid(
                    name,
                    format!("duplicate field `{}`", field.name),
                ));
            }
            self.check_member_modifiers(name, &field.name, field.modifiers)?;
            if field.modifiers.is_abstract() {
                return Err(ReflectError::invalid(
                    name,
                    format!("field `{}` cannot be abstract", field.name),
                ));
            }
            self.check_value_type(name, &field.ty)?;
            if let Some(initial) = &field.initial {
                if !initial_fits(&field.ty, initial) {
                    return Err(ReflectError::invalid(
                        name,
                        format!(
                            "initial value {:?} of field `{}` is not a {}",
                            initial, field.name, field.ty
                        ),
                    ));
                }
            }

            let slot = if field.modifiers.is_static() {
                next_static_slot += 1;
                next_static_slot - 1
            } else {
                next_instance_slot += 1;
                next_instance_slot - 1
            };
            parts.push(FieldParts {
                name: field.name.clone(),
                ty: field.ty.clone(),
                modifiers: field.modifiers,
                slot,
                initial: field.initial.clone(),
            });
        }
        Ok(parts)
    }

    fn constructor_parts(&self, decl: &TypeDeclaration) -> ReflectResult<Vec<ConstructorParts>> {
        let name = decl.name.as_str();
        if decl.kind == TypeKind::Interface && !decl.constructors.is_empty() {
            return Err(ReflectError::invalid(name, "interfaces cannot declare constructors"));
        }

        let mut seen: FxHashSet<&[TypeRef]> = FxHashSet::default();
        let mut parts = Vec::with_capacity(decl.constructors.len());
        for ctor in &decl.constructors {
            if !seen.insert(ctor.params.as_slice()) {
                return Err(ReflectError::invalid(name, "duplicate constructor signature"));
            }
            self.check_member_modifiers(name, "<init>", ctor.modifiers)?;
            if ctor.modifiers.intersects(Modifiers::ABSTRACT | Modifiers::STATIC) {
                return Err(ReflectError::invalid(
                    name,
                    "constructors cannot be abstract or static",
                ));
            }
            for param in &ctor.params {
                self.check_value_type(name, param)?;
            }
            parts.push(ConstructorParts {
                params: ctor.params.clone(),
                modifiers: ctor.modifiers,
                body: ctor.body.clone(),
            });
        }
        Ok(parts)
    }

    fn method_parts(
        &self,
        decl: &TypeDeclaration,
        type_modifiers: Modifiers,
    ) -> ReflectResult<Vec<MethodParts>> {
        let name = decl.name.as_str();
        let mut seen: FxHashSet<(&str, &[TypeRef])> = FxHashSet::default();
        let mut parts = Vec::with_capacity(decl.methods.len());
        for method in &decl.methods {
            if !seen.insert((method.name.as_str(), method.params.as_slice())) {
                return Err(ReflectError::invalid(
                    name,
                    format!("duplicate method `{}`", method.name),
                ));
            }

            let mut modifiers = method.modifiers;
            if decl.kind == TypeKind::Interface {
                if !matches!(method.body, Body::Empty) {
                    return Err(ReflectError::invalid(
                        name,
                        format!("interface method `{}` cannot have a body", method.name),
                    ));
                }
                modifiers |= Modifiers::PUBLIC | Modifiers::ABSTRACT;
            }
            self.check_member_modifiers(name, &method.name, modifiers)?;

            if modifiers.is_abstract() {
                if !type_modifiers.is_abstract() {
                    return Err(ReflectError::invalid(
                        name,
                        format!("abstract method `{}` in a non-abstract type", method.name),
                    ));
                }
                if modifiers.intersects(Modifiers::STATIC | Modifiers::PRIVATE | Modifiers::FINAL) {
                    return Err(ReflectError::invalid(
                        name,
                        format!(
                            "abstract method `{}` cannot be static, private or final",
                            method.name
                        ),
                    ));
                }
                if !matches!(method.body, Body::Empty) {
                    return Err(ReflectError::invalid(
                        name,
                        format!("abstract method `{}` cannot have a body", method.name),
                    ));
                }
            }

            for param in &method.params {
                self.check_value_type(name, param)?;
            }
            if let TypeRef::Named(ret) = &method.return_type {
                self.check_known(name, ret)?;
            }
            parts.push(MethodParts {
                name: method.name.clone(),
                params: method.params.clone(),
                return_type: method.return_type.clone(),
                modifiers,
                body: method.body.clone(),
            });
        }
        Ok(parts)
    }

    fn check_member_modifiers(
        &self,
        type_name: &str,
        member: &str,
        modifiers: Modifiers,
    ) -> ReflectResult<()> {
        if modifiers.has_conflicting_visibility() {
            return Err(ReflectError::invalid(
                type_name,
                format!("conflicting visibility modifiers on `{}`", member),
            ));
        }
        Ok(())
    }

    /// Field and parameter types must hold a value and name a declared type.
    fn check_value_type(&self, type_name: &str, ty: &TypeRef) -> ReflectResult<()> {
        match ty {
            TypeRef::Void => Err(ReflectError::invalid(type_name, "`void` is not a value type")),
            TypeRef::Named(referenced) => self.check_known(type_name, referenced),
            _ => Ok(()),
        }
    }

    fn check_known(&self, type_name: &str, referenced: &str) -> ReflectResult<()> {
        if self.declarations.contains_key(referenced) {
            Ok(())
        } else {
            Err(ReflectError::invalid(
                type_name,
                format!("unknown type `{}`", referenced),
            ))
        }
    }
}

/// Whether a declared initial value holds the field's declared type
fn initial_fits(ty: &TypeRef, value: &Value) -> bool {
    match (ty, value) {
        (TypeRef::Boolean, Value::Bool(_))
        | (TypeRef::Int, Value::Int(_))
        | (TypeRef::Long, Value::Long(_))
        | (TypeRef::Double, Value::Double(_))
        | (TypeRef::String, Value::Str(_))
        | (TypeRef::String | TypeRef::Named(_), Value::Null) => true,
        (TypeRef::Named(name), Value::Object(obj)) => is_subtype_named(obj.type_descriptor(), name),
        _ => false,
    }
}
