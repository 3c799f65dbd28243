//! Immutable type and member descriptors
//!
//! A [`TypeDescriptor`] owns the descriptors of the members declared directly
//! on it. Members point back at their owner weakly, so the graph stays
//! acyclic and a descriptor lives exactly as long as the registry (or any
//! caller) holds its `Arc`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::declaration::TypeKind;
use crate::error::{ReflectError, ReflectResult};
use crate::modifiers::Modifiers;
use crate::natives::Body;
use crate::overload;
use crate::types::{format_signature, TypeRef};
use crate::value::Value;

static NEXT_MEMBER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a member descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(u64);

impl MemberId {
    pub(crate) fn next() -> Self {
        Self(NEXT_MEMBER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw id value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Common view of fields, constructors and methods
pub trait Member {
    /// Unique identity, used to bind access tokens
    fn id(&self) -> MemberId;
    /// Member name
    fn name(&self) -> &str;
    /// Member modifiers
    fn modifiers(&self) -> Modifiers;
    /// Qualified name of the declaring type
    fn owner_name(&self) -> &str;
    /// Human readable form, e.g. `zoo.Bird.<init>(String, boolean)`
    fn describe(&self) -> String;
}

/// Members selected by parameter signature
pub trait Parameterized: Member {
    /// Parameter types in order
    fn parameter_types(&self) -> &[TypeRef];
}

/// Runtime description of a class or interface
pub struct TypeDescriptor {
    name: String,
    simple_name: String,
    package: String,
    kind: TypeKind,
    modifiers: Modifiers,
    supertype: Option<Arc<TypeDescriptor>>,
    interfaces: Vec<Arc<TypeDescriptor>>,
    fields: Vec<FieldDescriptor>,
    constructors: Vec<ConstructorDescriptor>,
    methods: Vec<MethodDescriptor>,
    /// Initial slot values for a fresh instance, inherited slots first
    instance_template: Vec<Value>,
    /// Values of the static fields declared on this type
    statics: RwLock<Vec<Value>>,
}

/// Everything needed to assemble a [`TypeDescriptor`]
pub(crate) struct TypeParts {
    pub name: String,
    pub simple_name: String,
    pub package: String,
    pub kind: TypeKind,
    pub modifiers: Modifiers,
    pub supertype: Option<Arc<TypeDescriptor>>,
    pub interfaces: Vec<Arc<TypeDescriptor>>,
    pub fields: Vec<FieldParts>,
    pub constructors: Vec<ConstructorParts>,
    pub methods: Vec<MethodParts>,
}

pub(crate) struct FieldParts {
    pub name: String,
    pub ty: TypeRef,
    pub modifiers: Modifiers,
    pub slot: usize,
    pub initial: Option<Value>,
}

pub(crate) struct ConstructorParts {
    pub params: Vec<TypeRef>,
    pub modifiers: Modifiers,
    pub body: Body,
}

pub(crate) struct MethodParts {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub modifiers: Modifiers,
    pub body: Body,
}

impl TypeDescriptor {
    pub(crate) fn assemble(parts: TypeParts) -> Arc<Self> {
        let mut instance_template = parts
            .supertype
            .as_ref()
            .map(|s| s.instance_template.clone())
            .unwrap_or_default();
        let mut statics = Vec::new();
        for field in &parts.fields {
            let value = field.initial.clone().unwrap_or_else(|| Value::zero(&field.ty));
            if field.modifiers.is_static() {
                statics.push(value);
            } else {
                instance_template.push(value);
            }
        }

        let owner_name = parts.name.clone();
        let simple_name = parts.simple_name.clone();
        Arc::new_cyclic(|owner: &Weak<TypeDescriptor>| TypeDescriptor {
            fields: parts
                .fields
                .into_iter()
                .map(|f| FieldDescriptor {
                    id: MemberId::next(),
                    name: f.name,
                    ty: f.ty,
                    modifiers: f.modifiers,
                    slot: f.slot,
                    initial: f.initial,
                    owner: owner.clone(),
                    owner_name: owner_name.clone(),
                })
                .collect(),
            constructors: parts
                .constructors
                .into_iter()
                .map(|c| ConstructorDescriptor {
                    id: MemberId::next(),
                    name: simple_name.clone(),
                    params: c.params,
                    modifiers: c.modifiers,
                    body: c.body,
                    owner: owner.clone(),
                    owner_name: owner_name.clone(),
                })
                .collect(),
            methods: parts
                .methods
                .into_iter()
                .map(|m| MethodDescriptor {
                    id: MemberId::next(),
                    name: m.name,
                    params: m.params,
                    return_type: m.return_type,
                    modifiers: m.modifiers,
                    body: m.body,
                    owner: owner.clone(),
                    owner_name: owner_name.clone(),
                })
                .collect(),
            name: parts.name,
            simple_name: parts.simple_name,
            package: parts.package,
            kind: parts.kind,
            modifiers: parts.modifiers,
            supertype: parts.supertype,
            interfaces: parts.interfaces,
            instance_template,
            statics: RwLock::new(statics),
        })
    }

    /// Qualified name, e.g. `com.lou.reflect.test.Goat`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical name; identical to the qualified name for top-level types
    pub fn canonical_name(&self) -> &str {
        &self.name
    }

    /// Unqualified name, e.g. `Goat`
    pub fn simple_name(&self) -> &str {
        &self.simple_name
    }

    /// Package part of the qualified name (empty for the unnamed package)
    pub fn package_name(&self) -> &str {
        &self.package
    }

    /// Class or interface
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Check for the interface kind
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Type modifiers
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Direct supertype; `None` for the root type and interfaces
    pub fn supertype(&self) -> Option<&Arc<TypeDescriptor>> {
        self.supertype.as_ref()
    }

    /// Interfaces from this type's own implementation clause only
    pub fn declared_interfaces(&self) -> &[Arc<TypeDescriptor>] {
        &self.interfaces
    }

    /// Fields declared on this type, excluding inherited ones
    pub fn declared_fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Constructors declared on this type
    pub fn declared_constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    /// Methods declared on this type, excluding inherited ones
    pub fn declared_methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// Number of instance slots, inherited ones included
    pub fn instance_slot_count(&self) -> usize {
        self.instance_template.len()
    }

    /// This type followed by each supertype up to the root
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Select a declared constructor by exact parameter signature
    pub fn find_constructor(&self, signature: &[TypeRef]) -> ReflectResult<&ConstructorDescriptor> {
        overload::select(&self.name, "<init>", &self.constructors, signature)
    }

    /// Select a declared method by name and exact parameter signature
    pub fn find_method(
        &self,
        name: &str,
        signature: &[TypeRef],
    ) -> ReflectResult<&MethodDescriptor> {
        let candidates: Vec<&MethodDescriptor> =
            self.methods.iter().filter(|m| m.name == name).collect();
        overload::select(&self.name, name, candidates, signature)
    }

    /// Find a field declared on this type by name
    pub fn find_declared_field(&self, name: &str) -> ReflectResult<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| ReflectError::MemberNotFound {
                owner: self.name.clone(),
                member: name.to_string(),
                signature: String::new(),
            })
    }

    pub(crate) fn instance_template(&self) -> &[Value] {
        &self.instance_template
    }

    pub(crate) fn read_static(&self, slot: usize) -> Value {
        self.statics.read().get(slot).cloned().unwrap_or(Value::Null)
    }

    pub(crate) fn write_static(&self, slot: usize, value: Value) {
        if let Some(entry) = self.statics.write().get_mut(slot) {
            *entry = value;
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("modifiers", &self.modifiers)
            .field("supertype", &self.supertype.as_ref().map(|s| s.name()))
            .field(
                "interfaces",
                &self.interfaces.iter().map(|i| i.name()).collect::<Vec<_>>(),
            )
            .field("fields", &self.fields)
            .field("constructors", &self.constructors)
            .field("methods", &self.methods)
            .finish()
    }
}

/// Iterator over a type and its supertypes, nearest first
pub struct Ancestors<'a> {
    next: Option<&'a TypeDescriptor>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TypeDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.supertype.as_deref();
        Some(current)
    }
}

fn upgrade_owner(
    owner: &Weak<TypeDescriptor>,
    owner_name: &str,
) -> ReflectResult<Arc<TypeDescriptor>> {
    owner
        .upgrade()
        .ok_or_else(|| ReflectError::TypeNotFound(owner_name.to_string()))
}

/// Descriptor of a field
pub struct FieldDescriptor {
    id: MemberId,
    name: String,
    ty: TypeRef,
    modifiers: Modifiers,
    slot: usize,
    initial: Option<Value>,
    owner: Weak<TypeDescriptor>,
    owner_name: String,
}

impl FieldDescriptor {
    /// Declared type
    pub fn field_type(&self) -> &TypeRef {
        &self.ty
    }

    /// Check the static flag
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    /// Declared initial value, if any
    pub fn initial_value(&self) -> Option<&Value> {
        self.initial.as_ref()
    }

    /// Owning type
    pub fn owner(&self) -> ReflectResult<Arc<TypeDescriptor>> {
        upgrade_owner(&self.owner, &self.owner_name)
    }

    /// Instance slot (inherited slots included) or static slot index
    pub(crate) fn slot(&self) -> usize {
        self.slot
    }
}

impl Member for FieldDescriptor {
    fn id(&self) -> MemberId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    fn owner_name(&self) -> &str {
        &self.owner_name
    }

    fn describe(&self) -> String {
        format!("{}.{}", self.owner_name, self.name)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.modifiers, self.ty, self.name)
    }
}

/// Descriptor of a constructor
pub struct ConstructorDescriptor {
    id: MemberId,
    name: String,
    params: Vec<TypeRef>,
    modifiers: Modifiers,
    body: Body,
    owner: Weak<TypeDescriptor>,
    owner_name: String,
}

impl ConstructorDescriptor {
    /// Owning type
    pub fn owner(&self) -> ReflectResult<Arc<TypeDescriptor>> {
        upgrade_owner(&self.owner, &self.owner_name)
    }

    pub(crate) fn body(&self) -> &Body {
        &self.body
    }
}

impl Member for ConstructorDescriptor {
    fn id(&self) -> MemberId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    fn owner_name(&self) -> &str {
        &self.owner_name
    }

    fn describe(&self) -> String {
        format!("{}.<init>{}", self.owner_name, format_signature(&self.params))
    }
}

impl Parameterized for ConstructorDescriptor {
    fn parameter_types(&self) -> &[TypeRef] {
        &self.params
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.modifiers, self.name, format_signature(&self.params))
    }
}

/// Descriptor of a method
pub struct MethodDescriptor {
    id: MemberId,
    name: String,
    params: Vec<TypeRef>,
    return_type: TypeRef,
    modifiers: Modifiers,
    body: Body,
    owner: Weak<TypeDescriptor>,
    owner_name: String,
}

impl MethodDescriptor {
    /// Declared return type
    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    /// Abstract methods have no body
    pub fn is_abstract(&self) -> bool {
        self.modifiers.is_abstract()
    }

    /// Check the static flag
    pub fn is_static(&self) -> bool {
        self.modifiers.is_static()
    }

    /// Owning type
    pub fn owner(&self) -> ReflectResult<Arc<TypeDescriptor>> {
        upgrade_owner(&self.owner, &self.owner_name)
    }

    /// Same name and identical parameter types
    pub fn same_signature(&self, other: &MethodDescriptor) -> bool {
        self.name == other.name && self.params == other.params
    }

    pub(crate) fn body(&self) -> &Body {
        &self.body
    }
}

impl Member for MethodDescriptor {
    fn id(&self) -> MemberId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    fn owner_name(&self) -> &str {
        &self.owner_name
    }

    fn describe(&self) -> String {
        format!(
            "{}.{}{}",
            self.owner_name,
            self.name,
            format_signature(&self.params)
        )
    }
}

impl Parameterized for MethodDescriptor {
    fn parameter_types(&self) -> &[TypeRef] {
        &self.params
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}{}",
            self.modifiers,
            self.return_type,
            self.name,
            format_signature(&self.params)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animal() -> Arc<TypeDescriptor> {
        TypeDescriptor::assemble(TypeParts {
            name: "zoo.Animal".to_string(),
            simple_name: "Animal".to_string(),
            package: "zoo".to_string(),
            kind: TypeKind::Class,
            modifiers: Modifiers::PUBLIC | Modifiers::ABSTRACT,
            supertype: None,
            interfaces: Vec::new(),
            fields: vec![
                FieldParts {
                    name: "CATEGORY".to_string(),
                    ty: TypeRef::String,
                    modifiers: Modifiers::PUBLIC | Modifiers::STATIC,
                    slot: 0,
                    initial: Some(Value::from("domestic")),
                },
                FieldParts {
                    name: "name".to_string(),
                    ty: TypeRef::String,
                    modifiers: Modifiers::PRIVATE,
                    slot: 0,
                    initial: None,
                },
            ],
            constructors: vec![ConstructorParts {
                params: vec![TypeRef::String],
                modifiers: Modifiers::PUBLIC,
                body: Body::Empty,
            }],
            methods: vec![MethodParts {
                name: "getName".to_string(),
                params: Vec::new(),
                return_type: TypeRef::String,
                modifiers: Modifiers::PUBLIC,
                body: Body::Empty,
            }],
        })
    }

    #[test]
    fn test_identity() {
        let ty = animal();
        assert_eq!(ty.name(), "zoo.Animal");
        assert_eq!(ty.simple_name(), "Animal");
        assert_eq!(ty.package_name(), "zoo");
        assert!(ty.supertype().is_none());
    }

    #[test]
    fn test_members_point_back_to_owner() {
        let ty = animal();
        let field = ty.find_declared_field("name").unwrap();
        assert!(Arc::ptr_eq(&field.owner().unwrap(), &ty));
        assert_eq!(ty.declared_constructors()[0].name(), "Animal");
        assert_eq!(ty.declared_methods()[0].describe(), "zoo.Animal.getName()");
    }

    #[test]
    fn test_slot_layout_and_statics() {
        let ty = animal();
        assert_eq!(ty.instance_slot_count(), 1);
        assert_eq!(ty.read_static(0), Value::from("domestic"));
        ty.write_static(0, Value::from("wild"));
        assert_eq!(ty.read_static(0), Value::from("wild"));
    }

    #[test]
    fn test_member_ids_are_unique() {
        let ty = animal();
        let a = ty.declared_fields()[0].id();
        let b = ty.declared_fields()[1].id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_missing_field() {
        let ty = animal();
        let err = ty.find_declared_field("age").unwrap_err();
        assert!(matches!(err, ReflectError::MemberNotFound { .. }));
    }
}
