//! Explicit hierarchy walks
//!
//! The declared collections of a descriptor never include inherited
//! members or interfaces. Everything here walks the chain one level at a
//! time on the caller's behalf and returns the result separately.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::metadata::{ConstructorDescriptor, Member, MethodDescriptor, TypeDescriptor};
use crate::value::Instance;

/// The type itself followed by each supertype up to the root
pub fn hierarchy(ty: &Arc<TypeDescriptor>) -> Vec<Arc<TypeDescriptor>> {
    let mut chain = vec![ty.clone()];
    let mut current = ty.supertype();
    while let Some(sup) = current {
        chain.push(sup.clone());
        current = sup.supertype();
    }
    chain
}

/// Whether `sub` is `sup`, extends it, or implements it (transitively)
pub fn is_subclass_of(sub: &TypeDescriptor, sup: &TypeDescriptor) -> bool {
    is_subtype_named(sub, sup.name())
}

/// Name-based form of [`is_subclass_of`]
pub fn is_subtype_named(sub: &TypeDescriptor, name: &str) -> bool {
    sub.ancestors().any(|ty| ty.name() == name || implements_named(ty, name))
}

fn implements_named(ty: &TypeDescriptor, name: &str) -> bool {
    ty.declared_interfaces()
        .iter()
        .any(|iface| iface.name() == name || implements_named(iface, name))
}

/// Whether `obj`'s runtime type is `ty` or one of its subtypes
pub fn is_instance_of(obj: &Instance, ty: &TypeDescriptor) -> bool {
    is_subclass_of(obj.type_descriptor(), ty)
}

/// Every interface reachable from `ty`, nearest first, without duplicates.
///
/// Direct interfaces of `ty` come first, then their super-interfaces, then
/// the interfaces contributed by each supertype in turn.
pub fn all_interfaces(ty: &TypeDescriptor) -> Vec<Arc<TypeDescriptor>> {
    let mut seen = FxHashSet::default();
    let mut result = Vec::new();
    for level in ty.ancestors() {
        let mut pending: Vec<&Arc<TypeDescriptor>> = level.declared_interfaces().iter().collect();
        while !pending.is_empty() {
            let mut next = Vec::new();
            for iface in pending {
                if seen.insert(iface.name().to_string()) {
                    result.push(iface.clone());
                    next.extend(iface.declared_interfaces().iter());
                }
            }
            pending = next;
        }
    }
    result
}

/// Public constructors of `ty`
pub fn public_constructors(ty: &TypeDescriptor) -> Vec<&ConstructorDescriptor> {
    ty.declared_constructors()
        .iter()
        .filter(|c| c.modifiers().is_public())
        .collect()
}

/// Public methods of `ty` and its supertypes.
///
/// A method overridden lower in the chain hides the inherited one.
pub fn public_methods(ty: &TypeDescriptor) -> Vec<&MethodDescriptor> {
    let mut result: Vec<&MethodDescriptor> = Vec::new();
    for level in ty.ancestors() {
        for method in level.declared_methods() {
            if !method.modifiers().is_public() {
                continue;
            }
            if result.iter().any(|m| m.same_signature(method)) {
                continue;
            }
            result.push(method);
        }
    }
    result
}
