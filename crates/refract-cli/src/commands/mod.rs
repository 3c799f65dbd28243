//! Subcommand implementations

pub mod check;
pub mod hierarchy;
pub mod info;
pub mod inspect;

use std::path::Path;

use anyhow::Context;
use refract_engine::{LinkMode, Manifest, NativeBodyRegistry, TypeKind, TypeRegistry};

/// Load a manifest for inspection.
///
/// No native bodies exist on the command line, so every named body stays
/// unbound.
pub fn load_registry(path: &Path) -> anyhow::Result<(Manifest, TypeRegistry)> {
    let manifest = Manifest::from_file(path)
        .with_context(|| format!("failed to load manifest {}", path.display()))?;
    let registry = manifest
        .build_registry(&NativeBodyRegistry::new(), LinkMode::Lenient)
        .with_context(|| format!("failed to declare types from {}", path.display()))?;
    Ok((manifest, registry))
}

pub fn kind_label(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Class => "class",
        TypeKind::Interface => "interface",
    }
}
