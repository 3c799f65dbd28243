//! `refract hierarchy`: Show the supertype chain and interface closure.

use std::path::Path;

use refract_engine::introspection::{all_interfaces, hierarchy};
use termcolor::ColorChoice;

use super::{kind_label, load_registry};
use crate::output::StyledOutput;

pub fn execute(manifest: &Path, type_name: &str, color: ColorChoice) -> anyhow::Result<()> {
    let (_, registry) = load_registry(manifest)?;
    let ty = registry.resolve(type_name)?;
    let mut out = StyledOutput::new(color);

    out.header("Supertypes");
    for (depth, level) in hierarchy(&ty).iter().enumerate() {
        out.plain(&"  ".repeat(depth + 1));
        out.info(level.name());
        out.plain(&format!(" ({})", kind_label(level.kind())));
        if !level.declared_interfaces().is_empty() {
            let names: Vec<&str> = level
                .declared_interfaces()
                .iter()
                .map(|i| i.simple_name())
                .collect();
            out.plain(&format!(" implements {}", names.join(", ")));
        }
        out.newline();
    }

    let interfaces = all_interfaces(&ty);
    out.header(&format!("All interfaces ({})", interfaces.len()));
    for iface in &interfaces {
        out.plain("  ");
        out.info(iface.name());
        out.newline();
    }
    out.flush();
    Ok(())
}
