//! `refract check`: Resolve every type of a manifest and report failures.

use std::path::Path;

use termcolor::ColorChoice;
use tracing::debug;

use super::load_registry;
use crate::output::StyledOutput;

pub fn execute(manifest: &Path, color: ColorChoice) -> anyhow::Result<()> {
    let (doc, registry) = load_registry(manifest)?;
    let mut out = StyledOutput::new(color);
    let mut failures = 0usize;

    for entry in &doc.types {
        match registry.resolve(&entry.name) {
            Ok(ty) => {
                debug!(type_name = %ty.name(), "resolved");
                out.success("  ok   ");
                out.plain(&entry.name);
                out.newline();
            }
            Err(e) => {
                failures += 1;
                out.error("  FAIL ");
                out.plain(&format!("{}: {}", entry.name, e));
                out.newline();
            }
        }
    }

    let unbound = doc
        .types
        .iter()
        .map(|t| {
            t.constructors.iter().filter(|c| c.body.is_some()).count()
                + t.methods.iter().filter(|m| m.body.is_some()).count()
        })
        .sum::<usize>();
    if unbound > 0 {
        out.warning("note: ");
        out.plain(&format!(
            "{} named bodies left unbound (no natives on the command line)",
            unbound
        ));
        out.newline();
    }
    out.flush();

    if failures > 0 {
        anyhow::bail!("{} of {} types failed to resolve", failures, doc.types.len());
    }
    Ok(())
}
