//! `refract inspect`: Show the descriptor of one type.

use std::path::Path;

use refract_engine::types::format_signature;
use refract_engine::{Member, Parameterized, TypeDescriptor, Value};
use serde_json::json;
use termcolor::ColorChoice;

use super::{kind_label, load_registry};
use crate::output::StyledOutput;

pub fn execute(
    manifest: &Path,
    type_name: &str,
    as_json: bool,
    color: ColorChoice,
) -> anyhow::Result<()> {
    let (_, registry) = load_registry(manifest)?;
    let ty = registry.resolve(type_name)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&to_json(&ty))?);
        return Ok(());
    }

    let mut out = StyledOutput::new(color);
    out.modifiers(ty.modifiers());
    out.plain(kind_label(ty.kind()));
    out.plain(" ");
    out.info(ty.name());
    out.newline();

    out.plain(&format!("  package:    {}\n", display_package(&ty)));
    if let Some(sup) = ty.supertype() {
        out.plain("  extends:    ");
        out.info(sup.name());
        out.newline();
    }
    if !ty.declared_interfaces().is_empty() {
        let names: Vec<&str> = ty.declared_interfaces().iter().map(|i| i.name()).collect();
        out.plain("  implements: ");
        out.info(&names.join(", "));
        out.newline();
    }

    out.newline();
    out.header(&format!("Fields ({})", ty.declared_fields().len()));
    for field in ty.declared_fields() {
        out.plain("  ");
        out.modifiers(field.modifiers());
        out.plain(&format!("{} {}", field.field_type(), field.name()));
        if let Some(initial) = field.initial_value() {
            out.plain(&format!(" = {:?}", initial));
        }
        out.newline();
    }

    out.header(&format!("Constructors ({})", ty.declared_constructors().len()));
    for ctor in ty.declared_constructors() {
        out.plain("  ");
        out.modifiers(ctor.modifiers());
        out.plain(&format!("{}{}", ctor.name(), format_signature(ctor.parameter_types())));
        out.newline();
    }

    out.header(&format!("Methods ({})", ty.declared_methods().len()));
    for method in ty.declared_methods() {
        out.plain("  ");
        out.modifiers(method.modifiers());
        out.plain(&format!(
            "{} {}{}",
            method.return_type(),
            method.name(),
            format_signature(method.parameter_types())
        ));
        out.newline();
    }
    out.flush();
    Ok(())
}

fn display_package(ty: &TypeDescriptor) -> &str {
    if ty.package_name().is_empty() {
        "(unnamed)"
    } else {
        ty.package_name()
    }
}

fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Long(i) => json!(i),
        Value::Double(d) => json!(d),
        Value::Str(s) => json!(s.to_string()),
        other => json!(format!("{:?}", other)),
    }
}

fn to_json(ty: &TypeDescriptor) -> serde_json::Value {
    let types = |params: &[refract_engine::TypeRef]| -> Vec<String> {
        params.iter().map(|p| p.to_string()).collect()
    };
    json!({
        "name": ty.name(),
        "simpleName": ty.simple_name(),
        "package": ty.package_name(),
        "kind": kind_label(ty.kind()),
        "modifiers": ty.modifiers().to_string(),
        "supertype": ty.supertype().map(|s| s.name().to_string()),
        "interfaces": ty.declared_interfaces().iter().map(|i| i.name()).collect::<Vec<_>>(),
        "fields": ty.declared_fields().iter().map(|f| json!({
            "name": f.name(),
            "type": f.field_type().to_string(),
            "modifiers": f.modifiers().to_string(),
            "initial": f.initial_value().map(value_json),
        })).collect::<Vec<_>>(),
        "constructors": ty.declared_constructors().iter().map(|c| json!({
            "params": types(c.parameter_types()),
            "modifiers": c.modifiers().to_string(),
        })).collect::<Vec<_>>(),
        "methods": ty.declared_methods().iter().map(|m| json!({
            "name": m.name(),
            "params": types(m.parameter_types()),
            "returns": m.return_type().to_string(),
            "modifiers": m.modifiers().to_string(),
        })).collect::<Vec<_>>(),
    })
}
