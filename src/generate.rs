//! Post-processing applied to every generated schema body
//!
//! Definition bodies are written in an OpenAPI-flavoured dialect. These
//! passes turn them into plain JSON Schema and bind cross-schema links to
//! the active deployment.

use serde_json::{Map, Value};

use crate::context::Deployment;

/// JSON Schema dialect stamped into every generated document
pub const SCHEMA_DIALECT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Prefix of string values that link to another schema by relative path
pub const LINK_PREFIX: &str = "schema:";

/// Drop `discriminator.mapping`; JSON Schema has no such keyword.
pub fn remove_discriminator_mapping(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(discriminator)) = map.get_mut("discriminator") {
                discriminator.remove("mapping");
            }
            for child in map.values_mut() {
                remove_discriminator_mapping(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(remove_discriminator_mapping),
        _ => {}
    }
}

/// Drop `"format": "path"`, which only OpenAPI understands.
pub fn remove_format_path(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("format").and_then(Value::as_str) == Some("path") {
                map.remove("format");
            }
            for child in map.values_mut() {
                remove_format_path(child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(remove_format_path),
        _ => {}
    }
}

/// Replace `schema:<relative path>` strings with URLs under the active base.
pub fn resolve_links(value: &mut Value, deployment: &Deployment) {
    match value {
        Value::String(s) => {
            if let Some(relative) = s.strip_prefix(LINK_PREFIX) {
                *s = format!(
                    "{}/{}",
                    deployment.base_url(),
                    relative.trim_start_matches('/')
                );
            }
        }
        Value::Object(map) => {
            for child in map.values_mut() {
                resolve_links(child, deployment);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                resolve_links(child, deployment);
            }
        }
        _ => {}
    }
}

/// Run every pass and stamp the header fields onto the root map.
pub fn finalize(mut body: Value, deployment: &Deployment, id: &str, version: &str) -> Value {
    resolve_links(&mut body, deployment);
    remove_discriminator_mapping(&mut body);
    remove_format_path(&mut body);

    let mut root = match body {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("allOf".to_string(), Value::Array(vec![other]));
            map
        }
    };
    root.insert("$schema".to_string(), Value::String(SCHEMA_DIALECT.to_string()));
    root.insert("$id".to_string(), Value::String(id.to_string()));
    root.insert("version".to_string(), Value::String(version.to_string()));
    Value::Object(root)
}
