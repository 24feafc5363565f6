//! Schema Registry
//!
//! An ordered, read-only set of schema descriptors. Order only fixes the
//! order outcomes are reported in.

use std::collections::HashMap;
use std::path::{Component, Path};

use crate::context::SCHEMAS_ROOT;
use crate::error::{Result, SchemaError};
use crate::schema::SchemaDescriptor;

/// The descriptors known to a run
pub struct SchemaRegistry {
    schemas: Vec<Box<dyn SchemaDescriptor>>,
}

impl SchemaRegistry {
    /// Build a registry, rejecting duplicate filenames and paths and any
    /// path outside the schemas root.
    pub fn new(schemas: Vec<Box<dyn SchemaDescriptor>>) -> Result<Self> {
        let mut by_path: HashMap<&Path, &str> = HashMap::new();
        let mut by_filename: HashMap<&str, &Path> = HashMap::new();

        for schema in &schemas {
            validate_path(schema.as_ref())?;

            if let Some(first) = by_path.insert(schema.path(), schema.filename()) {
                return Err(SchemaError::DuplicatePath {
                    path: schema.path().to_path_buf(),
                    first: first.to_string(),
                    second: schema.filename().to_string(),
                });
            }
            if by_filename.insert(schema.filename(), schema.path()).is_some() {
                return Err(SchemaError::InvalidDescriptor {
                    filename: schema.filename().to_string(),
                    reason: "filename is declared more than once".to_string(),
                });
            }
        }

        Ok(Self { schemas })
    }

    /// Descriptors in registry order
    pub fn iter(&self) -> impl Iterator<Item = &dyn SchemaDescriptor> {
        self.schemas.iter().map(|s| s.as_ref())
    }

    /// Look up a descriptor by filename
    pub fn get(&self, filename: &str) -> Option<&dyn SchemaDescriptor> {
        self.iter().find(|s| s.filename() == filename)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn validate_path(schema: &dyn SchemaDescriptor) -> Result<()> {
    let invalid = |reason: String| SchemaError::InvalidDescriptor {
        filename: schema.filename().to_string(),
        reason,
    };
    let path = schema.path();

    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == SCHEMAS_ROOT => {}
        _ => {
            return Err(invalid(format!(
                "path must start with `{SCHEMAS_ROOT}`, got {}",
                path.display()
            )))
        }
    }
    if components.any(|c| !matches!(c, Component::Normal(_))) {
        return Err(invalid(format!(
            "path must be relative and normalized, got {}",
            path.display()
        )));
    }
    if path.file_name().and_then(|f| f.to_str()) != Some(schema.filename()) {
        return Err(invalid(format!(
            "path {} does not end with the filename",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{JsonSchemaDescriptor, SchemaKind};
    use serde_json::json;

    fn descriptor(filename: &str, version: &str) -> Box<dyn SchemaDescriptor> {
        Box::new(
            JsonSchemaDescriptor::new(filename, version, SchemaKind::Metadata, json!({}))
                .unwrap(),
        )
    }

    #[test]
    fn test_preserves_order() {
        let registry = SchemaRegistry::new(vec![
            descriptor("b.json", "1.0.0"),
            descriptor("a.json", "1.0.0"),
        ])
        .unwrap();
        let names: Vec<_> = registry.iter().map(|s| s.filename()).collect();
        assert_eq!(names, vec!["b.json", "a.json"]);
        assert!(registry.get("a.json").is_some());
        assert!(registry.get("c.json").is_none());
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let a = JsonSchemaDescriptor::new("a.json", "1.0.0", SchemaKind::Metadata, json!({}))
            .unwrap()
            .with_path("schemas/shared/a.json");
        let b = JsonSchemaDescriptor::new("a.json", "2.0.0", SchemaKind::Metadata, json!({}))
            .unwrap()
            .with_path("schemas/shared/a.json");
        let result = SchemaRegistry::new(vec![Box::new(a), Box::new(b)]);
        assert!(matches!(result, Err(SchemaError::DuplicatePath { .. })));
    }

    #[test]
    fn test_duplicate_filename_rejected() {
        let result = SchemaRegistry::new(vec![
            descriptor("a.json", "1.0.0"),
            descriptor("a.json", "2.0.0"),
        ]);
        assert!(matches!(result, Err(SchemaError::InvalidDescriptor { .. })));
    }

    #[test]
    fn test_path_outside_schemas_root_rejected() {
        let outside = JsonSchemaDescriptor::new("a.json", "1.0.0", SchemaKind::Metadata, json!({}))
            .unwrap()
            .with_path("docs/a.json");
        let escaping = JsonSchemaDescriptor::new("b.json", "1.0.0", SchemaKind::Metadata, json!({}))
            .unwrap()
            .with_path("schemas/../b.json");
        assert!(SchemaRegistry::new(vec![Box::new(outside)]).is_err());
        assert!(SchemaRegistry::new(vec![Box::new(escaping)]).is_err());
    }
}
