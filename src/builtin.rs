//! Schemas shipped with this crate
//!
//! Definition bodies live in `definitions/` and are embedded at compile
//! time. Bumping a schema means bumping its version here.

use include_dir::{include_dir, Dir};
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::registry::SchemaRegistry;
use crate::schema::{JsonSchemaDescriptor, SchemaDescriptor, SchemaKind};

static DEFINITIONS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/definitions");

/// A statically declared schema
struct Builtin {
    filename: &'static str,
    version: &'static str,
    kind: SchemaKind,
    definition: &'static str,
}

const BUILTINS: &[Builtin] = &[
    Builtin {
        filename: "fmu_results.json",
        version: "0.9.0",
        kind: SchemaKind::Metadata,
        definition: "results.json",
    },
    Builtin {
        filename: "inplace_volumes.json",
        version: "1.0.0",
        kind: SchemaKind::FileFormat,
        definition: "inplace_volumes.json",
    },
];

/// Parse an embedded definition body by file name
pub fn definition(name: &str) -> Result<Value> {
    let contents = DEFINITIONS
        .get_file(name)
        .and_then(|f| f.contents_utf8())
        .ok_or_else(|| SchemaError::UnknownDefinition(name.to_string()))?;
    Ok(serde_json::from_str(contents)?)
}

/// Every shipped schema, in publication order
pub fn registry() -> Result<SchemaRegistry> {
    let mut schemas: Vec<Box<dyn SchemaDescriptor>> = Vec::with_capacity(BUILTINS.len());
    for builtin in BUILTINS {
        let body = definition(builtin.definition)?;
        schemas.push(Box::new(JsonSchemaDescriptor::new(
            builtin.filename,
            builtin.version,
            builtin.kind,
            body,
        )?));
    }
    SchemaRegistry::new(schemas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Deployment;

    #[test]
    fn builtin_registry_loads() {
        let registry = registry().unwrap();
        assert_eq!(registry.len(), BUILTINS.len());
        let results = registry.get("fmu_results.json").unwrap();
        assert_eq!(
            results.path(),
            std::path::Path::new("schemas/0.9.0/fmu_results.json")
        );
    }

    #[test]
    fn unknown_definition_is_an_error() {
        assert!(matches!(
            definition("missing.json"),
            Err(SchemaError::UnknownDefinition(_))
        ));
    }

    #[test]
    fn product_link_points_at_file_format_schema() {
        let registry = registry().unwrap();
        let deployment = Deployment::release();
        let results = registry.get("fmu_results.json").unwrap().dump(&deployment);
        let volumes = registry.get("inplace_volumes.json").unwrap();

        let default = &results["$defs"]["InplaceVolumesProduct"]["properties"]["file_schema"]
            ["default"];
        assert_eq!(default["url"], volumes.url(&deployment));
        assert!(results["$defs"]["Product"]["discriminator"]
            .get("mapping")
            .is_none());
    }
}
