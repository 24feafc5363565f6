//! Schema descriptors: what gets generated, and where it lives

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::context::{Deployment, SCHEMAS_ROOT};
use crate::error::{Result, SchemaError};
use crate::generate;
use crate::version::SchemaVersion;

/// A schema document: nested maps, sequences and scalars.
///
/// Maps compare key-by-key regardless of order; sequences compare in order.
pub type Document = Value;

/// Kind of schema, which decides where its artifact is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    /// The metadata format itself
    Metadata,
    /// The on-disk format of a data product
    FileFormat,
}

impl SchemaKind {
    /// Directory under the schemas root for this kind
    pub fn dir_name(&self) -> Option<&'static str> {
        match self {
            SchemaKind::Metadata => None,
            SchemaKind::FileFormat => Some("file_formats"),
        }
    }

    /// Default artifact path: `schemas/[kind/]<version>/<filename>`
    pub fn default_path(&self, version: &SchemaVersion, filename: &str) -> PathBuf {
        let mut path = PathBuf::from(SCHEMAS_ROOT);
        if let Some(dir) = self.dir_name() {
            path.push(dir);
        }
        path.push(version.version_string());
        path.push(filename);
        path
    }
}

/// Anything that can be rendered into a versioned schema artifact.
pub trait SchemaDescriptor {
    /// File name, unique within a registry
    fn filename(&self) -> &str;

    /// Version embedded in the document and in the artifact path
    fn version(&self) -> &SchemaVersion;

    /// Artifact location relative to the output root; also the URL path
    fn path(&self) -> &Path;

    /// Render the canonical document for a deployment
    fn dump(&self, deployment: &Deployment) -> Document;

    /// Self-reference identifier for a deployment
    fn url(&self, deployment: &Deployment) -> String {
        deployment.url_for(self.path())
    }
}

/// A JSON Schema rendered from a definition body
#[derive(Debug, Clone)]
pub struct JsonSchemaDescriptor {
    filename: String,
    version: SchemaVersion,
    path: PathBuf,
    body: Value,
}

impl JsonSchemaDescriptor {
    /// Create a descriptor laid out at the kind's default path
    pub fn new(
        filename: impl Into<String>,
        version: &str,
        kind: SchemaKind,
        body: Value,
    ) -> Result<Self> {
        let filename = filename.into();
        let version = SchemaVersion::parse(version).map_err(|e| SchemaError::InvalidDescriptor {
            filename: filename.clone(),
            reason: format!("invalid version {version:?}: {e}"),
        })?;
        let path = kind.default_path(&version, &filename);
        Ok(Self {
            filename,
            version,
            path,
            body,
        })
    }

    /// Override the artifact path
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }
}

impl SchemaDescriptor for JsonSchemaDescriptor {
    fn filename(&self) -> &str {
        &self.filename
    }

    fn version(&self) -> &SchemaVersion {
        &self.version
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn dump(&self, deployment: &Deployment) -> Document {
        generate::finalize(
            self.body.clone(),
            deployment,
            &self.url(deployment),
            &self.version.version_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DEV_URL, PROD_URL};
    use serde_json::json;

    fn widget() -> JsonSchemaDescriptor {
        JsonSchemaDescriptor::new(
            "widget.schema.json",
            "1.0.0",
            SchemaKind::Metadata,
            json!({ "type": "object", "properties": { "name": { "type": "string" } } }),
        )
        .unwrap()
    }

    #[test]
    fn default_paths_per_kind() {
        let v = SchemaVersion::new(1, 0, 0);
        assert_eq!(
            SchemaKind::Metadata.default_path(&v, "a.json"),
            PathBuf::from("schemas/1.0.0/a.json")
        );
        assert_eq!(
            SchemaKind::FileFormat.default_path(&v, "b.json"),
            PathBuf::from("schemas/file_formats/1.0.0/b.json")
        );
    }

    #[test]
    fn url_tracks_deployment() {
        let schema = widget();
        assert_eq!(
            schema.url(&Deployment::development()),
            format!("{DEV_URL}/schemas/1.0.0/widget.schema.json")
        );
        assert_eq!(
            schema.url(&Deployment::release()),
            format!("{PROD_URL}/schemas/1.0.0/widget.schema.json")
        );
    }

    #[test]
    fn dump_embeds_identifier_and_version() {
        let schema = widget();
        let doc = schema.dump(&Deployment::release());
        assert_eq!(doc["$id"], schema.url(&Deployment::release()));
        assert_eq!(doc["version"], "1.0.0");
        assert_eq!(doc["properties"]["name"]["type"], "string");
    }

    #[test]
    fn explicit_path_overrides_layout() {
        let schema = widget().with_path("schemas/widget.schema.json");
        assert_eq!(schema.path(), Path::new("schemas/widget.schema.json"));
    }

    #[test]
    fn rejects_bad_version() {
        let err = JsonSchemaDescriptor::new("x.json", "one", SchemaKind::Metadata, json!({}))
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDescriptor { .. }));
    }
}
