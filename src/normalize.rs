//! Identifier normalization
//!
//! Strips every field that only differs because of the base URL a document
//! was generated under, so documents from different contexts can be
//! compared for substance.

use serde_json::{Map, Value};

use crate::context::SchemaUrls;
use crate::schema::Document;

/// Self-reference identifier field
pub const ID_FIELD: &str = "$id";

/// Removes `$id` fields and fields holding schema URLs, at any depth
#[derive(Debug, Clone, Default)]
pub struct IdentifierNormalizer {
    urls: SchemaUrls,
}

impl IdentifierNormalizer {
    pub fn new(urls: SchemaUrls) -> Self {
        Self { urls }
    }

    /// Copy of `document` without identifier fields. A document without
    /// any is returned as is.
    pub fn normalize(&self, document: &Document) -> Document {
        match document {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(key, value)| !self.is_identifier(key, value))
                    .map(|(key, value)| (key.clone(), self.normalize(value)))
                    .collect::<Map<_, _>>(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.normalize(v)).collect()),
            scalar => scalar.clone(),
        }
    }

    fn is_identifier(&self, key: &str, value: &Value) -> bool {
        key == ID_FIELD || value.as_str().is_some_and(|s| self.urls.is_schema_url(s))
    }
}

/// The root `$id` of a document, if any
pub fn identifier(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}
