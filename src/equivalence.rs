//! Equivalence between a persisted artifact and a freshly generated one

use serde_json::Value;

use crate::context::{DeploymentContext, SchemaUrls};
use crate::normalize::{identifier, IdentifierNormalizer, ID_FIELD};
use crate::schema::Document;

/// Decides whether regenerating a schema changed its substance
#[derive(Debug, Clone, Default)]
pub struct EquivalenceChecker {
    normalizer: IdentifierNormalizer,
}

impl EquivalenceChecker {
    pub fn new(urls: SchemaUrls) -> Self {
        Self {
            normalizer: IdentifierNormalizer::new(urls),
        }
    }

    /// Structural equality under the context's rules.
    ///
    /// Development compares verbatim. Release compares with identifier
    /// fields normalized away, the existing document taking
    /// `canonical_url` as its `$id` and the generated one keeping its own.
    pub fn equivalent(
        &self,
        existing: &Document,
        generated: &Document,
        context: DeploymentContext,
        canonical_url: &str,
    ) -> bool {
        match context {
            DeploymentContext::Development => existing == generated,
            DeploymentContext::Release => {
                let existing_norm =
                    with_identifier(self.normalizer.normalize(existing), Some(canonical_url));
                let generated_norm =
                    with_identifier(self.normalizer.normalize(generated), identifier(generated));
                existing_norm == generated_norm
            }
        }
    }

    /// Verbatim comparison of the root identifiers. Only meaningful in
    /// release mode once [`equivalent`](Self::equivalent) holds.
    pub fn identifier_matches(&self, existing: &Document, generated: &Document) -> bool {
        identifier(existing) == identifier(generated)
    }
}

fn with_identifier(document: Document, id: Option<&str>) -> Document {
    match (document, id) {
        (Value::Object(mut map), Some(id)) => {
            map.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            Value::Object(map)
        }
        (document, _) => document,
    }
}
