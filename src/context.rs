//! Deployment contexts and the base URLs they embed in schema identifiers

use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Default base URL for development builds
pub const DEV_URL: &str = "https://main-fmu-schemas-dev.radix.equinor.com";

/// Default base URL for released schemas
pub const PROD_URL: &str = "https://main-fmu-schemas-prod.radix.equinor.com";

/// First path segment shared by every schema artifact, on disk and in URLs
pub const SCHEMAS_ROOT: &str = "schemas";

/// Which environment generated identifiers are published for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentContext {
    /// Provisional URLs; identifiers must match exactly between runs
    Development,
    /// Public URLs; identifier changes are rejected unless forced
    Release,
}

impl DeploymentContext {
    /// Context selected by the `--prod` flag
    pub fn from_release_flag(prod: bool) -> Self {
        if prod {
            Self::Release
        } else {
            Self::Development
        }
    }

    pub fn is_release(&self) -> bool {
        matches!(self, Self::Release)
    }
}

impl fmt::Display for DeploymentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Release => write!(f, "release"),
        }
    }
}

/// Base URLs for both deployment contexts
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaUrls {
    #[serde(default = "default_dev_url")]
    pub dev: String,
    #[serde(default = "default_prod_url")]
    pub prod: String,
}

fn default_dev_url() -> String {
    DEV_URL.to_string()
}

fn default_prod_url() -> String {
    PROD_URL.to_string()
}

impl Default for SchemaUrls {
    fn default() -> Self {
        Self {
            dev: default_dev_url(),
            prod: default_prod_url(),
        }
    }
}

impl SchemaUrls {
    /// Base URL for a context, without a trailing slash
    pub fn base(&self, context: DeploymentContext) -> &str {
        let base = match context {
            DeploymentContext::Development => &self.dev,
            DeploymentContext::Release => &self.prod,
        };
        base.trim_end_matches('/')
    }

    /// Fully qualified URL of a relative schema path
    pub fn resolve(&self, context: DeploymentContext, path: &Path) -> String {
        let relative = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{}", self.base(context), relative)
    }

    /// Whether a string points somewhere under either base URL. An empty
    /// base matches nothing.
    pub fn is_schema_url(&self, value: &str) -> bool {
        [self.dev.as_str(), self.prod.as_str()]
            .iter()
            .map(|base| base.trim_end_matches('/'))
            .filter(|base| !base.is_empty())
            .any(|base| {
                value
                    .strip_prefix(base)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            })
    }
}

/// Active context plus the URLs it resolves against, threaded from the CLI
/// down to every descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub context: DeploymentContext,
    pub urls: SchemaUrls,
}

impl Deployment {
    pub fn new(context: DeploymentContext, urls: SchemaUrls) -> Self {
        Self { context, urls }
    }

    pub fn development() -> Self {
        Self::new(DeploymentContext::Development, SchemaUrls::default())
    }

    pub fn release() -> Self {
        Self::new(DeploymentContext::Release, SchemaUrls::default())
    }

    /// Base URL identifiers are generated under
    pub fn base_url(&self) -> &str {
        self.urls.base(self.context)
    }

    /// Fully qualified URL of a relative schema path
    pub fn url_for(&self, path: &Path) -> String {
        self.urls.resolve(self.context, path)
    }
}
