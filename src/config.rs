//! Configuration for schema generation
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (schemas.toml)
//! - Environment variables (SCHEMAS__*)
//!
//! The deployment context is not configurable: only `--prod` selects it.
//!
//! ## Example config file (schemas.toml):
//! ```toml
//! [output]
//! root = "."
//!
//! [urls]
//! dev = "https://main-fmu-schemas-dev.radix.equinor.com"
//! prod = "https://main-fmu-schemas-prod.radix.equinor.com"
//!
//! [diff]
//! strategy = "git"
//!
//! [sync]
//! command = ["sh", "tools/update-examples.sh"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

use crate::context::SchemaUrls;
use crate::diff::DiffStrategy;
use crate::error::Result;
use crate::sync::{CommandSync, FixtureRefresh, FixtureSync, NoSync};

/// Main configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaConfig {
    /// Where artifacts are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Base URLs per deployment context
    #[serde(default)]
    pub urls: SchemaUrls,

    /// Diff rendering
    #[serde(default)]
    pub diff: DiffConfig,

    /// Downstream synchronization
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory artifact paths are relative to
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

/// Diff configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiffConfig {
    #[serde(default)]
    pub strategy: DiffStrategy,
}

/// Synchronization configuration. A command takes precedence over a
/// fixture directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncConfig {
    /// Command to run, as an argument vector
    #[serde(default)]
    pub command: Vec<String>,

    /// Directory of JSON fixtures to refresh in process
    #[serde(default)]
    pub fixtures: Option<PathBuf>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl SchemaConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, optionally adding a required file
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["schemas.toml", ".schemas.toml", "config/schemas.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("com", "equinor", "dataio-schemas")
        {
            let xdg_config = config_dir.config_dir().join("schemas.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // SCHEMAS__OUTPUT__ROOT=... and friends
        builder = builder.add_source(
            Environment::with_prefix("SCHEMAS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(" ")
                .with_list_parse_key("sync.command"),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects empty base URLs
    fn validate(&self) -> std::result::Result<(), ConfigError> {
        for (key, base) in [("urls.dev", &self.urls.dev), ("urls.prod", &self.urls.prod)] {
            if base.trim().trim_end_matches('/').is_empty() {
                return Err(ConfigError::Message(format!("{key} must not be empty")));
            }
        }
        Ok(())
    }

    /// Output root, resolved against the working directory
    pub fn output_root(&self) -> PathBuf {
        if self.output.root.is_absolute() {
            self.output.root.clone()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(&self.output.root)
        }
    }

    /// Synchronization step described by this configuration
    pub fn fixture_sync(&self) -> Box<dyn FixtureSync> {
        let root = self.output_root();
        if !self.sync.command.is_empty() {
            Box::new(CommandSync::new(self.sync.command.clone(), root))
        } else if let Some(dir) = &self.sync.fixtures {
            Box::new(FixtureRefresh::new(root.join(dir), self.urls.clone()))
        } else {
            Box::new(NoSync)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{DEV_URL, PROD_URL};
    use crate::error::SchemaError;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SchemaConfig::default();
        assert_eq!(config.output.root, PathBuf::from("."));
        assert_eq!(config.urls.dev, DEV_URL);
        assert_eq!(config.urls.prod, PROD_URL);
        assert_eq!(config.diff.strategy, DiffStrategy::Text);
        assert!(config.sync.command.is_empty());
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.toml");
        std::fs::write(&path, "[urls]\ndev = \"\"\n").unwrap();

        let err = SchemaConfig::load_from(path.to_str()).unwrap_err();
        assert!(matches!(err, SchemaError::Config(_)));
        assert!(err.to_string().contains("urls.dev must not be empty"), "{err}");
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[output]
root = "/srv/schemas"

[urls]
prod = "https://schemas.example.com"

[diff]
strategy = "git"

[sync]
command = ["make", "examples"]
"#,
        )
        .unwrap();

        let config = SchemaConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.output_root(), PathBuf::from("/srv/schemas"));
        assert_eq!(config.urls.prod, "https://schemas.example.com");
        assert_eq!(config.urls.dev, DEV_URL);
        assert_eq!(config.diff.strategy, DiffStrategy::Git);
        assert_eq!(config.sync.command, vec!["make", "examples"]);
        assert!(config.fixture_sync().describe().contains("make examples"));
    }

    #[test]
    fn test_fixture_directory_selects_refresh() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fixtures.toml");
        std::fs::write(&path, "[sync]\nfixtures = \"examples/metadata\"\n").unwrap();

        let loaded = SchemaConfig::load_from(path.to_str()).unwrap();
        assert_eq!(loaded.sync.fixtures, Some(PathBuf::from("examples/metadata")));
        assert!(loaded.fixture_sync().describe().contains("examples/metadata"));
    }
}
