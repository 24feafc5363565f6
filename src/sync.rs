//! Downstream synchronization after schemas change
//!
//! Runs once per run, only when at least one schema was updated. A failure
//! here is fatal to the run but does not roll back artifacts already
//! written.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use walkdir::WalkDir;

use crate::context::SchemaUrls;
use crate::error::{io_err, Result, SchemaError};
use crate::pipeline::{Outcome, SchemaReport};
use crate::writer::to_canonical_string;

/// A step that regenerates artifacts derived from the schemas
pub trait FixtureSync {
    /// Short description for status output
    fn describe(&self) -> String;

    /// Bring derived artifacts in line with `reports`
    fn synchronize(&self, reports: &[SchemaReport]) -> Result<()>;
}

/// Nothing to synchronize
#[derive(Debug, Clone, Default)]
pub struct NoSync;

impl FixtureSync for NoSync {
    fn describe(&self) -> String {
        "no synchronization configured".to_string()
    }

    fn synchronize(&self, _reports: &[SchemaReport]) -> Result<()> {
        Ok(())
    }
}

/// Runs an external command, e.g. the project's example regeneration script
#[derive(Debug, Clone)]
pub struct CommandSync {
    argv: Vec<String>,
    cwd: PathBuf,
}

impl CommandSync {
    pub fn new(argv: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            argv,
            cwd: cwd.into(),
        }
    }

    fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

impl FixtureSync for CommandSync {
    fn describe(&self) -> String {
        format!("running `{}`", self.command_line())
    }

    fn synchronize(&self, _reports: &[SchemaReport]) -> Result<()> {
        let (program, args) = self.argv.split_first().ok_or_else(|| SchemaError::Sync {
            command: String::new(),
            status: "not started".to_string(),
            output: "empty sync command".to_string(),
        })?;

        tracing::info!("sync: {}", self.command_line());
        let output = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .output()
            .map_err(|e| SchemaError::Sync {
                command: self.command_line(),
                status: "not started".to_string(),
                output: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Err(SchemaError::Sync {
            command: self.command_line(),
            status: output.status.to_string(),
            output: combined,
        })
    }
}

/// Rewrites JSON fixtures whose `$schema` points at an updated schema so
/// they reference the new URL and version.
#[derive(Debug, Clone)]
pub struct FixtureRefresh {
    dir: PathBuf,
    urls: SchemaUrls,
}

impl FixtureRefresh {
    pub fn new(dir: impl Into<PathBuf>, urls: SchemaUrls) -> Self {
        Self {
            dir: dir.into(),
            urls,
        }
    }

    /// The updated schema a fixture's `$schema` refers to, if any
    fn target<'r>(
        &self,
        fixture: &Value,
        updated: &[&'r SchemaReport],
    ) -> Option<&'r SchemaReport> {
        let reference = fixture.get("$schema")?.as_str()?;
        if !self.urls.is_schema_url(reference) {
            return None;
        }
        let name = reference.rsplit('/').next()?;
        updated.iter().copied().find(|r| r.filename == name)
    }

    fn refresh(&self, path: &Path, updated: &[&SchemaReport]) -> Result<bool> {
        let text = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let Ok(mut fixture) = serde_json::from_str::<Value>(&text) else {
            tracing::debug!("sync: skipping non-JSON fixture {}", path.display());
            return Ok(false);
        };
        let Some(report) = self.target(&fixture, updated) else {
            return Ok(false);
        };

        let original = fixture.clone();
        if let Some(map) = fixture.as_object_mut() {
            map.insert("$schema".to_string(), Value::String(report.url.clone()));
            if map.contains_key("version") {
                map.insert(
                    "version".to_string(),
                    Value::String(report.version.version_string()),
                );
            }
        }
        if fixture == original {
            return Ok(false);
        }

        fs::write(path, to_canonical_string(&fixture)?).map_err(|e| io_err(path, e))?;
        tracing::info!("sync: refreshed {}", path.display());
        Ok(true)
    }
}

impl FixtureSync for FixtureRefresh {
    fn describe(&self) -> String {
        format!("refreshing fixtures in {}", self.dir.display())
    }

    fn synchronize(&self, reports: &[SchemaReport]) -> Result<()> {
        let updated: Vec<&SchemaReport> = reports
            .iter()
            .filter(|r| r.outcome == Outcome::Updated)
            .collect();
        if !self.dir.is_dir() {
            return Err(SchemaError::NotADirectory(self.dir.clone()));
        }

        let mut refreshed = 0usize;
        for entry in WalkDir::new(&self.dir).sort_by_file_name() {
            let entry = entry.map_err(|e| SchemaError::Sync {
                command: self.describe(),
                status: "walk failed".to_string(),
                output: e.to_string(),
            })?;
            let path = entry.path();
            let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
            if !entry.file_type().is_file() || !is_json {
                continue;
            }
            if self.refresh(path, &updated)? {
                refreshed += 1;
            }
        }
        tracing::info!("sync: {refreshed} fixture(s) refreshed");
        Ok(())
    }
}
