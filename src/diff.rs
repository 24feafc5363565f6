//! Human-readable diffs of artifact changes
//!
//! Diffs are a reporting aid only. A reporter that fails is logged by the
//! caller and never changes a schema's outcome.

use std::fs;
use std::path::{Path, PathBuf};

use git2::{DiffFormat, DiffOptions, Repository};
use serde::Deserialize;
use similar::TextDiff as LineDiff;

use crate::error::{io_err, Result, SchemaError};

/// Which reporter `--diff` uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStrategy {
    /// In-process unified diff
    #[default]
    Text,
    /// Working-tree diff of the artifact path from the enclosing git repository
    Git,
}

/// Renders the difference between a previous and a generated artifact
pub trait DiffReporter {
    /// `previous` is empty for new artifacts. Returns `None` when there is
    /// nothing to show.
    fn render(&self, target: &Path, previous: &str, generated: &str) -> Result<Option<String>>;
}

/// Unified line diff computed in process
#[derive(Debug, Clone, Default)]
pub struct TextDiff {
    root: PathBuf,
}

impl TextDiff {
    /// Headers are shown relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DiffReporter for TextDiff {
    fn render(&self, target: &Path, previous: &str, generated: &str) -> Result<Option<String>> {
        if previous == generated {
            return Ok(None);
        }
        let relative = target.strip_prefix(&self.root).unwrap_or(target);
        let old_header = format!("a/{}", relative.display());
        let new_header = format!("b/{}", relative.display());
        let unified = LineDiff::from_lines(previous, generated)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string();
        Ok(Some(unified))
    }
}

/// Diff of the artifact path between the git index and the working tree.
///
/// Artifacts that were not written show no working-tree change; those fall
/// back to an in-process diff so a failed schema still gets a report.
#[derive(Debug, Clone)]
pub struct GitDiff {
    root: PathBuf,
}

impl GitDiff {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn working_tree_diff(&self, target: &Path) -> Result<String> {
        let repo = Repository::discover(&self.root)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| SchemaError::Diff("repository has no working tree".to_string()))?;
        let workdir = fs::canonicalize(workdir).map_err(|e| io_err(workdir, e))?;
        let target = canonical_target(target)?;
        let pathspec = target.strip_prefix(&workdir).map_err(|_| {
            SchemaError::Diff(format!(
                "{} is outside the repository at {}",
                target.display(),
                workdir.display()
            ))
        })?;

        let mut opts = DiffOptions::new();
        opts.pathspec(pathspec)
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);
        let diff = repo.diff_index_to_workdir(None, Some(&mut opts))?;

        let mut patch = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                patch.push(line.origin());
            }
            patch.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(patch)
    }
}

/// Canonicalize a target that may not exist yet through its parent.
fn canonical_target(target: &Path) -> Result<PathBuf> {
    if let Ok(path) = fs::canonicalize(target) {
        return Ok(path);
    }
    match (target.parent(), target.file_name()) {
        (Some(parent), Some(name)) => Ok(canonical_target(parent)?.join(name)),
        _ => Err(SchemaError::Diff(format!(
            "cannot resolve {}",
            target.display()
        ))),
    }
}

impl DiffReporter for GitDiff {
    fn render(&self, target: &Path, previous: &str, generated: &str) -> Result<Option<String>> {
        let patch = self.working_tree_diff(target)?;
        if patch.is_empty() {
            return TextDiff::new(&self.root).render(target, previous, generated);
        }
        Ok(Some(patch))
    }
}

/// Reporter for a strategy, rooted at the artifact root
pub fn reporter(strategy: DiffStrategy, root: &Path) -> Box<dyn DiffReporter> {
    match strategy {
        DiffStrategy::Text => Box::new(TextDiff::new(root)),
        DiffStrategy::Git => Box::new(GitDiff::new(root)),
    }
}
