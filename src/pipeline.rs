//! Per-schema write decision
//!
//! ```text
//! generate ─► load ─┬─ no artifact ──────────────────────────────► write ─► Updated
//!                   ├─ malformed ── force? ─ yes ────────────────► write ─► Updated
//!                   │                      └ no ─────────────────────────► Failed
//!                   └─ exists ── identical? ─ yes ───────────────────────► Unchanged
//!                                          └ no ── force? ─ yes ─► write ─► Updated
//!                                                         └ no ── equivalent? ─ no ─► Failed
//!                                                                 └ release and $id differs ─► Failed
//!                                                                 └ otherwise ───► write ─► Updated
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use crate::checksum::Checksum;
use crate::context::Deployment;
use crate::diff::DiffReporter;
use crate::equivalence::EquivalenceChecker;
use crate::error::Result;
use crate::normalize::identifier;
use crate::schema::SchemaDescriptor;
use crate::version::SchemaVersion;
use crate::writer::{to_canonical_string, ArtifactState, ArtifactWriter, WriteResult};

/// Result of processing one schema, and of a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Unchanged,
    Updated,
    Failed,
}

impl Outcome {
    /// `Failed` if anything failed, else `Updated` if anything changed,
    /// else `Unchanged`.
    pub fn aggregate(outcomes: impl IntoIterator<Item = Outcome>) -> Outcome {
        outcomes
            .into_iter()
            .fold(Outcome::Unchanged, |acc, outcome| match (acc, outcome) {
                (Outcome::Failed, _) | (_, Outcome::Failed) => Outcome::Failed,
                (Outcome::Updated, _) | (_, Outcome::Updated) => Outcome::Updated,
                _ => Outcome::Unchanged,
            })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Unchanged => write!(f, "unchanged"),
            Outcome::Updated => write!(f, "updated"),
            Outcome::Failed => write!(f, "FAILED"),
        }
    }
}

/// Why a schema failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The persisted artifact does not parse
    MalformedArtifact(String),
    /// Content changed but version and path did not
    ContentDrift,
    /// Content is stable but the published identifier would change
    IdentifierMismatch {
        existing: Option<String>,
        generated: String,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MalformedArtifact(error) => {
                write!(f, "existing artifact is not a valid document: {error}")
            }
            FailureReason::ContentDrift => {
                write!(f, "content changed without a version bump")
            }
            FailureReason::IdentifierMismatch {
                existing,
                generated,
            } => write!(
                f,
                "identifier would change from {} to {generated}",
                existing.as_deref().unwrap_or("<none>")
            ),
        }
    }
}

/// Everything known about one schema after processing
#[derive(Debug, Clone)]
pub struct SchemaReport {
    pub filename: String,
    pub version: SchemaVersion,
    pub path: PathBuf,
    pub url: String,
    pub outcome: Outcome,
    pub failure: Option<FailureReason>,
    pub checksum: Checksum,
    pub dry_run: bool,
    pub diff: Option<String>,
}

impl fmt::Display for SchemaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.outcome {
            Outcome::Unchanged => "✅",
            Outcome::Updated => "📝",
            Outcome::Failed => "❌",
        };
        write!(
            f,
            "{marker} {} {}: {}",
            self.filename, self.version, self.outcome
        )?;
        if self.dry_run && self.outcome == Outcome::Updated {
            write!(f, " (dry run, not written)")?;
        }
        if let Some(reason) = &self.failure {
            write!(f, ": {reason}")?;
        }
        write!(f, " [{} {}]", self.path.display(), self.checksum.short())
    }
}

/// Applies the write decision to one descriptor at a time
pub struct Pipeline {
    deployment: Deployment,
    writer: ArtifactWriter,
    checker: EquivalenceChecker,
    reporter: Option<Box<dyn DiffReporter>>,
    force: bool,
}

impl Pipeline {
    pub fn new(deployment: Deployment, writer: ArtifactWriter) -> Self {
        let checker = EquivalenceChecker::new(deployment.urls.clone());
        Self {
            deployment,
            writer,
            checker,
            reporter: None,
            force: false,
        }
    }

    /// Overwrite drifted, mismatched and malformed artifacts
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Render a diff for every write and failure
    pub fn with_reporter(mut self, reporter: Box<dyn DiffReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    pub fn writer(&self) -> &ArtifactWriter {
        &self.writer
    }

    /// Decide and apply the outcome for one schema.
    ///
    /// Policy failures come back as a `Failed` report; `Err` is reserved
    /// for filesystem problems that must abort the run.
    pub fn process(&self, schema: &dyn SchemaDescriptor) -> Result<SchemaReport> {
        let generated = schema.dump(&self.deployment);
        let text = to_canonical_string(&generated)?;
        let checksum = Checksum::of_text(&text);
        let url = schema.url(&self.deployment);

        let mut report = SchemaReport {
            filename: schema.filename().to_string(),
            version: schema.version().clone(),
            path: schema.path().to_path_buf(),
            url: url.clone(),
            outcome: Outcome::Unchanged,
            failure: None,
            checksum: checksum.clone(),
            dry_run: self.writer.is_dry_run(),
            diff: None,
        };

        let previous = match self.writer.load(schema.path())? {
            ArtifactState::NoExistingArtifact => {
                tracing::debug!("{}: no existing artifact", report.filename);
                String::new()
            }
            ArtifactState::MalformedExistingArtifact { error, text: previous } => {
                if !self.force {
                    let reason = FailureReason::MalformedArtifact(error);
                    return Ok(self.fail(report, reason, &previous, &text));
                }
                tracing::warn!(
                    "{}: overwriting malformed artifact ({error})",
                    report.filename
                );
                previous
            }
            ArtifactState::ArtifactExists { document, text: previous } => {
                let existing_checksum = Checksum::of_text(&to_canonical_string(&document)?);
                tracing::debug!(
                    "{}: existing {} generated {}",
                    report.filename,
                    existing_checksum.short(),
                    checksum.short()
                );
                if existing_checksum == checksum {
                    tracing::info!("{}: unchanged", report.filename);
                    return Ok(report);
                }

                if !self.force {
                    let context = self.deployment.context;
                    if !self.checker.equivalent(&document, &generated, context, &url) {
                        let reason = FailureReason::ContentDrift;
                        return Ok(self.fail(report, reason, &previous, &text));
                    }
                    if context.is_release()
                        && !self.checker.identifier_matches(&document, &generated)
                    {
                        let reason = FailureReason::IdentifierMismatch {
                            existing: identifier(&document).map(str::to_string),
                            generated: url.clone(),
                        };
                        return Ok(self.fail(report, reason, &previous, &text));
                    }
                }
                previous
            }
        };

        match self.writer.write(schema.path(), &text)? {
            WriteResult::Written { path } => {
                tracing::info!("{}: updated {}", report.filename, path.display())
            }
            WriteResult::WouldWrite { path } => {
                tracing::info!("{}: would update {}", report.filename, path.display())
            }
        }
        report.outcome = Outcome::Updated;
        report.diff = self.render_diff(schema.path(), &previous, &text);
        Ok(report)
    }

    fn fail(
        &self,
        mut report: SchemaReport,
        reason: FailureReason,
        previous: &str,
        generated: &str,
    ) -> SchemaReport {
        tracing::info!("{}: failed: {reason}", report.filename);
        report.outcome = Outcome::Failed;
        report.failure = Some(reason);
        report.diff = self.render_diff(&report.path, previous, generated);
        report
    }

    fn render_diff(&self, relative: &Path, previous: &str, generated: &str) -> Option<String> {
        let reporter = self.reporter.as_ref()?;
        let target = self.writer.target(relative);
        match reporter.render(&target, previous, generated) {
            Ok(diff) => diff,
            Err(e) => {
                tracing::warn!("could not render diff for {}: {e}", target.display());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_prefers_failure_then_update() {
        use Outcome::*;
        assert_eq!(Outcome::aggregate(std::iter::empty()), Unchanged);
        assert_eq!(Outcome::aggregate([Unchanged, Unchanged]), Unchanged);
        assert_eq!(Outcome::aggregate([Unchanged, Updated]), Updated);
        assert_eq!(Outcome::aggregate([Updated, Failed, Unchanged]), Failed);
        assert_eq!(Outcome::aggregate([Failed, Updated]), Failed);
    }

    #[test]
    fn status_line_names_schema_version_and_reason() {
        let report = SchemaReport {
            filename: "widget.schema.json".to_string(),
            version: SchemaVersion::new(1, 0, 0),
            path: PathBuf::from("schemas/1.0.0/widget.schema.json"),
            url: "https://x/schemas/1.0.0/widget.schema.json".to_string(),
            outcome: Outcome::Failed,
            failure: Some(FailureReason::ContentDrift),
            checksum: Checksum::of_text(""),
            dry_run: false,
            diff: None,
        };
        let line = report.to_string();
        assert!(line.contains("widget.schema.json v1.0.0: FAILED"));
        assert!(line.contains("without a version bump"));
        assert!(line.ends_with(&format!(
            "[schemas/1.0.0/widget.schema.json {}]",
            Checksum::of_text("").short()
        )));
    }
}
