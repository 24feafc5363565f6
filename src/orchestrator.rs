//! Runs the write decision over a whole registry
//!
//! Schemas are processed strictly in registry order so output is
//! deterministic. A schema that fails does not stop the others; a
//! filesystem error does.

use std::io::Write;
use std::path::Path;

use crate::error::{io_err, Result, SchemaError};
use crate::pipeline::{Outcome, Pipeline, SchemaReport};
use crate::registry::SchemaRegistry;
use crate::sync::{FixtureSync, NoSync};

/// What happened to the synchronization step
#[derive(Debug)]
pub enum SyncStatus {
    /// No schema changed
    NotNeeded,
    /// Some schema failed, so nothing downstream ran
    Blocked,
    /// Dry run: schemas would change but nothing was synchronized
    Skipped,
    Succeeded,
    Failed(SchemaError),
}

/// Result of a whole run
#[derive(Debug)]
pub struct RunSummary {
    pub reports: Vec<SchemaReport>,
    pub outcome: Outcome,
    pub sync: SyncStatus,
}

impl RunSummary {
    /// 0 on success, 1 if any schema failed, 2 if synchronization failed
    pub fn exit_code(&self) -> i32 {
        match (&self.outcome, &self.sync) {
            (Outcome::Failed, _) => 1,
            (_, SyncStatus::Failed(_)) => 2,
            _ => 0,
        }
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.reports.iter().filter(|r| r.outcome == outcome).count()
    }
}

/// Drives a [`Pipeline`] over every schema in a [`SchemaRegistry`]
pub struct Orchestrator {
    registry: SchemaRegistry,
    pipeline: Pipeline,
    sync: Box<dyn FixtureSync>,
}

impl Orchestrator {
    pub fn new(registry: SchemaRegistry, pipeline: Pipeline) -> Self {
        Self {
            registry,
            pipeline,
            sync: Box::new(NoSync),
        }
    }

    /// Step to run after at least one schema was updated
    pub fn with_sync(mut self, sync: Box<dyn FixtureSync>) -> Self {
        self.sync = sync;
        self
    }

    /// Process every schema, printing a status line (and diff, if one was
    /// rendered) for each to `out`.
    pub fn run(&self, out: &mut dyn Write) -> Result<RunSummary> {
        let out_err = |e: std::io::Error| io_err(Path::new("<output>"), e);
        tracing::info!(
            "processing {} schema(s) for {} at {}",
            self.registry.len(),
            self.pipeline.deployment().context,
            self.pipeline.writer().root().display()
        );

        let mut reports = Vec::with_capacity(self.registry.len());
        for schema in self.registry.iter() {
            let report = self.pipeline.process(schema)?;
            writeln!(out, "{report}").map_err(out_err)?;
            if let Some(diff) = &report.diff {
                write!(out, "{diff}").map_err(out_err)?;
                if !diff.ends_with('\n') {
                    writeln!(out).map_err(out_err)?;
                }
            }
            reports.push(report);
        }

        let outcome = Outcome::aggregate(reports.iter().map(|r| r.outcome));
        let sync = match outcome {
            Outcome::Unchanged => SyncStatus::NotNeeded,
            Outcome::Failed => SyncStatus::Blocked,
            Outcome::Updated if self.pipeline.writer().is_dry_run() => {
                tracing::info!("dry run: skipping {}", self.sync.describe());
                SyncStatus::Skipped
            }
            Outcome::Updated => {
                writeln!(out, "🔄 {}", self.sync.describe()).map_err(out_err)?;
                match self.sync.synchronize(&reports) {
                    Ok(()) => SyncStatus::Succeeded,
                    Err(e) => {
                        writeln!(out, "❌ synchronization failed: {e}").map_err(out_err)?;
                        SyncStatus::Failed(e)
                    }
                }
            }
        };

        Ok(RunSummary {
            reports,
            outcome,
            sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Deployment;
    use crate::schema::{JsonSchemaDescriptor, SchemaDescriptor, SchemaKind};
    use crate::writer::ArtifactWriter;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::TempDir;

    struct CountingSync {
        calls: Rc<Cell<usize>>,
        fail: bool,
    }

    impl FixtureSync for CountingSync {
        fn describe(&self) -> String {
            "counting".to_string()
        }

        fn synchronize(&self, _reports: &[SchemaReport]) -> Result<()> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(SchemaError::Sync {
                    command: "counting".to_string(),
                    status: "exit status: 1".to_string(),
                    output: "boom".to_string(),
                });
            }
            Ok(())
        }
    }

    fn registry(bodies: &[(&str, serde_json::Value)]) -> SchemaRegistry {
        let schemas = bodies
            .iter()
            .map(|(name, body)| {
                Box::new(
                    JsonSchemaDescriptor::new(*name, "1.0.0", SchemaKind::Metadata, body.clone())
                        .unwrap(),
                ) as Box<dyn SchemaDescriptor>
            })
            .collect();
        SchemaRegistry::new(schemas).unwrap()
    }

    fn orchestrator(root: &Path, fail_sync: bool, calls: Rc<Cell<usize>>) -> Orchestrator {
        let pipeline = Pipeline::new(Deployment::development(), ArtifactWriter::new(root, false));
        Orchestrator::new(
            registry(&[("a.json", json!({ "type": "object" })), ("b.json", json!({}))]),
            pipeline,
        )
        .with_sync(Box::new(CountingSync {
            calls,
            fail: fail_sync,
        }))
    }

    #[test]
    fn sync_runs_only_when_something_changed() {
        let tmp = TempDir::new().unwrap();
        let calls = Rc::new(Cell::new(0));
        let runner = orchestrator(tmp.path(), false, calls.clone());

        let mut out = Vec::new();
        let first = runner.run(&mut out).unwrap();
        assert_eq!(first.outcome, Outcome::Updated);
        assert_eq!(first.count(Outcome::Updated), 2);
        assert!(matches!(first.sync, SyncStatus::Succeeded));
        assert_eq!(calls.get(), 1);

        let second = runner.run(&mut Vec::new()).unwrap();
        assert_eq!(second.outcome, Outcome::Unchanged);
        assert!(matches!(second.sync, SyncStatus::NotNeeded));
        assert_eq!(second.exit_code(), 0);
        assert_eq!(calls.get(), 1);

        let printed = String::from_utf8(out).unwrap();
        let a = printed.find("a.json").unwrap();
        let b = printed.find("b.json").unwrap();
        assert!(a < b, "status lines follow registry order");
    }

    #[test]
    fn sync_failure_has_its_own_exit_code() {
        let tmp = TempDir::new().unwrap();
        let calls = Rc::new(Cell::new(0));
        let summary = orchestrator(tmp.path(), true, calls)
            .run(&mut Vec::new())
            .unwrap();
        assert_eq!(summary.outcome, Outcome::Updated);
        assert!(matches!(summary.sync, SyncStatus::Failed(_)));
        assert_eq!(summary.exit_code(), 2);
        assert!(tmp.path().join("schemas/1.0.0/a.json").exists());
    }

    #[test]
    fn failure_blocks_sync_and_continues_with_other_schemas() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("schemas/1.0.0")).unwrap();
        std::fs::write(tmp.path().join("schemas/1.0.0/a.json"), "not json").unwrap();

        let calls = Rc::new(Cell::new(0));
        let summary = orchestrator(tmp.path(), false, calls.clone())
            .run(&mut Vec::new())
            .unwrap();
        assert_eq!(summary.reports[0].outcome, Outcome::Failed);
        assert_eq!(summary.reports[1].outcome, Outcome::Updated);
        assert_eq!(summary.outcome, Outcome::Failed);
        assert!(matches!(summary.sync, SyncStatus::Blocked));
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(calls.get(), 0);
    }
}
