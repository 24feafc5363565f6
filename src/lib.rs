//! FMU Metadata Schemas
//!
//! Generates the versioned JSON Schema artifacts for the FMU metadata
//! format and guards them against unversioned change.
//!
//! ## Features
//!
//! - **Canonical Artifacts**: Sorted keys, fixed indentation, atomic writes
//! - **Drift Detection**: Content changes without a version bump fail the run
//! - **Identifier Pinning**: Release runs refuse to silently change a published `$id`
//! - **Two Deployments**: Development and release differ only in base URL
//! - **Fixture Sync**: Derived examples are regenerated once schemas change
//!
//! ## Layout
//!
//! ```text
//! schemas/
//! ├── 0.9.0/
//! │   └── fmu_results.json
//! └── file_formats/
//!     └── 1.0.0/
//!         └── inplace_volumes.json
//! ```

pub mod builtin;
pub mod checksum;
pub mod config;
pub mod context;
pub mod diff;
pub mod equivalence;
pub mod error;
pub mod generate;
pub mod normalize;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod schema;
pub mod sync;
pub mod version;
pub mod writer;

pub use checksum::Checksum;
pub use config::SchemaConfig;
pub use context::{Deployment, DeploymentContext, SchemaUrls};
pub use diff::{DiffReporter, DiffStrategy, GitDiff, TextDiff};
pub use equivalence::EquivalenceChecker;
pub use error::{Result, SchemaError};
pub use normalize::IdentifierNormalizer;
pub use orchestrator::{Orchestrator, RunSummary, SyncStatus};
pub use pipeline::{FailureReason, Outcome, Pipeline, SchemaReport};
pub use registry::SchemaRegistry;
pub use schema::{Document, JsonSchemaDescriptor, SchemaDescriptor, SchemaKind};
pub use sync::{CommandSync, FixtureRefresh, FixtureSync, NoSync};
pub use version::SchemaVersion;
pub use writer::{ArtifactState, ArtifactWriter, WriteResult};
