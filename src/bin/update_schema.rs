//! Schema Update CLI
//!
//! Regenerates every schema artifact and refuses to overwrite one whose
//! content or published identifier changed without a version bump.
//!
//! Usage:
//!   update-schema            # development URLs
//!   update-schema --prod     # release URLs, identifier changes rejected
//!   update-schema --test     # decide everything, write nothing
//!   update-schema --force    # overwrite regardless
//!   update-schema --diff     # show what changed

use anyhow::Context;
use clap::Parser;
use dataio_schemas::{
    builtin, diff, ArtifactWriter, Deployment, DeploymentContext, Orchestrator, Outcome,
    Pipeline, SchemaConfig, SyncStatus,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "update-schema")]
#[command(about = "Regenerate versioned schema artifacts and check them for unversioned drift")]
struct Cli {
    /// Show a diff for every written or failed schema
    #[arg(long)]
    diff: bool,

    /// Generate for release: public URLs, identifier changes are errors
    #[arg(long)]
    prod: bool,

    /// Dry run: make every decision but write nothing
    #[arg(long)]
    test: bool,

    /// Overwrite drifted, mismatched or malformed artifacts
    #[arg(long)]
    force: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = SchemaConfig::load().context("loading schemas.toml")?;
    let context = DeploymentContext::from_release_flag(cli.prod);
    let deployment = Deployment::new(context, config.urls.clone());
    let root = config.output_root();

    println!("📦 Schema Update ({})", context);
    println!("   Base URL: {}", deployment.base_url());
    println!("   Output:   {}", root.display());
    if cli.test {
        println!("   Dry run: nothing will be written");
    }
    println!();

    let registry = builtin::registry().context("building schema registry")?;
    let mut pipeline =
        Pipeline::new(deployment, ArtifactWriter::new(&root, cli.test)).force(cli.force);
    if cli.diff {
        pipeline = pipeline.with_reporter(diff::reporter(config.diff.strategy, &root));
    }

    let orchestrator = Orchestrator::new(registry, pipeline).with_sync(config.fixture_sync());
    let summary = orchestrator.run(&mut std::io::stdout())?;

    println!();
    println!("📊 SUMMARY:");
    println!("   Unchanged: {}", summary.count(Outcome::Unchanged));
    println!("   Updated:   {}", summary.count(Outcome::Updated));
    println!("   Failed:    {}", summary.count(Outcome::Failed));

    match (&summary.outcome, &summary.sync) {
        (Outcome::Failed, _) => {
            eprintln!("\n❌ Schema changes need a version bump, or a re-run with --force");
        }
        (_, SyncStatus::Failed(e)) => {
            eprintln!("\n❌ Schemas updated but synchronization failed: {}", e);
        }
        (Outcome::Updated, SyncStatus::Skipped) => {
            eprintln!("\n⚠️  Schemas would change - run without --test to write them");
        }
        (Outcome::Updated, _) => {
            eprintln!("\n✅ Schemas updated");
        }
        (Outcome::Unchanged, _) => {
            eprintln!("\n✅ Schemas are up to date");
        }
    }

    Ok(summary.exit_code())
}
