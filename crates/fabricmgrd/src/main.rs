//! fabricmgrd - Network Fabric Service Manager
//!
//! Entry point for the fabricmgrd command.
//!
//! - `plan` reads a fabric snapshot and prints the configuration plan
//! - `test` reads a fabric snapshot and an observed-state snapshot and
//!   prints the test action result
//!
//! Exit codes: 0 on success, 1 when the test reported findings, 2 when
//! devices could not be reached, 3 for an invalid request (model,
//! configuration or input files), 4 for any other error.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use netfabric_common::config::DEFAULT_CONFIG_PATH;
use netfabric_common::error::exit_code;
use netfabric_common::resolver::select_best_root_candidate;
use netfabric_common::{
    EngineConfig, FabricError, InMemoryIdAllocator, ReconciliationPlan, RootKind, ServiceMgr,
};
use netfabric_fabricmgrd::FabricMgr;
use netfabric_types::{FabricTopology, ObservedDeviceState, SpanningTreeRoot};
use netfabric_verify::StaticStateSource;

/// Network fabric service manager
#[derive(Parser, Debug)]
#[command(name = "fabricmgrd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// User the invocation runs as
    #[arg(short = 'u', long, default_value = "admin")]
    user: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the configuration plan of a fabric
    Plan {
        /// Fabric snapshot (JSON)
        #[arg(short = 'f', long)]
        fabric: PathBuf,

        /// Suggest a spanning-tree root when none is configured
        #[arg(long)]
        suggest_root: bool,
    },
    /// Verify live device state against a fabric
    Test {
        /// Fabric snapshot (JSON)
        #[arg(short = 'f', long)]
        fabric: PathBuf,

        /// Observed device state snapshot (JSON list)
        #[arg(short = 'o', long)]
        observed: PathBuf,
    },
}

#[derive(Serialize)]
struct PlanOutput {
    #[serde(flatten)]
    plan: ReconciliationPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggested_root: Option<SpanningTreeRoot>,
}

/// Initializes tracing/logging subsystem
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("netfabric={level},fabricmgrd={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = EngineConfig::load_or_default(&args.config)?;
    let mgr = FabricMgr::new(config, Arc::new(InMemoryIdAllocator::new()));

    match args.command {
        Command::Plan {
            fabric,
            suggest_root,
        } => {
            let fabric: FabricTopology = read_json(&fabric)?;
            let ctx = mgr.context(&fabric.name, &args.user);

            let suggested_root = if suggest_root && fabric.spanning_tree_root == SpanningTreeRoot::Unset {
                let candidate = select_best_root_candidate(&fabric);
                info!(parent: ctx.span(), candidate = ?candidate.bridge_name(), "suggested spanning-tree root");
                match (candidate.kind(), candidate.bridge_name()) {
                    (Some(RootKind::Pair), Some(name)) => Some(SpanningTreeRoot::SwitchPair(name.to_string())),
                    (Some(RootKind::Switch), Some(name)) => Some(SpanningTreeRoot::Switch(name.to_string())),
                    _ => None,
                }
            } else {
                None
            };

            let plan = mgr.create(&ctx, &fabric).await?;
            print_json(&PlanOutput {
                plan,
                suggested_root,
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Test { fabric, observed } => {
            let fabric: FabricTopology = read_json(&fabric)?;
            let observed: Vec<ObservedDeviceState> = read_json(&observed)?;
            let ctx = mgr.context(&fabric.name, &args.user);

            let output = mgr.test(&ctx, &fabric, &StaticStateSource::new(observed)).await?;
            print_json(&output)?;
            Ok(if output.success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(exit_code::FINDINGS)
            })
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            // Anything that is not a FabricError comes from reading the inputs
            ExitCode::from(
                e.downcast_ref::<FabricError>()
                    .map_or(exit_code::INVALID_REQUEST, FabricError::exit_code),
            )
        }
    }
}
