//! tenantmgrd - Network Tenant Service Manager
//!
//! Entry point for the tenantmgrd command.
//!
//! - `plan` reads a tenant snapshot and prints the VRF plan
//! - `test` reads a tenant snapshot and an observed-state snapshot and
//!   prints the test action result
//!
//! Exit codes: 0 on success, 1 when the test reported findings, 2 when
//! devices could not be reached, 3 for an invalid request (model,
//! configuration or input files), 4 for any other error.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;
use tracing_subscriber::EnvFilter;

use netfabric_common::config::DEFAULT_CONFIG_PATH;
use netfabric_common::error::exit_code;
use netfabric_common::{EngineConfig, FabricError, ServiceMgr};
use netfabric_tenantmgrd::{TenantMgr, TenantSnapshot};
use netfabric_types::ObservedDeviceState;
use netfabric_verify::StaticStateSource;

/// Network tenant service manager
#[derive(Parser, Debug)]
#[command(name = "tenantmgrd")]
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
    /// Print the VRF plan of a tenant
    Plan {
        /// Tenant snapshot: `{"tenant": ..., "fabric": ...}` (JSON)
        #[arg(short = 't', long)]
        tenant: PathBuf,
    },
    /// Verify the tenant's layer-3 state on the layer-3 switch-pair
    Test {
        /// Tenant snapshot (JSON)
        #[arg(short = 't', long)]
        tenant: PathBuf,

        /// Observed device state snapshot (JSON list)
        #[arg(short = 'o', long)]
        observed: PathBuf,
    },
}

/// Initializes tracing/logging subsystem
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("netfabric={level},tenantmgrd={level}")));
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
    let mgr = TenantMgr::new(config.verification);

    match args.command {
        Command::Plan { tenant } => {
            let snapshot: TenantSnapshot = read_json(&tenant)?;
            let ctx = mgr.context(&snapshot.tenant.name, &args.user);
            print_json(&mgr.create(&ctx, &snapshot).await?)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Test { tenant, observed } => {
            let snapshot: TenantSnapshot = read_json(&tenant)?;
            let observed: Vec<ObservedDeviceState> = read_json(&observed)?;
            let ctx = mgr.context(&snapshot.tenant.name, &args.user);

            let output = mgr
                .test(&ctx, &snapshot, &StaticStateSource::new(observed))
                .await?;
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
