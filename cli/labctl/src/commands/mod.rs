//! CLI commands.

mod environment;
mod instruments;
mod settings;
mod status;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use labsync_harness::{Harness, HarnessConfig};
use labsync_remote::{DeviceServiceClient, ManagementServiceClient};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::CliError;
use crate::output::OutputFormat;

/// labctl - keep the device and management services in step for testing.
#[derive(Debug, Parser)]
#[command(name = "labctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Device service base URL.
    #[arg(long, global = true, env = "LABSYNC_DEVICE_SERVICE_URL")]
    device_url: Option<String>,

    /// Management service base URL.
    #[arg(long, global = true, env = "LABSYNC_MANAGEMENT_SERVICE_URL")]
    management_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show connected-device status as the management service reports it.
    Status(status::StatusCommand),

    /// List simulated instruments in the device service.
    Devices(status::DevicesCommand),

    /// Return an operable instrument of a type, creating one if needed.
    Ensure(instruments::EnsureCommand),

    /// Tear down every simulated instrument and wait for convergence.
    Reset,

    /// Cancel running lab requests and release their instruments.
    CancelRuns,

    /// Stage the results the next run on an instrument returns.
    Stage(instruments::StageCommand),

    /// Inject a fault into a simulated instrument.
    Fault(instruments::FaultCommand),

    /// Turn a management-service feature flag on or off.
    Flag(settings::FlagCommand),

    /// Register QC lot barcodes for an instrument type.
    Qc(settings::QcCommand),

    /// Show CLI version.
    Version,
}

impl Cli {
    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        if let Commands::Version = self.command {
            println!("labctl {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }

        let config = Config::load()?;
        crate::logging::init(&config.log_level);

        let ctx = CommandContext {
            config,
            format: self.format,
            device_url: self.device_url,
            management_url: self.management_url,
        };

        match self.command {
            Commands::Status(cmd) => cmd.run(ctx).await,
            Commands::Devices(cmd) => cmd.run(ctx).await,
            Commands::Ensure(cmd) => cmd.run(ctx).await,
            Commands::Reset => environment::reset(ctx).await,
            Commands::CancelRuns => environment::cancel_runs(ctx).await,
            Commands::Stage(cmd) => cmd.run(ctx).await,
            Commands::Fault(cmd) => cmd.run(ctx).await,
            Commands::Flag(cmd) => cmd.run(ctx).await,
            Commands::Qc(cmd) => cmd.run(ctx).await,
            Commands::Version => Ok(()),
        }
    }
}

/// Shared command context.
pub struct CommandContext {
    pub config: Config,
    pub format: OutputFormat,
    pub device_url: Option<String>,
    pub management_url: Option<String>,
}

impl CommandContext {
    /// Build a harness over the configured endpoints.
    pub fn harness(&self) -> Result<Harness<DeviceServiceClient, ManagementServiceClient>> {
        let remote = self
            .config
            .remote_config(self.device_url.clone(), self.management_url.clone())?;
        debug!(
            device_service = %remote.device_service_url,
            management_service = %remote.management_service_url,
            "Connecting"
        );
        Harness::connect(&remote, HarnessConfig::from_env()?)
    }
}

/// Read and parse a JSON file argument.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CliError::ParseFile {
        path: path.to_path_buf(),
        source,
    })
}
