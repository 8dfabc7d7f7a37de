//! Commands acting on individual instruments.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use labsync_id::DeviceId;
use labsync_model::identity::external_serial;
use labsync_model::{InstrumentStatus, InstrumentType, ResultSet};
use labsync_remote::DeviceService;

use crate::output::{print_info, print_single, print_success, OutputFormat};

use super::{read_json_file, CommandContext};

#[derive(Debug, Args)]
pub struct EnsureCommand {
    /// Management-service instrument type (e.g. UrineAnalyzer).
    instrument_type: InstrumentType,

    /// Always create a new instrument instead of reusing an operable one.
    #[arg(long)]
    fresh: bool,
}

impl EnsureCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let harness = ctx.harness()?;

        let record = if self.fresh {
            harness.create_instrument(self.instrument_type).await?
        } else {
            harness.ensure_instrument_of_type(self.instrument_type).await?
        };

        match ctx.format {
            OutputFormat::Table => print_success(&format!(
                "{} {} is ready (serial {})",
                self.instrument_type,
                record.id,
                external_serial(&record)
            )),
            OutputFormat::Json => print_single(&record),
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct StageCommand {
    /// Device-service instrument id (`dev:12` or `12`).
    device: DeviceId,

    /// JSON file holding the result set.
    file: PathBuf,
}

impl StageCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let results: ResultSet = read_json_file(&self.file)?;
        let harness = ctx.harness()?;

        harness.stage_results(self.device, &results).await?;

        print_success(&format!(
            "Staged {} result(s) for the next run on {}",
            results.results.len(),
            self.device
        ));
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct FaultCommand {
    /// Device-service instrument id (`dev:12` or `12`).
    device: DeviceId,

    /// JSON file holding the fault payload.
    payload: PathBuf,

    /// Wait until the management service reports the instrument in alert.
    #[arg(long)]
    wait: bool,
}

impl FaultCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let payload: serde_json::Value = read_json_file(&self.payload)?;
        let harness = ctx.harness()?;

        harness.inject_fault(self.device, &payload).await?;
        print_success(&format!("Fault injected into {}", self.device));

        if self.wait {
            print_info("Waiting for the management service to report the alert");
            let record = harness.devices().get_instrument(self.device).await?;
            let status = harness
                .wait_for_status(&record, InstrumentStatus::Alert)
                .await?;
            print_success(&format!(
                "{} reports {}",
                status.instrument_id(),
                status.instrument_status
            ));
        }
        Ok(())
    }
}
