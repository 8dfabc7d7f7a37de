//! Management-service settings.

use anyhow::Result;
use clap::{ArgGroup, Args};
use labsync_model::InstrumentType;

use crate::output::{print_single, print_success, OutputFormat};

use super::CommandContext;

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("state").required(true).args(["on", "off"])))]
pub struct FlagCommand {
    /// Feature flag name.
    name: String,

    #[arg(long)]
    on: bool,

    #[arg(long)]
    off: bool,
}

impl FlagCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let enabled = self.on && !self.off;
        ctx.harness()?.set_feature_flag(&self.name, enabled).await?;

        let state = if enabled { "on" } else { "off" };
        print_success(&format!("Feature flag {} is {state}", self.name));
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct QcCommand {
    /// Management-service instrument type.
    instrument_type: InstrumentType,

    /// Lot barcodes; for leveled types the order gives levels 1, 2, ...
    #[arg(required = true)]
    barcodes: Vec<String>,
}

impl QcCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let request = ctx
            .harness()?
            .save_qc_barcodes(self.instrument_type, &self.barcodes)
            .await?;

        match ctx.format {
            OutputFormat::Json => print_single(&request),
            OutputFormat::Table => print_success(&format!(
                "Saved {} QC barcode(s) for {}",
                self.barcodes.len(),
                self.instrument_type
            )),
        }
        Ok(())
    }
}
