//! Read-only views of both services.

use anyhow::{Context, Result};
use clap::Args;
use labsync_model::identity::external_serial;
use labsync_model::{ConnectedDeviceStatus, DeviceRecord, InstrumentType, StatusScope};
use labsync_remote::{DeviceService, ManagementService};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{display_option, print_output};

use super::CommandContext;

#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Include the passthrough category (reported as disconnected).
    #[arg(long)]
    all: bool,
}

/// One row of the connected-device status view.
#[derive(Debug, Serialize, Tabled)]
struct StatusRow {
    #[tabled(rename = "ID")]
    id: String,

    #[tabled(rename = "Type")]
    instrument_type: InstrumentType,

    #[tabled(rename = "Serial")]
    serial: String,

    #[tabled(rename = "Connected")]
    connected: bool,

    #[tabled(rename = "Status")]
    status: String,

    #[tabled(rename = "Operable")]
    operable: bool,
}

impl From<&ConnectedDeviceStatus> for StatusRow {
    fn from(s: &ConnectedDeviceStatus) -> Self {
        Self {
            id: s.instrument_id().to_string(),
            instrument_type: s.instrument_type(),
            serial: s.serial().to_string(),
            connected: s.connected,
            status: s.instrument_status.to_string(),
            operable: s.is_operable(),
        }
    }
}

impl StatusCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let harness = ctx.harness()?;
        let scope = if self.all {
            StatusScope::IncludePassthrough
        } else {
            StatusScope::Standard
        };

        let statuses = harness
            .management()
            .list_device_statuses(scope)
            .await
            .context("Failed to list device status")?;

        let rows: Vec<StatusRow> = statuses.iter().map(StatusRow::from).collect();
        print_output(&rows, ctx.format);
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct DevicesCommand {
    /// Only list instruments of this management-service type.
    #[arg(long = "type")]
    instrument_type: Option<InstrumentType>,
}

/// One row of the device-service instrument view.
#[derive(Debug, Serialize, Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,

    #[tabled(rename = "Type", display = "display_option")]
    instrument_type: Option<String>,

    #[tabled(rename = "Main Unit", display = "display_option")]
    main_unit_serial: Option<String>,

    #[tabled(rename = "Serial")]
    serial: String,

    /// What the management service calls this instrument.
    #[tabled(rename = "External Serial")]
    external_serial: String,
}

impl From<&DeviceRecord> for DeviceRow {
    fn from(d: &DeviceRecord) -> Self {
        Self {
            id: d.id.to_string(),
            instrument_type: d.instrument_type.clone(),
            main_unit_serial: d.main_unit_serial_number.clone(),
            serial: d.instrument_serial_number.clone(),
            external_serial: external_serial(d).to_string(),
        }
    }
}

impl DevicesCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let harness = ctx.harness()?;

        let devices = match self.instrument_type {
            Some(t) => harness.instruments_of_type(t).await?,
            None => harness
                .devices()
                .list_instruments()
                .await
                .context("Failed to list instruments")?,
        };

        let rows: Vec<DeviceRow> = devices.iter().map(DeviceRow::from).collect();
        print_output(&rows, ctx.format);
        Ok(())
    }
}
