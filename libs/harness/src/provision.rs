//! Instrument lifecycle provisioning.
//!
//! `Absent -> Provisioning -> (PendingApproval ->)? Ready`
//!
//! The fast path reuses an instrument the management service already reports
//! connected, whatever its status. The slow path creates one in the device service and waits for
//! the management service to report it connected and Ready.

use labsync_id::{DeviceId, InstrumentId};
use labsync_model::identity::{
    device_type_name, external_serial, find_device_for_status, find_pending, find_status,
    management_type,
};
use labsync_model::{DeviceRecord, ExternalSerial, InstrumentType, StatusScope};
use labsync_reconcile::poll_until;
use labsync_remote::{DeviceService, ManagementService, RemoteError};
use tracing::{debug, info, instrument, warn};

use crate::error::HarnessResult;
use crate::Harness;

/// Where an instrument is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Absent,
    Provisioning,
    PendingApproval,
    Ready,
}

impl std::fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProvisionState::Absent => "absent",
            ProvisionState::Provisioning => "provisioning",
            ProvisionState::PendingApproval => "pending_approval",
            ProvisionState::Ready => "ready",
        };
        f.write_str(s)
    }
}

fn transition(instrument_type: InstrumentType, from: ProvisionState, to: ProvisionState) {
    info!(
        instrument_type = %instrument_type,
        from = %from,
        to = %to,
        "Provision state changed"
    );
}

/// How the approval wait ended.
enum Approval {
    /// The serial showed up in the pending list.
    Pending(InstrumentId),
    /// The instrument became operable without ever being listed as pending.
    AlreadyOperable,
}

impl<D, M> Harness<D, M>
where
    D: DeviceService,
    M: ManagementService,
{
    /// Return a connected instrument of the given type, creating one if none
    /// exists.
    #[instrument(skip_all, fields(instrument_type = %instrument_type))]
    pub async fn ensure_instrument_of_type(
        &self,
        instrument_type: InstrumentType,
    ) -> HarnessResult<DeviceRecord> {
        if let Some(record) = self.find_connected(instrument_type).await? {
            info!(
                device_id = %record.id,
                serial = %external_serial(&record),
                "Reusing connected instrument"
            );
            return Ok(record);
        }

        self.create_instrument(instrument_type).await
    }

    /// Look for a connected instrument of the type that the device service
    /// also knows about. Its current status does not matter.
    async fn find_connected(
        &self,
        instrument_type: InstrumentType,
    ) -> HarnessResult<Option<DeviceRecord>> {
        let statuses = self
            .management
            .list_device_statuses(StatusScope::IncludePassthrough)
            .await?;

        let candidates: Vec<_> = statuses
            .iter()
            .filter(|s| s.instrument_type() == instrument_type && s.is_connected())
            .collect();
        if candidates.is_empty() {
            return Ok(None);
        }

        let devices = self
            .devices
            .list_instruments_of_type(device_type_name(instrument_type))
            .await?;

        for status in candidates {
            match find_device_for_status(&devices, status) {
                Some(record) => return Ok(Some(record.clone())),
                None => debug!(
                    serial = status.serial(),
                    "Operable instrument has no device-service record; skipping"
                ),
            }
        }
        Ok(None)
    }

    /// Create an instrument of the given type and wait until it is operable.
    ///
    /// Creation failures abort immediately and are not retried, and so does a
    /// created record whose type name is missing from the cross-reference
    /// table. Returns the device-service record as re-fetched after the
    /// instrument came up.
    pub async fn create_instrument(
        &self,
        instrument_type: InstrumentType,
    ) -> HarnessResult<DeviceRecord> {
        transition(
            instrument_type,
            ProvisionState::Absent,
            ProvisionState::Provisioning,
        );

        let created = self
            .devices
            .create_instrument(device_type_name(instrument_type))
            .await?;
        if let Some(name) = created.instrument_type.as_deref() {
            management_type(name)?;
        }
        let record = if created.has_serial() {
            created
        } else {
            self.await_serial(created.id).await?
        };

        let serial = external_serial(&record);
        info!(
            device_id = %record.id,
            serial = %serial,
            "Instrument created; waiting for management service"
        );

        if instrument_type.requires_approval() {
            self.await_approval(instrument_type, &serial).await?;
        }
        self.await_operable(instrument_type, &serial).await?;

        let record = self.devices.get_instrument(record.id).await?;
        transition(
            instrument_type,
            ProvisionState::Provisioning,
            ProvisionState::Ready,
        );
        Ok(record)
    }

    /// Re-fetch a record whose creation response came back without serials.
    async fn await_serial(&self, id: DeviceId) -> HarnessResult<DeviceRecord> {
        debug!(device_id = %id, "Creation response lacks serials; re-fetching");
        let devices = &self.devices;
        let record = poll_until(&format!("serial of {id}"), self.config.poll, || async move {
            let record = devices.get_instrument(id).await?;
            Ok::<_, RemoteError>(record.has_serial().then_some(record))
        })
        .await?;
        Ok(record)
    }

    /// Wait for the instrument to show up pending approval and approve it
    /// once.
    ///
    /// If it becomes operable first the handshake is skipped; in automated
    /// mode that is logged as a warning.
    async fn await_approval(
        &self,
        instrument_type: InstrumentType,
        serial: &ExternalSerial,
    ) -> HarnessResult<()> {
        let management = &self.management;
        let outcome = poll_until(
            &format!("{instrument_type} {serial} to await approval"),
            self.config.provision_poll,
            || async move {
                let statuses = management
                    .list_device_statuses(StatusScope::IncludePassthrough)
                    .await?;
                if find_status(&statuses, serial).is_some_and(|s| s.is_operable()) {
                    return Ok(Some(Approval::AlreadyOperable));
                }

                let pending = management.list_pending_approvals().await?;
                Ok::<_, RemoteError>(
                    find_pending(&pending, serial).map(|p| Approval::Pending(p.instrument.id)),
                )
            },
        )
        .await?;

        match outcome {
            Approval::Pending(id) => {
                transition(
                    instrument_type,
                    ProvisionState::Provisioning,
                    ProvisionState::PendingApproval,
                );
                self.management.approve_device(id).await?;
                info!(instrument_id = %id, serial = %serial, "Approved instrument");
                transition(
                    instrument_type,
                    ProvisionState::PendingApproval,
                    ProvisionState::Provisioning,
                );
            }
            Approval::AlreadyOperable if self.config.automated => {
                warn!(
                    instrument_type = %instrument_type,
                    serial = %serial,
                    "Instrument became operable without appearing in the pending-approval list"
                );
            }
            Approval::AlreadyOperable => {
                debug!(serial = %serial, "Instrument operable before approval was requested");
            }
        }
        Ok(())
    }

    /// Wait until the management service reports the serial operable.
    async fn await_operable(
        &self,
        instrument_type: InstrumentType,
        serial: &ExternalSerial,
    ) -> HarnessResult<()> {
        let management = &self.management;
        poll_until(
            &format!("{instrument_type} {serial} to become ready"),
            self.config.provision_poll,
            || async move {
                let statuses = management
                    .list_device_statuses(StatusScope::IncludePassthrough)
                    .await?;
                Ok::<_, RemoteError>(
                    find_status(&statuses, serial)
                        .filter(|s| s.is_operable())
                        .map(|_| ()),
                )
            },
        )
        .await?;
        Ok(())
    }
}
