//! Stepped in-memory doubles of the two remote services.
//!
//! [`FakeLab`] implements both [`DeviceService`] and [`ManagementService`]
//! over one shared state, so a device created through one trait becomes
//! visible through the other the way the real services converge: not
//! immediately, but after a configurable number of status-list reads.
//! Every status-list read is one step of the simulated clock.
//!
//! Every call is recorded in a [`CallLog`], and individual calls can be made
//! to fail, so tests can assert exactly which remote calls an operation made.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use labsync_id::{DeviceId, InstrumentId, LabRequestId, RunId};
use labsync_model::identity::{device_type_name, external_serial, management_type};
use labsync_model::{
    ConnectedDeviceStatus, DeviceRecord, InstrumentRun, InstrumentStatus, InstrumentType,
    PendingApproval, PendingInstrument, QcBarcodeRequest, RunningLabRequest,
    StagedResultDocument, StatusInstrument, StatusScope,
};
use labsync_remote::{DeviceService, ManagementService, RemoteError, ServiceKind};

/// How an approval-requiring instrument behaves after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalBehavior {
    /// It waits in the pending-approval list until approved.
    #[default]
    PendingFirst,
    /// It reaches Ready without ever being listed as pending.
    ReadyWithoutPending,
}

/// Every remote call the fake has served, in order per kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallLog {
    pub creates: Vec<String>,
    pub gets: Vec<DeviceId>,
    pub deletes: Vec<DeviceId>,
    pub staged: Vec<DeviceId>,
    pub maintenance: Vec<(DeviceId, serde_json::Value)>,
    pub faults: Vec<(DeviceId, serde_json::Value)>,
    pub status_reads: u32,
    pub pending_reads: u32,
    pub approvals: Vec<InstrumentId>,
    pub stop_waiting: Vec<InstrumentId>,
    pub suppressions: Vec<InstrumentId>,
    pub cancels: Vec<RunId>,
    pub feature_flags: Vec<(String, bool)>,
    pub qc_requests: Vec<QcBarcodeRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Starting { reads_left: u32 },
    AwaitingApproval,
    Live,
    Stopping { reads_left: u32 },
    Gone,
}

#[derive(Debug, Clone)]
struct Unit {
    instrument_id: InstrumentId,
    instrument_type: InstrumentType,
    serial: String,
    device: Option<DeviceRecord>,
    status: Option<ConnectedDeviceStatus>,
    phase: Phase,
    approved: bool,
}

impl Unit {
    fn status_entry(&self, connected: bool, status: InstrumentStatus) -> ConnectedDeviceStatus {
        ConnectedDeviceStatus {
            instrument: StatusInstrument {
                id: self.instrument_id,
                instrument_type: self.instrument_type,
                instrument_serial_number: self.serial.clone(),
            },
            connected,
            instrument_status: status,
        }
    }

    fn go_live(&mut self) {
        let connected = !self.instrument_type.is_passthrough();
        self.status = Some(self.status_entry(connected, InstrumentStatus::Ready));
        self.phase = Phase::Live;
    }
}

#[derive(Debug, Default)]
struct Failures {
    creates: u32,
    status_reads: u32,
    deletes: HashSet<DeviceId>,
    stop_waiting: HashSet<InstrumentId>,
    suppress: HashSet<InstrumentId>,
    cancels: HashSet<RunId>,
}

#[derive(Debug)]
struct LabState {
    startup_reads: u32,
    shutdown_reads: u32,
    approval: ApprovalBehavior,
    partial_create_responses: bool,
    never_go_offline: bool,
    offline_stays_connected: bool,
    next_id: u64,
    units: Vec<Unit>,
    lab_requests: BTreeMap<LabRequestId, RunningLabRequest>,
    staged: HashMap<DeviceId, StagedResultDocument>,
    failures: Failures,
    calls: CallLog,
}

impl Default for LabState {
    fn default() -> Self {
        Self {
            startup_reads: 2,
            shutdown_reads: 1,
            approval: ApprovalBehavior::default(),
            partial_create_responses: false,
            never_go_offline: false,
            offline_stays_connected: false,
            next_id: 1,
            units: Vec::new(),
            lab_requests: BTreeMap::new(),
            staged: HashMap::new(),
            failures: Failures::default(),
            calls: CallLog::default(),
        }
    }
}

impl LabState {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Build a device record; chemistry analyzers are multi-unit hardware.
    fn new_device(&mut self, instrument_type: InstrumentType) -> DeviceRecord {
        let n = self.next_id();
        let (main_unit, serial) = match instrument_type {
            InstrumentType::ChemistryAnalyzer => (Some(format!("MU{n:03}")), format!("{n:04}")),
            _ => (None, format!("SN{n:05}")),
        };
        DeviceRecord {
            id: DeviceId::new(n),
            instrument_serial_number: serial,
            main_unit_serial_number: main_unit,
            instrument_type: Some(device_type_name(instrument_type).to_string()),
        }
    }

    fn unit_by_device(&mut self, id: DeviceId) -> Option<&mut Unit> {
        self.units
            .iter_mut()
            .find(|u| u.device.as_ref().is_some_and(|d| d.id == id))
    }

    fn unit_by_instrument(&mut self, id: InstrumentId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.instrument_id == id)
    }

    /// Advance every unit by one step.
    fn tick(&mut self) {
        let approval = self.approval;
        let never_go_offline = self.never_go_offline;
        let offline_stays_connected = self.offline_stays_connected;

        for unit in &mut self.units {
            match unit.phase {
                Phase::Starting { reads_left } if reads_left > 1 => {
                    unit.phase = Phase::Starting {
                        reads_left: reads_left - 1,
                    };
                }
                Phase::Starting { .. } => {
                    if unit.instrument_type.requires_approval()
                        && approval == ApprovalBehavior::PendingFirst
                        && !unit.approved
                    {
                        unit.phase = Phase::AwaitingApproval;
                    } else {
                        unit.go_live();
                    }
                }
                Phase::Stopping { .. } if never_go_offline => {}
                Phase::Stopping { reads_left } if reads_left > 1 => {
                    unit.phase = Phase::Stopping {
                        reads_left: reads_left - 1,
                    };
                }
                Phase::Stopping { .. } => {
                    unit.status = Some(
                        unit.status_entry(offline_stays_connected, InstrumentStatus::Offline),
                    );
                    unit.phase = Phase::Gone;
                }
                Phase::AwaitingApproval | Phase::Live | Phase::Gone => {}
            }
        }
    }
}

/// In-memory device service and management service sharing one state.
#[derive(Debug, Clone, Default)]
pub struct FakeLab {
    state: Arc<Mutex<LabState>>,
}

fn device_err(status: u16, message: impl Into<String>) -> RemoteError {
    RemoteError::api(ServiceKind::Device, status, message)
}

fn management_err(status: u16, message: impl Into<String>) -> RemoteError {
    RemoteError::api(ServiceKind::Management, status, message)
}

impl FakeLab {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LabState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Behavior
    // -------------------------------------------------------------------------

    /// Status-list reads before a created instrument reports Ready (min 1).
    pub fn with_startup_reads(self, reads: u32) -> Self {
        self.state().startup_reads = reads.max(1);
        self
    }

    /// Status-list reads before a deleted instrument reports Offline (min 1).
    pub fn with_shutdown_reads(self, reads: u32) -> Self {
        self.state().shutdown_reads = reads.max(1);
        self
    }

    pub fn with_approval_behavior(self, behavior: ApprovalBehavior) -> Self {
        self.state().approval = behavior;
        self
    }

    /// Creation responses carry only the id.
    pub fn with_partial_create_responses(self) -> Self {
        self.state().partial_create_responses = true;
        self
    }

    /// Deleted instruments stay connected forever.
    pub fn with_instruments_that_never_go_offline(self) -> Self {
        self.state().never_go_offline = true;
        self
    }

    /// Deleted instruments report Offline but keep `connected` set.
    pub fn with_offline_instruments_still_connected(self) -> Self {
        self.state().offline_stays_connected = true;
        self
    }

    // -------------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------------

    /// Add an instrument known to both services with the given status.
    pub fn seed_instrument(
        &self,
        instrument_type: InstrumentType,
        status: InstrumentStatus,
    ) -> DeviceRecord {
        let mut state = self.state();
        let device = state.new_device(instrument_type);
        let instrument_id = InstrumentId::new(state.next_id());
        let mut unit = Unit {
            instrument_id,
            instrument_type,
            serial: external_serial(&device).to_string(),
            device: Some(device.clone()),
            status: None,
            phase: Phase::Live,
            approved: true,
        };
        let connected =
            !instrument_type.is_passthrough() && status != InstrumentStatus::Offline;
        unit.status = Some(unit.status_entry(connected, status));
        state.units.push(unit);
        device
    }

    /// Add a management-service status entry with no device-service record.
    pub fn seed_orphan_status(
        &self,
        instrument_type: InstrumentType,
        serial: &str,
        connected: bool,
        status: InstrumentStatus,
    ) -> InstrumentId {
        let mut state = self.state();
        let instrument_id = InstrumentId::new(state.next_id());
        let mut unit = Unit {
            instrument_id,
            instrument_type,
            serial: serial.to_string(),
            device: None,
            status: None,
            phase: if status == InstrumentStatus::Offline || !connected {
                Phase::Gone
            } else {
                Phase::Live
            },
            approved: true,
        };
        unit.status = Some(unit.status_entry(connected, status));
        state.units.push(unit);
        instrument_id
    }

    /// Add a running lab request with one run per instrument.
    pub fn seed_lab_request(&self, instruments: &[InstrumentId]) -> RunningLabRequest {
        let mut state = self.state();
        let id = LabRequestId::new(state.next_id());
        let instrument_runs = instruments
            .iter()
            .map(|instrument_id| InstrumentRun {
                id: RunId::new(state.next_id()),
                instrument_id: *instrument_id,
            })
            .collect();
        let request = RunningLabRequest {
            id,
            instrument_runs,
        };
        state.lab_requests.insert(id, request.clone());
        request
    }

    // -------------------------------------------------------------------------
    // Failure injection
    // -------------------------------------------------------------------------

    /// Fail the next `n` creation calls.
    pub fn fail_creates(&self, n: u32) {
        self.state().failures.creates = n;
    }

    /// Fail the next `n` status-list reads.
    pub fn fail_status_reads(&self, n: u32) {
        self.state().failures.status_reads = n;
    }

    pub fn fail_delete(&self, id: DeviceId) {
        self.state().failures.deletes.insert(id);
    }

    pub fn fail_stop_waiting(&self, id: InstrumentId) {
        self.state().failures.stop_waiting.insert(id);
    }

    pub fn fail_suppress(&self, id: InstrumentId) {
        self.state().failures.suppress.insert(id);
    }

    pub fn fail_cancel(&self, id: RunId) {
        self.state().failures.cancels.insert(id);
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    /// Snapshot of every call served so far.
    pub fn calls(&self) -> CallLog {
        self.state().calls.clone()
    }

    /// The management-service id of a device record, if both sides know it.
    pub fn instrument_id_of(&self, id: DeviceId) -> Option<InstrumentId> {
        self.state().unit_by_device(id).map(|u| u.instrument_id)
    }

    /// Current status entries, without advancing the clock.
    pub fn statuses(&self) -> Vec<ConnectedDeviceStatus> {
        self.state()
            .units
            .iter()
            .filter_map(|u| u.status.clone())
            .collect()
    }

    /// Current device records.
    pub fn devices(&self) -> Vec<DeviceRecord> {
        self.state()
            .units
            .iter()
            .filter_map(|u| u.device.clone())
            .collect()
    }

    /// Ids of runs still in progress.
    pub fn running_runs(&self) -> Vec<RunId> {
        self.state()
            .lab_requests
            .values()
            .flat_map(|r| r.instrument_runs.iter().map(|run| run.id))
            .collect()
    }

    /// The document currently staged for an instrument.
    pub fn staged_result(&self, id: DeviceId) -> Option<StagedResultDocument> {
        self.state().staged.get(&id).cloned()
    }

    /// Simulate a run on an instrument, consuming its staged result.
    pub fn simulate_run(&self, id: DeviceId) -> Option<StagedResultDocument> {
        self.state().staged.remove(&id)
    }
}

#[async_trait]
impl DeviceService for FakeLab {
    async fn create_instrument(&self, device_type_name: &str) -> Result<DeviceRecord, RemoteError> {
        let mut state = self.state();
        state.calls.creates.push(device_type_name.to_string());

        if state.failures.creates > 0 {
            state.failures.creates -= 1;
            return Err(device_err(503, "simulator is restarting"));
        }

        let instrument_type = management_type(device_type_name)
            .map_err(|e| device_err(400, e.to_string()))?;
        let device = state.new_device(instrument_type);
        let instrument_id = InstrumentId::new(state.next_id());
        let reads_left = state.startup_reads;
        state.units.push(Unit {
            instrument_id,
            instrument_type,
            serial: external_serial(&device).to_string(),
            device: Some(device.clone()),
            status: None,
            phase: Phase::Starting { reads_left },
            approved: false,
        });

        if state.partial_create_responses {
            return Ok(DeviceRecord {
                id: device.id,
                instrument_serial_number: String::new(),
                main_unit_serial_number: None,
                instrument_type: None,
            });
        }
        Ok(device)
    }

    async fn list_instruments(&self) -> Result<Vec<DeviceRecord>, RemoteError> {
        Ok(self.devices())
    }

    async fn list_instruments_of_type(
        &self,
        device_type_name: &str,
    ) -> Result<Vec<DeviceRecord>, RemoteError> {
        Ok(self
            .devices()
            .into_iter()
            .filter(|d| d.instrument_type.as_deref() == Some(device_type_name))
            .collect())
    }

    async fn get_instrument(&self, id: DeviceId) -> Result<DeviceRecord, RemoteError> {
        let mut state = self.state();
        state.calls.gets.push(id);
        state
            .unit_by_device(id)
            .and_then(|u| u.device.clone())
            .ok_or_else(|| device_err(404, format!("no instrument {id}")))
    }

    async fn delete_instrument(&self, id: DeviceId) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.deletes.push(id);

        if state.failures.deletes.contains(&id) {
            return Err(device_err(500, format!("could not stop {id}")));
        }

        let reads_left = state.shutdown_reads;
        let index = state
            .units
            .iter()
            .position(|u| u.device.as_ref().is_some_and(|d| d.id == id))
            .ok_or_else(|| device_err(404, format!("no instrument {id}")))?;
        state.staged.remove(&id);

        let unit = &mut state.units[index];
        unit.device = None;
        if unit.status.is_some() {
            unit.phase = Phase::Stopping { reads_left };
        } else {
            // Never reached the management service; nothing to converge.
            state.units.remove(index);
        }
        Ok(())
    }

    async fn stage_next_result(
        &self,
        id: DeviceId,
        document: &StagedResultDocument,
    ) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.staged.push(id);
        if state.unit_by_device(id).is_none() {
            return Err(device_err(404, format!("no instrument {id}")));
        }
        state.staged.insert(id, document.clone());
        Ok(())
    }

    async fn run_maintenance(
        &self,
        id: DeviceId,
        payload: &serde_json::Value,
    ) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.maintenance.push((id, payload.clone()));
        state
            .unit_by_device(id)
            .map(|_| ())
            .ok_or_else(|| device_err(404, format!("no instrument {id}")))
    }

    async fn inject_fault(
        &self,
        id: DeviceId,
        payload: &serde_json::Value,
    ) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.faults.push((id, payload.clone()));
        let unit = state
            .unit_by_device(id)
            .ok_or_else(|| device_err(404, format!("no instrument {id}")))?;
        if let Some(status) = unit.status.as_mut() {
            status.instrument_status = InstrumentStatus::Alert;
        }
        Ok(())
    }
}

#[async_trait]
impl ManagementService for FakeLab {
    async fn list_device_statuses(
        &self,
        scope: StatusScope,
    ) -> Result<Vec<ConnectedDeviceStatus>, RemoteError> {
        let mut state = self.state();
        state.calls.status_reads += 1;

        if state.failures.status_reads > 0 {
            state.failures.status_reads -= 1;
            return Err(management_err(502, "status cache warming up"));
        }

        state.tick();
        Ok(state
            .units
            .iter()
            .filter_map(|u| u.status.clone())
            .filter(|s| {
                scope == StatusScope::IncludePassthrough || !s.instrument_type().is_passthrough()
            })
            .collect())
    }

    async fn list_pending_approvals(&self) -> Result<Vec<PendingApproval>, RemoteError> {
        let mut state = self.state();
        state.calls.pending_reads += 1;
        Ok(state
            .units
            .iter()
            .filter(|u| u.phase == Phase::AwaitingApproval)
            .map(|u| PendingApproval {
                instrument: PendingInstrument {
                    id: u.instrument_id,
                    instrument_serial_number: u.serial.clone(),
                },
            })
            .collect())
    }

    async fn approve_device(&self, id: InstrumentId) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.approvals.push(id);
        let unit = state
            .unit_by_instrument(id)
            .ok_or_else(|| management_err(404, format!("no device {id}")))?;
        unit.approved = true;
        if unit.phase == Phase::AwaitingApproval {
            // Ready shows up on the next status read.
            unit.phase = Phase::Starting { reads_left: 1 };
        }
        Ok(())
    }

    async fn stop_waiting(&self, id: InstrumentId) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.stop_waiting.push(id);
        if state.failures.stop_waiting.contains(&id) {
            return Err(management_err(409, format!("{id} is not waiting")));
        }
        Ok(())
    }

    async fn suppress(&self, id: InstrumentId) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.suppressions.push(id);
        if state.failures.suppress.contains(&id) {
            return Err(management_err(500, format!("could not suppress {id}")));
        }
        // Suppressing a departed instrument clears its entry for good.
        state
            .units
            .retain(|u| !(u.instrument_id == id && u.device.is_none() && u.phase == Phase::Gone));
        Ok(())
    }

    async fn list_running_lab_requests(&self) -> Result<Vec<RunningLabRequest>, RemoteError> {
        Ok(self.state().lab_requests.values().cloned().collect())
    }

    async fn cancel_run(&self, id: RunId) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.calls.cancels.push(id);
        if state.failures.cancels.contains(&id) {
            return Err(management_err(500, format!("run {id} could not be cancelled")));
        }
        for request in state.lab_requests.values_mut() {
            request.instrument_runs.retain(|run| run.id != id);
        }
        state
            .lab_requests
            .retain(|_, r| !r.instrument_runs.is_empty());
        Ok(())
    }

    async fn set_feature_flag(&self, name: &str, enabled: bool) -> Result<(), RemoteError> {
        self.state()
            .calls
            .feature_flags
            .push((name.to_string(), enabled));
        Ok(())
    }

    async fn save_qc_barcodes(&self, request: &QcBarcodeRequest) -> Result<(), RemoteError> {
        self.state().calls.qc_requests.push(request.clone());
        Ok(())
    }
}
