//! Record types as the two services serialize them.
//!
//! Both services speak camelCase JSON. Device-service records are addressed by
//! [`DeviceId`]; management-service records by [`InstrumentId`].

use labsync_id::{DeviceId, InstrumentId, LabRequestId, RunId};
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

// =============================================================================
// Instrument Types
// =============================================================================

/// A class of instrument, as named by the management service.
///
/// The device service names the same classes differently; see
/// [`crate::identity`] for the cross-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InstrumentType {
    ChemistryAnalyzer,
    HematologyAnalyzer,
    UrineAnalyzer,
    CoagulationAnalyzer,
    /// Must be approved by an operator before first use.
    SedimentAnalyzer,
    /// Reported as `connected=false` even while operable.
    ReferenceLabInterface,
}

impl InstrumentType {
    /// Every supported type.
    pub const ALL: [InstrumentType; 6] = [
        InstrumentType::ChemistryAnalyzer,
        InstrumentType::HematologyAnalyzer,
        InstrumentType::UrineAnalyzer,
        InstrumentType::CoagulationAnalyzer,
        InstrumentType::SedimentAnalyzer,
        InstrumentType::ReferenceLabInterface,
    ];

    /// The management-service name (also the JSON form).
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentType::ChemistryAnalyzer => "ChemistryAnalyzer",
            InstrumentType::HematologyAnalyzer => "HematologyAnalyzer",
            InstrumentType::UrineAnalyzer => "UrineAnalyzer",
            InstrumentType::CoagulationAnalyzer => "CoagulationAnalyzer",
            InstrumentType::SedimentAnalyzer => "SedimentAnalyzer",
            InstrumentType::ReferenceLabInterface => "ReferenceLabInterface",
        }
    }

    /// Whether a newly created instrument waits for operator approval.
    pub fn requires_approval(&self) -> bool {
        matches!(self, InstrumentType::SedimentAnalyzer)
    }

    /// Whether this is the passthrough category, reported as disconnected
    /// while idle and operable.
    pub fn is_passthrough(&self) -> bool {
        matches!(self, InstrumentType::ReferenceLabInterface)
    }
}

impl std::fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InstrumentType {
    type Err = IdentityError;

    /// Parses a management-service type name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        InstrumentType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| IdentityError::UnknownInstrumentType(s.to_string()))
    }
}

/// Operator-facing instrument status reported by the management service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentStatus {
    Ready,
    Busy,
    Alert,
    Offline,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for InstrumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            InstrumentStatus::Ready => "READY",
            InstrumentStatus::Busy => "BUSY",
            InstrumentStatus::Alert => "ALERT",
            InstrumentStatus::Offline => "OFFLINE",
            InstrumentStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Device Service
// =============================================================================

/// A simulated instrument as stored by the device service.
///
/// Multi-unit hardware carries a `main_unit_serial_number`; the serial the
/// management service sees is then the concatenation of both. Use
/// [`crate::identity::external_serial`] rather than reading either field to
/// correlate records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub id: DeviceId,

    /// Empty when the creation response was only partially populated.
    #[serde(default)]
    pub instrument_serial_number: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_unit_serial_number: Option<String>,

    /// Device-service type name, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument_type: Option<String>,
}

impl DeviceRecord {
    /// Whether the serial fields have been populated.
    pub fn has_serial(&self) -> bool {
        !self.instrument_serial_number.is_empty()
    }
}

/// Body of a device-service creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInstrumentRequest {
    pub instrument_type: String,
}

// =============================================================================
// Management Service
// =============================================================================

/// The instrument half of a connected-device status entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInstrument {
    pub id: InstrumentId,
    pub instrument_type: InstrumentType,
    pub instrument_serial_number: String,
}

/// One entry of the management service's connected-device status list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedDeviceStatus {
    pub instrument: StatusInstrument,
    pub connected: bool,
    pub instrument_status: InstrumentStatus,
}

impl ConnectedDeviceStatus {
    /// The externally addressable serial of this entry.
    pub fn serial(&self) -> &str {
        &self.instrument.instrument_serial_number
    }

    /// The management-service id, used for stop-waiting, suppress and approve.
    pub fn instrument_id(&self) -> InstrumentId {
        self.instrument.id
    }

    pub fn instrument_type(&self) -> InstrumentType {
        self.instrument.instrument_type
    }

    /// Whether the instrument counts as attached to the management service.
    ///
    /// Passthrough instruments never report `connected`; for them anything
    /// short of `Offline` counts.
    pub fn is_connected(&self) -> bool {
        if self.instrument.instrument_type.is_passthrough() {
            self.instrument_status != InstrumentStatus::Offline
        } else {
            self.connected
        }
    }

    /// Whether the instrument can take work.
    ///
    /// Passthrough instruments never report `connected`, so for them `Ready`
    /// alone counts.
    pub fn is_operable(&self) -> bool {
        self.instrument_status == InstrumentStatus::Ready
            && (self.connected || self.instrument.instrument_type.is_passthrough())
    }

    /// Whether the instrument has gone away from the management service's
    /// point of view (offline or disconnected).
    pub fn is_gone(&self) -> bool {
        self.instrument_status == InstrumentStatus::Offline || !self.connected
    }
}

/// Which status list to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusScope {
    /// Connected instruments only.
    #[default]
    Standard,
    /// Also include the passthrough category.
    IncludePassthrough,
}

/// The instrument half of a pending-approval entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInstrument {
    pub id: InstrumentId,
    pub instrument_serial_number: String,
}

/// An instrument waiting for operator approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApproval {
    pub instrument: PendingInstrument,
}

/// A lab request that has not yet completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningLabRequest {
    pub id: LabRequestId,
    #[serde(default)]
    pub instrument_runs: Vec<InstrumentRun>,
}

/// One instrument's run within a lab request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentRun {
    pub id: RunId,
    pub instrument_id: InstrumentId,
}

/// Body of a feature-flag toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlagUpdate {
    pub enabled: bool,
}

// =============================================================================
// Results
// =============================================================================

/// One assay value the simulated instrument should report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssayResult {
    pub assay_name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AssayResult {
    pub fn new(assay_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            assay_name: assay_name.into(),
            value: value.into(),
            notes: None,
        }
    }
}

/// The results the next simulated run should report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub results: Vec<AssayResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_amount: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept_delay: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_accept_delay: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dilution: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_type: Option<String>,

    /// Opaque to this crate; passed through to the device service as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<serde_json::Value>,
}

impl ResultSet {
    pub fn new(results: Vec<AssayResult>) -> Self {
        Self {
            results,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(t: InstrumentType, connected: bool, s: InstrumentStatus) -> ConnectedDeviceStatus {
        ConnectedDeviceStatus {
            instrument: StatusInstrument {
                id: InstrumentId::new(1),
                instrument_type: t,
                instrument_serial_number: "S1".to_string(),
            },
            connected,
            instrument_status: s,
        }
    }

    #[test]
    fn test_status_list_deserializes() {
        let json = r#"[
            {
                "instrument": {
                    "id": 31,
                    "instrumentType": "ChemistryAnalyzer",
                    "instrumentSerialNumber": "MU100100"
                },
                "connected": true,
                "instrumentStatus": "READY"
            },
            {
                "instrument": {
                    "id": 32,
                    "instrumentType": "ReferenceLabInterface",
                    "instrumentSerialNumber": "RL7"
                },
                "connected": false,
                "instrumentStatus": "SOMETHING_NEW"
            }
        ]"#;

        let list: Vec<ConnectedDeviceStatus> = serde_json::from_str(json).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].instrument_id(), InstrumentId::new(31));
        assert_eq!(list[0].serial(), "MU100100");
        assert_eq!(list[1].instrument_status, InstrumentStatus::Unknown);
    }

    #[test]
    fn test_partial_device_record_deserializes() {
        let record: DeviceRecord = serde_json::from_str(r#"{"id": 5}"#).unwrap();
        assert_eq!(record.id, DeviceId::new(5));
        assert!(!record.has_serial());
        assert!(record.main_unit_serial_number.is_none());
    }

    #[test]
    fn test_operable_requires_connected_and_ready() {
        let t = InstrumentType::HematologyAnalyzer;
        assert!(status(t, true, InstrumentStatus::Ready).is_operable());
        assert!(!status(t, false, InstrumentStatus::Ready).is_operable());
        assert!(!status(t, true, InstrumentStatus::Busy).is_operable());
    }

    #[test]
    fn test_passthrough_operable_while_disconnected() {
        let t = InstrumentType::ReferenceLabInterface;
        assert!(status(t, false, InstrumentStatus::Ready).is_operable());
        assert!(!status(t, false, InstrumentStatus::Offline).is_operable());
    }

    #[test]
    fn test_connected_ignores_instrument_status() {
        let t = InstrumentType::ChemistryAnalyzer;
        assert!(status(t, true, InstrumentStatus::Busy).is_connected());
        assert!(status(t, true, InstrumentStatus::Alert).is_connected());
        assert!(!status(t, false, InstrumentStatus::Ready).is_connected());

        let passthrough = InstrumentType::ReferenceLabInterface;
        assert!(status(passthrough, false, InstrumentStatus::Busy).is_connected());
        assert!(!status(passthrough, false, InstrumentStatus::Offline).is_connected());
    }

    #[test]
    fn test_is_gone() {
        let t = InstrumentType::UrineAnalyzer;
        assert!(status(t, false, InstrumentStatus::Ready).is_gone());
        assert!(status(t, true, InstrumentStatus::Offline).is_gone());
        assert!(!status(t, true, InstrumentStatus::Alert).is_gone());
    }

    #[test]
    fn test_instrument_type_from_str_ignores_case() {
        let t: InstrumentType = "sedimentanalyzer".parse().unwrap();
        assert_eq!(t, InstrumentType::SedimentAnalyzer);
        assert!("Centrifuge".parse::<InstrumentType>().is_err());
    }

    #[test]
    fn test_only_sediment_requires_approval() {
        let approval: Vec<_> = InstrumentType::ALL
            .into_iter()
            .filter(InstrumentType::requires_approval)
            .collect();
        assert_eq!(approval, vec![InstrumentType::SedimentAnalyzer]);
    }

    #[test]
    fn test_result_set_omits_unset_fields() {
        let set = ResultSet::new(vec![AssayResult::new("ALB", "3.1")]);
        let value = serde_json::to_value(&set).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert_eq!(value["results"][0]["assayName"], "ALB");
    }
}
