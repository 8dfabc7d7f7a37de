//! Device identity resolution across the two services.
//!
//! The device service and the management service each assign their own ids
//! and their own type names to the same simulated instrument. The only
//! stable join key is the serial number the management service reports,
//! which for multi-unit hardware is the main-unit serial followed by the
//! instrument serial.
//!
//! All cross-service correlation goes through this module.

use crate::error::IdentityError;
use crate::types::{ConnectedDeviceStatus, DeviceRecord, InstrumentType, PendingApproval};

/// The serial a management-service status entry carries for a device record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExternalSerial(String);

impl ExternalSerial {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExternalSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExternalSerial {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ExternalSerial {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ExternalSerial {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Compute the externally addressable serial of a device record.
pub fn external_serial(record: &DeviceRecord) -> ExternalSerial {
    match record.main_unit_serial_number.as_deref() {
        Some(main_unit) => ExternalSerial(format!(
            "{main_unit}{}",
            record.instrument_serial_number
        )),
        None => ExternalSerial(record.instrument_serial_number.clone()),
    }
}

/// Map a management-service type to the device-service type name.
///
/// This match is the cross-reference table. Each device name must appear
/// exactly once so the reverse lookup below stays unambiguous.
pub fn device_type_name(instrument_type: InstrumentType) -> &'static str {
    match instrument_type {
        InstrumentType::ChemistryAnalyzer => "chem-analyzer",
        InstrumentType::HematologyAnalyzer => "hematology-analyzer",
        InstrumentType::UrineAnalyzer => "urine-analyzer",
        InstrumentType::CoagulationAnalyzer => "coag-analyzer",
        InstrumentType::SedimentAnalyzer => "sediment-analyzer",
        InstrumentType::ReferenceLabInterface => "reflab-interface",
    }
}

/// Map a device-service type name to the management-service type.
pub fn management_type(name: &str) -> Result<InstrumentType, IdentityError> {
    InstrumentType::ALL
        .into_iter()
        .find(|t| device_type_name(*t) == name)
        .ok_or_else(|| IdentityError::UnmappedDeviceType(name.to_string()))
}

/// Whether a device record and a status entry denote the same unit.
pub fn same_unit(record: &DeviceRecord, status: &ConnectedDeviceStatus) -> bool {
    external_serial(record) == status.serial()
}

/// Find the device-service record behind a management-service status entry.
pub fn find_device_for_status<'a>(
    devices: &'a [DeviceRecord],
    status: &ConnectedDeviceStatus,
) -> Option<&'a DeviceRecord> {
    devices.iter().find(|d| same_unit(d, status))
}

/// Find the management-service status entry for a serial.
pub fn find_status<'a>(
    statuses: &'a [ConnectedDeviceStatus],
    serial: &ExternalSerial,
) -> Option<&'a ConnectedDeviceStatus> {
    statuses.iter().find(|s| *serial == s.serial())
}

/// Find the pending-approval entry for a serial.
pub fn find_pending<'a>(
    pending: &'a [PendingApproval],
    serial: &ExternalSerial,
) -> Option<&'a PendingApproval> {
    pending
        .iter()
        .find(|p| *serial == p.instrument.instrument_serial_number.as_str())
}
