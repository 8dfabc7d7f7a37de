//! Error types for the shared model.

use thiserror::Error;

use crate::types::InstrumentType;

/// Failures to reconcile identities across the two services.
///
/// These are configuration defects, not runtime conditions: a type that one
/// service knows and the cross-reference table does not.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The device service reported a type name missing from the table.
    #[error("device type '{0}' has no management-service counterpart in the cross-reference table")]
    UnmappedDeviceType(String),

    /// An instrument type name that neither service defines.
    #[error("unknown instrument type: {0}")]
    UnknownInstrumentType(String),
}

/// Errors building documents for the remote services.
#[derive(Debug, Error, Clone)]
pub enum ModelError {
    /// The instrument type does not take QC barcodes.
    #[error("{0} does not accept QC barcodes")]
    QcUnsupported(InstrumentType),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}
