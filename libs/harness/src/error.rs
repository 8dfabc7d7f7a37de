//! Harness error types.

use labsync_model::{IdentityError, ModelError};
use labsync_reconcile::ReconcileError;
use labsync_remote::RemoteError;
use thiserror::Error;

/// Result type for harness operations.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that abort a harness operation.
///
/// Best-effort batch items never surface here; they are logged and counted
/// in the operation's report instead.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A remote call the operation depends on failed.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The two services did not converge within the poll budget.
    #[error(transparent)]
    Timeout(#[from] ReconcileError),

    /// The device service reported a type missing from the cross-reference
    /// table.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The operation does not apply to the requested instrument type.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A document could not be built for the device service.
    #[error("invalid document: {0}")]
    Document(String),
}

impl HarnessError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl From<ModelError> for HarnessError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::QcUnsupported(_) => HarnessError::Unsupported(err.to_string()),
            ModelError::Serialization(message) => HarnessError::Document(message),
        }
    }
}
