//! Remote-call errors.

use thiserror::Error;

/// Which remote service an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Device,
    Management,
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceKind::Device => f.write_str("device service"),
            ServiceKind::Management => f.write_str("management service"),
        }
    }
}

/// A failed round trip to one of the remote services.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The service answered with a non-success status.
    #[error("{service} returned {status}: {message}")]
    Api {
        service: ServiceKind,
        status: u16,
        message: String,
    },

    /// The request never got an answer.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a body we could not read.
    #[error("could not decode {service} response: {message}")]
    Decode {
        service: ServiceKind,
        message: String,
    },
}

impl RemoteError {
    /// Create an API error from response details.
    pub fn api(service: ServiceKind, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            service,
            status,
            message: message.into(),
        }
    }

    /// Returns true if the service reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}
