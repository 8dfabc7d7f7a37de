//! Error handling and display for the CLI.

use std::path::PathBuf;

use colored::Colorize;
use labsync_harness::HarnessError;
use labsync_remote::RemoteError;
use thiserror::Error;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Could not read {path:?}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path:?} is not valid JSON: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The remote failure behind an error, if there is one.
fn remote_cause(err: &anyhow::Error) -> Option<&RemoteError> {
    match err.downcast_ref::<HarnessError>() {
        Some(HarnessError::Remote(remote)) => Some(remote),
        Some(_) => None,
        None => err.downcast_ref::<RemoteError>(),
    }
}

/// Print an error in a user-friendly format.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let hint = match remote_cause(err) {
        Some(RemoteError::Network(_)) => {
            Some("Hint: Check that both services are running and the endpoint URLs are right.")
        }
        Some(RemoteError::Api { status: 401, .. }) | Some(RemoteError::Api { status: 403, .. }) => {
            Some("Hint: Set LABSYNC_MANAGEMENT_TOKEN to a valid management-service token.")
        }
        Some(_) => None,
        None => match err.downcast_ref::<HarnessError>() {
            Some(HarnessError::Timeout(_)) => Some(
                "Hint: The services did not converge in time. Raise LABSYNC_POLL_TIMEOUT_SECS \
                 or LABSYNC_PROVISION_TIMEOUT_SECS, or run `labctl reset` and retry.",
            ),
            Some(HarnessError::Identity(_)) => {
                Some("Hint: Run `labctl status` to see the instrument types the services report.")
            }
            _ => None,
        },
    };

    if let Some(hint) = hint {
        eprintln!("\n{}", hint.yellow());
    }
}
