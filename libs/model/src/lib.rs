//! # labsync-model
//!
//! Wire types for the device service (simulated instruments) and the
//! management service (connected-device status, lab requests), plus the pure
//! logic that joins the two.
//!
//! ## Modules
//!
//! - [`types`]: records as each service serializes them
//! - [`identity`]: the only place the two identity schemes are reconciled
//!   (composite serials and the instrument-type cross-reference)
//! - [`staged`]: the staged-result document the device service expects
//! - [`qc`]: per-type QC barcode payloads for the management service
//!
//! Nothing in this crate performs I/O.

mod error;
pub mod identity;
pub mod qc;
pub mod staged;
pub mod types;

pub use error::{IdentityError, ModelError};
pub use identity::ExternalSerial;
pub use qc::{QcBarcodeRequest, QcBarcodes, QcLot};
pub use staged::{StagedResultDocument, RESULT_ELEMENT};
pub use types::*;
