//! # labsync-id
//!
//! Typed ids for records owned by the two remote services.
//!
//! ## Design Principles
//!
//! - Both services hand out per-service numeric ids; the numbers mean nothing
//!   across the service boundary
//! - Ids are typed so a device-service id can never be passed where a
//!   management-service id is expected
//! - The wire form is the bare number; the display form carries a prefix
//!   (`dev:12`, `ins:7`) to keep logs unambiguous
//!
//! Correlating a device-service record with a management-service record is
//! never done by id. It goes through the serial-number resolver in
//! `labsync-model`.

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;
