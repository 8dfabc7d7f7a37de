//! Typed ID definitions for remote records.

use crate::define_id;

// =============================================================================
// Device Service
// =============================================================================

// Id of a simulated instrument record in the device service.
define_id!(DeviceId, "dev");

// =============================================================================
// Management Service
// =============================================================================

// Id of an instrument as known to the management service. Stop-waiting,
// suppress and approval calls are addressed by this id.
define_id!(InstrumentId, "ins");
define_id!(LabRequestId, "lr");
define_id!(RunId, "run");

// =============================================================================
// Tests
// =============================================================================
