//! Remote service contracts.
//!
//! The synchronization engine talks to two services it does not control:
//!
//! - the device service, which simulates instruments ([`DeviceService`])
//! - the management service, which tracks connected devices and lab
//!   requests ([`ManagementService`])
//!
//! The traits are the seam: the engine only ever sees them. The HTTP
//! implementations here ([`DeviceServiceClient`], [`ManagementServiceClient`])
//! are the production transport; `labsync-testing` provides in-memory
//! doubles.

mod client;
mod config;
mod device;
mod error;
mod management;
mod service;

pub use config::RemoteConfig;
pub use device::DeviceServiceClient;
pub use error::{RemoteError, ServiceKind};
pub use management::ManagementServiceClient;
pub use service::{DeviceService, ManagementService};
