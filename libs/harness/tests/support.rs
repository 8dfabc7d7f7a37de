//! Shared helpers for harness integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use labsync_harness::{Harness, HarnessConfig};
use labsync_reconcile::PollPolicy;
use labsync_testing::FakeLab;
use tracing_subscriber::fmt::MakeWriter;

/// Fast policies; tests run on a paused clock, so only attempt counts matter.
pub fn test_config() -> HarnessConfig {
    HarnessConfig {
        poll: PollPolicy::new(Duration::from_millis(100), Duration::from_secs(5)),
        provision_poll: PollPolicy::new(Duration::from_millis(100), Duration::from_secs(10)),
        ..HarnessConfig::default()
    }
}

pub fn harness(lab: &FakeLab) -> Harness<FakeLab, FakeLab> {
    harness_with(lab, test_config())
}

pub fn harness_with(lab: &FakeLab, config: HarnessConfig) -> Harness<FakeLab, FakeLab> {
    Harness::new(lab.clone(), lab.clone(), config)
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Route this thread's events into the sink until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
