//! Core-to-core latency: two threads pinned to two logical cores hand a
//! counter back and forth through one atomic, and the time per hop fills a
//! core x core matrix.

pub mod channel;
pub mod config;
pub mod driver;
pub mod error;
pub mod export;
pub mod matrix;
pub mod pin;
pub mod signal;
pub mod sysinfo;
pub mod worker;

pub use driver::Driver;
pub use error::{Error, Result};
pub use matrix::{LatencyMatrix, SweepOptions};

/// Tests that spin two threads hot run one at a time, or they would measure
/// each other. `tests/common` has the same guard for the integration tests.
#[cfg(test)]
pub(crate) fn spin_guard() -> std::sync::MutexGuard<'static, ()> {
    static SPIN: std::sync::Mutex<()> = std::sync::Mutex::new(());
    SPIN.lock().unwrap_or_else(|e| e.into_inner())
}
