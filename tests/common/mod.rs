use std::sync::{Mutex, MutexGuard};

/// Same guard as the crate's unit tests use: one hot spinning pair at a time.
pub fn spin_guard() -> MutexGuard<'static, ()> {
    static SPIN: Mutex<()> = Mutex::new(());
    SPIN.lock().unwrap_or_else(|e| e.into_inner())
}
