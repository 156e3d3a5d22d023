//! One-shot, level-triggered signals used to coordinate a single measurement.
//!
//! A fresh pair of these is built for every measurement. Once set they stay
//! set, so a waiter that shows up after the set still proceeds immediately.
//! Waiting is a spin on an acquire load; nothing here ever parks a thread.

use std::hint;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Binary flag: unset until `set`, then set for good.
#[derive(Debug, Default)]
pub struct Signal {
    flag: AtomicBool,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn wait(&self) {
        while !self.is_set() {
            hint::spin_loop();
        }
    }
}

const CLOSED: u8 = 0;
const OPEN: u8 = 1;
const ABORTED: u8 = 2;

/// What a worker sees once the start barrier stops holding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    Go,
    Abort,
}

/// Start barrier releasing both workers at once.
///
/// Opened exactly once per measurement. `abort` is the terminal alternative
/// used when a peer could not be pinned, so the surviving worker exits
/// instead of spinning on a relay nobody will answer.
#[derive(Debug)]
pub struct StartBarrier {
    state: AtomicU8,
}

impl Default for StartBarrier {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(CLOSED),
        }
    }
}

impl StartBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sequenced before this call is visible to a worker once
    /// `wait` returns `Release::Go`.
    pub fn open(&self) {
        self.state.store(OPEN, Ordering::Release);
    }

    pub fn abort(&self) {
        self.state.store(ABORTED, Ordering::Release);
    }

    pub fn wait(&self) -> Release {
        loop {
            match self.state.load(Ordering::Acquire) {
                OPEN => return Release::Go,
                ABORTED => return Release::Abort,
                _ => hint::spin_loop(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn late_waiter_passes_a_set_signal() {
        let s = Signal::new();
        assert!(!s.is_set());
        s.set();
        s.wait();
        assert!(s.is_set());
    }

    #[test]
    fn late_waiter_passes_an_open_barrier() {
        let b = StartBarrier::new();
        b.open();
        assert_eq!(b.wait(), Release::Go);
        assert_eq!(b.wait(), Release::Go);

        let b = StartBarrier::new();
        b.abort();
        assert_eq!(b.wait(), Release::Abort);
    }

    #[test]
    fn open_publishes_prior_writes() {
        let barrier = StartBarrier::new();
        let payload = AtomicU64::new(0);

        crossbeam_utils::thread::scope(|s| {
            let waiter = s.spawn(|_| {
                assert_eq!(barrier.wait(), Release::Go);
                payload.load(Ordering::Relaxed)
            });

            payload.store(42, Ordering::Relaxed);
            barrier.open();
            assert_eq!(waiter.join().unwrap(), 42);
        })
        .unwrap();
    }

    #[test]
    fn signal_wakes_spinning_waiter() {
        let done = Signal::new();
        crossbeam_utils::thread::scope(|s| {
            let waiter = s.spawn(|_| done.wait());
            done.set();
            waiter.join().unwrap();
        })
        .unwrap();
    }
}
