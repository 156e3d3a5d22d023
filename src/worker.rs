//! The body of one pinned worker thread.

use tracing::debug;

use crate::channel::{PingPong, Role};
use crate::error::Result;
use crate::pin;
use crate::signal::{Release, Signal, StartBarrier};

/// Per-worker signals the driver watches.
///
/// `bound` is set once pinning succeeded, `done` whenever the worker leaves
/// `run`, on any path. `done` without `bound` means the worker never got to
/// its core.
#[derive(Debug, Default)]
pub struct Lane {
    pub bound: Signal,
    pub done: Signal,
}

impl Lane {
    /// The worker is either parked at the start barrier or already gone.
    pub fn settled(&self) -> bool {
        self.done.is_set() || self.bound.is_set()
    }

    pub fn failed(&self) -> bool {
        // `bound` is always set before `done`, so read `done` first
        self.done.is_set() && !self.bound.is_set()
    }
}

/// Everything the two workers of one measurement share.
///
/// `relay` sits on a cache line of its own; the barrier and lanes are only
/// touched at the edges of the timed interval.
#[derive(Debug, Default)]
pub struct Session {
    pub relay: PingPong,
    pub start: StartBarrier,
    pub lanes: [Lane; 2],
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lane(&self, role: Role) -> &Lane {
        match role {
            Role::A => &self.lanes[0],
            Role::B => &self.lanes[1],
        }
    }
}

struct SetOnDrop<'a>(&'a Signal);

impl Drop for SetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set();
    }
}

/// Pin to `core`, wait for the start barrier, then play `role` on the relay
/// for `round_trips` round trips.
pub fn run(core: usize, role: Role, round_trips: u64, session: &Session) -> Result<()> {
    let lane = session.lane(role);
    let _done = SetOnDrop(&lane.done);

    pin::bind(core)?;
    lane.bound.set();

    if session.start.wait() == Release::Abort {
        debug!(core, ?role, "start aborted");
        return Ok(());
    }

    session.relay.relay(role, round_trips);
    Ok(())
}
