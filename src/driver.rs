//! One core-pair measurement.

use std::hint;
use std::time::Duration;

use crossbeam_utils::thread::{Scope, ScopedJoinHandle};
use quanta::Clock;
use tracing::debug;

use crate::channel::{Role, MAX_ROUND_TRIPS};
use crate::error::{Error, Result};
use crate::worker::{self, Session};

/// Mean time for one hop of the relay.
///
/// `2 * round_trips` hops make up the measured interval. Zero round trips
/// measure nothing and come out as zero.
pub fn per_hop_ns(elapsed: Duration, round_trips: u64) -> f64 {
    if round_trips == 0 {
        return 0.0;
    }
    elapsed.as_nanos() as f64 / (2.0 * round_trips as f64)
}

pub struct Driver {
    clock: Clock,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    pub fn new() -> Self {
        Self {
            clock: Clock::new(),
        }
    }

    /// Ping-pong between `core_a` and `core_b` and return the per-hop latency
    /// in nanoseconds.
    ///
    /// The clock starts once both workers are pinned and parked at the start
    /// barrier, right before the barrier opens, and stops once both worker
    /// threads have been joined. Thread creation and pinning stay outside
    /// the interval. The calling thread blocks in the join instead of
    /// spinning, so only the two pinned cores touch the relay.
    pub fn measure(&self, core_a: usize, core_b: usize, round_trips: u64) -> Result<f64> {
        if core_a == core_b {
            return Err(Error::SamePair { core: core_a });
        }
        if round_trips > MAX_ROUND_TRIPS {
            return Err(Error::TooManyRoundTrips {
                round_trips,
                max: MAX_ROUND_TRIPS,
            });
        }

        let elapsed = self.run_pair(core_a, core_b, round_trips)?;
        let ns = per_hop_ns(elapsed, round_trips);
        debug!(core_a, core_b, round_trips, ?elapsed, ns, "pair measured");
        Ok(ns)
    }

    fn run_pair(&self, core_a: usize, core_b: usize, round_trips: u64) -> Result<Duration> {
        // fresh state per pair, nothing leaks between measurements
        let session = Session::new();
        let session = &session;

        crossbeam_utils::thread::scope(|s| -> Result<Duration> {
            let a = spawn(s, core_a, Role::A, round_trips, session)?;
            let b = match spawn(s, core_b, Role::B, round_trips, session) {
                Ok(b) => b,
                Err(e) => {
                    session.start.abort();
                    if let Err(peer) = join(a, core_a) {
                        debug!(core = core_a, error = %peer, "peer failed while aborting");
                    }
                    return Err(e);
                }
            };

            let lane_a = session.lane(Role::A);
            let lane_b = session.lane(Role::B);
            while !(lane_a.settled() && lane_b.settled()) {
                hint::spin_loop();
            }

            if lane_a.failed() || lane_b.failed() {
                session.start.abort();
                let ra = join(a, core_a);
                let rb = join(b, core_b);
                ra.and(rb)?;
                // a worker that left without pinning always reports why
                return Err(Error::Bind {
                    core: if lane_a.failed() { core_a } else { core_b },
                    reason: "worker exited before binding".into(),
                });
            }

            debug!(core_a, core_b, "workers parked, opening start barrier");
            let start = self.clock.raw();
            session.start.open();
            let ra = join(a, core_a);
            let rb = join(b, core_b);
            let end = self.clock.raw();

            ra.and(rb)?;
            Ok(self.clock.delta(start, end))
        })
        .map_err(|_| Error::PairPanicked { core_a, core_b })?
    }
}

fn spawn<'scope, 'env>(
    s: &'scope Scope<'env>,
    core: usize,
    role: Role,
    round_trips: u64,
    session: &'env Session,
) -> Result<ScopedJoinHandle<'scope, Result<()>>> {
    s.builder()
        .name(format!("core2core-{}", core))
        .spawn(move |_| worker::run(core, role, round_trips, session))
        .map_err(|source| Error::Spawn { core, source })
}

fn join(handle: ScopedJoinHandle<'_, Result<()>>, core: usize) -> Result<()> {
    handle
        .join()
        .map_err(|_| Error::WorkerPanicked { core })?
}
