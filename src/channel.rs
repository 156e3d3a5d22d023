//! Single-token relay over one atomic counter.
//!
//! Two roles take turns advancing `current`. Role A owns the odd values and
//! role B the even ones; each successful compare-exchange hands the token to
//! the other side. With `current` starting at 0 only A can make the first
//! move, so there is never a "who goes first" decision.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_utils::CachePadded;

/// Largest round-trip count for which neither role's counter can overflow
/// a `u64`, including the final advance past the `2 * round_trips` bound.
pub const MAX_ROUND_TRIPS: u64 = u64::MAX / 2 - 1;

/// Which side of the relay a worker plays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    A,
    B,
}

impl Role {
    /// Private `(mine, expected)` pair the role starts from.
    pub fn turn(self) -> Turn {
        match self {
            Role::A => Turn { mine: 1, expected: 0 },
            Role::B => Turn { mine: 2, expected: 1 },
        }
    }
}

/// A worker's next move on the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Turn {
    pub mine: u64,
    pub expected: u64,
}

impl Turn {
    fn advance(&mut self) {
        // skip the peer's slot
        self.mine += 2;
        self.expected += 2;
    }
}

/// The relay cell. Padded so that nothing else shares its cache line: the
/// two workers must be its only readers while the clock runs.
#[derive(Debug, Default)]
pub struct PingPong {
    current: CachePadded<AtomicU64>,
}

impl PingPong {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// One all-or-nothing attempt to take the token. Advances `turn` on
    /// success, leaves it untouched otherwise.
    #[inline(always)]
    pub fn try_hop(&self, turn: &mut Turn) -> bool {
        let won = self
            .current
            .compare_exchange(turn.expected, turn.mine, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            turn.advance();
        }
        won
    }

    /// Drive `role` until its counter passes `2 * round_trips`.
    ///
    /// `round_trips` above `MAX_ROUND_TRIPS` is clamped to it.
    #[inline(never)]
    pub fn relay(&self, role: Role, round_trips: u64) {
        self.relay_observed(role, round_trips, |_| {})
    }

    /// Same as `relay`, calling `seen` with every value this role publishes.
    #[inline(always)]
    pub fn relay_observed<F: FnMut(u64)>(&self, role: Role, round_trips: u64, mut seen: F) {
        let last = 2 * round_trips.min(MAX_ROUND_TRIPS);
        let mut turn = role.turn();
        while turn.mine <= last {
            let published = turn.mine;
            // no backoff: yielding here would be measured as latency
            if self.try_hop(&mut turn) {
                seen(published);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_moves_first_and_b_cannot() {
        let p = PingPong::new();
        let mut a = Role::A.turn();
        let mut b = Role::B.turn();

        assert!(!p.try_hop(&mut b));
        assert_eq!(b, Role::B.turn());

        assert!(p.try_hop(&mut a));
        assert_eq!(p.load(), 1);
        assert!(!p.try_hop(&mut a));

        assert!(p.try_hop(&mut b));
        assert_eq!(p.load(), 2);
        assert_eq!(a, Turn { mine: 3, expected: 2 });
        assert_eq!(b, Turn { mine: 4, expected: 3 });
    }

    #[test]
    fn zero_round_trips_returns_immediately() {
        let p = PingPong::new();
        p.relay(Role::A, 0);
        p.relay(Role::B, 0);
        assert_eq!(p.load(), 0);
    }

    #[test]
    fn threaded_relay_publishes_every_value_once_in_order() {
        const TRIPS: u64 = 1_000;
        let _spin = crate::spin_guard();
        let p = PingPong::new();

        let (mut odd, even) = crossbeam_utils::thread::scope(|s| {
            let a = s.spawn(|_| {
                let mut v = Vec::new();
                p.relay_observed(Role::A, TRIPS, |x| v.push(x));
                v
            });
            let b = s.spawn(|_| {
                let mut v = Vec::new();
                p.relay_observed(Role::B, TRIPS, |x| v.push(x));
                v
            });
            (a.join().unwrap(), b.join().unwrap())
        })
        .unwrap();

        assert_eq!(odd.len() as u64, TRIPS);
        assert_eq!(even.len() as u64, TRIPS);
        assert!(odd.iter().all(|v| v % 2 == 1));
        assert!(even.iter().all(|v| v % 2 == 0));

        odd.extend(even);
        odd.sort_unstable();
        let expected: Vec<u64> = (1..=2 * TRIPS).collect();
        assert_eq!(odd, expected);
        assert_eq!(p.load(), 2 * TRIPS);
    }

    #[test]
    fn relay_cell_fills_its_cache_line() {
        assert!(std::mem::align_of::<PingPong>() >= 64);
        assert!(std::mem::size_of::<PingPong>() >= 64);
    }

    #[test]
    fn roles_are_complementary() {
        assert_eq!(Role::B.turn().expected, Role::A.turn().mine);
    }
}
