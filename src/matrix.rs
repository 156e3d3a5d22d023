//! The core x core latency grid and the sweep that fills it.

use std::thread;
use std::time::Duration;

use tracing::{error, info};

use crate::driver::Driver;
use crate::error::{Error, Result};

pub const DEFAULT_ROUND_TRIPS: u64 = 10_000_000;
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(100);

/// Square grid of per-hop latencies in nanoseconds, indexed `[from][to]`.
///
/// Positions run over `0..size()`; `cores()[i]` is the OS core id behind
/// position `i`. Diagonal cells are `None`: a core is never measured against
/// itself, and that is kept apart from a genuine zero reading.
#[derive(Clone, Debug, PartialEq)]
pub struct LatencyMatrix {
    size: usize,
    cores: Vec<usize>,
    cells: Vec<Option<f64>>,
}

impl LatencyMatrix {
    pub fn new(cores: Vec<usize>) -> Self {
        let size = cores.len();
        Self {
            size,
            cores,
            cells: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cores(&self) -> &[usize] {
        &self.cores
    }

    pub fn get(&self, from: usize, to: usize) -> Option<f64> {
        self.cells[from * self.size + to]
    }

    fn set(&mut self, from: usize, to: usize, ns: f64) {
        debug_assert_ne!(from, to);
        self.cells[from * self.size + to] = Some(ns);
    }

    pub fn row(&self, from: usize) -> &[Option<f64>] {
        &self.cells[from * self.size..(from + 1) * self.size]
    }

    /// Smallest and largest measured value, `None` when nothing was measured.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.cells.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Rounded to two decimals, the precision the matrix stores.
pub fn round2(ns: f64) -> f64 {
    (ns * 100.0).round() / 100.0
}

#[derive(Clone, Debug)]
pub struct SweepOptions {
    pub round_trips: u64,
    /// Pause between two pair measurements. Never part of any reading.
    pub settle: Duration,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            round_trips: DEFAULT_ROUND_TRIPS,
            settle: DEFAULT_SETTLE,
        }
    }
}

/// Measure every ordered pair of `cores`.
pub fn run(cores: &[usize], opts: &SweepOptions) -> Result<LatencyMatrix> {
    let driver = Driver::new();
    let round_trips = opts.round_trips;
    run_with(cores, opts.settle, |from, to| {
        driver.measure(from, to, round_trips)
    })
}

/// Row-major sweep over all pairs of distinct positions in `cores`, calling
/// `measure` with the two core ids.
///
/// The first failing pair stops the sweep; there is no partial matrix.
pub fn run_with<F>(cores: &[usize], settle: Duration, mut measure: F) -> Result<LatencyMatrix>
where
    F: FnMut(usize, usize) -> Result<f64>,
{
    let n = cores.len();
    let mut matrix = LatencyMatrix::new(cores.to_vec());
    let total = n * n.saturating_sub(1);
    let mut done = 0;

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if done > 0 && settle > Duration::from_secs(0) {
                thread::sleep(settle);
            }

            let (from, to) = (cores[i], cores[j]);
            let ns = measure(from, to).map_err(|e| {
                error!(from, to, error = %e, "measurement failed");
                Error::Pair {
                    from,
                    to,
                    source: Box::new(e),
                }
            })?;
            let ns = round2(ns);
            matrix.set(i, j, ns);

            done += 1;
            info!(from, to, ns, "pair {}/{}", done, total);
        }
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_stays_empty_and_rest_is_filled() {
        let m = run_with(&[0, 1, 2, 3], Duration::from_secs(0), |from, to| {
            Ok((from * 10 + to) as f64 + 0.004)
        })
        .unwrap();

        assert_eq!(m.size(), 4);
        for from in 0..4 {
            assert_eq!(m.row(from).len(), 4);
            for to in 0..4 {
                if from == to {
                    assert_eq!(m.get(from, to), None);
                } else {
                    assert_eq!(m.get(from, to), Some((from * 10 + to) as f64));
                }
            }
        }
        assert_eq!(m.range(), Some((1.0, 32.0)));
    }

    #[test]
    fn pairs_are_visited_row_major() {
        let mut seen = Vec::new();
        run_with(&[0, 1, 2], Duration::from_secs(0), |from, to| {
            seen.push((from, to));
            Ok(1.0)
        })
        .unwrap();
        assert_eq!(seen, vec![(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)]);
    }

    #[test]
    fn asymmetric_readings_are_kept_as_is() {
        let m = run_with(&[0, 1], Duration::from_secs(0), |from, _| {
            Ok(if from == 0 { 40.0 } else { 75.5 })
        })
        .unwrap();
        assert_eq!(m.get(0, 1), Some(40.0));
        assert_eq!(m.get(1, 0), Some(75.5));
    }

    #[test]
    fn first_failure_aborts_the_sweep() {
        let mut calls = 0;
        let err = run_with(&[0, 1, 2], Duration::from_secs(0), |from, to| {
            calls += 1;
            if (from, to) == (1, 0) {
                Err(Error::CoreOutOfRange { core: 1, count: 1 })
            } else {
                Ok(1.0)
            }
        })
        .unwrap_err();

        assert_eq!(calls, 3);
        assert!(err.is_bind());
        match err {
            Error::Pair { from: 1, to: 0, .. } => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(12.345_6), 12.35);
        assert_eq!(round2(0.001), 0.0);
    }

    #[test]
    fn empty_matrix_has_no_range() {
        assert_eq!(LatencyMatrix::new(vec![0]).range(), None);
        assert_eq!(run_with(&[0], Duration::from_secs(0), |_, _| Ok(1.0)).unwrap().size(), 1);
    }

    #[test]
    fn positions_map_to_os_core_ids() {
        // e.g. `taskset -c 4,5,7`
        let mut seen = Vec::new();
        let m = run_with(&[4, 5, 7], Duration::from_secs(0), |from, to| {
            seen.push((from, to));
            Ok((from * 10 + to) as f64)
        })
        .unwrap();

        assert_eq!(m.cores(), &[4, 5, 7]);
        assert_eq!(m.size(), 3);
        assert_eq!(seen[0], (4, 5));
        assert_eq!(seen[5], (7, 5));
        assert_eq!(m.get(0, 1), Some(45.0));
        assert_eq!(m.get(2, 0), Some(74.0));
        assert_eq!(m.get(1, 1), None);
    }
}
