//! Command line of the `core2core` binary.
//!
//! Every flag is optional; running with none sweeps every core the
//! process may run on.

use std::path::PathBuf;
use std::time::Duration;

use structopt::StructOpt;

use crate::channel::MAX_ROUND_TRIPS;
use crate::matrix::SweepOptions;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "core2core",
    about = "Measure core-to-core latency over an atomic ping-pong"
)]
pub struct Config {
    /// Round trips per core pair
    #[structopt(long, default_value = "10000000", parse(try_from_str = parse_round_trips))]
    pub round_trips: u64,

    /// Pause between pairs, in milliseconds
    #[structopt(long, default_value = "100")]
    pub settle_ms: u64,

    /// Only sweep the first N cores the process may run on
    #[structopt(long)]
    pub cores: Option<usize>,

    /// Artifact path without extension; .html and .csv are written
    #[structopt(long, parse(from_os_str), default_value = "core2core")]
    pub output: PathBuf,

    /// Do not try to raise the process priority
    #[structopt(long)]
    pub no_priority: bool,
}

impl Config {
    pub fn sweep(&self) -> SweepOptions {
        SweepOptions {
            round_trips: self.round_trips,
            settle: Duration::from_millis(self.settle_ms),
        }
    }

    /// Cores to sweep out of the sorted `available` ids.
    pub fn select(&self, mut available: Vec<usize>) -> Vec<usize> {
        if let Some(n) = self.cores {
            available.truncate(n);
        }
        available
    }
}

fn parse_round_trips(s: &str) -> Result<u64, String> {
    let n: u64 = s.parse().map_err(|e| format!("{}", e))?;
    if n > MAX_ROUND_TRIPS {
        return Err(format!("at most {} round trips are supported", MAX_ROUND_TRIPS));
    }
    Ok(n)
}
