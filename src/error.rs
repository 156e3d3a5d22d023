use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    /// The OS refused to pin the calling thread.
    Bind { core: usize, reason: String },
    /// Requested core does not exist on this machine.
    CoreOutOfRange { core: usize, count: usize },
    /// The process affinity mask could not be read.
    Affinity { reason: String },
    /// A measurement was asked to ping-pong a core with itself.
    SamePair { core: usize },
    /// So many round trips that the hop counters would overflow.
    TooManyRoundTrips { round_trips: u64, max: u64 },
    Spawn { core: usize, source: io::Error },
    WorkerPanicked { core: usize },
    /// A worker of the pair panicked and was not joined individually.
    PairPanicked { core_a: usize, core_b: usize },
    Export { path: PathBuf, source: io::Error },
    /// Any of the above, tagged with the pair whose measurement it aborted.
    Pair {
        from: usize,
        to: usize,
        source: Box<Error>,
    },
}

impl Error {
    /// True for every failure to pin a worker, whatever the cause.
    pub fn is_bind(&self) -> bool {
        match self {
            Error::Bind { .. } | Error::CoreOutOfRange { .. } => true,
            Error::Pair { source, .. } => source.is_bind(),
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Bind { core, reason } => {
                write!(f, "failed to bind thread to core {}: {}", core, reason)
            }
            Error::CoreOutOfRange { core, count } => write!(
                f,
                "core {} out of range, machine has {} logical cores",
                core, count
            ),
            Error::Affinity { reason } => write!(f, "cannot read affinity mask: {}", reason),
            Error::TooManyRoundTrips { round_trips, max } => write!(
                f,
                "{} round trips requested, at most {} supported",
                round_trips, max
            ),
            Error::SamePair { core } => {
                write!(f, "cannot measure core {} against itself", core)
            }
            Error::Spawn { core, .. } => write!(f, "failed to spawn worker for core {}", core),
            Error::WorkerPanicked { core } => write!(f, "worker on core {} panicked", core),
            Error::PairPanicked { core_a, core_b } => write!(
                f,
                "a worker of pair {} -> {} panicked",
                core_a, core_b
            ),
            Error::Export { path, .. } => write!(f, "failed to write {}", path.display()),
            Error::Pair { from, to, .. } => {
                write!(f, "measurement of pair {} -> {} aborted", from, to)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Spawn { source, .. } | Error::Export { source, .. } => Some(source),
            Error::Pair { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
