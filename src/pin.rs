//! Pinning of the calling thread to one logical core.

use tracing::debug;

use crate::error::{Error, Result};

/// Size of the logical-core index space: every valid core id is below this.
///
/// This is the number of configured CPUs, not the number the process may
/// use, so a restricted affinity mask or a cgroup quota does not shrink it.
pub fn core_limit() -> usize {
    let configured = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_CONF) };
    if configured > 0 {
        configured as usize
    } else {
        affinity::get_core_num()
    }
}

/// Sorted ids of the cores the calling thread may run on.
///
/// Called from the unpinned main thread this is the process affinity mask,
/// which is what the sweep covers.
pub fn available_cores() -> Result<Vec<usize>> {
    let mut cores = affinity::get_thread_affinity().map_err(|e| Error::Affinity {
        reason: e.to_string(),
    })?;
    cores.sort_unstable();
    cores.dedup();
    Ok(cores)
}

/// Restrict the calling thread to `core` for the rest of its life.
///
/// Only ever binds the caller. A failure here must reach the driver: a worker
/// that silently runs unpinned produces numbers that look fine and mean
/// nothing.
pub fn bind(core: usize) -> Result<()> {
    let count = core_limit();
    if core >= count {
        return Err(Error::CoreOutOfRange { core, count });
    }

    affinity::set_thread_affinity(&[core]).map_err(|e| Error::Bind {
        core,
        reason: e.to_string(),
    })?;

    debug!(core, "bound thread");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn out_of_range_core_is_rejected() {
        let limit = core_limit();
        let err = thread::spawn(move || bind(limit)).join().unwrap().unwrap_err();
        assert!(err.is_bind());
        match err {
            Error::CoreOutOfRange { core, count } => {
                assert_eq!(core, limit);
                assert_eq!(count, limit);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn available_cores_are_sorted_and_in_range() {
        let cores = available_cores().unwrap();
        assert!(!cores.is_empty());
        assert!(cores.windows(2).all(|w| w[0] < w[1]));
        assert!(cores.iter().all(|&c| c < core_limit()));
        assert!(cores.len() <= core_limit());
    }

    #[test]
    fn binds_to_every_available_core() {
        // the highest allowed id must bind too, e.g. core 7 under `taskset -c 4-7`
        for core in available_cores().unwrap() {
            let cores = thread::spawn(move || {
                bind(core).unwrap();
                affinity::get_thread_affinity().unwrap()
            })
            .join()
            .unwrap();
            assert_eq!(cores, vec![core]);
        }
    }
}
