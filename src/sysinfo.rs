//! Host information and process setup around the sweep.

use std::fs;
use std::io;
use std::path::Path;

use tracing::warn;

/// CPU model name, used as a title only. Empty if it cannot be found.
pub fn cpu_name() -> String {
    cpu_name_from(Path::new("/proc/cpuinfo"))
}

/// Model name from a cpuinfo-formatted file at `path`, or empty.
pub fn cpu_name_from(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(info) => parse_model_name(&info).unwrap_or_else(|| {
            warn!(path = %path.display(), "no model name");
            String::new()
        }),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cpu name unavailable");
            String::new()
        }
    }
}

/// First `model name` entry of a `/proc/cpuinfo` dump.
pub fn parse_model_name(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .filter_map(|line| {
            let mut kv = line.splitn(2, ':');
            let key = kv.next()?.trim();
            let value = kv.next()?.trim();
            if key == "model name" && !value.is_empty() {
                Some(value.to_string())
            } else {
                None
            }
        })
        .next()
}

/// Raise the whole process to the highest scheduling priority.
///
/// Usually needs root or `CAP_SYS_NICE`. Failing only makes the readings
/// noisier.
pub fn elevate_priority() -> io::Result<()> {
    // setpriority's `which` argument is a different integer type on glibc
    let ret = unsafe { libc::setpriority(libc::PRIO_PROCESS as _, 0, -20) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
