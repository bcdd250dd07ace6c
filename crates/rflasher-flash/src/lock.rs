//! Process-wide mutual-exclusion envelope
//!
//! On entry, a single filesystem big-lock guarantees at-most-one flashing
//! process machine-wide (`open+flock+write-pid`, with a bounded polling
//! wait). On success a PID file is dropped into a power-management daemon's
//! interlock directory, if that directory exists, so the daemon can avoid
//! suspending the machine mid-operation. Both are released on every exit
//! path via `Drop`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::SessionError;

/// Default path for the whole-machine big lock.
pub const DEFAULT_LOCK_PATH: &str = "/var/lock/rflasher.lock";

/// Default directory a power-management daemon watches for PID files of
/// processes it must not suspend under.
pub const DEFAULT_POWERD_LOCK_DIR: &str = "/var/run/power_manager/lock";

/// Default timeout for big-lock acquisition.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(180);

/// Interval the lock-acquisition loop polls at.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A scoped acquisition of the process-wide big lock and the powerd
/// interlock. Both are released when this value is dropped, covering
/// normal return as well as early failure paths.
pub struct ProcessEnvelope {
    lock_file: Option<File>,
    powerd_pid_path: Option<PathBuf>,
}

impl ProcessEnvelope {
    /// Acquire the big lock (and, if the powerd directory exists, write a
    /// PID file into it). Polls at a coarse interval until `timeout`
    /// elapses, then fails with `SessionError::Environment`.
    pub fn acquire(
        lock_path: impl AsRef<Path>,
        powerd_dir: impl AsRef<Path>,
        timeout: Duration,
    ) -> Result<Self, SessionError> {
        let lock_path = lock_path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(lock_path)
            .map_err(|e| {
                SessionError::environment(format!(
                    "could not open lock file {}: {}",
                    lock_path.display(),
                    e
                ))
            })?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => break,
                Err(_) if Instant::now() < deadline => {
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(_) => {
                    return Err(SessionError::environment(
                        "could not acquire lock: timed out",
                    ));
                }
            }
        }

        let mut locked = file;
        let pid = std::process::id();
        let _ = locked.set_len(0);
        if let Err(e) = write!(locked, "{}", pid) {
            let _ = fs2::FileExt::unlock(&locked);
            return Err(SessionError::environment(format!(
                "could not write pid to lock file: {}",
                e
            )));
        }

        let powerd_dir = powerd_dir.as_ref();
        let powerd_pid_path = if powerd_dir.is_dir() {
            let path = powerd_dir.join(format!("rflasher.{}", pid));
            match std::fs::write(&path, pid.to_string()) {
                Ok(()) => Some(path),
                Err(e) => {
                    let _ = fs2::FileExt::unlock(&locked);
                    return Err(SessionError::environment(format!(
                        "powerd lock write failed: {}",
                        e
                    )));
                }
            }
        } else {
            None
        };

        Ok(Self {
            lock_file: Some(locked),
            powerd_pid_path,
        })
    }

    /// A no-op envelope, used when the caller passes `--ignore-lock`.
    pub fn disabled() -> Self {
        Self {
            lock_file: None,
            powerd_pid_path: None,
        }
    }
}

impl Drop for ProcessEnvelope {
    fn drop(&mut self) {
        if let Some(path) = self.powerd_pid_path.take() {
            let _ = std::fs::remove_file(path);
        }
        if let Some(file) = self.lock_file.take() {
            let _ = fs2::FileExt::unlock(&file);
        }
    }
}
