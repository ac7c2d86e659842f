//! Background thread that runs a sweep job on a fixed interval.
//!
//! The job is supplied by the host so it can own whatever it needs (for
//! SQLite, its own connection). The first run happens one interval after
//! spawn; the startup sweep is the host's job.

use log::{info, warn};
use std::sync::mpsc::{channel, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const THREAD_NAME: &str = "pocketlife-sweep";

/// Counters returned when the periodic task stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicSweepStats {
    pub runs: usize,
}

/// Cancellable handle to a periodic sweep thread.
///
/// Dropping the handle stops the thread and waits for an in-flight run to
/// finish.
pub struct PeriodicSweep {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<PeriodicSweepStats>>,
}

impl PeriodicSweep {
    /// Spawns a thread that calls `job` every `interval` until stopped.
    ///
    /// # Errors
    /// Returns the OS error when the thread cannot be spawned.
    pub fn spawn<F>(interval: Duration, mut job: F) -> std::io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (stop_tx, stop_rx) = channel::<()>();
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || {
                let mut stats = PeriodicSweepStats::default();
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {
                            job();
                            stats.runs += 1;
                        }
                    }
                }
                stats
            })?;

        info!(
            "event=periodic_sweep module=schedule status=start interval_secs={}",
            interval.as_secs()
        );
        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Stops the thread and returns its counters.
    pub fn stop(mut self) -> PeriodicSweepStats {
        self.shutdown()
    }

    fn shutdown(&mut self) -> PeriodicSweepStats {
        let Some(handle) = self.handle.take() else {
            return PeriodicSweepStats::default();
        };
        let _ = self.stop_tx.send(());
        match handle.join() {
            Ok(stats) => {
                info!(
                    "event=periodic_sweep module=schedule status=stopped runs={}",
                    stats.runs
                );
                stats
            }
            Err(_) => {
                warn!("event=periodic_sweep module=schedule status=error error_code=job_panicked");
                PeriodicSweepStats::default()
            }
        }
    }
}

impl Drop for PeriodicSweep {
    fn drop(&mut self) {
        self.shutdown();
    }
}
