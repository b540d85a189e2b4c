//! Periodic maintenance thread.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::{DspError, DspResult};

#[derive(Default)]
struct Signal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

/// Runs a task on a named background thread once per interval.
///
/// Dropping the scheduler (or calling `stop`) wakes the thread immediately and
/// joins it, so shutdown never waits out a full interval.
pub struct Scheduler {
    name: String,
    signal: Arc<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn the thread. The first run happens one `interval` from now.
    pub fn spawn<F>(name: &str, interval: Duration, mut task: F) -> DspResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        if interval.is_zero() {
            return Err(DspError::InvalidInterval(interval));
        }

        let signal = Arc::new(Signal::default());
        let thread_signal = Arc::clone(&signal);
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                log::debug!("{thread_name}: started ({interval:?} interval)");

                let mut stopped = thread_signal.stopped.lock();
                while !*stopped {
                    let result = thread_signal.wake.wait_for(&mut stopped, interval);
                    if *stopped {
                        break;
                    }
                    if result.timed_out() {
                        MutexGuard::unlocked(&mut stopped, &mut task);
                    }
                }

                log::debug!("{thread_name}: stopped");
            })
            .map_err(|e| {
                log::error!("failed to spawn {name} thread: {e}");
                DspError::Spawn(e)
            })?;

        Ok(Self {
            name: name.to_string(),
            signal,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Wake and join the thread. Idempotent.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        *self.signal.stopped.lock() = true;
        self.signal.wake.notify_all();

        if handle.join().is_err() {
            log::error!("{}: task panicked", self.name);
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
