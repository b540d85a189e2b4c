//! Deferred release of objects shared with the audio thread.

/*
Deferred Release
================

The audio thread must never free memory: deallocation can take a lock inside
the allocator and stall the callback. Yet shared resources (coefficient sets,
impulse responses, lookup tables) do get replaced while audio runs.

The pattern:

  1. The control thread builds the new object in an `Arc`.
  2. It registers the object with the pool (`add`), which keeps one extra
     strong reference.
  3. The audio thread swaps its handle to the new object. Its old handle
     just drops a reference; since the pool still holds one, nothing is
     freed on the audio thread.
  4. A maintenance thread wakes every interval and drops every pool entry
     whose strong count is 1, meaning nobody but the pool still refers to
     it. The actual deallocation happens there.

Only the control thread and the maintenance thread touch the pool's lock.
*/

use std::{any::Any, sync::Arc, time::Duration};

use parking_lot::Mutex;

use crate::{config::DspConfig, engine::scheduler::Scheduler, error::DspResult};

type Entry = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
struct Entries {
    objects: Mutex<Vec<Entry>>,
}

impl Entries {
    fn sweep(&self) -> usize {
        // Collected outside the lock so destructors run unlocked.
        let released: Vec<Entry> = {
            let mut objects = self.objects.lock();
            let (keep, release) = objects.drain(..).partition(|e| Arc::strong_count(e) > 1);
            *objects = keep;
            release
        };

        let count = released.len();
        if count > 0 {
            log::trace!("release pool: freed {count} objects");
        }
        count
    }
}

/// Holds retiring shared objects until nothing else references them.
#[derive(Default)]
pub struct ReleasePool {
    entries: Arc<Entries>,
    scheduler: Option<Scheduler>,
}

impl ReleasePool {
    /// A pool without a maintenance thread. Call `sweep` yourself.
    pub fn new() -> Self {
        Self::default()
    }

    /// A pool swept by a background thread every `interval`.
    pub fn spawn(interval: Duration) -> DspResult<Self> {
        let entries = Arc::new(Entries::default());
        let task_entries = Arc::clone(&entries);

        let scheduler = Scheduler::spawn("release-pool", interval, move || {
            task_entries.sweep();
        })?;

        Ok(Self {
            entries,
            scheduler: Some(scheduler),
        })
    }

    /// A background pool swept every `config.release_interval`.
    pub fn from_config(config: &DspConfig) -> DspResult<Self> {
        Self::spawn(config.release_interval)
    }

    /// Keep an extra reference to `object` until it is the last one left.
    ///
    /// Locks briefly; call from the control thread, never the audio thread.
    pub fn add<T>(&self, object: &Arc<T>)
    where
        T: Any + Send + Sync,
    {
        let entry: Entry = object.clone();
        self.entries.objects.lock().push(entry);
    }

    /// Drop every entry nobody else refers to. Returns how many were freed.
    pub fn sweep(&self) -> usize {
        self.entries.sweep()
    }

    pub fn len(&self) -> usize {
        self.entries.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True while a maintenance thread is attached.
    pub fn is_scheduled(&self) -> bool {
        self.scheduler.as_ref().is_some_and(Scheduler::is_running)
    }

    /// Stop the maintenance thread and run one last sweep.
    ///
    /// Entries still referenced elsewhere stay in the pool.
    pub fn shutdown(&mut self) {
        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.stop();
        }
        self.sweep();
    }
}

impl Drop for ReleasePool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
