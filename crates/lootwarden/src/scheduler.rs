//! # Repeating Tasks
//!
//! Polling timers for the quest cycle check, raid ticks and periodic saves.
//! Each task owns a thread that waits on a `crossbeam_channel::tick` and a
//! cancel channel; whichever fires first decides.
//!
//! A job that panics is logged and the timer keeps running. This only holds
//! where panics unwind: the release profile aborts, so host trait
//! implementations called from a job must not panic.
//!
//! `cancel` is idempotent: cancelling twice, cancelling a finished task and
//! dropping a cancelled task are all no-ops.

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::Mutex;

use crate::error::{PluginError, PluginResult};

/// A cancellable timer running `job` every `interval`.
pub struct RepeatingTask {
    name: String,
    cancel: Mutex<Option<Sender<()>>>,
    handle: Mutex<Option<JoinHandle<u64>>>,
}

impl std::fmt::Debug for RepeatingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepeatingTask")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .finish()
    }
}

impl RepeatingTask {
    /// Starts the task. The first run happens one `interval` after start.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<F>(name: &str, interval: Duration, mut job: F) -> PluginResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let ticker = tick(interval);
        let thread_name = format!("lootwarden-{name}");
        let thread_label = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                let mut runs = 0_u64;
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            if panic::catch_unwind(AssertUnwindSafe(&mut job)).is_ok() {
                                runs += 1;
                            } else {
                                tracing::error!(task = %thread_label, "Task run panicked, timer continues");
                            }
                        }
                        recv(cancel_rx) -> _ => break,
                    }
                }
                runs
            })
            .map_err(|source| PluginError::Task {
                name: name.to_string(),
                source,
            })?;
        tracing::debug!(task = name, ?interval, "Task started");
        Ok(Self {
            name: name.to_string(),
            cancel: Mutex::new(Some(cancel_tx)),
            handle: Mutex::new(Some(handle)),
        })
    }

    /// Task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true until the task is cancelled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.cancel.lock().is_some()
    }

    /// Stops the task and waits for a running job to finish.
    ///
    /// Returns the number of runs that finished without panicking the first
    /// time, `None` after.
    pub fn cancel(&self) -> Option<u64> {
        // Dropping the sender disconnects the cancel channel.
        drop(self.cancel.lock().take()?);
        let handle = self.handle.lock().take()?;
        if handle.thread().id() == thread::current().id() {
            return None;
        }
        match handle.join() {
            Ok(runs) => {
                tracing::debug!(task = %self.name, runs, "Task cancelled");
                Some(runs)
            }
            Err(_) => {
                tracing::error!(task = %self.name, "Task thread panicked");
                None
            }
        }
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
