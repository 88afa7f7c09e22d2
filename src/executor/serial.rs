//! Executor backed by a single worker thread.

use super::{Executor, Task};
use crate::error::{FlagError, Result};
use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

/// Runs posted tasks in order on one named worker thread.
pub struct SerialExecutor {
    name: String,
    /// `None` once shut down.
    sender: Mutex<Option<Sender<Task>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SerialExecutor {
    /// Spawn the worker thread.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (sender, receiver) = unbounded::<Task>();

        let thread_name = name.clone();
        let worker = thread::Builder::new().name(name.clone()).spawn(move || {
            // Ends once every sender is dropped and the queue is drained.
            for task in receiver {
                if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                    tracing::error!(executor = %thread_name, "task panicked");
                }
            }
            tracing::debug!(executor = %thread_name, "worker exiting");
        })?;

        Ok(Self {
            name,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Name of the worker thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop accepting tasks, run what is already queued, and join the worker.
    ///
    /// Calling this from a task running on this executor only closes the queue.
    pub fn shutdown(&self) {
        self.sender.lock().take();

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                tracing::error!(executor = %self.name, "worker thread panicked");
            }
        }
    }
}

impl Executor for SerialExecutor {
    fn execute(&self, task: Task) -> Result<()> {
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(sender) => sender.send(task).map_err(|_| FlagError::ExecutorClosed),
            None => Err(FlagError::ExecutorClosed),
        }
    }
}

impl Drop for SerialExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for SerialExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialExecutor")
            .field("name", &self.name)
            .field("open", &self.sender.lock().is_some())
            .finish()
    }
}
