//! Manually pumped executor.

use super::{Executor, Task};
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;

/// FIFO queue that only runs tasks when told to.
///
/// Nothing posted here runs until [`run_next_ready`](Self::run_next_ready)
/// or [`run_all_ready`](Self::run_all_ready) is called, which makes delivery
/// points explicit in tests.
#[derive(Default)]
pub struct ManualExecutor {
    queue: Mutex<VecDeque<Task>>,
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting to run.
    pub fn num_pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Run the oldest pending task. Returns false if the queue was empty.
    pub fn run_next_ready(&self) -> bool {
        // The lock is released before running so the task may post more work.
        let task = self.queue.lock().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until the queue is empty, including tasks posted by the
    /// tasks being run. Returns how many tasks ran.
    pub fn run_all_ready(&self) -> usize {
        let mut ran = 0;
        while self.run_next_ready() {
            ran += 1;
        }
        ran
    }
}

impl Executor for ManualExecutor {
    fn execute(&self, task: Task) -> Result<()> {
        self.queue.lock().push_back(task);
        Ok(())
    }
}

impl fmt::Debug for ManualExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualExecutor")
            .field("pending", &self.num_pending())
            .finish()
    }
}
