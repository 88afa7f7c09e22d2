//! Sequential execution contexts.
//!
//! Every executor here runs tasks strictly in submission order on a single
//! logical thread of control:
//! - [`ManualExecutor`] queues tasks until the owner pumps it (tests)
//! - [`SerialExecutor`] runs tasks on one dedicated worker thread
//! - [`DirectExecutor`] runs tasks inline on the posting thread
//!
//! # Example
//!
//! ```ignore
//! let executor = Arc::new(ManualExecutor::new());
//! executor.execute(Box::new(|| println!("later")))?;
//! assert_eq!(executor.num_pending(), 1);
//! executor.run_all_ready();
//! ```

mod manual;
mod serial;

use crate::error::Result;

pub use manual::ManualExecutor;
pub use serial::SerialExecutor;

/// A unit of work posted to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A sequential task runner.
pub trait Executor: Send + Sync {
    /// Accept `task` for execution after all previously accepted tasks.
    fn execute(&self, task: Task) -> Result<()>;
}

/// Runs every task immediately on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectExecutor;

impl Executor for DirectExecutor {
    fn execute(&self, task: Task) -> Result<()> {
        task();
        Ok(())
    }
}
