//! Executors running worker tasks off the reactor thread.
//!
//! Worker tasks block on the content buffers, so they must never run on the reactor
//! thread. Two implementations are provided:
//!
//! - [`ThreadExecutor`]: one named OS thread per task
//! - [`TokioExecutor`]: tokio's blocking thread pool

use std::fmt;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tokio::runtime::Handle;

/// A unit of work submitted to an [`Executor`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks asynchronously.
///
/// Submission is fire-and-forget: `execute` returns as soon as the task is accepted.
/// An error means the task was rejected and will never run.
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task) -> io::Result<()>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, task: Task) -> io::Result<()> {
        (**self).execute(task)
    }
}

/// Spawns a dedicated, named OS thread for every task.
pub struct ThreadExecutor {
    name_prefix: String,
    counter: AtomicUsize,
}

impl ThreadExecutor {
    pub fn new() -> Self {
        Self::with_name_prefix("http-worker")
    }

    pub fn with_name_prefix<S: Into<String>>(name_prefix: S) -> Self {
        Self { name_prefix: name_prefix.into(), counter: AtomicUsize::new(0) }
    }
}

impl Default for ThreadExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ThreadExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadExecutor")
            .field("name_prefix", &self.name_prefix)
            .field("spawned", &self.counter.load(Ordering::Relaxed))
            .finish()
    }
}

impl Executor for ThreadExecutor {
    fn execute(&self, task: Task) -> io::Result<()> {
        let id = self.counter.fetch_add(1, Ordering::Relaxed);
        thread::Builder::new().name(format!("{}-{id}", self.name_prefix)).spawn(task)?;
        Ok(())
    }
}

/// Runs tasks on the blocking pool of a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Executor bound to the runtime the caller is running in.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, task: Task) -> io::Result<()> {
        drop(self.handle.spawn_blocking(task));
        Ok(())
    }
}
