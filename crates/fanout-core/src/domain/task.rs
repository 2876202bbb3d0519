//! Task - 識別子と作業（blocking クロージャ or future）の組

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use super::{TaskFailure, TaskId};

/// Boxed async work.
pub type BoxWorkFuture<T> = Pin<Box<dyn Future<Output = Result<T, TaskFailure>> + Send + 'static>>;

/// Boxed blocking work.
pub type BoxWorkFn<T> = Box<dyn FnOnce() -> Result<T, TaskFailure> + Send + 'static>;

/// The unit of work carried by a task.
///
/// - `Blocking` runs on the blocking thread pool (one thread per task).
/// - `Async` runs as its own tokio task.
pub enum Work<T> {
    Blocking(BoxWorkFn<T>),
    Async(BoxWorkFuture<T>),
}

impl<T> fmt::Debug for Work<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Work::Blocking(_) => f.write_str("Work::Blocking(..)"),
            Work::Async(_) => f.write_str("Work::Async(..)"),
        }
    }
}

/// An identifier plus a unit of work. Immutable once built.
///
/// # 使用例
/// ```ignore
/// let task = Task::from_fn(TaskId::new(1), || Ok("Worker 1 completed task".to_string()));
/// let task = Task::from_future(TaskId::new(2), async { Ok("done".to_string()) });
/// ```
#[derive(Debug)]
pub struct Task<T = String> {
    id: TaskId,
    work: Work<T>,
}

impl<T: Send + 'static> Task<T> {
    /// Task whose work is a blocking closure.
    pub fn from_fn<F>(id: TaskId, f: F) -> Self
    where
        F: FnOnce() -> Result<T, TaskFailure> + Send + 'static,
    {
        Self {
            id,
            work: Work::Blocking(Box::new(f)),
        }
    }

    /// Task whose work is a future.
    pub fn from_future<Fut>(id: TaskId, fut: Fut) -> Self
    where
        Fut: Future<Output = Result<T, TaskFailure>> + Send + 'static,
    {
        Self {
            id,
            work: Work::Async(Box::pin(fut)),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self.work, Work::Blocking(_))
    }

    pub(crate) fn into_parts(self) -> (TaskId, Work<T>) {
        (self.id, self.work)
    }
}
