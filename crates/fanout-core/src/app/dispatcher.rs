//! Dispatcher - タスクを並行実行し、結果を完了順に 1 本のストリームで返す
//!
//! # フロー（submit 1 回 = 1 セッション）
//! 1. SessionId を発行し、ResultSink（残数 = N）と ResultStream を作る
//! 2. タスクごとに Reporter を先に作る（feeder が落ちても Abandoned で報告される）
//! 3. 上限なし: タスクごとに tokio task を即起動
//!    上限あり: feeder task が submit 順に permit を取り、取れたタスクから起動する
//! 4. 作業を実行（blocking → spawn_blocking、async → spawn）し、panic を TaskFailure に変換
//! 5. Reporter::report で結果を流す。最後の報告者が sink を閉じる

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinHandle};

use super::builder::DispatcherBuilder;
use super::sink::{Reporter, ResultSink};
use super::stream::ResultStream;
use crate::config::DispatcherConfig;
use crate::domain::{DispatchError, SessionState, Task, TaskFailure, Work};
use crate::ports::{Clock, EventSink, IdGenerator};

/// Runs batches of independent tasks concurrently.
///
/// Cheap to clone; clones share the concurrency limit.
#[derive(Clone)]
pub struct Dispatcher {
    pub(crate) config: DispatcherConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) events: Arc<dyn EventSink>,
    pub(crate) limiter: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    /// Unbounded dispatcher with the default ports.
    pub fn new() -> Self {
        DispatcherBuilder::new().assemble()
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Submit a batch of tasks and get back their result stream.
    ///
    /// Every task starts immediately (or as soon as a permit frees up when
    /// `max_concurrency` is set). Each submission is an independent session.
    ///
    /// # Errors
    /// `DispatchError::InvalidArgument` when called outside a Tokio runtime.
    pub fn submit<T, I>(&self, tasks: I) -> Result<ResultStream<T>, DispatchError>
    where
        T: Send + 'static,
        I: IntoIterator<Item = Task<T>>,
    {
        let runtime = Handle::try_current().map_err(|_| {
            DispatchError::InvalidArgument(
                "submit must be called from within a Tokio runtime".to_string(),
            )
        })?;

        let tasks: Vec<Task<T>> = tasks.into_iter().collect();
        let session = self.ids.generate_session_id();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let sink = Arc::new(ResultSink::new(
            session,
            tasks.len(),
            tx,
            Arc::clone(&self.clock),
            Arc::clone(&self.events),
        ));
        let mut stream = ResultStream::new(rx, Arc::clone(&sink));
        sink.announce();

        if tasks.is_empty() {
            sink.close_empty();
            stream.transition(SessionState::Drained);
            return Ok(stream);
        }

        let jobs: Vec<(Work<T>, Reporter<T>)> = tasks
            .into_iter()
            .map(|task| {
                let (task_id, work) = task.into_parts();
                (work, Reporter::new(task_id, Arc::clone(&sink)))
            })
            .collect();

        match &self.limiter {
            Some(semaphore) => {
                runtime.spawn(feed_in_order(jobs, Arc::clone(semaphore)));
            }
            None => {
                for (work, reporter) in jobs {
                    runtime.spawn(run_task(work, reporter, None));
                }
            }
        }
        stream.transition(SessionState::Running);

        Ok(stream)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Admit jobs one by one in submission order, each holding a permit while it runs.
async fn feed_in_order<T: Send + 'static>(
    jobs: Vec<(Work<T>, Reporter<T>)>,
    semaphore: Arc<Semaphore>,
) {
    for (work, reporter) in jobs {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            // 残りの Reporter は drop 時に Abandoned を報告する
            reporter.report(Err(TaskFailure::abandoned()));
            return;
        };
        tokio::spawn(run_task(work, reporter, Some(permit)));
    }
}

async fn run_task<T: Send + 'static>(
    work: Work<T>,
    reporter: Reporter<T>,
    permit: Option<OwnedSemaphorePermit>,
) {
    tracing::trace!(task = %reporter.task_id(), "task started");
    let handle: JoinHandle<Result<T, TaskFailure>> = match work {
        Work::Blocking(f) => tokio::task::spawn_blocking(f),
        Work::Async(fut) => tokio::spawn(fut),
    };
    let outcome = handle.await.unwrap_or_else(failure_from_join_error);
    drop(permit);
    reporter.report(outcome);
}

fn failure_from_join_error<T>(err: JoinError) -> Result<T, TaskFailure> {
    if err.is_panic() {
        Err(TaskFailure::from_panic(&*err.into_panic()))
    } else {
        Err(TaskFailure::abandoned())
    }
}
