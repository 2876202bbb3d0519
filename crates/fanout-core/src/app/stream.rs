//! ResultStream - dispatch セッションの consumer 側
//!
//! - `next()` は次の結果か close まで待つ（唯一の待ち合わせ点）
//! - N 件返したあとは sink が閉じ、以降はずっと `None`（single-pass）

use std::sync::Arc;

use tokio::sync::mpsc;

use super::sink::{ResultSink, SessionProgress};
use crate::domain::{SessionId, SessionState, TaskResult};

/// A finite, single-pass sequence of results in completion order.
///
/// Yields exactly as many results as tasks were submitted, then `None`
/// forever. Results arrive first-completed, first-yielded; do not rely on
/// submission order.
pub struct ResultStream<T = String> {
    session: SessionId,
    total: usize,
    yielded: usize,
    state: SessionState,
    rx: mpsc::UnboundedReceiver<TaskResult<T>>,
    sink: Arc<ResultSink<T>>,
}

impl<T> ResultStream<T> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<TaskResult<T>>, sink: Arc<ResultSink<T>>) -> Self {
        let progress = sink.progress();
        Self {
            session: sink.session(),
            total: progress.total,
            yielded: 0,
            state: SessionState::Idle,
            rx,
            sink,
        }
    }

    pub(crate) fn transition(&mut self, next: SessionState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal session transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }

    /// Number of submitted tasks.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Results already handed to the consumer.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn progress(&self) -> SessionProgress {
        self.sink.progress()
    }

    /// Wait for the next result. `None` once all results were yielded.
    pub async fn next(&mut self) -> Option<TaskResult<T>> {
        if self.state.is_terminal() {
            return None;
        }
        match self.rx.recv().await {
            Some(result) => {
                self.yielded += 1;
                Some(result)
            }
            None => {
                self.finish();
                None
            }
        }
    }

    /// Drain every remaining result.
    pub async fn collect(mut self) -> Vec<TaskResult<T>> {
        let mut out = Vec::with_capacity(self.total - self.yielded);
        while let Some(result) = self.next().await {
            out.push(result);
        }
        out
    }

    /// Blocking iterator over the remaining results.
    ///
    /// # Panics
    /// Iterating panics when called from inside an async execution context;
    /// use it from plain threads only.
    pub fn into_blocking_iter(self) -> BlockingResults<T> {
        BlockingResults { stream: self }
    }

    fn finish(&mut self) {
        debug_assert_eq!(self.yielded, self.total, "sink closed before all results arrived");
        self.transition(SessionState::Drained);
        tracing::debug!(session = %self.session, yielded = self.yielded, "result stream closed");
    }
}

impl<T> std::fmt::Debug for ResultStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStream")
            .field("session", &self.session)
            .field("total", &self.total)
            .field("yielded", &self.yielded)
            .field("state", &self.state)
            .finish()
    }
}

/// Blocking adapter returned by [`ResultStream::into_blocking_iter`].
#[derive(Debug)]
pub struct BlockingResults<T> {
    stream: ResultStream<T>,
}

impl<T> Iterator for BlockingResults<T> {
    type Item = TaskResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stream.state.is_terminal() {
            return None;
        }
        match self.stream.rx.blocking_recv() {
            Some(result) => {
                self.stream.yielded += 1;
                Some(result)
            }
            None => {
                self.stream.finish();
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.stream.total - self.stream.yielded;
        (left, Some(left))
    }
}
