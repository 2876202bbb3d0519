//! ResultSink - セッション内の全タスクが共有する結果の受け口
//!
//! # 不変条件
//! - 各タスクは `Reporter` を 1 つだけ持ち、`report(self, ..)` で消費する（at-most-once）
//! - `Reporter` が報告せずに drop された場合は Abandoned として報告する（no loss）
//! - 残数が 0 になった報告者だけが sender を閉じる（exactly-once close）

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::{DispatchEvent, OutcomeKind, SessionId, TaskFailure, TaskId, TaskResult};
use crate::ports::{Clock, EventSink};

/// Read-only snapshot of a session's progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProgress {
    /// Number of submitted tasks.
    pub total: usize,
    /// Results handed to the sink so far (`succeeded + failed`).
    pub delivered: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl SessionProgress {
    pub fn remaining(&self) -> usize {
        self.total - self.delivered
    }

    pub fn is_complete(&self) -> bool {
        self.delivered == self.total
    }
}

pub(crate) struct ResultSink<T> {
    session: SessionId,
    total: usize,
    tx: Mutex<Option<mpsc::UnboundedSender<TaskResult<T>>>>,
    remaining: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
}

impl<T> ResultSink<T> {
    pub(crate) fn new(
        session: SessionId,
        total: usize,
        tx: mpsc::UnboundedSender<TaskResult<T>>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            session,
            total,
            tx: Mutex::new(Some(tx)),
            remaining: AtomicUsize::new(total),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            clock,
            events,
        }
    }

    pub(crate) fn session(&self) -> SessionId {
        self.session
    }

    pub(crate) fn progress(&self) -> SessionProgress {
        // remaining は close 判定専用。delivered は内訳の和から出すので常に整合する
        let succeeded = self.succeeded.load(Ordering::Acquire);
        let failed = self.failed.load(Ordering::Acquire);
        SessionProgress {
            total: self.total,
            delivered: succeeded + failed,
            succeeded,
            failed,
        }
    }

    pub(crate) fn announce(&self) {
        self.events.emit(DispatchEvent::SessionStarted {
            session: self.session,
            tasks: self.total,
            at: self.clock.now(),
        });
    }

    /// Close an empty session. Only valid when nothing was submitted.
    pub(crate) fn close_empty(&self) {
        debug_assert_eq!(self.total, 0);
        self.close();
    }

    fn deliver(&self, result: TaskResult<T>) {
        let task_id = result.task_id;
        let kind = result.kind();
        match kind {
            OutcomeKind::Success => self.succeeded.fetch_add(1, Ordering::AcqRel),
            OutcomeKind::Failure => self.failed.fetch_add(1, Ordering::AcqRel),
        };

        {
            let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref() {
                Some(tx) => {
                    if tx.send(result).is_err() {
                        tracing::debug!(session = %self.session, task = %task_id, "result stream dropped, discarding result");
                    }
                }
                None => {
                    tracing::error!(session = %self.session, task = %task_id, "result reported after sink closed");
                    return;
                }
            }
        }

        self.events.emit(DispatchEvent::TaskCompleted {
            session: self.session,
            task_id,
            kind,
            at: self.clock.now(),
        });

        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.close();
        }
    }

    fn close(&self) {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(tx) = tx else {
            return;
        };

        // Drained must be recorded before the consumer can observe the close.
        let progress = self.progress();
        self.events.emit(DispatchEvent::SessionDrained {
            session: self.session,
            delivered: progress.delivered,
            succeeded: progress.succeeded,
            failed: progress.failed,
            at: self.clock.now(),
        });
        drop(tx);
    }
}

/// A task's single-use handle for delivering its result.
pub(crate) struct Reporter<T> {
    task_id: TaskId,
    sink: Option<Arc<ResultSink<T>>>,
}

impl<T> Reporter<T> {
    pub(crate) fn new(task_id: TaskId, sink: Arc<ResultSink<T>>) -> Self {
        Self {
            task_id,
            sink: Some(sink),
        }
    }

    pub(crate) fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub(crate) fn report(mut self, outcome: Result<T, TaskFailure>) {
        if let Some(sink) = self.sink.take() {
            sink.deliver(TaskResult {
                task_id: self.task_id,
                outcome,
            });
        }
    }
}

impl<T> Drop for Reporter<T> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.take() {
            tracing::warn!(session = %sink.session(), task = %self.task_id, "task dropped without reporting");
            sink.deliver(TaskResult::err(self.task_id, TaskFailure::abandoned()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;
    use crate::impls::RecordingEventSink;
    use crate::ports::SystemClock;
    use ulid::Ulid;

    fn sink(total: usize) -> (Arc<ResultSink<String>>, mpsc::UnboundedReceiver<TaskResult<String>>, Arc<RecordingEventSink>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let events = Arc::new(RecordingEventSink::new());
        let sink = Arc::new(ResultSink::new(
            SessionId::from_ulid(Ulid::new()),
            total,
            tx,
            Arc::new(SystemClock),
            events.clone(),
        ));
        (sink, rx, events)
    }

    #[test]
    fn closes_after_last_report() {
        let (sink, mut rx, events) = sink(2);
        Reporter::new(TaskId::new(1), sink.clone()).report(Ok("a".to_string()));
        assert!(!sink.progress().is_complete());

        Reporter::new(TaskId::new(2), sink.clone()).report(Err(TaskFailure::new("b")));
        let progress = sink.progress();
        assert!(progress.is_complete());
        assert_eq!(progress.succeeded, 1);
        assert_eq!(progress.failed, 1);

        assert_eq!(rx.try_recv().unwrap().task_id, TaskId::new(1));
        assert_eq!(rx.try_recv().unwrap().task_id, TaskId::new(2));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));

        let drained = events
            .events()
            .into_iter()
            .filter(|e| matches!(e, DispatchEvent::SessionDrained { .. }))
            .count();
        assert_eq!(drained, 1);
    }

    #[test]
    fn dropped_reporter_counts_as_abandoned() {
        let (sink, mut rx, _events) = sink(1);
        drop(Reporter::new(TaskId::new(5), sink.clone()));

        let result = rx.try_recv().unwrap();
        assert_eq!(result.task_id, TaskId::new(5));
        assert_eq!(result.failure().map(|f| f.kind), Some(FailureKind::Abandoned));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn empty_session_closes_once() {
        let (sink, mut rx, events) = sink(0);
        sink.close_empty();
        sink.close_empty();
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn progress_snapshots_stay_consistent_under_contention() {
        let (sink, _rx, _events) = sink(400);
        std::thread::scope(|scope| {
            for worker in 0..4_u64 {
                let sink = Arc::clone(&sink);
                scope.spawn(move || {
                    for i in 0..100 {
                        let id = TaskId::new(worker * 100 + i);
                        let outcome = if i % 3 == 0 {
                            Err(TaskFailure::new("x"))
                        } else {
                            Ok(String::new())
                        };
                        Reporter::new(id, Arc::clone(&sink)).report(outcome);
                    }
                });
            }
            let watcher = Arc::clone(&sink);
            scope.spawn(move || {
                for _ in 0..10_000 {
                    let p = watcher.progress();
                    assert_eq!(p.succeeded + p.failed, p.delivered);
                    assert!(p.delivered <= p.total);
                }
            });
        });

        let p = sink.progress();
        assert!(p.is_complete());
        assert_eq!(p.failed, 4 * 34);
        assert_eq!(p.succeeded, 400 - 4 * 34);
    }

    #[test]
    fn remaining_tracks_reports() {
        let (sink, _rx, _events) = sink(3);
        assert_eq!(sink.progress().remaining(), 3);
        Reporter::new(TaskId::new(1), sink.clone()).report(Ok(String::new()));
        assert_eq!(sink.progress().remaining(), 2);
    }
}
