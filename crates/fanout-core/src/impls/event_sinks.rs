//! EventSink 実装

use std::sync::{Mutex, PoisonError};

use crate::domain::{DispatchEvent, OutcomeKind};
use crate::ports::EventSink;

/// 何もしない EventSink
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: DispatchEvent) {}
}

/// tracing にイベントを流す EventSink（Dispatcher のデフォルト）
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: DispatchEvent) {
        match event {
            DispatchEvent::SessionStarted { session, tasks, .. } => {
                tracing::info!(session = %session, tasks, "dispatch session started");
            }
            DispatchEvent::TaskCompleted {
                session,
                task_id,
                kind: OutcomeKind::Success,
                ..
            } => {
                tracing::debug!(session = %session, task = %task_id, "task completed");
            }
            DispatchEvent::TaskCompleted {
                session,
                task_id,
                kind: OutcomeKind::Failure,
                ..
            } => {
                tracing::warn!(session = %session, task = %task_id, "task failed");
            }
            DispatchEvent::SessionDrained {
                session,
                delivered,
                succeeded,
                failed,
                ..
            } => {
                tracing::info!(
                    session = %session,
                    delivered,
                    succeeded,
                    failed,
                    "dispatch session drained"
                );
            }
        }
    }
}

/// 受け取ったイベントを順番に保持する EventSink
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DispatchEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// これまでに受け取ったイベントのコピー
    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: DispatchEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SessionId, TaskId};
    use chrono::Utc;
    use ulid::Ulid;

    #[test]
    fn recording_sink_keeps_emission_order() {
        let sink = RecordingEventSink::new();
        let session = SessionId::from_ulid(Ulid::new());
        assert!(sink.is_empty());

        sink.emit(DispatchEvent::SessionStarted {
            session,
            tasks: 1,
            at: Utc::now(),
        });
        sink.emit(DispatchEvent::TaskCompleted {
            session,
            task_id: TaskId::new(1),
            kind: OutcomeKind::Success,
            at: Utc::now(),
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], DispatchEvent::SessionStarted { tasks: 1, .. }));
        assert!(matches!(events[1], DispatchEvent::TaskCompleted { .. }));
    }

    #[test]
    fn noop_and_tracing_sinks_accept_events() {
        let session = SessionId::from_ulid(Ulid::new());
        let ev = DispatchEvent::SessionDrained {
            session,
            delivered: 0,
            succeeded: 0,
            failed: 0,
            at: Utc::now(),
        };
        NoopEventSink.emit(ev.clone());
        TracingEventSink.emit(ev);
    }
}
