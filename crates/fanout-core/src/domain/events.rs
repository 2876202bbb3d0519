//! Events - dispatch セッションで発生したイベント
//!
//! EventSink（ports::event_sink）に渡されます。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OutcomeKind, SessionId, TaskId};

/// DispatchEvent はセッションのライフサイクルを表す
///
/// 1 セッションにつき SessionStarted → TaskCompleted × N → SessionDrained の順で発行される。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DispatchEvent {
    SessionStarted {
        session: SessionId,
        tasks: usize,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        session: SessionId,
        task_id: TaskId,
        kind: OutcomeKind,
        at: DateTime<Utc>,
    },
    SessionDrained {
        session: SessionId,
        delivered: usize,
        succeeded: usize,
        failed: usize,
        at: DateTime<Utc>,
    },
}

impl DispatchEvent {
    pub fn session(&self) -> SessionId {
        match self {
            DispatchEvent::SessionStarted { session, .. }
            | DispatchEvent::TaskCompleted { session, .. }
            | DispatchEvent::SessionDrained { session, .. } => *session,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            DispatchEvent::SessionStarted { at, .. }
            | DispatchEvent::TaskCompleted { at, .. }
            | DispatchEvent::SessionDrained { at, .. } => *at,
        }
    }
}
