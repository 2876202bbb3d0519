//! Errors - エラー型と分類
//!
//! - **TaskFailure**: タスク単位の失敗。Result に包んで consumer に届ける（他タスクは止めない）
//! - **DispatchError**: submit 呼び出し時の契約違反（fail-fast）

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// TaskFailure の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// The task's computation returned an error.
    Failed,

    /// The task panicked while running.
    Panicked,

    /// The task was dropped before it could report (e.g. runtime shutdown).
    Abandoned,
}

/// A task's computation could not produce a value.
///
/// Never crosses task boundaries: it is delivered as the outcome of the
/// failing task's own result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Failed,
            message: message.into(),
        }
    }

    pub fn panicked(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Panicked,
            message: message.into(),
        }
    }

    pub fn abandoned() -> Self {
        Self {
            kind: FailureKind::Abandoned,
            message: "task was dropped before reporting a result".to_string(),
        }
    }

    /// Build a failure from a `JoinError` or `catch_unwind` payload.
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "task panicked".to_string()
        };
        Self::panicked(message)
    }
}

/// Errors raised by the dispatcher itself (contract violations at submission).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
