//! Outcome - タスクが consumer に返す結果
//!
//! 1 タスクにつき 1 つの TaskResult（値 or TaskFailure）が届く。

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use super::{TaskFailure, TaskId};

/// Classification of a task result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeKind {
    Success,
    Failure,
}

/// The outcome of exactly one task: its id plus a value or a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult<T = String> {
    pub task_id: TaskId,
    pub outcome: Result<T, TaskFailure>,
}

impl<T> TaskResult<T> {
    pub fn ok(task_id: TaskId, value: T) -> Self {
        Self {
            task_id,
            outcome: Ok(value),
        }
    }

    pub fn err(task_id: TaskId, failure: TaskFailure) -> Self {
        Self {
            task_id,
            outcome: Err(failure),
        }
    }

    pub fn kind(&self) -> OutcomeKind {
        match self.outcome {
            Ok(_) => OutcomeKind::Success,
            Err(_) => OutcomeKind::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }

    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        self.outcome.as_ref().err()
    }

    pub fn into_outcome(self) -> Result<T, TaskFailure> {
        self.outcome
    }
}

/// Flat shape: `{"task_id":1,"kind":"SUCCESS","value":...}` or
/// `{"task_id":1,"kind":"FAILURE","error":{...}}`.
impl<T: Serialize> Serialize for TaskResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("TaskResult", 3)?;
        s.serialize_field("task_id", &self.task_id)?;
        s.serialize_field("kind", &self.kind())?;
        match &self.outcome {
            Ok(value) => s.serialize_field("value", value)?,
            Err(failure) => s.serialize_field("error", failure)?,
        }
        s.end()
    }
}
