//! Domain - ドメインモデル（ids, task, outcome, state, errors, events）

pub mod errors;
pub mod events;
pub mod ids;
pub mod outcome;
pub mod state;
pub mod task;

pub use self::errors::{DispatchError, FailureKind, TaskFailure};
pub use self::events::DispatchEvent;
pub use self::ids::{Id, IdMarker, SessionId, TaskId};
pub use self::outcome::{OutcomeKind, TaskResult};
pub use self::state::SessionState;
pub use self::task::{BoxWorkFn, BoxWorkFuture, Task, Work};
