//! fanout-core
//!
//! 独立したタスクの束を並行実行し、結果を完了順に 1 本のストリームで返す dispatcher。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, outcome, state, errors, events）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, EventSink）
//! - **app**: アプリケーションロジック（builder, dispatcher, sink, stream）
//! - **impls**: ports の実装（EventSink 各種）
//! - **config**: TOML から読める設定
//!
//! ```ignore
//! let dispatcher = Dispatcher::new();
//! let tasks = (1..=3).map(|id| {
//!     Task::from_fn(TaskId::new(id), move || Ok(format!("Worker {id} completed task")))
//! });
//! let mut stream = dispatcher.submit(tasks)?;
//! while let Some(result) = stream.next().await {
//!     println!("{}: {:?}", result.task_id, result.outcome);
//! }
//! ```

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{Dispatcher, DispatcherBuilder, ResultStream, SessionProgress};
pub use config::{ConfigError, DispatcherConfig};
pub use domain::{
    DispatchError, DispatchEvent, FailureKind, OutcomeKind, SessionId, SessionState, Task,
    TaskFailure, TaskId, TaskResult,
};
