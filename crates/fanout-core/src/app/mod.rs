//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **DispatcherBuilder**: Dispatcher の構築とワイヤリング
//! - **Dispatcher**: タスクの並行実行（submit 1 回 = 1 セッション）
//! - **ResultSink / Reporter**: 結果の受け口（exactly-once close）
//! - **ResultStream**: 完了順に結果を返す single-pass ストリーム

pub mod builder;
pub mod dispatcher;
pub mod sink;
pub mod stream;

pub use self::builder::DispatcherBuilder;
pub use self::dispatcher::Dispatcher;
pub use self::sink::SessionProgress;
pub use self::stream::{BlockingResults, ResultStream};
