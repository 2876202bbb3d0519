//! Ports - 抽象化レイヤー
//!
//! dispatcher が外部に依存する箇所（時刻・ID 生成・イベント記録）を trait で切り出し、
//! テストで差し替えられるようにしています。

pub mod clock;
pub mod event_sink;
pub mod id_generator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
