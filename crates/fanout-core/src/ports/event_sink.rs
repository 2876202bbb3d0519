//! EventSink port - イベント記録の抽象化
//!
//! # 実装（impls::event_sinks）
//! - NoopEventSink: 何もしない
//! - TracingEventSink: tracing に流す（デフォルト）
//! - RecordingEventSink: メモリに貯める（テスト・CLI の集計用）

use crate::domain::DispatchEvent;

/// EventSink は DispatchEvent を受け取る
///
/// タスク完了時は blocking スレッドからも呼ばれるので同期 API にしています。
/// 実装は短時間で戻ること（ブロックしない）。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: DispatchEvent);
}
