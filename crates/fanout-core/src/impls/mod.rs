//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **NoopEventSink** / **TracingEventSink** / **RecordingEventSink**

pub mod event_sinks;

pub use self::event_sinks::{NoopEventSink, RecordingEventSink, TracingEventSink};
