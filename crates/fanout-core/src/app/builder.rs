//! DispatcherBuilder - Dispatcher の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - build() 時に設定を検証し、不正なら DispatchError::InvalidArgument を返す
//! - ports を差し替えなければ本番用の実装（SystemClock, UlidGenerator, TracingEventSink）を使う

use std::sync::Arc;

use tokio::sync::Semaphore;

use super::dispatcher::Dispatcher;
use crate::config::DispatcherConfig;
use crate::domain::DispatchError;
use crate::impls::TracingEventSink;
use crate::ports::{Clock, EventSink, IdGenerator, SystemClock, UlidGenerator};

/// DispatcherBuilder は Dispatcher を構築
///
/// # 使用例
/// ```ignore
/// let dispatcher = Dispatcher::builder()
///     .max_concurrency(4)
///     .event_sink(Arc::new(RecordingEventSink::new()))
///     .build()?;
/// ```
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    events: Option<Arc<dyn EventSink>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            config: DispatcherConfig::default(),
            clock: None,
            ids: None,
            events: None,
        }
    }

    /// 設定をまとめて差し替える
    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// 同時実行数の上限
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.config.max_concurrency = Some(limit);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    /// 設定を検証して Dispatcher を生成
    pub fn build(self) -> Result<Dispatcher, DispatchError> {
        self.config
            .validate()
            .map_err(|e| DispatchError::InvalidArgument(e.to_string()))?;
        Ok(self.assemble())
    }

    pub(crate) fn assemble(self) -> Dispatcher {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        // ID の時刻部分もイベントと同じ Clock に揃える
        let ids = self.ids.unwrap_or_else(|| {
            let clock = Arc::clone(&clock);
            Arc::new(UlidGenerator::new(clock))
        });
        let events = self.events.unwrap_or_else(|| Arc::new(TracingEventSink));
        let limiter = self
            .config
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit)));

        Dispatcher {
            config: self.config,
            clock,
            ids,
            events,
            limiter,
        }
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_build_default() {
        let dispatcher = DispatcherBuilder::new().build().unwrap();
        assert_eq!(dispatcher.config().max_concurrency, None);
        assert!(dispatcher.limiter.is_none());
    }

    #[test]
    fn test_build_with_limit() {
        let dispatcher = DispatcherBuilder::new().max_concurrency(3).build().unwrap();
        assert_eq!(dispatcher.config().max_concurrency, Some(3));
        let permits = dispatcher.limiter.as_ref().map(|s| s.available_permits());
        assert_eq!(permits, Some(3));
    }

    #[test]
    fn test_build_rejects_zero_limit() {
        let result = DispatcherBuilder::new()
            .config(DispatcherConfig::default().with_max_concurrency(0))
            .build();
        assert!(matches!(result, Err(DispatchError::InvalidArgument(_))));
    }

    #[test]
    fn test_default_ids_follow_injected_clock() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let dispatcher = DispatcherBuilder::new()
            .clock(Arc::new(FixedClock::new(at)))
            .build()
            .unwrap();
        let id = dispatcher.ids.generate_session_id();
        assert_eq!(id.as_ulid().timestamp_ms(), at.timestamp_millis() as u64);
    }
}
