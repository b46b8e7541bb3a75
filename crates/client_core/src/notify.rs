//! Outcome notices for the operator. Presentation is left to the consumer.

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, warn};

pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
    /// Benign outcomes that needed no work, such as cancelling a canceled order.
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    pub duration: Duration,
}

/// Fire-and-forget sink for transaction outcomes.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, kind: NoticeKind, duration: Duration);
}

pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, kind: NoticeKind, duration: Duration) {
        let duration_ms = duration.as_millis() as u64;
        match kind {
            NoticeKind::Error => warn!(duration_ms, "notice: {message}"),
            NoticeKind::Success | NoticeKind::Info => info!(?kind, duration_ms, "notice: {message}"),
        }
    }
}

/// Republishes notices on a broadcast channel for any number of views.
pub struct BroadcastNotifier {
    events: broadcast::Sender<Notice>,
}

impl BroadcastNotifier {
    /// `capacity` is clamped to at least one buffered notice.
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self { events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.events.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, message: &str, kind: NoticeKind, duration: Duration) {
        // No subscribers is not an error for a fire-and-forget sink.
        let _ = self.events.send(Notice {
            message: message.to_string(),
            kind,
            duration,
        });
    }
}
