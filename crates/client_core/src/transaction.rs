//! Busy/error tracking around one mutating operation.
//!
//! `Idle -> Running -> (Succeeded | Failed) -> Idle`. While running the
//! controller refuses new work, and `busy` is cleared on every exit path.

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use shared::error::ErrorKind;
use tracing::warn;

use crate::{
    error::ClientError,
    notify::{NoticeKind, Notifier, DEFAULT_NOTICE_DURATION},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionState {
    pub busy: bool,
    pub last_error: Option<ErrorKind>,
}

/// What a finished operation wants to tell the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub message: String,
    pub kind: NoticeKind,
}

impl Completion {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Success,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Info,
        }
    }
}

#[derive(Debug)]
pub enum TransactionOutcome<T> {
    /// Another operation was in flight; nothing ran.
    Skipped,
    Succeeded(T),
    Failed(ClientError),
}

impl<T> TransactionOutcome<T> {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, TransactionOutcome::Succeeded(_))
    }
}

pub struct TransactionController {
    state: Mutex<TransactionState>,
    notifier: Arc<dyn Notifier>,
    notice_duration: Duration,
}

impl TransactionController {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: Mutex::new(TransactionState::default()),
            notifier,
            notice_duration: DEFAULT_NOTICE_DURATION,
        }
    }

    pub fn with_notice_duration(mut self, notice_duration: Duration) -> Self {
        self.notice_duration = notice_duration;
        self
    }

    pub fn state(&self) -> TransactionState {
        self.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    /// Runs `operation` unless one is already running.
    ///
    /// The busy flag is taken synchronously, before `operation` is even
    /// created, so a second call made while the first is suspended sees it.
    pub async fn run<T, F, Fut>(&self, operation: F) -> TransactionOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(T, Completion), ClientError>>,
    {
        let Some(_running) = self.begin() else {
            return TransactionOutcome::Skipped;
        };

        match operation().await {
            Ok((value, completion)) => {
                self.lock().last_error = None;
                self.notifier
                    .notify(&completion.message, completion.kind, self.notice_duration);
                TransactionOutcome::Succeeded(value)
            }
            Err(err) => {
                warn!(kind = ?err.kind(), "transaction: operation failed: {err}");
                self.lock().last_error = Some(err.kind());
                self.notifier
                    .notify(&err.user_message(), NoticeKind::Error, self.notice_duration);
                TransactionOutcome::Failed(err)
            }
        }
    }

    pub(crate) fn notify(&self, message: &str, kind: NoticeKind) {
        self.notifier.notify(message, kind, self.notice_duration);
    }

    fn begin(&self) -> Option<RunningGuard<'_>> {
        let mut state = self.lock();
        if state.busy {
            return None;
        }
        state.busy = true;
        Some(RunningGuard { controller: self })
    }

    fn lock(&self) -> MutexGuard<'_, TransactionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct RunningGuard<'a> {
    controller: &'a TransactionController,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.controller.lock().busy = false;
    }
}

#[cfg(test)]
#[path = "tests/transaction_tests.rs"]
mod tests;
