//! Progress reporting and cancellation for long-running analyses.
//!
//! Observers receive discrete [`ProgressEvent`]s. Nothing in the engine
//! depends on whether anyone listens: the default observer drops every
//! event. A closure or an `mpsc::Sender` can be plugged in instead.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Analysis stages, reported in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Annotate,
    Cycles,
    CriticalPath,
    Vulnerabilities,
    Optimizations,
    Stats,
}

/// A discrete progress message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    PhaseStarted(Phase),
    PhaseCompleted(Phase),
    /// Source files matched for processing.
    FilesDiscovered { count: usize },
    FileProcessed { path: PathBuf, edges: usize },
    /// Recoverable per-file failure; the file contributes no edges.
    FileFailed { path: PathBuf, message: String },
}

/// Receives progress events.
pub trait ProgressObserver: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_event(&self, _event: &ProgressEvent) {}
}

impl<F> ProgressObserver for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_event(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Forwards events over a channel. A disconnected receiver is ignored.
impl ProgressObserver for Sender<ProgressEvent> {
    fn on_event(&self, event: &ProgressEvent) {
        let _ = self.send(event.clone());
    }
}

/// Cooperative cancellation with an optional deadline.
///
/// Clones share the same flag, so the caller keeps one clone and hands the
/// other to the analyzer.
///
/// ```
/// use depscope::progress::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(token.check().is_ok());
/// handle.cancel();
/// assert!(token.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// `Err(Cancelled)` or `Err(TimedOut)` once the run must stop.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if self.is_expired() {
            return Err(Error::TimedOut);
        }
        Ok(())
    }
}
