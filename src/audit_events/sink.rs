//! Write side of the audit stream.
//!
//! Writes after close or after the batch is cancelled are silently dropped,
//! and closing twice is a no-op.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use super::types::AuditEvent;
use crate::audit_engine::audit_types::{AnalysisResult, GlobalResult};

#[derive(Debug, Clone)]
pub struct EventSink {
    inner: Arc<SinkInner>,
}

#[derive(Debug)]
struct SinkInner {
    tx: UnboundedSender<AuditEvent>,
    closed: AtomicBool,
    global_sent: AtomicBool,
    cancel: CancellationToken,
}

impl EventSink {
    /// Create a sink bound to `cancel` and the receiver it feeds.
    #[must_use]
    pub fn new(cancel: CancellationToken) -> (Self, UnboundedReceiver<AuditEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            inner: Arc::new(SinkInner {
                tx,
                closed: AtomicBool::new(false),
                global_sent: AtomicBool::new(false),
                cancel,
            }),
        };
        (sink, rx)
    }

    /// Client-visible progress line, mirrored to the diagnostic log.
    pub fn log(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        log::info!(target: "siteaudit::stream", "{message}");
        self.emit(AuditEvent::log(message))
    }

    pub fn result(&self, result: AnalysisResult) -> bool {
        self.emit(AuditEvent::result(result))
    }

    /// Emit the site-wide result. Only the first call per batch is delivered.
    pub fn global_result(&self, global: GlobalResult) -> bool {
        if self.inner.global_sent.swap(true, Ordering::AcqRel) {
            log::warn!(target: "siteaudit::stream", "Dropping duplicate global result");
            return false;
        }
        self.emit(AuditEvent::global_result(global))
    }

    /// Emit a batch-fatal error and close the stream behind it.
    pub fn error(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        log::error!(target: "siteaudit::stream", "{message}");
        let sent = self.emit(AuditEvent::error(message));
        self.close();
        sent
    }

    /// Close the stream. Returns `true` only for the call that closed it.
    ///
    /// The terminal marker is delivered even after cancellation so the
    /// reader always observes a definite end.
    pub fn close(&self) -> bool {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        // receiver may already be gone after a client disconnect
        let _ = self.inner.tx.send(AuditEvent::Done);
        true
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn emit(&self, event: AuditEvent) -> bool {
        if self.is_closed() || self.inner.cancel.is_cancelled() {
            return false;
        }
        self.inner.tx.send(event).is_ok()
    }
}
