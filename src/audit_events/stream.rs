//! Read side of the audit stream.
//!
//! Dropping an [`AuditStream`] cancels its batch, which is how a client
//! disconnect reaches the running tasks.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::types::AuditEvent;
use crate::audit_engine::concurrency::ConcurrencyProbe;

pub struct AuditStream {
    rx: UnboundedReceiver<AuditEvent>,
    cancel: CancellationToken,
    probe: Arc<ConcurrencyProbe>,
    finished: bool,
    _guard: DropGuard,
}

impl AuditStream {
    pub(crate) fn new(
        rx: UnboundedReceiver<AuditEvent>,
        cancel: CancellationToken,
        probe: Arc<ConcurrencyProbe>,
    ) -> Self {
        let guard = cancel.clone().drop_guard();
        Self {
            rx,
            cancel,
            probe,
            finished: false,
            _guard: guard,
        }
    }

    /// Signal abort. Dispatch stops and in-flight tasks exit silently at
    /// their next checkpoint.
    pub fn abort(&self) {
        self.cancel.cancel();
    }

    /// Token that aborts this batch when cancelled.
    #[must_use]
    pub fn abort_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// In-flight task counters for this batch.
    #[must_use]
    pub fn probe(&self) -> Arc<ConcurrencyProbe> {
        Arc::clone(&self.probe)
    }

    /// Encoded wire lines, `Done` elided.
    pub fn into_wire_lines(self) -> impl Stream<Item = String> + Send + 'static {
        use futures::StreamExt;

        self.filter_map(|event| async move {
            match event.to_wire_line() {
                Ok(line) => line,
                Err(e) => {
                    log::error!(target: "siteaudit::stream", "Failed to encode event: {e}");
                    None
                }
            }
        })
    }
}

impl Stream for AuditStream {
    type Item = AuditEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(AuditEvent::Done)) => {
                self.finished = true;
                Poll::Ready(Some(AuditEvent::Done))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for AuditStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditStream")
            .field("finished", &self.finished)
            .field("aborted", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
