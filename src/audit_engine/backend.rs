//! The seam between batch scheduling and page analysis.
//!
//! The orchestrator only knows [`AuditBackend`]; the production
//! implementation drives Chromium, tests substitute scripted backends.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::audit_types::{AnalysisResult, AnalysisSettings, AuditResult, GlobalResult};
use super::{global_phase, page_task};
use crate::analyzers::{DnsTxtCache, LinkChecker};
use crate::audit_events::EventSink;
use crate::browser_provider::{BrowserSession, BrowsingContext};
use crate::config::AuditConfig;

/// Boxed future returned by backend operations.
pub type AuditFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait AuditBackend: Send + Sync + 'static {
    /// Site-wide detection run once against the first URL.
    fn analyze_site<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> AuditFuture<'a, AuditResult<GlobalResult>>;

    /// Analyze one URL. Failures are folded into the returned result;
    /// `None` means the batch was aborted and nothing should be emitted.
    fn analyze_page<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> AuditFuture<'a, Option<AnalysisResult>>;
}

/// Chromium-backed analysis for one batch.
pub struct BrowserBackend {
    pub(crate) session: Arc<BrowserSession>,
    pub(crate) shared_context: BrowsingContext,
    pub(crate) config: Arc<AuditConfig>,
    pub(crate) settings: AnalysisSettings,
    /// Cumulative rule tags derived from `settings`.
    pub(crate) tags: Vec<String>,
    /// Rule engine source; `None` when it could not be loaded.
    pub(crate) engine_script: Option<Arc<str>>,
    pub(crate) links: LinkChecker,
    pub(crate) dns: DnsTxtCache,
    pub(crate) sink: EventSink,
}

impl BrowserBackend {
    /// Hand the browser resources back for teardown.
    pub(crate) fn into_resources(self) -> (Arc<BrowserSession>, BrowsingContext) {
        (self.session, self.shared_context)
    }
}

impl AuditBackend for BrowserBackend {
    fn analyze_site<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> AuditFuture<'a, AuditResult<GlobalResult>> {
        Box::pin(global_phase::run_global_phase(self, url, cancel))
    }

    fn analyze_page<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> AuditFuture<'a, Option<AnalysisResult>> {
        Box::pin(page_task::analyze_page(self, url, cancel))
    }
}

impl std::fmt::Debug for BrowserBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserBackend")
            .field("attached", &self.session.is_attached())
            .field("tags", &self.tags)
            .field("engine_loaded", &self.engine_script.is_some())
            .finish_non_exhaustive()
    }
}
