pub mod analyzers;
pub mod audit_engine;
pub mod audit_events;
pub mod browser_provider;
pub mod browser_setup;
pub mod config;
pub mod page_extractor;
pub mod server;
pub mod sitemap;
pub mod utils;

pub use analyzers::{
    DnsTxtCache, HickoryTxtResolver, LinkCheckReport, LinkChecker, TxtResolver, analyze_seo,
};
pub use audit_engine::{
    AnalysisRequest, AnalysisResult, AnalysisSettings, AuditBackend, AuditError, AuditResult,
    BatchOrchestrator, BatchOutcome, GlobalResult,
};
pub use audit_events::{AuditEvent, AuditStream, EventSink};
pub use browser_setup::{
    connect_browser, download_managed_browser, find_browser_executable, launch_browser,
};
pub use config::{AccessibilityEngineSource, AuditConfig, BrowserEngine, ContextStrategy};
pub use sitemap::{SitemapDiscovery, SitemapError, SitemapResponse};

/// Start a browser-backed audit of `request` with `config`.
///
/// Convenience wrapper for one-off batches; long-lived callers should keep a
/// [`BatchOrchestrator`] so the accessibility engine is fetched once.
#[must_use]
pub fn audit(config: AuditConfig, request: AnalysisRequest) -> AuditStream {
    BatchOrchestrator::new(config).start(request)
}
