//! Single-URL analysis.
//!
//! A page task opens its own page (and, with the per-URL strategy, its own
//! context), races the analysis against the per-URL budget, and always
//! closes what it opened before resolving.

use std::future::Future;
use std::time::Duration;

use chromiumoxide::Page;
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use super::audit_types::{AnalysisResult, AnalyticsData, AuditError, AuditResult};
use super::backend::BrowserBackend;
use super::cancellation::{checkpoint, unless_cancelled};
use super::page_timeout::{race_page_budget, with_page_timeout};
use crate::analyzers::{analyze_seo, detect_page, detect_search_console, run_accessibility_audit};
use crate::browser_provider::BrowsingContext;
use crate::config::ContextStrategy;
use crate::page_extractor::{
    NavigationOutcome, auto_scroll, capture_responsive_screenshots, extract_page_data, navigate,
};
use crate::utils::constants::EMPTY_PAGE_HTML_THRESHOLD;

/// Fold an analysis outcome into what the orchestrator emits.
///
/// Cancellation resolves to `None`; every other error becomes an error
/// result with empty collections.
#[must_use]
pub fn settle(url: &str, outcome: AuditResult<AnalysisResult>) -> Option<AnalysisResult> {
    match outcome {
        Ok(result) => Some(result),
        Err(AuditError::Cancelled) => {
            debug!("Analysis of {url} abandoned after abort");
            None
        }
        Err(e) => {
            warn!("Analysis of {url} failed: {e}");
            Some(AnalysisResult::failed(url, e.to_string()))
        }
    }
}

/// Race `analysis` against `budget`.
///
/// On expiry the partial analysis is dropped and a timeout error result is
/// returned instead; nothing built before the deadline is salvaged.
pub async fn analyze_within_budget<F>(
    url: &str,
    budget: Duration,
    analysis: F,
) -> Option<AnalysisResult>
where
    F: Future<Output = AuditResult<AnalysisResult>>,
{
    let budget_ms = u64::try_from(budget.as_millis()).unwrap_or(u64::MAX);
    match race_page_budget(budget, analysis).await {
        Ok(outcome) => settle(url, outcome),
        Err(_) => settle(url, Err(AuditError::Timeout(budget_ms))),
    }
}

pub(crate) async fn analyze_page(
    backend: &BrowserBackend,
    url: &str,
    cancel: &CancellationToken,
) -> Option<AnalysisResult> {
    if cancel.is_cancelled() {
        return None;
    }
    backend.sink.log(format!("Analyzing: {url}"));

    let open_timeout = backend.config.page_open_timeout();

    let owned_context = match backend.config.context_strategy() {
        ContextStrategy::Shared => None,
        ContextStrategy::PerUrl => {
            let created = unless_cancelled(
                cancel,
                with_page_timeout(backend.session.create_context(), open_timeout, "Context creation"),
            )
            .await;
            match created {
                Ok(Ok(context)) => Some(context),
                Ok(Err(e)) => return settle(url, Err(AuditError::Browser(format!("{e:#}")))),
                Err(cancelled) => return settle(url, Err(cancelled)),
            }
        }
    };
    let context = owned_context.as_ref().unwrap_or(&backend.shared_context);

    let opened = unless_cancelled(
        cancel,
        with_page_timeout(backend.session.open_page(context), open_timeout, "Page open"),
    )
    .await;

    let outcome = match opened {
        Ok(Ok(page)) => {
            let budget = Duration::from_millis(backend.settings.effective_timeout_ms());
            let outcome =
                analyze_within_budget(url, budget, run_analysis(backend, &page, url, cancel)).await;
            close_page(page, url).await;
            outcome
        }
        Ok(Err(e)) => settle(url, Err(AuditError::Browser(format!("{e:#}")))),
        Err(cancelled) => settle(url, Err(cancelled)),
    };

    if let Some(context) = owned_context {
        release_context(backend, &context).await;
    }

    // results that finish after an abort are dropped here
    if cancel.is_cancelled() {
        return None;
    }
    outcome
}

async fn close_page(page: Page, url: &str) {
    if let Err(e) = page.close().await {
        debug!(target: "siteaudit::cleanup", "Failed to close page for {url}: {e}");
    }
}

async fn release_context(backend: &BrowserBackend, context: &BrowsingContext) {
    if let Err(e) = backend.session.close_context(context).await {
        warn!(target: "siteaudit::cleanup", "Failed to dispose per-URL context: {e:#}");
    }
}

async fn run_analysis(
    backend: &BrowserBackend,
    page: &Page,
    url: &str,
    cancel: &CancellationToken,
) -> AuditResult<AnalysisResult> {
    let sink = &backend.sink;
    let config = &backend.config;

    checkpoint(cancel)?;
    let navigation_budget = Duration::from_millis(backend.settings.navigation_budget_ms());
    let outcome = navigate(page, url, navigation_budget)
        .await
        .map_err(|e| AuditError::Navigation(format!("{e:#}")))?;
    checkpoint(cancel)?;
    if outcome == NavigationOutcome::DocumentLoaded {
        sink.log(format!("Network idle timeout on {url}, continued after document load"));
    }
    sink.log(format!("Navigation complete: {url}"));

    let data = extract_page_data(page)
        .await
        .map_err(|e| AuditError::Other(format!("Page data extraction failed: {e:#}")))?;
    checkpoint(cancel)?;

    if data.looks_empty(EMPTY_PAGE_HTML_THRESHOLD) {
        sink.log(format!(
            "Warning: {url} looks empty ({} characters of body HTML). Possible block or load failure.",
            data.html_length
        ));
    }

    let seo_issues = analyze_seo(&data.headings, &data.title, data.meta_description.as_deref());

    sink.log("Running auto-scroll...");
    match auto_scroll(
        page,
        config.scroll_distance_px(),
        config.scroll_interval(),
        config.max_scroll_iterations(),
    )
    .await
    {
        Ok(steps) => debug!("Auto-scroll on {url} took {steps} steps"),
        Err(e) => debug!("Auto-scroll on {url} failed: {e:#}"),
    }
    checkpoint(cancel)?;
    tokio::time::sleep(config.settle_delay()).await;
    checkpoint(cancel)?;

    let accessibility_issues = match &backend.engine_script {
        Some(script) => {
            sink.log("Running accessibility audit...");
            let violations = run_accessibility_audit(page, script, &backend.tags).await;
            checkpoint(cancel)?;
            sink.log(format!(
                "Accessibility audit finished. Violations found: {}",
                violations.len()
            ));
            violations
        }
        None => Vec::new(),
    };

    sink.log("Checking links...");
    let report = backend.links.check(&data.links).await;
    checkpoint(cancel)?;

    let google_analytics = detect_page(&data.scripts, &data.inline_scripts);
    let search_console =
        detect_search_console(url, data.search_console_meta.as_deref(), &backend.dns).await;
    checkpoint(cancel)?;

    let screenshots = if config.capture_screenshots() {
        sink.log("Capturing screenshots...");
        let shots = capture_responsive_screenshots(page, config.screenshot_quality()).await;
        checkpoint(cancel)?;
        (!shots.is_empty()).then_some(shots)
    } else {
        None
    };

    Ok(AnalysisResult {
        url: url.to_string(),
        headings: data.headings,
        seo_issues,
        accessibility_issues,
        broken_links: report.broken(),
        total_links_checked: report.total_checked,
        total_links_found: report.total_found,
        images: data.images,
        scripts: data.scripts,
        analytics: Some(AnalyticsData {
            google_analytics,
            search_console,
        }),
        screenshots,
        error: None,
    })
}
