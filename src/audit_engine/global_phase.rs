//! Site-wide analytics and Search Console detection, run once per batch
//! against the first URL on its own short-lived page.
//!
//! The orchestrator stops this phase by cancelling its token rather than
//! dropping it, so the page is closed on the timeout and abort paths too.

use std::time::Duration;

use log::debug;
use tokio_util::sync::CancellationToken;

use super::audit_types::{AnalyticsData, AuditResult, GlobalResult};
use super::backend::BrowserBackend;
use super::cancellation::unless_cancelled;
use super::page_timeout::with_page_timeout;
use crate::analyzers::{detect_comprehensive, detect_search_console};
use crate::page_extractor::{extract_global_scan, navigate};

pub(crate) async fn run_global_phase(
    backend: &BrowserBackend,
    url: &str,
    cancel: &CancellationToken,
) -> AuditResult<GlobalResult> {
    let budget = backend.config.global_phase_timeout();

    let page = unless_cancelled(
        cancel,
        with_page_timeout(
            backend.session.open_page(&backend.shared_context),
            backend.config.page_open_timeout(),
            "Page open",
        ),
    )
    .await??;

    let scan = unless_cancelled(
        cancel,
        with_page_timeout(
            async {
                navigate(&page, url, budget * 2 / 3).await?;
                extract_global_scan(&page).await
            },
            budget,
            "Global analysis",
        ),
    )
    .await;

    if let Err(e) = page.close().await {
        debug!(target: "siteaudit::cleanup", "Failed to close global phase page: {e}");
    }
    let scan = scan??;

    let google_analytics = detect_comprehensive(&scan.scripts, &scan.inline_scripts, &scan.html);

    let search_console = unless_cancelled(
        cancel,
        tokio::time::timeout(
            budget.max(Duration::from_secs(1)),
            detect_search_console(url, scan.search_console_meta.as_deref(), &backend.dns),
        ),
    )
    .await?
    .unwrap_or_default();

    debug!(
        "Global analysis of {url}: GA4={}, GTM={}, UA={}, meta={}, txt={}",
        google_analytics.has_ga4,
        google_analytics.has_gtm,
        google_analytics.has_universal_analytics,
        search_console.has_meta_tag,
        search_console.has_dns_txt
    );

    Ok(GlobalResult {
        analytics: AnalyticsData {
            google_analytics,
            search_console,
        },
    })
}
