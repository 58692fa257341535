//! Page navigation, extraction and capture functions
//!
//! Every function borrows the page; closing it is the caller's job.

use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::emulation::{
    ClearDeviceMetricsOverrideParams, SetDeviceMetricsOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CaptureScreenshotParams, NavigateParams,
};
use serde::de::DeserializeOwned;
use tokio::time::Instant;

use super::js_scripts::{
    EXTRACT_PAGE_DATA_SCRIPT, GLOBAL_SCAN_SCRIPT, LOAD_STATE_SCRIPT, auto_scroll_script,
};
use super::page_data::{GlobalScan, LoadState, PageData, ReadyState};
use crate::audit_engine::audit_types::Screenshots;

const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Resource count must hold still this long to count as network idle.
const NETWORK_QUIET_WINDOW: Duration = Duration::from_millis(500);

/// Which wait condition the navigation finally satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    NetworkIdle,
    /// Network idle timed out; the document load fallback succeeded.
    DocumentLoaded,
}

/// Evaluate `script` and deserialize its JSON result.
pub async fn evaluate_json<T: DeserializeOwned>(page: &Page, script: &str, what: &str) -> Result<T> {
    let js_result = page
        .evaluate(script)
        .await
        .with_context(|| format!("Failed to execute {what} script"))?;

    let value = js_result
        .into_value::<serde_json::Value>()
        .map_err(|e| anyhow::anyhow!("Failed to get {what} value: {e}"))?;

    serde_json::from_value(value).with_context(|| format!("Failed to parse {what} from JS result"))
}

pub async fn extract_page_data(page: &Page) -> Result<PageData> {
    let data: PageData = evaluate_json(page, EXTRACT_PAGE_DATA_SCRIPT, "page data").await?;

    log::debug!(
        "Extracted page data - Headings: {}, Links: {}, Images: {}, Scripts: {}, Inline: {}",
        data.headings.len(),
        data.links.len(),
        data.images.len(),
        data.scripts.len(),
        data.inline_scripts.len()
    );

    Ok(data)
}

pub async fn extract_global_scan(page: &Page) -> Result<GlobalScan> {
    evaluate_json(page, GLOBAL_SCAN_SCRIPT, "global scan").await
}

/// Navigate within `budget`.
///
/// The strict attempt (load plus network idle) gets two thirds of the
/// budget; if it fails or runs out, a plain navigation waiting only for the
/// document to become interactive gets whatever is left.
pub async fn navigate(page: &Page, url: &str, budget: Duration) -> Result<NavigationOutcome> {
    let deadline = Instant::now() + budget;
    let strict_budget = budget * 2 / 3;

    let strict = tokio::time::timeout(strict_budget, async {
        page.goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        wait_for_network_idle(page).await
    })
    .await;

    match strict {
        Ok(Ok(())) => return Ok(NavigationOutcome::NetworkIdle),
        Ok(Err(e)) => log::debug!("Strict navigation to {url} failed: {e:#}"),
        Err(_) => log::debug!(
            "Network idle not reached for {url} within {} ms",
            strict_budget.as_millis()
        ),
    }

    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        anyhow::bail!("Navigation timeout after {} ms", budget.as_millis());
    }

    tokio::time::timeout(remaining, async {
        let response = page
            .execute(NavigateParams::new(url))
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        if let Some(error_text) = response.result.error_text.as_deref() {
            anyhow::bail!("Navigation to {url} failed: {error_text}");
        }
        wait_for_document(page).await
    })
    .await
    .map_err(|_| anyhow::anyhow!("Navigation timeout after {} ms", budget.as_millis()))??;

    Ok(NavigationOutcome::DocumentLoaded)
}

async fn load_state(page: &Page) -> Result<LoadState> {
    evaluate_json(page, LOAD_STATE_SCRIPT, "load state").await
}

/// Poll until the document is complete and no new resource entries appear
/// for [`NETWORK_QUIET_WINDOW`]. Unbounded; callers wrap it in a timeout.
async fn wait_for_network_idle(page: &Page) -> Result<()> {
    let mut last_count = None;
    let mut quiet_since = Instant::now();

    loop {
        match load_state(page).await {
            Ok(state) if state.ready_state == ReadyState::Complete => {
                if last_count != Some(state.resource_count) {
                    last_count = Some(state.resource_count);
                    quiet_since = Instant::now();
                } else if quiet_since.elapsed() >= NETWORK_QUIET_WINDOW {
                    return Ok(());
                }
            }
            Ok(_) => {}
            // mid-navigation context swaps make evaluation fail transiently
            Err(e) => log::trace!("Load state probe failed: {e:#}"),
        }
        tokio::time::sleep(LOAD_POLL_INTERVAL).await;
    }
}

async fn wait_for_document(page: &Page) -> Result<()> {
    loop {
        if let Ok(state) = load_state(page).await
            && state.ready_state != ReadyState::Loading
        {
            return Ok(());
        }
        tokio::time::sleep(LOAD_POLL_INTERVAL).await;
    }
}

/// Scroll down in `distance_px` steps until the page height is covered or
/// `max_iterations` steps were taken. Returns the steps taken.
pub async fn auto_scroll(
    page: &Page,
    distance_px: u32,
    interval: Duration,
    max_iterations: u32,
) -> Result<u32> {
    let script = auto_scroll_script(
        distance_px,
        u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        max_iterations,
    );
    evaluate_json(page, &script, "auto scroll").await
}

/// Fixed device profile for responsive captures.
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub name: &'static str,
    pub width: i64,
    pub height: i64,
    pub device_scale_factor: f64,
    pub mobile: bool,
}

pub const MOBILE_VIEWPORT: Viewport = Viewport {
    name: "mobile",
    width: 375,
    height: 667,
    device_scale_factor: 2.0,
    mobile: true,
};

pub const TABLET_VIEWPORT: Viewport = Viewport {
    name: "tablet",
    width: 768,
    height: 1024,
    device_scale_factor: 2.0,
    mobile: true,
};

pub const DESKTOP_VIEWPORT: Viewport = Viewport {
    name: "desktop",
    width: 1920,
    height: 1080,
    device_scale_factor: 1.0,
    mobile: false,
};

async fn capture_viewport(page: &Page, viewport: Viewport, quality: u8) -> Result<String> {
    page.execute(
        SetDeviceMetricsOverrideParams::builder()
            .width(viewport.width)
            .height(viewport.height)
            .device_scale_factor(viewport.device_scale_factor)
            .mobile(viewport.mobile)
            .build()
            .map_err(anyhow::Error::msg)?,
    )
    .await
    .with_context(|| format!("Failed to set {} viewport", viewport.name))?;

    let params = CaptureScreenshotParams {
        format: Some(CaptureScreenshotFormat::Jpeg),
        quality: Some(i64::from(quality)),
        ..Default::default()
    };

    let bytes = page
        .screenshot(params)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to capture {} screenshot: {e}", viewport.name))?;

    Ok(format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}

/// Capture mobile, tablet and desktop screenshots. A failed capture leaves
/// its slot empty; the others are still attempted.
pub async fn capture_responsive_screenshots(page: &Page, quality: u8) -> Screenshots {
    let mut shots = Screenshots::default();

    for viewport in [MOBILE_VIEWPORT, TABLET_VIEWPORT, DESKTOP_VIEWPORT] {
        let captured = match capture_viewport(page, viewport, quality).await {
            Ok(data_uri) => Some(data_uri),
            Err(e) => {
                log::warn!("{e:#}");
                None
            }
        };
        match viewport.name {
            "mobile" => shots.mobile = captured,
            "tablet" => shots.tablet = captured,
            _ => shots.desktop = captured,
        }
    }

    if let Err(e) = page.execute(ClearDeviceMetricsOverrideParams::default()).await {
        log::debug!("Failed to clear viewport override: {e}");
    }

    shots
}
