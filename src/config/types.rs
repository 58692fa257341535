//! Core configuration types for batch audits
//!
//! This module contains the main `AuditConfig` struct and the enum-valued
//! switches that select how the browser is acquired and shared.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::constants::{
    AXE_CORE_CDN_URL, DEFAULT_DNS_TIMEOUT_SECS, DEFAULT_GLOBAL_PHASE_TIMEOUT_MS,
    DEFAULT_LINK_CHECK_LIMIT, DEFAULT_LINK_CHECK_TIMEOUT_MS, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_MAX_SCROLL_ITERATIONS, DEFAULT_PAGE_OPEN_TIMEOUT_MS, DEFAULT_SCROLL_DISTANCE_PX,
    DEFAULT_SCROLL_INTERVAL_MS, DEFAULT_SETTLE_DELAY_MS, SCREENSHOT_QUALITY,
};

/// How the batch obtains its browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BrowserEngine {
    /// Launch an isolated local Chromium with a throwaway profile.
    Launch { headless: bool },
    /// Attach to an externally running browser over its remote debugging
    /// endpoint, e.g. `http://127.0.0.1:9222`. The external browser is never
    /// closed by the audit.
    Attach { endpoint: String },
}

impl Default for BrowserEngine {
    fn default() -> Self {
        Self::Launch { headless: true }
    }
}

/// How page tasks share browsing contexts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStrategy {
    /// One context per batch, reused by every task.
    #[default]
    Shared,
    /// One context per task, disposed in that task's cleanup.
    PerUrl,
}

/// Where the accessibility rule engine script comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AccessibilityEngineSource {
    Url(String),
    File(PathBuf),
    Inline(String),
}

impl Default for AccessibilityEngineSource {
    fn default() -> Self {
        Self::Url(AXE_CORE_CDN_URL.to_string())
    }
}

/// Engine-level configuration passed to the orchestrator constructor.
///
/// Per-request knobs (concurrency, per-URL timeout, WCAG level) live in
/// `AnalysisSettings`; everything here is fixed for the life of the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    pub(crate) browser_engine: BrowserEngine,
    pub(crate) context_strategy: ContextStrategy,

    /// Chrome user data directory for launched browsers.
    /// When unset each batch gets a unique directory under the temp dir.
    pub(crate) chrome_data_dir: Option<PathBuf>,

    pub(crate) link_check_limit: usize,
    pub(crate) link_check_timeout_ms: u64,

    pub(crate) capture_screenshots: bool,
    pub(crate) screenshot_quality: u8,

    pub(crate) page_open_timeout_ms: u64,
    pub(crate) global_phase_timeout_ms: u64,

    pub(crate) scroll_distance_px: u32,
    pub(crate) scroll_interval_ms: u64,
    pub(crate) max_scroll_iterations: u32,
    pub(crate) settle_delay_ms: u64,

    pub(crate) accessibility_engine: AccessibilityEngineSource,

    pub(crate) dns_timeout_secs: u64,

    /// Upper clamp for `settings.concurrency`
    /// Default: 10
    pub(crate) max_concurrency: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            browser_engine: BrowserEngine::default(),
            context_strategy: ContextStrategy::default(),
            chrome_data_dir: None,
            link_check_limit: DEFAULT_LINK_CHECK_LIMIT,
            link_check_timeout_ms: DEFAULT_LINK_CHECK_TIMEOUT_MS,
            capture_screenshots: true,
            screenshot_quality: SCREENSHOT_QUALITY,
            page_open_timeout_ms: DEFAULT_PAGE_OPEN_TIMEOUT_MS,
            global_phase_timeout_ms: DEFAULT_GLOBAL_PHASE_TIMEOUT_MS,
            scroll_distance_px: DEFAULT_SCROLL_DISTANCE_PX,
            scroll_interval_ms: DEFAULT_SCROLL_INTERVAL_MS,
            max_scroll_iterations: DEFAULT_MAX_SCROLL_ITERATIONS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            accessibility_engine: AccessibilityEngineSource::default(),
            dns_timeout_secs: DEFAULT_DNS_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}
