//! Fluent setters for `AuditConfigBuilder`

use std::path::PathBuf;

use super::builder::AuditConfigBuilder;
use super::types::{AccessibilityEngineSource, BrowserEngine, ContextStrategy};

impl AuditConfigBuilder {
    #[must_use]
    pub fn browser_engine(mut self, engine: BrowserEngine) -> Self {
        self.config.browser_engine = engine;
        self
    }

    /// Launch a local browser. `headless = false` shows a window and is only
    /// honoured in debug builds.
    #[must_use]
    pub fn launch(self, headless: bool) -> Self {
        self.browser_engine(BrowserEngine::Launch { headless })
    }

    /// Attach to a running browser instead of launching one.
    #[must_use]
    pub fn attach(self, endpoint: impl Into<String>) -> Self {
        self.browser_engine(BrowserEngine::Attach {
            endpoint: endpoint.into(),
        })
    }

    #[must_use]
    pub fn context_strategy(mut self, strategy: ContextStrategy) -> Self {
        self.config.context_strategy = strategy;
        self
    }

    #[must_use]
    pub fn chrome_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.chrome_data_dir = Some(dir.into());
        self
    }

    /// Links probed per page. Valid range: 1-50
    #[must_use]
    pub fn link_check_limit(mut self, limit: usize) -> Self {
        self.config.link_check_limit = limit;
        self
    }

    #[must_use]
    pub fn link_check_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.link_check_timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn capture_screenshots(mut self, capture: bool) -> Self {
        self.config.capture_screenshots = capture;
        self
    }

    #[must_use]
    pub fn screenshot_quality(mut self, quality: u8) -> Self {
        self.config.screenshot_quality = quality;
        self
    }

    #[must_use]
    pub fn page_open_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.page_open_timeout_ms = timeout_ms;
        self
    }

    #[must_use]
    pub fn global_phase_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.global_phase_timeout_ms = timeout_ms;
        self
    }

    /// Auto-scroll heuristic: step size, delay between steps, step cap.
    #[must_use]
    pub fn auto_scroll(mut self, distance_px: u32, interval_ms: u64, max_iterations: u32) -> Self {
        self.config.scroll_distance_px = distance_px;
        self.config.scroll_interval_ms = interval_ms;
        self.config.max_scroll_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn settle_delay_ms(mut self, delay_ms: u64) -> Self {
        self.config.settle_delay_ms = delay_ms;
        self
    }

    #[must_use]
    pub fn accessibility_engine(mut self, source: AccessibilityEngineSource) -> Self {
        self.config.accessibility_engine = source;
        self
    }

    #[must_use]
    pub fn dns_timeout_secs(mut self, secs: u64) -> Self {
        self.config.dns_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.config.max_concurrency = max;
        self
    }
}
