//! Getter methods for `AuditConfig`

use std::path::PathBuf;
use std::time::Duration;

use super::types::{AccessibilityEngineSource, AuditConfig, BrowserEngine, ContextStrategy};

impl AuditConfig {
    #[must_use]
    pub fn browser_engine(&self) -> &BrowserEngine {
        &self.browser_engine
    }

    #[must_use]
    pub fn context_strategy(&self) -> ContextStrategy {
        self.context_strategy
    }

    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }

    #[must_use]
    pub fn link_check_limit(&self) -> usize {
        self.link_check_limit
    }

    #[must_use]
    pub fn link_check_timeout(&self) -> Duration {
        Duration::from_millis(self.link_check_timeout_ms)
    }

    #[must_use]
    pub fn capture_screenshots(&self) -> bool {
        self.capture_screenshots
    }

    #[must_use]
    pub fn screenshot_quality(&self) -> u8 {
        self.screenshot_quality
    }

    #[must_use]
    pub fn page_open_timeout(&self) -> Duration {
        Duration::from_millis(self.page_open_timeout_ms)
    }

    #[must_use]
    pub fn global_phase_timeout(&self) -> Duration {
        Duration::from_millis(self.global_phase_timeout_ms)
    }

    #[must_use]
    pub fn scroll_distance_px(&self) -> u32 {
        self.scroll_distance_px
    }

    #[must_use]
    pub fn scroll_interval(&self) -> Duration {
        Duration::from_millis(self.scroll_interval_ms)
    }

    #[must_use]
    pub fn max_scroll_iterations(&self) -> u32 {
        self.max_scroll_iterations
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub fn accessibility_engine(&self) -> &AccessibilityEngineSource {
        &self.accessibility_engine
    }

    #[must_use]
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}
