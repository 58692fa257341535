//! Builder for `AuditConfig`
//!
//! Every field has a default, so the builder only validates ranges and the
//! attach endpoint in `build()`.

use anyhow::{Result, anyhow};

use super::types::{AuditConfig, BrowserEngine};
use crate::utils::constants::MAX_LINK_CHECK_LIMIT;

#[derive(Debug, Clone, Default)]
pub struct AuditConfigBuilder {
    pub(crate) config: AuditConfig,
}

impl AuditConfig {
    /// Create a builder for configuring an `AuditConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }
}

impl AuditConfigBuilder {
    pub fn build(self) -> Result<AuditConfig> {
        #[allow(unused_mut)]
        let mut config = self.config;

        // Headed mode is only available in debug builds
        #[cfg(not(debug_assertions))]
        if let BrowserEngine::Launch { headless } = &mut config.browser_engine
            && !*headless
        {
            tracing::warn!(
                "Forcing headless mode in release build. \
                Headed mode is only available in debug builds for development."
            );
            *headless = true;
        }

        if !(1..=MAX_LINK_CHECK_LIMIT).contains(&config.link_check_limit) {
            return Err(anyhow!(
                "link_check_limit must be between 1 and {MAX_LINK_CHECK_LIMIT}, got {}",
                config.link_check_limit
            ));
        }
        if !(1..=100).contains(&config.screenshot_quality) {
            return Err(anyhow!(
                "screenshot_quality must be between 1 and 100, got {}",
                config.screenshot_quality
            ));
        }
        if config.max_concurrency == 0 {
            return Err(anyhow!("max_concurrency must be at least 1"));
        }
        if config.max_scroll_iterations == 0 || config.scroll_distance_px == 0 {
            return Err(anyhow!("auto-scroll distance and iteration count must be positive"));
        }
        for (name, value) in [
            ("link_check_timeout_ms", config.link_check_timeout_ms),
            ("page_open_timeout_ms", config.page_open_timeout_ms),
            ("global_phase_timeout_ms", config.global_phase_timeout_ms),
            ("dns_timeout_secs", config.dns_timeout_secs),
        ] {
            if value == 0 {
                return Err(anyhow!("{name} must be greater than zero"));
            }
        }

        if let BrowserEngine::Attach { endpoint } = &config.browser_engine {
            let parsed = url::Url::parse(endpoint)
                .map_err(|e| anyhow!("Invalid remote debugging endpoint '{endpoint}': {e}"))?;
            if !matches!(parsed.scheme(), "http" | "https" | "ws" | "wss") {
                return Err(anyhow!(
                    "Remote debugging endpoint must use http(s) or ws(s), got '{}'",
                    parsed.scheme()
                ));
            }
        }

        Ok(config)
    }
}
