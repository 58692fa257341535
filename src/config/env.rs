//! Environment overlay for `AuditConfig`
//!
//! Recognised variables:
//! - `SITEAUDIT_CHROME_ENDPOINT`: attach to this remote debugging endpoint
//! - `SITEAUDIT_HEADLESS`: `false`/`0` launches a visible browser (debug builds)
//! - `SITEAUDIT_CONTEXT_STRATEGY`: `shared` or `per_url`
//! - `SITEAUDIT_CHROME_DATA_DIR`: user data directory for launched browsers
//! - `SITEAUDIT_AXE_PATH` / `SITEAUDIT_AXE_URL`: accessibility engine source
//! - `SITEAUDIT_SCREENSHOTS`: `false`/`0` disables captures
//! - `SITEAUDIT_LINK_LIMIT`: links probed per page
//! - `SITEAUDIT_MAX_CONCURRENCY`: clamp for request concurrency

use anyhow::{Context, Result, anyhow};

use super::builder::AuditConfigBuilder;
use super::types::{AccessibilityEngineSource, AuditConfig, ContextStrategy};

impl AuditConfig {
    /// Defaults overlaid with `SITEAUDIT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuditConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut builder = AuditConfigBuilder::default();

        if let Some(endpoint) = get("SITEAUDIT_CHROME_ENDPOINT") {
            builder = builder.attach(endpoint);
        } else if let Some(headless) = get("SITEAUDIT_HEADLESS") {
            builder = builder.launch(parse_flag("SITEAUDIT_HEADLESS", &headless)?);
        }

        if let Some(strategy) = get("SITEAUDIT_CONTEXT_STRATEGY") {
            let strategy = match strategy.to_ascii_lowercase().replace('-', "_").as_str() {
                "shared" => ContextStrategy::Shared,
                "per_url" => ContextStrategy::PerUrl,
                other => {
                    return Err(anyhow!(
                        "SITEAUDIT_CONTEXT_STRATEGY must be 'shared' or 'per_url', got '{other}'"
                    ));
                }
            };
            builder = builder.context_strategy(strategy);
        }

        if let Some(dir) = get("SITEAUDIT_CHROME_DATA_DIR") {
            builder = builder.chrome_data_dir(dir);
        }

        if let Some(path) = get("SITEAUDIT_AXE_PATH") {
            builder = builder.accessibility_engine(AccessibilityEngineSource::File(path.into()));
        } else if let Some(url) = get("SITEAUDIT_AXE_URL") {
            builder = builder.accessibility_engine(AccessibilityEngineSource::Url(url));
        }

        if let Some(flag) = get("SITEAUDIT_SCREENSHOTS") {
            builder = builder.capture_screenshots(parse_flag("SITEAUDIT_SCREENSHOTS", &flag)?);
        }

        if let Some(limit) = get("SITEAUDIT_LINK_LIMIT") {
            let limit = limit
                .parse()
                .with_context(|| format!("SITEAUDIT_LINK_LIMIT is not a number: '{limit}'"))?;
            builder = builder.link_check_limit(limit);
        }

        if let Some(max) = get("SITEAUDIT_MAX_CONCURRENCY") {
            let max = max
                .parse()
                .with_context(|| format!("SITEAUDIT_MAX_CONCURRENCY is not a number: '{max}'"))?;
            builder = builder.max_concurrency(max);
        }

        builder.build()
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("{name} must be a boolean, got '{other}'")),
    }
}
