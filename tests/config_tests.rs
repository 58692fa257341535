//! Tests for the configuration builder and environment overlay

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use kodegen_tools_siteaudit::{
    AccessibilityEngineSource, AuditConfig, BrowserEngine, ContextStrategy,
};

fn from_vars(vars: &[(&str, &str)]) -> anyhow::Result<AuditConfig> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    AuditConfig::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn builder_defaults() {
    let config = AuditConfig::builder().build().unwrap();

    assert_eq!(config.browser_engine(), &BrowserEngine::Launch { headless: true });
    assert_eq!(config.context_strategy(), ContextStrategy::Shared);
    assert!(config.chrome_data_dir().is_none());
    assert_eq!(config.link_check_limit(), 20);
    assert_eq!(config.link_check_timeout(), Duration::from_secs(5));
    assert!(config.capture_screenshots());
    assert_eq!(config.max_concurrency(), 10);
    assert!(matches!(
        config.accessibility_engine(),
        AccessibilityEngineSource::Url(_)
    ));
}

#[test]
fn builder_rejects_out_of_range_values() {
    assert!(AuditConfig::builder().link_check_limit(0).build().is_err());
    assert!(AuditConfig::builder().link_check_limit(51).build().is_err());
    assert!(AuditConfig::builder().screenshot_quality(0).build().is_err());
    assert!(AuditConfig::builder().max_concurrency(0).build().is_err());
    assert!(AuditConfig::builder().page_open_timeout_ms(0).build().is_err());
}

#[test]
fn attach_endpoint_is_validated() {
    let ok = AuditConfig::builder()
        .attach("http://127.0.0.1:9222")
        .build()
        .unwrap();
    assert_eq!(
        ok.browser_engine(),
        &BrowserEngine::Attach {
            endpoint: "http://127.0.0.1:9222".to_string()
        }
    );

    assert!(AuditConfig::builder().attach("not a url").build().is_err());
    assert!(
        AuditConfig::builder()
            .attach("ftp://127.0.0.1:9222")
            .build()
            .is_err()
    );
}

#[test]
fn empty_environment_gives_defaults() {
    assert_eq!(from_vars(&[]).unwrap(), AuditConfig::builder().build().unwrap());
}

#[test]
fn environment_overrides_are_applied() {
    let config = from_vars(&[
        ("SITEAUDIT_CHROME_ENDPOINT", "ws://127.0.0.1:9222/devtools/browser/abc"),
        ("SITEAUDIT_CONTEXT_STRATEGY", "per-url"),
        ("SITEAUDIT_AXE_PATH", "/opt/axe/axe.min.js"),
        ("SITEAUDIT_SCREENSHOTS", "off"),
        ("SITEAUDIT_LINK_LIMIT", " 35 "),
        ("SITEAUDIT_MAX_CONCURRENCY", "4"),
    ])
    .unwrap();

    assert!(matches!(config.browser_engine(), BrowserEngine::Attach { .. }));
    assert_eq!(config.context_strategy(), ContextStrategy::PerUrl);
    assert_eq!(
        config.accessibility_engine(),
        &AccessibilityEngineSource::File(Path::new("/opt/axe/axe.min.js").to_path_buf())
    );
    assert!(!config.capture_screenshots());
    assert_eq!(config.link_check_limit(), 35);
    assert_eq!(config.max_concurrency(), 4);
}

#[test]
fn data_dir_from_environment() {
    let config = from_vars(&[("SITEAUDIT_CHROME_DATA_DIR", "/tmp/profile")]).unwrap();
    assert_eq!(config.chrome_data_dir().map(|p| p.as_path()), Some(Path::new("/tmp/profile")));
}

#[test]
fn malformed_environment_values_are_errors() {
    assert!(from_vars(&[("SITEAUDIT_CONTEXT_STRATEGY", "pooled")]).is_err());
    assert!(from_vars(&[("SITEAUDIT_SCREENSHOTS", "maybe")]).is_err());
    assert!(from_vars(&[("SITEAUDIT_LINK_LIMIT", "many")]).is_err());
    assert!(from_vars(&[("SITEAUDIT_MAX_CONCURRENCY", "0")]).is_err());
}

#[test]
fn blank_values_are_ignored() {
    let config = from_vars(&[("SITEAUDIT_CHROME_ENDPOINT", "   ")]).unwrap();
    assert_eq!(config.browser_engine(), &BrowserEngine::Launch { headless: true });
}
