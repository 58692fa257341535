//! Core types for batch site audits.
//!
//! Request and settings parsing, the per-URL result record, the site-wide
//! global result and the error type shared by the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::constants::{DEFAULT_CONCURRENCY, DEFAULT_PAGE_TIMEOUT_MS};

/// Error type for audit operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuditError {
    /// Request rejected before any work started
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Engine configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    /// Browser launch, attach or CDP failure
    #[error("Browser error: {0}")]
    Browser(String),
    /// Page could not be loaded
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// Per-URL budget exhausted
    #[error("Analysis timed out after {0} ms")]
    Timeout(u64),
    /// Batch abort observed at a checkpoint
    #[error("Audit was cancelled")]
    Cancelled,
    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for AuditError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain
        Self::Other(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `AuditError`
pub type AuditResult<T> = Result<T, AuditError>;

/// WCAG conformance level selected for the accessibility audit.
///
/// Levels are ordered; selecting one includes the rule tags of every level
/// before it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum AccessibilityStandard {
    #[serde(rename = "wcag2a", alias = "2.0-A", alias = "WCAG2A")]
    Wcag20A,
    #[default]
    #[serde(rename = "wcag2aa", alias = "2.0-AA", alias = "WCAG2AA")]
    Wcag20AA,
    #[serde(rename = "wcag21a", alias = "2.1-A", alias = "WCAG21A")]
    Wcag21A,
    #[serde(rename = "wcag21aa", alias = "2.1-AA", alias = "WCAG21AA")]
    Wcag21AA,
    #[serde(rename = "wcag22a", alias = "2.2-A", alias = "WCAG22A")]
    Wcag22A,
    #[serde(rename = "wcag22aa", alias = "2.2-AA", alias = "WCAG22AA")]
    Wcag22AA,
}

impl AccessibilityStandard {
    pub const ALL: [Self; 6] = [
        Self::Wcag20A,
        Self::Wcag20AA,
        Self::Wcag21A,
        Self::Wcag21AA,
        Self::Wcag22A,
        Self::Wcag22AA,
    ];

    /// Rule tag understood by axe-core.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Wcag20A => "wcag2a",
            Self::Wcag20AA => "wcag2aa",
            Self::Wcag21A => "wcag21a",
            Self::Wcag21AA => "wcag21aa",
            Self::Wcag22A => "wcag22a",
            Self::Wcag22AA => "wcag22aa",
        }
    }

    /// Tags of this level and every level below it, lowest first.
    #[must_use]
    pub fn cumulative_tags(self) -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|level| **level <= self)
            .map(|level| level.tag())
            .collect()
    }
}

/// Tag appended when best-practice rules are requested.
pub const BEST_PRACTICE_TAG: &str = "best-practice";

/// Per-request analysis settings
///
/// Every field is optional on the wire; missing fields take their defaults.
/// `timeout` is accepted as an alias of `timeoutMs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSettings {
    pub concurrency: usize,
    #[serde(alias = "timeout")]
    pub timeout_ms: u64,
    pub accessibility_standard: AccessibilityStandard,
    pub best_practices: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout_ms: DEFAULT_PAGE_TIMEOUT_MS,
            accessibility_standard: AccessibilityStandard::default(),
            best_practices: true,
        }
    }
}

impl AnalysisSettings {
    /// Cumulative accessibility tag set for the selected standard.
    #[must_use]
    pub fn accessibility_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .accessibility_standard
            .cumulative_tags()
            .into_iter()
            .map(str::to_string)
            .collect();
        if self.best_practices {
            tags.push(BEST_PRACTICE_TAG.to_string());
        }
        tags
    }

    /// Concurrency clamped to `1..=max`.
    #[must_use]
    pub fn effective_concurrency(&self, max: usize) -> usize {
        self.concurrency.clamp(1, max.max(1))
    }

    /// Per-URL budget, falling back to the default when zero.
    #[must_use]
    pub fn effective_timeout_ms(&self) -> u64 {
        if self.timeout_ms == 0 {
            DEFAULT_PAGE_TIMEOUT_MS
        } else {
            self.timeout_ms
        }
    }

    /// Navigation sub-budget: two thirds of the per-URL budget.
    #[must_use]
    pub fn navigation_budget_ms(&self) -> u64 {
        let budget = u128::from(self.effective_timeout_ms()) * 2 / 3;
        u64::try_from(budget).unwrap_or(u64::MAX)
    }
}

/// A validated batch request. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    urls: Vec<String>,
    settings: AnalysisSettings,
}

impl AnalysisRequest {
    /// Build a request from already-typed parts.
    pub fn new(urls: Vec<String>, settings: AnalysisSettings) -> AuditResult<Self> {
        if urls.is_empty() {
            return Err(AuditError::InvalidRequest(
                "URLs array is required".to_string(),
            ));
        }
        Ok(Self { urls, settings })
    }

    /// Validate a raw JSON body: `{ urls: string[], settings?: Partial<AnalysisSettings> }`.
    pub fn from_json(body: Value) -> AuditResult<Self> {
        let Value::Object(mut body) = body else {
            return Err(AuditError::InvalidRequest(
                "Request body must be a JSON object".to_string(),
            ));
        };

        let urls = match body.remove("urls") {
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::String(url) => Ok(url.trim().to_string()),
                    other => Err(AuditError::InvalidRequest(format!(
                        "urls[{index}] must be a string, got {other}"
                    ))),
                })
                .collect::<AuditResult<Vec<_>>>()?,
            _ => {
                return Err(AuditError::InvalidRequest(
                    "URLs array is required".to_string(),
                ));
            }
        };

        let settings = match body.remove("settings") {
            None | Some(Value::Null) => AnalysisSettings::default(),
            Some(raw) => serde_json::from_value(raw)
                .map_err(|e| AuditError::InvalidRequest(format!("Invalid settings: {e}")))?,
        };

        Self::new(urls, settings)
    }

    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    #[must_use]
    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    #[must_use]
    pub fn first_url(&self) -> &str {
        // non-empty by construction
        self.urls.first().map_or("", String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub tag: String,
    pub text: String,
    pub level: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// Reachability of one probed hyperlink. `status` is 0 when unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLink {
    pub link: String,
    pub status: u16,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}

/// One element matched by a failing accessibility rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationNode {
    #[serde(default)]
    pub target: Vec<Value>,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub failure_summary: Option<String>,
    #[serde(default)]
    pub impact: Option<Impact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxeViolation {
    pub id: String,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub help_url: Option<String>,
    #[serde(default)]
    pub nodes: Vec<ViolationNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleAnalyticsData {
    #[serde(rename = "hasGA4")]
    pub has_ga4: bool,
    #[serde(rename = "hasUniversalAnalytics")]
    pub has_universal_analytics: bool,
    #[serde(rename = "hasGTM")]
    pub has_gtm: bool,
    #[serde(rename = "measurementIds")]
    pub measurement_ids: Vec<String>,
    #[serde(rename = "gtmContainers")]
    pub gtm_containers: Vec<String>,
    #[serde(rename = "uaIds")]
    pub ua_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchConsoleData {
    pub has_meta_tag: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_tag_content: Option<String>,
    /// Always false: file-based verification is not probed.
    pub has_html_file: bool,
    pub has_dns_txt: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_txt_content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    pub google_analytics: GoogleAnalyticsData,
    pub search_console: SearchConsoleData,
}

/// Responsive captures as `data:image/jpeg;base64,...` URIs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Screenshots {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tablet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desktop: Option<String>,
}

impl Screenshots {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mobile.is_none() && self.tablet.is_none() && self.desktop.is_none()
    }
}

/// Site-wide configuration detected once per batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalResult {
    pub analytics: AnalyticsData,
}

/// The result record emitted once per requested URL.
///
/// Collections are always present, even on the error path, so consumers
/// never see missing keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub url: String,
    pub headings: Vec<Heading>,
    pub seo_issues: Vec<String>,
    pub accessibility_issues: Vec<AxeViolation>,
    pub broken_links: Vec<BrokenLink>,
    pub total_links_checked: usize,
    pub total_links_found: usize,
    pub images: Vec<ImageInfo>,
    pub scripts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics: Option<AnalyticsData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<Screenshots>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Error-path result: empty collections, populated `error`.
    #[must_use]
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Number of failing rules.
    #[must_use]
    pub fn accessibility_rule_count(&self) -> usize {
        self.accessibility_issues.len()
    }

    /// Number of failing elements summed across rules.
    #[must_use]
    pub fn accessibility_instance_count(&self) -> usize {
        self.accessibility_issues.iter().map(|v| v.nodes.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_missing_or_empty_urls() {
        assert!(matches!(
            AnalysisRequest::from_json(json!({})),
            Err(AuditError::InvalidRequest(_))
        ));
        assert!(matches!(
            AnalysisRequest::from_json(json!({ "urls": [] })),
            Err(AuditError::InvalidRequest(_))
        ));
        assert!(matches!(
            AnalysisRequest::from_json(json!({ "urls": "https://example.com" })),
            Err(AuditError::InvalidRequest(_))
        ));
        assert!(matches!(
            AnalysisRequest::from_json(json!({ "urls": ["https://a.test", 3] })),
            Err(AuditError::InvalidRequest(_))
        ));
    }

    #[test]
    fn oversized_timeout_keeps_two_thirds_navigation_budget() {
        let request = AnalysisRequest::from_json(json!({
            "urls": ["https://example.com"],
            "settings": { "timeout": u64::MAX }
        }))
        .expect("valid request");

        let settings = request.settings();
        assert_eq!(settings.effective_timeout_ms(), u64::MAX);
        assert_eq!(settings.navigation_budget_ms(), u64::MAX / 3 * 2);
    }

    #[test]
    fn partial_settings_take_defaults() {
        let request = AnalysisRequest::from_json(json!({
            "urls": ["https://example.com"],
            "settings": { "timeout": 12000, "accessibilityStandard": "2.1-AA" }
        }))
        .expect("valid request");

        let settings = request.settings();
        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.timeout_ms, 12_000);
        assert_eq!(settings.navigation_budget_ms(), 8_000);
        assert_eq!(settings.accessibility_standard, AccessibilityStandard::Wcag21AA);
        assert!(settings.best_practices);
        assert_eq!(
            settings.accessibility_tags(),
            vec!["wcag2a", "wcag2aa", "wcag21a", "wcag21aa", "best-practice"]
        );
    }

    #[test]
    fn concurrency_is_clamped() {
        let settings = AnalysisSettings {
            concurrency: 0,
            ..AnalysisSettings::default()
        };
        assert_eq!(settings.effective_concurrency(10), 1);

        let settings = AnalysisSettings {
            concurrency: 64,
            ..AnalysisSettings::default()
        };
        assert_eq!(settings.effective_concurrency(10), 10);
    }

    #[test]
    fn failed_result_keeps_every_collection() {
        let value = serde_json::to_value(AnalysisResult::failed("https://a.test", "boom"))
            .expect("serializable");
        for key in [
            "headings",
            "seoIssues",
            "accessibilityIssues",
            "brokenLinks",
            "images",
            "scripts",
        ] {
            assert_eq!(value[key], json!([]), "{key} should be an empty array");
        }
        assert_eq!(value["totalLinksChecked"], json!(0));
        assert_eq!(value["error"], json!("boom"));
        assert!(value.get("analytics").is_none());
    }

    #[test]
    fn analytics_keys_match_wire_names() {
        let value = serde_json::to_value(GoogleAnalyticsData {
            has_ga4: true,
            measurement_ids: vec!["G-ABC1234567".to_string()],
            ..GoogleAnalyticsData::default()
        })
        .expect("serializable");
        assert_eq!(value["hasGA4"], json!(true));
        assert_eq!(value["hasGTM"], json!(false));
        assert_eq!(value["measurementIds"], json!(["G-ABC1234567"]));
    }

    #[test]
    fn counts_rules_and_instances_separately() {
        let node = ViolationNode {
            target: vec![json!("img")],
            html: "<img>".to_string(),
            failure_summary: None,
            impact: Some(Impact::Critical),
        };
        let result = AnalysisResult {
            accessibility_issues: vec![AxeViolation {
                id: "image-alt".to_string(),
                impact: Some(Impact::Critical),
                description: "Images must have alternate text".to_string(),
                help: None,
                help_url: None,
                nodes: vec![node.clone(), node],
            }],
            ..AnalysisResult::default()
        };
        assert_eq!(result.accessibility_rule_count(), 1);
        assert_eq!(result.accessibility_instance_count(), 2);
    }
}
