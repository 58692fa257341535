//! Google Analytics / Tag Manager detection.
//!
//! Three passes feed one accumulator:
//! - script `src` URLs matched against vendor loader endpoints, with ids
//!   pulled from the `id=` query parameter
//! - quoted id literals in inline script bodies
//! - (comprehensive mode) the serialized document, which also covers
//!   `<noscript>` tag-manager iframes and consent-blocked scripts that keep
//!   their real source in `data-src`-style attributes
//!
//! Ids are upper-cased and deduplicated in first-seen order.

use regex::Regex;
use std::sync::LazyLock;

use crate::audit_engine::audit_types::GoogleAnalyticsData;

/// Compile a static pattern, panicking with the pattern name on failure.
/// Only used for literal patterns below.
fn compile_regex(pattern: &str, name: &str) -> Regex {
    Regex::new(pattern)
        .unwrap_or_else(|e| panic!("Failed to compile regex {name} '{pattern}': {e}"))
}

const GTAG_LOADER: &str = "googletagmanager.com/gtag/js";
const GTM_LOADER: &str = "googletagmanager.com/gtm.js";
const GTM_NOSCRIPT: &str = "googletagmanager.com/ns.html";
const UA_LOADERS: [&str; 3] = [
    "google-analytics.com/analytics.js",
    "google-analytics.com/ga.js",
    "stats.g.doubleclick.net/dc.js",
];

static URL_GA4_ID: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)[?&]id=(G-[A-Z0-9]+)", "URL_GA4_ID"));
static URL_UA_ID: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)[?&]id=(UA-\d+-\d+)", "URL_UA_ID"));
static URL_GTM_ID: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)[?&]id=(GTM-[A-Z0-9]+)", "URL_GTM_ID"));
static URL_ANY_ID: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"(?i)[?&]id=", "URL_ANY_ID"));

static QUOTED_GA4_ID: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r#"(?i)['"](G-[A-Z0-9]{10,})['"]"#, "QUOTED_GA4_ID"));
static QUOTED_GTM_ID: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r#"(?i)['"](GTM-[A-Z0-9]{7,})['"]"#, "QUOTED_GTM_ID"));
static QUOTED_UA_ID: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r#"(?i)['"](UA-\d{4,10}-\d{1,4})['"]"#, "QUOTED_UA_ID"));

static NOSCRIPT_GTM_ID: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(
        r"(?i)googletagmanager\.com/ns\.html\?id=(GTM-[A-Z0-9]+)",
        "NOSCRIPT_GTM_ID",
    )
});

/// `src` of script tags, including consent-managed ones that park the real
/// source in `data-src`, `data-cookieconsent-src` or `data-lazy-src`.
static SCRIPT_SOURCE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(
        r#"(?is)<script\b[^>]*?\b(?:src|data-src|data-cookieconsent-src|data-lazy-src)\s*=\s*["']([^"']+)["']"#,
        "SCRIPT_SOURCE_ATTR",
    )
});

/// Inline scripts parked as `type="text/plain"` until consent is given.
static INERT_SCRIPT_BODY: LazyLock<Regex> = LazyLock::new(|| {
    compile_regex(
        r#"(?is)<script\b[^>]*\btype\s*=\s*["']text/plain["'][^>]*>(.*?)</script>"#,
        "INERT_SCRIPT_BODY",
    )
});

#[derive(Debug, Default)]
struct Accumulator {
    measurement_ids: Vec<String>,
    gtm_containers: Vec<String>,
    ua_ids: Vec<String>,
    ga4_signature: bool,
    gtm_signature: bool,
    ua_signature: bool,
}

impl Accumulator {
    fn scan_script_url(&mut self, src: &str) {
        let lowered = src.to_ascii_lowercase();

        if lowered.contains(GTAG_LOADER) {
            let ga4_before = self.measurement_ids.len();
            capture_into(&URL_GA4_ID, src, &mut self.measurement_ids);
            capture_into(&URL_UA_ID, src, &mut self.ua_ids);
            // gtag.js without an id is still a GA4 install; with an AW-/DC- id it is not
            if self.measurement_ids.len() > ga4_before || !URL_ANY_ID.is_match(src) {
                self.ga4_signature = true;
            }
        }

        if lowered.contains(GTM_LOADER) || lowered.contains(GTM_NOSCRIPT) {
            self.gtm_signature = true;
            capture_into(&URL_GTM_ID, src, &mut self.gtm_containers);
        }

        if UA_LOADERS.iter().any(|loader| lowered.contains(loader)) {
            self.ua_signature = true;
        }
    }

    fn scan_text(&mut self, text: &str) {
        capture_into(&QUOTED_GA4_ID, text, &mut self.measurement_ids);
        capture_into(&QUOTED_GTM_ID, text, &mut self.gtm_containers);
        capture_into(&QUOTED_UA_ID, text, &mut self.ua_ids);

        // loader snippets that build the script URL at runtime
        let lowered = text.to_ascii_lowercase();
        if lowered.contains(GTM_LOADER) {
            self.gtm_signature = true;
        }
        if UA_LOADERS.iter().any(|loader| lowered.contains(loader)) {
            self.ua_signature = true;
        }
    }

    fn scan_html(&mut self, html: &str) {
        capture_into(&NOSCRIPT_GTM_ID, html, &mut self.gtm_containers);
        if html.to_ascii_lowercase().contains(GTM_NOSCRIPT) {
            self.gtm_signature = true;
        }

        for cap in SCRIPT_SOURCE_ATTR.captures_iter(html) {
            if let Some(src) = cap.get(1) {
                self.scan_script_url(src.as_str());
            }
        }
        for cap in INERT_SCRIPT_BODY.captures_iter(html) {
            if let Some(body) = cap.get(1) {
                self.scan_text(body.as_str());
            }
        }

        self.scan_text(html);
    }

    fn finish(self) -> GoogleAnalyticsData {
        GoogleAnalyticsData {
            has_ga4: self.ga4_signature || !self.measurement_ids.is_empty(),
            has_universal_analytics: self.ua_signature || !self.ua_ids.is_empty(),
            has_gtm: self.gtm_signature || !self.gtm_containers.is_empty(),
            measurement_ids: self.measurement_ids,
            gtm_containers: self.gtm_containers,
            ua_ids: self.ua_ids,
        }
    }
}

fn capture_into(pattern: &Regex, haystack: &str, ids: &mut Vec<String>) {
    for cap in pattern.captures_iter(haystack) {
        if let Some(id) = cap.get(1) {
            let id = id.as_str().to_ascii_uppercase();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
}

/// Page-scoped detection over script sources and inline script bodies.
#[must_use]
pub fn detect_page(script_sources: &[String], inline_scripts: &[String]) -> GoogleAnalyticsData {
    let mut acc = Accumulator::default();
    for src in script_sources {
        acc.scan_script_url(src);
    }
    for body in inline_scripts {
        acc.scan_text(body);
    }
    acc.finish()
}

/// Comprehensive detection used by the global phase: page passes plus the
/// serialized document.
#[must_use]
pub fn detect_comprehensive(
    script_sources: &[String],
    inline_scripts: &[String],
    html: &str,
) -> GoogleAnalyticsData {
    let mut acc = Accumulator::default();
    for src in script_sources {
        acc.scan_script_url(src);
    }
    for body in inline_scripts {
        acc.scan_text(body);
    }
    acc.scan_html(html);
    acc.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn bare_loader_sets_flag_without_ids() {
        let data = detect_page(
            &strings(&["https://www.google-analytics.com/analytics.js"]),
            &[],
        );
        assert!(data.has_universal_analytics);
        assert!(data.ua_ids.is_empty());
        assert!(!data.has_ga4);
    }

    #[test]
    fn inline_ids_are_deduplicated() {
        let inline = strings(&[
            "gtag('config', 'G-ABCDEF1234'); gtag('config', \"g-abcdef1234\");",
            "ga('create', 'UA-1234567-1', 'auto');",
            "(function(w,d,s,l,i){})(window,document,'script','dataLayer','GTM-ABC1234');",
        ]);
        let data = detect_page(&[], &inline);
        assert_eq!(data.measurement_ids, vec!["G-ABCDEF1234"]);
        assert_eq!(data.ua_ids, vec!["UA-1234567-1"]);
        assert_eq!(data.gtm_containers, vec!["GTM-ABC1234"]);
        assert!(data.has_ga4 && data.has_universal_analytics && data.has_gtm);
    }

    #[test]
    fn ads_only_gtag_is_not_ga4() {
        let data = detect_page(
            &strings(&["https://www.googletagmanager.com/gtag/js?id=AW-123456789"]),
            &[],
        );
        assert!(!data.has_ga4);

        let bare = detect_page(&strings(&["https://www.googletagmanager.com/gtag/js"]), &[]);
        assert!(bare.has_ga4);
    }

    #[test]
    fn comprehensive_mode_reads_noscript_and_consent_markup() {
        let html = r#"
            <script type="text/plain" data-cookieconsent-src="https://www.googletagmanager.com/gtag/js?id=G-CONSENT123"></script>
            <noscript><iframe src="https://www.googletagmanager.com/ns.html?id=GTM-NOSCRIPT"></iframe></noscript>
        "#;
        let data = detect_comprehensive(&[], &[], html);
        assert_eq!(data.measurement_ids, vec!["G-CONSENT123"]);
        assert_eq!(data.gtm_containers, vec!["GTM-NOSCRIPT"]);
        assert!(data.has_gtm && data.has_ga4);

        // page mode never looks at raw markup
        let page_only = detect_page(&[], &[]);
        assert_eq!(page_only, GoogleAnalyticsData::default());
    }
}
