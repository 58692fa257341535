//! Search Console ownership verification signals.

use crate::audit_engine::audit_types::SearchConsoleData;
use crate::utils::constants::SEARCH_CONSOLE_TXT_MARKER;
use crate::utils::verification_domain;

use super::dns_cache::DnsTxtCache;

/// Detect verification through the page meta tag and the domain's TXT
/// records. The HTML-file method is never probed, so `has_html_file` is
/// always false.
pub async fn detect_search_console(
    url: &str,
    meta_tag_content: Option<&str>,
    dns: &DnsTxtCache,
) -> SearchConsoleData {
    let meta_tag_content = meta_tag_content
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let dns_txt_content = match verification_domain(url) {
        Ok(domain) => find_verification_record(&dns.txt_records(&domain).await),
        Err(e) => {
            log::debug!("Skipping TXT verification for {url}: {e}");
            None
        }
    };

    SearchConsoleData {
        has_meta_tag: meta_tag_content.is_some(),
        meta_tag_content,
        has_html_file: false,
        has_dns_txt: dns_txt_content.is_some(),
        dns_txt_content,
    }
}

/// First TXT value carrying the verification marker, case-insensitively.
#[must_use]
pub fn find_verification_record(records: &[String]) -> Option<String> {
    records
        .iter()
        .find(|record| {
            record
                .to_ascii_lowercase()
                .contains(SEARCH_CONSOLE_TXT_MARKER)
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_match_ignores_case() {
        let records = vec![
            "v=spf1 include:_spf.google.com ~all".to_string(),
            "Google-Site-Verification=abc123".to_string(),
        ];
        assert_eq!(
            find_verification_record(&records).as_deref(),
            Some("Google-Site-Verification=abc123")
        );
        assert_eq!(find_verification_record(&records[..1]), None);
    }
}
