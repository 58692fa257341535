//! URL and domain helpers.
//!
//! This module provides the URL checks shared by the link checker, the
//! search console detector and the sitemap collaborator.

use anyhow::Result;
use psl::{List, Psl};
use url::{Host, Url};

/// Check if a URL is valid
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // Skip data URLs, javascript URLs, and other non-http schemes
    if url.starts_with("data:")
        || url.starts_with("javascript:")
        || url.starts_with("mailto:")
        || url.starts_with("tel:")
    {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Add `https://` when the input has no scheme.
#[must_use]
pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Lower-cased host of `url`.
pub fn host_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| anyhow::anyhow!("Failed to parse URL: {e}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid URL: no host"))?;
    Ok(host.to_ascii_lowercase())
}

/// Registrable domain used for ownership checks.
///
/// `https://www.blog.example.co.uk/x` yields `example.co.uk`. A leading `www.`
/// is stripped first. IP literals are returned unchanged, and single-label
/// hosts such as `localhost` fall back to the stripped host.
pub fn verification_domain(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| anyhow::anyhow!("Failed to parse URL: {e}"))?;
    let host = match parsed.host() {
        Some(Host::Domain(domain)) => domain.to_ascii_lowercase(),
        Some(other) => return Ok(other.to_string()),
        None => return Err(anyhow::anyhow!("Invalid URL: no host")),
    };
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let registrable = List
        .domain(host.as_bytes())
        .map(|d| String::from_utf8_lossy(d.as_bytes()).to_string());

    Ok(registrable.unwrap_or_else(|| host.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_www_and_subdomains() {
        assert_eq!(
            verification_domain("https://www.example.com/page").ok().as_deref(),
            Some("example.com")
        );
        assert_eq!(
            verification_domain("https://blog.example.co.uk/").ok().as_deref(),
            Some("example.co.uk")
        );
    }

    #[test]
    fn falls_back_to_host_without_suffix() {
        assert_eq!(
            verification_domain("http://127.0.0.1:8080/").ok().as_deref(),
            Some("127.0.0.1")
        );
    }

    #[test]
    fn rejects_non_http_links() {
        assert!(!is_valid_url("mailto:someone@example.com"));
        assert!(!is_valid_url("javascript:void(0)"));
        assert!(!is_valid_url("tel:+15555550100"));
        assert!(!is_valid_url(""));
        assert!(is_valid_url("https://example.com/a"));
    }

    #[test]
    fn normalizes_scheme() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url(" http://example.com "), "http://example.com");
    }
}
