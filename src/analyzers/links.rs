//! Hyperlink reachability checks.
//!
//! Links are deduplicated in first-seen order, capped, and probed
//! concurrently with HEAD, falling back to GET when HEAD errors or the server
//! rejects the method. Unreachable links report status 0.

use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use reqwest::{Client, Method, StatusCode};

use crate::audit_engine::audit_types::BrokenLink;
use crate::config::AuditConfig;
use crate::utils::constants::CHROME_USER_AGENT;
use crate::utils::is_valid_url;

/// Outcome of checking one page's links.
#[derive(Debug, Clone, Default)]
pub struct LinkCheckReport {
    /// Probe result for every checked link, in check order.
    pub results: Vec<BrokenLink>,
    /// Unique checkable links found on the page.
    pub total_found: usize,
    /// Links actually probed (after the cap).
    pub total_checked: usize,
}

impl LinkCheckReport {
    /// Only the links that did not answer with a success status.
    #[must_use]
    pub fn broken(&self) -> Vec<BrokenLink> {
        self.results.iter().filter(|l| !l.ok).cloned().collect()
    }
}

#[derive(Debug, Clone)]
pub struct LinkChecker {
    client: Client,
    limit: usize,
    timeout: Duration,
}

impl LinkChecker {
    #[must_use]
    pub fn new(client: Client, limit: usize, timeout: Duration) -> Self {
        Self {
            client,
            limit,
            timeout,
        }
    }

    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        Ok(Self::new(
            http_client()?,
            config.link_check_limit(),
            config.link_check_timeout(),
        ))
    }

    /// Unique http(s) links in first-seen order.
    #[must_use]
    pub fn unique_links(links: &[String]) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        links
            .iter()
            .map(|l| l.trim())
            .filter(|l| is_valid_url(l))
            .filter(|l| seen.insert(*l))
            .map(str::to_string)
            .collect()
    }

    pub async fn check(&self, links: &[String]) -> LinkCheckReport {
        let unique = Self::unique_links(links);
        let to_check: Vec<&String> = unique.iter().take(self.limit).collect();

        log::debug!(
            "Checking {} of {} unique links",
            to_check.len(),
            unique.len()
        );

        let results = join_all(to_check.iter().map(|link| self.probe(link))).await;

        LinkCheckReport {
            total_found: unique.len(),
            total_checked: results.len(),
            results,
        }
    }

    async fn probe(&self, link: &str) -> BrokenLink {
        match self.status_of(Method::HEAD, link).await {
            Ok(status)
                if status != StatusCode::METHOD_NOT_ALLOWED
                    && status != StatusCode::NOT_IMPLEMENTED =>
            {
                return reachable(link, status);
            }
            Ok(status) => log::trace!("HEAD {link} answered {status}, retrying with GET"),
            Err(e) => log::trace!("HEAD {link} failed ({e}), retrying with GET"),
        }

        match self.status_of(Method::GET, link).await {
            Ok(status) => reachable(link, status),
            Err(e) => BrokenLink {
                link: link.to_string(),
                status: 0,
                ok: false,
                error: Some(if e.is_timeout() { "Timeout" } else { "Failed to fetch" }.to_string()),
            },
        }
    }

    async fn status_of(&self, method: Method, link: &str) -> reqwest::Result<StatusCode> {
        let response = self
            .client
            .request(method, link)
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(response.status())
    }
}

fn reachable(link: &str, status: StatusCode) -> BrokenLink {
    BrokenLink {
        link: link.to_string(),
        status: status.as_u16(),
        ok: status.is_success(),
        error: None,
    }
}

/// Shared HTTP client for link probes and engine downloads.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .user_agent(CHROME_USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupes_and_filters_links() {
        let links = vec![
            "https://a.test/".to_string(),
            "mailto:x@a.test".to_string(),
            "https://a.test/".to_string(),
            "javascript:void(0)".to_string(),
            " https://b.test/ ".to_string(),
        ];
        assert_eq!(
            LinkChecker::unique_links(&links),
            vec!["https://a.test/", "https://b.test/"]
        );
    }
}
