//! Sitemap discovery.
//!
//! Fetches `/sitemap.xml` (falling back to `/sitemap_index.xml`), expands
//! sitemap indexes up to a fixed depth and returns the deduplicated page URLs.

use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Client;
use serde::Serialize;

use crate::utils::constants::{SITEMAP_FETCH_TIMEOUT_SECS, SITEMAP_MAX_DEPTH};
use crate::utils::normalize_url;

static LOC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>")
        .unwrap_or_else(|e| panic!("Failed to compile regex LOC_PATTERN: {e}"))
});

#[derive(Debug, thiserror::Error)]
pub enum SitemapError {
    #[error("URL is required")]
    MissingUrl,
    #[error("Sitemap not found")]
    NotFound,
    #[error("No URLs found in sitemap")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapResponse {
    pub urls: Vec<String>,
    pub count: usize,
    /// The root sitemap that answered.
    pub sitemap_url: String,
}

/// `<loc>` values in document order, with XML entities for `&` decoded.
#[must_use]
pub fn extract_locs(xml: &str) -> Vec<String> {
    LOC_PATTERN
        .captures_iter(xml)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .filter(|loc| !loc.is_empty())
        .collect()
}

#[must_use]
pub fn is_sitemap_index(xml: &str) -> bool {
    xml.contains("<sitemapindex") || xml.contains("<sitemap>")
}

#[derive(Debug, Clone)]
pub struct SitemapDiscovery {
    client: Client,
    timeout: Duration,
    max_depth: usize,
}

impl SitemapDiscovery {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(SITEMAP_FETCH_TIMEOUT_SECS),
            max_depth: SITEMAP_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Discover page URLs for `site` (a bare domain or a URL).
    pub async fn discover(&self, site: &str) -> Result<SitemapResponse, SitemapError> {
        if site.trim().is_empty() {
            return Err(SitemapError::MissingUrl);
        }
        let base = normalize_url(site);
        let base = base.trim_end_matches('/');

        let mut sitemap_url = format!("{base}/sitemap.xml");
        let urls = match self.collect(&sitemap_url).await {
            Ok(urls) => urls,
            Err(e) => {
                log::debug!("{sitemap_url} unavailable ({e:#}), trying sitemap index");
                sitemap_url = format!("{base}/sitemap_index.xml");
                self.collect(&sitemap_url)
                    .await
                    .map_err(|_| SitemapError::NotFound)?
            }
        };

        if urls.is_empty() {
            return Err(SitemapError::Empty);
        }

        let mut seen = HashSet::new();
        let pages: Vec<String> = urls
            .into_iter()
            .filter(|url| seen.insert(url.clone()))
            .filter(|url| !url.ends_with(".xml") && !url.ends_with(".xsl"))
            .collect();

        log::info!("Sitemap {sitemap_url} lists {} page(s)", pages.len());
        Ok(SitemapResponse {
            count: pages.len(),
            urls: pages,
            sitemap_url,
        })
    }

    /// Walk a sitemap tree. Only a failure of the root is an error; nested
    /// sitemaps that fail are skipped.
    async fn collect(&self, root: &str) -> Result<Vec<String>> {
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        let mut pending = VecDeque::from([(root.to_string(), 0usize)]);

        while let Some((url, depth)) = pending.pop_front() {
            if !visited.insert(url.clone()) {
                continue;
            }

            let xml = match self.fetch(&url).await {
                Ok(xml) => xml,
                Err(e) if depth == 0 => return Err(e),
                Err(e) => {
                    log::warn!("Failed to fetch nested sitemap {url}: {e:#}");
                    continue;
                }
            };

            let locs = extract_locs(&xml);
            if is_sitemap_index(&xml) {
                if depth >= self.max_depth {
                    log::warn!("Sitemap index {url} exceeds nesting depth {}", self.max_depth);
                    continue;
                }
                pending.extend(locs.into_iter().map(|loc| (loc, depth + 1)));
            } else {
                pages.extend(locs);
            }
        }

        Ok(pages)
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("{url} answered {}", response.status());
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read {url}"))
    }
}
