//! Per-batch DNS TXT cache with request coalescing.
//!
//! The first caller for a domain spawns the lookup and stores a shared handle
//! to it; every caller for that domain awaits the same handle, so a batch
//! issues at most one TXT query per domain. The lookup runs detached, so a
//! caller dropped mid-lookup (timeout, abort) does not restart it. Failures
//! resolve to an empty record list and are cached like any other answer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dashmap::DashMap;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};

/// Future returned by [`TxtResolver::lookup_txt`].
pub type TxtLookupFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<String>>> + Send + 'a>>;

/// Source of TXT record values for a domain.
pub trait TxtResolver: Send + Sync {
    fn lookup_txt<'a>(&'a self, domain: &'a str) -> TxtLookupFuture<'a>;
}

/// TXT lookups through hickory with short timeouts.
pub struct HickoryTxtResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryTxtResolver {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 2;
        // no search-domain appending
        opts.ndots = 0;

        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }
}

impl TxtResolver for HickoryTxtResolver {
    fn lookup_txt<'a>(&'a self, domain: &'a str) -> TxtLookupFuture<'a> {
        Box::pin(async move {
            match self.resolver.txt_lookup(domain).await {
                Ok(lookup) => Ok(lookup
                    .iter()
                    .map(|txt| {
                        // a record may be split into several character-strings
                        txt.iter()
                            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
                            .collect::<Vec<String>>()
                            .join("")
                    })
                    .collect()),
                Err(e) => {
                    let error_msg = e.to_string();
                    if error_msg.contains("no records found") || error_msg.contains("NXDomain") {
                        Ok(Vec::new())
                    } else {
                        Err(anyhow::anyhow!("TXT lookup failed for {domain}: {e}"))
                    }
                }
            }
        })
    }
}

type PendingLookup = Shared<BoxFuture<'static, Arc<Vec<String>>>>;

pub struct DnsTxtCache {
    resolver: Arc<dyn TxtResolver>,
    entries: DashMap<String, PendingLookup>,
}

impl DnsTxtCache {
    #[must_use]
    pub fn new(resolver: Arc<dyn TxtResolver>) -> Self {
        Self {
            resolver,
            entries: DashMap::new(),
        }
    }

    /// TXT values for `domain`, resolving at most once per cache.
    pub async fn txt_records(&self, domain: &str) -> Arc<Vec<String>> {
        let key = domain.trim_end_matches('.').to_ascii_lowercase();

        // get-or-spawn the lookup; the map guard is released before awaiting
        let pending = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| spawn_lookup(Arc::clone(&self.resolver), key))
            .value()
            .clone();

        pending.await
    }

    /// Domains seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn spawn_lookup(resolver: Arc<dyn TxtResolver>, domain: String) -> PendingLookup {
    let handle = tokio::spawn(async move {
        log::debug!("Looking up TXT records for {domain}");
        match resolver.lookup_txt(&domain).await {
            Ok(records) => Arc::new(records),
            Err(e) => {
                log::warn!("{e:#}");
                Arc::new(Vec::new())
            }
        }
    });

    async move {
        handle.await.unwrap_or_else(|e| {
            log::warn!("TXT lookup task failed: {e}");
            Arc::new(Vec::new())
        })
    }
    .boxed()
    .shared()
}

impl std::fmt::Debug for DnsTxtCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsTxtCache")
            .field("domains", &self.entries.len())
            .finish_non_exhaustive()
    }
}
