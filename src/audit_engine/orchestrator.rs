//! Batch orchestration
//!
//! Coordinates one audit batch:
//! - browser acquisition and shared-context setup
//! - the global phase against the first URL
//! - bounded-concurrency dispatch of page tasks
//! - event emission, abort handling and cleanup

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::sync::{OnceCell, Semaphore};
use tokio_util::sync::CancellationToken;

use super::audit_types::{AnalysisRequest, AnalysisResult, AuditError, AuditResult};
use super::backend::{AuditBackend, BrowserBackend};
use super::cancellation::unless_cancelled;
use super::cleanup::{CleanupResult, teardown};
use super::concurrency::ConcurrencyProbe;
use crate::analyzers::{
    DnsTxtCache, HickoryTxtResolver, LinkChecker, http_client, load_engine_script,
};
use crate::audit_events::{AuditStream, EventSink};
use crate::browser_provider::{BrowserSession, BrowsingContext};
use crate::config::AuditConfig;
use crate::utils::constants::GLOBAL_PHASE_UNWIND_GRACE_MS;

/// How a driven batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// RESULT events emitted.
    pub completed: usize,
    pub cancelled: bool,
}

/// Starts audit batches. One orchestrator serves many batches; each batch
/// gets its own browser session, DNS cache and cancellation token.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    config: Arc<AuditConfig>,
    /// Rule engine source, fetched on first use and shared by later batches.
    engine_script: Arc<OnceCell<Arc<str>>>,
}

impl BatchOrchestrator {
    #[must_use]
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config: Arc::new(config),
            engine_script: Arc::new(OnceCell::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Validate a JSON request body and start the batch.
    pub fn start_json(&self, body: Value) -> AuditResult<AuditStream> {
        let request = AnalysisRequest::from_json(body)?;
        Ok(self.start(request))
    }

    /// Start a browser-backed batch. Returns immediately; events arrive on
    /// the stream. Dropping the stream aborts the batch.
    #[must_use]
    pub fn start(&self, request: AnalysisRequest) -> AuditStream {
        let cancel = CancellationToken::new();
        let probe = ConcurrencyProbe::new();
        let (sink, rx) = EventSink::new(cancel.clone());

        let config = Arc::clone(&self.config);
        let engine_script = Arc::clone(&self.engine_script);
        let batch_cancel = cancel.clone();
        let batch_probe = Arc::clone(&probe);
        tokio::spawn(async move {
            run_browser_batch(config, engine_script, request, sink, batch_cancel, batch_probe)
                .await;
        });

        AuditStream::new(rx, cancel, probe)
    }

    /// Start a batch against a caller-supplied backend.
    #[must_use]
    pub fn start_with_backend<B: AuditBackend>(
        &self,
        request: AnalysisRequest,
        backend: Arc<B>,
    ) -> AuditStream {
        let cancel = CancellationToken::new();
        let probe = ConcurrencyProbe::new();
        let (sink, rx) = EventSink::new(cancel.clone());

        let concurrency = request
            .settings()
            .effective_concurrency(self.config.max_concurrency());
        let global_timeout = self.config.global_phase_timeout();
        let batch_cancel = cancel.clone();
        let batch_probe = Arc::clone(&probe);
        tokio::spawn(async move {
            drive_batch(
                backend,
                request.urls(),
                concurrency,
                global_timeout,
                &sink,
                &batch_cancel,
                &batch_probe,
            )
            .await;
            sink.close();
        });

        AuditStream::new(rx, cancel, probe)
    }
}

async fn run_browser_batch(
    config: Arc<AuditConfig>,
    engine_script: Arc<OnceCell<Arc<str>>>,
    request: AnalysisRequest,
    sink: EventSink,
    cancel: CancellationToken,
    probe: Arc<ConcurrencyProbe>,
) {
    let settings = request.settings().clone();
    let concurrency = settings.effective_concurrency(config.max_concurrency());
    sink.log(format!(
        "Starting analysis of {} URL(s) with concurrency {concurrency}",
        request.urls().len()
    ));

    let session = match unless_cancelled(&cancel, BrowserSession::acquire(&config)).await {
        Ok(Ok(session)) => Arc::new(session),
        Ok(Err(e)) => {
            sink.error(format!("Failed to start browser: {e:#}"));
            return;
        }
        Err(_) => {
            sink.close();
            return;
        }
    };
    sink.log(if session.is_attached() {
        "Attached to running browser."
    } else {
        "Browser launched."
    });

    let shared_context = match session.shared_context().await {
        Ok(context) => context,
        Err(e) => {
            sink.error(format!("Failed to create browsing context: {e:#}"));
            log_cleanup(teardown(session, BrowsingContext::default_context()).await);
            return;
        }
    };

    let client = match http_client() {
        Ok(client) => client,
        Err(e) => {
            sink.error(format!("{e:#}"));
            log_cleanup(teardown(session, shared_context).await);
            return;
        }
    };

    let engine = engine_script
        .get_or_try_init(|| load_engine_script(config.accessibility_engine(), &client))
        .await
        .map(Arc::clone);
    let engine = match engine {
        Ok(script) => Some(script),
        Err(e) => {
            sink.log(format!(
                "Accessibility engine unavailable, skipping accessibility audits: {e:#}"
            ));
            None
        }
    };

    let backend = Arc::new(BrowserBackend {
        session,
        shared_context,
        config: Arc::clone(&config),
        tags: settings.accessibility_tags(),
        settings,
        engine_script: engine,
        links: LinkChecker::new(client, config.link_check_limit(), config.link_check_timeout()),
        dns: DnsTxtCache::new(Arc::new(HickoryTxtResolver::new(config.dns_timeout()))),
        sink: sink.clone(),
    });

    let outcome = drive_batch(
        Arc::clone(&backend),
        request.urls(),
        concurrency,
        config.global_phase_timeout(),
        &sink,
        &cancel,
        &probe,
    )
    .await;
    debug!(
        "Batch finished: {} result(s), cancelled: {}, DNS domains: {}",
        outcome.completed,
        outcome.cancelled,
        backend.dns.len()
    );

    match Arc::try_unwrap(backend) {
        Ok(backend) => {
            let (session, shared_context) = backend.into_resources();
            log_cleanup(teardown(session, shared_context).await);
        }
        Err(backend) => warn!(
            target: "siteaudit::cleanup",
            "Backend still has {} references, browser closes on drop",
            Arc::strong_count(&backend)
        ),
    }

    sink.close();
}

fn log_cleanup(result: CleanupResult) {
    match result {
        CleanupResult::Success => {
            debug!(target: "siteaudit::cleanup", "Browser cleanup completed successfully");
        }
        CleanupResult::PartialFailure(errors) => {
            warn!(target: "siteaudit::cleanup", "Cleanup completed with failures: {errors:?}");
        }
    }
}

/// Run the global phase and every page task of a batch on `backend`.
///
/// Emits GLOBAL_RESULT (at most once, before any RESULT) and one RESULT per
/// URL. Stops dispatching on abort, lets in-flight tasks unwind, and never
/// closes the sink.
pub async fn drive_batch<B: AuditBackend>(
    backend: Arc<B>,
    urls: &[String],
    concurrency: usize,
    global_timeout: Duration,
    sink: &EventSink,
    cancel: &CancellationToken,
    probe: &Arc<ConcurrencyProbe>,
) -> BatchOutcome {
    let total = urls.len();
    let concurrency = concurrency.max(1);

    if let Some(first) = urls.first() {
        sink.log("Running site-wide analytics detection...");
        let site_cancel = cancel.child_token();
        let mut site = backend.analyze_site(first, &site_cancel);
        let global = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            outcome = tokio::time::timeout(global_timeout, &mut site) => Some(outcome),
        };
        if !matches!(global, Some(Ok(_))) {
            // stop the phase but let it close its page before dispatch starts
            site_cancel.cancel();
            let grace = Duration::from_millis(GLOBAL_PHASE_UNWIND_GRACE_MS);
            if tokio::time::timeout(grace, site).await.is_err() {
                warn!(
                    target: "siteaudit::cleanup",
                    "Global phase did not unwind within {} ms",
                    grace.as_millis()
                );
            }
        }
        match global {
            None | Some(Ok(Err(AuditError::Cancelled))) => {}
            Some(Ok(Ok(global))) => {
                sink.global_result(global);
            }
            Some(Ok(Err(e))) => {
                sink.log(format!("Global analysis failed, continuing: {e}"));
            }
            Some(Err(_)) => {
                sink.log(format!(
                    "Global analysis timed out after {} ms, continuing",
                    global_timeout.as_millis()
                ));
            }
        }
    }

    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut queue = urls.iter().cloned();
    let mut active_tasks = FuturesUnordered::new();
    let mut completed = 0usize;

    loop {
        // Fill up to concurrency limit
        while !cancel.is_cancelled() && active_tasks.len() < concurrency {
            let Some(url) = queue.next() else {
                break;
            };

            let permit = if let Ok(p) = Arc::clone(&semaphore).acquire_owned().await {
                p
            } else {
                error!("Semaphore closed unexpectedly");
                break;
            };

            let backend = Arc::clone(&backend);
            let task_cancel = cancel.clone();
            let task_probe = Arc::clone(probe);
            let task_url = url.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let _running = task_probe.enter();
                backend.analyze_page(&task_url, &task_cancel).await
            });

            active_tasks.push(async move { (url, handle.await) });
        }

        let Some((url, joined)) = active_tasks.next().await else {
            break;
        };

        let result = match joined {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(e) if e.is_panic() && !cancel.is_cancelled() => {
                error!("Analysis task for {url} panicked: {e}");
                Some(AnalysisResult::failed(
                    url.as_str(),
                    format!("Analysis task panicked: {e}"),
                ))
            }
            Err(e) => {
                debug!("Analysis task for {url} ended without a result: {e}");
                None
            }
        };

        if let Some(result) = result
            && !cancel.is_cancelled()
            && sink.result(result)
        {
            completed += 1;
        }
    }

    let cancelled = cancel.is_cancelled();
    if cancelled {
        info!("Batch aborted after {completed}/{total} result(s)");
    } else {
        sink.log(format!("All tasks completed ({completed}/{total})"));
    }

    BatchOutcome {
        completed,
        cancelled,
    }
}
