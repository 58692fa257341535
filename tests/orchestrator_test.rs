//! Batch scheduling tests against scripted backends
//!
//! No browser is involved: the backends below sleep, panic or stall on
//! request so dispatch, ordering and abort behaviour can be observed.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use kodegen_tools_siteaudit::audit_engine::page_task::settle;
use kodegen_tools_siteaudit::audit_engine::{
    AnalysisRequest, AnalysisResult, AnalysisSettings, AuditBackend, AuditError, AuditFuture,
    AuditResult, BatchOrchestrator, GlobalResult, analyze_within_budget, unless_cancelled,
};
use kodegen_tools_siteaudit::{AuditConfig, AuditEvent, AuditStream};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
enum SiteBehaviour {
    #[default]
    Succeed,
    Fail,
    Stall,
}

#[derive(Default)]
struct ScriptedBackend {
    page_delay: Duration,
    site: SiteBehaviour,
    panic_on: Option<String>,
    page_budget: Option<Duration>,
    page_calls: AtomicUsize,
    site_pages_closed: AtomicUsize,
}

impl ScriptedBackend {
    fn with_delay(ms: u64) -> Self {
        Self {
            page_delay: Duration::from_millis(ms),
            ..Self::default()
        }
    }
}

impl AuditBackend for ScriptedBackend {
    fn analyze_site<'a>(
        &'a self,
        _url: &'a str,
        cancel: &'a CancellationToken,
    ) -> AuditFuture<'a, AuditResult<GlobalResult>> {
        Box::pin(async move {
            match self.site {
                SiteBehaviour::Succeed => Ok(GlobalResult::default()),
                SiteBehaviour::Fail => Err(AuditError::Navigation("site unreachable".into())),
                SiteBehaviour::Stall => {
                    let stalled = unless_cancelled(cancel, std::future::pending::<()>()).await;
                    self.site_pages_closed.fetch_add(1, Ordering::SeqCst);
                    stalled.map(|()| GlobalResult::default())
                }
            }
        })
    }

    fn analyze_page<'a>(
        &'a self,
        url: &'a str,
        cancel: &'a CancellationToken,
    ) -> AuditFuture<'a, Option<AnalysisResult>> {
        Box::pin(async move {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            if self.panic_on.as_deref() == Some(url) {
                panic!("scripted failure for {url}");
            }

            let analysis = async {
                unless_cancelled(cancel, tokio::time::sleep(self.page_delay)).await?;
                Ok::<_, AuditError>(AnalysisResult {
                    url: url.to_string(),
                    seo_issues: vec!["Missing meta description".to_string()],
                    ..AnalysisResult::default()
                })
            };

            match self.page_budget {
                Some(budget) => {
                    let stalled = async {
                        std::future::pending::<()>().await;
                        analysis.await
                    };
                    analyze_within_budget(url, budget, stalled).await
                }
                None => settle(url, analysis.await),
            }
        })
    }
}

fn urls(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("https://site.test/page-{i}")).collect()
}

fn request(n: usize, concurrency: usize) -> AnalysisRequest {
    let settings = AnalysisSettings {
        concurrency,
        ..AnalysisSettings::default()
    };
    AnalysisRequest::new(urls(n), settings).expect("non-empty request")
}

fn orchestrator() -> BatchOrchestrator {
    BatchOrchestrator::new(AuditConfig::builder().build().expect("default config"))
}

async fn drain(stream: AuditStream) -> Vec<AuditEvent> {
    tokio::time::timeout(Duration::from_secs(10), stream.collect::<Vec<_>>())
        .await
        .expect("batch finished in time")
}

fn results(events: &[AuditEvent]) -> Vec<&AnalysisResult> {
    events
        .iter()
        .filter_map(|event| match event {
            AuditEvent::Result { result, .. } => Some(&**result),
            _ => None,
        })
        .collect()
}

fn log_lines(events: &[AuditEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            AuditEvent::Log { message, .. } => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn emits_exactly_one_result_per_url() {
    let backend = Arc::new(ScriptedBackend::with_delay(5));
    let stream = orchestrator().start_with_backend(request(7, 3), Arc::clone(&backend));
    let events = drain(stream).await;

    let mut seen: Vec<&str> = results(&events).iter().map(|r| r.url.as_str()).collect();
    seen.sort_unstable();
    let mut expected = urls(7);
    expected.sort_unstable();
    assert_eq!(seen, expected);
    assert_eq!(backend.page_calls.load(Ordering::SeqCst), 7);

    assert!(log_lines(&events).contains(&"All tasks completed (7/7)"));
    assert!(matches!(events.last(), Some(AuditEvent::Done)));
    assert!(!events.iter().any(|e| matches!(e, AuditEvent::Error(_))));
}

#[tokio::test]
async fn never_exceeds_requested_concurrency() {
    let backend = Arc::new(ScriptedBackend::with_delay(30));
    let stream = orchestrator().start_with_backend(request(8, 3), backend);
    let probe = stream.probe();
    let events = drain(stream).await;

    assert_eq!(results(&events).len(), 8);
    assert!(probe.peak() <= 3, "peak was {}", probe.peak());
    assert!(probe.peak() >= 1);
    assert_eq!(probe.started(), 8);
    assert_eq!(probe.current(), 0);
}

#[tokio::test]
async fn concurrency_is_clamped_to_configured_maximum() {
    let config = AuditConfig::builder()
        .max_concurrency(2)
        .build()
        .expect("valid config");
    let backend = Arc::new(ScriptedBackend::with_delay(20));
    let stream = BatchOrchestrator::new(config).start_with_backend(request(6, 50), backend);
    let probe = stream.probe();
    let events = drain(stream).await;

    assert_eq!(results(&events).len(), 6);
    assert!(probe.peak() <= 2, "peak was {}", probe.peak());
}

#[tokio::test]
async fn global_result_precedes_every_result() {
    let backend = Arc::new(ScriptedBackend::with_delay(1));
    let events = drain(orchestrator().start_with_backend(request(3, 2), backend)).await;

    let global_at: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| matches!(e, AuditEvent::GlobalResult(_)))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(global_at.len(), 1);

    let first_result = events
        .iter()
        .position(|e| matches!(e, AuditEvent::Result { .. }))
        .expect("results emitted");
    assert!(global_at[0] < first_result);
}

#[tokio::test]
async fn failed_global_phase_does_not_stop_the_batch() {
    let backend = Arc::new(ScriptedBackend {
        site: SiteBehaviour::Fail,
        ..ScriptedBackend::with_delay(1)
    });
    let events = drain(orchestrator().start_with_backend(request(2, 2), backend)).await;

    assert!(!events.iter().any(|e| matches!(e, AuditEvent::GlobalResult(_))));
    assert_eq!(results(&events).len(), 2);
    assert!(
        log_lines(&events)
            .iter()
            .any(|line| line.starts_with("Global analysis failed"))
    );
}

#[tokio::test]
async fn stalled_global_phase_times_out() {
    let config = AuditConfig::builder()
        .global_phase_timeout_ms(50)
        .build()
        .expect("valid config");
    let backend = Arc::new(ScriptedBackend {
        site: SiteBehaviour::Stall,
        ..ScriptedBackend::with_delay(1)
    });
    let events = drain(
        BatchOrchestrator::new(config).start_with_backend(request(2, 1), Arc::clone(&backend)),
    )
    .await;

    // the timed-out phase is cancelled and unwinds before pages are dispatched
    assert_eq!(backend.site_pages_closed.load(Ordering::SeqCst), 1);

    assert!(!events.iter().any(|e| matches!(e, AuditEvent::GlobalResult(_))));
    assert_eq!(results(&events).len(), 2);
    assert!(
        log_lines(&events)
            .iter()
            .any(|line| line.contains("timed out after 50 ms"))
    );
}

#[tokio::test]
async fn abort_during_global_phase_lets_it_close_its_page() {
    let backend = Arc::new(ScriptedBackend {
        site: SiteBehaviour::Stall,
        ..ScriptedBackend::with_delay(1)
    });
    let stream = orchestrator().start_with_backend(request(3, 1), Arc::clone(&backend));
    let cancel = stream.abort_handle();

    tokio::time::sleep(Duration::from_millis(30)).await;
    cancel.cancel();
    let events = drain(stream).await;

    assert_eq!(backend.site_pages_closed.load(Ordering::SeqCst), 1);
    assert!(results(&events).is_empty());
    assert_eq!(backend.page_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn abort_stops_dispatch_and_silences_in_flight_tasks() {
    let backend = Arc::new(ScriptedBackend::with_delay(50));
    let mut stream = orchestrator().start_with_backend(request(5, 1), Arc::clone(&backend));

    let mut events = Vec::new();
    let mut result_count = 0;
    while let Some(event) = tokio::time::timeout(Duration::from_secs(10), stream.next())
        .await
        .expect("event in time")
    {
        if matches!(event, AuditEvent::Result { .. }) {
            result_count += 1;
            if result_count == 2 {
                stream.abort();
            }
        }
        events.push(event);
    }

    assert!(stream.is_aborted());
    assert_eq!(results(&events).len(), 2);
    assert!(!events.iter().any(|e| matches!(e, AuditEvent::Error(_))));
    assert!(
        !log_lines(&events)
            .iter()
            .any(|line| line.starts_with("All tasks completed"))
    );
    assert!(backend.page_calls.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn dropping_the_stream_aborts_the_batch() {
    let backend = Arc::new(ScriptedBackend::with_delay(40));
    let stream = orchestrator().start_with_backend(request(10, 1), Arc::clone(&backend));
    let cancel = stream.abort_handle();

    tokio::time::sleep(Duration::from_millis(60)).await;
    drop(stream);
    assert!(cancel.is_cancelled());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(backend.page_calls.load(Ordering::SeqCst) < 10);
}

#[tokio::test]
async fn panicking_task_becomes_error_result() {
    let backend = Arc::new(ScriptedBackend {
        panic_on: Some("https://site.test/page-2".to_string()),
        ..ScriptedBackend::with_delay(1)
    });
    let events = drain(orchestrator().start_with_backend(request(3, 2), backend)).await;

    let results = results(&events);
    assert_eq!(results.len(), 3);
    let failed = results
        .iter()
        .find(|r| r.url == "https://site.test/page-2")
        .expect("result for panicking URL");
    assert!(failed.is_error());
    assert!(failed.headings.is_empty());
    assert!(failed.seo_issues.is_empty());
    assert_eq!(results.iter().filter(|r| r.is_error()).count(), 1);
}

#[tokio::test]
async fn per_url_budget_yields_timeout_results() {
    let backend = Arc::new(ScriptedBackend {
        page_budget: Some(Duration::from_millis(20)),
        ..ScriptedBackend::with_delay(1)
    });
    let events = drain(orchestrator().start_with_backend(request(2, 2), backend)).await;

    let results = results(&events);
    assert_eq!(results.len(), 2);
    for result in results {
        assert_eq!(result.error.as_deref(), Some("Analysis timed out after 20 ms"));
        assert!(result.broken_links.is_empty());
        assert!(result.accessibility_issues.is_empty());
    }
}

#[tokio::test]
async fn start_json_rejects_bad_requests_before_starting() {
    let orchestrator = orchestrator();
    let err = orchestrator
        .start_json(serde_json::json!({ "settings": {} }))
        .expect_err("missing urls");
    assert_eq!(err.to_string(), "Invalid request: URLs array is required");
}

#[tokio::test]
async fn wire_lines_are_tagged_and_terminated() {
    let backend = Arc::new(ScriptedBackend::with_delay(1));
    let stream = orchestrator().start_with_backend(request(2, 1), backend);
    let lines: Vec<String> = tokio::time::timeout(
        Duration::from_secs(10),
        stream.into_wire_lines().collect::<Vec<_>>(),
    )
    .await
    .expect("batch finished in time");

    assert!(lines.iter().all(|line| line.ends_with('\n')));
    assert!(lines.iter().all(|line| line.matches('\n').count() == 1));
    assert!(lines[0].starts_with("LOG:"));

    let global = lines
        .iter()
        .find_map(|line| line.strip_prefix("GLOBAL_RESULT:"))
        .expect("global line");
    let global: serde_json::Value = serde_json::from_str(global.trim_end()).expect("json");
    assert_eq!(global["analytics"]["googleAnalytics"]["hasGA4"], false);
    assert_eq!(global["analytics"]["searchConsole"]["hasHtmlFile"], false);

    let payloads: Vec<serde_json::Value> = lines
        .iter()
        .filter_map(|line| line.strip_prefix("RESULT:"))
        .map(|json| serde_json::from_str(json.trim_end()).expect("json"))
        .collect();
    assert_eq!(payloads.len(), 2);
    for payload in payloads {
        assert_eq!(payload["url"], payload["result"]["url"]);
        assert_eq!(
            payload["result"]["seoIssues"][0],
            "Missing meta description"
        );
        assert!(payload["result"]["brokenLinks"].as_array().is_some());
        assert!(payload["result"].get("error").is_none());
    }
}
