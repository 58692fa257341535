//! Batch audit engine.
//!
//! The orchestrator schedules page tasks over an [`AuditBackend`] and
//! streams their results; the browser-backed implementation lives in
//! `backend`, `page_task` and `global_phase`.

pub mod audit_types;
pub mod backend;
pub mod cancellation;
pub mod cleanup;
pub mod concurrency;
mod global_phase;
pub mod orchestrator;
pub mod page_task;
pub mod page_timeout;

pub use audit_types::{
    AccessibilityStandard, AnalysisRequest, AnalysisResult, AnalysisSettings, AnalyticsData,
    AuditError, AuditResult, AxeViolation, BrokenLink, GlobalResult, GoogleAnalyticsData, Heading,
    ImageInfo, Impact, Screenshots, SearchConsoleData, ViolationNode,
};
pub use backend::{AuditBackend, AuditFuture, BrowserBackend};
pub use cancellation::{checkpoint, unless_cancelled};
pub use cleanup::CleanupResult;
pub use concurrency::{ConcurrencyProbe, ProbeGuard};
pub use orchestrator::{BatchOrchestrator, BatchOutcome, drive_batch};
pub use page_task::analyze_within_budget;
