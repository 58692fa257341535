//! Timeout utilities for page operations
//!
//! Provides async timeout wrappers to prevent indefinite hangs during
//! page navigation, evaluation and other browser operations.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::error::Elapsed;

/// Wrap an async page operation with an explicit timeout
///
/// Returns proper error messages distinguishing between timeout and
/// operation failures.
///
/// # Arguments
/// * `operation` - The async Future to execute with a timeout
/// * `timeout` - Budget for the operation
/// * `operation_name` - Human-readable name for error messages
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout: Duration,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {} ms",
            timeout.as_millis()
        )),
    }
}

/// Race a whole page analysis against its budget.
///
/// On expiry the future is dropped and whatever it had built is discarded;
/// underlying browser work may keep running until the page is closed.
pub async fn race_page_budget<F>(budget: Duration, analysis: F) -> Result<F::Output, Elapsed>
where
    F: Future,
{
    tokio::time::timeout(budget, analysis).await
}
