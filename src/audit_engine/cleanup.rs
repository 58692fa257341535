//! Browser and resource cleanup functionality
//!
//! Every step is attempted regardless of earlier failures.

use std::sync::Arc;

use log::{debug, warn};

use crate::browser_provider::{BrowserSession, BrowsingContext};

/// Result of cleanup operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    /// All cleanup operations succeeded
    Success,
    /// Some cleanup operations failed, with error details
    PartialFailure(Vec<String>),
}

impl CleanupResult {
    fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            Self::Success
        } else {
            Self::PartialFailure(errors)
        }
    }
}

/// Close the shared context, close the browser, remove a generated profile
/// directory and stop the CDP handler.
pub async fn teardown(session: Arc<BrowserSession>, shared_context: BrowsingContext) -> CleanupResult {
    let mut errors = Vec::new();

    debug!(target: "siteaudit::cleanup", "Closing shared browsing context");
    if let Err(e) = session.close_context(&shared_context).await {
        warn!(target: "siteaudit::cleanup", "Failed to close shared context: {e:#}");
        errors.push(format!("Context close failed: {e:#}"));
    }

    match Arc::try_unwrap(session) {
        Ok(mut session) => {
            debug!(target: "siteaudit::cleanup", "Closing browser");
            if let Err(e) = session.close_browser().await {
                warn!(target: "siteaudit::cleanup", "Failed to close browser: {e:#}");
                errors.push(format!("Browser close failed: {e:#}"));
            }

            if let Some(dir) = session.owned_profile_dir() {
                debug!(target: "siteaudit::cleanup", "Removing profile directory {}", dir.display());
                if let Err(e) = tokio::fs::remove_dir_all(dir).await {
                    warn!(target: "siteaudit::cleanup", "Failed to remove profile directory: {e}");
                    errors.push(format!("Directory cleanup failed: {e}"));
                }
            }

            session.disconnect();
        }
        Err(shared) => {
            // a task outlived the batch; the session closes when its last reference drops
            warn!(
                target: "siteaudit::cleanup",
                "Browser session still has {} references, deferring close",
                Arc::strong_count(&shared)
            );
            errors.push("Browser close deferred: session still referenced".to_string());
        }
    }

    CleanupResult::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_reflects_collected_errors() {
        assert_eq!(CleanupResult::from_errors(Vec::new()), CleanupResult::Success);
        assert_eq!(
            CleanupResult::from_errors(vec!["x".into()]),
            CleanupResult::PartialFailure(vec!["x".into()])
        );
    }
}
