//! Browser resource handle for one audit batch.
//!
//! A [`BrowserSession`] owns the CDP connection (launched or attached) and
//! hands out browsing contexts and pages. Tasks borrow the session through an
//! `Arc` and never close it; the orchestrator tears it down once all tasks
//! have finished.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use tokio::task::JoinHandle;

use crate::browser_setup::{connect_browser, launch_browser};
use crate::config::{AuditConfig, BrowserEngine};

/// A browsing context (cookie jar / storage partition).
///
/// `id == None` is the browser's default context, which is never disposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowsingContext {
    id: Option<BrowserContextId>,
}

impl BrowsingContext {
    #[must_use]
    pub fn default_context() -> Self {
        Self { id: None }
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug)]
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    /// Profile directory created for this session, removed at teardown.
    owned_profile_dir: Option<PathBuf>,
    attached: bool,
}

impl BrowserSession {
    /// Launch or attach according to the configured engine.
    pub async fn acquire(config: &AuditConfig) -> Result<Self> {
        match config.browser_engine() {
            BrowserEngine::Launch { headless } => {
                let explicit_dir = config.chrome_data_dir().cloned();
                let generated = explicit_dir.is_none();
                let (browser, handler, user_data_dir) =
                    launch_browser(*headless, explicit_dir).await?;
                Ok(Self {
                    browser,
                    handler,
                    owned_profile_dir: generated.then_some(user_data_dir),
                    attached: false,
                })
            }
            BrowserEngine::Attach { endpoint } => {
                let (browser, handler) = connect_browser(endpoint).await?;
                Ok(Self {
                    browser,
                    handler,
                    owned_profile_dir: None,
                    attached: true,
                })
            }
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Create a fresh isolated browsing context.
    pub async fn create_context(&self) -> Result<BrowsingContext> {
        let response = self
            .browser
            .execute(CreateBrowserContextParams::default())
            .await
            .context("Failed to create browsing context")?;
        Ok(BrowsingContext {
            id: Some(response.result.browser_context_id),
        })
    }

    /// Context shared by every task of the batch. An attached browser reuses
    /// its existing default context; a launched one gets a dedicated context.
    pub async fn shared_context(&self) -> Result<BrowsingContext> {
        if self.attached {
            Ok(BrowsingContext::default_context())
        } else {
            self.create_context().await
        }
    }

    /// Open a blank page in `context`.
    pub async fn open_page(&self, context: &BrowsingContext) -> Result<Page> {
        let mut builder = CreateTargetParams::builder().url("about:blank");
        if let Some(id) = &context.id {
            builder = builder.browser_context_id(id.clone());
        }
        let params = builder.build().map_err(anyhow::Error::msg)?;

        self.browser
            .new_page(params)
            .await
            .context("Failed to open page")
    }

    /// Dispose a context created by this session. The default context is
    /// left alone.
    pub async fn close_context(&self, context: &BrowsingContext) -> Result<()> {
        let Some(id) = &context.id else {
            return Ok(());
        };
        self.browser
            .execute(DisposeBrowserContextParams::new(id.clone()))
            .await
            .context("Failed to dispose browsing context")?;
        Ok(())
    }

    /// Close a launched browser and wait for its process to exit.
    /// An attached browser is only disconnected.
    pub async fn close_browser(&mut self) -> Result<()> {
        if self.attached {
            return Ok(());
        }
        self.browser
            .close()
            .await
            .context("Failed to close browser")?;
        self.browser
            .wait()
            .await
            .context("Failed to wait for browser exit")?;
        Ok(())
    }

    #[must_use]
    pub fn owned_profile_dir(&self) -> Option<&Path> {
        self.owned_profile_dir.as_deref()
    }

    /// Stop driving the CDP connection.
    pub fn disconnect(&self) {
        self.handler.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
