//! Accessibility audit via an injected axe-core engine.
//!
//! The engine script is loaded once per batch (see [`load_engine_script`])
//! and injected into each page only when `window.axe` is not already defined.
//! Every failure after loading degrades to an empty violation list.

use std::sync::Arc;

use anyhow::{Context, Result};
use chromiumoxide::Page;
use reqwest::Client;

use crate::audit_engine::audit_types::AxeViolation;
use crate::config::AccessibilityEngineSource;

const AXE_PRESENT_SCRIPT: &str = "typeof window.axe !== 'undefined'";

/// Fetch or read the rule engine source.
pub async fn load_engine_script(
    source: &AccessibilityEngineSource,
    client: &Client,
) -> Result<Arc<str>> {
    let script = match source {
        AccessibilityEngineSource::Inline(script) => script.clone(),
        AccessibilityEngineSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read accessibility engine from {}", path.display()))?,
        AccessibilityEngineSource::Url(url) => client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .with_context(|| format!("Failed to download accessibility engine from {url}"))?
            .text()
            .await
            .context("Failed to read accessibility engine body")?,
    };

    if script.trim().is_empty() {
        anyhow::bail!("Accessibility engine script is empty");
    }

    log::debug!("Loaded accessibility engine ({} bytes)", script.len());
    Ok(Arc::from(script))
}

/// Script that runs the engine against the document with a tag filter.
fn audit_script(tags: &[String]) -> Result<String> {
    let values = serde_json::to_string(tags).context("Failed to encode rule tags")?;
    Ok(format!(
        r"
    (async () => {{
        if (typeof window.axe === 'undefined') {{
            return [];
        }}
        const results = await window.axe.run(document, {{
            runOnly: {{ type: 'tag', values: {values} }},
            resultTypes: ['violations']
        }});
        return (results && results.violations ? results.violations : []).map(v => ({{
            id: v.id,
            impact: v.impact || null,
            description: v.description || '',
            help: v.help || null,
            helpUrl: v.helpUrl || null,
            nodes: (v.nodes || []).map(n => ({{
                target: n.target || [],
                html: n.html || '',
                failureSummary: n.failureSummary || null,
                impact: n.impact || null
            }}))
        }}));
    }})()
"
    ))
}

async fn inject_engine(page: &Page, script: &str) -> Result<()> {
    let present = page
        .evaluate(AXE_PRESENT_SCRIPT)
        .await
        .context("Failed to probe for accessibility engine")?
        .into_value::<bool>()
        .unwrap_or(false);
    if present {
        return Ok(());
    }

    // the engine's completion value may not serialize; presence is checked below
    if let Err(e) = page.evaluate(script).await {
        log::debug!("Accessibility engine evaluation reported: {e}");
    }

    let loaded = page
        .evaluate(AXE_PRESENT_SCRIPT)
        .await
        .context("Failed to verify accessibility engine injection")?
        .into_value::<bool>()
        .unwrap_or(false);
    if !loaded {
        anyhow::bail!("window.axe is still undefined after injection");
    }
    Ok(())
}

async fn try_run(page: &Page, script: &str, tags: &[String]) -> Result<Vec<AxeViolation>> {
    inject_engine(page, script).await?;

    let value = page
        .evaluate(audit_script(tags)?)
        .await
        .context("Accessibility audit threw")?
        .into_value::<serde_json::Value>()
        .map_err(|e| anyhow::anyhow!("Failed to get accessibility results: {e}"))?;

    serde_json::from_value(value).context("Failed to parse accessibility violations")
}

/// Run the audit; engine or evaluation failures yield no violations.
pub async fn run_accessibility_audit(page: &Page, script: &str, tags: &[String]) -> Vec<AxeViolation> {
    match try_run(page, script, tags).await {
        Ok(violations) => violations,
        Err(e) => {
            log::warn!("Accessibility audit failed: {e:#}");
            Vec::new()
        }
    }
}
