//! Page data types extracted by in-page evaluation.

use serde::Deserialize;

use crate::audit_engine::audit_types::{Heading, ImageInfo};

/// Everything a page task needs from one loaded document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageData {
    pub title: String,
    pub meta_description: Option<String>,
    pub headings: Vec<Heading>,
    /// Raw hyperlink targets, already resolved to absolute URLs by the page.
    pub links: Vec<String>,
    pub images: Vec<ImageInfo>,
    pub scripts: Vec<String>,
    pub inline_scripts: Vec<String>,
    pub search_console_meta: Option<String>,
    /// `document.body.innerHTML.length`
    pub html_length: usize,
}

impl PageData {
    /// True when the body is small enough to suggest a block page or a
    /// failed client-side render.
    #[must_use]
    pub fn looks_empty(&self, threshold: usize) -> bool {
        self.html_length < threshold
    }
}

/// Script and document snapshot used by the global phase.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalScan {
    pub scripts: Vec<String>,
    pub inline_scripts: Vec<String>,
    pub search_console_meta: Option<String>,
    pub html: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct LoadState {
    pub ready_state: ReadyState,
    pub resource_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ReadyState {
    #[default]
    Loading,
    Interactive,
    Complete,
}
