//! Shared configuration constants for siteaudit
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Default number of pages analysed at once when a request does not say.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Upper clamp applied to `settings.concurrency`.
///
/// Every in-flight page holds a renderer process open, so this bounds the
/// memory a single batch can claim regardless of what the client asks for.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Per-URL analysis budget in milliseconds.
pub const DEFAULT_PAGE_TIMEOUT_MS: u64 = 30_000;

/// Links probed per page.
pub const DEFAULT_LINK_CHECK_LIMIT: usize = 20;

/// Hard ceiling for `link_check_limit`.
pub const MAX_LINK_CHECK_LIMIT: usize = 50;

/// Per-link HEAD/GET timeout in milliseconds.
pub const DEFAULT_LINK_CHECK_TIMEOUT_MS: u64 = 5_000;

/// Screenshot quality: 80% JPEG compression
///
/// Screenshots travel inline as base64 data URIs inside RESULT lines, so
/// size matters more here than it would on disk:
/// - 90: roughly 2x the payload for little visible gain
/// - 70: acceptable for thumbnails
/// - 80: sweet spot for a dashboard preview
pub const SCREENSHOT_QUALITY: u8 = 80;

/// Budget for opening a page inside a browsing context.
pub const DEFAULT_PAGE_OPEN_TIMEOUT_MS: u64 = 10_000;

/// Budget for the one-off global analytics load.
pub const DEFAULT_GLOBAL_PHASE_TIMEOUT_MS: u64 = 15_000;

/// Time the global phase gets to close its page after being told to stop.
pub const GLOBAL_PHASE_UNWIND_GRACE_MS: u64 = 5_000;

/// Auto-scroll step in CSS pixels.
pub const DEFAULT_SCROLL_DISTANCE_PX: u32 = 200;

/// Delay between auto-scroll steps.
pub const DEFAULT_SCROLL_INTERVAL_MS: u64 = 100;

/// Auto-scroll stops after this many steps even if the page keeps growing.
pub const DEFAULT_MAX_SCROLL_ITERATIONS: u32 = 50;

/// Wait after auto-scroll so lazy content can render.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 1_500;

/// DNS TXT lookup timeout.
pub const DEFAULT_DNS_TIMEOUT_SECS: u64 = 5;

/// Per-request timeout for sitemap fetches.
pub const SITEMAP_FETCH_TIMEOUT_SECS: u64 = 10;

/// Nesting limit when expanding sitemap indexes.
pub const SITEMAP_MAX_DEPTH: usize = 3;

/// Pinned axe-core build fetched when no local copy is configured.
pub const AXE_CORE_CDN_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/axe-core/4.10.2/axe.min.js";

/// Substring that marks a Search Console ownership record in DNS TXT values.
pub const SEARCH_CONSOLE_TXT_MARKER: &str = "google-site-verification";

/// Body HTML shorter than this after navigation is reported as a likely block.
pub const EMPTY_PAGE_HTML_THRESHOLD: usize = 500;

/// Chrome user agent string
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
///
/// Chrome releases new stable versions ~every 4 weeks.
/// Update quarterly to stay within reasonable version window.
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
