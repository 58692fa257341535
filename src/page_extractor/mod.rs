//! Page data extraction functions.
//!
//! In-page JavaScript, navigation waits, bounded auto-scroll and responsive
//! screenshots for audited pages.

// Sub-modules
pub mod extractors;
pub mod js_scripts;
pub mod page_data;

// Re-exports for public API
pub use extractors::{
    NavigationOutcome, Viewport, auto_scroll, capture_responsive_screenshots, evaluate_json,
    extract_global_scan, extract_page_data, navigate,
};
pub use page_data::{GlobalScan, PageData};
