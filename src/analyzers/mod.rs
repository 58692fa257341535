//! Leaf analyzers run by each page task.
//!
//! `seo` and `analytics` are pure; `links`, `search_console` and
//! `accessibility` perform I/O and degrade to empty output on failure.

pub mod accessibility;
pub mod analytics;
pub mod dns_cache;
pub mod links;
pub mod search_console;
pub mod seo;

pub use accessibility::{load_engine_script, run_accessibility_audit};
pub use analytics::{detect_comprehensive, detect_page};
pub use dns_cache::{DnsTxtCache, HickoryTxtResolver, TxtLookupFuture, TxtResolver};
pub use links::{LinkCheckReport, LinkChecker, http_client};
pub use search_console::{detect_search_console, find_verification_record};
pub use seo::analyze_seo;
