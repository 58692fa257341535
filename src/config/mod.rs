//! Configuration module for batch audits
//!
//! This module provides the `AuditConfig` struct, its builder and an
//! environment overlay. Engine selection and context sharing are explicit
//! enum-valued fields so each orchestrator can be configured independently.

// Sub-modules
pub mod builder;
pub mod env;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::AuditConfigBuilder;
pub use types::{AccessibilityEngineSource, AuditConfig, BrowserEngine, ContextStrategy};
