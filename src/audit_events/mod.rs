//! Audit event stream
//!
//! A batch writes tagged events through an [`EventSink`]; the caller reads
//! them from an [`AuditStream`] and, at the HTTP boundary, turns them into
//! newline-delimited `LOG:`/`RESULT:`/`GLOBAL_RESULT:`/`ERROR:` lines.

pub mod sink;
pub mod stream;
pub mod types;

pub use sink::EventSink;
pub use stream::AuditStream;
pub use types::AuditEvent;
