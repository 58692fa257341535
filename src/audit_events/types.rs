//! Event type definitions for the audit stream
//!
//! Events are modelled as a tagged union and turned into the line-based
//! wire format in exactly one place, [`AuditEvent::to_wire_line`].

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::audit_engine::audit_types::{AnalysisResult, GlobalResult};

/// Events emitted while a batch runs
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// Human-readable progress line. Consumers must not branch on its text.
    Log {
        message: String,
        timestamp: DateTime<Local>,
    },
    /// Terminal result for one URL
    Result {
        url: String,
        result: Box<AnalysisResult>,
    },
    /// Site-wide analytics configuration, at most once per batch
    GlobalResult(GlobalResult),
    /// Batch-fatal error; nothing follows it
    Error(String),
    /// Successful end of the batch. Has no wire representation.
    Done,
}

#[derive(Serialize)]
struct ResultEnvelope<'a> {
    url: &'a str,
    result: &'a AnalysisResult,
}

impl AuditEvent {
    #[must_use]
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
            timestamp: Local::now(),
        }
    }

    #[must_use]
    pub fn result(result: AnalysisResult) -> Self {
        Self::Result {
            url: result.url.clone(),
            result: Box::new(result),
        }
    }

    #[must_use]
    pub fn global_result(global: GlobalResult) -> Self {
        Self::GlobalResult(global)
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    /// Wire tag of this event, `None` for [`AuditEvent::Done`].
    #[must_use]
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Self::Log { .. } => Some("LOG"),
            Self::Result { .. } => Some("RESULT"),
            Self::GlobalResult(_) => Some("GLOBAL_RESULT"),
            Self::Error(_) => Some("ERROR"),
            Self::Done => None,
        }
    }

    /// Encode as one newline-terminated wire line.
    ///
    /// `LOG:<HH:MM:SS> <message>`, `RESULT:<json>`, `GLOBAL_RESULT:<json>`,
    /// `ERROR:<message>`. Embedded newlines in messages are flattened so a
    /// line always carries exactly one event.
    pub fn to_wire_line(&self) -> Result<Option<String>, serde_json::Error> {
        let line = match self {
            Self::Log { message, timestamp } => format!(
                "LOG:{} {}\n",
                timestamp.format("%H:%M:%S"),
                single_line(message)
            ),
            Self::Result { url, result } => format!(
                "RESULT:{}\n",
                serde_json::to_string(&ResultEnvelope { url, result })?
            ),
            Self::GlobalResult(global) => {
                format!("GLOBAL_RESULT:{}\n", serde_json::to_string(global)?)
            }
            Self::Error(message) => format!("ERROR:{}\n", single_line(message)),
            Self::Done => return Ok(None),
        };
        Ok(Some(line))
    }
}

fn single_line(message: &str) -> String {
    message.replace(['\r', '\n'], " ")
}
