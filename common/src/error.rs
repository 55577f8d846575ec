//! Failure taxonomy shared by the scan pipeline and its consumers.
//!
//! [`ProtocolError`] classifies what a single LDAP operation returned.
//! [`ScanError`] is the per-target verdict built from those classifications.
//! Neither is ever raised past the target boundary; both end up inside a
//! [`ScanResult`](crate::models::result::ScanResult).

use thiserror::Error;

pub const RC_OPERATIONS_ERROR: u32 = 1;
pub const RC_PROTOCOL_ERROR: u32 = 2;
pub const RC_SIZE_LIMIT_EXCEEDED: u32 = 4;
pub const RC_NO_SUCH_OBJECT: u32 = 32;
pub const RC_INSUFFICIENT_ACCESS: u32 = 50;
pub const RC_BUSY: u32 = 51;
pub const RC_UNAVAILABLE: u32 = 52;
pub const RC_OTHER: u32 = 80;

/// Classified outcome of a failed LDAP operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("no such object")]
    NoSuchObject,

    #[error("insufficient access rights")]
    InsufficientAccess,

    #[error("operations error")]
    OperationsError,

    #[error("operation timed out")]
    Timeout,

    /// The server stopped at its own size limit. Entries sent before it are valid.
    #[error("size limit exceeded")]
    SizeLimitExceeded,

    #[error("server down: {0}")]
    ServerDown(String),

    #[error("result code {rc}: {text}")]
    Result { rc: u32, text: String },
}

impl ProtocolError {
    /// Maps a non-zero LDAP result code onto the taxonomy.
    pub fn from_result_code(rc: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        match rc {
            RC_NO_SUCH_OBJECT => ProtocolError::NoSuchObject,
            RC_INSUFFICIENT_ACCESS => ProtocolError::InsufficientAccess,
            RC_OPERATIONS_ERROR => ProtocolError::OperationsError,
            RC_SIZE_LIMIT_EXCEEDED => ProtocolError::SizeLimitExceeded,
            RC_BUSY | RC_UNAVAILABLE | RC_OTHER => {
                ProtocolError::ServerDown(format!("result code {rc}: {text}"))
            }
            _ => ProtocolError::Result { rc, text },
        }
    }

    /// A response the client could not decode.
    pub fn malformed(what: &str) -> Self {
        ProtocolError::Result {
            rc: RC_PROTOCOL_ERROR,
            text: format!("malformed {what}"),
        }
    }

    /// Whether this failure on the post-bind probe search denies access.
    pub fn denies_access(&self) -> bool {
        matches!(
            self,
            ProtocolError::InsufficientAccess
                | ProtocolError::OperationsError
                | ProtocolError::Timeout
                | ProtocolError::ServerDown(_)
        )
    }
}

/// Per-target conditions recorded in a scan result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Transport unreachable or refused. Fatal for the target.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Anonymous bind rejected, or the follow-up search failed. Fatal for the target.
    #[error("anonymous bind denied: {0}")]
    BindDenied(ProtocolError),

    /// Root DSE lookup failed; the scan continues with zero naming contexts.
    #[error("naming context resolution degraded: {0}")]
    ContextResolutionDegraded(ProtocolError),

    /// Paging stopped early for one naming context; its partial records are kept.
    #[error("paged search aborted for {naming_context}: {source}")]
    PageFetchAborted {
        naming_context: String,
        source: ProtocolError,
    },

    /// The scan of this target stopped unexpectedly before it could report.
    #[error("scan task failed: {0}")]
    TaskFailed(String),
}

/// Errors produced while parsing a `host[:port]` target string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("target is empty")]
    Empty,

    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("malformed target '{0}'")]
    Malformed(String),
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}
