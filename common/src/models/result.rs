//! # Scan Result Model
//!
//! What a finished scan of one target hands to the output layer.

use crate::error::{ProtocolError, ScanError};
use crate::models::credential::CredentialRecord;
use crate::network::target::Target;

/// Verdict of the anonymous bind gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindOutcome {
    Allowed,
    Denied(ProtocolError),
}

/// How the paging loop for one naming context ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PagingOutcome {
    /// The server returned an empty cookie after the last page.
    Complete,
    /// The server ignored the paging control; only the first page was read.
    NonCompliant,
    /// A page fetch failed; records gathered before it are kept.
    Aborted(ProtocolError),
}

/// Paging summary for one naming context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextReport {
    pub naming_context: String,
    pub pages_requested: u32,
    pub records_found: usize,
    pub outcome: PagingOutcome,
}

impl ContextReport {
    /// The search finished, or failed only after yielding records.
    pub fn was_searched(&self) -> bool {
        !matches!(self.outcome, PagingOutcome::Aborted(_)) || self.records_found > 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanResult {
    pub target: Target,
    pub bind_succeeded: bool,
    pub naming_contexts: Vec<String>,
    pub records: Vec<CredentialRecord>,
    pub contexts: Vec<ContextReport>,
    /// Condition that ended or degraded the scan.
    pub error: Option<ScanError>,
    /// Non-fatal conditions, in the order they were met.
    pub warnings: Vec<ScanError>,
}

impl ScanResult {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            bind_succeeded: false,
            naming_contexts: Vec::new(),
            records: Vec::new(),
            contexts: Vec::new(),
            error: None,
            warnings: Vec::new(),
        }
    }

    /// A result for a target that never got past the connect or bind gates.
    pub fn failed(target: Target, error: ScanError) -> Self {
        Self {
            error: Some(error),
            ..Self::new(target)
        }
    }

    /// Bind allowed, naming contexts found, and at least one of them was searched.
    ///
    /// A context that aborted before returning a single record does not count.
    pub fn is_enumerated(&self) -> bool {
        self.bind_succeeded
            && !self.naming_contexts.is_empty()
            && self.contexts.iter().any(ContextReport::was_searched)
    }

    pub fn aborted_contexts(&self) -> impl Iterator<Item = &ContextReport> {
        self.contexts
            .iter()
            .filter(|report| matches!(report.outcome, PagingOutcome::Aborted(_)))
    }
}
