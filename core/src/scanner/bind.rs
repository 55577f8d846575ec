//! Anonymous bind gate.
//!
//! Some servers accept a null bind and only enforce access control once a query is
//! made, so an accepted bind is followed by a throwaway subtree search. Both have to
//! succeed before the target counts as open.

use nullbind_common::error::ProtocolError;
use nullbind_common::models::result::BindOutcome;
use tracing::{debug, error, info};

use crate::directory::{Directory, SearchRequest};
use crate::network::session::Session;

pub async fn probe<D: Directory>(session: &mut Session<D>) -> BindOutcome {
    let host = session.target().host.clone();
    let port = session.target().port;

    if let Err(reason) = session.anonymous_bind().await {
        error!(host = %host, port, "Anonymous bind rejected: {reason}");
        return BindOutcome::Denied(reason);
    }

    info!(host = %host, port, "Null bind is allowed, searching to catch access errors");

    match session.search(&SearchRequest::access_probe()).await {
        Ok(_) => {}
        Err(ProtocolError::NoSuchObject) => {
            debug!(host = %host, port, "Probe search found no objects");
        }
        Err(ProtocolError::SizeLimitExceeded) => {
            debug!(host = %host, port, "Probe search hit the size limit");
        }
        Err(reason) if reason.denies_access() => {
            session.mark_failed();
            error!(host = %host, port, "Probe search after null bind failed: {reason}");
            return BindOutcome::Denied(reason);
        }
        Err(reason) => {
            debug!(host = %host, port, "Probe search returned {reason}, treating as allowed");
        }
    }

    info!(host = %host, port, "Null bind allowed");
    BindOutcome::Allowed
}
