//! Naming context discovery from the root DSE.

use nullbind_common::error::ProtocolError;
use tracing::{info, warn};

use crate::directory::{Directory, NAMING_CONTEXTS_ATTR, SearchRequest};
use crate::network::session::Session;

/// Reads the root DSE and returns its published naming contexts in server order.
///
/// An empty list is a valid answer. Errors are returned for the caller to record;
/// they never end the scan.
pub async fn resolve<D: Directory>(session: &mut Session<D>) -> Result<Vec<String>, ProtocolError> {
    let host = session.target().host.clone();
    let port = session.target().port;

    let page = session.search(&SearchRequest::root_dse()).await.map_err(|e| {
        warn!(host = %host, port, "Root DSE lookup failed: {e}");
        e
    })?;

    let contexts: Vec<String> = page
        .entries
        .iter()
        .flat_map(|entry| entry.values(NAMING_CONTEXTS_ATTR))
        .map(|value| String::from_utf8_lossy(value).trim().to_string())
        .filter(|context| !context.is_empty())
        .collect();

    if contexts.is_empty() {
        warn!(host = %host, port, "Root DSE published no naming contexts");
    } else {
        info!(host = %host, port, count = contexts.len(), "Found naming contexts: {}", contexts.join(", "));
    }

    Ok(contexts)
}
