//! RFC 2696 paged subtree search over one naming context.
//!
//! The driver keeps requesting pages while the server hands back a non-empty
//! cookie. A response without the paging control means the server ignored it;
//! that single page is kept and the loop stops. A failed fetch stops paging for
//! this naming context only, keeping whatever was collected before it.
//!
//! Entries that arrive with a non-success result are always kept. A size limit
//! leaves the paging decision to the control; anything else ends the context.

use nullbind_common::error::ProtocolError;
use nullbind_common::models::credential::CredentialRecord;
use nullbind_common::models::result::{ContextReport, PagingOutcome};
use tracing::{debug, error, info, warn};

use crate::directory::{Directory, DirectoryEntry, PagingControl, SearchRequest};
use crate::network::session::Session;

pub const PASSWORD_ATTR: &str = "userPassword";
pub const COMMON_NAME_ATTR: &str = "cn";
pub const SURNAME_ATTR: &str = "sn";

/// Position of the paging loop within one naming context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageCursor {
    pub naming_context: String,
    pub cookie: Vec<u8>,
    pub page_number: u32,
}

impl PageCursor {
    pub fn new(naming_context: &str) -> Self {
        Self {
            naming_context: naming_context.to_string(),
            cookie: Vec::new(),
            page_number: 0,
        }
    }
}

/// Records and paging summary for one naming context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextHarvest {
    pub records: Vec<CredentialRecord>,
    pub report: ContextReport,
}

pub async fn search<D: Directory>(
    session: &mut Session<D>,
    naming_context: &str,
    page_size: i32,
) -> ContextHarvest {
    let host = session.target().host.clone();
    let port = session.target().port;

    let mut cursor = PageCursor::new(naming_context);
    let mut records: Vec<CredentialRecord> = Vec::new();

    info!(host = %host, port, naming_context, "Looking for passwords");

    let outcome = loop {
        let request = SearchRequest::paged_subtree(
            &cursor.naming_context,
            page_size,
            std::mem::take(&mut cursor.cookie),
        );
        cursor.page_number += 1;

        let page = match session.search(&request).await {
            Ok(page) => page,
            Err(e) => {
                error!(
                    host = %host, port, naming_context, page = cursor.page_number,
                    "Page fetch failed, keeping {} records: {e}", records.len()
                );
                break PagingOutcome::Aborted(e);
            }
        };

        let before = records.len();
        records.extend(page.entries.iter().filter_map(extract_record));
        debug!(
            host = %host, port, naming_context, page = cursor.page_number,
            entries = page.entries.len(), records = records.len() - before,
            "Received page"
        );

        match page.incomplete {
            None => {}
            Some(ProtocolError::SizeLimitExceeded) => {
                warn!(
                    host = %host, port, naming_context, page = cursor.page_number,
                    "Server size limit reached, results may be partial"
                );
            }
            Some(reason) => {
                error!(
                    host = %host, port, naming_context, page = cursor.page_number,
                    "Page cut short, keeping {} records: {reason}", records.len()
                );
                break PagingOutcome::Aborted(reason);
            }
        }

        match page.paging {
            PagingControl::Absent => {
                warn!(
                    host = %host, port, naming_context,
                    "Server ignored the paged results control, results may be partial"
                );
                break PagingOutcome::NonCompliant;
            }
            PagingControl::Present(cookie) if cookie.is_empty() => break PagingOutcome::Complete,
            PagingControl::Present(cookie) => cursor.cookie = cookie,
        }
    };

    info!(
        host = %host, port, naming_context, pages = cursor.page_number,
        "Found {} password entries", records.len()
    );

    ContextHarvest {
        report: ContextReport {
            naming_context: cursor.naming_context,
            pages_requested: cursor.page_number,
            records_found: records.len(),
            outcome,
        },
        records,
    }
}

/// Builds a record from an entry carrying a password; other entries yield `None`.
pub fn extract_record(entry: &DirectoryEntry) -> Option<CredentialRecord> {
    let password = entry.first_value(PASSWORD_ATTR)?;

    Some(CredentialRecord::new(
        entry.dn.clone(),
        password.to_vec(),
        entry.first_string(COMMON_NAME_ATTR),
        entry.first_string(SURNAME_ATTR),
    ))
}
