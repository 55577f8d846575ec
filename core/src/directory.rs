//! The **seam** between the scan pipeline and the LDAP wire.
//!
//! Every stage of the pipeline talks to a server through [`Directory`], and every
//! connection is produced by a [`Connector`]. The production implementation lives in
//! [`crate::network::ldap`]; tests drive the same stages with scripted directories.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use nullbind_common::error::{ProtocolError, ScanError};
use nullbind_common::network::target::Target;

pub const MATCH_ALL_FILTER: &str = "(objectClass=*)";
/// RFC 4511 "no attributes" selector.
pub const NO_ATTRIBUTES: &str = "1.1";
pub const ALL_USER_ATTRIBUTES: &str = "*";
pub const ALL_OPERATIONAL_ATTRIBUTES: &str = "+";
pub const NAMING_CONTEXTS_ATTR: &str = "namingContexts";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchScope {
    Base,
    Subtree,
}

/// RFC 2696 request control values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub size: i32,
    pub cookie: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchRequest {
    pub base: String,
    pub scope: SearchScope,
    pub filter: String,
    pub attributes: Vec<String>,
    pub size_limit: Option<i32>,
    pub paging: Option<PageRequest>,
}

impl SearchRequest {
    /// Cheapest possible subtree search from the root, used to surface access errors.
    pub fn access_probe() -> Self {
        Self {
            base: String::new(),
            scope: SearchScope::Subtree,
            filter: MATCH_ALL_FILTER.to_string(),
            attributes: vec![NO_ATTRIBUTES.to_string()],
            size_limit: Some(1),
            paging: None,
        }
    }

    /// Base-scope read of the root DSE.
    pub fn root_dse() -> Self {
        Self {
            base: String::new(),
            scope: SearchScope::Base,
            filter: MATCH_ALL_FILTER.to_string(),
            attributes: vec![
                ALL_OPERATIONAL_ATTRIBUTES.to_string(),
                NAMING_CONTEXTS_ATTR.to_string(),
            ],
            size_limit: None,
            paging: None,
        }
    }

    /// One page of a subtree search returning all user attributes.
    pub fn paged_subtree(base: &str, size: i32, cookie: Vec<u8>) -> Self {
        Self {
            base: base.to_string(),
            scope: SearchScope::Subtree,
            filter: MATCH_ALL_FILTER.to_string(),
            attributes: vec![ALL_USER_ATTRIBUTES.to_string()],
            size_limit: None,
            paging: Some(PageRequest { size, cookie }),
        }
    }
}

/// A returned entry. Values are kept as raw bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attributes: HashMap<String, Vec<Vec<u8>>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<Vec<u8>>) -> Self {
        self.attributes
            .entry(name.to_string())
            .or_default()
            .push(value.into());
        self
    }

    /// Attribute names are case-insensitive on the wire.
    pub fn values(&self, name: &str) -> &[Vec<u8>] {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    pub fn first_value(&self, name: &str) -> Option<&[u8]> {
        self.values(name).first().map(Vec::as_slice)
    }

    pub fn first_string(&self, name: &str) -> Option<String> {
        self.first_value(name)
            .map(|value| String::from_utf8_lossy(value).into_owned())
    }
}

/// State of the paged results control in a search response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PagingControl {
    /// The server sent no paged results control back.
    Absent,
    /// Cookie for the next page. Empty once the last page was delivered.
    Present(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchPage {
    pub entries: Vec<DirectoryEntry>,
    pub paging: PagingControl,
    /// Set when the server ended the search with a non-success result after
    /// sending entries, or when its response could not be fully decoded.
    pub incomplete: Option<ProtocolError>,
}

impl SearchPage {
    pub fn new(entries: Vec<DirectoryEntry>, paging: PagingControl) -> Self {
        Self {
            entries,
            paging,
            incomplete: None,
        }
    }

    pub fn partial(entries: Vec<DirectoryEntry>, paging: PagingControl, reason: ProtocolError) -> Self {
        Self {
            entries,
            paging,
            incomplete: Some(reason),
        }
    }
}

/// Operations the pipeline performs against one connected server.
#[async_trait]
pub trait Directory: Send {
    /// Simple bind with an empty name and an empty password.
    async fn anonymous_bind(&mut self) -> Result<(), ProtocolError>;

    /// Runs one search request and returns a single response page.
    async fn search(&mut self, request: &SearchRequest) -> Result<SearchPage, ProtocolError>;

    /// Releases the transport. Must be safe to call after any failure.
    async fn close(&mut self);
}

/// Opens connections to targets.
#[async_trait]
pub trait Connector: Send + Sync {
    type Directory: Directory + 'static;

    async fn connect(
        &self,
        target: &Target,
        timeout: Duration,
    ) -> Result<Self::Directory, ScanError>;
}
