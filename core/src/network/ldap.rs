use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use ldap3::asn1::{TagClass, Types, parse_tag};
use ldap3::controls::{Control, ControlType, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry, SearchOptions, SearchResult};
use nullbind_common::error::{ProtocolError, ScanError};
use nullbind_common::network::target::Target;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

use crate::directory::{
    Connector, Directory, DirectoryEntry, PagingControl, SearchPage, SearchRequest, SearchScope,
};

const PAGED_RESULTS_OID: &str = "1.2.840.113556.1.4.319";

/// Opens plain `ldap://` connections with the `ldap3` client.
#[derive(Clone, Copy, Debug, Default)]
pub struct LdapConnector;

#[async_trait]
impl Connector for LdapConnector {
    type Directory = LdapDirectory;

    async fn connect(&self, target: &Target, limit: Duration) -> Result<LdapDirectory, ScanError> {
        let url = target.url();
        debug!(url = %url, "Connecting to LDAP server");

        let settings = LdapConnSettings::new().set_conn_timeout(limit);

        // Name resolution is not covered by the connect timeout, so the whole
        // phase gets the same bound.
        let (conn, ldap) = match timeout(limit, LdapConnAsync::with_settings(settings, &url)).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(ScanError::Connect(e.to_string())),
            Err(_elapsed) => {
                return Err(ScanError::Connect(format!(
                    "connect timed out after {}s",
                    limit.as_secs_f64()
                )));
            }
        };

        let driver = tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                debug!(error = %e, "LDAP connection driver stopped");
            }
        });

        Ok(LdapDirectory {
            ldap,
            op_timeout: limit,
            driver,
        })
    }
}

/// A live connection to one directory server.
pub struct LdapDirectory {
    ldap: Ldap,
    op_timeout: Duration,
    driver: JoinHandle<()>,
}

#[async_trait]
impl Directory for LdapDirectory {
    async fn anonymous_bind(&mut self) -> Result<(), ProtocolError> {
        let result = self
            .ldap
            .with_timeout(self.op_timeout)
            .simple_bind("", "")
            .await
            .map_err(classify)?;

        match result.rc {
            0 => Ok(()),
            rc => Err(ProtocolError::from_result_code(rc, result.text)),
        }
    }

    async fn search(&mut self, request: &SearchRequest) -> Result<SearchPage, ProtocolError> {
        let scope = match request.scope {
            SearchScope::Base => Scope::Base,
            SearchScope::Subtree => Scope::Subtree,
        };

        self.ldap.with_timeout(self.op_timeout);
        if let Some(limit) = request.size_limit {
            self.ldap
                .with_search_options(SearchOptions::new().sizelimit(limit));
        }
        if let Some(paging) = &request.paging {
            self.ldap.with_controls(PagedResults {
                size: paging.size,
                cookie: paging.cookie.clone(),
            });
        }

        let SearchResult(entries, result) = self
            .ldap
            .search(
                &request.base,
                scope,
                &request.filter,
                request.attributes.clone(),
            )
            .await
            .map_err(classify)?;

        let status = match result.rc {
            0 => None,
            rc => Some(ProtocolError::from_result_code(rc, result.text)),
        };
        let entries: Vec<DirectoryEntry> = entries
            .into_iter()
            .map(|entry| to_directory_entry(SearchEntry::construct(entry)))
            .collect();

        // Entries sent before a non-success result are kept. Without entries only a
        // size limit still counts as an answer.
        match (status, paging_control(&result.ctrls)) {
            (Some(reason), _) if entries.is_empty() && reason != ProtocolError::SizeLimitExceeded => {
                Err(reason)
            }
            (_, Err(malformed)) => Ok(SearchPage::partial(entries, PagingControl::Absent, malformed)),
            (Some(reason), Ok(paging)) => Ok(SearchPage::partial(entries, paging, reason)),
            (None, Ok(paging)) => Ok(SearchPage::new(entries, paging)),
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.ldap.with_timeout(self.op_timeout).unbind().await {
            debug!(error = %e, "Unbind failed");
        }
        self.driver.abort();
    }
}

impl Drop for LdapDirectory {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

fn classify(err: LdapError) -> ProtocolError {
    match err {
        LdapError::Timeout { .. } => ProtocolError::Timeout,
        LdapError::LdapResult { result } => ProtocolError::from_result_code(result.rc, result.text),
        other => ProtocolError::ServerDown(other.to_string()),
    }
}

fn to_directory_entry(entry: SearchEntry) -> DirectoryEntry {
    let mut attributes: HashMap<String, Vec<Vec<u8>>> = HashMap::new();

    for (name, values) in entry.attrs {
        attributes
            .entry(name)
            .or_default()
            .extend(values.into_iter().map(String::into_bytes));
    }
    for (name, values) in entry.bin_attrs {
        attributes.entry(name).or_default().extend(values);
    }

    DirectoryEntry {
        dn: entry.dn,
        attributes,
    }
}

fn paging_control(ctrls: &[Control]) -> Result<PagingControl, ProtocolError> {
    for Control(kind, raw) in ctrls {
        let is_paged = matches!(kind, Some(ControlType::PagedResults)) || raw.ctype == PAGED_RESULTS_OID;
        if !is_paged {
            continue;
        }
        // A paged control without a value cannot continue; treat it as the last page.
        let Some(value) = &raw.val else {
            return Ok(PagingControl::Present(Vec::new()));
        };
        return decode_cookie(value)
            .map(PagingControl::Present)
            .ok_or_else(|| ProtocolError::malformed("paged results control"));
    }
    Ok(PagingControl::Absent)
}

/// Reads the cookie out of `SEQUENCE { size INTEGER, cookie OCTET STRING }`.
fn decode_cookie(value: &[u8]) -> Option<Vec<u8>> {
    let (_, tag) = parse_tag(value).ok()?;
    let mut parts = tag
        .match_class(TagClass::Universal)?
        .match_id(Types::Sequence as u64)?
        .expect_constructed()?
        .into_iter();

    parts
        .next()?
        .match_class(TagClass::Universal)?
        .match_id(Types::Integer as u64)?
        .expect_primitive()?;
    parts
        .next()?
        .match_class(TagClass::Universal)?
        .match_id(Types::OctetString as u64)?
        .expect_primitive()
}
