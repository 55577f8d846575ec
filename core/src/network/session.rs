//! Connection lifecycle for a single target.
//!
//! A [`Session`] owns the transport for exactly one scan. It is created by [`open`]
//! and must be released with [`Session::close`] on every exit path; dropping it
//! without closing still stops the underlying connection.

use std::time::Duration;

use nullbind_common::error::{ProtocolError, ScanError};
use nullbind_common::network::target::Target;
use tracing::{debug, info};

use crate::directory::{Connector, Directory, SearchPage, SearchRequest};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindState {
    Unbound,
    AnonymouslyBound,
    Failed,
}

pub struct Session<D: Directory> {
    target: Target,
    state: BindState,
    directory: D,
}

/// Connects to `target`, bounding both the connect and every later operation by `timeout`.
pub async fn open<C: Connector>(
    connector: &C,
    target: &Target,
    timeout: Duration,
) -> Result<Session<C::Directory>, ScanError> {
    let directory = connector.connect(target, timeout).await?;
    info!(host = %target.host, port = target.port, "Connected");
    Ok(Session::new(target.clone(), directory))
}

impl<D: Directory> Session<D> {
    pub fn new(target: Target, directory: D) -> Self {
        Self {
            target,
            state: BindState::Unbound,
            directory,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn state(&self) -> BindState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn directory(&self) -> &D {
        &self.directory
    }

    pub(crate) fn mark_failed(&mut self) {
        self.state = BindState::Failed;
    }

    pub async fn anonymous_bind(&mut self) -> Result<(), ProtocolError> {
        match self.directory.anonymous_bind().await {
            Ok(()) => {
                self.state = BindState::AnonymouslyBound;
                Ok(())
            }
            Err(e) => {
                self.state = BindState::Failed;
                Err(e)
            }
        }
    }

    pub async fn search(&mut self, request: &SearchRequest) -> Result<SearchPage, ProtocolError> {
        self.directory.search(request).await
    }

    pub async fn close(mut self) {
        self.directory.close().await;
        debug!(host = %self.target.host, port = self.target.port, "Session closed");
    }
}
