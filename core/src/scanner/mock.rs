use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nullbind_common::error::{ProtocolError, ScanError};
use nullbind_common::network::target::Target;

use crate::directory::{
    Connector, Directory, DirectoryEntry, PagingControl, SearchPage, SearchRequest,
};

/// Replays canned responses in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedDirectory {
    pub bind: Option<ProtocolError>,
    pub responses: VecDeque<Result<SearchPage, ProtocolError>>,
    pub requests: Vec<SearchRequest>,
    /// Shared so it can still be read after the session consumed the directory.
    pub closed: Arc<AtomicBool>,
}

impl ScriptedDirectory {
    pub fn respond(mut self, response: Result<SearchPage, ProtocolError>) -> Self {
        self.responses.push_back(response);
        self
    }

    pub fn deny_bind(mut self, reason: ProtocolError) -> Self {
        self.bind = Some(reason);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub(crate) fn page(entries: Vec<DirectoryEntry>, paging: PagingControl) -> SearchPage {
    SearchPage::new(entries, paging)
}

#[async_trait]
impl Directory for ScriptedDirectory {
    async fn anonymous_bind(&mut self) -> Result<(), ProtocolError> {
        match &self.bind {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    async fn search(&mut self, request: &SearchRequest) -> Result<SearchPage, ProtocolError> {
        self.requests.push(request.clone());
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(ProtocolError::ServerDown("script exhausted".to_string())))
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Hands out one prepared directory, or panics while connecting when it has none.
#[derive(Default)]
pub(crate) struct ScriptedConnector {
    directory: Mutex<Option<ScriptedDirectory>>,
}

impl ScriptedConnector {
    pub fn serving(directory: ScriptedDirectory) -> Self {
        Self {
            directory: Mutex::new(Some(directory)),
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Directory = ScriptedDirectory;

    async fn connect(&self, target: &Target, _timeout: Duration) -> Result<ScriptedDirectory, ScanError> {
        let prepared = self.directory.lock().unwrap().take();
        match prepared {
            Some(directory) => Ok(directory),
            None => panic!("no directory scripted for {target}"),
        }
    }
}
