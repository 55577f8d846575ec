//! Scan **orchestration**: runs the bind-and-enumerate pipeline for each target.
//!
//! The pipeline for one target is:
//! connect → [`bind::probe`] (gate) → [`naming::resolve`] → [`paged::search`] per naming context.
//!
//! Connect and bind failures end the pipeline for that target. Naming context and
//! page failures are recorded and the scan carries on with what it has. Nothing a
//! single target does can stop the others.

use std::sync::Arc;

use nullbind_common::config::Config;
use nullbind_common::error::ScanError;
use nullbind_common::models::result::{BindOutcome, PagingOutcome, ScanResult};
use nullbind_common::network::target::Target;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

use crate::aggregator::ResultAggregator;
use crate::directory::{Connector, Directory};
use crate::network::session::{self, Session};

pub mod bind;
#[cfg(test)]
pub(crate) mod mock;
pub mod naming;
pub mod paged;

pub type ProgressCallback = Arc<dyn Fn(&ScanResult) + Send + Sync>;

/// Scans every target, at most `cfg.concurrency` at a time.
///
/// Results come back in the order the targets were given.
pub async fn perform_scan<C>(
    connector: Arc<C>,
    targets: Vec<Target>,
    cfg: &Config,
    on_target_done: Option<ProgressCallback>,
) -> ResultAggregator
where
    C: Connector + 'static,
{
    let semaphore = Arc::new(Semaphore::new(cfg.concurrency.max(1)));
    let cfg = Arc::new(cfg.clone());
    let mut handles: Vec<(Target, JoinHandle<ScanResult>)> = Vec::with_capacity(targets.len());

    for target in targets {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let connector = connector.clone();
        let cfg = cfg.clone();
        let callback = on_target_done.clone();
        let task_target = target.clone();

        let handle = tokio::spawn(async move {
            let result = scan_target(connector.as_ref(), task_target, &cfg).await;
            drop(permit);
            if let Some(cb) = callback {
                cb(&result);
            }
            result
        });
        handles.push((target, handle));
    }

    let mut aggregator = ResultAggregator::new();
    for (target, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                error!(host = %target.host, port = target.port, "Scan task failed: {e}");
                let failed = ScanResult::failed(target, ScanError::TaskFailed(e.to_string()));
                if let Some(cb) = &on_target_done {
                    cb(&failed);
                }
                failed
            }
        };
        aggregator.record(result);
    }
    aggregator
}

/// Runs the full pipeline against one target. Always yields a result.
pub async fn scan_target<C: Connector>(connector: &C, target: Target, cfg: &Config) -> ScanResult {
    let span = info_span!("target", host = %target.host, port = target.port);

    async move {
        info!(host = %target.host, port = target.port, "Testing host");

        let mut session = match session::open(connector, &target, cfg.timeout).await {
            Ok(session) => session,
            Err(e) => {
                error!(host = %target.host, port = target.port, "{e}");
                return ScanResult::failed(target, e);
            }
        };

        let result = enumerate(&mut session, cfg).await;
        session.close().await;
        result
    }
    .instrument(span)
    .await
}

/// Bind gate, naming contexts, then one paged search per context.
pub async fn enumerate<D: Directory>(session: &mut Session<D>, cfg: &Config) -> ScanResult {
    let mut result = ScanResult::new(session.target().clone());

    if let BindOutcome::Denied(reason) = bind::probe(session).await {
        result.error = Some(ScanError::BindDenied(reason));
        return result;
    }
    result.bind_succeeded = true;

    match naming::resolve(session).await {
        Ok(contexts) => result.naming_contexts = contexts,
        Err(e) => {
            result.error = Some(ScanError::ContextResolutionDegraded(e));
            return result;
        }
    }

    let contexts = result.naming_contexts.clone();
    for naming_context in &contexts {
        let harvest = paged::search(session, naming_context, cfg.page_size).await;

        if let PagingOutcome::Aborted(source) = &harvest.report.outcome {
            result.warnings.push(ScanError::PageFetchAborted {
                naming_context: naming_context.clone(),
                source: source.clone(),
            });
        }
        result.records.extend(harvest.records);
        result.contexts.push(harvest.report);
    }

    if result.is_enumerated() {
        info!(
            host = %result.target.host, port = result.target.port,
            "Enumeration finished with {} credential records", result.records.len()
        );
    }
    result
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
