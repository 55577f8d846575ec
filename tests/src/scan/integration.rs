use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use nullbind_common::config::Config;
use nullbind_common::error::{ProtocolError, ScanError};
use nullbind_common::models::result::{PagingOutcome, ScanResult};
use nullbind_common::network::target::Target;
use nullbind_core::directory::PagingControl;
use nullbind_core::scanner::{self, ProgressCallback};

use crate::util::{ScriptedConnector, ServerScript, person};

const EXAMPLE_CONTEXT: &str = "dc=example,dc=com";

fn config() -> Config {
    Config {
        no_banner: true,
        quiet: 2,
        ..Config::default()
    }
}

fn example_directory() -> ServerScript {
    ServerScript::open(&[EXAMPLE_CONTEXT])
        .page(
            EXAMPLE_CONTEXT,
            vec![
                person("ou=people,dc=example,dc=com", None, None, None),
                person("cn=admin,dc=example,dc=com", Some("s3cr3t"), Some("admin"), Some("Admin")),
            ],
            PagingControl::Present(b"page-2".to_vec()),
        )
        .page(
            EXAMPLE_CONTEXT,
            vec![person("cn=alice,dc=example,dc=com", Some("hunter2"), Some("alice"), None)],
            PagingControl::Present(Vec::new()),
        )
}

/// Anonymous bind allowed, one naming context, two pages with alice on the last.
#[tokio::test]
async fn scan_dumps_alice_from_two_pages() {
    let target = Target::new("dc1.example.com", 389);
    let connector = ScriptedConnector::default().with_server(&target, example_directory());
    let connector = Arc::new(connector);

    let aggregator =
        scanner::perform_scan(connector.clone(), vec![target.clone()], &config(), None).await;

    let result = &aggregator.results()[0];
    assert!(result.bind_succeeded);
    assert_eq!(result.naming_contexts, vec![EXAMPLE_CONTEXT]);
    assert_eq!(result.error, None);

    let lines: Vec<String> = result.records.iter().map(|r| r.dump_line()).collect();
    assert_eq!(
        lines,
        vec![
            "cn=admin,dc=example,dc=com:s3cr3t:admin:Admin",
            "cn=alice,dc=example,dc=com:hunter2:alice:N/A",
        ]
    );

    let observed = connector.observed(&target);
    assert_eq!(observed.paged_requests().len(), 2);
    assert!(observed.closed, "session was not closed");

    let manifest: Vec<String> = aggregator.manifest().iter().map(|t| t.to_string()).collect();
    assert_eq!(manifest, vec!["dc1.example.com:389"]);
}

#[tokio::test]
async fn paging_issues_exactly_n_requests() {
    let target = Target::new("ldap.corp", 389);
    let mut script = ServerScript::open(&["o=corp"]);
    for page in 1..=5u8 {
        let cookie = if page < 5 { vec![page] } else { Vec::new() };
        script = script.page(
            "o=corp",
            vec![person(&format!("uid=u{page},o=corp"), Some("pw"), None, None)],
            PagingControl::Present(cookie),
        );
    }
    let connector = Arc::new(ScriptedConnector::default().with_server(&target, script));

    let aggregator = scanner::perform_scan(connector.clone(), vec![target.clone()], &config(), None).await;

    let result = &aggregator.results()[0];
    assert_eq!(result.records.len(), 5);
    assert_eq!(result.contexts[0].pages_requested, 5);
    assert_eq!(result.contexts[0].outcome, PagingOutcome::Complete);

    let cookies: Vec<Vec<u8>> = connector
        .observed(&target)
        .paged_requests()
        .iter()
        .map(|r| r.paging.as_ref().unwrap().cookie.clone())
        .collect();
    assert_eq!(cookies, vec![vec![], vec![1], vec![2], vec![3], vec![4]]);
}

#[tokio::test]
async fn non_compliant_server_gets_one_request() {
    let target = Target::new("legacy.corp", 389);
    let script = ServerScript::open(&["o=legacy"])
        .page(
            "o=legacy",
            vec![person("cn=bob,o=legacy", Some("bobpw"), Some("bob"), Some("Builder"))],
            PagingControl::Absent,
        )
        .page(
            "o=legacy",
            vec![person("cn=ghost,o=legacy", Some("never"), None, None)],
            PagingControl::Present(Vec::new()),
        );
    let connector = Arc::new(ScriptedConnector::default().with_server(&target, script));

    let aggregator = scanner::perform_scan(connector.clone(), vec![target.clone()], &config(), None).await;

    let result = &aggregator.results()[0];
    assert_eq!(result.contexts[0].outcome, PagingOutcome::NonCompliant);
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.records[0].distinguished_name, "cn=bob,o=legacy");
    assert_eq!(connector.observed(&target).paged_requests().len(), 1);
}

#[tokio::test]
async fn size_limited_server_keeps_partial_records() {
    let target = Target::new("capped.corp", 389);
    let script = ServerScript::open(&["o=capped"]).partial_page(
        "o=capped",
        vec![person("cn=alice,o=capped", Some("hunter2"), Some("alice"), None)],
        PagingControl::Absent,
        ProtocolError::SizeLimitExceeded,
    );
    let connector = Arc::new(ScriptedConnector::default().with_server(&target, script));

    let aggregator = scanner::perform_scan(connector, vec![target.clone()], &config(), None).await;

    let result = &aggregator.results()[0];
    assert_eq!(result.contexts[0].outcome, PagingOutcome::NonCompliant);
    assert_eq!(result.records[0].dump_line(), "cn=alice,o=capped:hunter2:alice:N/A");
    assert!(result.warnings.is_empty());
    assert_eq!(aggregator.manifest(), vec![&target]);
}

#[tokio::test]
async fn host_whose_only_context_aborts_is_left_out_of_manifest() {
    let target = Target::new("flaky.corp", 389);
    let script = ServerScript::open(&["o=flaky"])
        .failing_page("o=flaky", ProtocolError::ServerDown("connection reset".to_string()));
    let connector = Arc::new(ScriptedConnector::default().with_server(&target, script));

    let aggregator = scanner::perform_scan(connector, vec![target], &config(), None).await;

    let result = &aggregator.results()[0];
    assert!(result.bind_succeeded);
    assert_eq!(result.warnings.len(), 1);
    assert!(!result.is_enumerated());
    assert!(aggregator.manifest().is_empty());
    assert_eq!(aggregator.credentials().count(), 0);
}

#[tokio::test]
async fn denied_targets_never_carry_records() {
    let bind_refused = Target::new("refuses-bind.corp", 389);
    let search_refused = Target::new("refuses-search.corp", 389);

    let connector = ScriptedConnector::default()
        .with_server(
            &bind_refused,
            ServerScript {
                bind_error: Some(ProtocolError::Result {
                    rc: 48,
                    text: "anonymous bind disallowed".to_string(),
                }),
                ..example_directory()
            },
        )
        .with_server(
            &search_refused,
            ServerScript {
                probe_error: Some(ProtocolError::InsufficientAccess),
                ..example_directory()
            },
        );
    let connector = Arc::new(connector);

    let aggregator = scanner::perform_scan(
        connector.clone(),
        vec![bind_refused.clone(), search_refused.clone()],
        &config(),
        None,
    )
    .await;

    for result in aggregator.results() {
        assert!(!result.bind_succeeded);
        assert!(result.records.is_empty());
        assert!(matches!(result.error, Some(ScanError::BindDenied(_))));
    }
    assert!(aggregator.manifest().is_empty());
    assert_eq!(aggregator.credentials().count(), 0);

    assert!(connector.observed(&search_refused).paged_requests().is_empty());
    assert!(connector.observed(&bind_refused).closed);
    assert!(connector.observed(&search_refused).closed);
}

#[tokio::test]
async fn one_failing_target_does_not_stop_the_batch() {
    let unreachable = Target::new("10.0.0.1", 389);
    let healthy = Target::new("dc1.example.com", 389);
    let no_contexts = Target::new("empty.example.com", 389);

    let connector = ScriptedConnector::default()
        .with_server(&healthy, example_directory())
        .with_server(&no_contexts, ServerScript::open(&[]));
    let connector = Arc::new(connector);

    let aggregator = scanner::perform_scan(
        connector,
        vec![unreachable.clone(), healthy.clone(), no_contexts.clone()],
        &config(),
        None,
    )
    .await;

    let results = aggregator.results();
    assert_eq!(results.len(), 3);

    assert!(matches!(results[0].error, Some(ScanError::Connect(_))));
    assert!(results[0].naming_contexts.is_empty());

    assert_eq!(results[1].records.len(), 2);

    assert!(results[2].bind_succeeded);
    assert!(results[2].records.is_empty());
    assert!(!results[2].is_enumerated());

    let manifest: Vec<&Target> = aggregator.manifest();
    assert_eq!(manifest, vec![&healthy]);
}

#[tokio::test]
async fn root_dse_failure_still_completes_scan() {
    let target = Target::new("dc1.example.com", 389);
    let script = ServerScript {
        root_dse: Some(Err(ProtocolError::Timeout)),
        ..example_directory()
    };
    let connector = Arc::new(ScriptedConnector::default().with_server(&target, script));

    let aggregator = scanner::perform_scan(connector.clone(), vec![target.clone()], &config(), None).await;

    let result = &aggregator.results()[0];
    assert!(result.bind_succeeded);
    assert!(result.records.is_empty());
    assert_eq!(
        result.error,
        Some(ScanError::ContextResolutionDegraded(ProtocolError::Timeout))
    );
    assert!(connector.observed(&target).paged_requests().is_empty());
}

#[tokio::test]
async fn aborted_context_keeps_partial_records() {
    let target = Target::new("dc1.example.com", 389);
    let script = ServerScript::open(&["o=one", "o=two"])
        .page(
            "o=one",
            vec![person("cn=a,o=one", Some("pa"), Some("a"), None)],
            PagingControl::Present(vec![1]),
        )
        .failing_page("o=one", ProtocolError::ServerDown("connection reset".to_string()))
        .page(
            "o=two",
            vec![person("cn=b,o=two", Some("pb"), Some("b"), None)],
            PagingControl::Present(Vec::new()),
        );
    let connector = Arc::new(ScriptedConnector::default().with_server(&target, script));

    let aggregator = scanner::perform_scan(connector, vec![target], &config(), None).await;

    let result = &aggregator.results()[0];
    let dns: Vec<&str> = result.records.iter().map(|r| r.distinguished_name.as_str()).collect();
    assert_eq!(dns, vec!["cn=a,o=one", "cn=b,o=two"]);
    assert!(matches!(
        result.contexts[0].outcome,
        PagingOutcome::Aborted(ProtocolError::ServerDown(_))
    ));
    assert_eq!(result.contexts[1].outcome, PagingOutcome::Complete);
    assert_eq!(result.warnings.len(), 1);
    assert!(result.is_enumerated());
}

#[tokio::test]
async fn repeated_scans_are_identical() {
    let target = Target::new("dc1.example.com", 389);
    let connector = Arc::new(ScriptedConnector::default().with_server(&target, example_directory()));

    let first = scanner::perform_scan(connector.clone(), vec![target.clone()], &config(), None).await;
    let second = scanner::perform_scan(connector, vec![target], &config(), None).await;

    assert_eq!(first.results()[0].records, second.results()[0].records);
}

#[tokio::test]
async fn concurrent_scan_keeps_input_order() {
    let slow = Target::new("slow.example.com", 389);
    let fast = Target::new("fast.example.com", 389);

    let connector = ScriptedConnector::default()
        .with_server(&slow, example_directory())
        .with_server(&fast, example_directory())
        .with_delay(&slow, Duration::from_millis(200));

    let cfg = Config {
        concurrency: 4,
        ..config()
    };

    let finished = Arc::new(AtomicUsize::new(0));
    let counter = finished.clone();
    let on_done: ProgressCallback = Arc::new(move |_result: &ScanResult| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let start = Instant::now();
    let aggregator = scanner::perform_scan(
        Arc::new(connector),
        vec![slow.clone(), fast.clone()],
        &cfg,
        Some(on_done),
    )
    .await;

    let hosts: Vec<&Target> = aggregator.results().iter().map(|r| &r.target).collect();
    assert_eq!(hosts, vec![&slow, &fast]);
    assert_eq!(finished.load(Ordering::SeqCst), 2);
    assert!(start.elapsed() < Duration::from_secs(5));
}
