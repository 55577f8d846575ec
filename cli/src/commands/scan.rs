use std::fs::{self, File};
use std::io::BufReader;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use colored::*;
use nullbind_common::config::Config;
use nullbind_common::models::result::ScanResult;
use nullbind_common::network::target::{self, Target};
use nullbind_core::aggregator::ResultAggregator;
use nullbind_core::network::ldap::LdapConnector;
use nullbind_core::scanner::{self, ProgressCallback};
use tracing::{Instrument, error, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

use crate::commands::ScanArgs;
use crate::output;
use crate::terminal::{colors, format, print, spinner};

pub async fn scan(args: ScanArgs, cfg: &Config) -> anyhow::Result<()> {
    let targets: Vec<Target> = collect_targets(&args)?;
    if targets.is_empty() {
        anyhow::bail!("no valid targets to scan");
    }

    fs::create_dir_all(&cfg.output_dir)
        .with_context(|| format!("creating output directory {}", cfg.output_dir.display()))?;

    print_settings(&targets, cfg);

    let span = info_span!("scan", indicatif.pb_show = true);
    span.pb_set_length(targets.len() as u64);
    span.pb_set_message("Probing for anonymous bind");

    let progress_span = span.clone();
    let on_done: ProgressCallback =
        Arc::new(move |result: &ScanResult| spinner::report_progress(&progress_span, result));

    let start_time: Instant = Instant::now();
    let aggregator: ResultAggregator =
        scanner::perform_scan(Arc::new(LdapConnector), targets, cfg, Some(on_done))
            .instrument(span)
            .await;

    scan_ends(&aggregator, start_time.elapsed(), cfg);
    Ok(())
}

fn collect_targets(args: &ScanArgs) -> anyhow::Result<Vec<Target>> {
    let mut targets: Vec<Target> = Vec::new();

    if let Some(single) = &args.target {
        targets.push(single.clone());
    }

    if let Some(path) = &args.file {
        let file = File::open(path).with_context(|| format!("opening host file {}", path.display()))?;
        let loaded = target::load_targets(BufReader::new(file))
            .with_context(|| format!("reading host file {}", path.display()))?;
        targets.extend(loaded);
    }

    Ok(targets)
}

fn print_settings(targets: &[Target], cfg: &Config) {
    if cfg.quiet > 0 {
        return;
    }
    print::aligned_line("Targets", targets.len().to_string());
    print::aligned_line("Timeout", format!("{}s", cfg.timeout.as_secs_f64()));
    print::aligned_line("Page size", cfg.page_size.to_string());
    print::aligned_line("Workers", cfg.concurrency.to_string());
    print::aligned_line("Output", cfg.output_dir.display().to_string());
}

fn scan_ends(aggregator: &ResultAggregator, total_time: Duration, cfg: &Config) {
    for (target, records) in aggregator.credentials() {
        if let Err(e) = output::write_dump(&cfg.output_dir, target, records) {
            error!(host = %target.host, port = target.port, "Error while dumping passwords: {e:#}");
        }
    }

    let manifest = aggregator.manifest();
    if !manifest.is_empty() {
        if let Err(e) = output::write_manifest(&cfg.output_dir, manifest.iter().copied()) {
            error!("Error while writing host manifest: {e:#}");
        }
    }

    print::blank();
    print::header("Anonymous Bind Results", cfg.quiet);

    if aggregator.allowed_count() == 0 {
        print::no_results();
    } else if cfg.quiet < 2 {
        print_results(aggregator, cfg);
    }

    print_summary(aggregator, total_time, cfg);
}

fn print_results(aggregator: &ResultAggregator, cfg: &Config) {
    let results = aggregator.results();
    for (idx, result) in results.iter().enumerate() {
        print_result_tree(result, idx, cfg);
        if idx + 1 != results.len() {
            print::blank();
        }
    }
}

fn print_result_tree(result: &ScanResult, idx: usize, cfg: &Config) {
    print::tree_head(idx, &result.target.to_string());

    let mut details = vec![format::verdict_to_detail(result)];
    if let Some(error_detail) = format::error_to_detail(result) {
        details.push(error_detail);
    }
    details.extend(format::contexts_to_details(result));
    if result.bind_succeeded {
        details.push(format::records_to_detail(result));
    }
    if result.is_enumerated() {
        let path = output::dump_path(&cfg.output_dir, &result.target);
        details.push((String::from("Saved"), path.display().to_string().normal()));
    }
    print::as_tree_one_level(details);

    if !result.records.is_empty() {
        for row in format::credential_rows(&result.records) {
            print::print(&format!("    {row}"));
        }
    }
}

fn print_summary(aggregator: &ResultAggregator, total_time: Duration, cfg: &Config) {
    let open: ColoredString = format!("{} of {} hosts", aggregator.allowed_count(), aggregator.len())
        .bold()
        .green();
    let secrets: ColoredString = format!("{} credentials", aggregator.record_count()).bold().yellow();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: String =
        format!("Scan Complete: {open} allow anonymous bind, {secrets} in {total_time}")
            .color(colors::TEXT_DEFAULT)
            .to_string();

    match cfg.quiet {
        0 => {
            print::fat_separator();
            print::centerln(&output);
        }
        _ => print::print(&output),
    }
}
