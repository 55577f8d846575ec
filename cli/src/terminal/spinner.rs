use colored::*;
use indicatif::ProgressStyle;
use nullbind_common::models::result::ScanResult;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

pub fn scan_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg} [{pos}/{len}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS)
}

/// Advances the scan bar once a target has finished.
pub fn report_progress(span: &Span, result: &ScanResult) {
    span.pb_inc(1);
    let verdict = if result.bind_succeeded {
        "open".green().bold()
    } else {
        "closed".red()
    };
    span.pb_set_message(&format!("Last: {} is {verdict}", result.target));
}
