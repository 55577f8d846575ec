use crate::terminal::colors;
use colored::*;
use nullbind_common::models::credential::CredentialRecord;
use nullbind_common::models::result::{PagingOutcome, ScanResult};

type Detail = (String, ColoredString);

const DN_WIDTH: usize = 40;
const SECRET_WIDTH: usize = 30;
const NAME_WIDTH: usize = 20;

pub fn verdict_to_detail(result: &ScanResult) -> Detail {
    let value = if result.bind_succeeded {
        "anonymous bind allowed".color(colors::ALLOWED).bold()
    } else {
        "anonymous bind denied".color(colors::DENIED)
    };
    (String::from("Verdict"), value)
}

pub fn error_to_detail(result: &ScanResult) -> Option<Detail> {
    result
        .error
        .as_ref()
        .map(|e| (String::from("Error"), e.to_string().color(colors::DENIED)))
}

pub fn contexts_to_details(result: &ScanResult) -> Vec<Detail> {
    result
        .contexts
        .iter()
        .map(|report| {
            let outcome: ColoredString = match &report.outcome {
                PagingOutcome::Complete => "complete".green(),
                PagingOutcome::NonCompliant => "paging ignored, first page only".yellow(),
                PagingOutcome::Aborted(e) => format!("aborted: {e}").red(),
            };
            let value = format!(
                "{} ({} pages, {} records, {})",
                report.naming_context.color(colors::PRIMARY),
                report.pages_requested,
                report.records_found,
                outcome
            );
            (String::from("Context"), value.normal())
        })
        .collect()
}

pub fn records_to_detail(result: &ScanResult) -> Detail {
    let count = result.records.len();
    let unit = if count == 1 { "credential" } else { "credentials" };
    let value = format!("{count} {unit}");
    let value = if count > 0 {
        value.color(colors::SECRET).bold()
    } else {
        value.color(colors::TEXT_DEFAULT)
    };
    (String::from("Records"), value)
}

/// One row per record: DN, password, CN and SN padded to fixed columns.
pub fn credential_rows(records: &[CredentialRecord]) -> Vec<String> {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(format!(
        "{} {} {} {}",
        cell("DN", DN_WIDTH).magenta().bold(),
        cell("Password", SECRET_WIDTH).magenta().bold(),
        cell("CN", NAME_WIDTH).magenta().bold(),
        cell("SN", NAME_WIDTH).magenta().bold()
    ));

    for record in records {
        rows.push(format!(
            "{} {} {} {}",
            cell(&record.distinguished_name, DN_WIDTH).dimmed(),
            cell(&record.password_lossy(), SECRET_WIDTH).color(colors::SECRET),
            cell(record.common_name_or_placeholder(), NAME_WIDTH).dimmed(),
            cell(record.surname_or_placeholder(), NAME_WIDTH).dimmed()
        ));
    }
    rows
}

/// Pads or truncates `text` to exactly `width` terminal columns.
fn cell(text: &str, width: usize) -> String {
    console::pad_str(text, width, console::Alignment::Left, Some("…")).into_owned()
}
