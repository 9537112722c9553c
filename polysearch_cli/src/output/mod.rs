use crate::cli::OutputFormat;
use crate::commands::Result;
use chrono::{DateTime, TimeZone};
use polysearch_core::federated::{ResultRecord, SearchReport};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

mod diagnostics;
mod html;

pub use diagnostics::print_diagnostics;

/// Render the ranked list in the requested format.
pub fn render(report: &SearchReport, format: OutputFormat) -> Result<Vec<u8>> {
    let records = &report.results.results;
    let bytes = match format {
        OutputFormat::Json => serde_json::to_vec_pretty(records)?,
        OutputFormat::Markdown => format_markdown(records).into_bytes(),
        OutputFormat::Html => html::format_html(&report.query, records).into_bytes(),
    };
    Ok(bytes)
}

fn format_markdown(records: &[ResultRecord]) -> String {
    let mut out = String::from("# Search results\n");
    if records.is_empty() {
        out.push_str("\nNo results found.\n");
        return out;
    }

    for (i, record) in records.iter().enumerate() {
        let _ = writeln!(out, "\n## {}. {}\n", i + 1, one_line(&record.title));
        let _ = writeln!(out, "- Source: {} ({})", record.source, record.category);
        let _ = writeln!(out, "- Link: <{}>", record.url);
        if let Some(date) = record.published {
            let _ = writeln!(out, "- Published: {}", date.format("%Y-%m-%d"));
        }
        if let Some(snippet) = &record.snippet {
            let _ = writeln!(out, "\n{}", one_line(snippet));
        }
    }
    out
}

/// Titles and snippets occasionally carry line breaks that would end a
/// Markdown block early.
fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn file_name<Tz: TimeZone>(format: OutputFormat, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "search_results_{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Write rendered output to a timestamped file in `dir`.
pub fn save<Tz: TimeZone>(dir: &Path, rendered: &[u8], format: OutputFormat, at: DateTime<Tz>) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let path = dir.join(file_name(format, &at));
    std::fs::write(&path, rendered)?;
    Ok(path)
}
