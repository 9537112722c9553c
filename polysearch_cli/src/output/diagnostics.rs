//! Verbose diagnostics, written to stderr so stdout stays machine-readable.

use owo_colors::OwoColorize;
use polysearch_core::federated::{SearchReport, SourceReport};

pub fn print_diagnostics(report: &SearchReport) {
    eprintln!();
    eprintln!("{} {}", "Query:".bold(), report.base_query);
    for (qualifier, value) in report.qualifiers.iter() {
        eprintln!("  {} {}", format!("{}:", qualifier).dimmed(), value);
    }

    let resolution = &report.resolution;
    match &resolution.classification {
        Some(c) => {
            eprintln!(
                "{} {} (score {})",
                "Category:".bold(),
                c.category.cyan(),
                c.score
            );
            let table: Vec<String> = c
                .scores
                .iter()
                .map(|(category, score)| format!("{}={}", category, score))
                .collect();
            eprintln!("  {}", table.join("  ").dimmed());
        }
        None => eprintln!("{} {} (forced)", "Category:".bold(), resolution.primary().cyan()),
    }

    let searched: Vec<&str> = resolution.categories.iter().map(|c| c.as_str()).collect();
    eprintln!("{} {}", "Searching:".bold(), searched.join(", "));

    eprintln!();
    eprintln!("{}", "Sources".bold());
    for source in &report.sources {
        eprintln!("  {}", source_line(source));
    }

    eprintln!();
    eprintln!(
        "{} {} results ({} duplicates merged, {} outside date range) in {}ms",
        "Done:".bold(),
        report.results.len(),
        report.results.duplicates,
        report.results.filtered_out,
        report.duration_ms
    );
    eprintln!();
}

fn source_line(source: &SourceReport) -> String {
    match &source.failure {
        None => format!(
            "{} {:<16} {} results in {}ms",
            "✓".green(),
            source.source,
            source.count,
            source.elapsed_ms
        ),
        Some(failure) => format!(
            "{} {:<16} {} {}",
            "✗".red(),
            source.source,
            format!("[{}]", failure.code_str()).yellow(),
            failure
        ),
    }
}
