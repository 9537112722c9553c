use crate::cli::Cli;
use crate::commands::{load_settings, Result};
use crate::output::{print_diagnostics, render, save};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use polysearch_core::{build_registry, CancellationToken, SearchRequest};
use std::io::{IsTerminal, Write};
use std::time::Duration;
use tracing::{debug, warn};

/// Run one search and write the rendered results to stdout.
pub async fn run(cli: &Cli) -> Result<()> {
    let settings = load_settings(&cli.tuning)?;
    let registry = build_registry(cli.engine, &settings)?;

    let request = SearchRequest {
        query: cli.query.clone().unwrap_or_default(),
        qualifiers: cli.qualifiers.to_raw(),
        category: cli.category,
        include_general: cli.include_general,
        top_n: cli.top_n,
    };

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let spinner = spinner(cli.verbose);
    let outcome = polysearch_core::search(&request, &registry, &settings, &cancel).await;
    spinner.finish_and_clear();
    ctrl_c.abort();

    let report = outcome?;
    debug!(
        results = report.results.len(),
        duration_ms = report.duration_ms,
        "search finished"
    );

    if cli.verbose {
        print_diagnostics(&report);
    }
    if report.all_sources_failed() {
        warn!("every source failed; run with --verbose for details");
    }

    let rendered = render(&report, cli.format)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&rendered)?;
    if !rendered.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;

    if cli.save {
        let dir = std::env::current_dir()?;
        let path = save(&dir, &rendered, cli.format, Local::now())?;
        eprintln!("Saved results to {}", path.display());
    }

    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        debug!("interrupt received, cancelling search");
        cancel.cancel();
    }
}

/// A steady spinner on stderr, hidden when stderr is not a terminal or
/// log output is enabled.
fn spinner(verbose: bool) -> ProgressBar {
    if verbose || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Searching...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
