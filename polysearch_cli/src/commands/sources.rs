use crate::cli::Cli;
use crate::commands::{load_settings, Result};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use polysearch_core::build_registry;
use polysearch_core::registry::{SourceDescriptor, SourceKind, SourceRegistry};

pub fn run(cli: &Cli, json: bool) -> Result<()> {
    let settings = load_settings(&cli.tuning)?;
    let registry = build_registry(cli.engine, &settings)?;

    if json {
        let descriptors: Vec<&SourceDescriptor> = registry.iter().map(|s| &s.descriptor).collect();
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    println!("{}", "Sources".bold().cyan());
    println!();
    println!("{}", source_table(&registry));
    println!();
    println!(
        "{} general searches use {} only; change it with {}",
        "Note:".green().bold(),
        registry.engine().to_string().cyan(),
        "--engine".cyan()
    );
    Ok(())
}

fn backend(descriptor: &SourceDescriptor, registry: &SourceRegistry) -> String {
    match descriptor.kind {
        SourceKind::Arxiv => "arXiv API".to_string(),
        SourceKind::Wikipedia => "MediaWiki API".to_string(),
        SourceKind::WebEngine(engine) => format!("{} web search", engine),
        SourceKind::SiteScoped(domain) => format!("{} site:{}", registry.engine(), domain),
    }
}

fn source_table(registry: &SourceRegistry) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Name", "Category", "Weight", "Backend"]);

    for source in registry.iter() {
        let d = &source.descriptor;
        table.add_row(vec![
            d.name.to_string(),
            d.category.to_string(),
            format!("{:.2}", d.weight),
            backend(d, registry),
        ]);
    }
    table
}
