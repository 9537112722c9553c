use polysearch_core::federated::SettingsStore;
use polysearch_core::registry::Engine;
use polysearch_core::{build_registry, search, CancellationToken, SearchRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = SettingsStore::new_default().load()?;
    let registry = build_registry(Engine::DuckDuckGo, &settings)?;

    let mut request = SearchRequest::new("attention is all you need after:2017-01-01", 5);
    request.include_general = true;

    let report = search(&request, &registry, &settings, &CancellationToken::new()).await?;

    println!("Categories: {:?}", report.resolution.categories);
    for source in &report.sources {
        match &source.failure {
            None => println!("  {} -> {} results", source.source, source.count),
            Some(failure) => println!("  {} -> {}", source.source, failure),
        }
    }
    println!("{}", serde_json::to_string_pretty(&report.results.results)?);

    Ok(())
}
