use clap::{Args, Parser, Subcommand, ValueEnum};
use polysearch_core::qualifiers::{Qualifier, RawQualifiers};
use polysearch_core::registry::Engine;
use polysearch_core::Category;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "polysearch")]
#[command(about = "Polysearch - classify a query, search every matching source, rank the results")]
#[command(version)]
#[command(subcommand_negates_reqs = true)]
#[command(after_help = "\x1b[1;36mExamples:\x1b[0m
  polysearch -q \"attention is all you need\"           Auto-detects academic
  polysearch -q \"best laptops under $1000\" --include-general
  polysearch -q \"tariffs\" --category policy --format markdown --save
  polysearch -q \"rust site:github.com after:2024-01-01\"

\x1b[1;36mQualifiers:\x1b[0m
  site: filetype: inurl: intitle: intext: allinurl: allintitle: allintext:
  before:YYYY-MM-DD after:YYYY-MM-DD
  Qualifiers may be written inline in the query or passed as flags;
  flags win when both are given.

\x1b[1;36mMore Info:\x1b[0m
  polysearch sources                                  List every source and its weight")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// The search query, optionally with inline qualifiers
    #[arg(short, long, required = true)]
    pub query: Option<String>,

    /// Search only this category (skips auto-detection)
    #[arg(short, long, value_name = "CATEGORY")]
    pub category: Option<Category>,

    /// Also search the general web engine
    #[arg(long)]
    pub include_general: bool,

    /// Web engine for general and site-scoped sources
    #[arg(short, long, global = true, default_value_t = Engine::DuckDuckGo, value_name = "ENGINE")]
    pub engine: Engine,

    /// Number of results to return
    #[arg(short = 'n', long, default_value_t = 5, allow_negative_numbers = true)]
    pub top_n: i64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Print classification details and per-source outcomes to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write the output to search_results_<timestamp>.<ext>
    #[arg(short, long)]
    pub save: bool,

    #[command(flatten)]
    pub qualifiers: QualifierArgs,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every source with its category and trust weight
    #[command(alias = "ls")]
    #[command(after_help = "\x1b[1;33mExamples:\x1b[0m
  polysearch sources                 Show the source table
  polysearch sources --json          Output as JSON
  polysearch sources -e google       Show sources bound to Google")]
    Sources {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    #[value(alias = "md")]
    Markdown,
    Html,
}

impl OutputFormat {
    /// File extension used when saving.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
            OutputFormat::Html => "html",
        }
    }
}

#[derive(Args, Debug, Default, Clone)]
#[command(next_help_heading = "Qualifiers")]
pub struct QualifierArgs {
    /// Restrict results to a domain
    #[arg(long)]
    pub site: Option<String>,
    /// Restrict results to a file type (pdf, doc, ...)
    #[arg(long)]
    pub filetype: Option<String>,
    /// Word that must appear in the URL
    #[arg(long)]
    pub inurl: Option<String>,
    /// Word that must appear in the title
    #[arg(long)]
    pub intitle: Option<String>,
    /// Word that must appear in the text
    #[arg(long)]
    pub intext: Option<String>,
    /// Words that must all appear in the URL
    #[arg(long)]
    pub allinurl: Option<String>,
    /// Words that must all appear in the title
    #[arg(long)]
    pub allintitle: Option<String>,
    /// Words that must all appear in the text
    #[arg(long)]
    pub allintext: Option<String>,
    /// Only results published before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub before: Option<String>,
    /// Only results published on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub after: Option<String>,
}

impl QualifierArgs {
    pub fn to_raw(&self) -> RawQualifiers {
        let mut raw = RawQualifiers::default();
        for (qualifier, value) in [
            (Qualifier::Site, &self.site),
            (Qualifier::Filetype, &self.filetype),
            (Qualifier::Inurl, &self.inurl),
            (Qualifier::Intitle, &self.intitle),
            (Qualifier::Intext, &self.intext),
            (Qualifier::Allinurl, &self.allinurl),
            (Qualifier::Allintitle, &self.allintitle),
            (Qualifier::Allintext, &self.allintext),
            (Qualifier::Before, &self.before),
            (Qualifier::After, &self.after),
        ] {
            raw.set_opt(qualifier, value.as_deref());
        }
        raw
    }
}

#[derive(Args, Debug, Default, Clone)]
#[command(next_help_heading = "Tuning")]
pub struct TuningArgs {
    /// Per-source timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Deadline for the whole search in milliseconds
    #[arg(long, value_name = "MS")]
    pub global_timeout_ms: Option<u64>,

    /// Maximum number of sources queried at once
    #[arg(long, value_name = "N")]
    pub max_in_flight: Option<usize>,

    /// Settings file (YAML)
    #[arg(long, global = true, env = "POLYSEARCH_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}
