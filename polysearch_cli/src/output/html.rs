//! Standalone HTML page for the ranked list.

use html_escape::{encode_double_quoted_attribute, encode_text};
use polysearch_core::federated::ResultRecord;
use std::fmt::Write as _;

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:50rem;margin:2rem auto;padding:0 1rem;line-height:1.5}\
.result{border-bottom:1px solid #ddd;padding:0.75rem 0}\
.meta{color:#666;font-size:0.9rem}";

pub fn format_html(query: &str, records: &[ResultRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<!DOCTYPE html>");
    let _ = writeln!(out, "<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">");
    let _ = writeln!(out, "<title>Search results: {}</title>", encode_text(query));
    let _ = writeln!(out, "<style>{}</style>\n</head>\n<body>", STYLE);
    let _ = writeln!(out, "<h1>Search results</h1>");
    let _ = writeln!(out, "<p class=\"meta\">Query: {}</p>", encode_text(query));

    if records.is_empty() {
        let _ = writeln!(out, "<p>No results found.</p>");
    } else {
        let _ = writeln!(out, "<ol class=\"search-results\">");
        for record in records {
            write_record(&mut out, record);
        }
        let _ = writeln!(out, "</ol>");
    }

    let _ = writeln!(out, "</body>\n</html>");
    out
}

fn write_record(out: &mut String, record: &ResultRecord) {
    let _ = writeln!(out, "<li class=\"result\">");
    let _ = writeln!(
        out,
        "<h3><a href=\"{}\">{}</a></h3>",
        encode_double_quoted_attribute(&record.url),
        encode_text(&record.title)
    );

    let mut meta = format!("{} &middot; {}", encode_text(&record.source), record.category);
    if let Some(date) = record.published {
        let _ = write!(meta, " &middot; {}", date.format("%Y-%m-%d"));
    }
    let _ = writeln!(out, "<p class=\"meta\">{}</p>", meta);

    if let Some(snippet) = &record.snippet {
        let _ = writeln!(out, "<p>{}</p>", encode_text(snippet));
    }
    let _ = writeln!(out, "</li>");
}
