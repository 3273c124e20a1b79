//! Self-citation synthesis.
//!
//! Every document gets a bibliography entry derived from its own metadata,
//! keyed by its short name, so documents in a corpus can cite each other.

use chrono::NaiveDate;

use crate::metadata::Metadata;

/// Escape `&`, `<` and `"` for injection into HTML text or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Join display names as an English list: `A`, `A & B`, `A, B & C`.
pub fn format_author_list<S: AsRef<str>>(names: &[S]) -> String {
    match names {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head = init
                .iter()
                .map(|n| n.as_ref())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{head} & {}", last.as_ref())
        }
    }
}

/// Canonical published URL for a document.
pub fn canonical_url(base_url: &str, name: &str) -> String {
    format!("{}/{name}", base_url.trim_end_matches('/'))
}

/// Render the citation fragment for one document.
pub fn synthesize_entry(meta: &Metadata, date: NaiveDate, base_url: &str) -> String {
    let names: Vec<&str> = meta.authors.iter().map(|p| p.name.as_str()).collect();
    let authors = escape_html(&format_author_list(&names));
    let title = escape_html(&meta.title);
    let url = escape_html(&canonical_url(base_url, &meta.name));
    let date = date.format("%Y-%m-%d");

    format!(
        "{authors}. <a href=\"{url}\"><cite>{title}</cite></a>. {date}. URL: <a href=\"{url}\">{url}</a>"
    )
}
