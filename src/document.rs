//! A specification source and its in-progress content tree.

use std::path::Path;

use crate::dom::{self, ArenaDom, ArenaNodeId};

/// `<meta name="…">` value carrying the author ids of a document.
pub const AUTHORS_META: &str = "authors";

/// Element id marking the abstract section.
pub const ABSTRACT_ID: &str = "abstract";

/// One specification document.
pub struct Document {
    /// Short name, derived from the source file name.
    pub name: String,
    /// Parsed content, mutated in place by the build.
    pub dom: ArenaDom,
}

impl Document {
    /// Parse a document from HTML source.
    ///
    /// Recovered markup problems are logged, never fatal. A duplicated id is
    /// a warning: links and citations can only reach its first holder.
    pub fn from_html(name: impl Into<String>, html: &str) -> Self {
        let name = name.into();
        let parsed = dom::parse(html);
        if parsed.parse_errors > 0 {
            tracing::debug!("{name}: recovered from {} html parse errors", parsed.parse_errors);
        }
        if parsed.quirks {
            tracing::debug!("{name}: no <!DOCTYPE html>, parsed in quirks mode");
        }
        for id in &parsed.duplicate_ids {
            tracing::warn!("{name}: id `{id}` is used more than once");
        }
        Self {
            name,
            dom: parsed.dom,
        }
    }

    /// Short name for a source path: the file name without its extension.
    pub fn name_from_path(path: &Path) -> Option<String> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
    }

    /// Declared title, whitespace-normalized. `None` when there is no
    /// `<title>` or it holds only whitespace.
    pub fn title(&self) -> Option<String> {
        let title = self.dom.find_by_tag("title")?;
        Some(normalize_whitespace(&self.dom.text(title))).filter(|t| !t.is_empty())
    }

    /// The `<meta name="authors">` element, if declared.
    pub fn authorship_marker(&self) -> Option<ArenaNodeId> {
        self.dom
            .find(|node| node.is_tag("meta") && node.attr("name") == Some(AUTHORS_META))
    }

    /// Raw authorship declaration (the marker's `content`).
    pub fn authorship(&self) -> Option<&str> {
        self.authorship_marker()
            .and_then(|marker| self.dom.get_attr(marker, "content"))
    }

    /// The `<body>` element.
    pub fn body(&self) -> Option<ArenaNodeId> {
        self.dom.find_by_tag("body")
    }

    pub fn has_abstract(&self) -> bool {
        self.dom.has_id(ABSTRACT_ID)
    }

    /// Serialize the current tree.
    pub fn to_html(&self) -> String {
        dom::serialize_document(&self.dom)
    }
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"<!DOCTYPE html>
<html><head>
  <title>  Hash
    Chains </title>
  <meta name="authors" content="robin, sam">
</head><body><section id="abstract"><p>About.</p></section></body></html>"#;

    #[test]
    fn test_title_is_normalized() {
        let doc = Document::from_html("hash", SOURCE);
        assert_eq!(doc.title().as_deref(), Some("Hash Chains"));
    }

    #[test]
    fn test_authorship_declaration() {
        let doc = Document::from_html("hash", SOURCE);
        assert_eq!(doc.authorship(), Some("robin, sam"));
        assert!(doc.has_abstract());
    }

    #[test]
    fn test_missing_pieces() {
        let doc = Document::from_html("bare", "<p>nothing here</p>");
        assert_eq!(doc.title(), None);
        assert_eq!(doc.authorship(), None);
        assert!(!doc.has_abstract());
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_name_from_path() {
        assert_eq!(
            Document::name_from_path(Path::new("src/hash-chain.html")).as_deref(),
            Some("hash-chain")
        );
    }
}
