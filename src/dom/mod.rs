//! Mutable content tree for specification documents.
//!
//! Documents are parsed with html5ever into an [`ArenaDom`], mutated in
//! place by the resolver and citation passes, and serialized back to HTML.
//!
//! # Example
//!
//! ```
//! use specweave::dom::{parse_html, serialize_children};
//!
//! let mut dom = parse_html("<p>Hello</p>");
//! let p = dom.find_by_tag("p").unwrap();
//! dom.set_attr(p, "id", "greeting");
//!
//! assert_eq!(dom.get_by_id("greeting"), Some(p));
//! assert_eq!(serialize_children(&dom, p), "Hello");
//! ```

mod arena;
mod serialize;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute};
pub use serialize::{serialize_children, serialize_document, serialize_node};
pub use tree_sink::ParsedHtml;

pub(crate) use serialize::RAW_TEXT_ELEMENTS;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use tree_sink::DocumentSink;

/// Parse an HTML document, keeping what the parser had to recover from.
///
/// Parsing never fails; malformed markup is recovered the way browsers do.
pub fn parse(html: &str) -> ParsedHtml {
    parse_document(DocumentSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
}

/// Parse an HTML document into an arena DOM.
pub fn parse_html(html: &str) -> ArenaDom {
    parse(html).dom
}

/// Parse an HTML fragment and append the resulting nodes under `parent`.
///
/// Returns the ids of the top-level nodes that were appended.
pub fn import_fragment(dom: &mut ArenaDom, parent: ArenaNodeId, markup: &str) -> Vec<ArenaNodeId> {
    let source = parse_html(&format!("<body>{markup}</body>"));
    let Some(body) = source.find_by_tag("body") else {
        return Vec::new();
    };

    let mut imported = Vec::new();
    for child in source.children(body) {
        if let Some(copy) = copy_subtree(&source, child, dom) {
            dom.append(parent, copy);
            imported.push(copy);
        }
    }
    imported
}

/// Deep-copy a node from one arena into another, returning the unattached copy.
fn copy_subtree(source: &ArenaDom, id: ArenaNodeId, target: &mut ArenaDom) -> Option<ArenaNodeId> {
    let node = source.get(id)?;
    let copy = match &node.data {
        ArenaNodeData::Element { name, attrs, .. } => {
            target.create_element(name.clone(), attrs.clone())
        }
        ArenaNodeData::Text(text) => target.create_text(text.clone()),
        ArenaNodeData::Comment(text) => target.create_comment(text.clone()),
        ArenaNodeData::Document | ArenaNodeData::Doctype { .. } => return None,
    };

    for child in source.children(id) {
        if let Some(child_copy) = copy_subtree(source, child, target) {
            target.append(copy, child_copy);
        }
    }
    Some(copy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_fragment_preserves_markup() {
        let mut dom = parse_html("<body><dd></dd></body>");
        let dd = dom.find_by_tag("dd").unwrap();

        let fragment = "Robin &amp; Sam. <a href=\"https://x/foo\"><cite>Foo</cite></a>. 2024-01-01.";
        let nodes = import_fragment(&mut dom, dd, fragment);

        assert_eq!(nodes.len(), 3);
        assert_eq!(serialize_children(&dom, dd), fragment);
    }

    #[test]
    fn test_import_fragment_registers_ids() {
        let mut dom = parse_html("<body><div></div></body>");
        let div = dom.find_by_tag("div").unwrap();

        import_fragment(&mut dom, div, "<span id=\"imported\">x</span>");

        assert!(dom.has_id("imported"));
    }
}
