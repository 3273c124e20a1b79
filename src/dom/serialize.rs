//! HTML serializer for ArenaDom.
//!
//! Walks the arena and emits HTML5 markup. Text inside raw-text elements
//! (`script`, `style`, ...) is written verbatim; everything else is escaped.

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId};

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are not escaped.
pub(crate) const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Serialize the whole document, doctype included.
pub fn serialize_document(dom: &ArenaDom) -> String {
    let mut out = String::new();
    for child in dom.children(dom.document()) {
        write_node(dom, child, false, &mut out);
    }
    out
}

/// Serialize the children of a node (its "inner HTML").
pub fn serialize_children(dom: &ArenaDom, id: ArenaNodeId) -> String {
    let raw = dom
        .element_name(id)
        .is_some_and(|n| RAW_TEXT_ELEMENTS.contains(&&**n));
    let mut out = String::new();
    for child in dom.children(id) {
        write_node(dom, child, raw, &mut out);
    }
    out
}

/// Serialize a node and its subtree (its "outer HTML").
pub fn serialize_node(dom: &ArenaDom, id: ArenaNodeId) -> String {
    let mut out = String::new();
    write_node(dom, id, false, &mut out);
    out
}

fn write_node(dom: &ArenaDom, id: ArenaNodeId, in_raw_text: bool, out: &mut String) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        ArenaNodeData::Document => {
            for child in dom.children(id) {
                write_node(dom, child, false, out);
            }
        }
        ArenaNodeData::Doctype {
            name,
            public_id,
            system_id,
        } => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            if !public_id.is_empty() {
                out.push_str(" PUBLIC \"");
                out.push_str(public_id);
                out.push('"');
                if !system_id.is_empty() {
                    out.push_str(" \"");
                    out.push_str(system_id);
                    out.push('"');
                }
            } else if !system_id.is_empty() {
                out.push_str(" SYSTEM \"");
                out.push_str(system_id);
                out.push('"');
            }
            out.push_str(">\n");
        }
        ArenaNodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        ArenaNodeData::Text(text) => {
            if in_raw_text {
                out.push_str(text);
            } else {
                escape_text_into(text, out);
            }
        }
        ArenaNodeData::Element { name, attrs, .. } => {
            let tag: &str = &name.local;
            out.push('<');
            out.push_str(tag);
            for attr in attrs {
                out.push(' ');
                if let Some(prefix) = &attr.name.prefix {
                    out.push_str(prefix.as_ref());
                    out.push(':');
                }
                out.push_str(attr.name.local.as_ref());
                out.push_str("=\"");
                escape_attr_into(&attr.value, out);
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&tag) {
                return;
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&tag);
            for child in dom.children(id) {
                write_node(dom, child, raw, out);
            }

            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_text_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
