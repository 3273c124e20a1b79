//! Inline citation markers and the references section they produce.
//!
//! A marker is `[[key]]` anywhere in document text. Known keys become links
//! to `#ref-key`; unknown keys are reported and left in the text so the
//! author can see what failed. Text inside `script`, `style` and other
//! raw-text or RCDATA elements is never scanned, and neither is text inside
//! an `<a>`, since links cannot nest.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::bibliography::SealedBibliography;
use crate::dom::{ArenaDom, ArenaNodeData, ArenaNodeId, Attribute, RAW_TEXT_ELEMENTS, import_fragment};
use crate::report::DiagnosticKind;

/// Class on links produced from citation markers.
pub const CITATION_CLASS: &str = "cite";

/// Id of the appended references section.
pub const REFERENCES_ID: &str = "references";

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([\w-]+)\]\]").expect("static regex is valid"));

/// Anchor id of a bibliography entry in the references section.
pub fn reference_anchor(key: &str) -> String {
    format!("ref-{key}")
}

/// Result of expanding the markers in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationOutcome {
    /// Keys cited at least once, in key order.
    pub used: BTreeSet<String>,
    /// One entry per marker whose key is unknown.
    pub unresolved: Vec<DiagnosticKind>,
}

/// Text nodes that may carry citation markers.
fn content_text_nodes(dom: &ArenaDom) -> Vec<ArenaNodeId> {
    dom.select(|node| matches!(node.data, ArenaNodeData::Text(_)))
        .into_iter()
        .filter(|&id| {
            !dom.has_ancestor_tag(id, RAW_TEXT_ELEMENTS)
                && !dom.has_ancestor_tag(id, &["title", "textarea", "a"])
        })
        .collect()
}

/// Replace every resolvable marker in the tree with a citation link.
pub fn expand_citations(dom: &mut ArenaDom, bibliography: &SealedBibliography) -> CitationOutcome {
    let mut outcome = CitationOutcome::default();

    for text_id in content_text_nodes(dom) {
        let Some(text) = dom.text_content(text_id).map(str::to_string) else {
            continue;
        };
        if !text.contains("[[") {
            continue;
        }

        let mut pending = String::new();
        let mut last = 0;
        let mut replaced = false;

        for caps in MARKER.captures_iter(&text) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let key = key.as_str();
            pending.push_str(&text[last..whole.start()]);
            last = whole.end();

            if !bibliography.contains(key) {
                pending.push_str(whole.as_str());
                outcome.unresolved.push(DiagnosticKind::UnresolvedCitation {
                    key: key.to_string(),
                });
                continue;
            }

            if !pending.is_empty() {
                let before = dom.create_text(std::mem::take(&mut pending));
                dom.insert_before(text_id, before);
            }
            let link = citation_link(dom, key);
            dom.insert_before(text_id, link);
            outcome.used.insert(key.to_string());
            replaced = true;
        }

        if replaced {
            pending.push_str(&text[last..]);
            if !pending.is_empty() {
                let rest = dom.create_text(pending);
                dom.insert_before(text_id, rest);
            }
            dom.detach(text_id);
        }
    }

    outcome
}

/// `<a class="cite" href="#ref-key">[key]</a>`
fn citation_link(dom: &mut ArenaDom, key: &str) -> ArenaNodeId {
    let link = dom.create_html_element(
        "a",
        vec![
            Attribute::new("class", CITATION_CLASS),
            Attribute::new("href", format!("#{}", reference_anchor(key))),
        ],
    );
    dom.append_text(link, &format!("[{key}]"));
    link
}

/// Append a references section listing `used` under `parent`.
///
/// Nothing is appended when no key was used. Returns the section element.
pub fn append_references(
    dom: &mut ArenaDom,
    parent: ArenaNodeId,
    used: &BTreeSet<String>,
    bibliography: &SealedBibliography,
) -> Option<ArenaNodeId> {
    if used.is_empty() {
        return None;
    }

    let section = dom.create_html_element("section", vec![Attribute::new("id", REFERENCES_ID)]);
    let heading = dom.create_html_element("h2", vec![]);
    dom.append_text(heading, "References");
    dom.append(section, heading);

    let list = dom.create_html_element("dl", vec![]);
    for key in used {
        let Some(fragment) = bibliography.get(key) else {
            continue;
        };
        let anchor = reference_anchor(key);

        let term = dom.create_html_element("dt", vec![Attribute::new("id", anchor.clone())]);
        let self_link = dom.create_html_element("a", vec![Attribute::new("href", format!("#{anchor}"))]);
        dom.append_text(self_link, &format!("[{key}]"));
        dom.append(term, self_link);
        dom.append(list, term);

        let definition = dom.create_html_element("dd", vec![]);
        import_fragment(dom, definition, fragment);
        dom.append(list, definition);
    }
    dom.append(section, list);
    dom.append(parent, section);

    Some(section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bibliography::Bibliography;
    use crate::dom::{parse_html, serialize_children, serialize_node};

    fn bibliography() -> SealedBibliography {
        let mut biblio = Bibliography::new();
        biblio.insert("rfc2119", "S. Bradner. <cite>Key words</cite>. 1997.");
        biblio.insert("foo", "Robin. <cite>Foo</cite>.");
        biblio.seal()
    }

    #[test]
    fn test_known_marker_becomes_link() {
        let mut dom = parse_html("<p>See [[rfc2119]] for terms.</p>");

        let outcome = expand_citations(&mut dom, &bibliography());

        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(
            serialize_children(&dom, p),
            "See <a class=\"cite\" href=\"#ref-rfc2119\">[rfc2119]</a> for terms."
        );
        assert_eq!(outcome.used.into_iter().collect::<Vec<_>>(), vec!["rfc2119"]);
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn test_unknown_marker_is_left_and_reported() {
        let mut dom = parse_html("<p>Per [[rfc9999]] and [[foo]].</p>");

        let outcome = expand_citations(&mut dom, &bibliography());

        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(
            serialize_children(&dom, p),
            "Per [[rfc9999]] and <a class=\"cite\" href=\"#ref-foo\">[foo]</a>."
        );
        assert_eq!(
            outcome.unresolved,
            vec![DiagnosticKind::UnresolvedCitation {
                key: "rfc9999".to_string()
            }]
        );
        assert!(!outcome.used.contains("rfc9999"));
    }

    #[test]
    fn test_only_unknown_markers_leave_text_untouched() {
        let mut dom = parse_html("<p>[[nope]]</p>");
        let p = dom.find_by_tag("p").unwrap();
        let before: Vec<_> = dom.children(p).collect();

        let outcome = expand_citations(&mut dom, &bibliography());

        assert_eq!(dom.children(p).collect::<Vec<_>>(), before);
        assert_eq!(outcome.unresolved.len(), 1);
        assert!(outcome.used.is_empty());
    }

    #[test]
    fn test_adjacent_and_repeated_markers() {
        let mut dom = parse_html("<p>[[foo]][[rfc2119]] then [[foo]]</p>");

        let outcome = expand_citations(&mut dom, &bibliography());

        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(
            serialize_children(&dom, p),
            "<a class=\"cite\" href=\"#ref-foo\">[foo]</a>\
             <a class=\"cite\" href=\"#ref-rfc2119\">[rfc2119]</a> then \
             <a class=\"cite\" href=\"#ref-foo\">[foo]</a>"
        );
        assert_eq!(outcome.used.len(), 2);
    }

    #[test]
    fn test_scripts_and_styles_are_not_scanned() {
        let mut dom = parse_html(
            "<head><title>[[foo]]</title><style>a[x=\"[[foo]]\"]{}</style></head>\
             <body><script>var x = \"[[foo]]\";</script><p>[[foo]]</p></body>",
        );

        let outcome = expand_citations(&mut dom, &bibliography());

        let script = dom.find_by_tag("script").unwrap();
        let style = dom.find_by_tag("style").unwrap();
        assert_eq!(serialize_children(&dom, script), "var x = \"[[foo]]\";");
        assert_eq!(serialize_children(&dom, style), "a[x=\"[[foo]]\"]{}");
        assert_eq!(dom.select(|n| n.is_tag("a")).len(), 1);
        assert_eq!(outcome.used.len(), 1);
    }

    #[test]
    fn test_markers_inside_links_are_not_nested() {
        let mut dom = parse_html(
            "<p><a>see [[foo]]</a> <a href=\"#x\"><b>[[rfc2119]]</b></a> [[foo]]</p>",
        );

        let outcome = expand_citations(&mut dom, &bibliography());

        let p = dom.find_by_tag("p").unwrap();
        assert_eq!(
            serialize_children(&dom, p),
            "<a>see [[foo]]</a> <a href=\"#x\"><b>[[rfc2119]]</b></a> \
             <a class=\"cite\" href=\"#ref-foo\">[foo]</a>"
        );
        assert_eq!(outcome.used.into_iter().collect::<Vec<_>>(), vec!["foo"]);
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn test_malformed_markers_are_ignored() {
        let mut dom = parse_html("<p>[[]] [[two words]] [foo] [[foo]</p>");

        let outcome = expand_citations(&mut dom, &bibliography());

        assert!(outcome.used.is_empty());
        assert!(outcome.unresolved.is_empty());
    }

    #[test]
    fn test_references_section_is_sorted() {
        let mut dom = parse_html("<body><p>x</p></body>");
        let body = dom.find_by_tag("body").unwrap();
        let used: BTreeSet<String> = ["rfc2119", "foo"].iter().map(|s| s.to_string()).collect();

        let section = append_references(&mut dom, body, &used, &bibliography()).unwrap();

        assert_eq!(
            serialize_node(&dom, section),
            "<section id=\"references\"><h2>References</h2><dl>\
             <dt id=\"ref-foo\"><a href=\"#ref-foo\">[foo]</a></dt><dd>Robin. <cite>Foo</cite>.</dd>\
             <dt id=\"ref-rfc2119\"><a href=\"#ref-rfc2119\">[rfc2119]</a></dt>\
             <dd>S. Bradner. <cite>Key words</cite>. 1997.</dd>\
             </dl></section>"
        );
        assert_eq!(dom.get_by_id("ref-foo").map(|id| dom.is_element(id)), Some(true));
    }

    #[test]
    fn test_no_references_section_without_citations() {
        let mut dom = parse_html("<body><p>x</p></body>");
        let body = dom.find_by_tag("body").unwrap();

        assert!(append_references(&mut dom, body, &BTreeSet::new(), &bibliography()).is_none());
        assert!(dom.find_by_tag("section").is_none());
    }
}
