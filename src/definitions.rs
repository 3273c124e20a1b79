//! Definition sites and the bare links that refer to them.
//!
//! Every `<dfn>` gets a stable id derived from its text. An `<a>` without an
//! `href` is a reference to a definition in the same document: its text is
//! slugged the same way and, when a definition carries that id, the link is
//! pointed at it.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::normalize_whitespace;
use crate::dom::{ArenaDom, ArenaNodeId};
use crate::report::DiagnosticKind;

/// Prefix separating definition ids from other ids in a document.
pub const DEFINITION_PREFIX: &str = "dfn-";

/// Stands in for the text of an empty definition or link.
pub const EMPTY_PLACEHOLDER: &str = "unnamed";

/// Class added to links resolved to a definition.
pub const RESOLVED_REFERENCE_CLASS: &str = "dfn-ref";

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W").expect("static regex is valid"));
static HYPHEN_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("static regex is valid"));

/// Derive a definition id from text content.
///
/// `\W` is matched with Unicode semantics, so letters outside ASCII are kept
/// as they are (`Événement` slugs to `dfn-événement`). Browsers accept them
/// in ids and fragments.
///
/// ```
/// use specweave::definitions::slugify_definition;
///
/// assert_eq!(slugify_definition("Hash  Chain"), "dfn-hash-chain");
/// assert_eq!(slugify_definition("  "), "dfn-unnamed");
/// ```
pub fn slugify_definition(text: &str) -> String {
    let mut normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        normalized = EMPTY_PLACEHOLDER.to_string();
    }
    let lower = normalized.to_lowercase();
    let hyphenated = NON_WORD.replace_all(&lower, "-");
    let collapsed = HYPHEN_RUN.replace_all(&hyphenated, "-");
    format!("{DEFINITION_PREFIX}{}", collapsed.trim_matches('-'))
}

/// A `<dfn>` with its final id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionSite {
    pub node: ArenaNodeId,
    pub id: String,
    /// Whether the id was written by the author rather than derived.
    pub explicit: bool,
    /// Whether a numeric suffix was added to avoid a collision.
    pub suffixed: bool,
}

impl DefinitionSite {
    /// Links may only land on explicit or unsuffixed ids.
    pub fn is_link_target(&self) -> bool {
        self.explicit || !self.suffixed
    }
}

/// Give every `<dfn>` in the tree a document-unique id.
///
/// Author-supplied ids are kept as they are. Derived ids that collide with
/// an id already in the document get `-1`, `-2`, ... in document order.
pub fn assign_definition_ids(dom: &mut ArenaDom) -> Vec<DefinitionSite> {
    let dfns = dom.select(|node| node.is_tag("dfn"));
    let mut sites = Vec::with_capacity(dfns.len());

    for node in dfns {
        if let Some(id) = dom.element_id(node) {
            sites.push(DefinitionSite {
                node,
                id: id.to_string(),
                explicit: true,
                suffixed: false,
            });
            continue;
        }

        let slug = slugify_definition(&dom.text(node));
        let mut candidate = slug.clone();
        let mut suffix = 1;
        while dom.has_id(&candidate) {
            candidate = format!("{slug}-{suffix}");
            suffix += 1;
        }

        dom.set_attr(node, "id", &candidate);
        sites.push(DefinitionSite {
            node,
            suffixed: suffix > 1,
            id: candidate,
            explicit: false,
        });
    }

    sites
}

/// Point every `<a>` lacking an `href` at the definition its text names.
///
/// Links are never suffix-searched: the text must slug to exactly the id of
/// an explicit or unsuffixed definition, so `<a>Node 1</a>` does not reach
/// the second `<dfn>Node</dfn>`. Every failure is returned, not just the first.
pub fn resolve_references(dom: &mut ArenaDom, sites: &[DefinitionSite]) -> Vec<DiagnosticKind> {
    let known: HashSet<&str> = sites
        .iter()
        .filter(|s| s.is_link_target())
        .map(|s| s.id.as_str())
        .collect();
    let links = dom.select(|node| node.is_tag("a") && node.attr("href").is_none());
    let mut unresolved = Vec::new();

    for link in links {
        let text = dom.text(link);
        let slug = slugify_definition(&text);

        if known.contains(slug.as_str()) {
            dom.set_attr(link, "href", &format!("#{slug}"));
            dom.add_class(link, RESOLVED_REFERENCE_CLASS);
        } else {
            unresolved.push(DiagnosticKind::UnresolvedReference {
                text: normalize_whitespace(&text),
                slug,
            });
        }
    }

    unresolved
}
