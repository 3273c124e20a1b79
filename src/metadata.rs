//! Per-document metadata: title and resolved authors.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::people::{Person, PersonRegistry};

/// Metadata record for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Document short name.
    pub name: String,
    pub title: String,
    /// Resolved authors, in declaration order. Never empty.
    pub authors: Vec<Person>,
}

/// Split an authorship declaration into author ids.
///
/// Ids may be separated by whitespace, commas, or both.
pub fn parse_author_ids(declaration: &str) -> Vec<String> {
    declaration
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read title and authors from a document and strip its authorship marker.
///
/// `default_authors` is used when the document declares no authors. Every
/// author id must be present in `people`; a missing one is fatal.
pub fn extract_metadata(
    doc: &mut Document,
    people: &PersonRegistry,
    default_authors: &[String],
) -> Result<Metadata> {
    let title = doc.title().ok_or_else(|| Error::MissingTitle {
        document: doc.name.clone(),
    })?;

    let mut ids = doc.authorship().map(parse_author_ids).unwrap_or_default();
    if ids.is_empty() {
        tracing::debug!("{}: no authors declared, using defaults", doc.name);
        ids = default_authors.to_vec();
    }

    let authors = ids
        .iter()
        .map(|id| {
            people.get(id).cloned().ok_or_else(|| Error::UnknownPerson {
                document: doc.name.clone(),
                person: id.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(marker) = doc.authorship_marker() {
        doc.dom.detach(marker);
    }

    Ok(Metadata {
        name: doc.name.clone(),
        title,
        authors,
    })
}
