//! Two-phase corpus build.
//!
//! Phase one reads every document's metadata and merges one self-citation
//! per document into the bibliography, then seals it. Phase two links each
//! document against the sealed bibliography: definition ids, reference
//! links, citation markers and the references section. Because phase two
//! only accepts a [`SealedBibliography`], a document can cite any other
//! document in the corpus regardless of listing order.

use chrono::{Local, NaiveDate};

use crate::bibliography::{Bibliography, MergeDecision, SealedBibliography};
use crate::citations::{append_references, expand_citations};
use crate::config::BuildConfig;
use crate::definitions::{assign_definition_ids, resolve_references};
use crate::document::Document;
use crate::error::Result;
use crate::metadata::{Metadata, extract_metadata};
use crate::people::PersonRegistry;
use crate::report::{DiagnosticKind, Report};
use crate::source::load_documents;
use crate::synthesize::synthesize_entry;

/// Inputs that shape the synthesized self-citations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub base_url: String,
    pub default_authors: Vec<String>,
    /// Citation date shared by every document in the build.
    pub date: NaiveDate,
}

impl BuildSettings {
    pub fn new(config: &BuildConfig, date: NaiveDate) -> Self {
        Self {
            base_url: config.base_url.clone(),
            default_authors: config.default_authors.clone(),
            date,
        }
    }

    /// Settings dated with the local calendar day.
    pub fn today(config: &BuildConfig) -> Self {
        Self::new(config, Local::now().date_naive())
    }
}

/// Everything a finished build hands back to the writer.
pub struct BuildOutput {
    /// Linked documents, in the order they were given.
    pub documents: Vec<Document>,
    pub metadata: Vec<Metadata>,
    pub bibliography: SealedBibliography,
    pub report: Report,
}

/// Phase one: metadata for every document, self-citations merged, store sealed.
///
/// Fails on the first document whose title or authors cannot be resolved.
pub fn collect_bibliography(
    documents: &mut [Document],
    people: &PersonRegistry,
    mut bibliography: Bibliography,
    settings: &BuildSettings,
    report: &mut Report,
) -> Result<(Vec<Metadata>, SealedBibliography)> {
    let metadata = documents
        .iter_mut()
        .map(|doc| extract_metadata(doc, people, &settings.default_authors))
        .collect::<Result<Vec<_>>>()?;

    for meta in &metadata {
        let entry = synthesize_entry(meta, settings.date, &settings.base_url);
        if bibliography.merge(&meta.name, entry) == MergeDecision::Replaced {
            report.overridden_entries.push(meta.name.clone());
        }
    }

    tracing::debug!(
        "bibliography sealed with {} entries ({} self-citations)",
        bibliography.len(),
        metadata.len()
    );
    Ok((metadata, bibliography.seal()))
}

/// Phase two for one document. Problems are recorded, never returned.
pub fn link_document(doc: &mut Document, bibliography: &SealedBibliography, report: &mut Report) {
    tracing::debug!("linking {}", doc.name);

    if !doc.has_abstract() {
        report.push(&doc.name, DiagnosticKind::MissingAbstract);
    }

    let sites = assign_definition_ids(&mut doc.dom);
    for problem in resolve_references(&mut doc.dom, &sites) {
        report.push(&doc.name, problem);
    }

    let outcome = expand_citations(&mut doc.dom, bibliography);
    for problem in outcome.unresolved {
        report.push(&doc.name, problem);
    }

    let parent = doc.body().unwrap_or(doc.dom.document());
    append_references(&mut doc.dom, parent, &outcome.used, bibliography);
}

/// Build a whole corpus in memory.
pub fn build_corpus(
    mut documents: Vec<Document>,
    people: &PersonRegistry,
    bibliography: Bibliography,
    settings: &BuildSettings,
) -> Result<BuildOutput> {
    tracing::info!("building {} documents", documents.len());
    let mut report = Report::new();

    let (metadata, bibliography) =
        collect_bibliography(&mut documents, people, bibliography, settings, &mut report)?;

    for doc in &mut documents {
        link_document(doc, &bibliography, &mut report);
    }

    tracing::info!(
        "built {} documents with {} diagnostics",
        documents.len(),
        report.diagnostics().len()
    );
    Ok(BuildOutput {
        documents,
        metadata,
        bibliography,
        report,
    })
}

/// Load registry, bibliography and sources named by `config`, then build.
///
/// Nothing is written; see [`crate::source::write_documents`].
pub fn build_from_config(config: &BuildConfig, settings: &BuildSettings) -> Result<BuildOutput> {
    let people = PersonRegistry::load(&config.people)?;
    let bibliography = Bibliography::load(&config.bibliography)?;
    let documents = load_documents(&config.source_dir)?;
    tracing::debug!(
        "loaded {} people and {} bibliography entries",
        people.len(),
        bibliography.len()
    );
    build_corpus(documents, &people, bibliography, settings)
}
