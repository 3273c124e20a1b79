//! Document-local diagnostics collected over a build.

use std::fmt;

use thiserror::Error;

/// A non-fatal problem found in one document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    #[error("document has no abstract (an element with id=\"abstract\")")]
    MissingAbstract,

    #[error("link text `{text}` matches no definition (looked for #{slug})")]
    UnresolvedReference { text: String, slug: String },

    #[error("citation key `{key}` is not in the bibliography")]
    UnresolvedCitation { key: String },
}

/// A diagnostic tied to the document it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Short name of the offending document.
    pub document: String,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.document, self.kind)
    }
}

/// Everything a build found worth telling the author about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
    /// Hand-authored bibliography keys replaced by self-citations.
    pub overridden_entries: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it.
    pub fn push(&mut self, document: &str, kind: DiagnosticKind) {
        let diagnostic = Diagnostic {
            document: document.to_string(),
            kind,
        };
        tracing::warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Diagnostics for a single document.
    pub fn for_document<'a>(&'a self, document: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.document == document)
    }

    /// Short names of documents with at least one diagnostic, in first-seen order.
    pub fn failed_documents(&self) -> Vec<&str> {
        let mut failed: Vec<&str> = Vec::new();
        for d in &self.diagnostics {
            if !failed.contains(&d.document.as_str()) {
                failed.push(&d.document);
            }
        }
        failed
    }
}
