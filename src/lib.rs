//! # specweave
//!
//! Turns a directory of loosely structured HTML specification sources into
//! a closed, cross-linked corpus with a shared bibliography.
//!
//! ## Features
//!
//! - Every document gets a self-citation, so documents can cite each other
//!   with `[[name]]` regardless of build order
//! - `<dfn>` elements get stable, document-unique ids
//! - Bare `<a>` links resolve to the definition their text names
//! - `[[key]]` markers become links plus an appended references section
//! - Every unresolved link or citation is reported, not just the first
//!
//! ## Quick Start
//!
//! ```
//! use chrono::NaiveDate;
//! use specweave::{Bibliography, BuildConfig, BuildSettings, Document, PersonRegistry, build_corpus};
//!
//! let people = PersonRegistry::from_json(
//!     r#"{"robin": {"name": "Robin", "email": "r@x", "site": "https://x"}}"#,
//! ).unwrap();
//!
//! let docs = vec![
//!     Document::from_html("a", r#"<title>A</title><meta name="authors" content="robin">
//!         <p id="abstract">Extends [[b]].</p>"#),
//!     Document::from_html("b", r#"<title>B</title><meta name="authors" content="robin">
//!         <p id="abstract">A <dfn>Node</dfn> is a <a>node</a>.</p>"#),
//! ];
//!
//! let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let settings = BuildSettings::new(&BuildConfig::default(), date);
//! let output = build_corpus(docs, &people, Bibliography::new(), &settings).unwrap();
//!
//! assert!(!output.report.has_errors());
//! assert!(output.documents[0].to_html().contains("href=\"#ref-b\""));
//! assert!(output.documents[1].to_html().contains("href=\"#dfn-node\""));
//! ```

pub mod bibliography;
pub mod citations;
pub mod config;
pub mod corpus;
pub mod definitions;
pub mod document;
pub mod dom;
mod error;
pub mod metadata;
pub mod people;
pub mod report;
pub mod source;
pub mod synthesize;
pub mod watch;

pub use bibliography::{Bibliography, MergeDecision, SealedBibliography};
pub use config::BuildConfig;
pub use corpus::{BuildOutput, BuildSettings, build_corpus, build_from_config};
pub use document::Document;
pub use error::{Error, Result};
pub use metadata::Metadata;
pub use people::{Person, PersonRegistry};
pub use report::{Diagnostic, DiagnosticKind, Report};
pub use watch::{Admission, BuildGate};
