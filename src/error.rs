//! Error types for specweave builds.
//!
//! Everything here is fatal: the build stops before writing any output.
//! Document-local problems are collected in a [`crate::Report`] instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a corpus build.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on {path}: {source}")]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed JSON in {path}: {source}")]
    JsonFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{document}: author `{person}` is not in the person registry")]
    UnknownPerson { document: String, person: String },

    #[error("{document}: document has no <title>")]
    MissingTitle { document: String },

    #[error("no specification sources found in {0}")]
    NoSources(PathBuf),

    #[error("cannot watch for changes: {0}")]
    Watch(#[from] notify::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
