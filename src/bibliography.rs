//! Bibliography store: citation keys mapped to pre-rendered HTML fragments.
//!
//! The store is built in two steps. Hand-authored entries are loaded first,
//! then one synthesized self-citation per document is merged in. Sealing the
//! store yields a [`SealedBibliography`], the read-only view that citation
//! expansion takes, so no document can be expanded against a store that is
//! still missing self-citations.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mutable bibliography, open for merging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bibliography {
    entries: BTreeMap<String, String>,
}

/// Outcome of merging one synthesized entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// No entry existed under the key.
    Inserted,
    /// A hand-authored entry existed and was replaced.
    Replaced,
}

impl Bibliography {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse hand-authored entries from JSON: `{ "key": "<fragment>" }`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load hand-authored entries from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Path {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| Error::JsonFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Insert a hand-authored entry.
    pub fn insert(&mut self, key: impl Into<String>, fragment: impl Into<String>) {
        self.entries.insert(key.into(), fragment.into());
    }

    /// Merge a synthesized entry. Synthesized entries always win.
    pub fn merge(&mut self, key: &str, fragment: String) -> MergeDecision {
        match self.entries.insert(key.to_string(), fragment) {
            Some(_) => {
                tracing::warn!("bibliography entry `{key}` replaced by its self-citation");
                MergeDecision::Replaced
            }
            None => MergeDecision::Inserted,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close the store for further merges.
    pub fn seal(self) -> SealedBibliography {
        SealedBibliography {
            entries: self.entries,
        }
    }
}

/// Read-only bibliography, complete for the current build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SealedBibliography {
    entries: BTreeMap<String, String>,
}

impl SealedBibliography {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_reports_replacement() {
        let mut biblio = Bibliography::from_json(r#"{"foo": "hand-written"}"#).unwrap();

        assert_eq!(
            biblio.merge("foo", "synthesized".to_string()),
            MergeDecision::Replaced
        );
        assert_eq!(
            biblio.merge("bar", "synthesized".to_string()),
            MergeDecision::Inserted
        );
        assert_eq!(biblio.get("foo"), Some("synthesized"));
    }

    #[test]
    fn test_seal_keeps_entries_in_key_order() {
        let mut biblio = Bibliography::new();
        biblio.insert("b", "B");
        biblio.insert("a", "A");

        let sealed = biblio.seal();
        let keys: Vec<_> = sealed.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(sealed.contains("a"));
    }

    #[test]
    fn test_non_string_fragment_is_rejected() {
        assert!(Bibliography::from_json(r#"{"foo": 1}"#).is_err());
    }
}
