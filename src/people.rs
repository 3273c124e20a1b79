//! Person registry: short author ids mapped to contact metadata.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An editor or author who can be credited on a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub email: String,
    pub site: String,
}

/// Lookup from author id to [`Person`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonRegistry {
    people: BTreeMap<String, Person>,
}

impl PersonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a registry from its JSON form: `{ "id": { "name", "email", "site" } }`.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a registry from a JSON file.
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

    pub fn insert(&mut self, id: impl Into<String>, person: Person) {
        self.people.insert(id.into(), person);
    }

    pub fn get(&self, id: &str) -> Option<&Person> {
        self.people.get(id)
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        let registry = PersonRegistry::from_json(
            r#"{"robin": {"name": "Robin", "email": "r@x", "site": "https://x"}}"#,
        )
        .unwrap();

        let robin = registry.get("robin").unwrap();
        assert_eq!(robin.name, "Robin");
        assert_eq!(robin.email, "r@x");
        assert_eq!(robin.site, "https://x");
        assert!(registry.get("sam").is_none());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = PersonRegistry::from_json(r#"{"robin": {"name": "Robin"}}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.json");
        std::fs::write(&path, "not json").unwrap();

        let err = PersonRegistry::load(&path).unwrap_err();
        assert!(err.to_string().contains("people.json"));
    }
}
