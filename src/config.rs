//! Build configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// File name looked up in the working directory when no config is given.
pub const DEFAULT_CONFIG_FILE: &str = "specweave.json";

/// Settings for one corpus build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Directory holding the `*.html` specification sources.
    pub source_dir: PathBuf,
    /// Directory the published documents are written to.
    pub output_dir: PathBuf,
    /// Person registry JSON.
    pub people: PathBuf,
    /// Hand-authored bibliography JSON.
    pub bibliography: PathBuf,
    /// Canonical location of the published corpus.
    pub base_url: String,
    /// Editors credited when a document declares none.
    pub default_authors: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("src"),
            output_dir: PathBuf::from("out"),
            people: PathBuf::from("data/people.json"),
            bibliography: PathBuf::from("data/biblio.json"),
            base_url: "https://specs.example.org".to_string(),
            default_authors: vec!["robin".to_string(), "sam".to_string()],
        }
    }
}

impl BuildConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file.
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

    /// Load `path` if given, else `specweave.json` in the working directory
    /// if it exists, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config =
            BuildConfig::from_json(r#"{"base_url": "https://w3.example", "output_dir": "site"}"#)
                .unwrap();

        assert_eq!(config.base_url, "https://w3.example");
        assert_eq!(config.output_dir, PathBuf::from("site"));
        assert_eq!(config.source_dir, PathBuf::from("src"));
        assert_eq!(config.default_authors, vec!["robin", "sam"]);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(BuildConfig::from_json(r#"{"base_uri": "typo"}"#).is_err());
    }

    #[test]
    fn test_discover_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        std::fs::write(&path, r#"{"default_authors": ["kai"]}"#).unwrap();

        let config = BuildConfig::discover(Some(&path)).unwrap();
        assert_eq!(config.default_authors, vec!["kai"]);
    }
}
