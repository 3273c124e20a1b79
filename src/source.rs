//! Reading specification sources from disk and writing the results.

use std::fs;
use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::error::{Error, Result};

/// Extension of specification source files.
pub const SOURCE_EXTENSION: &str = "html";

/// List `*.html` files directly inside `dir`, sorted by file name.
pub fn discover_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| Error::Path {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read and parse one source file.
pub fn load_document(path: &Path) -> Result<Document> {
    let html = fs::read_to_string(path).map_err(|source| Error::Path {
        path: path.to_path_buf(),
        source,
    })?;
    let name = Document::name_from_path(path).unwrap_or_else(|| path.display().to_string());
    Ok(Document::from_html(name, &html))
}

/// Discover and load every source in `dir`. An empty directory is an error.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    let paths = discover_sources(dir)?;
    if paths.is_empty() {
        return Err(Error::NoSources(dir.to_path_buf()));
    }
    paths.iter().map(|p| load_document(p)).collect()
}

/// Write each document to `<out_dir>/<name>.html`, returning the paths written.
pub fn write_documents(documents: &[Document], out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).map_err(|source| Error::Path {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(documents.len());
    for doc in documents {
        let path = out_dir.join(format!("{}.{SOURCE_EXTENSION}", doc.name));
        fs::write(&path, doc.to_html()).map_err(|source| Error::Path {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.html"), "<title>B</title>").unwrap();
        fs::write(dir.path().join("a.html"), "<title>A</title>").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        fs::create_dir(dir.path().join("c.html")).unwrap();

        let paths = discover_sources(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.html", "b.html"]);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_documents(dir.path()),
            Err(Error::NoSources(_))
        ));
    }

    #[test]
    fn test_write_documents() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let docs = vec![Document::from_html("foo", "<p>x</p>")];

        let written = write_documents(&docs, &out).unwrap();

        assert_eq!(written, vec![out.join("foo.html")]);
        let html = fs::read_to_string(&written[0]).unwrap();
        assert!(html.contains("<p>x</p>"));
    }
}
