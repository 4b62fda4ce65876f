pub mod csv;
pub mod encoding;

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::Error;
use crate::types::{Dataset, Result};

/// Where a table comes from
#[derive(Debug, Clone)]
pub enum TableSource {
    /// A file on disk
    Path(PathBuf),
    /// An uploaded file held in memory
    Bytes { name: String, bytes: Vec<u8> },
}

impl TableSource {
    /// Display name of the source (file name without directories)
    pub fn name(&self) -> String {
        match self {
            TableSource::Path(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string(),
            TableSource::Bytes { name, .. } => name.clone(),
        }
    }

    /// Read the raw bytes of the source
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        match self {
            TableSource::Path(path) => {
                check_extension(path)?;
                Ok(std::fs::read(path)?)
            }
            TableSource::Bytes { bytes, .. } => Ok(bytes.clone()),
        }
    }
}

/// Accepted extensions for table files
const TABLE_EXTENSIONS: &[&str] = &["csv", "txt"];

fn has_table_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| TABLE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn check_extension(path: &Path) -> Result<()> {
    if has_table_extension(path) {
        Ok(())
    } else {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Err(Error::UnsupportedFormat(format!(
            "Unsupported file extension: .{}",
            ext
        )))
    }
}

/// Load a table without caching
pub fn load_table(source: &TableSource) -> Result<Dataset> {
    let bytes = source.read_bytes()?;
    load_bytes(&source.name(), &bytes)
}

/// Parse raw bytes into a dataset identified by their content hash
pub fn load_bytes(name: &str, bytes: &[u8]) -> Result<Dataset> {
    let hash = compute_source_hash(bytes);
    csv::CsvTableReader::new().read(name, hash, bytes)
}

/// Pick the first table file (by file name) in the data directory
pub fn discover_default_source(dir: &Path) -> Result<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::EmptySourceDirectory(dir.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        {
            candidates.push(path);
        }
    }
    candidates.sort();

    let first = candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::EmptySourceDirectory(dir.to_path_buf()))?;
    info!(path = %first.display(), "using default source");
    Ok(first)
}

/// Resolve an explicit input, falling back to the data directory
pub fn resolve_source(input: Option<&Path>, data_dir: &Path) -> Result<TableSource> {
    match input {
        Some(path) => Ok(TableSource::Path(path.to_path_buf())),
        None => discover_default_source(data_dir).map(TableSource::Path),
    }
}

/// SHA-256 of the raw source, used as its identity
pub fn compute_source_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_compute_source_hash() {
        let hash = compute_source_hash(b"test content");
        assert_eq!(hash.len(), 64); // SHA-256 produces 64 hex chars
        assert_eq!(hash, compute_source_hash(b"test content"));
        assert_ne!(hash, compute_source_hash(b"other content"));
    }

    #[test]
    fn test_load_table_from_path() {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        write!(file, "SG_UF;BENEF_TOTAL\nSP;10\nRJ;5\n").unwrap();

        let dataset = load_table(&TableSource::Path(file.path().to_path_buf())).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.source_name.ends_with(".csv"));
    }

    #[test]
    fn test_load_table_unsupported_extension() {
        let file = NamedTempFile::with_suffix(".xyz").unwrap();
        let result = load_table(&TableSource::Path(file.path().to_path_buf()));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_discover_default_source_picks_first_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.csv"), "SG_UF\nSP\n").unwrap();
        std::fs::write(dir.path().join("a.csv"), "SG_UF\nRJ\n").unwrap();
        std::fs::write(dir.path().join("0.txt"), "ignored").unwrap();

        let found = discover_default_source(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "a.csv");
    }

    #[test]
    fn test_discover_default_source_empty_dir() {
        let dir = TempDir::new().unwrap();
        let result = discover_default_source(dir.path());
        assert!(matches!(result, Err(Error::EmptySourceDirectory(_))));
    }

    #[test]
    fn test_discover_default_source_missing_dir() {
        let dir = TempDir::new().unwrap();
        let result = discover_default_source(&dir.path().join("nope"));
        assert!(matches!(result, Err(Error::EmptySourceDirectory(_))));
    }

    #[test]
    fn test_resolve_source_prefers_explicit_input() {
        let dir = TempDir::new().unwrap();
        let explicit = dir.path().join("mine.csv");
        let source = resolve_source(Some(&explicit), dir.path()).unwrap();
        assert!(matches!(source, TableSource::Path(p) if p == explicit));
    }
}
