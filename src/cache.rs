//! Session memoisation of the loaded dataset and of export encodings.
//!
//! The cache holds one source at a time, identified by the SHA-256 of its
//! bytes. Loading a source with a different hash resets everything.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::export::{table_columns, to_csv_bytes};
use crate::pipeline::filtered_table;
use crate::readers::csv::CsvTableReader;
use crate::readers::{compute_source_hash, TableSource};
use crate::types::{Dataset, FilterSelection, Result};

#[derive(Debug, Default)]
pub struct SessionCache {
    current: Option<Arc<Dataset>>,
    exports: HashMap<FilterSelection, Arc<Vec<u8>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a source, reusing the parsed dataset when its content is unchanged
    pub fn load(&mut self, source: &TableSource) -> Result<Arc<Dataset>> {
        let bytes = source.read_bytes()?;
        let hash = compute_source_hash(&bytes);

        if let Some(dataset) = &self.current {
            if dataset.source_hash == hash {
                debug!(source = %dataset.source_name, "dataset cache hit");
                return Ok(Arc::clone(dataset));
            }
        }

        self.reset();
        let dataset = Arc::new(CsvTableReader::new().read(&source.name(), hash, &bytes)?);
        self.current = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// The currently loaded dataset
    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        self.current.as_ref()
    }

    /// Encoded export of the filtered table for the current dataset
    pub fn export(&mut self, filters: &FilterSelection) -> Result<Arc<Vec<u8>>> {
        let dataset = self
            .current
            .clone()
            .ok_or_else(|| Error::InvalidInput("no dataset loaded".to_string()))?;

        if let Some(bytes) = self.exports.get(filters) {
            debug!("export cache hit");
            return Ok(Arc::clone(bytes));
        }

        let view = filtered_table(&dataset, filters);
        let bytes = Arc::new(to_csv_bytes(&view, &table_columns(&dataset))?);
        self.exports.insert(filters.clone(), Arc::clone(&bytes));
        Ok(bytes)
    }

    /// Forget the loaded dataset and every derived export
    pub fn reset(&mut self) {
        self.current = None;
        self.exports.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Selection;

    const CONTENT: &str = "SG_UF;NM_MUNICIPIO;BENEF_TOTAL\nSP;Santos;10\nRJ;Niterói;0\n";

    fn source(content: &str) -> TableSource {
        TableSource::Bytes {
            name: "upload.csv".to_string(),
            bytes: content.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_identical_content_is_not_reparsed() {
        let mut cache = SessionCache::new();
        let first = cache.load(&source(CONTENT)).unwrap();
        let second = cache.load(&source(CONTENT)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_new_source_resets_exports() {
        let mut cache = SessionCache::new();
        cache.load(&source(CONTENT)).unwrap();
        let export = cache.export(&FilterSelection::default()).unwrap();
        assert_eq!(
            String::from_utf8(export.to_vec()).unwrap(),
            "SG_UF;NM_MUNICIPIO;BENEF_TOTAL\nSP;Santos;10\n"
        );

        let other = cache.load(&source("SG_UF;BENEF_TOTAL\nMG;1\n")).unwrap();
        assert_eq!(other.len(), 1);
        assert!(cache.exports.is_empty());
    }

    #[test]
    fn test_export_memoised_per_selection() {
        let mut cache = SessionCache::new();
        cache.load(&source(CONTENT)).unwrap();

        let all = cache.export(&FilterSelection::default()).unwrap();
        let again = cache.export(&FilterSelection::default()).unwrap();
        assert!(Arc::ptr_eq(&all, &again));

        let filters = FilterSelection {
            region: Selection::only(["RJ"]),
            ..FilterSelection::default()
        };
        let rj = cache.export(&filters).unwrap();
        assert_eq!(
            String::from_utf8(rj.to_vec()).unwrap(),
            "SG_UF;NM_MUNICIPIO;BENEF_TOTAL\n"
        );
    }

    #[test]
    fn test_export_without_dataset_fails() {
        let mut cache = SessionCache::new();
        assert!(cache.export(&FilterSelection::default()).is_err());
    }

    #[test]
    fn test_failed_load_leaves_no_dataset() {
        let mut cache = SessionCache::new();
        cache.load(&source(CONTENT)).unwrap();
        assert!(cache.load(&source("")).is_err());
        assert!(cache.dataset().is_none());
    }
}
