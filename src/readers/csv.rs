use std::collections::HashMap;

use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::coerce::{clean_category, parse_count, parse_period};
use crate::error::Error;
use crate::types::{
    Column, Dataset, Record, Result, SourceEncoding, DELIMITER, DROPPED_COLUMNS,
};

use super::encoding::decode;

/// Semicolon-delimited table reader with encoding fallback
pub struct CsvTableReader {
    delimiter: u8,
    encodings: Vec<SourceEncoding>,
}

impl CsvTableReader {
    /// Create a reader using the default fallback order
    pub fn new() -> Self {
        Self {
            delimiter: DELIMITER,
            encodings: SourceEncoding::FALLBACK_ORDER.to_vec(),
        }
    }

    /// Decode and parse the raw source.
    ///
    /// Each encoding is tried in turn; the first one under which both the
    /// decode and the full table parse succeed wins.
    pub fn read(&self, source_name: &str, source_hash: String, bytes: &[u8]) -> Result<Dataset> {
        for &encoding in &self.encodings {
            let Some(text) = decode(bytes, encoding) else {
                debug!(source = source_name, encoding = encoding.label(), "decode failed");
                continue;
            };

            match self.parse(&text) {
                Ok((columns, records)) => {
                    info!(
                        source = source_name,
                        encoding = encoding.label(),
                        rows = records.len(),
                        "table loaded"
                    );
                    return Ok(Dataset::new(
                        source_name.to_string(),
                        source_hash,
                        encoding,
                        columns,
                        records,
                    ));
                }
                Err(e) => {
                    debug!(
                        source = source_name,
                        encoding = encoding.label(),
                        error = %e,
                        "parse failed"
                    );
                }
            }
        }

        let tried: Vec<&str> = self.encodings.iter().map(|e| e.label()).collect();
        Err(Error::Ingest {
            source_name: source_name.to_string(),
            tried: tried.join(", "),
        })
    }

    fn parse(&self, text: &str) -> Result<(Vec<Column>, Vec<Record>)> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(Error::InvalidInput("missing header row".to_string()));
        }

        // Map recognized columns to their field index; the first occurrence wins
        let mut index: HashMap<Column, usize> = HashMap::new();
        let mut columns: Vec<Column> = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            match Column::from_header(header) {
                Some(column) if !index.contains_key(&column) => {
                    index.insert(column, idx);
                    columns.push(column);
                }
                Some(_) => debug!(header, "duplicate column ignored"),
                None if DROPPED_COLUMNS.contains(&header.trim()) => {
                    debug!(header, "dropping coverage column")
                }
                None => debug!(header, "unrecognized column ignored"),
            }
        }

        // Short rows are padded with absent cells; extra fields are malformed
        let width = headers.len();
        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;
            if row.len() > width {
                let line = row.position().map(|p| p.line()).unwrap_or_default();
                return Err(Error::InvalidInput(format!(
                    "line {}: expected at most {} fields, found {}",
                    line,
                    width,
                    row.len()
                )));
            }
            let cell = |column: Column| index.get(&column).and_then(|&i| row.get(i));
            let category = |column: Column| cell(column).map(clean_category).unwrap_or_default();

            records.push(Record {
                period: cell(Column::Period).and_then(parse_period),
                region: category(Column::Region),
                municipality: category(Column::Municipality),
                metro_region: category(Column::MetroRegion),
                sex: category(Column::Sex),
                age_band: category(Column::AgeBand),
                total: cell(Column::Total).and_then(parse_count),
                medical: cell(Column::Medical).and_then(parse_count),
                dental: cell(Column::Dental).and_then(parse_count),
            });
        }

        Ok((columns, records))
    }
}

impl Default for CsvTableReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "PERIODO;SG_UF;NM_MUNICIPIO;SEXO;FAIXA_ETARIA;BENEF_TOTAL;BENEF_ASSISTENCIA_MEDICA;BENEF_EXCLUS_ODONTOLOGICO;POPULACAO;TX_COBERT_TOTAL";

    fn read(bytes: &[u8]) -> Result<Dataset> {
        CsvTableReader::new().read("test.csv", "hash".to_string(), bytes)
    }

    #[test]
    fn test_basic_read() {
        let content = format!(
            "{HEADER}\n2023;SP; São Paulo ;F;10 a 14 anos;100;80;20;1000;0.1\n2023;RJ;Niterói;M;Até 1 ano;50;40;10;500;0.1\n"
        );
        let dataset = read(content.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.encoding, SourceEncoding::Utf8);
        let first = &dataset.records()[0];
        assert_eq!(first.period, Some(2023));
        assert_eq!(first.municipality, "São Paulo");
        assert_eq!(first.total, Some(100.0));
        assert_eq!(first.dental, Some(20.0));
    }

    #[test]
    fn test_coverage_columns_dropped() {
        let content = format!("{HEADER}\n2023;SP;Santos;F;5 a 9 anos;1;1;0;10;0.1\n");
        let dataset = read(content.as_bytes()).unwrap();

        assert_eq!(dataset.columns().len(), 8);
        assert!(!dataset.has(Column::MetroRegion));
        assert!(dataset.has(Column::Dental));
    }

    #[test]
    fn test_unparseable_cells_become_absent() {
        let content = format!("{HEADER}\nxx;SP;Santos;F;5 a 9 anos;abc;;-3;10;0.1\n");
        let dataset = read(content.as_bytes()).unwrap();

        let record = &dataset.records()[0];
        assert_eq!(record.period, None);
        assert_eq!(record.total, None);
        assert_eq!(record.medical, None);
        assert_eq!(record.dental, None);
    }

    #[test]
    fn test_latin1_fallback() {
        let mut bytes = b"SG_UF;NM_MUNICIPIO;BENEF_TOTAL\nSP;S".to_vec();
        bytes.push(0xE3); // 'ã' in Latin-1
        bytes.extend_from_slice(b"o Paulo;7\n");

        let dataset = read(&bytes).unwrap();
        assert_eq!(dataset.encoding, SourceEncoding::Latin1);
        assert_eq!(dataset.records()[0].municipality, "São Paulo");
    }

    #[test]
    fn test_non_utf8_source_settles_on_latin1() {
        // 0x80 is the euro sign in Windows-1252 and a control code in Latin-1
        let bytes = b"SG_UF;NM_MUNICIPIO;BENEF_TOTAL\nSP;Santos\x80;7\n";
        let dataset = read(bytes).unwrap();
        assert_eq!(dataset.encoding, SourceEncoding::Latin1);
        assert_eq!(dataset.records()[0].municipality, "Santos\u{80}");
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let content = "SG_UF;NM_MUNICIPIO;BENEF_TOTAL\nSP;Santos\n";
        let dataset = read(content.as_bytes()).unwrap();
        assert_eq!(dataset.records()[0].total, None);
    }

    #[test]
    fn test_long_rows_are_an_ingest_error() {
        let result = read(b"SG_UF;BENEF_TOTAL\nSP;10;99;junk\n");
        assert!(matches!(result, Err(Error::Ingest { .. })));
    }

    #[test]
    fn test_empty_source_is_an_ingest_error() {
        let result = read(b"");
        assert!(matches!(result, Err(Error::Ingest { .. })));
    }
}
