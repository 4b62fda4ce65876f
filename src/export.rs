use csv::WriterBuilder;
use serde::{Deserialize, Serialize};

use crate::coerce::format_count;
use crate::types::{Column, Dataset, Record, Result, DELIMITER, TABLE_COLUMNS};

/// Columns of the table projection that exist in the dataset
pub fn table_columns(dataset: &Dataset) -> Vec<Column> {
    TABLE_COLUMNS
        .into_iter()
        .filter(|c| dataset.has(*c))
        .collect()
}

/// Text of one cell as written to the table and the export
pub fn cell_text(record: &Record, column: Column) -> String {
    let count = |v: Option<f64>| v.map(format_count).unwrap_or_default();
    match column {
        Column::Period => record.period.map(|p| p.to_string()).unwrap_or_default(),
        Column::Region => record.region.clone(),
        Column::Municipality => record.municipality.clone(),
        Column::MetroRegion => record.metro_region.clone(),
        Column::Sex => record.sex.clone(),
        Column::AgeBand => record.age_band.clone(),
        Column::Total => count(record.total),
        Column::Medical => count(record.medical),
        Column::Dental => count(record.dental),
    }
}

/// The first rows of the filtered table, ready for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Row count of the full (uncapped) filtered table
    pub total_rows: usize,
}

/// Project the view onto `columns` and keep at most `cap` rows
pub fn preview(view: &[&Record], columns: &[Column], cap: usize) -> TablePreview {
    TablePreview {
        columns: columns.iter().map(|c| c.header().to_string()).collect(),
        rows: view
            .iter()
            .take(cap)
            .map(|r| columns.iter().map(|&c| cell_text(r, c)).collect())
            .collect(),
        total_rows: view.len(),
    }
}

/// Encode the whole view as `;`-delimited UTF-8 text with a header row
pub fn to_csv_bytes(view: &[&Record], columns: &[Column]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|c| c.header()))?;
    for record in view {
        writer.write_record(columns.iter().map(|&c| cell_text(record, c)))?;
    }

    writer
        .into_inner()
        .map_err(|e| std::io::Error::new(e.error().kind(), e.to_string()).into())
}
