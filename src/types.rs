use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Number of municipalities shown in the ranking view
pub const TOP_N_MUNICIPALITIES: usize = 20;

/// Maximum rows shown in the filtered table (the export is never capped)
pub const TABLE_DISPLAY_CAP: usize = 1000;

/// Directory searched for a source file when none is given
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default file name for the filtered export
pub const DEFAULT_EXPORT_NAME: &str = "dados_filtrados.csv";

/// Field delimiter of both the source and the export
pub const DELIMITER: u8 = b';';

/// Population and coverage-rate columns that are discarded on load
pub const DROPPED_COLUMNS: &[&str] = &[
    "POPULACAO",
    "TX_COBERT_ASSISTENCIA_MEDICA",
    "TX_COBERT_EXCLUSIVAMENTE_ODONTOLOGICO",
    "TX_COBERT_TOTAL",
];

/// Recognized source columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Period,
    Region,
    Municipality,
    MetroRegion,
    Sex,
    AgeBand,
    Total,
    Medical,
    Dental,
}

impl Column {
    pub const ALL: [Column; 9] = [
        Column::Period,
        Column::Region,
        Column::Municipality,
        Column::MetroRegion,
        Column::Sex,
        Column::AgeBand,
        Column::Total,
        Column::Medical,
        Column::Dental,
    ];

    /// Header name in the source file
    pub fn header(self) -> &'static str {
        match self {
            Column::Period => "PERIODO",
            Column::Region => "SG_UF",
            Column::Municipality => "NM_MUNICIPIO",
            Column::MetroRegion => "NM_RM",
            Column::Sex => "SEXO",
            Column::AgeBand => "FAIXA_ETARIA",
            Column::Total => "BENEF_TOTAL",
            Column::Medical => "BENEF_ASSISTENCIA_MEDICA",
            Column::Dental => "BENEF_EXCLUS_ODONTOLOGICO",
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        let header = header.trim();
        Self::ALL.into_iter().find(|c| c.header() == header)
    }
}

/// Column projection of the filtered table and its export
pub const TABLE_COLUMNS: [Column; 8] = [
    Column::Period,
    Column::Region,
    Column::Municipality,
    Column::Sex,
    Column::AgeBand,
    Column::Total,
    Column::Medical,
    Column::Dental,
];

/// One row of the source table after coercion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub period: Option<i64>,
    pub region: String,
    pub municipality: String,
    pub metro_region: String,
    pub sex: String,
    pub age_band: String,
    pub total: Option<f64>,
    pub medical: Option<f64>,
    pub dental: Option<f64>,
}

impl Record {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Total => self.total,
            Metric::Medical => self.medical,
            Metric::Dental => self.dental,
        }
    }

    pub fn category(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Region => &self.region,
            Dimension::Sex => &self.sex,
            Dimension::AgeBand => &self.age_band,
            Dimension::Municipality => &self.municipality,
        }
    }
}

/// The loaded table. Immutable once built; views borrow its records.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// File name (or upload name) the table was read from
    pub source_name: String,

    /// SHA-256 of the raw source bytes
    pub source_hash: String,

    /// Encoding the source was decoded with
    pub encoding: SourceEncoding,

    /// Recognized columns, in header order
    columns: Vec<Column>,

    records: Vec<Record>,
}

impl Dataset {
    pub fn new(
        source_name: String,
        source_hash: String,
        encoding: SourceEncoding,
        columns: Vec<Column>,
        records: Vec<Record>,
    ) -> Self {
        Self {
            source_name,
            source_hash,
            encoding,
            columns,
            records,
        }
    }

    pub fn has(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Borrowed view over every record
    pub fn view(&self) -> View<'_> {
        self.records().iter().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Metric columns present in the source
    pub fn metrics(&self) -> Vec<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|m| self.has(m.column()))
            .collect()
    }
}

/// A filtered selection of records borrowed from a [`Dataset`]
pub type View<'a> = Vec<&'a Record>;

/// Character encodings tried when decoding a source, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Latin1,
    Windows1252,
}

impl SourceEncoding {
    pub const FALLBACK_ORDER: [SourceEncoding; 3] = [
        SourceEncoding::Utf8,
        SourceEncoding::Latin1,
        SourceEncoding::Windows1252,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Latin1 => "latin-1",
            SourceEncoding::Windows1252 => "windows-1252",
        }
    }
}

/// Metric column feeding the aggregations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Total,
    Medical,
    Dental,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Total, Metric::Medical, Metric::Dental];

    pub fn column(self) -> Column {
        match self {
            Metric::Total => Column::Total,
            Metric::Medical => Column::Medical,
            Metric::Dental => Column::Dental,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Total => "Beneficiários (TOTAL)",
            Metric::Medical => "Assistência Médica",
            Metric::Dental => "Exclusivo Odontológico",
        }
    }
}

/// Display scale of an aggregated series
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    #[default]
    Count,
    Percent,
}

/// Categorical dimensions that can be filtered or grouped on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Region,
    Sex,
    AgeBand,
    Municipality,
}

/// Chosen values for one dimension.
///
/// `Selection::all()` leaves the dimension unconstrained. `Selection::only`
/// with an empty iterator also yields the unconstrained selection, so there is
/// no way to express "filter to nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selection(Option<BTreeSet<String>>);

impl Selection {
    pub fn all() -> Self {
        Self(None)
    }

    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if set.is_empty() {
            Self(None)
        } else {
            Self(Some(set))
        }
    }

    pub fn is_all(&self) -> bool {
        self.0.is_none()
    }

    pub fn allows(&self, value: &str) -> bool {
        match &self.0 {
            None => true,
            Some(set) => set.contains(value),
        }
    }
}

/// Selections for every filterable dimension
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSelection {
    pub region: Selection,
    pub sex: Selection,
    pub age_band: Selection,
    pub municipality: Selection,
}

/// Everything the presentation layer chooses
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ViewParams {
    pub filters: FilterSelection,
    pub metric: Metric,
    pub scale: Scale,
}

/// One entry of an aggregated or scaled series.
///
/// `value` is `None` when the group holds no present values, or when a
/// percentage could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(label: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

pub type Series = Vec<SeriesPoint>;

/// Result type for the application
pub type Result<T> = std::result::Result<T, crate::error::Error>;
