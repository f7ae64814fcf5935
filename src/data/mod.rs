//! Dataset loading for the COLT travel table.
//!
//! Reads the raw delimited file once, decodes it with the configured text
//! encoding, and produces an immutable [`TravelTable`]. `TripDuration` cells
//! holding the placeholder token become missing values, never zero.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ArtifactError, LoadError};

pub const DEFAULT_PLACEHOLDER: &str = "TBD";
pub const DEFAULT_ENCODING: &str = "latin1";

/// Columns the aggregations read. Any other header is carried but ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    TripYear,
    CountryVisited,
    LeaderCountryOrIGO,
    LeaderFullName,
    TripDuration,
    RegionVisited,
    LeaderRegion,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::TripYear,
        Column::CountryVisited,
        Column::LeaderCountryOrIGO,
        Column::LeaderFullName,
        Column::TripDuration,
        Column::RegionVisited,
        Column::LeaderRegion,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Column::TripYear => "TripYear",
            Column::CountryVisited => "CountryVisited",
            Column::LeaderCountryOrIGO => "LeaderCountryOrIGO",
            Column::LeaderFullName => "LeaderFullName",
            Column::TripDuration => "TripDuration",
            Column::RegionVisited => "RegionVisited",
            Column::LeaderRegion => "LeaderRegion",
        }
    }

    /// Whether the column holds free-text categories.
    pub fn is_categorical(&self) -> bool {
        !matches!(self, Column::TripYear | Column::TripDuration)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One diplomatic trip. Every field is optional: blank cells are missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TravelRecord {
    pub trip_year: Option<i32>,
    pub country_visited: Option<String>,
    pub leader_country: Option<String>,
    pub leader_full_name: Option<String>,
    /// Days; `None` for blank, placeholder or unparseable cells.
    pub trip_duration: Option<f64>,
    pub region_visited: Option<String>,
    pub leader_region: Option<String>,
}

impl TravelRecord {
    /// Categorical value of `column`, `None` when missing or not categorical.
    pub fn text(&self, column: Column) -> Option<&str> {
        match column {
            Column::CountryVisited => self.country_visited.as_deref(),
            Column::LeaderCountryOrIGO => self.leader_country.as_deref(),
            Column::LeaderFullName => self.leader_full_name.as_deref(),
            Column::RegionVisited => self.region_visited.as_deref(),
            Column::LeaderRegion => self.leader_region.as_deref(),
            Column::TripYear | Column::TripDuration => None,
        }
    }
}

/// Outcome of coercing one `TripDuration` cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationCell {
    Value(f64),
    Placeholder,
    Unparseable,
    Blank,
}

impl DurationCell {
    pub fn parse(raw: &str, placeholder: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return DurationCell::Blank;
        }
        if trimmed == placeholder {
            return DurationCell::Placeholder;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => DurationCell::Value(v),
            _ => DurationCell::Unparseable,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            DurationCell::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Coerce a column of raw duration cells into numbers with missing markers.
pub fn coerce_durations<S: AsRef<str>>(cells: &[S], placeholder: &str) -> Vec<Option<f64>> {
    cells
        .iter()
        .map(|c| DurationCell::parse(c.as_ref(), placeholder).value())
        .collect()
}

fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if let Ok(y) = trimmed.parse::<i32>() {
        return Some(y);
    }
    // Exports sometimes write integral floats ("2020.0").
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.fract() == 0.0)
        .filter(|v| (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(v))
        .map(|v| v as i32)
}

fn non_blank(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Options controlling how the raw file is read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// WHATWG encoding label, e.g. `latin1` or `utf-8`.
    pub encoding: String,
    pub delimiter: u8,
    pub placeholder: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encoding: DEFAULT_ENCODING.to_string(),
            delimiter: b',',
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Provenance and quality summary produced while loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub path: String,
    pub hash_sha256: String,
    pub encoding: String,
    pub row_count: u64,
    pub columns: Vec<String>,
    /// Expected columns absent from the header.
    pub missing_columns: Vec<String>,
    pub placeholder_durations: u64,
    pub unparseable_durations: u64,
    pub warnings: Vec<String>,
}

/// The immutable in-memory table every aggregation reads.
#[derive(Debug, Clone)]
pub struct TravelTable {
    records: Vec<TravelRecord>,
    present: Vec<Column>,
    manifest: DatasetManifest,
}

impl TravelTable {
    /// Build a table directly from records, with every column present.
    pub fn from_records(records: Vec<TravelRecord>) -> Self {
        Self::with_columns(records, &Column::ALL)
    }

    /// Build a table from records, declaring which columns the header had.
    pub fn with_columns(records: Vec<TravelRecord>, present: &[Column]) -> Self {
        let manifest = DatasetManifest {
            path: "<memory>".to_string(),
            row_count: records.len() as u64,
            columns: present.iter().map(|c| c.header().to_string()).collect(),
            missing_columns: Column::ALL
                .iter()
                .filter(|c| !present.contains(c))
                .map(|c| c.header().to_string())
                .collect(),
            ..DatasetManifest::default()
        };
        Self {
            records,
            present: present.to_vec(),
            manifest,
        }
    }

    pub fn records(&self) -> &[TravelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn manifest(&self) -> &DatasetManifest {
        &self.manifest
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.present.contains(&column)
    }

    pub fn require(&self, column: Column) -> Result<(), ArtifactError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(ArtifactError::MissingColumn(column))
        }
    }

    pub fn require_all(&self, columns: &[Column]) -> Result<(), ArtifactError> {
        columns.iter().try_for_each(|c| self.require(*c))
    }

    /// Inclusive span of trip years, if any row carries a year.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let mut years = self.records.iter().filter_map(|r| r.trip_year);
        let first = years.next()?;
        Some(years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y))))
    }
}

/// Load the travel table. Any failure here is fatal for the run.
pub fn load_table(path: &Path, opts: &LoadOptions) -> Result<TravelTable, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let encoding = Encoding::for_label(opts.encoding.as_bytes())
        .ok_or_else(|| LoadError::UnknownEncoding(opts.encoding.clone()))?;
    let (text, _, had_errors) = encoding.decode(&bytes);

    let mut warnings = Vec::new();
    if had_errors {
        warnings.push(format!(
            "malformed byte sequences replaced while decoding as {}",
            encoding.name()
        ));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());
    let header: Vec<String> = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(LoadError::MissingHeader(path.to_path_buf()));
    }

    let index_of = |col: Column| header.iter().position(|h| h == col.header());
    let idx: Vec<(Column, Option<usize>)> = Column::ALL.iter().map(|c| (*c, index_of(*c))).collect();
    let present: Vec<Column> = idx.iter().filter(|(_, i)| i.is_some()).map(|(c, _)| *c).collect();
    let missing_columns: Vec<String> = idx
        .iter()
        .filter(|(_, i)| i.is_none())
        .map(|(c, _)| c.header().to_string())
        .collect();
    for name in &missing_columns {
        warnings.push(format!("missing_column: {}", name));
    }

    let position = |col: Column| idx.iter().find(|(c, _)| *c == col).and_then(|(_, i)| *i);
    let year_idx = position(Column::TripYear);
    let visited_idx = position(Column::CountryVisited);
    let leader_country_idx = position(Column::LeaderCountryOrIGO);
    let leader_name_idx = position(Column::LeaderFullName);
    let duration_idx = position(Column::TripDuration);
    let region_visited_idx = position(Column::RegionVisited);
    let leader_region_idx = position(Column::LeaderRegion);

    let mut records = Vec::new();
    let mut placeholder_durations = 0u64;
    let mut unparseable_durations = 0u64;

    for result in reader.records() {
        let row = result.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let cell = |i: Option<usize>| i.and_then(|i| row.get(i));

        let duration = match cell(duration_idx) {
            Some(raw) => DurationCell::parse(raw, &opts.placeholder),
            None => DurationCell::Blank,
        };
        match duration {
            DurationCell::Placeholder => placeholder_durations += 1,
            DurationCell::Unparseable => unparseable_durations += 1,
            _ => {}
        }

        records.push(TravelRecord {
            trip_year: cell(year_idx).and_then(parse_year),
            country_visited: cell(visited_idx).and_then(non_blank),
            leader_country: cell(leader_country_idx).and_then(non_blank),
            leader_full_name: cell(leader_name_idx).and_then(non_blank),
            trip_duration: duration.value(),
            region_visited: cell(region_visited_idx).and_then(non_blank),
            leader_region: cell(leader_region_idx).and_then(non_blank),
        });
    }

    let manifest = DatasetManifest {
        path: path.display().to_string(),
        hash_sha256: sha256_hex(&bytes),
        encoding: encoding.name().to_string(),
        row_count: records.len() as u64,
        columns: header,
        missing_columns,
        placeholder_durations,
        unparseable_durations,
        warnings,
    };

    Ok(TravelTable {
        records,
        present,
        manifest,
    })
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn file_sha256(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
