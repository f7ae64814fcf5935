use coltviz::data::{file_sha256, load_table, Column, LoadOptions};
use coltviz::error::LoadError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &[&str] = &[
    "TripYear",
    "LeaderCountryOrIGO",
    "LeaderFullName",
    "CountryVisited",
    "TripDuration",
    "RegionVisited",
    "LeaderRegion",
];

fn write_csv(path: &Path, header: &[&str], rows: &[&str]) {
    let mut out = String::new();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    fs::write(path, out).unwrap();
}

#[test]
fn loads_rows_and_coerces_placeholder_durations() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("colt.csv");
    write_csv(
        &path,
        HEADER,
        &[
            "2020,A,Leader One,B,5,Europe,Asia",
            "2020,A,Leader One,C,TBD,Europe,Asia",
            "2021.0,A,Leader Two,B,10,Europe,Asia",
        ],
    );
    let table = load_table(&path, &LoadOptions::default()).unwrap();
    assert_eq!(table.len(), 3);
    let durations: Vec<Option<f64>> = table.records().iter().map(|r| r.trip_duration).collect();
    assert_eq!(durations, vec![Some(5.0), None, Some(10.0)]);
    assert_eq!(table.records()[2].trip_year, Some(2021));
    assert_eq!(table.year_span(), Some((2020, 2021)));

    let manifest = table.manifest();
    assert_eq!(manifest.row_count, 3);
    assert_eq!(manifest.placeholder_durations, 1);
    assert!(manifest.missing_columns.is_empty());
    assert_eq!(manifest.hash_sha256, file_sha256(&path).unwrap());
}

#[test]
fn decodes_latin1_bytes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("latin1.csv");
    let mut bytes = b"TripYear,LeaderCountryOrIGO,CountryVisited\n1999,".to_vec();
    // "Côte d'Ivoire" with a single-byte ô.
    bytes.extend_from_slice(b"C\xf4te d'Ivoire,France\n");
    fs::write(&path, bytes).unwrap();

    let table = load_table(&path, &LoadOptions::default()).unwrap();
    assert_eq!(
        table.records()[0].leader_country.as_deref(),
        Some("C\u{f4}te d'Ivoire")
    );
    assert_eq!(table.manifest().encoding, "windows-1252");
}

#[test]
fn missing_columns_are_recorded_not_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.csv");
    write_csv(&path, &["TripYear", "CountryVisited"], &["2001,Japan", "2002,Japan"]);

    let table = load_table(&path, &LoadOptions::default()).unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.has_column(Column::CountryVisited));
    assert!(!table.has_column(Column::LeaderFullName));
    assert!(table.require(Column::TripDuration).is_err());
    assert!(table
        .manifest()
        .missing_columns
        .contains(&"RegionVisited".to_string()));
    assert!(table
        .manifest()
        .warnings
        .iter()
        .any(|w| w == "missing_column: LeaderRegion"));
}

#[test]
fn custom_delimiter_and_placeholder() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tabbed.tsv");
    fs::write(&path, "TripYear\tCountryVisited\tTripDuration\n2010\tPeru\t-\n2011\tPeru\t3\n").unwrap();
    let opts = LoadOptions {
        encoding: "utf-8".to_string(),
        delimiter: b'\t',
        placeholder: "-".to_string(),
    };
    let table = load_table(&path, &opts).unwrap();
    assert_eq!(table.records()[0].trip_duration, None);
    assert_eq!(table.records()[1].trip_duration, Some(3.0));
    assert_eq!(table.manifest().placeholder_durations, 1);
}

#[test]
fn missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = load_table(&dir.path().join("absent.csv"), &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, LoadError::NotFound(_)));
}

#[test]
fn unknown_encoding_label_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("colt.csv");
    write_csv(&path, HEADER, &["2020,A,L,B,5,R,R"]);
    let opts = LoadOptions {
        encoding: "klingon-8".to_string(),
        ..LoadOptions::default()
    };
    let err = load_table(&path, &opts).unwrap_err();
    assert!(matches!(err, LoadError::UnknownEncoding(label) if label == "klingon-8"));
}
