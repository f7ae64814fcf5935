//! Read-only aggregations over the travel table.
//!
//! Every function borrows the table and returns a freshly built summary.
//! Absent keys count as zero, never as errors. Descending rankings break
//! ties by first occurrence in the table so output order is deterministic.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use serde::Serialize;

use crate::data::{Column, TravelRecord, TravelTable};
use crate::error::ArtifactError;

/// Row count for one distinct categorical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Row count for one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

/// Split a series into parallel x/y vectors for plotting.
pub fn unzip_series(points: &[YearCount]) -> (Vec<i32>, Vec<usize>) {
    points.iter().map(|p| (p.year, p.count)).unzip()
}

/// Count items, keeping first-occurrence order, then stable-sort descending.
fn rank_by_count<K: Clone + Eq + Hash>(items: impl IntoIterator<Item = K>) -> Vec<(K, usize)> {
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();
    for key in items {
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

// =============================================================================
// Frequency by category / time
// =============================================================================

/// Rows per distinct value of `column`, highest count first.
pub fn value_counts(table: &TravelTable, column: Column) -> Result<Vec<ValueCount>, ArtifactError> {
    table.require(column)?;
    Ok(rank_by_count(table.records().iter().filter_map(|r| r.text(column)))
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
        })
        .collect())
}

/// The `k` most frequent values of `column`.
pub fn top_k(table: &TravelTable, column: Column, k: usize) -> Result<Vec<ValueCount>, ArtifactError> {
    let mut counts = value_counts(table, column)?;
    counts.truncate(k);
    Ok(counts)
}

/// Values of the `k` most frequent entries, in rank order.
pub fn top_k_values(table: &TravelTable, column: Column, k: usize) -> Result<Vec<String>, ArtifactError> {
    Ok(top_k(table, column, k)?.into_iter().map(|v| v.value).collect())
}

/// Yearly row counts over the rows `keep` accepts, ascending by year.
///
/// Only years with at least one accepted row appear.
pub fn series_where<F>(table: &TravelTable, mut keep: F) -> Vec<YearCount>
where
    F: FnMut(&TravelRecord) -> bool,
{
    let mut by_year: BTreeMap<i32, usize> = BTreeMap::new();
    for record in table.records() {
        if let Some(year) = record.trip_year {
            if keep(record) {
                *by_year.entry(year).or_insert(0) += 1;
            }
        }
    }
    by_year
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect()
}

/// Trips per year: a time series, sorted by year rather than by count.
pub fn frequency_by_time(table: &TravelTable) -> Result<Vec<YearCount>, ArtifactError> {
    table.require(Column::TripYear)?;
    Ok(series_where(table, |_| true))
}

/// Trips per year for rows whose `column` equals `value`.
pub fn series_for_value(
    table: &TravelTable,
    column: Column,
    value: &str,
) -> Result<Vec<YearCount>, ArtifactError> {
    table.require_all(&[Column::TripYear, column])?;
    Ok(series_where(table, |r| r.text(column) == Some(value)))
}

/// Distinct non-missing values of `column`, sorted ascending.
pub fn distinct_sorted(table: &TravelTable, column: Column) -> Result<Vec<String>, ArtifactError> {
    table.require(column)?;
    let set: BTreeSet<&str> = table.records().iter().filter_map(|r| r.text(column)).collect();
    Ok(set.into_iter().map(str::to_string).collect())
}

// =============================================================================
// Crosstab
// =============================================================================

/// Dense count matrix over two categorical columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crosstab {
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    /// `cells[r][c]`, zero where the combination never occurs.
    pub cells: Vec<Vec<usize>>,
}

impl Crosstab {
    pub fn get(&self, row: &str, col: &str) -> usize {
        let r = self.row_labels.iter().position(|l| l == row);
        let c = self.col_labels.iter().position(|l| l == col);
        match (r, c) {
            (Some(r), Some(c)) => self.cells[r][c],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.cells.iter().flatten().sum()
    }

    pub fn max_cell(&self) -> usize {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Count rows per (`rows`, `cols`) value pair. Labels are sorted ascending.
pub fn crosstab(table: &TravelTable, rows: Column, cols: Column) -> Result<Crosstab, ArtifactError> {
    table.require_all(&[rows, cols])?;
    let pairs: Vec<(&str, &str)> = table
        .records()
        .iter()
        .filter_map(|r| Some((r.text(rows)?, r.text(cols)?)))
        .collect();

    let row_labels: Vec<String> = pairs
        .iter()
        .map(|(r, _)| *r)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let col_labels: Vec<String> = pairs
        .iter()
        .map(|(_, c)| *c)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let row_index: HashMap<&str, usize> = row_labels.iter().enumerate().map(|(i, l)| (l.as_str(), i)).collect();
    let col_index: HashMap<&str, usize> = col_labels.iter().enumerate().map(|(i, l)| (l.as_str(), i)).collect();

    let mut cells = vec![vec![0usize; col_labels.len()]; row_labels.len()];
    for (r, c) in &pairs {
        cells[row_index[r]][col_index[c]] += 1;
    }

    Ok(Crosstab {
        row_labels,
        col_labels,
        cells,
    })
}

// =============================================================================
// Distinct values per group
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupDistinct {
    pub group: String,
    pub distinct: usize,
}

/// For each value of `group`, how many distinct `value`s occur with it.
/// Most diverse groups first.
pub fn nunique_per_group(
    table: &TravelTable,
    group: Column,
    value: Column,
) -> Result<Vec<GroupDistinct>, ArtifactError> {
    table.require_all(&[group, value])?;
    let mut order: Vec<&str> = Vec::new();
    let mut sets: HashMap<&str, HashSet<&str>> = HashMap::new();
    for record in table.records() {
        let Some(g) = record.text(group) else { continue };
        let set = sets.entry(g).or_insert_with(|| {
            order.push(g);
            HashSet::new()
        });
        if let Some(v) = record.text(value) {
            set.insert(v);
        }
    }
    let mut out: Vec<GroupDistinct> = order
        .into_iter()
        .map(|g| GroupDistinct {
            group: g.to_string(),
            distinct: sets.get(g).map(HashSet::len).unwrap_or(0),
        })
        .collect();
    out.sort_by(|a, b| b.distinct.cmp(&a.distinct));
    Ok(out)
}

// =============================================================================
// Per-year, per-origin composite metrics
// =============================================================================

/// Activity of one origin in one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearOriginMetrics {
    pub year: i32,
    pub origin: String,
    pub total_trips: usize,
    pub unique_destinations: usize,
    pub destinations_per_trip: f64,
    /// Mean of the observed durations; `None` when every duration is missing.
    pub avg_duration: Option<f64>,
}

/// Unique destinations divided by trips, defined as 0 for zero trips.
pub fn destinations_per_trip(unique_destinations: usize, total_trips: usize) -> f64 {
    if total_trips == 0 {
        0.0
    } else {
        unique_destinations as f64 / total_trips as f64
    }
}

#[derive(Default)]
struct OriginYearAcc<'a> {
    trips: usize,
    destinations: HashSet<&'a str>,
    durations: Vec<f64>,
}

/// Composite metrics for every (year, origin) present, year ascending and
/// origins in first-occurrence order within a year.
pub fn year_origin_metrics(table: &TravelTable) -> Result<Vec<YearOriginMetrics>, ArtifactError> {
    table.require_all(&[
        Column::TripYear,
        Column::LeaderCountryOrIGO,
        Column::CountryVisited,
        Column::TripDuration,
    ])?;

    let mut years: BTreeMap<i32, (Vec<&str>, HashMap<&str, OriginYearAcc>)> = BTreeMap::new();
    for record in table.records() {
        let (Some(year), Some(origin)) = (record.trip_year, record.leader_country.as_deref()) else {
            continue;
        };
        let (order, accs) = years.entry(year).or_default();
        let acc = accs.entry(origin).or_insert_with(|| {
            order.push(origin);
            OriginYearAcc::default()
        });
        acc.trips += 1;
        if let Some(dest) = record.country_visited.as_deref() {
            acc.destinations.insert(dest);
        }
        if let Some(d) = record.trip_duration {
            acc.durations.push(d);
        }
    }

    let mut out = Vec::new();
    for (year, (order, accs)) in years {
        for origin in order {
            let Some(acc) = accs.get(origin) else { continue };
            let unique = acc.destinations.len();
            out.push(YearOriginMetrics {
                year,
                origin: origin.to_string(),
                total_trips: acc.trips,
                unique_destinations: unique,
                destinations_per_trip: destinations_per_trip(unique, acc.trips),
                avg_duration: mean(&acc.durations),
            });
        }
    }
    Ok(out)
}

/// The `k` origins with the largest summed yearly unique-destination counts.
pub fn top_origins_by_summed_diversity(metrics: &[YearOriginMetrics], k: usize) -> Vec<String> {
    let mut order: Vec<&str> = Vec::new();
    let mut sums: HashMap<&str, usize> = HashMap::new();
    for m in metrics {
        let sum = sums.entry(m.origin.as_str()).or_insert_with(|| {
            order.push(m.origin.as_str());
            0
        });
        *sum += m.unique_destinations;
    }
    let mut ranked: Vec<(&str, usize)> = order.into_iter().map(|o| (o, sums[o])).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(k).map(|(o, _)| o.to_string()).collect()
}

// =============================================================================
// Duration statistics
// =============================================================================

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Observed (non-missing) trip durations in table order.
pub fn observed_durations(table: &TravelTable) -> Result<Vec<f64>, ArtifactError> {
    table.require(Column::TripDuration)?;
    Ok(table.records().iter().filter_map(|r| r.trip_duration).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub observed: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub fn duration_stats(table: &TravelTable) -> Result<DurationStats, ArtifactError> {
    let values = observed_durations(table)?;
    Ok(DurationStats {
        observed: values.len(),
        missing: table.len() - values.len(),
        mean: mean(&values),
        median: median(&values),
        min: values.iter().copied().reduce(f64::min),
        max: values.iter().copied().reduce(f64::max),
    })
}

/// Equal-width histogram. `edges` has one more entry than `counts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [a, b, ..] => b - a,
            _ => 0.0,
        }
    }
}

/// Bin `values` into `bins` equal-width bins over `[min, max]`; the last bin
/// is closed. `None` for no values or zero bins.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if values.is_empty() || bins == 0 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let edges = (0..=bins).map(|i| lo + i as f64 * width).collect();
    Some(Histogram { edges, counts })
}

/// Gaussian kernel density with Scott's bandwidth, evaluated at `grid`.
/// `None` when the sample has fewer than two points or no spread.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Option<Vec<f64>> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = var.sqrt();
    if std <= 0.0 || !std.is_finite() {
        return None;
    }
    let bw = std * (n as f64).powf(-0.2);
    let norm = n as f64 * bw * (2.0 * std::f64::consts::PI).sqrt();
    Some(
        grid.iter()
            .map(|x| {
                values
                    .iter()
                    .map(|v| (-0.5 * ((x - v) / bw).powi(2)).exp())
                    .sum::<f64>()
                    / norm
            })
            .collect(),
    )
}

// =============================================================================
// Leader identities
// =============================================================================

/// A leader keyed by name and origin. Two leaders sharing both collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LeaderIdentity {
    pub name: String,
    pub country: String,
}

impl LeaderIdentity {
    fn of(record: &TravelRecord) -> Option<LeaderIdentity> {
        Some(LeaderIdentity {
            name: record.leader_full_name.clone()?,
            country: record.leader_country.clone()?,
        })
    }

    fn matches(&self, record: &TravelRecord) -> bool {
        record.leader_full_name.as_deref() == Some(self.name.as_str())
            && record.leader_country.as_deref() == Some(self.country.as_str())
    }
}

impl fmt::Display for LeaderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderCount {
    pub leader: LeaderIdentity,
    pub count: usize,
}

/// The `k` leaders with the most trips.
pub fn top_leaders(table: &TravelTable, k: usize) -> Result<Vec<LeaderCount>, ArtifactError> {
    table.require_all(&[Column::LeaderFullName, Column::LeaderCountryOrIGO])?;
    Ok(rank_by_count(table.records().iter().filter_map(LeaderIdentity::of))
        .into_iter()
        .take(k)
        .map(|(leader, count)| LeaderCount { leader, count })
        .collect())
}

pub fn leader_series(table: &TravelTable, leader: &LeaderIdentity) -> Result<Vec<YearCount>, ArtifactError> {
    table.require_all(&[Column::TripYear, Column::LeaderFullName, Column::LeaderCountryOrIGO])?;
    Ok(series_where(table, |r| leader.matches(r)))
}

// =============================================================================
// Dyads
// =============================================================================

/// Ordered (origin, destination) pair. Never domestic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DyadKey {
    pub origin: String,
    pub destination: String,
}

impl DyadKey {
    /// `None` when origin and destination are the same country.
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Option<Self> {
        let origin = origin.into();
        let destination = destination.into();
        if origin == destination {
            None
        } else {
            Some(Self { origin, destination })
        }
    }
}

impl fmt::Display for DyadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.origin, self.destination)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DyadSeries {
    pub key: DyadKey,
    pub points: Vec<YearCount>,
}

/// Yearly visits from `key.origin` to `key.destination`; empty means no data.
pub fn dyad_series(table: &TravelTable, key: &DyadKey) -> Result<Vec<YearCount>, ArtifactError> {
    table.require_all(&[Column::TripYear, Column::LeaderCountryOrIGO, Column::CountryVisited])?;
    Ok(series_where(table, |r| {
        r.leader_country.as_deref() == Some(key.origin.as_str())
            && r.country_visited.as_deref() == Some(key.destination.as_str())
    }))
}

/// Precompute series for the cross product of `origins` × `destinations`,
/// skipping same-country pairs and pairs without any trips.
pub fn dyad_sample(
    table: &TravelTable,
    origins: &[String],
    destinations: &[String],
) -> Result<Vec<DyadSeries>, ArtifactError> {
    let mut out = Vec::new();
    for origin in origins {
        for destination in destinations {
            let Some(key) = DyadKey::new(origin.as_str(), destination.as_str()) else {
                continue;
            };
            let points = dyad_series(table, &key)?;
            if !points.is_empty() {
                out.push(DyadSeries { key, points });
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(year: i32, origin: &str, dest: &str) -> TravelRecord {
        TravelRecord {
            trip_year: Some(year),
            leader_country: Some(origin.to_string()),
            country_visited: Some(dest.to_string()),
            ..TravelRecord::default()
        }
    }

    fn scenario() -> TravelTable {
        TravelTable::from_records(vec![
            trip(2020, "A", "B"),
            trip(2020, "A", "C"),
            trip(2021, "A", "B"),
        ])
    }

    #[test]
    fn end_to_end_scenario() {
        let t = scenario();
        assert_eq!(
            frequency_by_time(&t).unwrap(),
            vec![YearCount { year: 2020, count: 2 }, YearCount { year: 2021, count: 1 }]
        );
        let diversity = nunique_per_group(&t, Column::LeaderCountryOrIGO, Column::CountryVisited).unwrap();
        assert_eq!(diversity, vec![GroupDistinct { group: "A".into(), distinct: 2 }]);

        let ab = DyadKey::new("A", "B").unwrap();
        assert_eq!(
            dyad_series(&t, &ab).unwrap(),
            vec![YearCount { year: 2020, count: 1 }, YearCount { year: 2021, count: 1 }]
        );
        let ad = DyadKey::new("A", "D").unwrap();
        assert!(dyad_series(&t, &ad).unwrap().is_empty());
    }

    #[test]
    fn ties_break_by_first_occurrence() {
        let t = TravelTable::from_records(vec![
            trip(2000, "X", "Peru"),
            trip(2000, "X", "Chile"),
            trip(2000, "X", "Chile"),
            trip(2000, "X", "Peru"),
            trip(2000, "X", "Bolivia"),
            trip(2000, "X", "Bolivia"),
            trip(2000, "X", "Aruba"),
        ]);
        let counts = value_counts(&t, Column::CountryVisited).unwrap();
        let order: Vec<&str> = counts.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(order, vec!["Peru", "Chile", "Bolivia", "Aruba"]);
    }

    #[test]
    fn top_k_length_order_and_sum() {
        let t = TravelTable::from_records(vec![
            trip(2000, "X", "A"),
            trip(2000, "X", "B"),
            trip(2000, "X", "B"),
            trip(2000, "X", "C"),
            trip(2000, "X", "C"),
            trip(2000, "X", "C"),
        ]);
        for k in 0..5 {
            let top = top_k(&t, Column::CountryVisited, k).unwrap();
            assert_eq!(top.len(), k.min(3));
            assert!(top.windows(2).all(|w| w[0].count > w[1].count));
            assert!(top.iter().map(|v| v.count).sum::<usize>() <= t.len());
        }
    }

    #[test]
    fn missing_categories_are_not_counted() {
        let mut r = trip(2000, "X", "A");
        r.country_visited = None;
        let t = TravelTable::from_records(vec![r, trip(2000, "X", "A")]);
        let counts = value_counts(&t, Column::CountryVisited).unwrap();
        assert_eq!(counts, vec![ValueCount { value: "A".into(), count: 1 }]);
    }

    #[test]
    fn time_series_sums_to_rows_with_year() {
        let t = TravelTable::from_records(vec![
            trip(2003, "X", "A"),
            trip(1999, "X", "A"),
            trip(2003, "X", "B"),
            trip(2001, "X", "C"),
        ]);
        let series = frequency_by_time(&t).unwrap();
        assert!(series.windows(2).all(|w| w[0].year < w[1].year));
        assert_eq!(series.iter().map(|p| p.count).sum::<usize>(), t.len());
    }

    #[test]
    fn crosstab_is_dense_and_zero_filled() {
        let region = |lr: &str, rv: Option<&str>| TravelRecord {
            leader_region: Some(lr.into()),
            region_visited: rv.map(str::to_string),
            ..TravelRecord::default()
        };
        let t = TravelTable::from_records(vec![
            region("Europe", Some("Asia")),
            region("Europe", Some("Asia")),
            region("Africa", Some("Europe")),
            region("Africa", None),
        ]);
        let ct = crosstab(&t, Column::LeaderRegion, Column::RegionVisited).unwrap();
        assert_eq!(ct.row_labels, vec!["Africa", "Europe"]);
        assert_eq!(ct.col_labels, vec!["Asia", "Europe"]);
        assert_eq!(ct.get("Europe", "Asia"), 2);
        assert_eq!(ct.get("Africa", "Asia"), 0);
        assert_eq!(ct.get("Oceania", "Asia"), 0);
        assert_eq!(ct.total(), 3);
        assert_eq!(ct.max_cell(), 2);
    }

    #[test]
    fn missing_column_is_an_artifact_error() {
        let t = TravelTable::with_columns(vec![trip(2000, "X", "A")], &[Column::TripYear]);
        assert!(matches!(
            crosstab(&t, Column::LeaderRegion, Column::RegionVisited),
            Err(ArtifactError::MissingColumn(Column::LeaderRegion))
        ));
    }

    #[test]
    fn ratio_never_divides_by_zero() {
        assert_eq!(destinations_per_trip(0, 0), 0.0);
        assert_eq!(destinations_per_trip(3, 4), 0.75);
    }

    #[test]
    fn composite_metrics_keep_undefined_average() {
        let mut a = trip(2020, "A", "B");
        a.trip_duration = Some(4.0);
        let mut b = trip(2020, "A", "B");
        b.trip_duration = Some(2.0);
        let c = trip(2020, "Z", "B");
        let t = TravelTable::from_records(vec![a, c, b]);

        let m = year_origin_metrics(&t).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m[0].origin, "A");
        assert_eq!(m[0].total_trips, 2);
        assert_eq!(m[0].unique_destinations, 1);
        assert_eq!(m[0].destinations_per_trip, 0.5);
        assert_eq!(m[0].avg_duration, Some(3.0));
        assert_eq!(m[1].origin, "Z");
        assert_eq!(m[1].avg_duration, None);
        for row in &m {
            assert!(row.destinations_per_trip > 0.0 && row.destinations_per_trip <= 1.0);
        }
    }

    #[test]
    fn summed_diversity_ranking() {
        let t = TravelTable::from_records(vec![
            trip(2020, "A", "B"),
            trip(2020, "Q", "B"),
            trip(2020, "Q", "C"),
            trip(2021, "A", "C"),
            trip(2021, "A", "D"),
        ]);
        let metrics = year_origin_metrics(&t).unwrap();
        assert_eq!(top_origins_by_summed_diversity(&metrics, 5), vec!["A", "Q"]);
        assert_eq!(top_origins_by_summed_diversity(&metrics, 1), vec!["A"]);
    }

    #[test]
    fn mean_and_median_skip_missing() {
        let values: Vec<f64> = crate::data::coerce_durations(&["5", "TBD", "10"], "TBD")
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(mean(&values), Some(7.5));
        assert_eq!(median(&values), Some(7.5));
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn duration_stats_count_missing() {
        let mut a = trip(2020, "A", "B");
        a.trip_duration = Some(1.0);
        let b = trip(2020, "A", "B");
        let stats = duration_stats(&TravelTable::from_records(vec![a, b])).unwrap();
        assert_eq!(stats.observed, 1);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(1.0));
    }

    #[test]
    fn histogram_closes_last_bin() {
        let h = histogram(&[0.0, 1.0, 2.0, 10.0], 5).unwrap();
        assert_eq!(h.counts.len(), 5);
        assert_eq!(h.edges.len(), 6);
        assert_eq!(h.counts.iter().sum::<usize>(), 4);
        assert_eq!(h.counts[4], 1);
        assert_eq!(h.bin_width(), 2.0);

        let single = histogram(&[3.0, 3.0], 30).unwrap();
        assert_eq!(single.counts.iter().sum::<usize>(), 2);
        assert!(histogram(&[], 30).is_none());
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let values = [1.0, 2.0, 2.0, 3.0, 7.0];
        let grid: Vec<f64> = (0..3500).map(|i| -15.0 + i as f64 * 0.01).collect();
        let density = gaussian_kde(&values, &grid).unwrap();
        let area: f64 = density.iter().sum::<f64>() * 0.01;
        assert!((area - 1.0).abs() < 0.01, "area {}", area);
        assert!(gaussian_kde(&[1.0], &grid).is_none());
        assert!(gaussian_kde(&[2.0, 2.0], &grid).is_none());
    }

    #[test]
    fn leaders_are_keyed_by_name_and_country() {
        let leader = |name: &str, country: &str, year: i32| TravelRecord {
            trip_year: Some(year),
            leader_full_name: Some(name.into()),
            leader_country: Some(country.into()),
            ..TravelRecord::default()
        };
        let t = TravelTable::from_records(vec![
            leader("Kim", "North", 2000),
            leader("Kim", "South", 2000),
            leader("Kim", "South", 2001),
        ]);
        let top = top_leaders(&t, 15).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].leader.to_string(), "Kim (South)");
        assert_eq!(top[0].count, 2);
        let series = leader_series(&t, &top[0].leader).unwrap();
        assert_eq!(unzip_series(&series), (vec![2000, 2001], vec![1, 1]));
    }

    #[test]
    fn dyad_key_rejects_domestic_pairs() {
        assert!(DyadKey::new("France", "France").is_none());
        let key = DyadKey::new("France", "Chad").unwrap();
        assert_eq!(key.to_string(), "France → Chad");
    }

    #[test]
    fn dyad_sample_skips_equal_and_empty_pairs() {
        let t = TravelTable::from_records(vec![
            trip(2020, "A", "B"),
            trip(2020, "B", "A"),
            trip(2020, "A", "A"),
        ]);
        let names = vec!["A".to_string(), "B".to_string()];
        let sample = dyad_sample(&t, &names, &names).unwrap();
        let keys: Vec<String> = sample.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["A → B", "B → A"]);
    }

    #[test]
    fn distinct_values_sorted() {
        let t = scenario();
        assert_eq!(distinct_sorted(&t, Column::CountryVisited).unwrap(), vec!["B", "C"]);
    }
}
