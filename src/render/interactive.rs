//! The four interactive documents.
//!
//! Figures are assembled with `plotly` and embedded as JSON next to whatever
//! page data the client-side controls need. Nothing is fetched after load
//! except plotly.js itself.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use plotly::common::{Line, Mode, Title, Visible};
use plotly::layout::{Axis, HoverMode, Layout};
use plotly::{Plot, Scatter};
use serde::Serialize;
use serde_json::{json, Value};

use crate::aggregate::{self, unzip_series, DyadSeries, YearCount, YearOriginMetrics};
use crate::artifact::Artifact;
use crate::config::TopK;
use crate::data::{Column, TravelTable};
use crate::error::ArtifactError;
use crate::palette::{Cyclic, RankPalette};

use super::artifact_path;
use super::page::{options, write_document, FigurePage};

pub const NO_PAIR_DATA: &str = "No data available for this specific country pair";

/// Largest bubble diameter in the diversity view, in pixels.
const MAX_BUBBLE_PX: f64 = 40.0;

/// Render one interactive document into `out_dir`, returning the written path.
pub fn render(artifact: Artifact, table: &TravelTable, top_k: &TopK, out_dir: &Path) -> Result<PathBuf, ArtifactError> {
    let html = match artifact {
        Artifact::ComprehensiveTrips => comprehensive_trips(table, top_k.comprehensive)?,
        Artifact::CountryPairs => country_pairs(table, top_k.dyad_sample, top_k.dyad_initial)?,
        Artifact::LeaderTimeline => leader_timeline(table, top_k.leader_timeline)?,
        Artifact::Diversity => diversity(table, top_k.diversity)?,
        other => {
            return Err(ArtifactError::Draw(format!(
                "{} is not an interactive document",
                other.file_name()
            )))
        }
    };
    let path = artifact_path(out_dir, artifact);
    write_document(&path, &html)?;
    Ok(path)
}

fn line_trace(name: &str, points: &[YearCount], color: String) -> Box<Scatter<i32, usize>> {
    let (years, counts) = unzip_series(points);
    Scatter::new(years, counts)
        .name(name)
        .mode(Mode::LinesMarkers)
        .line(Line::new().width(2.5).color(color))
}

fn time_layout(title: &str) -> Layout {
    Layout::new()
        .title(Title::new(title))
        .x_axis(Axis::new().title(Title::new("Year")))
        .y_axis(Axis::new().title(Title::new("Number of Trips")))
        .hover_mode(HoverMode::Closest)
        .height(700)
}

// =============================================================================
// Comprehensive view: three toggle groups
// =============================================================================

/// A contiguous run of traces shown together.
#[derive(Debug, Clone, Serialize)]
pub struct TraceGroup {
    pub label: String,
    pub title: String,
    pub start: usize,
    pub end: usize,
}

const COMPREHENSIVE_SCRIPT: &str = r#"
const groups = readJson('groups');
const traceCount = figure.data.length;
document.getElementById('group-pick').addEventListener('change', e => {
  const group = groups[Number(e.target.value)];
  if (!group) return;
  const visible = Array.from({length: traceCount}, (_, i) => i >= group.start && i < group.end);
  Plotly.update('chart', {visible: visible}, {'title.text': group.title});
});
"#;

pub fn comprehensive_trips(table: &TravelTable, k: usize) -> Result<String, ArtifactError> {
    let visited = aggregate::top_k_values(table, Column::CountryVisited, k)?;
    let active = aggregate::top_k_values(table, Column::LeaderCountryOrIGO, k)?;
    let diverse: Vec<String> = aggregate::nunique_per_group(table, Column::LeaderCountryOrIGO, Column::CountryVisited)?
        .into_iter()
        .take(k)
        .map(|g| g.group)
        .collect();

    let specs = [
        (
            "Most visited",
            format!("Top {} Most Visited Countries Over Time", k),
            Column::CountryVisited,
            visited,
        ),
        (
            "Most active",
            format!("Top {} Most Active Countries (Origin) Over Time", k),
            Column::LeaderCountryOrIGO,
            active,
        ),
        (
            "Most diverse",
            format!("Top {} Countries by Destination Diversity Over Time", k),
            Column::LeaderCountryOrIGO,
            diverse,
        ),
    ];
    if specs.iter().all(|(_, _, _, names)| names.is_empty()) {
        return Err(ArtifactError::Empty("comprehensive trips".to_string()));
    }

    let palette = Cyclic::tab20();
    let mut plot = Plot::new();
    let mut groups = Vec::with_capacity(specs.len());
    let mut next = 0;
    for (index, (label, title, column, names)) in specs.iter().enumerate() {
        let start = next;
        for (rank, name) in names.iter().enumerate() {
            let series = aggregate::series_for_value(table, *column, name)?;
            let visible = if index == 0 { Visible::True } else { Visible::False };
            plot.add_trace(line_trace(name, &series, palette.color_at(rank).hex()).visible(visible));
            next += 1;
        }
        groups.push(TraceGroup {
            label: label.to_string(),
            title: title.clone(),
            start,
            end: next,
        });
    }
    plot.set_layout(time_layout(&groups[0].title));

    let controls = format!(
        "<label for=\"group-pick\">Show</label>\n<select id=\"group-pick\">{}</select>",
        options(groups.iter().enumerate().map(|(i, g)| (i.to_string(), g.label.clone())))
    );
    Ok(FigurePage::new("Diplomatic Trips Over Time", plot.to_json())
        .controls(controls)
        .data("groups", &groups)?
        .script(COMPREHENSIVE_SCRIPT)
        .render())
}

// =============================================================================
// Country-pair (dyad) view
// =============================================================================

/// One precomputed dyad as the client sees it.
#[derive(Debug, Clone, Serialize)]
pub struct DyadEntry {
    pub origin: String,
    pub destination: String,
    pub years: Vec<i32>,
    pub counts: Vec<usize>,
}

impl From<&DyadSeries> for DyadEntry {
    fn from(s: &DyadSeries) -> Self {
        let (years, counts) = unzip_series(&s.points);
        Self {
            origin: s.key.origin.clone(),
            destination: s.key.destination.clone(),
            years,
            counts,
        }
    }
}

const DYAD_SCRIPT: &str = r#"
const sample = readJson('dyad-sample');
const NO_DATA = readJson('no-data-message');
const lookup = new Map();
for (const entry of sample) {
  if (!lookup.has(entry.origin)) lookup.set(entry.origin, new Map());
  lookup.get(entry.origin).set(entry.destination, entry);
}
const status = document.getElementById('pair-status');
const originSelect = document.getElementById('pair-origin');
const destinationSelect = document.getElementById('pair-destination');

function showPair(origin, destination) {
  if (!origin || !destination) {
    status.textContent = 'Select both an origin and a destination country.';
    return;
  }
  if (origin === destination) {
    status.textContent = 'Origin and destination must be different countries.';
    return;
  }
  status.textContent = '';
  const layout = Object.assign({}, figure.layout, {
    title: {text: `Diplomatic Trips: ${origin} → ${destination}`},
    annotations: [],
  });
  const byDestination = lookup.get(origin);
  const entry = byDestination ? byDestination.get(destination) : undefined;
  if (entry) {
    Plotly.react('chart', [{
      type: 'scatter', mode: 'lines+markers', name: `${origin} → ${destination}`,
      x: entry.years, y: entry.counts, line: {width: 3},
    }], layout);
  } else {
    layout.annotations = [{
      text: NO_DATA, xref: 'paper', yref: 'paper', x: 0.5, y: 0.5,
      showarrow: false, font: {size: 16},
    }];
    Plotly.react('chart', [], layout);
  }
}

document.getElementById('pair-show').addEventListener('click', () => {
  showPair(originSelect.value, destinationSelect.value);
});
document.getElementById('pair-preset').addEventListener('change', e => {
  if (e.target.value === '') return;
  const entry = sample[Number(e.target.value)];
  if (!entry) return;
  originSelect.value = entry.origin;
  destinationSelect.value = entry.destination;
  showPair(entry.origin, entry.destination);
});
"#;

pub fn country_pairs(table: &TravelTable, sample_k: usize, initial: usize) -> Result<String, ArtifactError> {
    let all_origins = aggregate::distinct_sorted(table, Column::LeaderCountryOrIGO)?;
    let all_destinations = aggregate::distinct_sorted(table, Column::CountryVisited)?;
    if all_origins.is_empty() || all_destinations.is_empty() {
        return Err(ArtifactError::Empty("country pairs".to_string()));
    }
    let origins = aggregate::top_k_values(table, Column::LeaderCountryOrIGO, sample_k)?;
    let destinations = aggregate::top_k_values(table, Column::CountryVisited, sample_k)?;
    let sample: Vec<DyadEntry> = aggregate::dyad_sample(table, &origins, &destinations)?
        .iter()
        .map(DyadEntry::from)
        .collect();

    let palette = Cyclic::tab20();
    let mut plot = Plot::new();
    for (rank, entry) in sample.iter().take(initial).enumerate() {
        plot.add_trace(
            Scatter::new(entry.years.clone(), entry.counts.clone())
                .name(format!("{} → {}", entry.origin, entry.destination).as_str())
                .mode(Mode::LinesMarkers)
                .line(Line::new().width(3.0).color(palette.color_at(rank).hex())),
        );
    }
    plot.set_layout(time_layout("Diplomatic Trips Between Country Pairs"));

    let presets = options(
        sample
            .iter()
            .enumerate()
            .map(|(i, e)| (i.to_string(), format!("{} → {}", e.origin, e.destination))),
    );
    let controls = format!(
        concat!(
            "<label>Predefined pair <select id=\"pair-preset\"><option value=\"\">Choose a pair</option>{}</select></label>\n",
            "<label>Origin <select id=\"pair-origin\"><option value=\"\">Select origin</option>{}</select></label>\n",
            "<label>Destination <select id=\"pair-destination\"><option value=\"\">Select destination</option>{}</select></label>\n",
            "<button id=\"pair-show\" type=\"button\">Show trips</button>\n",
            "<span id=\"pair-status\" class=\"status\" role=\"status\"></span>"
        ),
        presets,
        options(all_origins.iter().map(|o| (o, o))),
        options(all_destinations.iter().map(|d| (d, d))),
    );

    Ok(FigurePage::new("Diplomatic Trips Between Country Pairs", plot.to_json())
        .controls(controls)
        .data("dyad-sample", &sample)?
        .data("no-data-message", NO_PAIR_DATA)?
        .script(DYAD_SCRIPT)
        .render())
}

// =============================================================================
// Leader timeline
// =============================================================================

const LEADER_SCRIPT: &str = r#"
document.getElementById('leader-pick').addEventListener('change', e => {
  const choice = e.target.value;
  const visible = figure.data.map((_, i) => choice === 'all' || String(i) === choice);
  Plotly.restyle('chart', {visible: visible});
});
"#;

pub fn leader_timeline(table: &TravelTable, k: usize) -> Result<String, ArtifactError> {
    let leaders = aggregate::top_leaders(table, k)?;
    if leaders.is_empty() {
        return Err(ArtifactError::Empty("leader timeline".to_string()));
    }
    let palette = Cyclic::tab20();
    let mut plot = Plot::new();
    let mut labels = Vec::with_capacity(leaders.len());
    for (rank, entry) in leaders.iter().enumerate() {
        let label = entry.leader.to_string();
        let series = aggregate::leader_series(table, &entry.leader)?;
        plot.add_trace(line_trace(&label, &series, palette.color_at(rank).hex()));
        labels.push(label);
    }
    plot.set_layout(time_layout(&format!("Travel Timeline of Top {} Most Active Leaders", k)));

    let mut choices = vec![("all".to_string(), "All leaders".to_string())];
    choices.extend(labels.into_iter().enumerate().map(|(i, l)| (i.to_string(), l)));
    let controls = format!(
        "<label for=\"leader-pick\">Leader</label>\n<select id=\"leader-pick\">{}</select>",
        options(choices)
    );
    Ok(FigurePage::new("Leader Travel Timeline", plot.to_json())
        .controls(controls)
        .script(LEADER_SCRIPT)
        .render())
}

// =============================================================================
// Diversity bubbles
// =============================================================================

fn hover_text(m: &YearOriginMetrics) -> String {
    let avg = m
        .avg_duration
        .map(|d| format!("{:.1} days", d))
        .unwrap_or_else(|| "n/a".to_string());
    format!(
        "{} ({})<br>Total trips: {}<br>Unique destinations: {}<br>Average duration: {}<br>Destinations per trip: {:.2}",
        m.origin, m.year, m.total_trips, m.unique_destinations, avg, m.destinations_per_trip
    )
}

pub fn diversity(table: &TravelTable, k: usize) -> Result<String, ArtifactError> {
    let metrics = aggregate::year_origin_metrics(table)?;
    let top: HashSet<String> = aggregate::top_origins_by_summed_diversity(&metrics, k)
        .into_iter()
        .collect();
    let points: Vec<&YearOriginMetrics> = metrics.iter().filter(|m| top.contains(&m.origin)).collect();
    if points.is_empty() {
        return Err(ArtifactError::Empty("diplomatic diversity".to_string()));
    }

    let years: Vec<i32> = points.iter().map(|m| m.year).collect();
    let origins: Vec<String> = points.iter().map(|m| m.origin.clone()).collect();
    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(years, origins)
            .name("Diplomatic diversity")
            .mode(Mode::Markers),
    );
    plot.set_layout(
        Layout::new()
            .title(Title::new(&format!("Diplomatic Diversity of Top {} Countries Over Time", k)))
            .x_axis(Axis::new().title(Title::new("Year")))
            .y_axis(Axis::new().title(Title::new("Country")))
            .hover_mode(HoverMode::Closest)
            .show_legend(false)
            .height(800),
    );

    // Marker encoding and hover text are attached to the serialized figure.
    let mut figure: Value = serde_json::from_str(&plot.to_json())?;
    let max_trips = points.iter().map(|m| m.total_trips).max().unwrap_or(1).max(1) as f64;
    if let Some(trace) = figure.get_mut("data").and_then(|d| d.get_mut(0)) {
        trace["marker"] = json!({
            "size": points.iter().map(|m| m.total_trips).collect::<Vec<_>>(),
            "sizemode": "area",
            "sizeref": 2.0 * max_trips / (MAX_BUBBLE_PX * MAX_BUBBLE_PX),
            "sizemin": 3,
            "color": points.iter().map(|m| m.unique_destinations).collect::<Vec<_>>(),
            "colorscale": "Viridis",
            "showscale": true,
            "colorbar": {"title": {"text": "Unique destinations"}},
        });
        trace["text"] = json!(points.iter().map(|m| hover_text(m)).collect::<Vec<_>>());
        trace["hoverinfo"] = json!("text");
    }

    Ok(FigurePage::new("Diplomatic Diversity", figure.to_string()).render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TravelRecord;

    fn trip(year: i32, origin: &str, dest: &str, leader: &str, days: Option<f64>) -> TravelRecord {
        TravelRecord {
            trip_year: Some(year),
            leader_country: Some(origin.into()),
            country_visited: Some(dest.into()),
            leader_full_name: Some(leader.into()),
            trip_duration: days,
            ..TravelRecord::default()
        }
    }

    fn table() -> TravelTable {
        TravelTable::from_records(vec![
            trip(2020, "A", "B", "Ann", Some(2.0)),
            trip(2020, "A", "C", "Ann", None),
            trip(2021, "A", "B", "Ann", Some(4.0)),
            trip(2021, "C", "A", "Cy", None),
        ])
    }

    fn block<'a>(html: &'a str, id: &str) -> &'a str {
        let open = format!("id=\"{}\">", id);
        let start = html.find(&open).map(|i| i + open.len()).unwrap();
        let end = html[start..].find("</script>").unwrap();
        &html[start..start + end]
    }

    #[test]
    fn comprehensive_groups_partition_traces() {
        let html = comprehensive_trips(&table(), 15).unwrap();
        let groups: Vec<Value> = serde_json::from_str(block(&html, "groups")).unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0]["start"], 0);
        assert_eq!(groups[0]["end"], groups[1]["start"]);
        assert_eq!(groups[1]["end"], groups[2]["start"]);

        let figure: Value = serde_json::from_str(block(&html, "figure")).unwrap();
        let traces = figure["data"].as_array().unwrap();
        assert_eq!(traces.len() as u64, groups[2]["end"].as_u64().unwrap());
        let first_hidden = groups[1]["start"].as_u64().unwrap() as usize;
        assert_eq!(traces[0]["visible"], json!(true));
        assert_eq!(traces[first_hidden]["visible"], json!(false));
        assert!(html.contains("Plotly.update"));
    }

    #[test]
    fn dyad_page_embeds_sample_and_full_selectors() {
        let html = country_pairs(&table(), 5, 5).unwrap();
        let sample: Vec<Value> = serde_json::from_str(block(&html, "dyad-sample")).unwrap();
        assert!(sample.iter().all(|e| e["origin"] != e["destination"]));
        let ab = sample
            .iter()
            .find(|e| e["origin"] == "A" && e["destination"] == "B")
            .unwrap();
        assert_eq!(ab["years"], json!([2020, 2021]));
        assert_eq!(ab["counts"], json!([1, 1]));

        for country in ["A", "B", "C"] {
            assert!(html.contains(&format!("<option value=\"{}\">{}</option>", country, country)));
        }
        assert!(html.contains(NO_PAIR_DATA));
        assert!(html.contains("origin === destination"));
        assert!(!html.contains("A_B"));
    }

    #[test]
    fn leader_timeline_has_selector_per_leader() {
        let html = leader_timeline(&table(), 15).unwrap();
        assert!(html.contains("<option value=\"all\">All leaders</option>"));
        assert!(html.contains("Ann (A)"));
        assert!(html.contains("Cy (C)"));
    }

    #[test]
    fn diversity_hover_marks_undefined_average() {
        let html = diversity(&table(), 15).unwrap();
        let figure: Value = serde_json::from_str(block(&html, "figure")).unwrap();
        let trace = &figure["data"][0];
        assert_eq!(trace["marker"]["colorscale"], "Viridis");
        let text: Vec<String> = serde_json::from_value(trace["text"].clone()).unwrap();
        assert_eq!(text.len(), 3);
        assert!(text.iter().any(|t| t.contains("C (2021)") && t.contains("Average duration: n/a")));
        assert!(text.iter().any(|t| t.contains("A (2020)") && t.contains("Average duration: 2.0 days")));
    }

    #[test]
    fn empty_table_is_an_empty_artifact() {
        let empty = TravelTable::from_records(Vec::new());
        assert!(matches!(country_pairs(&empty, 5, 5), Err(ArtifactError::Empty(_))));
        assert!(matches!(leader_timeline(&empty, 15), Err(ArtifactError::Empty(_))));
        assert!(matches!(diversity(&empty, 15), Err(ArtifactError::Empty(_))));
        assert!(matches!(comprehensive_trips(&empty, 15), Err(ArtifactError::Empty(_))));
    }
}
