//! Master dashboard: five tabs over the generated artifacts.
//!
//! Images are referenced with `<img>`, documents with `<iframe>`; nothing from
//! an interactive document is inlined. Every referenced artifact is checked
//! first and a missing one is replaced by a visible notice.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::artifact::Artifact;
use crate::config::TopK;
use crate::data::TravelTable;
use crate::error::ArtifactError;
use crate::logging;
use crate::render::page::{html_escape, write_document};
use crate::render::{artifact_path, thousands};

enum TabBody {
    /// Image grid: artifact, card heading, caption.
    Images(Vec<(Artifact, &'static str, String)>),
    Frame(Artifact),
}

struct Tab {
    id: &'static str,
    label: &'static str,
    heading: &'static str,
    blurb: String,
    body: TabBody,
}

impl Tab {
    fn artifacts(&self) -> Vec<Artifact> {
        match &self.body {
            TabBody::Images(cards) => cards.iter().map(|(a, _, _)| *a).collect(),
            TabBody::Frame(a) => vec![*a],
        }
    }
}

fn tabs(top_k: &TopK) -> Vec<Tab> {
    vec![
        Tab {
            id: "tab-static",
            label: "Static Visualizations",
            heading: "Static Visualizations",
            blurb: "An overview of diplomatic travel patterns in the dataset.".to_string(),
            body: TabBody::Images(vec![
                (
                    Artifact::TripsPerYear,
                    "Diplomatic Trips Over Time",
                    "Number of trips taken by heads of government and state each year.".to_string(),
                ),
                (
                    Artifact::TopDestinations,
                    "Top Destinations",
                    format!("The {} most visited countries.", top_k.destinations),
                ),
                (
                    Artifact::RegionDistribution,
                    "Regional Distribution",
                    "Share of visits received by each region.".to_string(),
                ),
                (
                    Artifact::TripDuration,
                    "Trip Duration",
                    "Distribution of trip durations with the mean and median marked. Unknown durations are excluded."
                        .to_string(),
                ),
                (
                    Artifact::TopLeaders,
                    "Top Leaders",
                    format!("The {} most travelled leaders.", top_k.leaders),
                ),
                (
                    Artifact::RegionHeatmap,
                    "Travel Between Regions",
                    "Trips from each origin region to each destination region.".to_string(),
                ),
            ]),
        },
        Tab {
            id: "tab-comprehensive",
            label: "Top Countries & Leaders",
            heading: "Comprehensive Trips Visualization",
            blurb: format!(
                "The top {} countries in three categories: most visited, most active origins, and most diverse origins. Use the selector to switch category.",
                top_k.comprehensive
            ),
            body: TabBody::Frame(Artifact::ComprehensiveTrips),
        },
        Tab {
            id: "tab-country-pairs",
            label: "Country Pair Analysis",
            heading: "Country Pair Analysis",
            blurb: "Visits between a specific origin and destination over time. Pick a predefined pair or any two countries.".to_string(),
            body: TabBody::Frame(Artifact::CountryPairs),
        },
        Tab {
            id: "tab-leader-timeline",
            label: "Leader Timeline",
            heading: "Leader Timeline Visualization",
            blurb: format!(
                "Yearly trips of the {} most active leaders. Use the selector to focus on one leader.",
                top_k.leader_timeline
            ),
            body: TabBody::Frame(Artifact::LeaderTimeline),
        },
        Tab {
            id: "tab-diversity",
            label: "Diplomatic Diversity",
            heading: "Diplomatic Diversity Visualization",
            blurb: "Bubble size is the number of trips; colour is the number of unique destinations.".to_string(),
            body: TabBody::Frame(Artifact::Diversity),
        },
    ]
}

/// What the dashboard says about the loaded table.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    pub rows: usize,
    pub year_span: Option<(i32, i32)>,
    pub top_k: TopK,
}

impl DashboardContext {
    pub fn from_table(table: &TravelTable, top_k: TopK) -> Self {
        Self {
            rows: table.len(),
            year_span: table.year_span(),
            top_k,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub path: PathBuf,
    /// Referenced artifacts that were not found on disk.
    pub missing: Vec<Artifact>,
}

fn missing_notice(artifact: Artifact) -> String {
    format!(
        "<div class=\"missing\" data-artifact=\"{}\">{} is unavailable: the artifact was not generated.</div>",
        html_escape(artifact.file_name()),
        html_escape(artifact.label())
    )
}

fn render_tab(tab: &Tab, active: bool, is_present: &dyn Fn(Artifact) -> bool) -> String {
    let body = match &tab.body {
        TabBody::Images(cards) => {
            let items: Vec<String> = cards
                .iter()
                .map(|(artifact, title, caption)| {
                    let content = if is_present(*artifact) {
                        format!(
                            "<div class=\"img-container\"><img src=\"{}\" alt=\"{}\"></div>",
                            html_escape(artifact.file_name()),
                            html_escape(artifact.label())
                        )
                    } else {
                        missing_notice(*artifact)
                    };
                    format!(
                        "<div class=\"grid-item\">\n<h4>{}</h4>\n{}\n<p>{}</p>\n</div>",
                        html_escape(title),
                        content,
                        html_escape(caption)
                    )
                })
                .collect();
            format!("<div class=\"grid-container\">\n{}\n</div>", items.join("\n"))
        }
        TabBody::Frame(artifact) => {
            if is_present(*artifact) {
                format!(
                    "<iframe src=\"{}\" title=\"{}\" loading=\"lazy\"></iframe>",
                    html_escape(artifact.file_name()),
                    html_escape(artifact.label())
                )
            } else {
                missing_notice(*artifact)
            }
        }
    };
    format!(
        "<div id=\"{id}\" class=\"tab-content{active}\">\n<h3>{heading}</h3>\n<p>{blurb}</p>\n{body}\n</div>",
        id = tab.id,
        active = if active { " active" } else { "" },
        heading = html_escape(tab.heading),
        blurb = html_escape(&tab.blurb),
        body = body,
    )
}

fn about(ctx: &DashboardContext) -> String {
    let span = match ctx.year_span {
        Some((first, last)) if first == last => format!(" from {}", first),
        Some((first, last)) => format!(" from {} to {}", first, last),
        None => String::new(),
    };
    format!(
        "This dashboard analyses the Country and Organization Leader Travel (COLT) dataset: {} recorded trips by heads of government and state{}.",
        thousands(ctx.rows),
        span
    )
}

const DASHBOARD_STYLE: &str = r#"
body { font-family: Arial, sans-serif; max-width: 1200px; margin: 0 auto; padding: 20px; background-color: #f5f5f5; }
h1, h2, h3 { color: #333; }
h1 { text-align: center; padding: 20px 0; border-bottom: 2px solid #ddd; }
.section { background: white; padding: 20px; margin: 20px 0; border-radius: 8px; box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
.img-container { margin: 20px 0; text-align: center; }
.img-container img { max-width: 100%; height: auto; border-radius: 4px; }
iframe { width: 100%; height: 800px; border: none; margin: 20px 0; }
.tabs { display: flex; flex-wrap: wrap; margin: 20px 0; border-bottom: 1px solid #ddd; }
.tab { padding: 10px 20px; cursor: pointer; border: 1px solid #ddd; border-bottom: none; border-radius: 5px 5px 0 0; background-color: #f1f1f1; margin: 0 5px 5px 0; }
.tab.active { background-color: white; border-bottom: 1px solid white; margin-bottom: -1px; }
.tab-content { display: none; padding: 20px; border: 1px solid #ddd; border-top: none; }
.tab-content.active { display: block; }
.grid-container { display: grid; grid-template-columns: repeat(2, 1fr); gap: 20px; margin: 20px 0; }
@media (max-width: 800px) { .grid-container { grid-template-columns: 1fr; } }
.grid-item { background: white; padding: 15px; border-radius: 5px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
.missing { padding: 24px; border: 2px dashed #c62828; color: #c62828; background: #fff5f5; text-align: center; border-radius: 4px; }
.footer { text-align: center; padding: 20px; color: #666; font-size: 0.9em; border-top: 1px solid #ddd; }
"#;

const TAB_SCRIPT: &str = r#"
const tabButtons = Array.from(document.querySelectorAll('.tab'));
const tabPanels = Array.from(document.querySelectorAll('.tab-content'));
function openTab(id) {
  tabButtons.forEach(b => b.classList.toggle('active', b.dataset.tab === id));
  tabPanels.forEach(p => p.classList.toggle('active', p.id === id));
}
tabButtons.forEach(b => b.addEventListener('click', () => openTab(b.dataset.tab)));
if (tabButtons.length > 0) openTab(tabButtons[0].dataset.tab);
"#;

/// Render the dashboard. Returns the document and the missing artifacts in
/// reference order.
pub fn render(ctx: &DashboardContext, is_present: &dyn Fn(Artifact) -> bool) -> (String, Vec<Artifact>) {
    let tabs = tabs(&ctx.top_k);
    let missing: Vec<Artifact> = tabs
        .iter()
        .flat_map(Tab::artifacts)
        .filter(|a| !is_present(*a))
        .collect();

    let buttons: Vec<String> = tabs
        .iter()
        .enumerate()
        .map(|(i, t)| {
            format!(
                "<button class=\"tab{}\" type=\"button\" data-tab=\"{}\">{}</button>",
                if i == 0 { " active" } else { "" },
                t.id,
                html_escape(t.label)
            )
        })
        .collect();
    let panels: Vec<String> = tabs
        .iter()
        .enumerate()
        .map(|(i, t)| render_tab(t, i == 0, is_present))
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>COLT Dataset Analysis Dashboard</title>
  <style>{style}</style>
</head>
<body>
<h1>COLT Dataset - Comprehensive Diplomatic Travel Analysis Dashboard</h1>
<div class="section">
<h2>About the Dataset</h2>
<p>{about}</p>
</div>
<div class="section">
<h2>Dashboard Contents</h2>
<div class="tabs">
{buttons}
</div>
{panels}
</div>
<div class="footer">
<p>Data Source: Country and Organization Leader Travel (COLT) dataset</p>
<p>Frederick S. Pardee Institute for International Futures at the University of Denver</p>
</div>
<script>{script}</script>
</body>
</html>
"#,
        style = DASHBOARD_STYLE,
        about = html_escape(&about(ctx)),
        buttons = buttons.join("\n"),
        panels = panels.join("\n"),
        script = TAB_SCRIPT,
    );
    (html, missing)
}

/// Write the dashboard into `dir`, embedding only artifacts this run
/// produced that are still on disk, and log what is missing.
pub fn assemble(ctx: &DashboardContext, dir: &Path, produced: &[Artifact]) -> Result<DashboardReport, ArtifactError> {
    let is_present = |a: Artifact| produced.contains(&a) && artifact_path(dir, a).is_file();
    let (html, missing) = render(ctx, &is_present);
    for artifact in &missing {
        logging::log_dashboard_missing(artifact.file_name());
    }
    let path = artifact_path(dir, Artifact::Dashboard);
    write_document(&path, &html)?;
    Ok(DashboardReport { path, missing })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DashboardContext {
        DashboardContext {
            rows: 12345,
            year_span: Some((1990, 2024)),
            top_k: TopK::default(),
        }
    }

    #[test]
    fn five_tabs_first_active() {
        let (html, missing) = render(&ctx(), &|_| true);
        assert!(missing.is_empty());
        assert_eq!(html.matches("<button class=\"tab").count(), 5);
        assert_eq!(html.matches("class=\"tab active\"").count(), 1);
        assert!(html.contains("<button class=\"tab active\" type=\"button\" data-tab=\"tab-static\">"));
        assert!(html.contains("<div id=\"tab-static\" class=\"tab-content active\">"));
        assert_eq!(html.matches("class=\"tab-content active\"").count(), 1);
    }

    #[test]
    fn embeds_images_and_frames_by_relative_name() {
        let (html, _) = render(&ctx(), &|_| true);
        for artifact in Artifact::STATIC {
            assert!(html.contains(&format!("<img src=\"{}\"", artifact.file_name())));
        }
        for artifact in Artifact::INTERACTIVE {
            assert!(html.contains(&format!("<iframe src=\"{}\"", artifact.file_name())));
        }
        assert!(!html.contains("plotly"));
        assert!(html.contains("12,345 recorded trips"));
        assert!(html.contains("from 1990 to 2024"));
    }

    #[test]
    fn missing_artifacts_are_flagged_not_embedded() {
        let absent = [Artifact::RegionHeatmap, Artifact::CountryPairs];
        let (html, missing) = render(&ctx(), &|a| !absent.contains(&a));
        assert_eq!(missing, vec![Artifact::RegionHeatmap, Artifact::CountryPairs]);
        assert!(!html.contains("<img src=\"region_flow_heatmap.png\""));
        assert!(!html.contains("<iframe src=\"country_pair_viz.html\""));
        assert!(html.contains("data-artifact=\"region_flow_heatmap.png\""));
        assert!(html.contains("data-artifact=\"country_pair_viz.html\""));
    }

    #[test]
    fn assemble_checks_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("trips_per_year.png"), b"png").unwrap();
        let produced = [Artifact::TripsPerYear, Artifact::TopLeaders];
        let report = assemble(&ctx(), dir.path(), &produced).unwrap();
        assert_eq!(report.path, dir.path().join("colt_complete_dashboard.html"));
        assert!(report.path.is_file());
        assert_eq!(report.missing.len(), 9);
        assert!(!report.missing.contains(&Artifact::TripsPerYear));

        let first = std::fs::read(&report.path).unwrap();
        assemble(&ctx(), dir.path(), &produced).unwrap();
        assert_eq!(first, std::fs::read(&report.path).unwrap());
    }

    #[test]
    fn leftover_files_from_other_runs_are_not_embedded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("region_flow_heatmap.png"), b"old").unwrap();
        std::fs::write(dir.path().join("trips_per_year.png"), b"png").unwrap();
        let report = assemble(&ctx(), dir.path(), &[Artifact::TripsPerYear]).unwrap();
        assert!(report.missing.contains(&Artifact::RegionHeatmap));
        let html = std::fs::read_to_string(&report.path).unwrap();
        assert!(!html.contains("<img src=\"region_flow_heatmap.png\""));
        assert!(html.contains("<img src=\"trips_per_year.png\""));
    }
}
