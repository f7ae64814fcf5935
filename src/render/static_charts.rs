//! The six raster charts.
//!
//! Each chart computes its aggregate first, then draws. Aggregation failures
//! surface as their own [`ArtifactError`]; anything the drawing backend
//! reports becomes [`ArtifactError::Draw`].

use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::aggregate::{self, Crosstab, Histogram, ValueCount, YearCount};
use crate::artifact::Artifact;
use crate::config::TopK;
use crate::data::{Column, TravelTable};
use crate::error::ArtifactError;
use crate::palette::{Cyclic, Gradient, RankPalette, Rgb};

use super::{artifact_path, thousands};

type DrawResult = Result<(), Box<dyn Error>>;

const FONT: &str = "sans-serif";

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn draw_err(e: Box<dyn Error>) -> ArtifactError {
    ArtifactError::Draw(e.to_string())
}

/// Render one static chart into `out_dir`, returning the written path.
pub fn render(artifact: Artifact, table: &TravelTable, top_k: &TopK, out_dir: &Path) -> Result<PathBuf, ArtifactError> {
    let path = artifact_path(out_dir, artifact);
    match artifact {
        Artifact::TripsPerYear => trips_per_year(table, &path)?,
        Artifact::TopDestinations => top_destinations(table, top_k.destinations, &path)?,
        Artifact::RegionDistribution => region_distribution(table, &path)?,
        Artifact::TripDuration => trip_duration(table, top_k.histogram_bins, &path)?,
        Artifact::TopLeaders => top_leaders(table, top_k.leaders, &path)?,
        Artifact::RegionHeatmap => region_heatmap(table, &path)?,
        other => {
            return Err(ArtifactError::Draw(format!(
                "{} is not a static chart",
                other.file_name()
            )))
        }
    }
    Ok(path)
}

// =============================================================================
// Trips per year
// =============================================================================

pub fn trips_per_year(table: &TravelTable, path: &Path) -> Result<(), ArtifactError> {
    let series = aggregate::frequency_by_time(table)?;
    if series.is_empty() {
        return Err(ArtifactError::Empty("trips per year".to_string()));
    }
    draw_time_series(&series, path).map_err(draw_err)
}

fn draw_time_series(series: &[YearCount], path: &Path) -> DrawResult {
    let first = series[0].year;
    let last = series[series.len() - 1].year;
    let peak = series.iter().copied().reduce(|a, b| if b.count > a.count { b } else { a });
    let low = series.iter().copied().reduce(|a, b| if b.count < a.count { b } else { a });
    let y_max = peak.map(|p| p.count).unwrap_or(1) as f64 * 1.15;
    let line = rgb(Cyclic::tab20().color_at(0));

    let root = BitMapBackend::new(path, (1500, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Number of Diplomatic Trips per Year", (FONT, 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((first as f64 - 0.5)..(last as f64 + 0.5), 0f64..y_max.max(1.0))?;
    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc("Number of Trips")
        .x_label_formatter(&|x| format!("{:.0}", x))
        .draw()?;

    let points: Vec<(f64, f64)> = series.iter().map(|p| (p.year as f64, p.count as f64)).collect();
    chart.draw_series(LineSeries::new(points.iter().copied(), line.stroke_width(3)))?;
    chart.draw_series(points.iter().map(|&p| Circle::new(p, 5, line.filled())))?;

    for (label, point) in [("Max", peak), ("Min", low)] {
        if let Some(p) = point {
            chart.draw_series(std::iter::once(Text::new(
                format!("{}: {} ({})", label, thousands(p.count), p.year),
                (p.year as f64, p.count as f64 + y_max * 0.03),
                (FONT, 16).into_font().color(&BLACK),
            )))?;
        }
    }
    root.present()?;
    Ok(())
}

// =============================================================================
// Horizontal rank bars (destinations, leaders)
// =============================================================================

pub fn top_destinations(table: &TravelTable, k: usize, path: &Path) -> Result<(), ArtifactError> {
    let top = aggregate::top_k(table, Column::CountryVisited, k)?;
    if top.is_empty() {
        return Err(ArtifactError::Empty("top destinations".to_string()));
    }
    let title = format!("Top {} Most Visited Countries", k);
    draw_rank_bars(&top, &title, "Number of Visits", &Cyclic::tab20(), path).map_err(draw_err)
}

pub fn top_leaders(table: &TravelTable, k: usize, path: &Path) -> Result<(), ArtifactError> {
    let leaders = aggregate::top_leaders(table, k)?;
    if leaders.is_empty() {
        return Err(ArtifactError::Empty("top leaders".to_string()));
    }
    let bars: Vec<ValueCount> = leaders
        .into_iter()
        .map(|l| ValueCount {
            value: l.leader.to_string(),
            count: l.count,
        })
        .collect();
    let title = format!("Top {} Most Active Leaders", k);
    draw_rank_bars(&bars, &title, "Number of Trips", &Cyclic::tab20c(), path).map_err(draw_err)
}

/// Rank 0 is drawn at the top; colours follow rank.
fn draw_rank_bars(bars: &[ValueCount], title: &str, x_desc: &str, palette: &dyn RankPalette, path: &Path) -> DrawResult {
    let n = bars.len() as i32;
    let max = bars.iter().map(|b| b.count).max().unwrap_or(1) as f64;
    let names: Vec<String> = bars.iter().map(|b| b.value.clone()).collect();
    let row_of = |rank: usize| n - 1 - rank as i32;

    let root = BitMapBackend::new(path, (1400, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(280)
        .build_cartesian_2d(0f64..max * 1.15, (0..n).into_segmented())?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc(x_desc)
        .y_labels(bars.len() + 1)
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(row) if *row >= 0 && *row < n => {
                names[(n - 1 - *row) as usize].clone()
            }
            _ => String::new(),
        })
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(rank, bar)| {
        let row = row_of(rank);
        let mut rect = Rectangle::new(
            [(0.0, SegmentValue::Exact(row)), (bar.count as f64, SegmentValue::Exact(row + 1))],
            rgb(palette.color_at(rank)).filled(),
        );
        rect.set_margin(4, 4, 0, 0);
        rect
    }))?;
    chart.draw_series(bars.iter().enumerate().map(|(rank, bar)| {
        Text::new(
            format!(" {}", thousands(bar.count)),
            (bar.count as f64, SegmentValue::CenterOf(row_of(rank))),
            (FONT, 15).into_font().color(&BLACK).pos(Pos::new(HPos::Left, VPos::Center)),
        )
    }))?;
    root.present()?;
    Ok(())
}

// =============================================================================
// Region pie
// =============================================================================

pub fn region_distribution(table: &TravelTable, path: &Path) -> Result<(), ArtifactError> {
    let regions = aggregate::value_counts(table, Column::RegionVisited)?;
    if regions.is_empty() {
        return Err(ArtifactError::Empty("region distribution".to_string()));
    }
    draw_pie(&regions, path).map_err(draw_err)
}

fn draw_pie(slices: &[ValueCount], path: &Path) -> DrawResult {
    let palette = Cyclic::tab20();
    let sizes: Vec<f64> = slices.iter().map(|s| s.count as f64).collect();
    let colors: Vec<RGBColor> = (0..slices.len()).map(|rank| rgb(palette.color_at(rank))).collect();
    let labels: Vec<String> = slices.iter().map(|s| s.value.clone()).collect();

    let root = BitMapBackend::new(path, (1200, 1000)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled("Distribution of Visits by Region", (FONT, 30))?;
    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = (w.min(h) as f64) * 0.33;

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(90.0);
    pie.label_style((FONT, 18).into_font().color(&BLACK));
    pie.percentages((FONT, 15).into_font().color(&WHITE));
    area.draw(&pie)?;
    root.present()?;
    Ok(())
}

// =============================================================================
// Duration histogram with density
// =============================================================================

pub fn trip_duration(table: &TravelTable, bins: usize, path: &Path) -> Result<(), ArtifactError> {
    let values = aggregate::observed_durations(table)?;
    let hist = aggregate::histogram(&values, bins)
        .ok_or_else(|| ArtifactError::Empty("trip durations".to_string()))?;
    let mean = aggregate::mean(&values).unwrap_or(0.0);
    let median = aggregate::median(&values).unwrap_or(0.0);
    draw_duration(&values, &hist, mean, median, path).map_err(draw_err)
}

fn draw_duration(values: &[f64], hist: &Histogram, mean: f64, median: f64, path: &Path) -> DrawResult {
    let lo = hist.edges[0];
    let hi = hist.edges[hist.edges.len() - 1];
    let width = hist.bin_width();
    let grid: Vec<f64> = (0..=200).map(|i| lo + (hi - lo) * i as f64 / 200.0).collect();
    // Density scaled to counts so it overlays the bars.
    let curve: Vec<(f64, f64)> = aggregate::gaussian_kde(values, &grid)
        .map(|d| {
            grid.iter()
                .zip(d)
                .map(|(x, y)| (*x, y * values.len() as f64 * width))
                .collect()
        })
        .unwrap_or_default();
    let peak_bar = hist.counts.iter().copied().max().unwrap_or(1) as f64;
    let peak_curve = curve.iter().map(|p| p.1).fold(0.0, f64::max);
    let y_max = peak_bar.max(peak_curve).max(1.0) * 1.1;
    let bar = rgb(Cyclic::tab20().color_at(0));

    let root = BitMapBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Distribution of Trip Durations", (FONT, 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(lo..hi, 0f64..y_max)?;
    chart
        .configure_mesh()
        .x_desc("Duration (days)")
        .y_desc("Frequency")
        .draw()?;

    chart.draw_series(hist.counts.iter().enumerate().map(|(i, count)| {
        Rectangle::new(
            [(hist.edges[i], 0.0), (hist.edges[i + 1], *count as f64)],
            bar.mix(0.75).filled(),
        )
    }))?;
    if !curve.is_empty() {
        chart
            .draw_series(LineSeries::new(curve, bar.stroke_width(2)))?
            .label("Density")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], bar.stroke_width(2)));
    }
    for (label, value, color) in [("Mean", mean, RED), ("Median", median, GREEN)] {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(value, 0.0), (value, y_max)],
                color.stroke_width(2),
            )))?
            .label(format!("{}: {:.1} days", label, value))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    Ok(())
}

// =============================================================================
// Region flow heatmap
// =============================================================================

pub fn region_heatmap(table: &TravelTable, path: &Path) -> Result<(), ArtifactError> {
    let ct = aggregate::crosstab(table, Column::LeaderRegion, Column::RegionVisited)?;
    if ct.total() == 0 {
        return Err(ArtifactError::Empty("region flows".to_string()));
    }
    draw_heatmap(&ct, path).map_err(draw_err)
}

fn draw_heatmap(ct: &Crosstab, path: &Path) -> DrawResult {
    let rows = ct.row_labels.len() as i32;
    let cols = ct.col_labels.len() as i32;
    let max = ct.max_cell().max(1) as f64;
    let gradient = Gradient::heatmap();
    // First row label at the top.
    let y_of = |r: usize| rows - 1 - r as i32;

    let root = BitMapBackend::new(path, (1500, 1000)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Diplomatic Travel Flows Between Regions", (FONT, 30))
        .margin(20)
        .x_label_area_size(120)
        .y_label_area_size(200)
        .build_cartesian_2d((0..cols).into_segmented(), (0..rows).into_segmented())?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc("Destination Region")
        .y_desc("Origin Region")
        .x_labels(ct.col_labels.len() + 1)
        .y_labels(ct.row_labels.len() + 1)
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(c) if *c >= 0 && *c < cols => ct.col_labels[*c as usize].clone(),
            _ => String::new(),
        })
        .y_label_formatter(&|v| match v {
            SegmentValue::CenterOf(y) if *y >= 0 && *y < rows => {
                ct.row_labels[(rows - 1 - *y) as usize].clone()
            }
            _ => String::new(),
        })
        .draw()?;

    for (r, row) in ct.cells.iter().enumerate() {
        for (c, count) in row.iter().enumerate() {
            let t = *count as f64 / max;
            let (x, y) = (c as i32, y_of(r));
            chart.draw_series(std::iter::once(Rectangle::new(
                [(SegmentValue::Exact(x), SegmentValue::Exact(y)), (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1))],
                rgb(gradient.at(t)).filled(),
            )))?;
            let ink = if t > 0.5 { WHITE } else { BLACK };
            chart.draw_series(std::iter::once(Text::new(
                thousands(*count),
                (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                (FONT, 16).into_font().color(&ink).pos(Pos::new(HPos::Center, VPos::Center)),
            )))?;
        }
    }
    root.present()?;
    Ok(())
}
