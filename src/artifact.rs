//! The fixed set of files a generation run produces.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Image,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    TripsPerYear,
    TopDestinations,
    RegionDistribution,
    TripDuration,
    TopLeaders,
    RegionHeatmap,
    ComprehensiveTrips,
    CountryPairs,
    LeaderTimeline,
    Diversity,
    Dashboard,
}

impl Artifact {
    /// Static charts in render order.
    pub const STATIC: [Artifact; 6] = [
        Artifact::TripsPerYear,
        Artifact::TopDestinations,
        Artifact::RegionDistribution,
        Artifact::TripDuration,
        Artifact::RegionHeatmap,
        Artifact::TopLeaders,
    ];

    /// Interactive documents in render order.
    pub const INTERACTIVE: [Artifact; 4] = [
        Artifact::ComprehensiveTrips,
        Artifact::CountryPairs,
        Artifact::LeaderTimeline,
        Artifact::Diversity,
    ];

    /// Every output, dashboard last.
    pub const ALL: [Artifact; 11] = [
        Artifact::TripsPerYear,
        Artifact::TopDestinations,
        Artifact::RegionDistribution,
        Artifact::TripDuration,
        Artifact::RegionHeatmap,
        Artifact::TopLeaders,
        Artifact::ComprehensiveTrips,
        Artifact::CountryPairs,
        Artifact::LeaderTimeline,
        Artifact::Diversity,
        Artifact::Dashboard,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Artifact::TripsPerYear => "trips_per_year.png",
            Artifact::TopDestinations => "top_destinations.png",
            Artifact::RegionDistribution => "region_distribution.png",
            Artifact::TripDuration => "trip_duration.png",
            Artifact::TopLeaders => "top_leaders.png",
            Artifact::RegionHeatmap => "region_flow_heatmap.png",
            Artifact::ComprehensiveTrips => "comprehensive_trips_viz.html",
            Artifact::CountryPairs => "country_pair_viz.html",
            Artifact::LeaderTimeline => "leader_timeline_viz.html",
            Artifact::Diversity => "diversity_viz.html",
            Artifact::Dashboard => "colt_complete_dashboard.html",
        }
    }

    /// Human-readable name used in logs and alt text.
    pub fn label(&self) -> &'static str {
        match self {
            Artifact::TripsPerYear => "Trips per year",
            Artifact::TopDestinations => "Top destinations",
            Artifact::RegionDistribution => "Region distribution",
            Artifact::TripDuration => "Trip duration",
            Artifact::TopLeaders => "Top leaders",
            Artifact::RegionHeatmap => "Region flow heatmap",
            Artifact::ComprehensiveTrips => "Comprehensive trips visualization",
            Artifact::CountryPairs => "Country pair visualization",
            Artifact::LeaderTimeline => "Leader timeline visualization",
            Artifact::Diversity => "Diplomatic diversity visualization",
            Artifact::Dashboard => "Complete dashboard",
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        if self.file_name().ends_with(".png") {
            ArtifactKind::Image
        } else {
            ArtifactKind::Document
        }
    }
}
