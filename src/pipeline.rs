//! One generation run: load, render every artifact, assemble the dashboard,
//! relocate. Only loading can fail the run.

use std::any::Any;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::artifact::Artifact;
use crate::config::{ReportConfig, TopK};
use crate::dashboard::{self, DashboardContext, DashboardReport};
use crate::data::{load_table, DatasetManifest, TravelTable};
use crate::error::ArtifactError;
use crate::logging::{self, ProfileScope};
use crate::relocate::{relocate_artifacts, RelocationReport};
use crate::render::{artifact_path, interactive, static_charts};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Created { path: PathBuf },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ArtifactRecord {
    pub artifact: Artifact,
    pub file: &'static str,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ArtifactRecord {
    pub fn is_created(&self) -> bool {
        matches!(self.outcome, Outcome::Created { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub dataset: DatasetManifest,
    pub artifacts: Vec<ArtifactRecord>,
    pub dashboard: Option<DashboardReport>,
    pub dashboard_error: Option<String>,
    pub relocation: Option<RelocationReport>,
    pub relocation_error: Option<String>,
}

impl RunSummary {
    pub fn created(&self) -> usize {
        self.artifacts.iter().filter(|a| a.is_created()).count()
    }

    pub fn failed(&self) -> usize {
        self.artifacts.len() - self.created()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "renderer panicked".to_string()
    }
}

/// Per-artifact error boundary: errors and panics are logged and recorded,
/// never propagated.
pub fn guard<F>(artifact: Artifact, render: F) -> ArtifactRecord
where
    F: FnOnce() -> Result<PathBuf, ArtifactError>,
{
    let scope = ProfileScope::with_context("artifact", &[("artifact", logging::v_str(artifact.file_name()))]);
    let outcome = match catch_unwind(AssertUnwindSafe(render)) {
        Ok(Ok(path)) => {
            logging::log_artifact_ok(artifact.label(), &path, scope.elapsed_ms());
            Outcome::Created { path }
        }
        Ok(Err(err)) => {
            logging::log_artifact_failed(artifact.label(), &err.to_string());
            Outcome::Failed { error: err.to_string() }
        }
        Err(payload) => {
            let error = format!("panic: {}", panic_message(payload.as_ref()));
            logging::log_artifact_failed(artifact.label(), &error);
            Outcome::Failed { error }
        }
    };
    ArtifactRecord {
        artifact,
        file: artifact.file_name(),
        outcome,
    }
}

/// Remove every known artifact name from `dir` so nothing from an earlier
/// run can be mistaken for this run's output.
pub fn clear_previous_artifacts(dir: &Path) -> Result<Vec<Artifact>> {
    let mut removed = Vec::new();
    for artifact in Artifact::ALL {
        let path = artifact_path(dir, artifact);
        if path.is_file() {
            fs::remove_file(&path).with_context(|| format!("removing stale artifact {}", path.display()))?;
            removed.push(artifact);
        }
    }
    Ok(removed)
}

/// Render the six static charts, then the four interactive documents, in order.
pub fn generate_artifacts(table: &TravelTable, top_k: &TopK, out_dir: &Path) -> Vec<ArtifactRecord> {
    let mut records = Vec::with_capacity(Artifact::STATIC.len() + Artifact::INTERACTIVE.len());
    for artifact in Artifact::STATIC {
        records.push(guard(artifact, || static_charts::render(artifact, table, top_k, out_dir)));
    }
    for artifact in Artifact::INTERACTIVE {
        records.push(guard(artifact, || interactive::render(artifact, table, top_k, out_dir)));
    }
    records
}

/// Run the whole batch described by `cfg`.
pub fn run(cfg: &ReportConfig) -> Result<RunSummary> {
    let _scope = ProfileScope::new("pipeline.run");
    fs::create_dir_all(&cfg.work_dir)
        .with_context(|| format!("creating work directory {}", cfg.work_dir.display()))?;

    let table = load_table(&cfg.dataset_path, &cfg.load_options())
        .with_context(|| format!("loading dataset {}", cfg.dataset_path.display()))?;
    let manifest = table.manifest().clone();
    logging::log_dataset_loaded(
        &manifest.path,
        manifest.row_count,
        &manifest.hash_sha256,
        &manifest.missing_columns,
        manifest.placeholder_durations,
    );
    for warning in &manifest.warnings {
        logging::log_load_warning(warning);
    }

    match clear_previous_artifacts(&cfg.work_dir) {
        Ok(removed) => {
            for artifact in removed {
                logging::log_stale_removed(artifact.file_name());
            }
        }
        // Dashboard presence is keyed on this run's outcomes.
        Err(err) => logging::log_load_warning(&format!("{:#}", err)),
    }
    let artifacts = generate_artifacts(&table, &cfg.top_k, &cfg.work_dir);
    let produced: Vec<Artifact> = artifacts.iter().filter(|a| a.is_created()).map(|a| a.artifact).collect();

    let ctx = DashboardContext::from_table(&table, cfg.top_k);
    drop(table);
    let (dashboard, dashboard_error) = match dashboard::assemble(&ctx, &cfg.work_dir, &produced) {
        Ok(report) => {
            logging::log_artifact_ok(Artifact::Dashboard.label(), &report.path, 0.0);
            (Some(report), None)
        }
        Err(err) => {
            logging::log_artifact_failed(Artifact::Dashboard.label(), &err.to_string());
            (None, Some(err.to_string()))
        }
    };

    let (relocation, relocation_error) = match relocate_artifacts(&cfg.work_dir, &cfg.static_dir) {
        Ok(report) => (Some(report), None),
        Err(err) => {
            logging::log_relocation_failed(&cfg.work_dir.display().to_string(), &err.to_string());
            (None, Some(err.to_string()))
        }
    };

    Ok(RunSummary {
        run_id: logging::run_id().to_string(),
        dataset: manifest,
        artifacts,
        dashboard,
        dashboard_error,
        relocation,
        relocation_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_records_errors() {
        let record = guard(Artifact::TopLeaders, || Err(ArtifactError::Empty("leaders".into())));
        assert!(!record.is_created());
        match record.outcome {
            Outcome::Failed { error } => assert!(error.contains("leaders")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn guard_contains_panics() {
        let record = guard(Artifact::Diversity, || panic!("bad value shape"));
        match record.outcome {
            Outcome::Failed { error } => assert_eq!(error, "panic: bad value shape"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn clearing_removes_only_known_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("top_leaders.png"), b"old").unwrap();
        fs::write(dir.path().join("colt_complete_dashboard.html"), b"old").unwrap();
        fs::write(dir.path().join("notes.html"), b"keep").unwrap();
        let removed = clear_previous_artifacts(dir.path()).unwrap();
        assert_eq!(removed, vec![Artifact::TopLeaders, Artifact::Dashboard]);
        assert!(dir.path().join("notes.html").is_file());
        assert!(!dir.path().join("top_leaders.png").exists());
    }

    #[test]
    fn guard_passes_success_through() {
        let record = guard(Artifact::TripsPerYear, || Ok(PathBuf::from("trips_per_year.png")));
        assert!(record.is_created());
        assert_eq!(record.file, "trips_per_year.png");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "created");
        assert_eq!(json["artifact"], "trips_per_year");
    }
}
