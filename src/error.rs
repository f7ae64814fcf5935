//! Error taxonomy for the reporting pipeline.
//!
//! Load errors are fatal for a generation run. Artifact errors are caught at
//! the per-artifact boundary in [`crate::pipeline`] and never stop the batch.

use std::path::PathBuf;

use thiserror::Error;

use crate::data::Column;

/// The base table could not be produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("dataset not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown text encoding label `{0}`")]
    UnknownEncoding(String),
    #[error("failed to parse {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("dataset {} has no header row", .0.display())]
    MissingHeader(PathBuf),
}

/// A single chart, document or aggregate could not be produced.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("required column `{0}` is missing from the dataset")]
    MissingColumn(Column),
    #[error("no rows available for {0}")]
    Empty(String),
    #[error("chart drawing failed: {0}")]
    Draw(String),
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize page data: {0}")]
    Json(#[from] serde_json::Error),
}

impl ArtifactError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArtifactError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Moving generated files into the served directory failed.
#[derive(Debug, Error)]
pub enum RelocateError {
    #[error("cannot create target directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot read work directory {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
