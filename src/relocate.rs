//! Moves generated artifacts into the directory the file server reads.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::data::file_sha256;
use crate::error::RelocateError;
use crate::logging;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovedFile {
    pub name: String,
    pub to: PathBuf,
    pub hash_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMove {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RelocationReport {
    pub moved: Vec<MovedFile>,
    pub failed: Vec<FailedMove>,
}

/// Images and HTML documents are relocated; anything else stays put.
pub fn is_artifact_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("png") || e.eq_ignore_ascii_case("html"))
        .unwrap_or(false)
}

/// Rename, falling back to copy + remove when the rename cannot cross
/// filesystems. Existing targets are replaced only once the new bytes land.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Move every artifact in `from` into `to`, in name order.
///
/// Only directory-level problems are errors; a file that fails to move is
/// logged, recorded in the report, and skipped.
pub fn relocate_artifacts(from: &Path, to: &Path) -> Result<RelocationReport, RelocateError> {
    fs::create_dir_all(to).map_err(|source| RelocateError::CreateDir {
        path: to.to_path_buf(),
        source,
    })?;
    let entries = fs::read_dir(from).map_err(|source| RelocateError::Scan {
        path: from.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_artifact_file(p))
        .collect();
    files.sort();

    let in_place = same_dir(from, to);
    let mut report = RelocationReport::default();
    for source in files {
        let name = match source.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };
        let target = to.join(&name);
        let moved = if in_place {
            Ok(())
        } else {
            move_file(&source, &target).map_err(|err| RelocateError::Move {
                from: source.clone(),
                to: target.clone(),
                source: err,
            })
        };
        let outcome = moved.map_err(|e| e.to_string()).and_then(|_| {
            file_sha256(&target).map_err(|e| format!("failed to hash {}: {}", target.display(), e))
        });
        match outcome {
            Ok(hash) => {
                logging::log_relocated(&name, &target, &hash);
                report.moved.push(MovedFile {
                    name,
                    to: target,
                    hash_sha256: hash,
                });
            }
            Err(error) => {
                logging::log_relocation_failed(&name, &error);
                report.failed.push(FailedMove { name, error });
            }
        }
    }
    Ok(report)
}
