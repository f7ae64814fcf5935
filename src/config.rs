//! Environment-driven configuration for the generator and the file server.
//!
//! Every knob has a default; unset or unparseable variables fall back to it.

use std::path::PathBuf;

use serde::Serialize;

use crate::artifact::Artifact;
use crate::data::{LoadOptions, DEFAULT_ENCODING, DEFAULT_PLACEHOLDER};

pub const DEFAULT_DATASET: &str = "Diplometrics_COLT_Travel_Dataset_Primary-HOGS-1990-2024_20250317.csv";

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn text(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Per-visualization K values. Consumers always receive K explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopK {
    pub destinations: usize,
    pub leaders: usize,
    /// Traces per toggle group in the comprehensive view.
    pub comprehensive: usize,
    /// Origins and destinations drawn into the dyad sample.
    pub dyad_sample: usize,
    /// Dyad traces drawn before the user picks anything.
    pub dyad_initial: usize,
    pub leader_timeline: usize,
    pub diversity: usize,
    pub histogram_bins: usize,
}

impl Default for TopK {
    fn default() -> Self {
        Self {
            destinations: 10,
            leaders: 15,
            comprehensive: 15,
            dyad_sample: 5,
            dyad_initial: 5,
            leader_timeline: 15,
            diversity: 15,
            histogram_bins: 30,
        }
    }
}

impl TopK {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = TopK::default();
        Self {
            destinations: parsed(&lookup, "TOP_DESTINATIONS", d.destinations),
            leaders: parsed(&lookup, "TOP_LEADERS", d.leaders),
            comprehensive: parsed(&lookup, "TOP_COMPREHENSIVE", d.comprehensive),
            dyad_sample: parsed(&lookup, "DYAD_SAMPLE", d.dyad_sample),
            dyad_initial: parsed(&lookup, "DYAD_INITIAL", d.dyad_initial),
            leader_timeline: parsed(&lookup, "TOP_TIMELINE_LEADERS", d.leader_timeline),
            diversity: parsed(&lookup, "TOP_DIVERSITY", d.diversity),
            histogram_bins: parsed(&lookup, "HISTOGRAM_BINS", d.histogram_bins),
        }
    }
}

/// Settings for one generation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReportConfig {
    pub dataset_path: PathBuf,
    /// Encoding label understood by `encoding_rs`.
    pub encoding: String,
    pub delimiter: u8,
    pub placeholder: String,
    /// Where artifacts are written before relocation.
    pub work_dir: PathBuf,
    /// Directory the file server reads from.
    pub static_dir: PathBuf,
    pub top_k: TopK,
}

impl ReportConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let delimiter = lookup("DATASET_DELIMITER")
            .and_then(|v| match v.as_str() {
                "\\t" | "tab" => Some(b'\t'),
                s if s.len() == 1 => s.bytes().next(),
                _ => None,
            })
            .unwrap_or(b',');
        Self {
            dataset_path: PathBuf::from(text(&lookup, "DATASET_PATH", DEFAULT_DATASET)),
            encoding: text(&lookup, "DATASET_ENCODING", DEFAULT_ENCODING),
            delimiter,
            placeholder: text(&lookup, "DURATION_PLACEHOLDER", DEFAULT_PLACEHOLDER),
            work_dir: PathBuf::from(text(&lookup, "WORK_DIR", "out/artifacts")),
            static_dir: PathBuf::from(text(&lookup, "STATIC_DIR", "static")),
            top_k: TopK::from_lookup(&lookup),
        }
    }

    pub fn with_dataset(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            encoding: self.encoding.clone(),
            delimiter: self.delimiter,
            placeholder: self.placeholder.clone(),
        }
    }
}

/// Settings for the file server process.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub index_document: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: text(&lookup, "HOST", "0.0.0.0"),
            port: parsed(&lookup, "PORT", 5000),
            static_dir: PathBuf::from(text(&lookup, "STATIC_DIR", "static")),
            index_document: text(&lookup, "INDEX_DOCUMENT", Artifact::Dashboard.file_name()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = ReportConfig::from_lookup(env(&[]));
        assert_eq!(cfg.dataset_path, PathBuf::from(DEFAULT_DATASET));
        assert_eq!(cfg.encoding, "latin1");
        assert_eq!(cfg.delimiter, b',');
        assert_eq!(cfg.placeholder, "TBD");
        assert_eq!(cfg.top_k, TopK::default());
        assert_eq!(cfg.top_k.destinations, 10);
        assert_eq!(cfg.top_k.leaders, 15);
    }

    #[test]
    fn overrides_and_bad_values() {
        let cfg = ReportConfig::from_lookup(env(&[
            ("DATASET_DELIMITER", "tab"),
            ("TOP_DESTINATIONS", "3"),
            ("TOP_LEADERS", "many"),
            ("WORK_DIR", "/tmp/w"),
        ]));
        assert_eq!(cfg.delimiter, b'\t');
        assert_eq!(cfg.top_k.destinations, 3);
        assert_eq!(cfg.top_k.leaders, 15);
        assert_eq!(cfg.work_dir, PathBuf::from("/tmp/w"));
        assert_eq!(cfg.with_dataset("x.csv").dataset_path, PathBuf::from("x.csv"));
    }

    #[test]
    fn server_port_from_env() {
        let cfg = ServerConfig::from_lookup(env(&[("PORT", "8080")]));
        assert_eq!(cfg.bind_addr(), "0.0.0.0:8080");
        assert_eq!(cfg.index_document, "colt_complete_dashboard.html");

        let fallback = ServerConfig::from_lookup(env(&[("PORT", "not-a-port")]));
        assert_eq!(fallback.port, 5000);
    }
}
