//! Structured logging for the report generator and file server.
//!
//! Design goals:
//! 1. Multi-level granularity (TRACE → FATAL)
//! 2. Domain categories for filtering
//! 3. One JSON object per line, on the console and in a per-run directory
//! 4. A readable per-artifact success/failure trail for whoever ran the build

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| Level::parse(&v))
            .unwrap_or(Level::Info)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains (categories for filtering)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Load,      // Dataset decode, parse, manifest
    Aggregate, // Summary tables
    Render,    // Static and interactive artifacts
    Dashboard, // Master document assembly
    Relocate,  // Moving artifacts into the served tree
    Server,    // HTTP file server
    System,    // Startup, shutdown, run summary
    Profile,   // Performance profiling
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Load => "load",
            Domain::Aggregate => "aggregate",
            Domain::Render => "render",
            Domain::Dashboard => "dashboard",
            Domain::Relocate => "relocate",
            Domain::Server => "server",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    pub fn is_enabled(&self) -> bool {
        domain_filter_allows(std::env::var("LOG_DOMAINS").ok().as_deref(), *self)
    }
}

fn domain_filter_allows(filter: Option<&str>, domain: Domain) -> bool {
    match filter {
        None | Some("all") | Some("") => true,
        Some(domains) => domains.split(',').any(|d| d.trim() == domain.as_str()),
    }
}

// =============================================================================
// Sequence counter and run directory
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static PROFILE_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    pretty: bool,
    /// `None` when file sinks are disabled or could not be opened.
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
}

fn open_sink(path: &Path) -> Option<Mutex<BufWriter<File>>> {
    match File::create(path) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let pretty = std::env::var("LOG_FORMAT").as_deref() == Ok("pretty");
        let base = std::env::var("LOG_DIR").unwrap_or_else(|_| "out/runs".to_string());
        if base == "none" {
            return RunContext {
                run_id,
                pretty,
                events: None,
                trace: None,
            };
        }

        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
        }

        let _ = std::fs::write(
            run_dir.join("manifest.json"),
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
                "version": env!("CARGO_PKG_VERSION"),
            })
            .to_string(),
        );

        RunContext {
            events: open_sink(&run_dir.join("events.jsonl")),
            trace: open_sink(&run_dir.join("trace.jsonl")),
            run_id,
            pretty,
        }
    })
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str) {
    if let Some(writer) = writer {
        if let Ok(mut w) = writer.lock() {
            let _ = writeln!(w, "{}", line);
            let _ = w.flush();
        }
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Id of the current run, as written into every record.
pub fn run_id() -> &'static str {
    &ensure_run_context().run_id
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let min_level = Level::from_env();
    if level < min_level || !domain.is_enabled() {
        return;
    }

    emit_record(level, domain.as_str(), event, fields);
}

fn build_record(run_id: &str, seq: u64, level: Level, component: &str, event: &str, mut fields: Map<String, Value>) -> Value {
    let msg = fields.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(seq));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));
    Value::Object(entry)
}

fn pretty_line(record: &Value) -> String {
    let field = |k: &str| record.get(k).and_then(Value::as_str).unwrap_or("");
    let mut line = format!("[{:<5}] {:<9} {}", field("lvl"), field("component"), field("event"));
    let msg = field("msg");
    if !msg.is_empty() {
        line.push_str(": ");
        line.push_str(msg);
    }
    if let Some(data) = record.get("data").and_then(Value::as_object) {
        for (k, v) in data {
            match v {
                Value::String(s) => line.push_str(&format!(" {}={}", k, s)),
                other => line.push_str(&format!(" {}={}", k, other)),
            }
        }
    }
    line
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let record = build_record(&ctx.run_id, next_seq(), level, component, event, fields);
    let line = record.to_string();

    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    if ctx.pretty {
        println!("{}", pretty_line(&record));
    } else {
        println!("{}", line);
    }
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_dataset_loaded(path: &str, rows: u64, hash: &str, missing_columns: &[String], placeholder_durations: u64) {
    log(
        Level::Info,
        Domain::Load,
        "dataset_loaded",
        obj(&[
            ("msg", v_str("dataset loaded")),
            ("path", v_str(path)),
            ("rows", json!(rows)),
            ("hash_sha256", v_str(hash)),
            ("missing_columns", json!(missing_columns)),
            ("placeholder_durations", json!(placeholder_durations)),
        ]),
    );
}

pub fn log_load_warning(warning: &str) {
    log(
        Level::Warn,
        Domain::Load,
        "load_warning",
        obj(&[("msg", v_str(warning))]),
    );
}

pub fn log_artifact_ok(artifact: &str, path: &Path, elapsed_ms: f64) {
    log(
        Level::Info,
        Domain::Render,
        "artifact_ok",
        obj(&[
            ("msg", v_str(&format!("created {}", artifact))),
            ("path", v_str(&path.display().to_string())),
            ("elapsed_ms", v_num(elapsed_ms)),
        ]),
    );
}

pub fn log_artifact_failed(artifact: &str, error: &str) {
    log(
        Level::Error,
        Domain::Render,
        "artifact_failed",
        obj(&[
            ("msg", v_str(&format!("error creating {}", artifact))),
            ("artifact", v_str(artifact)),
            ("error", v_str(error)),
        ]),
    );
}

pub fn log_dashboard_missing(artifact: &str) {
    log(
        Level::Warn,
        Domain::Dashboard,
        "artifact_missing",
        obj(&[
            ("msg", v_str("dashboard references an artifact that was not generated")),
            ("artifact", v_str(artifact)),
        ]),
    );
}

pub fn log_stale_removed(artifact: &str) {
    log(
        Level::Debug,
        Domain::System,
        "stale_artifact_removed",
        obj(&[("artifact", v_str(artifact))]),
    );
}

pub fn log_relocated(name: &str, to: &Path, hash: &str) {
    log(
        Level::Info,
        Domain::Relocate,
        "moved",
        obj(&[
            ("file", v_str(name)),
            ("to", v_str(&to.display().to_string())),
            ("hash_sha256", v_str(hash)),
        ]),
    );
}

pub fn log_relocation_failed(name: &str, error: &str) {
    log(
        Level::Error,
        Domain::Relocate,
        "move_failed",
        obj(&[("file", v_str(name)), ("error", v_str(error))]),
    );
}

pub fn log_server_listening(addr: &str, static_dir: &Path) {
    log(
        Level::Info,
        Domain::Server,
        "listening",
        obj(&[
            ("msg", v_str(&format!("serving on http://{}", addr))),
            ("static_dir", v_str(&static_dir.display().to_string())),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Profiling scope that emits structured timing on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Option<Map<String, Value>>,
    started: Instant,
    enabled: bool,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self::with_context(label, &[])
    }

    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        let enabled = Self::should_sample();
        Self {
            label,
            context: if enabled { Some(obj(fields)) } else { None },
            started: Instant::now(),
            enabled,
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    fn should_sample() -> bool {
        std::env::var("PROFILE_SAMPLE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .map(|p| {
                if p >= 1.0 {
                    true
                } else if p <= 0.0 {
                    false
                } else {
                    let seq = PROFILE_SEQ.fetch_add(1, Ordering::SeqCst);
                    let bucket = (seq % 10_000) as f64 / 10_000.0;
                    bucket < p
                }
            })
            .unwrap_or(true)
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        let mut fields = self.context.take().unwrap_or_default();
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(self.elapsed_ms()));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("WARN"), Some(Level::Warn));
        assert_eq!(Level::parse(" debug "), Some(Level::Debug));
        assert_eq!(Level::parse("loud"), None);
    }

    #[test]
    fn test_domain_filter() {
        assert!(domain_filter_allows(None, Domain::Render));
        assert!(domain_filter_allows(Some("all"), Domain::Server));
        assert!(domain_filter_allows(Some("load, render"), Domain::Render));
        assert!(!domain_filter_allows(Some("load,render"), Domain::Relocate));
    }

    #[test]
    fn test_obj_helper() {
        let m = obj(&[("key", v_str("value")), ("num", v_num(42.0))]);
        assert_eq!(m.get("key").unwrap(), "value");
        assert_eq!(m.get("num").unwrap(), 42.0);
    }

    #[test]
    fn test_record_shape() {
        let rec = build_record(
            "r-test",
            7,
            Level::Error,
            "render",
            "artifact_failed",
            obj(&[("msg", v_str("error creating chart")), ("artifact", v_str("trips_per_year.png"))]),
        );
        assert_eq!(rec["run_id"], "r-test");
        assert_eq!(rec["seq"], 7);
        assert_eq!(rec["lvl"], "ERROR");
        assert_eq!(rec["msg"], "error creating chart");
        assert_eq!(rec["data"]["artifact"], "trips_per_year.png");
        assert!(rec["data"].get("msg").is_none());

        let line = pretty_line(&rec);
        assert!(line.starts_with("[ERROR] render"));
        assert!(line.contains("artifact=trips_per_year.png"));
    }

    #[test]
    fn test_seq_increments() {
        let s1 = next_seq();
        let s2 = next_seq();
        assert!(s2 > s1);
    }
}
