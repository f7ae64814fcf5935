use anyhow::Result;
use coltviz::config::ReportConfig;
use coltviz::logging::{self, obj, v_str, Domain, Level};
use coltviz::pipeline;
use serde_json::json;

fn main() -> Result<()> {
    let mut cfg = ReportConfig::from_env();
    if let Some(path) = std::env::args().nth(1) {
        cfg = cfg.with_dataset(path);
    }

    logging::log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("dataset", v_str(&cfg.dataset_path.display().to_string())),
            ("work_dir", v_str(&cfg.work_dir.display().to_string())),
            ("static_dir", v_str(&cfg.static_dir.display().to_string())),
        ]),
    );

    let summary = match pipeline::run(&cfg) {
        Ok(s) => s,
        Err(err) => {
            logging::log(
                Level::Fatal,
                Domain::Load,
                "run_aborted",
                obj(&[("msg", v_str(&format!("{:#}", err)))]),
            );
            return Err(err);
        }
    };

    let moved = summary.relocation.as_ref().map(|r| r.moved.len()).unwrap_or(0);
    let move_failures = summary.relocation.as_ref().map(|r| r.failed.len()).unwrap_or(0);
    let missing = summary.dashboard.as_ref().map(|d| d.missing.len()).unwrap_or(0);
    logging::log(
        Level::Info,
        Domain::System,
        "run_summary",
        obj(&[
            ("msg", v_str("generation finished")),
            ("rows", json!(summary.dataset.row_count)),
            ("created", json!(summary.created())),
            ("failed", json!(summary.failed())),
            ("dashboard_missing", json!(missing)),
            ("moved", json!(moved)),
            ("move_failures", json!(move_failures)),
        ]),
    );
    println!(
        "{} artifacts created, {} failed, {} files moved to {}",
        summary.created(),
        summary.failed(),
        moved,
        cfg.static_dir.display()
    );
    Ok(())
}
