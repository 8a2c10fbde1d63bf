use super::Overrides;
use crate::output::{print_json, timestamp};
use ordenes_core::timer::SlaTimer;
use std::path::Path;
use std::sync::Arc;

pub fn run(root: &Path, overrides: &Overrides, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root, overrides)?;
    if config.has_errors() {
        anyhow::bail!("invalid configuration; run `ordenes config validate`");
    }
    let engine = Arc::new(super::open_engine(root)?);
    let timer = SlaTimer::new(engine, config.timer);
    let report = timer.tick()?;

    if json {
        return print_json(&report);
    }
    println!(
        "Tick {} at {}: {} in-progress area(s) scanned, {} timed out",
        report.run_id,
        timestamp(report.timestamp),
        report.scanned,
        report.timed_out.len()
    );
    for t in &report.timed_out {
        println!(
            "  order {} area {}: {}s active",
            t.order_id, t.area_id, t.elapsed_secs
        );
    }
    for e in &report.errors {
        eprintln!("  error: {e}");
    }
    Ok(())
}
