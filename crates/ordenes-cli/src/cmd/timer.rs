use super::Overrides;
use crate::output::print_json;
use chrono::Utc;
use clap::Subcommand;
use ordenes_core::report::SlaStats;
use std::path::Path;

#[derive(Subcommand)]
pub enum TimerSubcommand {
    /// Show the effective timer settings
    Status,

    /// SLA statistics over in-progress and overdue areas
    Stats,
}

pub fn run(
    root: &Path,
    overrides: &Overrides,
    subcmd: TimerSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    let config = super::load_config(root, overrides)?;
    match subcmd {
        TimerSubcommand::Status => {
            let t = &config.timer;
            if json {
                return print_json(&serde_json::json!({
                    "activo": t.active,
                    "configuracion": {
                        "n_seg": t.n_seg,
                        "sla_seg": t.sla_seg,
                        "estado_timeout": t.timeout_state(),
                    },
                }));
            }
            println!("Active:        {}", t.active);
            println!("Interval:      {}s", t.n_seg);
            println!("SLA:           {}s", t.sla_seg);
            println!("Timeout state: {}", t.timeout_state());
            Ok(())
        }
        TimerSubcommand::Stats => {
            let engine = super::open_engine(root)?;
            let orders = engine.store().list_orders(None)?;
            let stats = SlaStats::compute(&orders, config.timer.sla_seg, Utc::now());
            if json {
                return print_json(&stats);
            }
            println!("SLA:                {}s", stats.sla_segundos);
            println!("Active areas:       {}", stats.total_areas_activas);
            println!("Near the limit:     {}", stats.areas_cerca_limite);
            println!("Overdue areas:      {}", stats.areas_vencidas);
            println!("Average active:     {:.2}s", stats.promedio_segundos);
            println!("Compliance:         {:.2}%", stats.porcentaje_cumplimiento);
            Ok(())
        }
    }
}
