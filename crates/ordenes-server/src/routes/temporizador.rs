use axum::extract::State;
use axum::Json;
use chrono::Utc;
use ordenes_core::report::SlaStats;
use ordenes_core::timer::TickReport;
use ordenes_core::OrdenesError;

use crate::error::{join_error, AppError};
use crate::state::AppState;

pub(crate) fn tick_json(report: &TickReport) -> serde_json::Value {
    serde_json::json!({
        "run_id": report.run_id,
        "timestamp": report.timestamp,
        "areas_revisadas": report.scanned,
        "areas_actualizadas": report.timed_out.len(),
        "timeouts_aplicados": report.timed_out,
        "ordenes_recalculadas": report.orders_recomputed,
        "errores": report.errors,
    })
}

/// GET /temporizador/estado: timer settings and whether a tick is running.
pub async fn get_status(State(app): State<AppState>) -> Json<serde_json::Value> {
    let cfg = app.timer.config();
    Json(serde_json::json!({
        "activo": cfg.active,
        "configuracion": {
            "n_seg": cfg.n_seg,
            "sla_seg": cfg.sla_seg,
            "estado_timeout": cfg.timeout_state(),
        },
        "ejecutando": app.timer.is_running(),
    }))
}

/// GET /temporizador/estadisticas-sla
pub async fn get_sla_stats(State(app): State<AppState>) -> Result<Json<SlaStats>, AppError> {
    let timer = app.timer.clone();
    let stats = tokio::task::spawn_blocking(move || {
        let orders = timer.engine().store().list_orders(None)?;
        Ok::<_, OrdenesError>(SlaStats::compute(
            &orders,
            timer.config().sla_seg,
            Utc::now(),
        ))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(stats))
}

/// POST /temporizador/tick: run one tick now. 409 if one is already running.
pub async fn manual_tick(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let timer = app.timer.clone();
    let report = tokio::task::spawn_blocking(move || timer.tick())
        .await
        .map_err(join_error)??;

    if report.changed_anything() {
        app.notify();
    }
    Ok(Json(tick_json(&report)))
}
