use axum::extract::State;
use axum::Json;
use ordenes_core::report::Kpis;
use ordenes_core::OrdenesError;

use crate::error::{join_error, AppError};
use crate::state::AppState;

/// GET /kpis: order counts by bucket, recomputed on every request.
pub async fn get_kpis(State(app): State<AppState>) -> Result<Json<Kpis>, AppError> {
    let engine = app.engine.clone();
    let kpis = tokio::task::spawn_blocking(move || {
        let orders = engine.store().list_orders(None)?;
        Ok::<_, OrdenesError>(Kpis::compute(&orders))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(kpis))
}
