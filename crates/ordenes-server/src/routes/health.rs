use axum::Json;

/// GET /: liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ordenes",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
