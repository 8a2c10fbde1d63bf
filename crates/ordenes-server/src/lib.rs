pub mod error;
pub mod routes;
pub mod scheduler;
pub mod state;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin '{o}'");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = cors_layer(&app_state.config.server.cors_origins);

    Router::new()
        .route("/", get(routes::health::health))
        // Events (SSE)
        .route("/eventos", get(routes::events::sse_events))
        // Orders
        .route(
            "/ordenes",
            get(routes::ordenes::list_orders).post(routes::ordenes::create_order),
        )
        .route("/ordenes/{id}", get(routes::ordenes::get_order))
        .route(
            "/ordenes/{id}/historial",
            get(routes::ordenes::get_history),
        )
        .route(
            "/ordenes/{id}/asignaciones",
            post(routes::ordenes::assign_areas),
        )
        .route(
            "/ordenes/{id}/asignaciones/{area_id}",
            delete(routes::ordenes::remove_area),
        )
        .route(
            "/ordenes/{id}/areas/{area_id}",
            patch(routes::ordenes::transition_area),
        )
        // Area catalog
        .route(
            "/areas",
            get(routes::areas::list_areas).post(routes::areas::create_area),
        )
        .route("/areas/{id}", get(routes::areas::get_area))
        // Reporting
        .route("/kpis", get(routes::kpis::get_kpis))
        // SLA timer
        .route(
            "/temporizador/estado",
            get(routes::temporizador::get_status),
        )
        .route(
            "/temporizador/estadisticas-sla",
            get(routes::temporizador::get_sla_stats),
        )
        .route(
            "/temporizador/tick",
            post(routes::temporizador::manual_tick),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the HTTP API and the periodic SLA timer on `host:port` from the
/// state's config. Runs until Ctrl-C.
pub async fn serve(app_state: AppState) -> anyhow::Result<()> {
    let addr = format!(
        "{}:{}",
        app_state.config.server.host, app_state.config.server.port
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(app_state, listener, shutdown_signal()).await
}

/// Start the server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port). When `shutdown` resolves the periodic timer
/// stops after its in-flight tick and open SSE streams end, then in-flight
/// requests drain.
pub async fn serve_on<F>(
    app_state: AppState,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let actual_port = listener.local_addr()?.port();
    let timer = scheduler::spawn(
        app_state.timer.clone(),
        app_state.event_tx.clone(),
        Arc::clone(&app_state.shutdown),
    );

    let trigger = app_state.clone();
    tokio::spawn(async move {
        shutdown.await;
        trigger.request_shutdown();
    });
    let drain = app_state.shutdown_requested();
    let app = build_router(app_state);

    tracing::info!("ordenes API listening on http://localhost:{actual_port}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(drain)
        .await;
    timer.stop().await;
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
