use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use ordenes_core::engine::TransitionRequest;
use ordenes_core::history::{HistoryEvent, HistoryOrder};
use ordenes_core::order::{AreaAssignment, NewOrder, Order};
use ordenes_core::report::OrderSummary;
use ordenes_core::types::{GlobalState, PartialState, Priority};
use ordenes_core::OrdenesError;

use crate::error::{join_error, AppError};
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 500;

// ---------------------------------------------------------------------------
// JSON views
// ---------------------------------------------------------------------------

pub(crate) fn assignment_json(a: &AreaAssignment, now: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "area_id": a.area_id,
        "area_nombre": a.area_name,
        "asignada_a": a.assignee,
        "estado_parcial": a.state,
        "tiempo_acumulado_segundos": a.live_secs(now),
        "tiempo_activo_desde": a.active_since,
        "fecha_asignacion": a.assigned_at,
        "fecha_inicio": a.started_at,
        "fecha_finalizacion": a.completed_at,
        "ultima_transicion": a.last_transition_at,
        "notas": a.notes,
    })
}

fn order_json(order: &Order, now: DateTime<Utc>) -> serde_json::Value {
    let summary = OrderSummary::from_order(order, now);
    let areas: Vec<_> = order
        .areas
        .iter()
        .map(|a| assignment_json(a, now))
        .collect();
    serde_json::json!({
        "id": order.id,
        "titulo": order.title,
        "descripcion": order.description,
        "creador": order.creator,
        "estado_global": order.global_state,
        "prioridad": order.priority,
        "fecha_creacion": order.created_at,
        "fecha_actualizacion": order.updated_at,
        "areas_completadas": summary.areas_completadas,
        "num_areas": summary.num_areas,
        "total_segundos": summary.total_segundos,
        "asignaciones": areas,
    })
}

fn event_json(e: &HistoryEvent) -> serde_json::Value {
    serde_json::json!({
        "id": e.seq,
        "orden_id": e.order_id,
        "evento": e.kind,
        "detalle": e.detail,
        "actor": e.actor,
        "estado_global": e.global_state,
        "fecha": e.timestamp,
    })
}

// ---------------------------------------------------------------------------
// Create / list / detail
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
pub struct CreateOrderBody {
    pub titulo: String,
    pub descripcion: String,
    pub creador: String,
    #[serde(default)]
    pub prioridad: Option<String>,
    #[serde(default)]
    pub area_ids: Vec<u64>,
    #[serde(default)]
    pub asignada_a: Option<String>,
}

/// POST /ordenes: create an order, optionally routed to areas.
pub async fn create_order(
    State(app): State<AppState>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let priority = match body.prioridad.as_deref() {
        Some(p) => p.parse::<Priority>()?,
        None => Priority::default(),
    };
    let new = NewOrder {
        title: body.titulo,
        description: body.descripcion,
        creator: body.creador,
        priority,
        area_ids: body.area_ids,
        assignee: body.asignada_a,
    };

    let engine = app.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let now = Utc::now();
        let order = engine.create_order(new, now)?;
        Ok::<_, OrdenesError>(order_json(&order, now))
    })
    .await
    .map_err(join_error)??;

    app.notify();
    Ok((StatusCode::CREATED, Json(result)))
}

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub estado: Option<String>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
}

/// GET /ordenes: order summaries, most recently updated first.
pub async fn list_orders(
    State(app): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let filter = q
        .estado
        .as_deref()
        .map(str::parse::<GlobalState>)
        .transpose()?;
    let skip = q.skip.unwrap_or(0);
    let limit = q.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::bad_request(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    let engine = app.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let now = Utc::now();
        let orders = engine.store().list_orders(filter)?;
        let list: Vec<OrderSummary> = orders
            .iter()
            .skip(skip)
            .take(limit)
            .map(|o| OrderSummary::from_order(o, now))
            .collect();
        Ok::<_, OrdenesError>(serde_json::json!(list))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(result))
}

/// GET /ordenes/{id}: full detail including assignments.
pub async fn get_order(
    State(app): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let engine = app.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let order = engine.store().get_order(id)?;
        Ok::<_, OrdenesError>(order_json(&order, Utc::now()))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct HistoryQuery {
    pub orden: Option<String>,
}

/// GET /ordenes/{id}/historial: newest first unless `?orden=asc`.
pub async fn get_history(
    State(app): State<AppState>,
    Path(id): Path<u64>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let direction = match q.orden.as_deref() {
        Some(s) => s.parse::<HistoryOrder>()?,
        None => HistoryOrder::default(),
    };

    let engine = app.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut events = engine.store().history(id)?;
        if direction == HistoryOrder::Desc {
            events.reverse();
        }
        let list: Vec<_> = events.iter().map(event_json).collect();
        Ok::<_, OrdenesError>(serde_json::json!(list))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// Assignments
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
pub struct AssignBody {
    pub area_ids: Vec<u64>,
    #[serde(default)]
    pub asignada_a: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

/// POST /ordenes/{id}/asignaciones: route the order to more areas.
pub async fn assign_areas(
    State(app): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<AssignBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let engine = app.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let now = Utc::now();
        let order = engine.assign_areas(
            id,
            &body.area_ids,
            body.asignada_a.as_deref(),
            body.actor.as_deref(),
            now,
        )?;
        Ok::<_, OrdenesError>(order_json(&order, now))
    })
    .await
    .map_err(join_error)??;

    app.notify();
    Ok(Json(result))
}

/// DELETE /ordenes/{id}/asignaciones/{area_id}: drop an assignment.
pub async fn remove_area(
    State(app): State<AppState>,
    Path((id, area_id)): Path<(u64, u64)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let engine = app.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let now = Utc::now();
        let order = engine.remove_area(id, area_id, None, now)?;
        Ok::<_, OrdenesError>(order_json(&order, now))
    })
    .await
    .map_err(join_error)??;

    app.notify();
    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
pub struct TransitionBody {
    pub nuevo_estado: String,
    #[serde(default)]
    pub notas: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
}

/// PATCH /ordenes/{id}/areas/{area_id}: move one area to a new partial state.
pub async fn transition_area(
    State(app): State<AppState>,
    Path((id, area_id)): Path<(u64, u64)>,
    Json(body): Json<TransitionBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let target: PartialState = body.nuevo_estado.parse()?;
    let req = TransitionRequest {
        order_id: id,
        area_id,
        target,
        notes: body.notas,
        actor: body.actor,
    };

    let engine = app.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let now = Utc::now();
        let area = engine.apply_transition(&req, now)?;
        Ok::<_, OrdenesError>(assignment_json(&area, now))
    })
    .await
    .map_err(join_error)??;

    app.notify();
    Ok(Json(result))
}
