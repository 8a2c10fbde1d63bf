use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use ordenes_core::area::{Area, NewArea};
use ordenes_core::OrdenesError;

use crate::error::{join_error, AppError};
use crate::state::AppState;

fn area_json(a: &Area) -> serde_json::Value {
    serde_json::json!({
        "id": a.id,
        "nombre": a.name,
        "responsable": a.responsible,
        "contacto": a.contact,
        "activa": a.active,
        "fecha_creacion": a.created_at,
    })
}

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub activa: Option<bool>,
}

/// GET /areas: the area catalog in id order.
pub async fn list_areas(
    State(app): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let engine = app.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let areas = engine.store().list_areas(q.activa)?;
        let list: Vec<_> = areas.iter().map(area_json).collect();
        Ok::<_, OrdenesError>(serde_json::json!(list))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(result))
}

/// GET /areas/{id}
pub async fn get_area(
    State(app): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, AppError> {
    let engine = app.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let area = engine.store().get_area(id)?;
        Ok::<_, OrdenesError>(area_json(&area))
    })
    .await
    .map_err(join_error)??;

    Ok(Json(result))
}

#[derive(serde::Deserialize)]
pub struct CreateAreaBody {
    pub nombre: String,
    pub responsable: String,
    #[serde(default)]
    pub contacto: Option<String>,
}

/// POST /areas: add an area to the catalog. Names are unique.
pub async fn create_area(
    State(app): State<AppState>,
    Json(body): Json<CreateAreaBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let new = NewArea {
        name: body.nombre,
        responsible: body.responsable,
        contact: body.contacto,
    };
    let engine = app.engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let area = engine.store().create_area(&new, Utc::now())?;
        tracing::info!(area = area.id, name = %area.name, "area created");
        Ok::<_, OrdenesError>(area_json(&area))
    })
    .await
    .map_err(join_error)??;

    Ok((StatusCode::CREATED, Json(result)))
}
