//! Read-only aggregates over orders: KPIs, per-order summaries and SLA
//! statistics. Everything is recomputed from the orders passed in.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::order::Order;
use crate::types::{GlobalState, PartialState, Priority};

// ---------------------------------------------------------------------------
// Kpis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Kpis {
    pub total_ordenes: usize,
    pub completadas: usize,
    /// Assigned, in progress or pending.
    pub pendientes: usize,
    pub cerradas_sin_solucion: usize,
    pub vencidas: usize,
    pub nuevas: usize,
}

impl Kpis {
    pub fn compute(orders: &[Order]) -> Self {
        let mut kpis = Kpis {
            total_ordenes: orders.len(),
            ..Default::default()
        };
        for order in orders {
            match order.global_state {
                GlobalState::Completed => kpis.completadas += 1,
                GlobalState::Assigned | GlobalState::InProgress | GlobalState::Pending => {
                    kpis.pendientes += 1
                }
                GlobalState::ClosedNoResolution => kpis.cerradas_sin_solucion += 1,
                GlobalState::Overdue => kpis.vencidas += 1,
                GlobalState::New => kpis.nuevas += 1,
            }
        }
        kpis
    }
}

// ---------------------------------------------------------------------------
// OrderSummary
// ---------------------------------------------------------------------------

/// One row of the order listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    pub id: u64,
    pub titulo: String,
    pub creador: String,
    pub estado_global: GlobalState,
    pub prioridad: Priority,
    pub fecha_creacion: DateTime<Utc>,
    pub fecha_actualizacion: DateTime<Utc>,
    pub areas_completadas: usize,
    pub num_areas: usize,
    pub total_segundos: u64,
}

impl OrderSummary {
    pub fn from_order(order: &Order, now: DateTime<Utc>) -> Self {
        Self {
            id: order.id,
            titulo: order.title.clone(),
            creador: order.creator.clone(),
            estado_global: order.global_state,
            prioridad: order.priority,
            fecha_creacion: order.created_at,
            fecha_actualizacion: order.updated_at,
            areas_completadas: order.completed_areas(),
            num_areas: order.areas.len(),
            total_segundos: order.total_secs(now),
        }
    }
}

// ---------------------------------------------------------------------------
// SlaStats
// ---------------------------------------------------------------------------

/// Areas at or above this share of the SLA count as close to the limit.
const NEAR_LIMIT_RATIO: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlaStats {
    pub sla_segundos: u64,
    pub total_areas_activas: usize,
    pub areas_cerca_limite: usize,
    pub areas_vencidas: usize,
    pub promedio_segundos: f64,
    pub porcentaje_cumplimiento: f64,
}

impl SlaStats {
    pub fn compute(orders: &[Order], sla_seg: u64, now: DateTime<Utc>) -> Self {
        let areas = orders.iter().flat_map(|o| o.areas.iter());

        let mut active = 0usize;
        let mut near = 0usize;
        let mut overdue = 0usize;
        let mut total_secs = 0u64;
        let near_threshold = sla_seg as f64 * NEAR_LIMIT_RATIO;

        for area in areas {
            match area.state {
                PartialState::InProgress => {
                    let secs = area.live_secs(now);
                    active += 1;
                    total_secs = total_secs.saturating_add(secs);
                    if secs as f64 >= near_threshold && secs < sla_seg {
                        near += 1;
                    }
                }
                PartialState::Overdue => overdue += 1,
                _ => {}
            }
        }

        let promedio = if active == 0 {
            0.0
        } else {
            round2(total_secs as f64 / active as f64)
        };
        let cumplimiento = if active == 0 {
            100.0
        } else {
            let ok = active as f64 - overdue as f64;
            round2((ok / active as f64 * 100.0).clamp(0.0, 100.0))
        };

        Self {
            sla_segundos: sla_seg,
            total_areas_activas: active,
            areas_cerca_limite: near,
            areas_vencidas: overdue,
            promedio_segundos: promedio,
            porcentaje_cumplimiento: cumplimiento,
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
