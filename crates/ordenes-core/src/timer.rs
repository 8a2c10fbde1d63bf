//! SLA timer: forces in-progress areas that exceed the SLA into `Overdue`.
//!
//! A tick scans every order, and for each in-progress area whose live active
//! time reached `sla_seg` asks the engine to apply the timeout under the
//! order's lock. Ticks are single-flight and idempotent.

use std::sync::{Arc, Mutex, RwLock, TryLockError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::TimerConfig;
use crate::engine::Engine;
use crate::error::{OrdenesError, Result};
use crate::order::AreaAssignment;
use crate::types::PartialState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedOutArea {
    pub order_id: u64,
    pub area_id: u64,
    pub elapsed_secs: u64,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// In-progress areas examined.
    pub scanned: usize,
    pub timed_out: Vec<TimedOutArea>,
    /// Orders touched by at least one timeout, in scan order.
    pub orders_recomputed: Vec<u64>,
    /// Areas skipped because their timeout was rejected, e.g. the assignment
    /// was removed mid-scan. Storage failures abort the tick instead.
    pub errors: Vec<String>,
}

impl TickReport {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            timestamp: now,
            scanned: 0,
            timed_out: Vec::new(),
            orders_recomputed: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn changed_anything(&self) -> bool {
        !self.timed_out.is_empty()
    }
}

pub struct SlaTimer {
    engine: Arc<Engine>,
    config: RwLock<TimerConfig>,
    running: Mutex<()>,
}

impl SlaTimer {
    pub fn new(engine: Arc<Engine>, config: TimerConfig) -> Self {
        Self {
            engine,
            config: RwLock::new(config),
            running: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Snapshot of the current settings.
    pub fn config(&self) -> TimerConfig {
        match self.config.read() {
            Ok(cfg) => cfg.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the settings. `sla_seg` and `active` apply to the next tick; a
    /// new `n_seg` re-arms the periodic loop at its next wakeup.
    pub fn set_config(&self, config: TimerConfig) {
        let mut guard = match self.config.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = config;
    }

    /// True while a tick is scanning.
    pub fn is_running(&self) -> bool {
        matches!(self.running.try_lock(), Err(TryLockError::WouldBlock))
    }

    /// Run one tick at the current wall-clock time.
    pub fn tick(&self) -> Result<TickReport> {
        self.tick_at(Utc::now())
    }

    /// Run one tick as of `now`. Fails with `TickInProgress` if another tick
    /// holds the scan, and with the first storage error hit while scanning.
    pub fn tick_at(&self, now: DateTime<Utc>) -> Result<TickReport> {
        self.scan(now, |order_id, area_id, sla| {
            self.engine.force_overdue(order_id, area_id, sla, now)
        })
    }

    fn scan<F>(&self, now: DateTime<Utc>, mut time_out: F) -> Result<TickReport>
    where
        F: FnMut(u64, u64, u64) -> Result<Option<AreaAssignment>>,
    {
        let _guard = match self.running.try_lock() {
            Ok(g) => g,
            Err(TryLockError::WouldBlock) => return Err(OrdenesError::TickInProgress),
            Err(TryLockError::Poisoned(p)) => p.into_inner(),
        };
        let sla = self.config().sla_seg;
        let mut report = TickReport::new(now);

        for order in self.engine.store().list_orders(None)? {
            for area in order
                .areas
                .iter()
                .filter(|a| a.state == PartialState::InProgress)
            {
                report.scanned += 1;
                if area.live_secs(now) < sla {
                    continue;
                }
                match time_out(order.id, area.area_id, sla) {
                    Ok(Some(updated)) => {
                        tracing::warn!(
                            order = order.id,
                            area = %updated.label(),
                            elapsed = updated.accumulated_secs,
                            sla,
                            "SLA exceeded, area marked overdue"
                        );
                        report.timed_out.push(TimedOutArea {
                            order_id: order.id,
                            area_id: area.area_id,
                            elapsed_secs: updated.accumulated_secs,
                        });
                        if !report.orders_recomputed.contains(&order.id) {
                            report.orders_recomputed.push(order.id);
                        }
                    }
                    Ok(None) => {}
                    Err(e @ OrdenesError::Storage(_)) => {
                        tracing::error!(
                            run = %report.run_id,
                            order = order.id,
                            area = area.area_id,
                            "timer tick aborted: {e}"
                        );
                        return Err(e);
                    }
                    Err(e) => {
                        tracing::warn!(order = order.id, area = area.area_id, "SLA timeout skipped: {e}");
                        report
                            .errors
                            .push(format!("order {} area {}: {e}", order.id, area.area_id));
                    }
                }
            }
        }

        if report.changed_anything() {
            tracing::info!(
                run = %report.run_id,
                scanned = report.scanned,
                timed_out = report.timed_out.len(),
                "timer tick applied timeouts"
            );
        } else {
            tracing::debug!(run = %report.run_id, scanned = report.scanned, "timer tick");
        }
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
