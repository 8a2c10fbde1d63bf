//! Transition engine: the only writer of orders and their area assignments.
//!
//! Every mutation of an order runs under that order's lock and inside a single
//! store write transaction, so the area change, the recomputed global state
//! and the history events commit together or not at all. Mutations of
//! different orders only contend on the store's commit.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

use crate::area::Area;
use crate::error::{OrdenesError, Result};
use crate::history::{PendingEvent, ACTOR_SLA_TIMER, ACTOR_SYSTEM};
use crate::order::{AreaAssignment, NewOrder, Order};
use crate::store::Store;
use crate::transition;
use crate::types::{EventKind, GlobalState, PartialState};

// ---------------------------------------------------------------------------
// OrderLocks
// ---------------------------------------------------------------------------

/// One mutex per order id, created on first use and dropped once no caller
/// holds or waits on it.
#[derive(Default)]
struct OrderLocks {
    inner: Mutex<HashMap<u64, Arc<Mutex<()>>>>,
}

impl OrderLocks {
    fn get(&self, order_id: u64) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(order_id).or_default().clone()
    }

    /// Give back a handle from `get`. Clones are only made under the map lock,
    /// so a strong count of one here means nobody else wants the entry.
    fn release(&self, order_id: u64, lock: Arc<Mutex<()>>) {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if map.get(&order_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            map.remove(&order_id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A caller's request to move one area of one order to a new partial state.
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub order_id: u64,
    pub area_id: u64,
    pub target: PartialState,
    pub notes: Option<String>,
    pub actor: Option<String>,
}

impl TransitionRequest {
    pub fn new(order_id: u64, area_id: u64, target: PartialState) -> Self {
        Self {
            order_id,
            area_id,
            target,
            notes: None,
            actor: None,
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Global state recomputation
// ---------------------------------------------------------------------------

/// Re-derive `order.global_state` and describe the change, if any.
///
/// Shared by human transitions and SLA timeouts.
pub(crate) fn recompute_global(
    order: &mut Order,
    actor: &str,
    now: DateTime<Utc>,
) -> Vec<PendingEvent> {
    order.updated_at = now;
    let previous = order.global_state;
    let next = order.derived_global_state();
    if previous == next {
        return Vec::new();
    }
    order.global_state = next;

    let mut events = vec![PendingEvent::new(
        EventKind::GlobalStateChanged,
        format!("Global state: {previous} → {next}"),
        now,
    )
    .actor(actor)
    .global_state(next)];

    let closing = match next {
        GlobalState::Completed => Some((EventKind::Completed, "Order completed")),
        GlobalState::ClosedNoResolution => Some((
            EventKind::ClosedNoResolution,
            "Order closed without resolution",
        )),
        _ => None,
    };
    if let Some((kind, detail)) = closing {
        events.push(
            PendingEvent::new(kind, detail, now)
                .actor(actor)
                .global_state(next),
        );
    }
    events
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    store: Store,
    locks: OrderLocks,
}

impl Engine {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            locks: OrderLocks::default(),
        }
    }

    /// Open (or create) the database at `path` and wrap it in an engine.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(Store::open(path)?))
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run `f` while holding the lock of `order_id`.
    fn with_order_lock<T>(&self, order_id: u64, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.locks.get(order_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.locks.release(order_id, lock);
        result
    }

    /// Resolve catalog areas for assignment. Unknown or inactive areas are
    /// rejected; repeated ids collapse to one.
    fn resolve_areas(&self, area_ids: &[u64]) -> Result<Vec<Area>> {
        let mut areas: Vec<Area> = Vec::with_capacity(area_ids.len());
        for id in area_ids {
            if areas.iter().any(|a| a.id == *id) {
                continue;
            }
            let area = self.store.get_area(*id)?;
            if !area.active {
                return Err(OrdenesError::Validation(format!(
                    "area '{}' is inactive",
                    area.name
                )));
            }
            areas.push(area);
        }
        Ok(areas)
    }

    // -----------------------------------------------------------------------
    // Order lifecycle
    // -----------------------------------------------------------------------

    /// Create an order, optionally assigning it to catalog areas right away.
    pub fn create_order(&self, new: NewOrder, now: DateTime<Utc>) -> Result<Order> {
        new.validate()?;
        let areas = self.resolve_areas(&new.area_ids)?;
        let creator = new.creator.trim().to_string();
        let assignee = new
            .assignee
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut order = Order {
            id: 0,
            title: new.title.trim().to_string(),
            description: new.description.trim().to_string(),
            creator: creator.clone(),
            global_state: GlobalState::New,
            priority: new.priority,
            created_at: now,
            updated_at: now,
            areas: Vec::new(),
        };

        let mut events = vec![PendingEvent::new(
            EventKind::Created,
            format!("Order created: {}", order.title),
            now,
        )
        .actor(&creator)
        .global_state(GlobalState::New)];

        for area in areas {
            events.push(assigned_event(&area, assignee.as_deref(), &creator, now));
            order.areas.push(AreaAssignment::new(
                area.id,
                Some(area.name),
                assignee.clone(),
                now,
            ));
        }
        events.extend(recompute_global(&mut order, &creator, now));

        let order = self.store.insert_order(order, events)?;
        tracing::info!(order = order.id, areas = order.areas.len(), "order created");
        Ok(order)
    }

    /// Assign an existing order to more catalog areas. Areas the order already
    /// has are skipped.
    pub fn assign_areas(
        &self,
        order_id: u64,
        area_ids: &[u64],
        assignee: Option<&str>,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        if area_ids.is_empty() {
            return Err(OrdenesError::Validation(
                "at least one area id is required".into(),
            ));
        }
        if assignee.is_some_and(|a| a.chars().count() > 150) {
            return Err(OrdenesError::Validation(
                "assignee must be at most 150 characters".into(),
            ));
        }
        let areas = self.resolve_areas(area_ids)?;
        let actor = actor.unwrap_or(ACTOR_SYSTEM);
        let assignee = assignee.map(str::trim).filter(|s| !s.is_empty());

        self.with_order_lock(order_id, || {
            self.store.update_order(order_id, |order| {
                let mut events = Vec::new();
                for area in &areas {
                    if order.area(area.id).is_some() {
                        continue;
                    }
                    events.push(assigned_event(area, assignee, actor, now));
                    order.areas.push(AreaAssignment::new(
                        area.id,
                        Some(area.name.clone()),
                        assignee.map(str::to_string),
                        now,
                    ));
                }
                events.extend(recompute_global(order, actor, now));
                Ok((order.clone(), events))
            })
        })
    }

    /// Drop an assignment from an order.
    pub fn remove_area(
        &self,
        order_id: u64,
        area_id: u64,
        actor: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        let actor = actor.unwrap_or(ACTOR_SYSTEM);
        self.with_order_lock(order_id, || {
            self.store.update_order(order_id, |order| {
                let idx = order
                    .areas
                    .iter()
                    .position(|a| a.area_id == area_id)
                    .ok_or(OrdenesError::AssignmentNotFound { order_id, area_id })?;
                let removed = order.areas.remove(idx);

                let mut events = vec![PendingEvent::new(
                    EventKind::AreaRemoved,
                    format!("Area removed: {}", removed.label()),
                    now,
                )
                .actor(actor)];
                events.extend(recompute_global(order, actor, now));
                Ok((order.clone(), events))
            })
        })
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Validate and apply a partial-state transition, returning the updated
    /// assignment. On any error the order is left untouched.
    pub fn apply_transition(
        &self,
        req: &TransitionRequest,
        now: DateTime<Utc>,
    ) -> Result<AreaAssignment> {
        let actor = req.actor.as_deref().unwrap_or(ACTOR_SYSTEM);
        let notes = req
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let updated = self.with_order_lock(req.order_id, || {
            self.store.update_order(req.order_id, |order| {
                let area = order.area_mut(req.area_id)?;
                let from = area.state;

                if !transition::can_transition(from, req.target) {
                    return Err(OrdenesError::InvalidTransition {
                        from: from.to_string(),
                        to: req.target.to_string(),
                    });
                }
                if transition::requires_notes(req.target) && notes.is_none() {
                    return Err(OrdenesError::Validation(format!(
                        "notes are required to move an area to {}",
                        req.target
                    )));
                }

                let first_start = req.target == PartialState::InProgress && area.started_at.is_none();
                area.enter(req.target, now);
                if let Some(n) = notes {
                    area.notes = Some(n.to_string());
                }
                let updated = area.clone();

                let mut events = vec![PendingEvent::new(
                    EventKind::PartialStateChanged,
                    format!("Area {}: {} → {}", updated.label(), from, req.target),
                    now,
                )
                .actor(actor)];
                if first_start {
                    events.push(
                        PendingEvent::new(
                            EventKind::WorkStarted,
                            format!("Work started in area {}", updated.label()),
                            now,
                        )
                        .actor(actor),
                    );
                }
                events.extend(recompute_global(order, actor, now));
                Ok((updated, events))
            })
        })?;

        tracing::debug!(
            order = req.order_id,
            area = req.area_id,
            state = %updated.state,
            "area transition applied"
        );
        Ok(updated)
    }

    /// Force an in-progress area whose active time reached `sla_secs` into
    /// `Overdue`.
    ///
    /// The assignment is re-read under the order lock; if a concurrent
    /// transition already moved it out of `InProgress`, or it is no longer
    /// past the threshold, nothing is written and `Ok(None)` is returned.
    pub fn force_overdue(
        &self,
        order_id: u64,
        area_id: u64,
        sla_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<Option<AreaAssignment>> {
        self.with_order_lock(order_id, || {
            let current = self.store.get_order(order_id)?;
            let due = current.area(area_id).is_some_and(|a| {
                a.state == PartialState::InProgress && a.live_secs(now) >= sla_secs
            });
            if !due {
                return Ok(None);
            }

            self.store
                .update_order(order_id, |order| {
                    let area = order.area_mut(area_id)?;
                    area.enter(PartialState::Overdue, now);
                    let updated = area.clone();

                    let mut events = vec![PendingEvent::new(
                        EventKind::SlaTimeout,
                        format!(
                            "Area {} exceeded the SLA of {}s (accumulated: {}s). State: {} → {}",
                            updated.label(),
                            sla_secs,
                            updated.accumulated_secs,
                            PartialState::InProgress,
                            PartialState::Overdue
                        ),
                        now,
                    )
                    .actor(ACTOR_SLA_TIMER)];
                    events.extend(recompute_global(order, ACTOR_SLA_TIMER, now));
                    Ok((updated, events))
                })
                .map(Some)
        })
    }
}

fn assigned_event(
    area: &Area,
    assignee: Option<&str>,
    actor: &str,
    now: DateTime<Utc>,
) -> PendingEvent {
    let detail = match assignee {
        Some(who) => format!("Area assigned: {} → {}", area.name, who),
        None => format!("Area assigned: {}", area.name),
    };
    PendingEvent::new(EventKind::AreaAssigned, detail, now).actor(actor)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::area::NewArea;
    use chrono::Duration;
    use tempfile::TempDir;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn engine_with_areas(n: usize) -> (TempDir, Engine, Vec<u64>) {
        let dir = TempDir::new().unwrap();
        let engine = Engine::open(&dir.path().join("engine.redb")).unwrap();
        let ids = (0..n)
            .map(|i| {
                engine
                    .store()
                    .create_area(
                        &NewArea {
                            name: format!("Area {i}"),
                            responsible: "Luis".into(),
                            contact: None,
                        },
                        t0(),
                    )
                    .unwrap()
                    .id
            })
            .collect();
        (dir, engine, ids)
    }

    fn new_order(area_ids: Vec<u64>) -> NewOrder {
        NewOrder {
            title: "Network outage".into(),
            description: "Building B has no connectivity".into(),
            creator: "ana".into(),
            area_ids,
            ..Default::default()
        }
    }

    fn kinds(engine: &Engine, order_id: u64) -> Vec<EventKind> {
        engine
            .store()
            .history(order_id)
            .unwrap()
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn create_with_areas_starts_assigned() {
        let (_dir, engine, areas) = engine_with_areas(2);
        let order = engine.create_order(new_order(areas.clone()), t0()).unwrap();
        assert_eq!(order.global_state, GlobalState::Assigned);
        assert_eq!(order.areas.len(), 2);
        assert!(order.areas.iter().all(|a| a.state == PartialState::Assigned));
        assert_eq!(order.areas[0].area_name.as_deref(), Some("Area 0"));
        assert_eq!(
            kinds(&engine, order.id),
            vec![
                EventKind::Created,
                EventKind::AreaAssigned,
                EventKind::AreaAssigned,
                EventKind::GlobalStateChanged
            ]
        );
    }

    #[test]
    fn create_without_areas_is_new() {
        let (_dir, engine, _) = engine_with_areas(0);
        let order = engine.create_order(new_order(vec![]), t0()).unwrap();
        assert_eq!(order.global_state, GlobalState::New);
        assert_eq!(kinds(&engine, order.id), vec![EventKind::Created]);
    }

    #[test]
    fn create_with_unknown_area_fails_without_writing() {
        let (_dir, engine, _) = engine_with_areas(1);
        let err = engine.create_order(new_order(vec![42]), t0()).unwrap_err();
        assert!(matches!(err, OrdenesError::AreaNotFound(42)));
        assert!(engine.store().list_orders(None).unwrap().is_empty());
    }

    #[test]
    fn start_sets_active_since_and_recomputes() {
        let (_dir, engine, areas) = engine_with_areas(2);
        let order = engine.create_order(new_order(areas.clone()), t0()).unwrap();

        let now = t0() + Duration::seconds(5);
        let area = engine
            .apply_transition(
                &TransitionRequest::new(order.id, areas[0], PartialState::InProgress),
                now,
            )
            .unwrap();
        assert_eq!(area.state, PartialState::InProgress);
        assert_eq!(area.active_since, Some(now));
        assert_eq!(area.accumulated_secs, 0);

        let stored = engine.store().get_order(order.id).unwrap();
        assert_eq!(stored.global_state, GlobalState::InProgress);
        assert_eq!(stored.updated_at, now);
        let k = kinds(&engine, order.id);
        assert!(k.ends_with(&[
            EventKind::PartialStateChanged,
            EventKind::WorkStarted,
            EventKind::GlobalStateChanged
        ]));
    }

    #[test]
    fn completing_without_notes_is_rejected() {
        let (_dir, engine, areas) = engine_with_areas(1);
        let order = engine.create_order(new_order(areas.clone()), t0()).unwrap();
        engine
            .apply_transition(
                &TransitionRequest::new(order.id, areas[0], PartialState::InProgress),
                t0(),
            )
            .unwrap();

        let later = t0() + Duration::seconds(120);
        let err = engine
            .apply_transition(
                &TransitionRequest::new(order.id, areas[0], PartialState::Completed).notes("   "),
                later,
            )
            .unwrap_err();
        assert!(matches!(err, OrdenesError::Validation(_)));

        let stored = engine.store().get_order(order.id).unwrap();
        assert_eq!(stored.areas[0].state, PartialState::InProgress);
        assert_eq!(stored.areas[0].accumulated_secs, 0);
    }

    #[test]
    fn invalid_transition_changes_nothing() {
        let (_dir, engine, areas) = engine_with_areas(1);
        let order = engine.create_order(new_order(areas.clone()), t0()).unwrap();
        let before = engine.store().get_order(order.id).unwrap();
        let events_before = kinds(&engine, order.id).len();

        let err = engine
            .apply_transition(
                &TransitionRequest::new(order.id, areas[0], PartialState::Completed).notes("done"),
                t0() + Duration::seconds(1),
            )
            .unwrap_err();
        assert!(matches!(err, OrdenesError::InvalidTransition { .. }));
        assert_eq!(engine.store().get_order(order.id).unwrap(), before);
        assert_eq!(kinds(&engine, order.id).len(), events_before);
    }

    #[test]
    fn unknown_order_or_area_is_not_found() {
        let (_dir, engine, areas) = engine_with_areas(1);
        let order = engine.create_order(new_order(areas.clone()), t0()).unwrap();
        let missing_order = engine.apply_transition(
            &TransitionRequest::new(999, areas[0], PartialState::InProgress),
            t0(),
        );
        assert!(matches!(missing_order, Err(OrdenesError::OrderNotFound(999))));

        let missing_area = engine.apply_transition(
            &TransitionRequest::new(order.id, 77, PartialState::InProgress),
            t0(),
        );
        assert!(matches!(
            missing_area,
            Err(OrdenesError::AssignmentNotFound { area_id: 77, .. })
        ));
    }

    #[test]
    fn pause_and_complete_accumulate_time() {
        let (_dir, engine, areas) = engine_with_areas(1);
        let order = engine.create_order(new_order(areas.clone()), t0()).unwrap();
        let req = |s| TransitionRequest::new(order.id, areas[0], s);

        engine.apply_transition(&req(PartialState::InProgress), t0()).unwrap();
        let paused = engine
            .apply_transition(&req(PartialState::Paused), t0() + Duration::seconds(40))
            .unwrap();
        assert_eq!(paused.accumulated_secs, 40);
        assert!(paused.active_since.is_none());

        engine
            .apply_transition(&req(PartialState::InProgress), t0() + Duration::seconds(100))
            .unwrap();
        let done = engine
            .apply_transition(
                &req(PartialState::Completed).notes("replaced switch"),
                t0() + Duration::seconds(130),
            )
            .unwrap();
        assert_eq!(done.accumulated_secs, 70);
        assert_eq!(done.notes.as_deref(), Some("replaced switch"));

        let stored = engine.store().get_order(order.id).unwrap();
        assert_eq!(stored.global_state, GlobalState::Completed);
        assert!(kinds(&engine, order.id).ends_with(&[
            EventKind::PartialStateChanged,
            EventKind::GlobalStateChanged,
            EventKind::Completed
        ]));
    }

    #[test]
    fn mixed_terminal_closes_without_resolution() {
        let (_dir, engine, areas) = engine_with_areas(3);
        let order = engine.create_order(new_order(areas.clone()), t0()).unwrap();
        for (i, area) in areas.iter().enumerate() {
            let target = if i < 2 {
                engine
                    .apply_transition(
                        &TransitionRequest::new(order.id, *area, PartialState::InProgress),
                        t0(),
                    )
                    .unwrap();
                PartialState::Completed
            } else {
                PartialState::ClosedNoResolution
            };
            engine
                .apply_transition(
                    &TransitionRequest::new(order.id, *area, target).notes("wrap up"),
                    t0() + Duration::seconds(10),
                )
                .unwrap();
        }
        let stored = engine.store().get_order(order.id).unwrap();
        assert_eq!(stored.global_state, GlobalState::ClosedNoResolution);
        assert_eq!(
            kinds(&engine, order.id).last(),
            Some(&EventKind::ClosedNoResolution)
        );
    }

    #[test]
    fn assign_skips_duplicates_and_remove_recomputes() {
        let (_dir, engine, areas) = engine_with_areas(2);
        let order = engine
            .create_order(new_order(vec![areas[0]]), t0())
            .unwrap();

        let order = engine
            .assign_areas(order.id, &[areas[0], areas[1]], Some("pedro"), None, t0())
            .unwrap();
        assert_eq!(order.areas.len(), 2);
        assert_eq!(order.areas[1].assignee.as_deref(), Some("pedro"));

        engine
            .apply_transition(
                &TransitionRequest::new(order.id, areas[1], PartialState::InProgress),
                t0(),
            )
            .unwrap();
        let order = engine.remove_area(order.id, areas[1], Some("ana"), t0()).unwrap();
        assert_eq!(order.areas.len(), 1);
        assert_eq!(order.global_state, GlobalState::Assigned);
        assert!(kinds(&engine, order.id).contains(&EventKind::AreaRemoved));

        assert!(matches!(
            engine.remove_area(order.id, areas[1], None, t0()),
            Err(OrdenesError::AssignmentNotFound { .. })
        ));
    }

    #[test]
    fn assign_requires_ids() {
        let (_dir, engine, areas) = engine_with_areas(1);
        let order = engine.create_order(new_order(areas), t0()).unwrap();
        assert!(matches!(
            engine.assign_areas(order.id, &[], None, None, t0()),
            Err(OrdenesError::Validation(_))
        ));
    }

    #[test]
    fn force_overdue_rechecks_state() {
        let (_dir, engine, areas) = engine_with_areas(1);
        let order = engine.create_order(new_order(areas.clone()), t0()).unwrap();
        // still ASSIGNED: nothing to do
        assert!(engine
            .force_overdue(order.id, areas[0], 60, t0() + Duration::seconds(600))
            .unwrap()
            .is_none());

        engine
            .apply_transition(
                &TransitionRequest::new(order.id, areas[0], PartialState::InProgress),
                t0(),
            )
            .unwrap();
        // not yet past the threshold
        assert!(engine
            .force_overdue(order.id, areas[0], 60, t0() + Duration::seconds(30))
            .unwrap()
            .is_none());

        let area = engine
            .force_overdue(order.id, areas[0], 60, t0() + Duration::seconds(61))
            .unwrap()
            .unwrap();
        assert_eq!(area.state, PartialState::Overdue);
        assert_eq!(area.accumulated_secs, 61);
        assert_eq!(
            engine.store().get_order(order.id).unwrap().global_state,
            GlobalState::Overdue
        );
    }

    #[test]
    fn concurrent_transitions_on_one_order_see_each_other() {
        let (_dir, engine, areas) = engine_with_areas(4);
        let engine = Arc::new(engine);
        let order = engine.create_order(new_order(areas.clone()), t0()).unwrap();

        let handles: Vec<_> = areas
            .iter()
            .map(|area| {
                let engine = Arc::clone(&engine);
                let req = TransitionRequest::new(order.id, *area, PartialState::ClosedNoResolution)
                    .notes("cancelled");
                std::thread::spawn(move || engine.apply_transition(&req, t0()).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let stored = engine.store().get_order(order.id).unwrap();
        assert!(stored
            .areas
            .iter()
            .all(|a| a.state == PartialState::ClosedNoResolution));
        assert_eq!(stored.global_state, GlobalState::ClosedNoResolution);
        assert_eq!(engine.locks.len(), 0);
    }

    #[test]
    fn order_locks_are_dropped_after_use() {
        let (_dir, engine, areas) = engine_with_areas(1);
        let order = engine.create_order(new_order(areas.clone()), t0()).unwrap();

        engine
            .apply_transition(
                &TransitionRequest::new(order.id, areas[0], PartialState::InProgress),
                t0(),
            )
            .unwrap();
        assert_eq!(engine.locks.len(), 0);

        // Failed mutations give their lock back too.
        assert!(engine
            .apply_transition(
                &TransitionRequest::new(order.id, areas[0], PartialState::Completed),
                t0(),
            )
            .is_err());
        assert_eq!(engine.locks.len(), 0);

        let held = engine.locks.get(order.id);
        let waiting = engine.locks.get(order.id);
        engine.locks.release(order.id, held);
        assert_eq!(engine.locks.len(), 1);
        engine.locks.release(order.id, waiting);
        assert_eq!(engine.locks.len(), 0);
    }
}
