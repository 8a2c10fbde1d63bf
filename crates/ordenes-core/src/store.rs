//! Durable storage for orders, the area catalog and order history, using redb.
//!
//! # Table design
//!
//! ```text
//! orders   u64 order id                        -> JSON Order (assignments embedded)
//! areas    u64 area id                         -> JSON Area
//! history  [order_id BE (8) | seq BE (8)]      -> JSON HistoryEvent
//! meta     &str counter name                   -> u64 next value
//! ```
//!
//! An order and its assignments live in one record, so an area change and the
//! recomputed global state always commit together. History events produced by
//! a mutation are appended in the same write transaction.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, Table, TableDefinition};

use crate::area::{Area, NewArea};
use crate::error::{OrdenesError, Result};
use crate::history::{self, HistoryEvent, PendingEvent};
use crate::order::Order;
use crate::types::GlobalState;

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const ORDERS: TableDefinition<u64, &[u8]> = TableDefinition::new("orders");
const AREAS: TableDefinition<u64, &[u8]> = TableDefinition::new("areas");
const HISTORY: TableDefinition<&[u8], &[u8]> = TableDefinition::new("history");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ORDER_ID: &str = "next_order_id";
const NEXT_AREA_ID: &str = "next_area_id";
const NEXT_EVENT_SEQ: &str = "next_event_seq";

fn db_err(e: impl std::fmt::Display) -> OrdenesError {
    OrdenesError::Storage(e.to_string())
}

/// Reserve the next value of a counter. Counters start at 1.
fn bump(meta: &mut Table<&'static str, u64>, counter: &str) -> Result<u64> {
    let current = meta.get(counter).map_err(db_err)?.map(|g| g.value());
    let value = current.unwrap_or(1);
    meta.insert(counter, value + 1).map_err(db_err)?;
    Ok(value)
}

fn append_events(
    history: &mut Table<&'static [u8], &'static [u8]>,
    meta: &mut Table<&'static str, u64>,
    order_id: u64,
    events: Vec<PendingEvent>,
) -> Result<()> {
    for pending in events {
        let seq = bump(meta, NEXT_EVENT_SEQ)?;
        let event = pending.into_event(order_id, seq);
        let key = history::event_key(order_id, seq);
        let value = serde_json::to_vec(&event)?;
        history
            .insert(key.as_slice(), value.as_slice())
            .map_err(db_err)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Persistent store for orders, areas and history.
pub struct Store {
    db: Database,
}

impl Store {
    /// Open or create the redb database at `path`, creating missing tables.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            crate::io::ensure_dir(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(ORDERS).map_err(db_err)?;
        wt.open_table(AREAS).map_err(db_err)?;
        wt.open_table(HISTORY).map_err(db_err)?;
        wt.open_table(META).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    // -----------------------------------------------------------------------
    // Orders
    // -----------------------------------------------------------------------

    /// Persist a new order. The store assigns `order.id`; any id on the input
    /// is ignored. `events` are appended under the new id.
    pub fn insert_order(&self, mut order: Order, events: Vec<PendingEvent>) -> Result<Order> {
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut meta = wt.open_table(META).map_err(db_err)?;
            let mut orders = wt.open_table(ORDERS).map_err(db_err)?;
            let mut history = wt.open_table(HISTORY).map_err(db_err)?;

            order.id = bump(&mut meta, NEXT_ORDER_ID)?;
            let value = serde_json::to_vec(&order)?;
            orders.insert(order.id, value.as_slice()).map_err(db_err)?;
            append_events(&mut history, &mut meta, order.id, events)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(order)
    }

    pub fn get_order(&self, id: u64) -> Result<Order> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let orders = rt.open_table(ORDERS).map_err(db_err)?;
        let order = match orders.get(id).map_err(db_err)? {
            Some(raw) => serde_json::from_slice(raw.value())?,
            None => return Err(OrdenesError::OrderNotFound(id)),
        };
        Ok(order)
    }

    /// All orders, most recently updated first (ties broken by id, newest first).
    pub fn list_orders(&self, filter: Option<GlobalState>) -> Result<Vec<Order>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let orders = rt.open_table(ORDERS).map_err(db_err)?;

        let mut result = Vec::new();
        for entry in orders.iter().map_err(db_err)? {
            let (_, raw) = entry.map_err(db_err)?;
            let order: Order = serde_json::from_slice(raw.value())?;
            if filter.map_or(true, |f| order.global_state == f) {
                result.push(order);
            }
        }
        result.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(result)
    }

    /// Read-modify-write one order in a single write transaction.
    ///
    /// `mutate` receives a private copy of the stored order. If it returns an
    /// error the transaction is dropped and nothing is written. Otherwise the
    /// modified order and the returned events are committed together.
    pub fn update_order<T, F>(&self, id: u64, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Order) -> Result<(T, Vec<PendingEvent>)>,
    {
        let wt = self.db.begin_write().map_err(db_err)?;
        let out = {
            let mut orders = wt.open_table(ORDERS).map_err(db_err)?;
            let mut order: Order = match orders.get(id).map_err(db_err)? {
                Some(raw) => serde_json::from_slice(raw.value())?,
                None => return Err(OrdenesError::OrderNotFound(id)),
            };

            let (out, events) = mutate(&mut order)?;
            order.id = id;

            let value = serde_json::to_vec(&order)?;
            orders.insert(id, value.as_slice()).map_err(db_err)?;

            if !events.is_empty() {
                let mut meta = wt.open_table(META).map_err(db_err)?;
                let mut history = wt.open_table(HISTORY).map_err(db_err)?;
                append_events(&mut history, &mut meta, id, events)?;
            }
            out
        };
        wt.commit().map_err(db_err)?;
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Events of one order, oldest first. Fails if the order does not exist.
    pub fn history(&self, order_id: u64) -> Result<Vec<HistoryEvent>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let orders = rt.open_table(ORDERS).map_err(db_err)?;
        if orders.get(order_id).map_err(db_err)?.is_none() {
            return Err(OrdenesError::OrderNotFound(order_id));
        }

        let history = rt.open_table(HISTORY).map_err(db_err)?;
        let (lo, hi) = history::order_bounds(order_id);
        let mut result = Vec::new();
        for entry in history
            .range(lo.as_slice()..=hi.as_slice())
            .map_err(db_err)?
        {
            let (_, raw) = entry.map_err(db_err)?;
            let event: HistoryEvent = serde_json::from_slice(raw.value())?;
            result.push(event);
        }
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Area catalog
    // -----------------------------------------------------------------------

    /// Add an area to the catalog. Names are unique, compared case-insensitively.
    pub fn create_area(&self, new: &NewArea, now: DateTime<Utc>) -> Result<Area> {
        new.validate()?;
        let name = new.name.trim().to_string();

        let wt = self.db.begin_write().map_err(db_err)?;
        let area = {
            let mut areas = wt.open_table(AREAS).map_err(db_err)?;
            for entry in areas.iter().map_err(db_err)? {
                let (_, raw) = entry.map_err(db_err)?;
                let existing: Area = serde_json::from_slice(raw.value())?;
                if existing.name.eq_ignore_ascii_case(&name) {
                    return Err(OrdenesError::AreaExists(name));
                }
            }

            let mut meta = wt.open_table(META).map_err(db_err)?;
            let area = Area {
                id: bump(&mut meta, NEXT_AREA_ID)?,
                name,
                responsible: new.responsible.trim().to_string(),
                contact: new.contact.clone(),
                active: true,
                created_at: now,
            };
            let value = serde_json::to_vec(&area)?;
            areas.insert(area.id, value.as_slice()).map_err(db_err)?;
            area
        };
        wt.commit().map_err(db_err)?;
        Ok(area)
    }

    pub fn get_area(&self, id: u64) -> Result<Area> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let areas = rt.open_table(AREAS).map_err(db_err)?;
        let area = match areas.get(id).map_err(db_err)? {
            Some(raw) => serde_json::from_slice(raw.value())?,
            None => return Err(OrdenesError::AreaNotFound(id)),
        };
        Ok(area)
    }

    /// Catalog areas in id order, optionally only those with the given `active` flag.
    pub fn list_areas(&self, active: Option<bool>) -> Result<Vec<Area>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let areas = rt.open_table(AREAS).map_err(db_err)?;
        let mut result = Vec::new();
        for entry in areas.iter().map_err(db_err)? {
            let (_, raw) = entry.map_err(db_err)?;
            let area: Area = serde_json::from_slice(raw.value())?;
            if active.map_or(true, |a| area.active == a) {
                result.push(area);
            }
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::AreaAssignment;
    use crate::types::{EventKind, PartialState, Priority};
    use chrono::Duration;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.redb")).unwrap();
        (dir, store)
    }

    fn draft(title: &str, now: DateTime<Utc>) -> Order {
        Order {
            id: 0,
            title: title.into(),
            description: "description long enough".into(),
            creator: "ana".into(),
            global_state: GlobalState::New,
            priority: Priority::Medium,
            created_at: now,
            updated_at: now,
            areas: Vec::new(),
        }
    }

    #[test]
    fn insert_assigns_sequential_ids() {
        let (_dir, store) = open_tmp();
        let now = Utc::now();
        let a = store.insert_order(draft("first", now), vec![]).unwrap();
        let b = store.insert_order(draft("second", now), vec![]).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.get_order(2).unwrap().title, "second");
    }

    #[test]
    fn get_missing_order_is_not_found() {
        let (_dir, store) = open_tmp();
        assert!(matches!(
            store.get_order(99),
            Err(OrdenesError::OrderNotFound(99))
        ));
    }

    #[test]
    fn list_orders_newest_update_first_with_filter() {
        let (_dir, store) = open_tmp();
        let now = Utc::now();
        store.insert_order(draft("old", now), vec![]).unwrap();
        let mut assigned = draft("recent", now + Duration::seconds(5));
        assigned.global_state = GlobalState::Assigned;
        store.insert_order(assigned, vec![]).unwrap();

        let all = store.list_orders(None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "recent");

        let only_new = store.list_orders(Some(GlobalState::New)).unwrap();
        assert_eq!(only_new.len(), 1);
        assert_eq!(only_new[0].title, "old");
    }

    #[test]
    fn failed_update_writes_nothing() {
        let (_dir, store) = open_tmp();
        let now = Utc::now();
        let order = store.insert_order(draft("keep me", now), vec![]).unwrap();

        let res: Result<()> = store.update_order(order.id, |o| {
            o.title = "mutated".into();
            Err(OrdenesError::Validation("nope".into()))
        });
        assert!(res.is_err());
        assert_eq!(store.get_order(order.id).unwrap().title, "keep me");
        assert!(store.history(order.id).unwrap().is_empty());
    }

    #[test]
    fn update_commits_order_and_events_together() {
        let (_dir, store) = open_tmp();
        let now = Utc::now();
        let order = store.insert_order(draft("area work", now), vec![]).unwrap();

        store
            .update_order(order.id, |o| {
                o.areas.push(AreaAssignment::new(4, None, None, now));
                let ev = PendingEvent::new(EventKind::AreaAssigned, "area #4", now);
                Ok(((), vec![ev]))
            })
            .unwrap();

        let stored = store.get_order(order.id).unwrap();
        assert_eq!(stored.areas.len(), 1);
        assert_eq!(stored.areas[0].state, PartialState::Assigned);
        let events = store.history(order.id).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::AreaAssigned);
    }

    #[test]
    fn history_is_oldest_first_and_scoped_to_order() {
        let (_dir, store) = open_tmp();
        let now = Utc::now();
        let ev = |kind, detail: &str| PendingEvent::new(kind, detail, now);
        let one = store
            .insert_order(draft("one", now), vec![ev(EventKind::Created, "one")])
            .unwrap();
        let two = store
            .insert_order(draft("two", now), vec![ev(EventKind::Created, "two")])
            .unwrap();
        store
            .update_order(one.id, |_| {
                Ok(((), vec![ev(EventKind::AreaAssigned, "later")]))
            })
            .unwrap();

        let events = store.history(one.id).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::Created);
        assert_eq!(events[1].detail, "later");
        assert!(events[0].seq < events[1].seq);

        assert_eq!(store.history(two.id).unwrap().len(), 1);
        assert!(matches!(
            store.history(77),
            Err(OrdenesError::OrderNotFound(77))
        ));
    }

    #[test]
    fn area_names_are_unique() {
        let (_dir, store) = open_tmp();
        let now = Utc::now();
        let new = NewArea {
            name: "Soporte".into(),
            responsible: "Luis".into(),
            contact: None,
        };
        let area = store.create_area(&new, now).unwrap();
        assert_eq!(area.id, 1);
        assert!(area.active);

        let dup = NewArea {
            name: "soporte".into(),
            ..new
        };
        assert!(matches!(
            store.create_area(&dup, now),
            Err(OrdenesError::AreaExists(_))
        ));
        assert_eq!(store.list_areas(None).unwrap().len(), 1);
        assert!(matches!(store.get_area(5), Err(OrdenesError::AreaNotFound(5))));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("persist.redb");
        {
            let store = Store::open(&path).unwrap();
            store.insert_order(draft("durable", Utc::now()), vec![]).unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.get_order(1).unwrap().title, "durable");
        let next = store.insert_order(draft("after", Utc::now()), vec![]).unwrap();
        assert_eq!(next.id, 2);
    }
}
