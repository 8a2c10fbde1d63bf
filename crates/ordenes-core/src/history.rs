//! Append-only order history.
//!
//! Events are keyed `[order_id: u64 BE | seq: u64 BE]` so one range scan
//! returns an order's events oldest first. `seq` comes from a store-wide
//! counter and is strictly increasing across commits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EventKind, GlobalState};

pub const ACTOR_SYSTEM: &str = "SYSTEM";
pub const ACTOR_SLA_TIMER: &str = "SLA_TIMER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub order_id: u64,
    pub seq: u64,
    pub kind: EventKind,
    pub detail: String,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub global_state: Option<GlobalState>,
    pub timestamp: DateTime<Utc>,
}

/// An event waiting for its sequence number. Built by the engine and timer,
/// numbered and persisted by the store in the same write transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    pub kind: EventKind,
    pub detail: String,
    pub actor: Option<String>,
    pub global_state: Option<GlobalState>,
    pub timestamp: DateTime<Utc>,
}

impl PendingEvent {
    pub fn new(kind: EventKind, detail: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            actor: None,
            global_state: None,
            timestamp,
        }
    }

    pub fn actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn global_state(mut self, state: GlobalState) -> Self {
        self.global_state = Some(state);
        self
    }

    pub(crate) fn into_event(self, order_id: u64, seq: u64) -> HistoryEvent {
        HistoryEvent {
            order_id,
            seq,
            kind: self.kind,
            detail: self.detail,
            actor: self.actor,
            global_state: self.global_state,
            timestamp: self.timestamp,
        }
    }
}

/// Display order for history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrder {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

impl std::str::FromStr for HistoryOrder {
    type Err = crate::error::OrdenesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(HistoryOrder::Asc),
            "desc" => Ok(HistoryOrder::Desc),
            other => Err(crate::error::OrdenesError::Validation(format!(
                "unknown history order '{other}': expected 'asc' or 'desc'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Key helpers
// ---------------------------------------------------------------------------

pub(crate) fn event_key(order_id: u64, seq: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&order_id.to_be_bytes());
    key[8..].copy_from_slice(&seq.to_be_bytes());
    key
}

/// Inclusive key bounds covering every event of `order_id`.
pub(crate) fn order_bounds(order_id: u64) -> ([u8; 16], [u8; 16]) {
    (event_key(order_id, 0), event_key(order_id, u64::MAX))
}
