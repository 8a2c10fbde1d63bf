use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{OrdenesError, Result};
use crate::transition;
use crate::types::{GlobalState, PartialState, Priority};

/// Whole seconds between `since` and `now`, never negative.
pub fn elapsed_secs(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - since).num_seconds().max(0) as u64
}

// ---------------------------------------------------------------------------
// AreaAssignment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaAssignment {
    pub area_id: u64,
    #[serde(default)]
    pub area_name: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    pub state: PartialState,
    /// Active seconds banked at past transition boundaries.
    pub accumulated_secs: u64,
    /// Set only while `state == InProgress`.
    #[serde(default)]
    pub active_since: Option<DateTime<Utc>>,
    pub assigned_at: DateTime<Utc>,
    pub last_transition_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl AreaAssignment {
    pub fn new(
        area_id: u64,
        area_name: Option<String>,
        assignee: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            area_id,
            area_name,
            assignee,
            state: PartialState::Assigned,
            accumulated_secs: 0,
            active_since: None,
            assigned_at: now,
            last_transition_at: now,
            started_at: None,
            completed_at: None,
            notes: None,
        }
    }

    /// Accumulated seconds plus the running stretch, if the area is active.
    pub fn live_secs(&self, now: DateTime<Utc>) -> u64 {
        let running = match (self.state, self.active_since) {
            (PartialState::InProgress, Some(since)) => elapsed_secs(since, now),
            _ => 0,
        };
        self.accumulated_secs.saturating_add(running)
    }

    /// Move to `target`, banking active time when leaving `InProgress`.
    ///
    /// Does not consult the transition table; callers validate first.
    pub(crate) fn enter(&mut self, target: PartialState, now: DateTime<Utc>) {
        if self.state == PartialState::InProgress {
            self.accumulated_secs = self.live_secs(now);
            self.active_since = None;
        }
        if target == PartialState::InProgress {
            self.active_since = Some(now);
            if self.started_at.is_none() {
                self.started_at = Some(now);
            }
        }
        if target.is_terminal() {
            self.completed_at = Some(now);
        }
        self.state = target;
        self.last_transition_at = now;
    }

    pub fn label(&self) -> String {
        match &self.area_name {
            Some(name) => name.clone(),
            None => format!("#{}", self.area_id),
        }
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub creator: String,
    pub global_state: GlobalState,
    #[serde(default)]
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub areas: Vec<AreaAssignment>,
}

impl Order {
    pub fn area(&self, area_id: u64) -> Option<&AreaAssignment> {
        self.areas.iter().find(|a| a.area_id == area_id)
    }

    pub fn area_mut(&mut self, area_id: u64) -> Result<&mut AreaAssignment> {
        let order_id = self.id;
        self.areas
            .iter_mut()
            .find(|a| a.area_id == area_id)
            .ok_or(OrdenesError::AssignmentNotFound { order_id, area_id })
    }

    pub fn partial_states(&self) -> Vec<PartialState> {
        self.areas.iter().map(|a| a.state).collect()
    }

    /// The global state implied by the current assignments.
    pub fn derived_global_state(&self) -> GlobalState {
        transition::global_state(&self.partial_states())
    }

    pub fn completed_areas(&self) -> usize {
        self.areas
            .iter()
            .filter(|a| a.state == PartialState::Completed)
            .count()
    }

    pub fn total_secs(&self, now: DateTime<Utc>) -> u64 {
        self.areas.iter().map(|a| a.live_secs(now)).sum()
    }
}

// ---------------------------------------------------------------------------
// NewOrder
// ---------------------------------------------------------------------------

/// Input for order creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrder {
    pub title: String,
    pub description: String,
    pub creator: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub area_ids: Vec<u64>,
    #[serde(default)]
    pub assignee: Option<String>,
}

impl NewOrder {
    pub fn validate(&self) -> Result<()> {
        let title = self.title.trim().chars().count();
        if !(5..=200).contains(&title) {
            return Err(OrdenesError::Validation(
                "title must be between 5 and 200 characters".into(),
            ));
        }
        if self.description.trim().chars().count() < 10 {
            return Err(OrdenesError::Validation(
                "description must be at least 10 characters".into(),
            ));
        }
        let creator = self.creator.trim().chars().count();
        if creator == 0 || creator > 150 {
            return Err(OrdenesError::Validation(
                "creator must be between 1 and 150 characters".into(),
            ));
        }
        if let Some(assignee) = &self.assignee {
            if assignee.chars().count() > 150 {
                return Err(OrdenesError::Validation(
                    "assignee must be at most 150 characters".into(),
                ));
            }
        }
        Ok(())
    }
}
