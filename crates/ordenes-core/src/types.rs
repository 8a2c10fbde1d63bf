use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::OrdenesError;

// ---------------------------------------------------------------------------
// PartialState
// ---------------------------------------------------------------------------

/// Lifecycle state of a single area assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartialState {
    #[serde(alias = "ASIGNADA")]
    Assigned,
    #[serde(alias = "EN_PROGRESO")]
    InProgress,
    #[serde(alias = "PENDIENTE")]
    Paused,
    #[serde(alias = "COMPLETADA")]
    Completed,
    #[serde(alias = "CERRADA_SIN_SOLUCION")]
    ClosedNoResolution,
    #[serde(alias = "VENCIDA")]
    Overdue,
}

impl PartialState {
    pub fn all() -> &'static [PartialState] {
        &[
            PartialState::Assigned,
            PartialState::InProgress,
            PartialState::Paused,
            PartialState::Completed,
            PartialState::ClosedNoResolution,
            PartialState::Overdue,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PartialState::Assigned => "ASSIGNED",
            PartialState::InProgress => "IN_PROGRESS",
            PartialState::Paused => "PAUSED",
            PartialState::Completed => "COMPLETED",
            PartialState::ClosedNoResolution => "CLOSED_NO_RESOLUTION",
            PartialState::Overdue => "OVERDUE",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PartialState::Completed | PartialState::ClosedNoResolution
        )
    }
}

impl fmt::Display for PartialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PartialState {
    type Err = OrdenesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASSIGNED" | "ASIGNADA" => Ok(PartialState::Assigned),
            "IN_PROGRESS" | "EN_PROGRESO" => Ok(PartialState::InProgress),
            "PAUSED" | "PENDIENTE" => Ok(PartialState::Paused),
            "COMPLETED" | "COMPLETADA" => Ok(PartialState::Completed),
            "CLOSED_NO_RESOLUTION" | "CERRADA_SIN_SOLUCION" => {
                Ok(PartialState::ClosedNoResolution)
            }
            "OVERDUE" | "VENCIDA" => Ok(PartialState::Overdue),
            _ => Err(OrdenesError::InvalidState(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// GlobalState
// ---------------------------------------------------------------------------

/// Aggregate lifecycle state of an order, derived from its assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GlobalState {
    #[serde(alias = "NUEVA")]
    New,
    #[serde(alias = "ASIGNADA")]
    Assigned,
    #[serde(alias = "EN_PROGRESO")]
    InProgress,
    #[serde(alias = "PENDIENTE")]
    Pending,
    #[serde(alias = "COMPLETADA")]
    Completed,
    #[serde(alias = "CERRADA_SIN_SOLUCION")]
    ClosedNoResolution,
    #[serde(alias = "VENCIDA")]
    Overdue,
}

impl GlobalState {
    pub fn all() -> &'static [GlobalState] {
        &[
            GlobalState::New,
            GlobalState::Assigned,
            GlobalState::InProgress,
            GlobalState::Pending,
            GlobalState::Completed,
            GlobalState::ClosedNoResolution,
            GlobalState::Overdue,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GlobalState::New => "NEW",
            GlobalState::Assigned => "ASSIGNED",
            GlobalState::InProgress => "IN_PROGRESS",
            GlobalState::Pending => "PENDING",
            GlobalState::Completed => "COMPLETED",
            GlobalState::ClosedNoResolution => "CLOSED_NO_RESOLUTION",
            GlobalState::Overdue => "OVERDUE",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GlobalState::Completed | GlobalState::ClosedNoResolution)
    }
}

impl fmt::Display for GlobalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GlobalState {
    type Err = OrdenesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" | "NUEVA" => Ok(GlobalState::New),
            "ASSIGNED" | "ASIGNADA" => Ok(GlobalState::Assigned),
            "IN_PROGRESS" | "EN_PROGRESO" => Ok(GlobalState::InProgress),
            "PENDING" | "PENDIENTE" => Ok(GlobalState::Pending),
            "COMPLETED" | "COMPLETADA" => Ok(GlobalState::Completed),
            "CLOSED_NO_RESOLUTION" | "CERRADA_SIN_SOLUCION" => {
                Ok(GlobalState::ClosedNoResolution)
            }
            "OVERDUE" | "VENCIDA" => Ok(GlobalState::Overdue),
            _ => Err(OrdenesError::InvalidState(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    #[serde(alias = "BAJA")]
    Low,
    #[default]
    #[serde(alias = "MEDIA")]
    Medium,
    #[serde(alias = "ALTA")]
    High,
    #[serde(alias = "CRITICA")]
    Critical,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = OrdenesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" | "BAJA" => Ok(Priority::Low),
            "MEDIUM" | "MEDIA" => Ok(Priority::Medium),
            "HIGH" | "ALTA" => Ok(Priority::High),
            "CRITICAL" | "CRITICA" => Ok(Priority::Critical),
            _ => Err(OrdenesError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Created,
    AreaAssigned,
    AreaRemoved,
    PartialStateChanged,
    GlobalStateChanged,
    WorkStarted,
    Completed,
    SlaTimeout,
    ClosedNoResolution,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "CREATED",
            EventKind::AreaAssigned => "AREA_ASSIGNED",
            EventKind::AreaRemoved => "AREA_REMOVED",
            EventKind::PartialStateChanged => "PARTIAL_STATE_CHANGED",
            EventKind::GlobalStateChanged => "GLOBAL_STATE_CHANGED",
            EventKind::WorkStarted => "WORK_STARTED",
            EventKind::Completed => "COMPLETED",
            EventKind::SlaTimeout => "SLA_TIMEOUT",
            EventKind::ClosedNoResolution => "CLOSED_NO_RESOLUTION",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
