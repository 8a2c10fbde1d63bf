//! Area transition table and the global-state reducer.
//!
//! Both are pure functions. The transition engine and the SLA timer call
//! `global_state` so an order's aggregate state is always derived the same way.

use crate::types::{GlobalState, PartialState};

/// States a caller may request from `current`.
///
/// `Overdue` never appears as a target: only the SLA timer moves an area there.
pub fn allowed_transitions(current: PartialState) -> &'static [PartialState] {
    use PartialState::*;
    match current {
        Assigned => &[InProgress, ClosedNoResolution],
        InProgress => &[Paused, Completed, ClosedNoResolution],
        Paused => &[InProgress, Completed, ClosedNoResolution],
        Overdue => &[InProgress, Completed, ClosedNoResolution],
        Completed | ClosedNoResolution => &[],
    }
}

pub fn can_transition(from: PartialState, to: PartialState) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Closing an area (successfully or not) must be justified with notes.
pub fn requires_notes(target: PartialState) -> bool {
    target.is_terminal()
}

/// Derive an order's global state from its assignments' partial states.
///
/// Order of the input is irrelevant.
pub fn global_state(states: &[PartialState]) -> GlobalState {
    if states.is_empty() {
        return GlobalState::New;
    }
    if states.iter().all(|s| s.is_terminal()) {
        return if states.iter().all(|s| *s == PartialState::Completed) {
            GlobalState::Completed
        } else {
            GlobalState::ClosedNoResolution
        };
    }
    if states.contains(&PartialState::InProgress) {
        return GlobalState::InProgress;
    }
    if states.contains(&PartialState::Overdue) {
        return GlobalState::Overdue;
    }
    if states.iter().all(|s| *s == PartialState::Assigned) {
        return GlobalState::Assigned;
    }
    GlobalState::Pending
}
