//! Per-event state rows.
//!
//! Every row is an owned copy of engine state taken after an event has been fully
//! handled. Nothing in a row points back into the live world.

use std::collections::BTreeMap;

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::clock::EventKind;
use crate::distributions::VariateDraw;
use crate::ecs::{ActionKind, EmployeeId, EmployeeState, PersonId, PersonState, PersonVariates};
use crate::integrator::EulerIntegrator;
use crate::telemetry::{Counters, VariateSlot};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UpcomingEvent {
    pub kind: EventKind,
    pub timestamp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeSnapshot {
    pub id: EmployeeId,
    pub state: EmployeeState,
    pub serving: Option<PersonId>,
    pub service_ends_at: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibrarySnapshot {
    pub employees: Vec<EmployeeSnapshot>,
    /// Attention queue, front first.
    pub queue: Vec<PersonId>,
    pub reading: Vec<PersonId>,
    pub persons_inside: usize,
    pub capacity: usize,
    pub closed: bool,
}

impl LibrarySnapshot {
    pub fn being_served_count(&self) -> usize {
        self.employees
            .iter()
            .filter(|employee| employee.state == EmployeeState::Busy)
            .count()
    }
}

/// One person inside the library at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonSnapshot {
    pub id: PersonId,
    pub action: ActionKind,
    pub state: PersonState,
    pub arrived_at: f64,
    pub service_ends_at: Option<f64>,
    pub reading_ends_at: Option<f64>,
    pub book_pages: Option<u32>,
    /// Pages read according to the reading integrator.
    pub pages_read: Option<f64>,
    pub variates: PersonVariates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    /// Zero for the initial row, then one per processed event.
    pub sequence: u64,
    pub clock: f64,
    /// Triggering event; `None` on the initial row.
    pub event: Option<EventKind>,
    pub upcoming: Vec<UpcomingEvent>,
    pub library: LibrarySnapshot,
    pub counters: Counters,
    pub variates: BTreeMap<VariateSlot, VariateDraw>,
    pub integrations: BTreeMap<PersonId, EulerIntegrator>,
    pub persons: BTreeMap<PersonId, PersonSnapshot>,
}

impl SnapshotRow {
    pub fn event_label(&self) -> &'static str {
        self.event.map_or("Initialization", EventKind::label)
    }
}

#[derive(Debug, Default, Resource)]
pub struct SnapshotLog {
    pub rows: Vec<SnapshotRow>,
}

impl SnapshotLog {
    pub fn last(&self) -> Option<&SnapshotRow> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Up to `count` rows whose clock is at or after `from_time`, followed by the final
/// row when it is not already part of the window.
pub fn select_rows(rows: &[SnapshotRow], from_time: f64, count: usize) -> Vec<&SnapshotRow> {
    let mut window: Vec<&SnapshotRow> = rows
        .iter()
        .filter(|row| row.clock >= from_time)
        .take(count)
        .collect();
    if let Some(last) = rows.last() {
        let included = window
            .last()
            .is_some_and(|row| row.sequence == last.sequence);
        if !included {
            window.push(last);
        }
    }
    window
}
