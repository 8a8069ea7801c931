//! Counters and per-person records accumulated while the simulation runs.

use std::collections::BTreeMap;

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::distributions::VariateDraw;
use crate::ecs::{ActionKind, Book, Person, PersonId};
use crate::integrator::EulerIntegrator;

/// Cumulative counters. Snapshot rows hold copies, never references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Resource)]
pub struct Counters {
    pub arrivals: u64,
    pub departures: u64,
    pub requests: u64,
    pub returns: u64,
    pub inquiries: u64,
    pub rejections: u64,
    /// Sum of residence times of everyone who has left.
    pub residence_time_total: f64,
    /// Simulated minutes spent with the library closed to new arrivals.
    pub closed_time_total: f64,
}

impl Counters {
    pub(crate) fn record_arrival(&mut self, action: ActionKind) {
        self.arrivals += 1;
        match action {
            ActionKind::RequestBook => self.requests += 1,
            ActionKind::ReturnBook => self.returns += 1,
            ActionKind::Inquire => self.inquiries += 1,
        }
    }

    pub(crate) fn record_departure(&mut self, residence_time: f64) {
        self.departures += 1;
        self.residence_time_total += residence_time;
    }
}

/// Which decision a variate was drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum VariateSlot {
    ActionKind,
    RequestService,
    ReturnService,
    InquiryService,
    PageCount,
    StayDecision,
}

impl VariateSlot {
    pub fn service_for(action: ActionKind) -> Self {
        match action {
            ActionKind::RequestBook => VariateSlot::RequestService,
            ActionKind::ReturnBook => VariateSlot::ReturnService,
            ActionKind::Inquire => VariateSlot::InquiryService,
        }
    }
}

/// Variates drawn while processing the current event. Cleared before each event.
#[derive(Debug, Clone, Default, PartialEq, Resource)]
pub struct StepVariates(pub BTreeMap<VariateSlot, VariateDraw>);

impl StepVariates {
    pub(crate) fn record(&mut self, slot: VariateSlot, draw: VariateDraw) {
        let previous = self.0.insert(slot, draw);
        debug_assert!(previous.is_none(), "variate slot {slot:?} drawn twice in one step");
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

/// One person who left the library, recorded at departure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartureRecord {
    pub person: PersonId,
    pub action: ActionKind,
    pub arrived_at: f64,
    pub service_started_at: Option<f64>,
    pub service_ended_at: Option<f64>,
    pub departed_at: f64,
    pub book: Option<Book>,
    /// Full integration history for people who stayed to read.
    pub reading: Option<EulerIntegrator>,
}

impl DepartureRecord {
    pub(crate) fn from_person(person: &Person, departed_at: f64, reading: Option<EulerIntegrator>) -> Self {
        Self {
            person: person.id(),
            action: person.action(),
            arrived_at: person.arrived_at(),
            service_started_at: person.service_started_at(),
            service_ended_at: person.service_ended_at(),
            departed_at,
            book: person.book().copied(),
            reading,
        }
    }

    /// Time from arrival to departure.
    pub fn residence_time(&self) -> f64 {
        self.departed_at - self.arrived_at
    }

    /// Time spent waiting in the attention queue.
    pub fn queue_wait(&self) -> Option<f64> {
        self.service_started_at.map(|start| start - self.arrived_at)
    }
}

/// An arrival turned away because the library was full.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RejectedArrival {
    pub person: PersonId,
    pub action: ActionKind,
    pub at: f64,
}

#[derive(Debug, Default, Resource)]
pub struct LibraryTelemetry {
    pub departures: Vec<DepartureRecord>,
    pub rejected: Vec<RejectedArrival>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrivals_are_counted_per_action() {
        let mut counters = Counters::default();
        counters.record_arrival(ActionKind::RequestBook);
        counters.record_arrival(ActionKind::ReturnBook);
        counters.record_arrival(ActionKind::ReturnBook);
        counters.record_arrival(ActionKind::Inquire);
        assert_eq!(counters.arrivals, 4);
        assert_eq!(counters.requests, 1);
        assert_eq!(counters.returns, 2);
        assert_eq!(counters.inquiries, 1);
    }

    #[test]
    fn departures_accumulate_residence() {
        let mut counters = Counters::default();
        counters.record_departure(3.5);
        counters.record_departure(6.5);
        assert_eq!(counters.departures, 2);
        assert_eq!(counters.residence_time_total, 10.0);
    }

    #[test]
    fn departure_record_derived_times() {
        let record = DepartureRecord {
            person: PersonId(1),
            action: ActionKind::Inquire,
            arrived_at: 4.0,
            service_started_at: Some(6.0),
            service_ended_at: Some(9.0),
            departed_at: 9.0,
            book: None,
            reading: None,
        };
        assert_eq!(record.residence_time(), 5.0);
        assert_eq!(record.queue_wait(), Some(2.0));
    }
}
