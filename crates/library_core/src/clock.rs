//! Future event list and simulation clock.
//!
//! Events are ordered by timestamp, then by kind priority, then by insertion
//! sequence, so two events scheduled for the same instant are processed in the order
//! they were scheduled. `SimulationEnd` sorts after every other kind at the same
//! instant: work that lands exactly on the horizon still happens.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::{Entity, Resource};
use serde::Serialize;

use crate::ecs::EmployeeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EventKind {
    Arrival,
    ServiceEnd,
    ReadingEnd,
    SimulationEnd,
}

impl EventKind {
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Arrival => "Arrival",
            EventKind::ServiceEnd => "ServiceEnd",
            EventKind::ReadingEnd => "ReadingEnd",
            EventKind::SimulationEnd => "SimulationEnd",
        }
    }

    fn priority(self) -> u8 {
        match self {
            EventKind::SimulationEnd => 1,
            _ => 0,
        }
    }
}

/// What a handler needs to process the event, per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPayload {
    Arrival,
    ServiceEnd { employee: EmployeeId, person: Entity },
    ReadingEnd { person: Entity },
    SimulationEnd,
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Arrival => EventKind::Arrival,
            EventPayload::ServiceEnd { .. } => EventKind::ServiceEnd,
            EventPayload::ReadingEnd { .. } => EventKind::ReadingEnd,
            EventPayload::SimulationEnd => EventKind::SimulationEnd,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Event {
    /// Simulated minutes.
    pub timestamp: f64,
    /// Insertion order within the owning clock.
    pub sequence: u64,
    pub payload: EventPayload,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    fn schedule_order(&self, other: &Self) -> Ordering {
        self.timestamp
            .total_cmp(&other.timestamp)
            .then_with(|| self.kind().priority().cmp(&other.kind().priority()))
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.schedule_order(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap.
        other.schedule_order(self)
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event being processed by the current schedule run.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: f64,
    next_sequence: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Inserts an event at an absolute time and returns its sequence number.
    pub fn schedule_at(&mut self, timestamp: f64, payload: EventPayload) -> u64 {
        debug_assert!(
            timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push(Event {
            timestamp,
            sequence,
            payload,
        });
        sequence
    }

    pub fn schedule_in(&mut self, delay: f64, payload: EventPayload) -> u64 {
        self.schedule_at(self.now + delay, payload)
    }

    /// Removes the earliest event and advances the clock to it.
    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    /// The next `count` pending events in processing order, without removing them.
    pub fn peek_next(&self, count: usize) -> Vec<Event> {
        let mut pending: Vec<Event> = self.events.iter().copied().collect();
        pending.sort_by(|a, b| a.schedule_order(b));
        pending.truncate(count);
        pending
    }

    pub fn next_event_time(&self) -> Option<f64> {
        self.events.peek().map(|event| event.timestamp)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn clock_pops_events_in_time_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(10.0, EventPayload::Arrival);
        clock.schedule_at(5.0, EventPayload::Arrival);
        clock.schedule_at(20.0, EventPayload::Arrival);

        let first = clock.pop_next().expect("first event");
        assert_eq!(first.timestamp, 5.0);
        assert_eq!(clock.now(), 5.0);

        let second = clock.pop_next().expect("second event");
        assert_eq!(second.timestamp, 10.0);
        assert_eq!(clock.now(), 10.0);

        let third = clock.pop_next().expect("third event");
        assert_eq!(third.timestamp, 20.0);
        assert_eq!(clock.now(), 20.0);

        assert!(clock.pop_next().is_none());
        assert!(clock.is_empty());
    }

    #[test]
    fn equal_timestamps_pop_in_insertion_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(3.0, EventPayload::ReadingEnd { person: person(1) });
        clock.schedule_at(3.0, EventPayload::Arrival);
        clock.schedule_at(
            3.0,
            EventPayload::ServiceEnd {
                employee: EmployeeId(0),
                person: person(2),
            },
        );
        clock.schedule_at(3.0, EventPayload::ReadingEnd { person: person(3) });

        let order: Vec<EventPayload> = std::iter::from_fn(|| clock.pop_next())
            .map(|event| event.payload)
            .collect();
        assert_eq!(
            order,
            vec![
                EventPayload::ReadingEnd { person: person(1) },
                EventPayload::Arrival,
                EventPayload::ServiceEnd {
                    employee: EmployeeId(0),
                    person: person(2),
                },
                EventPayload::ReadingEnd { person: person(3) },
            ]
        );
    }

    #[test]
    fn simulation_end_yields_to_same_time_events() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(20.0, EventPayload::SimulationEnd);
        clock.schedule_at(20.0, EventPayload::Arrival);

        assert_eq!(clock.pop_next().map(|e| e.kind()), Some(EventKind::Arrival));
        assert_eq!(
            clock.pop_next().map(|e| e.kind()),
            Some(EventKind::SimulationEnd)
        );
    }

    #[test]
    fn peek_next_is_non_destructive_and_ordered() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(8.0, EventPayload::Arrival);
        clock.schedule_at(480.0, EventPayload::SimulationEnd);
        clock.schedule_at(6.5, EventPayload::ReadingEnd { person: person(4) });

        let peeked: Vec<(EventKind, f64)> = clock
            .peek_next(2)
            .iter()
            .map(|event| (event.kind(), event.timestamp))
            .collect();
        assert_eq!(
            peeked,
            vec![(EventKind::ReadingEnd, 6.5), (EventKind::Arrival, 8.0)]
        );
        assert_eq!(clock.len(), 3);
        assert_eq!(clock.now(), 0.0);
        assert_eq!(clock.next_event_time(), Some(6.5));
    }

    #[test]
    fn schedule_in_is_relative_to_now() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(4.0, EventPayload::Arrival);
        clock.pop_next();
        clock.schedule_in(2.5, EventPayload::Arrival);
        assert_eq!(clock.next_event_time(), Some(6.5));
    }
}
