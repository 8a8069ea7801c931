//! Entity model: people, employees and books.
//!
//! Lifecycle fields are private. Only engine systems move a person or an employee
//! between states, through transitions checked against the tables below.

use std::fmt;

use bevy_ecs::prelude::{Component, Entity};
use serde::Serialize;

use crate::config::BookTiers;
use crate::distributions::VariateDraw;
use crate::integrator::EulerIntegrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PersonId(pub u64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EmployeeId(pub usize);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0 + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BookId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    RequestBook,
    ReturnBook,
    Inquire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PersonState {
    Queued,
    BeingServed,
    Reading,
    Departed,
}

impl PersonState {
    pub fn can_transition_to(self, next: PersonState) -> bool {
        matches!(
            (self, next),
            (PersonState::Queued, PersonState::BeingServed)
                | (PersonState::BeingServed, PersonState::Reading)
                | (PersonState::BeingServed, PersonState::Departed)
                | (PersonState::Reading, PersonState::Departed)
        )
    }
}

/// Variates drawn on behalf of one person, kept for the state table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PersonVariates {
    pub action: Option<VariateDraw>,
    pub service_time: Option<VariateDraw>,
    pub pages: Option<VariateDraw>,
    pub stay_decision: Option<VariateDraw>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Book {
    id: BookId,
    pages: u32,
    k: f64,
}

impl Book {
    pub fn new(id: BookId, pages: u32, tiers: &BookTiers) -> Self {
        Self {
            id,
            pages,
            k: tiers.reading_constant(pages),
        }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Reading constant K of the book's tier.
    pub fn k(&self) -> f64 {
        self.k
    }
}

#[derive(Debug, Clone, PartialEq, Component)]
pub struct Person {
    id: PersonId,
    action: ActionKind,
    state: PersonState,
    arrived_at: f64,
    service_started_at: Option<f64>,
    service_ended_at: Option<f64>,
    exited_at: Option<f64>,
    book: Option<Book>,
    variates: PersonVariates,
}

impl Person {
    pub(crate) fn arrive(
        id: PersonId,
        action: ActionKind,
        arrived_at: f64,
        action_draw: VariateDraw,
    ) -> Self {
        Self {
            id,
            action,
            state: PersonState::Queued,
            arrived_at,
            service_started_at: None,
            service_ended_at: None,
            exited_at: None,
            book: None,
            variates: PersonVariates {
                action: Some(action_draw),
                ..PersonVariates::default()
            },
        }
    }

    fn transition(&mut self, next: PersonState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid person transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    pub(crate) fn begin_service(&mut self, now: f64, ends_at: f64, draw: VariateDraw) {
        self.transition(PersonState::BeingServed);
        self.service_started_at = Some(now);
        self.service_ended_at = Some(ends_at);
        self.variates.service_time = Some(draw);
    }

    pub(crate) fn receive_book(&mut self, book: Book, pages_draw: VariateDraw, stay_draw: VariateDraw) {
        self.book = Some(book);
        self.variates.pages = Some(pages_draw);
        self.variates.stay_decision = Some(stay_draw);
    }

    pub(crate) fn start_reading(&mut self) {
        self.transition(PersonState::Reading);
    }

    /// Marks the person as gone and returns the residence time.
    pub(crate) fn depart(&mut self, now: f64) -> f64 {
        self.transition(PersonState::Departed);
        self.exited_at = Some(now);
        now - self.arrived_at
    }

    pub fn id(&self) -> PersonId {
        self.id
    }

    pub fn action(&self) -> ActionKind {
        self.action
    }

    pub fn state(&self) -> PersonState {
        self.state
    }

    pub fn arrived_at(&self) -> f64 {
        self.arrived_at
    }

    pub fn service_started_at(&self) -> Option<f64> {
        self.service_started_at
    }

    pub fn service_ended_at(&self) -> Option<f64> {
        self.service_ended_at
    }

    pub fn exited_at(&self) -> Option<f64> {
        self.exited_at
    }

    pub fn book(&self) -> Option<&Book> {
        self.book.as_ref()
    }

    pub fn variates(&self) -> &PersonVariates {
        &self.variates
    }

    /// Arrival to exit, once the person has left.
    pub fn residence_time(&self) -> Option<f64> {
        self.exited_at.map(|exit| exit - self.arrived_at)
    }
}

/// Reading session of a person who stayed with the book.
#[derive(Debug, Clone, PartialEq, Component)]
pub struct ReadingProgress {
    pub integrator: EulerIntegrator,
    pub started_at: f64,
    pub ends_at: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EmployeeState {
    Free,
    Busy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    id: EmployeeId,
    state: EmployeeState,
    serving: Option<(Entity, PersonId)>,
    service_ends_at: Option<f64>,
}

impl Employee {
    pub fn new(id: EmployeeId) -> Self {
        Self {
            id,
            state: EmployeeState::Free,
            serving: None,
            service_ends_at: None,
        }
    }

    pub(crate) fn assign(&mut self, person: Entity, person_id: PersonId, ends_at: f64) {
        debug_assert_eq!(self.state, EmployeeState::Free, "employee already busy");
        self.state = EmployeeState::Busy;
        self.serving = Some((person, person_id));
        self.service_ends_at = Some(ends_at);
    }

    /// Frees the employee and returns the person that was being served.
    pub(crate) fn release(&mut self) -> Option<Entity> {
        debug_assert_eq!(self.state, EmployeeState::Busy, "employee already free");
        self.state = EmployeeState::Free;
        self.service_ends_at = None;
        self.serving.take().map(|(entity, _)| entity)
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    pub fn state(&self) -> EmployeeState {
        self.state
    }

    pub fn is_free(&self) -> bool {
        self.state == EmployeeState::Free
    }

    pub fn serving(&self) -> Option<PersonId> {
        self.serving.map(|(_, id)| id)
    }

    pub fn service_ends_at(&self) -> Option<f64> {
        self.service_ends_at
    }
}
