//! The library aggregate: counter staff, attention queue and occupancy.
//!
//! `closed` is derived from occupancy and recomputed by every mutation that changes
//! who is inside, so it can never disagree with `persons_inside() >= capacity`.

use std::collections::VecDeque;

use bevy_ecs::prelude::{Entity, Resource};

use crate::ecs::{BookId, Employee, EmployeeId, PersonId};

#[derive(Debug, Resource)]
pub struct Library {
    employees: Vec<Employee>,
    queue: VecDeque<(Entity, PersonId)>,
    reading: Vec<(Entity, PersonId)>,
    inside: Vec<(Entity, PersonId)>,
    capacity: usize,
    closed: bool,
    next_person: u64,
    next_book: u64,
}

impl Library {
    pub fn new(employees: usize, capacity: usize) -> Self {
        Self {
            employees: (0..employees).map(|i| Employee::new(EmployeeId(i))).collect(),
            queue: VecDeque::new(),
            reading: Vec::new(),
            inside: Vec::new(),
            capacity,
            closed: false,
            next_person: 0,
            next_book: 0,
        }
    }

    pub(crate) fn allocate_person_id(&mut self) -> PersonId {
        self.next_person += 1;
        PersonId(self.next_person)
    }

    pub(crate) fn allocate_book_id(&mut self) -> BookId {
        self.next_book += 1;
        BookId(self.next_book)
    }

    /// Lets a person in and puts them at the back of the attention queue.
    pub(crate) fn admit(&mut self, person: Entity, id: PersonId) {
        debug_assert!(!self.closed, "admission while closed");
        self.queue.push_back((person, id));
        self.inside.push((person, id));
        self.refresh_closed();
    }

    pub(crate) fn pop_queue(&mut self) -> Option<(Entity, PersonId)> {
        self.queue.pop_front()
    }

    pub(crate) fn start_reading(&mut self, person: Entity, id: PersonId) {
        self.reading.push((person, id));
    }

    /// Removes a person from the building. Returns `false` if they were not inside.
    pub(crate) fn depart(&mut self, person: Entity) -> bool {
        self.reading.retain(|(entity, _)| *entity != person);
        let before = self.inside.len();
        self.inside.retain(|(entity, _)| *entity != person);
        self.refresh_closed();
        self.inside.len() < before
    }

    pub(crate) fn employee_mut(&mut self, id: EmployeeId) -> Option<&mut Employee> {
        self.employees.get_mut(id.0)
    }

    fn refresh_closed(&mut self) {
        self.closed = self.inside.len() >= self.capacity;
    }

    /// Lowest-numbered free employee.
    pub fn first_free_employee(&self) -> Option<EmployeeId> {
        self.employees
            .iter()
            .find(|employee| employee.is_free())
            .map(Employee::id)
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn employee(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.get(id.0)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn persons_inside(&self) -> usize {
        self.inside.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queued(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.queue.iter().map(|(_, id)| *id)
    }

    pub fn reading(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.reading.iter().map(|(_, id)| *id)
    }

    pub fn reading_count(&self) -> usize {
        self.reading.len()
    }

    pub fn being_served_count(&self) -> usize {
        self.employees.iter().filter(|e| !e.is_free()).count()
    }
}
