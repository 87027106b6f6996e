use std::collections::{HashMap, VecDeque};

use ulid::Ulid;

use crate::model::*;

/// The shared stores every engine operation touches — conference registry,
/// user registry, booking store, per-conference waitlists — aggregated into
/// one struct so a single lock guards them all (see `Engine`). A durable
/// backing store substitutes by replacing this struct behind the same API.
pub struct CoreState {
    conferences: HashMap<String, Conference>,
    users: HashMap<String, User>,
    bookings: HashMap<Ulid, Booking>,
    waitlists: HashMap<String, VecDeque<Ulid>>,
}

impl Default for CoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreState {
    pub fn new() -> Self {
        Self {
            conferences: HashMap::new(),
            users: HashMap::new(),
            bookings: HashMap::new(),
            waitlists: HashMap::new(),
        }
    }

    // ── Conference registry ──────────────────────────────────

    pub fn conference_count(&self) -> usize {
        self.conferences.len()
    }

    pub fn contains_conference(&self, name: &str) -> bool {
        self.conferences.contains_key(name)
    }

    pub fn conference(&self, name: &str) -> Option<&Conference> {
        self.conferences.get(name)
    }

    pub fn conference_mut(&mut self, name: &str) -> Option<&mut Conference> {
        self.conferences.get_mut(name)
    }

    pub fn insert_conference(&mut self, conf: Conference) {
        self.conferences.insert(conf.name.clone(), conf);
    }

    pub fn conferences(&self) -> impl Iterator<Item = &Conference> {
        self.conferences.values()
    }

    // ── User registry ────────────────────────────────────────

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    pub fn user_mut(&mut self, user_id: &str) -> Option<&mut User> {
        self.users.get_mut(user_id)
    }

    pub fn insert_user(&mut self, user: User) {
        self.users.insert(user.user_id.clone(), user);
    }

    // ── Booking store ────────────────────────────────────────

    pub fn booking(&self, id: &Ulid) -> Option<&Booking> {
        self.bookings.get(id)
    }

    pub fn booking_mut(&mut self, id: &Ulid) -> Option<&mut Booking> {
        self.bookings.get_mut(id)
    }

    pub fn insert_booking(&mut self, booking: Booking) {
        self.bookings.insert(booking.id, booking);
    }

    // ── Waitlists ────────────────────────────────────────────

    pub fn enqueue_waitlisted(&mut self, conference: &str, booking_id: Ulid) {
        self.waitlists
            .entry(conference.to_string())
            .or_default()
            .push_back(booking_id);
    }

    /// Head of the queue without removing it.
    pub fn waitlist_head(&self, conference: &str) -> Option<Ulid> {
        self.waitlists
            .get(conference)
            .and_then(|queue| queue.front().copied())
    }

    /// Remove an id from anywhere in the queue, preserving the relative order
    /// of the remaining entries. Returns true if it was present.
    pub fn remove_from_waitlist(&mut self, conference: &str, booking_id: &Ulid) -> bool {
        let Some(queue) = self.waitlists.get_mut(conference) else {
            return false;
        };
        let before = queue.len();
        queue.retain(|id| id != booking_id);
        queue.len() != before
    }

    /// Move an id to the back of its queue. No-op if absent.
    pub fn requeue_to_back(&mut self, conference: &str, booking_id: Ulid) {
        if self.remove_from_waitlist(conference, &booking_id) {
            self.enqueue_waitlisted(conference, booking_id);
        }
    }

    /// Empty the whole queue, returning its contents in order.
    pub fn drain_waitlist(&mut self, conference: &str) -> Vec<Ulid> {
        self.waitlists
            .get_mut(conference)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    pub fn waitlist_ids(&self, conference: &str) -> Vec<Ulid> {
        self.waitlists
            .get(conference)
            .map(|queue| queue.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn waitlist_len(&self, conference: &str) -> usize {
        self.waitlists.get(conference).map_or(0, |queue| queue.len())
    }
}
