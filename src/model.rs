use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Lifecycle states of a booking. `Canceled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    /// Consuming a real seat.
    Confirmed,
    /// Queued behind full capacity, not consuming a seat.
    Waitlisted,
    /// Disregarded in all further computations.
    Canceled,
}

impl BookingStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, BookingStatus::Canceled)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Waitlisted => "WAITLISTED",
            BookingStatus::Canceled => "CANCELED",
        };
        f.write_str(s)
    }
}

/// A registered conference session. Immutable after registration except for
/// `available_slots`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    pub name: String,
    pub location: String,
    pub topics: Vec<String>,
    pub window: Span,
    pub total_slots: u32,
    pub available_slots: u32,
}

impl Conference {
    pub fn new(
        name: String,
        location: String,
        topics: Vec<String>,
        window: Span,
        total_slots: u32,
    ) -> Self {
        debug_assert!(total_slots > 0, "conference must have at least one slot");
        Self {
            name,
            location,
            topics,
            window,
            total_slots,
            available_slots: total_slots,
        }
    }

    /// Take one seat. Returns true iff a seat was available.
    pub fn try_acquire_slot(&mut self) -> bool {
        if self.available_slots > 0 {
            self.available_slots -= 1;
            true
        } else {
            false
        }
    }

    /// Return one seat, capped at `total_slots`.
    pub fn release_slot(&mut self) {
        if self.available_slots < self.total_slots {
            self.available_slots += 1;
        }
    }

    pub fn has_slot_available(&self) -> bool {
        self.available_slots > 0
    }

    pub fn has_started(&self, now: Ms) -> bool {
        now >= self.window.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.window.overlaps(other)
    }
}

/// A registered attendee and their booking-id → status map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub interested_topics: Vec<String>,
    bookings: HashMap<Ulid, BookingStatus>,
}

impl User {
    pub fn new(user_id: String, interested_topics: Vec<String>) -> Self {
        Self {
            user_id,
            interested_topics,
            bookings: HashMap::new(),
        }
    }

    pub fn record_booking(&mut self, booking_id: Ulid, status: BookingStatus) {
        self.bookings.insert(booking_id, status);
    }

    /// No-op if the booking is unknown to this user.
    pub fn update_status(&mut self, booking_id: Ulid, status: BookingStatus) {
        if let Some(s) = self.bookings.get_mut(&booking_id) {
            *s = status;
        }
    }

    pub fn remove_booking(&mut self, booking_id: &Ulid) {
        self.bookings.remove(booking_id);
    }

    /// Booking ids whose recorded status is not `Canceled`.
    pub fn active_bookings(&self) -> Vec<Ulid> {
        self.bookings
            .iter()
            .filter(|(_, status)| status.is_active())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn recorded_status(&self, booking_id: &Ulid) -> Option<BookingStatus> {
        self.bookings.get(booking_id).copied()
    }
}

/// One seat request by one user on one conference. `user_id` and `conference`
/// never change after creation; `status` moves only through the engine's
/// transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub user_id: String,
    pub conference: String,
    pub status: BookingStatus,
    /// Stamped when this booking reaches the head of its conference's
    /// waitlist and a seat opens. `None` until then.
    pub confirmation_deadline: Option<Ms>,
}

impl Booking {
    pub fn new(user_id: String, conference: String, status: BookingStatus) -> Self {
        Self {
            id: Ulid::new(),
            user_id,
            conference,
            status,
            confirmation_deadline: None,
        }
    }
}

/// What the engine tells the notification collaborator. One broadcast channel
/// per conference; delivery to actual users is external.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingEvent {
    BookingCreated {
        booking_id: Ulid,
        user_id: String,
        status: BookingStatus,
    },
    BookingConfirmed {
        booking_id: Ulid,
        user_id: String,
    },
    BookingCanceled {
        booking_id: Ulid,
        user_id: String,
    },
    SlotFreed {
        conference: String,
        available_slots: u32,
    },
    /// The waitlist head may now claim the freed seat, until `deadline`.
    ConfirmationWindowOpened {
        booking_id: Ulid,
        user_id: String,
        deadline: Ms,
    },
    /// A confirm attempt arrived after the deadline; the booking moved to the
    /// back of the queue.
    BookingRequeued {
        booking_id: Ulid,
        user_id: String,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConferenceInfo {
    pub name: String,
    pub location: String,
    pub topics: Vec<String>,
    pub start: Ms,
    pub end: Ms,
    pub total_slots: u32,
    pub available_slots: u32,
}

impl From<&Conference> for ConferenceInfo {
    fn from(conf: &Conference) -> Self {
        Self {
            name: conf.name.clone(),
            location: conf.location.clone(),
            topics: conf.topics.clone(),
            start: conf.window.start,
            end: conf.window.end,
            total_slots: conf.total_slots,
            available_slots: conf.available_slots,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingInfo {
    pub id: Ulid,
    pub user_id: String,
    pub conference: String,
    pub status: BookingStatus,
    pub confirmation_deadline: Option<Ms>,
}

impl From<&Booking> for BookingInfo {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id,
            user_id: booking.user_id.clone(),
            conference: booking.conference.clone(),
            status: booking.status,
            confirmation_deadline: booking.confirmation_deadline,
        }
    }
}
