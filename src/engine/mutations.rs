use tracing::{debug, info};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::conflict::{find_conflicting_booking, validate_window};
use super::store::CoreState;
use super::{Engine, EngineError};

/// Existing non-canceled booking by `user_id` on `conference`, if any.
fn active_booking_for(state: &CoreState, user_id: &str, conference: &str) -> Option<Ulid> {
    let user = state.user(user_id)?;
    user.active_bookings().into_iter().find(|id| {
        state
            .booking(id)
            .is_some_and(|b| b.conference == conference && b.status.is_active())
    })
}

impl Engine {
    /// Register a conference. Seats are fixed at creation; `available_slots`
    /// starts at `total_slots`.
    pub async fn register_conference(
        &self,
        name: &str,
        location: &str,
        topics: Vec<String>,
        start: Ms,
        end: Ms,
        total_slots: u32,
    ) -> Result<(), EngineError> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(EngineError::Validation(
                "conference name length out of range",
            ));
        }
        if location.len() > MAX_LOCATION_LEN {
            return Err(EngineError::Validation("location too long"));
        }
        if topics.len() > MAX_CONFERENCE_TOPICS {
            return Err(EngineError::Validation("maximum 10 topics allowed"));
        }
        if total_slots == 0 {
            return Err(EngineError::Validation("slots must be greater than 0"));
        }
        let window = validate_window(start, end)?;

        let mut state = self.state.write().await;
        if state.conference_count() >= MAX_CONFERENCES {
            return Err(EngineError::Validation("too many conferences"));
        }
        if state.contains_conference(name) {
            return Err(EngineError::ConferenceExists(name.to_string()));
        }
        state.insert_conference(Conference::new(
            name.to_string(),
            location.to_string(),
            topics,
            window,
            total_slots,
        ));
        info!("registered conference {name} with {total_slots} slots");
        Ok(())
    }

    pub async fn register_user(
        &self,
        user_id: &str,
        topics: Vec<String>,
    ) -> Result<(), EngineError> {
        if user_id.is_empty() || user_id.len() > MAX_NAME_LEN {
            return Err(EngineError::Validation("user id length out of range"));
        }
        if topics.len() > MAX_USER_TOPICS {
            return Err(EngineError::Validation(
                "maximum 50 interested topics allowed",
            ));
        }
        let mut state = self.state.write().await;
        if state.user_count() >= MAX_USERS {
            return Err(EngineError::Validation("too many users"));
        }
        if state.contains_user(user_id) {
            return Err(EngineError::UserExists(user_id.to_string()));
        }
        state.insert_user(User::new(user_id.to_string(), topics));
        info!("registered user {user_id}");
        Ok(())
    }

    /// Book a seat, or join the waitlist when the conference is full.
    /// Returns the new booking id.
    pub async fn book_conference(
        &self,
        user_id: &str,
        conference: &str,
    ) -> Result<Ulid, EngineError> {
        let mut state = self.state.write().await;
        let now = self.now_ms();

        if !state.contains_user(user_id) {
            return Err(EngineError::UserNotFound(user_id.to_string()));
        }
        let window = {
            let conf = state
                .conference(conference)
                .ok_or_else(|| EngineError::ConferenceNotFound(conference.to_string()))?;
            if conf.has_started(now) {
                return Err(EngineError::AlreadyStarted(conference.to_string()));
            }
            conf.window
        };

        // One non-canceled booking per (user, conference).
        if let Some(existing) = active_booking_for(&state, user_id, conference) {
            return Err(EngineError::DuplicateBooking {
                conference: conference.to_string(),
                existing,
            });
        }

        if let Some(with) = find_conflicting_booking(&state, user_id, &window) {
            return Err(EngineError::Conflict {
                conference: conference.to_string(),
                with,
            });
        }

        let Some(conf) = state.conference_mut(conference) else {
            return Err(EngineError::ConferenceNotFound(conference.to_string()));
        };
        let status = if conf.try_acquire_slot() {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Waitlisted
        };

        let booking = Booking::new(user_id.to_string(), conference.to_string(), status);
        let booking_id = booking.id;
        state.insert_booking(booking);
        if let Some(user) = state.user_mut(user_id) {
            user.record_booking(booking_id, status);
        }

        match status {
            BookingStatus::Confirmed => {
                info!("booking {booking_id}: confirmed seat on {conference} for {user_id}");
                self.evict_overlapping_waitlists(&mut state, user_id, conference, &window);
            }
            _ => {
                info!("booking {booking_id}: {conference} is full, waitlisted {user_id}");
                state.enqueue_waitlisted(conference, booking_id);
                metrics::gauge!(observability::WAITLIST_DEPTH, "conference" => conference.to_string())
                    .set(state.waitlist_len(conference) as f64);
            }
        }

        metrics::counter!(
            observability::BOOKINGS_TOTAL,
            "outcome" => observability::status_label(status)
        )
        .increment(1);
        self.notify.send(
            conference,
            &BookingEvent::BookingCreated {
                booking_id,
                user_id: user_id.to_string(),
                status,
            },
        );
        Ok(booking_id)
    }

    /// Cancel a booking. A confirmed booking's seat is reclaimed and the
    /// waitlist head is offered it; a waitlisted booking just leaves the
    /// queue.
    pub async fn cancel_booking(&self, booking_id: Ulid) -> Result<(), EngineError> {
        let mut state = self.state.write().await;
        let now = self.now_ms();

        let (conference, user_id, status) = {
            let booking = state
                .booking(&booking_id)
                .ok_or(EngineError::BookingNotFound(booking_id))?;
            if booking.status == BookingStatus::Canceled {
                return Err(EngineError::AlreadyCanceled(booking_id));
            }
            (
                booking.conference.clone(),
                booking.user_id.clone(),
                booking.status,
            )
        };

        if let Some(conf) = state.conference(&conference)
            && conf.has_started(now)
        {
            return Err(EngineError::AlreadyStarted(conference));
        }

        match status {
            BookingStatus::Confirmed => {
                if let Some(conf) = state.conference_mut(&conference) {
                    conf.release_slot();
                    let available_slots = conf.available_slots;
                    info!("slot freed on {conference}: {available_slots} available");
                    self.notify.send(
                        &conference,
                        &BookingEvent::SlotFreed {
                            conference: conference.clone(),
                            available_slots,
                        },
                    );
                }
                self.process_waitlist(&mut state, &conference, now);
            }
            BookingStatus::Waitlisted => {
                state.remove_from_waitlist(&conference, &booking_id);
                metrics::gauge!(observability::WAITLIST_DEPTH, "conference" => conference.clone())
                    .set(state.waitlist_len(&conference) as f64);
                debug!("removed {booking_id} from {conference} waitlist");
            }
            BookingStatus::Canceled => {} // rejected above
        }

        if let Some(booking) = state.booking_mut(&booking_id) {
            booking.status = BookingStatus::Canceled;
            booking.confirmation_deadline = None;
        }
        if let Some(user) = state.user_mut(&user_id) {
            user.remove_booking(&booking_id);
        }

        metrics::counter!(observability::CANCELLATIONS_TOTAL, "source" => "user").increment(1);
        self.notify.send(
            &conference,
            &BookingEvent::BookingCanceled { booking_id, user_id },
        );
        info!("canceled booking {booking_id}");
        Ok(())
    }

    /// Second phase of waitlist promotion: the head claims the seat it was
    /// offered. `Ok(false)` means the confirmation window had closed and the
    /// booking was requeued at the back — not a failure.
    pub async fn confirm_waitlisted_booking(&self, booking_id: Ulid) -> Result<bool, EngineError> {
        let mut state = self.state.write().await;
        let now = self.now_ms();

        let (conference, user_id, deadline) = {
            let booking = state
                .booking(&booking_id)
                .ok_or(EngineError::BookingNotFound(booking_id))?;
            if booking.status != BookingStatus::Waitlisted {
                return Err(EngineError::NotWaitlisted(booking_id));
            }
            (
                booking.conference.clone(),
                booking.user_id.clone(),
                booking.confirmation_deadline,
            )
        };

        let (window, started) = {
            let conf = state
                .conference(&conference)
                .ok_or_else(|| EngineError::ConferenceNotFound(conference.clone()))?;
            (conf.window, conf.has_started(now))
        };

        // Nobody on the waitlist can be seated once the session is underway.
        if started {
            self.cancel_all_waitlisted(&mut state, &conference);
            return Err(EngineError::AlreadyStarted(conference));
        }

        // Not timely: never promoted to head, or the grace window closed.
        if deadline.is_none_or(|d| now > d) {
            state.requeue_to_back(&conference, booking_id);
            if let Some(booking) = state.booking_mut(&booking_id) {
                booking.confirmation_deadline = None;
            }
            info!("confirmation window closed for {booking_id}, requeued at back of {conference}");
            metrics::counter!(observability::WAITLIST_REQUEUES_TOTAL).increment(1);
            self.notify.send(
                &conference,
                &BookingEvent::BookingRequeued {
                    booking_id,
                    user_id,
                },
            );
            let slot_free = state
                .conference(&conference)
                .is_some_and(|c| c.has_slot_available());
            if slot_free {
                self.process_waitlist(&mut state, &conference, now);
            }
            return Ok(false);
        }

        // The user's situation may have changed since queueing.
        if let Some(with) = find_conflicting_booking(&state, &user_id, &window) {
            return Err(EngineError::Conflict { conference, with });
        }

        let Some(conf) = state.conference_mut(&conference) else {
            return Err(EngineError::ConferenceNotFound(conference));
        };
        if !conf.try_acquire_slot() {
            return Err(EngineError::NoSlot(conference));
        }

        state.remove_from_waitlist(&conference, &booking_id);
        metrics::gauge!(observability::WAITLIST_DEPTH, "conference" => conference.clone())
            .set(state.waitlist_len(&conference) as f64);
        if let Some(booking) = state.booking_mut(&booking_id) {
            booking.status = BookingStatus::Confirmed;
            booking.confirmation_deadline = None;
        }
        if let Some(user) = state.user_mut(&user_id) {
            user.update_status(booking_id, BookingStatus::Confirmed);
        }
        info!("waitlisted booking {booking_id} confirmed on {conference}");
        metrics::counter!(observability::WAITLIST_CONFIRMATIONS_TOTAL).increment(1);
        self.notify.send(
            &conference,
            &BookingEvent::BookingConfirmed {
                booking_id,
                user_id: user_id.clone(),
            },
        );

        self.evict_overlapping_waitlists(&mut state, &user_id, &conference, &window);
        Ok(true)
    }

    /// First phase of promotion: stamp a confirmation deadline on the head of
    /// the queue and tell the notification collaborator. The booking's status
    /// does not change — the user must still confirm.
    fn process_waitlist(&self, state: &mut CoreState, conference: &str, now: Ms) {
        let Some(head) = state.waitlist_head(conference) else {
            debug!("no waitlisted bookings on {conference}");
            return;
        };
        let deadline = now + self.config.confirmation_grace_ms;
        let Some(booking) = state.booking_mut(&head) else {
            return;
        };
        booking.confirmation_deadline = Some(deadline);
        let user_id = booking.user_id.clone();
        info!("confirmation window open for {head} ({user_id}) on {conference} until {deadline}");
        metrics::counter!(observability::WAITLIST_PROMOTIONS_TOTAL).increment(1);
        self.notify.send(
            conference,
            &BookingEvent::ConfirmationWindowOpened {
                booking_id: head,
                user_id,
                deadline,
            },
        );
    }

    /// A user confirmed into `booked`'s time region cannot attend a
    /// waitlisted alternative overlapping it, so those reservations are
    /// canceled rather than left blocking other users.
    fn evict_overlapping_waitlists(
        &self,
        state: &mut CoreState,
        user_id: &str,
        booked: &str,
        window: &Span,
    ) {
        let overlapping: Vec<String> = state
            .conferences()
            .filter(|c| c.name != booked && c.overlaps(window))
            .map(|c| c.name.clone())
            .collect();

        for conference in overlapping {
            let evicted: Vec<Ulid> = state
                .waitlist_ids(&conference)
                .into_iter()
                .filter(|id| state.booking(id).is_some_and(|b| b.user_id == user_id))
                .collect();
            for booking_id in evicted {
                state.remove_from_waitlist(&conference, &booking_id);
                if let Some(booking) = state.booking_mut(&booking_id) {
                    booking.status = BookingStatus::Canceled;
                    booking.confirmation_deadline = None;
                }
                if let Some(user) = state.user_mut(user_id) {
                    user.update_status(booking_id, BookingStatus::Canceled);
                }
                info!("evicted overlapping waitlisted booking {booking_id} on {conference}");
                metrics::counter!(observability::CANCELLATIONS_TOTAL, "source" => "eviction")
                    .increment(1);
                self.notify.send(
                    &conference,
                    &BookingEvent::BookingCanceled {
                        booking_id,
                        user_id: user_id.to_string(),
                    },
                );
            }
            metrics::gauge!(observability::WAITLIST_DEPTH, "conference" => conference.clone())
                .set(state.waitlist_len(&conference) as f64);
        }
    }

    /// The conference started while bookings sat on its waitlist — none of
    /// them can be seated now, so the whole queue is canceled.
    fn cancel_all_waitlisted(&self, state: &mut CoreState, conference: &str) {
        let drained = state.drain_waitlist(conference);
        if drained.is_empty() {
            return;
        }
        info!(
            "canceling {} waitlisted bookings on started conference {conference}",
            drained.len()
        );
        for booking_id in drained {
            let user_id = match state.booking_mut(&booking_id) {
                Some(booking) => {
                    booking.status = BookingStatus::Canceled;
                    booking.confirmation_deadline = None;
                    booking.user_id.clone()
                }
                None => continue,
            };
            if let Some(user) = state.user_mut(&user_id) {
                user.update_status(booking_id, BookingStatus::Canceled);
            }
            metrics::counter!(observability::CANCELLATIONS_TOTAL, "source" => "mass_cancel")
                .increment(1);
            self.notify.send(
                conference,
                &BookingEvent::BookingCanceled {
                    booking_id,
                    user_id,
                },
            );
        }
        metrics::gauge!(observability::WAITLIST_DEPTH, "conference" => conference.to_string())
            .set(0.0);
    }
}
