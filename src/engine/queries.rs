use tracing::debug;
use ulid::Ulid;

use crate::model::*;

use super::{Engine, EngineError};

impl Engine {
    /// Current status of a booking. Takes the read lock, so the answer is a
    /// committed state, never a mid-transition one.
    pub async fn booking_status(&self, booking_id: Ulid) -> Result<BookingStatus, EngineError> {
        let state = self.state.read().await;
        let booking = state
            .booking(&booking_id)
            .ok_or(EngineError::BookingNotFound(booking_id))?;
        if booking.status == BookingStatus::Waitlisted
            && let Some(conf) = state.conference(&booking.conference)
            && conf.has_slot_available()
            && let Some(deadline) = booking.confirmation_deadline
        {
            debug!(
                "slot on {} open for confirmation until {deadline}",
                booking.conference
            );
        }
        Ok(booking.status)
    }

    /// Full record view of a booking, confirmation deadline included.
    pub async fn booking(&self, booking_id: Ulid) -> Result<BookingInfo, EngineError> {
        let state = self.state.read().await;
        state
            .booking(&booking_id)
            .map(BookingInfo::from)
            .ok_or(EngineError::BookingNotFound(booking_id))
    }

    pub async fn list_conferences(&self) -> Vec<ConferenceInfo> {
        let state = self.state.read().await;
        state.conferences().map(ConferenceInfo::from).collect()
    }

    pub async fn conference(&self, name: &str) -> Result<ConferenceInfo, EngineError> {
        let state = self.state.read().await;
        state
            .conference(name)
            .map(ConferenceInfo::from)
            .ok_or_else(|| EngineError::ConferenceNotFound(name.to_string()))
    }

    /// The user's non-canceled bookings.
    pub async fn user_bookings(&self, user_id: &str) -> Result<Vec<BookingInfo>, EngineError> {
        let state = self.state.read().await;
        let user = state
            .user(user_id)
            .ok_or_else(|| EngineError::UserNotFound(user_id.to_string()))?;
        Ok(user
            .active_bookings()
            .into_iter()
            .filter_map(|id| state.booking(&id))
            .map(BookingInfo::from)
            .collect())
    }

    /// Queue contents in promotion order.
    pub async fn conference_waitlist(&self, conference: &str) -> Result<Vec<Ulid>, EngineError> {
        let state = self.state.read().await;
        if !state.contains_conference(conference) {
            return Err(EngineError::ConferenceNotFound(conference.to_string()));
        }
        Ok(state.waitlist_ids(conference))
    }
}
