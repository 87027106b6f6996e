use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::store::CoreState;
use super::EngineError;

/// Validate a conference time window at registration and build the `Span`.
pub(crate) fn validate_window(start: Ms, end: Ms) -> Result<Span, EngineError> {
    if start >= end {
        return Err(EngineError::Validation("start time must be before end time"));
    }
    if start < MIN_VALID_TIMESTAMP_MS || end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::Validation("timestamp out of range"));
    }
    let span = Span::new(start, end);
    if span.duration_ms() > MAX_CONFERENCE_DURATION_MS {
        return Err(EngineError::Validation(
            "conference duration cannot exceed 12 hours",
        ));
    }
    Ok(span)
}

/// Find a confirmed booking of `user_id` whose conference window overlaps
/// `candidate`. Waitlisted bookings never conflict: a user may queue behind
/// any number of overlapping sessions, but holds at most one confirmed seat
/// per time region. Returns the first offending booking id.
pub(crate) fn find_conflicting_booking(
    state: &CoreState,
    user_id: &str,
    candidate: &Span,
) -> Option<Ulid> {
    let user = state.user(user_id)?;
    for booking_id in user.active_bookings() {
        let Some(booking) = state.booking(&booking_id) else {
            continue;
        };
        if booking.status != BookingStatus::Confirmed {
            continue;
        }
        let Some(conf) = state.conference(&booking.conference) else {
            continue;
        };
        if conf.overlaps(candidate) {
            return Some(booking_id);
        }
    }
    None
}
