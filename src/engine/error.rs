use ulid::Ulid;

#[derive(Debug)]
pub enum EngineError {
    /// Malformed input at entity creation.
    Validation(&'static str),
    ConferenceExists(String),
    UserExists(String),
    ConferenceNotFound(String),
    UserNotFound(String),
    BookingNotFound(Ulid),
    /// The user already holds a non-canceled booking for this conference.
    DuplicateBooking { conference: String, existing: Ulid },
    /// The candidate window overlaps one of the user's confirmed bookings.
    Conflict { conference: String, with: Ulid },
    AlreadyStarted(String),
    AlreadyCanceled(Ulid),
    NotWaitlisted(Ulid),
    /// Race lost between check and acquire — no seat left.
    NoSlot(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "validation failed: {msg}"),
            EngineError::ConferenceExists(name) => {
                write!(f, "conference already exists: {name}")
            }
            EngineError::UserExists(id) => write!(f, "user already exists: {id}"),
            EngineError::ConferenceNotFound(name) => write!(f, "conference not found: {name}"),
            EngineError::UserNotFound(id) => write!(f, "user not found: {id}"),
            EngineError::BookingNotFound(id) => write!(f, "booking not found: {id}"),
            EngineError::DuplicateBooking {
                conference,
                existing,
            } => {
                write!(
                    f,
                    "active booking {existing} already exists for conference {conference}"
                )
            }
            EngineError::Conflict { conference, with } => {
                write!(
                    f,
                    "time conflict on conference {conference} with confirmed booking {with}"
                )
            }
            EngineError::AlreadyStarted(name) => {
                write!(f, "conference has already started: {name}")
            }
            EngineError::AlreadyCanceled(id) => write!(f, "booking is already canceled: {id}"),
            EngineError::NotWaitlisted(id) => write!(f, "booking is not waitlisted: {id}"),
            EngineError::NoSlot(name) => write!(f, "no slots available on conference: {name}"),
        }
    }
}

impl std::error::Error for EngineError {}
