pub mod clock;
pub mod engine;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;

pub use engine::{Engine, EngineConfig, EngineError};
pub use model::{
    Booking, BookingEvent, BookingInfo, BookingStatus, Conference, ConferenceInfo, Ms, Span, User,
};
pub use notify::NotifyHub;
