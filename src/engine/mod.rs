mod conflict;
mod error;
mod mutations;
mod queries;
mod store;

pub use error::EngineError;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};
use crate::limits::DEFAULT_CONFIRMATION_GRACE_MS;
use crate::model::Ms;
use crate::notify::NotifyHub;

use store::CoreState;

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Grace window stamped on a promoted waitlist head.
    pub confirmation_grace_ms: Ms,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confirmation_grace_ms: DEFAULT_CONFIRMATION_GRACE_MS,
        }
    }
}

impl EngineConfig {
    /// Read `PLENUM_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let confirmation_grace_ms = std::env::var("PLENUM_CONFIRMATION_GRACE_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CONFIRMATION_GRACE_MS);
        Self {
            confirmation_grace_ms,
        }
    }
}

/// The booking engine. All three shared stores (conferences, bookings,
/// waitlists — plus the user registry) live behind one lock: every mutating
/// operation holds the write guard end-to-end, so it observes and commits a
/// fully consistent state, and mutating operations are totally ordered.
/// Queries take the read side.
pub struct Engine {
    state: RwLock<CoreState>,
    pub notify: Arc<NotifyHub>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl Engine {
    /// Engine on the system clock with default tunables.
    pub fn new(notify: Arc<NotifyHub>) -> Self {
        Self::with_config(EngineConfig::default(), notify, Arc::new(SystemClock))
    }

    pub fn with_config(
        config: EngineConfig,
        notify: Arc<NotifyHub>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: RwLock::new(CoreState::new()),
            notify,
            clock,
            config,
        }
    }

    fn now_ms(&self) -> Ms {
        self.clock.now_ms()
    }
}
