use std::net::SocketAddr;

use crate::model::BookingStatus;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: bookings created. Labels: outcome (confirmed | waitlisted).
pub const BOOKINGS_TOTAL: &str = "plenum_bookings_total";

/// Counter: bookings canceled. Labels: source (user | eviction | mass_cancel).
pub const CANCELLATIONS_TOTAL: &str = "plenum_cancellations_total";

/// Counter: confirmation windows opened on waitlist heads.
pub const WAITLIST_PROMOTIONS_TOTAL: &str = "plenum_waitlist_promotions_total";

/// Counter: waitlisted bookings confirmed into a freed seat.
pub const WAITLIST_CONFIRMATIONS_TOTAL: &str = "plenum_waitlist_confirmations_total";

/// Counter: confirm attempts past the deadline, requeued at the back.
pub const WAITLIST_REQUEUES_TOTAL: &str = "plenum_waitlist_requeues_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: current waitlist depth. Labels: conference.
pub const WAITLIST_DEPTH: &str = "plenum_waitlist_depth";

/// Install the fmt tracing subscriber. Call once at startup.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init_metrics(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Map a booking status to a short label for metrics.
pub fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Confirmed => "confirmed",
        BookingStatus::Waitlisted => "waitlisted",
        BookingStatus::Canceled => "canceled",
    }
}
