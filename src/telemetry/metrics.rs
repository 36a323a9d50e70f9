//! Metric instrument factories for dispatchlight.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! All instruments are created lazily from the `"dispatchlight"` meter.

use opentelemetry::metrics::{Counter, Meter};

/// Returns the shared meter for dispatchlight instruments.
fn meter() -> Meter {
    opentelemetry::global::meter("dispatchlight")
}

/// Counter: number of work orders created.
/// Labels: `priority`.
pub fn orders_created() -> Counter<u64> {
    meter()
        .u64_counter("dispatchlight.orders.created")
        .with_description("Number of work orders created")
        .build()
}

/// Counter: work order status transitions.
/// Labels: `from`, `to`.
pub fn order_status_transitions() -> Counter<u64> {
    meter()
        .u64_counter("dispatchlight.orders.status_transitions")
        .with_description("Number of work order status transitions")
        .build()
}

/// Counter: order-to-technician assignments.
/// Labels: `result` ("ok" | "rejected").
pub fn order_assignments() -> Counter<u64> {
    meter()
        .u64_counter("dispatchlight.orders.assignments")
        .with_description("Number of order assignment attempts")
        .build()
}

/// Counter: technician location reports.
pub fn location_updates() -> Counter<u64> {
    meter()
        .u64_counter("dispatchlight.technicians.location_updates")
        .with_description("Number of technician location reports")
        .build()
}
