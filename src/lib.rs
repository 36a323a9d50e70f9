//! # dispatchlight
//!
//! Postgres-backed core for a multi-tenant field-service dispatch system.
//!
//! Provides the work-order lifecycle (pending → assigned → en route →
//! on site → completed), technician workload and performance scoring,
//! per-company order numbering, and company-scoped reporting. The web/UI
//! layer lives elsewhere; this crate is the engine it calls into.

pub mod analytics;
pub mod auth;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod geo;
pub mod model;
pub mod telemetry;
