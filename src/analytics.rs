//! Company-level analytics read model.
//!
//! The dashboard consumes these through a capability trait so deployments
//! without a reporting store still boot: the provider is injected at startup
//! and defaults to a no-op. The Postgres implementation lives in
//! `db::reports`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::AuthContext;
use crate::error::Result;
use crate::model::OrderStatus;

/// Headline numbers for a company's dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub pending_orders: u32,
    pub today_orders: u32,
    pub total_orders: u32,
    pub completed_orders: u32,
    pub active_technicians: u32,
    /// Completed / total over the company's whole history, percent, 1 decimal.
    pub completion_rate: f64,
    /// Mean final price of completed orders, when any carry one.
    pub avg_order_value: Option<Decimal>,
    /// Orders created per day, oldest first, for the last 7 days.
    pub orders_last_7_days: Vec<u32>,
}

/// Order counts per lifecycle status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusDistribution {
    pub counts: Vec<(OrderStatus, u32)>,
}

/// Capability interface the dashboard/report views depend on.
///
/// Callers hold a concrete provider; the futures need no extra auto-trait
/// bounds, so the plain `async fn` form is fine here.
#[allow(async_fn_in_trait)]
pub trait AnalyticsProvider: Send + Sync {
    async fn dashboard(&self, ctx: &AuthContext) -> Result<DashboardSummary>;

    async fn status_distribution(&self, ctx: &AuthContext) -> Result<StatusDistribution>;
}

/// Default provider: reports nothing. Keeps the dashboard rendering with
/// zeroed tiles when no reporting backend is wired in.
#[derive(Debug, Default)]
pub struct NoopAnalytics;

impl AnalyticsProvider for NoopAnalytics {
    async fn dashboard(&self, _ctx: &AuthContext) -> Result<DashboardSummary> {
        Ok(DashboardSummary {
            orders_last_7_days: vec![0; 7],
            ..DashboardSummary::default()
        })
    }

    async fn status_distribution(&self, _ctx: &AuthContext) -> Result<StatusDistribution> {
        Ok(StatusDistribution::default())
    }
}
