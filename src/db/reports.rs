//! Company-scoped reporting queries backing the dashboard.
//!
//! Aggregates over empty sets return zeroed summaries, never errors.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::Db;
use crate::analytics::{AnalyticsProvider, DashboardSummary, StatusDistribution};
use crate::auth::AuthContext;
use crate::error::Result;
use crate::model::OrderId;

impl Db {
    /// Headline dashboard numbers for the context's company.
    pub async fn dashboard(&self, ctx: &AuthContext) -> Result<DashboardSummary> {
        let (total, pending, completed, today): (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT count(*),
                    count(*) FILTER (WHERE status = 'pending'),
                    count(*) FILTER (WHERE status = 'completed'),
                    count(*) FILTER (WHERE created_at >= date_trunc('day', now()))
             FROM work_orders WHERE company_id = $1",
        )
        .bind(ctx.company_id.0)
        .fetch_one(self.pool())
        .await?;

        let (active_technicians,): (i64,) = sqlx::query_as(
            "SELECT count(*) FROM technicians WHERE company_id = $1 AND is_active",
        )
        .bind(ctx.company_id.0)
        .fetch_one(self.pool())
        .await?;

        let (avg_order_value,): (Option<Decimal>,) = sqlx::query_as(
            "SELECT avg(final_price) FROM work_orders
             WHERE company_id = $1 AND status = 'completed' AND final_price IS NOT NULL",
        )
        .bind(ctx.company_id.0)
        .fetch_one(self.pool())
        .await?;

        let completion_rate = if total > 0 {
            (completed as f64 / total as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };

        Ok(DashboardSummary {
            pending_orders: pending as u32,
            today_orders: today as u32,
            total_orders: total as u32,
            completed_orders: completed as u32,
            active_technicians: active_technicians as u32,
            completion_rate,
            avg_order_value,
            orders_last_7_days: self.orders_per_day(ctx, 7).await?,
        })
    }

    /// Orders created per day over the last `days` days, oldest first.
    /// Days with no orders report 0.
    pub async fn orders_per_day(&self, ctx: &AuthContext, days: u32) -> Result<Vec<u32>> {
        let today = Utc::now().date_naive();
        let window_start = today - Duration::days(days as i64 - 1);

        let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
            "SELECT created_at::date AS day, count(*)
             FROM work_orders
             WHERE company_id = $1 AND created_at::date >= $2
             GROUP BY day",
        )
        .bind(ctx.company_id.0)
        .bind(window_start)
        .fetch_all(self.pool())
        .await?;

        let mut series = vec![0u32; days as usize];
        for (day, count) in rows {
            let offset = (day - window_start).num_days();
            if (0..days as i64).contains(&offset) {
                series[offset as usize] = count as u32;
            }
        }
        Ok(series)
    }

    /// Order counts per lifecycle status.
    pub async fn status_distribution(&self, ctx: &AuthContext) -> Result<StatusDistribution> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, count(*) FROM work_orders
             WHERE company_id = $1 GROUP BY status ORDER BY status",
        )
        .bind(ctx.company_id.0)
        .fetch_all(self.pool())
        .await?;

        let mut counts = Vec::with_capacity(rows.len());
        for (status, count) in rows {
            counts.push((status.parse()?, count as u32));
        }
        Ok(StatusDistribution { counts })
    }

    /// Total expenses recorded against an order.
    pub async fn expense_total(&self, ctx: &AuthContext, order_id: OrderId) -> Result<Decimal> {
        self.get_order(ctx, order_id).await?;

        let (total,): (Option<Decimal>,) =
            sqlx::query_as("SELECT sum(amount) FROM expenses WHERE order_id = $1")
                .bind(order_id.0)
                .fetch_one(self.pool())
                .await?;
        Ok(total.unwrap_or_default())
    }
}

impl AnalyticsProvider for Db {
    async fn dashboard(&self, ctx: &AuthContext) -> Result<DashboardSummary> {
        Db::dashboard(self, ctx).await
    }

    async fn status_distribution(&self, ctx: &AuthContext) -> Result<StatusDistribution> {
        Db::status_distribution(self, ctx).await
    }
}
