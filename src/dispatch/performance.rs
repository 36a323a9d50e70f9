//! Windowed performance statistics for a technician.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::ScoringPolicy;
use crate::model::{OrderStatus, WorkOrder};

/// Aggregate statistics over a technician's recent orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_orders: u32,
    pub completed_orders: u32,
    pub cancelled_orders: u32,
    /// Completed / total, percent, 1 decimal. 0 when no orders.
    pub completion_rate: f64,
    /// Mean `started_at` → `completed_at` span over completed orders carrying
    /// both timestamps. Absent when no order qualifies.
    pub avg_completion_hours: Option<f64>,
    /// Blend of outcome quality and throughput, 1 decimal. 0 when no orders.
    pub efficiency_score: f64,
}

impl PerformanceStats {
    pub fn empty() -> Self {
        Self {
            total_orders: 0,
            completed_orders: 0,
            cancelled_orders: 0,
            completion_rate: 0.0,
            avg_completion_hours: None,
            efficiency_score: 0.0,
        }
    }
}

/// Compute performance stats over the orders created in the last
/// `policy.window_days` days.
///
/// The efficiency score weighs the completion rate against throughput
/// normalized to `policy.volume_benchmark` orders per window:
/// `rate * completion_weight + min(total / benchmark * 100, 100) * volume_weight`.
pub fn performance_stats(
    orders: &[WorkOrder],
    now: DateTime<Utc>,
    policy: &ScoringPolicy,
) -> PerformanceStats {
    let window_start = now - Duration::days(policy.window_days);
    let windowed: Vec<&WorkOrder> = orders
        .iter()
        .filter(|o| o.created_at >= window_start && o.created_at <= now)
        .collect();

    let total = windowed.len() as u32;
    if total == 0 {
        return PerformanceStats::empty();
    }

    let completed = windowed
        .iter()
        .filter(|o| o.status == OrderStatus::Completed)
        .count() as u32;
    let cancelled = windowed
        .iter()
        .filter(|o| o.status == OrderStatus::Cancelled)
        .count() as u32;

    let durations: Vec<f64> = windowed
        .iter()
        .filter(|o| o.status == OrderStatus::Completed)
        .filter_map(|o| o.completion_hours())
        .collect();
    let avg_completion_hours = if durations.is_empty() {
        None
    } else {
        Some(round1(durations.iter().sum::<f64>() / durations.len() as f64))
    };

    // Keep the raw rate for the efficiency blend; round only for display.
    let rate = f64::from(completed) / f64::from(total) * 100.0;

    let volume = (f64::from(total) / f64::from(policy.volume_benchmark) * 100.0).min(100.0);
    let efficiency = rate * policy.completion_weight + volume * policy.volume_weight;

    PerformanceStats {
        total_orders: total,
        completed_orders: completed,
        cancelled_orders: cancelled,
        completion_rate: round1(rate),
        avg_completion_hours,
        efficiency_score: round1(efficiency),
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
