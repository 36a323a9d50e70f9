//! Pure dispatch core: status resolution, workload and performance scoring,
//! order numbering. No I/O — the data layer feeds these from queries and the
//! tests feed them directly.

pub mod numbering;
pub mod performance;
pub mod scoring;
pub mod status;

/// Tunable knobs of the dispatch heuristics.
///
/// The efficiency weights and the volume benchmark are policy, not laws of
/// nature. Defaults match what the dashboards were calibrated against.
#[derive(Debug, Clone)]
pub struct ScoringPolicy {
    /// Eligibility cap: a technician at this many active orders accepts no more.
    pub max_active_orders: u32,
    /// Performance window length in days.
    pub window_days: i64,
    /// Weight of the completion rate in the efficiency score.
    pub completion_weight: f64,
    /// Weight of throughput in the efficiency score.
    pub volume_weight: f64,
    /// Orders per window that count as 100% throughput.
    pub volume_benchmark: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            max_active_orders: 5,
            window_days: 30,
            completion_weight: 0.7,
            volume_weight: 0.3,
            volume_benchmark: 30,
        }
    }
}
