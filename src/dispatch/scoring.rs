//! Workload scoring and the assignment admission check.

/// Load contributed by each active order.
const LOAD_PER_ACTIVE_ORDER: u32 = 20;
/// Extra load per urgent order in flight.
const URGENT_SURCHARGE: u32 = 10;

/// Workload score in [0, 100] from active and urgent order counts.
///
/// `min(active * 20, 100) + urgent * 10`, clamped to 100. Non-decreasing in
/// both inputs. A dispatch heuristic only — never persisted.
pub fn workload_score(active_count: u32, urgent_count: u32) -> u8 {
    let base = (active_count * LOAD_PER_ACTIVE_ORDER).min(100);
    (base + urgent_count * URGENT_SURCHARGE).min(100) as u8
}

/// Can this technician take one more order?
///
/// Pure predicate over a point-in-time count. Callers racing on the same
/// technician must re-check under a row lock — see `Db::assign_order`.
pub fn can_accept(is_active: bool, active_count: u32, max_orders: u32) -> bool {
    if !is_active {
        return false;
    }
    active_count < max_orders
}
