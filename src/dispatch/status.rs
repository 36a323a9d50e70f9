//! Technician display status, derived from their in-flight orders.

use crate::model::{OrderStatus, TechnicianStatus, WorkOrder};

/// Derive a technician's current status from their active orders.
///
/// Inactive technicians are offline no matter what they carry. An active
/// technician with nothing in flight is available. Otherwise, an order that
/// is en route or on site wins over merely-assigned ones; when several are
/// in motion at once, the earliest-created order decides, so repeated calls
/// over the same orders always agree.
pub fn resolve_status(is_active: bool, orders: &[WorkOrder]) -> TechnicianStatus {
    if !is_active {
        return TechnicianStatus::Offline;
    }

    let active: Vec<&WorkOrder> = orders.iter().filter(|o| o.status.is_active()).collect();
    if active.is_empty() {
        return TechnicianStatus::Available;
    }

    let in_motion = active
        .iter()
        .filter(|o| matches!(o.status, OrderStatus::EnRoute | OrderStatus::OnSite))
        .min_by_key(|o| o.created_at);

    match in_motion {
        Some(order) if order.status == OrderStatus::EnRoute => TechnicianStatus::EnRoute,
        Some(_) => TechnicianStatus::OnSite,
        None => TechnicianStatus::Assigned,
    }
}
