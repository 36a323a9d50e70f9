//! Tests for the pure dispatch core: status resolution, workload scoring,
//! eligibility, performance aggregation, order numbering.

use chrono::{DateTime, Duration, Utc};
use dispatchlight::dispatch::ScoringPolicy;
use dispatchlight::dispatch::numbering::{format_order_number, next_order_number};
use dispatchlight::dispatch::performance::performance_stats;
use dispatchlight::dispatch::scoring::{can_accept, workload_score};
use dispatchlight::dispatch::status::resolve_status;
use dispatchlight::model::*;

fn order(status: OrderStatus, created_at: DateTime<Utc>) -> WorkOrder {
    WorkOrder {
        id: OrderId::new(),
        order_number: "TST20250001".to_string(),
        company_id: CompanyId::new(),
        customer_id: CustomerId::new(),
        technician_id: Some(TechnicianId::new()),
        service_type_id: None,
        title: "test job".to_string(),
        description: String::new(),
        status,
        priority: Priority::Normal,
        scheduled_date: None,
        estimated_duration_minutes: 60,
        service_address: "Via Roma 1".to_string(),
        service_location: None,
        technician_notes: None,
        work_performed: None,
        materials_used: None,
        estimated_price: None,
        final_price: None,
        created_at,
        assigned_at: None,
        started_at: None,
        completed_at: None,
    }
}

fn completed_order(created_at: DateTime<Utc>, hours_on_site: Option<f64>) -> WorkOrder {
    let mut o = order(OrderStatus::Completed, created_at);
    if let Some(hours) = hours_on_site {
        let start = created_at + Duration::hours(1);
        o.started_at = Some(start);
        o.completed_at = Some(start + Duration::seconds((hours * 3600.0) as i64));
    }
    o
}

// ---------------------------------------------------------------------------
// Status resolver
// ---------------------------------------------------------------------------

#[test]
fn inactive_technician_is_offline_regardless_of_orders() {
    let now = Utc::now();
    let orders = vec![order(OrderStatus::OnSite, now)];
    assert_eq!(resolve_status(false, &orders), TechnicianStatus::Offline);
    assert_eq!(resolve_status(false, &[]), TechnicianStatus::Offline);
}

#[test]
fn active_technician_with_no_orders_is_available() {
    assert_eq!(resolve_status(true, &[]), TechnicianStatus::Available);
}

#[test]
fn terminal_orders_do_not_count() {
    let now = Utc::now();
    let orders = vec![
        order(OrderStatus::Completed, now),
        order(OrderStatus::Cancelled, now),
        order(OrderStatus::Pending, now),
    ];
    assert_eq!(resolve_status(true, &orders), TechnicianStatus::Available);
}

#[test]
fn only_assigned_orders_resolve_to_assigned() {
    let now = Utc::now();
    let orders = vec![
        order(OrderStatus::Assigned, now),
        order(OrderStatus::Assigned, now - Duration::hours(1)),
    ];
    assert_eq!(resolve_status(true, &orders), TechnicianStatus::Assigned);
}

#[test]
fn in_motion_order_wins_over_assigned() {
    let now = Utc::now();
    let orders = vec![
        order(OrderStatus::Assigned, now - Duration::hours(2)),
        order(OrderStatus::EnRoute, now),
    ];
    assert_eq!(resolve_status(true, &orders), TechnicianStatus::EnRoute);
}

#[test]
fn earliest_created_in_motion_order_breaks_the_tie() {
    let now = Utc::now();
    // Both en-route and on-site in flight: the older one decides.
    let orders = vec![
        order(OrderStatus::EnRoute, now),
        order(OrderStatus::OnSite, now - Duration::hours(3)),
    ];
    assert_eq!(resolve_status(true, &orders), TechnicianStatus::OnSite);

    let orders = vec![
        order(OrderStatus::EnRoute, now - Duration::hours(3)),
        order(OrderStatus::OnSite, now),
    ];
    assert_eq!(resolve_status(true, &orders), TechnicianStatus::EnRoute);
}

// ---------------------------------------------------------------------------
// Workload score
// ---------------------------------------------------------------------------

#[test]
fn workload_score_from_counts() {
    assert_eq!(workload_score(0, 0), 0);
    assert_eq!(workload_score(1, 0), 20);
    assert_eq!(workload_score(3, 0), 60);
    assert_eq!(workload_score(3, 2), 80);
    assert_eq!(workload_score(5, 0), 100);
}

#[test]
fn workload_score_is_clamped_to_100() {
    assert_eq!(workload_score(10, 0), 100);
    assert_eq!(workload_score(5, 3), 100);
    assert_eq!(workload_score(100, 100), 100);
}

#[test]
fn workload_score_is_monotonic() {
    for active in 0..8 {
        for urgent in 0..8 {
            let here = workload_score(active, urgent);
            assert!(here <= 100);
            assert!(workload_score(active + 1, urgent) >= here);
            assert!(workload_score(active, urgent + 1) >= here);
        }
    }
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

#[test]
fn inactive_technician_cannot_accept() {
    assert!(!can_accept(false, 0, 5));
    assert!(!can_accept(false, 3, 5));
}

#[test]
fn eligibility_follows_the_cap() {
    assert!(can_accept(true, 0, 5));
    assert!(can_accept(true, 4, 5));
    assert!(!can_accept(true, 5, 5));
    assert!(!can_accept(true, 7, 5));
}

// ---------------------------------------------------------------------------
// Performance aggregator
// ---------------------------------------------------------------------------

#[test]
fn empty_window_yields_zeroed_stats() {
    let stats = performance_stats(&[], Utc::now(), &ScoringPolicy::default());
    assert_eq!(stats.total_orders, 0);
    assert_eq!(stats.completion_rate, 0.0);
    assert_eq!(stats.efficiency_score, 0.0);
    assert!(stats.avg_completion_hours.is_none());
}

#[test]
fn orders_outside_the_window_are_ignored() {
    let now = Utc::now();
    let orders = vec![
        completed_order(now - Duration::days(40), Some(2.0)),
        completed_order(now - Duration::days(5), Some(2.0)),
    ];
    let stats = performance_stats(&orders, now, &ScoringPolicy::default());
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.completed_orders, 1);
}

#[test]
fn seven_of_ten_completed_scores_59() {
    // The worked example: 10 orders in window, 7 completed, 1 cancelled.
    // completion_rate = 70.0
    // efficiency = 70.0 * 0.7 + min(10/30 * 100, 100) * 0.3 = 49.0 + 10.0 = 59.0
    let now = Utc::now();
    let in_window = now - Duration::days(10);

    let mut orders: Vec<WorkOrder> = (0..7)
        .map(|_| completed_order(in_window, None))
        .collect();
    orders.push(order(OrderStatus::Cancelled, in_window));
    orders.push(order(OrderStatus::Pending, in_window));
    orders.push(order(OrderStatus::Assigned, in_window));

    let stats = performance_stats(&orders, now, &ScoringPolicy::default());
    assert_eq!(stats.total_orders, 10);
    assert_eq!(stats.completed_orders, 7);
    assert_eq!(stats.cancelled_orders, 1);
    assert_eq!(stats.completion_rate, 70.0);
    assert_eq!(stats.efficiency_score, 59.0);
}

#[test]
fn average_completion_time_needs_both_timestamps() {
    let now = Utc::now();
    let in_window = now - Duration::days(3);

    // One completed order without timestamps → average absent.
    let orders = vec![completed_order(in_window, None)];
    let stats = performance_stats(&orders, now, &ScoringPolicy::default());
    assert!(stats.avg_completion_hours.is_none());

    // Two measurable orders → their mean, one decimal.
    let orders = vec![
        completed_order(in_window, Some(2.0)),
        completed_order(in_window, Some(3.0)),
        completed_order(in_window, None),
    ];
    let stats = performance_stats(&orders, now, &ScoringPolicy::default());
    assert_eq!(stats.avg_completion_hours, Some(2.5));
}

#[test]
fn volume_score_saturates_at_the_benchmark() {
    let now = Utc::now();
    let in_window = now - Duration::days(1);
    let orders: Vec<WorkOrder> = (0..60)
        .map(|_| completed_order(in_window, None))
        .collect();

    // All completed, volume capped: 100 * 0.7 + 100 * 0.3 = 100.
    let stats = performance_stats(&orders, now, &ScoringPolicy::default());
    assert_eq!(stats.efficiency_score, 100.0);
}

#[test]
fn efficiency_weights_are_policy() {
    let now = Utc::now();
    let in_window = now - Duration::days(1);
    let orders: Vec<WorkOrder> = (0..30)
        .map(|_| completed_order(in_window, None))
        .collect();

    let policy = ScoringPolicy {
        completion_weight: 0.5,
        volume_weight: 0.5,
        volume_benchmark: 60,
        ..ScoringPolicy::default()
    };
    // rate 100 * 0.5 + volume 50 * 0.5 = 75
    let stats = performance_stats(&orders, now, &policy);
    assert_eq!(stats.efficiency_score, 75.0);
}

// ---------------------------------------------------------------------------
// Order numbering
// ---------------------------------------------------------------------------

#[test]
fn order_number_format() {
    assert_eq!(format_order_number("Acme", 2024, 4), "ACM20240004");
    assert_eq!(format_order_number("acme srl", 2025, 123), "ACM20250123");
}

#[test]
fn next_number_counts_from_existing_orders() {
    // Company "Acme", 3 orders already created this year → 0004.
    assert_eq!(next_order_number("Acme", 2024, 3), "ACM20240004");
    assert_eq!(next_order_number("Acme", 2024, 0), "ACM20240001");
}

#[test]
fn short_company_names_keep_what_they_have() {
    assert_eq!(format_order_number("Bo", 2024, 1), "BO20240001");
}

#[test]
fn sequence_wider_than_four_digits_does_not_truncate() {
    assert_eq!(format_order_number("Acme", 2024, 12345), "ACM202412345");
}
