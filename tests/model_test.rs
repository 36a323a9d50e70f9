//! Lifecycle and parsing rules on the domain model.

use dispatchlight::model::{ExpenseCategory, OrderStatus, Priority};

#[test]
fn happy_path_transitions_are_allowed() {
    use OrderStatus::*;
    assert!(Pending.can_transition_to(Assigned));
    assert!(Assigned.can_transition_to(EnRoute));
    assert!(EnRoute.can_transition_to(OnSite));
    assert!(OnSite.can_transition_to(Completed));
}

#[test]
fn cancellation_is_reachable_from_every_non_terminal_status() {
    use OrderStatus::*;
    for status in [Pending, Assigned, EnRoute, OnSite] {
        assert!(status.can_transition_to(Cancelled), "{status} should cancel");
    }
    assert!(!Completed.can_transition_to(Cancelled));
    assert!(!Cancelled.can_transition_to(Cancelled));
}

#[test]
fn terminal_statuses_go_nowhere() {
    use OrderStatus::*;
    for terminal in [Completed, Cancelled] {
        for target in [Pending, Assigned, EnRoute, OnSite, Completed, Cancelled] {
            assert!(!terminal.can_transition_to(target));
        }
    }
}

#[test]
fn no_skipping_ahead() {
    use OrderStatus::*;
    assert!(!Pending.can_transition_to(EnRoute));
    assert!(!Pending.can_transition_to(Completed));
    assert!(!Assigned.can_transition_to(Completed));
    assert!(!EnRoute.can_transition_to(Completed));
}

#[test]
fn unassignment_returns_to_pending() {
    assert!(OrderStatus::Assigned.can_transition_to(OrderStatus::Pending));
    assert!(!OrderStatus::EnRoute.can_transition_to(OrderStatus::Pending));
}

#[test]
fn active_statuses_occupy_a_technician() {
    use OrderStatus::*;
    assert!(Assigned.is_active());
    assert!(EnRoute.is_active());
    assert!(OnSite.is_active());
    assert!(!Pending.is_active());
    assert!(!Completed.is_active());
    assert!(!Cancelled.is_active());
}

#[test]
fn status_round_trips_through_strings() {
    use OrderStatus::*;
    for status in [Pending, Assigned, EnRoute, OnSite, Completed, Cancelled] {
        let parsed: OrderStatus = status.to_string().parse().unwrap();
        assert_eq!(parsed, status);
    }
    assert!("shipped".parse::<OrderStatus>().is_err());
}

#[test]
fn priority_ordering_puts_urgent_on_top() {
    assert!(Priority::Urgent > Priority::High);
    assert!(Priority::High > Priority::Normal);
    assert!(Priority::Normal > Priority::Low);
}

#[test]
fn unknown_expense_category_is_rejected() {
    assert!("parking".parse::<ExpenseCategory>().is_ok());
    assert!("snacks".parse::<ExpenseCategory>().is_err());
}
