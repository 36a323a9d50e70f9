//! Default behavior of the analytics seam.

use dispatchlight::analytics::{AnalyticsProvider, NoopAnalytics};
use dispatchlight::auth::AuthContext;
use dispatchlight::model::CompanyId;

#[tokio::test]
async fn noop_provider_reports_zeroed_tiles() {
    let provider = NoopAnalytics;
    let ctx = AuthContext::owner(CompanyId::new());

    let summary = provider.dashboard(&ctx).await.unwrap();
    assert_eq!(summary.total_orders, 0);
    assert_eq!(summary.pending_orders, 0);
    assert_eq!(summary.active_technicians, 0);
    assert_eq!(summary.completion_rate, 0.0);
    assert!(summary.avg_order_value.is_none());
    // The dashboard chart still gets a full week of (empty) days.
    assert_eq!(summary.orders_last_7_days, vec![0; 7]);

    let distribution = provider.status_distribution(&ctx).await.unwrap();
    assert!(distribution.counts.is_empty());
}
