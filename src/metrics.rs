use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("reconcile_orders_checked").absolute(0);
    counter!("close_orders_submitted").absolute(0);
    counter!("close_orders_rejected").absolute(0);
    counter!("close_orders_filled").absolute(0);
    counter!("close_orders_no_fill").absolute(0);
    counter!("notifications_sent").absolute(0);

    handle
}
