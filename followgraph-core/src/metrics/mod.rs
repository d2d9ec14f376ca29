/*
    Metrics - graph and admission counters for monitoring

    Provides counters, histograms, and gauges for:
    - Edge writes (created vs. already present)
    - Collection scans by direction
    - Access gate rejections
    - Admission queue depth and wait time

    Recorded through the `metrics` facade; the API binary installs a
    Prometheus recorder. Without a recorder every call is a no-op.
*/

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

use crate::core_graph::EdgeDirection;

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    describe_counter!(
        "followgraph_edge_inserts_total",
        "Follow edge insert attempts, labeled by result (created, existing)"
    );

    describe_counter!(
        "followgraph_collection_scans_total",
        "Collection page scans, labeled by direction (followers, following)"
    );

    describe_counter!(
        "followgraph_access_rejections_total",
        "Requests rejected by the access gate, labeled by reason"
    );

    describe_counter!(
        "followgraph_admission_submitted_total",
        "Operations submitted to an admission queue"
    );

    describe_gauge!(
        "followgraph_admission_in_flight",
        "Operations currently running under an admission queue"
    );

    describe_histogram!(
        "followgraph_admission_wait_seconds",
        "Time an operation waited in the admission queue before starting"
    );
}

/// Record an edge insert outcome
pub fn record_edge_insert(created: bool) {
    let result = if created { "created" } else { "existing" };
    counter!("followgraph_edge_inserts_total", "result" => result).increment(1);
}

/// Record a collection scan
pub fn record_scan(direction: EdgeDirection) {
    counter!("followgraph_collection_scans_total", "direction" => direction.as_str()).increment(1);
}

/// Record an access gate rejection
pub fn record_access_rejection(reason: &'static str) {
    counter!("followgraph_access_rejections_total", "reason" => reason).increment(1);
}

pub fn admission_submitted() {
    counter!("followgraph_admission_submitted_total").increment(1);
}

pub fn admission_started(waited: Duration) {
    gauge!("followgraph_admission_in_flight").increment(1.0);
    histogram!("followgraph_admission_wait_seconds").record(waited.as_secs_f64());
}

pub fn admission_finished() {
    gauge!("followgraph_admission_in_flight").decrement(1.0);
}
