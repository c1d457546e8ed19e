//! Ownership filter metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct OwnershipMetrics;

impl OwnershipMetrics {
    pub fn record_bundles_loaded(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "ownership", "bundle_loads"), "result" => "success")
            .increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "ownership", "owned_bundles")).record(count as f64);
    }

    pub fn record_bundle_load_failed() {
        ::metrics::counter!(phase_metric!(counter, "ownership", "bundle_loads"), "result" => "degraded")
            .increment(1);
    }

    pub fn record_bundle_hit() {
        ::metrics::counter!(phase_metric!(counter, "ownership", "bundle_hits")).increment(1);
    }

    /// `result` is one of owned, not_owned, error
    pub fn record_probe(result: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "ownership", "probes"), "result" => result).increment(1);
    }
}

impl PhaseMetrics for OwnershipMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "ownership", "bundle_loads"));
        let _ = counter!(phase_metric!(counter, "ownership", "bundle_hits"));
        let _ = counter!(phase_metric!(counter, "ownership", "probes"));
        let _ = histogram!(phase_metric!(histogram, "ownership", "owned_bundles"));
    }

    fn phase_name() -> &'static str {
        "ownership"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "ownership", "bundle_loads"),
                metric_type: MetricType::Counter,
                help: "Owned-bundle set loads, successful or degraded to empty",
                labels: vec!["result"],
            },
            MetricDoc {
                name: phase_metric!(counter, "ownership", "bundle_hits"),
                metric_type: MetricType::Counter,
                help: "Items skipped because they are in the owned bundle set",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "ownership", "probes"),
                metric_type: MetricType::Counter,
                help: "Per-asset ownership probes by answer",
                labels: vec!["result"],
            },
            MetricDoc {
                name: phase_metric!(histogram, "ownership", "owned_bundles"),
                metric_type: MetricType::Histogram,
                help: "Size of the owned bundle set at run start",
                labels: vec![],
            },
        ]
    }
}
