//! Purchase executor metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct PurchaseMetrics;

impl PurchaseMetrics {
    pub fn record_submission() {
        ::metrics::counter!(phase_metric!(counter, "purchase", "submissions")).increment(1);
    }

    pub fn record_rate_limited() {
        ::metrics::counter!(phase_metric!(counter, "purchase", "rate_limited")).increment(1);
    }

    pub fn record_purchased(attempts: u32) {
        ::metrics::counter!(phase_metric!(counter, "purchase", "completed")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "purchase", "attempts_per_item")).record(attempts as f64);
    }

    pub fn record_failed() {
        ::metrics::counter!(phase_metric!(counter, "purchase", "failed")).increment(1);
    }
}

impl PhaseMetrics for PurchaseMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "purchase", "submissions"));
        let _ = counter!(phase_metric!(counter, "purchase", "rate_limited"));
        let _ = counter!(phase_metric!(counter, "purchase", "completed"));
        let _ = counter!(phase_metric!(counter, "purchase", "failed"));
        let _ = histogram!(phase_metric!(histogram, "purchase", "attempts_per_item"));
    }

    fn phase_name() -> &'static str {
        "purchase"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "purchase", "submissions"),
                metric_type: MetricType::Counter,
                help: "Purchase requests sent, retries included",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "purchase", "rate_limited"),
                metric_type: MetricType::Counter,
                help: "Purchase submissions answered with 429",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "purchase", "completed"),
                metric_type: MetricType::Counter,
                help: "Items purchased",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "purchase", "failed"),
                metric_type: MetricType::Counter,
                help: "Purchases that ended in a non-retryable failure",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "purchase", "attempts_per_item"),
                metric_type: MetricType::Histogram,
                help: "Submissions needed per purchased item",
                labels: vec![],
            },
        ]
    }
}
