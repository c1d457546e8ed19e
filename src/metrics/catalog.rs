//! Catalog paging metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct CatalogMetrics;

impl CatalogMetrics {
    pub fn record_page_fetched(item_count: usize, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "catalog", "pages_fetched")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "catalog", "page_items")).record(item_count as f64);
        ::metrics::histogram!(phase_metric!(histogram, "catalog", "page_fetch_duration_seconds"))
            .record(duration_secs);
    }

    pub fn record_page_retry(status: u16) {
        let status_class = if status == 429 { "throttled" } else { "other" };
        ::metrics::counter!(phase_metric!(counter, "catalog", "page_retries"), "status" => status_class)
            .increment(1);
    }
}

impl PhaseMetrics for CatalogMetrics {
    fn register_metrics() {
        use metrics::{counter, histogram};

        let _ = counter!(phase_metric!(counter, "catalog", "pages_fetched"));
        let _ = counter!(phase_metric!(counter, "catalog", "page_retries"));
        let _ = histogram!(phase_metric!(histogram, "catalog", "page_items"));
        let _ = histogram!(phase_metric!(histogram, "catalog", "page_fetch_duration_seconds"));
    }

    fn phase_name() -> &'static str {
        "catalog"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "catalog", "pages_fetched"),
                metric_type: MetricType::Counter,
                help: "Catalog pages fetched successfully",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "catalog", "page_retries"),
                metric_type: MetricType::Counter,
                help: "Page fetches retried after a non-success status",
                labels: vec!["status"],
            },
            MetricDoc {
                name: phase_metric!(histogram, "catalog", "page_items"),
                metric_type: MetricType::Histogram,
                help: "Items per fetched catalog page",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(histogram, "catalog", "page_fetch_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Time to obtain one page, retries included",
                labels: vec![],
            },
        ]
    }
}
