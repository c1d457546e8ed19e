//! Registers every phase's metrics and flags duplicate names

use crate::metrics::{MetricDoc, PhaseMetrics};
use std::collections::HashMap;
use tracing::{info, warn};

pub fn register_all_metrics() {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<super::catalog::CatalogMetrics>(&mut all_metrics);
    register_phase_metrics::<super::ownership::OwnershipMetrics>(&mut all_metrics);
    register_phase_metrics::<super::purchase::PurchaseMetrics>(&mut all_metrics);

    info!("Registered {} total metrics across all phases", all_metrics.len());
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, MetricDoc>) {
    T::register_metrics();
    let phase_name = T::phase_name();

    for doc in T::metrics_documentation() {
        if all_metrics.contains_key(doc.name) {
            warn!("Metric name conflict: '{}' redefined by phase '{}'", doc.name, phase_name);
        } else {
            all_metrics.insert(doc.name, doc);
        }
    }
}
