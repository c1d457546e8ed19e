//! Metrics for the acquisition pipeline
//!
//! Each phase (catalog paging, ownership checks, purchases) owns its metrics
//! in a dedicated submodule. Recording is always on; a Prometheus exporter is
//! only installed when an address is configured.

pub mod catalog;
pub mod ownership;
pub mod purchase;
pub mod registry;

pub use catalog::CatalogMetrics;
pub use ownership::OwnershipMetrics;
pub use purchase::PurchaseMetrics;

use std::net::SocketAddr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Install the Prometheus recorder with an HTTP listener at `addr` and
/// register all phase metrics. Idempotent.
pub fn init_metrics(addr: &str) {
    INIT.call_once(|| {
        let sock_addr: SocketAddr = match addr.parse() {
            Ok(a) => a,
            Err(e) => {
                warn!("Invalid metrics address '{}': {}; metrics exporter disabled", addr, e);
                return;
            }
        };

        let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(sock_addr);
        match builder.install() {
            Ok(()) => {
                info!("Prometheus exporter listening at http://{}/metrics", sock_addr);
                registry::register_all_metrics();
            }
            Err(e) => warn!("Failed to install Prometheus exporter: {}", e),
        }
    });
}

/// Implemented by each phase to pre-register and document its metrics
pub trait PhaseMetrics {
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    #[allow(dead_code)]
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub enum MetricType {
    Counter,
    Histogram,
}

/// Naming convention: sniper_{phase}_{metric_name}[_total]
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("sniper_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("sniper_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
