use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

pub const CANDIDATES_CREATED_TOTAL: &str = "candidates_created_total";
pub const REPORTS_GENERATED_TOTAL: &str = "reports_generated_total";

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder and returns its handle.
///
/// The exposition text is served by the caller (see `PrometheusHandle::render`).
/// Repeated calls return the handle of the first successful install.
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    if let Some(existing) = PROMETHEUS_HANDLE.get() {
        return Some(existing);
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle);
            info!("installed prometheus recorder");
            PROMETHEUS_HANDLE.get()
        }
        Err(err) => {
            warn!(error = %err, "failed to install prometheus recorder");
            PROMETHEUS_HANDLE.get()
        }
    }
}

/// Renders the current exposition text, or an empty string when no recorder is installed.
pub fn render() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}
