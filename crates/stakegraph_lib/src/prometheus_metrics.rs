use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::OnceLock;

// It's important to use the exported crate `prometheus_exporter::prometheus`
// instead of `prometheus`, as different versions of that crate have
// incompatible global registries.
use prometheus_exporter::prometheus;
use tracing::info;

pub struct PrometheusMetrics {
    pub events_processed: prometheus::IntCounterVec,
    pub events_skipped: prometheus::IntCounter,
    pub entities_written: prometheus::IntCounterVec,
    pub staking_contract_calls: prometheus::IntCounterVec,
}

static METRICS: OnceLock<PrometheusMetrics> = OnceLock::new();

pub fn metrics() -> &'static PrometheusMetrics {
    METRICS.get_or_init(|| PrometheusMetrics::new(prometheus::default_registry().clone()))
}

impl PrometheusMetrics {
    fn new(registry: prometheus::Registry) -> Self {
        let events_processed = prometheus::register_int_counter_vec_with_registry!(
            "events_processed",
            "Number of staking events applied to the entity graph",
            &["kind"],
            registry
        )
        .unwrap();
        let events_skipped = prometheus::register_int_counter_with_registry!(
            "events_skipped",
            "Number of staking events skipped because they were already applied",
            registry
        )
        .unwrap();
        let entities_written = prometheus::register_int_counter_vec_with_registry!(
            "entities_written",
            "Number of entity records written",
            &["kind"],
            registry
        )
        .unwrap();
        let staking_contract_calls = prometheus::register_int_counter_vec_with_registry!(
            "staking_contract_calls",
            "Number of eth_call requests to the staking contract",
            &["call", "success"],
            registry
        )
        .unwrap();

        Self {
            events_processed,
            events_skipped,
            entities_written,
            staking_contract_calls,
        }
    }
}

/// Serves `/metrics` on all interfaces for as long as it is alive.
#[derive(Debug)]
pub struct PrometheusExporter {
    binding: SocketAddr,
    _exporter: prometheus_exporter::Exporter,
}

impl PrometheusExporter {
    /// Exports the default registry, which is where [`metrics()`] registers
    /// the engine's counters.
    pub fn start_default(port: u16) -> anyhow::Result<Self> {
        // Register before the first scrape so every counter shows up.
        metrics();
        Self::start(port, prometheus::default_registry().clone())
    }

    pub fn start(port: u16, registry: prometheus::Registry) -> anyhow::Result<Self> {
        let binding = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
        let mut builder = prometheus_exporter::Builder::new(binding);
        builder.with_registry(registry);
        let exporter = builder.start()?;
        info!(port, "Serving Prometheus metrics");

        Ok(Self {
            binding,
            _exporter: exporter,
        })
    }

    pub fn port(&self) -> u16 {
        self.binding.port()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_once() {
        let first = metrics() as *const PrometheusMetrics;
        let second = metrics() as *const PrometheusMetrics;
        assert_eq!(first, second);

        metrics()
            .events_processed
            .with_label_values(&["StakeDeposited"])
            .inc();
        assert!(
            metrics()
                .events_processed
                .with_label_values(&["StakeDeposited"])
                .get()
                >= 1
        );
    }

    #[tokio::test]
    async fn scrape_lists_engine_counters() {
        let exporter = PrometheusExporter::start_default(13371).unwrap();
        metrics().events_skipped.inc();

        let body = reqwest::get(&format!("http://127.0.0.1:{}/metrics", exporter.port()))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("events_skipped"));
    }
}
