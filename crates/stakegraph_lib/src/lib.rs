//! The event aggregation engine: typed staking events in, an up-to-date
//! entity graph out.

mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod ids;
pub mod network;
pub mod processor;
mod prometheus_metrics;
pub mod resolve;

#[cfg(feature = "tests")]
pub mod test_utils;

pub use cli::CliOptions;
pub use error::ProcessingError;
pub use events::{Event, StakingEvent};
pub use processor::{EventProcessor, Outcome};
pub use prometheus_metrics::{metrics, PrometheusExporter, PrometheusMetrics};

pub const STAKEGRAPH_VERSION: &str = env!("CARGO_PKG_VERSION");
