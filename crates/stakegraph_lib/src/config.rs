//! Stakegraph configuration parsing.

use std::fs::File;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stakegraph_common_types::Address;
use url::Url;

/// A [`serde`]-compatible representation of Stakegraph's YAML configuration
/// file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Where entities and the event cursor are persisted.
    pub store: StoreConfig,
    pub staking: StakingConfig,
    pub epochs: EpochsConfig,
    /// The port on which the Prometheus exporter should listen. Set it to 0
    /// to disable the exporter.
    #[serde(default = "Config::default_prometheus_port")]
    pub prometheus_port: u16,
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open config file {}", path.display()))?;
        serde_yaml::from_reader(file).context("invalid config file")
    }

    fn default_prometheus_port() -> u16 {
        9184
    }

    fn default_request_timeout_in_seconds() -> u64 {
        30
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StoreConfig {
    Postgres {
        /// The URL of the PostgreSQL database to use.
        url: String,
    },
    /// Keeps everything in memory. Mostly useful for dry runs.
    InMemory,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StakingConfig {
    /// Address of the staking contract, used for on-demand parameter reads.
    pub contract: Address,
    /// JSON-RPC endpoint of an Ethereum node, for `eth_call`.
    pub rpc_url: Url,
    #[serde(default = "Config::default_request_timeout_in_seconds")]
    pub request_timeout_in_seconds: u64,
}

impl StakingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_in_seconds)
    }
}

/// Epoch bookkeeping the network starts from.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EpochsConfig {
    /// Blocks per epoch.
    pub length: u64,
    /// First block of epoch `start_epoch`.
    #[serde(default)]
    pub start_block: u64,
    #[serde(default)]
    pub start_epoch: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let yaml = r#"
store:
  type: postgres
  url: postgres://localhost/stakegraph
staking:
  contract: "0xF55041E37E12cD407ad00CE2910B8269B01263b9"
  rpcUrl: http://localhost:8545
  requestTimeoutInSeconds: 5
epochs:
  length: 6646
  startBlock: 11446768
  startEpoch: 1
prometheusPort: 0
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(config.store, StoreConfig::Postgres { ref url } if url.ends_with("/stakegraph")));
        assert_eq!(
            config.staking.contract.to_string(),
            "0xf55041e37e12cd407ad00ce2910b8269b01263b9"
        );
        assert_eq!(config.staking.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.epochs.length, 6646);
        assert_eq!(config.epochs.start_epoch, 1);
        assert_eq!(config.prometheus_port, 0);
    }

    #[test]
    fn defaults() {
        let yaml = r#"
store:
  type: inMemory
staking:
  contract: "0xf55041e37e12cd407ad00ce2910b8269b01263b9"
  rpcUrl: http://localhost:8545
epochs:
  length: 100
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(config.store, StoreConfig::InMemory));
        assert_eq!(config.staking.request_timeout_in_seconds, 30);
        assert_eq!(config.epochs.start_block, 0);
        assert_eq!(config.prometheus_port, 9184);
    }

    #[test]
    fn json_schema_is_generated() {
        let schema = schemars::schema_for!(Config);
        let json = serde_json::to_value(&schema).unwrap();
        assert!(json["properties"]["prometheusPort"].is_object());
    }
}
