use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, about, version)]
pub struct CliOptions {
    /// Path to the YAML configuration file. Can also be set via env. var.
    #[clap(long, env = "STAKEGRAPH_CONFIG")]
    pub config: PathBuf,
    /// File with one JSON-encoded staking event per line, in canonical
    /// order. Use `-` to read from stdin.
    #[clap(long, default_value = "-")]
    pub events: String,
}

impl CliOptions {
    pub fn events_from_stdin(&self) -> bool {
        self.events == "-"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_default_to_stdin() {
        let options = CliOptions::parse_from(["stakegraph", "--config", "config.yml"]);
        assert!(options.events_from_stdin());
        assert_eq!(options.config, PathBuf::from("config.yml"));

        let options =
            CliOptions::parse_from(["stakegraph", "--config", "c.yml", "--events", "ev.jsonl"]);
        assert!(!options.events_from_stdin());
    }
}
