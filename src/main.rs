//! Load tester binary for the hotel-reservation HTTP API.
//!
//! All run parameters live in a YAML file: each scenario names its protocol
//! (REST or GraphQL), the target URL, the number of simulated users, an
//! optional spawn rate, and the bounds of the randomized think-time between
//! actions. See `config.example.yaml`.

use std::path::PathBuf;

use anyhow::Context;
use argh::FromArgs;

use loadtest::config::Config;

/// Load tester for the hotel reservation API
#[derive(Debug, FromArgs)]
pub struct Args {
    /// path to the yaml configuration file
    #[argh(option, short = 'c')]
    pub config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    let config_file = std::fs::File::open(args.config).context("failed to open config file")?;
    let config: Config =
        serde_yaml::from_reader(config_file).context("failed to parse config YAML")?;

    loadtest::run(config).await
}
