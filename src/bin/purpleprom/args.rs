use std::path::PathBuf;

use clap::{ArgAction, Parser};
use purpleprom::{config::DEFAULT_CONFIG_PATH, policy::PublishPolicy};

/// Polls PurpleAir sensors and exports their readings and AQI as Prometheus metrics.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    #[arg(long, env = "PURPLEPROM_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Overrides the publish policy from the config file.
    #[arg(long, env = "PURPLEPROM_POLICY")]
    pub policy: Option<PublishPolicy>,

    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
