use std::{fmt, str::FromStr};

use anyhow::{Error, bail};
use serde::Deserialize;

use crate::purpleair::SensorReading;

/// Decides which of a reading's values are published.
///
/// One policy is chosen per deployment; it also fixes the label schema of
/// every exported series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishPolicy {
    /// Environment only from the parent channel, particulates only when
    /// neither the data nor the hardware flag is set. Series carry
    /// `sensor` and `parent` labels.
    #[default]
    ChannelRole,

    /// Environment whenever temperature, humidity and pressure are all
    /// nonzero, particulates always. Series carry only the `sensor` label.
    ValueHeuristic,
}

impl PublishPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishPolicy::ChannelRole => "channel-role",
            PublishPolicy::ValueHeuristic => "value-heuristic",
        }
    }

    pub fn publishes_environment(&self, reading: &SensorReading) -> bool {
        match self {
            PublishPolicy::ChannelRole => reading.is_parent(),
            PublishPolicy::ValueHeuristic => reading.has_environment(),
        }
    }

    pub fn publishes_particulates(&self, reading: &SensorReading) -> bool {
        match self {
            PublishPolicy::ChannelRole => !reading.is_flagged(),
            PublishPolicy::ValueHeuristic => true,
        }
    }

    pub fn label_names(&self) -> &'static [&'static str] {
        match self {
            PublishPolicy::ChannelRole => &["sensor", "parent"],
            PublishPolicy::ValueHeuristic => &["sensor"],
        }
    }

    pub fn label_values(&self, reading: &SensorReading) -> Vec<String> {
        match self {
            PublishPolicy::ChannelRole => {
                vec![reading.id.to_string(), reading.parent_id.to_string()]
            }
            PublishPolicy::ValueHeuristic => vec![reading.id.to_string()],
        }
    }
}

impl fmt::Display for PublishPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "channel-role" => Ok(PublishPolicy::ChannelRole),
            "value-heuristic" => Ok(PublishPolicy::ValueHeuristic),
            _ => bail!("unknown publish policy: {}", s),
        }
    }
}
