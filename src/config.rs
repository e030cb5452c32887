use std::{path::Path, time::Duration};

use anyhow::{Context as _, Result, bail};
use indexmap::IndexSet;
use serde::Deserialize;

use crate::{policy::PublishPolicy, purpleair::DEFAULT_API_URL};

pub const DEFAULT_CONFIG_PATH: &str = "purpleprom.conf";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_METRICS_PATH: &str = "/metrics";
const DEFAULT_METRICS_PORT: u16 = 6005;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub poll_interval: Duration,

    pub sensors: Vec<u32>,

    pub metrics: MetricsConfig,

    pub policy: PublishPolicy,

    pub api: ApiConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    pub enabled: bool,

    pub path: String,

    pub port: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub url: String,

    pub timeout: Duration,
}

impl MetricsConfig {
    /// An empty path or a zero port turns export off even when enabled.
    pub fn is_exported(&self) -> bool {
        self.enabled && !self.path.is_empty() && self.port != 0
    }
}

/// The configuration file as written, before defaults are applied.
///
/// The file is strict JSON, so comments are not supported.
#[derive(Debug, Default, Deserialize)]
pub struct RawConfig {
    #[serde(rename = "pollinterval", default)]
    pub poll_interval: Option<RawDuration>,

    #[serde(default)]
    pub sensors: Option<Vec<u32>>,

    #[serde(default)]
    pub metrics: Option<RawMetricsConfig>,

    #[serde(default)]
    pub policy: Option<PublishPolicy>,

    #[serde(default)]
    pub api: Option<RawApiConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawMetricsConfig {
    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawApiConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub timeout: Option<RawDuration>,
}

/// A duration string such as `"1m30s"`, or a bare number of nanoseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Nanos(f64),
    Text(String),
}

impl RawDuration {
    pub fn to_duration(&self) -> Result<Duration> {
        match self {
            RawDuration::Nanos(n) if *n <= 0.0 => Ok(Duration::ZERO),
            RawDuration::Nanos(n) => Ok(Duration::from_nanos(*n as u64)),
            RawDuration::Text(s) => parse_duration(s),
        }
    }
}

impl RawConfig {
    pub fn normalize(self) -> Result<Config> {
        let poll_interval = match self.poll_interval {
            Some(raw) => raw.to_duration().context("invalid pollinterval")?,
            None => Duration::ZERO,
        };
        let poll_interval = if poll_interval.is_zero() {
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };

        let sensors: IndexSet<u32> = self.sensors.unwrap_or_default().into_iter().collect();
        if sensors.is_empty() {
            bail!("no sensors specified in configuration");
        }

        let metrics = self.metrics.unwrap_or_default();
        let path = match metrics.path {
            Some(path) if !path.is_empty() && !path.starts_with('/') => format!("/{path}"),
            Some(path) => path,
            None => DEFAULT_METRICS_PATH.to_string(),
        };
        let metrics = MetricsConfig {
            enabled: metrics.enabled.unwrap_or(true),
            path,
            port: metrics.port.unwrap_or(DEFAULT_METRICS_PORT),
        };

        let api = self.api.unwrap_or_default();
        let timeout = match api.timeout {
            Some(raw) => raw.to_duration().context("invalid api.timeout")?,
            None => Duration::ZERO,
        };
        let api = ApiConfig {
            url: api.url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            timeout: if timeout.is_zero() {
                DEFAULT_REQUEST_TIMEOUT
            } else {
                timeout
            },
        };

        Ok(Config {
            poll_interval,
            sensors: sensors.into_iter().collect(),
            metrics,
            policy: self.policy.unwrap_or_default(),
            api,
        })
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        Self::from_json(&content).with_context(|| format!("invalid config: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json).context("failed to parse config")?;

        raw.normalize()
    }
}

/// Parses Go-style durations: a sequence of decimal numbers with units
/// (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`), e.g. `"1h15m"` or `"1.5s"`.
///
/// Negative durations parse to zero.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let trimmed = s.trim();
    let (negative, mut rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        bail!("invalid duration: {s:?}");
    }

    let mut seconds = 0f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            bail!("invalid duration: {s:?}");
        }
        let value: f64 = rest[..number_len]
            .parse()
            .with_context(|| format!("invalid duration: {s:?}"))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1e-9,
            "us" | "µs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "" => bail!("missing unit in duration: {s:?}"),
            unit => bail!("unknown unit {unit:?} in duration: {s:?}"),
        };
        rest = &rest[unit_len..];

        seconds += value * scale;
    }

    if negative {
        return Ok(Duration::ZERO);
    }

    Duration::try_from_secs_f64(seconds).with_context(|| format!("duration out of range: {s:?}"))
}
