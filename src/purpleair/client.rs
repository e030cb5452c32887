use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use reqwest::StatusCode;
use tracing::debug;

use crate::purpleair::{SensorReading, decode_readings};

pub const DEFAULT_API_URL: &str = "https://www.purpleair.com/json";

/// Upper bound on ids joined into a single `show=` query.
pub const MAX_SENSORS_PER_REQUEST: usize = 20;

#[derive(Debug, Clone)]
pub struct PurpleAirClient {
    http: reqwest::Client,
    url: String,
}

impl PurpleAirClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Fetches readings for every id, one request per
    /// [`MAX_SENSORS_PER_REQUEST`] ids.
    pub async fn fetch(&self, sensor_ids: &[u32]) -> Result<Vec<SensorReading>> {
        if sensor_ids.is_empty() {
            bail!("no sensors specified");
        }

        let mut readings = Vec::new();
        for chunk in sensor_ids.chunks(MAX_SENSORS_PER_REQUEST) {
            let url = sensor_url(&self.url, chunk);
            debug!("requesting {url}");

            let response = self
                .http
                .get(&url)
                .send()
                .await
                .with_context(|| format!("failed to request sensors: {url}"))?;

            let status = response.status();
            if status != StatusCode::OK {
                bail!("unexpected status reading sensors: {status}");
            }

            let body = response
                .text()
                .await
                .context("failed to read PurpleAir response body")?;

            readings.extend(decode_readings(&body)?);
        }

        Ok(readings)
    }
}

pub fn sensor_url(base: &str, sensor_ids: &[u32]) -> String {
    let show = sensor_ids
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join("|");

    format!("{base}?show={show}")
}
