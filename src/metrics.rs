use anyhow::{Context as _, Result};
use prometheus::{Encoder as _, GaugeVec, Opts, Registry, TextEncoder, proto::MetricFamily};
use tracing::debug;

use crate::{aqi::compute_aqi, policy::PublishPolicy, purpleair::SensorReading};

const PRESENT: f64 = 1.0;

/// The gauge map shared between the poll loop and the exposition endpoint.
///
/// Gauges are keyed by the policy's label tuple; every write overwrites the
/// previous value for that key. Nothing is ever removed, so a sensor that
/// stops reporting keeps its last values until the process exits.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    policy: PublishPolicy,
    temperature: GaugeVec,
    humidity: GaugeVec,
    pressure: GaugeVec,
    pm_2_5: GaugeVec,
    pm_10_0: GaugeVec,
    aqi_pm_2_5: GaugeVec,
    aqi_pm_10_0: GaugeVec,
    aqi: GaugeVec,
    label: GaugeVec,
}

impl MetricsRegistry {
    pub fn new(policy: PublishPolicy) -> Result<Self> {
        let registry = Registry::new();
        let labels = policy.label_names();

        let mut label_labels = labels.to_vec();
        label_labels.push("label");

        Ok(Self {
            temperature: register_gauge(
                &registry,
                "pa_temp",
                "PurpleAir temperature (F) reading.",
                labels,
            )?,
            humidity: register_gauge(
                &registry,
                "pa_humidity",
                "PurpleAir humidity reading.",
                labels,
            )?,
            pressure: register_gauge(
                &registry,
                "pa_pressure",
                "PurpleAir pressure reading.",
                labels,
            )?,
            pm_2_5: register_gauge(
                &registry,
                "pa_pm_2_5",
                "PurpleAir PM 2.5 ug/m3 reading.",
                labels,
            )?,
            pm_10_0: register_gauge(
                &registry,
                "pa_pm_10_0",
                "PurpleAir PM 10.0 ug/m3 reading.",
                labels,
            )?,
            aqi_pm_2_5: register_gauge(
                &registry,
                "pa_AQI_pm_2_5",
                "PurpleAir AQI calculation based on PM 2.5 ug/m3 reading.",
                labels,
            )?,
            aqi_pm_10_0: register_gauge(
                &registry,
                "pa_AQI_pm_10_0",
                "PurpleAir AQI calculation based on PM 10.0 ug/m3 reading.",
                labels,
            )?,
            aqi: register_gauge(
                &registry,
                "pa_AQI",
                "PurpleAir AQI calculation based on all available inputs.",
                labels,
            )?,
            label: register_gauge(
                &registry,
                "pa_label",
                "PurpleAir sensor to label map.",
                &label_labels,
            )?,
            registry,
            policy,
        })
    }

    pub fn record(&self, readings: &[SensorReading]) {
        for reading in readings {
            self.record_one(reading);
        }
    }

    fn record_one(&self, reading: &SensorReading) {
        let values = self.policy.label_values(reading);
        let mut keys: Vec<&str> = values.iter().map(String::as_str).collect();

        keys.push(&reading.label);
        self.label.with_label_values(&keys).set(PRESENT);
        keys.pop();

        if self.policy.publishes_environment(reading) {
            self.temperature
                .with_label_values(&keys)
                .set(reading.temperature_f);
            self.humidity
                .with_label_values(&keys)
                .set(reading.humidity_percent);
            self.pressure.with_label_values(&keys).set(reading.pressure);
        }

        // Transitory events (a bug crawling over the sensor) produce nonsense
        // particulate values; upstream flags them.
        if !self.policy.publishes_particulates(reading) {
            debug!(
                "sensor {} flagged (data: {}, hardware: {}), skipping particulates",
                reading.id, reading.data_flag, reading.hardware_flag
            );
            return;
        }

        self.pm_2_5.with_label_values(&keys).set(reading.pm_2_5);
        self.pm_10_0.with_label_values(&keys).set(reading.pm_10_0);

        let aqi_pm_2_5 = compute_aqi(reading.pm_2_5);
        let aqi_pm_10_0 = compute_aqi(reading.pm_10_0);

        self.aqi_pm_2_5.with_label_values(&keys).set(aqi_pm_2_5);
        self.aqi_pm_10_0.with_label_values(&keys).set(aqi_pm_10_0);
        self.aqi
            .with_label_values(&keys)
            .set(aqi_pm_2_5.max(aqi_pm_10_0));
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder
            .encode(&self.gather(), &mut buf)
            .context("failed to encode metrics")?;

        String::from_utf8(buf).context("encoded metrics are not UTF-8")
    }

    pub fn content_type(&self) -> &'static str {
        prometheus::TEXT_FORMAT
    }
}

fn register_gauge(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<GaugeVec> {
    let gauge = GaugeVec::new(Opts::new(name, help), labels)
        .with_context(|| format!("failed to create gauge: {name}"))?;

    registry
        .register(Box::new(gauge.clone()))
        .with_context(|| format!("failed to register gauge: {name}"))?;

    Ok(gauge)
}
