use anyhow::Context as _;
use serde::{Deserialize, Deserializer, de::Error as _};

use crate::purpleair::SensorReading;

// Ref: https://docs.google.com/document/d/15ijz94dXJ-YAZLi9iZ_RaBwrZ4KtYeCy08goGBwnbCU/edit

#[derive(Debug, Default, Deserialize)]
pub struct RawSensorResponse {
    #[serde(default)]
    pub results: Vec<RawSensorResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawSensorResult {
    #[serde(rename = "ID")]
    pub id: u32,

    #[serde(rename = "ParentID", default)]
    pub parent_id: Option<u32>,

    #[serde(rename = "Label", default)]
    pub label: Option<String>,

    #[serde(rename = "Flag", default)]
    pub flag: Option<i64>,

    #[serde(rename = "A_H", default, deserialize_with = "deserialize_flag")]
    pub hardware_flag: Option<bool>,

    #[serde(rename = "temp_f", default, deserialize_with = "deserialize_numeric")]
    pub temperature_f: Option<f64>,

    #[serde(rename = "humidity", default, deserialize_with = "deserialize_numeric")]
    pub humidity_percent: Option<f64>,

    #[serde(rename = "pressure", default, deserialize_with = "deserialize_numeric")]
    pub pressure: Option<f64>,

    #[serde(rename = "pm2_5_cf_1", default, deserialize_with = "deserialize_numeric")]
    pub pm_2_5: Option<f64>,

    #[serde(rename = "pm10_0_cf_1", default, deserialize_with = "deserialize_numeric")]
    pub pm_10_0: Option<f64>,
}

impl RawSensorResult {
    pub fn normalize(self) -> SensorReading {
        // 0 is what upstream reports for "no parent" on older payloads.
        let parent_id = match self.parent_id {
            Some(parent_id) if parent_id != 0 => parent_id,
            _ => self.id,
        };

        SensorReading {
            id: self.id,
            parent_id,
            label: self.label.unwrap_or_default(),
            data_flag: self.flag.unwrap_or_default(),
            hardware_flag: self.hardware_flag.unwrap_or_default(),
            temperature_f: self.temperature_f.unwrap_or_default(),
            humidity_percent: self.humidity_percent.unwrap_or_default(),
            pressure: self.pressure.unwrap_or_default(),
            pm_2_5: self.pm_2_5.unwrap_or_default(),
            pm_10_0: self.pm_10_0.unwrap_or_default(),
        }
    }
}

impl RawSensorResponse {
    pub fn into_readings(self) -> Vec<SensorReading> {
        self.results
            .into_iter()
            .map(RawSensorResult::normalize)
            .collect()
    }
}

pub fn decode_readings(body: &str) -> anyhow::Result<Vec<SensorReading>> {
    let response: RawSensorResponse =
        serde_json::from_str(body).context("failed to decode PurpleAir response")?;

    Ok(response.into_readings())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

// Upstream sends most measurements as strings ("12.34").
fn deserialize_numeric<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Numeric>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Numeric::Number(v)) => Ok(Some(v)),
        Some(Numeric::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Numeric::Text(s)) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            _ => Err(D::Error::custom(format!("invalid numeric string: {s:?}"))),
        },
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Number(i64),
    Text(String),
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(v)) => Ok(Some(v)),
        Some(Flag::Number(v)) => Ok(Some(v != 0)),
        Some(Flag::Text(s)) => match s.trim() {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" | "" => Ok(Some(false)),
            _ => Err(D::Error::custom(format!("invalid flag: {s:?}"))),
        },
    }
}
