use purpleprom::{
    aqi::compute_aqi,
    metrics::MetricsRegistry,
    policy::PublishPolicy,
    purpleair::{SensorReading, decode_readings},
};

// A dual-channel device (A: 37011, B: 37012) and a single-channel device.
const RESPONSE: &str = r#"{
    "mapVersion": "0.12",
    "baseVersion": "7",
    "results": [
        {"ID": 37011, "Label": "Hillside", "Flag": 0, "A_H": null,
         "pm2_5_cf_1": "40.1", "pm10_0_cf_1": "62.7",
         "temp_f": "68", "humidity": "41", "pressure": "1009.54"},
        {"ID": 37012, "ParentID": 37011, "Label": "Hillside B", "Flag": 1,
         "pm2_5_cf_1": "480.0", "pm10_0_cf_1": "510.3"},
        {"ID": 5120, "ParentID": 0, "Label": "Garage", "A_H": "true",
         "pm2_5_cf_1": "3.2", "pm10_0_cf_1": "4.0",
         "temp_f": "0", "humidity": "0", "pressure": "0"}
    ]
}"#;

fn sample(registry: &MetricsRegistry, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    let family = registry
        .gather()
        .into_iter()
        .find(|f| f.get_name() == name)?;

    family
        .get_metric()
        .iter()
        .find(|m| {
            let pairs = m.get_label();
            pairs.len() == labels.len()
                && labels.iter().all(|(k, v)| {
                    pairs
                        .iter()
                        .any(|p| p.get_name() == *k && p.get_value() == *v)
                })
        })
        .map(|m| m.get_gauge().get_value())
}

fn series_count(registry: &MetricsRegistry, name: &str) -> usize {
    registry
        .gather()
        .iter()
        .find(|f| f.get_name() == name)
        .map_or(0, |f| f.get_metric().len())
}

#[test]
fn channel_role_publishes_per_channel() {
    let readings = decode_readings(RESPONSE).unwrap();
    let registry = MetricsRegistry::new(PublishPolicy::ChannelRole).unwrap();
    registry.record(&readings);

    let a = [("sensor", "37011"), ("parent", "37011")];
    let b = [("sensor", "37012"), ("parent", "37011")];
    let garage = [("sensor", "5120"), ("parent", "5120")];

    // Parent channels publish environment, secondary channels never do.
    assert_eq!(sample(&registry, "pa_temp", &a), Some(68.0));
    assert_eq!(sample(&registry, "pa_pressure", &a), Some(1009.54));
    assert_eq!(sample(&registry, "pa_temp", &b), None);
    assert_eq!(sample(&registry, "pa_temp", &garage), Some(0.0));
    assert_eq!(series_count(&registry, "pa_humidity"), 2);

    assert_eq!(sample(&registry, "pa_pm_2_5", &a), Some(40.1));
    assert_eq!(sample(&registry, "pa_AQI_pm_2_5", &a), Some(compute_aqi(40.1)));
    assert_eq!(sample(&registry, "pa_AQI_pm_10_0", &a), Some(compute_aqi(62.7)));
    assert_eq!(
        sample(&registry, "pa_AQI", &a),
        Some(compute_aqi(40.1).max(compute_aqi(62.7)))
    );

    // Data flag on B and hardware flag on the garage suppress particulates.
    for name in ["pa_pm_2_5", "pa_pm_10_0", "pa_AQI_pm_2_5", "pa_AQI_pm_10_0", "pa_AQI"] {
        assert_eq!(sample(&registry, name, &b), None, "{name}");
        assert_eq!(sample(&registry, name, &garage), None, "{name}");
        assert_eq!(series_count(&registry, name), 1, "{name}");
    }

    // Every channel is labelled regardless of flags.
    assert_eq!(series_count(&registry, "pa_label"), 3);
    assert_eq!(
        sample(
            &registry,
            "pa_label",
            &[("sensor", "37012"), ("parent", "37011"), ("label", "Hillside B")]
        ),
        Some(1.0)
    );
}

#[test]
fn value_heuristic_publishes_by_value() {
    let readings = decode_readings(RESPONSE).unwrap();
    let registry = MetricsRegistry::new(PublishPolicy::ValueHeuristic).unwrap();
    registry.record(&readings);

    // The all-zero triple on the garage is "not reported".
    assert_eq!(sample(&registry, "pa_temp", &[("sensor", "37011")]), Some(68.0));
    assert_eq!(sample(&registry, "pa_temp", &[("sensor", "5120")]), None);
    assert_eq!(sample(&registry, "pa_temp", &[("sensor", "37012")]), None);

    // Flags are ignored.
    assert_eq!(sample(&registry, "pa_pm_2_5", &[("sensor", "37012")]), Some(480.0));
    assert_eq!(sample(&registry, "pa_AQI", &[("sensor", "37012")]), Some(compute_aqi(510.3)));
    assert_eq!(sample(&registry, "pa_pm_2_5", &[("sensor", "5120")]), Some(3.2));
    assert_eq!(
        sample(&registry, "pa_label", &[("sensor", "5120"), ("label", "Garage")]),
        Some(1.0)
    );
}

#[test]
fn partially_reported_environment_is_skipped() {
    let registry = MetricsRegistry::new(PublishPolicy::ValueHeuristic).unwrap();
    registry.record(&[SensorReading {
        id: 1,
        parent_id: 1,
        temperature_f: 40.0,
        humidity_percent: 0.0,
        pressure: 1013.0,
        ..Default::default()
    }]);

    assert_eq!(series_count(&registry, "pa_temp"), 0);
    assert_eq!(series_count(&registry, "pa_humidity"), 0);
    assert_eq!(series_count(&registry, "pa_pressure"), 0);
}

#[test]
fn later_polls_overwrite_and_keep_missing_sensors() {
    let registry = MetricsRegistry::new(PublishPolicy::ChannelRole).unwrap();
    registry.record(&decode_readings(RESPONSE).unwrap());

    let next = decode_readings(
        r#"{"results":[{"ID":37011,"Label":"Hillside","pm2_5_cf_1":"5.0","pm10_0_cf_1":"6.0",
            "temp_f":"70","humidity":"40","pressure":"1010"}]}"#,
    )
    .unwrap();
    registry.record(&next);

    let a = [("sensor", "37011"), ("parent", "37011")];
    assert_eq!(sample(&registry, "pa_pm_2_5", &a), Some(5.0));
    assert_eq!(sample(&registry, "pa_AQI", &a), Some(compute_aqi(6.0)));
    assert_eq!(sample(&registry, "pa_temp", &a), Some(70.0));
    assert_eq!(series_count(&registry, "pa_pm_2_5"), 1);

    // Sensors absent from this poll keep their last values.
    assert_eq!(
        sample(&registry, "pa_temp", &[("sensor", "5120"), ("parent", "5120")]),
        Some(0.0)
    );
}

#[test]
fn negative_concentration_publishes_zero_aqi() {
    let registry = MetricsRegistry::new(PublishPolicy::ChannelRole).unwrap();
    registry.record(&[SensorReading {
        id: 2,
        parent_id: 2,
        pm_2_5: -4.0,
        pm_10_0: 3.0,
        ..Default::default()
    }]);

    let key = [("sensor", "2"), ("parent", "2")];
    assert_eq!(sample(&registry, "pa_pm_2_5", &key), Some(-4.0));
    assert_eq!(sample(&registry, "pa_AQI_pm_2_5", &key), Some(0.0));
    assert_eq!(sample(&registry, "pa_AQI", &key), Some(compute_aqi(3.0)));
}
