/// One sensing channel's measurements for a single poll cycle.
///
/// A PurpleAir device may bundle a primary and a secondary particulate
/// sensor; each arrives as its own reading. `id == parent_id` marks the
/// primary channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorReading {
    pub id: u32,

    pub parent_id: u32,

    pub label: String,

    pub data_flag: i64,

    pub hardware_flag: bool,

    pub temperature_f: f64,

    pub humidity_percent: f64,

    pub pressure: f64,

    pub pm_2_5: f64,

    pub pm_10_0: f64,
}

impl SensorReading {
    pub fn is_parent(&self) -> bool {
        self.id == self.parent_id
    }

    pub fn is_flagged(&self) -> bool {
        self.data_flag != 0 || self.hardware_flag
    }

    /// A zero in any environmental field is taken as "not reported this
    /// cycle", even though 0°F is a real temperature.
    pub fn has_environment(&self) -> bool {
        self.temperature_f != 0.0 && self.humidity_percent != 0.0 && self.pressure != 0.0
    }
}
