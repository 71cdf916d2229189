//! Device-side models as exchanged with the gateway.
//!
//! Notes
//! - Temperatures are tenths of a degree Celsius (`215` is 21.5 °C).
//! - Humidity is an integer percentage.
//! - Every `Settings` field is optional. A `Settings` value doubles as a patch: absent
//!   fields are never serialized and never touch the device.

use serde::{Deserialize, Serialize};

// =====================
// Enumerations
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum VentilationMode {
    // 0=AUTO, 1=COOLING, 2=HEATING
    Auto,
    Cooling,
    Heating,
}

impl VentilationMode {
    pub fn code(self) -> i64 {
        match self {
            VentilationMode::Auto => 0,
            VentilationMode::Cooling => 1,
            VentilationMode::Heating => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(VentilationMode::Auto),
            1 => Some(VentilationMode::Cooling),
            2 => Some(VentilationMode::Heating),
            _ => None,
        }
    }
}

impl serde::Serialize for VentilationMode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> serde::Deserialize<'de> for VentilationMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = VentilationMode;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, "an integer 0, 1 or 2 for VentilationMode")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                VentilationMode::from_code(value)
                    .ok_or_else(|| E::invalid_value(serde::de::Unexpected::Signed(value), &self))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(value)
                    .ok()
                    .and_then(VentilationMode::from_code)
                    .ok_or_else(|| E::invalid_value(serde::de::Unexpected::Unsigned(value), &self))
            }
        }

        deserializer.deserialize_any(V)
    }
}

/// Fan step level as reported by the controller: 101 (lowest) to 104 (highest).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FanSpeed(pub i32);

impl FanSpeed {
    pub const LOW: FanSpeed = FanSpeed(101);
    pub const NORMAL: FanSpeed = FanSpeed(102);
    pub const HIGH: FanSpeed = FanSpeed(103);
    pub const VERY_HIGH: FanSpeed = FanSpeed(104);
}

// =====================
// Snapshots
// =====================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Readings {
    pub outdoor_temperature: i32,
    pub room_temperature: i32,
    pub supply_flow_temperature: i32,
    pub dhw_tank_top_temperature: i32,
    pub actual_humidity: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_heating_is_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_heating_paused: Option<bool>,
    /// Minutes; only meaningful together with `central_heating_paused = true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub central_heating_pause_duration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_room_temperature: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ventilation_mode: Option<VentilationMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ventilation_on_pause: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_speed: Option<FanSpeed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhw_production_paused: Option<bool>,
    /// Minutes; only meaningful together with `dhw_production_paused = true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dhw_production_pause_duration: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_dhw_temperature: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setpoint_supply_temperature: Option<i32>,
}

impl Settings {
    /// Names of the fields that are present, in declaration order.
    pub fn present_fields(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        let mut push = |present: bool, name: &'static str| {
            if present {
                out.push(name);
            }
        };
        push(self.central_heating_is_on.is_some(), "centralHeatingIsOn");
        push(self.central_heating_paused.is_some(), "centralHeatingPaused");
        push(self.central_heating_pause_duration.is_some(), "centralHeatingPauseDuration");
        push(self.desired_room_temperature.is_some(), "desiredRoomTemperature");
        push(self.ventilation_mode.is_some(), "ventilationMode");
        push(self.ventilation_on_pause.is_some(), "ventilationOnPause");
        push(self.fan_speed.is_some(), "fanSpeed");
        push(self.dhw_production_paused.is_some(), "dhwProductionPaused");
        push(self.dhw_production_pause_duration.is_some(), "dhwProductionPauseDuration");
        push(self.desired_dhw_temperature.is_some(), "desiredDhwTemperature");
        push(self.setpoint_supply_temperature.is_some(), "setpointSupplyTemperature");
        out
    }

    /// Apply `patch` on top of `self`: present fields overwrite, absent fields are kept.
    pub fn merge(&mut self, patch: &Settings) {
        fn take<T: Copy>(dst: &mut Option<T>, src: Option<T>) {
            if src.is_some() {
                *dst = src;
            }
        }
        take(&mut self.central_heating_is_on, patch.central_heating_is_on);
        take(&mut self.central_heating_paused, patch.central_heating_paused);
        take(&mut self.central_heating_pause_duration, patch.central_heating_pause_duration);
        take(&mut self.desired_room_temperature, patch.desired_room_temperature);
        take(&mut self.ventilation_mode, patch.ventilation_mode);
        take(&mut self.ventilation_on_pause, patch.ventilation_on_pause);
        take(&mut self.fan_speed, patch.fan_speed);
        take(&mut self.dhw_production_paused, patch.dhw_production_paused);
        take(&mut self.dhw_production_pause_duration, patch.dhw_production_pause_duration);
        take(&mut self.desired_dhw_temperature, patch.desired_dhw_temperature);
        take(&mut self.setpoint_supply_temperature, patch.setpoint_supply_temperature);
    }
}

/// One readings fetch plus one settings fetch, projected as a unit.
///
/// The two fetches are separate gateway calls and may straddle a device-side change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub readings: Readings,
    pub settings: Settings,
}
