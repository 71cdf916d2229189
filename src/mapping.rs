//! Pure conversions between device-native and accessory-native representations.

use crate::models::accessory::{CurrentHeatingCoolingState, TargetHeatingCoolingState};
use crate::models::device::{FanSpeed, VentilationMode};
use core::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Pause applied when a pausable subsystem is switched off, in device minutes.
pub const DEFAULT_PAUSE_MINUTES: i32 = 180;

pub fn tenths_to_degrees(tenths: i32) -> f64 {
    f64::from(tenths) / 10.0
}

/// `None` for non-finite input or values that do not fit the device register.
pub fn degrees_to_tenths(degrees: f64) -> Option<i32> {
    if !degrees.is_finite() {
        return None;
    }
    let tenths = (degrees * 10.0).round();
    if tenths < f64::from(i32::MIN) || tenths > f64::from(i32::MAX) {
        return None;
    }
    Some(tenths as i32)
}

pub fn humidity_percent(percent: i32) -> f64 {
    f64::from(percent)
}

/// `None` for levels the controller never reports (outside 101..=104).
pub fn fan_speed_to_percent(speed: FanSpeed) -> Option<f64> {
    if !(FanSpeed::LOW..=FanSpeed::VERY_HIGH).contains(&speed) {
        return None;
    }
    speed.0.checked_sub(100).map(|step| f64::from(step) * 25.0)
}

/// Step the rotation percentage down to a fan level, clamped to 101..=104.
pub fn percent_to_fan_speed(percent: f64) -> Option<FanSpeed> {
    if !percent.is_finite() {
        return None;
    }
    let step = (percent / 25.0).floor() as i32;
    Some(FanSpeed(100_i32.saturating_add(step).clamp(FanSpeed::LOW.0, FanSpeed::VERY_HIGH.0)))
}

/// A paused ventilation unit reads as Off whatever mode is stored.
pub fn ventilation_target(mode: VentilationMode, paused: bool) -> TargetHeatingCoolingState {
    if paused {
        return TargetHeatingCoolingState::Off;
    }
    match mode {
        VentilationMode::Auto => TargetHeatingCoolingState::Auto,
        VentilationMode::Cooling => TargetHeatingCoolingState::Cool,
        VentilationMode::Heating => TargetHeatingCoolingState::Heat,
    }
}

/// Auto has no current-state counterpart and reads as Off.
pub fn ventilation_current(mode: VentilationMode, paused: bool) -> CurrentHeatingCoolingState {
    match ventilation_target(mode, paused) {
        TargetHeatingCoolingState::Heat => CurrentHeatingCoolingState::Heat,
        TargetHeatingCoolingState::Cool => CurrentHeatingCoolingState::Cool,
        TargetHeatingCoolingState::Off | TargetHeatingCoolingState::Auto => CurrentHeatingCoolingState::Off,
    }
}

/// `None` means "pause ventilation" rather than a mode.
pub fn ventilation_mode_for(target: TargetHeatingCoolingState) -> Option<VentilationMode> {
    match target {
        TargetHeatingCoolingState::Off => None,
        TargetHeatingCoolingState::Heat => Some(VentilationMode::Heating),
        TargetHeatingCoolingState::Cool => Some(VentilationMode::Cooling),
        TargetHeatingCoolingState::Auto => Some(VentilationMode::Auto),
    }
}

/// How "is on" and "paused" combine into an active flag for one attribute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum HeatingActivePolicy {
    /// Active iff on and not paused.
    #[default]
    Direct,
    /// Active iff not (on and not paused).
    Inverted,
}

impl HeatingActivePolicy {
    pub fn is_active(self, is_on: bool, paused: bool) -> bool {
        let direct = is_on && !paused;
        match self {
            HeatingActivePolicy::Direct => direct,
            HeatingActivePolicy::Inverted => !direct,
        }
    }
}

impl FromStr for HeatingActivePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(HeatingActivePolicy::Direct),
            "inverted" => Ok(HeatingActivePolicy::Inverted),
            other => Err(format!("unknown heating state policy `{}` (expected direct or inverted)", other)),
        }
    }
}

impl Display for HeatingActivePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            HeatingActivePolicy::Direct => f.write_str("direct"),
            HeatingActivePolicy::Inverted => f.write_str("inverted"),
        }
    }
}

pub fn heating_state(active: bool) -> CurrentHeatingCoolingState {
    if active {
        CurrentHeatingCoolingState::Heat
    } else {
        CurrentHeatingCoolingState::Off
    }
}
