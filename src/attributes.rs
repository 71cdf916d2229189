//! Accessory attribute table.
//!
//! Every characteristic the bridge can expose is one row: which service it belongs to,
//! whether clients may write it, the device-native range a write must fall in, how it is
//! projected from a device snapshot and how a client write becomes a settings patch.
//! A [`Profile`] picks the services a deployment exposes.

use crate::mapping::{self, DEFAULT_PAUSE_MINUTES, HeatingActivePolicy};
use crate::models::accessory::{Active, CurrentHeatingCoolingState, TargetHeatingCoolingState, Value, ValueKind};
use crate::models::device::{Settings, Snapshot};
use core::fmt;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Service {
    CentralHeatingSwitch,
    VentilationThermostat,
    OutdoorTemperature,
    Fan,
    HotWaterSwitch,
    HotWater,
    SupplyFlow,
}

impl Service {
    pub fn display_name(self) -> &'static str {
        match self {
            Service::CentralHeatingSwitch => "Central Heating",
            Service::VentilationThermostat => "Room Temperature",
            Service::OutdoorTemperature => "Outdoor Temperature",
            Service::Fan => "Fan",
            Service::HotWaterSwitch => "Hot Water Production",
            Service::HotWater => "Hot Water",
            Service::SupplyFlow => "Supply Flow",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKey {
    CentralHeatingOn,
    RoomCurrentTemperature,
    RoomTargetTemperature,
    RoomHumidity,
    VentilationTargetState,
    VentilationCurrentState,
    OutdoorTemperature,
    FanActive,
    FanRotationSpeed,
    HotWaterOn,
    HotWaterCurrentTemperature,
    HotWaterTargetTemperature,
    HotWaterTargetState,
    HotWaterCurrentState,
    SupplyFlowCurrentTemperature,
    SupplyFlowTargetTemperature,
    SupplyFlowTargetState,
    SupplyFlowCurrentState,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Read,
    ReadWrite,
}

/// Accessory-side metadata of a numeric characteristic.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Bounds {
    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }
}

/// Composite-state policies applied during projection, one per attribute that has one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Policies {
    pub central_heating: HeatingActivePolicy,
    pub supply_flow: HeatingActivePolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    /// The gateway answered but left out a settings field the projection needs.
    MissingField(&'static str),
    /// A settings field holds a value the controller is not supposed to report.
    OutOfRange { field: &'static str, value: i32 },
}

impl Display for ProjectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionError::MissingField(name) => write!(f, "settings field `{}` missing from gateway response", name),
            ProjectionError::OutOfRange { field, value } => {
                write!(f, "settings field `{}` holds unsupported value {}", field, value)
            }
        }
    }
}

impl Error for ProjectionError {}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    OutOfRange {
        attribute: &'static str,
        value: i32,
        range: RangeInclusive<i32>,
    },
    NotANumber(&'static str),
    WrongType {
        attribute: &'static str,
        expected: ValueKind,
    },
    ReadOnly(&'static str),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::OutOfRange { attribute, value, range } => write!(
                f,
                "{}: device value {} outside {}..={}",
                attribute,
                value,
                range.start(),
                range.end()
            ),
            CommandError::NotANumber(attribute) => write!(f, "{}: value is not a finite number", attribute),
            CommandError::WrongType { attribute, expected } => {
                write!(f, "{}: expected a {:?} value", attribute, expected)
            }
            CommandError::ReadOnly(attribute) => write!(f, "{}: attribute is read-only", attribute),
        }
    }
}

impl Error for CommandError {}

pub type Projector = fn(&Snapshot, &Policies) -> Result<Value, ProjectionError>;
pub type Translator = fn(&Attribute, Value) -> Result<Settings, CommandError>;

#[derive(Debug)]
pub struct Attribute {
    pub key: AttributeKey,
    pub service: Service,
    /// Stable identifier, e.g. `room.target-temperature`.
    pub name: &'static str,
    pub direction: Direction,
    pub kind: ValueKind,
    pub default: Value,
    pub bounds: Option<Bounds>,
    /// Accepted device-native values for writes.
    pub valid: Option<RangeInclusive<i32>>,
    pub project: Projector,
    pub translate: Option<Translator>,
}

impl Attribute {
    pub fn is_writable(&self) -> bool {
        self.direction == Direction::ReadWrite && self.translate.is_some()
    }

    /// Range-check a device-native value against this attribute's write range.
    pub fn check(&self, native: i32) -> Result<i32, CommandError> {
        match &self.valid {
            Some(range) if !range.contains(&native) => Err(CommandError::OutOfRange {
                attribute: self.name,
                value: native,
                range: range.clone(),
            }),
            _ => Ok(native),
        }
    }
}

const CURRENT_TEMPERATURE: Option<Bounds> = Some(Bounds {
    min: 0.0,
    max: 100.0,
    step: 0.1,
});

pub static ATTRIBUTES: &[Attribute] = &[
    Attribute {
        key: AttributeKey::CentralHeatingOn,
        service: Service::CentralHeatingSwitch,
        name: "central-heating.on",
        direction: Direction::ReadWrite,
        kind: ValueKind::Bool,
        default: Value::Bool(false),
        bounds: None,
        valid: None,
        project: |snap, policies| {
            let s = &snap.settings;
            let on = require(s.central_heating_is_on, "centralHeatingIsOn")?;
            let paused = require(s.central_heating_paused, "centralHeatingPaused")?;
            Ok(Value::Bool(policies.central_heating.is_active(on, paused)))
        },
        translate: Some(switch_central_heating),
    },
    Attribute {
        key: AttributeKey::RoomCurrentTemperature,
        service: Service::VentilationThermostat,
        name: "room.current-temperature",
        direction: Direction::Read,
        kind: ValueKind::Float,
        default: Value::Float(0.0),
        bounds: CURRENT_TEMPERATURE,
        valid: None,
        project: |snap, _| Ok(Value::Float(mapping::tenths_to_degrees(snap.readings.room_temperature))),
        translate: None,
    },
    Attribute {
        key: AttributeKey::RoomTargetTemperature,
        service: Service::VentilationThermostat,
        name: "room.target-temperature",
        direction: Direction::ReadWrite,
        kind: ValueKind::Float,
        default: Value::Float(10.0),
        bounds: Some(Bounds {
            min: 5.0,
            max: 40.0,
            step: 1.0,
        }),
        valid: Some(50..=400),
        project: |snap, _| {
            let t = require(snap.settings.desired_room_temperature, "desiredRoomTemperature")?;
            Ok(Value::Float(mapping::tenths_to_degrees(t)))
        },
        translate: Some(set_room_target),
    },
    Attribute {
        key: AttributeKey::RoomHumidity,
        service: Service::VentilationThermostat,
        name: "room.humidity",
        direction: Direction::Read,
        kind: ValueKind::Float,
        default: Value::Float(0.0),
        bounds: Some(Bounds {
            min: 0.0,
            max: 100.0,
            step: 1.0,
        }),
        valid: None,
        project: |snap, _| Ok(Value::Float(mapping::humidity_percent(snap.readings.actual_humidity))),
        translate: None,
    },
    Attribute {
        key: AttributeKey::VentilationTargetState,
        service: Service::VentilationThermostat,
        name: "ventilation.target-state",
        direction: Direction::ReadWrite,
        kind: ValueKind::TargetState,
        default: Value::TargetState(TargetHeatingCoolingState::Off),
        bounds: None,
        valid: None,
        project: |snap, _| {
            let s = &snap.settings;
            let mode = require(s.ventilation_mode, "ventilationMode")?;
            let paused = require(s.ventilation_on_pause, "ventilationOnPause")?;
            Ok(Value::TargetState(mapping::ventilation_target(mode, paused)))
        },
        translate: Some(set_ventilation_target),
    },
    Attribute {
        key: AttributeKey::VentilationCurrentState,
        service: Service::VentilationThermostat,
        name: "ventilation.current-state",
        direction: Direction::Read,
        kind: ValueKind::CurrentState,
        default: Value::CurrentState(CurrentHeatingCoolingState::Off),
        bounds: None,
        valid: None,
        project: |snap, _| {
            let s = &snap.settings;
            let mode = require(s.ventilation_mode, "ventilationMode")?;
            let paused = require(s.ventilation_on_pause, "ventilationOnPause")?;
            Ok(Value::CurrentState(mapping::ventilation_current(mode, paused)))
        },
        translate: None,
    },
    Attribute {
        key: AttributeKey::OutdoorTemperature,
        service: Service::OutdoorTemperature,
        name: "outdoor.temperature",
        direction: Direction::Read,
        kind: ValueKind::Float,
        default: Value::Float(0.0),
        bounds: Some(Bounds {
            min: -40.0,
            max: 160.0,
            step: 0.1,
        }),
        valid: None,
        project: |snap, _| Ok(Value::Float(mapping::tenths_to_degrees(snap.readings.outdoor_temperature))),
        translate: None,
    },
    Attribute {
        key: AttributeKey::FanActive,
        service: Service::Fan,
        name: "fan.active",
        direction: Direction::Read,
        kind: ValueKind::Active,
        default: Value::Active(Active::Inactive),
        bounds: None,
        valid: None,
        project: |snap, _| {
            let paused = require(snap.settings.ventilation_on_pause, "ventilationOnPause")?;
            Ok(Value::Active(if paused { Active::Inactive } else { Active::Active }))
        },
        translate: None,
    },
    Attribute {
        key: AttributeKey::FanRotationSpeed,
        service: Service::Fan,
        name: "fan.rotation-speed",
        direction: Direction::ReadWrite,
        kind: ValueKind::Float,
        default: Value::Float(25.0),
        bounds: Some(Bounds {
            min: 25.0,
            max: 100.0,
            step: 25.0,
        }),
        // Backstop only: percent_to_fan_speed already clamps into this range.
        valid: Some(101..=104),
        project: |snap, _| {
            let speed = require(snap.settings.fan_speed, "fanSpeed")?;
            mapping::fan_speed_to_percent(speed)
                .map(Value::Float)
                .ok_or(ProjectionError::OutOfRange {
                    field: "fanSpeed",
                    value: speed.0,
                })
        },
        translate: Some(set_fan_speed),
    },
    Attribute {
        key: AttributeKey::HotWaterOn,
        service: Service::HotWaterSwitch,
        name: "hot-water.on",
        direction: Direction::ReadWrite,
        kind: ValueKind::Bool,
        default: Value::Bool(false),
        bounds: None,
        valid: None,
        project: |snap, _| {
            let paused = require(snap.settings.dhw_production_paused, "dhwProductionPaused")?;
            Ok(Value::Bool(!paused))
        },
        translate: Some(switch_hot_water),
    },
    Attribute {
        key: AttributeKey::HotWaterCurrentTemperature,
        service: Service::HotWater,
        name: "hot-water.current-temperature",
        direction: Direction::Read,
        kind: ValueKind::Float,
        default: Value::Float(0.0),
        bounds: CURRENT_TEMPERATURE,
        valid: None,
        project: |snap, _| Ok(Value::Float(mapping::tenths_to_degrees(snap.readings.dhw_tank_top_temperature))),
        translate: None,
    },
    Attribute {
        key: AttributeKey::HotWaterTargetTemperature,
        service: Service::HotWater,
        name: "hot-water.target-temperature",
        direction: Direction::ReadWrite,
        kind: ValueKind::Float,
        default: Value::Float(10.0),
        bounds: Some(Bounds {
            min: 10.0,
            max: 60.0,
            step: 1.0,
        }),
        valid: Some(100..=600),
        project: |snap, _| {
            let t = require(snap.settings.desired_dhw_temperature, "desiredDhwTemperature")?;
            Ok(Value::Float(mapping::tenths_to_degrees(t)))
        },
        translate: Some(set_hot_water_target),
    },
    Attribute {
        key: AttributeKey::HotWaterTargetState,
        service: Service::HotWater,
        name: "hot-water.target-state",
        direction: Direction::Read,
        kind: ValueKind::TargetState,
        default: Value::TargetState(TargetHeatingCoolingState::Heat),
        bounds: None,
        valid: None,
        project: |_, _| Ok(Value::TargetState(TargetHeatingCoolingState::Heat)),
        translate: None,
    },
    Attribute {
        key: AttributeKey::HotWaterCurrentState,
        service: Service::HotWater,
        name: "hot-water.current-state",
        direction: Direction::Read,
        kind: ValueKind::CurrentState,
        default: Value::CurrentState(CurrentHeatingCoolingState::Off),
        bounds: None,
        valid: None,
        project: |snap, _| {
            let paused = require(snap.settings.dhw_production_paused, "dhwProductionPaused")?;
            Ok(Value::CurrentState(mapping::heating_state(!paused)))
        },
        translate: None,
    },
    Attribute {
        key: AttributeKey::SupplyFlowCurrentTemperature,
        service: Service::SupplyFlow,
        name: "supply-flow.current-temperature",
        direction: Direction::Read,
        kind: ValueKind::Float,
        default: Value::Float(0.0),
        bounds: CURRENT_TEMPERATURE,
        valid: None,
        project: |snap, _| Ok(Value::Float(mapping::tenths_to_degrees(snap.readings.supply_flow_temperature))),
        translate: None,
    },
    Attribute {
        key: AttributeKey::SupplyFlowTargetTemperature,
        service: Service::SupplyFlow,
        name: "supply-flow.target-temperature",
        direction: Direction::ReadWrite,
        kind: ValueKind::Float,
        default: Value::Float(10.0),
        bounds: Some(Bounds {
            min: 5.0,
            max: 50.0,
            step: 1.0,
        }),
        valid: Some(50..=500),
        project: |snap, _| {
            let t = require(snap.settings.setpoint_supply_temperature, "setpointSupplyTemperature")?;
            Ok(Value::Float(mapping::tenths_to_degrees(t)))
        },
        translate: Some(set_supply_flow_target),
    },
    Attribute {
        key: AttributeKey::SupplyFlowTargetState,
        service: Service::SupplyFlow,
        name: "supply-flow.target-state",
        direction: Direction::Read,
        kind: ValueKind::TargetState,
        default: Value::TargetState(TargetHeatingCoolingState::Heat),
        bounds: None,
        valid: None,
        project: |_, _| Ok(Value::TargetState(TargetHeatingCoolingState::Heat)),
        translate: None,
    },
    Attribute {
        key: AttributeKey::SupplyFlowCurrentState,
        service: Service::SupplyFlow,
        name: "supply-flow.current-state",
        direction: Direction::Read,
        kind: ValueKind::CurrentState,
        default: Value::CurrentState(CurrentHeatingCoolingState::Off),
        bounds: None,
        valid: None,
        project: |snap, policies| {
            let s = &snap.settings;
            let on = require(s.central_heating_is_on, "centralHeatingIsOn")?;
            let paused = require(s.central_heating_paused, "centralHeatingPaused")?;
            Ok(Value::CurrentState(mapping::heating_state(policies.supply_flow.is_active(on, paused))))
        },
        translate: None,
    },
];

pub fn lookup(key: AttributeKey) -> &'static Attribute {
    // Every key has exactly one row; covered by `every_key_has_a_row`.
    ATTRIBUTES
        .iter()
        .find(|a| a.key == key)
        .unwrap_or_else(|| unreachable!("attribute {:?} missing from table", key))
}

pub fn by_name(name: &str) -> Option<&'static Attribute> {
    ATTRIBUTES.iter().find(|a| a.name == name)
}

fn require<T: Copy>(field: Option<T>, name: &'static str) -> Result<T, ProjectionError> {
    field.ok_or(ProjectionError::MissingField(name))
}

fn checked_tenths(attr: &Attribute, value: Value) -> Result<i32, CommandError> {
    let degrees = value.as_float().ok_or(CommandError::WrongType {
        attribute: attr.name,
        expected: ValueKind::Float,
    })?;
    let tenths = mapping::degrees_to_tenths(degrees).ok_or(CommandError::NotANumber(attr.name))?;
    attr.check(tenths)
}

fn expect_bool(attr: &Attribute, value: Value) -> Result<bool, CommandError> {
    value.as_bool().ok_or(CommandError::WrongType {
        attribute: attr.name,
        expected: ValueKind::Bool,
    })
}

fn switch_central_heating(attr: &Attribute, value: Value) -> Result<Settings, CommandError> {
    let on = expect_bool(attr, value)?;
    Ok(Settings {
        central_heating_paused: Some(!on),
        central_heating_pause_duration: (!on).then_some(DEFAULT_PAUSE_MINUTES),
        ..Settings::default()
    })
}

fn switch_hot_water(attr: &Attribute, value: Value) -> Result<Settings, CommandError> {
    let on = expect_bool(attr, value)?;
    Ok(Settings {
        dhw_production_paused: Some(!on),
        dhw_production_pause_duration: (!on).then_some(DEFAULT_PAUSE_MINUTES),
        ..Settings::default()
    })
}

fn set_room_target(attr: &Attribute, value: Value) -> Result<Settings, CommandError> {
    Ok(Settings {
        desired_room_temperature: Some(checked_tenths(attr, value)?),
        ..Settings::default()
    })
}

fn set_hot_water_target(attr: &Attribute, value: Value) -> Result<Settings, CommandError> {
    Ok(Settings {
        desired_dhw_temperature: Some(checked_tenths(attr, value)?),
        ..Settings::default()
    })
}

fn set_supply_flow_target(attr: &Attribute, value: Value) -> Result<Settings, CommandError> {
    Ok(Settings {
        setpoint_supply_temperature: Some(checked_tenths(attr, value)?),
        ..Settings::default()
    })
}

fn set_fan_speed(attr: &Attribute, value: Value) -> Result<Settings, CommandError> {
    let percent = value.as_float().ok_or(CommandError::WrongType {
        attribute: attr.name,
        expected: ValueKind::Float,
    })?;
    let speed = mapping::percent_to_fan_speed(percent).ok_or(CommandError::NotANumber(attr.name))?;
    attr.check(speed.0)?;
    Ok(Settings {
        fan_speed: Some(speed),
        ..Settings::default()
    })
}

fn set_ventilation_target(attr: &Attribute, value: Value) -> Result<Settings, CommandError> {
    let target = value.as_target_state().ok_or(CommandError::WrongType {
        attribute: attr.name,
        expected: ValueKind::TargetState,
    })?;
    Ok(match mapping::ventilation_mode_for(target) {
        None => Settings {
            ventilation_on_pause: Some(true),
            ..Settings::default()
        },
        Some(mode) => Settings {
            ventilation_mode: Some(mode),
            ventilation_on_pause: Some(false),
            ..Settings::default()
        },
    })
}

// =====================
// Profiles
// =====================

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Profile {
    #[default]
    Cts700,
    Ventilation,
    Heating,
    HotWater,
    Climate,
    Sensors,
}

impl Profile {
    pub fn services(self) -> &'static [Service] {
        match self {
            Profile::Cts700 => &[
                Service::CentralHeatingSwitch,
                Service::VentilationThermostat,
                Service::OutdoorTemperature,
                Service::Fan,
                Service::HotWaterSwitch,
                Service::HotWater,
                Service::SupplyFlow,
            ],
            Profile::Ventilation => &[Service::VentilationThermostat, Service::Fan, Service::OutdoorTemperature],
            Profile::Heating => &[
                Service::CentralHeatingSwitch,
                Service::SupplyFlow,
                Service::OutdoorTemperature,
            ],
            Profile::HotWater => &[Service::HotWaterSwitch, Service::HotWater],
            Profile::Climate => &[
                Service::VentilationThermostat,
                Service::CentralHeatingSwitch,
                Service::OutdoorTemperature,
            ],
            Profile::Sensors => &[Service::OutdoorTemperature, Service::VentilationThermostat],
        }
    }

    /// Read-only profiles expose readings but accept no client writes.
    pub fn read_only(self) -> bool {
        matches!(self, Profile::Sensors)
    }

    /// Sensors keeps only the characteristics projected from readings.
    pub fn includes(self, attr: &Attribute) -> bool {
        match self {
            Profile::Sensors => matches!(
                attr.key,
                AttributeKey::RoomCurrentTemperature | AttributeKey::RoomHumidity | AttributeKey::OutdoorTemperature
            ),
            _ => self.services().contains(&attr.service),
        }
    }

    pub fn attributes(self) -> impl Iterator<Item = &'static Attribute> {
        ATTRIBUTES.iter().filter(move |a| self.includes(a))
    }

    pub fn accepts_writes(self, attr: &Attribute) -> bool {
        !self.read_only() && attr.is_writable() && self.includes(attr)
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cts700" => Ok(Profile::Cts700),
            "ventilation" => Ok(Profile::Ventilation),
            "heating" => Ok(Profile::Heating),
            "hot-water" => Ok(Profile::HotWater),
            "climate" => Ok(Profile::Climate),
            "sensors" => Ok(Profile::Sensors),
            other => Err(format!(
                "unknown accessory profile `{}` (expected cts700, ventilation, heating, hot-water, climate or sensors)",
                other
            )),
        }
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            Profile::Cts700 => "cts700",
            Profile::Ventilation => "ventilation",
            Profile::Heating => "heating",
            Profile::HotWater => "hot-water",
            Profile::Climate => "climate",
            Profile::Sensors => "sensors",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::device::{FanSpeed, Readings, VentilationMode};

    fn snapshot() -> Snapshot {
        Snapshot {
            readings: Readings {
                outdoor_temperature: -35,
                room_temperature: 214,
                supply_flow_temperature: 338,
                dhw_tank_top_temperature: 472,
                actual_humidity: 41,
            },
            settings: Settings {
                central_heating_is_on: Some(true),
                central_heating_paused: Some(false),
                desired_room_temperature: Some(215),
                ventilation_mode: Some(VentilationMode::Cooling),
                ventilation_on_pause: Some(false),
                fan_speed: Some(FanSpeed::HIGH),
                dhw_production_paused: Some(true),
                desired_dhw_temperature: Some(480),
                setpoint_supply_temperature: Some(350),
                ..Settings::default()
            },
        }
    }

    fn project(key: AttributeKey, snap: &Snapshot, policies: &Policies) -> Result<Value, ProjectionError> {
        (lookup(key).project)(snap, policies)
    }

    fn translate(key: AttributeKey, value: Value) -> Result<Settings, CommandError> {
        let attr = lookup(key);
        (attr.translate.expect("writable"))(attr, value)
    }

    #[test]
    fn every_key_has_a_row() {
        let mut names = std::collections::BTreeSet::new();
        let mut keys = std::collections::BTreeSet::new();
        for attr in ATTRIBUTES {
            assert!(names.insert(attr.name), "duplicate name {}", attr.name);
            assert!(keys.insert(attr.key), "duplicate key {:?}", attr.key);
            assert_eq!(attr.default.kind(), attr.kind, "{}", attr.name);
            assert_eq!(attr.is_writable(), attr.direction == Direction::ReadWrite, "{}", attr.name);
        }
        assert_eq!(keys.len(), 18);
        assert_eq!(lookup(AttributeKey::FanActive).name, "fan.active");
        assert_eq!(by_name("hot-water.on").map(|a| a.key), Some(AttributeKey::HotWaterOn));
    }

    #[test]
    fn declared_bounds_contain_write_ranges() {
        for attr in ATTRIBUTES.iter().filter(|a| a.kind == ValueKind::Float && a.valid.is_some()) {
            let bounds = attr.bounds.expect("numeric writable attribute has bounds");
            let valid = attr.valid.clone().expect("checked above");
            if attr.key == AttributeKey::FanRotationSpeed {
                continue;
            }
            assert_eq!(mapping::tenths_to_degrees(*valid.start()), bounds.min, "{}", attr.name);
            assert_eq!(mapping::tenths_to_degrees(*valid.end()), bounds.max, "{}", attr.name);
        }
    }

    #[test]
    fn projects_snapshot() {
        let snap = snapshot();
        let p = Policies::default();
        assert_eq!(project(AttributeKey::CentralHeatingOn, &snap, &p), Ok(Value::Bool(true)));
        assert_eq!(project(AttributeKey::RoomCurrentTemperature, &snap, &p), Ok(Value::Float(21.4)));
        assert_eq!(project(AttributeKey::RoomTargetTemperature, &snap, &p), Ok(Value::Float(21.5)));
        assert_eq!(project(AttributeKey::RoomHumidity, &snap, &p), Ok(Value::Float(41.0)));
        assert_eq!(project(AttributeKey::OutdoorTemperature, &snap, &p), Ok(Value::Float(-3.5)));
        assert_eq!(
            project(AttributeKey::VentilationTargetState, &snap, &p),
            Ok(Value::TargetState(TargetHeatingCoolingState::Cool))
        );
        assert_eq!(project(AttributeKey::FanActive, &snap, &p), Ok(Value::Active(Active::Active)));
        assert_eq!(project(AttributeKey::FanRotationSpeed, &snap, &p), Ok(Value::Float(75.0)));
        assert_eq!(project(AttributeKey::HotWaterOn, &snap, &p), Ok(Value::Bool(false)));
        assert_eq!(
            project(AttributeKey::HotWaterCurrentState, &snap, &p),
            Ok(Value::CurrentState(CurrentHeatingCoolingState::Off))
        );
        assert_eq!(
            project(AttributeKey::SupplyFlowCurrentState, &snap, &p),
            Ok(Value::CurrentState(CurrentHeatingCoolingState::Heat))
        );
    }

    #[test]
    fn supply_flow_state_follows_its_own_policy() {
        let snap = snapshot();
        let p = Policies {
            supply_flow: HeatingActivePolicy::Inverted,
            ..Policies::default()
        };
        assert_eq!(project(AttributeKey::CentralHeatingOn, &snap, &p), Ok(Value::Bool(true)));
        assert_eq!(
            project(AttributeKey::SupplyFlowCurrentState, &snap, &p),
            Ok(Value::CurrentState(CurrentHeatingCoolingState::Off))
        );
    }

    #[test]
    fn missing_setting_is_reported_by_name() {
        let mut snap = snapshot();
        snap.settings.fan_speed = None;
        assert_eq!(
            project(AttributeKey::FanRotationSpeed, &snap, &Policies::default()),
            Err(ProjectionError::MissingField("fanSpeed"))
        );
        snap.settings.fan_speed = Some(FanSpeed(105));
        assert_eq!(
            project(AttributeKey::FanRotationSpeed, &snap, &Policies::default()),
            Err(ProjectionError::OutOfRange {
                field: "fanSpeed",
                value: 105
            })
        );
    }

    #[test]
    fn room_target_rounds_and_validates() {
        let patch = translate(AttributeKey::RoomTargetTemperature, Value::Float(39.95)).expect("accepted");
        assert_eq!(patch.desired_room_temperature, Some(400));
        assert_eq!(patch.present_fields(), vec!["desiredRoomTemperature"]);

        let err = translate(AttributeKey::RoomTargetTemperature, Value::Float(45.0)).unwrap_err();
        assert_eq!(
            err,
            CommandError::OutOfRange {
                attribute: "room.target-temperature",
                value: 450,
                range: 50..=400
            }
        );
    }

    #[test]
    fn hot_water_target_range() {
        assert!(matches!(
            translate(AttributeKey::HotWaterTargetTemperature, Value::Float(5.0)),
            Err(CommandError::OutOfRange { value: 50, .. })
        ));
        let patch = translate(AttributeKey::HotWaterTargetTemperature, Value::Float(60.0)).expect("accepted");
        assert_eq!(patch.desired_dhw_temperature, Some(600));
    }

    #[test]
    fn supply_flow_target_range() {
        assert_eq!(
            translate(AttributeKey::SupplyFlowTargetTemperature, Value::Float(50.0))
                .expect("accepted")
                .setpoint_supply_temperature,
            Some(500)
        );
        assert!(translate(AttributeKey::SupplyFlowTargetTemperature, Value::Float(50.1)).is_err());
        assert_eq!(
            translate(AttributeKey::SupplyFlowTargetTemperature, Value::Float(f64::NAN)),
            Err(CommandError::NotANumber("supply-flow.target-temperature"))
        );
    }

    #[test]
    fn switching_off_adds_pause_duration() {
        let off = translate(AttributeKey::CentralHeatingOn, Value::Bool(false)).expect("accepted");
        assert_eq!(off.central_heating_paused, Some(true));
        assert_eq!(off.central_heating_pause_duration, Some(180));

        let on = translate(AttributeKey::CentralHeatingOn, Value::Bool(true)).expect("accepted");
        assert_eq!(on.present_fields(), vec!["centralHeatingPaused"]);
        assert_eq!(on.central_heating_paused, Some(false));

        let dhw_off = translate(AttributeKey::HotWaterOn, Value::Bool(false)).expect("accepted");
        assert_eq!(dhw_off.present_fields(), vec!["dhwProductionPaused", "dhwProductionPauseDuration"]);
    }

    #[test]
    fn ventilation_target_patches() {
        let off = translate(
            AttributeKey::VentilationTargetState,
            Value::TargetState(TargetHeatingCoolingState::Off),
        )
        .expect("accepted");
        assert_eq!(off.present_fields(), vec!["ventilationOnPause"]);
        assert_eq!(off.ventilation_on_pause, Some(true));

        let auto = translate(
            AttributeKey::VentilationTargetState,
            Value::TargetState(TargetHeatingCoolingState::Auto),
        )
        .expect("accepted");
        assert_eq!(auto.ventilation_mode, Some(VentilationMode::Auto));
        assert_eq!(auto.ventilation_on_pause, Some(false));
    }

    #[test]
    fn fan_speed_patch() {
        let patch = translate(AttributeKey::FanRotationSpeed, Value::Float(50.0)).expect("accepted");
        assert_eq!(patch.fan_speed, Some(FanSpeed::NORMAL));
        // percentages below the first step clamp to the lowest level
        let patch = translate(AttributeKey::FanRotationSpeed, Value::Float(0.0)).expect("accepted");
        assert_eq!(patch.fan_speed, Some(FanSpeed::LOW));
        assert!(matches!(
            lookup(AttributeKey::FanRotationSpeed).check(100),
            Err(CommandError::OutOfRange { value: 100, .. })
        ));
        assert!(matches!(
            translate(AttributeKey::FanRotationSpeed, Value::Bool(true)),
            Err(CommandError::WrongType { .. })
        ));
    }

    #[test]
    fn profiles_select_services() {
        assert_eq!(Profile::Cts700.attributes().count(), ATTRIBUTES.len());
        assert!(Profile::HotWater.attributes().all(|a| matches!(a.service, Service::HotWater | Service::HotWaterSwitch)));
        let room_target = lookup(AttributeKey::RoomTargetTemperature);
        assert!(Profile::Climate.accepts_writes(room_target));
        assert!(!Profile::Sensors.accepts_writes(room_target));
        let sensors: Vec<_> = Profile::Sensors.attributes().map(|a| a.key).collect();
        assert_eq!(
            sensors,
            vec![
                AttributeKey::RoomCurrentTemperature,
                AttributeKey::RoomHumidity,
                AttributeKey::OutdoorTemperature
            ]
        );
        assert!(!Profile::HotWater.accepts_writes(room_target));
        assert_eq!("hot-water".parse::<Profile>(), Ok(Profile::HotWater));
        assert!("cts602".parse::<Profile>().is_err());
    }
}
