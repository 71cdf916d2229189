//! Accessory-side value types, in the units and enumerations clients see.

use core::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TargetHeatingCoolingState {
    Off,
    Heat,
    Cool,
    Auto,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CurrentHeatingCoolingState {
    Off,
    Heat,
    Cool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Active {
    Inactive,
    Active,
}

/// Shape of the value a characteristic holds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Float,
    TargetState,
    CurrentState,
    Active,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Float(f64),
    TargetState(TargetHeatingCoolingState),
    CurrentState(CurrentHeatingCoolingState),
    Active(Active),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Float(_) => ValueKind::Float,
            Value::TargetState(_) => ValueKind::TargetState,
            Value::CurrentState(_) => ValueKind::CurrentState,
            Value::Active(_) => ValueKind::Active,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_target_state(&self) -> Option<TargetHeatingCoolingState> {
        match self {
            Value::TargetState(s) => Some(*s),
            _ => None,
        }
    }

    /// Parse user input for a characteristic of the given kind.
    pub fn parse(kind: ValueKind, input: &str) -> Result<Value, String> {
        let s = input.trim();
        match kind {
            ValueKind::Bool => match s.to_ascii_lowercase().as_str() {
                "1" | "on" | "true" => Ok(Value::Bool(true)),
                "0" | "off" | "false" => Ok(Value::Bool(false)),
                other => Err(format!("expected on/off, got `{}`", other)),
            },
            ValueKind::Float => s
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("expected a number, got `{}`", s)),
            ValueKind::TargetState => s.parse().map(Value::TargetState),
            ValueKind::CurrentState => s.parse().map(Value::CurrentState),
            ValueKind::Active => match s.to_ascii_lowercase().as_str() {
                "1" | "active" => Ok(Value::Active(Active::Active)),
                "0" | "inactive" => Ok(Value::Active(Active::Inactive)),
                other => Err(format!("expected active/inactive, got `{}`", other)),
            },
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(true) => write!(f, "on"),
            Value::Bool(false) => write!(f, "off"),
            Value::Float(v) => write!(f, "{:.1}", v),
            Value::TargetState(s) => write!(f, "{}", s),
            Value::CurrentState(s) => write!(f, "{}", s),
            Value::Active(Active::Active) => write!(f, "active"),
            Value::Active(Active::Inactive) => write!(f, "inactive"),
        }
    }
}

impl Display for TargetHeatingCoolingState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetHeatingCoolingState::Off => "off",
            TargetHeatingCoolingState::Heat => "heat",
            TargetHeatingCoolingState::Cool => "cool",
            TargetHeatingCoolingState::Auto => "auto",
        };
        f.write_str(s)
    }
}

impl Display for CurrentHeatingCoolingState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            CurrentHeatingCoolingState::Off => "off",
            CurrentHeatingCoolingState::Heat => "heat",
            CurrentHeatingCoolingState::Cool => "cool",
        };
        f.write_str(s)
    }
}

impl FromStr for TargetHeatingCoolingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "off" => Ok(TargetHeatingCoolingState::Off),
            "1" | "heat" => Ok(TargetHeatingCoolingState::Heat),
            "2" | "cool" => Ok(TargetHeatingCoolingState::Cool),
            "3" | "auto" => Ok(TargetHeatingCoolingState::Auto),
            other => Err(format!("expected off/heat/cool/auto, got `{}`", other)),
        }
    }
}

impl FromStr for CurrentHeatingCoolingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "off" => Ok(CurrentHeatingCoolingState::Off),
            "1" | "heat" => Ok(CurrentHeatingCoolingState::Heat),
            "2" | "cool" => Ok(CurrentHeatingCoolingState::Cool),
            other => Err(format!("expected off/heat/cool, got `{}`", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_by_kind() {
        assert_eq!(Value::parse(ValueKind::Bool, "On"), Ok(Value::Bool(true)));
        assert_eq!(Value::parse(ValueKind::Float, " 21.5 "), Ok(Value::Float(21.5)));
        assert_eq!(
            Value::parse(ValueKind::TargetState, "cool"),
            Ok(Value::TargetState(TargetHeatingCoolingState::Cool))
        );
        assert!(Value::parse(ValueKind::Bool, "maybe").is_err());
        assert!(Value::parse(ValueKind::Float, "warm").is_err());
    }

    #[test]
    fn displays_one_decimal() {
        assert_eq!(Value::Float(21.46).to_string(), "21.5");
        assert_eq!(Value::Active(Active::Inactive).to_string(), "inactive");
    }
}
