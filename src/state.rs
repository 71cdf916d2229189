//! Accessory-visible state: one slot per characteristic of the active profile.
//!
//! Each slot has its own lock, so the poll loop and command handlers touching different
//! characteristics never contend. The store also plays the accessory shell's part of
//! remote-update delivery: a client write lands in the slot, then the registered handler
//! for that characteristic runs.

use crate::attributes::{Attribute, AttributeKey, Profile};
use crate::models::accessory::{Value, ValueKind};
use chrono::{DateTime, Utc};
use core::fmt;
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

pub type RemoteUpdateHandler = Arc<dyn Fn(Value) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum ShellError {
    NotExposed(AttributeKey),
    ReadOnly(&'static str),
    WrongType { attribute: &'static str, expected: ValueKind },
}

impl Display for ShellError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::NotExposed(key) => write!(f, "{:?} is not exposed by this accessory", key),
            ShellError::ReadOnly(name) => write!(f, "{} is read-only", name),
            ShellError::WrongType { attribute, expected } => write!(f, "{} expects a {:?} value", attribute, expected),
        }
    }
}

impl Error for ShellError {}

struct Slot {
    attribute: &'static Attribute,
    value: Mutex<Value>,
    handler: RwLock<Option<RemoteUpdateHandler>>,
}

impl Slot {
    fn store(&self, value: Value) -> Value {
        let value = match (value, self.attribute.bounds) {
            (Value::Float(v), Some(bounds)) => Value::Float(bounds.clamp(v)),
            (other, _) => other,
        };
        self.show(value);
        value
    }

    fn show(&self, value: Value) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

pub struct AccessoryState {
    name: String,
    profile: Profile,
    slots: BTreeMap<AttributeKey, Slot>,
    last_sync: Mutex<Option<DateTime<Utc>>>,
}

impl AccessoryState {
    /// Fresh state with every characteristic at its conservative default.
    pub fn new(name: impl Into<String>, profile: Profile) -> Self {
        let slots = profile
            .attributes()
            .map(|attribute| {
                (
                    attribute.key,
                    Slot {
                        attribute,
                        value: Mutex::new(attribute.default),
                        handler: RwLock::new(None),
                    },
                )
            })
            .collect();
        AccessoryState {
            name: name.into(),
            profile,
            slots,
            last_sync: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn attributes(&self) -> impl Iterator<Item = &'static Attribute> + '_ {
        self.slots.values().map(|s| s.attribute)
    }

    pub fn value(&self, key: AttributeKey) -> Option<Value> {
        self.slots
            .get(&key)
            .map(|s| *s.value.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Push a value into the read path. Numeric values are clamped to the declared
    /// bounds. Returns `false` if the characteristic is not part of this accessory.
    pub fn set_value(&self, key: AttributeKey, value: Value) -> bool {
        match self.slots.get(&key) {
            Some(slot) => {
                let stored = slot.store(value);
                if stored != value {
                    debug!("{}: clamped {} to {}", slot.attribute.name, value, stored);
                }
                true
            }
            None => false,
        }
    }

    /// Apply one cycle's projected values and stamp the sync time.
    pub fn apply(&self, values: &[(AttributeKey, Value)], at: DateTime<Utc>) {
        for (key, value) in values {
            self.set_value(*key, *value);
        }
        *self.last_sync.lock().unwrap_or_else(PoisonError::into_inner) = Some(at);
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        *self.last_sync.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn on_remote_update(&self, key: AttributeKey, handler: RemoteUpdateHandler) -> Result<(), ShellError> {
        let slot = self.writable_slot(key)?;
        *slot.handler.write().unwrap_or_else(PoisonError::into_inner) = Some(handler);
        Ok(())
    }

    /// A client wrote `value`. The slot shows it exactly as written, even when the handler
    /// rejects it; the next poll settles the slot to the device's value.
    pub fn remote_update(&self, key: AttributeKey, value: Value) -> Result<(), ShellError> {
        let slot = self.writable_slot(key)?;
        if value.kind() != slot.attribute.kind {
            return Err(ShellError::WrongType {
                attribute: slot.attribute.name,
                expected: slot.attribute.kind,
            });
        }
        slot.show(value);
        let handler = slot.handler.read().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(handler) = handler {
            handler(value);
        }
        Ok(())
    }

    fn writable_slot(&self, key: AttributeKey) -> Result<&Slot, ShellError> {
        let slot = self.slots.get(&key).ok_or(ShellError::NotExposed(key))?;
        if !self.profile.accepts_writes(slot.attribute) {
            return Err(ShellError::ReadOnly(slot.attribute.name));
        }
        Ok(slot)
    }
}
