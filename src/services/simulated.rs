//! In-memory stand-in for the controller, used when no gateway URL is configured.
//!
//! Settings patches are applied field by field, pauses lift by themselves once their
//! duration has elapsed, and sensor readings wander a little on every fetch.

use crate::gateway::{Gateway, GatewayError};
use crate::models::device::{FanSpeed, Readings, Settings, VentilationMode};
use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
struct Device {
    readings: Readings,
    settings: Settings,
    central_heating_resume_at: Option<DateTime<Utc>>,
    dhw_resume_at: Option<DateTime<Utc>>,
}

pub struct SimulatedGateway {
    device: Mutex<Device>,
    rng: Mutex<SmallRng>,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_os_rng())
    }

    #[cfg(test)]
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        SimulatedGateway {
            device: Mutex::new(Device {
                readings: Readings {
                    outdoor_temperature: 65,
                    room_temperature: 208,
                    supply_flow_temperature: 320,
                    dhw_tank_top_temperature: 455,
                    actual_humidity: 42,
                },
                settings: Settings {
                    central_heating_is_on: Some(true),
                    central_heating_paused: Some(false),
                    central_heating_pause_duration: Some(0),
                    desired_room_temperature: Some(215),
                    ventilation_mode: Some(VentilationMode::Auto),
                    ventilation_on_pause: Some(false),
                    fan_speed: Some(FanSpeed::NORMAL),
                    dhw_production_paused: Some(false),
                    dhw_production_pause_duration: Some(0),
                    desired_dhw_temperature: Some(480),
                    setpoint_supply_temperature: Some(350),
                },
                central_heating_resume_at: None,
                dhw_resume_at: None,
            }),
            rng: Mutex::new(rng),
        }
    }

    fn device(&self) -> std::sync::MutexGuard<'_, Device> {
        self.device.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_at(&self, patch: &Settings, now: DateTime<Utc>) {
        let mut dev = self.device();
        dev.settings.merge(patch);
        if patch.central_heating_paused.is_some() {
            dev.central_heating_resume_at = resume_at(now, patch.central_heating_paused, patch.central_heating_pause_duration);
        }
        if patch.dhw_production_paused.is_some() {
            dev.dhw_resume_at = resume_at(now, patch.dhw_production_paused, patch.dhw_production_pause_duration);
        }
    }

    fn settings_at(&self, now: DateTime<Utc>) -> Settings {
        let mut dev = self.device();
        if dev.central_heating_resume_at.is_some_and(|t| now >= t) {
            info!("Simulated central heating pause elapsed; resuming");
            dev.central_heating_resume_at = None;
            dev.settings.central_heating_paused = Some(false);
        }
        if dev.dhw_resume_at.is_some_and(|t| now >= t) {
            info!("Simulated hot water pause elapsed; resuming");
            dev.dhw_resume_at = None;
            dev.settings.dhw_production_paused = Some(false);
        }
        dev.settings.clone()
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new()
    }
}

fn resume_at(now: DateTime<Utc>, paused: Option<bool>, minutes: Option<i32>) -> Option<DateTime<Utc>> {
    match (paused, minutes) {
        (Some(true), Some(m)) if m > 0 => Some(now + Duration::minutes(i64::from(m))),
        _ => None,
    }
}

/// Move `current` one tenth toward `target`, plus noise.
fn drift(current: i32, target: i32, rng: &mut SmallRng) -> i32 {
    let pull = (target - current).signum();
    current + pull + rng.random_range(-1..=1)
}

impl Gateway for SimulatedGateway {
    fn fetch_readings(&self) -> Result<Readings, GatewayError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut dev = self.device();
        let room_target = dev.settings.desired_room_temperature.unwrap_or(215);
        let dhw_target = if dev.settings.dhw_production_paused == Some(true) {
            200
        } else {
            dev.settings.desired_dhw_temperature.unwrap_or(480)
        };
        let flow_target = if dev.settings.central_heating_paused == Some(true) {
            dev.readings.room_temperature
        } else {
            dev.settings.setpoint_supply_temperature.unwrap_or(350)
        };

        let r = &mut dev.readings;
        r.room_temperature = drift(r.room_temperature, room_target, &mut rng);
        r.dhw_tank_top_temperature = drift(r.dhw_tank_top_temperature, dhw_target, &mut rng);
        r.supply_flow_temperature = drift(r.supply_flow_temperature, flow_target, &mut rng);
        r.outdoor_temperature = (r.outdoor_temperature + rng.random_range(-2..=2)).clamp(-300, 400);
        r.actual_humidity = (r.actual_humidity + rng.random_range(-1..=1)).clamp(20, 80);
        debug!("Simulated readings: {:?}", r);
        Ok(r.clone())
    }

    fn fetch_settings(&self) -> Result<Settings, GatewayError> {
        Ok(self.settings_at(Utc::now()))
    }

    fn send_settings(&self, patch: &Settings) -> Result<(), GatewayError> {
        self.apply_at(patch, Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn patch_changes_only_named_fields() {
        let gw = SimulatedGateway::seeded(1);
        let before = gw.fetch_settings().expect("fetch");
        gw.send_settings(&Settings {
            fan_speed: Some(FanSpeed::VERY_HIGH),
            ..Settings::default()
        })
        .expect("send");
        let after = gw.fetch_settings().expect("fetch");
        assert_eq!(after.fan_speed, Some(FanSpeed::VERY_HIGH));
        assert_eq!(after.desired_room_temperature, before.desired_room_temperature);
        assert_eq!(after.ventilation_mode, before.ventilation_mode);
    }

    #[test]
    fn pause_lifts_after_its_duration() {
        let gw = SimulatedGateway::seeded(2);
        let t0 = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        gw.apply_at(
            &Settings {
                central_heating_paused: Some(true),
                central_heating_pause_duration: Some(180),
                ..Settings::default()
            },
            t0,
        );
        assert_eq!(gw.settings_at(t0 + Duration::minutes(179)).central_heating_paused, Some(true));
        assert_eq!(gw.settings_at(t0 + Duration::minutes(180)).central_heating_paused, Some(false));
    }

    #[test]
    fn resuming_clears_pending_pause() {
        let gw = SimulatedGateway::seeded(3);
        let t0 = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        gw.apply_at(
            &Settings {
                dhw_production_paused: Some(true),
                dhw_production_pause_duration: Some(30),
                ..Settings::default()
            },
            t0,
        );
        gw.apply_at(
            &Settings {
                dhw_production_paused: Some(false),
                ..Settings::default()
            },
            t0 + Duration::minutes(5),
        );
        assert_eq!(gw.device().dhw_resume_at, None);
        assert_eq!(gw.settings_at(t0 + Duration::minutes(10)).dhw_production_paused, Some(false));
    }

    #[test]
    fn readings_drift_toward_targets() {
        let gw = SimulatedGateway::seeded(4);
        gw.send_settings(&Settings {
            desired_room_temperature: Some(300),
            ..Settings::default()
        })
        .expect("send");
        let start = gw.fetch_readings().expect("fetch").room_temperature;
        let mut last = start;
        for _ in 0..200 {
            last = gw.fetch_readings().expect("fetch").room_temperature;
        }
        assert!(last > start, "room temperature should rise toward the target: {} -> {}", start, last);
        let humidity = gw.fetch_readings().expect("fetch").actual_humidity;
        assert!((20..=80).contains(&humidity));
    }
}
