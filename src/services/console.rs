//! Line-oriented stand-in for the accessory shell.
//!
//! ```text
//! show                              all characteristics and their values
//! get room.target-temperature       one characteristic
//! set room.target-temperature 21.5  deliver a client write
//! help                              list characteristic names
//! ```

use crate::attributes::{self, Direction};
use crate::models::accessory::Value;
use crate::state::AccessoryState;
use std::io::{self, BufRead, Write};

pub fn run<R: BufRead, W: Write>(state: &AccessoryState, input: R, mut out: W) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (None, _, _) => continue,
            (Some("show"), None, _) => show(state, &mut out)?,
            (Some("help"), None, _) => help(state, &mut out)?,
            (Some("get"), Some(name), None) => match lookup(state, name) {
                Ok(attr) => {
                    let value = state.value(attr.key).map(|v| v.to_string()).unwrap_or_default();
                    writeln!(out, "{} = {}", attr.name, value)?;
                }
                Err(e) => writeln!(out, "error: {}", e)?,
            },
            (Some("set"), Some(name), Some(raw)) if parts.next().is_none() => {
                let result = lookup(state, name).and_then(|attr| {
                    let value = Value::parse(attr.kind, raw)?;
                    state.remote_update(attr.key, value).map_err(|e| e.to_string())
                });
                match result {
                    Ok(()) => writeln!(out, "ok")?,
                    Err(e) => writeln!(out, "error: {}", e)?,
                }
            }
            _ => writeln!(out, "error: unrecognised command `{}` (try `help`)", line.trim())?,
        }
        out.flush()?;
    }
    Ok(())
}

fn lookup(state: &AccessoryState, name: &str) -> Result<&'static attributes::Attribute, String> {
    attributes::by_name(name)
        .filter(|attr| state.value(attr.key).is_some())
        .ok_or_else(|| format!("no characteristic named `{}` on this accessory", name))
}

fn show<W: Write>(state: &AccessoryState, out: &mut W) -> io::Result<()> {
    let synced = state
        .last_sync()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    writeln!(out, "{} ({}), last sync: {}", state.name(), state.profile(), synced)?;
    for attr in state.attributes() {
        let value = state.value(attr.key).map(|v| v.to_string()).unwrap_or_default();
        writeln!(out, "  {:<34} {}", attr.name, value)?;
    }
    Ok(())
}

fn help<W: Write>(state: &AccessoryState, out: &mut W) -> io::Result<()> {
    writeln!(out, "commands: show | get <name> | set <name> <value> | help")?;
    for attr in state.attributes() {
        let access = if attr.direction == Direction::ReadWrite && state.profile().accepts_writes(attr) {
            "rw"
        } else {
            "r "
        };
        let range = attr
            .bounds
            .map(|b| format!(" [{}..{} step {}]", b.min, b.max, b.step))
            .unwrap_or_default();
        writeln!(out, "  {} {:<34} {}{}", access, attr.name, attr.service.display_name(), range)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{AttributeKey, Profile};
    use crate::gateway::testing::RecordingGateway;
    use crate::services::commands;
    use std::sync::Arc;

    fn run_script(state: &AccessoryState, script: &str) -> String {
        let mut out = Vec::new();
        run(state, script.as_bytes(), &mut out).expect("console run");
        String::from_utf8(out).expect("utf8")
    }

    #[test]
    fn set_delivers_remote_update() {
        let gw = Arc::new(RecordingGateway::from_fixtures());
        let state = AccessoryState::new("Nilan", Profile::Cts700);
        commands::register_all(&state, gw.clone());

        let out = run_script(&state, "set fan.rotation-speed 75\nget fan.rotation-speed\n");
        assert_eq!(out, "ok\nfan.rotation-speed = 75.0\n");
        assert_eq!(gw.sent().len(), 1);
        assert_eq!(gw.sent()[0].fan_speed.map(|s| s.0), Some(103));
    }

    #[test]
    fn reports_bad_input() {
        let state = AccessoryState::new("Nilan", Profile::HotWater);
        let out = run_script(
            &state,
            "set hot-water.on maybe\nset fan.active 1\nget room.humidity\nreboot\n\n",
        );
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("error: expected on/off"));
        assert!(lines[1].contains("no characteristic named `fan.active`"));
        assert!(lines[2].contains("no characteristic named `room.humidity`"));
        assert!(lines[3].contains("unrecognised command `reboot`"));
    }

    #[test]
    fn show_lists_profile_attributes() {
        let state = AccessoryState::new("Loft", Profile::HotWater);
        state.set_value(AttributeKey::HotWaterCurrentTemperature, Value::Float(47.2));
        let out = run_script(&state, "show\n");
        assert!(out.starts_with("Loft (hot-water), last sync: never\n"));
        assert!(out.contains("hot-water.current-temperature"));
        assert!(out.contains("47.2"));
        assert!(!out.contains("room."));

        let help = run_script(&state, "help\n");
        assert!(help.contains("rw hot-water.on"));
        assert!(help.contains("r  hot-water.current-state"));
    }
}
