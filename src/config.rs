//! Runtime configuration from the environment, optionally seeded from a `.env` file.

use crate::attributes::{Policies, Profile};
use crate::mapping::HeatingActivePolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_POLL_SECS: u64 = 5;
pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ACCESSORY_NAME: &str = "Nilan";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the HTTP gateway; `None` runs against the simulated device.
    pub gateway_url: Option<String>,
    pub gateway_timeout: Duration,
    pub poll_interval: Duration,
    pub profile: Profile,
    pub accessory_name: String,
    /// Composite rule for the supply-flow current heating state.
    pub supply_flow_policy: HeatingActivePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let gateway_url = var("GATEWAY_URL");
        let gateway_timeout = Duration::from_secs(parse_secs(
            var("GATEWAY_TIMEOUT_SECS"),
            "GATEWAY_TIMEOUT_SECS",
            DEFAULT_GATEWAY_TIMEOUT_SECS,
        )?);
        let poll_interval = Duration::from_secs(parse_secs(var("POLL_INTERVAL_SECS"), "POLL_INTERVAL_SECS", DEFAULT_POLL_SECS)?);

        let profile = match var("ACCESSORY_PROFILE") {
            Some(s) => s.parse::<Profile>().map_err(|e| format!("ACCESSORY_PROFILE: {}", e))?,
            None => Profile::default(),
        };
        let supply_flow_policy = match var("SUPPLY_FLOW_STATE_POLICY") {
            Some(s) => s
                .parse::<HeatingActivePolicy>()
                .map_err(|e| format!("SUPPLY_FLOW_STATE_POLICY: {}", e))?,
            None => HeatingActivePolicy::Direct,
        };
        let accessory_name = var("ACCESSORY_NAME").unwrap_or_else(|| DEFAULT_ACCESSORY_NAME.to_string());

        Ok(Config {
            gateway_url,
            gateway_timeout,
            poll_interval,
            profile,
            accessory_name,
            supply_flow_policy,
        })
    }

    pub fn policies(&self) -> Policies {
        Policies {
            central_heating: HeatingActivePolicy::Direct,
            supply_flow: self.supply_flow_policy,
        }
    }
}

fn parse_secs(raw: Option<String>, key: &str, default: u64) -> Result<u64, String> {
    match raw {
        None => Ok(default),
        Some(s) => match s.parse::<u64>() {
            Ok(0) => Err(format!("{} must be greater than zero", key)),
            Ok(v) => Ok(v),
            Err(_) => Err(format!("{} must be a whole number of seconds, got `{}`", key, s)),
        },
    }
}

// =====================
// .env loading
// =====================

#[derive(Debug)]
pub struct LoadedEnvFile {
    pub path: PathBuf,
    pub explicit: bool,
}

/// Handle `--env-file <path>` / `--env-file=<path>`, falling back to `./.env` if present.
pub fn load_env_from_args(args: impl IntoIterator<Item = std::ffi::OsString>) -> Result<Option<LoadedEnvFile>, String> {
    let mut args = args.into_iter();
    let mut env_file: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        let path = match arg.to_str() {
            Some("--env-file") => args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| "`--env-file` requires a path argument".to_string())?,
            Some(s) if s.starts_with("--env-file=") => match &s["--env-file=".len()..] {
                "" => return Err("`--env-file` requires a path argument".to_string()),
                p => PathBuf::from(p),
            },
            Some("--") => break,
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        };
        if env_file.replace(path).is_some() {
            return Err("`--env-file` provided more than once".to_string());
        }
    }

    match env_file {
        Some(path) => {
            if !path.is_file() {
                return Err(format!("env file not found: {}", path.display()));
            }
            load_env_file(&path)?;
            Ok(Some(LoadedEnvFile { path, explicit: true }))
        }
        None => {
            let path = std::env::current_dir()
                .map_err(|e| format!("unable to read current directory: {}", e))?
                .join(".env");
            if !path.is_file() {
                return Ok(None);
            }
            load_env_file(&path)?;
            Ok(Some(LoadedEnvFile { path, explicit: false }))
        }
    }
}

fn load_env_file(path: &Path) -> Result<(), String> {
    let content = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;
    for (key, value) in parse_env(&content).map_err(|e| format!("{}:{}", path.display(), e))? {
        // Values already in the process environment win.
        if std::env::var_os(&key).is_none() {
            // Updating process-level environment variables is unsafe on some targets.
            unsafe {
                std::env::set_var(key, value);
            }
        }
    }
    Ok(())
}

/// Parse `KEY=value` lines. Supports `export`, `#` comments, and single or double quotes
/// (double quotes understand `\n`, `\t`, `\"` and `\\`).
pub fn parse_env(content: &str) -> Result<Vec<(String, String)>, String> {
    let mut out = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
        let (key, raw) = line
            .split_once('=')
            .ok_or_else(|| format!("{}: missing '=' in assignment", index + 1))?;
        let key = key.trim();
        if key.is_empty() || key.chars().any(char::is_whitespace) {
            return Err(format!("{}: invalid variable name `{}`", index + 1, key));
        }
        let value = parse_value(raw.trim()).map_err(|e| format!("{}: {}", index + 1, e))?;
        out.push((key.to_string(), value));
    }
    Ok(out)
}

fn parse_value(raw: &str) -> Result<String, String> {
    let Some(quote) = raw.chars().next().filter(|c| *c == '"' || *c == '\'') else {
        return Ok(raw.split('#').next().unwrap_or_default().trim_end().to_string());
    };

    let mut value = String::new();
    let mut chars = raw[1..].chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if quote == '"' => match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some(other) => value.push(other),
                None => return Err("unterminated escape sequence".to_string()),
            },
            c if c == quote => {
                let rest = chars.as_str().trim();
                return if rest.is_empty() || rest.starts_with('#') {
                    Ok(value)
                } else {
                    Err("unexpected characters after closing quote".to_string())
                };
            }
            c => value.push(c),
        }
    }
    Err("unterminated quoted value".to_string())
}
