use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::alarm::model::{AddOutcome, AlarmBook, TimeOfDay};
use crate::alarm::resolver::{FallbackSchedule, FallbackSlot, deserialize_time_of_day};
use crate::alarm::scheduler::FallbackMode;
use crate::telemetry::LoggingConfig;
use crate::ui::render::TimeDisplayMode;
use crate::zone::City;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub city: City,
    pub alarms: Vec<AlarmSeed>,
    pub fallback: FallbackSchedule,
    pub fallback_mode: FallbackMode,
    pub display_mode: TimeDisplayMode,
    pub logging: LoggingConfig,
    pub tick_interval: Duration,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
pub struct AlarmSeed {
    #[serde(deserialize_with = "deserialize_time_of_day")]
    pub time: TimeOfDay,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            city: City::default(),
            alarms: Vec::new(),
            fallback: FallbackSchedule::default(),
            fallback_mode: FallbackMode::default(),
            display_mode: TimeDisplayMode::default(),
            logging: LoggingConfig::default(),
            tick_interval: Duration::from_millis(default_tick_interval_ms()),
        }
    }
}

impl AppConfig {
    pub fn build_book(&self) -> AlarmBook {
        let mut book = AlarmBook::new();
        for seed in &self.alarms {
            if let AddOutcome::Created(id) = book.add_time(seed.time)
                && !seed.enabled
            {
                book.toggle(id, false);
            }
        }
        book
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file {}", path.display()))?;
    parse_config_text(&content)
}

pub fn parse_config_text(content: &str) -> Result<AppConfig> {
    let raw = serde_json::from_str::<AppConfigFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow::anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    if raw.version != 1 {
        bail!(
            "unsupported config version {}; expected version 1",
            raw.version
        );
    }

    let city = match raw.city.as_deref() {
        Some(name) => City::from_name(name).with_context(|| {
            let known = City::ALL
                .iter()
                .map(|city| city.display_name())
                .collect::<Vec<_>>()
                .join(", ");
            format!("unknown city '{name}'; expected one of {known}")
        })?,
        None => City::default(),
    };

    if raw.tick_interval_ms == 0 {
        bail!("tick_interval_ms must be > 0");
    }

    let fallback = match raw.fallback.times {
        Some(slots) => FallbackSchedule { slots },
        None => FallbackSchedule::default(),
    };
    let fallback_mode = if raw.fallback.enabled {
        FallbackMode::On
    } else {
        FallbackMode::Off
    };

    Ok(AppConfig {
        city,
        alarms: raw.alarms,
        fallback,
        fallback_mode,
        display_mode: raw.display.hour_mode,
        logging: raw.logging,
        tick_interval: Duration::from_millis(raw.tick_interval_ms),
    })
}

#[derive(Debug, Deserialize)]
struct AppConfigFile {
    version: u32,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    alarms: Vec<AlarmSeed>,
    #[serde(default)]
    fallback: FallbackFile,
    #[serde(default)]
    display: DisplayFile,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default = "default_tick_interval_ms")]
    tick_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
struct FallbackFile {
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    times: Option<Vec<FallbackSlot>>,
}

impl Default for FallbackFile {
    fn default() -> Self {
        Self {
            enabled: true,
            times: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct DisplayFile {
    #[serde(default)]
    hour_mode: TimeDisplayMode,
}

fn default_enabled() -> bool {
    true
}

fn default_tick_interval_ms() -> u64 {
    1_000
}
