mod alarm;
mod config;
mod diagnostics;
mod sound;
mod telemetry;
mod ticker;
mod time_provider;
mod ui;
mod zone;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use clap::Parser;
use tracing::info;

use crate::alarm::model::TimeOfDay;
use crate::alarm::scheduler::FallbackMode;
use crate::config::{AlarmSeed, AppConfig, load_config};
use crate::sound::{AlarmSound, BeepAlarm, SilentSound};
use crate::telemetry::{LogFormat, init_logging};
use crate::time_provider::{FixedTimeProvider, SystemTimeProvider, TimeProvider};
use crate::ui::render::TimeDisplayMode;
use crate::zone::{City, local_to_instant};

#[derive(Parser, Debug)]
#[command(
    name = "adzanclock",
    version,
    about = "Terminal world clock for Indonesian cities with daily alarms"
)]
struct Cli {
    /// JSON config file (version 1).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum)]
    city: Option<City>,

    /// Daily alarm time, HH:MM. May be repeated.
    #[arg(long = "alarm", value_name = "HH:MM")]
    alarms: Vec<String>,

    #[arg(long, value_enum)]
    hour_mode: Option<TimeDisplayMode>,

    /// Do not count down to the default schedule when no alarm is enabled.
    #[arg(long)]
    no_fallback: bool,

    #[arg(long)]
    tick_ms: Option<u64>,

    /// Pretend the city's wall clock reads this time (YYYY-MM-DDTHH:MM[:SS]).
    #[arg(long, value_name = "DATETIME")]
    at: Option<String>,

    /// Print one snapshot and exit.
    #[arg(long)]
    once: bool,

    /// Print the snapshot as JSON (implies --once).
    #[arg(long)]
    json: bool,

    /// Ring without sound.
    #[arg(long)]
    mute: bool,

    #[arg(long)]
    log_level: Option<String>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[arg(long)]
    list_cities: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    if cli.list_cities {
        diagnostics::print_cities();
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    init_logging(&config.logging)?;
    info!(city = ?config.city, alarms = config.alarms.len(), "configuration loaded");

    let provider: Arc<dyn TimeProvider> = match cli.at.as_deref() {
        Some(text) => {
            let local = parse_local_datetime(text)?;
            let instant = local_to_instant(config.city.timezone(), local)
                .with_context(|| format!("invalid --at value '{text}'"))?;
            Arc::new(FixedTimeProvider::new(instant))
        }
        None => Arc::new(SystemTimeProvider),
    };

    if cli.once || cli.json {
        return diagnostics::run_once(&config, provider.as_ref(), cli.json);
    }

    let sound: Box<dyn AlarmSound> = if cli.mute {
        Box::new(SilentSound::default())
    } else {
        Box::new(BeepAlarm::default_device())
    };
    ui::app::run_interactive(&config, provider, sound)
}

/// Defaults, then the config file, then flags.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(city) = cli.city {
        config.city = city;
    }
    config.alarms.extend(cli.alarms.iter().map(|text| AlarmSeed {
        time: TimeOfDay::parse_lenient(text),
        enabled: true,
    }));
    if let Some(mode) = cli.hour_mode {
        config.display_mode = mode;
    }
    if cli.no_fallback {
        config.fallback_mode = FallbackMode::Off;
    }
    if let Some(tick_ms) = cli.tick_ms {
        if tick_ms == 0 {
            bail!("--tick-ms must be greater than zero");
        }
        config.tick_interval = Duration::from_millis(tick_ms);
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    Ok(config)
}

fn parse_local_datetime(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
        .with_context(|| format!("invalid --at value '{text}'; expected YYYY-MM-DDTHH:MM[:SS]"))
}
