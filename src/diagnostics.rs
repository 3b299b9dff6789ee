use anyhow::{Context, Result};

use crate::alarm::scheduler::AlarmScheduler;
use crate::config::AppConfig;
use crate::time_provider::TimeProvider;
use crate::ui::render::{Snapshot, render_alarm_table, render_status_line};
use crate::zone::{City, zone_now};

pub fn build_report(config: &AppConfig, provider: &dyn TimeProvider, json: bool) -> Result<String> {
    let now = zone_now(config.city.zone_name(), provider)?;
    let scheduler = AlarmScheduler::new(
        config.build_book(),
        config.fallback.clone(),
        config.fallback_mode,
        now,
    );
    let snapshot = Snapshot::capture(config.city, now, &scheduler, config.display_mode);

    if json {
        return serde_json::to_string_pretty(&snapshot).context("failed to encode snapshot");
    }

    let mut report = String::new();
    report.push_str(&render_status_line(&snapshot));
    report.push('\n');
    report.push_str(&format!("Zone: {} ({})\n", snapshot.zone, snapshot.zone_abbreviation));
    report.push_str(&format!("Time source: {}\n", provider.label()));
    report.push_str(&render_alarm_table(&snapshot));
    Ok(report)
}

pub fn run_once(config: &AppConfig, provider: &dyn TimeProvider, json: bool) -> Result<()> {
    println!("{}", build_report(config, provider, json)?);
    Ok(())
}

pub fn print_cities() {
    for city in City::ALL {
        println!(
            "{:<12} {:<16} {}",
            city.display_name(),
            city.zone_name(),
            city.zone_abbreviation()
        );
    }
}
