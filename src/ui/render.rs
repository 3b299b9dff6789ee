use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::alarm::model::AlarmId;
use crate::alarm::resolver::TargetSource;
use crate::alarm::scheduler::{AlarmScheduler, AlarmStatus, FallbackMode};
use crate::zone::City;

pub const NO_TARGET_COUNTDOWN: &str = "--:--:--";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, ValueEnum, Deserialize)]
pub enum TimeDisplayMode {
    #[default]
    #[value(name = "24h")]
    #[serde(rename = "24h")]
    Hour24,
    #[value(name = "12h")]
    #[serde(rename = "12h")]
    Hour12,
}

pub fn format_countdown(remaining_ms: i64) -> String {
    let total_secs = remaining_ms.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

pub fn format_clock(now: NaiveDateTime, mode: TimeDisplayMode) -> String {
    match mode {
        TimeDisplayMode::Hour24 => format!(
            "{:02}:{:02}:{:02}",
            now.hour(),
            now.minute(),
            now.second()
        ),
        TimeDisplayMode::Hour12 => {
            let (is_pm, hour12) = now.hour12();
            let meridiem = if is_pm { "PM" } else { "AM" };
            format!(
                "{:02}:{:02}:{:02} {}",
                hour12,
                now.minute(),
                now.second(),
                meridiem
            )
        }
    }
}

pub fn format_target(at: NaiveDateTime) -> String {
    format!("{:02}:{:02}", at.hour(), at.minute())
}

pub fn format_date_id(now: NaiveDateTime) -> String {
    format!(
        "{}, {} {} {}",
        weekday_id(now.weekday()),
        now.day(),
        month_id(now.month()),
        now.year()
    )
}

fn weekday_id(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Senin",
        Weekday::Tue => "Selasa",
        Weekday::Wed => "Rabu",
        Weekday::Thu => "Kamis",
        Weekday::Fri => "Jumat",
        Weekday::Sat => "Sabtu",
        Weekday::Sun => "Minggu",
    }
}

fn month_id(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "Januari",
        "Februari",
        "Maret",
        "April",
        "Mei",
        "Juni",
        "Juli",
        "Agustus",
        "September",
        "Oktober",
        "November",
        "Desember",
    ];
    MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?")
}

#[derive(Debug, Clone, Serialize)]
pub struct AlarmRow {
    pub id: AlarmId,
    pub time: String,
    pub enabled: bool,
    pub status: AlarmStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub city: &'static str,
    pub zone: &'static str,
    pub zone_abbreviation: &'static str,
    pub date: String,
    pub clock: String,
    pub local_iso: String,
    pub target: Option<String>,
    pub target_iso: Option<String>,
    pub target_source: Option<String>,
    pub target_alarm: Option<AlarmId>,
    pub countdown: String,
    pub ringing: bool,
    pub fallback_enabled: bool,
    pub alarms: Vec<AlarmRow>,
}

impl Snapshot {
    pub fn capture(
        city: City,
        now: NaiveDateTime,
        scheduler: &AlarmScheduler,
        mode: TimeDisplayMode,
    ) -> Self {
        let target = scheduler.target();
        let countdown = match scheduler.remaining(now) {
            Some(remaining) => format_countdown(remaining.num_milliseconds()),
            None => NO_TARGET_COUNTDOWN.to_string(),
        };
        let alarms = scheduler
            .book()
            .sorted_for_display()
            .into_iter()
            .map(|entry| AlarmRow {
                id: entry.id,
                time: entry.time.to_string(),
                enabled: entry.enabled,
                status: scheduler.status(entry.id).unwrap_or(AlarmStatus::Idle),
            })
            .collect();

        Self {
            city: city.display_name(),
            zone: city.zone_name(),
            zone_abbreviation: city.zone_abbreviation(),
            date: format_date_id(now),
            clock: format_clock(now, mode),
            local_iso: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
            target: target.map(|selection| format_target(selection.at)),
            target_iso: target.map(|selection| selection.at.format("%Y-%m-%dT%H:%M:%S").to_string()),
            target_source: target.map(|selection| describe_source(&selection.source)),
            target_alarm: target.and_then(|selection| selection.alarm_id()),
            countdown,
            ringing: scheduler.is_ringing(),
            fallback_enabled: scheduler.fallback_mode() == FallbackMode::On,
            alarms,
        }
    }
}

fn describe_source(source: &TargetSource) -> String {
    match source {
        TargetSource::Alarm(id) => format!("alarm #{id}"),
        TargetSource::Fallback(label) => label.clone(),
    }
}

pub fn render_status_line(snapshot: &Snapshot) -> String {
    let mut line = format!(
        "{} {} {} {}",
        snapshot.city, snapshot.date, snapshot.clock, snapshot.zone_abbreviation
    );
    match (&snapshot.target, &snapshot.target_source) {
        (Some(target), Some(source)) => {
            line.push_str(&format!(" | next {target} ({source}) in {}", snapshot.countdown));
        }
        _ => line.push_str(&format!(" | no alarm set {}", snapshot.countdown)),
    }
    if snapshot.ringing {
        line.push_str(" | RINGING");
    }
    line
}

pub fn render_alarm_table(snapshot: &Snapshot) -> String {
    if snapshot.alarms.is_empty() {
        return "no alarms".to_string();
    }
    let mut out = String::from("  ID  TIME   STATUS\n");
    for row in &snapshot.alarms {
        let status = match row.status {
            AlarmStatus::Idle => "off",
            AlarmStatus::Armed => "armed",
            AlarmStatus::Ringing => "RINGING",
        };
        out.push_str(&format!("{:>4}  {}  {}\n", row.id.to_string(), row.time, status));
    }
    out.truncate(out.trim_end().len());
    out
}
