use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use clap::ValueEnum;
use thiserror::Error;

use crate::time_provider::TimeProvider;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ZoneError {
    #[error("unrecognized timezone '{0}'")]
    Unrecognized(String),
    #[error("local time {local} does not exist in {zone}")]
    NonexistentLocalTime { local: NaiveDateTime, zone: String },
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default, ValueEnum)]
pub enum City {
    #[default]
    Jakarta,
    Bandung,
    Surabaya,
    Semarang,
    Medan,
    Pontianak,
    Makassar,
    Denpasar,
    Balikpapan,
    Jayapura,
    Ambon,
}

impl City {
    pub const ALL: [City; 11] = [
        City::Jakarta,
        City::Bandung,
        City::Surabaya,
        City::Semarang,
        City::Medan,
        City::Pontianak,
        City::Makassar,
        City::Denpasar,
        City::Balikpapan,
        City::Jayapura,
        City::Ambon,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            City::Jakarta => "Jakarta",
            City::Bandung => "Bandung",
            City::Surabaya => "Surabaya",
            City::Semarang => "Semarang",
            City::Medan => "Medan",
            City::Pontianak => "Pontianak",
            City::Makassar => "Makassar",
            City::Denpasar => "Denpasar",
            City::Balikpapan => "Balikpapan",
            City::Jayapura => "Jayapura",
            City::Ambon => "Ambon",
        }
    }

    pub fn timezone(self) -> Tz {
        match self {
            City::Jakarta | City::Bandung | City::Surabaya | City::Semarang | City::Medan => {
                chrono_tz::Asia::Jakarta
            }
            City::Pontianak => chrono_tz::Asia::Pontianak,
            City::Makassar | City::Denpasar | City::Balikpapan => chrono_tz::Asia::Makassar,
            City::Jayapura | City::Ambon => chrono_tz::Asia::Jayapura,
        }
    }

    pub fn zone_name(self) -> &'static str {
        match self {
            City::Jakarta | City::Bandung | City::Surabaya | City::Semarang | City::Medan => {
                "Asia/Jakarta"
            }
            City::Pontianak => "Asia/Pontianak",
            City::Makassar | City::Denpasar | City::Balikpapan => "Asia/Makassar",
            City::Jayapura | City::Ambon => "Asia/Jayapura",
        }
    }

    pub fn zone_abbreviation(self) -> &'static str {
        match self {
            City::Makassar | City::Denpasar | City::Balikpapan => "WITA",
            City::Jayapura | City::Ambon => "WIT",
            _ => "WIB",
        }
    }

    pub fn from_name(name: &str) -> Option<City> {
        let name = name.trim();
        City::ALL
            .into_iter()
            .find(|city| city.display_name().eq_ignore_ascii_case(name))
    }
}

pub fn parse_zone(name: &str) -> Result<Tz, ZoneError> {
    name.parse::<Tz>()
        .map_err(|_| ZoneError::Unrecognized(name.to_string()))
}

// The result carries no offset: it may only be compared with or subtracted
// from other values produced for the same zone.
pub fn wall_clock_at(zone: Tz, instant: DateTime<Utc>) -> NaiveDateTime {
    let local = instant.with_timezone(&zone).naive_local();
    local.with_nanosecond(0).unwrap_or(local)
}

pub fn zone_now(zone_name: &str, provider: &dyn TimeProvider) -> Result<NaiveDateTime, ZoneError> {
    let zone = parse_zone(zone_name)?;
    Ok(wall_clock_at(zone, provider.now()))
}

pub fn local_to_instant(zone: Tz, local: NaiveDateTime) -> Result<DateTime<Utc>, ZoneError> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, _second) => Ok(first.with_timezone(&Utc)),
        LocalResult::None => Err(ZoneError::NonexistentLocalTime {
            local,
            zone: zone.name().to_string(),
        }),
    }
}
