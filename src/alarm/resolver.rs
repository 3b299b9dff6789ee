// All NaiveDateTime values here are wall-clock readings in one zone and must
// never be compared across zones.

use std::collections::HashMap;

use chrono::{Days, NaiveDateTime};
use serde::Deserialize;

use crate::alarm::model::{AlarmEntry, AlarmId, TimeOfDay};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum TargetSource {
    Alarm(AlarmId),
    Fallback(String),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Selection {
    pub at: NaiveDateTime,
    pub source: TargetSource,
}

impl Selection {
    pub fn alarm_id(&self) -> Option<AlarmId> {
        match self.source {
            TargetSource::Alarm(id) => Some(id),
            TargetSource::Fallback(_) => None,
        }
    }
}

pub fn next_occurrence(now: NaiveDateTime, time: TimeOfDay) -> NaiveDateTime {
    let candidate = now.date().and_time(time.to_naive_time());
    // Equal to `now` counts as already passed.
    if candidate > now {
        candidate
    } else {
        add_one_day(candidate)
    }
}

pub fn rearm_after_crossing(crossed: NaiveDateTime, time: TimeOfDay) -> NaiveDateTime {
    add_one_day(crossed.date().and_time(time.to_naive_time()))
}

fn add_one_day(value: NaiveDateTime) -> NaiveDateTime {
    value
        .checked_add_days(Days::new(1))
        .unwrap_or(NaiveDateTime::MAX)
}

pub fn earliest<I>(candidates: I) -> Option<Selection>
where
    I: IntoIterator<Item = Selection>,
{
    let mut best: Option<Selection> = None;
    for candidate in candidates {
        match &best {
            Some(current) if candidate.at >= current.at => {}
            _ => best = Some(candidate),
        }
    }
    best
}

pub fn select_next(
    now: NaiveDateTime,
    entries: &[AlarmEntry],
    pinned: &HashMap<AlarmId, NaiveDateTime>,
) -> Option<Selection> {
    earliest(
        entries
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| Selection {
                at: pinned
                    .get(&entry.id)
                    .copied()
                    .unwrap_or_else(|| next_occurrence(now, entry.time)),
                source: TargetSource::Alarm(entry.id),
            }),
    )
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct FallbackSlot {
    pub label: String,
    #[serde(deserialize_with = "deserialize_time_of_day")]
    pub time: TimeOfDay,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FallbackSchedule {
    pub slots: Vec<FallbackSlot>,
}

impl Default for FallbackSchedule {
    fn default() -> Self {
        Self {
            slots: vec![
                FallbackSlot {
                    label: "Subuh".to_string(),
                    time: TimeOfDay::new(4, 30),
                },
                FallbackSlot {
                    label: "Maghrib".to_string(),
                    time: TimeOfDay::new(18, 0),
                },
            ],
        }
    }
}

impl FallbackSchedule {
    pub fn select_next(&self, now: NaiveDateTime) -> Option<Selection> {
        earliest(self.slots.iter().map(|slot| Selection {
            at: next_occurrence(now, slot.time),
            source: TargetSource::Fallback(slot.label.clone()),
        }))
    }
}

pub(crate) fn deserialize_time_of_day<'de, D>(deserializer: D) -> Result<TimeOfDay, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(TimeOfDay::parse_lenient(&raw))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};

    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .expect("valid date")
            .and_hms_opt(hour, minute, second)
            .expect("valid time")
    }

    fn entry(id: u64, hour: u32, minute: u32, enabled: bool) -> AlarmEntry {
        AlarmEntry {
            id: AlarmId(id),
            time: TimeOfDay::new(hour, minute),
            enabled,
        }
    }

    #[test]
    fn resolves_later_today() {
        let now = at(2026, 10, 16, 6, 0, 0);
        assert_eq!(
            next_occurrence(now, TimeOfDay::new(7, 0)),
            at(2026, 10, 16, 7, 0, 0)
        );
    }

    #[test]
    fn rolls_to_tomorrow_once_passed() {
        let now = at(2026, 10, 16, 8, 0, 0);
        assert_eq!(
            next_occurrence(now, TimeOfDay::new(7, 0)),
            at(2026, 10, 17, 7, 0, 0)
        );
    }

    #[test]
    fn exact_match_counts_as_passed() {
        let now = at(2026, 10, 16, 7, 0, 0);
        assert_eq!(
            next_occurrence(now, TimeOfDay::new(7, 0)),
            at(2026, 10, 17, 7, 0, 0)
        );
    }

    #[test]
    fn rollover_crosses_month_and_year() {
        assert_eq!(
            next_occurrence(at(2026, 12, 31, 23, 30, 0), TimeOfDay::new(4, 30)),
            at(2027, 1, 1, 4, 30, 0)
        );
        assert_eq!(
            next_occurrence(at(2028, 2, 28, 19, 0, 0), TimeOfDay::new(18, 0)),
            at(2028, 2, 29, 18, 0, 0)
        );
    }

    #[test]
    fn result_is_always_strictly_after_now() {
        let nows = [
            at(2026, 1, 1, 0, 0, 0),
            at(2026, 6, 15, 12, 30, 45),
            at(2026, 12, 31, 23, 59, 59),
        ];
        for now in nows {
            for hour in 0..24 {
                for minute in [0, 1, 29, 30, 59] {
                    let next = next_occurrence(now, TimeOfDay::new(hour, minute));
                    assert!(next > now, "{next} should be after {now}");
                    assert!(next - now <= chrono::Duration::days(1));
                    assert_eq!((next.hour(), next.minute(), next.second()), (hour, minute, 0));
                }
            }
        }
    }

    #[test]
    fn selects_soonest_enabled_entry() {
        let entries = vec![entry(1, 7, 0, true), entry(2, 18, 0, true)];
        let now = at(2026, 10, 16, 10, 0, 0);
        let selection = select_next(now, &entries, &HashMap::new()).expect("selection");
        assert_eq!(selection.at, at(2026, 10, 16, 18, 0, 0));
        assert_eq!(selection.alarm_id(), Some(AlarmId(2)));
    }

    #[test]
    fn selection_is_not_later_than_any_entry() {
        let entries = vec![
            entry(1, 4, 30, true),
            entry(2, 12, 5, true),
            entry(3, 15, 20, true),
            entry(4, 23, 59, true),
        ];
        for hour in 0..24 {
            let now = at(2026, 3, 10, hour, 17, 0);
            let selection = select_next(now, &entries, &HashMap::new()).expect("selection");
            for item in &entries {
                assert!(selection.at <= next_occurrence(now, item.time));
            }
        }
    }

    #[test]
    fn disabled_entries_are_ignored() {
        let entries = vec![entry(1, 11, 0, false), entry(2, 18, 0, true)];
        let now = at(2026, 10, 16, 10, 0, 0);
        let selection = select_next(now, &entries, &HashMap::new()).expect("selection");
        assert_eq!(selection.alarm_id(), Some(AlarmId(2)));
    }

    #[test]
    fn no_enabled_entries_yields_none() {
        let now = at(2026, 10, 16, 10, 0, 0);
        assert!(select_next(now, &[], &HashMap::new()).is_none());
        assert!(select_next(now, &[entry(1, 11, 0, false)], &HashMap::new()).is_none());
    }

    #[test]
    fn ties_go_to_first_in_iteration_order() {
        let entries = vec![entry(5, 9, 0, true), entry(2, 9, 0, true)];
        let now = at(2026, 10, 16, 8, 0, 0);
        let selection = select_next(now, &entries, &HashMap::new()).expect("selection");
        assert_eq!(selection.alarm_id(), Some(AlarmId(5)));
    }

    #[test]
    fn rearm_moves_one_day_past_crossed_target() {
        let crossed = at(2026, 10, 31, 7, 0, 0);
        assert_eq!(
            rearm_after_crossing(crossed, TimeOfDay::new(7, 0)),
            at(2026, 11, 1, 7, 0, 0)
        );
    }

    #[test]
    fn fallback_picks_next_slot() {
        let schedule = FallbackSchedule::default();
        let morning = schedule
            .select_next(at(2026, 10, 16, 10, 0, 0))
            .expect("fallback");
        assert_eq!(morning.at, at(2026, 10, 16, 18, 0, 0));
        assert_eq!(morning.source, TargetSource::Fallback("Maghrib".to_string()));

        let night = schedule
            .select_next(at(2026, 10, 16, 19, 0, 0))
            .expect("fallback");
        assert_eq!(night.at, at(2026, 10, 17, 4, 30, 0));
        assert_eq!(night.alarm_id(), None);
    }

    #[test]
    fn empty_fallback_schedule_has_no_target() {
        let schedule = FallbackSchedule { slots: Vec::new() };
        assert!(schedule.select_next(at(2026, 10, 16, 10, 0, 0)).is_none());
    }
}
