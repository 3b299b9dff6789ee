use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self {
            hour: hour.min(23),
            minute: minute.min(59),
        }
    }

    pub fn parse_lenient(input: &str) -> Self {
        let mut parts = input.trim().splitn(3, ':');
        let hour = parse_field(parts.next().unwrap_or_default(), 23);
        let minute = parse_field(parts.next().unwrap_or_default(), 59);
        Self { hour, minute }
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

fn parse_field(raw: &str, max: u32) -> u32 {
    let raw = raw.trim();
    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let digits_len = rest.chars().take_while(char::is_ascii_digit).count();
    if digits_len == 0 || negative {
        return 0;
    }
    match rest[..digits_len].parse::<u64>() {
        Ok(value) => u32::try_from(value).unwrap_or(u32::MAX).min(max),
        Err(_) => max,
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(transparent)]
pub struct AlarmId(pub u64);

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AlarmId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(AlarmId)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AlarmEntry {
    pub id: AlarmId,
    pub time: TimeOfDay,
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AddOutcome {
    Created(AlarmId),
    Existing(AlarmId),
}

impl AddOutcome {
    pub fn id(self) -> AlarmId {
        match self {
            AddOutcome::Created(id) | AddOutcome::Existing(id) => id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlarmBook {
    entries: Vec<AlarmEntry>,
    next_id: u64,
}

impl AlarmBook {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn add(&mut self, input: &str) -> AddOutcome {
        self.add_time(TimeOfDay::parse_lenient(input))
    }

    pub fn add_time(&mut self, time: TimeOfDay) -> AddOutcome {
        if let Some(existing) = self.entries.iter_mut().find(|entry| entry.time == time) {
            existing.enabled = true;
            return AddOutcome::Existing(existing.id);
        }

        let id = AlarmId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.entries.push(AlarmEntry {
            id,
            time,
            enabled: true,
        });
        AddOutcome::Created(id)
    }

    pub fn toggle(&mut self, id: AlarmId, enabled: bool) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: AlarmId) -> Option<AlarmEntry> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn enable_all(&mut self) -> usize {
        self.set_all(true)
    }

    pub fn disable_all(&mut self) -> usize {
        self.set_all(false)
    }

    fn set_all(&mut self, enabled: bool) -> usize {
        let mut changed = 0;
        for entry in &mut self.entries {
            if entry.enabled != enabled {
                entry.enabled = enabled;
                changed += 1;
            }
        }
        changed
    }

    pub fn get(&self, id: AlarmId) -> Option<&AlarmEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[AlarmEntry] {
        &self.entries
    }

    pub fn any_enabled(&self) -> bool {
        self.entries.iter().any(|entry| entry.enabled)
    }

    pub fn sorted_for_display(&self) -> Vec<&AlarmEntry> {
        let mut sorted = self.entries.iter().collect::<Vec<_>>();
        sorted.sort_by_key(|entry| (entry.time, entry.id));
        sorted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_time() {
        let time = TimeOfDay::parse_lenient("07:05");
        assert_eq!(time, TimeOfDay::new(7, 5));
        assert_eq!(time.to_string(), "07:05");
    }

    #[test]
    fn clamps_out_of_range_fields() {
        assert_eq!(TimeOfDay::parse_lenient("25:75"), TimeOfDay::new(23, 59));
        assert_eq!(TimeOfDay::parse_lenient("-3:10"), TimeOfDay::new(0, 10));
        assert_eq!(
            TimeOfDay::parse_lenient("99999999999999999999:00"),
            TimeOfDay::new(23, 0)
        );
    }

    #[test]
    fn non_numeric_fields_become_zero() {
        assert_eq!(TimeOfDay::parse_lenient("ab:cd"), TimeOfDay::new(0, 0));
        assert_eq!(TimeOfDay::parse_lenient(""), TimeOfDay::new(0, 0));
        assert_eq!(TimeOfDay::parse_lenient("18"), TimeOfDay::new(18, 0));
        assert_eq!(TimeOfDay::parse_lenient("7pm:30"), TimeOfDay::new(7, 30));
    }

    #[test]
    fn ignores_seconds_field() {
        assert_eq!(TimeOfDay::parse_lenient("04:30:59"), TimeOfDay::new(4, 30));
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let mut book = AlarmBook::new();
        assert_eq!(book.add("04:30"), AddOutcome::Created(AlarmId(1)));
        assert_eq!(book.add("18:00"), AddOutcome::Created(AlarmId(2)));
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn add_duplicate_reenables_existing_entry() {
        let mut book = AlarmBook::new();
        let id = book.add("07:00").id();
        assert!(book.toggle(id, false));
        assert!(!book.any_enabled());

        let outcome = book.add("7:0");
        assert_eq!(outcome, AddOutcome::Existing(id));
        assert_eq!(book.len(), 1);
        assert!(book.get(id).expect("entry").enabled);
    }

    #[test]
    fn ids_are_not_reused_after_remove() {
        let mut book = AlarmBook::new();
        let first = book.add("05:00").id();
        book.remove(first).expect("removed");
        let second = book.add("05:00").id();
        assert_ne!(first, second);
    }

    #[test]
    fn toggle_and_remove_unknown_id() {
        let mut book = AlarmBook::new();
        assert!(!book.toggle(AlarmId(9), true));
        assert!(book.remove(AlarmId(9)).is_none());
    }

    #[test]
    fn bulk_toggles_report_changes() {
        let mut book = AlarmBook::new();
        book.add("05:00");
        let second = book.add("06:00").id();
        book.toggle(second, false);
        assert_eq!(book.enable_all(), 1);
        assert_eq!(book.disable_all(), 2);
        assert!(!book.any_enabled());
    }

    #[test]
    fn display_order_is_by_time() {
        let mut book = AlarmBook::new();
        book.add("18:00");
        book.add("04:30");
        let times = book
            .sorted_for_display()
            .iter()
            .map(|entry| entry.time.to_string())
            .collect::<Vec<_>>();
        assert_eq!(times, vec!["04:30", "18:00"]);
    }

    #[test]
    fn alarm_id_parses_with_optional_hash() {
        assert_eq!("#4".parse::<AlarmId>().expect("id"), AlarmId(4));
        assert_eq!(" 12 ".parse::<AlarmId>().expect("id"), AlarmId(12));
        assert!("x".parse::<AlarmId>().is_err());
    }
}
