use std::collections::HashMap;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::alarm::model::{AddOutcome, AlarmBook, AlarmEntry, AlarmId};
use crate::alarm::resolver::{
    FallbackSchedule, Selection, TargetSource, rearm_after_crossing, select_next,
};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmStatus {
    Idle,
    Armed,
    Ringing,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackMode {
    #[default]
    On,
    Off,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct TickOutcome {
    pub started_ringing: bool,
    pub absorbed: usize,
    pub fallback_rolled: bool,
}

pub struct AlarmScheduler {
    book: AlarmBook,
    fallback: FallbackSchedule,
    fallback_mode: FallbackMode,
    rearmed: HashMap<AlarmId, NaiveDateTime>,
    target: Option<Selection>,
    ringing: bool,
    ringing_alarm: Option<AlarmId>,
}

impl AlarmScheduler {
    pub fn new(
        book: AlarmBook,
        fallback: FallbackSchedule,
        fallback_mode: FallbackMode,
        now: NaiveDateTime,
    ) -> Self {
        let mut scheduler = Self {
            book,
            fallback,
            fallback_mode,
            rearmed: HashMap::new(),
            target: None,
            ringing: false,
            ringing_alarm: None,
        };
        scheduler.recompute(now);
        scheduler
    }

    pub fn tick(&mut self, now: NaiveDateTime) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let Some(target) = self.target.clone() else {
            return outcome;
        };
        if now < target.at {
            return outcome;
        }

        match target.source {
            TargetSource::Alarm(id) => {
                if let Some(entry) = self.book.get(id) {
                    let next = rearm_after_crossing(target.at, entry.time);
                    self.rearmed.insert(id, next);
                    debug!(alarm = %id, next = %next, "re-armed after crossing");
                }
                if self.ringing {
                    outcome.absorbed += 1;
                    info!(alarm = %id, "alarm crossed while already ringing");
                } else {
                    self.ringing = true;
                    self.ringing_alarm = Some(id);
                    outcome.started_ringing = true;
                    info!(alarm = %id, at = %target.at, "alarm ringing");
                }
            }
            TargetSource::Fallback(label) => {
                outcome.fallback_rolled = true;
                debug!(%label, "fallback target passed");
            }
        }

        self.recompute(now);
        outcome
    }

    pub fn acknowledge(&mut self, now: NaiveDateTime) -> bool {
        if !self.ringing {
            return false;
        }
        info!(alarm = ?self.ringing_alarm, "alarm acknowledged");
        self.ringing = false;
        self.ringing_alarm = None;
        self.recompute(now);
        true
    }

    pub fn silence_all(&mut self, now: NaiveDateTime) -> bool {
        let was_ringing = self.ringing;
        self.ringing = false;
        self.ringing_alarm = None;
        let disabled = self.book.disable_all();
        self.rearmed.clear();
        info!(disabled, was_ringing, "all alarms silenced");
        self.recompute(now);
        was_ringing
    }

    pub fn add_alarm(&mut self, input: &str, now: NaiveDateTime) -> AddOutcome {
        let outcome = self.book.add(input);
        self.recompute(now);
        outcome
    }

    pub fn toggle(&mut self, id: AlarmId, enabled: bool, now: NaiveDateTime) -> bool {
        if !self.book.toggle(id, enabled) {
            return false;
        }
        if !enabled {
            self.rearmed.remove(&id);
        }
        self.recompute(now);
        true
    }

    pub fn remove(&mut self, id: AlarmId, now: NaiveDateTime) -> Option<AlarmEntry> {
        let removed = self.book.remove(id)?;
        self.rearmed.remove(&id);
        self.recompute(now);
        Some(removed)
    }

    pub fn enable_all(&mut self, now: NaiveDateTime) -> usize {
        let changed = self.book.enable_all();
        self.recompute(now);
        changed
    }

    pub fn disable_all(&mut self, now: NaiveDateTime) -> usize {
        let changed = self.book.disable_all();
        self.rearmed.clear();
        self.recompute(now);
        changed
    }

    pub fn zone_changed(&mut self, now: NaiveDateTime) {
        self.rearmed.clear();
        self.recompute(now);
    }

    pub fn set_fallback_mode(&mut self, mode: FallbackMode, now: NaiveDateTime) {
        self.fallback_mode = mode;
        self.recompute(now);
    }

    pub fn recompute(&mut self, now: NaiveDateTime) {
        self.rearmed.retain(|_, pinned| *pinned > now);

        let from_alarms = if self.book.any_enabled() {
            select_next(now, self.book.entries(), &self.rearmed)
        } else {
            None
        };

        self.target = match (from_alarms, self.fallback_mode) {
            (Some(selection), _) => Some(selection),
            (None, FallbackMode::On) => self.fallback.select_next(now),
            (None, FallbackMode::Off) => None,
        };
        debug!(target = ?self.target, "target recomputed");
    }

    pub fn status(&self, id: AlarmId) -> Option<AlarmStatus> {
        let entry = self.book.get(id)?;
        Some(if self.ringing_alarm == Some(id) {
            AlarmStatus::Ringing
        } else if entry.enabled {
            AlarmStatus::Armed
        } else {
            AlarmStatus::Idle
        })
    }

    pub fn remaining(&self, now: NaiveDateTime) -> Option<TimeDelta> {
        self.target.as_ref().map(|target| target.at - now)
    }

    pub fn target(&self) -> Option<&Selection> {
        self.target.as_ref()
    }

    pub fn rearmed_at(&self, id: AlarmId) -> Option<NaiveDateTime> {
        self.rearmed.get(&id).copied()
    }

    pub fn is_ringing(&self) -> bool {
        self.ringing
    }

    pub fn ringing_alarm(&self) -> Option<AlarmId> {
        self.ringing_alarm
    }

    pub fn book(&self) -> &AlarmBook {
        &self.book
    }

    pub fn fallback_mode(&self) -> FallbackMode {
        self.fallback_mode
    }
}
