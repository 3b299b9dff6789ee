use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::alarm::model::{AddOutcome, AlarmId};
use crate::alarm::scheduler::{AlarmScheduler, FallbackMode};
use crate::config::AppConfig;
use crate::sound::{AlarmSound, start_best_effort};
use crate::ticker::Ticker;
use crate::time_provider::TimeProvider;
use crate::ui::render::{Snapshot, TimeDisplayMode, render_alarm_table, render_status_line};
use crate::zone::{City, zone_now};

const HELP_TEXT: &str = "\
commands:
  add HH:MM        add an alarm (re-enables an existing one at that time)
  on ID | off ID   enable or disable one alarm
  remove ID        delete an alarm
  enable-all       enable every alarm
  disable-all      disable every alarm
  ack              silence the ringing alarm
  silence-all      silence and disable every alarm
  city NAME        switch city
  fallback on|off  show the default schedule when no alarm is enabled
  list             show alarms
  quit             exit";

#[derive(Debug)]
pub enum Event {
    Tick(u64),
    Input(String),
    InputClosed,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Command {
    Add(String),
    Enable(AlarmId),
    Disable(AlarmId),
    Remove(AlarmId),
    EnableAll,
    DisableAll,
    Acknowledge,
    SilenceAll,
    City(City),
    Fallback(FallbackMode),
    List,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn parse_command(line: &str) -> std::result::Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    };

    let parse_id = |usage: &str| -> std::result::Result<AlarmId, String> {
        rest.parse::<AlarmId>()
            .map_err(|_| format!("usage: {usage} ID"))
    };

    let command = match keyword.to_ascii_lowercase().as_str() {
        "add" => {
            if rest.is_empty() {
                return Err("usage: add HH:MM".to_string());
            }
            Command::Add(rest.to_string())
        }
        "on" | "enable" => Command::Enable(parse_id("on")?),
        "off" | "disable" => Command::Disable(parse_id("off")?),
        "remove" | "rm" | "delete" => Command::Remove(parse_id("remove")?),
        "enable-all" => Command::EnableAll,
        "disable-all" => Command::DisableAll,
        "ack" | "stop" => Command::Acknowledge,
        "silence-all" => Command::SilenceAll,
        "city" => {
            let city = City::from_name(rest).ok_or_else(|| {
                let known = City::ALL
                    .iter()
                    .map(|city| city.display_name())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("unknown city '{rest}'; known cities: {known}")
            })?;
            Command::City(city)
        }
        "fallback" => match rest.to_ascii_lowercase().as_str() {
            "on" => Command::Fallback(FallbackMode::On),
            "off" => Command::Fallback(FallbackMode::Off),
            _ => return Err("usage: fallback on|off".to_string()),
        },
        "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(Some(command))
}

pub struct App<W: Write> {
    city: City,
    scheduler: AlarmScheduler,
    display_mode: TimeDisplayMode,
    provider: Arc<dyn TimeProvider>,
    sound: Box<dyn AlarmSound>,
    out: W,
    tick_interval: Duration,
    events: Sender<Event>,
    ticker: Option<Ticker>,
    generation: u64,
}

impl<W: Write> App<W> {
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn TimeProvider>,
        sound: Box<dyn AlarmSound>,
        out: W,
        events: Sender<Event>,
    ) -> Result<Self> {
        let now = zone_now(config.city.zone_name(), provider.as_ref())?;
        let scheduler = AlarmScheduler::new(
            config.build_book(),
            config.fallback.clone(),
            config.fallback_mode,
            now,
        );
        Ok(Self {
            city: config.city,
            scheduler,
            display_mode: config.display_mode,
            provider,
            sound,
            out,
            tick_interval: config.tick_interval,
            events,
            ticker: None,
            generation: 0,
        })
    }

    fn now(&self) -> Result<NaiveDateTime> {
        Ok(zone_now(self.city.zone_name(), self.provider.as_ref())?)
    }

    pub fn restart_ticker(&mut self) -> Result<()> {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.generation += 1;
        let generation = self.generation;
        let events = self.events.clone();
        let ticker = Ticker::start(self.tick_interval, move || {
            events.send(Event::Tick(generation)).is_ok()
        })
        .context("failed to start clock ticker")?;
        self.ticker = Some(ticker);
        debug!(generation, "ticker started");
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) -> Result<Flow> {
        match event {
            Event::Tick(generation) if generation != self.generation => {
                debug!(generation, current = self.generation, "stale tick dropped");
                Ok(Flow::Continue)
            }
            Event::Tick(_) => {
                self.on_tick()?;
                Ok(Flow::Continue)
            }
            Event::Input(line) => match parse_command(&line) {
                Ok(Some(command)) => self.execute(command),
                Ok(None) => Ok(Flow::Continue),
                Err(hint) => {
                    writeln!(self.out, "{hint}")?;
                    Ok(Flow::Continue)
                }
            },
            Event::InputClosed => {
                info!("input closed, ending session");
                Ok(Flow::Quit)
            }
        }
    }

    fn on_tick(&mut self) -> Result<()> {
        let now = self.now()?;
        let outcome = self.scheduler.tick(now);
        if outcome.started_ringing {
            start_best_effort(self.sound.as_mut());
        }
        if outcome.absorbed > 0 || outcome.fallback_rolled {
            debug!(
                absorbed = outcome.absorbed,
                fallback_rolled = outcome.fallback_rolled,
                "target passed without a new ring"
            );
        }
        self.render_status()
    }

    pub fn execute(&mut self, command: Command) -> Result<Flow> {
        let now = self.now()?;
        match command {
            Command::Add(text) => {
                let outcome = self.scheduler.add_alarm(&text, now);
                let id = outcome.id();
                let time = self.alarm_time(id);
                match outcome {
                    AddOutcome::Created(_) => writeln!(self.out, "alarm #{id} set for {time}")?,
                    AddOutcome::Existing(_) => writeln!(self.out, "alarm #{id} at {time} enabled")?,
                }
                debug!(alarms = self.scheduler.book().len(), "alarm added");
            }
            Command::Enable(id) => self.set_enabled(id, true, now)?,
            Command::Disable(id) => self.set_enabled(id, false, now)?,
            Command::Remove(id) => match self.scheduler.remove(id, now) {
                Some(entry) => writeln!(self.out, "alarm #{id} ({}) removed", entry.time)?,
                None => writeln!(self.out, "no alarm #{id}")?,
            },
            Command::EnableAll => {
                let changed = self.scheduler.enable_all(now);
                writeln!(self.out, "{changed} alarm(s) enabled")?;
            }
            Command::DisableAll => {
                let changed = self.scheduler.disable_all(now);
                writeln!(self.out, "{changed} alarm(s) disabled")?;
            }
            Command::Acknowledge => {
                let ringing = self.scheduler.ringing_alarm();
                if self.scheduler.acknowledge(now) {
                    self.sound.stop();
                    match ringing.and_then(|id| Some((id, self.scheduler.rearmed_at(id)?))) {
                        Some((id, next)) => writeln!(
                            self.out,
                            "alarm silenced (#{id} rings again {})",
                            next.format("%Y-%m-%d %H:%M")
                        )?,
                        None => writeln!(self.out, "alarm silenced")?,
                    }
                } else {
                    writeln!(self.out, "nothing is ringing")?;
                }
            }
            Command::SilenceAll => {
                self.scheduler.silence_all(now);
                self.sound.stop();
                writeln!(self.out, "all alarms silenced and disabled")?;
            }
            Command::City(city) => {
                self.switch_city(city)?;
                writeln!(
                    self.out,
                    "city set to {} ({})",
                    city.display_name(),
                    city.zone_name()
                )?;
            }
            Command::Fallback(mode) => {
                self.scheduler.set_fallback_mode(mode, now);
                let state = match mode {
                    FallbackMode::On => "on",
                    FallbackMode::Off => "off",
                };
                writeln!(self.out, "fallback schedule {state}")?;
            }
            Command::List => {
                let snapshot = self.snapshot(now);
                writeln!(self.out, "{}", render_alarm_table(&snapshot))?;
                return Ok(Flow::Continue);
            }
            Command::Help => {
                writeln!(self.out, "{HELP_TEXT}")?;
                return Ok(Flow::Continue);
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        self.render_status()?;
        Ok(Flow::Continue)
    }

    fn set_enabled(&mut self, id: AlarmId, enabled: bool, now: NaiveDateTime) -> Result<()> {
        if self.scheduler.toggle(id, enabled, now) {
            let state = if enabled { "enabled" } else { "disabled" };
            writeln!(self.out, "alarm #{id} {state}")?;
        } else {
            writeln!(self.out, "no alarm #{id}")?;
        }
        Ok(())
    }

    fn switch_city(&mut self, city: City) -> Result<()> {
        info!(from = ?self.city, to = ?city, "city changed");
        let had_ticker = self.ticker.is_some();
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.city = city;
        let now = self.now()?;
        self.scheduler.zone_changed(now);
        if had_ticker {
            self.restart_ticker()?;
        } else {
            self.generation += 1;
        }
        Ok(())
    }

    fn alarm_time(&self, id: AlarmId) -> String {
        self.scheduler
            .book()
            .get(id)
            .map(|entry| entry.time.to_string())
            .unwrap_or_default()
    }

    fn snapshot(&self, now: NaiveDateTime) -> Snapshot {
        Snapshot::capture(self.city, now, &self.scheduler, self.display_mode)
    }

    pub fn render_status(&mut self) -> Result<()> {
        let now = self.now()?;
        let line = render_status_line(&self.snapshot(now));
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }

    pub fn shutdown(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
        self.sound.stop();
    }
}

pub fn run_interactive(
    config: &AppConfig,
    provider: Arc<dyn TimeProvider>,
    sound: Box<dyn AlarmSound>,
) -> Result<()> {
    let (events_tx, events_rx) = mpsc::channel();
    spawn_input_reader(events_tx.clone())?;

    let mut app = App::new(config, provider, sound, io::stdout(), events_tx)?;
    app.render_status()?;
    app.restart_ticker()?;

    let mut result = Ok(());
    for event in events_rx.iter() {
        match app.handle_event(event) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => {
                result = Err(err);
                break;
            }
        }
    }
    app.shutdown();
    result
}

fn spawn_input_reader(events: Sender<Event>) -> Result<()> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if events.send(Event::Input(line)).is_err() {
                    return;
                }
            }
            let _ = events.send(Event::InputClosed);
        })
        .context("failed to start input reader")?;
    Ok(())
}
