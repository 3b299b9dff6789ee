use std::f32::consts::PI;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, PlayError, Sink, Source, StreamError};
use thiserror::Error;
use tracing::{debug, info, warn};

const SAMPLE_RATE: u32 = 44_100;
const BEEP_FREQUENCY: f32 = 880.0;
const BEEP_SECS: f32 = 0.25;
const BEEP_PERIOD_SECS: f32 = 1.0;
const BEEP_VOLUME: f32 = 0.4;

#[derive(Debug, Error)]
pub enum SoundError {
    #[error("no audio output available: {0}")]
    Output(#[from] StreamError),
    #[error("audio playback refused: {0}")]
    Playback(#[from] PlayError),
}

pub trait AlarmSound {
    fn start(&mut self, looped: bool) -> Result<(), SoundError>;
    /// Stops and rewinds: the next start plays from the top.
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
}

pub fn start_best_effort(sound: &mut dyn AlarmSound) {
    if let Err(err) = sound.start(true) {
        warn!(error = %err, "alarm sound unavailable");
    }
}

type SinkOpener = Box<dyn FnMut() -> Result<Sink, SoundError>>;

/// Beeps through a rodio sink. A fresh sink is opened on every start so a
/// stopped cue always restarts at the beginning of the beep.
pub struct BeepAlarm {
    open_sink: SinkOpener,
    sink: Option<Sink>,
}

impl BeepAlarm {
    pub fn with_opener(open_sink: SinkOpener) -> Self {
        Self {
            open_sink,
            sink: None,
        }
    }

    /// The output device is opened lazily on the first start and then kept.
    pub fn default_device() -> Self {
        let mut output: Option<(OutputStream, OutputStreamHandle)> = None;
        Self::with_opener(Box::new(move || {
            let (stream, handle) = match output.take() {
                Some(pair) => pair,
                None => {
                    let pair = OutputStream::try_default()?;
                    info!("audio output initialized");
                    pair
                }
            };
            let sink = Sink::try_new(&handle);
            output = Some((stream, handle));
            Ok(sink?)
        }))
    }
}

impl AlarmSound for BeepAlarm {
    fn start(&mut self, looped: bool) -> Result<(), SoundError> {
        if self.is_playing() {
            return Ok(());
        }
        let sink = (self.open_sink)()?;
        if looped {
            sink.append(beep_cycle().repeat_infinite());
        } else {
            sink.append(beep_cycle());
        }
        self.sink = Some(sink);
        debug!(looped, "beep started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
            debug!("beep stopped");
        }
    }

    fn is_playing(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| !sink.empty())
    }
}

/// One period of the cue: a short sine tone followed by silence.
fn beep_cycle() -> SamplesBuffer<f32> {
    let tone_len = (SAMPLE_RATE as f32 * BEEP_SECS) as usize;
    let period_len = (SAMPLE_RATE as f32 * BEEP_PERIOD_SECS) as usize;
    let samples = (0..period_len)
        .map(|i| {
            if i < tone_len {
                let t = i as f32 / SAMPLE_RATE as f32;
                (2.0 * PI * BEEP_FREQUENCY * t).sin() * BEEP_VOLUME
            } else {
                0.0
            }
        })
        .collect::<Vec<_>>();
    SamplesBuffer::new(1, SAMPLE_RATE, samples)
}

#[derive(Debug, Default)]
pub struct SilentSound {
    playing: bool,
}

impl AlarmSound for SilentSound {
    fn start(&mut self, _looped: bool) -> Result<(), SoundError> {
        self.playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}
