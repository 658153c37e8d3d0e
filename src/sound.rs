use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::warn;
use rodio::source::SineWave;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

const FALLBACK_TONE_HZ: f32 = 1000.0;
const FALLBACK_TONE_GAIN: f32 = 0.20;

/// Looping alarm sound on the audio device's own playback thread. Owns no
/// alarm state; `play`/`stop` return immediately and are safe to call at any
/// time. A missing audio device degrades to silence with a warning.
pub struct AlarmPlayer {
    output: Option<(OutputStream, OutputStreamHandle)>,
    sink: Option<Sink>,
}

impl AlarmPlayer {
    pub fn new() -> Self {
        let output = match OutputStream::try_default() {
            Ok(pair) => Some(pair),
            Err(err) => {
                warn!("audio output unavailable, alarms will be silent: {err}");
                None
            }
        };
        Self { output, sink: None }
    }

    /// Starts looping the configured ringtone, falling back to a generated
    /// tone when no file is set or the file cannot be opened/decoded.
    /// Restarts from scratch if something is already playing.
    pub fn play(&mut self, ringtone: Option<&Path>) {
        self.stop();
        let Some((_, handle)) = &self.output else {
            return;
        };
        let sink = match Sink::try_new(handle) {
            Ok(sink) => sink,
            Err(err) => {
                warn!("could not open playback sink: {err}");
                return;
            }
        };
        match ringtone.and_then(open_ringtone) {
            Some(source) => sink.append(source),
            None => sink.append(SineWave::new(FALLBACK_TONE_HZ).amplify(FALLBACK_TONE_GAIN)),
        }
        self.sink = Some(sink);
    }

    /// Idempotent: stops whatever loop is active, if any.
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }
}

fn open_ringtone(path: &Path) -> Option<rodio::source::Repeat<Decoder<BufReader<File>>>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            warn!("cannot open ringtone {}: {err}", path.display());
            return None;
        }
    };
    match Decoder::new(BufReader::new(file)) {
        Ok(decoder) => Some(decoder.repeat_infinite()),
        Err(err) => {
            warn!("cannot decode ringtone {}: {err}", path.display());
            None
        }
    }
}
