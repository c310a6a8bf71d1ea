//! Local audio output
//!
//! Concrete [`ResourceFactory`] for running outside a browser: fetch the
//! clip, decode the MP3, and play it through the default output device.
//! All of it happens on a worker thread so the engine's `open` call
//! returns immediately and load progress arrives as events.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleRate;

use super::resource::{EventSink, MediaEvent, MediaResource, ResourceFactory};
use crate::Result;

/// Worker wakes up this often to report progress and watch for the end
const TICK: Duration = Duration::from_millis(100);

/// Minimum position delta before another `TimeUpdate` goes out
const REPORT_STEP_SECS: f64 = 0.25;

/// Control messages from the engine-side handle to the worker
enum Ctrl {
    Play,
    Pause,
    Seek(f64),
    Volume(f64),
}

/// Acquires [`LocalResource`]s backed by cpal
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAudioFactory;

impl LocalAudioFactory {
    /// Create a factory
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ResourceFactory for LocalAudioFactory {
    fn open(&self, url: &str, sink: EventSink) -> Result<Box<dyn MediaResource>> {
        let (ctrl_tx, ctrl_rx) = channel();
        let url = url.to_string();

        std::thread::Builder::new()
            .name("timbre-playback".to_string())
            .spawn(move || worker(&url, &sink, &ctrl_rx))?;

        Ok(Box::new(LocalResource { ctrl: ctrl_tx }))
    }
}

/// Engine-side handle to the playback worker
struct LocalResource {
    ctrl: Sender<Ctrl>,
}

impl MediaResource for LocalResource {
    fn play(&mut self) {
        let _ = self.ctrl.send(Ctrl::Play);
    }

    fn pause(&mut self) {
        let _ = self.ctrl.send(Ctrl::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        let _ = self.ctrl.send(Ctrl::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f64) {
        let _ = self.ctrl.send(Ctrl::Volume(volume));
    }
}

/// Sample cursor shared with the output callback
struct Shared {
    /// Next sample index to emit
    position: AtomicU64,
    /// Volume in milli-units to stay lock-free (0..=1000)
    volume_milli: AtomicU64,
    /// Set by the callback when the last sample has been emitted
    finished: AtomicBool,
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn worker(url: &str, sink: &EventSink, ctrl: &Receiver<Ctrl>) {
    // Fetch. A hung download simply keeps the engine in Loading, which is
    // what the engine expects; stop() or a new play() detaches us.
    let bytes = match fetch(url) {
        Ok(bytes) => bytes,
        Err(e) => {
            sink.emit(MediaEvent::Failed(format!("fetch failed: {e}")));
            return;
        }
    };

    let (samples, sample_rate) = match decode_mp3(&bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            sink.emit(MediaEvent::Failed(e));
            return;
        }
    };
    if samples.is_empty() {
        sink.emit(MediaEvent::Failed("empty audio stream".to_string()));
        return;
    }

    let total = samples.len() as u64;
    let duration = samples.len() as f64 / f64::from(sample_rate);
    sink.emit(MediaEvent::MetadataReady(duration));

    let shared = Arc::new(Shared {
        position: AtomicU64::new(0),
        volume_milli: AtomicU64::new(1000),
        finished: AtomicBool::new(false),
    });

    let stream = match build_stream(&samples, sample_rate, &shared, sink) {
        Ok(stream) => stream,
        Err(e) => {
            sink.emit(MediaEvent::Failed(e));
            return;
        }
    };
    // Some hosts run freshly built streams; hold until the engine says play
    let _ = stream.pause();
    sink.emit(MediaEvent::CanPlay);

    let to_samples = |secs: f64| ((secs * f64::from(sample_rate)) as u64).min(total);
    let to_secs = |pos: u64| pos as f64 / f64::from(sample_rate);

    let mut last_reported = 0.0_f64;
    loop {
        match ctrl.recv_timeout(TICK) {
            Ok(Ctrl::Play) => {
                if let Err(e) = stream.play() {
                    sink.emit(MediaEvent::Failed(format!("output stream: {e}")));
                    return;
                }
            }
            Ok(Ctrl::Pause) => {
                let _ = stream.pause();
            }
            Ok(Ctrl::Seek(secs)) => {
                let pos = to_samples(secs.max(0.0));
                shared.position.store(pos, Ordering::Release);
                shared.finished.store(false, Ordering::Release);
                last_reported = to_secs(pos);
                sink.emit(MediaEvent::TimeUpdate(last_reported));
            }
            Ok(Ctrl::Volume(volume)) => {
                let milli = (volume.clamp(0.0, 1.0) * 1000.0) as u64;
                shared.volume_milli.store(milli, Ordering::Release);
            }
            // Handle dropped: the engine released us
            Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {
                if shared.finished.swap(false, Ordering::AcqRel) {
                    let _ = stream.pause();
                    shared.position.store(0, Ordering::Release);
                    last_reported = 0.0;
                    sink.emit(MediaEvent::Ended);
                    continue;
                }
                let now = to_secs(shared.position.load(Ordering::Acquire));
                if (now - last_reported).abs() >= REPORT_STEP_SECS {
                    last_reported = now;
                    sink.emit(MediaEvent::TimeUpdate(now));
                }
            }
        }
    }
}

/// Download the clip body
fn fetch(url: &str) -> std::result::Result<Vec<u8>, reqwest::Error> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}

/// Build the cpal output stream over the decoded samples
#[allow(clippy::cast_precision_loss)]
fn build_stream(
    samples: &[f32],
    sample_rate: u32,
    shared: &Arc<Shared>,
    sink: &EventSink,
) -> std::result::Result<cpal::Stream, String> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| "no output device available".to_string())?;

    let supported = device
        .supported_output_configs()
        .map_err(|e| e.to_string())?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(sample_rate)
                && c.max_sample_rate() >= SampleRate(sample_rate)
        })
        .or_else(|| {
            // Fallback: try stereo
            device.supported_output_configs().ok()?.find(|c| {
                c.channels() == 2
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            })
        })
        .ok_or_else(|| "no suitable output config found".to_string())?;

    let config = supported.with_sample_rate(SampleRate(sample_rate)).config();
    let channels = config.channels as usize;

    tracing::debug!(
        device = device.name().unwrap_or_default(),
        sample_rate,
        channels = config.channels,
        "audio output initialized"
    );

    let samples = samples.to_vec();
    let shared = Arc::clone(shared);
    let error_sink = sink.clone();

    device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let volume = volume_of(&shared);
                let mut pos = shared.position.load(Ordering::Acquire) as usize;

                for frame in data.chunks_mut(channels) {
                    let sample = if pos < samples.len() {
                        let s = samples[pos] * volume;
                        pos += 1;
                        s
                    } else {
                        shared.finished.store(true, Ordering::Release);
                        0.0
                    };
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                }

                shared.position.store(pos as u64, Ordering::Release);
            },
            move |err| {
                tracing::error!(error = %err, "audio playback error");
                error_sink.emit(MediaEvent::Failed(err.to_string()));
            },
            None,
        )
        .map_err(|e| e.to_string())
}

#[allow(clippy::cast_precision_loss)]
fn volume_of(shared: &Shared) -> f32 {
    shared.volume_milli.load(Ordering::Acquire) as f32 / 1000.0
}

/// Decode MP3 bytes to mono f32 samples and their sample rate
fn decode_mp3(mp3_data: &[u8]) -> std::result::Result<(Vec<f32>, u32), String> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = 0_u32;

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                if sample_rate == 0 {
                    sample_rate = frame.sample_rate as u32;
                }

                // Stereo frames are averaged down to mono
                let frame_samples: Vec<f32> = if frame.channels == 2 {
                    frame
                        .data
                        .chunks(2)
                        .map(|chunk| {
                            let left = f32::from(chunk[0]) / 32768.0;
                            let right =
                                f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                            f32::midpoint(left, right)
                        })
                        .collect()
                } else {
                    frame.data.iter().map(|&s| f32::from(s) / 32768.0).collect()
                };

                samples.extend(frame_samples);
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(format!("MP3 decode error: {e}")),
        }
    }

    if sample_rate == 0 {
        return Err("no MP3 frames found".to_string());
    }

    Ok((samples, sample_rate))
}
