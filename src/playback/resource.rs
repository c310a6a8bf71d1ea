//! Media resource seam
//!
//! A resource is whatever actually produces sound (a cpal stream, a fake
//! in tests). It reports progress back to the engine as events; the
//! engine never polls it.

use std::sync::mpsc::Sender;

use crate::Result;

/// Asynchronous notifications from a media resource
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Duration is known (seconds)
    MetadataReady(f64),
    /// Resource is ready to start producing audio
    CanPlay,
    /// Playback position advanced (seconds)
    TimeUpdate(f64),
    /// Natural end of media; the resource has reset itself to the start
    Ended,
    /// Resource failed to load or failed mid-playback
    Failed(String),
}

/// Epoch-tagged sender for resource events.
///
/// Each acquisition gets a fresh epoch; the engine drops events whose
/// epoch no longer matches, so callbacks from a superseded resource are
/// no-ops.
#[derive(Debug, Clone)]
pub struct EventSink {
    epoch: u64,
    tx: Sender<(u64, MediaEvent)>,
}

impl EventSink {
    /// Create a sink for the given epoch
    #[must_use]
    pub const fn new(epoch: u64, tx: Sender<(u64, MediaEvent)>) -> Self {
        Self { epoch, tx }
    }

    /// Deliver an event onto the engine's queue. Send failures mean the
    /// engine is gone and are ignored.
    pub fn emit(&self, event: MediaEvent) {
        let _ = self.tx.send((self.epoch, event));
    }
}

/// An acquired playback resource
pub trait MediaResource {
    /// Start or continue producing audio
    fn play(&mut self);

    /// Suspend audio without releasing anything
    fn pause(&mut self);

    /// Move the play head (seconds); out-of-range values are clamped by
    /// the resource
    fn seek(&mut self, seconds: f64);

    /// Apply a volume in `[0, 1]`
    fn set_volume(&mut self, volume: f64);
}

/// Acquires resources for the engine
pub trait ResourceFactory {
    /// Begin an asynchronous load of `url`. The returned handle controls
    /// the resource; load progress arrives through `sink`.
    ///
    /// # Errors
    ///
    /// Returns error if acquisition cannot even begin
    fn open(&self, url: &str, sink: EventSink) -> Result<Box<dyn MediaResource>>;
}
