//! Playback state machine
//!
//! One engine per session, explicitly constructed and torn down with it.
//! All commands and all resource events are applied on the caller's
//! timeline, so state transitions need no locking; the epoch guard in
//! [`super::EventSink`] handles the one real race (a command landing
//! while a load is in flight).

use std::sync::mpsc::{channel, Receiver, Sender};

use super::resource::{EventSink, MediaEvent, MediaResource, ResourceFactory};
use super::PlayableItem;
use crate::Result;

/// Playback phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No item loaded
    Idle,
    /// Resource acquired, waiting for it to become ready
    Loading,
    Playing,
    Paused,
    /// Stopped or ran to the end; the item is retained for replay
    Stopped,
    /// Resource failed; the item is retained so the UI can show what broke
    Errored,
}

/// Observable snapshot of the engine
#[derive(Debug, Clone)]
pub struct PlaybackState {
    /// The item the engine currently owns, if any
    pub current_item: Option<PlayableItem>,
    pub phase: Phase,
    /// Seconds from the start, as last reported by the resource
    pub position: f64,
    /// Seconds; 0 means unknown
    pub duration: f64,
    /// Always within `[0, 1]`
    pub volume: f64,
}

impl PlaybackState {
    fn new() -> Self {
        Self {
            current_item: None,
            phase: Phase::Idle,
            position: 0.0,
            duration: 0.0,
            volume: 1.0,
        }
    }
}

/// Owns the single active playback resource
pub struct PlaybackEngine {
    state: PlaybackState,
    factory: Box<dyn ResourceFactory>,
    resource: Option<Box<dyn MediaResource>>,
    /// Bumped on every release; events from older epochs are stale
    epoch: u64,
    tx: Sender<(u64, MediaEvent)>,
    rx: Receiver<(u64, MediaEvent)>,
}

impl PlaybackEngine {
    /// Create an engine that acquires resources through `factory`
    #[must_use]
    pub fn new(factory: Box<dyn ResourceFactory>) -> Self {
        let (tx, rx) = channel();
        Self {
            state: PlaybackState::new(),
            factory,
            resource: None,
            epoch: 0,
            tx,
            rx,
        }
    }

    /// Current state snapshot
    #[must_use]
    pub const fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Play an item.
    ///
    /// Same item with a live resource is a toggle: playing pauses,
    /// anything else resumes. A different item tears the old resource
    /// down before the new one is acquired.
    ///
    /// # Errors
    ///
    /// Returns error if the factory cannot begin a load; the engine is
    /// left in `Errored` with the item retained.
    pub fn play(&mut self, item: PlayableItem) -> Result<()> {
        let same_item = self
            .state
            .current_item
            .as_ref()
            .is_some_and(|cur| cur.id == item.id);

        if same_item && self.resource.is_some() {
            self.toggle();
            return Ok(());
        }

        // Old resource goes away before anything new exists; two audible
        // resources must never overlap.
        self.release();

        self.state.current_item = Some(item.clone());
        self.state.phase = Phase::Loading;
        self.state.position = 0.0;
        self.state.duration = item.duration.unwrap_or(0.0);

        let sink = EventSink::new(self.epoch, self.tx.clone());
        match self.factory.open(&item.url, sink) {
            Ok(mut resource) => {
                resource.set_volume(self.state.volume);
                self.resource = Some(resource);
                Ok(())
            }
            Err(e) => {
                self.state.phase = Phase::Errored;
                tracing::error!(error = %e, item = %item.id, "failed to acquire playback resource");
                Err(e)
            }
        }
    }

    /// Suspend playback, keeping the resource
    pub fn pause(&mut self) {
        if self.state.phase == Phase::Playing {
            if let Some(resource) = &mut self.resource {
                resource.pause();
            }
            self.state.phase = Phase::Paused;
        }
    }

    /// Continue a paused or stopped item from the current position
    pub fn resume(&mut self) {
        if matches!(self.state.phase, Phase::Paused | Phase::Stopped) {
            if let Some(resource) = &mut self.resource {
                resource.play();
                self.state.phase = Phase::Playing;
            }
        }
    }

    /// Stop playback, release the resource, and rewind
    pub fn stop(&mut self) {
        if self.state.phase == Phase::Idle {
            return;
        }
        self.release();
        self.state.phase = Phase::Stopped;
        self.state.position = 0.0;
    }

    /// Move the play head. Clamped to `[0, duration]` when the duration
    /// is known, to `[0, ∞)` otherwise.
    pub fn seek(&mut self, seconds: f64) {
        let mut target = seconds.max(0.0);
        if self.state.duration > 0.0 {
            target = target.min(self.state.duration);
        }
        if let Some(resource) = &mut self.resource {
            resource.seek(target);
        }
        self.state.position = target;
    }

    /// Set volume, clamped to `[0, 1]`
    pub fn set_volume(&mut self, volume: f64) {
        let clamped = volume.clamp(0.0, 1.0);
        if let Some(resource) = &mut self.resource {
            resource.set_volume(clamped);
        }
        self.state.volume = clamped;
    }

    /// Drop the current item entirely and return to `Idle`
    pub fn clear(&mut self) {
        self.release();
        let volume = self.state.volume;
        self.state = PlaybackState::new();
        self.state.volume = volume;
    }

    /// Apply all pending resource events. Call from the owning timeline
    /// whenever it is convenient; events for superseded resources are
    /// discarded here.
    pub fn pump(&mut self) {
        while let Ok((epoch, event)) = self.rx.try_recv() {
            if epoch == self.epoch {
                self.apply(event);
            }
        }
    }

    /// Same-id play with a live resource: pause when playing, otherwise
    /// get sound going again
    fn toggle(&mut self) {
        match self.state.phase {
            Phase::Playing => self.pause(),
            Phase::Paused | Phase::Stopped => self.resume(),
            // Still loading (or in an odd corner); nudge the resource and
            // let its events settle the phase
            Phase::Loading | Phase::Idle | Phase::Errored => {
                if let Some(resource) = &mut self.resource {
                    resource.play();
                }
            }
        }
    }

    /// Tear down the current resource, if any, and invalidate in-flight
    /// events from it
    fn release(&mut self) {
        if let Some(mut resource) = self.resource.take() {
            resource.pause();
        }
        self.epoch += 1;
    }

    fn apply(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::MetadataReady(duration) => {
                self.state.duration = duration;
                self.start_if_loading();
            }
            MediaEvent::CanPlay => self.start_if_loading(),
            MediaEvent::TimeUpdate(position) => {
                let mut position = position.max(0.0);
                if self.state.duration > 0.0 {
                    position = position.min(self.state.duration);
                }
                self.state.position = position;
            }
            MediaEvent::Ended => {
                // Not Idle: the item sticks around so it can be replayed
                self.state.phase = Phase::Stopped;
                self.state.position = 0.0;
            }
            MediaEvent::Failed(detail) => {
                tracing::error!(error = %detail, "playback resource failed");
                self.release();
                self.state.phase = Phase::Errored;
            }
        }
    }

    fn start_if_loading(&mut self) {
        if self.state.phase == Phase::Loading {
            if let Some(resource) = &mut self.resource {
                resource.play();
                self.state.phase = Phase::Playing;
            }
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.release();
    }
}
