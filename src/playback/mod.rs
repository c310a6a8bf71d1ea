//! Audio playback
//!
//! The engine owns at most one live media resource and is driven from a
//! single logical timeline: commands from the caller, events from the
//! resource's worker delivered through an epoch-tagged queue.

mod engine;
mod local;
mod resource;

pub use engine::{Phase, PlaybackEngine, PlaybackState};
pub use local::LocalAudioFactory;
pub use resource::{EventSink, MediaEvent, MediaResource, ResourceFactory};

use crate::voices::Service;

/// A generated clip ready for playback.
///
/// Immutable once constructed; created by the synthesizer and owned by
/// the engine until replaced or cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayableItem {
    /// Record id of the generation
    pub id: String,
    /// Playable URL
    pub url: String,
    /// Playbar title (truncated generation text)
    pub title: String,
    /// Voice display label
    pub voice: String,
    /// Service that produced the clip
    pub service: Service,
    /// Known duration in seconds, if any
    pub duration: Option<f64>,
}
