//! Timbre Studio - local speech synthesis studio
//!
//! This library provides the core functionality for Timbre:
//! - Speech generation through a StyleTTS2-compatible HTTP provider
//! - Credit metering (one credit per successful generation)
//! - Voice catalog with user-facing to provider-facing id translation
//! - Single-owner audio playback engine
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   CLI / caller                       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Synthesizer                          │
//! │   auth  │  credits  │  voice map  │  provider  │ db │
//! └────────────────────┬────────────────────────────────┘
//!                      │ PlayableItem
//! ┌────────────────────▼────────────────────────────────┐
//! │               PlaybackEngine                         │
//! │   one resource  │  phase machine  │  event queue    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod playback;
pub mod synth;
pub mod voices;

pub use auth::{LocalSession, NoSession, Session, SessionProvider};
pub use config::Config;
pub use db::{DbConn, DbPool};
pub use error::{Error, Result};
pub use playback::{
    MediaEvent, MediaResource, Phase, PlayableItem, PlaybackEngine, PlaybackState,
    ResourceFactory,
};
pub use synth::{ProviderAudio, SpeechProvider, StyleHttpProvider, Synthesizer};
pub use voices::{Service, VoiceCatalog, VoiceDescriptor};
