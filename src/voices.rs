//! Voice catalog
//!
//! Maps user-facing voice ids to the ids the provider understands. The
//! table is static per service and read-only at request time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A synthesis service backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Service {
    /// StyleTTS2 speech synthesis
    StyleTts2,
    /// Seed-VC voice conversion
    SeedVc,
    /// Make-An-Audio sound generation
    MakeAnAudio,
}

impl Service {
    /// Parse from string representation
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "styletts2" => Some(Self::StyleTts2),
            "seedvc" | "seed-vc" => Some(Self::SeedVc),
            "make-an-audio" | "makeanaudio" => Some(Self::MakeAnAudio),
            _ => None,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StyleTts2 => write!(f, "styletts2"),
            Self::SeedVc => write!(f, "seed-vc"),
            Self::MakeAnAudio => write!(f, "make-an-audio"),
        }
    }
}

/// A voice as shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceDescriptor {
    /// User-facing voice id
    pub id: &'static str,
    /// Provider-facing voice id
    pub provider_id: &'static str,
    /// Display name
    pub display_name: &'static str,
    /// Accent color for UI chips
    pub accent: &'static str,
}

/// StyleTTS2 catalog entries
const STYLETTS2_VOICES: &[VoiceDescriptor] = &[
    VoiceDescriptor {
        id: "andreas",
        provider_id: "3",
        display_name: "Andreas",
        accent: "#8b5cf6",
    },
    VoiceDescriptor {
        id: "woman",
        provider_id: "amused",
        display_name: "Woman",
        accent: "#ec4899",
    },
    VoiceDescriptor {
        id: "trump",
        provider_id: "sleepy",
        display_name: "Trump",
        accent: "#f59e0b",
    },
];

/// Static per-service voice lookup
#[derive(Debug, Clone, Copy, Default)]
pub struct VoiceCatalog;

impl VoiceCatalog {
    /// Create a catalog
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Voices for a service, in display order. Services without catalog
    /// entries yield an empty slice.
    #[must_use]
    pub fn list(self, service: Service) -> &'static [VoiceDescriptor] {
        match service {
            Service::StyleTts2 => STYLETTS2_VOICES,
            Service::SeedVc | Service::MakeAnAudio => &[],
        }
    }

    /// Translate a user-facing voice id to the provider's id.
    ///
    /// Unknown ids pass through unchanged so provider-native ids keep
    /// working without a catalog entry.
    #[must_use]
    pub fn resolve<'a>(self, service: Service, voice_id: &'a str) -> &'a str {
        self.list(service)
            .iter()
            .find(|v| v.id == voice_id)
            .map_or(voice_id, |v| v.provider_id)
    }
}
