//! Speech generation pipeline
//!
//! One call per generation: authenticate, fail fast on empty balances,
//! translate the voice id, call the provider, persist the record, then
//! debit. The pre-call credit check is an optimization only; the debit
//! itself is the conditional `UPDATE` in [`AccountRepo::atomic_debit`].

mod provider;

pub use provider::{ProviderAudio, SpeechProvider, StyleHttpProvider};

use std::sync::Arc;

use crate::auth::SessionProvider;
use crate::config::MAX_TEXT_CHARS;
use crate::db::{AccountRepo, ClipRepo, Debit};
use crate::playback::PlayableItem;
use crate::voices::{Service, VoiceCatalog};
use crate::{Error, Result};

/// Titles are cut at this many characters for the playbar
const TITLE_CHARS: usize = 50;

/// Executes generation requests end-to-end
pub struct Synthesizer {
    sessions: Arc<dyn SessionProvider>,
    provider: Arc<dyn SpeechProvider>,
    accounts: AccountRepo,
    clips: ClipRepo,
    catalog: VoiceCatalog,
}

impl Synthesizer {
    /// Create a synthesizer over the given collaborators
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionProvider>,
        provider: Arc<dyn SpeechProvider>,
        accounts: AccountRepo,
        clips: ClipRepo,
    ) -> Self {
        Self {
            sessions,
            provider,
            accounts,
            clips,
            catalog: VoiceCatalog::new(),
        }
    }

    /// Generate speech for `text` with a user-facing voice id.
    ///
    /// No credit is debited and no record is persisted unless the
    /// provider call succeeds. A persisted record with a failed debit is
    /// left in place rather than rolled back; the balance is never
    /// overcharged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`], [`Error::InvalidInput`],
    /// [`Error::InsufficientCredits`], [`Error::Provider`], or
    /// [`Error::Persistence`] per the failing gate.
    pub async fn generate(
        &self,
        text: &str,
        voice: &str,
        service: Service,
    ) -> Result<PlayableItem> {
        let session = self
            .sessions
            .current_session()
            .ok_or(Error::Unauthenticated)?;
        let user_id = session.user_id;

        let text = text.trim();
        if text.is_empty() {
            return Err(Error::InvalidInput("text is empty".to_string()));
        }
        if text.chars().count() > MAX_TEXT_CHARS {
            return Err(Error::InvalidInput(format!(
                "text exceeds {MAX_TEXT_CHARS} characters"
            )));
        }

        // Fail fast before paying for a provider call; the debit below is
        // the actual enforcement point.
        let credits = self.accounts.credits(&user_id)?.unwrap_or(0);
        if credits <= 0 {
            return Err(Error::InsufficientCredits);
        }

        let target_voice = self.catalog.resolve(service, voice);

        tracing::debug!(user = %user_id, voice, target_voice, %service, "generating speech");

        let audio = match self.provider.synthesize(text, target_voice).await {
            Ok(audio) => audio,
            Err(e) => {
                tracing::error!(error = %e, %service, "provider generation failed");
                return Err(e);
            }
        };

        // Record stores the voice as requested; the mapped id only ever
        // appears in the outbound call.
        let record_id = self
            .clips
            .create(&user_id, text, voice, service, &audio.s3_key)?;

        match self.accounts.atomic_debit(&user_id) {
            Ok(Debit::Applied) => {}
            Ok(Debit::NoCredits) => {
                // A concurrent request drained the balance between the
                // check and the debit. The record stays; the balance does
                // not go negative.
                tracing::warn!(user = %user_id, clip = %record_id, "debit lost race, balance empty");
                return Err(Error::InsufficientCredits);
            }
            Err(e) => {
                tracing::warn!(user = %user_id, clip = %record_id, error = %e, "debit failed after persist");
                return Err(e);
            }
        }

        tracing::info!(user = %user_id, clip = %record_id, %service, "speech generated");

        Ok(PlayableItem {
            id: record_id,
            url: audio.audio_url,
            title: clip_title(text),
            voice: self.display_voice(service, voice),
            service,
            duration: None,
        })
    }

    /// Voice ids available for a service
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] when no session is present
    pub fn list_voices(&self, service: Service) -> Result<Vec<String>> {
        self.sessions
            .current_session()
            .ok_or(Error::Unauthenticated)?;

        Ok(self
            .catalog
            .list(service)
            .iter()
            .map(|v| v.id.to_string())
            .collect())
    }

    /// Display label for a voice (falls back to the raw id)
    fn display_voice(&self, service: Service, voice: &str) -> String {
        self.catalog
            .list(service)
            .iter()
            .find(|v| v.id == voice)
            .map_or_else(|| voice.to_string(), |v| v.display_name.to_string())
    }
}

/// Truncate generation text into a playbar title
fn clip_title(text: &str) -> String {
    if text.chars().count() > TITLE_CHARS {
        let cut: String = text.chars().take(TITLE_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_titles_pass_through() {
        assert_eq!(clip_title("Hello world"), "Hello world");
    }

    #[test]
    fn long_titles_are_cut() {
        let text = "a".repeat(80);
        let title = clip_title(&text);
        assert_eq!(title.chars().count(), TITLE_CHARS + 3);
        assert!(title.ends_with("..."));
    }
}
