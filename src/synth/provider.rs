//! StyleTTS2-compatible provider client

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{Error, Result};

/// Audio handle returned by the provider on success
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderAudio {
    /// Playable URL for the generated clip
    pub audio_url: String,
    /// Durable storage key at the provider
    pub s3_key: String,
}

/// Outbound speech synthesis service
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize `text` with a provider-facing voice id.
    ///
    /// A single attempt; retry policy belongs to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Provider`] on any non-success status, transport
    /// failure, or timeout.
    async fn synthesize(&self, text: &str, target_voice: &str) -> Result<ProviderAudio>;
}

/// HTTP client for a StyleTTS2-style `/generate` endpoint
pub struct StyleHttpProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl StyleHttpProvider {
    /// Create a provider client with a bounded per-request wait
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot
    /// be constructed
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("provider API key required".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl SpeechProvider for StyleHttpProvider {
    async fn synthesize(&self, text: &str, target_voice: &str) -> Result<ProviderAudio> {
        #[derive(serde::Serialize)]
        struct GenerateRequest<'a> {
            text: &'a str,
            target_voice: &'a str,
        }

        let request = GenerateRequest { text, target_voice };

        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("generate failed {status}: {body}")));
        }

        response
            .json::<ProviderAudio>()
            .await
            .map_err(|e| Error::Provider(format!("malformed provider response: {e}")))
    }
}
