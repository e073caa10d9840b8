//! Reference-configuration fetch: request/response, not streamed.
//!
//! Each speaker class has its own reference vowel set and plot ranges; the
//! backend serves both from a single endpoint keyed by `speaker_type`.  The
//! controller re-issues the request on every speaker change and swaps the
//! result in wholesale — configurations are replaced, never merged.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::BackendConfig;
use crate::types::{PlotConfig, SpeakerType, VowelReference};

// ---------------------------------------------------------------------------
// ReferenceError
// ---------------------------------------------------------------------------

/// Errors that can occur while fetching a reference configuration.
///
/// All of them leave the previously applied configuration in effect.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// HTTP transport or connection error.
    #[error("reference request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("reference request timed out")]
    Timeout,

    /// The response body could not be parsed as the expected JSON shape.
    #[error("failed to parse reference response: {0}")]
    Parse(String),

    /// The response parsed but violates an invariant (degenerate ranges).
    #[error("reference response rejected: {0}")]
    Invalid(String),
}

impl From<reqwest::Error> for ReferenceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ReferenceError::Timeout
        } else {
            ReferenceError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ReferenceConfig
// ---------------------------------------------------------------------------

/// One speaker class's calibration payload: the vowel overlay plus the axis
/// configuration to display it in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceConfig {
    /// Canonical (F1, F2) positions for the class's vowels.
    pub vowel_references: Vec<VowelReference>,
    /// Axis ranges and orientation for the class.
    pub plot_config: PlotConfig,
}

impl ReferenceConfig {
    /// Reject configurations the plot cannot map.
    pub fn validate(&self) -> Result<(), ReferenceError> {
        self.plot_config
            .validate()
            .map_err(|e| ReferenceError::Invalid(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ReferenceSource trait
// ---------------------------------------------------------------------------

/// Async seam for reference-configuration lookup.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn ReferenceSource>` between the controller and its fetch tasks.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    /// Fetch the reference set and plot configuration for one speaker class.
    async fn fetch(&self, speaker: SpeakerType) -> Result<ReferenceConfig, ReferenceError>;
}

// ---------------------------------------------------------------------------
// HttpReferenceSource
// ---------------------------------------------------------------------------

/// Fetches reference configurations over HTTP from the estimation backend.
///
/// All connection details (`base_url`, timeout) come from [`BackendConfig`];
/// nothing is hardcoded.
pub struct HttpReferenceSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReferenceSource {
    /// Build a reference source from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.request_timeout_secs`.  A default (no-timeout) client is used
    /// as a last-resort fallback if the builder fails.
    pub fn from_config(config: &BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.http_base_url.clone(),
        }
    }
}

#[async_trait]
impl ReferenceSource for HttpReferenceSource {
    async fn fetch(&self, speaker: SpeakerType) -> Result<ReferenceConfig, ReferenceError> {
        let url = format!("{}/api/audio/formant-references", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("speaker_type", speaker.as_str())])
            .send()
            .await?;

        let config: ReferenceConfig = response
            .json()
            .await
            .map_err(|e| ReferenceError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
