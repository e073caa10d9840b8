//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::audio::DownsamplerConfig;
use crate::types::SpeakerType;

use super::AppPaths;

// ---------------------------------------------------------------------------
// BackendConfig
// ---------------------------------------------------------------------------

/// Connection details for the formant-estimation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// WebSocket endpoint for the streaming channel.
    pub ws_url: String,
    /// Base URL for request/response calls (reference-config fetch).
    pub http_base_url: String,
    /// Maximum seconds to wait for a reference-config response.
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:5001/ws/formants".into(),
            http_base_url: "http://localhost:5001".into(),
            request_timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance and behaviour settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels.  `None` means
    /// let the OS / window manager pick a position on first launch.
    pub window_position: Option<(f32, f32)>,
    /// Keep the window floating above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use vowelscope::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Speaker class selected on startup.
    pub speaker: SpeakerType,
    /// Backend connection details.
    pub backend: BackendConfig,
    /// Rate-reduction factors for the frame downsampler.
    pub downsampler: DownsamplerConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            speaker: SpeakerType::default(),
            backend: BackendConfig::default(),
            downsampler: DownsamplerConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
