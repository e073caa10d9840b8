//! Session state machine and shared application state.
//!
//! [`SessionState`] drives the controller's lifecycle.  The UI reads it via
//! [`SharedState`] to decide which controls are enabled.
//!
//! [`AppState`] is the single source of truth for everything the control
//! surface needs: session phase, mirrored connection state, the selected
//! speaker class, the live formant point, the active reference overlay and
//! axis configuration, and any error message.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<AppState>>` — cheap to
//! clone and safe to share across threads.

use std::sync::{Arc, Mutex};

use crate::net::ConnectionState;
use crate::types::{FormantPoint, PlotConfig, SpeakerType, VowelReference};

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// States of the recording session.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──start (connected + mic granted)──▶ Recording
/// Recording ──stop / failure──▶ Idle
/// ```
///
/// `Idle` is both the initial state and the state reached after any stop or
/// failure.  No audio chunk is ever emitted while `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No microphone open; waiting for the user to start.
    Idle,

    /// Microphone is live; the downsampler is feeding the transport.
    Recording,
}

impl SessionState {
    /// Returns `true` while audio is being captured.
    ///
    /// The UI uses this to disable the speaker selector and the start
    /// button.
    ///
    /// ```
    /// use vowelscope::session::SessionState;
    ///
    /// assert!(!SessionState::Idle.is_recording());
    /// assert!(SessionState::Recording.is_recording());
    /// ```
    pub fn is_recording(&self) -> bool {
        matches!(self, SessionState::Recording)
    }

    /// A short human-readable label for the UI status line.
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Recording => "Recording",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

/// Shared application state — the single source of truth for the UI.
///
/// Held behind [`SharedState`] (`Arc<Mutex<AppState>>`).  The session
/// controller mutates it; the egui update loop reads it each frame.
pub struct AppState {
    /// Current phase of the recording session.
    pub session: SessionState,

    /// Mirrored transport connection state.
    ///
    /// Written only in response to transport events — application logic
    /// never sets `Connected` on its own.
    pub connection: ConnectionState,

    /// Selected speaker class; changing it swaps the reference overlay.
    pub speaker: SpeakerType,

    /// Latest formant estimate, or `None` when idle / nothing received yet.
    ///
    /// Each new estimate replaces this wholesale; the plot treats it as
    /// "latest known state" with no correlation to any outgoing chunk.
    pub current_formant: Option<FormantPoint>,

    /// Active reference overlay for the selected speaker class.
    pub references: Vec<VowelReference>,

    /// Active axis configuration.
    pub plot_config: PlotConfig,

    /// Most recent user-visible failure (start refused, mic denied, …).
    pub last_error: Option<String>,
}

impl AppState {
    /// Create a new `AppState` with the given initial speaker class.
    ///
    /// The plot starts with the default (male) ranges and an empty overlay
    /// until the first reference fetch completes.
    pub fn new(speaker: SpeakerType) -> Self {
        Self {
            session: SessionState::Idle,
            connection: ConnectionState::Disconnected,
            speaker,
            current_formant: None,
            references: Vec::new(),
            plot_config: PlotConfig::default(),
            last_error: None,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SpeakerType::default())
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`AppState`].
///
/// Cheap to clone (`Arc` clone).  Lock with `.lock().unwrap()` for a short
/// critical section; do **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<AppState>>;

/// Construct a new [`SharedState`] with the given initial speaker class.
pub fn new_shared_state(speaker: SpeakerType) -> SharedState {
    Arc::new(Mutex::new(AppState::new(speaker)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
