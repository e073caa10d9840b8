//! Wire message types for the formant streaming channel.
//!
//! All frames are JSON text tagged by a `type` field.
//!
//! ## Message Format
//! - **Client → Server**: `audio_chunk` — one downsampled chunk plus the
//!   selected speaker type.
//! - **Server → Client**: `formant_data` (one estimate), `connection_status`
//!   and `error` (informational).
//!
//! Inbound parsing is tolerant by design: unknown message types and frames
//! missing required fields are dropped with a debug log, never surfaced as
//! failures.  Extra fields on known messages are ignored.

use serde::{Deserialize, Serialize};

use crate::types::SpeakerType;

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Frames sent from the client to the estimation backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// One downsampled audio chunk, fire-and-forget.
    AudioChunk {
        /// Rounded mono samples in `[-1.0, 1.0]`.
        audio_data: Vec<f32>,
        /// Speaker class the backend should calibrate against.
        speaker_type: SpeakerType,
    },
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Frames pushed by the estimation backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// One vowel-formant estimate.  Both fields are required; a frame
    /// missing either never parses and is dropped upstream.
    FormantData { f1: f64, f2: f64 },

    /// Connection housekeeping pushed on connect.
    ConnectionStatus { status: String },

    /// A processing error the backend chose to report.  Informational only.
    Error { message: String },
}

/// Parse one inbound text frame, dropping anything malformed.
///
/// Returns `None` (with a debug log) for frames that are not valid JSON, use
/// an unknown `type` tag, or are missing required fields — per the contract
/// that a malformed server payload degrades the plot but never the session.
pub fn parse_server_message(text: &str) -> Option<ServerMessage> {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(msg) => Some(msg),
        Err(e) => {
            log::debug!("dropping malformed server frame: {e}");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
