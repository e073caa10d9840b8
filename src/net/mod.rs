//! Network tier — the streaming channel and the reference-config fetch.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                    Transport (trait)                   │
//! │                                                        │
//! │   StreamingClient ── tokio task ── ws://… backend      │
//! │     · audio_chunk out (fire-and-forget)                │
//! │     · formant_data in → TransportEvent::Formant        │
//! │     · auto-reconnect, owns ConnectionState             │
//! └────────────────────────────────────────────────────────┘
//! ┌────────────────────────────────────────────────────────┐
//! │                 ReferenceSource (trait)                │
//! │                                                        │
//! │   HttpReferenceSource ── GET /api/audio/formant-       │
//! │     references?speaker_type=… → ReferenceConfig        │
//! └────────────────────────────────────────────────────────┘
//! ```

pub mod client;
pub mod protocol;
pub mod reference;

pub use client::{ConnectionState, StreamingClient, Transport, TransportEvent};
pub use protocol::{parse_server_message, ClientMessage, ServerMessage};
pub use reference::{HttpReferenceSource, ReferenceConfig, ReferenceError, ReferenceSource};

// test-only re-export for the controller test module.
#[cfg(test)]
pub use client::MockTransport;
