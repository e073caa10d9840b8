//! vowelscope — live vowel-formant feedback.
//!
//! Captures microphone audio, reduces it to fixed-size chunks, streams the
//! chunks over a WebSocket to a formant-estimation backend, and plots the
//! returned (F1, F2) estimates against a per-speaker-class reference vowel
//! set on an IPA-style chart.
//!
//! # Data flow
//!
//! ```text
//! microphone ─▶ audio::FrameDownsampler ─▶ net::StreamingClient ─▶ backend
//!                                                    │
//! app (egui) ◀─ session::SharedState ◀─ controller ◀─┘ formant estimates
//! ```
//!
//! Audio flows one direction; estimates flow back independently — there is
//! no correlation between an outgoing chunk and an incoming estimate.  The
//! [`session::SessionController`] owns the lifecycle; the egui layer in
//! [`app`] is only a control surface and render sink.

pub mod app;
pub mod audio;
pub mod config;
pub mod net;
pub mod plot;
pub mod session;
pub mod types;
