//! Audio pipeline — microphone capture → downmix → frame downsampling.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → stereo_to_mono → FrameDownsampler
//!           → AudioChunk (mpsc) → forwarder thread → streaming client
//! ```
//!
//! The downsampler runs inside the cpal callback (the real-time audio
//! context); completed chunks leave it over a one-way mpsc channel.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::mpsc;
//! use vowelscope::audio::{AudioCapture, AudioChunk, DownsamplerConfig};
//!
//! let (tx, rx) = mpsc::channel::<AudioChunk>();
//! let capture = AudioCapture::new().unwrap();
//! let _handle = capture.start(DownsamplerConfig::default(), tx).unwrap();
//!
//! while let Ok(chunk) = rx.recv() {
//!     println!("chunk of {} samples ready to send", chunk.samples.len());
//! }
//! ```

pub mod capture;
pub mod downsample;

pub use capture::{AudioCapture, CaptureError, CaptureSource, CpalSource, RecordingHandle, StreamHandle};
pub use downsample::{stereo_to_mono, AudioChunk, DownsamplerConfig, FrameDownsampler};

// test-only re-export so controller tests can import the mock without the
// full `crate::audio::capture::MockCaptureSource` path.
#[cfg(test)]
pub use capture::MockCaptureSource;
