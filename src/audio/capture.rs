//! Microphone capture via `cpal`.
//!
//! [`AudioCapture`] wraps the cpal host/device/stream lifecycle.  The input
//! callback — cpal's real-time audio thread — downmixes to mono, runs the
//! [`FrameDownsampler`] and forwards finished [`AudioChunk`]s over an mpsc
//! channel.  That channel is the only way audio data leaves the real-time
//! context: no shared buffers, no locks.
//!
//! [`CaptureSource`] is the seam the session controller records through.
//! The production implementation, [`CpalSource`], keeps the `!Send`
//! `cpal::Stream` on a dedicated thread parked behind a stop channel, so the
//! returned [`RecordingHandle`] is `Send` and dropping it is a deterministic
//! join that releases the device.

use std::sync::mpsc;
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use super::downsample::{stereo_to_mono, AudioChunk, DownsamplerConfig, FrameDownsampler};

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while setting up or running the audio capture.
///
/// An OS-level microphone permission refusal surfaces through cpal as a
/// build or play failure; all variants are non-fatal to the application —
/// the session simply never leaves Idle.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("capture thread terminated before reporting readiness")]
    WorkerDied,
}

// ---------------------------------------------------------------------------
// StreamHandle
// ---------------------------------------------------------------------------

/// RAII guard that keeps the cpal stream alive.
///
/// Dropping this value stops the underlying hardware stream.
pub struct StreamHandle {
    _stream: cpal::Stream,
}

// ---------------------------------------------------------------------------
// AudioCapture
// ---------------------------------------------------------------------------

/// Microphone capture device wrapper built on top of `cpal`.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::mpsc;
/// use vowelscope::audio::{AudioCapture, AudioChunk, DownsamplerConfig};
///
/// let (tx, rx) = mpsc::channel::<AudioChunk>();
/// let capture = AudioCapture::new().unwrap();
/// let _handle = capture.start(DownsamplerConfig::default(), tx).unwrap();
/// // `_handle` keeps the stream alive; drop it to stop recording.
/// ```
pub struct AudioCapture {
    device: cpal::Device,
    config: cpal::StreamConfig,
    /// Native sample rate reported by the device (Hz).
    sample_rate: u32,
    /// Number of interleaved channels reported by the device.
    channels: u16,
}

impl AudioCapture {
    /// Create a new [`AudioCapture`] using the system default input device.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoDevice`] when no input device is available,
    /// or [`CaptureError::DefaultConfig`] when the device cannot report a
    /// default stream configuration.
    pub fn new() -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;

        let channels = supported.channels();
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        Ok(Self {
            device,
            config,
            sample_rate,
            channels,
        })
    }

    /// Start recording; finished chunks are sent to `tx`.
    ///
    /// The cpal callback downmixes each hardware buffer to mono and feeds
    /// the downsampler; whole chunks go out over the channel.  Send errors
    /// (receiver dropped mid-teardown) are ignored so the audio thread never
    /// panics.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::BuildStream`] or [`CaptureError::PlayStream`]
    /// if the platform rejects the stream configuration.
    pub fn start(
        &self,
        config: DownsamplerConfig,
        tx: mpsc::Sender<AudioChunk>,
    ) -> Result<StreamHandle, CaptureError> {
        let channels = self.channels;
        let mut downsampler = FrameDownsampler::new(config);

        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mono = stereo_to_mono(data, channels);
                for chunk in downsampler.push_block(&mono) {
                    let _ = tx.send(chunk);
                }
            },
            |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
            },
            None, // no timeout
        )?;

        stream.play()?;
        Ok(StreamHandle { _stream: stream })
    }

    /// Native sample rate of the capture stream in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels delivered by the device.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

// ---------------------------------------------------------------------------
// RecordingHandle
// ---------------------------------------------------------------------------

/// `Send` guard for one live capture pipeline.
///
/// Dropping the handle signals the capture thread to stop and **joins it**,
/// so by the time the drop returns the device is released and the chunk
/// sender is gone.  Re-recording always builds a fresh pipeline; handles are
/// never reused.
pub struct RecordingHandle {
    stop_tx: mpsc::Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RecordingHandle {
    /// Wrap a capture thread parked on the receiving end of `stop_tx`.
    pub fn new(stop_tx: mpsc::Sender<()>, thread: thread::JoinHandle<()>) -> Self {
        Self {
            stop_tx,
            thread: Some(thread),
        }
    }
}

impl Drop for RecordingHandle {
    fn drop(&mut self) {
        // The thread may already be gone (capture error path); both the send
        // and the join tolerate that.
        let _ = self.stop_tx.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureSource
// ---------------------------------------------------------------------------

/// Seam between the session controller and the microphone.
///
/// Implementors must be `Send + Sync` so the controller can hold them as
/// `Arc<dyn CaptureSource>` and open pipelines from a blocking task.
pub trait CaptureSource: Send + Sync {
    /// Open a fresh capture pipeline that emits chunks into `tx`.
    ///
    /// Blocks until the pipeline is live (or has failed); intended to be
    /// called via `tokio::task::spawn_blocking`.
    fn open(
        &self,
        config: DownsamplerConfig,
        tx: mpsc::Sender<AudioChunk>,
    ) -> Result<RecordingHandle, CaptureError>;
}

/// Production [`CaptureSource`] backed by the default cpal input device.
///
/// `cpal::Stream` is not `Send` on all platforms, so each `open` spawns a
/// named "mic-capture" thread that owns the stream for the lifetime of the
/// recording and parks on the stop channel.
pub struct CpalSource;

impl CaptureSource for CpalSource {
    fn open(
        &self,
        config: DownsamplerConfig,
        tx: mpsc::Sender<AudioChunk>,
    ) -> Result<RecordingHandle, CaptureError> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(u32, u16), CaptureError>>();

        let thread = thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || {
                let capture = match AudioCapture::new() {
                    Ok(capture) => capture,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let info = (capture.sample_rate(), capture.channels());
                let handle = match capture.start(config, tx) {
                    Ok(handle) => handle,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let _ = ready_tx.send(Ok(info));

                // Park until the RecordingHandle is dropped, then release
                // the stream (and with it the chunk sender).
                let _ = stop_rx.recv();
                drop(handle);
            })
            .expect("failed to spawn mic-capture thread");

        match ready_rx.recv() {
            Ok(Ok((sample_rate, channels))) => {
                log::info!("audio capture started ({sample_rate} Hz, {channels} ch)");
                Ok(RecordingHandle::new(stop_tx, thread))
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(CaptureError::WorkerDied)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MockCaptureSource (test double)
// ---------------------------------------------------------------------------

#[cfg(test)]
pub use mock::MockCaptureSource;


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
