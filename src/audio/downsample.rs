//! Channel downmixing and the frame downsampler.
//!
//! The formant backend wants small, low-rate chunks rather than the raw
//! device stream, so the capture callback runs its samples through two rate
//! reductions before anything touches the network:
//!
//! 1. **frame skipping** — only every Nth input block is processed at all;
//! 2. **sample decimation** — within a processed block, only every Mth
//!    sample is kept.
//!
//! Kept samples accumulate in a fixed-capacity buffer; each time the buffer
//! fills it is flushed as one [`AudioChunk`] of exactly
//! [`DownsamplerConfig::buffer_size`] samples, rounded to a fixed decimal
//! precision to bound payload size.
//!
//! # Example
//!
//! ```rust
//! use vowelscope::audio::{DownsamplerConfig, FrameDownsampler};
//!
//! let config = DownsamplerConfig {
//!     buffer_size: 8,
//!     frame_skip: 1,  // process every block
//!     decimation: 1,  // keep every sample
//!     round_decimals: 6,
//! };
//! let mut ds = FrameDownsampler::new(config);
//!
//! // 8 samples fill the buffer; the chunk is emitted on the 9th.
//! assert!(ds.push_block(&[0.1; 8]).is_empty());
//! let chunks = ds.push_block(&[0.2; 8]);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].samples.len(), 8);
//! ```

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AudioChunk
// ---------------------------------------------------------------------------

/// One fixed-length, rate-reduced chunk of mono audio ready for
/// transmission.
///
/// Samples are `f32` amplitudes in `[-1.0, 1.0]`, already rounded to the
/// configured decimal precision.  Chunks are ephemeral: produced by the
/// downsampler, consumed by the transport, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Exactly `buffer_size` rounded mono samples.
    pub samples: Vec<f32>,
}

// ---------------------------------------------------------------------------
// DownsamplerConfig
// ---------------------------------------------------------------------------

/// Tunable rate-reduction factors.
///
/// The defaults keep roughly 1 sample in 20 (every 4th sample of every 5th
/// block), which the estimation backend sustains at interactive latency.
/// None of these values are protocol-visible — the backend only ever sees
/// finished chunks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DownsamplerConfig {
    /// Accumulation-buffer capacity; also the exact emitted chunk length.
    pub buffer_size: usize,
    /// Process only every Nth non-empty input block.
    pub frame_skip: u32,
    /// Within a processed block, keep only every Mth sample.
    pub decimation: usize,
    /// Decimal places kept per sample at emission time.
    pub round_decimals: u32,
}

impl Default for DownsamplerConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            frame_skip: 5,
            decimation: 4,
            round_decimals: 6,
        }
    }
}

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all
/// channels.
///
/// The output length is `samples.len() / channels`.
///
/// * If `channels == 1` the input slice is returned as an owned `Vec` with
///   no averaging (fast path).
/// * If `channels == 0` an empty vector is returned.
///
/// # Example
///
/// ```rust
/// use vowelscope::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, -0.2]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// assert!((mono[1] - 0.0).abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// FrameDownsampler
// ---------------------------------------------------------------------------

/// Stateful rate reducer run inside the audio callback.
///
/// Holds no cross-chunk state beyond the accumulation buffer and the two
/// counters.  The only output channel is the return value of
/// [`push_block`](Self::push_block) — the caller forwards emitted chunks to
/// the transport.
pub struct FrameDownsampler {
    config: DownsamplerConfig,
    buffer: Vec<f32>,
    /// Next write position within `buffer`.
    index: usize,
    /// Blocks seen since the last processed one.
    skip_count: u32,
}

impl FrameDownsampler {
    /// Create a downsampler with the given factors.
    ///
    /// # Panics
    ///
    /// Panics if `buffer_size`, `frame_skip` or `decimation` is zero.
    pub fn new(config: DownsamplerConfig) -> Self {
        assert!(config.buffer_size > 0, "buffer_size must be > 0");
        assert!(config.frame_skip > 0, "frame_skip must be > 0");
        assert!(config.decimation > 0, "decimation must be > 0");
        Self {
            buffer: vec![0.0; config.buffer_size],
            config,
            index: 0,
            skip_count: 0,
        }
    }

    /// Feed one block of mono samples; returns any chunks completed by it.
    ///
    /// An empty block means no input was available this cycle (device
    /// warm-up) — a recoverable condition: nothing is emitted and the
    /// frame-skip counter does not advance.
    ///
    /// A flush happens *before* the write that would overflow the buffer, so
    /// every emitted chunk has exactly `buffer_size` samples.
    pub fn push_block(&mut self, block: &[f32]) -> Vec<AudioChunk> {
        if block.is_empty() {
            return Vec::new();
        }

        self.skip_count += 1;
        if self.skip_count < self.config.frame_skip {
            return Vec::new();
        }
        self.skip_count = 0;

        let mut out = Vec::new();
        for &sample in block.iter().step_by(self.config.decimation) {
            if self.index >= self.config.buffer_size {
                out.push(self.flush());
            }
            self.buffer[self.index] = sample;
            self.index += 1;
        }
        out
    }

    /// Discard buffered samples and reset both counters.
    ///
    /// Called on session teardown: partial trailing data is dropped, never
    /// emitted as a short chunk.
    pub fn reset(&mut self) {
        self.index = 0;
        self.skip_count = 0;
    }

    /// Number of samples currently accumulated (always `< buffer_size + 1`).
    pub fn pending(&self) -> usize {
        self.index
    }

    fn flush(&mut self) -> AudioChunk {
        let decimals = self.config.round_decimals;
        let samples = self.buffer[..self.index]
            .iter()
            .map(|&s| round_sample(s, decimals))
            .collect();
        self.index = 0;
        AudioChunk { samples }
    }
}

/// Round one sample to `decimals` decimal places.
fn round_sample(sample: f32, decimals: u32) -> f32 {
    let factor = 10_f32.powi(decimals as i32);
    (sample * factor).round() / factor
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn no_skip(buffer_size: usize) -> DownsamplerConfig {
        DownsamplerConfig {
            buffer_size,
            frame_skip: 1,
            decimation: 1,
            round_decimals: 6,
        }
    }

    // ---- stereo_to_mono ----------------------------------------------------

    #[test]
    fn stereo_to_mono_already_mono() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(stereo_to_mono(&input, 1), input);
    }

    #[test]
    fn stereo_to_mono_two_channel() {
        let input = vec![1.0_f32, -1.0, 0.5, 0.5];
        let out = stereo_to_mono(&input, 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stereo_to_mono_zero_channels() {
        assert!(stereo_to_mono(&[1.0_f32, 2.0], 0).is_empty());
    }

    // ---- Chunk length exactness --------------------------------------------

    #[test]
    fn emitted_chunks_have_exact_buffer_length() {
        let mut ds = FrameDownsampler::new(no_skip(16));

        let mut emitted = Vec::new();
        // 7-sample blocks never align with the 16-sample buffer; flushes
        // must still always produce exactly 16 samples.
        for _ in 0..40 {
            emitted.extend(ds.push_block(&[0.25; 7]));
        }

        assert!(!emitted.is_empty());
        for chunk in &emitted {
            assert_eq!(chunk.samples.len(), 16);
        }
    }

    #[test]
    fn chunk_emitted_on_overflowing_write_not_on_fill() {
        let mut ds = FrameDownsampler::new(no_skip(4));

        // Exactly fills the buffer — no flush yet.
        assert!(ds.push_block(&[0.1; 4]).is_empty());
        assert_eq!(ds.pending(), 4);

        // The next sample triggers the flush first.
        let chunks = ds.push_block(&[0.9]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].samples, vec![0.1; 4]);
        assert_eq!(ds.pending(), 1);
    }

    #[test]
    fn large_block_can_emit_multiple_chunks() {
        let mut ds = FrameDownsampler::new(no_skip(4));

        // Prime with one sample so each 4-sample boundary lands mid-block.
        assert!(ds.push_block(&[0.5]).is_empty());
        let chunks = ds.push_block(&vec![0.5; 9]);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert_eq!(chunk.samples.len(), 4);
        }
    }

    // ---- Frame skipping ----------------------------------------------------

    #[test]
    fn only_every_nth_block_is_processed() {
        let config = DownsamplerConfig {
            buffer_size: 4,
            frame_skip: 5,
            decimation: 1,
            round_decimals: 6,
        };
        let mut ds = FrameDownsampler::new(config);

        // Blocks 1-4 are skipped entirely.
        for _ in 0..4 {
            assert!(ds.push_block(&[0.3; 4]).is_empty());
            assert_eq!(ds.pending(), 0);
        }
        // Block 5 is processed and fills the buffer.
        assert!(ds.push_block(&[0.3; 4]).is_empty());
        assert_eq!(ds.pending(), 4);
    }

    #[test]
    fn empty_block_does_not_advance_skip_counter() {
        let config = DownsamplerConfig {
            buffer_size: 4,
            frame_skip: 2,
            decimation: 1,
            round_decimals: 6,
        };
        let mut ds = FrameDownsampler::new(config);

        assert!(ds.push_block(&[0.1; 2]).is_empty()); // skipped (1 of 2)
        assert!(ds.push_block(&[]).is_empty()); // warm-up gap, no effect
        assert!(ds.push_block(&[0.1; 2]).is_empty()); // processed (2 of 2)
        assert_eq!(ds.pending(), 2);
    }

    // ---- Decimation --------------------------------------------------------

    #[test]
    fn decimation_keeps_every_mth_sample() {
        let config = DownsamplerConfig {
            buffer_size: 3,
            frame_skip: 1,
            decimation: 4,
            round_decimals: 6,
        };
        let mut ds = FrameDownsampler::new(config);

        // Samples at indices 0, 4, 8 are kept.
        let block: Vec<f32> = (0..12).map(|i| i as f32 / 100.0).collect();
        assert!(ds.push_block(&block).is_empty());
        assert_eq!(ds.pending(), 3);

        let chunks = ds.push_block(&[0.99]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].samples, vec![0.0, 0.04, 0.08]);
    }

    // ---- Rounding ----------------------------------------------------------

    #[test]
    fn samples_rounded_at_emission() {
        let config = DownsamplerConfig {
            buffer_size: 1,
            frame_skip: 1,
            decimation: 1,
            round_decimals: 6,
        };
        let mut ds = FrameDownsampler::new(config);

        assert!(ds.push_block(&[0.123_456_789]).is_empty());
        let chunks = ds.push_block(&[0.0]);
        assert_eq!(chunks.len(), 1);
        assert!((chunks[0].samples[0] - 0.123_457).abs() < 1e-7);
    }

    // ---- Reset / trailing data ---------------------------------------------

    #[test]
    fn reset_drops_partial_trailing_data() {
        let mut ds = FrameDownsampler::new(no_skip(8));

        assert!(ds.push_block(&[0.4; 5]).is_empty());
        assert_eq!(ds.pending(), 5);

        ds.reset();
        assert_eq!(ds.pending(), 0);

        // Nothing from the discarded partial fill resurfaces afterwards.
        assert!(ds.push_block(&[0.7; 8]).is_empty());
        let chunks = ds.push_block(&[0.7]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].samples, vec![0.7; 8]);
    }

    // ---- Panic guards ------------------------------------------------------

    #[test]
    #[should_panic(expected = "buffer_size must be > 0")]
    fn zero_buffer_size_panics() {
        let _ = FrameDownsampler::new(DownsamplerConfig {
            buffer_size: 0,
            ..DownsamplerConfig::default()
        });
    }

    #[test]
    #[should_panic(expected = "decimation must be > 0")]
    fn zero_decimation_panics() {
        let _ = FrameDownsampler::new(DownsamplerConfig {
            decimation: 0,
            ..DownsamplerConfig::default()
        });
    }
}
