//! Domain types shared across the pipeline: speaker classes, formant
//! estimates, reference vowels and the plot axis configuration.
//!
//! Everything here is plain data.  The wire representations in
//! [`crate::net::protocol`] reuse these types directly where the shapes
//! coincide (serde derives live here for that reason).

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// SpeakerType
// ---------------------------------------------------------------------------

/// Coarse vocal-tract-size class used to select the reference/calibration
/// set.  Absolute formant frequencies scale with vocal tract length, so each
/// class carries its own reference vowels and plot ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeakerType {
    Male,
    Female,
    Child,
}

impl SpeakerType {
    /// All variants, in selector display order.
    pub const ALL: [SpeakerType; 3] = [SpeakerType::Male, SpeakerType::Female, SpeakerType::Child];

    /// Lowercase wire name, as used in the `speaker_type` message field and
    /// the reference-config query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerType::Male => "male",
            SpeakerType::Female => "female",
            SpeakerType::Child => "child",
        }
    }

    /// Human-readable label for the speaker selector.
    pub fn label(&self) -> &'static str {
        match self {
            SpeakerType::Male => "Male",
            SpeakerType::Female => "Female",
            SpeakerType::Child => "Child",
        }
    }
}

impl Default for SpeakerType {
    fn default() -> Self {
        SpeakerType::Male
    }
}

impl std::fmt::Display for SpeakerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FormantPoint
// ---------------------------------------------------------------------------

/// One instantaneous vowel-formant estimate received from the backend.
///
/// Immutable once constructed; each new estimate supersedes the previous one
/// wholesale.  `received_at` is stamped when the estimate arrives and is only
/// used client-side (freshness display) — it is not a wire field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormantPoint {
    /// First formant frequency in Hz.
    pub f1: f64,
    /// Second formant frequency in Hz.
    pub f2: f64,
    /// When this estimate was received.
    pub received_at: Instant,
}

impl FormantPoint {
    /// Construct an estimate stamped with the current time.
    pub fn now(f1: f64, f2: f64) -> Self {
        Self {
            f1,
            f2,
            received_at: Instant::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// VowelReference
// ---------------------------------------------------------------------------

/// A static calibration point for the selected speaker class: the canonical
/// (F1, F2) position of one IPA vowel symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VowelReference {
    /// IPA vowel symbol (e.g. `"i"`, `"ɑ"`, `"ʊ"`).
    pub vowel: String,
    /// Reference first formant in Hz.
    pub f1: f64,
    /// Reference second formant in Hz.
    pub f2: f64,
}

// ---------------------------------------------------------------------------
// PlotConfig
// ---------------------------------------------------------------------------

/// Axis configuration defining the affine mapping from frequency space to
/// plot space.
///
/// Ranges are `(min, max)` tuples serialised as two-element arrays on the
/// wire.  Both ranges must satisfy `min < max`; swapped or equal bounds are
/// a configuration error — see [`PlotConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotConfig {
    /// F1 display range in Hz, mapped to the vertical axis.
    pub f1_range: (f64, f64),
    /// F2 display range in Hz, mapped to the horizontal axis.
    pub f2_range: (f64, f64),
    /// Mirror both axes so low frequencies sit at the top-right, matching
    /// IPA chart convention.
    pub invert_axes: bool,
}

impl Default for PlotConfig {
    /// The male configuration — also what the chart uses before the first
    /// reference fetch completes.
    fn default() -> Self {
        Self {
            f1_range: (200.0, 800.0),
            f2_range: (600.0, 3000.0),
            invert_axes: true,
        }
    }
}

impl PlotConfig {
    /// Check the `min < max` invariant on both ranges.
    ///
    /// Callers must reject configurations that fail this before handing them
    /// to the plot; the axis mapper asserts the same invariant.
    pub fn validate(&self) -> Result<(), PlotConfigError> {
        let (f1_min, f1_max) = self.f1_range;
        if f1_min >= f1_max {
            return Err(PlotConfigError::F1Range(f1_min, f1_max));
        }
        let (f2_min, f2_max) = self.f2_range;
        if f2_min >= f2_max {
            return Err(PlotConfigError::F2Range(f2_min, f2_max));
        }
        Ok(())
    }
}

/// Degenerate plot range errors.
#[derive(Debug, Error)]
pub enum PlotConfigError {
    #[error("f1 range must satisfy min < max (got {0} .. {1})")]
    F1Range(f64, f64),

    #[error("f2 range must satisfy min < max (got {0} .. {1})")]
    F2Range(f64, f64),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
