//! Affine mapping from formant-frequency space to plot pixels.
//!
//! F1 maps to the **vertical** axis and F2 to the **horizontal** axis — the
//! crossed articulatory convention (vowel height ~ F1, backness ~ F2).  Per
//! axis, a value `v` in `[min, max]` normalises to `(v - min) / (max - min)`
//! — or `(max - v) / (max - min)` when the axes are inverted — and then
//! scales linearly into the plot's interior rectangle.

use crate::types::PlotConfig;

// ---------------------------------------------------------------------------
// PlotRect
// ---------------------------------------------------------------------------

/// The interior rectangle frequencies map into, in pixels.
///
/// The margin around it is reserved for axis lines and labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PlotRect {
    /// Interior rectangle of a `(width, height)` canvas with `margin` pixels
    /// reserved on all sides.
    pub fn with_margin(size: (f32, f32), margin: f32) -> Self {
        Self {
            left: margin,
            top: margin,
            width: size.0 - 2.0 * margin,
            height: size.1 - 2.0 * margin,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

// ---------------------------------------------------------------------------
// AxisMapper
// ---------------------------------------------------------------------------

/// Precomputed frequency→pixel mapping for one plot configuration.
pub struct AxisMapper {
    f1_range: (f64, f64),
    f2_range: (f64, f64),
    invert: bool,
    rect: PlotRect,
}

impl AxisMapper {
    /// Build a mapper for `config` targeting `rect`.
    ///
    /// # Panics
    ///
    /// Panics on degenerate ranges (`min >= max`) — callers are required to
    /// validate configurations before they reach the plot, so this fails
    /// fast rather than silently dividing by zero.
    pub fn new(config: &PlotConfig, rect: PlotRect) -> Self {
        config
            .validate()
            .expect("plot config must have non-degenerate ranges");

        Self {
            f1_range: config.f1_range,
            f2_range: config.f2_range,
            invert: config.invert_axes,
            rect,
        }
    }

    /// Vertical pixel position for an F1 frequency.
    pub fn f1_to_y(&self, f1: f64) -> f32 {
        let normalized = self.normalize(f1, self.f1_range);
        self.rect.top + normalized * self.rect.height
    }

    /// Horizontal pixel position for an F2 frequency.
    pub fn f2_to_x(&self, f2: f64) -> f32 {
        let normalized = self.normalize(f2, self.f2_range);
        self.rect.left + normalized * self.rect.width
    }

    fn normalize(&self, v: f64, (min, max): (f64, f64)) -> f32 {
        let normalized = if self.invert {
            (max - v) / (max - min)
        } else {
            (v - min) / (max - min)
        };
        normalized as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
