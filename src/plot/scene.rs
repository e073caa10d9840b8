//! Deterministic scene builder for the formant chart.
//!
//! [`PlotScene::build`] is a pure function of its inputs: the current live
//! estimate (if any), the active reference set and the axis configuration.
//! It produces an ordered list of [`DrawOp`]s — back to front, each frame a
//! full replace:
//!
//! 1. clear
//! 2. axis lines
//! 3. axis labels
//! 4. reference-vowel markers + labels
//! 5. the live point, last, so it is never occluded
//!
//! The ops carry geometry only; colors and fonts belong to the painting
//! layer.  Identical inputs produce `==`-identical scenes, which is what
//! makes the externally scheduled per-tick redraw idempotent.

use crate::types::{FormantPoint, PlotConfig, VowelReference};

use super::mapping::{AxisMapper, PlotRect};

/// Pixels reserved on all sides for axis lines and labels.
pub const PLOT_MARGIN: f32 = 40.0;

/// Radius of a reference-vowel marker.
pub const REFERENCE_RADIUS: f32 = 4.0;

/// Radius of the live estimate marker.
pub const LIVE_RADIUS: f32 = 6.0;

/// Vertical offset of a vowel symbol above its reference marker.
const REFERENCE_LABEL_OFFSET: f32 = 15.0;

// ---------------------------------------------------------------------------
// DrawOp
// ---------------------------------------------------------------------------

/// One drawing instruction, in scene-local pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Erase the whole canvas.
    Clear,
    /// One axis line segment.
    AxisLine { from: (f32, f32), to: (f32, f32) },
    /// An axis title; `rotated` means drawn bottom-up along the vertical axis.
    AxisLabel {
        text: String,
        at: (f32, f32),
        rotated: bool,
    },
    /// A reference-vowel dot.
    ReferenceMarker { x: f32, y: f32, radius: f32 },
    /// The vowel symbol above its dot.
    ReferenceLabel { text: String, at: (f32, f32) },
    /// The current live estimate, always the topmost op.
    LivePoint { x: f32, y: f32, radius: f32 },
}

// ---------------------------------------------------------------------------
// PlotScene
// ---------------------------------------------------------------------------

/// An ordered, ready-to-paint description of one chart frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotScene {
    /// Canvas size the ops were laid out for.
    pub size: (f32, f32),
    /// Draw instructions, back to front.
    pub ops: Vec<DrawOp>,
}

impl PlotScene {
    /// Lay out one frame.
    ///
    /// With `point == None` only the axes and references are drawn.
    ///
    /// # Panics
    ///
    /// Panics on a degenerate `config` (see [`AxisMapper::new`]).
    pub fn build(
        size: (f32, f32),
        point: Option<&FormantPoint>,
        references: &[VowelReference],
        config: &PlotConfig,
    ) -> Self {
        let rect = PlotRect::with_margin(size, PLOT_MARGIN);
        let mapper = AxisMapper::new(config, rect);
        let (width, height) = size;

        let mut ops = Vec::with_capacity(5 + 2 * references.len() + 1);
        ops.push(DrawOp::Clear);

        // Vertical axis (F1).
        ops.push(DrawOp::AxisLine {
            from: (rect.left, rect.top),
            to: (rect.left, rect.bottom()),
        });
        // Horizontal axis (F2).
        ops.push(DrawOp::AxisLine {
            from: (rect.left, rect.bottom()),
            to: (rect.right(), rect.bottom()),
        });

        ops.push(DrawOp::AxisLabel {
            text: "F2 (Hz)".into(),
            at: (width / 2.0, height - 10.0),
            rotated: false,
        });
        ops.push(DrawOp::AxisLabel {
            text: "F1 (Hz)".into(),
            at: (15.0, height / 2.0),
            rotated: true,
        });

        for reference in references {
            let x = mapper.f2_to_x(reference.f2);
            let y = mapper.f1_to_y(reference.f1);
            ops.push(DrawOp::ReferenceMarker {
                x,
                y,
                radius: REFERENCE_RADIUS,
            });
            ops.push(DrawOp::ReferenceLabel {
                text: reference.vowel.clone(),
                at: (x, y - REFERENCE_LABEL_OFFSET),
            });
        }

        if let Some(point) = point {
            ops.push(DrawOp::LivePoint {
                x: mapper.f2_to_x(point.f2),
                y: mapper.f1_to_y(point.f1),
                radius: LIVE_RADIUS,
            });
        }

        Self { size, ops }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FormantPoint;

    const SIZE: (f32, f32) = (600.0, 400.0);

    fn references() -> Vec<VowelReference> {
        vec![
            VowelReference {
                vowel: "i".into(),
                f1: 270.0,
                f2: 2290.0,
            },
            VowelReference {
                vowel: "ɑ".into(),
                f1: 730.0,
                f2: 1090.0,
            },
        ]
    }

    fn config() -> PlotConfig {
        PlotConfig {
            f1_range: (200.0, 800.0),
            f2_range: (600.0, 3000.0),
            invert_axes: true,
        }
    }

    // ---- Idempotence -------------------------------------------------------

    #[test]
    fn identical_inputs_build_identical_scenes() {
        let point = FormantPoint::now(512.0, 1845.0);
        let refs = references();
        let cfg = config();

        let a = PlotScene::build(SIZE, Some(&point), &refs, &cfg);
        let b = PlotScene::build(SIZE, Some(&point), &refs, &cfg);
        assert_eq!(a, b);
    }

    // ---- Drawing order -----------------------------------------------------

    #[test]
    fn clear_is_first_live_point_is_last() {
        let point = FormantPoint::now(512.0, 1845.0);
        let scene = PlotScene::build(SIZE, Some(&point), &references(), &config());

        assert_eq!(scene.ops.first(), Some(&DrawOp::Clear));
        assert!(matches!(scene.ops.last(), Some(DrawOp::LivePoint { .. })));
    }

    #[test]
    fn references_drawn_before_live_point() {
        let point = FormantPoint::now(512.0, 1845.0);
        let scene = PlotScene::build(SIZE, Some(&point), &references(), &config());

        let last_reference = scene
            .ops
            .iter()
            .rposition(|op| matches!(op, DrawOp::ReferenceMarker { .. }))
            .unwrap();
        let live = scene
            .ops
            .iter()
            .position(|op| matches!(op, DrawOp::LivePoint { .. }))
            .unwrap();
        assert!(last_reference < live);
    }

    // ---- Content -----------------------------------------------------------

    #[test]
    fn no_point_means_no_live_marker() {
        let scene = PlotScene::build(SIZE, None, &references(), &config());
        assert!(!scene
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::LivePoint { .. })));
        // Axes and references are still drawn.
        assert_eq!(
            scene
                .ops
                .iter()
                .filter(|op| matches!(op, DrawOp::AxisLine { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn one_marker_and_label_per_reference() {
        let refs = references();
        let scene = PlotScene::build(SIZE, None, &refs, &config());

        let markers = scene
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::ReferenceMarker { .. }))
            .count();
        let labels: Vec<&DrawOp> = scene
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::ReferenceLabel { .. }))
            .collect();

        assert_eq!(markers, refs.len());
        assert_eq!(labels.len(), refs.len());
        assert!(matches!(
            labels[0],
            DrawOp::ReferenceLabel { text, .. } if text == "i"
        ));
    }

    #[test]
    fn empty_reference_set_still_renders_axes() {
        let scene = PlotScene::build(SIZE, None, &[], &config());
        assert_eq!(scene.ops.first(), Some(&DrawOp::Clear));
        assert!(scene
            .ops
            .iter()
            .any(|op| matches!(op, DrawOp::AxisLabel { rotated: true, .. })));
    }

    #[test]
    fn vowel_label_sits_above_its_marker() {
        let refs = vec![VowelReference {
            vowel: "u".into(),
            f1: 300.0,
            f2: 870.0,
        }];
        let scene = PlotScene::build(SIZE, None, &refs, &config());

        let marker = scene.ops.iter().find_map(|op| match op {
            DrawOp::ReferenceMarker { x, y, .. } => Some((*x, *y)),
            _ => None,
        });
        let label = scene.ops.iter().find_map(|op| match op {
            DrawOp::ReferenceLabel { at, .. } => Some(*at),
            _ => None,
        });

        let (mx, my) = marker.unwrap();
        let (lx, ly) = label.unwrap();
        assert_eq!(mx, lx);
        assert!((my - ly - 15.0).abs() < 1e-6);
    }
}
