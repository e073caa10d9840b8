//! Formant chart — pure geometry, no widget state.
//!
//! The plot is a deterministic function of three inputs: the current live
//! estimate, the active reference set and the axis configuration.
//! [`mapping`] turns frequencies into pixel positions; [`scene`] assembles
//! an ordered draw list the UI layer paints verbatim.  Redraw is triggered
//! externally on every animation tick — there are no timers here.

pub mod mapping;
pub mod scene;

pub use mapping::{AxisMapper, PlotRect};
pub use scene::{DrawOp, PlotScene, LIVE_RADIUS, PLOT_MARGIN, REFERENCE_RADIUS};
