//! Session orchestration — the lifecycle state machine and shared state.
//!
//! The controller is the seam the presentational layer attaches to: it
//! accepts [`ControlCommand`]s and exposes read-only observables through
//! [`SharedState`].

pub mod controller;
pub mod state;

pub use controller::{ControlCommand, SessionController};
pub use state::{new_shared_state, AppState, SessionState, SharedState};
