//! facelabel-core — Debounced "real" / "not real" face labels.
//!
//! Detection and landmark inference belong to an external model; this crate
//! decides which label each detected face shows and lays out the overlay.

pub mod debouncer;
pub mod overlay;
pub mod random;
pub mod types;

pub use debouncer::{Cooldown, Policy, StatusDebouncer};
pub use overlay::{compose, compose_frame, DrawCommand, OverlayFrame};
pub use random::{RandomSource, ScriptedRandom, StdRandom};
pub use types::{BoundingBox, FaceRecord, Status};
