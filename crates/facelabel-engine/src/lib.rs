//! facelabel-engine — Drives a [`StatusDebouncer`](facelabel_core::StatusDebouncer)
//! from a detection stream.
//!
//! Detection runs on a dedicated OS thread behind an async handle; a tokio
//! tick loop awaits one detection per tick, composes the overlay and hands it
//! to a [`Renderer`].

pub mod config;
pub mod engine;
pub mod render;
pub mod scripted;
pub mod ticker;

pub use config::{Config, ConfigError};
pub use engine::{spawn_engine, DetectorError, EngineError, EngineHandle, FaceDetector};
pub use render::{JsonRenderer, Renderer, TextRenderer};
pub use scripted::{ScriptError, ScriptedDetector};
pub use ticker::{TickError, TickStats, Ticker};
