//! Rendering: declarative scene building plus Canvas 2D drawing
//!
//! The sim never draws. Each frame the driver builds a [`scene::Scene`]
//! from the game state (pure, testable) and hands it to the canvas backend.

pub mod scene;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

pub use scene::{Scene, build_scene};
