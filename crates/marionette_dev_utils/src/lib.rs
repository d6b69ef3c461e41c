//! Developer utilities for Marionette tests and demo apps.
//!
//! [`HeadlessGraph`] implements [`PlayableGraph`](marionette_animation::PlayableGraph)
//! entirely in memory so playback logic can run without a host engine.

pub mod headless;

pub use headless::{GraphStats, HeadlessGraph};
