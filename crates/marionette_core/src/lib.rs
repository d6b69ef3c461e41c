//! Marionette Core
//!
//! Foundational types shared by every Marionette crate:
//!
//! - [`errors`]: the [`AnimationError`] taxonomy and [`Result`] alias
//! - [`handle`]: opaque [`NodeHandle`] keys for host graph nodes
//! - [`time`]: [`FrameClock`], the clamped or fixed-step frame delta source

pub mod errors;
pub mod handle;
pub mod time;

pub use errors::{AnimationError, Result};
pub use handle::NodeHandle;
pub use time::{FrameClock, FrameStep};
