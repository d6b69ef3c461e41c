//! Error Types
//!
//! This module defines the error types used throughout Marionette.
//!
//! # Overview
//!
//! The main error type [`AnimationError`] covers the failure modes of clip
//! registration, index resolution and playback requests:
//! - Unknown clips, slots and symbolic names
//! - Rejected registrations (duplicates, missing clip assets)
//! - Playback requests that make no sense for the target clip
//!
//! Per-frame blending has no error path; defensive skips there are logged.
//!
//! # Usage
//!
//! ```rust,ignore
//! use marionette_core::errors::{AnimationError, Result};
//!
//! fn lookup_slot(name: &str) -> Result<usize> {
//!     Err(AnimationError::NotFound(name.to_string()))
//! }
//! ```

use thiserror::Error;

/// The main error type for Marionette.
#[derive(Error, Debug)]
pub enum AnimationError {
    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// No clip is registered under the requested name or slot.
    #[error("Clip not found: {0}")]
    NotFound(String),

    /// Strict registration of a clip name that is already present.
    #[error("Clip already registered: {0}")]
    DuplicateClip(String),

    /// The clip info is unusable (missing clip asset, malformed metadata).
    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// A symbolic name could not be mapped to a slot.
    #[error("Unresolved animation name: {0}")]
    UnresolvedName(String),

    /// A slot index lies outside the known range.
    #[error("Index out of range: {context} (index: {index}, len: {len})")]
    IndexOutOfRange {
        /// Description of what was being accessed
        context: String,
        /// The offending index, signed so addon underflows stay visible
        index: i64,
        /// Size of the valid range
        len: usize,
    },

    /// An addon maps one of its names outside `[0, len)` or onto an
    /// offset already claimed by another name.
    #[error("Addon index out of range for '{name}': {index} (addon size: {len})")]
    AddonRange {
        /// Addon-defined animation name
        name: String,
        /// Offset reported by the addon
        index: i32,
        /// Number of names the addon declares
        len: usize,
    },

    // ========================================================================
    // Playback Errors
    // ========================================================================
    /// Loop playback requested on a clip without a loop flag.
    #[error("Clip '{name}' at slot {slot} is not loopable")]
    NotLoopable {
        /// Clip name
        name: String,
        /// Slot the request resolved to
        slot: usize,
    },

    /// The controller already released its graph.
    #[error("Playback controller is torn down; cannot {0}")]
    TornDown(&'static str),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Clip set manifest could not be parsed.
    #[error("Manifest parse error: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Alias for `Result<T, AnimationError>`.
pub type Result<T> = std::result::Result<T, AnimationError>;
