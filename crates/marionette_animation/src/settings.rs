//! Playback Settings
//!
//! ```rust,ignore
//! use marionette_animation::{PlaybackSettings, RegistrationPolicy};
//!
//! let settings = PlaybackSettings {
//!     registration: RegistrationPolicy::Strict,
//!     ..Default::default()
//! };
//! ```

/// How registration treats repeated names and unusable clip infos.
///
/// For a single clip request, `Lenient` returns the slot already holding the
/// name. For an ordered default clip set, where list position is the slot,
/// `Lenient` gives a repeated name its own slot and leaves the slot of an
/// unusable entry reserved but unwired; `Strict` stops at the first problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationPolicy {
    /// Fail with `DuplicateClip`, or with the entry's own error.
    Strict,
    #[default]
    Lenient,
}

/// Controller-wide configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    /// Policy applied by `register_default_clips`. One-shot requests carrying
    /// their own clip info always register leniently.
    pub registration: RegistrationPolicy,
    /// Start the host graph after every mixer rebuild.
    pub auto_play_graph: bool,
    /// Rewind a one-shot clip node once it has blended out.
    pub reset_on_complete: bool,
}

impl Default for PlaybackSettings {
    #[inline]
    fn default() -> Self {
        Self {
            registration: RegistrationPolicy::Lenient,
            auto_play_graph: true,
            reset_on_complete: true,
        }
    }
}
