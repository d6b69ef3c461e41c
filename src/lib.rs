//! # Marionette
//!
//! Per-character animation blending over a host playable graph.
//!
//! A [`PlaybackController`] owns the host graph, keeps a [`ClipRegistry`] of
//! named clips, rebuilds a fan-in mixer whenever the clip set changes, and
//! drives crossfades from one-shot animations back to a resting loop.
//!
//! ```rust,ignore
//! use marionette::prelude::*;
//!
//! let mut controller = PlaybackController::new(graph);
//! controller.register_default_clips(&infos)?;
//! controller.play_loop(BaseAnimation::Idle)?;
//! controller.force_play(BaseAnimation::Hit)?;
//! controller.tick(dt);
//! ```

pub use marionette_animation as animation;
pub use marionette_core::errors;
pub use marionette_core::time;

pub use marionette_animation::{
    ActiveSlotChanged, AnimationClip, AnimationClipInfo, AnimationId, BASE_COUNT, BaseAnimation,
    ClipEntry, ClipInfo, ClipManifestEntry, ClipRegistry, ClipSetManifest, ClipSetRegistration,
    DefaultClipSet, IndexAddon, IndexResolver, LoopMode, MixerGraphBuilder, MixerState,
    PlayableGraph, PlaybackController, PlaybackListener, PlaybackSettings, RegistrationPolicy,
    SlotChangeCause, TransitionPhase, TransitionState, TransitionStats,
};
pub use marionette_core::{AnimationError, FrameClock, FrameStep, NodeHandle, Result};

pub mod prelude {
    pub use crate::{
        AnimationClip, AnimationClipInfo, AnimationError, BaseAnimation, ClipInfo, FrameClock,
        IndexAddon, PlayableGraph, PlaybackController, PlaybackSettings, TransitionPhase,
    };
}
