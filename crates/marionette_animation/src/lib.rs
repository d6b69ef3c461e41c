//! Marionette Animation
//!
//! Per-character animation blending on top of a host playable graph.
//!
//! Leaf to root:
//! - [`registry`]: named clips with their transition metadata and clip nodes
//! - [`mixer`]: full rebuilds of the fan-in mixer node
//! - [`index`]: symbolic animation ids to slot indices, with addon ranges
//! - [`scheduler`]: cooperative crossfade-back tasks and cancellation tokens
//! - [`controller`]: the public playback surface tying it all together
//!
//! The host graph itself is abstracted behind [`PlayableGraph`].

pub mod clip;
pub mod controller;
pub mod events;
pub mod graph;
pub mod index;
pub mod mixer;
pub mod registry;
pub mod scheduler;
pub mod settings;
pub mod support;

pub use clip::{AnimationClip, AnimationClipInfo, ClipInfo, LoopMode};
pub use controller::PlaybackController;
pub use events::{ActiveSlotChanged, PlaybackListener, SlotChangeCause};
pub use graph::PlayableGraph;
pub use index::{AnimationId, BASE_COUNT, BaseAnimation, IndexAddon, IndexResolver};
pub use mixer::{MixerGraphBuilder, MixerState};
pub use registry::{ClipEntry, ClipRegistry, ClipSetRegistration};
pub use scheduler::{CancellationToken, TransitionPhase, TransitionState, TransitionStats};
pub use settings::{PlaybackSettings, RegistrationPolicy};
pub use support::{ClipManifestEntry, ClipSetManifest, DefaultClipSet};
