use std::sync::Arc;

use smallvec::SmallVec;

/// How a clip behaves when its playback time reaches the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    #[default]
    Once,
    Loop,
    PingPong,
}

/// Clip asset as seen by the blending layer.
///
/// Sampling is the host's business; only the name, length and loop
/// behaviour matter here.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub loop_mode: LoopMode,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32, loop_mode: LoopMode) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
            loop_mode,
        }
    }

    #[must_use]
    pub fn looped(name: impl Into<String>, duration: f32) -> Self {
        Self::new(name, duration, LoopMode::Loop)
    }

    #[must_use]
    pub fn one_shot(name: impl Into<String>, duration: f32) -> Self {
        Self::new(name, duration, LoopMode::Once)
    }

    /// Whether the clip may serve as a resting (idle) animation.
    #[inline]
    #[must_use]
    pub fn is_looping(&self) -> bool {
        !matches!(self.loop_mode, LoopMode::Once)
    }
}

/// Capability interface over anything that describes a playable clip.
///
/// Asset types of any shape can feed the registry as long as they expose
/// the clip, how long it takes to blend back out, and its break points.
pub trait ClipInfo {
    /// The clip asset, or `None` if the slot was left unassigned.
    fn clip(&self) -> Option<&Arc<AnimationClip>>;

    /// Seconds spent crossfading back to the idle clip.
    fn transition_duration(&self) -> f32;

    /// Normalized positions in `[0, 1]`, ascending.
    fn break_points(&self) -> &[f32];
}

impl<T: ClipInfo + ?Sized> ClipInfo for Box<T> {
    fn clip(&self) -> Option<&Arc<AnimationClip>> {
        (**self).clip()
    }

    fn transition_duration(&self) -> f32 {
        (**self).transition_duration()
    }

    fn break_points(&self) -> &[f32] {
        (**self).break_points()
    }
}

impl<T: ClipInfo + ?Sized> ClipInfo for Arc<T> {
    fn clip(&self) -> Option<&Arc<AnimationClip>> {
        (**self).clip()
    }

    fn transition_duration(&self) -> f32 {
        (**self).transition_duration()
    }

    fn break_points(&self) -> &[f32] {
        (**self).break_points()
    }
}

/// Plain-data [`ClipInfo`] implementation.
#[derive(Debug, Clone, Default)]
pub struct AnimationClipInfo {
    pub clip: Option<Arc<AnimationClip>>,
    pub transition_duration: f32,
    pub break_points: SmallVec<[f32; 4]>,
}

impl AnimationClipInfo {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>, transition_duration: f32) -> Self {
        Self {
            clip: Some(clip),
            transition_duration,
            break_points: SmallVec::new(),
        }
    }

    /// An info whose clip asset has not been assigned.
    #[must_use]
    pub fn unassigned(transition_duration: f32) -> Self {
        Self {
            clip: None,
            transition_duration,
            break_points: SmallVec::new(),
        }
    }

    #[must_use]
    pub fn with_break_points(mut self, break_points: &[f32]) -> Self {
        self.break_points = SmallVec::from_slice(break_points);
        self
    }
}

impl ClipInfo for AnimationClipInfo {
    fn clip(&self) -> Option<&Arc<AnimationClip>> {
        self.clip.as_ref()
    }

    fn transition_duration(&self) -> f32 {
        self.transition_duration
    }

    fn break_points(&self) -> &[f32] {
        &self.break_points
    }
}
