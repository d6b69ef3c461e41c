//! Default Clip Sets
//!
//! A [`DefaultClipSet`] is the per-character list of clips registered up
//! front; its order is the slot order, so the first [`BASE_COUNT`] entries
//! line up with [`BaseAnimation`] and later entries with addon names.
//!
//! Sets can be authored as JSON through [`ClipSetManifest`], which names
//! clips from a caller-provided library:
//!
//! ```json
//! {
//!   "clips": [
//!     { "clip": "idle", "transition_duration": 0.0 },
//!     { "clip": "walk", "transition_duration": 0.2, "break_points": [0.5] }
//!   ]
//! }
//! ```

use std::sync::Arc;

use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use marionette_core::Result;

use crate::clip::{AnimationClip, AnimationClipInfo, ClipInfo};
use crate::index::{BASE_COUNT, BaseAnimation};

/// Ordered clip infos for one character.
#[derive(Debug, Clone)]
pub struct DefaultClipSet<T: ClipInfo = AnimationClipInfo> {
    infos: Vec<T>,
}

impl<T: ClipInfo> Default for DefaultClipSet<T> {
    fn default() -> Self {
        Self { infos: Vec::new() }
    }
}

impl<T: ClipInfo> DefaultClipSet<T> {
    #[must_use]
    pub fn new(infos: Vec<T>) -> Self {
        Self { infos }
    }

    #[inline]
    #[must_use]
    pub fn infos(&self) -> &[T] {
        &self.infos
    }

    pub fn push(&mut self, info: T) {
        self.infos.push(info);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&T> {
        self.infos.get(slot)
    }

    #[must_use]
    pub fn clip_info(&self, base: BaseAnimation) -> Option<&T> {
        self.infos.get(base.index())
    }

    /// Base animations with no entry, or with an entry lacking its clip.
    #[must_use]
    pub fn unassigned_base_names(&self) -> Vec<&'static str> {
        BaseAnimation::ALL
            .iter()
            .filter(|base| {
                self.infos
                    .get(base.index())
                    .is_none_or(|info| info.clip().is_none())
            })
            .map(|base| base.name())
            .collect()
    }

    /// Whether every base slot holds a clip.
    #[must_use]
    pub fn covers_base_set(&self) -> bool {
        self.infos.len() >= BASE_COUNT && self.unassigned_base_names().is_empty()
    }
}

/// One authored entry of a [`ClipSetManifest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipManifestEntry {
    /// Clip name in the library; `None` leaves the slot unassigned.
    #[serde(default)]
    pub clip: Option<String>,
    #[serde(default)]
    pub transition_duration: f32,
    #[serde(default)]
    pub break_points: Vec<f32>,
}

/// Serializable description of a [`DefaultClipSet`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipSetManifest {
    pub clips: Vec<ClipManifestEntry>,
}

impl ClipSetManifest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds a clip set, looking clip names up in `library`.
    ///
    /// Names missing from the library produce unassigned entries; they are
    /// reported when the set is registered.
    #[must_use]
    pub fn resolve(&self, library: &[Arc<AnimationClip>]) -> DefaultClipSet {
        let by_name: FxHashMap<&str, &Arc<AnimationClip>> = library
            .iter()
            .map(|clip| (clip.name.as_str(), clip))
            .collect();

        let infos = self
            .clips
            .iter()
            .enumerate()
            .map(|(slot, entry)| {
                let clip = entry.clip.as_deref().and_then(|name| {
                    let found = by_name.get(name).map(|clip| Arc::clone(clip));
                    if found.is_none() {
                        warn!("Manifest slot {slot} names unknown clip '{name}'");
                    }
                    found
                });
                AnimationClipInfo {
                    clip,
                    transition_duration: entry.transition_duration,
                    break_points: entry.break_points.iter().copied().collect(),
                }
            })
            .collect();

        DefaultClipSet::new(infos)
    }
}
