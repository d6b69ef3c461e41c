//! Clip Registry
//!
//! Maps clip names to their metadata and to the clip node created for them
//! in the host graph. Slot indices are dense and follow insertion order, so
//! the registry order is also the mixer input order.
//!
//! A slot may be reserved without a clip. Default clip sets address clips by
//! list position, so an unusable entry keeps its position as an empty slot
//! instead of shifting every later clip down by one.

use std::sync::Arc;

use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use marionette_core::{AnimationError, NodeHandle, Result};

use crate::clip::{AnimationClip, ClipInfo};
use crate::graph::PlayableGraph;
use crate::settings::RegistrationPolicy;

/// A registered clip.
#[derive(Debug, Clone)]
pub struct ClipEntry {
    pub name: String,
    pub clip: Arc<AnimationClip>,
    pub looping: bool,
    pub transition_duration: f32,
    pub break_points: SmallVec<[f32; 4]>,
    pub slot_index: usize,
    /// Valid while the graph that created it is alive.
    pub node: NodeHandle,
}

/// Outcome of a registration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// A new entry (and clip node) was created at this slot.
    Inserted(usize),
    /// Lenient registration found the name already present.
    Existing(usize),
}

impl Registration {
    #[inline]
    #[must_use]
    pub fn slot(self) -> usize {
        match self {
            Self::Inserted(slot) | Self::Existing(slot) => slot,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_inserted(self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Outcome of registering an ordered clip set.
#[derive(Debug, Default)]
pub struct ClipSetRegistration {
    /// Slot taken by each list position, in order.
    pub slots: Vec<usize>,
    /// Slots left reserved but empty, with the reason their entry was refused.
    pub skipped: Vec<(usize, AnimationError)>,
}

impl ClipSetRegistration {
    /// True when every list position got a clip.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ClipRegistry {
    slots: Vec<Option<ClipEntry>>,
    /// First slot registered under each name.
    by_name: FxHashMap<String, usize>,
}

impl ClipRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the clip described by `info`, creating its clip node in `graph`.
    ///
    /// Names are unique here: a name already present is a `DuplicateClip`
    /// under `Strict` and resolves to its existing slot under `Lenient`.
    /// Validation happens before anything touches the graph, so a rejected
    /// registration leaves both the registry and the graph unchanged.
    pub fn register<G: PlayableGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        info: &dyn ClipInfo,
        policy: RegistrationPolicy,
    ) -> Result<Registration> {
        let clip = self.required_clip(info)?;

        if let Some(&slot) = self.by_name.get(&clip.name) {
            return match policy {
                RegistrationPolicy::Strict => Err(AnimationError::DuplicateClip(clip.name.clone())),
                RegistrationPolicy::Lenient => Ok(Registration::Existing(slot)),
            };
        }

        self.insert(graph, clip, info).map(Registration::Inserted)
    }

    /// Registers `info` at the next slot, even when its name is taken.
    ///
    /// Used for ordered clip sets, where the slot is the list position and
    /// one clip asset may legitimately back several positions. Each position
    /// gets its own clip node. Name lookups keep returning the first slot
    /// registered under a name. Under `Strict` a repeated name is still a
    /// `DuplicateClip`.
    pub fn append<G: PlayableGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        info: &dyn ClipInfo,
        policy: RegistrationPolicy,
    ) -> Result<usize> {
        let clip = self.required_clip(info)?;
        if policy == RegistrationPolicy::Strict && self.by_name.contains_key(&clip.name) {
            return Err(AnimationError::DuplicateClip(clip.name.clone()));
        }
        self.insert(graph, clip, info)
    }

    /// Appends an empty slot and returns its index.
    pub fn reserve(&mut self) -> usize {
        let slot_index = self.slots.len();
        self.slots.push(None);
        debug!("Reserved empty slot {slot_index}");
        slot_index
    }

    fn required_clip<'i>(&self, info: &'i dyn ClipInfo) -> Result<&'i Arc<AnimationClip>> {
        info.clip().ok_or_else(|| {
            AnimationError::InvalidClip(format!(
                "clip info for slot {} has no clip asset",
                self.slots.len()
            ))
        })
    }

    fn insert<G: PlayableGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        clip: &Arc<AnimationClip>,
        info: &dyn ClipInfo,
    ) -> Result<usize> {
        let transition_duration = info.transition_duration();
        if !transition_duration.is_finite() || transition_duration < 0.0 {
            return Err(AnimationError::InvalidClip(format!(
                "'{}': transition duration must be finite and >= 0, got {transition_duration}",
                clip.name
            )));
        }
        validate_break_points(&clip.name, info.break_points())?;

        let slot_index = self.slots.len();
        let node = graph.create_clip_node(clip);
        debug!("Registered clip '{}' at slot {slot_index}", clip.name);

        self.by_name.entry(clip.name.clone()).or_insert(slot_index);
        self.slots.push(Some(ClipEntry {
            name: clip.name.clone(),
            clip: Arc::clone(clip),
            looping: clip.is_looping(),
            transition_duration,
            break_points: SmallVec::from_slice(info.break_points()),
            slot_index,
            node,
        }));

        Ok(slot_index)
    }

    pub fn lookup(&self, name: &str) -> Result<&ClipEntry> {
        self.by_name
            .get(name)
            .and_then(|&slot| self.slots[slot].as_ref())
            .ok_or_else(|| AnimationError::NotFound(name.to_string()))
    }

    /// Entry at `slot_index`. A reserved slot is `NotFound`.
    pub fn resolve_slot(&self, slot_index: usize) -> Result<&ClipEntry> {
        match self.slots.get(slot_index) {
            Some(Some(entry)) => Ok(entry),
            Some(None) => Err(AnimationError::NotFound(format!(
                "slot {slot_index} has no clip assigned"
            ))),
            None => Err(AnimationError::IndexOutOfRange {
                context: "clip registry slot".to_string(),
                index: slot_index as i64,
                len: self.slots.len(),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn is_reserved(&self, slot_index: usize) -> bool {
        matches!(self.slots.get(slot_index), Some(None))
    }

    /// Registered entries in slot order, reserved slots skipped.
    pub fn entries(&self) -> impl Iterator<Item = &ClipEntry> {
        self.slots.iter().flatten()
    }

    /// Every slot in order, `None` where reserved. One per mixer input.
    #[inline]
    #[must_use]
    pub fn slots(&self) -> &[Option<ClipEntry>] {
        &self.slots
    }

    /// Number of slots, reserved ones included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drops every slot, destroying the clip nodes that are still valid.
    pub fn clear<G: PlayableGraph + ?Sized>(&mut self, graph: &mut G) {
        for entry in self.slots.drain(..).flatten() {
            if graph.is_valid(entry.node) {
                graph.destroy(entry.node);
            }
        }
        self.by_name.clear();
    }
}

fn validate_break_points(name: &str, break_points: &[f32]) -> Result<()> {
    let mut previous = 0.0_f32;
    for &point in break_points {
        if !(0.0..=1.0).contains(&point) {
            return Err(AnimationError::InvalidClip(format!(
                "'{name}': break point {point} outside [0, 1]"
            )));
        }
        if point < previous {
            return Err(AnimationError::InvalidClip(format!(
                "'{name}': break points must be ascending"
            )));
        }
        previous = point;
    }
    Ok(())
}
