//! Animation Index Resolution
//!
//! Symbolic animation ids map onto two disjoint slot ranges:
//!
//! | Range                              | Source                          |
//! |------------------------------------|---------------------------------|
//! | `[0, BASE_COUNT)`                  | [`BaseAnimation`] discriminants |
//! | `[BASE_COUNT, BASE_COUNT + addon)` | names declared by an [`IndexAddon`] |
//!
//! The addon range is validated when the addon is attached, so a resolved
//! addon slot can never alias a base slot.

use log::debug;

use marionette_core::{AnimationError, Result};

/// Number of base animations; also the first addon slot.
pub const BASE_COUNT: usize = 6;

/// Fixed set of animations every character provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BaseAnimation {
    Idle = 0,
    Walk = 1,
    Run = 2,
    Hit = 3,
    Death = 4,
    Defend = 5,
}

impl BaseAnimation {
    pub const ALL: [Self; BASE_COUNT] = [
        Self::Idle,
        Self::Walk,
        Self::Run,
        Self::Hit,
        Self::Death,
        Self::Defend,
    ];

    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Walk => "Walk",
            Self::Run => "Run",
            Self::Hit => "Hit",
            Self::Death => "Death",
            Self::Defend => "Defend",
        }
    }
}

/// Provider of animation names beyond the base set.
pub trait IndexAddon {
    /// Every name this addon can resolve, in declaration order.
    fn additional_index_names(&self) -> &[String];

    /// Zero-based offset of `name` inside the addon range.
    ///
    /// Signed so a misbehaving addon can be caught instead of wrapped.
    fn original_index_by_name(&self, name: &str) -> Option<i32>;
}

/// Anything a caller can use to name an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationId<'a> {
    Base(BaseAnimation),
    Named(&'a str),
    Slot(usize),
}

impl From<BaseAnimation> for AnimationId<'_> {
    fn from(base: BaseAnimation) -> Self {
        Self::Base(base)
    }
}

impl<'a> From<&'a str> for AnimationId<'a> {
    fn from(name: &'a str) -> Self {
        Self::Named(name)
    }
}

impl From<usize> for AnimationId<'_> {
    fn from(slot: usize) -> Self {
        Self::Slot(slot)
    }
}

#[derive(Default)]
pub struct IndexResolver {
    addon: Option<Box<dyn IndexAddon>>,
}

impl IndexResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_addon(addon: Box<dyn IndexAddon>) -> Result<Self> {
        let mut resolver = Self::new();
        resolver.attach_addon(addon)?;
        Ok(resolver)
    }

    /// Attaches `addon` after checking that its names map one-to-one onto
    /// `[0, names.len())`. On failure the previous addon (if any) stays.
    pub fn attach_addon(&mut self, addon: Box<dyn IndexAddon>) -> Result<()> {
        let names = addon.additional_index_names();
        let mut claimed = vec![false; names.len()];

        for name in names {
            let offset = addon
                .original_index_by_name(name)
                .ok_or_else(|| AnimationError::UnresolvedName(name.clone()))?;
            let in_range = usize::try_from(offset).ok().filter(|&o| o < names.len());
            match in_range {
                Some(o) if !claimed[o] => claimed[o] = true,
                _ => {
                    return Err(AnimationError::AddonRange {
                        name: name.clone(),
                        index: offset,
                        len: names.len(),
                    });
                }
            }
        }

        debug!("Attached index addon with {} names", names.len());
        self.addon = Some(addon);
        Ok(())
    }

    pub fn detach_addon(&mut self) -> Option<Box<dyn IndexAddon>> {
        self.addon.take()
    }

    #[inline]
    #[must_use]
    pub fn addon_count(&self) -> usize {
        self.addon
            .as_ref()
            .map_or(0, |addon| addon.additional_index_names().len())
    }

    /// Size of the combined base + addon range.
    #[inline]
    #[must_use]
    pub fn total_count(&self) -> usize {
        BASE_COUNT + self.addon_count()
    }

    pub fn resolve<'a>(&self, id: impl Into<AnimationId<'a>>) -> Result<usize> {
        match id.into() {
            AnimationId::Base(base) => Ok(Self::resolve_base(base)),
            AnimationId::Named(name) => self.resolve_name(name),
            AnimationId::Slot(slot) => Ok(slot),
        }
    }

    #[inline]
    #[must_use]
    pub fn resolve_base(base: BaseAnimation) -> usize {
        base.index()
    }

    pub fn resolve_name(&self, name: &str) -> Result<usize> {
        let addon = self
            .addon
            .as_ref()
            .ok_or_else(|| AnimationError::UnresolvedName(name.to_string()))?;
        let offset = addon
            .original_index_by_name(name)
            .ok_or_else(|| AnimationError::UnresolvedName(name.to_string()))?;

        let len = addon.additional_index_names().len();
        match usize::try_from(offset) {
            Ok(o) if o < len => Ok(BASE_COUNT + o),
            _ => Err(AnimationError::IndexOutOfRange {
                context: format!("addon offset for '{name}'"),
                index: i64::from(offset),
                len,
            }),
        }
    }

    /// Human-readable label for a slot: the base name, the addon name, or
    /// the bare index when neither range knows it.
    #[must_use]
    pub fn slot_label(&self, slot: usize) -> String {
        if let Some(base) = BaseAnimation::from_index(slot) {
            return base.name().to_string();
        }
        self.addon
            .as_ref()
            .and_then(|addon| {
                addon.additional_index_names().iter().find(|name| {
                    addon
                        .original_index_by_name(name)
                        .and_then(|o| usize::try_from(o).ok())
                        .is_some_and(|o| BASE_COUNT + o == slot)
                })
            })
            .cloned()
            .unwrap_or_else(|| slot.to_string())
    }
}
