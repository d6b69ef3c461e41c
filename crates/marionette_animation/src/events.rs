/// Why the active slot moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotChangeCause {
    /// A loop clip became the resting animation.
    Loop,
    /// A one-shot clip took full weight.
    OneShot,
    /// A clip was frozen at full weight with no way back.
    Stay,
    /// A one-shot finished blending back to idle.
    CrossfadeComplete,
}

/// Fired whenever the slot holding the dominant weight changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSlotChanged {
    pub previous: Option<usize>,
    pub current: usize,
    pub cause: SlotChangeCause,
}

/// Observer of playback events, typically gameplay logic keyed on animation.
pub trait PlaybackListener {
    fn on_active_slot_changed(&mut self, event: &ActiveSlotChanged);
}

impl<F> PlaybackListener for F
where
    F: FnMut(&ActiveSlotChanged),
{
    fn on_active_slot_changed(&mut self, event: &ActiveSlotChanged) {
        self(event);
    }
}
