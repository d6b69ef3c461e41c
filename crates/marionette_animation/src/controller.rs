//! Playback Controller
//!
//! [`PlaybackController`] owns a host graph and exposes the playback surface
//! used by gameplay code:
//!
//! - [`play_loop`](PlaybackController::play_loop): rest on a looping clip
//! - [`force_play`](PlaybackController::force_play): play a one-shot, then
//!   crossfade back to the resting clip
//! - [`force_stay`](PlaybackController::force_stay): freeze on a clip with
//!   no way back
//!
//! Every request cancels the crossfade in flight before writing weights, so
//! at most one task ever writes to the mixer. [`tick`](PlaybackController::tick)
//! must be called once per frame.
//!
//! ```rust,ignore
//! let mut controller = PlaybackController::new(graph);
//! controller.register_default_clips(clip_set.infos())?;
//! controller.play_loop(BaseAnimation::Idle)?;
//! controller.force_play(BaseAnimation::Hit)?;
//!
//! let mut clock = FrameClock::default();
//! loop {
//!     controller.tick(clock.next_frame());
//! }
//! ```

use log::{debug, info, warn};

use marionette_core::{AnimationError, Result};

use crate::clip::ClipInfo;
use crate::events::{ActiveSlotChanged, PlaybackListener, SlotChangeCause};
use crate::graph::PlayableGraph;
use crate::index::{AnimationId, IndexAddon, IndexResolver};
use crate::mixer::{MixerGraphBuilder, MixerState};
use crate::registry::{ClipRegistry, ClipSetRegistration};
use crate::scheduler::{
    CancellationToken, CrossfadeTask, FrameScheduler, TransitionPhase, TransitionState,
    TransitionStats,
};
use crate::settings::{PlaybackSettings, RegistrationPolicy};
use crate::support::DefaultClipSet;

pub struct PlaybackController<G: PlayableGraph> {
    graph: G,
    registry: ClipRegistry,
    mixer: Option<MixerState>,
    resolver: IndexResolver,
    scheduler: FrameScheduler,
    settings: PlaybackSettings,

    active_slot: Option<usize>,
    /// Transition state while no crossfade task is live.
    resting: TransitionState,

    listeners: Vec<Box<dyn PlaybackListener>>,
    torn_down: bool,
}

impl<G: PlayableGraph> PlaybackController<G> {
    pub fn new(graph: G) -> Self {
        Self::with_settings(graph, PlaybackSettings::default())
    }

    pub fn with_settings(graph: G, settings: PlaybackSettings) -> Self {
        Self {
            graph,
            registry: ClipRegistry::new(),
            mixer: None,
            resolver: IndexResolver::new(),
            scheduler: FrameScheduler::new(),
            settings,
            active_slot: None,
            resting: TransitionState {
                active_idle_index: None,
                target_index: 0,
                elapsed: 0.0,
                transition_duration: 0.0,
                phase: TransitionPhase::Idle,
            },
            listeners: Vec::new(),
            torn_down: false,
        }
    }

    // ========================================================================
    // Setup
    // ========================================================================

    pub fn attach_addon(&mut self, addon: Box<dyn IndexAddon>) -> Result<()> {
        self.resolver.attach_addon(addon)
    }

    pub fn add_listener(&mut self, listener: impl PlaybackListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Registers `infos` in order under the configured policy and rebuilds the
    /// mixer if any slot was added.
    ///
    /// Each list position takes the next slot, so on an empty controller
    /// position `i` is slot `i` and base ids resolve to their own clip. Under
    /// `Lenient` a repeated clip gets its own slot and an unusable entry leaves
    /// its slot reserved and unwired, listed in the returned report.
    /// Under `Strict` the first problem aborts the batch, and entries
    /// registered before it stay registered (and wired).
    pub fn register_default_clips<T: ClipInfo>(
        &mut self,
        infos: &[T],
    ) -> Result<ClipSetRegistration> {
        self.ensure_live("register clips")?;
        let policy = self.settings.registration;
        if !self.registry.is_empty() {
            debug!(
                "Appending {} default clips after {} existing slots",
                infos.len(),
                self.registry.len()
            );
        }

        let mut report = ClipSetRegistration::default();
        let mut failure = None;
        for (position, info) in infos.iter().enumerate() {
            match self.registry.append(&mut self.graph, info, policy) {
                Ok(slot) => report.slots.push(slot),
                Err(err) if policy == RegistrationPolicy::Lenient => {
                    let slot = self.registry.reserve();
                    warn!("Default clip {position} skipped, slot {slot} left empty: {err}");
                    report.slots.push(slot);
                    report.skipped.push((slot, err));
                }
                Err(err) => {
                    warn!("Default clip registration failed at position {position}: {err}");
                    failure = Some(err);
                    break;
                }
            }
        }

        if !report.slots.is_empty() {
            self.rebuild_mixer();
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    pub fn register_clip_set<T: ClipInfo>(
        &mut self,
        set: &DefaultClipSet<T>,
    ) -> Result<ClipSetRegistration> {
        self.register_default_clips(set.infos())
    }

    /// Drops every registered clip and registers `infos` from scratch.
    ///
    /// Used when the backing clip set is swapped for a different one. Playback
    /// state is reset; the caller re-establishes a resting clip.
    pub fn reload_default_clips<T: ClipInfo>(
        &mut self,
        infos: &[T],
    ) -> Result<ClipSetRegistration> {
        self.ensure_live("reload clips")?;
        self.scheduler.cancel_all();
        self.registry.clear(&mut self.graph);
        self.active_slot = None;
        self.resting.active_idle_index = None;
        self.resting.phase = TransitionPhase::Idle;

        let result = self.register_default_clips(infos);
        if self.registry.is_empty() {
            self.rebuild_mixer();
        }
        result
    }

    // ========================================================================
    // Playback
    // ========================================================================

    /// Makes the clip behind `id` the resting animation.
    ///
    /// Rejected with `NotLoopable` (state untouched) if the clip does not loop.
    pub fn play_loop<'a>(&mut self, id: impl Into<AnimationId<'a>>) -> Result<()> {
        self.ensure_live("play")?;
        let slot = self.resolve_registered(id.into())?;
        let entry = self.registry.resolve_slot(slot)?;
        if !entry.looping {
            warn!("Refusing to loop non-looping clip '{}' (slot {slot})", entry.name);
            return Err(AnimationError::NotLoopable {
                name: entry.name.clone(),
                slot,
            });
        }
        let node = entry.node;

        self.scheduler.cancel_all();
        self.graph.set_done(node, false);
        self.write_exclusive(slot)?;

        self.resting = TransitionState {
            active_idle_index: Some(slot),
            target_index: slot,
            elapsed: 0.0,
            transition_duration: 0.0,
            phase: TransitionPhase::Idle,
        };
        self.set_active(slot, SlotChangeCause::Loop);
        Ok(())
    }

    /// Plays the clip behind `id` from the start at full weight, then
    /// crossfades back to the resting clip.
    pub fn force_play<'a>(&mut self, id: impl Into<AnimationId<'a>>) -> Result<()> {
        self.ensure_live("play")?;
        let slot = self.resolve_registered(id.into())?;
        self.start_one_shot(slot)
    }

    /// Like [`force_play`](Self::force_play), registering the clip described
    /// by `info` first if its name is new. Returns the slot played.
    ///
    /// An already-registered name keeps its original metadata.
    pub fn force_play_info(&mut self, info: &dyn ClipInfo) -> Result<usize> {
        self.ensure_live("register clips")?;
        let registration =
            self.registry
                .register(&mut self.graph, info, RegistrationPolicy::Lenient)?;
        if registration.is_inserted() {
            self.rebuild_mixer();
        }
        let slot = registration.slot();
        self.start_one_shot(slot)?;
        Ok(slot)
    }

    /// Gives the clip behind `id` full weight indefinitely.
    pub fn force_stay<'a>(&mut self, id: impl Into<AnimationId<'a>>) -> Result<()> {
        self.ensure_live("play")?;
        let slot = self.resolve_registered(id.into())?;

        self.scheduler.cancel_all();
        self.write_exclusive(slot)?;

        self.resting.target_index = slot;
        self.resting.elapsed = 0.0;
        self.resting.transition_duration = 0.0;
        self.resting.phase = TransitionPhase::Holding;
        self.set_active(slot, SlotChangeCause::Stay);
        Ok(())
    }

    /// Advances the host graph and the crossfade in flight by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if self.torn_down {
            return;
        }
        self.graph.evaluate(dt);

        let Some(mixer) = self.mixer.as_mut() else {
            return;
        };
        let Some(done) = self.scheduler.tick(&mut self.graph, mixer, dt) else {
            return;
        };

        debug!(
            "Crossfade from slot {} back to slot {} complete",
            done.target_index, done.idle_index
        );
        if self.settings.reset_on_complete && done.target_index != done.idle_index {
            if let Ok(entry) = self.registry.resolve_slot(done.target_index) {
                self.graph.set_time(entry.node, 0.0);
                self.graph.set_done(entry.node, false);
            }
        }
        self.resting = TransitionState {
            active_idle_index: Some(done.idle_index),
            target_index: done.target_index,
            elapsed: done.elapsed,
            transition_duration: done.transition_duration,
            phase: TransitionPhase::Idle,
        };
        self.set_active(done.idle_index, SlotChangeCause::CrossfadeComplete);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn transition_duration<'a>(&self, id: impl Into<AnimationId<'a>>) -> Result<f32> {
        let slot = self.resolve_registered(id.into())?;
        Ok(self.registry.resolve_slot(slot)?.transition_duration)
    }

    pub fn break_points<'a>(&self, id: impl Into<AnimationId<'a>>) -> Result<&[f32]> {
        let slot = self.resolve_registered(id.into())?;
        Ok(self.registry.resolve_slot(slot)?.break_points.as_slice())
    }

    /// Current transition, live or resting.
    #[must_use]
    pub fn transition_state(&self) -> TransitionState {
        self.scheduler
            .active()
            .map_or_else(|| self.resting.clone(), |task| task.state().clone())
    }

    #[must_use]
    pub fn phase(&self) -> TransitionPhase {
        self.scheduler
            .active()
            .map_or(self.resting.phase, |task| task.state().phase)
    }

    #[inline]
    #[must_use]
    pub fn active_slot(&self) -> Option<usize> {
        self.active_slot
    }

    #[inline]
    #[must_use]
    pub fn active_idle_index(&self) -> Option<usize> {
        self.resting.active_idle_index
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> TransitionStats {
        self.scheduler.stats()
    }

    /// Tasks still held by the scheduler, cancelled ones included.
    #[inline]
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    #[inline]
    #[must_use]
    pub fn mixer(&self) -> Option<&MixerState> {
        self.mixer.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ClipRegistry {
        &self.registry
    }

    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &IndexResolver {
        &self.resolver
    }

    #[inline]
    #[must_use]
    pub fn graph(&self) -> &G {
        &self.graph
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Destroys every node this controller created, then the graph itself.
    /// Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.scheduler.cancel_all();
        if let Some(mixer) = self.mixer.take() {
            mixer.destroy(&mut self.graph);
        }
        self.registry.clear(&mut self.graph);
        self.graph.stop();
        self.graph.destroy_graph();

        self.active_slot = None;
        self.resting.active_idle_index = None;
        self.torn_down = true;
        info!("Playback controller torn down");
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_live(&self, action: &'static str) -> Result<()> {
        if self.torn_down {
            warn!("Ignoring request to {action} after teardown");
            return Err(AnimationError::TornDown(action));
        }
        Ok(())
    }

    fn resolve_registered(&self, id: AnimationId<'_>) -> Result<usize> {
        let slot = self
            .resolver
            .resolve(id)
            .inspect_err(|err| warn!("Cannot resolve {id:?}: {err}"))?;
        self.registry
            .resolve_slot(slot)
            .inspect_err(|err| warn!("Resolved {id:?} to unregistered slot: {err}"))?;
        Ok(slot)
    }

    fn start_one_shot(&mut self, slot: usize) -> Result<()> {
        let entry = self.registry.resolve_slot(slot)?;
        let node = entry.node;
        let transition_duration = entry.transition_duration;
        let length = entry.clip.duration;

        self.scheduler.cancel_all();
        self.graph.set_time(node, 0.0);
        self.graph.set_done(node, false);
        self.graph.set_duration(node, length);
        self.write_exclusive(slot)?;

        self.resting.target_index = slot;
        self.resting.elapsed = 0.0;
        self.resting.transition_duration = transition_duration;

        match self.resting.active_idle_index {
            Some(idle) => {
                let hold = self.graph.clip_length(node) - transition_duration;
                self.scheduler.spawn(CrossfadeTask::new(
                    idle,
                    slot,
                    hold,
                    transition_duration,
                    CancellationToken::new(),
                ));
            }
            None => {
                warn!("No resting clip established; slot {slot} will hold after playing");
                self.resting.phase = TransitionPhase::Holding;
            }
        }

        self.set_active(slot, SlotChangeCause::OneShot);
        Ok(())
    }

    fn write_exclusive(&mut self, slot: usize) -> Result<()> {
        let Some(mixer) = self.mixer.as_mut() else {
            return Err(AnimationError::IndexOutOfRange {
                context: "mixer input (no mixer built)".to_string(),
                index: slot as i64,
                len: 0,
            });
        };
        if mixer.set_exclusive(&mut self.graph, slot) {
            Ok(())
        } else {
            Err(AnimationError::IndexOutOfRange {
                context: "mixer input".to_string(),
                index: slot as i64,
                len: mixer.input_count,
            })
        }
    }

    fn rebuild_mixer(&mut self) {
        let previous = self.mixer.take();
        let mut mixer =
            MixerGraphBuilder::rebuild(&mut self.graph, previous, self.registry.slots());

        // A fresh mixer has every input at zero; keep whatever was showing.
        if let Some(active) = self.active_slot {
            mixer.set_exclusive(&mut self.graph, active);
        }
        self.mixer = Some(mixer);

        if self.settings.auto_play_graph {
            self.graph.play();
        }
    }

    fn set_active(&mut self, slot: usize, cause: SlotChangeCause) {
        if self.active_slot == Some(slot) {
            return;
        }
        let event = ActiveSlotChanged {
            previous: self.active_slot,
            current: slot,
            cause,
        };
        self.active_slot = Some(slot);
        for listener in &mut self.listeners {
            listener.on_active_slot_changed(&event);
        }
    }
}

impl<G: PlayableGraph> Drop for PlaybackController<G> {
    fn drop(&mut self) {
        self.teardown();
    }
}
