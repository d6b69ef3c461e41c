//! Crossfade Scheduling
//!
//! A one-shot animation returns to the idle clip through a [`CrossfadeTask`]:
//! a resumable task advanced once per frame by the [`FrameScheduler`]. The
//! task has two suspension points:
//!
//! 1. a delay covering the bulk of the clip (`clip length - transition`),
//! 2. a per-frame wait while the weights interpolate back to idle.
//!
//! Cancellation is cooperative. [`CancellationToken::cancel`] only flips a
//! flag; the task notices it at its next resume and exits without touching
//! the mixer. All weight writes of one step happen inside a single resume,
//! so a cancelled task never leaves a half-written step behind. The
//! scheduler checks this from the outside: any mixer write made while a
//! cancelled task is resumed lands in [`TransitionStats::writes_after_cancel`].

use std::cell::Cell;
use std::rc::Rc;

use log::{debug, error, trace};
use smallvec::SmallVec;

use crate::graph::PlayableGraph;
use crate::mixer::MixerState;

/// Shared cancellation flag between a task and whoever spawned it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Rc<Cell<bool>>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn cancel(&self) {
        self.0.set(true);
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    /// Resting on the idle clip.
    #[default]
    Idle,
    /// A clip plays at full weight; no blend has started.
    Holding,
    /// Weights are moving from the one-shot clip back to idle.
    Blending,
    /// Superseded by a newer request.
    Cancelled,
}

/// Snapshot of a transition's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionState {
    pub active_idle_index: Option<usize>,
    pub target_index: usize,
    /// Seconds spent blending. Only grows during [`TransitionPhase::Blending`].
    pub elapsed: f32,
    pub transition_duration: f32,
    pub phase: TransitionPhase,
}

/// Counters over every task the scheduler has run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionStats {
    pub started: u32,
    pub completed: u32,
    pub cancelled: u32,
    /// Mixer writes observed while resuming a task whose token was
    /// already cancelled.
    pub writes_after_cancel: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Suspend {
    Delay(f32),
    NextFrame,
}

/// Result of resuming a task once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Completed,
    Cancelled,
}

/// Crossfade from a one-shot clip back to the idle clip.
#[derive(Debug)]
pub struct CrossfadeTask {
    state: TransitionState,
    idle_index: usize,
    suspend: Suspend,
    token: CancellationToken,
}

impl CrossfadeTask {
    /// `hold` is how long the one-shot plays at full weight before blending.
    #[must_use]
    pub fn new(
        idle_index: usize,
        target_index: usize,
        hold: f32,
        transition_duration: f32,
        token: CancellationToken,
    ) -> Self {
        Self {
            state: TransitionState {
                active_idle_index: Some(idle_index),
                target_index,
                elapsed: 0.0,
                transition_duration: transition_duration.max(0.0),
                phase: TransitionPhase::Holding,
            },
            idle_index,
            suspend: Suspend::Delay(hold.max(0.0)),
            token,
        }
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Runs the task up to its next suspension point.
    pub fn resume<G: PlayableGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        mixer: &mut MixerState,
        dt: f32,
    ) -> TaskStatus {
        if self.token.is_cancelled() {
            self.state.phase = TransitionPhase::Cancelled;
            return TaskStatus::Cancelled;
        }

        match self.suspend {
            Suspend::Delay(remaining) => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.suspend = Suspend::Delay(remaining);
                } else {
                    self.suspend = Suspend::NextFrame;
                    self.state.phase = TransitionPhase::Blending;
                }
                TaskStatus::Pending
            }
            Suspend::NextFrame => {
                self.state.elapsed += dt;
                let blend = blend_weight(self.state.elapsed, self.state.transition_duration);
                self.write_blend(graph, mixer, blend);
                trace!(
                    "Crossfade {} -> {}: blend {blend:.3}",
                    self.state.target_index, self.idle_index
                );

                if blend >= 1.0 {
                    self.state.phase = TransitionPhase::Idle;
                    TaskStatus::Completed
                } else {
                    TaskStatus::Pending
                }
            }
        }
    }

    fn write_blend<G: PlayableGraph + ?Sized>(
        &self,
        graph: &mut G,
        mixer: &mut MixerState,
        blend: f32,
    ) {
        let target = self.state.target_index;
        if target == self.idle_index {
            mixer.set_weight(graph, target, 1.0);
            return;
        }
        mixer.set_weight(graph, target, 1.0 - blend);
        mixer.set_weight(graph, self.idle_index, blend);
    }
}

/// Blend factor toward idle after `elapsed` seconds of a `duration` crossfade.
#[inline]
#[must_use]
pub fn blend_weight(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).clamp(0.0, 1.0)
    }
}

/// A task that finished during a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletedCrossfade {
    pub idle_index: usize,
    pub target_index: usize,
    pub elapsed: f32,
    pub transition_duration: f32,
}

/// Per-controller task list.
///
/// At most one task is live at a time. Cancelled tasks linger until their
/// next resume so they can observe the cancellation themselves.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    tasks: SmallVec<[CrossfadeTask; 2]>,
    stats: TransitionStats,
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels whatever is running and queues `task`.
    pub fn spawn(&mut self, task: CrossfadeTask) {
        self.cancel_all();
        debug!(
            "Spawned crossfade {} -> {}",
            task.state.target_index, task.idle_index
        );
        self.stats.started += 1;
        self.tasks.push(task);
    }

    pub fn cancel_all(&mut self) {
        for task in &mut self.tasks {
            if !task.token.is_cancelled() {
                task.token.cancel();
                task.state.phase = TransitionPhase::Cancelled;
            }
        }
    }

    /// The task that is not cancelled, if any.
    #[must_use]
    pub fn active(&self) -> Option<&CrossfadeTask> {
        self.tasks.iter().rev().find(|task| !task.is_cancelled())
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> TransitionStats {
        self.stats
    }

    /// Number of tasks still held, cancelled ones included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resumes every held task once and drops the ones that finished.
    pub fn tick<G: PlayableGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        mixer: &mut MixerState,
        dt: f32,
    ) -> Option<CompletedCrossfade> {
        let mut completed = None;
        let stats = &mut self.stats;

        self.tasks.retain(|task| {
            let was_cancelled = task.is_cancelled();
            let writes_before = mixer.writes;
            let status = task.resume(graph, mixer, dt);

            let leaked = mixer.writes.saturating_sub(writes_before);
            if was_cancelled && leaked > 0 {
                error!(
                    "Cancelled crossfade to slot {} wrote {leaked} mixer weights",
                    task.state.target_index
                );
                stats.writes_after_cancel += leaked;
            }

            match status {
                TaskStatus::Pending => true,
                TaskStatus::Cancelled => {
                    debug!(
                        "Crossfade to slot {} exited after cancellation",
                        task.state.target_index
                    );
                    stats.cancelled += 1;
                    false
                }
                TaskStatus::Completed => {
                    stats.completed += 1;
                    completed = Some(CompletedCrossfade {
                        idle_index: task.idle_index,
                        target_index: task.state.target_index,
                        elapsed: task.state.elapsed,
                        transition_duration: task.state.transition_duration,
                    });
                    false
                }
            }
        });

        completed
    }
}
