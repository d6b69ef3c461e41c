//! Frame Clock
//!
//! Turns wall-clock instants into the per-frame delta fed to
//! `PlaybackController::tick`. A long stall (debugger, window drag, loading
//! hitch) would otherwise arrive as one huge delta and swallow a one-shot's
//! hold and blend in a single frame, so variable deltas are clamped.

use std::time::{Duration, Instant};

/// Upper bound applied to variable deltas by [`FrameClock::default`].
pub const DEFAULT_MAX_DELTA: Duration = Duration::from_millis(100);

/// How a [`FrameClock`] turns elapsed wall time into a frame delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStep {
    /// Measured wall time, capped at `max_delta`.
    Variable { max_delta: Duration },
    /// Always the same step, whatever the wall clock says.
    Fixed(Duration),
}

impl Default for FrameStep {
    fn default() -> Self {
        Self::Variable {
            max_delta: DEFAULT_MAX_DELTA,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    step: FrameStep,
    last_frame: Option<Instant>,
    /// Delta handed out by the last frame.
    pub delta: Duration,
    /// Sum of every delta handed out, i.e. simulated playback time.
    pub simulated: Duration,
    pub frame_count: u64,
    /// Frames whose measured delta exceeded the variable cap.
    pub clamped_frames: u64,
}

impl FrameClock {
    #[must_use]
    pub fn new(step: FrameStep) -> Self {
        Self {
            step,
            ..Self::default()
        }
    }

    /// Fixed-step clock, e.g. `FrameClock::fixed(60)` for 60 frames per second.
    #[must_use]
    pub fn fixed(frames_per_second: u32) -> Self {
        let fps = frames_per_second.max(1);
        Self::new(FrameStep::Fixed(Duration::from_secs(1) / fps))
    }

    #[inline]
    #[must_use]
    pub fn step(&self) -> FrameStep {
        self.step
    }

    /// Starts a frame at the current instant and returns its delta in seconds.
    pub fn next_frame(&mut self) -> f32 {
        self.advance_to(Instant::now())
    }

    /// Starts a frame at `now` and returns its delta in seconds.
    ///
    /// The first frame after construction has a zero delta in variable mode,
    /// since there is no previous frame to measure from. `now` earlier than
    /// the previous frame counts as zero elapsed time.
    pub fn advance_to(&mut self, now: Instant) -> f32 {
        let measured = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last_frame = Some(now);

        self.delta = match self.step {
            FrameStep::Fixed(step) => step,
            FrameStep::Variable { max_delta } if measured > max_delta => {
                self.clamped_frames += 1;
                max_delta
            }
            FrameStep::Variable { .. } => measured,
        };
        self.simulated += self.delta;
        self.frame_count += 1;
        self.delta.as_secs_f32()
    }

    #[inline]
    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}
