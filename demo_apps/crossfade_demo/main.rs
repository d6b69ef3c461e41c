//! Crossfade demo.
//!
//! Rests a character on its idle loop, fires a hit reaction, and prints the
//! mixer weights every frame until the crossfade back to idle completes.
//!
//! Run with `RUST_LOG=debug cargo run -p crossfade_demo` to see the
//! controller's own logging.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::info;
use marionette::prelude::*;
use marionette::{ActiveSlotChanged, ClipSetManifest};
use marionette_dev_utils::HeadlessGraph;

const MANIFEST: &str = r#"{
  "clips": [
    { "clip": "idle",   "transition_duration": 0.0 },
    { "clip": "walk",   "transition_duration": 0.2 },
    { "clip": "run",    "transition_duration": 0.2 },
    { "clip": "hit",    "transition_duration": 0.25, "break_points": [0.3] },
    { "clip": "death",  "transition_duration": 0.0 },
    { "clip": "defend", "transition_duration": 0.15, "break_points": [0.2, 0.8] }
  ]
}"#;

const FRAME: Duration = Duration::from_millis(16);

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let library = vec![
        Arc::new(AnimationClip::looped("idle", 2.0)),
        Arc::new(AnimationClip::looped("walk", 1.0)),
        Arc::new(AnimationClip::looped("run", 0.6)),
        Arc::new(AnimationClip::one_shot("hit", 0.6)),
        Arc::new(AnimationClip::one_shot("death", 1.2)),
        Arc::new(AnimationClip::one_shot("defend", 0.8)),
    ];
    let clip_set = ClipSetManifest::from_json(MANIFEST)?.resolve(&library);
    if !clip_set.covers_base_set() {
        log::warn!("Unassigned animations: {:?}", clip_set.unassigned_base_names());
    }

    let mut controller = PlaybackController::new(HeadlessGraph::new());
    controller.add_listener(|event: &ActiveSlotChanged| {
        info!(
            "Active slot {:?} -> {} ({:?})",
            event.previous, event.current, event.cause
        );
    });
    let registration = controller.register_clip_set(&clip_set)?;
    for (slot, err) in &registration.skipped {
        log::warn!("Slot {slot} ({}) left empty: {err}", controller.resolver().slot_label(*slot));
    }

    controller.play_loop(BaseAnimation::Idle)?;
    if let Err(err) = controller.play_loop(BaseAnimation::Hit) {
        info!("Expected rejection: {err}");
    }
    controller.force_play(BaseAnimation::Hit)?;
    info!(
        "Hit reaction: transition {:.2}s, break points {:?}",
        controller.transition_duration(BaseAnimation::Hit)?,
        controller.break_points(BaseAnimation::Hit)?
    );

    let mut clock = FrameClock::default();
    clock.next_frame();
    while controller.phase() != TransitionPhase::Idle {
        thread::sleep(FRAME);
        controller.tick(clock.next_frame());

        let state = controller.transition_state();
        if let Some(mixer) = controller.mixer() {
            info!(
                "frame {:>3} {:?}: idle {:.2} hit {:.2}",
                clock.frame_count,
                state.phase,
                mixer.weight(BaseAnimation::Idle.index()),
                mixer.weight(BaseAnimation::Hit.index())
            );
        }
    }

    let stats = controller.stats();
    info!(
        "Done after {} frames ({:.2}s simulated, {} clamped): \
         {} started, {} completed, {} cancelled",
        clock.frame_count,
        clock.simulated.as_secs_f32(),
        clock.clamped_frames,
        stats.started,
        stats.completed,
        stats.cancelled
    );
    controller.teardown();
    Ok(())
}
