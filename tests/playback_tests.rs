//! Playback Controller Tests
//!
//! Tests for:
//! - play_loop / force_play / force_stay weight layouts
//! - Crossfade-back phases and convergence to the idle clip
//! - Cancellation of in-flight crossfades
//! - Positional default clip sets: repeated assets, unassigned entries
//! - Mixer rebuilds during playback, addon names, events, teardown

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use marionette::{
    ActiveSlotChanged, AnimationClip, AnimationClipInfo, AnimationError, BASE_COUNT,
    BaseAnimation, ClipSetManifest, IndexAddon, PlayableGraph, PlaybackController, PlaybackSettings,
    RegistrationPolicy, SlotChangeCause, TransitionPhase,
};
use marionette_dev_utils::HeadlessGraph;

const EPSILON: f32 = 1e-4;

/// Exactly representable frame delta, so phase boundaries land on known frames.
const DT: f32 = 0.125;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn looped(name: &str, length: f32) -> AnimationClipInfo {
    AnimationClipInfo::new(Arc::new(AnimationClip::looped(name, length)), 0.0)
}

fn one_shot(name: &str, length: f32, transition: f32) -> AnimationClipInfo {
    AnimationClipInfo::new(Arc::new(AnimationClip::one_shot(name, length)), transition)
}

fn controller_with(infos: &[AnimationClipInfo]) -> PlaybackController<HeadlessGraph> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut controller = PlaybackController::new(HeadlessGraph::new());
    controller
        .register_default_clips(infos)
        .expect("default clips should register");
    controller
}

/// idle (loop, 1s) | hit (one-shot, 1s, 0.25s out) | stagger (one-shot, 2s, 0.5s out)
fn standard_controller() -> PlaybackController<HeadlessGraph> {
    controller_with(&[
        looped("idle", 1.0),
        one_shot("hit", 1.0, 0.25),
        one_shot("stagger", 2.0, 0.5),
    ])
}

fn weights(controller: &PlaybackController<HeadlessGraph>) -> Vec<f32> {
    let mixer = controller.mixer().expect("mixer should exist");
    controller.graph().weights(mixer.node)
}

fn run_frames(controller: &mut PlaybackController<HeadlessGraph>, frames: usize) {
    for _ in 0..frames {
        controller.tick(DT);
    }
}

fn run_until_idle(controller: &mut PlaybackController<HeadlessGraph>, dt: f32) -> usize {
    for frame in 1..=1000 {
        controller.tick(dt);
        if controller.phase() == TransitionPhase::Idle {
            return frame;
        }
    }
    panic!("crossfade never completed");
}

// ============================================================================
// Loop playback
// ============================================================================

#[test]
fn play_loop_rests_on_target() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();

    assert_eq!(weights(&controller), vec![1.0, 0.0, 0.0]);
    assert_eq!(controller.active_idle_index(), Some(0));
    assert_eq!(controller.active_slot(), Some(0));
    assert_eq!(controller.phase(), TransitionPhase::Idle);
}

#[test]
fn play_loop_on_one_shot_clip_keeps_previous_state() {
    let mut controller = standard_controller();
    controller.play_loop(BaseAnimation::Idle).unwrap();

    let result = controller.play_loop(1_usize);
    assert!(matches!(
        result,
        Err(AnimationError::NotLoopable { slot: 1, .. })
    ));
    assert_eq!(controller.active_idle_index(), Some(0));
    assert_eq!(weights(&controller), vec![1.0, 0.0, 0.0]);
}

#[test]
fn unknown_ids_fail_without_side_effects() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();
    let writes = controller.graph().stats().weight_writes;

    assert!(matches!(
        controller.force_play(BaseAnimation::Defend),
        Err(AnimationError::IndexOutOfRange { .. })
    ));
    assert!(matches!(
        controller.force_play("Backflip"),
        Err(AnimationError::UnresolvedName(_))
    ));
    assert_eq!(controller.graph().stats().weight_writes, writes);
    assert_eq!(controller.stats().started, 0);
}

// ============================================================================
// One-shot playback & crossfade-back
// ============================================================================

#[test]
fn force_play_walks_through_holding_and_blending() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();
    controller.force_play(1_usize).unwrap();

    assert_eq!(weights(&controller), vec![0.0, 1.0, 0.0]);
    assert_eq!(controller.phase(), TransitionPhase::Holding);

    // Holds for 1.0 - 0.25 = 0.75s: the delay runs out on the 6th frame.
    run_frames(&mut controller, 5);
    assert_eq!(controller.phase(), TransitionPhase::Holding);
    run_frames(&mut controller, 1);
    assert_eq!(controller.phase(), TransitionPhase::Blending);
    assert_eq!(weights(&controller), vec![0.0, 1.0, 0.0]);

    run_frames(&mut controller, 1);
    let state = controller.transition_state();
    assert_eq!(state.phase, TransitionPhase::Blending);
    assert!(approx(state.elapsed, 0.125));
    let w = weights(&controller);
    assert!(approx(w[0], 0.5) && approx(w[1], 0.5), "got {w:?}");

    run_frames(&mut controller, 1);
    assert_eq!(controller.phase(), TransitionPhase::Idle);
    assert_eq!(weights(&controller), vec![1.0, 0.0, 0.0]);
    assert_eq!(controller.active_slot(), Some(0));

    let state = controller.transition_state();
    assert!(state.elapsed >= state.transition_duration);
    assert_eq!(controller.stats().completed, 1);
    assert_eq!(controller.pending_tasks(), 0);
}

#[test]
fn elapsed_only_grows_while_blending() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();
    controller.force_play(2_usize).unwrap();

    let mut last = 0.0;
    for _ in 0..40 {
        controller.tick(DT);
        let state = controller.transition_state();
        match state.phase {
            TransitionPhase::Holding => assert_eq!(state.elapsed, 0.0),
            TransitionPhase::Blending => assert!(state.elapsed >= last),
            _ => break,
        }
        last = state.elapsed;
    }
    assert_eq!(controller.phase(), TransitionPhase::Idle);
}

#[test]
fn idle_and_one_shot_round_trip_converges_to_idle() {
    let mut controller = controller_with(&[looped("A", 1.0), one_shot("B", 0.5, 0.2)]);

    controller.play_loop(0_usize).unwrap();
    controller.force_play(1_usize).unwrap();
    run_until_idle(&mut controller, 1.0 / 60.0);

    let w = weights(&controller);
    assert!(approx(w[0], 1.0), "idle weight {}", w[0]);
    assert!(approx(w[1], 0.0), "one-shot weight {}", w[1]);
    assert_eq!(controller.active_slot(), Some(0));
    assert_eq!(controller.phase(), TransitionPhase::Idle);
}

#[test]
fn zero_transition_snaps_back_on_first_blend_frame() {
    let mut controller = controller_with(&[looped("idle", 1.0), one_shot("jab", 0.5, 0.0)]);
    controller.play_loop(0_usize).unwrap();
    controller.force_play(1_usize).unwrap();

    // Delay of 0.5s ends on frame 4; frame 5 blends fully.
    run_frames(&mut controller, 4);
    assert_eq!(controller.phase(), TransitionPhase::Blending);
    run_frames(&mut controller, 1);
    assert_eq!(controller.phase(), TransitionPhase::Idle);
    assert_eq!(weights(&controller), vec![1.0, 0.0]);
}

#[test]
fn transition_longer_than_clip_blends_immediately() {
    let mut controller = controller_with(&[looped("idle", 1.0), one_shot("flinch", 0.25, 0.5)]);
    controller.play_loop(0_usize).unwrap();
    controller.force_play(1_usize).unwrap();

    run_frames(&mut controller, 1);
    assert_eq!(controller.phase(), TransitionPhase::Blending);
    let frames = run_until_idle(&mut controller, DT);
    assert_eq!(frames, 4);
}

#[test]
fn completed_one_shot_is_rewound() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();
    controller.force_play(1_usize).unwrap();
    run_until_idle(&mut controller, DT);

    let hit = controller.registry().resolve_slot(1).unwrap().node;
    assert_eq!(controller.graph().time(hit), 0.0);
    assert!(!controller.graph().is_done(hit));
}

#[test]
fn force_play_without_resting_clip_holds() {
    let mut controller = standard_controller();
    controller.force_play(1_usize).unwrap();

    assert_eq!(controller.phase(), TransitionPhase::Holding);
    assert_eq!(controller.pending_tasks(), 0);
    run_frames(&mut controller, 20);
    assert_eq!(weights(&controller), vec![0.0, 1.0, 0.0]);
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn second_force_play_cancels_blending_task() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();
    controller.force_play(1_usize).unwrap();

    run_frames(&mut controller, 7);
    assert_eq!(controller.phase(), TransitionPhase::Blending);

    controller.force_play(2_usize).unwrap();
    assert_eq!(weights(&controller), vec![0.0, 0.0, 1.0]);
    assert_eq!(controller.pending_tasks(), 2);
    assert_eq!(controller.transition_state().target_index, 2);

    // The cancelled task exits on this frame and the new one is still
    // holding, so nothing may reach the host mixer.
    let host_writes = controller.graph().stats().weight_writes;
    run_frames(&mut controller, 1);
    assert_eq!(controller.pending_tasks(), 1);
    assert_eq!(controller.graph().stats().weight_writes, host_writes);
    assert_eq!(weights(&controller), vec![0.0, 0.0, 1.0]);

    let stats = controller.stats();
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.writes_after_cancel, 0);

    run_until_idle(&mut controller, DT);
    assert_eq!(weights(&controller), vec![1.0, 0.0, 0.0]);
    assert_eq!(controller.stats().completed, 1);
}

#[test]
fn play_loop_cancels_holding_task() {
    let mut controller = controller_with(&[
        looped("idle", 1.0),
        looped("walk", 1.0),
        one_shot("hit", 1.0, 0.25),
    ]);
    controller.play_loop(0_usize).unwrap();
    controller.force_play(2_usize).unwrap();
    run_frames(&mut controller, 2);

    controller.play_loop(1_usize).unwrap();
    run_frames(&mut controller, 20);

    assert_eq!(weights(&controller), vec![0.0, 1.0, 0.0]);
    assert_eq!(controller.active_idle_index(), Some(1));
    assert_eq!(controller.stats().cancelled, 1);
    assert_eq!(controller.stats().completed, 0);
}

#[test]
fn force_stay_freezes_without_crossfade() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();
    controller.force_play(1_usize).unwrap();
    run_frames(&mut controller, 7);

    controller.force_stay(2_usize).unwrap();
    assert_eq!(controller.phase(), TransitionPhase::Holding);
    run_frames(&mut controller, 50);

    assert_eq!(weights(&controller), vec![0.0, 0.0, 1.0]);
    assert_eq!(controller.phase(), TransitionPhase::Holding);
    assert_eq!(controller.stats().writes_after_cancel, 0);
}

// ============================================================================
// Registration during playback
// ============================================================================

#[test]
fn force_play_info_registers_and_rebuilds() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();
    let old_mixer = controller.mixer().unwrap().node;

    let slot = controller
        .force_play_info(&one_shot("kick", 1.0, 0.25))
        .unwrap();

    assert_eq!(slot, 3);
    assert!(!controller.graph().is_valid(old_mixer));
    assert_eq!(controller.graph().live_mixers(), 1);
    assert_eq!(controller.mixer().unwrap().input_count, 4);
    assert_eq!(weights(&controller), vec![0.0, 0.0, 0.0, 1.0]);

    // Same name again reuses the slot.
    let again = controller
        .force_play_info(&one_shot("kick", 3.0, 1.0))
        .unwrap();
    assert_eq!(again, 3);
    assert_eq!(controller.registry().len(), 4);
    assert!(approx(controller.transition_duration(3_usize).unwrap(), 0.25));

    run_until_idle(&mut controller, DT);
    assert_eq!(weights(&controller), vec![1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn force_play_info_with_missing_clip_is_rejected() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();

    let result = controller.force_play_info(&AnimationClipInfo::unassigned(0.2));
    assert!(matches!(result, Err(AnimationError::InvalidClip(_))));
    assert_eq!(controller.registry().len(), 3);
    assert_eq!(weights(&controller), vec![1.0, 0.0, 0.0]);
}

#[test]
fn crossfade_survives_mixer_rebuild() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();
    controller.force_play(1_usize).unwrap();
    run_frames(&mut controller, 2);

    controller
        .register_default_clips(&[looped("walk", 1.0)])
        .unwrap();
    assert_eq!(controller.mixer().unwrap().input_count, 4);
    assert_eq!(weights(&controller), vec![0.0, 1.0, 0.0, 0.0]);

    run_until_idle(&mut controller, DT);
    assert_eq!(weights(&controller), vec![1.0, 0.0, 0.0, 0.0]);
}

#[test]
fn strict_default_registration_stops_at_duplicate() {
    let _ = env_logger::builder().is_test(true).try_init();
    let settings = PlaybackSettings {
        registration: RegistrationPolicy::Strict,
        ..Default::default()
    };
    let mut controller = PlaybackController::with_settings(HeadlessGraph::new(), settings);

    let result =
        controller.register_default_clips(&[looped("idle", 1.0), looped("idle", 2.0)]);
    assert!(matches!(result, Err(AnimationError::DuplicateClip(_))));
    assert_eq!(controller.registry().len(), 1);
    assert_eq!(controller.mixer().unwrap().input_count, 1);
}

#[test]
fn reload_replaces_clip_set() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();
    let old_nodes: Vec<_> = controller.registry().entries().map(|e| e.node).collect();

    controller
        .reload_default_clips(&[looped("swim", 1.5), one_shot("dive", 1.0, 0.25)])
        .unwrap();

    assert!(old_nodes.iter().all(|&n| !controller.graph().is_valid(n)));
    assert_eq!(controller.registry().len(), 2);
    assert_eq!(controller.active_slot(), None);
    assert_eq!(controller.graph().live_nodes(), 3);
}

#[test]
fn manifest_clip_set_keeps_positions_after_unassigned_slot() {
    let library = vec![
        Arc::new(AnimationClip::looped("idle", 1.0)),
        Arc::new(AnimationClip::looped("walk", 1.0)),
        Arc::new(AnimationClip::one_shot("hit", 0.5)),
    ];
    let manifest = ClipSetManifest::from_json(
        r#"{ "clips": [
            { "clip": "idle" },
            { "clip": "walk", "transition_duration": 0.1, "break_points": [0.25, 0.75] },
            { "clip": "run" },
            { "clip": "hit", "transition_duration": 0.2 }
        ] }"#,
    )
    .unwrap();
    let set = manifest.resolve(&library);

    let mut controller = PlaybackController::new(HeadlessGraph::new());
    let report = controller.register_clip_set(&set).unwrap();

    assert_eq!(report.slots, vec![0, 1, 2, 3]);
    assert_eq!(report.skipped.len(), 1);
    assert!(matches!(report.skipped[0], (2, AnimationError::InvalidClip(_))));
    assert!(controller.registry().is_reserved(2));
    assert_eq!(controller.mixer().unwrap().input_count, 4);
    assert_eq!(controller.mixer().unwrap().wired[2], None);
    assert_eq!(
        controller.break_points(BaseAnimation::Walk).unwrap(),
        &[0.25, 0.75]
    );

    controller.play_loop(BaseAnimation::Idle).unwrap();
    controller.force_play(BaseAnimation::Hit).unwrap();
    assert_eq!(controller.active_slot(), Some(BaseAnimation::Hit.index()));
    assert!(approx(
        controller.transition_duration(BaseAnimation::Hit).unwrap(),
        0.2
    ));
    assert!(matches!(
        controller.force_play(BaseAnimation::Run),
        Err(AnimationError::NotFound(_))
    ));
    assert_eq!(controller.active_slot(), Some(BaseAnimation::Hit.index()));
}

#[test]
fn strict_clip_set_stops_at_unassigned_slot() {
    let settings = PlaybackSettings {
        registration: RegistrationPolicy::Strict,
        ..Default::default()
    };
    let mut controller = PlaybackController::with_settings(HeadlessGraph::new(), settings);

    let result = controller.register_default_clips(&[
        looped("idle", 1.0),
        AnimationClipInfo::unassigned(0.1),
        one_shot("hit", 0.5, 0.2),
    ]);

    assert!(matches!(result, Err(AnimationError::InvalidClip(_))));
    assert_eq!(controller.registry().len(), 1);
    assert_eq!(controller.mixer().unwrap().input_count, 1);
}

#[test]
fn shared_clip_asset_keeps_base_ids_on_their_own_slots() {
    let walk = Arc::new(AnimationClip::looped("walk", 1.0));
    let controller_infos = [
        looped("idle", 1.0),
        AnimationClipInfo::new(Arc::clone(&walk), 0.1),
        AnimationClipInfo::new(walk, 0.1),
        one_shot("hit", 0.5, 0.2),
        one_shot("death", 1.5, 0.0),
        one_shot("defend", 0.8, 0.25),
    ];
    let _ = env_logger::builder().is_test(true).try_init();
    let mut controller = PlaybackController::new(HeadlessGraph::new());

    let report = controller.register_default_clips(&controller_infos).unwrap();
    assert_eq!(report.slots, vec![0, 1, 2, 3, 4, 5]);
    assert!(report.is_complete());
    assert_eq!(controller.registry().len(), BASE_COUNT);

    controller.play_loop(BaseAnimation::Idle).unwrap();
    controller.force_play(BaseAnimation::Hit).unwrap();
    let active = controller.active_slot().unwrap();
    assert_eq!(active, BaseAnimation::Hit.index());
    assert_eq!(controller.registry().resolve_slot(active).unwrap().name, "hit");

    controller.force_play(BaseAnimation::Defend).unwrap();
    assert_eq!(controller.active_slot(), Some(BaseAnimation::Defend.index()));

    // Walk and Run share one asset but loop on separate inputs.
    controller.play_loop(BaseAnimation::Run).unwrap();
    assert_eq!(weights(&controller), vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
}

// ============================================================================
// Addon names
// ============================================================================

struct EmoteAddon {
    names: Vec<String>,
}

impl IndexAddon for EmoteAddon {
    fn additional_index_names(&self) -> &[String] {
        &self.names
    }

    fn original_index_by_name(&self, name: &str) -> Option<i32> {
        self.names.iter().position(|n| n == name).map(|i| i as i32)
    }
}

#[test]
fn addon_names_play_slots_after_base_range() {
    let mut infos = vec![looped("idle", 1.0)];
    for name in ["walk", "run", "hit", "death", "defend"] {
        infos.push(one_shot(name, 1.0, 0.25));
    }
    infos.push(one_shot("wave", 1.0, 0.25));
    let mut controller = controller_with(&infos);
    controller
        .attach_addon(Box::new(EmoteAddon {
            names: vec!["Wave".to_string()],
        }))
        .unwrap();

    controller.play_loop(BaseAnimation::Idle).unwrap();
    controller.force_play("Wave").unwrap();

    assert_eq!(controller.active_slot(), Some(BASE_COUNT));
    assert_eq!(controller.resolver().slot_label(BASE_COUNT), "Wave");
    assert!(matches!(
        controller.force_play("Bow"),
        Err(AnimationError::UnresolvedName(_))
    ));
}

// ============================================================================
// Events
// ============================================================================

#[test]
fn listeners_see_every_active_slot_change() {
    let events: Rc<RefCell<Vec<ActiveSlotChanged>>> = Rc::default();
    let mut controller = standard_controller();
    let sink = Rc::clone(&events);
    controller.add_listener(move |event: &ActiveSlotChanged| sink.borrow_mut().push(*event));

    controller.play_loop(0_usize).unwrap();
    controller.play_loop(0_usize).unwrap();
    controller.force_play(1_usize).unwrap();
    run_until_idle(&mut controller, DT);

    let events = events.borrow();
    let seen: Vec<_> = events.iter().map(|e| (e.previous, e.current, e.cause)).collect();
    assert_eq!(
        seen,
        vec![
            (None, 0, SlotChangeCause::Loop),
            (Some(0), 1, SlotChangeCause::OneShot),
            (Some(1), 0, SlotChangeCause::CrossfadeComplete),
        ]
    );
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn teardown_releases_everything_once() {
    let mut controller = standard_controller();
    controller.play_loop(0_usize).unwrap();
    controller.force_play(1_usize).unwrap();

    controller.teardown();
    assert!(controller.is_torn_down());
    assert!(controller.graph().is_destroyed());
    assert_eq!(controller.graph().live_nodes(), 0);
    let destroyed = controller.graph().stats().nodes_destroyed;
    assert_eq!(destroyed, 4);

    controller.teardown();
    controller.tick(DT);
    assert_eq!(controller.graph().stats().nodes_destroyed, destroyed);
    assert!(controller.mixer().is_none());
}

#[test]
fn requests_after_teardown_create_no_nodes() {
    let mut controller = standard_controller();
    controller.teardown();
    let created = controller.graph().stats().nodes_created;

    assert!(matches!(
        controller.register_default_clips(&[looped("swim", 1.0)]),
        Err(AnimationError::TornDown(_))
    ));
    assert!(matches!(
        controller.force_play_info(&one_shot("kick", 1.0, 0.25)),
        Err(AnimationError::TornDown(_))
    ));
    assert!(matches!(
        controller.reload_default_clips(&[looped("swim", 1.0)]),
        Err(AnimationError::TornDown(_))
    ));
    assert!(matches!(
        controller.play_loop(0_usize),
        Err(AnimationError::TornDown(_))
    ));

    assert_eq!(controller.graph().stats().nodes_created, created);
    assert_eq!(controller.graph().live_nodes(), 0);
    assert!(controller.registry().is_empty());
}
