//! Host Graph Capabilities
//!
//! [`PlayableGraph`] is the seam between the blending logic and whatever
//! engine actually samples clips. The controller only ever talks to the host
//! through this trait; node storage, evaluation and pose output stay on the
//! host side.

use std::sync::Arc;

use marionette_core::NodeHandle;

use crate::clip::AnimationClip;

/// Node-graph context offered by the host engine.
///
/// Handles issued by one graph are meaningless to another. Every mutating
/// call on a handle that is no longer valid must be a silent no-op on the
/// host side; callers still check [`is_valid`](Self::is_valid) before
/// destroying anything.
pub trait PlayableGraph {
    // ---- Graph lifecycle ----

    /// Starts evaluating the graph.
    fn play(&mut self);

    /// Stops evaluating the graph.
    fn stop(&mut self);

    /// Advances the graph by `dt` seconds (clip node times move forward).
    fn evaluate(&mut self, dt: f32);

    /// Releases the whole graph and every node still alive in it.
    fn destroy_graph(&mut self);

    // ---- Nodes ----

    /// Creates a node sampling `clip`.
    fn create_clip_node(&mut self, clip: &Arc<AnimationClip>) -> NodeHandle;

    /// Creates a fan-in mixer with `input_count` inputs.
    fn create_mixer(&mut self, input_count: usize) -> NodeHandle;

    fn is_valid(&self, node: NodeHandle) -> bool;

    fn destroy(&mut self, node: NodeHandle);

    /// Wires `source` into `mixer` at `input`. Returns `false` if the host
    /// rejected the connection.
    fn connect(&mut self, source: NodeHandle, mixer: NodeHandle, input: usize) -> bool;

    /// Routes `mixer` to the character's animation output.
    fn set_output(&mut self, mixer: NodeHandle);

    // ---- Mixer inputs ----

    fn input_count(&self, mixer: NodeHandle) -> usize;

    fn set_input_weight(&mut self, mixer: NodeHandle, input: usize, weight: f32);

    fn input_weight(&self, mixer: NodeHandle, input: usize) -> f32;

    // ---- Clip playback ----

    fn set_time(&mut self, node: NodeHandle, time: f32);

    fn time(&self, node: NodeHandle) -> f32;

    fn set_done(&mut self, node: NodeHandle, done: bool);

    fn is_done(&self, node: NodeHandle) -> bool;

    fn set_duration(&mut self, node: NodeHandle, duration: f32);

    /// Total length of the clip sampled by `node`, in seconds.
    fn clip_length(&self, node: NodeHandle) -> f32;
}
