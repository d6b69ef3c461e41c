use std::sync::Arc;

use log::trace;
use rustc_hash::FxHashSet;
use slotmap::SlotMap;

use marionette_animation::{AnimationClip, LoopMode, PlayableGraph};
use marionette_core::NodeHandle;

#[derive(Debug)]
struct ClipNode {
    clip: Arc<AnimationClip>,
    time: f32,
    duration: f32,
    done: bool,
}

impl ClipNode {
    fn advance(&mut self, dt: f32) {
        if self.done {
            return;
        }
        let duration = self.duration;
        if duration <= 0.0 {
            self.done = true;
            return;
        }

        self.time += dt;

        match self.clip.loop_mode {
            LoopMode::Once => {
                if self.time >= duration {
                    self.time = duration;
                    self.done = true;
                }
            }
            LoopMode::Loop => {
                if self.time >= duration {
                    self.time %= duration;
                }
            }
            LoopMode::PingPong => {
                let double_duration = duration * 2.0;
                let mut t = self.time % double_duration;
                if t > duration {
                    t = double_duration - t;
                }
                self.time = t;
            }
        }
    }
}

#[derive(Debug)]
struct MixerNode {
    inputs: Vec<Option<NodeHandle>>,
    weights: Vec<f32>,
}

#[derive(Debug)]
enum Node {
    Clip(ClipNode),
    Mixer(MixerNode),
}

/// Counters for everything the graph has been asked to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes_created: u32,
    pub nodes_destroyed: u32,
    pub connections: u32,
    pub weight_writes: u32,
    pub evaluations: u32,
}

/// In-memory playable graph.
#[derive(Debug, Default)]
pub struct HeadlessGraph {
    nodes: SlotMap<NodeHandle, Node>,
    output: Option<NodeHandle>,
    playing: bool,
    destroyed: bool,
    rejected_clips: FxHashSet<String>,
    stats: GraphStats,
}

impl HeadlessGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes nodes created for `clip_name` come back already invalid, the way
    /// a host reports a clip it failed to instantiate.
    pub fn reject_clip(&mut self, clip_name: impl Into<String>) {
        self.rejected_clips.insert(clip_name.into());
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        self.stats
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    #[must_use]
    pub fn output(&self) -> Option<NodeHandle> {
        self.output
    }

    /// Number of nodes currently alive.
    #[must_use]
    pub fn live_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn live_mixers(&self) -> usize {
        self.nodes
            .values()
            .filter(|node| matches!(node, Node::Mixer(_)))
            .count()
    }

    /// Weights of every input of `mixer`; empty for unknown handles.
    #[must_use]
    pub fn weights(&self, mixer: NodeHandle) -> Vec<f32> {
        match self.nodes.get(mixer) {
            Some(Node::Mixer(m)) => m.weights.clone(),
            _ => Vec::new(),
        }
    }

    /// Source wired at every input of `mixer`.
    #[must_use]
    pub fn inputs(&self, mixer: NodeHandle) -> Vec<Option<NodeHandle>> {
        match self.nodes.get(mixer) {
            Some(Node::Mixer(m)) => m.inputs.clone(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn clip_name(&self, node: NodeHandle) -> Option<&str> {
        match self.nodes.get(node) {
            Some(Node::Clip(c)) => Some(c.clip.name.as_str()),
            _ => None,
        }
    }

    fn clip(&self, node: NodeHandle) -> Option<&ClipNode> {
        match self.nodes.get(node) {
            Some(Node::Clip(c)) => Some(c),
            _ => None,
        }
    }

    fn clip_mut(&mut self, node: NodeHandle) -> Option<&mut ClipNode> {
        match self.nodes.get_mut(node) {
            Some(Node::Clip(c)) => Some(c),
            _ => None,
        }
    }
}

impl PlayableGraph for HeadlessGraph {
    fn play(&mut self) {
        if !self.destroyed {
            self.playing = true;
        }
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn evaluate(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        self.stats.evaluations += 1;
        for node in self.nodes.values_mut() {
            if let Node::Clip(clip) = node {
                clip.advance(dt);
            }
        }
    }

    fn destroy_graph(&mut self) {
        let remaining = self.nodes.len() as u32;
        self.nodes.clear();
        self.stats.nodes_destroyed += remaining;
        self.output = None;
        self.playing = false;
        self.destroyed = true;
    }

    fn create_clip_node(&mut self, clip: &Arc<AnimationClip>) -> NodeHandle {
        self.stats.nodes_created += 1;
        let handle = self.nodes.insert(Node::Clip(ClipNode {
            clip: Arc::clone(clip),
            time: 0.0,
            duration: clip.duration,
            done: false,
        }));
        if self.rejected_clips.contains(&clip.name) {
            self.nodes.remove(handle);
            self.stats.nodes_destroyed += 1;
        }
        handle
    }

    fn create_mixer(&mut self, input_count: usize) -> NodeHandle {
        self.stats.nodes_created += 1;
        self.nodes.insert(Node::Mixer(MixerNode {
            inputs: vec![None; input_count],
            weights: vec![0.0; input_count],
        }))
    }

    fn is_valid(&self, node: NodeHandle) -> bool {
        self.nodes.contains_key(node)
    }

    fn destroy(&mut self, node: NodeHandle) {
        if self.nodes.remove(node).is_some() {
            self.stats.nodes_destroyed += 1;
            if self.output == Some(node) {
                self.output = None;
            }
        }
    }

    fn connect(&mut self, source: NodeHandle, mixer: NodeHandle, input: usize) -> bool {
        if !self.nodes.contains_key(source) {
            return false;
        }
        let Some(Node::Mixer(m)) = self.nodes.get_mut(mixer) else {
            return false;
        };
        match m.inputs.get_mut(input) {
            Some(slot) => {
                *slot = Some(source);
                self.stats.connections += 1;
                true
            }
            None => false,
        }
    }

    fn set_output(&mut self, mixer: NodeHandle) {
        if self.nodes.contains_key(mixer) {
            self.output = Some(mixer);
        }
    }

    fn input_count(&self, mixer: NodeHandle) -> usize {
        match self.nodes.get(mixer) {
            Some(Node::Mixer(m)) => m.inputs.len(),
            _ => 0,
        }
    }

    fn set_input_weight(&mut self, mixer: NodeHandle, input: usize, weight: f32) {
        let Some(Node::Mixer(m)) = self.nodes.get_mut(mixer) else {
            return;
        };
        if let Some(w) = m.weights.get_mut(input) {
            *w = weight;
            self.stats.weight_writes += 1;
            trace!("Input {input} weight -> {weight:.3}");
        }
    }

    fn input_weight(&self, mixer: NodeHandle, input: usize) -> f32 {
        match self.nodes.get(mixer) {
            Some(Node::Mixer(m)) => m.weights.get(input).copied().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn set_time(&mut self, node: NodeHandle, time: f32) {
        if let Some(clip) = self.clip_mut(node) {
            clip.time = time;
        }
    }

    fn time(&self, node: NodeHandle) -> f32 {
        self.clip(node).map_or(0.0, |c| c.time)
    }

    fn set_done(&mut self, node: NodeHandle, done: bool) {
        if let Some(clip) = self.clip_mut(node) {
            clip.done = done;
        }
    }

    fn is_done(&self, node: NodeHandle) -> bool {
        self.clip(node).is_some_and(|c| c.done)
    }

    fn set_duration(&mut self, node: NodeHandle, duration: f32) {
        if let Some(clip) = self.clip_mut(node) {
            clip.duration = duration.max(0.0);
        }
    }

    fn clip_length(&self, node: NodeHandle) -> f32 {
        self.clip(node).map_or(0.0, |c| c.clip.duration)
    }
}
