//! Mixer Graph Construction
//!
//! The host offers no safe way to append a single mixer input, so every
//! structural change to the clip set goes through [`MixerGraphBuilder::rebuild`]:
//! the old mixer is destroyed and a new one sized to the clip set is wired
//! from scratch. Slot indices therefore never shift under a live mixer.

use log::{debug, warn};

use marionette_core::NodeHandle;

use crate::graph::PlayableGraph;
use crate::registry::ClipEntry;

/// Live fan-in mixer and the weights last written to it.
#[derive(Debug, Clone)]
pub struct MixerState {
    pub node: NodeHandle,
    pub input_count: usize,
    /// One per input. Sums to 1 at rest; may exceed 1 while blending.
    pub weights: Vec<f32>,
    /// Clip node wired at each input, `None` where the host reported the
    /// clip node invalid.
    pub wired: Vec<Option<NodeHandle>>,
    /// Input weight writes issued to the host through this state.
    pub writes: u64,
}

impl MixerState {
    /// Writes `weight` to one input after re-checking the live input count.
    ///
    /// Returns `false` (and writes nothing) when `input` no longer exists,
    /// which happens if a rebuild shrank the mixer under a running task.
    pub fn set_weight<G: PlayableGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        input: usize,
        weight: f32,
    ) -> bool {
        let live = graph.input_count(self.node);
        if input >= live || input >= self.weights.len() {
            warn!("Skipping weight write to input {input}: mixer has {live} inputs");
            return false;
        }
        graph.set_input_weight(self.node, input, weight);
        self.weights[input] = weight;
        self.writes += 1;
        true
    }

    /// Zeroes every input and gives `target` full weight, as one step.
    pub fn set_exclusive<G: PlayableGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        target: usize,
    ) -> bool {
        let live = graph.input_count(self.node).min(self.weights.len());
        if target >= live {
            warn!("Skipping exclusive weight on input {target}: mixer has {live} inputs");
            return false;
        }
        for input in 0..live {
            let weight = if input == target { 1.0 } else { 0.0 };
            graph.set_input_weight(self.node, input, weight);
            self.weights[input] = weight;
        }
        self.writes += live as u64;
        true
    }

    #[inline]
    #[must_use]
    pub fn weight(&self, input: usize) -> f32 {
        self.weights.get(input).copied().unwrap_or(0.0)
    }

    /// Destroys the mixer node if the host still considers it valid.
    pub fn destroy<G: PlayableGraph + ?Sized>(&self, graph: &mut G) {
        if graph.is_valid(self.node) {
            graph.destroy(self.node);
        }
    }
}

pub struct MixerGraphBuilder;

impl MixerGraphBuilder {
    /// Replaces `previous` (if any) with a mixer holding one input per slot
    /// in `clips`. Reserved slots (`None`) are left unwired.
    ///
    /// Slot 0 is left unwritten: the caller establishes the resting weight with
    /// an explicit play request.
    pub fn rebuild<G: PlayableGraph + ?Sized>(
        graph: &mut G,
        previous: Option<MixerState>,
        clips: &[Option<ClipEntry>],
    ) -> MixerState {
        if let Some(previous) = previous {
            previous.destroy(graph);
        }

        let node = graph.create_mixer(clips.len());
        let mut wired = vec![None; clips.len()];

        for (input, slot) in clips.iter().enumerate() {
            let Some(entry) = slot else {
                debug!("Input {input} has no clip assigned, leaving it empty");
                continue;
            };
            if !graph.is_valid(entry.node) {
                warn!("Clip node for '{}' is invalid, leaving input {input} empty", entry.name);
                continue;
            }
            if graph.connect(entry.node, node, input) {
                wired[input] = Some(entry.node);
            } else {
                warn!("Host rejected connecting '{}' to input {input}", entry.name);
            }
        }

        for input in 1..clips.len() {
            graph.set_input_weight(node, input, 0.0);
        }

        graph.set_output(node);
        debug!(
            "Rebuilt mixer with {} inputs ({} wired)",
            clips.len(),
            wired.iter().flatten().count()
        );

        MixerState {
            node,
            input_count: clips.len(),
            weights: vec![0.0; clips.len()],
            wired,
            writes: 0,
        }
    }
}
