use slotmap::new_key_type;

new_key_type! {
    /// Opaque reference to a node owned by a host playable graph.
    ///
    /// A handle stays comparable after its node is destroyed; validity must be
    /// queried from the graph that issued it.
    pub struct NodeHandle;
}
