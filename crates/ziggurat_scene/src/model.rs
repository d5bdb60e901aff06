use rustc_hash::FxHashMap;
use ziggurat_core::Entity;

/// Links an imported model's root entity to the entities spawned for its nodes.
///
/// Node animation channels are keyed by imported node id; playback uses this
/// table to find the entity each channel drives.
#[derive(Debug, Clone, Default)]
pub struct ImportedModelComponent {
    pub node_to_entity: FxHashMap<usize, Entity>,
}

impl ImportedModelComponent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_node(mut self, node: usize, entity: Entity) -> Self {
        self.node_to_entity.insert(node, entity);
        self
    }

    #[inline]
    #[must_use]
    pub fn entity_for_node(&self, node: usize) -> Option<Entity> {
        self.node_to_entity.get(&node).copied()
    }
}
