use slotmap::new_key_type;

new_key_type! {
    /// Generational handle to an entity in the world registry.
    ///
    /// A destroyed entity's handle never resolves again, even after its slot
    /// is reused, which is what makes lazy pruning of stale child links safe.
    pub struct Entity;

    /// Stable handle to a skeleton owned by the animation system.
    ///
    /// Stays valid while other skeletons are added or destroyed.
    pub struct SkeletonKey;
}
