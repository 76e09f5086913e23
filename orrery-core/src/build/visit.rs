//! Visitation Guard
//!
//! Shading datablocks cross-reference each other freely: a material's node
//! tree can reference the material itself, textures can reference node
//! trees that reference the same texture, and so on. The builder bounds
//! that recursion with a [`VisitSet`]: an entity is tagged while its own
//! build routine is on the stack and untagged when it returns, so the set
//! holds exactly the entities currently being built.
//!
//! The set is owned by the builder and scoped to one build pass. It is
//! never stored on the entities themselves, so concurrent or repeated
//! passes over the same database cannot interfere and a flag can never
//! leak across passes.

use std::collections::HashSet;

use crate::scene::EntityKey;

/// Build-pass-scoped set of entities currently on the recursion stack.
#[derive(Debug, Default)]
pub struct VisitSet {
    visited: HashSet<EntityKey>,
}

impl VisitSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the entity's build routine is currently on the stack.
    pub fn is_tagged(&self, key: &EntityKey) -> bool {
        self.visited.contains(key)
    }

    /// Tag an entity on entry to its build routine.
    pub fn tag(&mut self, key: EntityKey) {
        self.visited.insert(key);
    }

    /// Untag an entity on exit from its build routine.
    pub fn untag(&mut self, key: &EntityKey) {
        self.visited.remove(key);
    }

    /// Whether no entity is currently tagged.
    pub fn is_empty(&self) -> bool {
        self.visited.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_untag_round_trip() {
        let mut set = VisitSet::new();
        let key = EntityKey::material("Red");

        assert!(!set.is_tagged(&key));
        set.tag(key.clone());
        assert!(set.is_tagged(&key));
        set.untag(&key);
        assert!(!set.is_tagged(&key));
        assert!(set.is_empty());
    }

    #[test]
    fn tags_are_per_entity() {
        let mut set = VisitSet::new();
        set.tag(EntityKey::material("Red"));

        assert!(!set.is_tagged(&EntityKey::material("Blue")));
        assert!(!set.is_tagged(&EntityKey::texture("Red")));
    }
}
