//! Shading Build
//!
//! Materials, textures, node trees, worlds and lamps are mutually
//! recursive: a material reaches its texture stack and node tree, a node
//! tree reaches any material, texture or nested tree its nodes reference,
//! and each of those can reach back into the entity already being built.
//!
//! Every routine here follows the same guarded template:
//!
//! 1. if the entity is on the recursion stack, return (cycle);
//! 2. if the entity already has an id node this pass, return (shared
//!    datablock, already represented);
//! 3. tag, create the id node, build animation, recurse into owned
//!    stacks/trees, untag.
//!
//! Step 2 decouples node creation from reference registration: an entity
//! reached through several owners is built once, and the relation pass
//! adds one incoming edge per referencing owner afterwards.

use tracing::trace;

use crate::graph::{ComponentKey, ComponentKind};
use crate::scene::{EntityKey, TreeNodeRef};

use super::DepsgraphBuilder;

impl DepsgraphBuilder<'_, '_> {
    /// True when the guarded routine for `key` should return without
    /// building: the entity is on the recursion stack or already built.
    fn shading_done(&self, key: &EntityKey) -> bool {
        self.visited.is_tagged(key) || self.graph.find_id_node(key).is_some()
    }

    /// Recursively build nodes for a material.
    pub(crate) fn build_material(&mut self, name: &str) {
        let Some(material) = self.db.material(name) else {
            return;
        };
        let key = EntityKey::material(material.name.clone());
        if self.shading_done(&key) {
            return;
        }
        self.visited.tag(key.clone());
        trace!(material = %material.name, "building material nodes");

        self.graph.add_id_node(&key);
        self.build_animdata(&key, material.anim.as_ref());
        self.build_texture_stack(&material.textures);
        if let Some(tree) = &material.node_tree {
            self.build_nodetree(tree);
        }

        self.visited.untag(&key);
    }

    /// Recursively build nodes for a texture.
    pub(crate) fn build_texture(&mut self, name: &str) {
        let Some(texture) = self.db.texture(name) else {
            return;
        };
        let key = EntityKey::texture(texture.name.clone());
        if self.shading_done(&key) {
            return;
        }
        self.visited.tag(key.clone());
        trace!(texture = %texture.name, "building texture nodes");

        self.graph.add_id_node(&key);
        self.build_animdata(&key, texture.anim.as_ref());
        if let Some(tree) = &texture.node_tree {
            self.build_nodetree(tree);
        }

        self.visited.untag(&key);
    }

    /// Build every non-empty slot of a texture stack.
    pub(crate) fn build_texture_stack(&mut self, stack: &[Option<String>]) {
        for slot in stack.iter().flatten() {
            self.build_texture(slot);
        }
    }

    /// Recursively build nodes for a node tree and every datablock its
    /// nodes reference.
    pub(crate) fn build_nodetree(&mut self, name: &str) {
        let Some(tree) = self.db.node_tree(name) else {
            return;
        };
        let key = EntityKey::node_tree(tree.name.clone());
        if self.shading_done(&key) {
            return;
        }
        self.visited.tag(key.clone());
        trace!(tree = %tree.name, "building node-tree nodes");

        self.graph.add_id_node(&key);
        self.build_animdata(&key, tree.anim.as_ref());
        for node in &tree.nodes {
            match node {
                TreeNodeRef::Material(material) => self.build_material(material),
                TreeNodeRef::Texture(texture) => self.build_texture(texture),
                TreeNodeRef::Group(nested) => self.build_nodetree(nested),
            }
        }

        self.visited.untag(&key);
    }

    /// Recursively build nodes for a world.
    pub(crate) fn build_world(&mut self, name: &str) {
        let Some(world) = self.db.world(name) else {
            return;
        };
        let key = EntityKey::world(world.name.clone());
        if self.shading_done(&key) {
            return;
        }
        self.visited.tag(key.clone());
        trace!(world = %world.name, "building world nodes");

        self.graph.add_id_node(&key);
        self.build_animdata(&key, world.anim.as_ref());
        self.build_texture_stack(&world.textures);
        if let Some(tree) = &world.node_tree {
            self.build_nodetree(tree);
        }

        self.visited.untag(&key);
    }

    /// Recursively build nodes for a lamp. Lamp settings live on a
    /// parameters component; its node tree and texture stack recurse into
    /// the shading web like any material's.
    pub(crate) fn build_lamp(&mut self, name: &str) {
        let Some(lamp) = self.db.lamp(name) else {
            return;
        };
        let key = EntityKey::lamp(lamp.name.clone());
        if self.shading_done(&key) {
            return;
        }
        self.visited.tag(key.clone());
        trace!(lamp = %lamp.name, "building lamp nodes");

        self.graph
            .add_component_node(&key, ComponentKey::new(ComponentKind::Parameters));
        self.build_animdata(&key, lamp.anim.as_ref());
        if let Some(tree) = &lamp.node_tree {
            self.build_nodetree(tree);
        }
        self.build_texture_stack(&lamp.textures);

        self.visited.untag(&key);
    }
}
