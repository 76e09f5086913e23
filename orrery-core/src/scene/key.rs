//! Entity Identity
//!
//! Every scene datablock that can participate in evaluation is addressed by
//! an [`EntityKey`]: its kind plus its unique name within that kind. The
//! dependency graph never owns entity data; keys are the only thing it
//! stores about the blocks it describes.

use std::fmt;

/// The kind of a scene datablock.
///
/// This is a closed set: the builder dispatches exhaustively over it, and
/// the evaluation engine can rely on no other kinds appearing in a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A scene root.
    Scene,
    /// An object placed in a scene.
    Object,
    /// Mesh geometry datablock.
    Mesh,
    /// Curve (or font) geometry datablock.
    Curve,
    /// Nurbs surface geometry datablock.
    Surface,
    /// Metaball geometry datablock.
    Metaball,
    /// Lattice geometry datablock.
    Lattice,
    /// Armature (rig) datablock.
    Armature,
    /// Lamp datablock.
    Lamp,
    /// Camera datablock.
    Camera,
    /// Material datablock.
    Material,
    /// Texture datablock.
    Texture,
    /// Shader/compositor node tree.
    NodeTree,
    /// World (background shading) datablock.
    World,
    /// Particle settings datablock.
    ParticleSettings,
    /// Shape-key datablock.
    Key,
    /// Reusable group of objects.
    Group,
}

/// Unique handle for a scene datablock.
///
/// Keys are cheap to clone and hash; they are what the graph's
/// entity-to-node lookup tables are keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    /// What kind of block this refers to.
    pub kind: EntityKind,
    /// The block's unique name within its kind.
    pub name: String,
}

impl EntityKey {
    /// Create a key from a kind and name.
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Key for a scene.
    pub fn scene(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Scene, name)
    }

    /// Key for an object.
    pub fn object(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Object, name)
    }

    /// Key for a material.
    pub fn material(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Material, name)
    }

    /// Key for a texture.
    pub fn texture(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Texture, name)
    }

    /// Key for a node tree.
    pub fn node_tree(name: impl Into<String>) -> Self {
        Self::new(EntityKind::NodeTree, name)
    }

    /// Key for a world.
    pub fn world(name: impl Into<String>) -> Self {
        Self::new(EntityKind::World, name)
    }

    /// Key for a lamp.
    pub fn lamp(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Lamp, name)
    }

    /// Key for a camera.
    pub fn camera(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Camera, name)
    }

    /// Key for an armature.
    pub fn armature(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Armature, name)
    }

    /// Key for a particle-settings block.
    pub fn particle_settings(name: impl Into<String>) -> Self {
        Self::new(EntityKind::ParticleSettings, name)
    }

    /// Key for a shape-key block.
    pub fn shape_key(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Key, name)
    }

    /// Key for a group.
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Group, name)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.name)
    }
}
