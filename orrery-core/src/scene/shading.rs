//! Shading Datablocks
//!
//! Materials, textures, node trees, worlds and lamps form a mutually
//! cross-referential web: a material owns a texture stack and a node tree;
//! node trees contain nodes that reference materials, textures, and nested
//! node trees; worlds and lamps own the same kinds of stacks. Cycles are
//! legal input (a material's node tree may reference that same material),
//! which is why the builder guards these five kinds with a visitation set.

use super::anim::AnimData;

/// A material datablock.
#[derive(Debug, Clone, Default)]
pub struct Material {
    /// Material name, unique among materials.
    pub name: String,
    /// Texture stack; empty slots are `None`.
    pub textures: Vec<Option<String>>,
    /// The material's shader node tree, if it uses nodes.
    pub node_tree: Option<String>,
    /// Animation data.
    pub anim: Option<AnimData>,
}

impl Material {
    /// Create an empty material.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A texture datablock.
#[derive(Debug, Clone, Default)]
pub struct Texture {
    /// Texture name, unique among textures.
    pub name: String,
    /// The texture's node tree, if it uses nodes.
    pub node_tree: Option<String>,
    /// Animation data.
    pub anim: Option<AnimData>,
}

impl Texture {
    /// Create an empty texture.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A reference held by one node inside a node tree.
///
/// Nodes without datablock references (math nodes, mix nodes, ...) carry no
/// dependency information, so the tree only records the referencing ones.
#[derive(Debug, Clone)]
pub enum TreeNodeRef {
    /// The node references a material.
    Material(String),
    /// The node references a texture.
    Texture(String),
    /// A group node embedding another tree.
    Group(String),
}

/// A shader or compositor node tree.
#[derive(Debug, Clone, Default)]
pub struct NodeTree {
    /// Tree name, unique among node trees.
    pub name: String,
    /// Datablock references held by the tree's nodes.
    pub nodes: Vec<TreeNodeRef>,
    /// Animation data.
    pub anim: Option<AnimData>,
}

impl NodeTree {
    /// Create an empty tree.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A world (background shading) datablock.
#[derive(Debug, Clone, Default)]
pub struct World {
    /// World name, unique among worlds.
    pub name: String,
    /// Texture stack; empty slots are `None`.
    pub textures: Vec<Option<String>>,
    /// The world's node tree, if it uses nodes.
    pub node_tree: Option<String>,
    /// Animation data.
    pub anim: Option<AnimData>,
}

impl World {
    /// Create an empty world.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A lamp datablock.
#[derive(Debug, Clone, Default)]
pub struct Lamp {
    /// Lamp name, unique among lamps.
    pub name: String,
    /// Texture stack; empty slots are `None`.
    pub textures: Vec<Option<String>>,
    /// The lamp's node tree, if it uses nodes.
    pub node_tree: Option<String>,
    /// Animation data.
    pub anim: Option<AnimData>,
}

impl Lamp {
    /// Create an empty lamp.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
