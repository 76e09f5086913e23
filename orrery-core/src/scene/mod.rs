//! Scene Data Model
//!
//! This module defines the datablocks the dependency-graph builder walks:
//! scenes, objects, geometry, rigs, shading blocks, particle settings,
//! groups, and the [`SceneDb`] database that holds them all.
//!
//! The graph itself never owns any of this data. Every datablock has a
//! unique [`EntityKey`] (kind + name), and that key is the only thing the
//! graph records about it. Cross-references between blocks are by name;
//! resolving a name that does not exist yields `None`, which the builder
//! treats as "nothing to build" rather than an error.

mod anim;
mod db;
mod key;
mod object;
mod shading;

pub use anim::{AnimData, Driver};
pub use db::{
    Armature, Camera, Geometry, Group, KeyBlock, ParticleSettings, RigidBodyWorld, Scene, SceneDb,
};
pub use key::{EntityKey, EntityKind};
pub use object::{
    Constraint, ConstraintKind, GeometryKind, Modifier, Object, ObjectData, ParticleSystem,
    PoseChannel,
};
pub use shading::{Lamp, Material, NodeTree, Texture, TreeNodeRef, World};
