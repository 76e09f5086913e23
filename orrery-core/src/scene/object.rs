//! Objects
//!
//! An object is the placeable unit of a scene: a transform plus an optional
//! reference to type-specific data (geometry, an armature, a lamp, a
//! camera), a constraint stack, a modifier stack, material slots, and
//! particle systems. All references to other datablocks are by name; a
//! dangling name is treated as absence by the builder, never as an error.

use super::anim::AnimData;
use super::key::{EntityKey, EntityKind};

/// The geometry flavour of an object's datablock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// Polygon mesh.
    Mesh,
    /// Curve.
    Curve,
    /// Text object (evaluated through the curve pipeline).
    Font,
    /// Nurbs surface.
    Surface,
    /// Metaball. Only the family basis object gets a geometry operation.
    Metaball,
    /// Deformation lattice.
    Lattice,
}

impl GeometryKind {
    /// The entity kind of the underlying datablock.
    ///
    /// Font objects share the curve datablock kind; they also share its
    /// evaluation pipeline.
    pub fn entity_kind(self) -> EntityKind {
        match self {
            GeometryKind::Mesh => EntityKind::Mesh,
            GeometryKind::Curve | GeometryKind::Font => EntityKind::Curve,
            GeometryKind::Surface => EntityKind::Surface,
            GeometryKind::Metaball => EntityKind::Metaball,
            GeometryKind::Lattice => EntityKind::Lattice,
        }
    }
}

/// What an object's data reference points at.
#[derive(Debug, Clone, Default)]
pub enum ObjectData {
    /// An empty: no datablock at all.
    #[default]
    None,
    /// A geometry datablock.
    Geometry {
        /// Which geometry pipeline evaluates it.
        kind: GeometryKind,
        /// Name of the geometry datablock.
        name: String,
    },
    /// An armature datablock; the pose lives on the object.
    Armature {
        /// Name of the armature datablock.
        name: String,
    },
    /// A lamp datablock.
    Lamp {
        /// Name of the lamp datablock.
        name: String,
    },
    /// A camera datablock.
    Camera {
        /// Name of the camera datablock.
        name: String,
    },
}

/// One entry in an object's (or bone's) constraint stack.
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Constraint name.
    pub name: String,
    /// Discriminating payload.
    pub kind: ConstraintKind,
}

impl Constraint {
    /// A constraint with no special build-time handling.
    pub fn generic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::Generic,
        }
    }

    /// An IK constraint.
    pub fn ik(name: impl Into<String>, chain_length: u16, use_tip: bool) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::Ik {
                chain_length,
                use_tip,
            },
        }
    }

    /// A spline-IK constraint.
    pub fn spline_ik(name: impl Into<String>, chain_length: u16) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::SplineIk { chain_length },
        }
    }
}

/// Constraint payload.
///
/// Only the IK family needs build-time distinction: each IK/spline-IK
/// constraint on a bone produces an extra solver operation. Everything
/// else is evaluated inside the owner's monolithic constraint-stack
/// operation.
#[derive(Debug, Clone)]
pub enum ConstraintKind {
    /// Evaluated inside the constraint-stack operation.
    Generic,
    /// Inverse kinematics.
    Ik {
        /// How many chain segments the solver affects; 0 means the whole
        /// chain up to the skeleton root.
        chain_length: u16,
        /// Whether the constrained bone itself is part of the chain.
        use_tip: bool,
    },
    /// Spline-following inverse kinematics.
    SplineIk {
        /// How many chain segments follow the spline; 0 means the whole
        /// chain.
        chain_length: u16,
    },
}

/// One entry in an object's modifier stack.
#[derive(Debug, Clone)]
pub struct Modifier {
    /// Modifier name, unique within the stack.
    pub name: String,
}

impl Modifier {
    /// Create a named modifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A particle system instance attached to an object.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    /// Instance name, unique on the owning object.
    pub name: String,
    /// Name of the shared particle-settings datablock.
    pub settings: String,
}

/// One bone's evaluation channel in an armature object's pose.
#[derive(Debug, Clone)]
pub struct PoseChannel {
    /// Bone name, unique within the pose.
    pub name: String,
    /// Parent bone's channel name, if any.
    pub parent: Option<String>,
    /// The bone's constraint stack.
    pub constraints: Vec<Constraint>,
}

impl PoseChannel {
    /// A channel with no parent and no constraints.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            constraints: Vec::new(),
        }
    }

    /// A channel parented to another bone.
    pub fn child_of(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(parent.into()),
            constraints: Vec::new(),
        }
    }
}

/// A placeable scene object.
#[derive(Debug, Clone, Default)]
pub struct Object {
    /// Object name, unique among objects.
    pub name: String,
    /// Type-specific datablock reference.
    pub data: ObjectData,
    /// Parent object name, if parented.
    pub parent: Option<String>,
    /// Object-level constraint stack.
    pub constraints: Vec<Constraint>,
    /// Modifier stack, in evaluation order.
    pub modifiers: Vec<Modifier>,
    /// Material slots; empty slots are `None`.
    pub material_slots: Vec<Option<String>>,
    /// Attached particle systems.
    pub particle_systems: Vec<ParticleSystem>,
    /// Object this one is a proxy for. Proxy targets get their own full
    /// build, not a mere reference.
    pub proxy: Option<String>,
    /// Group this object instances, if any. Instanced groups are built
    /// once per scene as subgraphs.
    pub instance_group: Option<String>,
    /// Pose channels; only meaningful for armature objects.
    pub pose: Vec<PoseChannel>,
    /// The object's own animation data.
    pub anim: Option<AnimData>,
}

impl Object {
    /// Create an object with the given data reference.
    pub fn new(name: impl Into<String>, data: ObjectData) -> Self {
        Self {
            name: name.into(),
            data,
            ..Self::default()
        }
    }

    /// Create a mesh object.
    pub fn mesh(name: impl Into<String>, mesh: impl Into<String>) -> Self {
        Self::new(
            name,
            ObjectData::Geometry {
                kind: GeometryKind::Mesh,
                name: mesh.into(),
            },
        )
    }

    /// The object's graph identity.
    pub fn key(&self) -> EntityKey {
        EntityKey::object(self.name.clone())
    }

    /// Look up a pose channel by bone name.
    pub fn pose_channel(&self, name: &str) -> Option<&PoseChannel> {
        self.pose.iter().find(|chan| chan.name == name)
    }

    /// The key of the object's datablock, if it has one.
    pub fn data_key(&self) -> Option<EntityKey> {
        match &self.data {
            ObjectData::None => None,
            ObjectData::Geometry { kind, name } => {
                Some(EntityKey::new(kind.entity_kind(), name.clone()))
            }
            ObjectData::Armature { name } => Some(EntityKey::armature(name.clone())),
            ObjectData::Lamp { name } => Some(EntityKey::lamp(name.clone())),
            ObjectData::Camera { name } => Some(EntityKey::camera(name.clone())),
        }
    }
}
