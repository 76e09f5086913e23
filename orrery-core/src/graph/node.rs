//! Graph Nodes
//!
//! This module defines the node types that live in the dependency graph.
//!
//! The node kinds form a closed set with strict ownership:
//!
//! - An [`IdNode`] represents one entity (datablock) and owns its
//!   component nodes. At most one id node exists per entity per graph.
//! - A [`ComponentNode`] represents one functional facet of an entity
//!   (transform, geometry, pose, one bone, ...) and owns its operations.
//!   At most one component exists per (entity, kind, sub-name) key.
//! - An [`OperationNode`] is the atomic schedulable unit: a bound callback
//!   plus an execution-phase discriminator, a debug name, and flags.
//!   Operations are inert during the build pass; a separate evaluation
//!   engine runs them later, possibly in parallel.
//! - A [`SubgraphNode`] wraps an independently built nested graph for a
//!   reusable group, opaque to the parent graph.
//! - The [`TimeSourceNode`] is the root every evaluation ultimately
//!   depends on.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::scene::EntityKey;

use super::depsgraph::Depsgraph;

/// Execution-phase discriminator on an operation.
///
/// The relation pass and evaluation engine use this to order work within a
/// component: `Init` runs first, `Post` last, `Rebuild` only on structural
/// changes, `Sim` for stepped simulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// One-time setup at the start of component evaluation.
    Init,
    /// Regular evaluation work.
    Exec,
    /// A simulation step (rigid body, IK solving).
    Sim,
    /// Structural rebuild, run only when topology changed.
    Rebuild,
    /// Flush/cleanup at the end of component evaluation.
    Post,
}

/// Scheduling flags on an operation, set during build and honored by the
/// evaluation engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationFlags {
    /// The operation runs interpreter-bound work (scripted expressions)
    /// and must be serialized against other such operations.
    pub uses_script: bool,
}

/// Context handed to operation callbacks by the evaluation engine.
///
/// The build pass never constructs one; it exists so operations can be
/// bound now and executed later.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    /// The frame being evaluated.
    pub frame: f64,
}

/// A bound evaluation callback.
///
/// `Send + Sync` because the evaluation engine may run operations from
/// multiple threads once the relation pass has established a partial
/// order.
pub type OpCallback = Arc<dyn Fn(&mut EvalContext) + Send + Sync>;

/// A callback that performs no work, for operations whose kernel is bound
/// by the embedding application.
pub fn noop_callback() -> OpCallback {
    Arc::new(|_ctx| {})
}

/// The functional facet of an entity a component node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// Generic parameters: drivers, settings, node-tree wrappers.
    Parameters,
    /// Object transform stack.
    Transform,
    /// Geometry evaluation (also hosts the object's terminal operation).
    Geometry,
    /// Armature pose evaluation context.
    Pose,
    /// One bone within a pose; keyed by bone name.
    Bone,
    /// Particle systems attached to an object.
    Particles,
}

/// Identity of a component within its owning entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    /// The component's facet.
    pub kind: ComponentKind,
    /// Sub-facet name; used by [`ComponentKind::Bone`] to key per bone.
    pub sub_name: Option<String>,
}

impl ComponentKey {
    /// A key with no sub-name.
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            sub_name: None,
        }
    }

    /// A key with a sub-name (e.g. a bone component).
    pub fn with_sub_name(kind: ComponentKind, sub_name: impl Into<String>) -> Self {
        Self {
            kind,
            sub_name: Some(sub_name.into()),
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sub_name {
            Some(sub) => write!(f, "{:?}[{sub}]", self.kind),
            None => write!(f, "{:?}", self.kind),
        }
    }
}

/// The atomic unit of schedulable work.
///
/// Created once during build and never merged: requesting the same
/// (component, opcode, name) twice is a caller bug the node model does not
/// paper over. Only the flags may be mutated after creation.
pub struct OperationNode {
    /// Entity this operation evaluates.
    pub owner: EntityKey,
    /// Component this operation belongs to.
    pub component: ComponentKey,
    /// Execution-phase discriminator.
    pub opcode: OpCode,
    /// The bound evaluation callback.
    pub callback: OpCallback,
    /// Human-readable name for debugging and relation lookup.
    pub name: String,
    /// Scheduling flags.
    pub flags: OperationFlags,
}

impl OperationNode {
    /// Mark the operation as interpreter-bound.
    pub fn set_uses_script(&mut self) {
        self.flags.uses_script = true;
    }
}

impl fmt::Debug for OperationNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationNode")
            .field("owner", &self.owner)
            .field("component", &self.component)
            .field("opcode", &self.opcode)
            .field("name", &self.name)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// One functional facet of an entity's evaluation.
///
/// Operations are stored in insertion order. That order is not a
/// schedule: the relation pass imposes the actual partial order later.
#[derive(Debug)]
pub struct ComponentNode {
    /// Entity owning this component.
    pub owner: EntityKey,
    /// The component's identity within its owner.
    pub key: ComponentKey,
    operations: SmallVec<[OperationNode; 4]>,
}

impl ComponentNode {
    pub(super) fn new(owner: EntityKey, key: ComponentKey) -> Self {
        Self {
            owner,
            key,
            operations: SmallVec::new(),
        }
    }

    /// Append a new operation. Always creates; never merges with an
    /// existing one.
    pub fn add_operation(
        &mut self,
        opcode: OpCode,
        callback: OpCallback,
        name: impl Into<String>,
    ) -> &mut OperationNode {
        self.operations.push(OperationNode {
            owner: self.owner.clone(),
            component: self.key.clone(),
            opcode,
            callback,
            name: name.into(),
            flags: OperationFlags::default(),
        });
        self.operations.last_mut().expect("just pushed")
    }

    /// Iterate operations in insertion order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationNode> {
        self.operations.iter()
    }

    /// Number of operations in this component.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    /// Find an operation by discriminator and name.
    pub fn find_operation(&self, opcode: OpCode, name: &str) -> Option<&OperationNode> {
        self.operations
            .iter()
            .find(|op| op.opcode == opcode && op.name == name)
    }
}

/// The graph node for one entity.
///
/// Owns the entity's components, keyed so that repeated requests for the
/// same facet return the same node.
#[derive(Debug)]
pub struct IdNode {
    /// The entity this node represents.
    pub key: EntityKey,
    components: IndexMap<ComponentKey, ComponentNode>,
}

impl IdNode {
    pub(super) fn new(key: EntityKey) -> Self {
        Self {
            key,
            components: IndexMap::new(),
        }
    }

    /// Get or create the component with the given key.
    pub fn add_component(&mut self, key: ComponentKey) -> &mut ComponentNode {
        let owner = self.key.clone();
        self.components
            .entry(key.clone())
            .or_insert_with(|| ComponentNode::new(owner, key))
    }

    /// Look up a component by key.
    pub fn find_component(&self, key: &ComponentKey) -> Option<&ComponentNode> {
        self.components.get(key)
    }

    /// Iterate components in creation order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentNode> {
        self.components.values()
    }

    /// Number of components under this entity.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Total operations across all components.
    pub fn operation_count(&self) -> usize {
        self.components
            .values()
            .map(ComponentNode::operation_count)
            .sum()
    }
}

/// An independently built nested graph, opaque to its parent.
///
/// The nested graph's lifetime is bound to this node: dropping the node
/// drops the whole subgraph.
#[derive(Debug)]
pub struct SubgraphNode {
    /// The group entity this subgraph represents.
    pub key: EntityKey,
    /// The nested graph, owned exclusively.
    pub graph: Box<Depsgraph>,
}

/// The time source every evaluated node ultimately depends on.
#[derive(Debug, Default)]
pub struct TimeSourceNode {
    /// Current evaluation time; written by the driver of the evaluation
    /// engine, not by the build pass.
    pub frame: f64,
}
