//! Graph Builder
//!
//! This module implements the traversal that turns a scene description
//! into a populated [`Depsgraph`]. The builder walks the scene top-down:
//! time source first, then the background scene, then every object (its
//! transform, animation, constraints, type-specific data, particles, and
//! terminal evaluation operation), then deferred group subgraphs,
//! rigid-body simulation, scene animation, world shading and the
//! compositor tree.
//!
//! # Guarantees
//!
//! - Shared datablocks appear exactly once per graph scope no matter how
//!   many owners reference them: id-node creation is idempotent, and the
//!   guarded shading routines skip entities already built this pass.
//! - Cyclic shading references (a material whose node tree references the
//!   material again) terminate through the [`VisitSet`] guard.
//! - Missing or dangling references are absence, not failure: the builder
//!   skips the corresponding nodes and never aborts a pass. The only
//!   fallible surface is [`build_scene_graph`], which rejects an unknown
//!   scene root.
//!
//! The build pass is single-threaded and purely constructive: no
//! operation created here executes during the pass, and the graph carries
//! no edges. A separate relation pass links operations afterwards using
//! the identity guarantees above.

mod rig;
mod shading;
mod visit;

use std::collections::HashSet;

use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::error::BuildError;
use crate::graph::{ComponentKey, ComponentKind, Depsgraph, OpCode, SubgraphNode, noop_callback};
use crate::scene::{
    AnimData, Driver, EntityKey, Geometry, GeometryKind, Group, Object, ObjectData, Scene, SceneDb,
};

pub use visit::VisitSet;

/// Canonical operation debug names.
///
/// The relation pass addresses operations by (component, opcode, name);
/// keeping the names in one place keeps both passes in agreement.
pub mod op_name {
    /// Object-local transform evaluation.
    pub const LOCAL_TRANSFORM: &str = "Local Transforms";
    /// Parent-link evaluation on a parented object.
    pub const OBJECT_PARENT: &str = "Object Parent";
    /// Monolithic constraint-stack evaluation (object or bone).
    pub const CONSTRAINT_STACK: &str = "Constraint Stack";
    /// Terminal per-object sink operation.
    pub const OBJECT_EVAL: &str = "Object Eval";
    /// Type-specific geometry evaluation.
    pub const GEOMETRY_EVAL: &str = "Geometry Eval";
    /// Curve path computation, on the curve datablock itself.
    pub const CURVE_PATH: &str = "Path";
    /// Pose topology rebuild.
    pub const POSE_REBUILD: &str = "Rebuild Pose";
    /// First step of every pose evaluation.
    pub const POSE_INIT: &str = "Init Pose";
    /// Last step of every pose evaluation.
    pub const POSE_FLUSH: &str = "Flush Pose";
    /// Per-bone transform evaluation.
    pub const BONE_TRANSFORMS: &str = "Bone Transforms";
    /// Rigid-body world initialization/rebuild.
    pub const RIGIDBODY_REBUILD: &str = "Rigidbody World Rebuild";
    /// Rigid-body simulation step.
    pub const RIGIDBODY_SIM: &str = "Rigidbody World Do Simulation";
    /// Per-participant transform sync after a simulation step.
    pub const RIGIDBODY_SYNC: &str = "RigidBodyObject Sync";

    /// Name of a driver operation.
    pub fn driver(driver: &str) -> String {
        format!("Driver: {driver}")
    }

    /// Name of a modifier operation.
    pub fn modifier(modifier: &str) -> String {
        format!("Modifier: {modifier}")
    }

    /// Name of a particle-system evaluation operation.
    pub fn particle_system(system: &str) -> String {
        format!("PSys Eval: {system}")
    }

    /// Name of an IK solver operation, carrying its resolved chain root.
    pub fn ik_solver(root: &str) -> String {
        format!("IK Solver [{root}]")
    }

    /// Name of a spline-IK solver operation, carrying its resolved chain
    /// root.
    pub fn spline_ik_solver(root: &str) -> String {
        format!("Spline IK Solver [{root}]")
    }
}

/// Build the dependency graph for a scene root.
///
/// This is the entry point external drivers call for a full rebuild.
/// Inside the pass every missing reference degrades to absence; only an
/// unknown root is an error.
pub fn build_scene_graph(db: &SceneDb, scene: &str) -> Result<Depsgraph, BuildError> {
    let scene_block = db.scene(scene).ok_or_else(|| BuildError::SceneNotFound {
        name: scene.to_string(),
    })?;

    let mut graph = Depsgraph::new();
    DepsgraphBuilder::new(db, &mut graph).build_scene(scene_block);
    Ok(graph)
}

/// Recursive traversal that emits graph nodes for every evaluable entity
/// reachable from a scene root.
///
/// One builder corresponds to one graph scope: subgraph extraction spawns
/// a fresh builder over a fresh graph. The builder borrows the database
/// immutably for the whole pass and never executes any operation it
/// creates.
pub struct DepsgraphBuilder<'db, 'g> {
    db: &'db SceneDb,
    graph: &'g mut Depsgraph,
    /// Entities whose build routine is currently on the recursion stack.
    visited: VisitSet,
    /// Owners whose animation drivers are already represented this pass.
    anim_built: HashSet<EntityKey>,
    /// Groups referenced by instancing objects, built once after the
    /// object loop.
    pending_groups: IndexSet<String>,
}

impl<'db, 'g> DepsgraphBuilder<'db, 'g> {
    /// Create a builder that populates `graph` from `db`.
    pub fn new(db: &'db SceneDb, graph: &'g mut Depsgraph) -> Self {
        Self::with_visit_set(db, graph, VisitSet::new())
    }

    fn with_visit_set(db: &'db SceneDb, graph: &'g mut Depsgraph, visited: VisitSet) -> Self {
        Self {
            db,
            graph,
            visited,
            anim_built: HashSet::new(),
            pending_groups: IndexSet::new(),
        }
    }

    fn into_visit_set(self) -> VisitSet {
        self.visited
    }

    /// Build all nodes for a scene and everything reachable from it.
    pub fn build_scene(&mut self, scene: &Scene) {
        let key = EntityKey::scene(scene.name.clone());
        // Background scenes chain; a malformed chain may cycle.
        if self.visited.is_tagged(&key) {
            return;
        }
        self.visited.tag(key.clone());

        debug!(scene = %scene.name, "building scene nodes");

        // Every other node eventually depends on time.
        self.graph.add_time_source();

        // The background scene establishes a base layer first.
        if let Some(set) = &scene.set {
            if let Some(set_scene) = self.db.scene(set) {
                self.build_scene(set_scene);
            }
        }

        for name in &scene.objects {
            let Some(object) = self.db.object(name) else {
                continue;
            };
            self.build_object(Some(scene), object);

            // A proxy target is an independent object needing its own
            // full build, not merely a reference.
            if let Some(proxy) = &object.proxy {
                if let Some(target) = self.db.object(proxy) {
                    self.build_object(Some(scene), target);
                }
            }

            // Instanced groups are deferred and batched so a group used
            // by several objects is extracted once.
            if let Some(group) = &object.instance_group {
                self.pending_groups.insert(group.clone());
            }
        }

        while let Some(group) = self.pending_groups.shift_remove_index(0) {
            self.build_subgraph(Some(&group));
        }

        if scene.rigidbody.is_some() {
            self.build_rigidbody(scene);
        }

        self.build_animdata(&key, scene.anim.as_ref());

        if let Some(world) = &scene.world {
            self.build_world(world);
        }

        if let Some(tree) = &scene.compositor {
            self.build_compositor(scene, tree);
        }

        self.visited.untag(&key);
    }

    /// Build one object's nodes: transform, animation, parent link,
    /// constraints, type-specific data, particles, and the terminal
    /// evaluation operation every other operation of the object feeds.
    ///
    /// `scene` is the scene context when building scene members; group
    /// members build without one (metaball basis resolution is
    /// scene-scoped and degrades to absence there).
    pub fn build_object(&mut self, scene: Option<&Scene>, object: &Object) {
        let key = object.key();
        trace!(object = %object.name, "building object nodes");

        // Every object has a transform, unconditionally.
        self.graph.add_operation_node(
            &key,
            ComponentKey::new(ComponentKind::Transform),
            OpCode::Init,
            noop_callback(),
            op_name::LOCAL_TRANSFORM,
        );

        self.build_animdata(&key, object.anim.as_ref());

        if object
            .parent
            .as_deref()
            .and_then(|parent| self.db.object(parent))
            .is_some()
        {
            self.graph.add_operation_node(
                &key,
                ComponentKey::new(ComponentKind::Transform),
                OpCode::Exec,
                noop_callback(),
                op_name::OBJECT_PARENT,
            );
        }

        if !object.constraints.is_empty() {
            self.build_object_constraints(object);
        }

        match &object.data {
            ObjectData::None => {}
            ObjectData::Geometry { kind, name } => {
                if let Some(geometry) = self.db.geometry(name) {
                    let data_key = EntityKey::new(kind.entity_kind(), name.clone());
                    self.build_animdata(&data_key, geometry.anim.as_ref());
                    self.build_obdata_geom(scene, object, *kind, &data_key, geometry);
                }
            }
            ObjectData::Armature { name } => {
                if let Some(armature) = self.db.armature(name) {
                    self.build_rig(object, armature);
                }
            }
            ObjectData::Lamp { name } => {
                self.build_lamp(name);
            }
            ObjectData::Camera { name } => {
                if let Some(camera) = self.db.camera(name) {
                    let data_key = EntityKey::camera(name.clone());
                    self.build_animdata(&data_key, camera.anim.as_ref());
                }
                self.build_camera(object);
            }
        }

        if !object.particle_systems.is_empty() {
            self.build_particles(object);
        }

        // Terminal sink for the object.
        self.graph.add_operation_node(
            &key,
            ComponentKey::new(ComponentKind::Geometry),
            OpCode::Exec,
            noop_callback(),
            op_name::OBJECT_EVAL,
        );
    }

    /// One monolithic operation for the whole object constraint stack.
    ///
    /// Per-constraint granularity can be introduced later without
    /// changing the external contract; dependencies currently link to the
    /// stack as a unit.
    fn build_object_constraints(&mut self, object: &Object) {
        self.graph.add_operation_node(
            &object.key(),
            ComponentKey::new(ComponentKind::Transform),
            OpCode::Exec,
            noop_callback(),
            op_name::CONSTRAINT_STACK,
        );
    }

    /// Build nodes for a datablock's animation: one operation per driver
    /// on the owner's parameters component. Idempotent per owner, so a
    /// datablock shared by several objects is represented once.
    pub(crate) fn build_animdata(&mut self, owner: &EntityKey, anim: Option<&AnimData>) {
        let Some(adt) = anim else {
            return;
        };
        if !adt.has_animation() {
            return;
        }
        if !self.anim_built.insert(owner.clone()) {
            return;
        }
        for driver in &adt.drivers {
            self.build_driver(owner, driver);
        }
    }

    /// One operation per driver. Scripted drivers are flagged so the
    /// evaluation engine serializes them against other interpreter-bound
    /// work.
    fn build_driver(&mut self, owner: &EntityKey, driver: &Driver) {
        let op = self.graph.add_operation_node(
            owner,
            ComponentKey::new(ComponentKind::Parameters),
            OpCode::Exec,
            noop_callback(),
            op_name::driver(&driver.name),
        );
        if driver.scripted {
            op.set_uses_script();
        }
    }

    /// Rigid-body simulation nodes: a world rebuild operation, a
    /// simulation step, and one transform-sync operation per mesh member
    /// of the simulation group. Non-mesh members do not participate.
    fn build_rigidbody(&mut self, scene: &Scene) {
        let Some(rbw) = &scene.rigidbody else {
            return;
        };
        let scene_key = EntityKey::scene(scene.name.clone());

        self.graph.add_operation_node(
            &scene_key,
            ComponentKey::new(ComponentKind::Transform),
            OpCode::Rebuild,
            noop_callback(),
            op_name::RIGIDBODY_REBUILD,
        );
        self.graph.add_operation_node(
            &scene_key,
            ComponentKey::new(ComponentKind::Transform),
            OpCode::Sim,
            noop_callback(),
            op_name::RIGIDBODY_SIM,
        );

        let Some(group) = self.db.group(&rbw.group) else {
            return;
        };
        for member in &group.members {
            let Some(object) = self.db.object(member) else {
                continue;
            };
            if !matches!(
                object.data,
                ObjectData::Geometry {
                    kind: GeometryKind::Mesh,
                    ..
                }
            ) {
                continue;
            }
            self.graph.add_operation_node(
                &object.key(),
                ComponentKey::new(ComponentKind::Transform),
                OpCode::Exec,
                noop_callback(),
                op_name::RIGIDBODY_SYNC,
            );
        }
    }

    /// Particle-system nodes: one particles component on the object, one
    /// evaluation operation per system, plus the shared settings' animation.
    fn build_particles(&mut self, object: &Object) {
        let key = object.key();
        // The component exists even before its operations so the relation
        // pass can anchor dependencies on it.
        self.graph
            .add_component_node(&key, ComponentKey::new(ComponentKind::Particles));

        for system in &object.particle_systems {
            if let Some(settings) = self.db.particle_settings(&system.settings) {
                let settings_key = EntityKey::particle_settings(settings.name.clone());
                self.build_animdata(&settings_key, settings.anim.as_ref());
            }
            self.graph.add_operation_node(
                &key,
                ComponentKey::new(ComponentKind::Particles),
                OpCode::Exec,
                noop_callback(),
                op_name::particle_system(&system.name),
            );
        }
    }

    /// Geometry evaluation nodes for an object's datablock: the
    /// type-specific evaluation operation, shape-key animation, one
    /// operation per modifier in stack order, and the materials assigned
    /// to non-empty slots.
    fn build_obdata_geom(
        &mut self,
        scene: Option<&Scene>,
        object: &Object,
        kind: GeometryKind,
        data_key: &EntityKey,
        geometry: &Geometry,
    ) {
        let key = object.key();

        match kind {
            GeometryKind::Mesh | GeometryKind::Surface | GeometryKind::Lattice => {
                self.graph.add_operation_node(
                    &key,
                    ComponentKey::new(ComponentKind::Geometry),
                    OpCode::Exec,
                    noop_callback(),
                    op_name::GEOMETRY_EVAL,
                );
            }
            GeometryKind::Metaball => {
                // Only the family basis is evaluated; sibling metaballs
                // are computed as a side effect of the basis operation.
                let is_basis = scene
                    .and_then(|scene| self.db.metaball_basis(scene, object))
                    .is_some_and(|basis| basis.name == object.name);
                if is_basis {
                    self.graph.add_operation_node(
                        &key,
                        ComponentKey::new(ComponentKind::Geometry),
                        OpCode::Exec,
                        noop_callback(),
                        op_name::GEOMETRY_EVAL,
                    );
                }
            }
            GeometryKind::Curve | GeometryKind::Font => {
                self.graph.add_operation_node(
                    &key,
                    ComponentKey::new(ComponentKind::Geometry),
                    OpCode::Exec,
                    noop_callback(),
                    op_name::GEOMETRY_EVAL,
                );
                // The curve path lives on the datablock: path-following
                // constraints depend on it, not on any one object.
                let path_comp = self
                    .graph
                    .add_component_node(data_key, ComponentKey::new(ComponentKind::Geometry));
                if path_comp
                    .find_operation(OpCode::Exec, op_name::CURVE_PATH)
                    .is_none()
                {
                    path_comp.add_operation(OpCode::Exec, noop_callback(), op_name::CURVE_PATH);
                }
            }
        }

        if let Some(shape_key) = &geometry.shape_key {
            if let Some(block) = self.db.key(shape_key) {
                let block_key = EntityKey::shape_key(block.name.clone());
                self.build_animdata(&block_key, block.anim.as_ref());
            }
        }

        // One node per modifier keeps the stack interleavable by the
        // relation pass.
        for modifier in &object.modifiers {
            self.graph.add_operation_node(
                &key,
                ComponentKey::new(ComponentKind::Geometry),
                OpCode::Exec,
                noop_callback(),
                op_name::modifier(&modifier.name),
            );
        }

        for slot in object.material_slots.iter().flatten() {
            // The geometry component anchors the object's material links.
            self.graph
                .add_component_node(&key, ComponentKey::new(ComponentKind::Geometry));
            self.build_material(slot);
        }
    }

    /// Cameras contribute no evaluated data yet; scene-camera links are
    /// the relation pass's concern.
    fn build_camera(&mut self, _object: &Object) {}

    /// Compositing is represented as scene parameters wrapping the tree;
    /// the actual compositing happens inside the renderer.
    fn build_compositor(&mut self, scene: &Scene, tree: &str) {
        let scene_key = EntityKey::scene(scene.name.clone());
        self.graph
            .add_component_node(&scene_key, ComponentKey::new(ComponentKind::Parameters));
        self.build_nodetree(tree);
    }

    /// Build an independent nested graph for a group and register it in
    /// the parent graph as a single opaque node.
    ///
    /// `None` or an unknown group name yields no node and leaves the
    /// parent graph untouched. A group already extracted this pass (or
    /// currently being extracted further up the stack) is not rebuilt.
    pub fn build_subgraph(&mut self, group: Option<&str>) -> Option<&SubgraphNode> {
        let name = group?;
        let group_block = self.db.group(name)?;
        let key = EntityKey::group(name.to_string());

        if self.visited.is_tagged(&key) {
            return None;
        }

        if self.graph.find_subgraph(&key).is_none() {
            debug!(group = name, "extracting group subgraph");
            self.visited.tag(key.clone());

            let mut nested = Depsgraph::new();
            nested.add_time_source();
            let mut builder = DepsgraphBuilder::with_visit_set(
                self.db,
                &mut nested,
                std::mem::take(&mut self.visited),
            );
            builder.build_group(group_block);
            self.visited = builder.into_visit_set();

            self.visited.untag(&key);
            self.graph.add_subgraph_node(key.clone(), nested);
        }

        self.graph.find_subgraph(&key)
    }

    /// Build a group's member objects into the current (nested) graph.
    fn build_group(&mut self, group: &Group) {
        for member in &group.members {
            let Some(object) = self.db.object(member) else {
                continue;
            };
            self.build_object(None, object);

            if let Some(nested_group) = &object.instance_group {
                self.pending_groups.insert(nested_group.clone());
            }
        }

        while let Some(pending) = self.pending_groups.shift_remove_index(0) {
            self.build_subgraph(Some(&pending));
        }
    }
}
