//! Integration Tests for the Graph Builder
//!
//! These tests build graphs from small scene databases and verify the
//! structural guarantees the relation pass and evaluation engine rely on:
//! unique nodes per entity, cycle termination, and the per-entity-kind
//! operation sets.

use orrery_core::build::{DepsgraphBuilder, op_name};
use orrery_core::graph::{ComponentKey, ComponentKind, Depsgraph, OpCode};
use orrery_core::scene::{
    AnimData, Armature, Constraint, Driver, EntityKey, EntityKind, Geometry, GeometryKind, Group,
    Lamp, Material, Modifier, NodeTree, Object, ObjectData, ParticleSettings, ParticleSystem,
    PoseChannel, RigidBodyWorld, Scene, SceneDb, Texture, TreeNodeRef, World,
};
use orrery_core::{BuildError, build_scene_graph};

/// A database with one scene containing the given objects.
fn scene_with(db: &mut SceneDb, objects: &[&str]) {
    let mut scene = Scene::new("Scene");
    scene.objects = objects.iter().map(|s| s.to_string()).collect();
    db.add_scene(scene);
}

fn mesh_object(db: &mut SceneDb, name: &str) {
    db.add_geometry(Geometry::new(format!("{name}-mesh")));
    db.add_object(Object::mesh(name, format!("{name}-mesh")));
}

/// Test that every object gets its unconditional operations: a transform
/// init and the terminal object evaluation.
#[test]
fn object_always_gets_transform_and_terminal_eval() {
    let mut db = SceneDb::new();
    mesh_object(&mut db, "Cube");
    scene_with(&mut db, &["Cube"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();
    let key = EntityKey::object("Cube");

    let transform = graph.find_component(&key, ComponentKind::Transform).unwrap();
    assert!(transform
        .find_operation(OpCode::Init, op_name::LOCAL_TRANSFORM)
        .is_some());

    let geometry = graph.find_component(&key, ComponentKind::Geometry).unwrap();
    assert!(geometry
        .find_operation(OpCode::Exec, op_name::OBJECT_EVAL)
        .is_some());

    // Not parented, not constrained: no parent or constraint-stack ops.
    assert!(transform
        .find_operation(OpCode::Exec, op_name::OBJECT_PARENT)
        .is_none());
    assert!(transform
        .find_operation(OpCode::Exec, op_name::CONSTRAINT_STACK)
        .is_none());
}

/// Test that parenting and constraints each add exactly one operation.
#[test]
fn parent_and_constraint_stack_are_conditional() {
    let mut db = SceneDb::new();
    mesh_object(&mut db, "Root");
    db.add_geometry(Geometry::new("child-mesh"));
    let mut child = Object::mesh("Child", "child-mesh");
    child.parent = Some("Root".into());
    child.constraints.push(Constraint::generic("Limit"));
    db.add_object(child);
    scene_with(&mut db, &["Root", "Child"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();
    let transform = graph
        .find_component(&EntityKey::object("Child"), ComponentKind::Transform)
        .unwrap();

    assert!(transform
        .find_operation(OpCode::Exec, op_name::OBJECT_PARENT)
        .is_some());
    assert!(transform
        .find_operation(OpCode::Exec, op_name::CONSTRAINT_STACK)
        .is_some());
}

/// Test that a material shared by several objects is represented by a
/// single id node, built once.
#[test]
fn shared_material_has_single_id_node() {
    let mut db = SceneDb::new();
    let mut shared = Material::new("Shared");
    shared.anim = Some(AnimData::with_drivers(vec![Driver::new("alpha")]));
    db.add_material(shared);

    for name in ["A", "B"] {
        db.add_geometry(Geometry::new(format!("{name}-mesh")));
        let mut ob = Object::mesh(name, format!("{name}-mesh"));
        ob.material_slots.push(Some("Shared".into()));
        db.add_object(ob);
    }
    scene_with(&mut db, &["A", "B"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();
    let key = EntityKey::material("Shared");

    assert!(graph.find_id_node(&key).is_some());
    // Built exactly once: the driver operation was not duplicated by the
    // second object's material sub-build.
    let id = graph.find_id_node(&key).unwrap();
    assert_eq!(id.operation_count(), 1);
}

/// Test that a cyclic material graph (the material's node tree references
/// the material again) terminates and builds each entity exactly once.
#[test]
fn cyclic_material_graph_terminates() {
    let mut db = SceneDb::new();

    let mut material = Material::new("Cyclic");
    material.anim = Some(AnimData::with_drivers(vec![Driver::new("diffuse")]));
    material.textures.push(Some("Noise".into()));
    material.node_tree = Some("Tree".into());
    db.add_material(material);

    db.add_texture(Texture::new("Noise"));

    let mut tree = NodeTree::new("Tree");
    tree.nodes.push(TreeNodeRef::Material("Cyclic".into()));
    tree.nodes.push(TreeNodeRef::Texture("Noise".into()));
    tree.nodes.push(TreeNodeRef::Group("Tree".into()));
    db.add_node_tree(tree);

    db.add_geometry(Geometry::new("mesh"));
    let mut ob = Object::mesh("Ob", "mesh");
    ob.material_slots.push(Some("Cyclic".into()));
    db.add_object(ob);
    scene_with(&mut db, &["Ob"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();

    let material_id = graph.find_id_node(&EntityKey::material("Cyclic")).unwrap();
    assert_eq!(material_id.operation_count(), 1);
    assert!(graph.find_id_node(&EntityKey::texture("Noise")).is_some());
    assert!(graph.find_id_node(&EntityKey::node_tree("Tree")).is_some());

    // One id node per entity, period.
    let cyclic_count = graph
        .id_nodes()
        .filter(|id| id.key == EntityKey::material("Cyclic"))
        .count();
    assert_eq!(cyclic_count, 1);
}

/// Test the armature build: per bone one transform operation, one
/// constraint stack, and one IK solver whose resolved chain root is the
/// requested number of ancestors up (or the skeleton root).
#[test]
fn ik_chain_roots_resolve_per_bone() {
    let mut db = SceneDb::new();
    db.add_armature(Armature {
        name: "Arm".into(),
        anim: None,
    });

    let mut rig = Object::new("Rig", ObjectData::Armature { name: "Arm".into() });
    for i in 0..4 {
        let mut channel = if i == 0 {
            PoseChannel::new("bone0")
        } else {
            PoseChannel::child_of(format!("bone{i}"), format!("bone{}", i - 1))
        };
        channel.constraints.push(Constraint::ik("IK", 2, true));
        rig.pose.push(channel);
    }
    db.add_object(rig);
    scene_with(&mut db, &["Rig"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();
    let rig_id = graph.find_id_node(&EntityKey::object("Rig")).unwrap();

    // Pose component: rebuild + init + flush.
    let pose = rig_id
        .find_component(&ComponentKey::new(ComponentKind::Pose))
        .unwrap();
    assert_eq!(pose.operation_count(), 3);

    for (bone, expected_root) in [
        ("bone0", "bone0"),
        ("bone1", "bone0"),
        ("bone2", "bone0"),
        ("bone3", "bone1"),
    ] {
        let comp = rig_id
            .find_component(&ComponentKey::with_sub_name(ComponentKind::Bone, bone))
            .unwrap();
        assert!(comp
            .find_operation(OpCode::Exec, op_name::BONE_TRANSFORMS)
            .is_some());
        assert!(comp
            .find_operation(OpCode::Exec, op_name::CONSTRAINT_STACK)
            .is_some());
        assert!(
            comp.find_operation(OpCode::Sim, &op_name::ik_solver(expected_root))
                .is_some(),
            "bone {bone} should resolve chain root {expected_root}"
        );
        assert_eq!(comp.operation_count(), 3);
    }
}

/// Test that only the basis object of a metaball family gets a geometry
/// evaluation operation.
#[test]
fn metaball_family_evaluates_only_the_basis() {
    let mut db = SceneDb::new();
    for name in ["Ball", "Ball.001", "Ball.002"] {
        db.add_geometry(Geometry::new(format!("{name}-data")));
        db.add_object(Object::new(
            name,
            ObjectData::Geometry {
                kind: GeometryKind::Metaball,
                name: format!("{name}-data"),
            },
        ));
    }
    scene_with(&mut db, &["Ball", "Ball.001", "Ball.002"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();

    let geometry_evals = graph
        .operations()
        .filter(|op| op.name == op_name::GEOMETRY_EVAL)
        .count();
    assert_eq!(geometry_evals, 1);

    let basis_geom = graph
        .find_component(&EntityKey::object("Ball"), ComponentKind::Geometry)
        .unwrap();
    assert!(basis_geom
        .find_operation(OpCode::Exec, op_name::GEOMETRY_EVAL)
        .is_some());
}

/// Test the mesh build: modifiers appear as one operation each, in stack
/// order, and each non-empty material slot triggers a material build.
#[test]
fn modifiers_in_stack_order_and_materials_built() {
    let mut db = SceneDb::new();
    db.add_material(Material::new("Red"));
    db.add_material(Material::new("Blue"));
    db.add_geometry(Geometry::new("mesh"));

    let mut ob = Object::mesh("Cube", "mesh");
    ob.modifiers.push(Modifier::new("Mirror"));
    ob.modifiers.push(Modifier::new("Subsurf"));
    ob.material_slots = vec![Some("Red".into()), None, Some("Blue".into())];
    db.add_object(ob);
    scene_with(&mut db, &["Cube"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();

    let geometry = graph
        .find_component(&EntityKey::object("Cube"), ComponentKind::Geometry)
        .unwrap();
    let modifier_ops: Vec<_> = geometry
        .operations()
        .filter(|op| op.name.starts_with("Modifier: "))
        .map(|op| op.name.clone())
        .collect();
    assert_eq!(modifier_ops, ["Modifier: Mirror", "Modifier: Subsurf"]);

    assert!(graph.find_id_node(&EntityKey::material("Red")).is_some());
    assert!(graph.find_id_node(&EntityKey::material("Blue")).is_some());
}

/// Test that curve objects get the geometry evaluation on the object and
/// the path computation on the shared curve datablock.
#[test]
fn curve_objects_get_a_path_operation() {
    let mut db = SceneDb::new();
    db.add_geometry(Geometry::new("curve-data"));
    db.add_object(Object::new(
        "Bezier",
        ObjectData::Geometry {
            kind: GeometryKind::Curve,
            name: "curve-data".into(),
        },
    ));
    scene_with(&mut db, &["Bezier"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();

    let on_object = graph
        .find_component(&EntityKey::object("Bezier"), ComponentKind::Geometry)
        .unwrap();
    assert!(on_object
        .find_operation(OpCode::Exec, op_name::GEOMETRY_EVAL)
        .is_some());

    let on_data = graph
        .find_component(
            &EntityKey::new(EntityKind::Curve, "curve-data"),
            ComponentKind::Geometry,
        )
        .unwrap();
    assert!(on_data
        .find_operation(OpCode::Exec, op_name::CURVE_PATH)
        .is_some());
}

/// Test that a scripted driver's operation is flagged for serialization
/// while a plain driver's is not.
#[test]
fn scripted_drivers_are_flagged() {
    let mut db = SceneDb::new();
    db.add_geometry(Geometry::new("mesh"));
    let mut ob = Object::mesh("Cube", "mesh");
    ob.anim = Some(AnimData::with_drivers(vec![
        Driver::new("location.x"),
        Driver::scripted("rotation.z"),
    ]));
    db.add_object(ob);
    scene_with(&mut db, &["Cube"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();
    let params = graph
        .find_component(&EntityKey::object("Cube"), ComponentKind::Parameters)
        .unwrap();

    let plain = params
        .find_operation(OpCode::Exec, &op_name::driver("location.x"))
        .unwrap();
    assert!(!plain.flags.uses_script);

    let scripted = params
        .find_operation(OpCode::Exec, &op_name::driver("rotation.z"))
        .unwrap();
    assert!(scripted.flags.uses_script);
}

/// Test the rigid-body build: world rebuild + simulate on the scene, one
/// sync operation per mesh participant, none for non-mesh members.
#[test]
fn rigidbody_syncs_only_mesh_participants() {
    let mut db = SceneDb::new();
    mesh_object(&mut db, "Brick");
    db.add_lamp(Lamp::new("Sun-data"));
    db.add_object(Object::new("Sun", ObjectData::Lamp { name: "Sun-data".into() }));
    db.add_group(Group::new("SimGroup", vec!["Brick".into(), "Sun".into()]));

    let mut scene = Scene::new("Scene");
    scene.objects = vec!["Brick".into(), "Sun".into()];
    scene.rigidbody = Some(RigidBodyWorld {
        group: "SimGroup".into(),
    });
    db.add_scene(scene);

    let graph = build_scene_graph(&db, "Scene").unwrap();

    let scene_transform = graph
        .find_component(&EntityKey::scene("Scene"), ComponentKind::Transform)
        .unwrap();
    assert!(scene_transform
        .find_operation(OpCode::Rebuild, op_name::RIGIDBODY_REBUILD)
        .is_some());
    assert!(scene_transform
        .find_operation(OpCode::Sim, op_name::RIGIDBODY_SIM)
        .is_some());

    let brick_transform = graph
        .find_component(&EntityKey::object("Brick"), ComponentKind::Transform)
        .unwrap();
    assert!(brick_transform
        .find_operation(OpCode::Exec, op_name::RIGIDBODY_SYNC)
        .is_some());

    let sun_transform = graph
        .find_component(&EntityKey::object("Sun"), ComponentKind::Transform)
        .unwrap();
    assert!(sun_transform
        .find_operation(OpCode::Exec, op_name::RIGIDBODY_SYNC)
        .is_none());
}

/// Test that particle systems produce one evaluation operation each,
/// plus the shared settings' animation, represented once.
#[test]
fn particle_systems_build_one_operation_each() {
    let mut db = SceneDb::new();
    db.add_particle_settings(ParticleSettings {
        name: "Sparks".into(),
        anim: Some(AnimData::with_drivers(vec![Driver::new("count")])),
    });
    db.add_geometry(Geometry::new("mesh"));
    let mut ob = Object::mesh("Emitter", "mesh");
    ob.particle_systems.push(ParticleSystem {
        name: "First".into(),
        settings: "Sparks".into(),
    });
    ob.particle_systems.push(ParticleSystem {
        name: "Second".into(),
        settings: "Sparks".into(),
    });
    db.add_object(ob);
    scene_with(&mut db, &["Emitter"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();

    let particles = graph
        .find_component(&EntityKey::object("Emitter"), ComponentKind::Particles)
        .unwrap();
    assert_eq!(particles.operation_count(), 2);

    // Shared settings: the driver operation exists exactly once.
    let settings_id = graph
        .find_id_node(&EntityKey::particle_settings("Sparks"))
        .unwrap();
    assert_eq!(settings_id.operation_count(), 1);
}

/// Test that a proxy target gets its own full build.
#[test]
fn proxy_targets_are_built_as_objects() {
    let mut db = SceneDb::new();
    mesh_object(&mut db, "Target");
    db.add_geometry(Geometry::new("proxy-mesh"));
    let mut proxy = Object::mesh("Proxy", "proxy-mesh");
    proxy.proxy = Some("Target".into());
    db.add_object(proxy);
    // Only the proxy is in the scene; the target is pulled in through it.
    scene_with(&mut db, &["Proxy"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();

    let target_geom = graph
        .find_component(&EntityKey::object("Target"), ComponentKind::Geometry)
        .unwrap();
    assert!(target_geom
        .find_operation(OpCode::Exec, op_name::OBJECT_EVAL)
        .is_some());
}

/// Test that the background (set) scene is built into the same graph
/// before the scene's own objects.
#[test]
fn background_scene_contributes_its_objects() {
    let mut db = SceneDb::new();
    mesh_object(&mut db, "Backdrop");
    mesh_object(&mut db, "Actor");

    let mut background = Scene::new("Background");
    background.objects = vec!["Backdrop".into()];
    db.add_scene(background);

    let mut scene = Scene::new("Scene");
    scene.objects = vec!["Actor".into()];
    scene.set = Some("Background".into());
    db.add_scene(scene);

    let graph = build_scene_graph(&db, "Scene").unwrap();

    assert!(graph.find_id_node(&EntityKey::object("Backdrop")).is_some());
    assert!(graph.find_id_node(&EntityKey::object("Actor")).is_some());

    // Backdrop was discovered first: the base layer builds first.
    let first_object = graph
        .id_nodes()
        .find(|id| id.key.kind == EntityKind::Object)
        .unwrap();
    assert_eq!(first_object.key, EntityKey::object("Backdrop"));
}

/// Test that a group instanced by two objects is extracted exactly once,
/// as a nested graph with its own time source, opaque to the parent.
#[test]
fn instanced_groups_are_extracted_once() {
    let mut db = SceneDb::new();
    mesh_object(&mut db, "Prop");
    db.add_group(Group::new("Props", vec!["Prop".into()]));

    for name in ["InstancerA", "InstancerB"] {
        db.add_geometry(Geometry::new(format!("{name}-mesh")));
        let mut ob = Object::mesh(name, format!("{name}-mesh"));
        ob.instance_group = Some("Props".into());
        db.add_object(ob);
    }
    scene_with(&mut db, &["InstancerA", "InstancerB"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();

    assert_eq!(graph.subgraph_count(), 1);
    let sub = graph.find_subgraph(&EntityKey::group("Props")).unwrap();
    assert!(sub.graph.time_source().is_some());
    assert!(sub.graph.find_id_node(&EntityKey::object("Prop")).is_some());

    // The member is not flattened into the parent scene's graph.
    assert!(graph.find_id_node(&EntityKey::object("Prop")).is_none());
}

/// Test that subgraph extraction with no group (or an unknown one) adds
/// nothing to the parent graph.
#[test]
fn null_group_subgraph_is_a_no_op() {
    let db = SceneDb::new();
    let mut graph = Depsgraph::new();
    let mut builder = DepsgraphBuilder::new(&db, &mut graph);

    assert!(builder.build_subgraph(None).is_none());
    assert!(builder.build_subgraph(Some("Missing")).is_none());

    assert_eq!(graph.subgraph_count(), 0);
    assert_eq!(graph.id_node_count(), 0);
    assert!(graph.time_source().is_none());
}

/// Test that the world and compositor are wired at scene level, with the
/// compositor's tree wrapped in the scene's parameters component.
#[test]
fn world_and_compositor_build_at_scene_level() {
    let mut db = SceneDb::new();
    let mut world = World::new("Sky");
    world.textures.push(Some("Clouds".into()));
    db.add_world(world);
    db.add_texture(Texture::new("Clouds"));
    db.add_node_tree(NodeTree::new("Comp"));

    let mut scene = Scene::new("Scene");
    scene.world = Some("Sky".into());
    scene.compositor = Some("Comp".into());
    db.add_scene(scene);

    let graph = build_scene_graph(&db, "Scene").unwrap();

    assert!(graph.find_id_node(&EntityKey::world("Sky")).is_some());
    assert!(graph.find_id_node(&EntityKey::texture("Clouds")).is_some());
    assert!(graph.find_id_node(&EntityKey::node_tree("Comp")).is_some());
    assert!(graph
        .find_component(&EntityKey::scene("Scene"), ComponentKind::Parameters)
        .is_some());
}

/// Test that an unknown scene root is the one thing the entry point
/// rejects.
#[test]
fn unknown_scene_root_is_an_error() {
    let db = SceneDb::new();
    let err = build_scene_graph(&db, "Nowhere").unwrap_err();
    assert_eq!(
        err,
        BuildError::SceneNotFound {
            name: "Nowhere".into()
        }
    );
}

/// Test that dangling references degrade to absence instead of failing
/// the pass.
#[test]
fn dangling_references_are_skipped() {
    let mut db = SceneDb::new();
    // Object with a geometry datablock that does not exist, a dangling
    // parent, and a dangling material slot.
    let mut ob = Object::mesh("Ghost", "missing-mesh");
    ob.parent = Some("missing-parent".into());
    ob.material_slots.push(Some("missing-material".into()));
    db.add_object(ob);
    scene_with(&mut db, &["Ghost", "missing-object"]);

    let graph = build_scene_graph(&db, "Scene").unwrap();

    // The object still gets its unconditional operations.
    let key = EntityKey::object("Ghost");
    assert!(graph.find_component(&key, ComponentKind::Transform).is_some());
    assert!(graph
        .find_component(&key, ComponentKind::Geometry)
        .unwrap()
        .find_operation(OpCode::Exec, op_name::OBJECT_EVAL)
        .is_some());

    // Nothing was created for the dangling names.
    assert!(graph.find_id_node(&EntityKey::object("missing-object")).is_none());
    assert!(graph
        .find_id_node(&EntityKey::material("missing-material"))
        .is_none());
}
