//! Scene Database
//!
//! [`SceneDb`] is the collection of all loadable datablocks the builder may
//! reach from a scene root: the crate's stand-in for the application's main
//! database. Blocks live in insertion-ordered maps keyed by name, so a
//! build pass over the same database always walks entities in the same
//! order and produces the same graph.
//!
//! Lookups return `Option`: a dangling cross-reference resolves to `None`
//! and is treated by the builder as "nothing to build". The database is
//! never mutated during a build pass.

use indexmap::IndexMap;

use super::anim::AnimData;
use super::object::{GeometryKind, Object, ObjectData};
use super::shading::{Lamp, Material, NodeTree, Texture, World};

/// A geometry datablock (mesh, curve, surface, metaball, lattice).
///
/// The builder only consults identity, shape keys and animation; the
/// actual vertex data lives in the external geometry containers.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    /// Datablock name, unique within its kind.
    pub name: String,
    /// Shape-key block attached to this geometry, if any.
    pub shape_key: Option<String>,
    /// Animation data.
    pub anim: Option<AnimData>,
}

impl Geometry {
    /// Create a bare geometry datablock.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// An armature datablock. Bone channels live on the owning object's pose.
#[derive(Debug, Clone, Default)]
pub struct Armature {
    /// Armature name, unique among armatures.
    pub name: String,
    /// Animation data (animated deform properties).
    pub anim: Option<AnimData>,
}

/// A camera datablock. Cameras carry no evaluated data yet; the block
/// exists so its animation can be represented.
#[derive(Debug, Clone, Default)]
pub struct Camera {
    /// Camera name, unique among cameras.
    pub name: String,
    /// Animation data.
    pub anim: Option<AnimData>,
}

/// A shape-key datablock.
#[derive(Debug, Clone, Default)]
pub struct KeyBlock {
    /// Key name, unique among keys.
    pub name: String,
    /// Animation data (key values are commonly animated).
    pub anim: Option<AnimData>,
}

/// A particle-settings datablock, shared between particle systems.
#[derive(Debug, Clone, Default)]
pub struct ParticleSettings {
    /// Settings name, unique among particle settings.
    pub name: String,
    /// Animation data.
    pub anim: Option<AnimData>,
}

/// A reusable group of objects, instanced into scenes as a subgraph.
#[derive(Debug, Clone, Default)]
pub struct Group {
    /// Group name, unique among groups.
    pub name: String,
    /// Member object names, in group order.
    pub members: Vec<String>,
}

impl Group {
    /// Create a group from its member object names.
    pub fn new(name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }
}

/// Scene-level rigid-body simulation settings.
#[derive(Debug, Clone)]
pub struct RigidBodyWorld {
    /// Group whose members participate in the simulation.
    pub group: String,
}

/// A scene root.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Scene name, unique among scenes.
    pub name: String,
    /// Objects placed directly in the scene, in scene order.
    pub objects: Vec<String>,
    /// Background scene layered underneath this one, if any.
    pub set: Option<String>,
    /// Rigid-body simulation settings, if the scene simulates.
    pub rigidbody: Option<RigidBodyWorld>,
    /// The scene's world, if any.
    pub world: Option<String>,
    /// Compositor node tree, if the scene composites.
    pub compositor: Option<String>,
    /// Scene-level animation data.
    pub anim: Option<AnimData>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// The metaball family name: everything before the first `.` in the
/// object name, so `"Ball"`, `"Ball.001"` and `"Ball.002"` form one
/// family.
fn metaball_family(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// The collection of all loadable datablocks.
#[derive(Debug, Clone, Default)]
pub struct SceneDb {
    scenes: IndexMap<String, Scene>,
    objects: IndexMap<String, Object>,
    geometries: IndexMap<String, Geometry>,
    armatures: IndexMap<String, Armature>,
    lamps: IndexMap<String, Lamp>,
    cameras: IndexMap<String, Camera>,
    materials: IndexMap<String, Material>,
    textures: IndexMap<String, Texture>,
    node_trees: IndexMap<String, NodeTree>,
    worlds: IndexMap<String, World>,
    particle_settings: IndexMap<String, ParticleSettings>,
    keys: IndexMap<String, KeyBlock>,
    groups: IndexMap<String, Group>,
}

impl SceneDb {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a scene, keyed by its name.
    pub fn add_scene(&mut self, scene: Scene) {
        self.scenes.insert(scene.name.clone(), scene);
    }

    /// Insert an object, keyed by its name.
    pub fn add_object(&mut self, object: Object) {
        self.objects.insert(object.name.clone(), object);
    }

    /// Insert a geometry datablock, keyed by its name.
    pub fn add_geometry(&mut self, geometry: Geometry) {
        self.geometries.insert(geometry.name.clone(), geometry);
    }

    /// Insert an armature, keyed by its name.
    pub fn add_armature(&mut self, armature: Armature) {
        self.armatures.insert(armature.name.clone(), armature);
    }

    /// Insert a lamp, keyed by its name.
    pub fn add_lamp(&mut self, lamp: Lamp) {
        self.lamps.insert(lamp.name.clone(), lamp);
    }

    /// Insert a camera, keyed by its name.
    pub fn add_camera(&mut self, camera: Camera) {
        self.cameras.insert(camera.name.clone(), camera);
    }

    /// Insert a material, keyed by its name.
    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    /// Insert a texture, keyed by its name.
    pub fn add_texture(&mut self, texture: Texture) {
        self.textures.insert(texture.name.clone(), texture);
    }

    /// Insert a node tree, keyed by its name.
    pub fn add_node_tree(&mut self, tree: NodeTree) {
        self.node_trees.insert(tree.name.clone(), tree);
    }

    /// Insert a world, keyed by its name.
    pub fn add_world(&mut self, world: World) {
        self.worlds.insert(world.name.clone(), world);
    }

    /// Insert a particle-settings block, keyed by its name.
    pub fn add_particle_settings(&mut self, settings: ParticleSettings) {
        self.particle_settings
            .insert(settings.name.clone(), settings);
    }

    /// Insert a shape-key block, keyed by its name.
    pub fn add_key(&mut self, key: KeyBlock) {
        self.keys.insert(key.name.clone(), key);
    }

    /// Insert a group, keyed by its name.
    pub fn add_group(&mut self, group: Group) {
        self.groups.insert(group.name.clone(), group);
    }

    /// Look up a scene by name.
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    /// Look up an object by name.
    pub fn object(&self, name: &str) -> Option<&Object> {
        self.objects.get(name)
    }

    /// Look up a geometry datablock by name.
    pub fn geometry(&self, name: &str) -> Option<&Geometry> {
        self.geometries.get(name)
    }

    /// Look up an armature by name.
    pub fn armature(&self, name: &str) -> Option<&Armature> {
        self.armatures.get(name)
    }

    /// Look up a lamp by name.
    pub fn lamp(&self, name: &str) -> Option<&Lamp> {
        self.lamps.get(name)
    }

    /// Look up a camera by name.
    pub fn camera(&self, name: &str) -> Option<&Camera> {
        self.cameras.get(name)
    }

    /// Look up a material by name.
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Look up a texture by name.
    pub fn texture(&self, name: &str) -> Option<&Texture> {
        self.textures.get(name)
    }

    /// Look up a node tree by name.
    pub fn node_tree(&self, name: &str) -> Option<&NodeTree> {
        self.node_trees.get(name)
    }

    /// Look up a world by name.
    pub fn world(&self, name: &str) -> Option<&World> {
        self.worlds.get(name)
    }

    /// Look up a particle-settings block by name.
    pub fn particle_settings(&self, name: &str) -> Option<&ParticleSettings> {
        self.particle_settings.get(name)
    }

    /// Look up a shape-key block by name.
    pub fn key(&self, name: &str) -> Option<&KeyBlock> {
        self.keys.get(name)
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Resolve the basis ("mother") object of a metaball family.
    ///
    /// The basis is the first metaball object in scene order whose family
    /// name matches the queried object's. Only the basis gets a geometry
    /// operation; sibling metaballs are computed as a side effect of its
    /// evaluation. Returns `None` when the object's family has no member
    /// in the scene's object list.
    pub fn metaball_basis<'a>(&'a self, scene: &Scene, object: &Object) -> Option<&'a Object> {
        let family = metaball_family(&object.name);
        scene
            .objects
            .iter()
            .filter_map(|name| self.object(name))
            .find(|candidate| {
                matches!(
                    candidate.data,
                    ObjectData::Geometry {
                        kind: GeometryKind::Metaball,
                        ..
                    }
                ) && metaball_family(&candidate.name) == family
            })
    }
}
