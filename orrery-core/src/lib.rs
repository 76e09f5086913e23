//! Orrery Core
//!
//! This crate builds the scene dependency graph: the directed graph of
//! evaluation nodes representing every computation needed to produce a
//! fully evaluated frame of a scene.
//!
//! # Architecture
//!
//! The crate is organized into three modules:
//!
//! - `scene`: the datablock model the builder walks (objects, geometry,
//!   rigs, shading blocks, groups) and the [`SceneDb`](scene::SceneDb)
//!   database holding them
//! - `graph`: the node model (id, component, operation, subgraph nodes)
//!   and the [`Depsgraph`](graph::Depsgraph) container that owns them
//! - `build`: the recursive traversal that populates a graph from a
//!   scene root
//!
//! The build pass only constructs: operations are inert descriptors, and
//! no edges are stored. Two external collaborators consume the result — a
//! relation-linking pass that adds explicit edges between operations, and
//! an evaluation engine that schedules them (in parallel where the
//! partial order allows).
//!
//! # Example
//!
//! ```
//! use orrery_core::build_scene_graph;
//! use orrery_core::scene::{Geometry, Object, Scene, SceneDb};
//!
//! let mut db = SceneDb::new();
//! db.add_geometry(Geometry::new("CubeMesh"));
//! db.add_object(Object::mesh("Cube", "CubeMesh"));
//!
//! let mut scene = Scene::new("Scene");
//! scene.objects.push("Cube".to_string());
//! db.add_scene(scene);
//!
//! let graph = build_scene_graph(&db, "Scene").unwrap();
//! assert_eq!(graph.id_node_count(), 1);
//! ```

pub mod build;
pub mod graph;
pub mod scene;

mod error;

pub use build::{DepsgraphBuilder, build_scene_graph};
pub use error::BuildError;
pub use graph::Depsgraph;
