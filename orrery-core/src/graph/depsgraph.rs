//! Graph Container
//!
//! A [`Depsgraph`] owns every node created during one build pass and
//! exposes the factory and lookup surface the builder drives:
//!
//! - `add_id_node` is idempotent per entity, which is what makes shared
//!   datablocks (one material on many objects) appear exactly once.
//! - `add_component_node` is idempotent per (entity, kind, sub-name).
//! - `add_operation_node` always appends; duplicate requests for the same
//!   (component, opcode, name) triple are a caller bug.
//!
//! Top-level scene builds own their graph directly; a group subgraph is
//! owned by the [`SubgraphNode`] registered in the parent graph. Node maps
//! are insertion-ordered, so enumeration order equals discovery order and
//! builds are deterministic for fixed input.

use indexmap::IndexMap;

use crate::scene::EntityKey;

use super::node::{
    ComponentKey, ComponentKind, ComponentNode, IdNode, OpCallback, OpCode, OperationNode,
    SubgraphNode, TimeSourceNode,
};

/// The dependency graph for one traversal scope.
#[derive(Debug, Default)]
pub struct Depsgraph {
    time_source: Option<TimeSourceNode>,
    id_nodes: IndexMap<EntityKey, IdNode>,
    subgraphs: IndexMap<EntityKey, SubgraphNode>,
}

impl Depsgraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the graph's time source. Every graph has at most
    /// one; repeated calls return the existing node.
    pub fn add_time_source(&mut self) -> &mut TimeSourceNode {
        self.time_source.get_or_insert_with(TimeSourceNode::default)
    }

    /// The time source, if the build pass has created it.
    pub fn time_source(&self) -> Option<&TimeSourceNode> {
        self.time_source.as_ref()
    }

    /// Get or create the id node for an entity.
    pub fn add_id_node(&mut self, key: &EntityKey) -> &mut IdNode {
        self.id_nodes
            .entry(key.clone())
            .or_insert_with(|| IdNode::new(key.clone()))
    }

    /// Look up an entity's id node.
    pub fn find_id_node(&self, key: &EntityKey) -> Option<&IdNode> {
        self.id_nodes.get(key)
    }

    /// Get or create a component node under an entity.
    pub fn add_component_node(
        &mut self,
        entity: &EntityKey,
        key: ComponentKey,
    ) -> &mut ComponentNode {
        self.add_id_node(entity).add_component(key)
    }

    /// Append a new operation under (entity, component).
    ///
    /// Creates the id node and component on demand; the operation itself
    /// is always a fresh node.
    pub fn add_operation_node(
        &mut self,
        entity: &EntityKey,
        component: ComponentKey,
        opcode: OpCode,
        callback: OpCallback,
        name: impl Into<String>,
    ) -> &mut OperationNode {
        self.add_component_node(entity, component)
            .add_operation(opcode, callback, name)
    }

    /// Register a nested graph under a group's entity key.
    pub fn add_subgraph_node(&mut self, key: EntityKey, graph: Depsgraph) -> &mut SubgraphNode {
        self.subgraphs
            .entry(key.clone())
            .or_insert_with(|| SubgraphNode {
                key,
                graph: Box::new(graph),
            })
    }

    /// Look up the subgraph registered for a group.
    pub fn find_subgraph(&self, key: &EntityKey) -> Option<&SubgraphNode> {
        self.subgraphs.get(key)
    }

    /// Iterate id nodes in discovery order.
    pub fn id_nodes(&self) -> impl Iterator<Item = &IdNode> {
        self.id_nodes.values()
    }

    /// Iterate subgraph nodes in registration order.
    pub fn subgraphs(&self) -> impl Iterator<Item = &SubgraphNode> {
        self.subgraphs.values()
    }

    /// Iterate every operation in the graph (excluding subgraphs), in
    /// discovery order. This is the enumeration surface the relation pass
    /// and evaluation engine consume.
    pub fn operations(&self) -> impl Iterator<Item = &OperationNode> {
        self.id_nodes
            .values()
            .flat_map(|id| id.components())
            .flat_map(|comp| comp.operations())
    }

    /// Convenience lookup: an entity's component of the given kind with
    /// no sub-name.
    pub fn find_component(
        &self,
        entity: &EntityKey,
        kind: ComponentKind,
    ) -> Option<&ComponentNode> {
        self.find_id_node(entity)
            .and_then(|id| id.find_component(&ComponentKey::new(kind)))
    }

    /// Number of id nodes in this graph.
    pub fn id_node_count(&self) -> usize {
        self.id_nodes.len()
    }

    /// Number of subgraph nodes in this graph.
    pub fn subgraph_count(&self) -> usize {
        self.subgraphs.len()
    }

    /// Total operations in this graph (excluding subgraphs).
    pub fn operation_count(&self) -> usize {
        self.id_nodes.values().map(IdNode::operation_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::noop_callback;
    use crate::scene::EntityKey;

    #[test]
    fn id_nodes_are_unique_per_entity() {
        let mut graph = Depsgraph::new();
        let key = EntityKey::object("Cube");

        graph.add_id_node(&key);
        graph.add_id_node(&key);
        graph.add_id_node(&EntityKey::object("Lamp"));

        assert_eq!(graph.id_node_count(), 2);
        assert!(graph.find_id_node(&key).is_some());
    }

    #[test]
    fn component_nodes_are_unique_per_key() {
        let mut graph = Depsgraph::new();
        let key = EntityKey::object("Cube");

        graph.add_component_node(&key, ComponentKey::new(ComponentKind::Transform));
        graph.add_component_node(&key, ComponentKey::new(ComponentKind::Transform));
        graph.add_component_node(&key, ComponentKey::new(ComponentKind::Geometry));

        assert_eq!(graph.find_id_node(&key).unwrap().component_count(), 2);
    }

    #[test]
    fn operations_always_append() {
        let mut graph = Depsgraph::new();
        let key = EntityKey::object("Cube");

        graph.add_operation_node(
            &key,
            ComponentKey::new(ComponentKind::Geometry),
            OpCode::Exec,
            noop_callback(),
            "Geometry Eval",
        );
        graph.add_operation_node(
            &key,
            ComponentKey::new(ComponentKind::Geometry),
            OpCode::Exec,
            noop_callback(),
            "Modifier: Subsurf",
        );

        assert_eq!(graph.operation_count(), 2);
        let names: Vec<_> = graph.operations().map(|op| op.name.clone()).collect();
        assert_eq!(names, ["Geometry Eval", "Modifier: Subsurf"]);
    }

    #[test]
    fn time_source_is_singular() {
        let mut graph = Depsgraph::new();
        assert!(graph.time_source().is_none());

        graph.add_time_source();
        graph.add_time_source();
        assert!(graph.time_source().is_some());
    }

    #[test]
    fn subgraph_owns_nested_graph() {
        let mut parent = Depsgraph::new();
        let mut nested = Depsgraph::new();
        nested.add_id_node(&EntityKey::object("Member"));

        let key = EntityKey::group("Props");
        parent.add_subgraph_node(key.clone(), nested);

        let sub = parent.find_subgraph(&key).unwrap();
        assert_eq!(sub.graph.id_node_count(), 1);
        // The nested entity is not flattened into the parent scope.
        assert!(parent.find_id_node(&EntityKey::object("Member")).is_none());
    }
}
