//! Dependency Graph
//!
//! This module implements the node model and container for the scene
//! dependency graph: the structure the builder populates and the
//! relation-linking pass and evaluation engine consume.
//!
//! # Overview
//!
//! The graph is a three-level ownership hierarchy plus two singletons:
//!
//! - one [`TimeSourceNode`] per graph, created first;
//! - one [`IdNode`] per participating entity, found by entity key;
//! - under each id node, one [`ComponentNode`] per functional facet;
//! - under each component, the [`OperationNode`]s that do the work;
//! - [`SubgraphNode`]s wrapping independently built graphs for groups.
//!
//! # Design Decisions
//!
//! 1. Node kinds are a closed set of concrete types rather than a trait
//!    hierarchy: the evaluation engine can match exhaustively, and
//!    ownership (graph → id → component → operation) is expressed
//!    directly in the type structure.
//!
//! 2. All lookup maps are insertion-ordered. Enumeration order equals
//!    discovery order, so identical input produces an identical graph,
//!    which the relation pass relies on.
//!
//! 3. No node stores edges. Relations are a separate pass's concern; the
//!    identity guarantees here (unique keys at every level) are what let
//!    that pass find its endpoints.

mod depsgraph;
mod node;

pub use depsgraph::Depsgraph;
pub use node::{
    ComponentKey, ComponentKind, ComponentNode, EvalContext, IdNode, OpCallback, OpCode,
    OperationFlags, OperationNode, SubgraphNode, TimeSourceNode, noop_callback,
};
