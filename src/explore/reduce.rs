//! 覆盖树到覆盖图的归约：标识相同的叶子并入最早创建的同标识节点.
use std::collections::BTreeMap;

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::explore::engine::ExploreError;
use crate::explore::graph::{GraphKind, MarkingGraph};
use crate::net::ids::NodeId;
use crate::net::structure::Marking;

#[derive(Debug, Default, Clone, Copy)]
pub struct CoverabilityGraphReducer;

impl CoverabilityGraphReducer {
    pub fn new() -> Self {
        Self
    }

    /// Folds every leaf into the earliest node carrying the same marking, whether or not that
    /// node is a leaf itself. Edges into a folded leaf are redirected to its representative.
    /// Surviving nodes keep their ids.
    pub fn reduce(&self, tree: &MarkingGraph) -> Result<MarkingGraph, ExploreError> {
        if tree.kind() != GraphKind::CoverabilityTree {
            return Err(ExploreError::NotACoverabilityTree(tree.kind()));
        }

        let mut earliest: FxHashMap<&Marking, NodeId> = FxHashMap::default();
        for node in tree.nodes() {
            earliest.entry(&node.marking).or_insert(node.id);
        }

        let mut redirect: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        let mut merged: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for leaf in tree.leaves() {
            let Some(node) = tree.node(leaf) else {
                continue;
            };
            let representative = earliest.get(&node.marking).copied().unwrap_or(leaf);
            if representative != leaf {
                debug!("folding leaf {leaf:?} into {representative:?}");
                redirect.insert(leaf, representative);
                merged.entry(representative).or_default().push(leaf);
            }
        }

        let nodes = tree
            .nodes()
            .iter()
            .filter(|node| !redirect.contains_key(&node.id))
            .cloned()
            .collect::<Vec<_>>();
        let edges = tree
            .edges()
            .iter()
            .map(|edge| {
                let mut edge = edge.clone();
                if let Some(&representative) = redirect.get(&edge.target) {
                    edge.target = representative;
                }
                edge
            })
            .collect::<Vec<_>>();

        info!(
            "coverability graph: {} nodes ({} leaves folded), {} edges",
            nodes.len(),
            redirect.len(),
            edges.len()
        );
        Ok(MarkingGraph::new(GraphKind::CoverabilityGraph, nodes, edges).with_merged(merged))
    }
}
