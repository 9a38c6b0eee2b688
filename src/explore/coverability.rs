//! Karp-Miller 覆盖树：发现严格覆盖时以 ω 抽象增长的库所，保证探索终止.
use crate::explore::engine::{ExplorationOutcome, ExploreError, ExploreStrategy, Explorer};
use crate::explore::graph::MarkingGraph;
use crate::explore::reduce::CoverabilityGraphReducer;
use crate::net::core::NetModel;
use crate::net::incidence::IncidenceMatrices;

pub struct CoverabilityExplorer<'a> {
    net: &'a NetModel,
    matrices: &'a IncidenceMatrices,
    node_limit: Option<usize>,
}

impl<'a> CoverabilityExplorer<'a> {
    pub fn new(net: &'a NetModel, matrices: &'a IncidenceMatrices) -> Self {
        Self {
            net,
            matrices,
            node_limit: None,
        }
    }

    pub fn with_node_limit(mut self, limit: Option<usize>) -> Self {
        self.node_limit = limit;
        self
    }

    /// Builds the coverability tree. Covering never aborts this run.
    pub fn run(&self) -> Result<MarkingGraph, ExploreError> {
        let outcome = Explorer::new(self.net, self.matrices, ExploreStrategy::COVERABILITY_TREE)
            .with_node_limit(self.node_limit)
            .run()?;
        match outcome {
            ExplorationOutcome::Done(tree) => Ok(tree),
            ExplorationOutcome::Unbounded(_) => {
                unreachable!("ω-abstracting runs never stop on covering")
            }
        }
    }
}

pub fn build_coverability_tree(net: &NetModel) -> Result<MarkingGraph, ExploreError> {
    let matrices = IncidenceMatrices::build(net);
    CoverabilityExplorer::new(net, &matrices).run()
}

/// The coverability tree of `net`, folded into its coverability graph.
pub fn build_coverability_graph(net: &NetModel) -> Result<MarkingGraph, ExploreError> {
    let tree = build_coverability_tree(net)?;
    CoverabilityGraphReducer::new().reduce(&tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explore::graph::GraphKind;
    use crate::net::ids::NodeId;
    use crate::net::structure::{Arc, Marking, Place, Tokens, Transition};

    fn doubling_net() -> NetModel {
        NetModel::new(
            vec![Place::new("p0", "P0", 1)],
            vec![Transition::new("t0", "T0")],
            vec![Arc::new("a0", "p0", "t0", 1), Arc::new("a1", "t0", "p0", 2)],
        )
        .unwrap()
    }

    #[test]
    fn doubling_place_tree_has_three_nodes() {
        let tree = build_coverability_tree(&doubling_net()).unwrap();
        assert_eq!(tree.kind(), GraphKind::CoverabilityTree);
        let markings: Vec<_> = tree.nodes().iter().map(|node| node.marking.clone()).collect();
        let omega = Marking::new(vec![Tokens::Omega].into());
        assert_eq!(
            markings,
            vec![Marking::from_exact([1]), omega.clone(), omega]
        );
        assert!(!tree.nodes()[0].marking.has_omega());
        assert_eq!(tree.nodes()[2].parent, Some(NodeId::new(1)));
        // Closed at creation, never expanded.
        assert!(tree.nodes()[2].checked);
        assert_eq!(tree.outgoing(NodeId::new(2)).count(), 0);
        assert_eq!(tree.edge_count(), 2);
    }

    #[test]
    fn growth_only_abstracts_the_growing_place() {
        // T0: P0 -> P0 + P1. P0 stays at one token, P1 grows without bound.
        let net = NetModel::new(
            vec![Place::new("p0", "P0", 1), Place::new("p1", "P1", 0)],
            vec![Transition::new("t0", "T0")],
            vec![
                Arc::new("a0", "p0", "t0", 1),
                Arc::new("a1", "t0", "p0", 1),
                Arc::new("a2", "t0", "p1", 1),
            ],
        )
        .unwrap();
        let tree = build_coverability_tree(&net).unwrap();
        assert_eq!(tree.node_count(), 3);
        let expected = Marking::new(vec![Tokens::Finite(1), Tokens::Omega].into());
        assert_eq!(tree.nodes()[1].marking, expected);
        assert_eq!(tree.nodes()[2].marking, expected);
    }

    #[test]
    fn dead_net_tree_is_root_only() {
        let net = NetModel::new(
            vec![Place::new("p0", "P0", 0)],
            vec![Transition::new("t0", "T0")],
            vec![Arc::new("a0", "p0", "t0", 1)],
        )
        .unwrap();
        let tree = build_coverability_tree(&net).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.leaves(), vec![NodeId::new(0)]);
    }
}
