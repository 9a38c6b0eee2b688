//! 可达图构造：精确整数标识上的广度优先探索，发现严格覆盖即判定无界并中止.
use crate::explore::engine::{ExplorationOutcome, ExploreError, ExploreStrategy, Explorer};
use crate::net::core::NetModel;
use crate::net::incidence::IncidenceMatrices;

/// Builds the reachability graph of a net, or reports it unbounded.
pub struct ReachabilityExplorer<'a> {
    net: &'a NetModel,
    matrices: &'a IncidenceMatrices,
    node_limit: Option<usize>,
}

impl<'a> ReachabilityExplorer<'a> {
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

    /// Callers must check [`ExplorationOutcome::run_state`] before touching the graph.
    pub fn run(&self) -> Result<ExplorationOutcome, ExploreError> {
        Explorer::new(self.net, self.matrices, ExploreStrategy::REACHABILITY)
            .with_node_limit(self.node_limit)
            .run()
    }
}

pub fn explore_reachability(net: &NetModel) -> Result<ExplorationOutcome, ExploreError> {
    let matrices = IncidenceMatrices::build(net);
    ReachabilityExplorer::new(net, &matrices).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explore::engine::RunState;
    use crate::net::ids::{NodeId, PlaceId, TransitionId};
    use crate::net::structure::{Arc, Marking, Place, Transition};

    #[test]
    fn single_place_without_transitions() {
        let net = NetModel::new(vec![Place::new("p0", "P0", 1)], vec![], vec![]).unwrap();
        let outcome = explore_reachability(&net).unwrap();
        assert_eq!(outcome.run_state(), RunState::Done);
        let graph = outcome.graph().unwrap();
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.nodes()[0].marking, Marking::from_exact([1]));
    }

    #[test]
    fn self_doubling_place_is_unbounded() {
        let net = NetModel::new(
            vec![Place::new("p0", "P0", 1)],
            vec![Transition::new("t0", "T0")],
            vec![Arc::new("a0", "p0", "t0", 1), Arc::new("a1", "t0", "p0", 2)],
        )
        .unwrap();
        let outcome = explore_reachability(&net).unwrap();
        assert_eq!(outcome.run_state(), RunState::Unbounded);
        assert!(outcome.graph().is_none());

        let witness = outcome.witness().unwrap();
        assert_eq!(witness.covered, NodeId::new(0));
        assert_eq!(witness.covered_marking, Marking::from_exact([1]));
        assert_eq!(witness.covering_marking, Marking::from_exact([2]));
        assert_eq!(witness.growing_places, vec![PlaceId::new(0)]);
        assert_eq!(witness.firing_sequence, vec![TransitionId::new(0)]);
    }

    #[test]
    fn empty_net_yields_single_empty_node() {
        let net = NetModel::new(vec![], vec![], vec![]).unwrap();
        let graph = explore_reachability(&net).unwrap().into_graph().unwrap();
        assert_eq!(graph.node_count(), 1);
        assert!(graph.nodes()[0].marking.is_empty());
    }

    #[test]
    fn unrelated_branches_do_not_count_as_growth() {
        // [0,2] covers its sibling [0,1] but not the shared root [1,0].
        let net = NetModel::new(
            vec![Place::new("p0", "P0", 1), Place::new("p1", "P1", 0)],
            vec![Transition::new("t0", "T0"), Transition::new("t1", "T1")],
            vec![
                Arc::new("a0", "p0", "t0", 1),
                Arc::new("a1", "t0", "p1", 1),
                Arc::new("a2", "p0", "t1", 1),
                Arc::new("a3", "t1", "p1", 2),
            ],
        )
        .unwrap();
        let outcome = explore_reachability(&net).unwrap();
        assert_eq!(outcome.run_state(), RunState::Done);
        assert_eq!(outcome.graph().unwrap().node_count(), 3);
    }
}
