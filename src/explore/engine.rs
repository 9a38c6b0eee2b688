//! 通用状态空间探索器.
//!
//! 可达图与覆盖树只在两处不同：遇到严格覆盖时是中止还是引入 ω，
//! 以及新标识是按内容合并到已有节点还是总是新建节点。二者由 [`ExploreStrategy`] 描述。
use std::collections::VecDeque;
use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::explore::graph::{GraphKind, MarkingEdge, MarkingGraph};
use crate::explore::node::NodeArena;
use crate::net::core::NetModel;
use crate::net::firing::{
    FireError, FiringRule, abstract_to_omega, dominates_strictly, growing_places,
};
use crate::net::ids::{NodeId, PlaceId, TransitionId};
use crate::net::incidence::IncidenceMatrices;
use crate::net::structure::{Marking, Weight};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExploreError {
    #[error("firing failed: {0}")]
    Fire(#[from] FireError),
    #[error("node {node:?} carries ω in a run over exact markings")]
    OmegaInExactRun { node: NodeId },
    #[error("exploration exceeded the node limit of {limit}")]
    NodeLimitExceeded { limit: usize },
    #[error("expected a coverability tree, got a {0}")]
    NotACoverabilityTree(GraphKind),
}

/// What to do when a new marking strictly covers a marking in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverPolicy {
    Abort,
    AbstractToOmega,
}

/// Whether a marking seen before is folded into the existing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPolicy {
    MergeByMarking,
    AlwaysNew,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExploreStrategy {
    pub on_cover: CoverPolicy,
    pub identity: IdentityPolicy,
}

impl ExploreStrategy {
    pub const REACHABILITY: Self = Self {
        on_cover: CoverPolicy::Abort,
        identity: IdentityPolicy::MergeByMarking,
    };

    pub const COVERABILITY_TREE: Self = Self {
        on_cover: CoverPolicy::AbstractToOmega,
        identity: IdentityPolicy::AlwaysNew,
    };

    /// Runs that abort on covering never produce ω, so they fire over plain integers.
    fn is_exact(self) -> bool {
        self.on_cover == CoverPolicy::Abort
    }

    fn graph_kind(self) -> GraphKind {
        match self.identity {
            IdentityPolicy::MergeByMarking => GraphKind::Reachability,
            IdentityPolicy::AlwaysNew => GraphKind::CoverabilityTree,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunState {
    Exploring,
    Unbounded,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunState::Exploring => "exploring",
            RunState::Unbounded => "unbounded",
            RunState::Done => "done",
        })
    }
}

/// Why a reachability run stopped: firing `transition` on `source` yielded `covering`, which
/// strictly covers the marking of `covered`, an ancestor of `source` or `source` itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnboundedWitness {
    pub covered: NodeId,
    pub covered_marking: Marking,
    pub source: NodeId,
    pub transition: TransitionId,
    pub covering_marking: Marking,
    pub growing_places: Vec<PlaceId>,
    /// From the initial marking to `covering_marking`, `transition` included.
    pub firing_sequence: Vec<TransitionId>,
}

/// The terminal outcome of a run. An unbounded run exposes no graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorationOutcome {
    Done(MarkingGraph),
    Unbounded(UnboundedWitness),
}

impl ExplorationOutcome {
    pub fn run_state(&self) -> RunState {
        match self {
            ExplorationOutcome::Done(_) => RunState::Done,
            ExplorationOutcome::Unbounded(_) => RunState::Unbounded,
        }
    }

    pub fn graph(&self) -> Option<&MarkingGraph> {
        match self {
            ExplorationOutcome::Done(graph) => Some(graph),
            ExplorationOutcome::Unbounded(_) => None,
        }
    }

    pub fn into_graph(self) -> Option<MarkingGraph> {
        match self {
            ExplorationOutcome::Done(graph) => Some(graph),
            ExplorationOutcome::Unbounded(_) => None,
        }
    }

    pub fn witness(&self) -> Option<&UnboundedWitness> {
        match self {
            ExplorationOutcome::Unbounded(witness) => Some(witness),
            ExplorationOutcome::Done(_) => None,
        }
    }
}

/// A single, non re-entrant exploration run.
///
/// Nodes are expanded in creation order, transitions in net order, and the covering scan
/// walks the current node and then its ancestors by descending id.
pub struct Explorer<'a> {
    net: &'a NetModel,
    rule: FiringRule<'a>,
    strategy: ExploreStrategy,
    node_limit: Option<usize>,
    arena: NodeArena,
    edges: Vec<MarkingEdge>,
    queue: VecDeque<NodeId>,
    state: RunState,
}

impl<'a> Explorer<'a> {
    pub fn new(
        net: &'a NetModel,
        matrices: &'a IncidenceMatrices,
        strategy: ExploreStrategy,
    ) -> Self {
        Self {
            net,
            rule: FiringRule::new(matrices),
            strategy,
            node_limit: None,
            arena: NodeArena::new(),
            edges: Vec::new(),
            queue: VecDeque::new(),
            state: RunState::Exploring,
        }
    }

    pub fn with_node_limit(mut self, limit: Option<usize>) -> Self {
        self.node_limit = limit;
        self
    }

    pub fn run(mut self) -> Result<ExplorationOutcome, ExploreError> {
        let kind = self.strategy.graph_kind();
        info!(
            "building {} for {} places, {} transitions",
            kind,
            self.net.places_len(),
            self.net.transitions_len()
        );

        self.create(self.net.initial_marking(), None, false)?;

        while self.state == RunState::Exploring {
            let Some(current) = self.queue.pop_front() else {
                self.state = RunState::Done;
                break;
            };
            if let Some(witness) = self.expand(current)? {
                self.state = RunState::Unbounded;
                warn!(
                    "net is unbounded: {} covers {} at places {:?} after {} firings",
                    witness.covering_marking,
                    witness.covered_marking,
                    witness.growing_places,
                    witness.firing_sequence.len()
                );
                return Ok(ExplorationOutcome::Unbounded(witness));
            }
        }

        info!(
            "{} {}: {} nodes, {} edges",
            kind,
            self.state,
            self.arena.len(),
            self.edges.len()
        );
        Ok(ExplorationOutcome::Done(MarkingGraph::new(
            kind,
            self.arena.into_nodes(),
            self.edges,
        )))
    }

    fn create(
        &mut self,
        marking: Marking,
        parent: Option<(NodeId, TransitionId)>,
        checked: bool,
    ) -> Result<NodeId, ExploreError> {
        if let Some(limit) = self.node_limit {
            if self.arena.len() >= limit {
                return Err(ExploreError::NodeLimitExceeded { limit });
            }
        }
        let id = self.arena.alloc(marking, parent, checked);
        if !checked {
            self.queue.push_back(id);
        }
        Ok(id)
    }

    /// Fires every enabled transition of `current`. Returns a witness if the run must stop.
    fn expand(&mut self, current: NodeId) -> Result<Option<UnboundedWitness>, ExploreError> {
        let marking = self.arena[current].marking.clone();
        let exact: Option<Vec<Weight>> = if self.strategy.is_exact() {
            Some(
                marking
                    .to_exact()
                    .ok_or(ExploreError::OmegaInExactRun { node: current })?,
            )
        } else {
            None
        };

        for transition in self.net.transitions().indices() {
            let mut next = match &exact {
                Some(tokens) => {
                    if !self.rule.enabled_exact(tokens, transition) {
                        continue;
                    }
                    Marking::from_exact(self.rule.fire_exact(tokens, transition)?)
                }
                None => {
                    if !self.rule.enabled(&marking, transition) {
                        continue;
                    }
                    self.rule.fire(&marking, transition)?
                }
            };
            debug!("{current:?} --{transition:?}--> {next}");

            let covered = self
                .arena
                .scope(current)
                .find(|&candidate| dominates_strictly(&self.arena[candidate].marking, &next));
            if let Some(covered) = covered {
                let covered_marking = &self.arena[covered].marking;
                match self.strategy.on_cover {
                    CoverPolicy::Abort => {
                        return Ok(Some(self.witness(covered, current, transition, next)));
                    }
                    CoverPolicy::AbstractToOmega => {
                        next = abstract_to_omega(covered_marking, &next);
                        debug!("{next} after ω-abstraction against {covered:?}");
                    }
                }
            }

            let target = match self.strategy.identity {
                IdentityPolicy::MergeByMarking => match self.arena.find_by_marking(&next) {
                    Some(existing) => {
                        if existing != current {
                            self.arena.merge_ancestors(existing, current);
                        }
                        existing
                    }
                    None => self.create(next, Some((current, transition)), false)?,
                },
                IdentityPolicy::AlwaysNew => {
                    let repeats = self
                        .arena
                        .scope(current)
                        .any(|candidate| self.arena[candidate].marking == next);
                    self.create(next, Some((current, transition)), repeats)?
                }
            };

            self.edges.push(MarkingEdge {
                source: current,
                target,
                transition,
                label: self.net.transition(transition).label.clone(),
            });
        }

        self.arena.mark_checked(current);
        Ok(None)
    }

    fn witness(
        &self,
        covered: NodeId,
        source: NodeId,
        transition: TransitionId,
        covering_marking: Marking,
    ) -> UnboundedWitness {
        let covered_marking = self.arena[covered].marking.clone();
        let mut firing_sequence = self.arena.firing_sequence(source);
        firing_sequence.push(transition);
        UnboundedWitness {
            growing_places: growing_places(&covered_marking, &covering_marking),
            covered,
            covered_marking,
            source,
            transition,
            covering_marking,
            firing_sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::structure::{Arc, Place, Transition};

    /// P0 and P1 swap a single token back and forth.
    fn ping_pong() -> NetModel {
        NetModel::new(
            vec![Place::new("p0", "P0", 1), Place::new("p1", "P1", 0)],
            vec![Transition::new("t0", "T0"), Transition::new("t1", "T1")],
            vec![
                Arc::new("a0", "p0", "t0", 1),
                Arc::new("a1", "t0", "p1", 1),
                Arc::new("a2", "p1", "t1", 1),
                Arc::new("a3", "t1", "p0", 1),
            ],
        )
        .unwrap()
    }

    #[test]
    fn merge_by_marking_closes_cycles() {
        let net = ping_pong();
        let matrices = IncidenceMatrices::build(&net);
        let outcome = Explorer::new(&net, &matrices, ExploreStrategy::REACHABILITY)
            .run()
            .unwrap();
        assert_eq!(outcome.run_state(), RunState::Done);
        let graph = outcome.graph().unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edges()[1].target, NodeId::new(0));
        assert!(graph.nodes().iter().all(|node| node.checked));
    }

    #[test]
    fn always_new_closes_branch_on_exact_repeat() {
        let net = ping_pong();
        let matrices = IncidenceMatrices::build(&net);
        let graph = Explorer::new(&net, &matrices, ExploreStrategy::COVERABILITY_TREE)
            .run()
            .unwrap()
            .into_graph()
            .unwrap();
        // [1,0] -> [0,1] -> [1,0] (closed)
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.kind(), GraphKind::CoverabilityTree);
        let leaf = graph.node(NodeId::new(2)).unwrap();
        assert!(leaf.checked);
        assert_eq!(leaf.marking, Marking::from_exact([1, 0]));
    }

    #[test]
    fn every_node_is_expanded_once() {
        // P0 --1--> T0 --2--> P0
        let net = NetModel::new(
            vec![Place::new("p0", "P0", 1)],
            vec![Transition::new("t0", "T0")],
            vec![Arc::new("a0", "p0", "t0", 1), Arc::new("a1", "t0", "p0", 2)],
        )
        .unwrap();
        let matrices = IncidenceMatrices::build(&net);
        let tree = Explorer::new(&net, &matrices, ExploreStrategy::COVERABILITY_TREE)
            .run()
            .unwrap()
            .into_graph()
            .unwrap();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.outgoing(NodeId::new(0)).count(), 1);
        assert_eq!(tree.outgoing(NodeId::new(1)).count(), 1);
        assert_eq!(tree.nodes()[2].parent, Some(NodeId::new(1)));

        let net = ping_pong();
        let matrices = IncidenceMatrices::build(&net);
        let graph = Explorer::new(&net, &matrices, ExploreStrategy::REACHABILITY)
            .run()
            .unwrap()
            .into_graph()
            .unwrap();
        let pairs: Vec<_> = graph
            .edges()
            .iter()
            .map(|edge| (edge.source.raw(), edge.target.raw()))
            .collect();
        assert_eq!(pairs, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn node_limit_stops_the_run() {
        let net = ping_pong();
        let matrices = IncidenceMatrices::build(&net);
        let err = Explorer::new(&net, &matrices, ExploreStrategy::COVERABILITY_TREE)
            .with_node_limit(Some(2))
            .run()
            .unwrap_err();
        assert_eq!(err, ExploreError::NodeLimitExceeded { limit: 2 });
    }
}
