//! 探索结果：节点集合与带标签的边，以及交给渲染器的视图.
use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use itertools::Itertools;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{Graph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::explore::node::{MarkingNode, node_name};
use crate::net::ids::{NodeId, TransitionId};
use crate::net::structure::Marking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphKind {
    Reachability,
    CoverabilityTree,
    CoverabilityGraph,
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GraphKind::Reachability => "reachability graph",
            GraphKind::CoverabilityTree => "coverability tree",
            GraphKind::CoverabilityGraph => "coverability graph",
        })
    }
}

/// One firing. Several firings may connect the same pair of nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkingEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub transition: TransitionId,
    pub label: String,
}

/// All firings between one ordered pair, labels joined in firing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub label: String,
}

/// How node and edge labels are spelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub node_prefix: String,
    pub label_separator: String,
    pub show_ancestors: bool,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            node_prefix: "m".to_string(),
            label_separator: ", ".to_string(),
            show_ancestors: true,
        }
    }
}

/// A node as a renderer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub name: String,
    pub marking: Marking,
    /// Ascending by id, for display.
    pub ancestors: Vec<NodeId>,
    pub ancestor_names: Vec<String>,
    pub label: String,
    #[serde(skip)]
    show_ancestors: bool,
}

impl NodeView {
    fn new(node: &MarkingNode, style: &LabelStyle) -> Self {
        let mut ancestors = node.ancestors().to_vec();
        ancestors.reverse();
        let ancestor_names = ancestors
            .iter()
            .map(|&id| node_name(&style.node_prefix, id))
            .collect();
        let mut view = Self {
            id: node.id,
            name: node.name(&style.node_prefix),
            marking: node.marking.clone(),
            ancestors,
            ancestor_names,
            label: String::new(),
            show_ancestors: style.show_ancestors,
        };
        view.label = view.label_with(&node.marking.to_string());
        view
    }

    /// The node label with `marking_text` in place of the marking.
    pub fn label_with(&self, marking_text: &str) -> String {
        if self.show_ancestors {
            format!(
                "{}\n{}\n({})",
                self.name,
                marking_text,
                self.ancestor_names.join(", ")
            )
        } else {
            format!("{}\n{}", self.name, marking_text)
        }
    }
}

impl fmt::Display for NodeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | ({})",
            self.name,
            self.marking,
            self.ancestor_names.join(", ")
        )
    }
}

/// Everything a renderer needs, detached from the run that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderModel {
    pub kind: GraphKind,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<LabeledEdge>,
    /// Representative id to the leaf ids folded into it.
    pub merged: BTreeMap<NodeId, Vec<NodeId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub labeled_edge_count: usize,
    pub leaf_count: usize,
}

/// A finished exploration: nodes ascending by id plus every firing recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkingGraph {
    kind: GraphKind,
    nodes: Vec<MarkingNode>,
    edges: Vec<MarkingEdge>,
    merged: BTreeMap<NodeId, Vec<NodeId>>,
}

impl MarkingGraph {
    pub(crate) fn new(kind: GraphKind, nodes: Vec<MarkingNode>, edges: Vec<MarkingEdge>) -> Self {
        debug_assert!(nodes.windows(2).all(|pair| pair[0].id < pair[1].id));
        Self {
            kind,
            nodes,
            edges,
            merged: BTreeMap::new(),
        }
    }

    pub(crate) fn with_merged(mut self, merged: BTreeMap<NodeId, Vec<NodeId>>) -> Self {
        self.merged = merged;
        self
    }

    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    pub fn nodes(&self) -> &[MarkingNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[MarkingEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&MarkingNode> {
        self.nodes
            .binary_search_by_key(&id, |node| node.id)
            .ok()
            .map(|pos| &self.nodes[pos])
    }

    pub fn root(&self) -> Option<&MarkingNode> {
        self.nodes.first()
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &MarkingEdge> {
        self.edges.iter().filter(move |edge| edge.source == id)
    }

    /// Nodes without outgoing edges, ascending by id.
    pub fn leaves(&self) -> Vec<NodeId> {
        let sources: FxHashSet<NodeId> = self.edges.iter().map(|edge| edge.source).collect();
        self.nodes
            .iter()
            .map(|node| node.id)
            .filter(|id| !sources.contains(id))
            .collect()
    }

    /// Representative id to the leaf ids folded into it. Empty unless this is a reduced graph.
    pub fn merged_leaves(&self) -> &BTreeMap<NodeId, Vec<NodeId>> {
        &self.merged
    }

    /// Collapses parallel firings into one edge per ordered pair, keeping first-seen order.
    pub fn labeled_edges(&self, separator: &str) -> Vec<LabeledEdge> {
        let mut grouped: IndexMap<(NodeId, NodeId), Vec<&str>> = IndexMap::new();
        for edge in &self.edges {
            grouped
                .entry((edge.source, edge.target))
                .or_default()
                .push(edge.label.as_str());
        }
        grouped
            .into_iter()
            .map(|((source, target), labels)| LabeledEdge {
                source,
                target,
                label: labels.into_iter().join(separator),
            })
            .collect()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.node_count(),
            edge_count: self.edge_count(),
            labeled_edge_count: self.labeled_edges(",").len(),
            leaf_count: self.leaves().len(),
        }
    }

    pub fn render(&self, style: &LabelStyle) -> RenderModel {
        RenderModel {
            kind: self.kind,
            nodes: self
                .nodes
                .iter()
                .map(|node| NodeView::new(node, style))
                .collect(),
            edges: self.labeled_edges(&style.label_separator),
            merged: self.merged.clone(),
        }
    }

    pub fn to_petgraph(&self, style: &LabelStyle) -> Graph<NodeView, String> {
        let model = self.render(style);
        let mut graph = Graph::with_capacity(model.nodes.len(), model.edges.len());
        let mut index: FxHashMap<NodeId, NodeIndex> = FxHashMap::default();
        for view in model.nodes {
            let id = view.id;
            index.insert(id, graph.add_node(view));
        }
        for edge in model.edges {
            if let (Some(&source), Some(&target)) = (index.get(&edge.source), index.get(&edge.target))
            {
                graph.add_edge(source, target, edge.label);
            }
        }
        graph
    }

    pub fn to_dot(&self, style: &LabelStyle) -> String {
        fn escape(s: &str) -> String {
            s.replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n")
        }

        let graph = self.to_petgraph(style);
        let edge_attr = |_: &Graph<NodeView, String>,
                         edge: petgraph::graph::EdgeReference<'_, String>| {
            format!("label=\"{}\"", escape(edge.weight()))
        };
        let node_attr = |_: &Graph<NodeView, String>, (_, view): (NodeIndex, &NodeView)| {
            format!("label=\"{}\"", escape(&view.label))
        };

        format!(
            "{:?}",
            Dot::with_attr_getters(
                &graph,
                &[Config::EdgeNoLabel, Config::NodeNoLabel],
                &edge_attr,
                &node_attr
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explore::node::NodeArena;

    fn t(raw: u32) -> TransitionId {
        TransitionId::new(raw)
    }

    fn edge(source: NodeId, target: NodeId, transition: u32, label: &str) -> MarkingEdge {
        MarkingEdge {
            source,
            target,
            transition: t(transition),
            label: label.to_string(),
        }
    }

    fn diamond() -> MarkingGraph {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Marking::from_exact([2]), None, true);
        let next = arena.alloc(Marking::from_exact([1]), Some((root, t(0))), true);
        let edges = vec![
            edge(root, next, 0, "T0"),
            edge(root, next, 1, "T1"),
            edge(next, root, 2, "T2"),
        ];
        MarkingGraph::new(GraphKind::Reachability, arena.into_nodes(), edges)
    }

    #[test]
    fn parallel_edges_are_coalesced() {
        let graph = diamond();
        let labeled = graph.labeled_edges(", ");
        assert_eq!(labeled.len(), 2);
        assert_eq!(labeled[0].label, "T0, T1");
        assert_eq!(labeled[1].label, "T2");
        assert!(graph.leaves().is_empty());
    }

    #[test]
    fn node_labels_list_ancestors_ascending() {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Marking::from_exact([1]), None, true);
        let mid = arena.alloc(Marking::from_exact([2]), Some((root, t(0))), true);
        arena.alloc(Marking::from_exact([3]), Some((mid, t(0))), true);
        let graph = MarkingGraph::new(GraphKind::CoverabilityTree, arena.into_nodes(), vec![]);

        let model = graph.render(&LabelStyle::default());
        assert_eq!(model.nodes[2].label, "m2\n[3]\n(m0, m1)");
        assert_eq!(model.nodes[2].label_with("[*]"), "m2\n[*]\n(m0, m1)");
        assert_eq!(model.nodes[2].to_string(), "m2 | [3] | (m0, m1)");

        let bare = LabelStyle {
            node_prefix: "s".into(),
            show_ancestors: false,
            ..LabelStyle::default()
        };
        assert_eq!(graph.render(&bare).nodes[0].label, "s0\n[1]");
        assert_eq!(graph.leaves().len(), 3);
    }

    #[test]
    fn dot_output_contains_labels() {
        let dot = diamond().to_dot(&LabelStyle::default());
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("label=\"T0, T1\""));
        assert!(dot.contains("m1\\n[1]\\n(m0)"));
    }
}
