//! 状态空间节点及其所属的节点池.
use std::ops::Index;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::net::ids::{NodeId, TransitionId};
use crate::net::index_vec::IndexVec;
use crate::net::structure::Marking;

/// One discovered marking.
///
/// `parent` is a back-reference for ancestor lookups only. A parent always has a smaller id
/// than its child, so parent chains are finite and acyclic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkingNode {
    pub id: NodeId,
    pub marking: Marking,
    pub parent: Option<NodeId>,
    /// The transition fired on `parent` to create this node.
    pub via: Option<TransitionId>,
    /// All enabled transitions have been explored, or the node was closed at creation.
    pub checked: bool,
    /// Descending by id, no duplicates, never contains `id` itself.
    ancestors: Vec<NodeId>,
}

impl MarkingNode {
    pub fn ancestors(&self) -> &[NodeId] {
        &self.ancestors
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn name(&self, prefix: &str) -> String {
        node_name(prefix, self.id)
    }
}

pub fn node_name(prefix: &str, id: NodeId) -> String {
    format!("{prefix}{}", id.raw())
}

/// Owns every node of one exploration run.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: IndexVec<NodeId, MarkingNode>,
    first_with_marking: FxHashMap<Marking, NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&MarkingNode> {
        self.nodes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarkingNode> {
        self.nodes.iter()
    }

    /// Creates a node. Its ancestor set is the parent's set plus the parent.
    pub fn alloc(
        &mut self,
        marking: Marking,
        parent: Option<(NodeId, TransitionId)>,
        checked: bool,
    ) -> NodeId {
        let id = self.nodes.next_index();
        let ancestors = match parent {
            Some((parent, _)) => {
                let mut chain = self.nodes[parent].ancestors.clone();
                chain.push(parent);
                normalize(chain, id)
            }
            None => Vec::new(),
        };
        self.first_with_marking.entry(marking.clone()).or_insert(id);
        self.nodes.push(MarkingNode {
            id,
            marking,
            parent: parent.map(|(parent, _)| parent),
            via: parent.map(|(_, transition)| transition),
            checked,
            ancestors,
        })
    }

    pub fn mark_checked(&mut self, id: NodeId) {
        self.nodes[id].checked = true;
    }

    /// The earliest node carrying exactly `marking`.
    pub fn find_by_marking(&self, marking: &Marking) -> Option<NodeId> {
        self.first_with_marking.get(marking).copied()
    }

    /// `id` followed by its ancestors, descending by id. This is the set a new successor of
    /// `id` is compared against.
    pub fn scope(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(id).chain(self.nodes[id].ancestors.iter().copied())
    }

    /// Another path reached `target` from `from`: fold `from` and its ancestors into
    /// `target`'s ancestor set.
    pub fn merge_ancestors(&mut self, target: NodeId, from: NodeId) {
        let mut chain = self.nodes[target].ancestors.clone();
        chain.extend_from_slice(&self.nodes[from].ancestors);
        chain.push(from);
        self.nodes[target].ancestors = normalize(chain, target);
    }

    /// Transitions fired from the root to reach `id`, following parent links.
    pub fn firing_sequence(&self, id: NodeId) -> Vec<TransitionId> {
        let mut sequence = Vec::new();
        let mut current = &self.nodes[id];
        while let (Some(parent), Some(via)) = (current.parent, current.via) {
            sequence.push(via);
            current = &self.nodes[parent];
        }
        sequence.reverse();
        sequence
    }

    pub fn into_nodes(self) -> Vec<MarkingNode> {
        self.nodes.into_vec()
    }
}

impl Index<NodeId> for NodeArena {
    type Output = MarkingNode;

    fn index(&self, id: NodeId) -> &MarkingNode {
        &self.nodes[id]
    }
}

fn normalize(mut chain: Vec<NodeId>, owner: NodeId) -> Vec<NodeId> {
    chain.retain(|&id| id != owner);
    chain.sort_unstable_by(|a, b| b.cmp(a));
    chain.dedup();
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(raw: u32) -> TransitionId {
        TransitionId::new(raw)
    }

    #[test]
    fn ancestors_follow_parent_chain() {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Marking::from_exact([1]), None, false);
        let child = arena.alloc(Marking::from_exact([2]), Some((root, t(0))), false);
        let grandchild = arena.alloc(Marking::from_exact([3]), Some((child, t(1))), false);

        assert!(arena[root].ancestors().is_empty());
        assert_eq!(arena[grandchild].ancestors(), &[child, root]);
        assert_eq!(
            arena.scope(grandchild).collect::<Vec<_>>(),
            vec![grandchild, child, root]
        );
        assert_eq!(arena.firing_sequence(grandchild), vec![t(0), t(1)]);
    }

    #[test]
    fn merge_unions_without_duplicates_or_self() {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Marking::from_exact([1, 1]), None, false);
        let left = arena.alloc(Marking::from_exact([0, 1]), Some((root, t(0))), false);
        let right = arena.alloc(Marking::from_exact([1, 0]), Some((root, t(1))), false);
        let meet = arena.alloc(Marking::from_exact([0, 0]), Some((left, t(1))), false);

        arena.merge_ancestors(meet, right);
        assert_eq!(arena[meet].ancestors(), &[right, left, root]);

        // A path looping back to the root never lists the root as its own ancestor.
        arena.merge_ancestors(root, meet);
        assert_eq!(arena[root].ancestors(), &[meet, right, left]);
    }

    #[test]
    fn first_marking_wins_lookup() {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Marking::from_exact([1]), None, false);
        let again = arena.alloc(Marking::from_exact([1]), Some((root, t(0))), true);
        assert_ne!(root, again);
        assert_eq!(arena.find_by_marking(&Marking::from_exact([1])), Some(root));
        assert!(arena[again].checked);
    }
}
