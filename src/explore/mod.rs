//! # 标识空间探索
//!
//! 所有探索共用一个以 [`ExploreStrategy`] 参数化的工作表算法：
//!
//! | 结构 | 覆盖时 | 相同标识 |
//! |---|---|---|
//! | 可达图 | 中止并报告无界 | 合并到已有节点 |
//! | 覆盖树 | 增长的库所抽象为 ω | 总是新建节点，与祖先相同则直接关闭 |
//!
//! 覆盖图由 [`CoverabilityGraphReducer`] 从覆盖树归约得到。
//!
//! ```rust
//! use petri_explore::explore::*;
//! use petri_explore::net::*;
//!
//! let net = NetModel::new(
//!     vec![Place::new("p0", "P0", 1)],
//!     vec![Transition::new("t0", "T0")],
//!     vec![Arc::new("a0", "p0", "t0", 1), Arc::new("a1", "t0", "p0", 2)],
//! )
//! .unwrap();
//!
//! let outcome = explore_reachability(&net).unwrap();
//! assert_eq!(outcome.run_state(), RunState::Unbounded);
//!
//! let graph = build_coverability_graph(&net).unwrap();
//! assert_eq!(graph.node_count(), 2);
//! ```

pub mod coverability;
pub mod engine;
pub mod graph;
pub mod node;
pub mod reachability;
pub mod reduce;

pub use coverability::{CoverabilityExplorer, build_coverability_graph, build_coverability_tree};
pub use engine::{
    CoverPolicy, ExplorationOutcome, ExploreError, ExploreStrategy, Explorer, IdentityPolicy,
    RunState, UnboundedWitness,
};
pub use graph::{
    GraphKind, GraphStats, LabelStyle, LabeledEdge, MarkingEdge, MarkingGraph, NodeView,
    RenderModel,
};
pub use node::{MarkingNode, NodeArena};
pub use reachability::{ReachabilityExplorer, explore_reachability};
pub use reduce::CoverabilityGraphReducer;
