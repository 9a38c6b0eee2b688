//! # Petri 网核心定义（Place/Transition Net）
//!
//! 设库所集合 `P` 与迁移集合 `T` 均按固定顺序排列。由弧定义输入/输出矩阵
//! `I, O ∈ ℕ^{|P|×|T|}`，关联矩阵 `C = O - I`。标识 `M` 的每个分量为非负整数或 ω：
//!
//! * 迁移 `t` **可激发** 当且仅当 `∀p ∈ P: M[p] ≥ I[p, t]`（ω 满足任何有限需求）；
//! * 迁移 **发射** 后 `M' = M + C[:, t]`，ω 分量保持 ω；
//! * `b` **严格覆盖** `a` 当且仅当 `b ≥ a` 逐分量成立且 `a ≠ b`。
//!
//! ## 示例
//!
//! ```rust
//! use petri_explore::net::*;
//!
//! let net = NetModel::new(
//!     vec![Place::new("p0", "P0", 1), Place::new("p1", "P1", 0)],
//!     vec![Transition::new("t0", "T0")],
//!     vec![Arc::new("a0", "p0", "t0", 1), Arc::new("a1", "t0", "p1", 1)],
//! )
//! .unwrap();
//! let matrices = IncidenceMatrices::build(&net);
//! let rule = FiringRule::new(&matrices);
//!
//! let marking = net.initial_marking();
//! let t0 = TransitionId::new(0);
//! assert_eq!(rule.enabled_transitions(&marking), vec![t0]);
//! let next = rule.fire(&marking, t0).unwrap();
//! assert_eq!(next, Marking::from_exact([0, 1]));
//! ```

pub mod core;
pub mod firing;
pub mod ids;
pub mod incidence;
pub mod index_vec;
pub mod io;
pub mod structure;

pub use self::core::{MAX_ARC_WEIGHT, NetDefinition, NetError, NetModel, OrderSpec};
pub use firing::{FireError, FiringRule, abstract_to_omega, dominates_strictly};
pub use ids::{NodeId, PlaceId, TransitionId};
pub use incidence::{Incidence, IncidenceMatrices};
pub use index_vec::{Idx, IndexVec};
pub use structure::{Arc, ArcDirection, Flow, Marking, OMEGA, Place, Tokens, Transition, Weight};
