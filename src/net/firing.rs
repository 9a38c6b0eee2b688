//! 发生规则: 可激发判定、标识更新、覆盖判定与 ω 抽象.
//!
//! 每个判定都有两个版本：纯整数版本作用于 `&[Weight]`，ω 版本作用于 [`Marking`].
use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::incidence::IncidenceMatrices;
use crate::net::index_vec::Idx;
use crate::net::structure::{Marking, Tokens, Weight};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FireError {
    #[error("transition {0:?} is out of bounds")]
    OutOfBounds(TransitionId),
    #[error("transition {0:?} is not enabled under the supplied marking")]
    NotEnabled(TransitionId),
    #[error("marking has {found} cells but the net has {expected} places")]
    MarkingLength { expected: usize, found: usize },
    #[error("token count at place {place:?} overflows")]
    Overflow { place: PlaceId },
}

/// Enabledness and firing over a fixed set of matrices.
#[derive(Debug, Clone, Copy)]
pub struct FiringRule<'a> {
    matrices: &'a IncidenceMatrices,
}

impl<'a> FiringRule<'a> {
    pub fn new(matrices: &'a IncidenceMatrices) -> Self {
        Self { matrices }
    }

    pub fn matrices(&self) -> &'a IncidenceMatrices {
        self.matrices
    }

    fn check_shape(&self, len: usize, transition: TransitionId) -> Result<(), FireError> {
        if transition.index() >= self.matrices.transitions() {
            return Err(FireError::OutOfBounds(transition));
        }
        if len != self.matrices.places() {
            return Err(FireError::MarkingLength {
                expected: self.matrices.places(),
                found: len,
            });
        }
        Ok(())
    }

    /// `∀p: tokens[p] ≥ I[p][t]`.
    pub fn enabled_exact(&self, tokens: &[Weight], transition: TransitionId) -> bool {
        if self.check_shape(tokens.len(), transition).is_err() {
            return false;
        }
        self.matrices
            .input
            .column(transition)
            .all(|(place, required)| tokens[place.index()] >= *required)
    }

    /// `tokens + C[:, t]`.
    pub fn fire_exact(
        &self,
        tokens: &[Weight],
        transition: TransitionId,
    ) -> Result<Vec<Weight>, FireError> {
        self.check_shape(tokens.len(), transition)?;
        if !self.enabled_exact(tokens, transition) {
            return Err(FireError::NotEnabled(transition));
        }
        self.matrices
            .incidence
            .column(transition)
            .map(|(place, delta)| {
                tokens[place.index()]
                    .checked_add_signed(*delta)
                    .ok_or(FireError::Overflow { place })
            })
            .collect()
    }

    /// Like [`enabled_exact`](Self::enabled_exact), with ω satisfying any finite requirement.
    pub fn enabled(&self, marking: &Marking, transition: TransitionId) -> bool {
        if self.check_shape(marking.len(), transition).is_err() {
            return false;
        }
        self.matrices
            .input
            .column(transition)
            .all(|(place, required)| marking.tokens(place).satisfies(*required))
    }

    /// Like [`fire_exact`](Self::fire_exact); ω cells stay ω.
    pub fn fire(&self, marking: &Marking, transition: TransitionId) -> Result<Marking, FireError> {
        self.check_shape(marking.len(), transition)?;
        if !self.enabled(marking, transition) {
            return Err(FireError::NotEnabled(transition));
        }
        let mut next = marking.clone();
        for (place, delta) in self.matrices.incidence.column(transition) {
            let cell = next.tokens_mut(place);
            *cell = cell.shifted(*delta).ok_or(FireError::Overflow { place })?;
        }
        Ok(next)
    }

    pub fn enabled_transitions(&self, marking: &Marking) -> Vec<TransitionId> {
        (0..self.matrices.transitions())
            .map(TransitionId::from_usize)
            .filter(|&transition| self.enabled(marking, transition))
            .collect()
    }
}

/// `b` strictly covers `a`: `b ≥ a` in every place (ω is above everything and equal to itself)
/// and `a ≠ b`. No marking strictly covers itself.
pub fn dominates_strictly(a: &Marking, b: &Marking) -> bool {
    a < b
}

/// Replaces every finite cell that grew from `old` to `new` with ω.
pub fn abstract_to_omega(old: &Marking, new: &Marking) -> Marking {
    let mut widened = new.clone();
    for (place, before) in old.iter() {
        let after = new.tokens(place);
        if let (Tokens::Finite(before), Tokens::Finite(after)) = (before, after) {
            if after > before {
                *widened.tokens_mut(place) = Tokens::Omega;
            }
        }
    }
    widened
}

/// Places where `new` is finite and strictly larger than a finite `old`.
pub fn growing_places(old: &Marking, new: &Marking) -> Vec<PlaceId> {
    old.iter()
        .filter(|(place, before)| match (before, new.tokens(*place)) {
            (Tokens::Finite(before), Tokens::Finite(after)) => after > *before,
            _ => false,
        })
        .map(|(place, _)| place)
        .collect()
}
