//! P/T 网静态结构元素：库所、迁移、弧，以及带 ω 的标识.
use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::IndexVec;

pub type Weight = u64;

/// The printed form of an unbounded token count.
pub const OMEGA: &str = "ω";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub struct Place {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub tokens: Weight,
    /// Display hint only; exploration ignores it.
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

impl Place {
    pub fn new(id: impl Into<String>, label: impl Into<String>, tokens: Weight) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            tokens,
            is_static: false,
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Transition {
    pub id: String,
    pub label: String,
}

impl Transition {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transition")
            .field(&self.id)
            .field(&self.label)
            .finish()
    }
}

/// An arc as handed over by a parser: two endpoint ids and a multiplicity.
///
/// Which endpoint is the place is only known once the arc is resolved against a net, see
/// [`Flow`].
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Debug)]
pub struct Arc {
    pub id: String,
    #[serde(alias = "sourceId")]
    pub source: String,
    #[serde(alias = "destinationId")]
    pub destination: String,
    #[serde(default = "default_multiplicity")]
    pub multiplicity: Weight,
}

fn default_multiplicity() -> Weight {
    1
}

impl Arc {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
        multiplicity: Weight,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            destination: destination.into(),
            multiplicity,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ArcDirection {
    PlaceToTransition,
    TransitionToPlace,
}

/// An arc resolved against the net's place and transition order.
#[derive(Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Flow {
    pub place: PlaceId,
    pub transition: TransitionId,
    pub weight: Weight,
    pub direction: ArcDirection,
}

impl Flow {
    pub fn new(
        place: PlaceId,
        transition: TransitionId,
        weight: Weight,
        direction: ArcDirection,
    ) -> Self {
        Self {
            place,
            transition,
            weight,
            direction,
        }
    }
}

impl fmt::Debug for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            ArcDirection::PlaceToTransition => {
                write!(f, "{:?} -{}-> {:?}", self.place, self.weight, self.transition)
            }
            ArcDirection::TransitionToPlace => {
                write!(f, "{:?} -{}-> {:?}", self.transition, self.weight, self.place)
            }
        }
    }
}

/// A single marking cell: a finite token count or ω.
///
/// The derived order puts every finite count below ω, which is exactly the covering order on
/// one coordinate.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tokens {
    Finite(Weight),
    Omega,
}

impl Tokens {
    pub fn is_omega(self) -> bool {
        matches!(self, Tokens::Omega)
    }

    pub fn finite(self) -> Option<Weight> {
        match self {
            Tokens::Finite(value) => Some(value),
            Tokens::Omega => None,
        }
    }

    /// Whether this cell can supply `required` tokens. ω supplies anything.
    pub fn satisfies(self, required: Weight) -> bool {
        match self {
            Tokens::Finite(value) => value >= required,
            Tokens::Omega => true,
        }
    }

    /// Applies a signed delta. ω absorbs any delta; `None` on underflow or overflow.
    pub fn shifted(self, delta: i64) -> Option<Tokens> {
        match self {
            Tokens::Finite(value) => value.checked_add_signed(delta).map(Tokens::Finite),
            Tokens::Omega => Some(Tokens::Omega),
        }
    }
}

impl From<Weight> for Tokens {
    fn from(value: Weight) -> Self {
        Tokens::Finite(value)
    }
}

impl fmt::Display for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tokens::Finite(value) => write!(f, "{value}"),
            Tokens::Omega => f.write_str(OMEGA),
        }
    }
}

impl fmt::Debug for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for Tokens {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Tokens::Finite(value) => serializer.serialize_u64(*value),
            Tokens::Omega => serializer.serialize_str(OMEGA),
        }
    }
}

impl<'de> Deserialize<'de> for Tokens {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct TokensVisitor;

        impl serde::de::Visitor<'_> for TokensVisitor {
            type Value = Tokens;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative token count or \"ω\"")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Tokens, E>
            where
                E: serde::de::Error,
            {
                Ok(Tokens::Finite(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Tokens, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(value)
                    .map(Tokens::Finite)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Signed(value), &self))
            }

            fn visit_str<E>(self, value: &str) -> Result<Tokens, E>
            where
                E: serde::de::Error,
            {
                match value {
                    OMEGA | "omega" | "w" => Ok(Tokens::Omega),
                    other => Err(E::unknown_variant(other, &[OMEGA, "omega", "w"])),
                }
            }
        }

        deserializer.deserialize_any(TokensVisitor)
    }
}

/// One cell per place, in place order.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Marking(pub IndexVec<PlaceId, Tokens>);

impl Marking {
    pub fn new(cells: IndexVec<PlaceId, Tokens>) -> Self {
        Self(cells)
    }

    pub fn from_exact(tokens: impl IntoIterator<Item = Weight>) -> Self {
        Self(tokens.into_iter().map(Tokens::Finite).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceId, Tokens)> + '_ {
        self.0.iter_enumerated().map(|(place, tokens)| (place, *tokens))
    }

    pub fn tokens(&self, place: PlaceId) -> Tokens {
        self.0[place]
    }

    pub fn tokens_mut(&mut self, place: PlaceId) -> &mut Tokens {
        &mut self.0[place]
    }

    pub fn has_omega(&self) -> bool {
        self.0.iter().any(|tokens| tokens.is_omega())
    }

    pub fn omega_places(&self) -> Vec<PlaceId> {
        self.iter()
            .filter(|(_, tokens)| tokens.is_omega())
            .map(|(place, _)| place)
            .collect()
    }

    /// The plain integer vector, or `None` if any cell is ω.
    pub fn to_exact(&self) -> Option<Vec<Weight>> {
        self.0.iter().map(|tokens| tokens.finite()).collect()
    }

    pub fn into_inner(self) -> IndexVec<PlaceId, Tokens> {
        self.0
    }
}

impl fmt::Display for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, tokens) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{tokens}")?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for Marking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Coordinate-wise covering order. Markings of different length, or markings that are larger
/// in one place and smaller in another, are incomparable.
impl PartialOrd for Marking {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.len() != other.len() {
            return None;
        }
        let mut less = false;
        let mut greater = false;
        for (left, right) in self.0.iter().zip(other.0.iter()) {
            match left.cmp(right) {
                Ordering::Less => less = true,
                Ordering::Greater => greater = true,
                Ordering::Equal => {}
            }
        }
        match (less, greater) {
            (true, true) => None,
            (true, false) => Some(Ordering::Less),
            (false, true) => Some(Ordering::Greater),
            (false, false) => Some(Ordering::Equal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn omega_at(values: &[Option<Weight>]) -> Marking {
        Marking(
            values
                .iter()
                .map(|v| v.map_or(Tokens::Omega, Tokens::Finite))
                .collect(),
        )
    }

    #[test]
    fn omega_absorbs_deltas_and_satisfies_requirements() {
        assert_eq!(Tokens::Omega.shifted(-5), Some(Tokens::Omega));
        assert!(Tokens::Omega.satisfies(Weight::MAX));
        assert_eq!(Tokens::Finite(1).shifted(-2), None);
        assert_eq!(Tokens::Finite(1).shifted(2), Some(Tokens::Finite(3)));
    }

    #[test]
    fn marking_order_treats_omega_as_top() {
        let a = omega_at(&[Some(1), Some(0)]);
        let b = omega_at(&[None, Some(0)]);
        let c = omega_at(&[Some(0), Some(1)]);
        assert!(a < b);
        assert_eq!(b.partial_cmp(&b), Some(Ordering::Equal));
        assert_eq!(a.partial_cmp(&c), None);
    }

    #[test]
    fn display_uses_omega_symbol() {
        assert_eq!(omega_at(&[Some(1), None, Some(0)]).to_string(), "[1, ω, 0]");
        assert_eq!(Marking::from_exact([]).to_string(), "[]");
    }

    #[test]
    fn tokens_serde_accepts_numbers_and_omega() {
        let marking = omega_at(&[Some(2), None]);
        let json = serde_json::to_string(&marking).unwrap();
        assert_eq!(json, "[2,\"ω\"]");
        let back: Marking = serde_json::from_str("[2, \"omega\"]").unwrap();
        assert_eq!(back, marking);
    }

    #[test]
    fn exact_view_fails_on_omega() {
        assert_eq!(omega_at(&[Some(3)]).to_exact(), Some(vec![3]));
        assert_eq!(omega_at(&[Some(3), None]).to_exact(), None);
    }
}
