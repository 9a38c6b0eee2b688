//! 网模型：经校验的库所、迁移与弧，以及顺序调整.
use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::IndexVec;
use crate::net::structure::{
    Arc, ArcDirection, Flow, Marking, Place, Tokens, Transition, Weight,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetError {
    #[error("arc {arc} ({from} -> {to}) must connect one place and one transition")]
    InvalidArc {
        arc: String,
        from: String,
        to: String,
    },
    #[error("arc {arc} has multiplicity 0")]
    ZeroMultiplicity { arc: String },
    #[error("id {0:?} is used by more than one place or transition")]
    DuplicateId(String),
    #[error("no element is labelled {0:?}")]
    UnknownLabel(String),
    #[error("ordering names {found} elements but the net has {expected}")]
    OrderMismatch { expected: usize, found: usize },
    #[error("arcs between {place:?} and {transition:?} weigh more than i64::MAX in total")]
    WeightOverflow {
        place: PlaceId,
        transition: TransitionId,
    },
}

/// Upper bound on the summed weight of parallel arcs, so every incidence entry fits `i64`.
pub const MAX_ARC_WEIGHT: Weight = i64::MAX as Weight;

/// The shape a parser hands over before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetDefinition {
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(default)]
    pub arcs: Vec<Arc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Place(PlaceId),
    Transition(TransitionId),
}

/// How to reorder places or transitions before matrices are built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrderSpec {
    #[default]
    Keep,
    /// Stable sort by label.
    Alphabetical,
    /// Exactly these labels, in this order.
    Labels(Vec<String>),
}

/// An immutable, validated Petri net.
///
/// Place order fixes the coordinate order of every marking and every matrix row; transition
/// order fixes matrix columns and the order in which explorers try transitions.
#[derive(Clone)]
pub struct NetModel {
    places: IndexVec<PlaceId, Place>,
    transitions: IndexVec<TransitionId, Transition>,
    arcs: Vec<Arc>,
    flows: Vec<Flow>,
    by_id: FxHashMap<String, Element>,
}

impl fmt::Debug for NetModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetModel")
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .field("flows", &self.flows)
            .finish()
    }
}

impl PartialEq for NetModel {
    fn eq(&self, other: &Self) -> bool {
        self.places == other.places
            && self.transitions == other.transitions
            && self.arcs == other.arcs
    }
}

impl Eq for NetModel {}

impl NetModel {
    pub fn new(
        places: Vec<Place>,
        transitions: Vec<Transition>,
        arcs: Vec<Arc>,
    ) -> Result<Self, NetError> {
        let places: IndexVec<PlaceId, Place> = places.into();
        let transitions: IndexVec<TransitionId, Transition> = transitions.into();

        let mut by_id = FxHashMap::default();
        for (place_id, place) in places.iter_enumerated() {
            if by_id.insert(place.id.clone(), Element::Place(place_id)).is_some() {
                return Err(NetError::DuplicateId(place.id.clone()));
            }
        }
        for (transition_id, transition) in transitions.iter_enumerated() {
            if by_id
                .insert(transition.id.clone(), Element::Transition(transition_id))
                .is_some()
            {
                return Err(NetError::DuplicateId(transition.id.clone()));
            }
        }

        let flows = arcs
            .iter()
            .map(|arc| resolve_arc(&by_id, arc))
            .collect::<Result<Vec<_>, _>>()?;
        check_weights(&flows)?;

        Ok(Self {
            places,
            transitions,
            arcs,
            flows,
            by_id,
        })
    }

    pub fn from_definition(definition: NetDefinition) -> Result<Self, NetError> {
        Self::new(definition.places, definition.transitions, definition.arcs)
    }

    pub fn to_definition(&self) -> NetDefinition {
        NetDefinition {
            places: self.places.iter().cloned().collect(),
            transitions: self.transitions.iter().cloned().collect(),
            arcs: self.arcs.clone(),
        }
    }

    pub fn places(&self) -> &IndexVec<PlaceId, Place> {
        &self.places
    }

    pub fn transitions(&self) -> &IndexVec<TransitionId, Transition> {
        &self.transitions
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    /// Arcs resolved to (place, transition, weight, direction), in arc order.
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    pub fn place(&self, place: PlaceId) -> &Place {
        &self.places[place]
    }

    pub fn transition(&self, transition: TransitionId) -> &Transition {
        &self.transitions[transition]
    }

    pub fn place_by_id(&self, id: &str) -> Option<PlaceId> {
        match self.by_id.get(id) {
            Some(Element::Place(place)) => Some(*place),
            _ => None,
        }
    }

    pub fn transition_by_id(&self, id: &str) -> Option<TransitionId> {
        match self.by_id.get(id) {
            Some(Element::Transition(transition)) => Some(*transition),
            _ => None,
        }
    }

    pub fn place_by_label(&self, label: &str) -> Option<PlaceId> {
        self.places
            .iter_enumerated()
            .find(|(_, place)| place.label == label)
            .map(|(id, _)| id)
    }

    pub fn transition_by_label(&self, label: &str) -> Option<TransitionId> {
        self.transitions
            .iter_enumerated()
            .find(|(_, transition)| transition.label == label)
            .map(|(id, _)| id)
    }

    pub fn initial_marking(&self) -> Marking {
        Marking(
            self.places
                .iter()
                .map(|place| Tokens::Finite(place.tokens))
                .collect(),
        )
    }

    /// A copy of this net with places and transitions reordered. Arcs are unaffected; matrices
    /// must be rebuilt for the returned net.
    pub fn reordered(
        &self,
        place_order: &OrderSpec,
        transition_order: &OrderSpec,
    ) -> Result<NetModel, NetError> {
        let places = apply_order(self.places.as_slice(), place_order, |p| &p.label)?;
        let transitions =
            apply_order(self.transitions.as_slice(), transition_order, |t| &t.label)?;
        log::debug!(
            "reordered net: places {:?}, transitions {:?}",
            places.iter().map(|p| &p.label).collect::<Vec<_>>(),
            transitions.iter().map(|t| &t.label).collect::<Vec<_>>()
        );
        NetModel::new(places, transitions, self.arcs.clone())
    }
}

fn resolve_arc(by_id: &FxHashMap<String, Element>, arc: &Arc) -> Result<Flow, NetError> {
    if arc.multiplicity == 0 {
        return Err(NetError::ZeroMultiplicity {
            arc: arc.id.clone(),
        });
    }
    let endpoints = (by_id.get(&arc.source), by_id.get(&arc.destination));
    match endpoints {
        (Some(Element::Place(place)), Some(Element::Transition(transition))) => Ok(Flow::new(
            *place,
            *transition,
            arc.multiplicity,
            ArcDirection::PlaceToTransition,
        )),
        (Some(Element::Transition(transition)), Some(Element::Place(place))) => Ok(Flow::new(
            *place,
            *transition,
            arc.multiplicity,
            ArcDirection::TransitionToPlace,
        )),
        _ => Err(NetError::InvalidArc {
            arc: arc.id.clone(),
            from: arc.source.clone(),
            to: arc.destination.clone(),
        }),
    }
}

fn check_weights(flows: &[Flow]) -> Result<(), NetError> {
    let mut totals: FxHashMap<(PlaceId, TransitionId, ArcDirection), Weight> =
        FxHashMap::default();
    for flow in flows {
        let total = totals
            .entry((flow.place, flow.transition, flow.direction))
            .or_insert(0);
        *total = total
            .checked_add(flow.weight)
            .filter(|&sum| sum <= MAX_ARC_WEIGHT)
            .ok_or(NetError::WeightOverflow {
                place: flow.place,
                transition: flow.transition,
            })?;
    }
    Ok(())
}

fn apply_order<T: Clone>(
    items: &[T],
    order: &OrderSpec,
    label: impl Fn(&T) -> &String,
) -> Result<Vec<T>, NetError> {
    match order {
        OrderSpec::Keep => Ok(items.to_vec()),
        OrderSpec::Alphabetical => {
            let mut sorted = items.to_vec();
            sorted.sort_by(|a, b| label(a).cmp(label(b)));
            Ok(sorted)
        }
        OrderSpec::Labels(labels) => {
            if labels.len() != items.len() {
                return Err(NetError::OrderMismatch {
                    expected: items.len(),
                    found: labels.len(),
                });
            }
            let mut remaining: Vec<Option<&T>> = items.iter().map(Some).collect();
            let mut ordered = Vec::with_capacity(items.len());
            for wanted in labels {
                let slot = remaining
                    .iter_mut()
                    .find(|slot| slot.is_some_and(|item| label(item) == wanted))
                    .ok_or_else(|| NetError::UnknownLabel(wanted.clone()))?;
                if let Some(item) = slot.take() {
                    ordered.push(item.clone());
                }
            }
            Ok(ordered)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_place_net() -> NetModel {
        NetModel::new(
            vec![Place::new("p-b", "B", 0), Place::new("p-a", "A", 2)],
            vec![Transition::new("t-1", "T1")],
            vec![Arc::new("a1", "p-a", "t-1", 1), Arc::new("a2", "t-1", "p-b", 2)],
        )
        .unwrap()
    }

    #[test]
    fn arcs_resolve_direction_from_endpoint_kinds() {
        let net = two_place_net();
        let flows = net.flows();
        assert_eq!(flows[0].direction, ArcDirection::PlaceToTransition);
        assert_eq!(flows[0].place, PlaceId::new(1));
        assert_eq!(flows[1].direction, ArcDirection::TransitionToPlace);
        assert_eq!(flows[1].weight, 2);
    }

    #[test]
    fn unresolvable_arc_is_rejected() {
        let err = NetModel::new(
            vec![Place::new("p0", "P0", 1), Place::new("p1", "P1", 0)],
            vec![Transition::new("t0", "T0")],
            vec![Arc::new("a0", "p0", "p1", 1)],
        )
        .unwrap_err();
        assert!(matches!(err, NetError::InvalidArc { ref arc, .. } if arc == "a0"));

        let err = NetModel::new(
            vec![Place::new("p0", "P0", 1)],
            vec![Transition::new("t0", "T0")],
            vec![Arc::new("a0", "p0", "missing", 1)],
        )
        .unwrap_err();
        assert!(matches!(err, NetError::InvalidArc { .. }));
    }

    #[test]
    fn duplicate_ids_and_zero_weights_are_rejected() {
        let err = NetModel::new(
            vec![Place::new("x", "P0", 1)],
            vec![Transition::new("x", "T0")],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, NetError::DuplicateId("x".into()));

        let err = NetModel::new(
            vec![Place::new("p0", "P0", 1)],
            vec![Transition::new("t0", "T0")],
            vec![Arc::new("a0", "p0", "t0", 0)],
        )
        .unwrap_err();
        assert_eq!(err, NetError::ZeroMultiplicity { arc: "a0".into() });
    }

    #[test]
    fn oversized_weights_are_rejected() {
        let places = vec![Place::new("p0", "P0", 0)];
        let transitions = vec![Transition::new("t0", "T0")];
        let overflow = NetError::WeightOverflow {
            place: PlaceId::new(0),
            transition: TransitionId::new(0),
        };

        let err = NetModel::new(
            places.clone(),
            transitions.clone(),
            vec![Arc::new("a0", "t0", "p0", Weight::MAX)],
        )
        .unwrap_err();
        assert_eq!(err, overflow);

        // Each arc fits on its own; together they do not.
        let err = NetModel::new(
            places.clone(),
            transitions.clone(),
            vec![
                Arc::new("a0", "p0", "t0", MAX_ARC_WEIGHT),
                Arc::new("a1", "p0", "t0", 1),
            ],
        )
        .unwrap_err();
        assert_eq!(err, overflow);

        // Opposite directions are summed separately.
        assert!(
            NetModel::new(
                places,
                transitions,
                vec![
                    Arc::new("a0", "p0", "t0", MAX_ARC_WEIGHT),
                    Arc::new("a1", "t0", "p0", MAX_ARC_WEIGHT),
                ],
            )
            .is_ok()
        );
    }

    #[test]
    fn empty_net_has_empty_marking() {
        let net = NetModel::new(vec![], vec![], vec![]).unwrap();
        assert!(net.initial_marking().is_empty());
    }

    #[test]
    fn lookups_by_id_and_label() {
        let net = two_place_net();
        assert_eq!(net.place_by_id("p-a"), Some(PlaceId::new(1)));
        assert_eq!(net.place_by_id("t-1"), None);
        assert_eq!(net.transition_by_label("T1"), Some(TransitionId::new(0)));
        assert_eq!(net.initial_marking(), Marking::from_exact([0, 2]));
    }

    #[test]
    fn reorder_alphabetically_and_by_pattern() {
        let net = two_place_net();
        let sorted = net
            .reordered(&OrderSpec::Alphabetical, &OrderSpec::Keep)
            .unwrap();
        assert_eq!(sorted.place(PlaceId::new(0)).label, "A");
        assert_eq!(sorted.initial_marking(), Marking::from_exact([2, 0]));

        let pattern = net
            .reordered(
                &OrderSpec::Labels(vec!["A".into(), "B".into()]),
                &OrderSpec::Labels(vec!["T1".into()]),
            )
            .unwrap();
        assert_eq!(pattern, sorted);

        assert_eq!(
            net.reordered(&OrderSpec::Labels(vec!["A".into()]), &OrderSpec::Keep),
            Err(NetError::OrderMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(
            net.reordered(
                &OrderSpec::Labels(vec!["A".into(), "Z".into()]),
                &OrderSpec::Keep
            ),
            Err(NetError::UnknownLabel("Z".into()))
        );
    }
}
