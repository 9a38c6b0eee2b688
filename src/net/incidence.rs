//! 输入矩阵 I、输出矩阵 O 与关联矩阵 C = O - I.
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::net::core::NetModel;
use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::{ArcDirection, Weight};

type SmallRow<T> = SmallVec<[T; 4]>;

fn saturating_i64(weight: Weight) -> i64 {
    i64::try_from(weight).unwrap_or(i64::MAX)
}

/// A place × transition matrix stored row by row.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Incidence<T> {
    rows: IndexVec<PlaceId, SmallRow<T>>,
    cols: usize,
}

impl<T> Incidence<T>
where
    T: Clone,
{
    pub fn new(places: usize, transitions: usize, default: T) -> Self {
        let rows = (0..places)
            .map(|_| SmallRow::from_elem(default.clone(), transitions))
            .collect();
        Self {
            rows,
            cols: transitions,
        }
    }
}

impl<T> Incidence<T> {
    pub fn places(&self) -> usize {
        self.rows.len()
    }

    pub fn transitions(&self) -> usize {
        self.cols
    }

    pub fn set(&mut self, place: PlaceId, transition: TransitionId, value: T) {
        self.rows[place][transition.index()] = value;
    }

    pub fn get(&self, place: PlaceId, transition: TransitionId) -> &T {
        &self.rows[place][transition.index()]
    }

    pub fn get_mut(&mut self, place: PlaceId, transition: TransitionId) -> &mut T {
        &mut self.rows[place][transition.index()]
    }

    pub fn rows(&self) -> &IndexVec<PlaceId, SmallRow<T>> {
        &self.rows
    }

    /// The column of `transition`, one entry per place.
    pub fn column(&self, transition: TransitionId) -> impl Iterator<Item = (PlaceId, &T)> {
        self.rows
            .iter_enumerated()
            .map(move |(place, row)| (place, &row[transition.index()]))
    }
}

impl<T> fmt::Debug for Incidence<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Incidence")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

impl Incidence<Weight> {
    /// `self - other`, cell by cell. Both operands have the same shape and every cell is at
    /// most `i64::MAX`, which [`NetModel::new`] enforces for summed arc weights.
    pub(crate) fn difference(&self, other: &Self) -> Incidence<i64> {
        debug_assert_eq!(self.places(), other.places());
        debug_assert_eq!(self.transitions(), other.transitions());
        let rows = self
            .rows
            .iter()
            .zip(other.rows.iter())
            .map(|(left, right)| {
                left.iter()
                    .zip(right.iter())
                    .map(|(l, r)| saturating_i64(*l) - saturating_i64(*r))
                    .collect::<SmallRow<_>>()
            })
            .collect();
        Incidence {
            rows,
            cols: self.cols,
        }
    }
}

/// Input, output and incidence matrices of one net under one place/transition order.
///
/// Computed once from an immutable [`NetModel`] and never mutated; reordering the net means
/// building a new value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidenceMatrices {
    /// `I[p][t]`: tokens `t` consumes from `p`.
    pub input: Incidence<Weight>,
    /// `O[p][t]`: tokens `t` produces into `p`.
    pub output: Incidence<Weight>,
    /// `C = O - I`.
    pub incidence: Incidence<i64>,
    place_labels: Vec<String>,
    transition_labels: Vec<String>,
}

impl IncidenceMatrices {
    /// Parallel arcs between the same pair accumulate.
    pub fn build(net: &NetModel) -> Self {
        let places = net.places_len();
        let transitions = net.transitions_len();
        let mut input = Incidence::<Weight>::new(places, transitions, 0);
        let mut output = Incidence::<Weight>::new(places, transitions, 0);

        for flow in net.flows() {
            let target = match flow.direction {
                ArcDirection::PlaceToTransition => &mut input,
                ArcDirection::TransitionToPlace => &mut output,
            };
            let cell = target.get_mut(flow.place, flow.transition);
            *cell = cell.saturating_add(flow.weight);
        }

        let incidence = output.difference(&input);
        Self {
            input,
            output,
            incidence,
            place_labels: net.places().iter().map(|p| p.label.clone()).collect(),
            transition_labels: net.transitions().iter().map(|t| t.label.clone()).collect(),
        }
    }

    pub fn places(&self) -> usize {
        self.input.places()
    }

    pub fn transitions(&self) -> usize {
        self.input.transitions()
    }

    fn write_matrix<T: fmt::Display>(
        &self,
        f: &mut fmt::Formatter<'_>,
        title: &str,
        matrix: &Incidence<T>,
    ) -> fmt::Result {
        let head = self
            .place_labels
            .iter()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(0);
        let cell = matrix
            .rows()
            .iter()
            .flat_map(|row| row.iter().map(|value| value.to_string().chars().count()))
            .chain(self.transition_labels.iter().map(|l| l.chars().count()))
            .max()
            .unwrap_or(1);

        writeln!(f, "{title}")?;
        write!(f, "{:head$}", "")?;
        for label in &self.transition_labels {
            write!(f, " {label:>cell$}")?;
        }
        writeln!(f)?;
        for (place, row) in matrix.rows().iter_enumerated() {
            write!(f, "{:head$}", self.place_labels[place.index()])?;
            for value in row.iter() {
                write!(f, " {:>cell$}", value.to_string())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for IncidenceMatrices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncidenceMatrices")
            .field("input", &self.input)
            .field("output", &self.output)
            .field("incidence", &self.incidence)
            .finish()
    }
}

impl fmt::Display for IncidenceMatrices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_matrix(f, "Input matrix I:", &self.input)?;
        writeln!(f)?;
        self.write_matrix(f, "Output matrix O:", &self.output)?;
        writeln!(f)?;
        self.write_matrix(f, "Incidence matrix C = O - I:", &self.incidence)
    }
}
