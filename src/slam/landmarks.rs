//! Landmark position estimates carried between optimization iterations

use nalgebra::Vector2;
use std::collections::BTreeMap;

use crate::common::{LandmarkId, Point2D};

/// Estimated landmark positions keyed by landmark id
///
/// Iteration is in ascending id order, which also fixes the order of the
/// landmark blocks in the information matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkEstimates {
    positions: BTreeMap<LandmarkId, Vector2<f64>>,
}

impl LandmarkEstimates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, id: LandmarkId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn get(&self, id: LandmarkId) -> Option<&Vector2<f64>> {
        self.positions.get(&id)
    }

    /// Insert or overwrite the estimate of `id`
    pub fn insert(&mut self, id: LandmarkId, position: Vector2<f64>) -> Option<Vector2<f64>> {
        self.positions.insert(id, position)
    }

    /// Landmark ids in ascending order
    pub fn ids(&self) -> impl Iterator<Item = LandmarkId> + '_ {
        self.positions.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkId, &Vector2<f64>)> + '_ {
        self.positions.iter().map(|(id, p)| (*id, p))
    }

    /// Positions as points, in ascending id order
    pub fn points(&self) -> Vec<Point2D> {
        self.positions.values().map(|p| Point2D::from(*p)).collect()
    }
}

impl FromIterator<(LandmarkId, Vector2<f64>)> for LandmarkEstimates {
    fn from_iter<I: IntoIterator<Item = (LandmarkId, Vector2<f64>)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}
