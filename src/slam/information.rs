//! Information form of the SLAM posterior
//!
//! The full system stacks all pose blocks (3 entries each) followed by all
//! landmark blocks (2 entries each, ascending landmark id):
//!
//! ```text
//! [ x_0 | x_1 | ... | x_{N-1} | m_a | m_b | ... ]
//! ```
//!
//! Storage is dense, which is adequate for tens of poses and landmarks.

use nalgebra::{DMatrix, DVector, Matrix2, Matrix3, Matrix3x2, SMatrix, SVector, Vector2, Vector3};
use std::collections::BTreeSet;

use crate::common::LandmarkId;
use crate::slam::landmarks::LandmarkEstimates;

/// Pose block size [x, y, yaw]
pub const POSE_SIZE: usize = 3;
/// Landmark block size [x, y]
pub const LM_SIZE: usize = 2;

/// Mapping from poses and landmark ids to row/column offsets
#[derive(Debug, Clone, PartialEq)]
pub struct BlockLayout {
    pose_count: usize,
    landmark_ids: Vec<LandmarkId>,
}

impl BlockLayout {
    /// Layout for `pose_count` poses and the landmarks of `estimates`
    pub fn new(pose_count: usize, estimates: &LandmarkEstimates) -> Self {
        Self {
            pose_count,
            landmark_ids: estimates.ids().collect(),
        }
    }

    pub fn pose_count(&self) -> usize {
        self.pose_count
    }

    pub fn landmark_count(&self) -> usize {
        self.landmark_ids.len()
    }

    /// Landmark ids in block order
    pub fn landmark_ids(&self) -> &[LandmarkId] {
        &self.landmark_ids
    }

    /// Dimension of the pose-only system
    pub fn pose_dim(&self) -> usize {
        self.pose_count * POSE_SIZE
    }

    /// Dimension of the full system
    pub fn dim(&self) -> usize {
        self.pose_dim() + self.landmark_ids.len() * LM_SIZE
    }

    pub fn pose_offset(&self, pose: usize) -> usize {
        pose * POSE_SIZE
    }

    pub fn landmark_offset(&self, slot: usize) -> usize {
        self.pose_dim() + slot * LM_SIZE
    }

    /// Block slot of landmark `id`
    pub fn landmark_slot(&self, id: LandmarkId) -> Option<usize> {
        self.landmark_ids.binary_search(&id).ok()
    }
}

/// Full information matrix/vector pair over poses and landmarks
///
/// Built by `linearize`, which also records the observing poses of every
/// landmark. Omega and xi are read-only outside the crate so the observer
/// sets always match the pose-landmark cross blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSystem {
    /// Information matrix Omega
    pub(crate) omega: DMatrix<f64>,
    /// Information vector xi
    pub(crate) xi: DVector<f64>,
    layout: BlockLayout,
    /// Observing poses per landmark slot
    observers: Vec<BTreeSet<usize>>,
}

impl LinearSystem {
    /// Zero system for the given layout
    pub fn new(layout: BlockLayout) -> Self {
        let n = layout.dim();
        Self {
            omega: DMatrix::zeros(n, n),
            xi: DVector::zeros(n),
            observers: vec![BTreeSet::new(); layout.landmark_count()],
            layout,
        }
    }

    pub fn layout(&self) -> &BlockLayout {
        &self.layout
    }

    pub fn dim(&self) -> usize {
        self.layout.dim()
    }

    pub fn omega(&self) -> &DMatrix<f64> {
        &self.omega
    }

    pub fn xi(&self) -> &DVector<f64> {
        &self.xi
    }

    /// Poses with a measurement edge to landmark `slot`, ascending
    pub fn observers(&self, slot: usize) -> &BTreeSet<usize> {
        &self.observers[slot]
    }

    pub(crate) fn record_observation(&mut self, pose: usize, slot: usize) {
        self.observers[slot].insert(pose);
    }

    /// Omega[row.., col..] += block
    pub(crate) fn add_block<const R: usize, const C: usize>(
        &mut self,
        row: usize,
        col: usize,
        block: &SMatrix<f64, R, C>,
    ) {
        let mut view = self.omega.fixed_view_mut::<R, C>(row, col);
        view += block;
    }

    /// xi[row..] += segment
    pub(crate) fn add_segment<const R: usize>(&mut self, row: usize, segment: &SVector<f64, R>) {
        let mut view = self.xi.fixed_rows_mut::<R>(row);
        view += segment;
    }

    pub fn pose_block(&self, a: usize, b: usize) -> Matrix3<f64> {
        self.omega
            .fixed_view::<POSE_SIZE, POSE_SIZE>(self.layout.pose_offset(a), self.layout.pose_offset(b))
            .into_owned()
    }

    pub fn landmark_block(&self, slot: usize) -> Matrix2<f64> {
        let offset = self.layout.landmark_offset(slot);
        self.omega.fixed_view::<LM_SIZE, LM_SIZE>(offset, offset).into_owned()
    }

    /// Cross block Omega[pose, landmark]
    pub fn cross_block(&self, pose: usize, slot: usize) -> Matrix3x2<f64> {
        self.omega
            .fixed_view::<POSE_SIZE, LM_SIZE>(self.layout.pose_offset(pose), self.layout.landmark_offset(slot))
            .into_owned()
    }

    pub fn pose_xi(&self, pose: usize) -> Vector3<f64> {
        self.xi.fixed_rows::<POSE_SIZE>(self.layout.pose_offset(pose)).into_owned()
    }

    pub fn landmark_xi(&self, slot: usize) -> Vector2<f64> {
        self.xi.fixed_rows::<LM_SIZE>(self.layout.landmark_offset(slot)).into_owned()
    }

    /// Nonzero mask of Omega
    pub fn sparsity_pattern(&self) -> DMatrix<bool> {
        sparsity_pattern(&self.omega)
    }

    /// Largest absolute difference between Omega and its transpose
    pub fn asymmetry(&self) -> f64 {
        asymmetry(&self.omega)
    }
}

/// Pose-only system left after eliminating every landmark
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedSystem {
    pub omega: DMatrix<f64>,
    pub xi: DVector<f64>,
    pose_count: usize,
}

impl ReducedSystem {
    pub(crate) fn new(omega: DMatrix<f64>, xi: DVector<f64>, pose_count: usize) -> Self {
        Self { omega, xi, pose_count }
    }

    pub fn pose_count(&self) -> usize {
        self.pose_count
    }

    /// Nonzero mask of the reduced Omega
    pub fn sparsity_pattern(&self) -> DMatrix<bool> {
        sparsity_pattern(&self.omega)
    }

    pub fn asymmetry(&self) -> f64 {
        asymmetry(&self.omega)
    }
}

fn sparsity_pattern(m: &DMatrix<f64>) -> DMatrix<bool> {
    DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| m[(i, j)] != 0.0)
}

fn asymmetry(m: &DMatrix<f64>) -> f64 {
    (m - m.transpose()).amax()
}
