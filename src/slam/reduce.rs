//! Elimination of the landmark variables
//!
//! Each landmark block is removed with the Schur complement:
//!
//! ```text
//! Omega_r -= Omega_{τ,j} Omega_jj^-1 Omega_{j,τ}
//! xi_r    -= Omega_{τ,j} Omega_jj^-1 xi_j
//! ```
//!
//! where τ are the poses that observed landmark j. A landmark seen from k
//! poses fills a dense k x k pattern of pose-pose blocks.
//!
//! Reference:
//! - Probabilistic Robotics (Thrun, Burgard, Fox), Table 11.3

use itertools::Itertools;
use nalgebra::{Matrix3, Matrix3x2};
use tracing::debug;

use crate::common::{SlamError, SlamResult};
use crate::slam::config::GraphSlamConfig;
use crate::slam::information::{LinearSystem, ReducedSystem, POSE_SIZE};
use crate::slam::landmarks::LandmarkEstimates;
use crate::slam::numerics::invert_landmark_block;

/// Check that `system` and `landmark_estimates` describe the same landmarks
pub(crate) fn validate_system(system: &LinearSystem, landmark_estimates: &LandmarkEstimates) -> SlamResult<()> {
    let layout = system.layout();
    let n = layout.dim();
    if system.omega.nrows() != n || system.omega.ncols() != n {
        return Err(SlamError::dimension("information matrix", n, system.omega.nrows()));
    }
    if system.xi.len() != n {
        return Err(SlamError::dimension("information vector", n, system.xi.len()));
    }
    if layout.pose_count() == 0 {
        return Err(SlamError::InvalidInput("system has no poses".to_string()));
    }
    if let Some(&id) = layout.landmark_ids().iter().find(|&&id| !landmark_estimates.contains(id)) {
        return Err(SlamError::UnknownLandmark(id));
    }
    if landmark_estimates.len() != layout.landmark_count() {
        return Err(SlamError::dimension(
            "landmark estimates",
            layout.landmark_count(),
            landmark_estimates.len(),
        ));
    }
    Ok(())
}

/// Eliminate every landmark from `system`, leaving a pose-only system with
/// the same solution for the poses.
pub fn reduce(
    system: &LinearSystem,
    landmark_estimates: &LandmarkEstimates,
    config: &GraphSlamConfig,
) -> SlamResult<ReducedSystem> {
    validate_system(system, landmark_estimates)?;

    let layout = system.layout();
    let p = layout.pose_dim();
    let mut omega = system.omega.view((0, 0), (p, p)).into_owned();
    let mut xi = system.xi.rows(0, p).into_owned();

    for (slot, &id) in layout.landmark_ids().iter().enumerate() {
        let omega_jj_inv = invert_landmark_block(&format!("landmark {}", id), &system.landmark_block(slot), config)?;
        let xi_j = system.landmark_xi(slot);

        // Omega_{a,j} Omega_jj^-1 for every observing pose a
        let observers: Vec<(usize, Matrix3x2<f64>)> = system
            .observers(slot)
            .iter()
            .map(|&a| (a, system.cross_block(a, slot) * omega_jj_inv))
            .collect();

        for (a, gain) in &observers {
            let mut xi_a = xi.fixed_rows_mut::<POSE_SIZE>(layout.pose_offset(*a));
            xi_a -= gain * xi_j;
        }

        for (a, gain) in &observers {
            let update: Matrix3<f64> = gain * system.cross_block(*a, slot).transpose();
            let offset = layout.pose_offset(*a);
            let mut block = omega.fixed_view_mut::<POSE_SIZE, POSE_SIZE>(offset, offset);
            block -= (update + update.transpose()) * 0.5;
        }

        for ((a, gain), (b, _)) in observers.iter().tuple_combinations() {
            let update: Matrix3<f64> = gain * system.cross_block(*b, slot).transpose();
            let (oa, ob) = (layout.pose_offset(*a), layout.pose_offset(*b));
            {
                let mut block = omega.fixed_view_mut::<POSE_SIZE, POSE_SIZE>(oa, ob);
                block -= update;
            }
            let mut block = omega.fixed_view_mut::<POSE_SIZE, POSE_SIZE>(ob, oa);
            block -= update.transpose();
        }
    }

    debug!(
        poses = layout.pose_count(),
        eliminated = layout.landmark_count(),
        nonzeros = omega.iter().filter(|v| **v != 0.0).count(),
        "reduced information form"
    );
    Ok(ReducedSystem::new(omega, xi, layout.pose_count()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ControlInput, ObservationModel, Pose2D};
    use crate::slam::initialize::initialize;
    use crate::slam::linearize::linearize;
    use crate::slam::observation_model::RangeBearingModel;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, Vector2};

    fn system() -> (LinearSystem, LandmarkEstimates, GraphSlamConfig) {
        let controls = vec![ControlInput::new(1.0, 0.2); 4];
        let poses = initialize(&controls, Pose2D::origin(), 1.0).unwrap();
        // landmark 0 seen by poses 0 and 4, landmark 1 seen by pose 2 only
        let model = RangeBearingModel;
        let a = Vector2::new(2.0, 3.0);
        let b = Vector2::new(4.0, -1.0);
        let mut z = vec![Vec::new(); poses.len()];
        let mut c = vec![Vec::new(); poses.len()];
        for t in [0, 4] {
            z[t].push(model.predict(&poses[t], &a));
            c[t].push(0);
        }
        z[2].push(model.predict(&poses[2], &b));
        c[2].push(1);

        let config = GraphSlamConfig::default()
            .with_motion_covariance(nalgebra::Matrix3::identity() * 0.01)
            .with_measurement_covariance(nalgebra::Matrix2::identity() * 0.01);
        let (system, estimates) = linearize(&poses, &LandmarkEstimates::new(), &controls, &z, &c, &config).unwrap();
        (system, estimates, config)
    }

    #[test]
    fn test_reduced_solution_matches_full_solution() {
        let (system, estimates, config) = system();
        let reduced = reduce(&system, &estimates, &config).unwrap();

        let full = system.omega.clone().cholesky().unwrap().solve(&system.xi);
        let poses_only = reduced.omega.clone().cholesky().unwrap().solve(&reduced.xi);
        for i in 0..reduced.xi.len() {
            assert_relative_eq!(full[i], poses_only[i], epsilon = 1e-6, max_relative = 1e-8);
        }
    }

    #[test]
    fn test_fill_in_between_poses_sharing_a_landmark() {
        let (system, estimates, config) = system();
        assert_eq!(system.pose_block(0, 4), Matrix3::zeros());

        let reduced = reduce(&system, &estimates, &config).unwrap();
        let mask = reduced.sparsity_pattern();
        assert!(mask[(0, 12)]);
        assert!(mask[(12, 0)]);
        // poses 0 and 2 share no landmark and no motion edge
        assert!(!mask[(0, 6)]);
        assert_eq!(reduced.asymmetry(), 0.0);
    }

    #[test]
    fn test_unknown_landmark_is_reported() {
        let (system, _, config) = system();
        let mut partial = LandmarkEstimates::new();
        partial.insert(0, Vector2::new(2.0, 3.0));
        assert!(matches!(
            reduce(&system, &partial, &config),
            Err(SlamError::UnknownLandmark(1))
        ));
    }

    #[test]
    fn test_singular_landmark_block_is_reported() {
        let (mut system, estimates, config) = system();
        let offset = system.layout().landmark_offset(1);
        let mut block = system.omega.view_mut((offset, offset), (2, 2));
        block.copy_from(&DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]));
        assert!(matches!(
            reduce(&system, &estimates, &config),
            Err(SlamError::SingularBlock { .. })
        ));
    }
}
