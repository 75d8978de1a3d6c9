//! Construction of the information form around the current estimates
//!
//! Every constraint is linearized as `J x ≈ J μ + r`, where `μ` is the
//! current estimate, `J` the Jacobian of the constraint and `r` the residual
//! (expected minus observed, angles wrapped). Each edge adds
//!
//! ```text
//! Omega += J^T W J
//! xi    += J^T W (J μ + r)
//! ```
//!
//! with `W` the inverse noise covariance of the edge.
//!
//! Reference:
//! - Probabilistic Robotics (Thrun, Burgard, Fox), Table 11.2

use nalgebra::{Matrix2, Matrix3, Vector2, Vector3};
use tracing::debug;

use crate::common::{
    normalize_angle, ControlInput, LandmarkId, MotionModel, ObservationModel, Pose2D, RangeBearing,
    SlamError, SlamResult,
};
use crate::slam::config::GraphSlamConfig;
use crate::slam::information::{BlockLayout, LinearSystem};
use crate::slam::landmarks::LandmarkEstimates;
use crate::slam::motion_model::VelocityMotionModel;
use crate::slam::observation_model::RangeBearingModel;

/// Check that poses, controls, measurements and correspondences line up
pub(crate) fn validate_inputs(
    poses: &[Pose2D],
    controls: &[ControlInput],
    measurements: &[Vec<RangeBearing>],
    correspondences: &[Vec<LandmarkId>],
) -> SlamResult<()> {
    if poses.is_empty() {
        return Err(SlamError::InvalidInput("pose sequence is empty".to_string()));
    }
    if controls.len() + 1 != poses.len() {
        return Err(SlamError::dimension("controls", poses.len() - 1, controls.len()));
    }
    if measurements.len() != poses.len() {
        return Err(SlamError::dimension("measurements", poses.len(), measurements.len()));
    }
    if correspondences.len() != measurements.len() {
        return Err(SlamError::dimension("correspondences", measurements.len(), correspondences.len()));
    }
    for (t, (z, c)) in measurements.iter().zip(correspondences).enumerate() {
        if z.len() != c.len() {
            return Err(SlamError::dimension(format!("correspondences of pose {}", t), z.len(), c.len()));
        }
        if let Some(k) = z.iter().position(|m| !m.is_finite() || m.range < 0.0) {
            return Err(SlamError::InvalidInput(format!("measurement {} of pose {} is invalid", k, t)));
        }
    }
    if let Some(t) = poses.iter().position(|p| !p.is_finite()) {
        return Err(SlamError::InvalidInput(format!("pose {} is not finite", t)));
    }
    if let Some(t) = controls.iter().position(|u| !u.is_finite()) {
        return Err(SlamError::InvalidInput(format!("control {} is not finite", t)));
    }
    Ok(())
}

/// Predicted pose minus current pose, heading wrapped
pub(crate) fn motion_residual(prev: &Pose2D, cur: &Pose2D, control: &ControlInput, dt: f64) -> Vector3<f64> {
    let predicted = VelocityMotionModel.propagate(prev, control, dt);
    Vector3::new(
        predicted.x - cur.x,
        predicted.y - cur.y,
        normalize_angle(predicted.yaw - cur.yaw),
    )
}

/// Observed minus predicted measurement, bearing wrapped
pub(crate) fn measurement_residual(pose: &Pose2D, landmark: &Vector2<f64>, z: &RangeBearing) -> Vector2<f64> {
    let predicted = RangeBearingModel.predict(pose, landmark);
    Vector2::new(z.range - predicted.range, normalize_angle(z.bearing - predicted.bearing))
}

/// Seed every landmark without an estimate from its first observation.
///
/// Measurements are visited by ascending pose index, then by slot within the
/// pose, so the seeding observation of a landmark does not depend on how the
/// caller happens to order its map.
fn seed_landmarks(
    poses: &[Pose2D],
    measurements: &[Vec<RangeBearing>],
    correspondences: &[Vec<LandmarkId>],
    estimates: &mut LandmarkEstimates,
) {
    let model = RangeBearingModel;
    for (pose, (zs, ids)) in poses.iter().zip(measurements.iter().zip(correspondences)) {
        for (z, &id) in zs.iter().zip(ids) {
            if !estimates.contains(id) {
                estimates.insert(id, model.inverse(pose, z));
            }
        }
    }
}

fn symmetrize3(m: Matrix3<f64>) -> Matrix3<f64> {
    (m + m.transpose()) * 0.5
}

fn symmetrize2(m: Matrix2<f64>) -> Matrix2<f64> {
    (m + m.transpose()) * 0.5
}

fn add_motion_edge(
    system: &mut LinearSystem,
    t: usize,
    poses: &[Pose2D],
    control: &ControlInput,
    info: &Matrix3<f64>,
    dt: f64,
) {
    let prev = &poses[t - 1];
    let cur = &poses[t];
    let g = VelocityMotionModel.jacobian_state(prev, control, dt);
    let r = motion_residual(prev, cur, control, dt);

    // J = [-G | I], target J μ + r
    let target = cur.to_vector() - g * prev.to_vector() + r;

    let gt_w = g.transpose() * info;
    let i_prev = system.layout().pose_offset(t - 1);
    let i_cur = system.layout().pose_offset(t);

    let cross = -gt_w;
    system.add_block(i_prev, i_prev, &symmetrize3(gt_w * g));
    system.add_block(i_prev, i_cur, &cross);
    system.add_block(i_cur, i_prev, &cross.transpose());
    system.add_block(i_cur, i_cur, info);

    system.add_segment(i_prev, &(-gt_w * target));
    system.add_segment(i_cur, &(info * target));
}

fn add_measurement_edge(
    system: &mut LinearSystem,
    t: usize,
    pose: &Pose2D,
    slot: usize,
    landmark: &Vector2<f64>,
    z: &RangeBearing,
    info: &Matrix2<f64>,
) -> SlamResult<()> {
    let (h_pose, h_lm) = RangeBearingModel.jacobian(pose, landmark).ok_or_else(|| {
        SlamError::InvalidInput(format!("landmark estimate coincides with pose {}", t))
    })?;
    let r = measurement_residual(pose, landmark, z);
    let target = h_pose * pose.to_vector() + h_lm * landmark + r;

    let hpt_w = h_pose.transpose() * info;
    let hlt_w = h_lm.transpose() * info;
    let i_pose = system.layout().pose_offset(t);
    let i_lm = system.layout().landmark_offset(slot);

    let cross = hpt_w * h_lm;
    system.add_block(i_pose, i_pose, &symmetrize3(hpt_w * h_pose));
    system.add_block(i_pose, i_lm, &cross);
    system.add_block(i_lm, i_pose, &cross.transpose());
    system.add_block(i_lm, i_lm, &symmetrize2(hlt_w * h_lm));

    system.add_segment(i_pose, &(hpt_w * target));
    system.add_segment(i_lm, &(hlt_w * target));
    system.record_observation(t, slot);
    Ok(())
}

/// Build the information matrix and vector around the current estimates.
///
/// Landmarks referenced by `correspondences` but missing from
/// `landmark_estimates` are initialized from their first observation. The
/// returned system holds one motion edge per control, one measurement edge
/// per observation, the anchor on pose 0 and the landmark damping prior.
pub fn linearize(
    poses: &[Pose2D],
    landmark_estimates: &LandmarkEstimates,
    controls: &[ControlInput],
    measurements: &[Vec<RangeBearing>],
    correspondences: &[Vec<LandmarkId>],
    config: &GraphSlamConfig,
) -> SlamResult<(LinearSystem, LandmarkEstimates)> {
    config.validate()?;
    validate_inputs(poses, controls, measurements, correspondences)?;

    let mut estimates = landmark_estimates.clone();
    seed_landmarks(poses, measurements, correspondences, &mut estimates);

    let layout = BlockLayout::new(poses.len(), &estimates);
    let mut system = LinearSystem::new(layout);

    let r_inv = symmetrize3(config.motion_information()?);
    let q_inv = symmetrize2(config.measurement_information()?);

    // Anchor the first pose at its current estimate
    let anchor = Matrix3::identity() * config.anchor_information;
    system.add_block(0, 0, &anchor);
    system.add_segment(0, &(anchor * poses[0].to_vector()));

    for (t, control) in controls.iter().enumerate() {
        add_motion_edge(&mut system, t + 1, poses, control, &r_inv, config.dt);
    }

    let mut n_obs = 0;
    for (t, (zs, ids)) in measurements.iter().zip(correspondences).enumerate() {
        for (z, &id) in zs.iter().zip(ids) {
            let slot = system.layout().landmark_slot(id).ok_or(SlamError::UnknownLandmark(id))?;
            let landmark = *estimates.get(id).ok_or(SlamError::UnknownLandmark(id))?;
            add_measurement_edge(&mut system, t, &poses[t], slot, &landmark, z, &q_inv)?;
            n_obs += 1;
        }
    }

    if config.landmark_damping > 0.0 {
        let damping = Matrix2::identity() * config.landmark_damping;
        for (slot, (_, position)) in estimates.iter().enumerate() {
            let offset = system.layout().landmark_offset(slot);
            system.add_block(offset, offset, &damping);
            system.add_segment(offset, &(damping * position));
        }
    }

    debug!(
        poses = poses.len(),
        landmarks = estimates.len(),
        motion_edges = controls.len(),
        measurement_edges = n_obs,
        dim = system.dim(),
        "linearized information form"
    );
    Ok((system, estimates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn scenario() -> (Vec<Pose2D>, Vec<ControlInput>, Vec<Vec<RangeBearing>>, Vec<Vec<LandmarkId>>) {
        let controls = vec![ControlInput::new(1.0, 0.1), ControlInput::new(1.0, -0.2)];
        let poses = crate::slam::initialize::initialize(&controls, Pose2D::origin(), 1.0).unwrap();
        let landmarks = [Vector2::new(3.0, 2.0), Vector2::new(1.0, -3.0)];
        let model = RangeBearingModel;
        let measurements = poses
            .iter()
            .map(|p| landmarks.iter().map(|m| model.predict(p, m)).collect())
            .collect();
        let correspondences = vec![vec![10, 20]; 3];
        (poses, controls, measurements, correspondences)
    }

    #[test]
    fn test_dimensions_and_seeding() {
        let (poses, controls, z, c) = scenario();
        let config = GraphSlamConfig::default();
        let (system, estimates) = linearize(&poses, &LandmarkEstimates::new(), &controls, &z, &c, &config).unwrap();

        assert_eq!(system.dim(), 3 * 3 + 2 * 2);
        assert_eq!(estimates.len(), 2);
        assert_abs_diff_eq!(*estimates.get(10).unwrap(), Vector2::new(3.0, 2.0), epsilon = 1e-12);
        assert_eq!(system.observers(0).iter().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_observers_match_cross_blocks() {
        let (poses, controls, mut z, mut c) = scenario();
        // landmark 20 unseen from pose 1
        z[1].truncate(1);
        c[1].truncate(1);
        let config = GraphSlamConfig::default();
        let (system, _) = linearize(&poses, &LandmarkEstimates::new(), &controls, &z, &c, &config).unwrap();

        for slot in 0..system.layout().landmark_count() {
            for t in 0..poses.len() {
                let linked = system.cross_block(t, slot).iter().any(|v| *v != 0.0);
                assert_eq!(system.observers(slot).contains(&t), linked);
            }
        }
        assert_eq!(system.observers(1).iter().copied().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_omega_is_symmetric() {
        let (poses, controls, z, c) = scenario();
        let config = GraphSlamConfig::default();
        let (system, _) = linearize(&poses, &LandmarkEstimates::new(), &controls, &z, &c, &config).unwrap();
        assert_eq!(system.asymmetry(), 0.0);
    }

    #[test]
    fn test_consistent_linearization_point_is_fixed_point() {
        // With zero residuals Omega μ = xi at the linearization point
        let (poses, controls, z, c) = scenario();
        let config = GraphSlamConfig::default();
        let (system, estimates) = linearize(&poses, &LandmarkEstimates::new(), &controls, &z, &c, &config).unwrap();

        let mut mu = nalgebra::DVector::zeros(system.dim());
        for (t, p) in poses.iter().enumerate() {
            mu.fixed_rows_mut::<3>(3 * t).copy_from(&p.to_vector());
        }
        for (slot, (_, m)) in estimates.iter().enumerate() {
            mu.fixed_rows_mut::<2>(9 + 2 * slot).copy_from(m);
        }
        let lhs = &system.omega * mu;
        for i in 0..system.dim() {
            assert_abs_diff_eq!(lhs[i], system.xi[i], epsilon = 1e-6 * system.xi[i].abs().max(1.0));
        }
    }

    #[test]
    fn test_existing_estimates_are_kept() {
        let (poses, controls, z, c) = scenario();
        let config = GraphSlamConfig::default();
        let mut prior = LandmarkEstimates::new();
        prior.insert(10, Vector2::new(3.5, 2.5));
        let (_, estimates) = linearize(&poses, &prior, &controls, &z, &c, &config).unwrap();
        assert_eq!(estimates.get(10), Some(&Vector2::new(3.5, 2.5)));
    }

    #[test]
    fn test_dimension_mismatch() {
        let (poses, controls, z, _) = scenario();
        let config = GraphSlamConfig::default();
        let bad = vec![vec![10, 20], vec![10], vec![10, 20]];
        let err = linearize(&poses, &LandmarkEstimates::new(), &controls, &z, &bad, &config).unwrap_err();
        assert!(matches!(err, SlamError::DimensionMismatch { .. }));

        let err = linearize(&poses, &LandmarkEstimates::new(), &controls[..1], &z, &bad, &config).unwrap_err();
        assert!(matches!(err, SlamError::DimensionMismatch { expected: 2, actual: 1, .. }));
    }
}
