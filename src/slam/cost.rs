//! Weighted squared residual norm of an estimate

use crate::common::{ControlInput, LandmarkId, Pose2D, RangeBearing, SlamError, SlamResult};
use crate::slam::config::GraphSlamConfig;
use crate::slam::landmarks::LandmarkEstimates;
use crate::slam::linearize::{measurement_residual, motion_residual, validate_inputs};

/// Sum of r^T R^-1 r over motion edges plus r^T Q^-1 r over measurement edges
pub fn residual_cost(
    poses: &[Pose2D],
    landmarks: &LandmarkEstimates,
    controls: &[ControlInput],
    measurements: &[Vec<RangeBearing>],
    correspondences: &[Vec<LandmarkId>],
    config: &GraphSlamConfig,
) -> SlamResult<f64> {
    validate_inputs(poses, controls, measurements, correspondences)?;
    let r_inv = config.motion_information()?;
    let q_inv = config.measurement_information()?;

    let motion: f64 = poses
        .windows(2)
        .zip(controls)
        .map(|(pair, u)| {
            let r = motion_residual(&pair[0], &pair[1], u, config.dt);
            r.dot(&(r_inv * r))
        })
        .sum();

    let mut observation = 0.0;
    for (pose, (zs, ids)) in poses.iter().zip(measurements.iter().zip(correspondences)) {
        for (z, &id) in zs.iter().zip(ids) {
            let landmark = landmarks.get(id).ok_or(SlamError::UnknownLandmark(id))?;
            let r = measurement_residual(pose, landmark, z);
            observation += r.dot(&(q_inv * r));
        }
    }

    Ok(motion + observation)
}
