//! Simulated worlds for exercising the estimator
//!
//! Ground truth map, trajectory and sensor readings, plus helpers to prepare
//! the estimator inputs and compare its output against the truth.

pub mod map;
pub mod measurements;
pub mod path;

pub use map::{generate_map, OccupancyGrid};
pub use measurements::{generate_measurements, SensorLimits};
pub use path::{generate_path, PathLimits};

use crate::common::{LandmarkId, Pose2D};

/// Treat every measurement as a distinct landmark.
///
/// Ids are assigned consecutively in pose order, then measurement order.
pub fn unique_correspondences<T>(measurements: &[Vec<T>]) -> Vec<Vec<LandmarkId>> {
    let mut next = 0;
    measurements
        .iter()
        .map(|zs| {
            let ids = (next..next + zs.len()).collect();
            next += zs.len();
            ids
        })
        .collect()
}

/// Re-express poses given relative to `frame` in the frame `frame` lives in
pub fn transform_poses_into_frame(poses: &mut [Pose2D], frame: &Pose2D) {
    let (s, c) = frame.yaw.sin_cos();
    for pose in poses.iter_mut() {
        let x = frame.x + pose.x * c - pose.y * s;
        let y = frame.y + pose.x * s + pose.y * c;
        *pose = Pose2D::new(x, y, pose.yaw + frame.yaw);
    }
}
