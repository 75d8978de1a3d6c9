//! Initial pose estimates by dead reckoning

use tracing::debug;

use crate::common::{ControlInput, MotionModel, Pose2D, SlamError, SlamResult};
use crate::slam::motion_model::VelocityMotionModel;

/// Integrate `controls` from `initial_pose` with the noise-free motion model.
///
/// Returns `controls.len() + 1` poses; an empty control sequence yields the
/// initial pose alone.
pub fn initialize(controls: &[ControlInput], initial_pose: Pose2D, dt: f64) -> SlamResult<Vec<Pose2D>> {
    if !initial_pose.is_finite() {
        return Err(SlamError::InvalidInput(format!("initial pose is not finite: {:?}", initial_pose)));
    }
    if !(dt.is_finite() && dt > 0.0) {
        return Err(SlamError::InvalidParameter(format!("dt must be positive, got {}", dt)));
    }
    if let Some(t) = controls.iter().position(|u| !u.is_finite()) {
        return Err(SlamError::InvalidInput(format!("control {} is not finite", t)));
    }

    let model = VelocityMotionModel;
    let mut poses = Vec::with_capacity(controls.len() + 1);
    poses.push(initial_pose);
    for u in controls {
        let next = model.propagate(&poses[poses.len() - 1], u, dt);
        poses.push(next);
    }

    debug!(poses = poses.len(), "initialized poses by dead reckoning");
    Ok(poses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_empty_controls() {
        let poses = initialize(&[], Pose2D::new(1.0, 2.0, 0.3), 1.0).unwrap();
        assert_eq!(poses, vec![Pose2D::new(1.0, 2.0, 0.3)]);
    }

    #[test]
    fn test_square_path() {
        // Four straight legs separated by in-place quarter turns
        let forward = ControlInput::new(1.0, 0.0);
        let turn = ControlInput::new(0.0, PI / 2.0);
        let controls = vec![forward, turn, forward, turn, forward, turn, forward, turn];
        let poses = initialize(&controls, Pose2D::origin(), 1.0).unwrap();

        assert_eq!(poses.len(), 9);
        assert_abs_diff_eq!(poses[2].x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(poses[3].y, 1.0, epsilon = 1e-12);
        let last = poses[8];
        assert_abs_diff_eq!(last.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(last.y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(last.yaw, 2.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_non_finite_control() {
        let controls = vec![ControlInput::new(1.0, 0.0), ControlInput::new(f64::NAN, 0.0)];
        assert!(matches!(
            initialize(&controls, Pose2D::origin(), 1.0),
            Err(SlamError::InvalidInput(_))
        ));
    }
}
