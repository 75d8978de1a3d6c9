//! Velocity motion model
//!
//! The robot follows a circular arc of radius v/omega for one time step
//! (straight line when the turn rate vanishes).
//!
//! Reference:
//! - Probabilistic Robotics (Thrun, Burgard, Fox), chapter 5.3

use nalgebra::Matrix3;

use crate::common::{ControlInput, MotionModel, Pose2D};

/// Turn rates below this are integrated as straight-line motion [rad/s]
const MIN_TURN_RATE: f64 = 1e-9;

/// Noise-free velocity motion model for a planar robot
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityMotionModel;

impl MotionModel for VelocityMotionModel {
    type State = Pose2D;
    type Control = ControlInput;
    type Jacobian = Matrix3<f64>;

    fn propagate(&self, state: &Pose2D, control: &ControlInput, dt: f64) -> Pose2D {
        let yaw = state.yaw;
        let v = control.v;
        let w = control.omega;

        if w.abs() < MIN_TURN_RATE {
            return Pose2D::new(
                state.x + v * dt * yaw.cos(),
                state.y + v * dt * yaw.sin(),
                yaw + w * dt,
            );
        }

        let r = v / w;
        let yaw_next = yaw + w * dt;
        Pose2D::new(
            state.x - r * yaw.sin() + r * yaw_next.sin(),
            state.y + r * yaw.cos() - r * yaw_next.cos(),
            yaw_next,
        )
    }

    fn jacobian_state(&self, state: &Pose2D, control: &ControlInput, dt: f64) -> Matrix3<f64> {
        let yaw = state.yaw;
        let v = control.v;
        let w = control.omega;

        let (dx_dyaw, dy_dyaw) = if w.abs() < MIN_TURN_RATE {
            (-v * dt * yaw.sin(), v * dt * yaw.cos())
        } else {
            let r = v / w;
            let yaw_next = yaw + w * dt;
            (-r * yaw.cos() + r * yaw_next.cos(), -r * yaw.sin() + r * yaw_next.sin())
        };

        Matrix3::new(
            1.0, 0.0, dx_dyaw,
            0.0, 1.0, dy_dyaw,
            0.0, 0.0, 1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_straight_motion() {
        let model = VelocityMotionModel;
        let next = model.propagate(&Pose2D::origin(), &ControlInput::new(2.0, 0.0), 1.0);
        assert_abs_diff_eq!(next.x, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next.y, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next.yaw, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_quarter_circle() {
        // radius 1, quarter turn in one step
        let model = VelocityMotionModel;
        let control = ControlInput::new(PI / 2.0, PI / 2.0);
        let next = model.propagate(&Pose2D::origin(), &control, 1.0);
        assert_abs_diff_eq!(next.x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next.yaw, PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_jacobian_matches_finite_difference() {
        let model = VelocityMotionModel;
        let control = ControlInput::new(1.3, 0.4);
        let pose = Pose2D::new(0.5, -1.0, 0.7);
        let jac = model.jacobian_state(&pose, &control, 1.0);

        let h = 1e-6;
        let plus = model.propagate(&Pose2D::new(pose.x, pose.y, pose.yaw + h), &control, 1.0);
        let minus = model.propagate(&Pose2D::new(pose.x, pose.y, pose.yaw - h), &control, 1.0);
        let numeric = (plus.to_vector() - minus.to_vector()) / (2.0 * h);

        for i in 0..3 {
            assert_abs_diff_eq!(jac[(i, 2)], numeric[i], epsilon = 1e-6);
        }
        assert_eq!(jac[(0, 0)], 1.0);
        assert_eq!(jac[(2, 2)], 1.0);
    }

    #[test]
    fn test_jacobian_straight_line() {
        let model = VelocityMotionModel;
        let jac = model.jacobian_state(&Pose2D::new(0.0, 0.0, PI / 2.0), &ControlInput::new(1.0, 0.0), 2.0);
        assert_abs_diff_eq!(jac[(0, 2)], -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(jac[(1, 2)], 0.0, epsilon = 1e-12);
    }
}
