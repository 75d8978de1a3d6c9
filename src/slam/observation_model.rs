//! Range/bearing observation model for point landmarks

use nalgebra::{Matrix2, Matrix2x3, Vector2};

use crate::common::{normalize_angle, ObservationModel, Pose2D, RangeBearing};

/// Squared distances below this make the Jacobian undefined [m^2]
const MIN_SQUARED_RANGE: f64 = 1e-12;

/// Range/bearing sensor mounted at the robot origin
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeBearingModel;

impl ObservationModel for RangeBearingModel {
    type State = Pose2D;
    type Landmark = Vector2<f64>;
    type Measurement = RangeBearing;
    type Jacobian = (Matrix2x3<f64>, Matrix2<f64>);

    fn predict(&self, state: &Pose2D, landmark: &Vector2<f64>) -> RangeBearing {
        let dx = landmark[0] - state.x;
        let dy = landmark[1] - state.y;
        RangeBearing::new((dx * dx + dy * dy).sqrt(), normalize_angle(dy.atan2(dx) - state.yaw))
    }

    fn jacobian(&self, state: &Pose2D, landmark: &Vector2<f64>) -> Option<(Matrix2x3<f64>, Matrix2<f64>)> {
        let dx = landmark[0] - state.x;
        let dy = landmark[1] - state.y;
        let q = dx * dx + dy * dy;
        if q < MIN_SQUARED_RANGE {
            return None;
        }
        let d = q.sqrt();

        // Jacobian with respect to robot pose [x, y, yaw]
        let h_pose = Matrix2x3::new(
            -dx / d, -dy / d, 0.0,
            dy / q, -dx / q, -1.0,
        );

        // Jacobian with respect to landmark position [lm_x, lm_y]
        let h_lm = Matrix2::new(
            dx / d, dy / d,
            -dy / q, dx / q,
        );

        Some((h_pose, h_lm))
    }

    fn inverse(&self, state: &Pose2D, measurement: &RangeBearing) -> Vector2<f64> {
        let angle = state.yaw + measurement.bearing;
        Vector2::new(
            state.x + measurement.range * angle.cos(),
            state.y + measurement.range * angle.sin(),
        )
    }
}
