// random ground truth trajectory with noisy odometry

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::common::{ControlInput, MotionModel, Pose2D, SlamError, SlamResult};
use crate::simulation::map::OccupancyGrid;
use crate::slam::motion_model::VelocityMotionModel;

/// Clearance kept to occupied cells [m]
const WALL_MARGIN: f64 = 1.0;
/// Number of evasive commands tried before turning in place
const EVASION_ATTEMPTS: usize = 8;

/// Limits of the random velocity commands
#[derive(Debug, Clone)]
pub struct PathLimits {
    /// Maximum forward velocity [m/s]
    pub max_velocity: f64,
    pub velocity_deviation: f64,
    /// Maximum turn rate [rad/s]
    pub max_turn_rate: f64,
    pub turn_rate_deviation: f64,
    /// Number of commands, the path has one pose more
    pub step_count: usize,
    /// Std deviation of the odometry noise on v
    pub velocity_control_deviation: f64,
    /// Std deviation of the odometry noise on omega
    pub turn_rate_control_deviation: f64,
}

impl Default for PathLimits {
    fn default() -> Self {
        Self {
            max_velocity: 1.0,
            velocity_deviation: 0.3,
            max_turn_rate: 0.5,
            turn_rate_deviation: 0.2,
            step_count: 50,
            velocity_control_deviation: 0.02,
            turn_rate_control_deviation: 0.01,
        }
    }
}

/// Gaussian with a non-negative, finite standard deviation
pub(crate) fn normal(mean: f64, std_dev: f64) -> SlamResult<Normal<f64>> {
    // Normal::new only rejects non-finite deviations
    if !(std_dev >= 0.0) {
        return Err(SlamError::InvalidParameter(format!(
            "std deviation must be non-negative, got {}",
            std_dev
        )));
    }
    Normal::new(mean, std_dev)
        .map_err(|e| SlamError::InvalidParameter(format!("std deviation {}: {}", std_dev, e)))
}

/// Drive a random path from the map center.
///
/// Returns the true poses (`step_count + 1`, first at the center with a
/// random heading) and the odometry readings of the commands that produced
/// them, corrupted with Gaussian noise. Commands that would bring the robot
/// within a meter of a wall are replaced by evasive turns.
pub fn generate_path<R: Rng + ?Sized>(
    map: &OccupancyGrid,
    limits: &PathLimits,
    rng: &mut R,
) -> SlamResult<(Vec<Pose2D>, Vec<ControlInput>)> {
    if !(limits.max_velocity > 0.0) || !(limits.max_turn_rate > 0.0) {
        return Err(SlamError::InvalidParameter(
            "max_velocity and max_turn_rate must be positive".to_string(),
        ));
    }
    let velocity = normal(limits.max_velocity / 2.0, limits.velocity_deviation)?;
    let turn_rate = normal(0.0, limits.turn_rate_deviation)?;
    let velocity_noise = normal(0.0, limits.velocity_control_deviation)?;
    let turn_rate_noise = normal(0.0, limits.turn_rate_control_deviation)?;

    let model = VelocityMotionModel;
    let center = map.center();
    let start = Pose2D::new(
        center.x,
        center.y,
        rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI),
    );
    if !map.is_free(start.x, start.y, WALL_MARGIN) {
        return Err(SlamError::InvalidInput("map center is not free".to_string()));
    }

    let mut poses = Vec::with_capacity(limits.step_count + 1);
    let mut controls = Vec::with_capacity(limits.step_count);
    poses.push(start);

    for _ in 0..limits.step_count {
        let current = poses[poses.len() - 1];
        let mut command = ControlInput::new(
            velocity.sample(rng).clamp(0.0, limits.max_velocity),
            turn_rate.sample(rng).clamp(-limits.max_turn_rate, limits.max_turn_rate),
        );
        let mut next = model.propagate(&current, &command, 1.0);

        let mut attempt = 0;
        while !map.is_free(next.x, next.y, WALL_MARGIN) {
            if attempt == EVASION_ATTEMPTS {
                // turning in place never hits a wall
                command = ControlInput::new(0.0, limits.max_turn_rate);
                next = model.propagate(&current, &command, 1.0);
                break;
            }
            let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            command = ControlInput::new(
                command.v * 0.5,
                side * limits.max_turn_rate,
            );
            next = model.propagate(&current, &command, 1.0);
            attempt += 1;
        }

        poses.push(next);
        controls.push(ControlInput::new(
            command.v + velocity_noise.sample(rng),
            command.omega + turn_rate_noise.sample(rng),
        ));
    }

    Ok((poses, controls))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::map::generate_map;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_path_stays_clear_of_walls() {
        let mut rng = StdRng::seed_from_u64(3);
        let (map, _) = generate_map(15, 15, 0, &mut rng).unwrap();
        let limits = PathLimits {
            step_count: 200,
            ..PathLimits::default()
        };
        let (poses, controls) = generate_path(&map, &limits, &mut rng).unwrap();
        assert_eq!(poses.len(), 201);
        assert_eq!(controls.len(), 200);
        for pose in &poses {
            assert!(map.is_free(pose.x, pose.y, WALL_MARGIN));
        }
    }

    #[test]
    fn test_noise_free_controls_reproduce_path() {
        let mut rng = StdRng::seed_from_u64(11);
        let (map, _) = generate_map(30, 30, 0, &mut rng).unwrap();
        let limits = PathLimits {
            velocity_control_deviation: 0.0,
            turn_rate_control_deviation: 0.0,
            ..PathLimits::default()
        };
        let (poses, controls) = generate_path(&map, &limits, &mut rng).unwrap();
        let model = VelocityMotionModel;
        for (pair, u) in poses.windows(2).zip(&controls) {
            let next = model.propagate(&pair[0], u, 1.0);
            assert!((next.x - pair[1].x).abs() < 1e-12);
            assert!((next.y - pair[1].y).abs() < 1e-12);
            assert!((next.yaw - pair[1].yaw).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_negative_deviation() {
        let mut rng = StdRng::seed_from_u64(0);
        let (map, _) = generate_map(10, 10, 0, &mut rng).unwrap();
        let limits = PathLimits {
            velocity_deviation: -1.0,
            ..PathLimits::default()
        };
        assert!(matches!(
            generate_path(&map, &limits, &mut rng),
            Err(SlamError::InvalidParameter(_))
        ));
    }
}
