// simulated range/bearing sensor

use rand::Rng;
use rand_distr::Distribution;

use crate::common::{normalize_angle, LandmarkId, ObservationModel, Point2D, Pose2D, RangeBearing, SlamError, SlamResult};
use crate::simulation::path::normal;
use crate::slam::observation_model::RangeBearingModel;

/// Range/bearing sensor characteristics
#[derive(Debug, Clone)]
pub struct SensorLimits {
    /// Nominal sensing range [m]
    pub max_sensing_range: f64,
    /// Std deviation of the per-pose sensing range
    pub sensing_range_deviation: f64,
    /// Std deviation of the range noise [m]
    pub distance_deviation: f64,
    /// Std deviation of the bearing noise [rad]
    pub heading_deviation: f64,
}

impl Default for SensorLimits {
    fn default() -> Self {
        Self {
            max_sensing_range: 6.0,
            sensing_range_deviation: 0.5,
            distance_deviation: 0.05,
            heading_deviation: 0.02,
        }
    }
}

/// Observe every landmark within sensing range of each pose.
///
/// The sensing range is drawn once per pose around `max_sensing_range`.
/// Correspondences are the indices into `landmarks`.
pub fn generate_measurements<R: Rng + ?Sized>(
    poses: &[Pose2D],
    landmarks: &[Point2D],
    limits: &SensorLimits,
    rng: &mut R,
) -> SlamResult<(Vec<Vec<RangeBearing>>, Vec<Vec<LandmarkId>>)> {
    if !(limits.max_sensing_range > 0.0) {
        return Err(SlamError::InvalidParameter(
            "max_sensing_range must be positive".to_string(),
        ));
    }
    let sensing_range = normal(limits.max_sensing_range, limits.sensing_range_deviation)?;
    let range_noise = normal(0.0, limits.distance_deviation)?;
    let bearing_noise = normal(0.0, limits.heading_deviation)?;
    let model = RangeBearingModel;

    let mut measurements = Vec::with_capacity(poses.len());
    let mut correspondences = Vec::with_capacity(poses.len());
    for pose in poses {
        let range_limit = sensing_range.sample(rng);
        let mut zs = Vec::new();
        let mut ids = Vec::new();
        for (id, landmark) in landmarks.iter().enumerate() {
            if pose.position().distance(landmark) > range_limit {
                continue;
            }
            let z = model.predict(pose, &landmark.to_vector());
            zs.push(RangeBearing::new(
                (z.range + range_noise.sample(rng)).max(0.0),
                normalize_angle(z.bearing + bearing_noise.sample(rng)),
            ));
            ids.push(id);
        }
        measurements.push(zs);
        correspondences.push(ids);
    }
    Ok((measurements, correspondences))
}
