//! Configuration of the GraphSLAM estimator

use nalgebra::{Matrix2, Matrix3};

use crate::common::{SlamError, SlamResult};

/// Configuration for GraphSLAM
#[derive(Debug, Clone)]
pub struct GraphSlamConfig {
    /// Motion error covariance R over (x, y, yaw)
    pub motion_covariance: Matrix3<f64>,
    /// Measurement noise covariance Q over (range, bearing)
    pub measurement_covariance: Matrix2<f64>,
    /// Time step between consecutive poses [s]
    pub dt: f64,
    /// Number of linearize/reduce/solve iterations
    pub max_iterations: usize,
    /// Stop early once the largest state change of an iteration is below this
    pub convergence_tolerance: Option<f64>,
    /// Information added on the first pose to fix the reference frame
    pub anchor_information: f64,
    /// Diagonal prior added to every landmark block, centered at its estimate
    pub landmark_damping: f64,
    /// Reciprocal condition number below which a block counts as singular
    pub singular_tolerance: f64,
    /// Condition number above which an ill-conditioning warning is logged
    pub ill_conditioning_threshold: f64,
}

impl Default for GraphSlamConfig {
    fn default() -> Self {
        Self {
            motion_covariance: Matrix3::identity() * 1e-5,
            measurement_covariance: Matrix2::identity() * 1e-5,
            dt: 1.0,
            max_iterations: 25,
            convergence_tolerance: None,
            anchor_information: 1e8,
            landmark_damping: 1e-6,
            singular_tolerance: 1e-14,
            ill_conditioning_threshold: 1e12,
        }
    }
}

impl GraphSlamConfig {
    pub fn with_motion_covariance(mut self, r: Matrix3<f64>) -> Self {
        self.motion_covariance = r;
        self
    }

    pub fn with_measurement_covariance(mut self, q: Matrix2<f64>) -> Self {
        self.measurement_covariance = q;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_convergence_tolerance(mut self, tolerance: f64) -> Self {
        self.convergence_tolerance = Some(tolerance);
        self
    }

    pub fn with_landmark_damping(mut self, damping: f64) -> Self {
        self.landmark_damping = damping;
        self
    }

    /// Condition number above which a block inversion logs a warning
    pub fn with_ill_conditioning_threshold(mut self, threshold: f64) -> Self {
        self.ill_conditioning_threshold = threshold;
        self
    }

    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Check that the configuration describes a well-posed problem
    pub fn validate(&self) -> SlamResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SlamError::InvalidParameter(format!("dt must be positive, got {}", self.dt)));
        }
        if self.max_iterations == 0 {
            return Err(SlamError::InvalidParameter("max_iterations must be at least 1".to_string()));
        }
        if let Some(tol) = self.convergence_tolerance {
            if !(tol.is_finite() && tol >= 0.0) {
                return Err(SlamError::InvalidParameter(format!(
                    "convergence_tolerance must be non-negative, got {}",
                    tol
                )));
            }
        }
        for (name, value) in [
            ("anchor_information", self.anchor_information),
            ("landmark_damping", self.landmark_damping),
            ("singular_tolerance", self.singular_tolerance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SlamError::InvalidParameter(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        if !(self.ill_conditioning_threshold > 1.0) {
            return Err(SlamError::InvalidParameter(format!(
                "ill_conditioning_threshold must exceed 1, got {}",
                self.ill_conditioning_threshold
            )));
        }
        if self.motion_covariance.iter().any(|v| !v.is_finite())
            || self.motion_covariance.cholesky().is_none()
        {
            return Err(SlamError::InvalidParameter(
                "motion covariance must be symmetric positive definite".to_string(),
            ));
        }
        if self.measurement_covariance.iter().any(|v| !v.is_finite())
            || self.measurement_covariance.cholesky().is_none()
        {
            return Err(SlamError::InvalidParameter(
                "measurement covariance must be symmetric positive definite".to_string(),
            ));
        }
        Ok(())
    }

    /// Inverse of the motion covariance, R^-1
    pub(crate) fn motion_information(&self) -> SlamResult<Matrix3<f64>> {
        self.motion_covariance
            .cholesky()
            .map(|c| c.inverse())
            .ok_or_else(|| SlamError::InvalidParameter("motion covariance is not invertible".to_string()))
    }

    /// Inverse of the measurement covariance, Q^-1
    pub(crate) fn measurement_information(&self) -> SlamResult<Matrix2<f64>> {
        self.measurement_covariance
            .cholesky()
            .map(|c| c.inverse())
            .ok_or_else(|| SlamError::InvalidParameter("measurement covariance is not invertible".to_string()))
    }
}
