//! Common traits defining the nonlinear models used by the estimator

/// Trait for vehicle/robot motion models
pub trait MotionModel {
    /// State type
    type State;
    /// Control type
    type Control;
    /// Jacobian of the propagated state with respect to the previous state
    type Jacobian;

    /// Propagate state forward in time
    fn propagate(&self, state: &Self::State, control: &Self::Control, dt: f64) -> Self::State;

    /// Compute Jacobian with respect to state, evaluated at `state`
    fn jacobian_state(&self, state: &Self::State, control: &Self::Control, dt: f64)
        -> Self::Jacobian;
}

/// Trait for observation/measurement models of a point landmark
pub trait ObservationModel {
    /// Observer state type
    type State;
    /// Landmark position type
    type Landmark;
    /// Measurement type
    type Measurement;
    /// Jacobians with respect to (state, landmark)
    type Jacobian;

    /// Predict measurement of `landmark` seen from `state`
    fn predict(&self, state: &Self::State, landmark: &Self::Landmark) -> Self::Measurement;

    /// Compute Jacobians with respect to state and landmark.
    ///
    /// Returns `None` where the model is not differentiable (landmark on top
    /// of the observer).
    fn jacobian(&self, state: &Self::State, landmark: &Self::Landmark) -> Option<Self::Jacobian>;

    /// Landmark position explaining `measurement` from `state`
    fn inverse(&self, state: &Self::State, measurement: &Self::Measurement) -> Self::Landmark;
}
