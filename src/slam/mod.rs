// GraphSLAM module
//
// Pipeline: initialize -> (linearize -> reduce -> solve) x iterations

pub mod config;
pub mod cost;
pub mod graph_slam;
pub mod information;
pub mod initialize;
pub mod landmarks;
pub mod linearize;
pub mod motion_model;
pub mod numerics;
pub mod observation_model;
pub mod reduce;
pub mod solve;

// Re-exports
pub use config::GraphSlamConfig;
pub use cost::residual_cost;
pub use graph_slam::{GraphSlam, GraphSlamOutput, IterationReport};
pub use information::{BlockLayout, LinearSystem, ReducedSystem, LM_SIZE, POSE_SIZE};
pub use initialize::initialize;
pub use landmarks::LandmarkEstimates;
pub use linearize::linearize;
pub use motion_model::VelocityMotionModel;
pub use observation_model::RangeBearingModel;
pub use reduce::reduce;
pub use solve::{solve, Solution};
