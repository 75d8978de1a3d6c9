//! graph_slam - offline GraphSLAM for planar robots
//!
//! This crate estimates a full robot trajectory and a point-landmark map
//! from odometry and range/bearing measurements, using the information form
//! of GraphSLAM (linearize, reduce by marginalizing landmarks, solve).

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod slam;
pub mod simulation;

// Re-export common types for convenience
pub use common::{ControlInput, LandmarkId, Point2D, Pose2D, RangeBearing};
pub use common::{MotionModel, ObservationModel};
pub use common::{SlamError, SlamResult};
pub use slam::{GraphSlam, GraphSlamConfig, GraphSlamOutput};
