//! Utility modules for graph_slam

pub mod logger;
pub mod visualization;

pub use logger::{init_logger, init_logger_with_level};
pub use visualization::{colors, PathStyle, PointStyle, Visualizer};
