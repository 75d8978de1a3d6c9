//! Common types, traits, and error definitions for graph_slam
//!
//! This module provides the foundational building blocks shared by the
//! estimation pipeline and the simulation helpers.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
