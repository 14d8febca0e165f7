//! # sx-types
//!
//! Shared value types for SteelX: process parameters, search spaces,
//! industrial limits and the error type used across the workspace.

pub mod errors;
pub mod limits;
pub mod params;

pub use errors::*;
pub use limits::*;
pub use params::*;
