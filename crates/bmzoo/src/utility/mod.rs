//! # Utilities

pub mod shapes;
pub mod summary;
