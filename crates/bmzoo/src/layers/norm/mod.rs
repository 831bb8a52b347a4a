//! # Normalization Layers
//!
//! Normalization layers not provided by ``burn::nn``.
pub mod lrn;

pub use lrn::{LocalResponseNorm, LocalResponseNormConfig};
