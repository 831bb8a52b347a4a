//! # Composite Blocks
pub mod conv_norm;
