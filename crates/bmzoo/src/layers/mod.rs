//! Common low-level modules for building the zoo models in Burn.
pub mod blocks;
pub mod norm;
