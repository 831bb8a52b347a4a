//! # Pretrained Weight Caches
//!
//! * [`disk`] - the on-disk download cache.
//! * [`weights`] - descriptors for published weight files.
//! * [`prefabs`] - static tables of well-known model configs.

pub mod disk;
pub mod prefabs;
pub mod weights;
