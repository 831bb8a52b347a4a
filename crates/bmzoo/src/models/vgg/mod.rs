//! # `VGG` Backbones
//!
//! The torchvision `VGG` family (configurations A, B, D and E; with and
//! without batch norm). [`generate_vgg`] builds a named, optionally
//! pretrained, backbone from [`prefabs::PREFAB_VGG_MAP`] and patches its
//! first convolution and final classifier layer.

pub mod generate;
pub mod prefabs;
pub mod pytorch_stubs;
pub mod vgg_model;

pub use generate::generate_vgg;
pub use vgg_model::{Vgg, VggConfig};

/// `VGG11` (configuration A) stage widths.
pub const VGG11_STAGES: &[&[usize]] = &[&[64], &[128], &[256, 256], &[512, 512], &[512, 512]];

/// `VGG13` (configuration B) stage widths.
pub const VGG13_STAGES: &[&[usize]] = &[
    &[64, 64],
    &[128, 128],
    &[256, 256],
    &[512, 512],
    &[512, 512],
];

/// `VGG16` (configuration D) stage widths.
pub const VGG16_STAGES: &[&[usize]] = &[
    &[64, 64],
    &[128, 128],
    &[256, 256, 256],
    &[512, 512, 512],
    &[512, 512, 512],
];

/// `VGG19` (configuration E) stage widths.
pub const VGG19_STAGES: &[&[usize]] = &[
    &[64, 64],
    &[128, 128],
    &[256, 256, 256, 256],
    &[512, 512, 512, 512],
    &[512, 512, 512, 512],
];
