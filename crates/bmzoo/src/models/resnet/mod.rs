//! # `ResNet` Backbones
//!
//! The torchvision `ResNet` family, assembled from [`basic_block::BasicBlock`]
//! and [`bottleneck::BottleneckBlock`] residual units.
//!
//! [`generate_resnet`] builds a named, optionally pretrained, backbone from
//! [`prefabs::PREFAB_RESNET_MAP`] and patches its stem and head.

pub mod basic_block;
pub mod bottleneck;
pub mod downsample;
pub mod generate;
pub mod layer_block;
pub mod prefabs;
pub mod pytorch_stubs;
pub mod residual_block;
pub mod resnet_model;
pub mod util;

pub use generate::generate_resnet;
pub use resnet_model::{ResNet, ResNetConfig};

/// `ResNet18` block counts.
pub const RESNET18_BLOCKS: [usize; 4] = [2, 2, 2, 2];
/// `ResNet34` block counts.
pub const RESNET34_BLOCKS: [usize; 4] = [3, 4, 6, 3];
/// `ResNet50` block counts.
pub const RESNET50_BLOCKS: [usize; 4] = [3, 4, 6, 3];
/// `ResNet101` block counts.
pub const RESNET101_BLOCKS: [usize; 4] = [3, 4, 23, 3];
/// `ResNet152` block counts.
pub const RESNET152_BLOCKS: [usize; 4] = [3, 8, 36, 3];
