#![warn(missing_docs)]
//!# bmzoo - Burn Model Zoo
//!
//! ## Notable Components
//!
//! * [`cache`] - pretrained weight cache.
//! * [`errors`] - the [`errors::ZooError`] type.
//! * [`layers`] - reusable neural network modules.
//!   * [`layers::blocks::conv_norm`] - ``Conv2d + BatchNorm2d`` block.
//!   * [`layers::norm::lrn`] - local response normalization.
//! * [`models`] - complete models.
//!   * [`models::alexnet`] - `AlexCifarNet`, for 32x32 CIFAR images.
//!   * [`models::lenet`] - `LeNet`, for 28x28 digit images.
//!   * [`models::cnn`] - the compact `CNN` classifier.
//!   * [`models::backbone`] - [`models::backbone::BackboneConfig`], shared by the backbone builders.
//!   * [`models::resnet`] - `ResNet` backbones and [`models::resnet::generate_resnet`].
//!   * [`models::vgg`] - `VGG` backbones and [`models::vgg::generate_vgg`].
//!   * [`models::unet`] - the `UNet` encoder-decoder.
//!   * [`models::registry`] - [`models::registry::ModelConfig`] and [`models::registry::ZooModel`].
//! * [`utility`] - shape checks and parameter summaries.

pub mod cache;
pub mod errors;
pub mod layers;
pub mod models;
pub mod utility;

pub use errors::{Result, ZooError};
