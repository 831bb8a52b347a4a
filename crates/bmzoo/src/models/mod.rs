//! # Models

pub mod alexnet;
pub mod backbone;
pub mod cnn;
pub mod lenet;
pub mod registry;
pub mod resnet;
pub mod unet;
pub mod vgg;
