//! # `ResNet` Utilities
use burn::nn::Initializer;

/// Kaiming-normal, fan-out, ReLU-gain initializer for convolutions feeding a ReLU.
///
/// Matches the torchvision `ResNet` / `VGG` conv init.
pub const CONV_INTO_RELU_INITIALIZER: Initializer = Initializer::KaimingNormal {
    gain: std::f64::consts::SQRT_2,
    fan_out_only: true,
};
