//! # `AlexCifarNet`
//!
//! A compact `AlexNet` variant for 32x32 CIFAR-10 images,
//! with 1,756,426 trainable parameters.
//!
//! ```text
//! conv(3->64, 5x5, pad 2) -> relu -> maxpool(3, /2) -> lrn
//! conv(64->64, 5x5, pad 2) -> relu -> lrn -> maxpool(3, /2)
//! flatten(64 * 8 * 8)
//! fc(4096->384) -> relu -> fc(384->192) -> relu -> fc(192->10)
//! ```

use crate::layers::norm::{LocalResponseNorm, LocalResponseNormConfig};
use crate::utility::shapes::{expect_channels, expect_features};
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::{Backend, Tensor};

/// Flattened feature width entering the classifier.
pub const ALEX_CIFAR_FEATURES: usize = 64 * 8 * 8;

/// Number of output classes.
pub const ALEX_CIFAR_CLASSES: usize = 10;

/// [`AlexCifarNet`] Config.
#[derive(Config, Debug)]
pub struct AlexCifarNetConfig {
    /// The local response norm applied after each conv stage.
    #[config(default = "LocalResponseNormConfig::new(4).with_alpha(0.001 / 9.0).with_beta(0.75).with_k(1.0)")]
    pub lrn: LocalResponseNormConfig,
}

impl Default for AlexCifarNetConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AlexCifarNetConfig {
    /// Initialize an [`AlexCifarNet`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> AlexCifarNet<B> {
        let conv = |in_channels: usize| {
            Conv2dConfig::new([in_channels, 64], [5, 5])
                .with_padding(PaddingConfig2d::Explicit(2, 2))
                .init(device)
        };
        let pool = || {
            MaxPool2dConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init()
        };

        AlexCifarNet {
            conv1: conv(3),
            pool1: pool(),
            norm1: self.lrn.init(),
            conv2: conv(64),
            norm2: self.lrn.init(),
            pool2: pool(),

            fc1: LinearConfig::new(ALEX_CIFAR_FEATURES, 384).init(device),
            fc2: LinearConfig::new(384, 192).init(device),
            fc3: LinearConfig::new(192, ALEX_CIFAR_CLASSES).init(device),

            relu: Relu::new(),
        }
    }
}

/// `AlexNet` customized for CIFAR-10.
#[derive(Module, Debug)]
pub struct AlexCifarNet<B: Backend> {
    /// First convolution.
    pub conv1: Conv2d<B>,
    /// First pool.
    pub pool1: MaxPool2d,
    /// First local response norm.
    pub norm1: LocalResponseNorm,
    /// Second convolution.
    pub conv2: Conv2d<B>,
    /// Second local response norm.
    pub norm2: LocalResponseNorm,
    /// Second pool.
    pub pool2: MaxPool2d,

    /// Classifier projection 4096 -> 384.
    pub fc1: Linear<B>,
    /// Classifier projection 384 -> 192.
    pub fc2: Linear<B>,
    /// Classifier projection 192 -> 10.
    pub fc3: Linear<B>,

    /// Shared activation.
    pub relu: Relu,
}

impl<B: Backend> AlexCifarNet<B> {
    /// Input spatial sizes this model is declared for.
    ///
    /// Advisory; other sizes fail at `fc1`.
    pub const SUPPORTED_DIMS: [usize; 1] = [32];

    /// Input channel count.
    pub const IN_CHANNELS: usize = 3;

    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, 3, 32, 32]``.
    ///
    /// # Returns
    ///
    /// ``[batch, 10]`` logits.
    ///
    /// # Panics
    ///
    /// On a shape mismatch; see [`Self::try_forward`].
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        self.try_forward(input)
            .unwrap_or_else(|err| panic!("AlexCifarNet: {err}"))
    }

    /// Checked forward pass.
    ///
    /// Fails with [`crate::ZooError::ShapeMismatch`] at the first layer
    /// whose input contract is violated.
    pub fn try_forward(
        &self,
        input: Tensor<B, 4>,
    ) -> crate::Result<Tensor<B, 2>> {
        expect_channels("AlexCifarNet.conv1", &input.dims(), Self::IN_CHANNELS)?;

        let x = self.conv1.forward(input);
        let x = self.relu.forward(x);
        let x = self.pool1.forward(x);
        let x = self.norm1.forward(x);

        let x = self.conv2.forward(x);
        let x = self.relu.forward(x);
        let x = self.norm2.forward(x);
        let x = self.pool2.forward(x);

        let x: Tensor<B, 2> = x.flatten(1, 3);
        expect_features("AlexCifarNet.fc1", &x.dims(), ALEX_CIFAR_FEATURES)?;

        let x = self.relu.forward(self.fc1.forward(x));
        let x = self.relu.forward(self.fc2.forward(x));
        Ok(self.fc3.forward(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ZooError;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray<f32>;

    #[test]
    fn test_config_defaults() {
        let config = AlexCifarNetConfig::default();
        assert_eq!(config.lrn.size, 4);
        assert!((config.lrn.alpha - 0.001 / 9.0).abs() < 1e-15);
        assert_eq!(config.lrn.beta, 0.75);
        assert_eq!(config.lrn.k, 1.0);
    }

    #[test]
    fn test_num_params() {
        let device = Default::default();
        let model: AlexCifarNet<B> = AlexCifarNetConfig::new().init(&device);
        assert_eq!(model.num_params(), 1_756_426);

        let other: AlexCifarNet<B> = AlexCifarNetConfig::new().init(&device);
        assert_eq!(other.num_params(), model.num_params());
    }

    #[test]
    fn test_forward() {
        let device = Default::default();
        let model: AlexCifarNet<B> = AlexCifarNetConfig::new().init(&device);

        let input = Tensor::random([2, 3, 32, 32], Distribution::Default, &device);
        let output = model.forward(input);
        assert_eq!(output.dims(), [2, ALEX_CIFAR_CLASSES]);
    }

    #[test]
    fn test_unsupported_size_fails_at_classifier() {
        let device = Default::default();
        let model: AlexCifarNet<B> = AlexCifarNetConfig::new().init(&device);

        let input = Tensor::zeros([1, 3, 28, 28], &device);
        match model.try_forward(input) {
            Err(ZooError::ShapeMismatch { layer, actual, .. }) => {
                assert_eq!(layer, "AlexCifarNet.fc1");
                assert_eq!(actual, vec![1, 64 * 7 * 7]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_wrong_channels() {
        let device = Default::default();
        let model: AlexCifarNet<B> = AlexCifarNetConfig::new().init(&device);

        let err = model
            .try_forward(Tensor::zeros([1, 1, 32, 32], &device))
            .unwrap_err();
        assert!(matches!(err, ZooError::ShapeMismatch { ref layer, .. } if layer == "AlexCifarNet.conv1"));
    }

    #[test]
    #[should_panic(expected = "AlexCifarNet: shape mismatch at AlexCifarNet.conv1")]
    fn test_forward_panics_on_mismatch() {
        let device = Default::default();
        let model: AlexCifarNet<B> = AlexCifarNetConfig::new().init(&device);
        model.forward(Tensor::zeros([1, 1, 32, 32], &device));
    }
}
