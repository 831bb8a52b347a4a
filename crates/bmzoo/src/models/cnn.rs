//! # `Cnn`
//!
//! A compact full-precision convolutional classifier for 32x32 inputs.
//!
//! The block names (``ternary``) are historical; no quantization is applied.
//!
//! ```text
//! stem:    conv(in->32, 3x3) -> relu
//! ternary: [conv(3x3, no bias) -> bn -> relu (-> maxpool(2))] x 5
//!          32->64 (pool), 64->128, 128->128 (pool), 128->256, 256->256 (pool)
//! head:    flatten(256 * 4 * 4) -> fc(4096->num_classes, no bias) -> log_softmax
//! ```

use crate::layers::blocks::conv_norm::{Conv2dNormBlock, Conv2dNormBlockConfig};
use crate::utility::shapes::{expect_channels, expect_features, expect_min_resolution};
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::{Backend, Tensor};
use burn::tensor::activation::log_softmax;

/// Flattened feature width entering the head.
pub const CNN_FEATURES: usize = 256 * 4 * 4;

/// ``(in_channels, out_channels, pool)`` for each ternary block stage.
pub const CNN_TERNARY_STAGES: [(usize, usize, bool); 5] = [
    (32, 64, true),
    (64, 128, false),
    (128, 128, true),
    (128, 256, false),
    (256, 256, true),
];

/// [`Cnn`] Config.
#[derive(Config, Debug)]
pub struct CnnConfig {
    /// Number of output classes.
    #[config(default = 10)]
    pub num_classes: usize,

    /// Number of input channels.
    #[config(default = 1)]
    pub in_channels: usize,
}

impl Default for CnnConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CnnConfig {
    /// Initialize a [`Cnn`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Cnn<B> {
        let ternary = CNN_TERNARY_STAGES
            .iter()
            .map(|&(in_channels, out_channels, pool)| CnnStage {
                conv_norm: Conv2dNormBlockConfig::from(
                    Conv2dConfig::new([in_channels, out_channels], [3, 3])
                        .with_padding(PaddingConfig2d::Explicit(1, 1))
                        .with_bias(false),
                )
                .init(device),
                pool: pool.then(|| MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init()),
                relu: Relu::new(),
            })
            .collect();

        Cnn {
            stem: Conv2dConfig::new([self.in_channels, 32], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            ternary,
            fc: LinearConfig::new(CNN_FEATURES, self.num_classes)
                .with_bias(false)
                .init(device),
            relu: Relu::new(),
        }
    }
}

/// One ``conv -> bn -> relu (-> pool)`` stage.
#[derive(Module, Debug)]
pub struct CnnStage<B: Backend> {
    /// Conv and batch norm.
    pub conv_norm: Conv2dNormBlock<B>,
    /// Optional 2x2 max pool.
    pub pool: Option<MaxPool2d>,
    /// Activation.
    pub relu: Relu,
}

impl<B: Backend> CnnStage<B> {
    /// Checked forward pass; `layer` names this stage in errors.
    ///
    /// Fails when the pool has no full 2x2 window.
    pub fn try_forward(
        &self,
        layer: &str,
        input: Tensor<B, 4>,
    ) -> crate::Result<Tensor<B, 4>> {
        let x = self.relu.forward(self.conv_norm.forward(input));
        match &self.pool {
            Some(pool) => {
                expect_min_resolution(layer, &x.dims(), 2)?;
                Ok(pool.forward(x))
            }
            None => Ok(x),
        }
    }
}

/// Compact convolutional classifier with log-probability outputs.
#[derive(Module, Debug)]
pub struct Cnn<B: Backend> {
    /// Full-precision stem convolution.
    pub stem: Conv2d<B>,
    /// The deeper conv/norm stages.
    pub ternary: Vec<CnnStage<B>>,
    /// Bias-free head projection.
    pub fc: Linear<B>,
    /// Stem activation.
    pub relu: Relu,
}

impl<B: Backend> Cnn<B> {
    /// Input spatial sizes this model is declared for.
    pub const SUPPORTED_DIMS: [usize; 1] = [32];

    /// Number of input channels.
    pub fn in_channels(&self) -> usize {
        self.stem.weight.dims()[1]
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.fc.weight.dims()[1]
    }

    /// Forward pass.
    ///
    /// ``[batch, in_channels, 32, 32] -> [batch, num_classes]`` log-probabilities.
    ///
    /// # Panics
    ///
    /// On a shape mismatch; see [`Self::try_forward`].
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        self.try_forward(input)
            .unwrap_or_else(|err| panic!("CNN: {err}"))
    }

    /// Checked forward pass.
    pub fn try_forward(
        &self,
        input: Tensor<B, 4>,
    ) -> crate::Result<Tensor<B, 2>> {
        expect_channels("CNN.stem", &input.dims(), self.in_channels())?;

        let x = self.relu.forward(self.stem.forward(input));
        let x = self
            .ternary
            .iter()
            .enumerate()
            .try_fold(x, |x, (idx, stage)| {
                stage.try_forward(&format!("CNN.ternary.{idx}"), x)
            })?;

        let x: Tensor<B, 2> = x.flatten(1, 3);
        expect_features("CNN.fc", &x.dims(), CNN_FEATURES)?;

        Ok(log_softmax(self.fc.forward(x), 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ZooError;
    use burn::backend::{Autodiff, NdArray};
    use burn::tensor::Distribution;

    type B = NdArray<f32>;

    #[test]
    fn test_structure() {
        let device = Default::default();
        let model: Cnn<B> = CnnConfig::new().with_num_classes(7).init(&device);

        assert_eq!(model.in_channels(), 1);
        assert_eq!(model.num_classes(), 7);
        assert_eq!(model.ternary.len(), 5);
        assert!(model.fc.bias.is_none());
        assert!(model.stem.bias.is_some());
        assert!(model.ternary.iter().all(|s| s.conv_norm.conv.bias.is_none()));
        assert_eq!(
            model.ternary.iter().filter(|s| s.pool.is_some()).count(),
            3
        );
    }

    #[test]
    fn test_forward_log_probabilities() {
        let device = Default::default();
        let model: Cnn<B> = CnnConfig::new()
            .with_in_channels(3)
            .with_num_classes(10)
            .init(&device);

        let input = Tensor::random([2, 3, 32, 32], Distribution::Default, &device);
        let output = model.forward(input);
        assert_eq!(output.dims(), [2, 10]);

        let row_sums = output.exp().sum_dim(1).to_data().to_vec::<f32>().unwrap();
        for sum in row_sums {
            assert!((sum - 1.0).abs() < 1e-4, "{sum}");
        }
    }

    #[test]
    fn test_forward_autodiff_training_mode() {
        type AB = Autodiff<NdArray<f32>>;
        let device = Default::default();
        let model: Cnn<AB> = CnnConfig::new().init(&device);

        let input = Tensor::random([2, 1, 32, 32], Distribution::Default, &device);
        let output = model.forward(input);
        assert_eq!(output.dims(), [2, 10]);

        let grads = output.sum().backward();
        assert!(model.fc.weight.grad(&grads).is_some());
    }

    #[test]
    fn test_mnist_sized_input_fails_at_head() {
        let device = Default::default();
        let model: Cnn<B> = CnnConfig::new().init(&device);

        let err = model
            .try_forward(Tensor::zeros([1, 1, 28, 28], &device))
            .unwrap_err();
        match err {
            ZooError::ShapeMismatch { layer, actual, .. } => {
                assert_eq!(layer, "CNN.fc");
                assert_eq!(actual, vec![1, 256 * 3 * 3]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_tiny_input_fails_at_last_pool() {
        let device = Default::default();
        let model: Cnn<B> = CnnConfig::new().init(&device);

        // 4 -> 2 -> 1 after two pools; the third has no 2x2 window.
        let err = model
            .try_forward(Tensor::zeros([1, 1, 4, 4], &device))
            .unwrap_err();
        match err {
            ZooError::ShapeMismatch { layer, actual, .. } => {
                assert_eq!(layer, "CNN.ternary.4");
                assert_eq!(actual, vec![1, 256, 1, 1]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
