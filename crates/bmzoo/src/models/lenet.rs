//! # `LeNet`
//!
//! `LeNet` customized for 28x28 MNIST digits; 61,706 trainable parameters
//! with the default config.

use crate::utility::shapes::{expect_channels, expect_features, expect_min_resolution};
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::{Backend, Tensor};

/// Flattened feature width entering the classifier.
pub const LENET_FEATURES: usize = 16 * 5 * 5;

/// [`LeNet`] Config.
#[derive(Config, Debug)]
pub struct LeNetConfig {
    /// Number of output classes.
    #[config(default = 10)]
    pub num_classes: usize,

    /// Number of input channels.
    #[config(default = 1)]
    pub in_channels: usize,
}

impl Default for LeNetConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LeNetConfig {
    /// Initialize a [`LeNet`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> LeNet<B> {
        LeNet {
            conv1: Conv2dConfig::new([self.in_channels, 6], [5, 5])
                .with_padding(PaddingConfig2d::Explicit(2, 2))
                .init(device),
            conv2: Conv2dConfig::new([6, 16], [5, 5]).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),

            fc1: LinearConfig::new(LENET_FEATURES, 120).init(device),
            fc2: LinearConfig::new(120, 84).init(device),
            fc3: LinearConfig::new(84, self.num_classes).init(device),

            relu: Relu::new(),
        }
    }
}

/// `LeNet` digit classifier.
#[derive(Module, Debug)]
pub struct LeNet<B: Backend> {
    /// ``in_channels -> 6``, 5x5, pad 2.
    pub conv1: Conv2d<B>,
    /// ``6 -> 16``, 5x5.
    pub conv2: Conv2d<B>,
    /// 2x2 max pool.
    pub pool: MaxPool2d,

    /// ``400 -> 120``.
    pub fc1: Linear<B>,
    /// ``120 -> 84``.
    pub fc2: Linear<B>,
    /// ``84 -> num_classes``.
    pub fc3: Linear<B>,

    /// Shared activation.
    pub relu: Relu,
}

impl<B: Backend> LeNet<B> {
    /// Input spatial sizes this model is declared for.
    pub const SUPPORTED_DIMS: [usize; 1] = [28];

    /// Number of input channels.
    pub fn in_channels(&self) -> usize {
        self.conv1.weight.dims()[1]
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.fc3.weight.dims()[1]
    }

    /// Forward pass.
    ///
    /// ``[batch, in_channels, 28, 28] -> [batch, num_classes]``
    ///
    /// # Panics
    ///
    /// On a shape mismatch; see [`Self::try_forward`].
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        self.try_forward(input)
            .unwrap_or_else(|err| panic!("LeNet: {err}"))
    }

    /// Checked forward pass.
    pub fn try_forward(
        &self,
        input: Tensor<B, 4>,
    ) -> crate::Result<Tensor<B, 2>> {
        expect_channels("LeNet.conv1", &input.dims(), self.in_channels())?;

        // [b, 6, 28, 28] -> [b, 6, 14, 14]
        let x = self.relu.forward(self.conv1.forward(input));
        expect_min_resolution("LeNet.pool1", &x.dims(), 2)?;
        let x = self.pool.forward(x);

        // [b, 16, 10, 10] -> [b, 16, 5, 5]
        expect_min_resolution("LeNet.conv2", &x.dims(), 5)?;
        let x = self.relu.forward(self.conv2.forward(x));
        expect_min_resolution("LeNet.pool2", &x.dims(), 2)?;
        let x = self.pool.forward(x);

        let x: Tensor<B, 2> = x.flatten(1, 3);
        expect_features("LeNet.fc1", &x.dims(), LENET_FEATURES)?;

        let x = self.relu.forward(self.fc1.forward(x));
        let x = self.relu.forward(self.fc2.forward(x));
        Ok(self.fc3.forward(x))
    }
}
