//! # `VGG` Core Model
//!
//! The torchvision `VGG` layout: stages of 3x3 convolutions (optionally batch
//! normalized), each followed by a 2x2 max pool; an adaptive average pool;
//! and a three layer dropout classifier.

use crate::errors::ZooError;
use crate::models::resnet::util::CONV_INTO_RELU_INITIALIZER;
use crate::utility::shapes::{expect_channels, expect_features, expect_min_resolution};
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Initializer, Linear, LinearConfig,
    PaddingConfig2d, Relu,
};
use burn::prelude::{Backend, Tensor};

/// Classifier init: ``N(0, 0.01)``.
pub const VGG_LINEAR_INITIALIZER: Initializer = Initializer::Normal {
    mean: 0.0,
    std: 0.01,
};

/// Build a 3x3, pad 1, biased feature convolution config.
pub fn feature_conv_config(
    in_channels: usize,
    out_channels: usize,
) -> Conv2dConfig {
    Conv2dConfig::new([in_channels, out_channels], [3, 3])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .with_initializer(CONV_INTO_RELU_INITIALIZER)
}

/// [`Vgg`] structure config.
#[derive(Config, Debug)]
pub struct VggConfig {
    /// Output widths of the convolutions of each stage.
    ///
    /// Every stage ends in a 2x2 max pool.
    pub stages: Vec<Vec<usize>>,

    /// Batch normalize each convolution.
    #[config(default = false)]
    pub batch_norm: bool,

    /// Number of output classes.
    #[config(default = 1000)]
    pub num_classes: usize,

    /// Number of input channels.
    #[config(default = 3)]
    pub in_channels: usize,

    /// Side of the adaptive average pool output.
    #[config(default = 7)]
    pub pooled: usize,

    /// Width of the two hidden classifier layers.
    #[config(default = 4096)]
    pub hidden: usize,

    /// Classifier dropout probability.
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl VggConfig {
    /// Build a config from a static stage table.
    pub fn from_stages(stages: &[&[usize]]) -> Self {
        Self::new(stages.iter().map(|stage| stage.to_vec()).collect())
    }

    /// Number of channels leaving the feature stack.
    pub fn feature_channels(&self) -> usize {
        self.stages
            .iter()
            .rev()
            .find_map(|stage| stage.last().copied())
            .unwrap_or(self.in_channels)
    }

    /// Width of the flattened pooled features entering the classifier.
    pub fn feature_width(&self) -> usize {
        self.feature_channels() * self.pooled * self.pooled
    }

    /// Check that the config describes a buildable model.
    pub fn try_validate(&self) -> crate::Result<()> {
        if self.stages.is_empty() || self.stages.iter().any(|stage| stage.is_empty()) {
            return Err(ZooError::InvalidConfig(format!(
                "every VGG stage needs at least one conv: {:?}",
                self.stages
            )));
        }
        if self.num_classes == 0 || self.in_channels == 0 {
            return Err(ZooError::InvalidConfig(format!(
                "num_classes ({}) and in_channels ({}) must be at least 1",
                self.num_classes, self.in_channels
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ZooError::InvalidConfig(format!(
                "dropout ({}) must be in [0, 1)",
                self.dropout
            )));
        }
        Ok(())
    }

    /// Initialize a [`Vgg`].
    ///
    /// # Panics
    ///
    /// If [`Self::try_validate`] fails.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Vgg<B> {
        if let Err(err) = self.try_validate() {
            panic!("{err}");
        }

        let mut in_channels = self.in_channels;
        let stages = self
            .stages
            .iter()
            .map(|widths| {
                let convs = widths
                    .iter()
                    .map(|&out_channels| {
                        let conv = VggConv {
                            conv: feature_conv_config(in_channels, out_channels).init(device),
                            norm: self
                                .batch_norm
                                .then(|| BatchNormConfig::new(out_channels).init(device)),
                            relu: Relu::new(),
                        };
                        in_channels = out_channels;
                        conv
                    })
                    .collect();
                VggStage {
                    convs,
                    pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
                }
            })
            .collect();

        let linear = |d_in, d_out| {
            LinearConfig::new(d_in, d_out)
                .with_initializer(VGG_LINEAR_INITIALIZER)
                .init(device)
        };

        Vgg {
            stages,
            avgpool: AdaptiveAvgPool2dConfig::new([self.pooled, self.pooled]).init(),
            fc1: linear(self.feature_width(), self.hidden),
            fc2: linear(self.hidden, self.hidden),
            fc3: linear(self.hidden, self.num_classes),
            dropout: DropoutConfig::new(self.dropout).init(),
            relu: Relu::new(),
        }
    }
}

/// A feature convolution, optionally batch normalized, followed by a ReLU.
#[derive(Module, Debug)]
pub struct VggConv<B: Backend> {
    /// 3x3 conv.
    pub conv: Conv2d<B>,
    /// Optional batch norm.
    pub norm: Option<BatchNorm<B, 2>>,
    /// Activation.
    pub relu: Relu,
}

impl<B: Backend> VggConv<B> {
    /// Forward pass; ReLU included.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let x = self.conv.forward(input);
        let x = match &self.norm {
            Some(norm) => norm.forward(x),
            None => x,
        };
        self.relu.forward(x)
    }
}

/// A run of [`VggConv`]s followed by a 2x2 max pool.
#[derive(Module, Debug)]
pub struct VggStage<B: Backend> {
    /// Convolutions.
    pub convs: Vec<VggConv<B>>,
    /// 2x2/2 max pool.
    pub pool: MaxPool2d,
}

impl<B: Backend> VggStage<B> {
    /// Checked forward pass; `layer` names this stage in errors.
    ///
    /// Fails when the pool has no full 2x2 window.
    pub fn try_forward(
        &self,
        layer: &str,
        input: Tensor<B, 4>,
    ) -> crate::Result<Tensor<B, 4>> {
        let x = self.convs.iter().fold(input, |x, conv| conv.forward(x));
        expect_min_resolution(layer, &x.dims(), 2)?;
        Ok(self.pool.forward(x))
    }
}

/// `VGG` model.
#[derive(Module, Debug)]
pub struct Vgg<B: Backend> {
    /// Feature stages.
    pub stages: Vec<VggStage<B>>,
    /// Adaptive average pool.
    pub avgpool: AdaptiveAvgPool2d,

    /// ``feature_width -> hidden``.
    pub fc1: Linear<B>,
    /// ``hidden -> hidden``.
    pub fc2: Linear<B>,
    /// ``hidden -> num_classes``.
    pub fc3: Linear<B>,

    /// Classifier dropout.
    pub dropout: Dropout,
    /// Classifier activation.
    pub relu: Relu,
}

impl<B: Backend> Vgg<B> {
    fn first_conv(&self) -> &Conv2d<B> {
        &self.stages[0].convs[0].conv
    }

    /// Number of input channels.
    pub fn in_channels(&self) -> usize {
        self.first_conv().weight.dims()[1]
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.fc3.weight.dims()[1]
    }

    /// Iterate the feature convolutions in order.
    pub fn convs(&self) -> impl Iterator<Item = &VggConv<B>> {
        self.stages.iter().flat_map(|stage| stage.convs.iter())
    }

    /// Replace the classifier's last layer with a fresh ``hidden -> num_classes`` projection.
    pub fn with_classes(
        self,
        num_classes: usize,
    ) -> Self {
        let [hidden, _] = self.fc3.weight.dims();
        let device = self.fc3.weight.device();
        Self {
            fc3: LinearConfig::new(hidden, num_classes)
                .with_initializer(VGG_LINEAR_INITIALIZER)
                .init(&device),
            ..self
        }
    }

    /// Replace the first feature convolution with a fresh one accepting `in_channels`.
    pub fn with_in_channels(
        mut self,
        in_channels: usize,
    ) -> Self {
        let first = self.first_conv();
        let out_channels = first.weight.dims()[0];
        let device = first.weight.device();

        self.stages[0].convs[0].conv = feature_conv_config(in_channels, out_channels).init(&device);
        self
    }

    /// Forward pass.
    ///
    /// ``[batch, in_channels, height, width] -> [batch, num_classes]``
    ///
    /// # Panics
    ///
    /// On a shape mismatch; see [`Self::try_forward`].
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 2> {
        self.try_forward(input)
            .unwrap_or_else(|err| panic!("VGG: {err}"))
    }

    /// Checked forward pass.
    pub fn try_forward(
        &self,
        input: Tensor<B, 4>,
    ) -> crate::Result<Tensor<B, 2>> {
        expect_channels("VGG.features.0", &input.dims(), self.in_channels())?;

        let x = self
            .stages
            .iter()
            .enumerate()
            .try_fold(input, |x, (idx, stage)| {
                stage.try_forward(&format!("VGG.stages.{idx}"), x)
            })?;
        let x = self.avgpool.forward(x);

        let x: Tensor<B, 2> = x.flatten(1, 3);
        expect_features("VGG.fc1", &x.dims(), self.fc1.weight.dims()[0])?;

        let x = self.dropout.forward(self.relu.forward(self.fc1.forward(x)));
        let x = self.dropout.forward(self.relu.forward(self.fc2.forward(x)));
        Ok(self.fc3.forward(x))
    }
}
