//! # `ResNet` Core Model
//!
//! The torchvision `ResNet` layout: a 7x7/2 conv-norm stem, a 3x3/2 max pool,
//! four [`LayerBlock`]s, global average pooling, and a linear head.

use crate::errors::ZooError;
use crate::layers::blocks::conv_norm::{
    Conv2dNormBlock, Conv2dNormBlockConfig, Conv2dNormBlockMeta,
};
use crate::models::resnet::bottleneck::BOTTLENECK_EXPANSION;
use crate::models::resnet::layer_block::{LayerBlock, LayerBlockConfig, LayerBlockMeta};
use crate::models::resnet::util::CONV_INTO_RELU_INITIALIZER;
use crate::utility::shapes::{expect_channels, expect_features};
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::Conv2dConfig;
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig};
use burn::nn::{Linear, LinearConfig, PaddingConfig2d, Relu};
use burn::prelude::{Backend, Tensor};

/// Width of the stem and of the first layer block's base planes.
pub const RESNET_STEM_PLANES: usize = 64;

/// Build the 7x7/2 stem convolution config for `in_channels`.
pub fn stem_conv_config(in_channels: usize) -> Conv2dConfig {
    Conv2dConfig::new([in_channels, RESNET_STEM_PLANES], [7, 7])
        .with_stride([2, 2])
        .with_padding(PaddingConfig2d::Explicit(3, 3))
        .with_initializer(CONV_INTO_RELU_INITIALIZER)
        .with_bias(false)
}

/// [`ResNet`] structure config.
#[derive(Config, Debug)]
pub struct ResNetConfig {
    /// Number of residual blocks in each of the four layer blocks.
    pub layers: [usize; 4],

    /// Number of output classes.
    #[config(default = 1000)]
    pub num_classes: usize,

    /// Number of input channels.
    #[config(default = 3)]
    pub in_channels: usize,

    /// Use bottleneck blocks (``expansion = 4``) instead of basic blocks.
    #[config(default = false)]
    pub bottleneck: bool,
}

impl ResNetConfig {
    /// The ratio of output planes to base planes.
    pub fn expansion(&self) -> usize {
        if self.bottleneck {
            BOTTLENECK_EXPANSION
        } else {
            1
        }
    }

    /// Width of the pooled features entering the head.
    pub fn feature_width(&self) -> usize {
        512 * self.expansion()
    }

    /// Check that the config describes a buildable model.
    pub fn try_validate(&self) -> crate::Result<()> {
        if self.layers.contains(&0) {
            return Err(ZooError::InvalidConfig(format!(
                "every layer block needs at least one residual block: {:?}",
                self.layers
            )));
        }
        if self.num_classes == 0 || self.in_channels == 0 {
            return Err(ZooError::InvalidConfig(format!(
                "num_classes ({}) and in_channels ({}) must be at least 1",
                self.num_classes, self.in_channels
            )));
        }
        Ok(())
    }

    /// The four layer block configs.
    pub fn layer_configs(&self) -> [LayerBlockConfig; 4] {
        let e = self.expansion();
        let bottleneck = self.bottleneck;
        [
            LayerBlockConfig::build(self.layers[0], RESNET_STEM_PLANES, 64 * e, 1, bottleneck),
            LayerBlockConfig::build(self.layers[1], 64 * e, 128 * e, 2, bottleneck),
            LayerBlockConfig::build(self.layers[2], 128 * e, 256 * e, 2, bottleneck),
            LayerBlockConfig::build(self.layers[3], 256 * e, 512 * e, 2, bottleneck),
        ]
    }

    /// Initialize a [`ResNet`].
    ///
    /// # Panics
    ///
    /// If [`Self::try_validate`] fails.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> ResNet<B> {
        if let Err(err) = self.try_validate() {
            panic!("{err}");
        }

        let stem: Conv2dNormBlockConfig = stem_conv_config(self.in_channels).into();
        let [layer1, layer2, layer3, layer4] = self.layer_configs();

        ResNet {
            stem: stem.init(device),
            relu: Relu::new(),
            maxpool: MaxPool2dConfig::new([3, 3])
                .with_strides([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(),

            layer1: layer1.init(device),
            layer2: layer2.init(device),
            layer3: layer3.init(device),
            layer4: layer4.init(device),

            avgpool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc: LinearConfig::new(self.feature_width(), self.num_classes).init(device),
        }
    }
}

/// `ResNet` model.
#[derive(Module, Debug)]
pub struct ResNet<B: Backend> {
    /// 7x7/2 conv + batch norm.
    pub stem: Conv2dNormBlock<B>,
    /// Activation.
    pub relu: Relu,
    /// 3x3/2 max pool.
    pub maxpool: MaxPool2d,

    /// Stride 1 layer block.
    pub layer1: LayerBlock<B>,
    /// Stride 2 layer block.
    pub layer2: LayerBlock<B>,
    /// Stride 2 layer block.
    pub layer3: LayerBlock<B>,
    /// Stride 2 layer block.
    pub layer4: LayerBlock<B>,

    /// Global average pool.
    pub avgpool: AdaptiveAvgPool2d,
    /// Classifier head.
    pub fc: Linear<B>,
}

impl<B: Backend> ResNet<B> {
    /// Number of input channels accepted by the stem.
    pub fn in_channels(&self) -> usize {
        self.stem.in_channels()
    }

    /// Number of output classes.
    pub fn num_classes(&self) -> usize {
        self.fc.weight.dims()[1]
    }

    /// Width of the pooled features entering the head.
    pub fn feature_width(&self) -> usize {
        self.layer4.out_planes()
    }

    /// Replace the head with a freshly initialized ``feature_width -> num_classes`` projection.
    pub fn with_classes(
        self,
        num_classes: usize,
    ) -> Self {
        let device = self.fc.weight.device();
        Self {
            fc: LinearConfig::new(self.feature_width(), num_classes).init(&device),
            ..self
        }
    }

    /// Replace the stem convolution with a freshly initialized one accepting `in_channels`.
    ///
    /// The stem batch norm is kept.
    pub fn with_in_channels(
        self,
        in_channels: usize,
    ) -> Self {
        Self {
            stem: self.stem.with_conv(stem_conv_config(in_channels)),
            ..self
        }
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
            .unwrap_or_else(|err| panic!("ResNet: {err}"))
    }

    /// Checked forward pass.
    pub fn try_forward(
        &self,
        input: Tensor<B, 4>,
    ) -> crate::Result<Tensor<B, 2>> {
        expect_channels("ResNet.conv1", &input.dims(), self.in_channels())?;

        let x = self.stem.forward(input);
        let x = self.relu.forward(x);
        let x = self.maxpool.forward(x);

        let x = self.layer1.forward(x);
        let x = self.layer2.forward(x);
        let x = self.layer3.forward(x);
        let x = self.layer4.forward(x);

        // [b, c, h, w] -> [b, c, 1, 1] -> [b, c]
        let x = self.avgpool.forward(x);
        let x: Tensor<B, 2> = x.flatten(1, 3);
        expect_features("ResNet.fc", &x.dims(), self.fc.weight.dims()[0])?;

        Ok(self.fc.forward(x))
    }
}
