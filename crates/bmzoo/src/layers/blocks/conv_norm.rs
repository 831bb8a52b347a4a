//! # `ConvNorm` Module
//!
//! A [`Conv2dNormBlock`] module is a [`Conv2d`] layer followed by a [`BatchNorm`] layer.

use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{BatchNorm, BatchNormConfig};
use burn::prelude::{Backend, Tensor};

/// [`Conv2dNormBlock`] Meta.
pub trait Conv2dNormBlockMeta {
    /// Number of input channels.
    fn in_channels(&self) -> usize;

    /// Number of output channels.
    fn out_channels(&self) -> usize;

    /// Get the stride.
    fn stride(&self) -> [usize; 2];
}

/// [`Conv2dNormBlock`] Config.
#[derive(Config, Debug)]
pub struct Conv2dNormBlockConfig {
    /// The [`Conv2d`] config.
    pub conv: Conv2dConfig,
}

impl Conv2dNormBlockMeta for Conv2dNormBlockConfig {
    fn in_channels(&self) -> usize {
        self.conv.channels[0]
    }

    fn out_channels(&self) -> usize {
        self.conv.channels[1]
    }

    fn stride(&self) -> [usize; 2] {
        self.conv.stride
    }
}

impl From<Conv2dConfig> for Conv2dNormBlockConfig {
    fn from(conv: Conv2dConfig) -> Self {
        Self { conv }
    }
}

impl Conv2dNormBlockConfig {
    /// Initialize a [`Conv2dNormBlock`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> Conv2dNormBlock<B> {
        Conv2dNormBlock {
            conv: self.conv.init(device),
            norm: BatchNormConfig::new(self.conv.channels[1]).init(device),
        }
    }
}

/// Grouped [`Conv2d`] and [`BatchNorm`] layer.
#[derive(Module, Debug)]
pub struct Conv2dNormBlock<B: Backend> {
    /// Internal Conv2d layer.
    pub conv: Conv2d<B>,

    /// Internal Norm Layer.
    pub norm: BatchNorm<B, 2>,
}

impl<B: Backend> Conv2dNormBlockMeta for Conv2dNormBlock<B> {
    fn in_channels(&self) -> usize {
        self.conv.weight.dims()[1] * self.conv.groups
    }

    fn out_channels(&self) -> usize {
        self.conv.weight.dims()[0]
    }

    fn stride(&self) -> [usize; 2] {
        self.conv.stride
    }
}

impl<B: Backend> Conv2dNormBlock<B> {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, in_channels, in_height, in_width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, out_channels, out_height, out_width]``
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch] = unpack_shape_contract!(
            ["batch", "in_channels", "in_height", "in_width"],
            &input,
            &["batch"],
            &[("in_channels", self.in_channels())]
        );

        let x = self.conv.forward(input);
        let x = self.norm.forward(x);

        assert_shape_contract_periodically!(
            ["batch", "out_channels", "out_height", "out_width"],
            &x,
            &[("batch", batch), ("out_channels", self.out_channels())]
        );

        x
    }

    /// Replace the convolution with a freshly initialized one.
    ///
    /// The norm layer is kept; so `config` must keep the output channel count.
    pub fn with_conv(
        self,
        config: Conv2dConfig,
    ) -> Self {
        assert_eq!(
            config.channels[1],
            self.out_channels(),
            "replacement conv must keep out_channels"
        );
        let device = self.conv.weight.device();
        Self {
            conv: config.init(&device),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bimm_contracts::assert_shape_contract;
    use burn::backend::NdArray;
    use burn::nn::PaddingConfig2d;

    #[test]
    fn test_conv_norm_config() {
        let inner_config = Conv2dConfig::new([2, 4], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_bias(false);

        let config: Conv2dNormBlockConfig = inner_config.clone().into();

        assert_eq!(config.in_channels(), 2);
        assert_eq!(config.out_channels(), 4);
        assert_eq!(&config.conv.kernel_size, &inner_config.kernel_size);
        assert_eq!(config.stride(), [2, 2]);
    }

    #[test]
    fn test_conv_norm_forward_and_replace() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: Conv2dNormBlock<B> = Conv2dNormBlockConfig::from(
            Conv2dConfig::new([3, 8], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_bias(false),
        )
        .init(&device);
        assert_eq!(block.in_channels(), 3);
        assert_eq!(block.out_channels(), 8);

        let output = block.forward(Tensor::ones([2, 3, 9, 9], &device));
        assert_shape_contract!(
            ["batch", "out_channels", "out_height", "out_width"],
            &output,
            &[
                ("batch", 2),
                ("out_channels", 8),
                ("out_height", 5),
                ("out_width", 5)
            ],
        );

        let block = block.with_conv(
            Conv2dConfig::new([1, 8], [3, 3])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_bias(false),
        );
        assert_eq!(block.in_channels(), 1);
        assert_eq!(block.out_channels(), 8);

        let output = block.forward(Tensor::ones([1, 1, 8, 8], &device));
        assert_eq!(output.dims(), [1, 8, 4, 4]);
    }
}
