//! # Bottleneck Block for `ResNet`
//!
//! [`BottleneckBlock`] is the 1x1 / 3x3 / 1x1 residual unit used by
//! `ResNet50`, `ResNet101` and `ResNet152`.
//!
//! The stride is carried by the 3x3 convolution.

use crate::layers::blocks::conv_norm::{
    Conv2dNormBlock, Conv2dNormBlockConfig, Conv2dNormBlockMeta,
};
use crate::models::resnet::downsample::{ConvDownsample, ConvDownsampleConfig};
use crate::models::resnet::util::CONV_INTO_RELU_INITIALIZER;
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::conv::Conv2dConfig;
use burn::nn::{PaddingConfig2d, Relu};
use burn::prelude::{Backend, Config, Module, Tensor};

/// Ratio of `out_planes` to the inner bottleneck width.
pub const BOTTLENECK_EXPANSION: usize = 4;

/// [`BottleneckBlock`] Meta trait.
pub trait BottleneckBlockMeta {
    /// The size of the in channels dimension.
    fn in_planes(&self) -> usize;

    /// The size of the out channels dimension.
    fn out_planes(&self) -> usize;

    /// The stride of the 3x3 convolution.
    fn stride(&self) -> usize;

    /// The inner (bottleneck) width.
    fn width(&self) -> usize {
        self.out_planes() / BOTTLENECK_EXPANSION
    }
}

/// [`BottleneckBlock`] Config.
#[derive(Config, Debug)]
pub struct BottleneckBlockConfig {
    /// The size of the in channels dimension.
    pub in_planes: usize,

    /// The size of the out channels dimension.
    ///
    /// Must be a multiple of [`BOTTLENECK_EXPANSION`].
    pub out_planes: usize,

    /// The stride of the 3x3 convolution and the downsample.
    #[config(default = 1)]
    pub stride: usize,
}

impl BottleneckBlockMeta for BottleneckBlockConfig {
    fn in_planes(&self) -> usize {
        self.in_planes
    }

    fn out_planes(&self) -> usize {
        self.out_planes
    }

    fn stride(&self) -> usize {
        self.stride
    }
}

impl BottleneckBlockConfig {
    /// Initialize a [`BottleneckBlock`].
    ///
    /// # Panics
    ///
    /// If `out_planes` is not a positive multiple of [`BOTTLENECK_EXPANSION`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> BottleneckBlock<B> {
        let width = self.width();
        assert!(
            width > 0 && self.out_planes % BOTTLENECK_EXPANSION == 0,
            "out_planes ({}) must be a positive multiple of {BOTTLENECK_EXPANSION}",
            self.out_planes
        );

        let downsample = (self.stride != 1 || self.in_planes != self.out_planes).then(|| {
            ConvDownsampleConfig::new(self.in_planes, self.out_planes)
                .with_stride(self.stride)
                .init(device)
        });

        let cn1: Conv2dNormBlockConfig = Conv2dConfig::new([self.in_planes, width], [1, 1])
            .with_initializer(CONV_INTO_RELU_INITIALIZER)
            .with_bias(false)
            .into();

        let cn2: Conv2dNormBlockConfig = Conv2dConfig::new([width, width], [3, 3])
            .with_stride([self.stride, self.stride])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .with_initializer(CONV_INTO_RELU_INITIALIZER)
            .with_bias(false)
            .into();

        let cn3: Conv2dNormBlockConfig = Conv2dConfig::new([width, self.out_planes], [1, 1])
            .with_initializer(CONV_INTO_RELU_INITIALIZER)
            .with_bias(false)
            .into();

        BottleneckBlock {
            conv_norm1: cn1.init(device),
            conv_norm2: cn2.init(device),
            conv_norm3: cn3.init(device),
            downsample,
            relu: Relu::new(),
        }
    }
}

/// Bottleneck Block for `ResNet`.
#[derive(Module, Debug)]
pub struct BottleneckBlock<B: Backend> {
    /// 1x1 reduction.
    pub conv_norm1: Conv2dNormBlock<B>,

    /// 3x3 strided conv.
    pub conv_norm2: Conv2dNormBlock<B>,

    /// 1x1 expansion.
    pub conv_norm3: Conv2dNormBlock<B>,

    /// Optional projection of the identity path.
    pub downsample: Option<ConvDownsample<B>>,

    /// Activation.
    pub relu: Relu,
}

impl<B: Backend> BottleneckBlockMeta for BottleneckBlock<B> {
    fn in_planes(&self) -> usize {
        self.conv_norm1.in_channels()
    }

    fn out_planes(&self) -> usize {
        self.conv_norm3.out_channels()
    }

    fn stride(&self) -> usize {
        self.conv_norm2.stride()[0]
    }
}

impl<B: Backend> BottleneckBlock<B> {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: a ``[batch, in_planes, in_height, in_width]`` tensor.
    ///
    /// # Returns
    ///
    /// A ``[batch, out_planes, out_height, out_width]`` tensor.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch] = unpack_shape_contract!(
            ["batch", "in_planes", "in_height", "in_width"],
            &input,
            &["batch"],
            &[("in_planes", self.in_planes())]
        );

        let identity = match &self.downsample {
            Some(downsample) => downsample.forward(input.clone()),
            None => input.clone(),
        };

        let x = self.relu.forward(self.conv_norm1.forward(input));
        let x = self.relu.forward(self.conv_norm2.forward(x));
        let x = self.conv_norm3.forward(x);

        let x = self.relu.forward(x + identity);

        assert_shape_contract_periodically!(
            ["batch", "out_planes", "out_height", "out_width"],
            &x,
            &[("batch", batch), ("out_planes", self.out_planes())]
        );

        x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_bottleneck_widths() {
        let config = BottleneckBlockConfig::new(64, 256);
        assert_eq!(config.width(), 64);
    }

    #[test]
    fn test_bottleneck_forward() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: BottleneckBlock<B> =
            BottleneckBlockConfig::new(16, 32).with_stride(2).init(&device);
        assert_eq!(block.width(), 8);
        assert_eq!(block.stride(), 2);
        assert!(block.downsample.is_some());

        let output = block.forward(Tensor::ones([2, 16, 5, 5], &device));
        assert_eq!(output.dims(), [2, 32, 3, 3]);
    }

    #[test]
    #[should_panic(expected = "must be a positive multiple")]
    fn test_bottleneck_bad_width() {
        type B = NdArray<f32>;
        let device = Default::default();
        let _block: BottleneckBlock<B> = BottleneckBlockConfig::new(16, 6).init(&device);
    }
}
