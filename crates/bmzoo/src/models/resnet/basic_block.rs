//! # Basic Block for `ResNet`
//!
//! [`BasicBlock`] is the two-conv residual unit used by `ResNet18` and `ResNet34`.
//!
//! [`BasicBlockConfig`] implements [`Config`], and provides
//! [`BasicBlockConfig::init`] to initialize a [`BasicBlock`].

use crate::layers::blocks::conv_norm::{
    Conv2dNormBlock, Conv2dNormBlockConfig, Conv2dNormBlockMeta,
};
use crate::models::resnet::downsample::{ConvDownsample, ConvDownsampleConfig};
use crate::models::resnet::util::CONV_INTO_RELU_INITIALIZER;
use bimm_contracts::{assert_shape_contract_periodically, unpack_shape_contract};
use burn::nn::conv::Conv2dConfig;
use burn::nn::{PaddingConfig2d, Relu};
use burn::prelude::{Backend, Config, Module, Tensor};

/// [`BasicBlock`] Meta trait.
pub trait BasicBlockMeta {
    /// The size of the in channels dimension.
    fn in_planes(&self) -> usize;

    /// The size of the out channels dimension.
    fn out_planes(&self) -> usize;

    /// The stride of the first convolution.
    fn stride(&self) -> usize;
}

/// [`BasicBlock`] Config.
#[derive(Config, Debug)]
pub struct BasicBlockConfig {
    /// The size of the in channels dimension.
    pub in_planes: usize,

    /// The size of the out channels dimension.
    pub out_planes: usize,

    /// The stride of the first convolution and the downsample.
    #[config(default = 1)]
    pub stride: usize,
}

impl BasicBlockMeta for BasicBlockConfig {
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

impl BasicBlockConfig {
    /// Initialize a [`BasicBlock`].
    pub fn init<B: Backend>(
        self,
        device: &B::Device,
    ) -> BasicBlock<B> {
        let downsample = (self.stride != 1 || self.in_planes != self.out_planes).then(|| {
            ConvDownsampleConfig::new(self.in_planes, self.out_planes)
                .with_stride(self.stride)
                .init(device)
        });

        let cn1: Conv2dNormBlockConfig =
            Conv2dConfig::new([self.in_planes, self.out_planes], [3, 3])
                .with_stride([self.stride, self.stride])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_initializer(CONV_INTO_RELU_INITIALIZER)
                .with_bias(false)
                .into();

        let cn2: Conv2dNormBlockConfig =
            Conv2dConfig::new([self.out_planes, self.out_planes], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_initializer(CONV_INTO_RELU_INITIALIZER)
                .with_bias(false)
                .into();

        BasicBlock {
            conv_norm1: cn1.init(device),
            conv_norm2: cn2.init(device),
            downsample,
            relu: Relu::new(),
        }
    }
}

/// Basic Block for `ResNet`.
#[derive(Module, Debug)]
pub struct BasicBlock<B: Backend> {
    /// First conv/norm; carries the stride.
    pub conv_norm1: Conv2dNormBlock<B>,

    /// Second conv/norm.
    pub conv_norm2: Conv2dNormBlock<B>,

    /// Optional projection of the identity path.
    pub downsample: Option<ConvDownsample<B>>,

    /// Activation.
    pub relu: Relu,
}

impl<B: Backend> BasicBlockMeta for BasicBlock<B> {
    fn in_planes(&self) -> usize {
        self.conv_norm1.in_channels()
    }

    fn out_planes(&self) -> usize {
        self.conv_norm2.out_channels()
    }

    fn stride(&self) -> usize {
        self.conv_norm1.stride()[0]
    }
}

impl<B: Backend> BasicBlock<B> {
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

        let x = self.conv_norm1.forward(input);
        let x = self.relu.forward(x);
        let x = self.conv_norm2.forward(x);

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
    fn test_basic_block_identity() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: BasicBlock<B> = BasicBlockConfig::new(8, 8).init(&device);
        assert!(block.downsample.is_none());
        assert_eq!(block.in_planes(), 8);
        assert_eq!(block.out_planes(), 8);
        assert_eq!(block.stride(), 1);

        let output = block.forward(Tensor::ones([2, 8, 6, 6], &device));
        assert_eq!(output.dims(), [2, 8, 6, 6]);

        // Output of a ReLU.
        let min = output.min().into_scalar();
        assert!(min >= 0.0);
    }

    #[test]
    fn test_basic_block_downsample() {
        type B = NdArray<f32>;
        let device = Default::default();

        let block: BasicBlock<B> = BasicBlockConfig::new(8, 16).with_stride(2).init(&device);
        assert!(block.downsample.is_some());

        let output = block.forward(Tensor::ones([1, 8, 7, 7], &device));
        assert_eq!(output.dims(), [1, 16, 4, 4]);
    }
}
