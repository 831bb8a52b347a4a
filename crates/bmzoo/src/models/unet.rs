//! # `UNet`
//!
//! A single channel encoder-decoder segmentation network. Four double-conv
//! encoders contract the input by 8x; three decoders expand it back, each
//! concatenating the upsampled map with the matching encoder map.
//!
//! The skip connections only line up when height and width are divisible
//! by 8; [`UNet::try_forward`] reports the first skip that does not.

use crate::utility::shapes::{expect_channels, expect_min_resolution, expect_same_resolution};
use burn::config::Config;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{PaddingConfig2d, Relu};
use burn::prelude::{Backend, Tensor};

/// Encoder widths, shallowest first.
pub const UNET_ENCODER_WIDTHS: [usize; 4] = [64, 128, 256, 512];

/// How the decoder upsamplers are allocated.
#[derive(Config, Debug)]
pub enum UpsamplePolicy {
    /// One transposed conv per decoder stage, sized to its input:
    /// ``512 -> 512``, ``256 -> 256``, ``128 -> 128``.
    PerStage,

    /// A single ``512 -> 512`` transposed conv reused by every stage.
    ///
    /// Only the deepest stage receives 512 channels; the second stage
    /// fails its upsampler contract.
    Shared,
}

/// [`UNet`] Config.
#[derive(Config, Debug)]
pub struct UNetConfig {
    /// Upsampler allocation.
    #[config(default = "UpsamplePolicy::PerStage")]
    pub upsample: UpsamplePolicy,
}

impl Default for UNetConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn upsampler<B: Backend>(
    channels: usize,
    device: &B::Device,
) -> ConvTranspose2d<B> {
    ConvTranspose2dConfig::new([channels, channels], [2, 2])
        .with_stride([2, 2])
        .init(device)
}

impl UNetConfig {
    /// Initialize a [`UNet`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> UNet<B> {
        let [w1, w2, w3, w4] = UNET_ENCODER_WIDTHS;

        let up = match self.upsample {
            UpsamplePolicy::PerStage => vec![
                upsampler(w4, device),
                upsampler(w3, device),
                upsampler(w2, device),
            ],
            UpsamplePolicy::Shared => vec![upsampler(w4, device)],
        };

        UNet {
            encoder1: DoubleConvConfig::new(1, w1).init(device),
            encoder2: DoubleConvConfig::new(w1, w2).init(device),
            encoder3: DoubleConvConfig::new(w2, w3).init(device),
            encoder4: DoubleConvConfig::new(w3, w4).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),

            up,

            decoder3: DoubleConvConfig::new(w4 + w3, w3).init(device),
            decoder2: DoubleConvConfig::new(w3 + w2, w2).init(device),
            decoder1: DoubleConvConfig::new(w2 + w1, w1).init(device),

            final_conv: Conv2dConfig::new([w1, 1], [1, 1]).init(device),
        }
    }
}

/// [`DoubleConv`] Config.
#[derive(Config, Debug)]
pub struct DoubleConvConfig {
    /// Input channels.
    pub in_channels: usize,
    /// Output channels of both convolutions.
    pub out_channels: usize,
}

impl DoubleConvConfig {
    /// Initialize a [`DoubleConv`].
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> DoubleConv<B> {
        let conv = |c_in, c_out| {
            Conv2dConfig::new([c_in, c_out], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device)
        };
        DoubleConv {
            conv1: conv(self.in_channels, self.out_channels),
            conv2: conv(self.out_channels, self.out_channels),
            relu: Relu::new(),
        }
    }
}

/// Two ``conv3x3(pad 1) -> relu`` layers; resolution preserving.
#[derive(Module, Debug)]
pub struct DoubleConv<B: Backend> {
    /// First conv.
    pub conv1: Conv2d<B>,
    /// Second conv.
    pub conv2: Conv2d<B>,
    /// Activation.
    pub relu: Relu,
}

impl<B: Backend> DoubleConv<B> {
    /// Number of input channels.
    pub fn in_channels(&self) -> usize {
        self.conv1.weight.dims()[1]
    }

    /// Forward pass.
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let x = self.relu.forward(self.conv1.forward(input));
        self.relu.forward(self.conv2.forward(x))
    }
}

/// `UNet` segmentation network.
#[derive(Module, Debug)]
pub struct UNet<B: Backend> {
    /// ``1 -> 64``.
    pub encoder1: DoubleConv<B>,
    /// ``64 -> 128``.
    pub encoder2: DoubleConv<B>,
    /// ``128 -> 256``.
    pub encoder3: DoubleConv<B>,
    /// ``256 -> 512``.
    pub encoder4: DoubleConv<B>,
    /// 2x2/2 max pool between encoders.
    pub pool: MaxPool2d,

    /// Upsamplers, deepest stage first; a single entry when shared.
    pub up: Vec<ConvTranspose2d<B>>,

    /// ``768 -> 256``.
    pub decoder3: DoubleConv<B>,
    /// ``384 -> 128``.
    pub decoder2: DoubleConv<B>,
    /// ``192 -> 64``.
    pub decoder1: DoubleConv<B>,

    /// 1x1 ``64 -> 1``.
    pub final_conv: Conv2d<B>,
}

impl<B: Backend> UNet<B> {
    /// The upsampler used by decoder stage `stage` (0 is the deepest).
    pub fn upsampler(
        &self,
        stage: usize,
    ) -> &ConvTranspose2d<B> {
        &self.up[stage.min(self.up.len() - 1)]
    }

    /// Pool `x` on the way into encoder `name`.
    fn try_pool(
        &self,
        name: &str,
        x: Tensor<B, 4>,
    ) -> crate::Result<Tensor<B, 4>> {
        expect_min_resolution(&format!("UNet.{name}"), &x.dims(), 2)?;
        Ok(self.pool.forward(x))
    }

    /// Upsample `x` and concatenate it with `skip` along channels.
    fn skip_connect(
        &self,
        name: &str,
        stage: usize,
        x: Tensor<B, 4>,
        skip: Tensor<B, 4>,
    ) -> crate::Result<Tensor<B, 4>> {
        let up = self.upsampler(stage);
        expect_channels(&format!("UNet.{name}.up"), &x.dims(), up.weight.dims()[0])?;

        let x = up.forward(x);
        expect_same_resolution(&format!("UNet.{name}.skip"), &x.dims(), &skip.dims())?;

        Ok(Tensor::cat(vec![x, skip], 1))
    }

    /// Forward pass.
    ///
    /// ``[batch, 1, height, width] -> [batch, 1, height, width]``
    ///
    /// # Panics
    ///
    /// On a shape mismatch; see [`Self::try_forward`].
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        self.try_forward(input)
            .unwrap_or_else(|err| panic!("UNet: {err}"))
    }

    /// Checked forward pass.
    ///
    /// Fails with [`crate::ZooError::ShapeMismatch`] naming the encoder whose
    /// input pool has nothing to pool (``UNet.encoder{k}``), or the skip
    /// connection (``UNet.decoder{k}.skip``) or upsampler (``UNet.decoder{k}.up``)
    /// whose contract is violated.
    pub fn try_forward(
        &self,
        input: Tensor<B, 4>,
    ) -> crate::Result<Tensor<B, 4>> {
        expect_channels("UNet.encoder1", &input.dims(), self.encoder1.in_channels())?;

        let enc1 = self.encoder1.forward(input);
        let enc2 = self.encoder2.forward(self.try_pool("encoder2", enc1.clone())?);
        let enc3 = self.encoder3.forward(self.try_pool("encoder3", enc2.clone())?);
        let enc4 = self.encoder4.forward(self.try_pool("encoder4", enc3.clone())?);

        let dec3 = self
            .decoder3
            .forward(self.skip_connect("decoder3", 0, enc4, enc3)?);
        let dec2 = self
            .decoder2
            .forward(self.skip_connect("decoder2", 1, dec3, enc2)?);
        let dec1 = self
            .decoder1
            .forward(self.skip_connect("decoder1", 2, dec2, enc1)?);

        Ok(self.final_conv.forward(dec1))
    }
}
