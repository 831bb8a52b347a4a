//! # Model Registry
//!
//! [`Architecture`] is the closed set of every model this crate builds;
//! [`ModelConfig`] selects one and [`ModelConfig::init`] builds it as a
//! [`ZooModel`].
//!
//! ```rust,ignore
//! let config: ModelConfig = ModelConfig::new("ResNet18".parse()?)
//!     .with_num_classes(5)
//!     .with_in_channels(1);
//! let model = config.init::<B>(&device)?;
//! ```

use crate::cache::disk::DiskCacheConfig;
use crate::errors::ZooError;
use crate::models::alexnet::{ALEX_CIFAR_CLASSES, AlexCifarNet, AlexCifarNetConfig};
use crate::models::backbone::BackboneConfig;
use crate::models::cnn::{Cnn, CnnConfig};
use crate::models::lenet::{LeNet, LeNetConfig};
use crate::models::resnet::{ResNet, generate_resnet};
use crate::models::unet::{UNet, UNetConfig, UpsamplePolicy};
use crate::models::vgg::{Vgg, generate_vgg};
use burn::config::Config;
use burn::module::Module;
use burn::prelude::{Backend, Tensor};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, VariantNames};

/// Every model name the zoo can build.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    VariantNames,
    Serialize,
    Deserialize,
)]
pub enum Architecture {
    /// [`AlexCifarNet`]; fixed 3 channels and 10 classes.
    AlexCifarNet,
    /// [`LeNet`].
    LeNet,
    /// [`Cnn`].
    #[strum(serialize = "CNN")]
    #[serde(rename = "CNN")]
    Cnn,
    /// [`UNet`]; fixed 1 channel in and out.
    UNet,

    /// `ResNet18` via [`generate_resnet`].
    ResNet18,
    /// `ResNet34` via [`generate_resnet`].
    ResNet34,
    /// `ResNet50` via [`generate_resnet`].
    ResNet50,
    /// `ResNet101` via [`generate_resnet`].
    ResNet101,
    /// `ResNet152` via [`generate_resnet`].
    ResNet152,

    /// `VGG11` via [`generate_vgg`].
    #[strum(serialize = "VGG11")]
    #[serde(rename = "VGG11")]
    Vgg11,
    /// `VGG11_bn` via [`generate_vgg`].
    #[strum(serialize = "VGG11_bn")]
    #[serde(rename = "VGG11_bn")]
    Vgg11Bn,
    /// `VGG13` via [`generate_vgg`].
    #[strum(serialize = "VGG13")]
    #[serde(rename = "VGG13")]
    Vgg13,
    /// `VGG13_bn` via [`generate_vgg`].
    #[strum(serialize = "VGG13_bn")]
    #[serde(rename = "VGG13_bn")]
    Vgg13Bn,
    /// `VGG16` via [`generate_vgg`].
    #[strum(serialize = "VGG16")]
    #[serde(rename = "VGG16")]
    Vgg16,
    /// `VGG16_bn` via [`generate_vgg`].
    #[strum(serialize = "VGG16_bn")]
    #[serde(rename = "VGG16_bn")]
    Vgg16Bn,
    /// `VGG19` via [`generate_vgg`].
    #[strum(serialize = "VGG19")]
    #[serde(rename = "VGG19")]
    Vgg19,
    /// `VGG19_bn` via [`generate_vgg`].
    #[strum(serialize = "VGG19_bn")]
    #[serde(rename = "VGG19_bn")]
    Vgg19Bn,
}

impl Architecture {
    /// Every architecture, in declaration order.
    pub fn all() -> impl Iterator<Item = Architecture> {
        <Self as IntoEnumIterator>::iter()
    }

    /// Parse a model name, failing with [`ZooError::UnknownModel`].
    pub fn try_from_name(name: &str) -> crate::Result<Self> {
        name.parse().map_err(|_| ZooError::UnknownModel {
            family: "zoo",
            name: name.to_string(),
            allowed: Self::VARIANTS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Is this a `ResNet` backbone?
    pub fn is_resnet(&self) -> bool {
        matches!(
            self,
            Self::ResNet18 | Self::ResNet34 | Self::ResNet50 | Self::ResNet101 | Self::ResNet152
        )
    }

    /// Is this a `VGG` backbone?
    pub fn is_vgg(&self) -> bool {
        matches!(
            self,
            Self::Vgg11
                | Self::Vgg11Bn
                | Self::Vgg13
                | Self::Vgg13Bn
                | Self::Vgg16
                | Self::Vgg16Bn
                | Self::Vgg19
                | Self::Vgg19Bn
        )
    }
}

/// Configuration record selecting and sizing one [`Architecture`].
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// The model to build.
    pub architecture: Architecture,

    /// Number of output classes.
    ///
    /// Ignored, with a warning, by the fixed-head models.
    #[config(default = 10)]
    pub num_classes: usize,

    /// Number of input channels.
    ///
    /// Ignored, with a warning, by the fixed-stem models.
    #[config(default = 1)]
    pub in_channels: usize,

    /// Start backbones from published ImageNet weights.
    #[config(default = true)]
    pub pretrained: bool,

    /// [`UNet`] upsampler allocation.
    #[config(default = "UpsamplePolicy::PerStage")]
    pub upsample: UpsamplePolicy,

    /// Where pretrained weights are cached.
    #[config(default = "DiskCacheConfig::new()")]
    pub cache: DiskCacheConfig,
}

impl ModelConfig {
    /// Check the class and channel counts.
    pub fn try_validate(&self) -> crate::Result<()> {
        if self.num_classes == 0 {
            return Err(ZooError::InvalidConfig(
                "num_classes must be at least 1".to_string(),
            ));
        }
        if self.in_channels == 0 {
            return Err(ZooError::InvalidConfig(
                "in_channels must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The [`BackboneConfig`] for a `ResNet` or `VGG` architecture.
    pub fn backbone_config(&self) -> BackboneConfig {
        BackboneConfig::new(self.architecture.to_string())
            .with_num_classes(self.num_classes)
            .with_in_channels(self.in_channels)
            .with_pretrained(self.pretrained)
            .with_cache(self.cache.clone())
    }

    fn warn_fixed(
        &self,
        classes: Option<usize>,
        channels: usize,
    ) {
        if let Some(classes) = classes.filter(|&c| c != self.num_classes) {
            log::warn!(
                "{} has a fixed {classes} class head; ignoring num_classes = {}",
                self.architecture,
                self.num_classes
            );
        }
        if channels != self.in_channels {
            log::warn!(
                "{} has a fixed {channels} channel input; ignoring in_channels = {}",
                self.architecture,
                self.in_channels
            );
        }
    }

    /// Build the configured model.
    pub fn init<B: Backend>(
        &self,
        device: &B::Device,
    ) -> crate::Result<ZooModel<B>> {
        self.try_validate()?;
        log::debug!("initializing {}", self.architecture);

        let model = match self.architecture {
            Architecture::AlexCifarNet => {
                self.warn_fixed(Some(ALEX_CIFAR_CLASSES), AlexCifarNet::<B>::IN_CHANNELS);
                ZooModel::AlexCifarNet(AlexCifarNetConfig::new().init(device))
            }
            Architecture::LeNet => ZooModel::LeNet(
                LeNetConfig::new()
                    .with_num_classes(self.num_classes)
                    .with_in_channels(self.in_channels)
                    .init(device),
            ),
            Architecture::Cnn => ZooModel::Cnn(
                CnnConfig::new()
                    .with_num_classes(self.num_classes)
                    .with_in_channels(self.in_channels)
                    .init(device),
            ),
            Architecture::UNet => {
                self.warn_fixed(None, 1);
                ZooModel::UNet(
                    UNetConfig::new()
                        .with_upsample(self.upsample.clone())
                        .init(device),
                )
            }
            arch if arch.is_resnet() => {
                ZooModel::ResNet(generate_resnet(&self.backbone_config(), device)?)
            }
            _ => ZooModel::Vgg(generate_vgg(&self.backbone_config(), device)?),
        };
        Ok(model)
    }
}

/// Output of a [`ZooModel`] forward pass.
#[derive(Debug, Clone)]
pub enum ZooOutput<B: Backend> {
    /// ``[batch, num_classes]`` classifier output.
    Logits(Tensor<B, 2>),
    /// ``[batch, channels, height, width]`` segmentation output.
    Map(Tensor<B, 4>),
}

impl<B: Backend> ZooOutput<B> {
    /// The output shape.
    pub fn dims(&self) -> Vec<usize> {
        match self {
            Self::Logits(t) => t.dims().to_vec(),
            Self::Map(t) => t.dims().to_vec(),
        }
    }

    /// The classifier output, if any.
    pub fn into_logits(self) -> Option<Tensor<B, 2>> {
        match self {
            Self::Logits(t) => Some(t),
            Self::Map(_) => None,
        }
    }

    /// The segmentation output, if any.
    pub fn into_map(self) -> Option<Tensor<B, 4>> {
        match self {
            Self::Map(t) => Some(t),
            Self::Logits(_) => None,
        }
    }
}

/// Any zoo model.
#[derive(Module, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum ZooModel<B: Backend> {
    /// [`AlexCifarNet`].
    AlexCifarNet(AlexCifarNet<B>),
    /// [`LeNet`].
    LeNet(LeNet<B>),
    /// [`Cnn`].
    Cnn(Cnn<B>),
    /// [`ResNet`].
    ResNet(ResNet<B>),
    /// [`Vgg`].
    Vgg(Vgg<B>),
    /// [`UNet`].
    UNet(UNet<B>),
}

impl<B: Backend> ZooModel<B> {
    /// Forward pass.
    ///
    /// # Panics
    ///
    /// On a shape mismatch; see [`Self::try_forward`].
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
    ) -> ZooOutput<B> {
        match self {
            Self::AlexCifarNet(m) => ZooOutput::Logits(m.forward(input)),
            Self::LeNet(m) => ZooOutput::Logits(m.forward(input)),
            Self::Cnn(m) => ZooOutput::Logits(m.forward(input)),
            Self::ResNet(m) => ZooOutput::Logits(m.forward(input)),
            Self::Vgg(m) => ZooOutput::Logits(m.forward(input)),
            Self::UNet(m) => ZooOutput::Map(m.forward(input)),
        }
    }

    /// Checked forward pass.
    pub fn try_forward(
        &self,
        input: Tensor<B, 4>,
    ) -> crate::Result<ZooOutput<B>> {
        Ok(match self {
            Self::AlexCifarNet(m) => ZooOutput::Logits(m.try_forward(input)?),
            Self::LeNet(m) => ZooOutput::Logits(m.try_forward(input)?),
            Self::Cnn(m) => ZooOutput::Logits(m.try_forward(input)?),
            Self::ResNet(m) => ZooOutput::Logits(m.try_forward(input)?),
            Self::Vgg(m) => ZooOutput::Logits(m.try_forward(input)?),
            Self::UNet(m) => ZooOutput::Map(m.try_forward(input)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::summary::ModelSummary;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray<f32>;

    #[test]
    fn test_architecture_names() {
        for arch in Architecture::all() {
            let name = arch.to_string();
            assert_eq!(Architecture::try_from_name(&name).unwrap(), arch);
        }
        assert_eq!(Architecture::VARIANTS.len(), 17);
        assert_eq!(Architecture::Cnn.to_string(), "CNN");
        assert_eq!(Architecture::Vgg16Bn.to_string(), "VGG16_bn");

        assert_eq!(Architecture::all().filter(Architecture::is_resnet).count(), 5);
        assert_eq!(Architecture::all().filter(Architecture::is_vgg).count(), 8);

        let err = Architecture::try_from_name("vgg11").unwrap_err();
        assert!(matches!(err, ZooError::UnknownModel { family: "zoo", .. }));
    }

    #[test]
    fn test_architecture_serde() {
        let json = serde_json::to_string(&Architecture::Vgg11Bn).unwrap();
        assert_eq!(json, "\"VGG11_bn\"");
        let arch: Architecture = serde_json::from_str("\"ResNet50\"").unwrap();
        assert_eq!(arch, Architecture::ResNet50);
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let config = ModelConfig::new(Architecture::Cnn)
            .with_num_classes(3)
            .with_upsample(UpsamplePolicy::Shared);
        config.save(&path).unwrap();

        let loaded = ModelConfig::load(&path).unwrap();
        assert_eq!(loaded.architecture, Architecture::Cnn);
        assert_eq!(loaded.num_classes, 3);
        assert_eq!(loaded.in_channels, 1);
        assert!(matches!(loaded.upsample, UpsamplePolicy::Shared));
    }

    #[test]
    fn test_invalid_config() {
        let device = Default::default();
        let err = ModelConfig::new(Architecture::LeNet)
            .with_num_classes(0)
            .init::<B>(&device)
            .unwrap_err();
        assert!(matches!(err, ZooError::InvalidConfig(_)));

        let err = ModelConfig::new(Architecture::ResNet18)
            .with_in_channels(0)
            .init::<B>(&device)
            .unwrap_err();
        assert!(matches!(err, ZooError::InvalidConfig(_)));
    }

    #[test]
    fn test_fixed_topology_models() {
        let device = Default::default();

        let cases = [
            (Architecture::AlexCifarNet, [2, 3, 32, 32], vec![2, 10]),
            (Architecture::LeNet, [2, 1, 28, 28], vec![2, 4]),
            (Architecture::Cnn, [2, 1, 32, 32], vec![2, 4]),
        ];
        for (arch, input_shape, expected) in cases {
            let model = ModelConfig::new(arch)
                .with_num_classes(4)
                .init::<B>(&device)
                .unwrap();
            let input = Tensor::random(input_shape, Distribution::Default, &device);
            let output = model.try_forward(input).unwrap();
            assert_eq!(output.dims(), expected, "{arch}");
            assert!(output.into_logits().is_some());
        }
    }

    #[test]
    fn test_unet_output_is_map() {
        let device = Default::default();
        let model = ModelConfig::new(Architecture::UNet).init::<B>(&device).unwrap();
        assert!(matches!(model, ZooModel::UNet(_)));

        let output = model.forward(Tensor::zeros([1, 1, 16, 16], &device));
        assert_eq!(output.dims(), vec![1, 1, 16, 16]);
        assert!(output.into_map().is_some());
    }

    #[test]
    fn test_resnet_from_registry() {
        let device = Default::default();
        let config = ModelConfig::new(Architecture::ResNet18)
            .with_num_classes(5)
            .with_pretrained(false);

        let a = config.init::<B>(&device).unwrap();
        let b = config.init::<B>(&device).unwrap();
        assert_eq!(
            ModelSummary::of::<B, _>("a", &a).num_params,
            ModelSummary::of::<B, _>("b", &b).num_params
        );

        let output = a.forward(Tensor::random([1, 1, 28, 28], Distribution::Default, &device));
        assert_eq!(output.dims(), vec![1, 5]);
    }
}
