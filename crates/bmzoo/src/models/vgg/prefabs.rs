//! # Well-Known `VGG` Configs and Weights

use crate::cache::prefabs::{StaticPreFabConfig, StaticPreFabMap};
use crate::cache::weights::{StaticPretrainedWeightsDescriptor, StaticPretrainedWeightsMap};
use crate::models::vgg::vgg_model::VggConfig;
use crate::models::vgg::{VGG11_STAGES, VGG13_STAGES, VGG16_STAGES, VGG19_STAGES};

/// Pretrained [`super::Vgg`] configs and weights.
///
/// Every config is the 3 channel, 1000 class ImageNet layout.
pub static PREFAB_VGG_MAP: StaticPreFabMap<VggConfig> = StaticPreFabMap {
    name: "VGG",
    description: "Well-Known VGG configs",

    items: &[
        &StaticPreFabConfig {
            name: "VGG11",
            description: "VGG-11 (configuration A)",
            builder: || VggConfig::from_stages(VGG11_STAGES),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "VGG-11 (configuration A) pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/vgg11-8a719046.pth"],
                }],
            }),
        },
        &StaticPreFabConfig {
            name: "VGG11_bn",
            description: "VGG-11 (configuration A) with batch norm",
            builder: || VggConfig::from_stages(VGG11_STAGES).with_batch_norm(true),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "VGG-11 (configuration A) with batch norm pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/vgg11_bn-6002323d.pth"],
                }],
            }),
        },
        &StaticPreFabConfig {
            name: "VGG13",
            description: "VGG-13 (configuration B)",
            builder: || VggConfig::from_stages(VGG13_STAGES),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "VGG-13 (configuration B) pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/vgg13-19584684.pth"],
                }],
            }),
        },
        &StaticPreFabConfig {
            name: "VGG13_bn",
            description: "VGG-13 (configuration B) with batch norm",
            builder: || VggConfig::from_stages(VGG13_STAGES).with_batch_norm(true),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "VGG-13 (configuration B) with batch norm pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/vgg13_bn-abd245e5.pth"],
                }],
            }),
        },
        &StaticPreFabConfig {
            name: "VGG16",
            description: "VGG-16 (configuration D)",
            builder: || VggConfig::from_stages(VGG16_STAGES),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "VGG-16 (configuration D) pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/vgg16-397923af.pth"],
                }],
            }),
        },
        &StaticPreFabConfig {
            name: "VGG16_bn",
            description: "VGG-16 (configuration D) with batch norm",
            builder: || VggConfig::from_stages(VGG16_STAGES).with_batch_norm(true),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "VGG-16 (configuration D) with batch norm pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/vgg16_bn-6c64b313.pth"],
                }],
            }),
        },
        &StaticPreFabConfig {
            name: "VGG19",
            description: "VGG-19 (configuration E)",
            builder: || VggConfig::from_stages(VGG19_STAGES),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "VGG-19 (configuration E) pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/vgg19-dcbb9e9d.pth"],
                }],
            }),
        },
        &StaticPreFabConfig {
            name: "VGG19_bn",
            description: "VGG-19 (configuration E) with batch norm",
            builder: || VggConfig::from_stages(VGG19_STAGES).with_batch_norm(true),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "VGG-19 (configuration E) with batch norm pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/vgg19_bn-c79401a0.pth"],
                }],
            }),
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(
            PREFAB_VGG_MAP.names(),
            vec![
                "VGG11", "VGG11_bn", "VGG13", "VGG13_bn", "VGG16", "VGG16_bn", "VGG19",
                "VGG19_bn"
            ]
        );
    }

    #[test]
    fn test_builders() {
        let conv_counts = [8, 8, 10, 10, 13, 13, 16, 16];
        for (prefab, convs) in PREFAB_VGG_MAP.items.iter().zip(conv_counts) {
            let config = (prefab.builder)();
            assert!(config.try_validate().is_ok(), "{}", prefab.name);
            assert_eq!(config.stages.iter().map(Vec::len).sum::<usize>(), convs, "{}", prefab.name);
            assert_eq!(config.batch_norm, prefab.name.ends_with("_bn"));
            assert_eq!(config.feature_width(), 25_088);
        }
    }
}
