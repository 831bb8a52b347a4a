//! # Well-Known `ResNet` Configs and Weights

use crate::cache::prefabs::{StaticPreFabConfig, StaticPreFabMap};
use crate::cache::weights::{StaticPretrainedWeightsDescriptor, StaticPretrainedWeightsMap};
use crate::models::resnet::resnet_model::ResNetConfig;
use crate::models::resnet::{
    RESNET18_BLOCKS, RESNET34_BLOCKS, RESNET50_BLOCKS, RESNET101_BLOCKS, RESNET152_BLOCKS,
};

/// Pretrained [`super::ResNet`] configs and weights.
///
/// Every config is the 3 channel, 1000 class ImageNet layout.
pub static PREFAB_RESNET_MAP: StaticPreFabMap<ResNetConfig> = StaticPreFabMap {
    name: "ResNet",
    description: "Well-Known ResNet configs",

    items: &[
        &StaticPreFabConfig {
            name: "ResNet18",
            description: "ResNet-18 [2, 2, 2, 2] BasicBlocks",
            builder: || ResNetConfig::new(RESNET18_BLOCKS),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "ResNet-18 pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/resnet18-f37072fd.pth"],
                }],
            }),
        },
        &StaticPreFabConfig {
            name: "ResNet34",
            description: "ResNet-34 [3, 4, 6, 3] BasicBlocks",
            builder: || ResNetConfig::new(RESNET34_BLOCKS),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "ResNet-34 pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/resnet34-b627a593.pth"],
                }],
            }),
        },
        &StaticPreFabConfig {
            name: "ResNet50",
            description: "ResNet-50 [3, 4, 6, 3] Bottleneck",
            builder: || ResNetConfig::new(RESNET50_BLOCKS).with_bottleneck(true),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[
                    &StaticPretrainedWeightsDescriptor {
                        name: "tv_in1k",
                        description: "ResNet-50 pretrained on ImageNet",
                        license: Some("bsd-3-clause"),
                        origin: Some("https://github.com/pytorch/vision"),
                        urls: &["https://download.pytorch.org/models/resnet50-0676ba61.pth"],
                    },
                    &StaticPretrainedWeightsDescriptor {
                        name: "tv2_in1k",
                        description: "ResNet-50 pretrained on ImageNet, improved recipe",
                        license: Some("bsd-3-clause"),
                        origin: Some("https://github.com/pytorch/vision"),
                        urls: &["https://download.pytorch.org/models/resnet50-11ad3fa6.pth"],
                    },
                ],
            }),
        },
        &StaticPreFabConfig {
            name: "ResNet101",
            description: "ResNet-101 [3, 4, 23, 3] Bottleneck",
            builder: || ResNetConfig::new(RESNET101_BLOCKS).with_bottleneck(true),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "ResNet-101 pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/resnet101-63fe2227.pth"],
                }],
            }),
        },
        &StaticPreFabConfig {
            name: "ResNet152",
            description: "ResNet-152 [3, 8, 36, 3] Bottleneck",
            builder: || ResNetConfig::new(RESNET152_BLOCKS).with_bottleneck(true),

            weights: Some(&StaticPretrainedWeightsMap {
                items: &[&StaticPretrainedWeightsDescriptor {
                    name: "tv_in1k",
                    description: "ResNet-152 pretrained on ImageNet",
                    license: Some("bsd-3-clause"),
                    origin: Some("https://github.com/pytorch/vision"),
                    urls: &["https://download.pytorch.org/models/resnet152-394f9c45.pth"],
                }],
            }),
        },
    ],
};
