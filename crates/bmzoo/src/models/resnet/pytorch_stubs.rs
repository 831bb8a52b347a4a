#![allow(missing_docs, dead_code)]
//! # `ResNet` PyTorch Weight Stubs
//!
//! Stub modules mirroring the torchvision `ResNet` state dict layout.
//! Weights are loaded into the stub records with `burn-import`, and then
//! copied onto a [`ResNet`]; the stateless modules (activations, pools)
//! have no counterpart in the state dict.

use crate::errors::ZooError;
use crate::layers::blocks::conv_norm::Conv2dNormBlock;
use crate::models::resnet::basic_block::BasicBlock;
use crate::models::resnet::bottleneck::BottleneckBlock;
use crate::models::resnet::downsample::ConvDownsample;
use crate::models::resnet::layer_block::LayerBlock;
use crate::models::resnet::residual_block::ResidualBlock;
use crate::models::resnet::resnet_model::ResNet;
use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dRecord};
use burn::nn::{BatchNorm, BatchNormRecord, Linear};
use burn::prelude::Backend;
use burn::record::{FullPrecisionSettings, Recorder};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use std::path::{Path, PathBuf};

/// Load weights from a ``torch`` weights path onto a [`ResNet`] model.
pub fn load_pytorch_weights<B: Backend>(
    resnet: ResNet<B>,
    path: &Path,
) -> crate::Result<ResNet<B>> {
    let device = resnet.stem.conv.weight.device();
    let record = load_resnet_stub_record::<B>(path, &device)?;
    record
        .copy_weights(resnet)
        .map_err(|message| ZooError::WeightsLoad {
            path: path.to_path_buf(),
            message,
        })
}

/// Load a [`ResNetStubRecord`] from a ``torch`` weights path.
pub fn load_resnet_stub_record<B: Backend>(
    path: &Path,
    device: &B::Device,
) -> crate::Result<ResNetStubRecord<B>> {
    let load_args = LoadArgs::new(PathBuf::from(path))
        .with_key_remap(
            r"^(layer[1-4]\.[0-9]+)\.downsample\.0\.(.+)$",
            "$1.downsample.conv.$2",
        )
        .with_key_remap(
            r"^(layer[1-4]\.[0-9]+)\.downsample\.1\.(.+)$",
            "$1.downsample.bn.$2",
        );

    PyTorchFileRecorder::<FullPrecisionSettings>::new()
        .load(load_args, device)
        .map_err(|err| ZooError::WeightsLoad {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

type CopyResult<T> = std::result::Result<T, String>;

#[derive(Module, Debug)]
pub struct ResNetStub<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1: BatchNorm<B, 2>,
    pub layer1: Vec<BlockStub<B>>,
    pub layer2: Vec<BlockStub<B>>,
    pub layer3: Vec<BlockStub<B>>,
    pub layer4: Vec<BlockStub<B>>,
    pub fc: Linear<B>,
}

impl<B: Backend> ResNetStubRecord<B> {
    pub fn copy_weights(
        self,
        target: ResNet<B>,
    ) -> CopyResult<ResNet<B>> {
        Ok(ResNet {
            stem: copy_conv_norm_weights(self.conv1, self.bn1, target.stem),
            layer1: copy_layer_weights("layer1", self.layer1, target.layer1)?,
            layer2: copy_layer_weights("layer2", self.layer2, target.layer2)?,
            layer3: copy_layer_weights("layer3", self.layer3, target.layer3)?,
            layer4: copy_layer_weights("layer4", self.layer4, target.layer4)?,
            fc: target.fc.load_record(self.fc),
            ..target
        })
    }
}

fn copy_layer_weights<B: Backend>(
    name: &str,
    stubs: Vec<BlockStubRecord<B>>,
    target: LayerBlock<B>,
) -> CopyResult<LayerBlock<B>> {
    if stubs.len() != target.blocks.len() {
        return Err(format!(
            "{name}: {} blocks in weights, {} in model",
            stubs.len(),
            target.blocks.len()
        ));
    }
    let blocks = stubs
        .into_iter()
        .zip(target.blocks)
        .enumerate()
        .map(|(idx, (stub, block))| stub.copy_weights(block).map_err(|e| format!("{name}.{idx}: {e}")))
        .collect::<CopyResult<Vec<_>>>()?;

    Ok(LayerBlock { blocks })
}

/// Union of the basic and bottleneck block state dicts.
#[derive(Module, Debug)]
pub struct BlockStub<B: Backend> {
    pub conv1: Conv2d<B>,
    pub bn1: BatchNorm<B, 2>,
    pub conv2: Conv2d<B>,
    pub bn2: BatchNorm<B, 2>,
    pub conv3: Option<Conv2d<B>>,
    pub bn3: Option<BatchNorm<B, 2>>,
    pub downsample: Option<DownsampleStub<B>>,
}

impl<B: Backend> BlockStubRecord<B> {
    pub fn copy_weights(
        self,
        target: ResidualBlock<B>,
    ) -> CopyResult<ResidualBlock<B>> {
        match (target, self.conv3, self.bn3) {
            (ResidualBlock::Basic(block), None, None) => Ok(ResidualBlock::Basic(BasicBlock {
                conv_norm1: copy_conv_norm_weights(self.conv1, self.bn1, block.conv_norm1),
                conv_norm2: copy_conv_norm_weights(self.conv2, self.bn2, block.conv_norm2),
                downsample: copy_downsample_weights(self.downsample, block.downsample)?,
                ..block
            })),
            (ResidualBlock::Bottleneck(block), Some(conv3), Some(bn3)) => {
                Ok(ResidualBlock::Bottleneck(BottleneckBlock {
                    conv_norm1: copy_conv_norm_weights(self.conv1, self.bn1, block.conv_norm1),
                    conv_norm2: copy_conv_norm_weights(self.conv2, self.bn2, block.conv_norm2),
                    conv_norm3: copy_conv_norm_weights(conv3, bn3, block.conv_norm3),
                    downsample: copy_downsample_weights(self.downsample, block.downsample)?,
                    ..block
                }))
            }
            (ResidualBlock::Basic(_), _, _) => {
                Err("bottleneck weights cannot be applied to a basic block".to_string())
            }
            (ResidualBlock::Bottleneck(_), _, _) => {
                Err("basic block weights cannot be applied to a bottleneck block".to_string())
            }
        }
    }
}

#[derive(Module, Debug)]
pub struct DownsampleStub<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: BatchNorm<B, 2>,
}

pub fn copy_downsample_weights<B: Backend>(
    downsample: Option<DownsampleStubRecord<B>>,
    target: Option<ConvDownsample<B>>,
) -> CopyResult<Option<ConvDownsample<B>>> {
    match (downsample, target) {
        (Some(stub), Some(target)) => Ok(Some(ConvDownsample {
            conv_norm: copy_conv_norm_weights(stub.conv, stub.bn, target.conv_norm),
        })),
        (None, None) => Ok(None),
        (None, Some(_)) => Err("model has a downsample the weights lack".to_string()),
        (Some(_), None) => Err("weights have a downsample the model lacks".to_string()),
    }
}

pub fn copy_conv_norm_weights<B: Backend>(
    conv: Conv2dRecord<B>,
    bn: BatchNormRecord<B, 2>,
    target: Conv2dNormBlock<B>,
) -> Conv2dNormBlock<B> {
    Conv2dNormBlock {
        conv: target.conv.load_record(conv),
        norm: target.norm.load_record(bn),
    }
}
