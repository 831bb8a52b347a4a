#![allow(missing_docs, dead_code)]
//! # `VGG` PyTorch Weight Stubs
//!
//! torchvision stores the `VGG` feature stack as one flat ``nn.Sequential``,
//! where the index of each conv depends on the variant. The key remaps are
//! derived from the [`VggConfig`], flattening ``features.{i}`` onto
//! ``convs.{k}.conv`` / ``convs.{k}.bn``.

use crate::errors::ZooError;
use crate::models::vgg::vgg_model::{Vgg, VggConfig, VggConv, VggStage};
use burn::module::Module;
use burn::nn::conv::Conv2d;
use burn::nn::{BatchNorm, Linear};
use burn::prelude::Backend;
use burn::record::{FullPrecisionSettings, Recorder};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};
use std::path::{Path, PathBuf};

/// Load weights from a ``torch`` weights path onto a [`Vgg`] model built from `config`.
pub fn load_pytorch_weights<B: Backend>(
    vgg: Vgg<B>,
    config: &VggConfig,
    path: &Path,
) -> crate::Result<Vgg<B>> {
    let device = vgg.fc1.weight.device();
    let record = load_vgg_stub_record::<B>(config, path, &device)?;
    record
        .copy_weights(vgg)
        .map_err(|message| ZooError::WeightsLoad {
            path: path.to_path_buf(),
            message,
        })
}

/// The torchvision ``features.{i}`` index of each conv, and of its batch norm.
pub fn feature_indices(config: &VggConfig) -> Vec<(usize, Option<usize>)> {
    let mut indices = Vec::new();
    let mut idx = 0;
    for stage in &config.stages {
        for _ in stage {
            if config.batch_norm {
                indices.push((idx, Some(idx + 1)));
                // conv, bn, relu
                idx += 3;
            } else {
                indices.push((idx, None));
                // conv, relu
                idx += 2;
            }
        }
        // pool
        idx += 1;
    }
    indices
}

/// Key remaps from the torchvision state dict onto [`VggStub`].
pub fn key_remaps(config: &VggConfig) -> Vec<(String, String)> {
    let mut remaps = Vec::new();
    for (k, (conv, bn)) in feature_indices(config).into_iter().enumerate() {
        remaps.push((
            format!(r"^features\.{conv}\.(.+)$"),
            format!("convs.{k}.conv.$1"),
        ));
        if let Some(bn) = bn {
            remaps.push((format!(r"^features\.{bn}\.(.+)$"), format!("convs.{k}.bn.$1")));
        }
    }
    for (idx, fc) in [(0, "fc1"), (3, "fc2"), (6, "fc3")] {
        remaps.push((format!(r"^classifier\.{idx}\.(.+)$"), format!("{fc}.$1")));
    }
    remaps
}

/// Load a [`VggStubRecord`] from a ``torch`` weights path.
pub fn load_vgg_stub_record<B: Backend>(
    config: &VggConfig,
    path: &Path,
    device: &B::Device,
) -> crate::Result<VggStubRecord<B>> {
    let load_args = key_remaps(config)
        .into_iter()
        .fold(LoadArgs::new(PathBuf::from(path)), |args, (pattern, replacement)| {
            args.with_key_remap(&pattern, &replacement)
        });

    PyTorchFileRecorder::<FullPrecisionSettings>::new()
        .load(load_args, device)
        .map_err(|err| ZooError::WeightsLoad {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

type CopyResult<T> = std::result::Result<T, String>;

#[derive(Module, Debug)]
pub struct VggStub<B: Backend> {
    pub convs: Vec<VggConvStub<B>>,
    pub fc1: Linear<B>,
    pub fc2: Linear<B>,
    pub fc3: Linear<B>,
}

#[derive(Module, Debug)]
pub struct VggConvStub<B: Backend> {
    pub conv: Conv2d<B>,
    pub bn: Option<BatchNorm<B, 2>>,
}

impl<B: Backend> VggStubRecord<B> {
    pub fn copy_weights(
        self,
        target: Vgg<B>,
    ) -> CopyResult<Vgg<B>> {
        let expected = target.convs().count();
        if self.convs.len() != expected {
            return Err(format!(
                "{} convs in weights, {} in model",
                self.convs.len(),
                expected
            ));
        }

        let mut stubs = self.convs.into_iter().enumerate();
        let stages = target
            .stages
            .into_iter()
            .map(|stage| -> CopyResult<VggStage<B>> {
                let convs = stage
                    .convs
                    .into_iter()
                    .zip(stubs.by_ref())
                    .map(|(conv, (k, stub))| {
                        stub.copy_weights(conv).map_err(|e| format!("convs.{k}: {e}"))
                    })
                    .collect::<CopyResult<Vec<_>>>()?;
                Ok(VggStage { convs, ..stage })
            })
            .collect::<CopyResult<Vec<_>>>()?;

        Ok(Vgg {
            stages,
            fc1: target.fc1.load_record(self.fc1),
            fc2: target.fc2.load_record(self.fc2),
            fc3: target.fc3.load_record(self.fc3),
            ..target
        })
    }
}

impl<B: Backend> VggConvStubRecord<B> {
    pub fn copy_weights(
        self,
        target: VggConv<B>,
    ) -> CopyResult<VggConv<B>> {
        let norm = match (self.bn, target.norm) {
            (Some(bn), Some(norm)) => Some(norm.load_record(bn)),
            (None, None) => None,
            (None, Some(_)) => return Err("model has a batch norm the weights lack".to_string()),
            (Some(_), None) => return Err("weights have a batch norm the model lacks".to_string()),
        };
        Ok(VggConv {
            conv: target.conv.load_record(self.conv),
            norm,
            relu: target.relu,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::vgg::VGG11_STAGES;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    #[test]
    fn test_feature_indices() {
        let config = VggConfig::from_stages(VGG11_STAGES);
        let convs: Vec<usize> = feature_indices(&config).iter().map(|(c, _)| *c).collect();
        assert_eq!(convs, vec![0, 3, 6, 8, 11, 13, 16, 18]);

        let config = config.with_batch_norm(true);
        let indices = feature_indices(&config);
        let convs: Vec<usize> = indices.iter().map(|(c, _)| *c).collect();
        assert_eq!(convs, vec![0, 4, 8, 11, 15, 18, 22, 25]);
        assert_eq!(indices[1], (4, Some(5)));
    }

    #[test]
    fn test_key_remaps() {
        let config = VggConfig::new(vec![vec![8], vec![16]]).with_batch_norm(true);
        let remaps = key_remaps(&config);
        assert_eq!(
            remaps,
            vec![
                (r"^features\.0\.(.+)$".to_string(), "convs.0.conv.$1".to_string()),
                (r"^features\.1\.(.+)$".to_string(), "convs.0.bn.$1".to_string()),
                (r"^features\.4\.(.+)$".to_string(), "convs.1.conv.$1".to_string()),
                (r"^features\.5\.(.+)$".to_string(), "convs.1.bn.$1".to_string()),
                (r"^classifier\.0\.(.+)$".to_string(), "fc1.$1".to_string()),
                (r"^classifier\.3\.(.+)$".to_string(), "fc2.$1".to_string()),
                (r"^classifier\.6\.(.+)$".to_string(), "fc3.$1".to_string()),
            ]
        );
    }

    fn stub_of(source: &Vgg<B>) -> VggStubRecord<B> {
        VggStubRecord {
            convs: source
                .convs()
                .map(|c| VggConvStubRecord {
                    conv: c.conv.clone().into_record(),
                    bn: c.norm.clone().map(|n| n.into_record()),
                })
                .collect(),
            fc1: source.fc1.clone().into_record(),
            fc2: source.fc2.clone().into_record(),
            fc3: source.fc3.clone().into_record(),
        }
    }

    #[test]
    fn test_copy_weights() {
        let device = Default::default();
        let config = VggConfig::new(vec![vec![4], vec![8, 8]])
            .with_batch_norm(true)
            .with_pooled(1)
            .with_hidden(8);
        let source: Vgg<B> = config.init(&device);
        let target: Vgg<B> = config.init(&device);

        let loaded = stub_of(&source).copy_weights(target).unwrap();
        loaded.stages[1].convs[1]
            .conv
            .weight
            .val()
            .into_data()
            .assert_eq(&source.stages[1].convs[1].conv.weight.val().into_data(), true);
    }

    #[test]
    fn test_copy_weights_mismatch() {
        let device = Default::default();
        let config = VggConfig::new(vec![vec![4], vec![8]])
            .with_pooled(1)
            .with_hidden(8);
        let source: Vgg<B> = config.init(&device);

        let deeper: Vgg<B> = VggConfig::new(vec![vec![4], vec![8, 8]])
            .with_pooled(1)
            .with_hidden(8)
            .init(&device);
        let err = stub_of(&source).copy_weights(deeper).unwrap_err();
        assert_eq!(err, "2 convs in weights, 3 in model");

        let normed: Vgg<B> = config.clone().with_batch_norm(true).init(&device);
        let err = stub_of(&source).copy_weights(normed).unwrap_err();
        assert_eq!(err, "convs.0: model has a batch norm the weights lack");
    }
}
