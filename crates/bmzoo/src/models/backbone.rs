//! # Backbone Selection
//!
//! [`BackboneConfig`] is the shared input of [`super::resnet::generate_resnet`]
//! and [`super::vgg::generate_vgg`]: a named backbone, plus the stem and head
//! patches to apply to it.

use crate::cache::disk::DiskCacheConfig;
use crate::cache::prefabs::StaticPreFabConfig;
use crate::errors::ZooError;
use burn::config::Config;
use std::fmt::Debug;
use std::path::PathBuf;

/// Configuration for a named, optionally pretrained, backbone.
#[derive(Config, Debug)]
pub struct BackboneConfig {
    /// The backbone name, e.g. ``"ResNet18"`` or ``"VGG16_bn"``.
    pub model_name: String,

    /// Number of output classes of the replacement head.
    #[config(default = 10)]
    pub num_classes: usize,

    /// Number of input channels of the (possibly replaced) stem.
    #[config(default = 1)]
    pub in_channels: usize,

    /// Start from published ImageNet weights.
    #[config(default = true)]
    pub pretrained: bool,

    /// Name of the pretrained weight set; the first published set when `None`.
    #[config(default = "None")]
    pub weights: Option<String>,

    /// Where pretrained weights are cached.
    #[config(default = "DiskCacheConfig::new()")]
    pub cache: DiskCacheConfig,
}

impl BackboneConfig {
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

    /// Resolve and fetch the pretrained weights for `prefab`.
    ///
    /// # Returns
    ///
    /// `None` when `pretrained` is off; otherwise the cached weights path.
    pub fn fetch_pretrained<C>(
        &self,
        prefab: &StaticPreFabConfig<C>,
    ) -> crate::Result<Option<PathBuf>>
    where
        C: 'static + Config + Debug + Clone,
    {
        if !self.pretrained {
            return Ok(None);
        }

        let weights = prefab.weights.ok_or_else(|| {
            ZooError::InvalidConfig(format!("{} has no pretrained weights", prefab.name))
        })?;

        let name = match &self.weights {
            Some(name) => name.as_str(),
            None => match weights.items.first() {
                Some(descriptor) => descriptor.name,
                None => {
                    return Err(ZooError::InvalidConfig(format!(
                        "{} has no pretrained weights",
                        prefab.name
                    )));
                }
            },
        };

        let descriptor = weights.to_directory().try_lookup_by_name(name)?;
        log::info!("{}: using pretrained weights {:?}", prefab.name, descriptor.name);

        descriptor
            .fetch_weights_to_disk_cache(&self.cache)
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::weights::{
        StaticPretrainedWeightsDescriptor, StaticPretrainedWeightsMap,
        pretrained_weights_resource_key,
    };

    #[derive(Config, Debug)]
    struct DepthConfig {
        depth: usize,
    }

    static WITH_WEIGHTS: StaticPreFabConfig<DepthConfig> = StaticPreFabConfig {
        name: "Deep",
        description: "a deep config",
        builder: || DepthConfig::new(8),
        weights: Some(&StaticPretrainedWeightsMap {
            items: &[&StaticPretrainedWeightsDescriptor {
                name: "tv_in1k",
                description: "test weights",
                license: None,
                origin: None,
                urls: &["https://example.com/deep-0000.pth"],
            }],
        }),
    };

    static WITHOUT_WEIGHTS: StaticPreFabConfig<DepthConfig> = StaticPreFabConfig {
        name: "Shallow",
        description: "a shallow config",
        builder: || DepthConfig::new(1),
        weights: None,
    };

    #[test]
    fn test_defaults() {
        let config = BackboneConfig::new("ResNet18".to_string());
        assert_eq!(config.num_classes, 10);
        assert_eq!(config.in_channels, 1);
        assert!(config.pretrained);
        assert!(config.weights.is_none());
        assert!(config.try_validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let err = BackboneConfig::new("ResNet18".to_string())
            .with_num_classes(0)
            .try_validate()
            .unwrap_err();
        assert!(matches!(err, ZooError::InvalidConfig(_)));

        let err = BackboneConfig::new("ResNet18".to_string())
            .with_in_channels(0)
            .try_validate()
            .unwrap_err();
        assert!(matches!(err, ZooError::InvalidConfig(_)));
    }

    #[test]
    fn test_fetch_not_pretrained() {
        let config = BackboneConfig::new("Deep".to_string()).with_pretrained(false);
        assert!(config.fetch_pretrained(&WITH_WEIGHTS).unwrap().is_none());
        assert!(config.fetch_pretrained(&WITHOUT_WEIGHTS).unwrap().is_none());
    }

    #[test]
    fn test_fetch_missing_weights() {
        let config = BackboneConfig::new("Shallow".to_string());
        let err = config.fetch_pretrained(&WITHOUT_WEIGHTS).unwrap_err();
        assert!(matches!(err, ZooError::InvalidConfig(_)));

        let config = BackboneConfig::new("Deep".to_string()).with_weights(Some("a1_in1k".to_string()));
        let err = config.fetch_pretrained(&WITH_WEIGHTS).unwrap_err();
        assert!(matches!(
            err,
            ZooError::UnknownModel { ref name, .. } if name == "a1_in1k"
        ));
    }

    #[test]
    fn test_fetch_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCacheConfig::new().with_root_dir(Some(dir.path().to_string_lossy().to_string()));

        let descriptor = WITH_WEIGHTS.to_prefab().weights.unwrap().lookup_by_name("tv_in1k").unwrap();
        let cached = cache
            .resource_to_path(&pretrained_weights_resource_key(&descriptor.cache_key().unwrap()))
            .unwrap();
        std::fs::create_dir_all(cached.parent().unwrap()).unwrap();
        std::fs::write(&cached, b"weights").unwrap();

        let config = BackboneConfig::new("Deep".to_string()).with_cache(cache);
        let path = config.fetch_pretrained(&WITH_WEIGHTS).unwrap().unwrap();
        assert_eq!(path, cached);
    }
}
