//! # Pretrained Weight Descriptors

use crate::cache::disk::DiskCacheConfig;
use crate::errors::ZooError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

const X25: crc::Crc<u16> = crc::Crc::<u16>::new(&crc::CRC_16_IBM_SDLC);

/// Build a cache key (bare cache file name) from a name and URL.
pub fn url_to_cache_key(
    name: Option<&str>,
    url: &str,
) -> String {
    let hash = X25.checksum(url.as_bytes()).to_string();
    let base_name = url.rsplit_once('/').map(|(_, base)| base).unwrap_or(url);
    match name {
        Some(n) => format!("{n}-{hash}-{base_name}"),
        None => format!("{hash}-{base_name}"),
    }
}

/// Get the cache resource key for a pretrained weights file.
///
/// # Arguments
///
/// - `cache_key`: the cache key (the bare cache file name).
///
/// # Returns
///
/// The cache resource key.
pub fn pretrained_weights_resource_key(cache_key: &str) -> Vec<String> {
    vec!["weights".to_string(), cache_key.to_string()]
}

/// Static [`PretrainedWeightsDescriptor`] provider.
#[derive(Debug)]
pub struct StaticPretrainedWeightsDescriptor<'a> {
    /// Name of the weight set.
    pub name: &'a str,

    /// Description of the weight set.
    pub description: &'a str,

    /// License.
    pub license: Option<&'a str>,

    /// Source URL.
    pub origin: Option<&'a str>,

    /// URLs to download the weights from; the first is used.
    pub urls: &'a [&'a str],
}

impl StaticPretrainedWeightsDescriptor<'_> {
    /// Convert to a [`PretrainedWeightsDescriptor`].
    pub fn to_descriptor(&self) -> PretrainedWeightsDescriptor {
        PretrainedWeightsDescriptor {
            name: self.name.to_string(),
            description: self.description.to_string(),
            license: self.license.map(|s| s.to_string()),
            origin: self.origin.map(|s| s.to_string()),
            urls: self.urls.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<&StaticPretrainedWeightsDescriptor<'_>> for PretrainedWeightsDescriptor {
    fn from(descriptor: &StaticPretrainedWeightsDescriptor) -> Self {
        descriptor.to_descriptor()
    }
}

/// A descriptor for a pretrained weights file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct PretrainedWeightsDescriptor {
    /// Name of the weight set.
    pub name: String,

    /// Description of the weight set.
    pub description: String,

    /// License.
    pub license: Option<String>,

    /// Source URL.
    pub origin: Option<String>,

    /// URLs to download the weights from; the first is used.
    pub urls: Vec<String>,
}

impl PretrainedWeightsDescriptor {
    fn primary_url(&self) -> crate::Result<&str> {
        self.urls
            .first()
            .map(String::as_str)
            .ok_or_else(|| ZooError::InvalidConfig(format!("weights {:?} have no urls", self.name)))
    }

    /// Cache Key
    ///
    /// The key is ``{name}-{url crc hash}-{url basename}``.
    pub fn cache_key(&self) -> crate::Result<String> {
        Ok(url_to_cache_key(Some(&self.name), self.primary_url()?))
    }

    /// Read-Through Cache the Model Weights
    ///
    /// # Returns
    ///
    /// The disk location of the cached weights.
    pub fn fetch_weights_to_disk_cache(
        &self,
        disk_cache: &DiskCacheConfig,
    ) -> crate::Result<PathBuf> {
        let url = self.primary_url()?;
        let resource = pretrained_weights_resource_key(&self.cache_key()?);

        disk_cache.fetch_resource(url, &resource)
    }
}

/// Static [`PretrainedWeightsMap`] builder.
#[derive(Debug)]
pub struct StaticPretrainedWeightsMap<'a> {
    /// List of static descriptors.
    pub items: &'a [&'a StaticPretrainedWeightsDescriptor<'a>],
}

impl StaticPretrainedWeightsMap<'_> {
    /// Convert to a [`PretrainedWeightsMap`].
    pub fn to_directory(&self) -> PretrainedWeightsMap {
        PretrainedWeightsMap {
            items: self
                .items
                .iter()
                .map(|d| {
                    let desc = d.to_descriptor();
                    (desc.name.clone(), desc)
                })
                .collect(),
        }
    }
}

impl From<&StaticPretrainedWeightsMap<'_>> for PretrainedWeightsMap {
    fn from(directory: &StaticPretrainedWeightsMap) -> Self {
        directory.to_directory()
    }
}

/// Directory of [`PretrainedWeightsDescriptor`]s.
#[derive(Debug, Clone)]
pub struct PretrainedWeightsMap {
    /// Map of descriptors.
    pub items: BTreeMap<String, PretrainedWeightsDescriptor>,
}

impl PretrainedWeightsMap {
    /// Lookup a descriptor by name.
    pub fn lookup_by_name(
        &self,
        name: &str,
    ) -> Option<PretrainedWeightsDescriptor> {
        self.items.get(name).cloned()
    }

    /// Lookup a descriptor.
    pub fn try_lookup_by_name(
        &self,
        name: &str,
    ) -> crate::Result<PretrainedWeightsDescriptor> {
        self.lookup_by_name(name)
            .ok_or_else(|| ZooError::UnknownModel {
                family: "pretrained weights",
                name: name.to_string(),
                allowed: self.items.keys().cloned().collect(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static TEST_WEIGHTS: StaticPretrainedWeightsMap = StaticPretrainedWeightsMap {
        items: &[&StaticPretrainedWeightsDescriptor {
            name: "tv_in1k",
            description: "some description of my model.",
            license: Some("MIT"),
            origin: Some("https://github.com/my_org/my_model"),
            urls: &["https://example.com/models/my_model-abc123.pth"],
        }],
    };

    #[test]
    fn test_static_descriptor_to_descriptor() {
        let s_desc = TEST_WEIGHTS.items[0];
        let d_desc = s_desc.to_descriptor();

        assert_eq!(d_desc.name, s_desc.name.to_string());
        assert_eq!(d_desc.description, s_desc.description.to_string());
        assert_eq!(d_desc.license.as_deref(), Some("MIT"));
        assert_eq!(
            d_desc.urls,
            vec!["https://example.com/models/my_model-abc123.pth".to_string()]
        );
    }

    #[test]
    fn test_cache_key() {
        let url = "https://example.com/models/my_model-abc123.pth";
        let hash = X25.checksum(url.as_bytes());

        assert_eq!(
            url_to_cache_key(None, url),
            format!("{hash}-my_model-abc123.pth")
        );

        let desc = TEST_WEIGHTS.items[0].to_descriptor();
        assert_eq!(
            desc.cache_key().unwrap(),
            format!("tv_in1k-{hash}-my_model-abc123.pth")
        );

        let empty = PretrainedWeightsDescriptor {
            urls: vec![],
            ..desc
        };
        assert!(matches!(empty.cache_key(), Err(ZooError::InvalidConfig(_))));
    }

    #[test]
    fn test_lookup() {
        let directory = TEST_WEIGHTS.to_directory();
        assert_eq!(directory.lookup_by_name("tv_in1k").unwrap().name, "tv_in1k");
        assert!(directory.lookup_by_name("nope").is_none());

        match directory.try_lookup_by_name("nope") {
            Err(ZooError::UnknownModel { name, allowed, .. }) => {
                assert_eq!(name, "nope");
                assert_eq!(allowed, vec!["tv_in1k".to_string()]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
