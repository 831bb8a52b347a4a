//! # Config Prefabs for Well-Known Model Configurations
//!
//! A prefab names a model config builder, and optionally the pretrained
//! weight sets published for it. A [`StaticPreFabMap`] is the closed set of
//! prefabs for one model family; lookups outside it fail with
//! [`ZooError::UnknownModel`].

use crate::cache::weights::{PretrainedWeightsMap, StaticPretrainedWeightsMap};
use crate::errors::ZooError;
use burn::config::Config;
use std::fmt::Debug;
use std::sync::Arc;

/// Static builder for a [`PreFabConfig`]
pub struct StaticPreFabConfig<C>
where
    C: 'static + Config + Debug + Clone,
{
    /// Name of the model config pre-fab.
    pub name: &'static str,

    /// Description of the model config pre-fab.
    pub description: &'static str,

    /// Builder function for the config.
    pub builder: fn() -> C,

    /// Pretrained weights published for this config.
    pub weights: Option<&'static StaticPretrainedWeightsMap<'static>>,
}

impl<C> StaticPreFabConfig<C>
where
    C: 'static + Config + Debug + Clone,
{
    /// Convert to a [`PreFabConfig<C>`].
    pub fn to_prefab(&self) -> PreFabConfig<C> {
        let builder = self.builder;
        PreFabConfig {
            name: self.name.to_string(),
            description: self.description.to_string(),
            builder: Arc::new(builder),
            weights: self.weights.map(|w| w.to_directory()),
        }
    }
}

impl<C> From<&StaticPreFabConfig<C>> for PreFabConfig<C>
where
    C: 'static + Config + Debug + Clone,
{
    fn from(config: &StaticPreFabConfig<C>) -> Self {
        config.to_prefab()
    }
}

impl<C> Debug for StaticPreFabConfig<C>
where
    C: 'static + Config + Debug + Clone,
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        self.to_prefab().fmt(f)
    }
}

/// A [`Config`] Well-Known Pre-Fab.
pub struct PreFabConfig<C>
where
    C: 'static + Config + Debug + Clone,
{
    /// Name of the model config pre-fab.
    pub name: String,

    /// Description of the model config pre-fab.
    pub description: String,

    /// Builder function for the config.
    pub builder: Arc<dyn Fn() -> C + Send + Sync>,

    /// Pretrained weights published for this config.
    pub weights: Option<PretrainedWeightsMap>,
}

impl<C> Debug for PreFabConfig<C>
where
    C: 'static + Config + Debug + Clone,
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let pretty = f.alternate();

        let type_name = std::any::type_name::<C>();
        let mut handle = f.debug_struct(&format!("PreFabConfig<{type_name}>"));

        handle
            .field("name", &self.name)
            .field("description", &self.description);

        if pretty {
            handle.field("config", &self.new_config());
            handle.field("weights", &self.weights);
        }

        handle.finish()
    }
}

impl<C> PreFabConfig<C>
where
    C: 'static + Config + Debug + Clone,
{
    /// Build a new config.
    pub fn new_config(&self) -> C {
        (self.builder)()
    }
}

/// A closed, named set of [`StaticPreFabConfig`]s for one model family.
pub struct StaticPreFabMap<C>
where
    C: 'static + Config + Debug + Clone,
{
    /// Name of the model family.
    pub name: &'static str,

    /// Description of the map.
    pub description: &'static str,

    /// The prefabs.
    pub items: &'static [&'static StaticPreFabConfig<C>],
}

impl<C> StaticPreFabMap<C>
where
    C: 'static + Config + Debug + Clone,
{
    /// The prefab names, in table order.
    pub fn names(&self) -> Vec<&'static str> {
        self.items.iter().map(|item| item.name).collect()
    }

    /// Lookup a prefab by name.
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<&'static StaticPreFabConfig<C>> {
        self.items.iter().copied().find(|item| item.name == name)
    }

    /// Lookup a prefab by name.
    ///
    /// Unknown names fail with [`ZooError::UnknownModel`], listing the table.
    pub fn try_lookup(
        &self,
        name: &str,
    ) -> crate::Result<&'static StaticPreFabConfig<C>> {
        self.lookup(name).ok_or_else(|| ZooError::UnknownModel {
            family: self.name,
            name: name.to_string(),
            allowed: self.names().into_iter().map(str::to_string).collect(),
        })
    }
}

impl<C> Debug for StaticPreFabMap<C>
where
    C: 'static + Config + Debug + Clone,
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("StaticPreFabMap")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("items", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::weights::StaticPretrainedWeightsDescriptor;

    #[derive(Config, Debug)]
    struct WidthConfig {
        width: usize,
    }

    static TEST_MAP: StaticPreFabMap<WidthConfig> = StaticPreFabMap {
        name: "Width",
        description: "test prefabs",
        items: &[
            &StaticPreFabConfig {
                name: "narrow",
                description: "narrow",
                builder: || WidthConfig::new(8),
                weights: None,
            },
            &StaticPreFabConfig {
                name: "wide",
                description: "wide",
                builder: || WidthConfig::new(64),
                weights: Some(&StaticPretrainedWeightsMap {
                    items: &[&StaticPretrainedWeightsDescriptor {
                        name: "v1",
                        description: "wide v1",
                        license: None,
                        origin: None,
                        urls: &["https://example.com/wide-v1.pth"],
                    }],
                }),
            },
        ],
    };

    #[test]
    fn test_lookup() {
        assert_eq!(TEST_MAP.names(), vec!["narrow", "wide"]);

        let wide = TEST_MAP.try_lookup("wide").unwrap();
        assert_eq!((wide.builder)().width, 64);

        let prefab = wide.to_prefab();
        assert_eq!(prefab.new_config().width, 64);
        let weights = prefab.weights.unwrap();
        assert!(weights.lookup_by_name("v1").is_some());

        assert!(TEST_MAP.lookup("narrow").unwrap().weights.is_none());
    }

    #[test]
    fn test_unknown_name() {
        let err = TEST_MAP.try_lookup("medium").unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown Width model \"medium\"; expected one of: narrow, wide"
        );
    }
}
