//! # `generate_resnet`

use crate::models::backbone::BackboneConfig;
use crate::models::resnet::prefabs::PREFAB_RESNET_MAP;
use crate::models::resnet::pytorch_stubs::load_pytorch_weights;
use crate::models::resnet::resnet_model::ResNet;
use burn::prelude::Backend;

/// Build a named `ResNet` backbone, patched for `in_channels` and `num_classes`.
///
/// 1. Look up ``config.model_name`` in [`PREFAB_RESNET_MAP`].
/// 2. Build the ImageNet layout; if ``config.pretrained``, load the published weights.
/// 3. Replace the stem convolution with a fresh ``in_channels`` 7x7/2 conv.
/// 4. Replace the head with a fresh ``feature_width -> num_classes`` projection.
///
/// # Errors
///
/// - [`crate::ZooError::UnknownModel`] for a name outside the table.
/// - [`crate::ZooError::InvalidConfig`] for zero classes or channels.
/// - Fetch, cache, and decode errors when loading pretrained weights.
pub fn generate_resnet<B: Backend>(
    config: &BackboneConfig,
    device: &B::Device,
) -> crate::Result<ResNet<B>> {
    let prefab = PREFAB_RESNET_MAP.try_lookup(&config.model_name)?;
    config.try_validate()?;

    log::info!(
        "building {} (pretrained: {}) for {} classes, {} input channels",
        prefab.name,
        config.pretrained,
        config.num_classes,
        config.in_channels
    );

    let mut model = (prefab.builder)().init::<B>(device);

    if let Some(path) = config.fetch_pretrained(prefab)? {
        log::debug!("loading {} weights from {}", prefab.name, path.display());
        model = load_pytorch_weights(model, &path)?;
    }

    log::debug!(
        "replacing {} stem: {} -> {} input channels",
        prefab.name,
        model.in_channels(),
        config.in_channels
    );
    let model = model.with_in_channels(config.in_channels);

    log::debug!(
        "replacing {} head: {} -> {} classes",
        prefab.name,
        model.num_classes(),
        config.num_classes
    );
    Ok(model.with_classes(config.num_classes))
}
