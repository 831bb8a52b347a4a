//! # `generate_vgg`

use crate::models::backbone::BackboneConfig;
use crate::models::vgg::prefabs::PREFAB_VGG_MAP;
use crate::models::vgg::pytorch_stubs::load_pytorch_weights;
use crate::models::vgg::vgg_model::Vgg;
use burn::prelude::Backend;

/// Build a named `VGG` backbone, patched for `in_channels` and `num_classes`.
///
/// 1. Look up ``config.model_name`` in [`PREFAB_VGG_MAP`].
/// 2. Build the ImageNet layout; if ``config.pretrained``, load the published weights.
/// 3. If ``in_channels`` differs from the native 3, replace the first feature conv.
/// 4. Replace the last classifier layer with a fresh ``4096 -> num_classes`` projection.
///
/// # Errors
///
/// - [`crate::ZooError::UnknownModel`] for a name outside the table.
/// - [`crate::ZooError::InvalidConfig`] for zero classes or channels.
/// - Fetch, cache, and decode errors when loading pretrained weights.
pub fn generate_vgg<B: Backend>(
    config: &BackboneConfig,
    device: &B::Device,
) -> crate::Result<Vgg<B>> {
    let prefab = PREFAB_VGG_MAP.try_lookup(&config.model_name)?;
    config.try_validate()?;

    log::info!(
        "building {} (pretrained: {}) for {} classes, {} input channels",
        prefab.name,
        config.pretrained,
        config.num_classes,
        config.in_channels
    );

    let vgg_config = (prefab.builder)();
    let mut model = vgg_config.init::<B>(device);

    if let Some(path) = config.fetch_pretrained(prefab)? {
        log::debug!("loading {} weights from {}", prefab.name, path.display());
        model = load_pytorch_weights(model, &vgg_config, &path)?;
    }

    if config.in_channels != model.in_channels() {
        log::debug!(
            "replacing {} first conv: {} -> {} input channels",
            prefab.name,
            model.in_channels(),
            config.in_channels
        );
        model = model.with_in_channels(config.in_channels);
    }

    log::debug!(
        "replacing {} head: {} -> {} classes",
        prefab.name,
        model.num_classes(),
        config.num_classes
    );
    Ok(model.with_classes(config.num_classes))
}
