//! # Checked Shape Contracts
//!
//! Non-panicking checks used by the `try_forward` entry points.
//! Internal blocks assert their contracts with `bimm_contracts` instead.

use crate::errors::ZooError;

/// Check that ``dims = [batch, channels, height, width]`` has the expected channel count.
pub fn expect_channels(
    layer: &str,
    dims: &[usize; 4],
    channels: usize,
) -> crate::Result<()> {
    if dims[1] == channels {
        Ok(())
    } else {
        Err(ZooError::shape_mismatch(
            layer,
            format!("[batch, {channels}, height, width]"),
            dims,
        ))
    }
}

/// Check that a flattened ``[batch, features]`` tensor matches a linear layer's input width.
pub fn expect_features(
    layer: &str,
    dims: &[usize; 2],
    features: usize,
) -> crate::Result<()> {
    if dims[1] == features {
        Ok(())
    } else {
        Err(ZooError::shape_mismatch(
            layer,
            format!("[batch, {features}]"),
            dims,
        ))
    }
}

/// Check that a ``[batch, channels, height, width]`` map is at least ``min x min``.
///
/// Guards pools and unpadded convolutions, which have no output below their kernel size.
pub fn expect_min_resolution(
    layer: &str,
    dims: &[usize; 4],
    min: usize,
) -> crate::Result<()> {
    if dims[2] >= min && dims[3] >= min {
        Ok(())
    } else {
        Err(ZooError::shape_mismatch(
            layer,
            format!("[batch, {}, >={min}, >={min}]", dims[1]),
            dims,
        ))
    }
}

/// Check that two ``[batch, _, height, width]`` maps agree on batch and resolution.
///
/// Used at skip connections before channel-wise concatenation.
pub fn expect_same_resolution(
    layer: &str,
    upsampled: &[usize; 4],
    skip: &[usize; 4],
) -> crate::Result<()> {
    if upsampled[0] == skip[0] && upsampled[2..] == skip[2..] {
        Ok(())
    } else {
        Err(ZooError::shape_mismatch(
            layer,
            format!("[{}, _, {}, {}]", skip[0], skip[2], skip[3]),
            upsampled,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_channels() {
        assert!(expect_channels("conv1", &[2, 3, 32, 32], 3).is_ok());

        let err = expect_channels("conv1", &[2, 1, 32, 32], 3).unwrap_err();
        assert!(matches!(
            err,
            ZooError::ShapeMismatch { ref layer, ref actual, .. }
                if layer == "conv1" && actual == &vec![2, 1, 32, 32]
        ));
    }

    #[test]
    fn test_expect_features() {
        assert!(expect_features("fc1", &[4, 400], 400).is_ok());
        assert!(expect_features("fc1", &[4, 576], 400).is_err());
    }

    #[test]
    fn test_expect_min_resolution() {
        assert!(expect_min_resolution("pool", &[1, 8, 2, 2], 2).is_ok());
        assert!(expect_min_resolution("pool", &[1, 8, 2, 1], 2).is_err());

        let err = expect_min_resolution("conv2", &[1, 6, 4, 4], 5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "shape mismatch at conv2: expected [batch, 6, >=5, >=5], got [1, 6, 4, 4]"
        );
    }

    #[test]
    fn test_expect_same_resolution() {
        assert!(expect_same_resolution("skip", &[1, 512, 16, 16], &[1, 256, 16, 16]).is_ok());

        let err = expect_same_resolution("skip", &[1, 128, 64, 64], &[1, 64, 65, 65]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "shape mismatch at skip: expected [1, _, 65, 65], got [1, 128, 64, 64]"
        );
    }
}
