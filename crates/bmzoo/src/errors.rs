//! # Zoo Errors

use std::path::PathBuf;
use thiserror::Error;

/// Result alias for fallible zoo operations.
pub type Result<T> = std::result::Result<T, ZooError>;

/// Errors surfaced by model construction, weight loading, and checked forward passes.
#[derive(Error, Debug)]
pub enum ZooError {
    /// A model name outside the closed set of a model family.
    #[error("unknown {family} model {name:?}; expected one of: {}", .allowed.join(", "))]
    UnknownModel {
        /// The model family, e.g. ``"ResNet"``.
        family: &'static str,
        /// The rejected name.
        name: String,
        /// The accepted names.
        allowed: Vec<String>,
    },

    /// A configuration value outside its valid range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A tensor that does not satisfy a layer's input contract.
    #[error("shape mismatch at {layer}: expected {expected}, got {actual:?}")]
    ShapeMismatch {
        /// The layer (or skip connection) whose contract failed.
        layer: String,
        /// Description of the expected shape.
        expected: String,
        /// The shape received.
        actual: Vec<usize>,
    },

    /// Pretrained weights could not be downloaded.
    #[error("failed to fetch {url}: {message}")]
    Fetch {
        /// The source URL.
        url: String,
        /// Failure detail.
        message: String,
    },

    /// Weight cache filesystem failure.
    #[error("weight cache io: {0}")]
    Io(#[from] std::io::Error),

    /// A cached weights file that could not be decoded onto a model.
    #[error("failed to load weights from {}: {message}", .path.display())]
    WeightsLoad {
        /// The cached file.
        path: PathBuf,
        /// Failure detail.
        message: String,
    },
}

impl ZooError {
    /// Whether retrying the same call may succeed.
    ///
    /// True for download and cache I/O failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ZooError::Fetch { .. } | ZooError::Io(_))
    }

    /// Build a [`ZooError::ShapeMismatch`].
    pub fn shape_mismatch<L, E>(
        layer: L,
        expected: E,
        actual: &[usize],
    ) -> Self
    where
        L: Into<String>,
        E: Into<String>,
    {
        ZooError::ShapeMismatch {
            layer: layer.into(),
            expected: expected.into(),
            actual: actual.to_vec(),
        }
    }
}
