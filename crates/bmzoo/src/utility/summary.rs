//! # Parameter Summaries

use burn::module::Module;
use burn::prelude::Backend;
use serde::{Deserialize, Serialize};

/// Trainable parameter report for a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    /// Model name.
    pub name: String,

    /// Number of trainable parameters.
    pub num_params: usize,

    /// ``num_params / 1024^2``.
    pub size_mib: f64,
}

impl ModelSummary {
    /// Summarize a module.
    pub fn of<B: Backend, M: Module<B>>(
        name: &str,
        module: &M,
    ) -> Self {
        let num_params = module.num_params();
        Self {
            name: name.to_string(),
            num_params,
            size_mib: num_params as f64 / (1024.0 * 1024.0),
        }
    }
}

impl std::fmt::Display for ModelSummary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}: {} parameters ({:.3} MiB)",
            self.name, self.num_params, self.size_mib
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::nn::LinearConfig;

    #[test]
    fn test_summary_of_linear() {
        type B = NdArray<f32>;
        let device = Default::default();

        let linear = LinearConfig::new(1024, 1024).init::<B>(&device);
        let summary = ModelSummary::of::<B, _>("linear", &linear);

        assert_eq!(summary.num_params, 1024 * 1024 + 1024);
        assert!((summary.size_mib - (1.0 + 1.0 / 1024.0)).abs() < 1e-9);
        assert_eq!(
            summary.to_string(),
            "linear: 1049600 parameters (1.001 MiB)"
        );

        let json = serde_json::to_string(&summary).unwrap();
        let back: ModelSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
