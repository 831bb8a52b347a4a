//! # Local Response Normalization
//!
//! Cross-channel normalization over a sliding window of neighboring channels:
//!
//! ```text
//! out[c] = x[c] / (k + alpha / size * sum(x[c']^2 for c' in window(c))) ^ beta
//! ```
//!
//! The window covers ``size / 2`` channels before ``c`` and ``(size - 1) / 2``
//! channels after it; channels past either edge contribute zero.

use burn::config::Config;
use burn::module::Module;
use burn::prelude::{Backend, Tensor};

/// [`LocalResponseNorm`] Config.
#[derive(Config, Debug)]
pub struct LocalResponseNormConfig {
    /// Number of neighboring channels in the window.
    pub size: usize,

    /// Multiplicative factor.
    #[config(default = "1e-4")]
    pub alpha: f64,

    /// Exponent.
    #[config(default = "0.75")]
    pub beta: f64,

    /// Additive factor.
    #[config(default = "1.0")]
    pub k: f64,
}

impl LocalResponseNormConfig {
    /// Initialize a [`LocalResponseNorm`].
    ///
    /// # Panics
    ///
    /// If `size` is zero.
    pub fn init(&self) -> LocalResponseNorm {
        assert!(self.size > 0, "LocalResponseNorm size must be positive");
        LocalResponseNorm {
            size: self.size,
            alpha: self.alpha,
            beta: self.beta,
            k: self.k,
        }
    }
}

/// Stateless cross-channel local response normalization.
#[derive(Module, Clone, Debug)]
pub struct LocalResponseNorm {
    /// Window size.
    pub size: usize,
    /// Multiplicative factor.
    pub alpha: f64,
    /// Exponent.
    pub beta: f64,
    /// Additive factor.
    pub k: f64,
}

impl LocalResponseNorm {
    /// Forward Pass.
    ///
    /// # Arguments
    ///
    /// - `input`: ``[batch, channels, height, width]``.
    ///
    /// # Returns
    ///
    /// ``[batch, channels, height, width]``
    pub fn forward<B: Backend>(
        &self,
        input: Tensor<B, 4>,
    ) -> Tensor<B, 4> {
        let [batch, channels, height, width] = input.dims();
        let device = input.device();

        let before = self.size / 2;
        let after = (self.size - 1) / 2;

        let mut parts = Vec::with_capacity(3);
        if before > 0 {
            parts.push(Tensor::zeros([batch, before, height, width], &device));
        }
        parts.push(input.clone() * input.clone());
        if after > 0 {
            parts.push(Tensor::zeros([batch, after, height, width], &device));
        }
        let padded = Tensor::cat(parts, 1);

        let window = |offset: usize| {
            padded
                .clone()
                .slice([0..batch, offset..offset + channels, 0..height, 0..width])
        };
        let sum = (1..self.size).fold(window(0), |acc, offset| acc + window(offset));

        let div = (sum * (self.alpha / self.size as f64) + self.k).powf_scalar(self.beta);

        input / div
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    #[test]
    fn test_lrn_config_defaults() {
        let config = LocalResponseNormConfig::new(5);
        assert_eq!(config.size, 5);
        assert_eq!(config.alpha, 1e-4);
        assert_eq!(config.beta, 0.75);
        assert_eq!(config.k, 1.0);
    }

    #[test]
    #[should_panic(expected = "size must be positive")]
    fn test_lrn_zero_size_panics() {
        LocalResponseNormConfig::new(0).init();
    }

    #[test]
    fn test_lrn_matches_direct_computation() {
        type B = NdArray<f32>;
        let device = Default::default();

        let size = 4;
        let alpha = 0.5;
        let beta = 0.75;
        let k = 2.0;
        let lrn = LocalResponseNormConfig::new(size)
            .with_alpha(alpha)
            .with_beta(beta)
            .with_k(k)
            .init();

        let [batch, channels, height, width] = [2, 5, 3, 3];
        let input: Tensor<B, 4> = Tensor::random(
            [batch, channels, height, width],
            Distribution::Uniform(-1.0, 1.0),
            &device,
        );
        let output = lrn.forward(input.clone());
        assert_eq!(output.dims(), [batch, channels, height, width]);

        let values = input.to_data().to_vec::<f32>().unwrap();
        let at = |b: usize, c: usize, h: usize, w: usize| {
            values[((b * channels + c) * height + h) * width + w] as f64
        };

        let mut expected = Vec::with_capacity(values.len());
        for b in 0..batch {
            for c in 0..channels {
                for h in 0..height {
                    for w in 0..width {
                        let lo = c.saturating_sub(size / 2);
                        let hi = (c + (size - 1) / 2).min(channels - 1);
                        let sq: f64 = (lo..=hi).map(|i| at(b, i, h, w).powi(2)).sum();
                        let div = (k + alpha / size as f64 * sq).powf(beta);
                        expected.push((at(b, c, h, w) / div) as f32);
                    }
                }
            }
        }

        let actual = output.to_data().to_vec::<f32>().unwrap();
        assert_eq!(actual.len(), expected.len());
        for (idx, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
            assert!((a - e).abs() < 1e-5, "index {idx}: {a} != {e}");
        }
    }
}
