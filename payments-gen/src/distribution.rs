use std::convert::TryFrom;

use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_distr::{Exp, Normal};
use serde::{Deserialize, Serialize};

use crate::error::GenError;

/// Shape of the transaction amounts, with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AmountDistribution {
    Normal { mean: f64, std_dev: f64 },
    Uniform { low: f64, high: f64 },
    Exponential { lambda: f64 },
}

impl Default for AmountDistribution {
    fn default() -> Self {
        AmountDistribution::normal()
    }
}

impl AmountDistribution {
    #[must_use]
    pub fn normal() -> Self {
        AmountDistribution::Normal {
            mean: 1000.0,
            std_dev: 500.0,
        }
    }

    #[must_use]
    pub fn uniform() -> Self {
        AmountDistribution::Uniform {
            low: 0.0,
            high: 1.0,
        }
    }

    #[must_use]
    pub fn exponential() -> Self {
        AmountDistribution::Exponential { lambda: 1.0 }
    }

    /// Default parameters for a distribution picked by name (`normal`, `uniform`, `exponential`).
    ///
    /// # Errors
    /// Errors when `kind` is not one of the known distribution names
    pub fn from_kind(kind: &str) -> Result<Self, GenError> {
        match kind {
            "normal" => Ok(AmountDistribution::normal()),
            "uniform" => Ok(AmountDistribution::uniform()),
            "exponential" => Ok(AmountDistribution::exponential()),
            other => Err(GenError::UnknownLabel {
                kind: "distribution",
                label: other.to_string(),
            }),
        }
    }
}

/// A validated [`AmountDistribution`] ready to draw from.
#[derive(Debug, Clone, Copy)]
pub enum AmountSampler {
    Normal(Normal<f64>),
    Uniform(Uniform<f64>),
    Exponential(Exp<f64>),
}

impl TryFrom<AmountDistribution> for AmountSampler {
    type Error = GenError;
    fn try_from(distribution: AmountDistribution) -> Result<Self, Self::Error> {
        let invalid = |reason: String| Err(GenError::InvalidDistribution(reason));
        match distribution {
            AmountDistribution::Normal { mean, std_dev } => {
                if !mean.is_finite() {
                    return invalid(format!("normal mean must be finite, got {mean}"));
                }
                Normal::new(mean, std_dev)
                    .map(AmountSampler::Normal)
                    .map_err(|e| GenError::InvalidDistribution(e.to_string()))
            }
            AmountDistribution::Uniform { low, high } => {
                // Uniform::new panics on an empty range
                if !(low.is_finite() && high.is_finite() && low < high) {
                    return invalid(format!("uniform range [{low}, {high}) is empty"));
                }
                if !(high - low).is_finite() {
                    return invalid(format!("uniform range [{low}, {high}) is too wide"));
                }
                Ok(AmountSampler::Uniform(Uniform::new(low, high)))
            }
            AmountDistribution::Exponential { lambda } => {
                if !(lambda.is_finite() && lambda > 0.0) {
                    return invalid(format!("exponential rate must be positive, got {lambda}"));
                }
                Exp::new(lambda)
                    .map(AmountSampler::Exponential)
                    .map_err(|e| GenError::InvalidDistribution(e.to_string()))
            }
        }
    }
}

impl Distribution<f64> for AmountSampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            AmountSampler::Normal(d) => d.sample(rng),
            AmountSampler::Uniform(d) => d.sample(rng),
            AmountSampler::Exponential(d) => d.sample(rng),
        }
    }
}
