//! Seeded random durations and quantities.
//!
//! Distributions are configured as `{ "dist": <family>, "params": [...] }`
//! and parameterised by mean and standard deviation, so that every family
//! can be swapped for another with the same first two moments.

use crate::core::errors::SimError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution as _, Exp, Gamma, Normal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistributionError {
    #[error("unknown distribution '{0}'")]
    UnknownDistribution(String),

    #[error("distribution '{dist}' needs {expected} parameter(s), got {got}")]
    MissingParameter {
        dist: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("distribution '{dist}': {reason}")]
    InvalidParameter { dist: &'static str, reason: String },
}

impl From<DistributionError> for SimError {
    fn from(error: DistributionError) -> Self {
        SimError::model(error)
    }
}

/// The raw `{dist, params}` form used in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSpec {
    pub dist: String,
    #[serde(default)]
    pub params: Vec<f64>,
}

/// A validated distribution family with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DistributionSpec", into = "DistributionSpec")]
pub enum Distribution {
    Constant(f64),
    Uniform { mean: f64, stddev: f64 },
    Gamma { mean: f64, stddev: f64 },
    Erlang { mean: f64, stddev: f64 },
    Expo { mean: f64 },
    Normal { mean: f64, stddev: f64 },
}

impl Distribution {
    pub fn from_spec(dist: &str, params: &[f64]) -> Result<Self, DistributionError> {
        let distribution = match dist {
            "constant" => {
                let [value] = take::<1>("constant", params)?;
                Distribution::Constant(value)
            }
            "uniform" => {
                let [mean, stddev] = take::<2>("uniform", params)?;
                Distribution::Uniform { mean, stddev }
            }
            "gamma" => {
                let [mean, stddev] = take::<2>("gamma", params)?;
                Distribution::Gamma { mean, stddev }
            }
            "erlang" => {
                let [mean, stddev] = take::<2>("erlang", params)?;
                Distribution::Erlang { mean, stddev }
            }
            "expo" => {
                let [mean] = take::<1>("expo", params)?;
                Distribution::Expo { mean }
            }
            "normal" => {
                let [mean, stddev] = take::<2>("normal", params)?;
                Distribution::Normal { mean, stddev }
            }
            other => return Err(DistributionError::UnknownDistribution(other.to_string())),
        };
        distribution.validate()?;
        Ok(distribution)
    }

    pub fn constant(value: f64) -> Self {
        Distribution::Constant(value)
    }

    pub fn family(&self) -> &'static str {
        match self {
            Distribution::Constant(_) => "constant",
            Distribution::Uniform { .. } => "uniform",
            Distribution::Gamma { .. } => "gamma",
            Distribution::Erlang { .. } => "erlang",
            Distribution::Expo { .. } => "expo",
            Distribution::Normal { .. } => "normal",
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            Distribution::Constant(value) => value,
            Distribution::Uniform { mean, .. }
            | Distribution::Gamma { mean, .. }
            | Distribution::Erlang { mean, .. }
            | Distribution::Expo { mean }
            | Distribution::Normal { mean, .. } => mean,
        }
    }

    fn validate(&self) -> Result<(), DistributionError> {
        let invalid = |reason: &str| DistributionError::InvalidParameter {
            dist: self.family(),
            reason: reason.to_string(),
        };
        if DistributionSpec::from(self.clone())
            .params
            .iter()
            .any(|param| !param.is_finite())
        {
            return Err(invalid("parameters must be finite"));
        }
        match *self {
            Distribution::Uniform { stddev, .. } | Distribution::Normal { stddev, .. }
                if stddev < 0.0 =>
            {
                Err(invalid("stddev must be non-negative"))
            }
            Distribution::Uniform { mean, stddev } if uniform_bounds(mean, stddev).is_none() => {
                Err(invalid("mean ± √3·stddev overflows"))
            }
            Distribution::Gamma { mean, stddev } | Distribution::Erlang { mean, stddev } => {
                if stddev < 0.0 {
                    Err(invalid("stddev must be non-negative"))
                } else if stddev > 0.0 && mean <= 0.0 {
                    Err(invalid("mean must be positive"))
                } else if stddev > 0.0 && gamma_shape_scale(mean, stddev).is_none() {
                    Err(invalid("shape or scale overflows"))
                } else {
                    Ok(())
                }
            }
            Distribution::Expo { mean } if mean <= 0.0 => Err(invalid("mean must be positive")),
            _ => Ok(()),
        }
    }
}

/// Bounds of the uniform with the given moments, if representable.
fn uniform_bounds(mean: f64, stddev: f64) -> Option<(f64, f64)> {
    let half_width = 3f64.sqrt() * stddev;
    let (low, high) = (mean - half_width, mean + half_width);
    (low.is_finite() && high.is_finite() && (high - low).is_finite()).then_some((low, high))
}

fn gamma_shape_scale(mean: f64, stddev: f64) -> Option<(f64, f64)> {
    let shape = mean * mean / (stddev * stddev);
    let scale = stddev * stddev / mean;
    let usable = |v: f64| v.is_finite() && v > 0.0;
    (usable(shape) && usable(scale)).then_some((shape, scale))
}

fn take<const N: usize>(dist: &'static str, params: &[f64]) -> Result<[f64; N], DistributionError> {
    params
        .get(..N)
        .and_then(|head| <[f64; N]>::try_from(head).ok())
        .ok_or(DistributionError::MissingParameter {
            dist,
            expected: N,
            got: params.len(),
        })
}

impl TryFrom<DistributionSpec> for Distribution {
    type Error = DistributionError;

    fn try_from(spec: DistributionSpec) -> Result<Self, Self::Error> {
        Distribution::from_spec(&spec.dist, &spec.params)
    }
}

impl From<Distribution> for DistributionSpec {
    fn from(distribution: Distribution) -> Self {
        let params = match distribution {
            Distribution::Constant(value) => vec![value],
            Distribution::Expo { mean } => vec![mean],
            Distribution::Uniform { mean, stddev }
            | Distribution::Gamma { mean, stddev }
            | Distribution::Erlang { mean, stddev }
            | Distribution::Normal { mean, stddev } => vec![mean, stddev],
        };
        DistributionSpec {
            dist: distribution.family().to_string(),
            params,
        }
    }
}

impl Default for Distribution {
    fn default() -> Self {
        Distribution::Constant(0.0)
    }
}

/// Deterministic source of draws for a whole simulation run.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self, distribution: &Distribution) -> Result<f64, DistributionError> {
        let value = match *distribution {
            Distribution::Constant(value) => value,
            Distribution::Uniform { mean, stddev } => {
                let (low, high) = uniform_bounds(mean, stddev)
                    .ok_or_else(|| invalid(distribution, "mean ± √3·stddev overflows"))?;
                if high > low {
                    self.rng.gen_range(low..=high)
                } else {
                    mean
                }
            }
            Distribution::Gamma { mean, stddev } | Distribution::Erlang { mean, stddev } => {
                if stddev > 0.0 {
                    let (shape, scale) = gamma_shape_scale(mean, stddev)
                        .ok_or_else(|| invalid(distribution, "shape or scale overflows"))?;
                    let gamma = Gamma::new(shape, scale).map_err(|e| invalid(distribution, e))?;
                    gamma.sample(&mut self.rng)
                } else {
                    mean
                }
            }
            Distribution::Expo { mean } => {
                let exp = Exp::new(1.0 / mean).map_err(|e| invalid(distribution, e))?;
                exp.sample(&mut self.rng)
            }
            Distribution::Normal { mean, stddev } => {
                let normal = Normal::new(mean, stddev).map_err(|e| invalid(distribution, e))?;
                normal.sample(&mut self.rng)
            }
        };
        Ok(value)
    }

    /// Draw a duration, clamping negative draws to zero.
    pub fn duration(&mut self, distribution: &Distribution) -> Result<f64, DistributionError> {
        Ok(self.sample(distribution)?.max(0.0))
    }
}

fn invalid(distribution: &Distribution, error: impl std::fmt::Display) -> DistributionError {
    DistributionError::InvalidParameter {
        dist: distribution.family(),
        reason: error.to_string(),
    }
}
