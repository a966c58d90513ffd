//! Service-time distributions
//!
//! Turns validated [`ServiceTimeParams`] into samplers backed by `rand_distr`.

use crate::types::{ConfigValidationError, ServiceTimeParams, StationKind};
use rand::Rng;
use rand_distr::{Distribution, Exp, LogNormal, Normal};

/// Smallest service time ever drawn from a random distribution
pub const SERVICE_TIME_FLOOR_S: f64 = 0.05;

/// A ready-to-sample service-time distribution
#[derive(Debug, Clone, Copy)]
pub enum ServiceTimeDistribution {
    /// Constant service time
    Fixed(f64),
    /// Normal, floored
    Normal(Normal<f64>),
    /// Log-normal, floored and capped
    LogNormal {
        /// Underlying distribution
        dist: LogNormal<f64>,
        /// Cap
        max_s: f64,
    },
    /// Exponential, floored
    Exponential(Exp<f64>),
}

impl ServiceTimeDistribution {
    /// Build a sampler for a station's parameters
    pub fn from_params(
        station: StationKind,
        params: &ServiceTimeParams,
    ) -> Result<Self, ConfigValidationError> {
        let invalid = |field: &str, value: f64| ConfigValidationError::NegativeServiceParameter {
            station,
            field: field.to_string(),
            value,
        };
        params.check().map_err(|(field, value)| invalid(field, value))?;

        match *params {
            ServiceTimeParams::Fixed { seconds } => Ok(Self::Fixed(seconds)),
            ServiceTimeParams::Normal { mean_s, sd_s } => Normal::new(mean_s, sd_s)
                .map(Self::Normal)
                .map_err(|_| invalid("sd_s", sd_s)),
            ServiceTimeParams::LogNormal { mu, sigma, max_s } => LogNormal::new(mu, sigma)
                .map(|dist| Self::LogNormal { dist, max_s })
                .map_err(|_| invalid("sigma", sigma)),
            ServiceTimeParams::Exponential { mean_s } => Exp::new(1.0 / mean_s)
                .map(Self::Exponential)
                .map_err(|_| invalid("mean_s", mean_s)),
        }
    }

    /// Draw one service time in seconds
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Fixed(seconds) => *seconds,
            Self::Normal(dist) => dist.sample(rng).max(SERVICE_TIME_FLOOR_S),
            Self::LogNormal { dist, max_s } => {
                dist.sample(rng).min(*max_s).max(SERVICE_TIME_FLOOR_S)
            }
            Self::Exponential(dist) => dist.sample(rng).max(SERVICE_TIME_FLOOR_S),
        }
    }
}
