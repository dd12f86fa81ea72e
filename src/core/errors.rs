use super::types::{ContainerId, GateId, PoolId, QueueId, SimTime};
use thiserror::Error;

/// Errors raised by the engine and its primitives.
///
/// Every variant is fatal: [`SimulationEngine::run`](crate::core::execution::SimulationEngine::run)
/// stops and hands the error back to the caller.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid amount {0}: container quantities must be finite and non-negative")]
    InvalidAmount(f64),

    #[error("invalid delay {0}: waits must be finite and non-negative")]
    InvalidDelay(SimTime),

    #[error("invalid capacity {0}: a resource pool needs at least one unit")]
    InvalidCapacity(usize),

    #[error("handle {token} is not held by {pool}")]
    HandleNotHeld { pool: PoolId, token: u64 },

    #[error("unknown {0}")]
    UnknownQueue(QueueId),

    #[error("unknown {0}")]
    UnknownPool(PoolId),

    #[error("unknown {0}")]
    UnknownContainer(ContainerId),

    #[error("unknown {0}")]
    UnknownGate(GateId),

    #[error("process '{process}' cannot handle resumption {signal} in its current state")]
    UnexpectedResume { process: String, signal: String },

    #[error(transparent)]
    Model(Box<dyn std::error::Error + Send + Sync>),
}

impl SimError {
    pub fn unexpected(process: &str, signal: impl std::fmt::Debug) -> Self {
        SimError::UnexpectedResume {
            process: process.to_string(),
            signal: format!("{:?}", signal),
        }
    }

    /// Wrap an error raised by model code running inside a process.
    pub fn model<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SimError::Model(Box::new(error))
    }
}

/// Reject negative, NaN and infinite quantities.
pub(crate) fn check_amount(amount: f64) -> Result<f64, SimError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(SimError::InvalidAmount(amount))
    }
}

pub(crate) fn check_delay(delay: SimTime) -> Result<SimTime, SimError> {
    if delay.is_finite() && delay >= 0.0 {
        Ok(delay)
    } else {
        Err(SimError::InvalidDelay(delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_must_be_non_negative() {
        assert_eq!(check_amount(0.0).unwrap(), 0.0);
        assert_eq!(check_amount(3.5).unwrap(), 3.5);
        assert!(matches!(check_amount(-1.0), Err(SimError::InvalidAmount(_))));
        assert!(matches!(check_amount(f64::NAN), Err(SimError::InvalidAmount(_))));
    }

    #[test]
    fn delays_must_be_finite() {
        assert!(check_delay(0.0).is_ok());
        assert!(matches!(check_delay(-0.5), Err(SimError::InvalidDelay(_))));
        assert!(matches!(check_delay(f64::INFINITY), Err(SimError::InvalidDelay(_))));
    }

    #[test]
    fn model_errors_are_transparent() {
        let err = SimError::model(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(err.to_string(), "boom");
    }
}
