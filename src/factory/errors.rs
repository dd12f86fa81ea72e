use super::distribution::DistributionError;
use super::model::{DemandId, OrderId};
use crate::core::errors::SimError;
use thiserror::Error;

/// Problems found while loading or validating a factory description.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("product '{product}' stage '{stage}' uses unknown resource '{resource}'")]
    UnknownResource {
        product: String,
        stage: String,
        resource: String,
    },

    #[error("product '{0}' has no process stages")]
    EmptyProcess(String),

    #[error("resource '{resource}' has capacity {capacity}, at least 1 is required")]
    InvalidCapacity { resource: String, capacity: usize },

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

/// Errors raised by the factory model.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("order arena is full ({capacity} live orders)")]
    ArenaExhausted { capacity: usize },

    #[error("unknown production order {0:?}")]
    UnknownOrder(OrderId),

    #[error("unknown demand order {0:?}")]
    UnknownDemand(DemandId),

    #[error("unknown product '{0}'")]
    UnknownProduct(String),

    #[error("unknown resource '{0}'")]
    UnknownResource(String),

    #[error("product '{product}' has no stage {stage}")]
    UnknownStage { product: String, stage: usize },

    #[error("order {order:?} already completed all {total} stages")]
    StageOverflow { order: OrderId, total: usize },

    #[error("order {0:?} is already finished")]
    AlreadyFinished(OrderId),

    #[error("demand {demand:?} for '{product}' settled with only {reserved} of {quantity} units in process")]
    WipShortfall {
        product: String,
        demand: DemandId,
        quantity: u32,
        reserved: f64,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Distribution(#[from] DistributionError),

    #[error(transparent)]
    Engine(#[from] SimError),
}

impl From<FactoryError> for SimError {
    fn from(error: FactoryError) -> Self {
        match error {
            FactoryError::Engine(inner) => inner,
            other => SimError::model(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_unwrap_back_to_engine_errors() {
        let error: SimError = FactoryError::Engine(SimError::InvalidDelay(-1.0)).into();
        assert!(matches!(error, SimError::InvalidDelay(_)));
    }

    #[test]
    fn domain_errors_become_model_errors() {
        let error: SimError = FactoryError::UnknownProduct("widget".to_string()).into();
        assert!(matches!(error, SimError::Model(_)));
        assert_eq!(error.to_string(), "unknown product 'widget'");
    }

    #[test]
    fn config_errors_describe_the_offender() {
        let error = ConfigError::UnknownResource {
            product: "p".to_string(),
            stage: "cut".to_string(),
            resource: "saw".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "product 'p' stage 'cut' uses unknown resource 'saw'"
        );
    }
}
