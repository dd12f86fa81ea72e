//! Run settings for a factory simulation
//!
//! This module provides the knobs that control one simulation run and how
//! independent replications are executed.

use super::errors::ConfigError;
use crate::core::types::SimTime;
use serde::{Deserialize, Serialize};

/// Default number of live orders of each kind
pub const DEFAULT_MAX_LIVE_ORDERS: usize = 100_000;

/// Enumeration of supported concurrency modes for replications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Replications run one after another on the calling thread
    #[default]
    Sequential,
    /// Replications run in parallel on a Rayon thread pool
    Rayon,
}

/// How finished goods are matched against demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeliveryMode {
    /// Deliver as soon as enough goods are in stock
    #[default]
    #[serde(rename = "asReady")]
    AsReady,
    /// Wait for the due date, then wait for the goods
    #[serde(rename = "onDue")]
    OnDue,
    /// Deliver what is in stock right now, the rest is lost
    #[serde(rename = "instantly")]
    Instantly,
}

/// When a production order reaches the shop floor
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ReleasePolicy {
    /// Release as soon as the demand is accepted
    #[default]
    Immediate,
    /// Release `buffer` plus the product's constraint time before the due date
    DueDateBuffer { buffer: SimTime },
}

impl ReleasePolicy {
    /// Scheduled release time for an order due at `due_date`
    ///
    /// # Arguments
    /// * `now` - The time the demand was accepted
    /// * `due_date` - The due date of the demand
    /// * `constraint_time` - The product's constraint time
    pub fn scheduled_release(&self, now: SimTime, due_date: SimTime, constraint_time: SimTime) -> SimTime {
        match *self {
            ReleasePolicy::Immediate => now,
            ReleasePolicy::DueDateBuffer { buffer } => due_date - buffer - constraint_time,
        }
    }
}

/// Configuration for a simulation run
///
/// This struct holds the options that shape one run of the factory model,
/// plus the options used when several seeded replications are executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Seed for the run's random stream
    pub seed: u64,
    /// Time before which no KPI is recorded
    pub warmup: SimTime,
    pub delivery_mode: DeliveryMode,
    pub release_policy: ReleasePolicy,
    /// Maximum number of live orders of each kind
    pub max_live_orders: usize,
    /// The concurrency mode to use for replications
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel replications
    /// Only relevant when concurrency_mode is Rayon
    pub thread_pool_size: Option<usize>,
}

impl SimulationConfig {
    /// Create a new simulation configuration with default values
    ///
    /// Default configuration uses seed 0, no warm-up, `asReady` delivery,
    /// immediate release and Sequential replications
    pub fn new() -> Self {
        Self {
            seed: 0,
            warmup: 0.0,
            delivery_mode: DeliveryMode::default(),
            release_policy: ReleasePolicy::default(),
            max_live_orders: DEFAULT_MAX_LIVE_ORDERS,
            concurrency_mode: ConcurrencyMode::default(),
            thread_pool_size: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the warm-up period
    ///
    /// # Arguments
    /// * `warmup` - Time from which KPIs are recorded
    pub fn with_warmup(mut self, warmup: SimTime) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn with_delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.delivery_mode = mode;
        self
    }

    pub fn with_release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.release_policy = policy;
        self
    }

    pub fn with_max_live_orders(mut self, max: usize) -> Self {
        self.max_live_orders = max;
        self
    }

    /// Set the concurrency mode for replications
    ///
    /// # Arguments
    /// * `mode` - The concurrency mode to use
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the thread pool size for parallel replications
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    /// Check the settings for values no run can use
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.warmup.is_finite() && self.warmup >= 0.0) {
            return Err(ConfigError::InvalidSetting(format!(
                "warmup must be finite and non-negative, got {}",
                self.warmup
            )));
        }
        if self.max_live_orders == 0 {
            return Err(ConfigError::InvalidSetting(
                "max_live_orders must be at least 1".to_string(),
            ));
        }
        if let ReleasePolicy::DueDateBuffer { buffer } = self.release_policy {
            if !buffer.is_finite() {
                return Err(ConfigError::InvalidSetting(format!(
                    "release buffer must be finite, got {}",
                    buffer
                )));
            }
        }
        if self.thread_pool_size == Some(0) {
            return Err(ConfigError::InvalidSetting(
                "thread_pool_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether KPIs are recorded at `now`
    pub fn is_warmed_up(&self, now: SimTime) -> bool {
        now >= self.warmup
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.seed, 0);
        assert_eq!(config.warmup, 0.0);
        assert_eq!(config.delivery_mode, DeliveryMode::AsReady);
        assert_eq!(config.release_policy, ReleasePolicy::Immediate);
        assert_eq!(config.max_live_orders, DEFAULT_MAX_LIVE_ORDERS);
        assert_eq!(config.concurrency_mode, ConcurrencyMode::Sequential);
        assert_eq!(config.thread_pool_size, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SimulationConfig::new()
            .with_seed(9)
            .with_warmup(100.0)
            .with_delivery_mode(DeliveryMode::Instantly)
            .with_release_policy(ReleasePolicy::DueDateBuffer { buffer: 24.0 })
            .with_concurrency(ConcurrencyMode::Rayon)
            .with_thread_pool_size(4);

        assert_eq!(config.seed, 9);
        assert_eq!(config.warmup, 100.0);
        assert_eq!(config.delivery_mode, DeliveryMode::Instantly);
        assert_eq!(config.concurrency_mode, ConcurrencyMode::Rayon);
        assert_eq!(config.thread_pool_size, Some(4));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(SimulationConfig::new().with_warmup(-1.0).validate().is_err());
        assert!(SimulationConfig::new().with_max_live_orders(0).validate().is_err());
        assert!(SimulationConfig::new().with_thread_pool_size(0).validate().is_err());
        assert!(SimulationConfig::new()
            .with_release_policy(ReleasePolicy::DueDateBuffer { buffer: f64::NAN })
            .validate()
            .is_err());
    }

    #[test]
    fn test_scheduled_release() {
        assert_eq!(ReleasePolicy::Immediate.scheduled_release(3.0, 50.0, 4.0), 3.0);
        let buffered = ReleasePolicy::DueDateBuffer { buffer: 10.0 };
        assert_eq!(buffered.scheduled_release(3.0, 50.0, 4.0), 36.0);
    }

    #[test]
    fn test_warmup_boundary_is_inclusive() {
        let config = SimulationConfig::new().with_warmup(10.0);
        assert!(!config.is_warmed_up(9.999));
        assert!(config.is_warmed_up(10.0));
    }

    #[test]
    fn test_delivery_mode_names() {
        assert_eq!(serde_json::to_string(&DeliveryMode::OnDue).unwrap(), "\"onDue\"");
        let mode: DeliveryMode = serde_json::from_str("\"instantly\"").unwrap();
        assert_eq!(mode, DeliveryMode::Instantly);
    }
}
