pub mod core;
pub mod factory;

// Re-export commonly used types
pub use crate::core::errors::SimError;
pub use crate::core::execution::{Context, SimulationEngine, SimulationObserver};
pub use crate::core::process::{Model, Process, Resume, Wait};
pub use crate::core::types::{ProcessId, SimTime};
pub use crate::factory::{
    FactoryBuilder, FactoryConfig, FactoryError, FactorySimulation, Metrics, SimulationConfig,
};
