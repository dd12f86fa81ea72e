//! A multi-stage production plant built on the simulation engine.
//!
//! Demand arrives per product, is turned into production orders by the
//! release scheduler, flows through the product's stages on shared
//! resources, and is delivered from finished goods with on-time, late and
//! lost-sale accounting.

pub mod config;
pub mod distribution;
pub mod errors;
pub mod inbound;
pub mod metrics;
pub mod model;
pub mod outbound;
pub mod plant;
pub mod production;
pub mod scheduler;
pub mod selection;
pub mod settings;
pub mod simulation;

pub use config::{DemandConfig, FactoryConfig, ProcessGraph, ProductConfig, ResourceConfig};
pub use distribution::{Distribution, Sampler};
pub use errors::{ConfigError, FactoryError};
pub use metrics::Metrics;
pub use model::{DemandId, OrderId, OrderStatus, Token};
pub use plant::Factory;
pub use selection::{EarliestDueDate, Fifo, OrderSelector, QueuedOrder};
pub use settings::{ConcurrencyMode, DeliveryMode, ReleasePolicy, SimulationConfig};
pub use simulation::{run_replications, FactoryBuilder, FactorySimulation};
