pub mod context;
pub(crate) mod kernel;
pub mod simulation_engine;

// Re-export commonly used types
pub use context::Context;
pub use simulation_engine::{SimulationEngine, SimulationObserver};
