use slotmap::new_key_type;

/// Simulated time, in model units.
pub type SimTime = f64;

new_key_type! {
    /// Identifies a live process inside a [`SimulationEngine`](crate::core::execution::SimulationEngine).
    pub struct ProcessId;
}

/// Handle of a message queue registered with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(pub(crate) usize);

/// Handle of a resource pool registered with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(pub(crate) usize);

/// Handle of a level container registered with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub(crate) usize);

/// Handle of a gate registered with the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GateId(pub(crate) usize);

impl std::fmt::Display for QueueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "queue#{}", self.0)
    }
}

impl std::fmt::Display for PoolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

impl std::fmt::Display for GateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gate#{}", self.0)
    }
}

/// One unit of capacity held from a [`ResourcePool`](crate::core::primitives::ResourcePool).
///
/// Handles are move-only: the holder gives the unit back by passing the
/// handle to `release`, which consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct PoolHandle {
    pub(crate) pool: PoolId,
    pub(crate) token: u64,
}

impl PoolHandle {
    pub fn pool(&self) -> PoolId {
        self.pool
    }
}
