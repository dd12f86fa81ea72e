use crate::core::errors::{check_delay, SimError};
use crate::core::event_scheduler::EventScheduler;
use crate::core::primitives::{Gate, LevelContainer, MessageQueue, ResourcePool};
use crate::core::process::{Resume, Wait};
use crate::core::types::{ContainerId, GateId, PoolHandle, PoolId, ProcessId, QueueId, SimTime};

/// Clock, event queue and primitives: everything a process may touch
/// besides the model.
pub(crate) struct Kernel<T> {
    pub(crate) now: SimTime,
    pub(crate) scheduler: EventScheduler<T>,
    pub(crate) queues: Vec<MessageQueue<T>>,
    pub(crate) pools: Vec<ResourcePool>,
    pub(crate) containers: Vec<LevelContainer>,
    pub(crate) gates: Vec<Gate>,
}

impl<T> Kernel<T> {
    pub(crate) fn new() -> Self {
        Self {
            now: 0.0,
            scheduler: EventScheduler::new(),
            queues: Vec::new(),
            pools: Vec::new(),
            containers: Vec::new(),
            gates: Vec::new(),
        }
    }

    /// Resume `process` in the current instant, after all work already due.
    pub(crate) fn wake(&mut self, process: ProcessId, signal: Resume<T>) {
        self.scheduler.schedule_at(self.now, process, signal);
    }

    /// Register `process` with whatever primitive it is waiting on.
    pub(crate) fn suspend(&mut self, process: ProcessId, wait: Wait<T>) -> Result<(), SimError> {
        match wait {
            Wait::Timeout(delay) => {
                let delay = check_delay(delay)?;
                self.scheduler.schedule_at(self.now + delay, process, Resume::Elapsed);
            }
            Wait::Get(queue) => {
                if let Some(item) = self.queue_mut(queue)?.get(process, None) {
                    self.wake(process, Resume::Item(item));
                }
            }
            Wait::GetMatching(queue, filter) => {
                if let Some(item) = self.queue_mut(queue)?.get(process, Some(filter)) {
                    self.wake(process, Resume::Item(item));
                }
            }
            Wait::Acquire(pool) => {
                if let Some(handle) = self.pool_mut(pool)?.acquire(process) {
                    self.wake(process, Resume::Acquired(handle));
                }
            }
            Wait::Take(container, amount) => {
                if let Some(taken) = self.container_mut(container)?.get(process, amount)? {
                    self.wake(process, Resume::Taken(taken));
                }
            }
            Wait::Until(gate) => {
                if self.gate_mut(gate)?.wait(process) {
                    self.wake(process, Resume::Opened);
                }
            }
            Wait::Exit => {}
        }
        Ok(())
    }

    pub(crate) fn put(&mut self, queue: QueueId, item: T) -> Result<(), SimError> {
        for (process, item) in self.queue_mut(queue)?.put(item) {
            self.wake(process, Resume::Item(item));
        }
        Ok(())
    }

    pub(crate) fn put_level(&mut self, container: ContainerId, amount: f64) -> Result<(), SimError> {
        for (process, taken) in self.container_mut(container)?.put(amount)? {
            self.wake(process, Resume::Taken(taken));
        }
        Ok(())
    }

    pub(crate) fn try_take(&mut self, container: ContainerId, amount: f64) -> Result<bool, SimError> {
        self.container_mut(container)?.try_get(amount)
    }

    pub(crate) fn release(&mut self, handle: PoolHandle) -> Result<(), SimError> {
        let pool = handle.pool;
        if let Some((process, handle)) = self.pool_mut(pool)?.release(handle)? {
            self.wake(process, Resume::Acquired(handle));
        }
        Ok(())
    }

    pub(crate) fn open_gate(&mut self, gate: GateId) -> Result<(), SimError> {
        for process in self.gate_mut(gate)?.open() {
            self.wake(process, Resume::Opened);
        }
        Ok(())
    }

    pub(crate) fn close_gate(&mut self, gate: GateId) -> Result<(), SimError> {
        self.gate_mut(gate)?.close();
        Ok(())
    }

    pub(crate) fn queue(&self, queue: QueueId) -> Result<&MessageQueue<T>, SimError> {
        self.queues.get(queue.0).ok_or(SimError::UnknownQueue(queue))
    }

    pub(crate) fn pool(&self, pool: PoolId) -> Result<&ResourcePool, SimError> {
        self.pools.get(pool.0).ok_or(SimError::UnknownPool(pool))
    }

    pub(crate) fn container(&self, container: ContainerId) -> Result<&LevelContainer, SimError> {
        self.containers
            .get(container.0)
            .ok_or(SimError::UnknownContainer(container))
    }

    pub(crate) fn gate(&self, gate: GateId) -> Result<&Gate, SimError> {
        self.gates.get(gate.0).ok_or(SimError::UnknownGate(gate))
    }

    fn queue_mut(&mut self, queue: QueueId) -> Result<&mut MessageQueue<T>, SimError> {
        self.queues.get_mut(queue.0).ok_or(SimError::UnknownQueue(queue))
    }

    fn pool_mut(&mut self, pool: PoolId) -> Result<&mut ResourcePool, SimError> {
        self.pools.get_mut(pool.0).ok_or(SimError::UnknownPool(pool))
    }

    fn container_mut(&mut self, container: ContainerId) -> Result<&mut LevelContainer, SimError> {
        self.containers
            .get_mut(container.0)
            .ok_or(SimError::UnknownContainer(container))
    }

    fn gate_mut(&mut self, gate: GateId) -> Result<&mut Gate, SimError> {
        self.gates.get_mut(gate.0).ok_or(SimError::UnknownGate(gate))
    }
}
