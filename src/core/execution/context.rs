use super::kernel::Kernel;
use super::simulation_engine::ProcessSlot;
use crate::core::errors::SimError;
use crate::core::process::{Model, Process, Resume};
use crate::core::types::{ContainerId, GateId, PoolHandle, PoolId, ProcessId, QueueId, SimTime};
use slotmap::SlotMap;

/// What a process sees while it runs: the model plus the non-blocking half
/// of every primitive. Blocking operations are expressed as [`Wait`](crate::core::process::Wait)s.
pub struct Context<'a, M: Model> {
    pub model: &'a mut M,
    kernel: &'a mut Kernel<M::Item>,
    processes: &'a mut SlotMap<ProcessId, ProcessSlot<M>>,
    current: ProcessId,
}

impl<'a, M: Model> Context<'a, M> {
    pub(crate) fn new(
        model: &'a mut M,
        kernel: &'a mut Kernel<M::Item>,
        processes: &'a mut SlotMap<ProcessId, ProcessSlot<M>>,
        current: ProcessId,
    ) -> Self {
        Self {
            model,
            kernel,
            processes,
            current,
        }
    }

    pub fn now(&self) -> SimTime {
        self.kernel.now
    }

    /// Id of the running process
    pub fn current(&self) -> ProcessId {
        self.current
    }

    /// Start another process in the current instant.
    pub fn spawn<P>(&mut self, process: P) -> ProcessId
    where
        P: Process<M> + 'static,
    {
        let id = self.processes.insert(ProcessSlot::new(Box::new(process)));
        self.kernel.wake(id, Resume::Start);
        id
    }

    pub fn put(&mut self, queue: QueueId, item: M::Item) -> Result<(), SimError> {
        self.kernel.put(queue, item)
    }

    pub fn items(&self, queue: QueueId) -> Result<impl Iterator<Item = &M::Item>, SimError> {
        Ok(self.kernel.queue(queue)?.items())
    }

    pub fn queue_len(&self, queue: QueueId) -> Result<usize, SimError> {
        Ok(self.kernel.queue(queue)?.len())
    }

    pub fn put_level(&mut self, container: ContainerId, amount: f64) -> Result<(), SimError> {
        self.kernel.put_level(container, amount)
    }

    /// Withdraw without waiting; `false` when the level is short or other
    /// getters are queued.
    pub fn try_take(&mut self, container: ContainerId, amount: f64) -> Result<bool, SimError> {
        self.kernel.try_take(container, amount)
    }

    pub fn level(&self, container: ContainerId) -> Result<f64, SimError> {
        Ok(self.kernel.container(container)?.level())
    }

    pub fn release(&mut self, handle: PoolHandle) -> Result<(), SimError> {
        self.kernel.release(handle)
    }

    pub fn in_use(&self, pool: PoolId) -> Result<usize, SimError> {
        Ok(self.kernel.pool(pool)?.in_use())
    }

    pub fn open_gate(&mut self, gate: GateId) -> Result<(), SimError> {
        self.kernel.open_gate(gate)
    }

    pub fn close_gate(&mut self, gate: GateId) -> Result<(), SimError> {
        self.kernel.close_gate(gate)
    }

    pub fn is_open(&self, gate: GateId) -> Result<bool, SimError> {
        Ok(self.kernel.gate(gate)?.is_open())
    }
}
