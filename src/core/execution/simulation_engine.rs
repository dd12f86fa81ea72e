use super::context::Context;
use super::kernel::Kernel;
use crate::core::errors::SimError;
use crate::core::event_scheduler::ScheduledEvent;
use crate::core::primitives::{Gate, LevelContainer, MessageQueue, ResourcePool};
use crate::core::process::{Model, Process, Resume, Wait};
use crate::core::types::{ContainerId, GateId, PoolId, ProcessId, QueueId, SimTime};
use log::trace;
use slotmap::SlotMap;

/// Observer trait for simulation progress
pub trait SimulationObserver<M: Model> {
    /// Called when the clock moves forward
    fn on_time_advance(&mut self, old_time: SimTime, new_time: SimTime);

    /// Called after every resumption with the model as it now stands
    fn on_step_complete(&mut self, now: SimTime, model: &M);
}

pub(crate) struct ProcessSlot<M: Model> {
    name: String,
    body: Option<Box<dyn Process<M>>>,
}

impl<M: Model> ProcessSlot<M> {
    pub(crate) fn new(body: Box<dyn Process<M>>) -> Self {
        Self {
            name: body.name().to_string(),
            body: Some(body),
        }
    }
}

/// Virtual-clock scheduler driving cooperative processes over a model.
pub struct SimulationEngine<M: Model> {
    model: M,
    kernel: Kernel<M::Item>,
    processes: SlotMap<ProcessId, ProcessSlot<M>>,
    observers: Vec<Box<dyn SimulationObserver<M>>>,
}

impl<M: Model> SimulationEngine<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            kernel: Kernel::new(),
            processes: SlotMap::with_key(),
            observers: Vec::new(),
        }
    }

    pub fn add_queue(&mut self) -> QueueId {
        self.kernel.queues.push(MessageQueue::new());
        QueueId(self.kernel.queues.len() - 1)
    }

    pub fn add_pool(&mut self, capacity: usize) -> Result<PoolId, SimError> {
        let id = PoolId(self.kernel.pools.len());
        self.kernel.pools.push(ResourcePool::new(id, capacity)?);
        Ok(id)
    }

    pub fn add_container(&mut self, initial: f64) -> Result<ContainerId, SimError> {
        self.kernel.containers.push(LevelContainer::new(initial)?);
        Ok(ContainerId(self.kernel.containers.len() - 1))
    }

    pub fn add_gate(&mut self, open: bool) -> GateId {
        self.kernel.gates.push(Gate::new(open));
        GateId(self.kernel.gates.len() - 1)
    }

    /// Add an observer to the simulation
    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver<M>>) {
        self.observers.push(observer);
    }

    /// Register a process; it first runs at the current instant.
    pub fn spawn<P>(&mut self, process: P) -> ProcessId
    where
        P: Process<M> + 'static,
    {
        let id = self.processes.insert(ProcessSlot::new(Box::new(process)));
        self.kernel.wake(id, Resume::Start);
        id
    }

    /// Run until no events remain or the next one is due at or after
    /// `until`. Returns the final clock value.
    pub fn run(&mut self, until: SimTime) -> Result<SimTime, SimError> {
        while let Some(next_time) = self.kernel.scheduler.peek_next_time() {
            if next_time >= until {
                break;
            }
            self.step()?;
        }
        if until.is_finite() && self.kernel.now < until {
            self.advance_to(until);
        }
        Ok(self.kernel.now)
    }

    /// Process one resumption, returns true if events remain
    pub fn step(&mut self) -> Result<bool, SimError> {
        let Some(event) = self.kernel.scheduler.pop_next() else {
            return Ok(false);
        };
        self.advance_to(event.time);
        self.dispatch(event)?;

        for observer in &mut self.observers {
            observer.on_step_complete(self.kernel.now, &self.model);
        }

        Ok(self.kernel.scheduler.has_events())
    }

    fn advance_to(&mut self, time: SimTime) {
        let old_time = self.kernel.now;
        if time > old_time {
            self.kernel.now = time;
            for observer in &mut self.observers {
                observer.on_time_advance(old_time, time);
            }
        }
    }

    fn dispatch(&mut self, event: ScheduledEvent<M::Item>) -> Result<(), SimError> {
        let pid = event.process;
        let Some(slot) = self.processes.get_mut(pid) else {
            return Ok(());
        };
        let Some(mut body) = slot.body.take() else {
            return Ok(());
        };
        trace!("t={} resume '{}' with {:?}", self.kernel.now, slot.name, event.signal);

        let wait = {
            let mut ctx = Context::new(&mut self.model, &mut self.kernel, &mut self.processes, pid);
            body.resume(&mut ctx, event.signal)?
        };
        trace!("t={} '{}' waits on {:?}", self.kernel.now, body.name(), wait);

        if let Wait::Exit = wait {
            self.processes.remove(pid);
            return Ok(());
        }
        if let Some(slot) = self.processes.get_mut(pid) {
            slot.body = Some(body);
        }
        self.kernel.suspend(pid, wait)
    }

    pub fn now(&self) -> SimTime {
        self.kernel.now
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// Consume the engine, keeping only the model.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Number of resumptions waiting in the event queue
    pub fn pending_events(&self) -> usize {
        self.kernel.scheduler.len()
    }

    /// Number of live processes, suspended or scheduled
    pub fn live_processes(&self) -> usize {
        self.processes.len()
    }

    /// Put an item from outside any process.
    pub fn put(&mut self, queue: QueueId, item: M::Item) -> Result<(), SimError> {
        self.kernel.put(queue, item)
    }

    pub fn put_level(&mut self, container: ContainerId, amount: f64) -> Result<(), SimError> {
        self.kernel.put_level(container, amount)
    }

    pub fn queue_len(&self, queue: QueueId) -> Result<usize, SimError> {
        Ok(self.kernel.queue(queue)?.len())
    }

    pub fn level(&self, container: ContainerId) -> Result<f64, SimError> {
        Ok(self.kernel.container(container)?.level())
    }

    pub fn total_put(&self, container: ContainerId) -> Result<f64, SimError> {
        Ok(self.kernel.container(container)?.total_put())
    }

    pub fn in_use(&self, pool: PoolId) -> Result<usize, SimError> {
        Ok(self.kernel.pool(pool)?.in_use())
    }

    pub fn is_open(&self, gate: GateId) -> Result<bool, SimError> {
        Ok(self.kernel.gate(gate)?.is_open())
    }
}
