use super::errors::SimError;
use super::execution::context::Context;
use super::types::{ContainerId, GateId, PoolHandle, PoolId, QueueId, SimTime};
use std::fmt;

/// The shared world a simulation operates on.
///
/// `Item` is the payload carried by the engine's message queues.
pub trait Model: 'static {
    type Item: fmt::Debug + 'static;
}

/// Item filter used by [`Wait::GetMatching`].
pub type Predicate<T> = Box<dyn Fn(&T) -> bool>;

/// A suspension point. Returned by [`Process::resume`] to tell the engine
/// what the process is waiting for next.
pub enum Wait<T> {
    /// Resume after the given delay.
    Timeout(SimTime),
    /// Take the head item of a queue, blocking while it is empty.
    Get(QueueId),
    /// Take the first item accepted by the predicate, blocking until one exists.
    GetMatching(QueueId, Predicate<T>),
    /// Hold one unit of pool capacity.
    Acquire(PoolId),
    /// Withdraw an amount from a level container.
    Take(ContainerId, f64),
    /// Resume once the gate is open.
    Until(GateId),
    /// The process is finished and is dropped.
    Exit,
}

impl<T> fmt::Debug for Wait<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wait::Timeout(delay) => write!(f, "Timeout({})", delay),
            Wait::Get(queue) => write!(f, "Get({})", queue),
            Wait::GetMatching(queue, _) => write!(f, "GetMatching({}, <predicate>)", queue),
            Wait::Acquire(pool) => write!(f, "Acquire({})", pool),
            Wait::Take(container, amount) => write!(f, "Take({}, {})", container, amount),
            Wait::Until(gate) => write!(f, "Until({})", gate),
            Wait::Exit => write!(f, "Exit"),
        }
    }
}

/// The value a process is resumed with.
#[derive(Debug)]
pub enum Resume<T> {
    /// First resumption after `spawn`.
    Start,
    /// A `Timeout` elapsed.
    Elapsed,
    /// A `Get` or `GetMatching` delivered this item.
    Item(T),
    /// An `Acquire` was granted.
    Acquired(PoolHandle),
    /// A `Take` withdrew this amount.
    Taken(f64),
    /// An `Until` found its gate open.
    Opened,
}

/// An independently-suspending unit of simulated control flow.
///
/// Implementations are explicit state machines: each call to `resume` runs
/// tick-atomically until it returns the next suspension point.
pub trait Process<M: Model> {
    fn name(&self) -> &str;

    fn resume(
        &mut self,
        ctx: &mut Context<'_, M>,
        signal: Resume<M::Item>,
    ) -> Result<Wait<M::Item>, SimError>;
}
