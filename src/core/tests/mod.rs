mod simulation_engine_tests;

use crate::core::errors::SimError;
use crate::core::execution::Context;
use crate::core::process::{Model, Process, Resume, Wait};
use crate::core::types::{ContainerId, GateId, PoolHandle, QueueId, SimTime};
use std::collections::VecDeque;

/// Records every resumption as `(time, process, signal)`.
#[derive(Default)]
pub(super) struct Trace {
    pub entries: Vec<(SimTime, String, String)>,
}

impl Trace {
    pub fn of(&self, process: &str) -> Vec<(SimTime, String)> {
        self.entries
            .iter()
            .filter(|(_, name, _)| name == process)
            .map(|(time, _, what)| (*time, what.clone()))
            .collect()
    }
}

impl Model for Trace {
    type Item = u32;
}

pub(super) enum Step {
    Wait(Wait<u32>),
    Release,
    Put(QueueId, u32),
    PutLevel(ContainerId, f64),
    Open(GateId),
    Close(GateId),
}

/// A process that plays back a fixed list of steps.
pub(super) struct Script {
    name: String,
    steps: VecDeque<Step>,
    held: Vec<PoolHandle>,
}

impl Script {
    pub fn new(name: &str, steps: Vec<Step>) -> Self {
        Self {
            name: name.to_string(),
            steps: steps.into(),
            held: Vec::new(),
        }
    }
}

fn describe(signal: &Resume<u32>) -> String {
    match signal {
        Resume::Start => "start".to_string(),
        Resume::Elapsed => "elapsed".to_string(),
        Resume::Item(item) => format!("item:{}", item),
        Resume::Acquired(_) => "acquired".to_string(),
        Resume::Taken(amount) => format!("taken:{}", amount),
        Resume::Opened => "opened".to_string(),
    }
}

impl Process<Trace> for Script {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(&mut self, ctx: &mut Context<'_, Trace>, signal: Resume<u32>) -> Result<Wait<u32>, SimError> {
        let now = ctx.now();
        ctx.model
            .entries
            .push((now, self.name.clone(), describe(&signal)));
        if let Resume::Acquired(handle) = signal {
            self.held.push(handle);
        }

        while let Some(step) = self.steps.pop_front() {
            match step {
                Step::Wait(wait) => return Ok(wait),
                Step::Release => {
                    if let Some(handle) = self.held.pop() {
                        ctx.release(handle)?;
                    }
                }
                Step::Put(queue, item) => ctx.put(queue, item)?,
                Step::PutLevel(container, amount) => ctx.put_level(container, amount)?,
                Step::Open(gate) => ctx.open_gate(gate)?,
                Step::Close(gate) => ctx.close_gate(gate)?,
            }
        }
        Ok(Wait::Exit)
    }
}
