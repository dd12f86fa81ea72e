use crate::core::errors::{check_amount, SimError};
use crate::core::types::ProcessId;
use std::collections::VecDeque;

/// A non-negative numeric level with blocking withdrawal.
///
/// Getters are served strictly in arrival order: a large request at the
/// head holds back smaller requests queued behind it.
pub struct LevelContainer {
    level: f64,
    total_put: f64,
    getters: VecDeque<(ProcessId, f64)>,
}

impl LevelContainer {
    pub fn new(initial: f64) -> Result<Self, SimError> {
        Ok(Self {
            level: check_amount(initial)?,
            total_put: 0.0,
            getters: VecDeque::new(),
        })
    }

    /// Raise the level. Returns the getters that can now proceed, in order.
    pub fn put(&mut self, amount: f64) -> Result<Vec<(ProcessId, f64)>, SimError> {
        let amount = check_amount(amount)?;
        self.level += amount;
        self.total_put += amount;

        let mut served = Vec::new();
        while let Some(&(process, wanted)) = self.getters.front() {
            if self.level < wanted {
                break;
            }
            self.level -= wanted;
            self.getters.pop_front();
            served.push((process, wanted));
        }
        Ok(served)
    }

    /// Withdraw now if nobody is ahead and the level allows it, otherwise
    /// register `process` as a waiter and return `None`.
    pub fn get(&mut self, process: ProcessId, amount: f64) -> Result<Option<f64>, SimError> {
        let amount = check_amount(amount)?;
        if self.try_get(amount)? {
            return Ok(Some(amount));
        }
        self.getters.push_back((process, amount));
        Ok(None)
    }

    /// Withdraw without waiting. Returns whether the withdrawal happened.
    pub fn try_get(&mut self, amount: f64) -> Result<bool, SimError> {
        let amount = check_amount(amount)?;
        if self.getters.is_empty() && self.level >= amount {
            self.level -= amount;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Cumulative amount ever put into the container
    pub fn total_put(&self) -> f64 {
        self.total_put
    }

    pub fn waiting(&self) -> usize {
        self.getters.len()
    }
}
