use crate::core::types::ProcessId;

/// An up/down signal. Waiters on a closed gate are released together, in
/// wait order, when it opens.
pub struct Gate {
    open: bool,
    waiters: Vec<ProcessId>,
}

impl Gate {
    pub fn new(open: bool) -> Self {
        Self {
            open,
            waiters: Vec::new(),
        }
    }

    /// Returns true if the gate is open and `process` may go on now.
    pub fn wait(&mut self, process: ProcessId) -> bool {
        if !self.open {
            self.waiters.push(process);
        }
        self.open
    }

    pub fn open(&mut self) -> Vec<ProcessId> {
        self.open = true;
        std::mem::take(&mut self.waiters)
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn closed_gate_collects_waiters() {
        let mut map: SlotMap<ProcessId, ()> = SlotMap::with_key();
        let (a, b) = (map.insert(()), map.insert(()));

        let mut gate = Gate::new(true);
        assert!(gate.wait(a));
        gate.close();
        assert!(!gate.wait(a));
        assert!(!gate.wait(b));
        assert_eq!(gate.open(), vec![a, b]);
        assert!(gate.is_open());
        assert!(gate.open().is_empty());
    }
}
