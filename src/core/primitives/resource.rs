use crate::core::errors::SimError;
use crate::core::types::{PoolHandle, PoolId, ProcessId};
use std::collections::{BTreeSet, VecDeque};

/// Counted mutual exclusion with a bounded number of concurrent holders.
pub struct ResourcePool {
    id: PoolId,
    capacity: usize,
    held: BTreeSet<u64>,
    next_token: u64,
    waiters: VecDeque<ProcessId>,
}

impl ResourcePool {
    pub fn new(id: PoolId, capacity: usize) -> Result<Self, SimError> {
        if capacity == 0 {
            return Err(SimError::InvalidCapacity(capacity));
        }
        Ok(Self {
            id,
            capacity,
            held: BTreeSet::new(),
            next_token: 0,
            waiters: VecDeque::new(),
        })
    }

    /// Grant a unit to `process` now, or queue it behind earlier requesters.
    pub fn acquire(&mut self, process: ProcessId) -> Option<PoolHandle> {
        if self.waiters.is_empty() && self.held.len() < self.capacity {
            return Some(self.grant());
        }
        self.waiters.push_back(process);
        None
    }

    /// Give a unit back. If someone is waiting, the unit goes straight to
    /// the longest waiter, which is returned together with its new handle.
    pub fn release(&mut self, handle: PoolHandle) -> Result<Option<(ProcessId, PoolHandle)>, SimError> {
        if handle.pool != self.id || !self.held.remove(&handle.token) {
            return Err(SimError::HandleNotHeld {
                pool: handle.pool,
                token: handle.token,
            });
        }
        Ok(self.waiters.pop_front().map(|process| (process, self.grant())))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Units currently held
    pub fn in_use(&self) -> usize {
        self.held.len()
    }

    pub fn waiting(&self) -> usize {
        self.waiters.len()
    }

    fn grant(&mut self) -> PoolHandle {
        let token = self.next_token;
        self.next_token += 1;
        self.held.insert(token);
        PoolHandle { pool: self.id, token }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use slotmap::SlotMap;

    fn pids(n: usize) -> Vec<ProcessId> {
        let mut map: SlotMap<ProcessId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(ResourcePool::new(PoolId(0), 0), Err(SimError::InvalidCapacity(0))));
    }

    #[test]
    fn acquire_blocks_at_capacity() {
        let ids = pids(3);
        let mut pool = ResourcePool::new(PoolId(0), 2).unwrap();
        assert!(pool.acquire(ids[0]).is_some());
        assert!(pool.acquire(ids[1]).is_some());
        assert!(pool.acquire(ids[2]).is_none());
        assert_eq!(pool.in_use(), 2);
        assert_eq!(pool.waiting(), 1);
    }

    #[test]
    fn release_hands_unit_to_first_waiter() {
        let ids = pids(3);
        let mut pool = ResourcePool::new(PoolId(0), 1).unwrap();
        let first = pool.acquire(ids[0]).unwrap();
        assert!(pool.acquire(ids[1]).is_none());
        assert!(pool.acquire(ids[2]).is_none());

        let (next, handle) = pool.release(first).unwrap().unwrap();
        assert_eq!(next, ids[1]);
        assert_eq!(pool.in_use(), 1);

        let (next, _) = pool.release(handle).unwrap().unwrap();
        assert_eq!(next, ids[2]);
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let ids = pids(1);
        let mut a = ResourcePool::new(PoolId(0), 1).unwrap();
        let mut b = ResourcePool::new(PoolId(1), 1).unwrap();
        let handle = a.acquire(ids[0]).unwrap();
        assert!(matches!(b.release(handle), Err(SimError::HandleNotHeld { .. })));
    }

    proptest! {
        #[test]
        fn holders_never_exceed_capacity(
            capacity in 1usize..4,
            ops in proptest::collection::vec(any::<bool>(), 1..64),
        ) {
            let ids = pids(ops.len());
            let mut pool = ResourcePool::new(PoolId(0), capacity).unwrap();
            let mut held = VecDeque::new();
            for (step, acquire) in ops.into_iter().enumerate() {
                if acquire {
                    if let Some(handle) = pool.acquire(ids[step]) {
                        held.push_back(handle);
                    }
                } else if let Some(handle) = held.pop_front() {
                    if let Some((_, handed_over)) = pool.release(handle).unwrap() {
                        held.push_back(handed_over);
                    }
                }
                prop_assert!(pool.in_use() <= capacity);
                prop_assert_eq!(pool.in_use(), held.len());
            }
        }
    }
}
