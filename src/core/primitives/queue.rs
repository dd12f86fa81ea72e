use crate::core::process::Predicate;
use crate::core::types::ProcessId;
use std::collections::VecDeque;

struct Getter<T> {
    process: ProcessId,
    filter: Option<Predicate<T>>,
}

/// Insertion-ordered store with FIFO and filtered retrieval.
///
/// Blocked getters are kept in the order their wait began. When an item
/// arrives the getters are scanned in that order and the first one whose
/// filter accepts it takes it.
pub struct MessageQueue<T> {
    items: VecDeque<T>,
    getters: VecDeque<Getter<T>>,
}

impl<T> MessageQueue<T> {
    pub fn new() -> Self {
        Self {
            items: VecDeque::new(),
            getters: VecDeque::new(),
        }
    }

    /// Store an item. Returns the getters served by it, with what they got.
    pub fn put(&mut self, item: T) -> Vec<(ProcessId, T)> {
        self.items.push_back(item);
        self.serve_getters()
    }

    /// Take an item for `process` right away, or register it as a waiter.
    pub fn get(&mut self, process: ProcessId, filter: Option<Predicate<T>>) -> Option<T> {
        if let Some(index) = self.position(filter.as_ref()) {
            return self.items.remove(index);
        }
        self.getters.push_back(Getter { process, filter });
        None
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of processes blocked on this queue
    pub fn waiting(&self) -> usize {
        self.getters.len()
    }

    fn position(&self, filter: Option<&Predicate<T>>) -> Option<usize> {
        match filter {
            Some(accepts) => self.items.iter().position(|item| accepts(item)),
            None if self.items.is_empty() => None,
            None => Some(0),
        }
    }

    fn serve_getters(&mut self) -> Vec<(ProcessId, T)> {
        let mut served = Vec::new();
        let mut index = 0;
        while index < self.getters.len() && !self.items.is_empty() {
            match self.position(self.getters[index].filter.as_ref()) {
                Some(position) => {
                    let getter = self.getters.remove(index);
                    let item = self.items.remove(position);
                    if let (Some(getter), Some(item)) = (getter, item) {
                        served.push((getter.process, item));
                    }
                }
                None => index += 1,
            }
        }
        served
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn pids(n: usize) -> Vec<ProcessId> {
        let mut map: SlotMap<ProcessId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn fifo_get_returns_head() {
        let ids = pids(1);
        let mut queue = MessageQueue::new();
        assert!(queue.put(1).is_empty());
        assert!(queue.put(2).is_empty());
        assert_eq!(queue.get(ids[0], None), Some(1));
        assert_eq!(queue.get(ids[0], None), Some(2));
        assert!(queue.is_empty());
    }

    #[test]
    fn empty_get_blocks_until_put() {
        let ids = pids(1);
        let mut queue = MessageQueue::new();
        assert_eq!(queue.get(ids[0], None), None);
        assert_eq!(queue.waiting(), 1);
        assert_eq!(queue.put(9), vec![(ids[0], 9)]);
        assert_eq!(queue.waiting(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn matching_get_skips_non_matching_items() {
        let ids = pids(1);
        let mut queue = MessageQueue::new();
        for value in [1, 2, 3, 4] {
            queue.put(value);
        }
        assert_eq!(queue.get(ids[0], Some(Box::new(|v: &i32| v % 2 == 0))), Some(2));
        assert_eq!(queue.items().copied().collect::<Vec<_>>(), vec![1, 3, 4]);
    }

    #[test]
    fn waiters_are_served_in_wait_order() {
        let ids = pids(3);
        let mut queue = MessageQueue::new();
        assert_eq!(queue.get(ids[0], None), None);
        assert_eq!(queue.get(ids[1], None), None);
        assert_eq!(queue.get(ids[2], None), None);

        assert_eq!(queue.put(10), vec![(ids[0], 10)]);
        assert_eq!(queue.put(20), vec![(ids[1], 20)]);
        assert_eq!(queue.put(30), vec![(ids[2], 30)]);
    }

    #[test]
    fn one_item_satisfies_exactly_one_waiter() {
        let ids = pids(2);
        let mut queue = MessageQueue::new();
        queue.get(ids[0], Some(Box::new(|v: &i32| *v > 5)));
        queue.get(ids[1], Some(Box::new(|v: &i32| *v > 5)));

        assert_eq!(queue.put(7), vec![(ids[0], 7)]);
        assert_eq!(queue.waiting(), 1);
    }

    #[test]
    fn unsatisfied_filter_does_not_block_later_waiters() {
        let ids = pids(2);
        let mut queue = MessageQueue::new();
        queue.get(ids[0], Some(Box::new(|v: &i32| *v == 100)));
        queue.get(ids[1], None);

        assert_eq!(queue.put(1), vec![(ids[1], 1)]);
        assert_eq!(queue.put(100), vec![(ids[0], 100)]);
    }
}
