use super::process::Resume;
use super::types::{ProcessId, SimTime};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
pub struct ScheduledEvent<T> {
    pub time: SimTime,
    pub sequence_num: u64,
    pub process: ProcessId,
    pub signal: Resume<T>,
}

impl<T> PartialEq for ScheduledEvent<T> {
    fn eq(&self, other: &Self) -> bool {
        self.time.total_cmp(&other.time) == Ordering::Equal && self.sequence_num == other.sequence_num
    }
}

impl<T> Eq for ScheduledEvent<T> {}

impl<T> PartialOrd for ScheduledEvent<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ScheduledEvent<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Pending resumptions ordered by `(time, insertion sequence)`.
pub struct EventScheduler<T> {
    event_queue: BinaryHeap<ScheduledEvent<T>>,
    sequence_counter: u64,
}

impl<T> EventScheduler<T> {
    pub fn new() -> Self {
        Self {
            event_queue: BinaryHeap::new(),
            sequence_counter: 0,
        }
    }

    /// Schedule a resumption at an absolute time
    pub fn schedule_at(&mut self, time: SimTime, process: ProcessId, signal: Resume<T>) {
        self.event_queue.push(ScheduledEvent {
            time,
            sequence_num: self.sequence_counter,
            process,
            signal,
        });
        self.sequence_counter += 1;
    }

    /// Remove and return the earliest resumption
    pub fn pop_next(&mut self) -> Option<ScheduledEvent<T>> {
        self.event_queue.pop()
    }

    /// Time of the earliest resumption without removing it
    pub fn peek_next_time(&self) -> Option<SimTime> {
        self.event_queue.peek().map(|event| event.time)
    }

    pub fn has_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.event_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_queue.is_empty()
    }
}

impl<T> Default for EventScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
