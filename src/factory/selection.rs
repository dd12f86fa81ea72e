//! Choosing which waiting order a resource serves next.

use super::model::OrderId;
use crate::core::types::SimTime;
use thiserror::Error;

/// Snapshot of an order waiting in a resource's input queue.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedOrder {
    pub id: OrderId,
    pub product: String,
    pub quantity: u32,
    pub due_date: SimTime,
    pub priority: i8,
    pub completed_stages: usize,
    pub total_stages: usize,
    pub released: Option<SimTime>,
}

/// Picks the next order for `resource` among `candidates`, given in queue
/// order. Only consulted when more than one order is waiting.
///
/// Returning an id that is not among the candidates is a policy violation:
/// it is logged and counted, and the resource serves the head of the queue.
pub trait OrderSelector {
    fn select(&mut self, candidates: &[QueuedOrder], resource: &str) -> OrderId;
}

impl<F> OrderSelector for F
where
    F: FnMut(&[QueuedOrder], &str) -> OrderId,
{
    fn select(&mut self, candidates: &[QueuedOrder], resource: &str) -> OrderId {
        self(candidates, resource)
    }
}

/// Head of the queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fifo;

impl OrderSelector for Fifo {
    fn select(&mut self, candidates: &[QueuedOrder], _resource: &str) -> OrderId {
        candidates.first().map(|c| c.id).unwrap_or_default()
    }
}

/// Smallest due date, ties broken by queue position.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarliestDueDate;

impl OrderSelector for EarliestDueDate {
    fn select(&mut self, candidates: &[QueuedOrder], _resource: &str) -> OrderId {
        candidates
            .iter()
            .min_by(|a, b| a.due_date.total_cmp(&b.due_date))
            .map(|c| c.id)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("selector for '{resource}' chose {selected:?}, which is not waiting there")]
pub struct SelectionPolicyViolation {
    pub resource: String,
    pub selected: OrderId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn candidates(due_dates: &[SimTime]) -> Vec<QueuedOrder> {
        let mut ids: SlotMap<OrderId, ()> = SlotMap::with_key();
        due_dates
            .iter()
            .map(|&due_date| QueuedOrder {
                id: ids.insert(()),
                product: "p".to_string(),
                quantity: 1,
                due_date,
                priority: 0,
                completed_stages: 0,
                total_stages: 1,
                released: Some(0.0),
            })
            .collect()
    }

    #[test]
    fn fifo_takes_the_head() {
        let waiting = candidates(&[9.0, 3.0, 5.0]);
        assert_eq!(Fifo.select(&waiting, "r"), waiting[0].id);
    }

    #[test]
    fn edd_takes_earliest_and_breaks_ties_by_position() {
        let waiting = candidates(&[9.0, 3.0, 5.0, 3.0]);
        assert_eq!(EarliestDueDate.select(&waiting, "r"), waiting[1].id);
    }

    #[test]
    fn closures_are_selectors() {
        let waiting = candidates(&[1.0, 2.0]);
        let mut last = |orders: &[QueuedOrder], _: &str| orders[orders.len() - 1].id;
        assert_eq!(last.select(&waiting, "r"), waiting[1].id);
    }

    #[test]
    fn empty_candidates_yield_null_id() {
        assert_eq!(Fifo.select(&[], "r"), OrderId::default());
    }
}
