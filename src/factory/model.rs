//! Production and demand orders, and the arenas that hold them.

use super::errors::FactoryError;
use crate::core::types::SimTime;
use serde::Serialize;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct OrderId;
    pub struct DemandId;
}

/// What travels through the engine's message queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Order(OrderId),
    Demand(DemandId),
}

impl Token {
    pub fn as_order(&self) -> Option<OrderId> {
        match *self {
            Token::Order(id) => Some(id),
            Token::Demand(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Backlog,
    Queued,
    InSetup,
    Processing,
    InTransport,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionOrder {
    #[serde(skip)]
    pub id: OrderId,
    pub product: String,
    pub quantity: u32,
    pub due_date: SimTime,
    pub scheduled: SimTime,
    pub released: Option<SimTime>,
    pub priority: i8,
    pub total_stages: usize,
    pub completed_stages: usize,
    pub finished_at: Option<SimTime>,
    pub status: OrderStatus,
    pub resource: Option<String>,
    #[serde(skip)]
    pub demand: Option<DemandId>,
}

impl ProductionOrder {
    pub fn is_finished(&self) -> bool {
        self.status == OrderStatus::Finished
    }

    pub fn all_stages_done(&self) -> bool {
        self.completed_stages == self.total_stages
    }

    /// Record one more finished stage. Returns the new count.
    pub fn complete_stage(&mut self) -> Result<usize, FactoryError> {
        if self.completed_stages >= self.total_stages {
            return Err(FactoryError::StageOverflow {
                order: self.id,
                total: self.total_stages,
            });
        }
        self.completed_stages += 1;
        Ok(self.completed_stages)
    }

    pub fn finish(&mut self, now: SimTime) -> Result<(), FactoryError> {
        if self.is_finished() {
            return Err(FactoryError::AlreadyFinished(self.id));
        }
        if !self.all_stages_done() {
            return Err(FactoryError::StageOverflow {
                order: self.id,
                total: self.total_stages,
            });
        }
        self.finished_at = Some(now);
        self.status = OrderStatus::Finished;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandOrder {
    #[serde(skip)]
    pub id: DemandId,
    pub product: String,
    pub quantity: u32,
    pub arrived_at: SimTime,
    pub due_date: SimTime,
    pub delivered_at: Option<SimTime>,
    pub delivered: bool,
    pub processed: bool,
    #[serde(skip)]
    pub production_order: Option<OrderId>,
}

/// Parameters of a new production order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product: String,
    pub quantity: u32,
    pub due_date: SimTime,
    pub scheduled: SimTime,
    pub total_stages: usize,
    pub demand: Option<DemandId>,
}

/// Both order arenas, bounded to the same number of live entries each.
#[derive(Debug)]
pub struct OrderBook {
    orders: SlotMap<OrderId, ProductionOrder>,
    demands: SlotMap<DemandId, DemandOrder>,
    capacity: usize,
}

impl OrderBook {
    pub fn new(capacity: usize) -> Self {
        Self {
            orders: SlotMap::with_key(),
            demands: SlotMap::with_key(),
            capacity,
        }
    }

    pub fn create_order(&mut self, new: NewOrder) -> Result<OrderId, FactoryError> {
        if self.orders.len() >= self.capacity {
            return Err(FactoryError::ArenaExhausted {
                capacity: self.capacity,
            });
        }
        let id = self.orders.insert_with_key(|id| ProductionOrder {
            id,
            product: new.product,
            quantity: new.quantity,
            due_date: new.due_date,
            scheduled: new.scheduled,
            released: None,
            priority: 0,
            total_stages: new.total_stages,
            completed_stages: 0,
            finished_at: None,
            status: OrderStatus::Backlog,
            resource: None,
            demand: new.demand,
        });
        if let Some(demand) = new.demand.and_then(|d| self.demands.get_mut(d)) {
            demand.production_order = Some(id);
        }
        Ok(id)
    }

    pub fn create_demand(
        &mut self,
        product: &str,
        quantity: u32,
        arrived_at: SimTime,
        due_date: SimTime,
    ) -> Result<DemandId, FactoryError> {
        if self.demands.len() >= self.capacity {
            return Err(FactoryError::ArenaExhausted {
                capacity: self.capacity,
            });
        }
        Ok(self.demands.insert_with_key(|id| DemandOrder {
            id,
            product: product.to_string(),
            quantity,
            arrived_at,
            due_date,
            delivered_at: None,
            delivered: false,
            processed: false,
            production_order: None,
        }))
    }

    pub fn order(&self, id: OrderId) -> Result<&ProductionOrder, FactoryError> {
        self.orders.get(id).ok_or(FactoryError::UnknownOrder(id))
    }

    pub fn order_mut(&mut self, id: OrderId) -> Result<&mut ProductionOrder, FactoryError> {
        self.orders.get_mut(id).ok_or(FactoryError::UnknownOrder(id))
    }

    pub fn demand(&self, id: DemandId) -> Result<&DemandOrder, FactoryError> {
        self.demands.get(id).ok_or(FactoryError::UnknownDemand(id))
    }

    pub fn demand_mut(&mut self, id: DemandId) -> Result<&mut DemandOrder, FactoryError> {
        self.demands.get_mut(id).ok_or(FactoryError::UnknownDemand(id))
    }

    /// Mark an order finished. It is dropped from the arena straight away
    /// when its demand has already been settled; a copy is returned either way.
    pub fn finish_order(&mut self, id: OrderId, now: SimTime) -> Result<ProductionOrder, FactoryError> {
        let order = self.order_mut(id)?;
        order.finish(now)?;
        let finished = order.clone();
        if finished.demand.is_none() {
            self.orders.remove(id);
        }
        Ok(finished)
    }

    /// Remove a delivered or lost demand. Its production order goes with it
    /// when already finished, otherwise it is detached and dropped on finish.
    pub fn settle_demand(&mut self, id: DemandId) -> Result<DemandOrder, FactoryError> {
        let demand = self.demands.remove(id).ok_or(FactoryError::UnknownDemand(id))?;
        if let Some(order_id) = demand.production_order {
            let finished = match self.orders.get_mut(order_id) {
                Some(order) if order.is_finished() => true,
                Some(order) => {
                    order.demand = None;
                    false
                }
                None => false,
            };
            if finished {
                self.orders.remove(order_id);
            }
        }
        Ok(demand)
    }

    pub fn orders(&self) -> impl Iterator<Item = &ProductionOrder> {
        self.orders.values()
    }

    pub fn demands(&self) -> impl Iterator<Item = &DemandOrder> {
        self.demands.values()
    }

    pub fn live_orders(&self) -> usize {
        self.orders.len()
    }

    pub fn live_demands(&self) -> usize {
        self.demands.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn book_with_order(stages: usize) -> (OrderBook, DemandId, OrderId) {
        let mut book = OrderBook::new(10);
        let demand = book.create_demand("p", 3, 0.0, 10.0).unwrap();
        let order = book
            .create_order(NewOrder {
                product: "p".to_string(),
                quantity: 3,
                due_date: 10.0,
                scheduled: 0.0,
                total_stages: stages,
                demand: Some(demand),
            })
            .unwrap();
        (book, demand, order)
    }

    #[test]
    fn new_order_links_its_demand() {
        let (book, demand, order) = book_with_order(2);
        assert_eq!(book.demand(demand).unwrap().production_order, Some(order));
        let order = book.order(order).unwrap();
        assert_eq!(order.status, OrderStatus::Backlog);
        assert_eq!(order.demand, Some(demand));
        assert_eq!(order.priority, 0);
    }

    #[test]
    fn stage_overflow_is_an_error() {
        let (mut book, _, id) = book_with_order(1);
        let order = book.order_mut(id).unwrap();
        assert_eq!(order.complete_stage().unwrap(), 1);
        assert!(matches!(
            order.complete_stage(),
            Err(FactoryError::StageOverflow { total: 1, .. })
        ));
    }

    #[test]
    fn finishing_early_or_twice_fails() {
        let (mut book, _, id) = book_with_order(1);
        let order = book.order_mut(id).unwrap();
        assert!(order.finish(1.0).is_err());
        order.complete_stage().unwrap();
        order.finish(2.0).unwrap();
        assert_eq!(order.finished_at, Some(2.0));
        assert!(matches!(order.finish(3.0), Err(FactoryError::AlreadyFinished(_))));
    }

    #[test]
    fn settled_before_finish_drops_order_on_finish() {
        let (mut book, demand, order) = book_with_order(1);
        book.settle_demand(demand).unwrap();
        assert_eq!(book.live_demands(), 0);
        assert_eq!(book.live_orders(), 1);

        book.order_mut(order).unwrap().complete_stage().unwrap();
        let finished = book.finish_order(order, 4.0).unwrap();
        assert_eq!(finished.finished_at, Some(4.0));
        assert_eq!(book.live_orders(), 0);
    }

    #[test]
    fn finished_before_settle_drops_order_on_settle() {
        let (mut book, demand, order) = book_with_order(1);
        book.order_mut(order).unwrap().complete_stage().unwrap();
        book.finish_order(order, 4.0).unwrap();
        assert_eq!(book.live_orders(), 1);

        let settled = book.settle_demand(demand).unwrap();
        assert_eq!(settled.quantity, 3);
        assert_eq!(book.live_orders(), 0);
        assert!(matches!(book.order(order), Err(FactoryError::UnknownOrder(_))));
    }

    #[test]
    fn arena_capacity_is_enforced() {
        let mut book = OrderBook::new(2);
        book.create_demand("p", 1, 0.0, 1.0).unwrap();
        let second = book.create_demand("p", 1, 0.0, 1.0).unwrap();
        assert!(matches!(
            book.create_demand("p", 1, 0.0, 1.0),
            Err(FactoryError::ArenaExhausted { capacity: 2 })
        ));

        book.settle_demand(second).unwrap();
        assert!(book.create_demand("p", 1, 0.0, 1.0).is_ok());
    }

    #[test]
    fn recycled_slot_does_not_alias_old_id() {
        let mut book = OrderBook::new(1);
        let old = book.create_demand("p", 1, 0.0, 1.0).unwrap();
        book.settle_demand(old).unwrap();
        let new = book.create_demand("p", 2, 0.0, 1.0).unwrap();
        assert_ne!(old, new);
        assert!(book.demand(old).is_err());
    }

    proptest! {
        #[test]
        fn stage_count_never_exceeds_total(total in 1usize..8, attempts in 0usize..16) {
            let (mut book, _, id) = book_with_order(total);
            let order = book.order_mut(id).unwrap();
            let mut last = 0;
            for _ in 0..attempts {
                match order.complete_stage() {
                    Ok(count) => {
                        prop_assert!(count > last);
                        last = count;
                    }
                    Err(_) => prop_assert_eq!(order.completed_stages, total),
                }
                prop_assert!(order.completed_stages <= order.total_stages);
            }
            prop_assert_eq!(order.completed_stages, attempts.min(total));
        }
    }
}
