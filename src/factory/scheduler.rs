use super::errors::FactoryError;
use super::model::{DemandId, NewOrder, OrderId, OrderStatus, Token};
use super::plant::{Factory, ProductLine};
use crate::core::errors::SimError;
use crate::core::execution::Context;
use crate::core::process::{Process, Resume, Wait};
use crate::core::types::SimTime;
use log::debug;

/// Turns accepted demand of one product into production orders.
///
/// For every demand it creates an order, reserves its quantity as work in
/// process, passes the demand on to delivery and starts a [`Release`] that
/// puts the order on the shop floor at its scheduled time.
pub struct ReleaseScheduler {
    name: String,
    product: String,
    line: ProductLine,
}

impl ReleaseScheduler {
    pub fn new(product: &str, line: ProductLine) -> Self {
        Self {
            name: format!("scheduler[{}]", product),
            product: product.to_string(),
            line,
        }
    }

    fn accept(&mut self, ctx: &mut Context<'_, Factory>, demand_id: DemandId) -> Result<(), SimError> {
        let now = ctx.now();
        let (quantity, due_date) = {
            let demand = ctx.model.orders.demand_mut(demand_id)?;
            demand.processed = true;
            (demand.quantity, demand.due_date)
        };
        let product_config = ctx.model.product_config(&self.product)?;
        let total_stages = product_config.processes.len();
        let scheduled = ctx.model.settings.release_policy.scheduled_release(
            now,
            due_date,
            product_config.constraint_time,
        );

        let order = ctx.model.orders.create_order(NewOrder {
            product: self.product.clone(),
            quantity,
            due_date,
            scheduled,
            total_stages,
            demand: Some(demand_id),
        })?;
        ctx.model.stats_mut(&self.product).released_orders += 1;

        ctx.put_level(self.line.wip, f64::from(quantity))?;
        ctx.put(self.line.outbound_demand, Token::Demand(demand_id))?;
        debug!(
            "t={} demand {:?} accepted as order {:?}, release at {}",
            now, demand_id, order, scheduled
        );
        ctx.spawn(Release::new(&self.product, order, scheduled));
        Ok(())
    }
}

impl Process<Factory> for ReleaseScheduler {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(
        &mut self,
        ctx: &mut Context<'_, Factory>,
        signal: Resume<Token>,
    ) -> Result<Wait<Token>, SimError> {
        match signal {
            Resume::Start => {}
            Resume::Item(Token::Demand(demand)) => self.accept(ctx, demand)?,
            other => return Err(SimError::unexpected(&self.name, other)),
        }
        Ok(Wait::Get(self.line.inbound_demand))
    }
}

/// Waits until an order's scheduled time, then queues it at its first
/// resource.
pub struct Release {
    name: String,
    product: String,
    order: OrderId,
    scheduled: SimTime,
}

impl Release {
    pub fn new(product: &str, order: OrderId, scheduled: SimTime) -> Self {
        Self {
            name: format!("release[{}]", product),
            product: product.to_string(),
            order,
            scheduled,
        }
    }

    fn release(&mut self, ctx: &mut Context<'_, Factory>) -> Result<Wait<Token>, SimError> {
        let now = ctx.now();
        let first = ctx
            .model
            .product_config(&self.product)?
            .processes
            .first_resource()
            .map(str::to_string)
            .ok_or_else(|| FactoryError::UnknownStage {
                product: self.product.clone(),
                stage: 0,
            })?;
        let line = ctx.model.resource_line(&first)?;

        let order = ctx.model.orders.order_mut(self.order)?;
        order.released = Some(now);
        order.status = OrderStatus::Queued;
        order.resource = Some(first);
        debug!("t={} order {:?} released", now, self.order);

        ctx.put(line.input, Token::Order(self.order))?;
        Ok(Wait::Exit)
    }
}

impl Process<Factory> for Release {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(
        &mut self,
        ctx: &mut Context<'_, Factory>,
        signal: Resume<Token>,
    ) -> Result<Wait<Token>, SimError> {
        match signal {
            Resume::Start if self.scheduled > ctx.now() => {
                Ok(Wait::Timeout(self.scheduled - ctx.now()))
            }
            Resume::Start | Resume::Elapsed => self.release(ctx),
            other => Err(SimError::unexpected(&self.name, other)),
        }
    }
}
