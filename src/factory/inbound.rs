use super::errors::FactoryError;
use super::metrics::Sample;
use super::model::{DemandId, Token};
use super::plant::{Factory, ProductLine};
use crate::core::errors::SimError;
use crate::core::execution::Context;
use crate::core::process::{Process, Resume, Wait};
use crate::core::types::SimTime;
use log::debug;

/// Record a new demand and queue it for the release scheduler.
fn accept_demand(
    ctx: &mut Context<'_, Factory>,
    product: &str,
    line: ProductLine,
    quantity: u32,
    due_date: SimTime,
) -> Result<DemandId, SimError> {
    let now = ctx.now();
    let demand = ctx
        .model
        .orders
        .create_demand(product, quantity, now, due_date)?;
    ctx.model.stats_mut(product).demands += 1;
    if ctx.model.is_warmed_up(now) {
        ctx.model.metrics.product_mut(product).demand.push(Sample {
            time: now,
            value: f64::from(quantity),
        });
    }
    debug!(
        "t={} demand {:?} for {} x{} due {}",
        now, demand, product, quantity, due_date
    );
    ctx.put(line.inbound_demand, Token::Demand(demand))?;
    Ok(demand)
}

/// Demand drawn for the next arrival: quantity and due-date offset.
#[derive(Debug, Clone, Copy)]
struct NextArrival {
    quantity: u32,
    due_in: SimTime,
}

/// Generates random demand for one product from its demand model.
pub struct DemandGenerator {
    name: String,
    product: String,
    line: ProductLine,
    pending: Option<NextArrival>,
}

impl DemandGenerator {
    pub fn new(product: &str, line: ProductLine) -> Self {
        Self {
            name: format!("inbound[{}]", product),
            product: product.to_string(),
            line,
            pending: None,
        }
    }

    fn draw_next(&mut self, ctx: &mut Context<'_, Factory>) -> Result<Wait<Token>, SimError> {
        let factory = &mut *ctx.model;
        let Some(demand) = factory
            .config
            .products
            .get(&self.product)
            .ok_or_else(|| FactoryError::UnknownProduct(self.product.clone()))?
            .demand
            .as_ref()
        else {
            return Ok(Wait::Exit);
        };

        let interval = factory.sampler.duration(&demand.freq)?;
        let quantity = factory.sampler.sample(&demand.quantity)?;
        let due_in = factory.sampler.sample(&demand.duedate)?;
        self.pending = Some(NextArrival {
            quantity: quantity.round().max(1.0) as u32,
            due_in,
        });
        Ok(Wait::Timeout(interval))
    }
}

impl Process<Factory> for DemandGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(
        &mut self,
        ctx: &mut Context<'_, Factory>,
        signal: Resume<Token>,
    ) -> Result<Wait<Token>, SimError> {
        match (signal, self.pending.take()) {
            (Resume::Start, None) => {}
            (Resume::Elapsed, Some(arrival)) => {
                let due_date = ctx.now() + arrival.due_in;
                accept_demand(ctx, &self.product, self.line, arrival.quantity, due_date)?;
            }
            (signal, _) => return Err(SimError::unexpected(&self.name, signal)),
        }
        self.draw_next(ctx)
    }
}

/// A single demand injected by the driver at a chosen time.
pub struct ScheduledDemand {
    name: String,
    product: String,
    line: ProductLine,
    at: SimTime,
    quantity: u32,
    due_date: SimTime,
}

impl ScheduledDemand {
    pub fn new(product: &str, line: ProductLine, at: SimTime, quantity: u32, due_date: SimTime) -> Self {
        Self {
            name: format!("submitted[{}]", product),
            product: product.to_string(),
            line,
            at,
            quantity,
            due_date,
        }
    }
}

impl Process<Factory> for ScheduledDemand {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(
        &mut self,
        ctx: &mut Context<'_, Factory>,
        signal: Resume<Token>,
    ) -> Result<Wait<Token>, SimError> {
        match signal {
            Resume::Start if self.at > ctx.now() => Ok(Wait::Timeout(self.at - ctx.now())),
            Resume::Start | Resume::Elapsed => {
                accept_demand(ctx, &self.product, self.line, self.quantity, self.due_date)?;
                Ok(Wait::Exit)
            }
            other => Err(SimError::unexpected(&self.name, other)),
        }
    }
}
