//! Delivery of finished goods against demand, with KPI accounting.

use super::errors::FactoryError;
use super::metrics::Sample;
use super::model::{DemandId, Token};
use super::plant::{Factory, ProductLine};
use super::settings::DeliveryMode;
use crate::core::errors::SimError;
use crate::core::execution::Context;
use crate::core::process::{Process, Resume, Wait};
use log::debug;

/// Close a demand: stamp it, book the KPIs, free its work in process and
/// drop it from the arena.
fn settle(
    ctx: &mut Context<'_, Factory>,
    product: &str,
    line: ProductLine,
    demand_id: DemandId,
    delivered: f64,
    lost: f64,
) -> Result<(), SimError> {
    let now = ctx.now();
    let demand = ctx.model.orders.demand_mut(demand_id)?;
    demand.delivered_at = Some(now);
    demand.delivered = delivered > 0.0;
    let (quantity, due_date, arrived_at) = (demand.quantity, demand.due_date, demand.arrived_at);

    if ctx.model.is_warmed_up(now) {
        if delivered > 0.0 {
            let on_time = now <= due_date;
            let kpi = if on_time {
                line.delivered_ontime
            } else {
                line.delivered_late
            };
            ctx.put_level(kpi, delivered)?;

            let series = ctx.model.metrics.product_mut(product);
            let sample = Sample {
                time: now,
                value: delivered,
            };
            if on_time {
                series.delivered_ontime.push(sample);
                series.earliness.push(Sample {
                    time: now,
                    value: due_date - now,
                });
            } else {
                series.delivered_late.push(sample);
                series.tardiness.push(Sample {
                    time: now,
                    value: now - due_date,
                });
            }
            series.lead_time.push(Sample {
                time: now,
                value: now - arrived_at,
            });
        }
        if lost > 0.0 {
            ctx.put_level(line.lost_sales, lost)?;
            ctx.model
                .metrics
                .product_mut(product)
                .lost_sales
                .push(Sample { time: now, value: lost });
        }
    }

    if !ctx.try_take(line.wip, f64::from(quantity))? {
        return Err(FactoryError::WipShortfall {
            product: product.to_string(),
            demand: demand_id,
            quantity,
            reserved: ctx.level(line.wip)?,
        }
        .into());
    }
    ctx.model.orders.settle_demand(demand_id)?;
    debug!(
        "t={} demand {:?} settled: {} delivered, {} lost",
        now, demand_id, delivered, lost
    );
    Ok(())
}

/// Per-product delivery loop.
pub struct Delivery {
    name: String,
    product: String,
    line: ProductLine,
    mode: DeliveryMode,
    /// Demand waiting for goods in `asReady` mode
    waiting: Option<DemandId>,
}

impl Delivery {
    pub fn new(product: &str, line: ProductLine, mode: DeliveryMode) -> Self {
        Self {
            name: format!("delivery[{}]", product),
            product: product.to_string(),
            line,
            mode,
            waiting: None,
        }
    }

    fn next_demand(&self) -> Result<Wait<Token>, SimError> {
        Ok(Wait::Get(self.line.outbound_demand))
    }

    fn handle(&mut self, ctx: &mut Context<'_, Factory>, demand_id: DemandId) -> Result<Wait<Token>, SimError> {
        let quantity = f64::from(ctx.model.orders.demand(demand_id)?.quantity);
        match self.mode {
            DeliveryMode::AsReady => {
                self.waiting = Some(demand_id);
                Ok(Wait::Take(self.line.finished_goods, quantity))
            }
            DeliveryMode::OnDue => {
                ctx.spawn(DueDateDelivery::new(&self.product, self.line, demand_id));
                self.next_demand()
            }
            DeliveryMode::Instantly => {
                let available = ctx.level(self.line.finished_goods)?.min(quantity).floor();
                let delivered = if available > 0.0 && ctx.try_take(self.line.finished_goods, available)? {
                    available
                } else {
                    0.0
                };
                settle(ctx, &self.product, self.line, demand_id, delivered, quantity - delivered)?;
                self.next_demand()
            }
        }
    }
}

impl Process<Factory> for Delivery {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(
        &mut self,
        ctx: &mut Context<'_, Factory>,
        signal: Resume<Token>,
    ) -> Result<Wait<Token>, SimError> {
        match (signal, self.waiting.take()) {
            (Resume::Start, None) => self.next_demand(),
            (Resume::Item(Token::Demand(demand)), None) => self.handle(ctx, demand),
            (Resume::Taken(amount), Some(demand)) => {
                settle(ctx, &self.product, self.line, demand, amount, 0.0)?;
                self.next_demand()
            }
            (signal, _) => Err(SimError::unexpected(&self.name, signal)),
        }
    }
}

/// Holds one demand until its due date, then waits for the goods.
pub struct DueDateDelivery {
    name: String,
    product: String,
    line: ProductLine,
    demand: DemandId,
}

impl DueDateDelivery {
    pub fn new(product: &str, line: ProductLine, demand: DemandId) -> Self {
        Self {
            name: format!("due-delivery[{}]", product),
            product: product.to_string(),
            line,
            demand,
        }
    }

    fn take_goods(&self, ctx: &mut Context<'_, Factory>) -> Result<Wait<Token>, SimError> {
        let quantity = f64::from(ctx.model.orders.demand(self.demand)?.quantity);
        Ok(Wait::Take(self.line.finished_goods, quantity))
    }
}

impl Process<Factory> for DueDateDelivery {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(
        &mut self,
        ctx: &mut Context<'_, Factory>,
        signal: Resume<Token>,
    ) -> Result<Wait<Token>, SimError> {
        match signal {
            Resume::Start => {
                let due_date = ctx.model.orders.demand(self.demand)?.due_date;
                let now = ctx.now();
                if due_date > now {
                    Ok(Wait::Timeout(due_date - now))
                } else {
                    self.take_goods(ctx)
                }
            }
            Resume::Elapsed => self.take_goods(ctx),
            Resume::Taken(amount) => {
                settle(ctx, &self.product, self.line, self.demand, amount, 0.0)?;
                Ok(Wait::Exit)
            }
            other => Err(SimError::unexpected(&self.name, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::config::{FactoryConfig, ProcessGraph, ProductConfig, ResourceConfig};
    use crate::factory::distribution::Distribution;
    use crate::factory::simulation::{FactoryBuilder, FactorySimulation};
    use crate::factory::SimulationConfig;

    /// Settles one demand as soon as it starts.
    struct SettleNow {
        line: ProductLine,
        demand: DemandId,
    }

    impl Process<Factory> for SettleNow {
        fn name(&self) -> &str {
            "settle-now"
        }

        fn resume(
            &mut self,
            ctx: &mut Context<'_, Factory>,
            _signal: Resume<Token>,
        ) -> Result<Wait<Token>, SimError> {
            settle(ctx, "p", self.line, self.demand, 2.0, 0.0)?;
            Ok(Wait::Exit)
        }
    }

    fn plant() -> FactorySimulation {
        let config = FactoryConfig::new()
            .with_resource("m", ResourceConfig::new(1))
            .with_product(
                "p",
                ProductConfig::new(ProcessGraph::new().with_stage("work", "m", Distribution::constant(1.0))),
            );
        FactoryBuilder::new(config)
            .settings(SimulationConfig::new())
            .with_inbound(false)
            .build()
            .unwrap()
    }

    fn settle_unscheduled(sim: &mut FactorySimulation, reserved: f64) -> Result<f64, SimError> {
        let line = sim.factory().product_line("p").unwrap();
        let demand = sim
            .engine_mut()
            .model_mut()
            .orders
            .create_demand("p", 2, 0.0, 10.0)
            .unwrap();
        sim.engine_mut().put_level(line.wip, reserved).unwrap();
        sim.engine_mut().spawn(SettleNow { line, demand });
        sim.run(1.0)
    }

    #[test]
    fn settlement_releases_reserved_wip() {
        let mut sim = plant();
        settle_unscheduled(&mut sim, 2.0).unwrap();
        assert_eq!(sim.work_in_process("p").unwrap(), 0.0);
        assert_eq!(sim.factory().orders.live_demands(), 0);
        assert_eq!(sim.metrics().products["p"].delivered_ontime.len(), 1);
    }

    #[test]
    fn settlement_without_reserved_wip_is_an_error() {
        let mut sim = plant();
        let error = settle_unscheduled(&mut sim, 1.0).unwrap_err();
        assert!(error.to_string().contains("only 1 of 2 units in process"), "{error}");
        assert_eq!(sim.work_in_process("p").unwrap(), 1.0);
    }
}
