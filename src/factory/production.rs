//! Processes that move orders through the resource graph.
//!
//! Each resource runs three long-lived processes: an optional breakdown
//! timer driving the resource gate, a dispatcher that picks and admits
//! orders, and a transporter that routes finished stages onwards. Every
//! admitted order is worked by its own short-lived [`Job`].

use super::errors::FactoryError;
use super::metrics::{Interval, Sample};
use super::model::{OrderId, OrderStatus, Token};
use super::plant::{Factory, ResourceLine};
use crate::core::errors::SimError;
use crate::core::execution::Context;
use crate::core::process::{Process, Resume, Wait};
use crate::core::types::{PoolHandle, SimTime};
use log::debug;

#[derive(Debug, Clone, Copy)]
enum BreakdownState {
    Idle,
    Up { ttr: SimTime },
    Down { since: SimTime },
}

/// Closes the resource gate for `ttr` after every `tbf`.
///
/// Work already running is not interrupted; the dispatcher only stops
/// admitting new jobs while the gate is closed.
pub struct Breakdowns {
    name: String,
    resource: String,
    line: ResourceLine,
    state: BreakdownState,
}

impl Breakdowns {
    pub fn new(resource: &str, line: ResourceLine) -> Self {
        Self {
            name: format!("breakdowns[{}]", resource),
            resource: resource.to_string(),
            line,
            state: BreakdownState::Idle,
        }
    }

    fn next_failure(&mut self, ctx: &mut Context<'_, Factory>) -> Result<Wait<Token>, SimError> {
        match ctx.model.breakdown_times(&self.resource)? {
            Some((tbf, ttr)) => {
                self.state = BreakdownState::Up { ttr };
                Ok(Wait::Timeout(tbf))
            }
            None => Ok(Wait::Exit),
        }
    }
}

impl Process<Factory> for Breakdowns {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(
        &mut self,
        ctx: &mut Context<'_, Factory>,
        signal: Resume<Token>,
    ) -> Result<Wait<Token>, SimError> {
        match (self.state, signal) {
            (BreakdownState::Idle, Resume::Start) => self.next_failure(ctx),
            (BreakdownState::Up { ttr }, Resume::Elapsed) => {
                let now = ctx.now();
                ctx.close_gate(self.line.gate)?;
                debug!("t={} resource '{}' down for {}", now, self.resource, ttr);
                self.state = BreakdownState::Down { since: now };
                Ok(Wait::Timeout(ttr))
            }
            (BreakdownState::Down { since }, Resume::Elapsed) => {
                let now = ctx.now();
                ctx.open_gate(self.line.gate)?;
                debug!("t={} resource '{}' back up", now, self.resource);
                if ctx.model.is_warmed_up(now) {
                    ctx.model
                        .metrics
                        .resource_mut(&self.resource)
                        .breakdowns
                        .push(Interval {
                            start: since,
                            duration: now - since,
                        });
                }
                self.next_failure(ctx)
            }
            (_, signal) => Err(SimError::unexpected(&self.name, signal)),
        }
    }
}

#[derive(Debug)]
enum DispatchState {
    Idle,
    AwaitingUp,
    Selecting,
    Acquiring(OrderId),
    /// Holding a unit while the resource is down
    Reopening(OrderId, PoolHandle),
}

/// Service loop of one resource.
///
/// Waits for the resource to be up, takes the next order (FIFO, or the
/// selector's choice when more than one is waiting), acquires a unit of
/// capacity and hands both to a new [`Job`].
pub struct Dispatcher {
    name: String,
    resource: String,
    line: ResourceLine,
    state: DispatchState,
    /// Product and stage of the last job, for setup carry-over
    last_setup: Option<(String, usize)>,
}

impl Dispatcher {
    pub fn new(resource: &str, line: ResourceLine) -> Self {
        Self {
            name: format!("dispatcher[{}]", resource),
            resource: resource.to_string(),
            line,
            state: DispatchState::Idle,
            last_setup: None,
        }
    }

    fn await_up(&mut self) -> Result<Wait<Token>, SimError> {
        self.state = DispatchState::AwaitingUp;
        Ok(Wait::Until(self.line.gate))
    }

    fn take_next(&mut self, ctx: &mut Context<'_, Factory>) -> Result<Wait<Token>, SimError> {
        self.state = DispatchState::Selecting;
        if !ctx.model.has_selector() {
            return Ok(Wait::Get(self.line.input));
        }
        let waiting: Vec<OrderId> = ctx
            .items(self.line.input)?
            .filter_map(Token::as_order)
            .collect();
        match ctx.model.select_order(&self.resource, &waiting)? {
            Some(chosen) => Ok(Wait::GetMatching(
                self.line.input,
                Box::new(move |token: &Token| *token == Token::Order(chosen)),
            )),
            None => Ok(Wait::Get(self.line.input)),
        }
    }

    fn dispatch(
        &mut self,
        ctx: &mut Context<'_, Factory>,
        order: OrderId,
        handle: PoolHandle,
    ) -> Result<Wait<Token>, SimError> {
        let now = ctx.now();
        let (product, stage) = {
            let order = ctx.model.orders.order(order)?;
            (order.product.clone(), order.completed_stages)
        };

        let carried_over = matches!(
            &self.last_setup,
            Some((last_product, last_stage)) if *last_product == product && *last_stage == stage
        );
        let setup = if carried_over {
            0.0
        } else {
            let setup = ctx.model.setup_time(&self.resource)?;
            if ctx.model.is_warmed_up(now) {
                ctx.model
                    .metrics
                    .resource_mut(&self.resource)
                    .setups
                    .push(Sample { time: now, value: setup });
            }
            setup
        };
        self.last_setup = Some((product.clone(), stage));

        debug!(
            "t={} '{}' admits {:?} ({} stage {}), setup {}",
            now, self.resource, order, product, stage, setup
        );
        ctx.spawn(Job {
            name: format!("job[{}]", self.resource),
            resource: self.resource.clone(),
            line: self.line,
            order,
            product,
            stage,
            handle: Some(handle),
            setup,
            state: JobState::Created,
        });
        self.await_up()
    }
}

impl Process<Factory> for Dispatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(
        &mut self,
        ctx: &mut Context<'_, Factory>,
        signal: Resume<Token>,
    ) -> Result<Wait<Token>, SimError> {
        let state = std::mem::replace(&mut self.state, DispatchState::Idle);
        match (state, signal) {
            (DispatchState::Idle, Resume::Start) => self.await_up(),
            (DispatchState::AwaitingUp, Resume::Opened) => self.take_next(ctx),
            (DispatchState::Selecting, Resume::Item(Token::Order(order))) => {
                self.state = DispatchState::Acquiring(order);
                Ok(Wait::Acquire(self.line.pool))
            }
            (DispatchState::Acquiring(order), Resume::Acquired(handle)) => {
                if ctx.is_open(self.line.gate)? {
                    self.dispatch(ctx, order, handle)
                } else {
                    self.state = DispatchState::Reopening(order, handle);
                    Ok(Wait::Until(self.line.gate))
                }
            }
            (DispatchState::Reopening(order, handle), Resume::Opened) => {
                self.dispatch(ctx, order, handle)
            }
            (_, signal) => Err(SimError::unexpected(&self.name, signal)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum JobState {
    Created,
    SettingUp,
    /// `remaining` units have not started yet
    Processing { started: SimTime, remaining: u32 },
}

/// One order's visit to one resource: setup, then one processing draw per
/// unit, then the capacity unit goes back and the order goes to transport.
pub struct Job {
    name: String,
    resource: String,
    line: ResourceLine,
    order: OrderId,
    product: String,
    stage: usize,
    handle: Option<PoolHandle>,
    setup: SimTime,
    state: JobState,
}

impl Job {
    fn next_unit(&mut self, ctx: &mut Context<'_, Factory>) -> Result<Wait<Token>, SimError> {
        let JobState::Processing { started, remaining } = self.state else {
            return Err(SimError::unexpected(&self.name, &self.state));
        };
        if remaining == 0 {
            return self.complete(ctx, started);
        }
        self.state = JobState::Processing {
            started,
            remaining: remaining - 1,
        };
        let duration = ctx.model.processing_time(&self.product, self.stage)?;
        Ok(Wait::Timeout(duration))
    }

    fn complete(&mut self, ctx: &mut Context<'_, Factory>, started: SimTime) -> Result<Wait<Token>, SimError> {
        let now = ctx.now();
        let order = ctx.model.orders.order_mut(self.order)?;
        order.complete_stage()?;
        order.status = OrderStatus::InTransport;

        if let Some(handle) = self.handle.take() {
            ctx.release(handle)?;
        }
        ctx.put(self.line.output, Token::Order(self.order))?;

        if ctx.model.is_warmed_up(now) {
            ctx.model
                .metrics
                .resource_mut(&self.resource)
                .utilization
                .push(Sample {
                    time: now,
                    value: now - started,
                });
        }
        Ok(Wait::Exit)
    }
}

impl Process<Factory> for Job {
    fn name(&self) -> &str {
        &self.name
    }

    fn resume(
        &mut self,
        ctx: &mut Context<'_, Factory>,
        signal: Resume<Token>,
    ) -> Result<Wait<Token>, SimError> {
        match (self.state, signal) {
            (JobState::Created, Resume::Start) => {
                let order = ctx.model.orders.order_mut(self.order)?;
                order.status = OrderStatus::InSetup;
                order.resource = Some(self.resource.clone());
                self.state = JobState::SettingUp;
                Ok(Wait::Timeout(self.setup))
            }
            (JobState::SettingUp, Resume::Elapsed) => {
                let now = ctx.now();
                let order = ctx.model.orders.order_mut(self.order)?;
                order.status = OrderStatus::Processing;
                self.state = JobState::Processing {
                    started: now,
                    remaining: order.quantity,
                };
                self.next_unit(ctx)
            }
            (JobState::Processing { .. }, Resume::Elapsed) => self.next_unit(ctx),
            (_, signal) => Err(SimError::unexpected(&self.name, signal)),
        }
    }
}

/// Routes orders leaving a resource: to the next stage's input queue, or,
/// after the last stage, into the product's finished goods.
pub struct Transport {
    name: String,
    line: ResourceLine,
}

impl Transport {
    pub fn new(resource: &str, line: ResourceLine) -> Self {
        Self {
            name: format!("transport[{}]", resource),
            line,
        }
    }

    fn route(&mut self, ctx: &mut Context<'_, Factory>, id: OrderId) -> Result<(), SimError> {
        let now = ctx.now();
        let (done, product, completed) = {
            let order = ctx.model.orders.order(id)?;
            (order.all_stages_done(), order.product.clone(), order.completed_stages)
        };

        if done {
            let finished = ctx.model.orders.finish_order(id, now)?;
            let line = ctx.model.product_line(&finished.product)?;
            ctx.put_level(line.finished_goods, f64::from(finished.quantity))?;

            let stats = ctx.model.stats_mut(&finished.product);
            stats.finished_orders += 1;
            stats.finished_quantity += u64::from(finished.quantity);

            if let (true, Some(released)) = (ctx.model.is_warmed_up(now), finished.released) {
                ctx.model
                    .metrics
                    .product_mut(&finished.product)
                    .flow_time
                    .push(Sample {
                        time: now,
                        value: now - released,
                    });
            }
            debug!("t={} order {:?} finished ({} x{})", now, id, finished.product, finished.quantity);
            return Ok(());
        }

        let next = ctx
            .model
            .product_config(&product)?
            .processes
            .stage(completed)
            .map(|stage| stage.resource.clone())
            .ok_or(FactoryError::UnknownStage {
                product,
                stage: completed,
            })?;
        let next_line = ctx.model.resource_line(&next)?;
        let order = ctx.model.orders.order_mut(id)?;
        order.status = OrderStatus::Queued;
        order.resource = Some(next);
        ctx.put(next_line.input, Token::Order(id))
    }
}

impl Process<Factory> for Transport {
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
            Resume::Item(Token::Order(id)) => self.route(ctx, id)?,
            other => return Err(SimError::unexpected(&self.name, other)),
        }
        Ok(Wait::Get(self.line.output))
    }
}
