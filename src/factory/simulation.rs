use super::config::FactoryConfig;
use super::errors::{ConfigError, FactoryError};
use super::inbound::{DemandGenerator, ScheduledDemand};
use super::metrics::Metrics;
use super::outbound::Delivery;
use super::plant::{Factory, ProductLine, ResourceLine};
use super::production::{Breakdowns, Dispatcher, Transport};
use super::scheduler::ReleaseScheduler;
use super::selection::OrderSelector;
use super::settings::{ConcurrencyMode, SimulationConfig};
use crate::core::errors::SimError;
use crate::core::execution::{SimulationEngine, SimulationObserver};
use crate::core::types::SimTime;
use log::info;
use rayon::prelude::*;

/// Builder for a [`FactorySimulation`]
pub struct FactoryBuilder {
    config: FactoryConfig,
    settings: SimulationConfig,
    selector: Option<Box<dyn OrderSelector>>,
    inbound: bool,
}

impl FactoryBuilder {
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            config,
            settings: SimulationConfig::default(),
            selector: None,
            inbound: true,
        }
    }

    pub fn settings(mut self, settings: SimulationConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Install an order-selection policy for every resource
    pub fn selector(mut self, selector: impl OrderSelector + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    /// Whether products with a demand model generate random demand.
    /// Disable to drive the plant only through `submit_demand`.
    pub fn with_inbound(mut self, enabled: bool) -> Self {
        self.inbound = enabled;
        self
    }

    pub fn build(self) -> Result<FactorySimulation, FactoryError> {
        self.config.validate()?;
        self.settings.validate()?;

        let resource_names: Vec<String> = self.config.resources.keys().cloned().collect();
        let product_names: Vec<String> = self.config.products.keys().cloned().collect();
        let delivery_mode = self.settings.delivery_mode;

        let mut factory = Factory::new(self.config, self.settings);
        if let Some(selector) = self.selector {
            factory.set_selector(selector);
        }
        let mut engine = SimulationEngine::new(factory);

        let mut resource_lines = Vec::with_capacity(resource_names.len());
        for name in &resource_names {
            let capacity = engine.model().resource_config(name)?.capacity;
            let line = ResourceLine {
                input: engine.add_queue(),
                output: engine.add_queue(),
                pool: engine.add_pool(capacity)?,
                gate: engine.add_gate(true),
            };
            engine.model_mut().add_resource_line(name, line);
            resource_lines.push((name, line));
        }

        let mut product_lines = Vec::with_capacity(product_names.len());
        for name in &product_names {
            let line = ProductLine {
                finished_goods: engine.add_container(0.0)?,
                wip: engine.add_container(0.0)?,
                delivered_ontime: engine.add_container(0.0)?,
                delivered_late: engine.add_container(0.0)?,
                lost_sales: engine.add_container(0.0)?,
                inbound_demand: engine.add_queue(),
                outbound_demand: engine.add_queue(),
            };
            engine.model_mut().add_product_line(name, line);
            product_lines.push((name, line));
        }

        for (name, line) in resource_lines {
            if engine.model().resource_config(name)?.breakdowns().is_some() {
                engine.spawn(Breakdowns::new(name, line));
            }
            engine.spawn(Transport::new(name, line));
            engine.spawn(Dispatcher::new(name, line));
        }

        for (name, line) in product_lines {
            engine.spawn(ReleaseScheduler::new(name, line));
            if self.inbound && engine.model().product_config(name)?.demand.is_some() {
                engine.spawn(DemandGenerator::new(name, line));
            }
            engine.spawn(Delivery::new(name, line, delivery_mode));
        }

        info!(
            "built factory: {} resources, {} products, {} processes",
            resource_names.len(),
            product_names.len(),
            engine.live_processes()
        );
        Ok(FactorySimulation { engine })
    }
}

/// A factory model wired into a simulation engine.
pub struct FactorySimulation {
    engine: SimulationEngine<Factory>,
}

impl FactorySimulation {
    /// Run until `until`, see [`SimulationEngine::run`].
    pub fn run(&mut self, until: SimTime) -> Result<SimTime, SimError> {
        let stopped = self.engine.run(until)?;
        info!(
            "run stopped at t={}, {} live orders, {} policy violations",
            stopped,
            self.factory().orders.live_orders(),
            self.factory().metrics.policy_violations
        );
        Ok(stopped)
    }

    /// Inject a demand that arrives at `at` (or now, if `at` has passed).
    pub fn submit_demand(
        &mut self,
        at: SimTime,
        product: &str,
        quantity: u32,
        due_date: SimTime,
    ) -> Result<(), FactoryError> {
        let line = self.engine.model().product_line(product)?;
        self.engine
            .spawn(ScheduledDemand::new(product, line, at, quantity, due_date));
        Ok(())
    }

    pub fn add_observer(&mut self, observer: Box<dyn SimulationObserver<Factory>>) {
        self.engine.add_observer(observer);
    }

    pub fn now(&self) -> SimTime {
        self.engine.now()
    }

    pub fn factory(&self) -> &Factory {
        self.engine.model()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.engine.model().metrics
    }

    pub fn finished_goods(&self, product: &str) -> Result<f64, FactoryError> {
        let line = self.factory().product_line(product)?;
        Ok(self.engine.level(line.finished_goods)?)
    }

    /// Cumulative quantity ever put into `product`'s finished goods
    pub fn produced(&self, product: &str) -> Result<f64, FactoryError> {
        let line = self.factory().product_line(product)?;
        Ok(self.engine.total_put(line.finished_goods)?)
    }

    /// Quantity accepted but not yet delivered or lost
    pub fn work_in_process(&self, product: &str) -> Result<f64, FactoryError> {
        let line = self.factory().product_line(product)?;
        Ok(self.engine.level(line.wip)?)
    }

    pub fn engine(&self) -> &SimulationEngine<Factory> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut SimulationEngine<Factory> {
        &mut self.engine
    }

    pub fn into_metrics(self) -> Metrics {
        let Self { engine } = self;
        engine.into_model().metrics
    }
}

fn run_one(
    config: &FactoryConfig,
    settings: &SimulationConfig,
    seed: u64,
    until: SimTime,
) -> Result<Metrics, FactoryError> {
    let mut simulation = FactoryBuilder::new(config.clone())
        .settings(settings.clone().with_seed(seed))
        .build()?;
    simulation.run(until)?;
    Ok(simulation.into_metrics())
}

/// Run one independent simulation per seed and collect their metrics in
/// seed order.
pub fn run_replications(
    config: &FactoryConfig,
    settings: &SimulationConfig,
    seeds: &[u64],
    until: SimTime,
) -> Result<Vec<Metrics>, FactoryError> {
    match settings.concurrency_mode {
        ConcurrencyMode::Sequential => seeds
            .iter()
            .map(|&seed| run_one(config, settings, seed, until))
            .collect(),
        ConcurrencyMode::Rayon => {
            let replicate = || -> Result<Vec<Metrics>, FactoryError> {
                seeds
                    .par_iter()
                    .map(|&seed| run_one(config, settings, seed, until))
                    .collect()
            };
            match settings.thread_pool_size {
                Some(threads) => rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ConfigError::InvalidSetting(e.to_string()))?
                    .install(replicate),
                None => replicate(),
            }
        }
    }
}
