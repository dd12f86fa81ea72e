use super::config::{FactoryConfig, ProductConfig, ResourceConfig};
use super::distribution::Sampler;
use super::errors::FactoryError;
use super::metrics::{Metrics, ProductStats};
use super::model::{OrderBook, OrderId, Token};
use super::selection::{OrderSelector, QueuedOrder, SelectionPolicyViolation};
use super::settings::SimulationConfig;
use crate::core::process::Model;
use crate::core::types::{ContainerId, GateId, PoolId, QueueId, SimTime};
use log::warn;
use std::collections::BTreeMap;

/// Engine primitives owned by one resource.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceLine {
    /// Orders waiting to be served
    pub input: QueueId,
    /// Orders that finished a stage here, waiting for transport
    pub output: QueueId,
    pub pool: PoolId,
    /// Open while the resource is up
    pub gate: GateId,
}

/// Engine primitives owned by one product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductLine {
    pub finished_goods: ContainerId,
    pub wip: ContainerId,
    pub delivered_ontime: ContainerId,
    pub delivered_late: ContainerId,
    pub lost_sales: ContainerId,
    /// Accepted demand waiting for the release scheduler
    pub inbound_demand: QueueId,
    /// Demand waiting for delivery
    pub outbound_demand: QueueId,
}

/// The shared state of a factory run.
pub struct Factory {
    pub config: FactoryConfig,
    pub settings: SimulationConfig,
    pub sampler: Sampler,
    pub orders: OrderBook,
    pub metrics: Metrics,
    pub stats: BTreeMap<String, ProductStats>,
    resources: BTreeMap<String, ResourceLine>,
    products: BTreeMap<String, ProductLine>,
    selector: Option<Box<dyn OrderSelector>>,
}

impl Model for Factory {
    type Item = Token;
}

impl Factory {
    pub fn new(config: FactoryConfig, settings: SimulationConfig) -> Self {
        let metrics = Metrics::for_plant(config.resources.keys(), config.products.keys());
        let stats = config
            .products
            .keys()
            .map(|name| (name.clone(), ProductStats::default()))
            .collect();
        Self {
            sampler: Sampler::new(settings.seed),
            orders: OrderBook::new(settings.max_live_orders),
            metrics,
            stats,
            resources: BTreeMap::new(),
            products: BTreeMap::new(),
            selector: None,
            config,
            settings,
        }
    }

    pub(crate) fn set_selector(&mut self, selector: Box<dyn OrderSelector>) {
        self.selector = Some(selector);
    }

    pub(crate) fn add_resource_line(&mut self, name: &str, line: ResourceLine) {
        self.resources.insert(name.to_string(), line);
    }

    pub(crate) fn add_product_line(&mut self, name: &str, line: ProductLine) {
        self.products.insert(name.to_string(), line);
    }

    pub fn resource_line(&self, name: &str) -> Result<ResourceLine, FactoryError> {
        self.resources
            .get(name)
            .copied()
            .ok_or_else(|| FactoryError::UnknownResource(name.to_string()))
    }

    pub fn product_line(&self, name: &str) -> Result<ProductLine, FactoryError> {
        self.products
            .get(name)
            .copied()
            .ok_or_else(|| FactoryError::UnknownProduct(name.to_string()))
    }

    pub fn resource_config(&self, name: &str) -> Result<&ResourceConfig, FactoryError> {
        self.config
            .resources
            .get(name)
            .ok_or_else(|| FactoryError::UnknownResource(name.to_string()))
    }

    pub fn product_config(&self, name: &str) -> Result<&ProductConfig, FactoryError> {
        self.config
            .products
            .get(name)
            .ok_or_else(|| FactoryError::UnknownProduct(name.to_string()))
    }

    pub fn is_warmed_up(&self, now: SimTime) -> bool {
        self.settings.is_warmed_up(now)
    }

    pub fn stats_mut(&mut self, product: &str) -> &mut ProductStats {
        self.stats.entry(product.to_string()).or_default()
    }

    pub fn has_selector(&self) -> bool {
        self.selector.is_some()
    }

    pub fn setup_time(&mut self, resource: &str) -> Result<f64, FactoryError> {
        let setup = &self
            .config
            .resources
            .get(resource)
            .ok_or_else(|| FactoryError::UnknownResource(resource.to_string()))?
            .setup;
        Ok(self.sampler.duration(setup)?)
    }

    /// Draw a time-between-failures and a time-to-repair.
    pub fn breakdown_times(&mut self, resource: &str) -> Result<Option<(f64, f64)>, FactoryError> {
        let config = self
            .config
            .resources
            .get(resource)
            .ok_or_else(|| FactoryError::UnknownResource(resource.to_string()))?;
        let Some((tbf, ttr)) = config.breakdowns() else {
            return Ok(None);
        };
        let tbf = self.sampler.duration(tbf)?;
        let ttr = self.sampler.duration(ttr)?;
        Ok(Some((tbf, ttr)))
    }

    /// Per-unit processing time of `product` at stage `stage`.
    pub fn processing_time(&mut self, product: &str, stage: usize) -> Result<f64, FactoryError> {
        let product_config = self
            .config
            .products
            .get(product)
            .ok_or_else(|| FactoryError::UnknownProduct(product.to_string()))?;
        let stage = product_config
            .processes
            .stage(stage)
            .ok_or_else(|| FactoryError::UnknownStage {
                product: product.to_string(),
                stage,
            })?;
        Ok(self.sampler.duration(&stage.processing_time)?)
    }

    /// Ask the selector which of `waiting` to serve on `resource`.
    ///
    /// Returns `None` when no selector is installed, when there is nothing
    /// to choose between, or when the selector named an order that is not
    /// waiting; the last case is logged and counted.
    pub fn select_order(
        &mut self,
        resource: &str,
        waiting: &[OrderId],
    ) -> Result<Option<OrderId>, FactoryError> {
        if waiting.len() < 2 {
            return Ok(None);
        }
        let Some(selector) = self.selector.as_mut() else {
            return Ok(None);
        };
        let candidates = waiting
            .iter()
            .map(|&id| {
                let order = self.orders.order(id)?;
                Ok(QueuedOrder {
                    id,
                    product: order.product.clone(),
                    quantity: order.quantity,
                    due_date: order.due_date,
                    priority: order.priority,
                    completed_stages: order.completed_stages,
                    total_stages: order.total_stages,
                    released: order.released,
                })
            })
            .collect::<Result<Vec<_>, FactoryError>>()?;

        let selected = selector.select(&candidates, resource);
        if waiting.contains(&selected) {
            return Ok(Some(selected));
        }
        let violation = SelectionPolicyViolation {
            resource: resource.to_string(),
            selected,
        };
        warn!("{}; serving the queue head instead", violation);
        self.metrics.policy_violations += 1;
        Ok(None)
    }
}
