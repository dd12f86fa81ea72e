//! Append-only KPI series collected during a run.

use crate::core::types::SimTime;
use serde::Serialize;
use std::collections::BTreeMap;

/// A value observed at a point in simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub time: SimTime,
    pub value: f64,
}

/// Something that started at `start` and lasted `duration`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub start: SimTime,
    pub duration: SimTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceMetrics {
    /// Busy time of each job, stamped at its end
    pub utilization: Vec<Sample>,
    /// Sampled setup time, stamped at dispatch
    pub setups: Vec<Sample>,
    pub breakdowns: Vec<Interval>,
}

impl ResourceMetrics {
    pub fn busy_time(&self) -> f64 {
        self.utilization.iter().map(|s| s.value).sum()
    }

    pub fn downtime(&self) -> f64 {
        self.breakdowns.iter().map(|b| b.duration).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductMetrics {
    /// Release to completion, per finished order
    pub flow_time: Vec<Sample>,
    /// Arrival to delivery, per delivered demand
    pub lead_time: Vec<Sample>,
    pub earliness: Vec<Sample>,
    pub tardiness: Vec<Sample>,
    pub delivered_ontime: Vec<Sample>,
    pub delivered_late: Vec<Sample>,
    pub lost_sales: Vec<Sample>,
    pub demand: Vec<Sample>,
}

fn total(series: &[Sample]) -> f64 {
    series.iter().map(|s| s.value).sum()
}

/// Totals of one product's series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProductSummary {
    pub demanded: f64,
    pub delivered_ontime: f64,
    pub delivered_late: f64,
    pub lost_sales: f64,
    pub mean_flow_time: Option<f64>,
    pub mean_lead_time: Option<f64>,
}

impl ProductMetrics {
    pub fn summary(&self) -> ProductSummary {
        let mean = |series: &[Sample]| {
            (!series.is_empty()).then(|| total(series) / series.len() as f64)
        };
        ProductSummary {
            demanded: total(&self.demand),
            delivered_ontime: total(&self.delivered_ontime),
            delivered_late: total(&self.delivered_late),
            lost_sales: total(&self.lost_sales),
            mean_flow_time: mean(&self.flow_time),
            mean_lead_time: mean(&self.lead_time),
        }
    }
}

/// Every series of a run, keyed by resource and product name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub resources: BTreeMap<String, ResourceMetrics>,
    pub products: BTreeMap<String, ProductMetrics>,
    /// Times an order selector named an order that was not waiting
    pub policy_violations: u64,
}

impl Metrics {
    pub fn for_plant<'a>(
        resources: impl IntoIterator<Item = &'a String>,
        products: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        Self {
            resources: resources
                .into_iter()
                .map(|name| (name.clone(), ResourceMetrics::default()))
                .collect(),
            products: products
                .into_iter()
                .map(|name| (name.clone(), ProductMetrics::default()))
                .collect(),
            policy_violations: 0,
        }
    }

    pub fn resource_mut(&mut self, name: &str) -> &mut ResourceMetrics {
        self.resources.entry(name.to_string()).or_default()
    }

    pub fn product_mut(&mut self, name: &str) -> &mut ProductMetrics {
        self.products.entry(name.to_string()).or_default()
    }
}

/// Plain counters that are kept from time zero, warm-up or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProductStats {
    pub demands: u64,
    pub released_orders: u64,
    pub finished_orders: u64,
    pub finished_quantity: u64,
}
