//! Static description of a factory: its resources and the products routed
//! through them.

use super::distribution::Distribution;
use super::errors::ConfigError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

fn default_capacity() -> usize {
    1
}

/// A machine group with `capacity` parallel servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    #[serde(default = "default_capacity", alias = "quantity")]
    pub capacity: usize,
    #[serde(default)]
    pub setup: Distribution,
    /// Time between failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tbf: Option<Distribution>,
    /// Time to repair
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttr: Option<Distribution>,
}

impl ResourceConfig {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            setup: Distribution::default(),
            tbf: None,
            ttr: None,
        }
    }

    pub fn with_setup(mut self, setup: Distribution) -> Self {
        self.setup = setup;
        self
    }

    pub fn with_breakdowns(mut self, tbf: Distribution, ttr: Distribution) -> Self {
        self.tbf = Some(tbf);
        self.ttr = Some(ttr);
        self
    }

    /// Both halves of the failure model, if configured.
    pub fn breakdowns(&self) -> Option<(&Distribution, &Distribution)> {
        self.tbf.as_ref().zip(self.ttr.as_ref())
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self::new(1)
    }
}

/// One step of a product's routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub resource: String,
    pub processing_time: Distribution,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stage {
    pub name: String,
    pub resource: String,
    pub processing_time: Distribution,
}

/// Ordered stages of a product, kept in the order they were written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessGraph {
    stages: Vec<Stage>,
}

impl ProcessGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stage(mut self, name: &str, resource: &str, processing_time: Distribution) -> Self {
        self.stages.push(Stage {
            name: name.to_string(),
            resource: resource.to_string(),
            processing_time,
        });
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn first_resource(&self) -> Option<&str> {
        self.stages.first().map(|stage| stage.resource.as_str())
    }
}

impl Serialize for ProcessGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.stages.len()))?;
        for stage in &self.stages {
            map.serialize_entry(
                &stage.name,
                &StageConfig {
                    resource: stage.resource.clone(),
                    processing_time: stage.processing_time.clone(),
                },
            )?;
        }
        map.end()
    }
}

struct ProcessGraphVisitor;

impl<'de> Visitor<'de> for ProcessGraphVisitor {
    type Value = ProcessGraph;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of stage name to {resource, processing_time}")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut graph = ProcessGraph::new();
        while let Some((name, stage)) = access.next_entry::<String, StageConfig>()? {
            graph.stages.push(Stage {
                name,
                resource: stage.resource,
                processing_time: stage.processing_time,
            });
        }
        Ok(graph)
    }
}

impl<'de> Deserialize<'de> for ProcessGraph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ProcessGraphVisitor)
    }
}

/// Stochastic demand for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandConfig {
    /// Inter-arrival time
    pub freq: Distribution,
    pub quantity: Distribution,
    /// Due-date offset from arrival
    pub duedate: Distribution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub processes: ProcessGraph,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand: Option<DemandConfig>,
    #[serde(default)]
    pub constraint_time: f64,
}

impl ProductConfig {
    pub fn new(processes: ProcessGraph) -> Self {
        Self {
            processes,
            demand: None,
            constraint_time: 0.0,
        }
    }

    pub fn with_demand(mut self, demand: DemandConfig) -> Self {
        self.demand = Some(demand);
        self
    }

    pub fn with_constraint_time(mut self, constraint_time: f64) -> Self {
        self.constraint_time = constraint_time;
        self
    }
}

/// The whole plant. Maps are ordered so that building a simulation from
/// the same description always creates processes in the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactoryConfig {
    pub resources: BTreeMap<String, ResourceConfig>,
    pub products: BTreeMap<String, ProductConfig>,
}

impl FactoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, name: &str, resource: ResourceConfig) -> Self {
        self.resources.insert(name.to_string(), resource);
        self
    }

    pub fn with_product(mut self, name: &str, product: ProductConfig) -> Self {
        self.products.insert(name.to_string(), product);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: FactoryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check that every stage names a known resource, every product has
    /// at least one stage and every resource at least one server.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, resource) in &self.resources {
            if resource.capacity == 0 {
                return Err(ConfigError::InvalidCapacity {
                    resource: name.clone(),
                    capacity: resource.capacity,
                });
            }
        }
        for (product, config) in &self.products {
            if config.processes.is_empty() {
                return Err(ConfigError::EmptyProcess(product.clone()));
            }
            if let Some(stage) = config
                .processes
                .stages()
                .iter()
                .find(|stage| !self.resources.contains_key(&stage.resource))
            {
                return Err(ConfigError::UnknownResource {
                    product: product.clone(),
                    stage: stage.name.clone(),
                    resource: stage.resource.clone(),
                });
            }
            if !config.constraint_time.is_finite() {
                return Err(ConfigError::InvalidSetting(format!(
                    "product '{}' constraint_time must be finite",
                    product
                )));
            }
        }
        Ok(())
    }
}
