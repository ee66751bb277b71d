use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
};

use daggy::{stable_dag::StableDag, NodeIndex};
use petgraph::algo::toposort;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::{
    conns::AwsClient,
    datastore::{Datastore, DatastoreError},
    manager::ManagerError,
    registry::{Registry, RegistryError},
    resource::{ResourceConfig, ResourceState, StateRecord},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Create,
    Update,
    Replace,
    Delete,
    NoOp,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Action::Create => "+",
            Action::Update => "~",
            Action::Replace => "-/+",
            Action::Delete => "-",
            Action::NoOp => " ",
        };
        f.pad(symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedChange {
    pub address: String,
    pub type_name: String,
    pub action: Action,
}

impl fmt::Display for PlannedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>3} {}", self.action, self.address)
    }
}

/// True when applying `changes` would touch at least one object.
pub fn has_changes(changes: &[PlannedChange]) -> bool {
    changes.iter().any(|c| c.action != Action::NoOp)
}

/// A planned change plus what the refresh learned about the object.
struct Step {
    change: PlannedChange,
    config: Option<ResourceConfig>,
    record: Option<StateRecord>,
    /// Attributes read during refresh; `None` when the object is gone.
    latest: Option<Value>,
}

#[derive(Default)]
pub struct Plan {
    resources: HashMap<String, ResourceConfig>,
}

impl Plan {
    pub fn add_resource(&mut self, resource: ResourceConfig) -> Result<(), PlanError> {
        let address = resource.address();
        if self.resources.contains_key(&address) {
            return Err(PlanError::ResourceAlreadyExists(address));
        }
        tracing::debug!("Resource[{}] added to the plan", address);
        self.resources.insert(address, resource);
        Ok(())
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    /// Plan resources in dependency order.
    pub fn sorted(&self) -> Result<Vec<&ResourceConfig>, PlanError> {
        let nodes: BTreeMap<String, HashSet<String>> = self
            .resources
            .iter()
            .map(|(address, r)| (address.clone(), r.depends_on.clone()))
            .collect();
        Ok(sort_addresses(&nodes, true)?
            .iter()
            .filter_map(|address| self.resources.get(address))
            .collect())
    }

    pub fn diff(
        &self,
        client: &AwsClient,
        registry: &Registry,
        datastore: &Datastore,
    ) -> Result<Vec<PlannedChange>, PlanError> {
        Ok(self
            .steps(client, registry, datastore)?
            .into_iter()
            .map(|step| step.change)
            .collect())
    }

    fn steps(
        &self,
        client: &AwsClient,
        registry: &Registry,
        datastore: &Datastore,
    ) -> Result<Vec<Step>, PlanError> {
        tracing::info!("Refreshing state and computing changes");
        let mut steps = vec![];
        for address in orphan_delete_order(self, datastore)? {
            if let Some(record) = datastore.get(&address)? {
                let latest = refresh(client, registry, &record)?;
                steps.push(Step {
                    change: change(&record.address, &record.type_name, Action::Delete),
                    config: None,
                    record: Some(record),
                    latest,
                });
            }
        }
        for resource in self.sorted()?.into_iter().rev() {
            if resource.state != ResourceState::Absent {
                continue;
            }
            let address = resource.address();
            if let Some(record) = datastore.get(&address)? {
                let latest = refresh(client, registry, &record)?;
                steps.push(Step {
                    change: change(&address, &resource.type_name, Action::Delete),
                    config: Some(resource.clone()),
                    record: Some(record),
                    latest,
                });
            }
        }
        for resource in self.sorted()? {
            if resource.state == ResourceState::Absent {
                continue;
            }
            let address = resource.address();
            let registered = registry.resource(&resource.type_name)?;
            let record = datastore.get(&address)?;
            let (action, latest) = match &record {
                None => (Action::Create, None),
                Some(record) => match refresh(client, registry, record)? {
                    None => {
                        tracing::warn!("Resource[{}] no longer exists and will be created", address);
                        (Action::Create, None)
                    }
                    Some(latest) => {
                        let handler = registered.handler();
                        let observed = handler
                            .config_from_state(&latest)
                            .map_err(|e| PlanError::manager(&address, e))?;
                        let prior = merge_config(&record.input, &observed);
                        let action = if handler
                            .requires_replace(&prior, &resource.config)
                            .map_err(|e| PlanError::manager(&address, e))?
                        {
                            Action::Replace
                        } else if handler
                            .has_changes(&prior, &resource.config)
                            .map_err(|e| PlanError::manager(&address, e))?
                        {
                            Action::Update
                        } else {
                            Action::NoOp
                        };
                        (action, Some(latest))
                    }
                },
            };
            steps.push(Step {
                change: change(&address, &resource.type_name, action),
                config: Some(resource.clone()),
                record,
                latest,
            });
        }
        Ok(steps)
    }

    pub fn apply(
        &self,
        client: &AwsClient,
        registry: &Registry,
        datastore: &mut Datastore,
    ) -> Result<Vec<PlannedChange>, PlanError> {
        tracing::info!("Applying plan");
        let steps = self.steps(client, registry, datastore)?;
        let mut applied = vec![];
        for step in steps {
            let address = step.change.address.clone();
            match step.change.action {
                Action::Delete => {
                    if let (Some(record), Some(latest)) = (&step.record, &step.latest) {
                        delete(client, registry, &record.type_name, latest)
                            .map_err(|e| PlanError::manager(&address, e))?;
                    }
                    datastore.remove(&address);
                }
                Action::Create | Action::Replace => {
                    if let (Some(record), Some(latest)) = (&step.record, &step.latest) {
                        delete(client, registry, &record.type_name, latest)
                            .map_err(|e| PlanError::manager(&address, e))?;
                        datastore.remove(&address);
                    }
                    if let Some(config) = &step.config {
                        let output = registry
                            .resource(&config.type_name)?
                            .create(client, &config.config)
                            .map_err(|e| PlanError::manager(&address, e))?;
                        store(registry, datastore, config, output)?;
                    }
                }
                Action::Update => {
                    if let (Some(config), Some(record), Some(latest)) =
                        (&step.config, &step.record, &step.latest)
                    {
                        let output = registry
                            .resource(&config.type_name)?
                            .update(client, &record.id, latest, &config.config)
                            .map_err(|e| PlanError::manager(&address, e))?;
                        store(registry, datastore, config, output)?;
                    }
                }
                Action::NoOp => {
                    if let (Some(config), Some(record), Some(latest)) =
                        (&step.config, &step.record, step.latest.clone())
                    {
                        datastore.insert_record(&StateRecord {
                            output: latest,
                            dependencies: config.depends_on.clone(),
                            ..record.clone()
                        })?;
                    }
                }
            }
            tracing::info!("{}", step.change);
            applied.push(step.change);
        }
        Ok(applied)
    }

    /// Deletes everything recorded in the state, dependents first.
    pub fn destroy(
        &self,
        client: &AwsClient,
        registry: &Registry,
        datastore: &mut Datastore,
    ) -> Result<Vec<PlannedChange>, PlanError> {
        tracing::info!("Destroying every resource in state");
        let records = datastore.records()?;
        let mut destroyed = vec![];
        for address in delete_order(&records)? {
            if let Some(record) = datastore.get(&address)? {
                delete(client, registry, &record.type_name, &record.output)
                    .map_err(|e| PlanError::manager(&address, e))?;
                datastore.remove(&address);
                destroyed.push(change(&address, &record.type_name, Action::Delete));
            }
        }
        Ok(destroyed)
    }
}

fn change(address: &str, type_name: &str, action: Action) -> PlannedChange {
    PlannedChange {
        address: address.to_string(),
        type_name: type_name.to_string(),
        action,
    }
}

/// Reads the object behind `record`; `None` when it no longer exists.
fn refresh(
    client: &AwsClient,
    registry: &Registry,
    record: &StateRecord,
) -> Result<Option<Value>, PlanError> {
    match registry
        .resource(&record.type_name)?
        .read(client, &record.id, Some(&record.output))
    {
        Ok(latest) => Ok(Some(latest)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(PlanError::manager(&record.address, e)),
    }
}

fn delete(
    client: &AwsClient,
    registry: &Registry,
    type_name: &str,
    state: &Value,
) -> Result<bool, ManagerError> {
    registry
        .resource(type_name)
        .map_err(|e| ManagerError::InvalidInput(e.to_string()))?
        .delete(client, state)
}

fn store(
    registry: &Registry,
    datastore: &mut Datastore,
    config: &ResourceConfig,
    output: Value,
) -> Result<(), PlanError> {
    let address = config.address();
    let id = registry
        .resource(&config.type_name)?
        .handler()
        .id(&output)
        .map_err(|e| PlanError::manager(&address, e))?;
    datastore.insert_record(&StateRecord {
        address,
        type_name: config.type_name.clone(),
        id,
        input: config.config.clone(),
        output,
        dependencies: config.depends_on.clone(),
    })?;
    Ok(())
}

/// Last applied configuration with every attribute the service reported
/// laid over it. Attributes the service never reports keep their applied value.
pub fn merge_config(applied: &Value, observed: &Value) -> Value {
    match (applied, observed) {
        (Value::Object(applied), Value::Object(observed)) => {
            let mut merged = applied.clone();
            for (key, value) in observed {
                if !value.is_null() {
                    merged.insert(key.clone(), value.clone());
                }
            }
            Value::Object(merged)
        }
        (_, Value::Null) => applied.clone(),
        _ => observed.clone(),
    }
}

/// State records that are not part of the plan, dependents first.
fn orphan_delete_order(plan: &Plan, datastore: &Datastore) -> Result<Vec<String>, PlanError> {
    let orphans: Vec<StateRecord> = datastore
        .records()?
        .into_iter()
        .filter(|record| !plan.resources.contains_key(&record.address))
        .collect();
    delete_order(&orphans)
}

fn delete_order(records: &[StateRecord]) -> Result<Vec<String>, PlanError> {
    let nodes: BTreeMap<String, HashSet<String>> = records
        .iter()
        .map(|r| (r.address.clone(), r.dependencies.clone()))
        .collect();
    let mut sorted = sort_addresses(&nodes, false)?;
    sorted.reverse();
    Ok(sorted)
}

/// Orders addresses so every dependency comes before its dependents. With
/// `strict`, a dependency outside `nodes` is an error; otherwise it is ignored.
fn sort_addresses(
    nodes: &BTreeMap<String, HashSet<String>>,
    strict: bool,
) -> Result<Vec<String>, PlanError> {
    tracing::debug!("Sorting {} resources by dependencies", nodes.len());
    let mut idx_id_map = HashMap::<&str, NodeIndex>::new();
    let mut dag = StableDag::<&str, u32, u32>::new();
    for address in nodes.keys() {
        let idx = dag.add_node(address.as_str());
        idx_id_map.insert(address.as_str(), idx);
    }
    for (address, dependencies) in nodes {
        let mut dependencies: Vec<&String> = dependencies.iter().collect();
        dependencies.sort();
        for dep in dependencies {
            let dep_idx = match idx_id_map.get(dep.as_str()) {
                Some(idx) => *idx,
                None if strict => return Err(PlanError::DependencyNotFound(dep.to_string())),
                None => continue,
            };
            dag.add_edge(dep_idx, idx_id_map[address.as_str()], 0)
                .map_err(|err| PlanError::DagCreationError(format!("{:?}", err)))?;
        }
    }
    let sorted_indexes = toposort(dag.graph(), None)
        .map_err(|err| PlanError::DagCreationError(format!("{:?}", err)))?;
    Ok(sorted_indexes
        .into_iter()
        .filter_map(|idx| dag.node_weight(idx).map(|address| address.to_string()))
        .collect())
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Resource {0} already exists")]
    ResourceAlreadyExists(String),
    #[error("Dependency {0} not found")]
    DependencyNotFound(String),
    #[error("Dag creation error: {0}")]
    DagCreationError(String),
    #[error("Resource[{address}]: {source}")]
    ManagerError {
        address: String,
        source: ManagerError,
    },
    #[error("Registry error: {0}")]
    RegistryError(#[from] RegistryError),
    #[error("Datastore error: {0}")]
    DatastoreError(#[from] DatastoreError),
}

impl PlanError {
    fn manager(address: &str, source: ManagerError) -> Self {
        PlanError::ManagerError {
            address: address.to_string(),
            source,
        }
    }
}
