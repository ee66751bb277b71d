use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::runtime::Handle;

use super::{
    conns::{AwsClient, ConnsError, ProviderConfig},
    datastore::{Datastore, DatastoreError},
    manager::ManagerError,
    plan::{Action, Plan, PlanError, PlannedChange},
    registry::{default_registry, Registry, RegistryError},
    resource::{address, DataSourceConfig, ResourceConfig, StateRecord},
    storage::file::FileStorage,
};

/// Contents of the JSON configuration file.
#[derive(Default, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CloudConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,
    #[serde(default)]
    pub data: Vec<DataSourceConfig>,
}

impl CloudConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref();
        tracing::debug!("Reading configuration from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            ProviderError::ConfigError(format!("{}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| ProviderError::ConfigError(format!("{}: {}", path.display(), e)))
    }
}

pub struct Cloud {
    client: AwsClient,
    registry: &'static Registry,
    plan: Plan,
    data: Vec<DataSourceConfig>,
    datastore: Datastore,
}

impl Cloud {
    pub fn new(client: AwsClient, datastore: Datastore) -> Result<Self, ProviderError> {
        Ok(Self {
            client,
            registry: default_registry()?,
            plan: Plan::default(),
            data: vec![],
            datastore,
        })
    }

    /// Resolves the provider block and loads every resource of `config` into the plan.
    pub fn from_config(
        handle: &Handle,
        config: CloudConfig,
        storage: FileStorage,
    ) -> Result<Self, ProviderError> {
        let client = config.provider.with_env_defaults().load(handle)?;
        let mut cloud = Self::new(client, Datastore::new(storage))?;
        for resource in config.resources {
            cloud.resource(resource)?;
        }
        cloud.data = config.data;
        Ok(cloud)
    }

    pub fn client(&self) -> &AwsClient {
        &self.client
    }

    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    /// Adds a desired object to the plan. Its type must be registered.
    pub fn resource(&mut self, resource: ResourceConfig) -> Result<&mut Self, ProviderError> {
        self.registry.resource(&resource.type_name)?;
        self.plan.add_resource(resource)?;
        Ok(self)
    }

    pub fn plan(&mut self) -> Result<Vec<PlannedChange>, ProviderError> {
        self.datastore.reload()?;
        Ok(self
            .plan
            .diff(&self.client, self.registry, &self.datastore)?)
    }

    pub fn apply(&mut self) -> Result<Vec<PlannedChange>, ProviderError> {
        self.datastore.reload()?;
        let result = self
            .plan
            .apply(&self.client, self.registry, &mut self.datastore)
            .map_err(ProviderError::PlanError);
        self.datastore.save()?;
        result
    }

    pub fn destroy(&mut self) -> Result<Vec<PlannedChange>, ProviderError> {
        self.datastore.reload()?;
        let result = self
            .plan
            .destroy(&self.client, self.registry, &mut self.datastore)
            .map_err(ProviderError::PlanError);
        self.datastore.save()?;
        result
    }

    /// Adopts the existing object `id` into state under `address`.
    pub fn import(
        &mut self,
        address: &str,
        type_name: &str,
        id: &str,
    ) -> Result<StateRecord, ProviderError> {
        self.datastore.reload()?;
        if self.datastore.contains(address) {
            return Err(ProviderError::AlreadyManaged(address.to_string()));
        }
        let registered = self.registry.resource(type_name)?;
        tracing::info!("Importing {} as Resource[{}]", id, address);
        let output = registered
            .read(&self.client, id, None)
            .map_err(|e| ProviderError::ManagerError(address.to_string(), e))?;
        let handler = registered.handler();
        let record = StateRecord {
            address: address.to_string(),
            type_name: type_name.to_string(),
            id: handler
                .id(&output)
                .map_err(|e| ProviderError::ManagerError(address.to_string(), e))?,
            input: handler
                .config_from_state(&output)
                .map_err(|e| ProviderError::ManagerError(address.to_string(), e))?,
            output,
            dependencies: self
                .plan
                .resources()
                .find(|r| r.address() == address)
                .map(|r| r.depends_on.clone())
                .unwrap_or_default(),
        };
        self.datastore.insert_record(&record)?;
        self.datastore.save()?;
        Ok(record)
    }

    /// Last recorded state of `address`, as of the most recent reload.
    pub fn state(&self, address: &str) -> Result<Option<StateRecord>, ProviderError> {
        Ok(self.datastore.get(address)?)
    }

    /// Reads the object recorded under `address` straight from the service.
    /// Fails with a not-found manager error once it is gone.
    pub fn read(&mut self, address: &str) -> Result<Value, ProviderError> {
        self.datastore.reload()?;
        let record = self
            .datastore
            .get(address)?
            .ok_or_else(|| ProviderError::NotInState(address.to_string()))?;
        self.registry
            .resource(&record.type_name)?
            .read(&self.client, &record.id, Some(&record.output))
            .map_err(|e| ProviderError::ManagerError(address.to_string(), e))
    }

    pub fn read_data_source(&self, type_name: &str, args: &Value) -> Result<Value, ProviderError> {
        self.registry
            .data_source(type_name)?
            .read(&self.client, args)
            .map_err(|e| ProviderError::ManagerError(type_name.to_string(), e))
    }

    /// Reads every data source of the configuration, keyed by `data.type.name`.
    pub fn read_data_sources(&self) -> Result<Vec<(String, Value)>, ProviderError> {
        self.data
            .iter()
            .map(|d| {
                self.read_data_source(&d.type_name, &d.args)
                    .map(|value| (format!("data.{}", address(&d.type_name, &d.name)), value))
            })
            .collect()
    }
}

/// Changes that would touch the cloud.
pub fn pending(changes: &[PlannedChange]) -> impl Iterator<Item = &PlannedChange> {
    changes.iter().filter(|c| c.action != Action::NoOp)
}

#[derive(Debug)]
pub enum ProviderError {
    ConfigError(String),
    ConnsError(ConnsError),
    DatastoreError(DatastoreError),
    PlanError(PlanError),
    RegistryError(RegistryError),
    ManagerError(String, ManagerError),
    AlreadyManaged(String),
    NotInState(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::ManagerError(_, e) => e.is_not_found(),
            ProviderError::PlanError(PlanError::ManagerError { source, .. }) => {
                source.is_not_found()
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ProviderError::ConfigError(e) => write!(f, "ConfigError: {}", e),
            ProviderError::ConnsError(e) => write!(f, "ConnsError: {}", e),
            ProviderError::DatastoreError(e) => write!(f, "DatastoreError: {}", e),
            ProviderError::PlanError(e) => write!(f, "PlanError: {}", e),
            ProviderError::RegistryError(e) => write!(f, "RegistryError: {}", e),
            ProviderError::ManagerError(address, e) => {
                write!(f, "Resource[{}]: {}", address, e)
            }
            ProviderError::AlreadyManaged(address) => {
                write!(f, "Resource[{}] is already managed", address)
            }
            ProviderError::NotInState(address) => {
                write!(f, "Resource[{}] is not in state", address)
            }
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<ConnsError> for ProviderError {
    fn from(e: ConnsError) -> Self {
        ProviderError::ConnsError(e)
    }
}

impl From<DatastoreError> for ProviderError {
    fn from(e: DatastoreError) -> Self {
        ProviderError::DatastoreError(e)
    }
}

impl From<PlanError> for ProviderError {
    fn from(e: PlanError) -> Self {
        ProviderError::PlanError(e)
    }
}

impl From<RegistryError> for ProviderError {
    fn from(e: RegistryError) -> Self {
        ProviderError::RegistryError(e)
    }
}
