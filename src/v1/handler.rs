use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::{conns::AwsClient, manager::ManagerError};

/// Type-erased operations on one managed object type. Configuration and state
/// travel as JSON attribute values.
pub trait ResourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn create(&self, client: &AwsClient, config: &Value) -> Result<Value, ManagerError>;
    /// Fails with [`ManagerError::NotFound`] when the object no longer exists.
    fn read(&self, client: &AwsClient, id: &str, prior: Option<&Value>)
        -> Result<Value, ManagerError>;
    fn update(&self, client: &AwsClient, id: &str, config: &Value) -> Result<Value, ManagerError>;
    fn delete(&self, client: &AwsClient, state: &Value) -> Result<bool, ManagerError>;
    fn requires_replace(&self, prior_config: &Value, config: &Value) -> Result<bool, ManagerError>;
    fn has_changes(&self, prior_config: &Value, config: &Value) -> Result<bool, ManagerError>;
    /// Rebuilds the configuration an imported object would have been created from.
    fn config_from_state(&self, state: &Value) -> Result<Value, ManagerError>;
    fn id(&self, state: &Value) -> Result<String, ManagerError>;
}

pub trait DataSourceHandler: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn read(&self, client: &AwsClient, args: &Value) -> Result<Value, ManagerError>;
}

pub fn resource<R: ResourceHandler + Default + 'static>() -> Box<dyn ResourceHandler> {
    Box::<R>::default()
}

pub fn data_source<D: DataSourceHandler + Default + 'static>() -> Box<dyn DataSourceHandler> {
    Box::<D>::default()
}

pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, ManagerError> {
    serde_json::from_value(value.clone()).map_err(|e| ManagerError::InvalidInput(e.to_string()))
}

pub fn encode<T: Serialize>(value: &T) -> Result<Value, ManagerError> {
    serde_json::to_value(value).map_err(|e| ManagerError::InvalidInput(e.to_string()))
}
