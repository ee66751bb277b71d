use std::collections::BTreeMap;

use lazy_static::lazy_static;
use serde_json::Value;
use thiserror::Error;

use super::{
    aws::service_packages,
    conns::AwsClient,
    handler::{DataSourceHandler, ResourceHandler},
    manager::ManagerError,
    tags::KeyValueTags,
    types::{DataSourceDescriptor, ResourceDescriptor, ServicePackage},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Framework,
    Sdk,
}

/// A resource type as registered by its service package.
#[derive(Clone, Copy)]
pub struct RegisteredResource {
    pub package: &'static dyn ServicePackage,
    pub descriptor: &'static ResourceDescriptor,
    pub generation: Generation,
}

#[derive(Clone, Copy)]
pub struct RegisteredDataSource {
    pub package: &'static dyn ServicePackage,
    pub descriptor: &'static DataSourceDescriptor,
    pub generation: Generation,
}

impl RegisteredDataSource {
    pub fn handler(&self) -> Box<dyn DataSourceHandler> {
        (self.descriptor.factory)()
    }

    pub fn read(&self, client: &AwsClient, args: &Value) -> Result<Value, ManagerError> {
        self.handler().read(client, args)
    }
}

impl RegisteredResource {
    pub fn type_name(&self) -> &'static str {
        self.descriptor.type_name
    }

    pub fn handler(&self) -> Box<dyn ResourceHandler> {
        (self.descriptor.factory)()
    }

    /// Attribute naming the object to the tagging API, when the host
    /// reconciles tags for this type.
    pub fn tag_identifier(&self) -> Option<&'static str> {
        self.descriptor.tags.and_then(|t| t.identifier_attribute)
    }

    fn identifier_value(&self, state: &Value) -> Option<String> {
        self.tag_identifier()
            .and_then(|attribute| state.get(attribute))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn with_tags(&self, client: &AwsClient, mut state: Value) -> Result<Value, ManagerError> {
        if let Some(identifier) = self.identifier_value(&state) {
            let tags = self.package.list_tags(client, &identifier)?;
            if let Some(object) = state.as_object_mut() {
                object.insert("tags".to_string(), tags.to_value());
            }
        }
        Ok(state)
    }

    pub fn create(&self, client: &AwsClient, config: &Value) -> Result<Value, ManagerError> {
        let state = self.handler().create(client, config)?;
        self.with_tags(client, state)
    }

    /// Fails with [`ManagerError::NotFound`] once the object is gone.
    pub fn read(
        &self,
        client: &AwsClient,
        id: &str,
        prior: Option<&Value>,
    ) -> Result<Value, ManagerError> {
        let state = self.handler().read(client, id, prior)?;
        self.with_tags(client, state)
    }

    pub fn update(
        &self,
        client: &AwsClient,
        id: &str,
        prior_state: &Value,
        config: &Value,
    ) -> Result<Value, ManagerError> {
        let state = self.handler().update(client, id, config)?;
        if let Some(identifier) = self.identifier_value(&state) {
            let old = KeyValueTags::from_attribute(prior_state)?;
            let new = KeyValueTags::from_attribute(config)?;
            if old != new {
                self.package.update_tags(client, &identifier, &old, &new)?;
            }
        }
        self.with_tags(client, state)
    }

    pub fn delete(&self, client: &AwsClient, state: &Value) -> Result<bool, ManagerError> {
        self.handler().delete(client, state)
    }
}

pub struct Registry {
    resources: BTreeMap<&'static str, RegisteredResource>,
    data_sources: BTreeMap<&'static str, RegisteredDataSource>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
            data_sources: BTreeMap::new(),
        }
    }

    pub fn from_packages(
        packages: &[&'static dyn ServicePackage],
    ) -> Result<Self, RegistryError> {
        packages.iter().try_fold(Self::new(), |mut registry, package| {
            registry.register_package(*package)?;
            Ok(registry)
        })
    }

    pub fn register_package(
        &mut self,
        package: &'static dyn ServicePackage,
    ) -> Result<(), RegistryError> {
        tracing::debug!("Registering service package {}", package.service_package_name());
        let resources = package
            .framework_resources()
            .iter()
            .map(|d| (d, Generation::Framework))
            .chain(package.sdk_resources().iter().map(|d| (d, Generation::Sdk)));
        for (descriptor, generation) in resources {
            self.register_type(RegisteredResource {
                package,
                descriptor,
                generation,
            })?;
        }
        let data_sources = package
            .framework_data_sources()
            .iter()
            .map(|d| (d, Generation::Framework))
            .chain(package.sdk_data_sources().iter().map(|d| (d, Generation::Sdk)));
        for (descriptor, generation) in data_sources {
            self.register_data_source(RegisteredDataSource {
                package,
                descriptor,
                generation,
            })?;
        }
        Ok(())
    }

    pub fn register_type(&mut self, resource: RegisteredResource) -> Result<(), RegistryError> {
        let type_name = resource.descriptor.type_name;
        let reported = resource.handler().type_name();
        if reported != type_name {
            return Err(RegistryError::TypeNameMismatch(format!(
                "descriptor {} builds a handler for {}",
                type_name, reported
            )));
        }
        match self.resources.insert(type_name, resource) {
            Some(_) => Err(RegistryError::TypeRegisteredAlready(format!(
                "Type id {:?} was already registered.",
                type_name
            ))),
            None => Ok(()),
        }
    }

    pub fn register_data_source(
        &mut self,
        data_source: RegisteredDataSource,
    ) -> Result<(), RegistryError> {
        let type_name = data_source.descriptor.type_name;
        let reported = data_source.handler().type_name();
        if reported != type_name {
            return Err(RegistryError::TypeNameMismatch(format!(
                "descriptor {} builds a handler for {}",
                type_name, reported
            )));
        }
        match self.data_sources.insert(type_name, data_source) {
            Some(_) => Err(RegistryError::TypeRegisteredAlready(format!(
                "Data source {:?} was already registered.",
                type_name
            ))),
            None => Ok(()),
        }
    }

    pub fn resource(&self, type_name: &str) -> Result<&RegisteredResource, RegistryError> {
        self.resources
            .get(type_name)
            .ok_or_else(|| RegistryError::ResourceTypeNotSupported(type_name.to_string()))
    }

    pub fn data_source(&self, type_name: &str) -> Result<&RegisteredDataSource, RegistryError> {
        self.data_sources
            .get(type_name)
            .ok_or_else(|| RegistryError::DataSourceNotSupported(type_name.to_string()))
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    static ref DEFAULT_REGISTRY: Result<Registry, RegistryError> =
        Registry::from_packages(service_packages());
}

/// Registry of every shipped service package, built on first use.
pub fn default_registry() -> Result<&'static Registry, RegistryError> {
    DEFAULT_REGISTRY.as_ref().map_err(Clone::clone)
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("TypeRegisteredAlready, provider was not able to registry resource: {0}")]
    TypeRegisteredAlready(String),
    #[error("TypeNameMismatch: {0}")]
    TypeNameMismatch(String),
    #[error("Unknown resource type {0}")]
    ResourceTypeNotSupported(String),
    #[error("Unknown data source type {0}")]
    DataSourceNotSupported(String),
}
