use std::fmt;

use super::{
    conns::AwsClient,
    handler::{DataSourceHandler, ResourceHandler},
    manager::ManagerError,
    names::ServicePackageName,
    tags::KeyValueTags,
};

pub type ResourceFactory = fn() -> Box<dyn ResourceHandler>;
pub type DataSourceFactory = fn() -> Box<dyn DataSourceHandler>;

/// Names the attribute carrying a resource's identifier for tag reconciliation.
/// Without an identifier attribute the resource manages its own tags.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResourceTags {
    pub identifier_attribute: Option<&'static str>,
}

#[derive(Clone, Copy)]
pub struct ResourceDescriptor {
    pub factory: ResourceFactory,
    pub type_name: &'static str,
    pub name: Option<&'static str>,
    pub tags: Option<ResourceTags>,
}

#[derive(Clone, Copy)]
pub struct DataSourceDescriptor {
    pub factory: DataSourceFactory,
    pub type_name: &'static str,
    pub tags: Option<ResourceTags>,
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish()
    }
}

impl fmt::Debug for DataSourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceDescriptor")
            .field("type_name", &self.type_name)
            .field("tags", &self.tags)
            .finish()
    }
}

/// Registration surface of one sub-service.
///
/// The four tables are fixed at compile time and listed in declaration order.
/// An empty table means the sub-service exposes nothing of that kind.
pub trait ServicePackage: Send + Sync {
    fn framework_data_sources(&self) -> &'static [DataSourceDescriptor];
    fn framework_resources(&self) -> &'static [ResourceDescriptor];
    fn sdk_data_sources(&self) -> &'static [DataSourceDescriptor];
    fn sdk_resources(&self) -> &'static [ResourceDescriptor];
    fn service_package_name(&self) -> ServicePackageName;

    fn list_tags(
        &self,
        _client: &AwsClient,
        _identifier: &str,
    ) -> Result<KeyValueTags, ManagerError> {
        Ok(KeyValueTags::new())
    }

    fn update_tags(
        &self,
        _client: &AwsClient,
        _identifier: &str,
        _old: &KeyValueTags,
        _new: &KeyValueTags,
    ) -> Result<(), ManagerError> {
        Ok(())
    }
}
