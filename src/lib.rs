pub mod v1;

pub mod prelude {
    pub use crate::v1::aws::{service_packages, AwsManager, AwsResource, AwsResourceCreator};
    pub use crate::v1::cloud::*;
    pub use crate::v1::conns::{AwsClient, ClientConfig, ConnsError, ProviderConfig};
    pub use crate::v1::datastore::Datastore;
    pub use crate::v1::manager::{ManagerError, ResourceManager};
    pub use crate::v1::names::ServicePackageName;
    pub use crate::v1::plan::{Action, PlannedChange};
    pub use crate::v1::registry::default_registry;
    pub use crate::v1::resource::{ResourceState::*, *};
    pub use crate::v1::storage::file::{FileStorage, DEFAULT_STATE_FILE};
    pub use crate::v1::tags::KeyValueTags;
    pub use crate::v1::types::ServicePackage;
}
