pub mod location_s3;
pub mod uri;

use aws_sdk_datasync::{types::TagListEntry, Client};

use self::location_s3::LocationS3;
use crate::v1::{
    conns::{AwsClient, ClientConfig},
    handler::resource,
    manager::ManagerError,
    names::ServicePackageName,
    tags::KeyValueTags,
    types::{self, DataSourceDescriptor, ResourceDescriptor, ResourceTags},
};

static SDK_RESOURCES: &[ResourceDescriptor] = &[ResourceDescriptor {
    factory: resource::<LocationS3>,
    type_name: "aws_datasync_location_s3",
    name: Some("Location S3"),
    tags: Some(ResourceTags {
        identifier_attribute: Some("id"),
    }),
}];

pub struct ServicePackage;

impl ServicePackage {
    /// DataSync client built from the shared configuration, with the endpoint
    /// override applied to the shared configuration itself.
    pub fn new_conn(&self, config: &ClientConfig) -> Client {
        let mut builder = config.sdk_config().clone().into_builder();
        if let Some(endpoint) = config.endpoint() {
            builder = builder.endpoint_url(endpoint);
        }
        Client::new(&builder.build())
    }
}

impl types::ServicePackage for ServicePackage {
    fn framework_data_sources(&self) -> &'static [DataSourceDescriptor] {
        &[]
    }

    fn framework_resources(&self) -> &'static [ResourceDescriptor] {
        &[]
    }

    fn sdk_data_sources(&self) -> &'static [DataSourceDescriptor] {
        &[]
    }

    fn sdk_resources(&self) -> &'static [ResourceDescriptor] {
        SDK_RESOURCES
    }

    fn service_package_name(&self) -> ServicePackageName {
        ServicePackageName::DataSync
    }

    fn list_tags(&self, client: &AwsClient, identifier: &str) -> Result<KeyValueTags, ManagerError> {
        let conn = client.datasync_conn();
        client.handle().block_on(async {
            let mut tags = KeyValueTags::new();
            let mut next_token = None;
            loop {
                let response = conn
                    .list_tags_for_resource()
                    .resource_arn(identifier)
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))?;
                for entry in response.tags.unwrap_or_default() {
                    tags.insert(entry.key(), entry.value().unwrap_or_default());
                }
                match response.next_token {
                    Some(token) if !token.is_empty() => next_token = Some(token),
                    _ => break,
                }
            }
            Ok(tags)
        })
    }

    fn update_tags(
        &self,
        client: &AwsClient,
        identifier: &str,
        old: &KeyValueTags,
        new: &KeyValueTags,
    ) -> Result<(), ManagerError> {
        let removed = old.removed(new);
        let updated = old
            .updated(new)
            .iter()
            .map(|(key, value)| {
                TagListEntry::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(|e| ManagerError::UpdateFail(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let conn = client.datasync_conn();
        client.handle().block_on(async {
            if !removed.is_empty() {
                tracing::debug!("Untagging {} keys {:?}", identifier, removed);
                conn.untag_resource()
                    .resource_arn(identifier)
                    .set_keys(Some(removed))
                    .send()
                    .await
                    .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))?;
            }
            if !updated.is_empty() {
                tracing::debug!("Tagging {} with {} entries", identifier, updated.len());
                conn.tag_resource()
                    .resource_arn(identifier)
                    .set_tags(Some(updated))
                    .send()
                    .await
                    .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))?;
            }
            Ok(())
        })
    }
}
