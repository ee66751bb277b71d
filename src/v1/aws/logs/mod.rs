pub mod data_protection_policy;
pub mod data_protection_policy_document;
pub mod destination;
pub mod destination_policy;
pub mod group;
pub mod groups;
pub mod metric_filter;
pub mod query_definition;
pub mod resource_policy;
pub mod stream;
pub mod subscription_filter;

use std::collections::HashMap;

use aws_sdk_cloudwatchlogs::{config, Client};

use self::{
    data_protection_policy::DataProtectionPolicy,
    data_protection_policy_document::DataProtectionPolicyDocument, destination::Destination,
    destination_policy::DestinationPolicy, group::LogGroup, groups::LogGroups,
    metric_filter::MetricFilter, query_definition::QueryDefinition,
    resource_policy::ResourcePolicy, stream::LogStream, subscription_filter::SubscriptionFilter,
};
use crate::v1::{
    conns::{AwsClient, ClientConfig},
    handler::{data_source, resource},
    manager::ManagerError,
    names::ServicePackageName,
    tags::KeyValueTags,
    types::{self, DataSourceDescriptor, ResourceDescriptor, ResourceTags},
};

pub(crate) const NOT_FOUND: &[&str] = &["ResourceNotFoundException"];

static SDK_DATA_SOURCES: &[DataSourceDescriptor] = &[
    DataSourceDescriptor {
        factory: data_source::<DataProtectionPolicyDocument>,
        type_name: "aws_cloudwatch_log_data_protection_policy_document",
        tags: None,
    },
    DataSourceDescriptor {
        factory: data_source::<group::LogGroupData>,
        type_name: "aws_cloudwatch_log_group",
        tags: None,
    },
    DataSourceDescriptor {
        factory: data_source::<LogGroups>,
        type_name: "aws_cloudwatch_log_groups",
        tags: None,
    },
];

static SDK_RESOURCES: &[ResourceDescriptor] = &[
    ResourceDescriptor {
        factory: resource::<DataProtectionPolicy>,
        type_name: "aws_cloudwatch_log_data_protection_policy",
        name: None,
        tags: None,
    },
    ResourceDescriptor {
        factory: resource::<Destination>,
        type_name: "aws_cloudwatch_log_destination",
        name: Some("Destination"),
        tags: Some(ResourceTags {
            identifier_attribute: Some("arn"),
        }),
    },
    ResourceDescriptor {
        factory: resource::<DestinationPolicy>,
        type_name: "aws_cloudwatch_log_destination_policy",
        name: None,
        tags: None,
    },
    ResourceDescriptor {
        factory: resource::<LogGroup>,
        type_name: "aws_cloudwatch_log_group",
        name: Some("Log Group"),
        tags: Some(ResourceTags {
            identifier_attribute: None,
        }),
    },
    ResourceDescriptor {
        factory: resource::<MetricFilter>,
        type_name: "aws_cloudwatch_log_metric_filter",
        name: None,
        tags: None,
    },
    ResourceDescriptor {
        factory: resource::<ResourcePolicy>,
        type_name: "aws_cloudwatch_log_resource_policy",
        name: None,
        tags: None,
    },
    ResourceDescriptor {
        factory: resource::<LogStream>,
        type_name: "aws_cloudwatch_log_stream",
        name: None,
        tags: None,
    },
    ResourceDescriptor {
        factory: resource::<SubscriptionFilter>,
        type_name: "aws_cloudwatch_log_subscription_filter",
        name: None,
        tags: None,
    },
    ResourceDescriptor {
        factory: resource::<QueryDefinition>,
        type_name: "aws_cloudwatch_query_definition",
        name: None,
        tags: None,
    },
];

pub struct ServicePackage;

impl ServicePackage {
    /// Client whose endpoint override is applied to the shared configuration.
    pub fn new_conn(&self, config: &ClientConfig) -> Client {
        let mut builder = config.sdk_config().clone().into_builder();
        if let Some(endpoint) = config.endpoint() {
            builder = builder.endpoint_url(endpoint);
        }
        Client::new(&builder.build())
    }

    /// Client whose endpoint override is applied to the service configuration.
    pub fn new_client(&self, config: &ClientConfig) -> Client {
        let mut builder = config::Builder::from(config.sdk_config());
        if let Some(endpoint) = config.endpoint() {
            builder = builder.endpoint_url(endpoint);
        }
        Client::from_conf(builder.build())
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
        SDK_DATA_SOURCES
    }

    fn sdk_resources(&self) -> &'static [ResourceDescriptor] {
        SDK_RESOURCES
    }

    fn service_package_name(&self) -> ServicePackageName {
        ServicePackageName::Logs
    }

    fn list_tags(&self, client: &AwsClient, identifier: &str) -> Result<KeyValueTags, ManagerError> {
        list_tags(&client.logs_client(), client, identifier)
    }

    fn update_tags(
        &self,
        client: &AwsClient,
        identifier: &str,
        old: &KeyValueTags,
        new: &KeyValueTags,
    ) -> Result<(), ManagerError> {
        update_tags(&client.logs_client(), client, identifier, old, new)
    }
}

/// Log group ARNs are reported with a trailing `:*` the tagging API rejects.
pub(crate) fn trim_log_group_arn(arn: &str) -> &str {
    arn.strip_suffix(":*").unwrap_or(arn)
}

pub(crate) fn list_tags(
    conn: &Client,
    client: &AwsClient,
    identifier: &str,
) -> Result<KeyValueTags, ManagerError> {
    client.handle().block_on(async {
        conn.list_tags_for_resource()
            .resource_arn(trim_log_group_arn(identifier))
            .send()
            .await
            .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))
            .map(|response| response.tags.map(KeyValueTags::from).unwrap_or_default())
    })
}

pub(crate) fn update_tags(
    conn: &Client,
    client: &AwsClient,
    identifier: &str,
    old: &KeyValueTags,
    new: &KeyValueTags,
) -> Result<(), ManagerError> {
    let identifier = trim_log_group_arn(identifier);
    let removed = old.removed(new);
    let updated: HashMap<String, String> = old.updated(new).into_hash_map();
    client.handle().block_on(async {
        if !removed.is_empty() {
            tracing::debug!("Untagging {} keys {:?}", identifier, removed);
            conn.untag_resource()
                .resource_arn(identifier)
                .set_tag_keys(Some(removed))
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

/// Splits `log_group_name:child_name` identifiers.
pub(crate) fn split_id<'a>(id: &'a str, what: &str) -> Result<(&'a str, &'a str), ManagerError> {
    match id.split_once(':') {
        Some((group, name)) if !group.is_empty() && !name.is_empty() => Ok((group, name)),
        _ => Err(ManagerError::InvalidInput(format!(
            "{} id [{}] must look like log_group_name:name",
            what, id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_group_arn_suffix() {
        assert_eq!(
            trim_log_group_arn("arn:aws:logs:us-east-1:123456789012:log-group:app:*"),
            "arn:aws:logs:us-east-1:123456789012:log-group:app"
        );
        assert_eq!(trim_log_group_arn("arn:aws:logs:x:1:destination:d"), "arn:aws:logs:x:1:destination:d");
    }

    #[test]
    fn composite_ids() {
        assert_eq!(split_id("/aws/app:web-1", "stream").unwrap(), ("/aws/app", "web-1"));
        assert!(split_id("no-separator", "stream").is_err());
        assert!(split_id(":name", "stream").is_err());
    }
}
