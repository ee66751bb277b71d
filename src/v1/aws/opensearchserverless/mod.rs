pub mod access_policy;
pub mod collection;
pub mod security_config;
pub mod security_policy;
pub mod vpc_endpoint;

use aws_sdk_opensearchserverless::{config, types::Tag, Client};
use aws_smithy_types::{Document, Number};
use serde_json::Value;

use self::{
    access_policy::AccessPolicy, collection::Collection, security_config::SecurityConfig,
    security_policy::SecurityPolicy, vpc_endpoint::VpcEndpoint,
};
use crate::v1::{
    conns::{AwsClient, ClientConfig},
    handler::resource,
    manager::ManagerError,
    names::ServicePackageName,
    tags::KeyValueTags,
    types::{self, DataSourceDescriptor, ResourceDescriptor, ResourceTags},
};

pub(crate) const NOT_FOUND: &[&str] = &["ResourceNotFoundException"];

static FRAMEWORK_RESOURCES: &[ResourceDescriptor] = &[
    ResourceDescriptor {
        factory: resource::<AccessPolicy>,
        type_name: "aws_opensearchserverless_access_policy",
        name: None,
        tags: None,
    },
    ResourceDescriptor {
        factory: resource::<Collection>,
        type_name: "aws_opensearchserverless_collection",
        name: Some("Collection"),
        tags: Some(ResourceTags {
            identifier_attribute: Some("arn"),
        }),
    },
    ResourceDescriptor {
        factory: resource::<SecurityConfig>,
        type_name: "aws_opensearchserverless_security_config",
        name: None,
        tags: None,
    },
    ResourceDescriptor {
        factory: resource::<SecurityPolicy>,
        type_name: "aws_opensearchserverless_security_policy",
        name: None,
        tags: None,
    },
    ResourceDescriptor {
        factory: resource::<VpcEndpoint>,
        type_name: "aws_opensearchserverless_vpc_endpoint",
        name: None,
        tags: None,
    },
];

pub struct ServicePackage;

impl ServicePackage {
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
        FRAMEWORK_RESOURCES
    }

    fn sdk_data_sources(&self) -> &'static [DataSourceDescriptor] {
        &[]
    }

    fn sdk_resources(&self) -> &'static [ResourceDescriptor] {
        &[]
    }

    fn service_package_name(&self) -> ServicePackageName {
        ServicePackageName::OpenSearchServerless
    }

    fn list_tags(&self, client: &AwsClient, identifier: &str) -> Result<KeyValueTags, ManagerError> {
        let conn = client.opensearchserverless_client();
        client.handle().block_on(async {
            conn.list_tags_for_resource()
                .resource_arn(identifier)
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))
                .map(|response| {
                    response
                        .tags
                        .unwrap_or_default()
                        .into_iter()
                        .map(|tag| (tag.key, tag.value))
                        .collect()
                })
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
        let updated = sdk_tags(&old.updated(new))?;
        let conn = client.opensearchserverless_client();
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
}

pub(crate) fn sdk_tags(tags: &KeyValueTags) -> Result<Vec<Tag>, ManagerError> {
    tags.iter()
        .map(|(key, value)| {
            Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| ManagerError::InvalidInput(e.to_string()))
        })
        .collect()
}

/// Policies are sent as JSON text but come back as smithy documents.
pub(crate) fn document_to_value(document: &Document) -> Value {
    match document {
        Document::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), document_to_value(v)))
                .collect(),
        ),
        Document::Array(items) => Value::Array(items.iter().map(document_to_value).collect()),
        Document::Number(Number::PosInt(n)) => Value::from(*n),
        Document::Number(Number::NegInt(n)) => Value::from(*n),
        Document::Number(Number::Float(n)) => Value::from(*n),
        Document::String(s) => Value::String(s.clone()),
        Document::Bool(b) => Value::Bool(*b),
        Document::Null => Value::Null,
    }
}

pub(crate) fn policy_text(document: Option<&Document>) -> String {
    document
        .map(|d| document_to_value(d).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::*;

    #[test]
    fn smithy_document_becomes_json() {
        let document = Document::Object(HashMap::from([
            (
                "Rules".to_string(),
                Document::Array(vec![Document::String("collection/logs".to_string())]),
            ),
            ("AWSOwnedKey".to_string(), Document::Bool(true)),
            ("Version".to_string(), Document::Number(Number::PosInt(1))),
        ]));
        assert_eq!(
            document_to_value(&document),
            json!({"Rules": ["collection/logs"], "AWSOwnedKey": true, "Version": 1})
        );
        assert_eq!(policy_text(None), "");
    }

    #[test]
    fn tags_convert_to_sdk_shape() {
        let tags: KeyValueTags = [("env".to_string(), "test".to_string())]
            .into_iter()
            .collect();
        let sdk = sdk_tags(&tags).unwrap();
        assert_eq!(sdk.len(), 1);
        assert_eq!(sdk[0].key(), "env");
        assert_eq!(sdk[0].value(), "test");
    }
}
