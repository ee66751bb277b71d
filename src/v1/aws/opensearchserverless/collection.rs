use std::sync::Arc;

use aws_sdk_opensearchserverless::{
    types::{CollectionDetail, CollectionType, StandbyReplicas},
    Client,
};
use serde::{Deserialize, Serialize};

use super::sdk_tags;
use crate::v1::{
    aws::{AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{ManagerError, ResourceManager},
    tags::KeyValueTags,
};

pub type CollectionInput = SerializableCreateCollectionInput;
pub type CollectionOutput = SerializableCollection;
pub type CollectionManager = AwsManager<CollectionInput, CollectionOutput, Client>;
pub type Collection = AwsResource<CollectionInput, CollectionOutput>;

impl AwsResourceCreator for Collection {
    type Input = CollectionInput;
    type Output = CollectionOutput;
    fn r#type() -> &'static str {
        "aws_opensearchserverless_collection"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        CollectionManager::new(client, client.opensearchserverless_client()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        output.id.clone()
    }
    fn input_hook(input: &mut Self::Input) {
        if input.tags.as_ref().is_some_and(KeyValueTags::is_empty) {
            input.tags = None;
        }
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.name != input.name
            || latest.r#type != input.r#type
            || latest.standby_replicas != input.standby_replicas
    }
    fn fill_computed(prior: &Self::Input, input: &mut Self::Input) {
        if input.r#type.is_none() {
            input.r#type = prior.r#type.clone();
        }
        if input.standby_replicas.is_none() {
            input.standby_replicas = prior.standby_replicas.clone();
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableCreateCollectionInput {
    pub name: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub standby_replicas: Option<String>,
    #[serde(default)]
    pub tags: Option<KeyValueTags>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableCollection {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub r#type: Option<String>,
    pub description: Option<String>,
    pub standby_replicas: Option<String>,
    pub kms_key_arn: Option<String>,
    pub collection_endpoint: Option<String>,
    pub dashboard_endpoint: Option<String>,
    pub status: Option<String>,
}

impl From<CollectionDetail> for SerializableCollection {
    fn from(value: CollectionDetail) -> Self {
        Self {
            id: value.id.unwrap_or_default(),
            arn: value.arn.unwrap_or_default(),
            name: value.name.unwrap_or_default(),
            r#type: value.r#type.map(|t| t.as_str().to_string()),
            description: value.description.filter(|d| !d.is_empty()),
            standby_replicas: value.standby_replicas.map(|s| s.as_str().to_string()),
            kms_key_arn: value.kms_key_arn,
            collection_endpoint: value.collection_endpoint,
            dashboard_endpoint: value.dashboard_endpoint,
            status: value.status.map(|s| s.as_str().to_string()),
        }
    }
}

impl ResourceManager<CollectionInput, CollectionOutput> for CollectionManager {
    fn lookup(&self, id: &str) -> Result<Option<CollectionOutput>, ManagerError> {
        self.handle.block_on(async {
            self.client
                .batch_get_collection()
                .ids(id)
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))
                .map(|response| {
                    response
                        .collection_details
                        .unwrap_or_default()
                        .into_iter()
                        .find(|c| c.id.as_deref() == Some(id))
                        .map(Into::into)
                })
        })
    }
    fn create(&self, input: &mut CollectionInput) -> Result<CollectionOutput, ManagerError> {
        let tags = input.tags.as_ref().map(sdk_tags).transpose()?;
        let id = self.handle.block_on(async {
            self.client
                .create_collection()
                .name(&input.name)
                .set_type(input.r#type.as_deref().map(CollectionType::from))
                .set_description(input.description.clone())
                .set_standby_replicas(input.standby_replicas.as_deref().map(StandbyReplicas::from))
                .set_tags(tags)
                .send()
                .await
                .map_err(|e| ManagerError::CreateFail(format!("{:?}", e.into_source())))
                .and_then(|response| {
                    response
                        .create_collection_detail
                        .and_then(|detail| detail.id)
                        .ok_or(ManagerError::CreateFail(
                            "Could not get collection id".to_string(),
                        ))
                })
        })?;
        self.lookup(&id)?.ok_or(ManagerError::CreateFail(format!(
            "Collection {} not visible after creation",
            id
        )))
    }
    fn delete(&self, latest: &CollectionOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_collection()
                .id(&latest.id)
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        latest: &CollectionOutput,
        input: &mut CollectionInput,
    ) -> Result<Option<CollectionOutput>, ManagerError> {
        if latest.description == input.description {
            return Ok(None);
        }
        self.handle.block_on(async {
            self.client
                .update_collection()
                .id(&latest.id)
                .description(input.description.clone().unwrap_or_default())
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
        })?;
        self.lookup(&latest.id)
    }
}
