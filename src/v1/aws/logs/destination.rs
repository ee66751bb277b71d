use std::sync::Arc;

use aws_sdk_cloudwatchlogs::{types, Client};
use serde::{Deserialize, Serialize};

use crate::v1::{
    aws::{AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{ManagerError, ResourceManager},
    tags::KeyValueTags,
};

pub type DestinationInput = SerializablePutDestinationInput;
pub type DestinationOutput = SerializableDestination;
pub type DestinationManager = AwsManager<DestinationInput, DestinationOutput, Client>;
pub type Destination = AwsResource<DestinationInput, DestinationOutput>;

impl AwsResourceCreator for Destination {
    type Input = DestinationInput;
    type Output = DestinationOutput;
    fn r#type() -> &'static str {
        "aws_cloudwatch_log_destination"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        DestinationManager::new(client, client.logs_conn()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        output.name.clone()
    }
    fn input_hook(input: &mut Self::Input) {
        if input.tags.as_ref().is_some_and(KeyValueTags::is_empty) {
            input.tags = None;
        }
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.name != input.name
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializablePutDestinationInput {
    pub name: String,
    pub role_arn: String,
    pub target_arn: String,
    #[serde(default)]
    pub tags: Option<KeyValueTags>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableDestination {
    pub name: String,
    pub arn: String,
    pub role_arn: String,
    pub target_arn: String,
    pub access_policy: Option<String>,
    pub creation_time: Option<i64>,
}

impl From<types::Destination> for SerializableDestination {
    fn from(value: types::Destination) -> Self {
        Self {
            name: value.destination_name.unwrap_or_default(),
            arn: value.arn.unwrap_or_default(),
            role_arn: value.role_arn.unwrap_or_default(),
            target_arn: value.target_arn.unwrap_or_default(),
            access_policy: value.access_policy,
            creation_time: value.creation_time,
        }
    }
}

impl ResourceManager<DestinationInput, DestinationOutput> for DestinationManager {
    fn lookup(&self, id: &str) -> Result<Option<DestinationOutput>, ManagerError> {
        describe_destination(&self.client, &self.aws, id)
    }
    fn lookup_by_input(
        &self,
        input: &DestinationInput,
    ) -> Result<Option<DestinationOutput>, ManagerError> {
        self.lookup(&input.name)
    }
    fn create(&self, input: &mut DestinationInput) -> Result<DestinationOutput, ManagerError> {
        self.put_destination(input, input.tags.clone())
    }
    fn delete(&self, latest: &DestinationOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_destination()
                .destination_name(&latest.name)
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        latest: &DestinationOutput,
        input: &mut DestinationInput,
    ) -> Result<Option<DestinationOutput>, ManagerError> {
        if latest.role_arn == input.role_arn && latest.target_arn == input.target_arn {
            return Ok(None);
        }
        // Tags of an existing destination are reconciled through the tagging API.
        self.put_destination(input, None).map(Some)
    }
}

impl DestinationManager {
    fn put_destination(
        &self,
        input: &DestinationInput,
        tags: Option<KeyValueTags>,
    ) -> Result<DestinationOutput, ManagerError> {
        self.handle.block_on(async {
            self.client
                .put_destination()
                .destination_name(&input.name)
                .role_arn(&input.role_arn)
                .target_arn(&input.target_arn)
                .set_tags(tags.map(KeyValueTags::into_hash_map))
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                .and_then(|response| {
                    response.destination.map(Into::into).ok_or(ManagerError::UpdateFail(
                        "Destination not returned".to_string(),
                    ))
                })
        })
    }
}

/// Exact-name lookup shared with the destination policy resource.
pub(crate) fn describe_destination(
    conn: &Client,
    aws: &AwsClient,
    name: &str,
) -> Result<Option<DestinationOutput>, ManagerError> {
    aws.handle().block_on(async {
        let mut next_token = None;
        loop {
            let response = conn
                .describe_destinations()
                .destination_name_prefix(name)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))?;
            let found = response
                .destinations
                .unwrap_or_default()
                .into_iter()
                .find(|d| d.destination_name.as_deref() == Some(name));
            if let Some(destination) = found {
                return Ok(Some(destination.into()));
            }
            match response.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(None),
            }
        }
    })
}
