use std::sync::Arc;

use aws_sdk_cloudwatchlogs::Client;
use serde::{Deserialize, Serialize};

use super::{destination::describe_destination, resource_policy::normalize_json};
use crate::v1::{
    aws::{AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{ManagerError, ResourceManager},
};

pub type DestinationPolicyInput = SerializablePutDestinationPolicyInput;
pub type DestinationPolicyOutput = SerializableDestinationPolicy;
pub type DestinationPolicyManager =
    AwsManager<DestinationPolicyInput, DestinationPolicyOutput, Client>;
pub type DestinationPolicy = AwsResource<DestinationPolicyInput, DestinationPolicyOutput>;

impl AwsResourceCreator for DestinationPolicy {
    type Input = DestinationPolicyInput;
    type Output = DestinationPolicyOutput;
    fn r#type() -> &'static str {
        "aws_cloudwatch_log_destination_policy"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        DestinationPolicyManager::new(client, client.logs_conn()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        output.destination_name.clone()
    }
    fn input_hook(input: &mut Self::Input) {
        input.access_policy = normalize_json(&input.access_policy);
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.destination_name != input.destination_name
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializablePutDestinationPolicyInput {
    pub destination_name: String,
    pub access_policy: String,
    #[serde(default)]
    pub force_update: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableDestinationPolicy {
    pub destination_name: String,
    pub access_policy: String,
}

impl ResourceManager<DestinationPolicyInput, DestinationPolicyOutput> for DestinationPolicyManager {
    fn lookup(&self, id: &str) -> Result<Option<DestinationPolicyOutput>, ManagerError> {
        describe_destination(&self.client, &self.aws, id).map(|destination| {
            destination.and_then(|d| {
                d.access_policy.map(|policy| SerializableDestinationPolicy {
                    destination_name: d.name,
                    access_policy: normalize_json(&policy),
                })
            })
        })
    }
    fn create(
        &self,
        input: &mut DestinationPolicyInput,
    ) -> Result<DestinationPolicyOutput, ManagerError> {
        self.put_policy(input)?;
        Ok(SerializableDestinationPolicy {
            destination_name: input.destination_name.clone(),
            access_policy: input.access_policy.clone(),
        })
    }
    /// The service has no call to remove a destination policy; it goes away
    /// with its destination.
    fn delete(&self, _latest: &DestinationPolicyOutput) -> Result<bool, ManagerError> {
        Ok(true)
    }
    fn syncup(
        &self,
        latest: &DestinationPolicyOutput,
        input: &mut DestinationPolicyInput,
    ) -> Result<Option<DestinationPolicyOutput>, ManagerError> {
        if latest.access_policy == input.access_policy {
            return Ok(None);
        }
        self.create(input).map(Some)
    }
}

impl DestinationPolicyManager {
    fn put_policy(&self, input: &DestinationPolicyInput) -> Result<(), ManagerError> {
        self.handle.block_on(async {
            self.client
                .put_destination_policy()
                .destination_name(&input.destination_name)
                .access_policy(&input.access_policy)
                .set_force_update(input.force_update)
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                .map(|_| ())
        })
    }
}
