use std::sync::Arc;

use aws_sdk_cloudwatchlogs::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::v1::{
    aws::{AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{ManagerError, ResourceManager},
};

pub type ResourcePolicyInput = SerializablePutResourcePolicyInput;
pub type ResourcePolicyOutput = SerializableResourcePolicy;
pub type ResourcePolicyManager = AwsManager<ResourcePolicyInput, ResourcePolicyOutput, Client>;
pub type ResourcePolicy = AwsResource<ResourcePolicyInput, ResourcePolicyOutput>;

impl AwsResourceCreator for ResourcePolicy {
    type Input = ResourcePolicyInput;
    type Output = ResourcePolicyOutput;
    fn r#type() -> &'static str {
        "aws_cloudwatch_log_resource_policy"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        ResourcePolicyManager::new(client, client.logs_conn()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        output.policy_name.clone()
    }
    fn input_hook(input: &mut Self::Input) {
        input.policy_document = normalize_json(&input.policy_document);
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.policy_name != input.policy_name
    }
}

/// Reformats a JSON document so equivalent documents compare equal.
/// Anything that is not JSON is kept verbatim.
pub fn normalize_json(document: &str) -> String {
    serde_json::from_str::<Value>(document)
        .and_then(|value| serde_json::to_string(&value))
        .unwrap_or_else(|_| document.to_string())
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializablePutResourcePolicyInput {
    pub policy_name: String,
    pub policy_document: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableResourcePolicy {
    pub policy_name: String,
    pub policy_document: String,
    pub last_updated_time: Option<i64>,
}

impl ResourceManager<ResourcePolicyInput, ResourcePolicyOutput> for ResourcePolicyManager {
    fn lookup(&self, id: &str) -> Result<Option<ResourcePolicyOutput>, ManagerError> {
        self.handle.block_on(async {
            let mut next_token = None;
            loop {
                let response = self
                    .client
                    .describe_resource_policies()
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))?;
                let found = response
                    .resource_policies
                    .unwrap_or_default()
                    .into_iter()
                    .find(|p| p.policy_name.as_deref() == Some(id));
                if let Some(policy) = found {
                    return Ok(Some(SerializableResourcePolicy {
                        policy_name: id.to_string(),
                        policy_document: normalize_json(
                            policy.policy_document.as_deref().unwrap_or_default(),
                        ),
                        last_updated_time: policy.last_updated_time,
                    }));
                }
                match response.next_token {
                    Some(token) => next_token = Some(token),
                    None => return Ok(None),
                }
            }
        })
    }
    fn create(&self, input: &mut ResourcePolicyInput) -> Result<ResourcePolicyOutput, ManagerError> {
        self.put_policy(input)
    }
    fn delete(&self, latest: &ResourcePolicyOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_resource_policy()
                .policy_name(&latest.policy_name)
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        latest: &ResourcePolicyOutput,
        input: &mut ResourcePolicyInput,
    ) -> Result<Option<ResourcePolicyOutput>, ManagerError> {
        if latest.policy_document == input.policy_document {
            return Ok(None);
        }
        self.put_policy(input).map(Some)
    }
}

impl ResourcePolicyManager {
    fn put_policy(&self, input: &ResourcePolicyInput) -> Result<ResourcePolicyOutput, ManagerError> {
        self.handle.block_on(async {
            self.client
                .put_resource_policy()
                .policy_name(&input.policy_name)
                .policy_document(&input.policy_document)
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                .and_then(|response| {
                    response
                        .resource_policy
                        .map(|policy| SerializableResourcePolicy {
                            policy_name: input.policy_name.clone(),
                            policy_document: normalize_json(
                                policy.policy_document.as_deref().unwrap_or_default(),
                            ),
                            last_updated_time: policy.last_updated_time,
                        })
                        .ok_or(ManagerError::UpdateFail(
                            "Resource policy not returned".to_string(),
                        ))
                })
        })
    }
}
