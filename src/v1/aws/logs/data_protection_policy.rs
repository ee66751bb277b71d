use std::sync::Arc;

use aws_sdk_cloudwatchlogs::Client;
use serde::{Deserialize, Serialize};

use super::resource_policy::normalize_json;
use crate::v1::{
    aws::{AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{not_found_as_none, ManagerError, ResourceManager},
};

pub type DataProtectionPolicyInput = SerializablePutDataProtectionPolicyInput;
pub type DataProtectionPolicyOutput = SerializableDataProtectionPolicy;
pub type DataProtectionPolicyManager =
    AwsManager<DataProtectionPolicyInput, DataProtectionPolicyOutput, Client>;
pub type DataProtectionPolicy = AwsResource<DataProtectionPolicyInput, DataProtectionPolicyOutput>;

impl AwsResourceCreator for DataProtectionPolicy {
    type Input = DataProtectionPolicyInput;
    type Output = DataProtectionPolicyOutput;
    fn r#type() -> &'static str {
        "aws_cloudwatch_log_data_protection_policy"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        DataProtectionPolicyManager::new(client, client.logs_conn()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        output.log_group_name.clone()
    }
    fn input_hook(input: &mut Self::Input) {
        input.policy_document = normalize_json(&input.policy_document);
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.log_group_name != input.log_group_name
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializablePutDataProtectionPolicyInput {
    pub log_group_name: String,
    pub policy_document: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableDataProtectionPolicy {
    pub log_group_name: String,
    pub policy_document: String,
    pub last_updated_time: Option<i64>,
}

impl ResourceManager<DataProtectionPolicyInput, DataProtectionPolicyOutput>
    for DataProtectionPolicyManager
{
    fn lookup(&self, id: &str) -> Result<Option<DataProtectionPolicyOutput>, ManagerError> {
        let policy = self.handle.block_on(async {
            self.client
                .get_data_protection_policy()
                .log_group_identifier(id)
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))
        });
        not_found_as_none(policy, super::NOT_FOUND).map(|policy| {
            policy.and_then(|response| {
                response
                    .policy_document
                    .filter(|document| !document.is_empty())
                    .map(|document| SerializableDataProtectionPolicy {
                        log_group_name: id.to_string(),
                        policy_document: normalize_json(&document),
                        last_updated_time: response.last_updated_time,
                    })
            })
        })
    }
    fn create(
        &self,
        input: &mut DataProtectionPolicyInput,
    ) -> Result<DataProtectionPolicyOutput, ManagerError> {
        self.handle.block_on(async {
            self.client
                .put_data_protection_policy()
                .log_group_identifier(&input.log_group_name)
                .policy_document(&input.policy_document)
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                .map(|response| SerializableDataProtectionPolicy {
                    log_group_name: input.log_group_name.clone(),
                    policy_document: normalize_json(
                        response.policy_document.as_deref().unwrap_or_default(),
                    ),
                    last_updated_time: response.last_updated_time,
                })
        })
    }
    fn delete(&self, latest: &DataProtectionPolicyOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_data_protection_policy()
                .log_group_identifier(&latest.log_group_name)
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        latest: &DataProtectionPolicyOutput,
        input: &mut DataProtectionPolicyInput,
    ) -> Result<Option<DataProtectionPolicyOutput>, ManagerError> {
        if latest.policy_document == input.policy_document {
            return Ok(None);
        }
        self.create(input).map(Some)
    }
}
