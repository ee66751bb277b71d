use std::sync::Arc;

use aws_sdk_opensearchserverless::{
    types::{AccessPolicyDetail, AccessPolicyType},
    Client,
};
use serde::{Deserialize, Serialize};

use super::policy_text;
use crate::v1::{
    aws::{logs::resource_policy::normalize_json, AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{not_found_as_none, ManagerError, ResourceManager},
};

pub type AccessPolicyInput = SerializableCreateAccessPolicyInput;
pub type AccessPolicyOutput = SerializableAccessPolicy;
pub type AccessPolicyManager = AwsManager<AccessPolicyInput, AccessPolicyOutput, Client>;
pub type AccessPolicy = AwsResource<AccessPolicyInput, AccessPolicyOutput>;

impl AwsResourceCreator for AccessPolicy {
    type Input = AccessPolicyInput;
    type Output = AccessPolicyOutput;
    fn r#type() -> &'static str {
        "aws_opensearchserverless_access_policy"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        AccessPolicyManager::new(client, client.opensearchserverless_client()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        policy_id(&output.name, &output.r#type)
    }
    fn input_hook(input: &mut Self::Input) {
        input.policy = normalize_json(&input.policy);
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.name != input.name || latest.r#type != input.r#type
    }
}

/// Policies are unique per name and type; the identifier is `name/type`.
pub(crate) fn policy_id(name: &str, r#type: &str) -> String {
    format!("{}/{}", name, r#type)
}

pub(crate) fn split_policy_id(id: &str) -> Result<(&str, &str), ManagerError> {
    id.split_once('/')
        .filter(|(name, r#type)| !name.is_empty() && !r#type.is_empty())
        .ok_or_else(|| ManagerError::InvalidInput(format!("policy id [{}] must look like name/type", id)))
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableCreateAccessPolicyInput {
    pub name: String,
    #[serde(default = "default_type")]
    pub r#type: String,
    pub policy: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_type() -> String {
    AccessPolicyType::Data.as_str().to_string()
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableAccessPolicy {
    pub id: String,
    pub name: String,
    pub r#type: String,
    pub policy: String,
    pub policy_version: Option<String>,
    pub description: Option<String>,
}

impl From<AccessPolicyDetail> for SerializableAccessPolicy {
    fn from(value: AccessPolicyDetail) -> Self {
        let name = value.name.unwrap_or_default();
        let r#type = value
            .r#type
            .map(|t| t.as_str().to_string())
            .unwrap_or_default();
        Self {
            id: policy_id(&name, &r#type),
            policy: normalize_json(&policy_text(value.policy.as_ref())),
            name,
            r#type,
            policy_version: value.policy_version,
            description: value.description.filter(|d| !d.is_empty()),
        }
    }
}

impl ResourceManager<AccessPolicyInput, AccessPolicyOutput> for AccessPolicyManager {
    fn lookup(&self, id: &str) -> Result<Option<AccessPolicyOutput>, ManagerError> {
        let (name, r#type) = split_policy_id(id)?;
        let response = self.handle.block_on(async {
            self.client
                .get_access_policy()
                .name(name)
                .r#type(AccessPolicyType::from(r#type))
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))
        });
        not_found_as_none(response, super::NOT_FOUND)
            .map(|response| response.and_then(|r| r.access_policy_detail).map(Into::into))
    }
    fn create(&self, input: &mut AccessPolicyInput) -> Result<AccessPolicyOutput, ManagerError> {
        self.handle.block_on(async {
            self.client
                .create_access_policy()
                .name(&input.name)
                .r#type(AccessPolicyType::from(input.r#type.as_str()))
                .policy(&input.policy)
                .set_description(input.description.clone())
                .send()
                .await
                .map_err(|e| ManagerError::CreateFail(format!("{:?}", e.into_source())))
                .and_then(|response| {
                    response.access_policy_detail.map(Into::into).ok_or(
                        ManagerError::CreateFail("Access policy not returned".to_string()),
                    )
                })
        })
    }
    fn delete(&self, latest: &AccessPolicyOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_access_policy()
                .name(&latest.name)
                .r#type(AccessPolicyType::from(latest.r#type.as_str()))
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        latest: &AccessPolicyOutput,
        input: &mut AccessPolicyInput,
    ) -> Result<Option<AccessPolicyOutput>, ManagerError> {
        if latest.policy == input.policy && latest.description == input.description {
            return Ok(None);
        }
        self.handle.block_on(async {
            self.client
                .update_access_policy()
                .name(&latest.name)
                .r#type(AccessPolicyType::from(latest.r#type.as_str()))
                .set_policy_version(latest.policy_version.clone())
                .policy(&input.policy)
                .set_description(input.description.clone())
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                .map(|response| response.access_policy_detail.map(Into::into))
        })
    }
}
