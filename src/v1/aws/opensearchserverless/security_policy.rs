use std::sync::Arc;

use aws_sdk_opensearchserverless::{
    types::{SecurityPolicyDetail, SecurityPolicyType},
    Client,
};
use serde::{Deserialize, Serialize};

use super::{
    access_policy::{policy_id, split_policy_id},
    policy_text,
};
use crate::v1::{
    aws::{logs::resource_policy::normalize_json, AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{not_found_as_none, ManagerError, ResourceManager},
};

pub type SecurityPolicyInput = SerializableCreateSecurityPolicyInput;
pub type SecurityPolicyOutput = SerializableSecurityPolicy;
pub type SecurityPolicyManager = AwsManager<SecurityPolicyInput, SecurityPolicyOutput, Client>;
pub type SecurityPolicy = AwsResource<SecurityPolicyInput, SecurityPolicyOutput>;

impl AwsResourceCreator for SecurityPolicy {
    type Input = SecurityPolicyInput;
    type Output = SecurityPolicyOutput;
    fn r#type() -> &'static str {
        "aws_opensearchserverless_security_policy"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        SecurityPolicyManager::new(client, client.opensearchserverless_client()).arc()
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

/// `type` is `encryption` or `network`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableCreateSecurityPolicyInput {
    pub name: String,
    pub r#type: String,
    pub policy: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableSecurityPolicy {
    pub id: String,
    pub name: String,
    pub r#type: String,
    pub policy: String,
    pub policy_version: Option<String>,
    pub description: Option<String>,
}

impl From<SecurityPolicyDetail> for SerializableSecurityPolicy {
    fn from(value: SecurityPolicyDetail) -> Self {
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

impl ResourceManager<SecurityPolicyInput, SecurityPolicyOutput> for SecurityPolicyManager {
    fn lookup(&self, id: &str) -> Result<Option<SecurityPolicyOutput>, ManagerError> {
        let (name, r#type) = split_policy_id(id)?;
        let response = self.handle.block_on(async {
            self.client
                .get_security_policy()
                .name(name)
                .r#type(SecurityPolicyType::from(r#type))
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))
        });
        not_found_as_none(response, super::NOT_FOUND)
            .map(|response| response.and_then(|r| r.security_policy_detail).map(Into::into))
    }
    fn create(&self, input: &mut SecurityPolicyInput) -> Result<SecurityPolicyOutput, ManagerError> {
        self.handle.block_on(async {
            self.client
                .create_security_policy()
                .name(&input.name)
                .r#type(SecurityPolicyType::from(input.r#type.as_str()))
                .policy(&input.policy)
                .set_description(input.description.clone())
                .send()
                .await
                .map_err(|e| ManagerError::CreateFail(format!("{:?}", e.into_source())))
                .and_then(|response| {
                    response.security_policy_detail.map(Into::into).ok_or(
                        ManagerError::CreateFail("Security policy not returned".to_string()),
                    )
                })
        })
    }
    fn delete(&self, latest: &SecurityPolicyOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_security_policy()
                .name(&latest.name)
                .r#type(SecurityPolicyType::from(latest.r#type.as_str()))
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        latest: &SecurityPolicyOutput,
        input: &mut SecurityPolicyInput,
    ) -> Result<Option<SecurityPolicyOutput>, ManagerError> {
        if latest.policy == input.policy && latest.description == input.description {
            return Ok(None);
        }
        self.handle.block_on(async {
            self.client
                .update_security_policy()
                .name(&latest.name)
                .r#type(SecurityPolicyType::from(latest.r#type.as_str()))
                .set_policy_version(latest.policy_version.clone())
                .policy(&input.policy)
                .set_description(input.description.clone())
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                .map(|response| response.security_policy_detail.map(Into::into))
        })
    }
}
