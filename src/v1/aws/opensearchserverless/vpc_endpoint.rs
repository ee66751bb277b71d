use std::{collections::BTreeSet, sync::Arc};

use aws_sdk_opensearchserverless::{types::VpcEndpointDetail, Client};
use serde::{Deserialize, Serialize};

use crate::v1::{
    aws::{AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{ManagerError, ResourceManager},
};

pub type VpcEndpointInput = SerializableCreateVpcEndpointInput;
pub type VpcEndpointOutput = SerializableVpcEndpoint;
pub type VpcEndpointManager = AwsManager<VpcEndpointInput, VpcEndpointOutput, Client>;
pub type VpcEndpoint = AwsResource<VpcEndpointInput, VpcEndpointOutput>;

impl AwsResourceCreator for VpcEndpoint {
    type Input = VpcEndpointInput;
    type Output = VpcEndpointOutput;
    fn r#type() -> &'static str {
        "aws_opensearchserverless_vpc_endpoint"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        VpcEndpointManager::new(client, client.opensearchserverless_client()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        output.id.clone()
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.name != input.name || latest.vpc_id != input.vpc_id
    }
    fn fill_computed(prior: &Self::Input, input: &mut Self::Input) {
        if input.security_group_ids.is_empty() {
            input.security_group_ids = prior.security_group_ids.clone();
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableCreateVpcEndpointInput {
    pub name: String,
    pub vpc_id: String,
    pub subnet_ids: BTreeSet<String>,
    #[serde(default)]
    pub security_group_ids: BTreeSet<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableVpcEndpoint {
    pub id: String,
    pub name: String,
    pub vpc_id: String,
    pub subnet_ids: BTreeSet<String>,
    pub security_group_ids: BTreeSet<String>,
    pub status: Option<String>,
}

impl From<VpcEndpointDetail> for SerializableVpcEndpoint {
    fn from(value: VpcEndpointDetail) -> Self {
        Self {
            id: value.id.unwrap_or_default(),
            name: value.name.unwrap_or_default(),
            vpc_id: value.vpc_id.unwrap_or_default(),
            subnet_ids: value.subnet_ids.unwrap_or_default().into_iter().collect(),
            security_group_ids: value
                .security_group_ids
                .unwrap_or_default()
                .into_iter()
                .collect(),
            status: value.status.map(|s| s.as_str().to_string()),
        }
    }
}

/// Entries to add and to remove to go from `current` to `desired`.
fn set_delta(
    current: &BTreeSet<String>,
    desired: &BTreeSet<String>,
) -> (Option<Vec<String>>, Option<Vec<String>>) {
    let added: Vec<String> = desired.difference(current).cloned().collect();
    let removed: Vec<String> = current.difference(desired).cloned().collect();
    (
        (!added.is_empty()).then_some(added),
        (!removed.is_empty()).then_some(removed),
    )
}

impl ResourceManager<VpcEndpointInput, VpcEndpointOutput> for VpcEndpointManager {
    fn lookup(&self, id: &str) -> Result<Option<VpcEndpointOutput>, ManagerError> {
        self.handle.block_on(async {
            self.client
                .batch_get_vpc_endpoint()
                .ids(id)
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))
                .map(|response| {
                    response
                        .vpc_endpoint_details
                        .unwrap_or_default()
                        .into_iter()
                        .find(|v| v.id.as_deref() == Some(id))
                        .map(Into::into)
                })
        })
    }
    fn create(&self, input: &mut VpcEndpointInput) -> Result<VpcEndpointOutput, ManagerError> {
        let id = self.handle.block_on(async {
            self.client
                .create_vpc_endpoint()
                .name(&input.name)
                .vpc_id(&input.vpc_id)
                .set_subnet_ids(Some(input.subnet_ids.iter().cloned().collect()))
                .set_security_group_ids(
                    (!input.security_group_ids.is_empty())
                        .then(|| input.security_group_ids.iter().cloned().collect()),
                )
                .send()
                .await
                .map_err(|e| ManagerError::CreateFail(format!("{:?}", e.into_source())))
                .and_then(|response| {
                    response
                        .create_vpc_endpoint_detail
                        .and_then(|detail| detail.id)
                        .ok_or(ManagerError::CreateFail(
                            "Could not get VPC endpoint id".to_string(),
                        ))
                })
        })?;
        self.lookup(&id)?.ok_or(ManagerError::CreateFail(format!(
            "VPC endpoint {} not visible after creation",
            id
        )))
    }
    fn delete(&self, latest: &VpcEndpointOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_vpc_endpoint()
                .id(&latest.id)
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        latest: &VpcEndpointOutput,
        input: &mut VpcEndpointInput,
    ) -> Result<Option<VpcEndpointOutput>, ManagerError> {
        let (add_subnets, remove_subnets) = set_delta(&latest.subnet_ids, &input.subnet_ids);
        let (add_groups, remove_groups) =
            set_delta(&latest.security_group_ids, &input.security_group_ids);
        if add_subnets.is_none()
            && remove_subnets.is_none()
            && add_groups.is_none()
            && remove_groups.is_none()
        {
            return Ok(None);
        }
        self.handle.block_on(async {
            self.client
                .update_vpc_endpoint()
                .id(&latest.id)
                .set_add_subnet_ids(add_subnets)
                .set_remove_subnet_ids(remove_subnets)
                .set_add_security_group_ids(add_groups)
                .set_remove_security_group_ids(remove_groups)
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
        })?;
        self.lookup(&latest.id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::v1::handler::ResourceHandler;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn delta_between_sets() {
        let (added, removed) = set_delta(&set(&["a", "b"]), &set(&["b", "c"]));
        assert_eq!(added, Some(vec!["c".to_string()]));
        assert_eq!(removed, Some(vec!["a".to_string()]));
        assert_eq!(set_delta(&set(&["a"]), &set(&["a"])), (None, None));
    }

    #[test]
    fn default_security_group_is_not_a_change() {
        let handler = VpcEndpoint::default();
        let observed = json!({
            "name": "search",
            "vpc_id": "vpc-1",
            "subnet_ids": ["subnet-1"],
            "security_group_ids": ["sg-default"]
        });
        let config = json!({"name": "search", "vpc_id": "vpc-1", "subnet_ids": ["subnet-1"]});
        assert!(!handler.has_changes(&observed, &config).unwrap());

        let config = json!({
            "name": "search",
            "vpc_id": "vpc-1",
            "subnet_ids": ["subnet-1"],
            "security_group_ids": ["sg-2"]
        });
        assert!(handler.has_changes(&observed, &config).unwrap());
        assert!(!handler.requires_replace(&observed, &config).unwrap());
    }
}
