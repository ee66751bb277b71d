use std::sync::Arc;

use aws_sdk_cloudwatchlogs::{types::Distribution, Client};
use serde::{Deserialize, Serialize};

use super::split_id;
use crate::v1::{
    aws::{AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{not_found_as_none, ManagerError, ResourceManager},
};

pub type SubscriptionFilterInput = SerializablePutSubscriptionFilterInput;
pub type SubscriptionFilterOutput = SerializableSubscriptionFilter;
pub type SubscriptionFilterManager =
    AwsManager<SubscriptionFilterInput, SubscriptionFilterOutput, Client>;
pub type SubscriptionFilter = AwsResource<SubscriptionFilterInput, SubscriptionFilterOutput>;

impl AwsResourceCreator for SubscriptionFilter {
    type Input = SubscriptionFilterInput;
    type Output = SubscriptionFilterOutput;
    fn r#type() -> &'static str {
        "aws_cloudwatch_log_subscription_filter"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        SubscriptionFilterManager::new(client, client.logs_conn()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        format!("{}:{}", output.log_group_name, output.name)
    }
    fn input_hook(input: &mut Self::Input) {
        if input.distribution.is_none() {
            input.distribution = Some(Distribution::ByLogStream.as_str().to_string());
        }
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.name != input.name || latest.log_group_name != input.log_group_name
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializablePutSubscriptionFilterInput {
    pub name: String,
    pub log_group_name: String,
    pub destination_arn: String,
    #[serde(default)]
    pub filter_pattern: String,
    #[serde(default)]
    pub role_arn: Option<String>,
    #[serde(default)]
    pub distribution: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableSubscriptionFilter {
    pub name: String,
    pub log_group_name: String,
    pub destination_arn: String,
    pub filter_pattern: String,
    pub role_arn: Option<String>,
    pub distribution: Option<String>,
}

impl ResourceManager<SubscriptionFilterInput, SubscriptionFilterOutput>
    for SubscriptionFilterManager
{
    fn lookup(&self, id: &str) -> Result<Option<SubscriptionFilterOutput>, ManagerError> {
        let (group, name) = split_id(id, "subscription filter")?;
        not_found_as_none(self.describe_filter(group, name), super::NOT_FOUND).map(Option::flatten)
    }
    fn create(
        &self,
        input: &mut SubscriptionFilterInput,
    ) -> Result<SubscriptionFilterOutput, ManagerError> {
        self.put_filter(input)?;
        self.describe_filter(&input.log_group_name, &input.name)?
            .ok_or(ManagerError::CreateFail(format!(
                "Subscription filter {} not visible after creation",
                input.name
            )))
    }
    fn delete(&self, latest: &SubscriptionFilterOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_subscription_filter()
                .log_group_name(&latest.log_group_name)
                .filter_name(&latest.name)
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        latest: &SubscriptionFilterOutput,
        input: &mut SubscriptionFilterInput,
    ) -> Result<Option<SubscriptionFilterOutput>, ManagerError> {
        let unchanged = latest.destination_arn == input.destination_arn
            && latest.filter_pattern == input.filter_pattern
            && latest.role_arn == input.role_arn
            && latest.distribution == input.distribution;
        if unchanged {
            return Ok(None);
        }
        self.put_filter(input)?;
        self.describe_filter(&input.log_group_name, &input.name)
    }
}

impl SubscriptionFilterManager {
    fn put_filter(&self, input: &SubscriptionFilterInput) -> Result<(), ManagerError> {
        self.handle.block_on(async {
            self.client
                .put_subscription_filter()
                .log_group_name(&input.log_group_name)
                .filter_name(&input.name)
                .filter_pattern(&input.filter_pattern)
                .destination_arn(&input.destination_arn)
                .set_role_arn(input.role_arn.clone())
                .set_distribution(input.distribution.as_deref().map(Distribution::from))
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                .map(|_| ())
        })
    }

    fn describe_filter(
        &self,
        group: &str,
        name: &str,
    ) -> Result<Option<SubscriptionFilterOutput>, ManagerError> {
        self.handle.block_on(async {
            self.client
                .describe_subscription_filters()
                .log_group_name(group)
                .filter_name_prefix(name)
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))
                .map(|response| {
                    response
                        .subscription_filters
                        .unwrap_or_default()
                        .into_iter()
                        .find(|f| f.filter_name.as_deref() == Some(name))
                        .map(|f| SerializableSubscriptionFilter {
                            name: name.to_string(),
                            log_group_name: group.to_string(),
                            destination_arn: f.destination_arn.unwrap_or_default(),
                            filter_pattern: f.filter_pattern.unwrap_or_default(),
                            role_arn: f.role_arn,
                            distribution: f.distribution.map(|d| d.as_str().to_string()),
                        })
                })
        })
    }
}
