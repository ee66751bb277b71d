use std::sync::Arc;

use aws_sdk_cloudwatchlogs::{types::MetricTransformation, Client};
use serde::{Deserialize, Serialize};

use super::split_id;
use crate::v1::{
    aws::{AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{not_found_as_none, ManagerError, ResourceManager},
};

pub type MetricFilterInput = SerializablePutMetricFilterInput;
pub type MetricFilterOutput = SerializableMetricFilter;
pub type MetricFilterManager = AwsManager<MetricFilterInput, MetricFilterOutput, Client>;
pub type MetricFilter = AwsResource<MetricFilterInput, MetricFilterOutput>;

impl AwsResourceCreator for MetricFilter {
    type Input = MetricFilterInput;
    type Output = MetricFilterOutput;
    fn r#type() -> &'static str {
        "aws_cloudwatch_log_metric_filter"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        MetricFilterManager::new(client, client.logs_conn()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        format!("{}:{}", output.log_group_name, output.name)
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.name != input.name || latest.log_group_name != input.log_group_name
    }
    fn fill_computed(prior: &Self::Input, input: &mut Self::Input) {
        if input.metric_transformation.unit.is_none() {
            input.metric_transformation.unit = prior.metric_transformation.unit.clone();
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableMetricTransformation {
    pub name: String,
    pub namespace: String,
    pub value: String,
    #[serde(default)]
    pub default_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializablePutMetricFilterInput {
    pub name: String,
    pub log_group_name: String,
    #[serde(default)]
    pub pattern: String,
    pub metric_transformation: SerializableMetricTransformation,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableMetricFilter {
    pub name: String,
    pub log_group_name: String,
    pub pattern: String,
    pub metric_transformation: SerializableMetricTransformation,
}

impl TryFrom<&SerializableMetricTransformation> for MetricTransformation {
    type Error = ManagerError;
    fn try_from(value: &SerializableMetricTransformation) -> Result<Self, Self::Error> {
        MetricTransformation::builder()
            .metric_name(&value.name)
            .metric_namespace(&value.namespace)
            .metric_value(&value.value)
            .set_default_value(value.default_value)
            .set_unit(value.unit.as_deref().map(Into::into))
            .build()
            .map_err(|e| ManagerError::InvalidInput(e.to_string()))
    }
}

impl From<&MetricTransformation> for SerializableMetricTransformation {
    fn from(value: &MetricTransformation) -> Self {
        Self {
            name: value.metric_name.clone(),
            namespace: value.metric_namespace.clone(),
            value: value.metric_value.clone(),
            default_value: value.default_value,
            unit: value.unit.as_ref().map(|u| u.as_str().to_string()),
        }
    }
}

impl ResourceManager<MetricFilterInput, MetricFilterOutput> for MetricFilterManager {
    fn lookup(&self, id: &str) -> Result<Option<MetricFilterOutput>, ManagerError> {
        let (group, name) = split_id(id, "metric filter")?;
        not_found_as_none(self.describe_filter(group, name), super::NOT_FOUND).map(Option::flatten)
    }
    fn create(&self, input: &mut MetricFilterInput) -> Result<MetricFilterOutput, ManagerError> {
        self.put_filter(input)
            .map_err(|e| ManagerError::CreateFail(e.to_string()))?;
        self.describe_filter(&input.log_group_name, &input.name)?
            .ok_or(ManagerError::CreateFail(format!(
                "Metric filter {} not visible after creation",
                input.name
            )))
    }
    fn delete(&self, latest: &MetricFilterOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_metric_filter()
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
        latest: &MetricFilterOutput,
        input: &mut MetricFilterInput,
    ) -> Result<Option<MetricFilterOutput>, ManagerError> {
        if latest.pattern == input.pattern
            && latest.metric_transformation == input.metric_transformation
        {
            return Ok(None);
        }
        self.put_filter(input)?;
        self.describe_filter(&input.log_group_name, &input.name)
    }
}

impl MetricFilterManager {
    fn put_filter(&self, input: &MetricFilterInput) -> Result<(), ManagerError> {
        let transformation = MetricTransformation::try_from(&input.metric_transformation)?;
        self.handle.block_on(async {
            self.client
                .put_metric_filter()
                .log_group_name(&input.log_group_name)
                .filter_name(&input.name)
                .filter_pattern(&input.pattern)
                .metric_transformations(transformation)
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
    ) -> Result<Option<MetricFilterOutput>, ManagerError> {
        self.handle.block_on(async {
            self.client
                .describe_metric_filters()
                .log_group_name(group)
                .filter_name_prefix(name)
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))
                .map(|response| {
                    response
                        .metric_filters
                        .unwrap_or_default()
                        .into_iter()
                        .find(|f| f.filter_name.as_deref() == Some(name))
                        .map(|f| SerializableMetricFilter {
                            name: name.to_string(),
                            log_group_name: group.to_string(),
                            pattern: f.filter_pattern.clone().unwrap_or_default(),
                            metric_transformation: f
                                .metric_transformations
                                .as_deref()
                                .and_then(<[MetricTransformation]>::first)
                                .map(Into::into)
                                .unwrap_or_default(),
                        })
                })
        })
    }
}
