use std::sync::Arc;

use aws_sdk_cloudwatchlogs::{
    types::{self, LogGroupClass},
    Client,
};
use serde::{Deserialize, Serialize};

use super::{list_tags, update_tags};
use crate::v1::{
    aws::{AwsDataSource, AwsDataSourceReader, AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{ManagerError, ResourceManager},
    tags::KeyValueTags,
};

pub type LogGroupInput = SerializableCreateLogGroupInput;
pub type LogGroupOutput = SerializableLogGroup;
pub type LogGroupManager = AwsManager<LogGroupInput, LogGroupOutput, Client>;
pub type LogGroup = AwsResource<LogGroupInput, LogGroupOutput>;

impl AwsResourceCreator for LogGroup {
    type Input = LogGroupInput;
    type Output = LogGroupOutput;
    fn r#type() -> &'static str {
        "aws_cloudwatch_log_group"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        LogGroupManager::new(client, client.logs_conn()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        output.name.clone()
    }
    fn input_hook(input: &mut Self::Input) {
        if input.retention_in_days == Some(0) {
            input.retention_in_days = None;
        }
        if input.tags.as_ref().is_some_and(KeyValueTags::is_empty) {
            input.tags = None;
        }
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.name != input.name || latest.log_group_class != input.log_group_class
    }
    fn fill_computed(prior: &Self::Input, input: &mut Self::Input) {
        if input.log_group_class.is_none() {
            input.log_group_class = prior.log_group_class.clone();
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableCreateLogGroupInput {
    pub name: String,
    #[serde(default)]
    pub kms_key_id: Option<String>,
    #[serde(default)]
    pub log_group_class: Option<String>,
    #[serde(default)]
    pub retention_in_days: Option<i32>,
    #[serde(default)]
    pub tags: Option<KeyValueTags>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableLogGroup {
    pub name: String,
    pub arn: String,
    pub kms_key_id: Option<String>,
    pub log_group_class: Option<String>,
    pub retention_in_days: Option<i32>,
    pub creation_time: Option<i64>,
    #[serde(default)]
    pub tags: KeyValueTags,
}

impl From<types::LogGroup> for SerializableLogGroup {
    fn from(value: types::LogGroup) -> Self {
        Self {
            name: value.log_group_name.unwrap_or_default(),
            arn: value
                .arn
                .map(|arn| super::trim_log_group_arn(&arn).to_string())
                .unwrap_or_default(),
            kms_key_id: value.kms_key_id,
            log_group_class: value.log_group_class.map(|c| c.as_str().to_string()),
            retention_in_days: value.retention_in_days,
            creation_time: value.creation_time,
            tags: KeyValueTags::new(),
        }
    }
}

impl ResourceManager<LogGroupInput, LogGroupOutput> for LogGroupManager {
    fn lookup(&self, id: &str) -> Result<Option<LogGroupOutput>, ManagerError> {
        match describe_log_group(&self.client, &self.aws, id)? {
            None => Ok(None),
            Some(mut group) => {
                group.tags = list_tags(&self.client, &self.aws, &group.arn)?;
                Ok(Some(group))
            }
        }
    }
    fn lookup_by_input(&self, input: &LogGroupInput) -> Result<Option<LogGroupOutput>, ManagerError> {
        self.lookup(&input.name)
    }
    fn create(&self, input: &mut LogGroupInput) -> Result<LogGroupOutput, ManagerError> {
        self.handle.block_on(async {
            self.client
                .create_log_group()
                .log_group_name(&input.name)
                .set_kms_key_id(input.kms_key_id.clone())
                .set_log_group_class(input.log_group_class.as_deref().map(LogGroupClass::from))
                .set_tags(input.tags.clone().map(KeyValueTags::into_hash_map))
                .send()
                .await
                .map_err(|e| ManagerError::CreateFail(format!("{:?}", e.into_source())))
        })?;
        if let Some(days) = input.retention_in_days {
            self.put_retention(&input.name, days)?;
        }
        self.lookup(&input.name)?.ok_or(ManagerError::CreateFail(format!(
            "Log group {} not visible after creation",
            input.name
        )))
    }
    fn delete(&self, latest: &LogGroupOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_log_group()
                .log_group_name(&latest.name)
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        latest: &LogGroupOutput,
        input: &mut LogGroupInput,
    ) -> Result<Option<LogGroupOutput>, ManagerError> {
        let mut changed = false;
        if latest.retention_in_days != input.retention_in_days {
            match input.retention_in_days {
                Some(days) => self.put_retention(&latest.name, days)?,
                None => self.delete_retention(&latest.name)?,
            }
            changed = true;
        }
        if latest.kms_key_id != input.kms_key_id {
            self.set_kms_key(&latest.name, input.kms_key_id.as_deref())?;
            changed = true;
        }
        let desired = input.tags.clone().unwrap_or_default();
        if latest.tags != desired {
            update_tags(&self.client, &self.aws, &latest.arn, &latest.tags, &desired)?;
            changed = true;
        }
        match changed {
            true => self.lookup(&latest.name),
            false => Ok(None),
        }
    }
}

impl LogGroupManager {
    fn put_retention(&self, name: &str, days: i32) -> Result<(), ManagerError> {
        self.handle.block_on(async {
            self.client
                .put_retention_policy()
                .log_group_name(name)
                .retention_in_days(days)
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                .map(|_| ())
        })
    }
    fn delete_retention(&self, name: &str) -> Result<(), ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_retention_policy()
                .log_group_name(name)
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                .map(|_| ())
        })
    }
    fn set_kms_key(&self, name: &str, kms_key_id: Option<&str>) -> Result<(), ManagerError> {
        self.handle.block_on(async {
            match kms_key_id {
                Some(key) => self
                    .client
                    .associate_kms_key()
                    .log_group_name(name)
                    .kms_key_id(key)
                    .send()
                    .await
                    .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                    .map(|_| ()),
                None => self
                    .client
                    .disassociate_kms_key()
                    .log_group_name(name)
                    .send()
                    .await
                    .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                    .map(|_| ()),
            }
        })
    }
}

/// Exact-name lookup. The API only filters by prefix.
pub(crate) fn describe_log_group(
    conn: &Client,
    aws: &AwsClient,
    name: &str,
) -> Result<Option<LogGroupOutput>, ManagerError> {
    aws.handle().block_on(async {
        let mut next_token = None;
        loop {
            let response = conn
                .describe_log_groups()
                .log_group_name_prefix(name)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))?;
            if let Some(group) = response
                .log_groups
                .unwrap_or_default()
                .into_iter()
                .find(|g| g.log_group_name.as_deref() == Some(name))
            {
                return Ok(Some(group.into()));
            }
            match response.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(None),
            }
        }
    })
}

#[derive(Debug, Deserialize)]
pub struct LogGroupArgs {
    pub name: String,
}

pub type LogGroupData = AwsDataSource<LogGroupArgs, LogGroupOutput>;

impl AwsDataSourceReader for LogGroupData {
    type Args = LogGroupArgs;
    type Output = LogGroupOutput;
    fn r#type() -> &'static str {
        "aws_cloudwatch_log_group"
    }
    fn read(client: &AwsClient, args: &Self::Args) -> Result<Self::Output, ManagerError> {
        let conn = client.logs_client();
        let mut group = describe_log_group(&conn, client, &args.name)?
            .ok_or_else(|| ManagerError::NotFound(format!("log group {}", args.name)))?;
        group.tags = list_tags(&conn, client, &group.arn)?;
        Ok(group)
    }
}
