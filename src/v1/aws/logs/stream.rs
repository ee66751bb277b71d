use std::sync::Arc;

use aws_sdk_cloudwatchlogs::Client;
use serde::{Deserialize, Serialize};

use super::split_id;
use crate::v1::{
    aws::{AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{not_found_as_none, ManagerError, ResourceManager},
};

pub type LogStreamInput = SerializableCreateLogStreamInput;
pub type LogStreamOutput = SerializableLogStream;
pub type LogStreamManager = AwsManager<LogStreamInput, LogStreamOutput, Client>;
pub type LogStream = AwsResource<LogStreamInput, LogStreamOutput>;

impl AwsResourceCreator for LogStream {
    type Input = LogStreamInput;
    type Output = LogStreamOutput;
    fn r#type() -> &'static str {
        "aws_cloudwatch_log_stream"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        LogStreamManager::new(client, client.logs_conn()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        output.id.clone()
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest != input
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableCreateLogStreamInput {
    pub log_group_name: String,
    pub name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableLogStream {
    pub id: String,
    pub log_group_name: String,
    pub name: String,
    pub arn: Option<String>,
}

impl ResourceManager<LogStreamInput, LogStreamOutput> for LogStreamManager {
    fn lookup(&self, id: &str) -> Result<Option<LogStreamOutput>, ManagerError> {
        let (group, name) = split_id(id, "log stream")?;
        not_found_as_none(self.describe_stream(group, name), super::NOT_FOUND)
            .map(Option::flatten)
    }
    fn create(&self, input: &mut LogStreamInput) -> Result<LogStreamOutput, ManagerError> {
        self.handle.block_on(async {
            self.client
                .create_log_stream()
                .log_group_name(&input.log_group_name)
                .log_stream_name(&input.name)
                .send()
                .await
                .map_err(|e| ManagerError::CreateFail(format!("{:?}", e.into_source())))
        })?;
        self.describe_stream(&input.log_group_name, &input.name)?
            .ok_or(ManagerError::CreateFail(format!(
                "Log stream {} not visible after creation",
                input.name
            )))
    }
    fn delete(&self, latest: &LogStreamOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_log_stream()
                .log_group_name(&latest.log_group_name)
                .log_stream_name(&latest.name)
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        _latest: &LogStreamOutput,
        _input: &mut LogStreamInput,
    ) -> Result<Option<LogStreamOutput>, ManagerError> {
        Ok(None)
    }
}

impl LogStreamManager {
    fn describe_stream(
        &self,
        group: &str,
        name: &str,
    ) -> Result<Option<LogStreamOutput>, ManagerError> {
        self.handle.block_on(async {
            let mut next_token = None;
            loop {
                let response = self
                    .client
                    .describe_log_streams()
                    .log_group_name(group)
                    .log_stream_name_prefix(name)
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))?;
                let found = response
                    .log_streams
                    .unwrap_or_default()
                    .into_iter()
                    .find(|s| s.log_stream_name.as_deref() == Some(name));
                if let Some(stream) = found {
                    return Ok(Some(SerializableLogStream {
                        id: format!("{}:{}", group, name),
                        log_group_name: group.to_string(),
                        name: name.to_string(),
                        arn: stream.arn,
                    }));
                }
                match response.next_token {
                    Some(token) => next_token = Some(token),
                    None => return Ok(None),
                }
            }
        })
    }
}
