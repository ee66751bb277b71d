use std::sync::Arc;

use aws_sdk_cloudwatchlogs::{types, Client};
use serde::{Deserialize, Serialize};

use crate::v1::{
    aws::{AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{ManagerError, ResourceManager},
};

pub type QueryDefinitionInput = SerializablePutQueryDefinitionInput;
pub type QueryDefinitionOutput = SerializableQueryDefinition;
pub type QueryDefinitionManager = AwsManager<QueryDefinitionInput, QueryDefinitionOutput, Client>;
pub type QueryDefinition = AwsResource<QueryDefinitionInput, QueryDefinitionOutput>;

impl AwsResourceCreator for QueryDefinition {
    type Input = QueryDefinitionInput;
    type Output = QueryDefinitionOutput;
    fn r#type() -> &'static str {
        "aws_cloudwatch_query_definition"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        QueryDefinitionManager::new(client, client.logs_conn()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        output.query_definition_id.clone()
    }
    fn input_hook(input: &mut Self::Input) {
        if let Some(names) = input.log_group_names.as_mut() {
            names.sort();
        }
        if input.log_group_names.as_ref().is_some_and(Vec::is_empty) {
            input.log_group_names = None;
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializablePutQueryDefinitionInput {
    pub name: String,
    pub query_string: String,
    #[serde(default)]
    pub log_group_names: Option<Vec<String>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableQueryDefinition {
    pub query_definition_id: String,
    pub name: String,
    pub query_string: String,
    pub log_group_names: Vec<String>,
}

impl From<types::QueryDefinition> for SerializableQueryDefinition {
    fn from(value: types::QueryDefinition) -> Self {
        let mut log_group_names = value.log_group_names.unwrap_or_default();
        log_group_names.sort();
        Self {
            query_definition_id: value.query_definition_id.unwrap_or_default(),
            name: value.name.unwrap_or_default(),
            query_string: value.query_string.unwrap_or_default(),
            log_group_names,
        }
    }
}

impl ResourceManager<QueryDefinitionInput, QueryDefinitionOutput> for QueryDefinitionManager {
    /// The API cannot filter by id, so every definition is scanned.
    fn lookup(&self, id: &str) -> Result<Option<QueryDefinitionOutput>, ManagerError> {
        self.handle.block_on(async {
            let mut next_token = None;
            loop {
                let response = self
                    .client
                    .describe_query_definitions()
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))?;
                let found = response
                    .query_definitions
                    .unwrap_or_default()
                    .into_iter()
                    .find(|q| q.query_definition_id.as_deref() == Some(id));
                if let Some(definition) = found {
                    return Ok(Some(definition.into()));
                }
                match response.next_token {
                    Some(token) => next_token = Some(token),
                    None => return Ok(None),
                }
            }
        })
    }
    fn create(
        &self,
        input: &mut QueryDefinitionInput,
    ) -> Result<QueryDefinitionOutput, ManagerError> {
        let id = self.put_definition(None, input)?;
        self.lookup(&id)?.ok_or(ManagerError::CreateFail(format!(
            "Query definition {} not visible after creation",
            id
        )))
    }
    fn delete(&self, latest: &QueryDefinitionOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_query_definition()
                .query_definition_id(&latest.query_definition_id)
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|response| response.success)
        })
    }
    fn syncup(
        &self,
        latest: &QueryDefinitionOutput,
        input: &mut QueryDefinitionInput,
    ) -> Result<Option<QueryDefinitionOutput>, ManagerError> {
        let unchanged = latest.name == input.name
            && latest.query_string == input.query_string
            && latest.log_group_names == input.log_group_names.clone().unwrap_or_default();
        if unchanged {
            return Ok(None);
        }
        let id = self.put_definition(Some(&latest.query_definition_id), input)?;
        self.lookup(&id)
    }
}

impl QueryDefinitionManager {
    fn put_definition(
        &self,
        id: Option<&str>,
        input: &QueryDefinitionInput,
    ) -> Result<String, ManagerError> {
        self.handle.block_on(async {
            self.client
                .put_query_definition()
                .set_query_definition_id(id.map(str::to_string))
                .name(&input.name)
                .query_string(&input.query_string)
                .set_log_group_names(input.log_group_names.clone())
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                .and_then(|response| {
                    response.query_definition_id.ok_or(ManagerError::UpdateFail(
                        "Query definition id not returned".to_string(),
                    ))
                })
        })
    }
}
