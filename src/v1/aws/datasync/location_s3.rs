use std::sync::Arc;

use aws_sdk_datasync::{
    operation::describe_location_s3::DescribeLocationS3Output,
    types::{S3Config, S3StorageClass, TagListEntry},
    Client,
};
use aws_smithy_types_convert::date_time::DateTimeExt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::uri::{global_id_from_location_uri, subdirectory_from_location_uri};
use crate::v1::{
    aws::{arn_partition, AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{not_found_as_none, ManagerError, ResourceManager},
    tags::KeyValueTags,
};

pub type LocationS3Input = SerializableCreateLocationS3Input;
pub type LocationS3Output = SerializableLocationS3;
pub type LocationS3Manager = AwsManager<LocationS3Input, LocationS3Output, Client>;
pub type LocationS3 = AwsResource<LocationS3Input, LocationS3Output>;

const NOT_FOUND: &[&str] = &["InvalidRequestException", "not found"];

impl AwsResourceCreator for LocationS3 {
    type Input = LocationS3Input;
    type Output = LocationS3Output;
    fn r#type() -> &'static str {
        "aws_datasync_location_s3"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        LocationS3Manager::new(client, client.datasync_conn()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        output.id.clone()
    }
    fn input_hook(input: &mut Self::Input) {
        input.subdirectory = input.subdirectory.take().map(|s| normalize_subdirectory(&s));
        if let Some(agent_arns) = input.agent_arns.as_mut() {
            agent_arns.sort();
            agent_arns.dedup();
        }
        if input.agent_arns.as_ref().is_some_and(Vec::is_empty) {
            input.agent_arns = None;
        }
        if input.tags.as_ref().is_some_and(KeyValueTags::is_empty) {
            input.tags = None;
        }
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.agent_arns != input.agent_arns
            || latest.s3_bucket_arn != input.s3_bucket_arn
            || latest.s3_config != input.s3_config
            || latest.s3_storage_class != input.s3_storage_class
            || latest.subdirectory != input.subdirectory
    }
    fn carry_over(prior: &Self::Output, latest: &mut Self::Output) {
        if latest.s3_bucket_arn.is_none() {
            latest.s3_bucket_arn = prior.s3_bucket_arn.clone();
        }
    }
    fn fill_computed(prior: &Self::Input, input: &mut Self::Input) {
        if input.s3_storage_class.is_none() {
            input.s3_storage_class = prior.s3_storage_class.clone();
        }
        if input.subdirectory.is_none() {
            input.subdirectory = prior.subdirectory.clone();
        }
    }
}

/// Subdirectories differing only by a trailing `/` name the same location.
pub fn normalize_subdirectory(subdirectory: &str) -> String {
    if subdirectory.ends_with('/') {
        subdirectory.to_string()
    } else {
        format!("{}/", subdirectory)
    }
}

impl ResourceManager<LocationS3Input, LocationS3Output> for LocationS3Manager {
    fn lookup(&self, id: &str) -> Result<Option<LocationS3Output>, ManagerError> {
        not_found_as_none(self.describe_location(id), NOT_FOUND)
    }
    fn create(&self, input: &mut LocationS3Input) -> Result<LocationS3Output, ManagerError> {
        let location_arn = self.create_location(input)?;
        let mut location = self.describe_location(&location_arn)?;
        if location.s3_bucket_arn.is_none() {
            location.s3_bucket_arn = Some(input.s3_bucket_arn.clone());
        }
        Ok(location)
    }
    fn delete(&self, latest: &LocationS3Output) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_location()
                .location_arn(&latest.id)
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        latest: &LocationS3Output,
        input: &mut LocationS3Input,
    ) -> Result<Option<LocationS3Output>, ManagerError> {
        if input.s3_storage_class.is_some() && input.s3_storage_class != latest.s3_storage_class {
            return Err(ManagerError::CannotSyncWithoutRecreate(format!(
                "s3_storage_class from value: [{:?}] to value: [{:?}]",
                latest.s3_storage_class, input.s3_storage_class
            )));
        }
        if input.subdirectory.is_some() && input.subdirectory != latest.subdirectory {
            return Err(ManagerError::CannotSyncWithoutRecreate(format!(
                "subdirectory from value: [{:?}] to value: [{:?}]",
                latest.subdirectory, input.subdirectory
            )));
        }
        Ok(None)
    }
}

impl LocationS3Manager {
    fn create_location(&self, input: &LocationS3Input) -> Result<String, ManagerError> {
        let s3_config = S3Config::builder()
            .bucket_access_role_arn(&input.s3_config.bucket_access_role_arn)
            .build()
            .map_err(|e| ManagerError::CreateFail(e.to_string()))?;
        let tags = input
            .tags
            .iter()
            .flat_map(KeyValueTags::iter)
            .map(|(key, value)| {
                TagListEntry::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(|e| ManagerError::CreateFail(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.handle.block_on(async {
            self.client
                .create_location_s3()
                .s3_bucket_arn(&input.s3_bucket_arn)
                .s3_config(s3_config)
                .set_subdirectory(input.subdirectory.clone())
                .set_s3_storage_class(input.s3_storage_class.clone().map(Into::into))
                .set_agent_arns(input.agent_arns.clone())
                .set_tags((!tags.is_empty()).then_some(tags))
                .send()
                .await
                .map_err(|e| ManagerError::CreateFail(format!("{:?}", e.into_source())))
                .and_then(|response| {
                    response.location_arn.ok_or(ManagerError::CreateFail(
                        "Could not get location ARN".to_string(),
                    ))
                })
        })
    }

    fn describe_location(&self, id: &str) -> Result<LocationS3Output, ManagerError> {
        let response = self.handle.block_on(async {
            self.client
                .describe_location_s3()
                .location_arn(id)
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))
        })?;
        SerializableLocationS3::from_response(id, response)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SerializableS3StorageClass {
    Standard,
    StandardIa,
    OnezoneIa,
    IntelligentTiering,
    Glacier,
    GlacierInstantRetrieval,
    DeepArchive,
    Outposts,
    Unknown,
}

impl From<S3StorageClass> for SerializableS3StorageClass {
    fn from(value: S3StorageClass) -> Self {
        match value {
            S3StorageClass::Standard => SerializableS3StorageClass::Standard,
            S3StorageClass::StandardIa => SerializableS3StorageClass::StandardIa,
            S3StorageClass::OnezoneIa => SerializableS3StorageClass::OnezoneIa,
            S3StorageClass::IntelligentTiering => SerializableS3StorageClass::IntelligentTiering,
            S3StorageClass::Glacier => SerializableS3StorageClass::Glacier,
            S3StorageClass::GlacierInstantRetrieval => {
                SerializableS3StorageClass::GlacierInstantRetrieval
            }
            S3StorageClass::DeepArchive => SerializableS3StorageClass::DeepArchive,
            S3StorageClass::Outposts => SerializableS3StorageClass::Outposts,
            _ => SerializableS3StorageClass::Unknown,
        }
    }
}

impl From<SerializableS3StorageClass> for S3StorageClass {
    fn from(value: SerializableS3StorageClass) -> Self {
        match value {
            SerializableS3StorageClass::Standard => S3StorageClass::Standard,
            SerializableS3StorageClass::StandardIa => S3StorageClass::StandardIa,
            SerializableS3StorageClass::OnezoneIa => S3StorageClass::OnezoneIa,
            SerializableS3StorageClass::IntelligentTiering => S3StorageClass::IntelligentTiering,
            SerializableS3StorageClass::Glacier => S3StorageClass::Glacier,
            SerializableS3StorageClass::GlacierInstantRetrieval => {
                S3StorageClass::GlacierInstantRetrieval
            }
            SerializableS3StorageClass::DeepArchive => S3StorageClass::DeepArchive,
            SerializableS3StorageClass::Outposts => S3StorageClass::Outposts,
            SerializableS3StorageClass::Unknown => S3StorageClass::Standard,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableS3Config {
    pub bucket_access_role_arn: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableCreateLocationS3Input {
    #[serde(default)]
    pub agent_arns: Option<Vec<String>>,
    pub s3_bucket_arn: String,
    pub s3_config: SerializableS3Config,
    #[serde(default)]
    pub s3_storage_class: Option<SerializableS3StorageClass>,
    #[serde(default)]
    pub subdirectory: Option<String>,
    #[serde(default)]
    pub tags: Option<KeyValueTags>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableLocationS3 {
    pub id: String,
    pub arn: String,
    pub agent_arns: Vec<String>,
    pub s3_bucket_arn: Option<String>,
    pub s3_config: SerializableS3Config,
    pub s3_storage_class: Option<SerializableS3StorageClass>,
    pub subdirectory: Option<String>,
    pub uri: String,
    pub creation_time: Option<DateTime<Utc>>,
}

impl SerializableLocationS3 {
    fn from_response(id: &str, response: DescribeLocationS3Output) -> Result<Self, ManagerError> {
        let arn = response.location_arn.unwrap_or_else(|| id.to_string());
        let uri = response.location_uri.unwrap_or_default();
        let subdirectory = subdirectory_from_location_uri(&uri)?;
        // Only plain `s3://bucket/...` URIs name the bucket; access point URIs do not.
        let s3_bucket_arn = match (global_id_from_location_uri(&uri), arn_partition(&arn)) {
            (Ok(bucket), Some(partition)) => Some(format!("arn:{}:s3:::{}", partition, bucket)),
            _ => None,
        };
        let mut agent_arns = response.agent_arns.unwrap_or_default();
        agent_arns.sort();
        Ok(Self {
            id: arn.clone(),
            arn,
            agent_arns,
            s3_bucket_arn,
            s3_config: SerializableS3Config {
                bucket_access_role_arn: response
                    .s3_config
                    .map(|c| c.bucket_access_role_arn)
                    .unwrap_or_default(),
            },
            s3_storage_class: response.s3_storage_class.map(Into::into),
            subdirectory: Some(subdirectory),
            uri,
            creation_time: response
                .creation_time
                .and_then(|t| t.to_chrono_utc().ok()),
        })
    }
}
