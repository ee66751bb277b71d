//! Shared harness for the integration suites: a tokio runtime, a provider
//! client pointed at a wiremock server and in-memory stand-ins for the
//! DataSync, CloudWatch Logs and OpenSearch Serverless APIs.

#![allow(dead_code, unused_imports)]

mod logs;
mod opensearchserverless;

pub use logs::{FakeLogGroup, FakeLogs};
pub use opensearchserverless::{FakeCollection, FakeOpenSearchServerless};

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
    sync::{Arc, Mutex},
};

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::{provider::SharedCredentialsProvider, Credentials};
use rsprovider::prelude::*;
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use wiremock::{matchers::method, Mock, MockServer, Request, Respond, ResponseTemplate};

pub const REGION: &str = "us-west-2";
pub const ACCOUNT_ID: &str = "123456789012";

pub fn sdk_config() -> SdkConfig {
    SdkConfig::builder()
        .region(Region::new(REGION))
        .credentials_provider(SharedCredentialsProvider::new(Credentials::new(
            "AKIDEXAMPLE",
            "secret",
            None,
            None,
            "rsprovider-tests",
        )))
        .behavior_version(BehaviorVersion::latest())
        .build()
}

pub struct TestEnv {
    pub rt: Runtime,
    pub server: MockServer,
}

impl TestEnv {
    pub fn new() -> Self {
        let rt = Runtime::new().unwrap();
        let server = rt.block_on(MockServer::start());
        Self { rt, server }
    }

    /// Provider client sending `package` requests to the mock server.
    pub fn client(&self, package: ServicePackageName) -> AwsClient {
        let endpoints = HashMap::from([(package, self.server.uri())]);
        AwsClient::new(self.rt.handle(), sdk_config(), endpoints).unwrap()
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    /// `x-amz-target` operation names of every request received so far.
    pub fn operations(&self) -> Vec<String> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .filter_map(target)
            .map(|t| t.split('.').last().unwrap_or_default().to_string())
            .collect()
    }
}

pub fn target(request: &Request) -> Option<String> {
    request
        .headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub fn json_response(status: u16, body: Value) -> ResponseTemplate {
    ResponseTemplate::new(status)
        .set_body_raw(body.to_string().into_bytes(), "application/x-amz-json-1.1")
}

pub fn error_response(error_type: &str, message: &str) -> ResponseTemplate {
    json_response(400, json!({"__type": error_type, "message": message}))
}

pub fn cloud(client: &AwsClient, state: &Path, resources: Vec<ResourceConfig>) -> Cloud {
    let mut cloud = Cloud::new(client.clone(), Datastore::new(FileStorage::new(state))).unwrap();
    for resource in resources {
        cloud.resource(resource).unwrap();
    }
    cloud
}

#[derive(Debug, Clone)]
pub struct FakeLocation {
    pub uri: String,
    pub s3_config: Value,
    pub storage_class: String,
    pub agent_arns: Vec<String>,
    pub creation_time: f64,
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    locations: BTreeMap<String, FakeLocation>,
    tags: BTreeMap<String, BTreeMap<String, String>>,
}

/// Enough of the DataSync JSON API to drive S3 locations through their lifecycle.
#[derive(Clone, Default)]
pub struct FakeDataSync {
    state: Arc<Mutex<FakeState>>,
}

impl FakeDataSync {
    pub fn mount(&self, env: &TestEnv) {
        env.mount(Mock::given(method("POST")).respond_with(self.clone()));
    }

    pub fn location_arns(&self) -> Vec<String> {
        self.state.lock().unwrap().locations.keys().cloned().collect()
    }

    pub fn location(&self, arn: &str) -> Option<FakeLocation> {
        self.state.lock().unwrap().locations.get(arn).cloned()
    }

    pub fn tags(&self, arn: &str) -> BTreeMap<String, String> {
        self.state
            .lock()
            .unwrap()
            .tags
            .get(arn)
            .cloned()
            .unwrap_or_default()
    }

    /// Deletes a location behind the provider's back.
    pub fn forget(&self, arn: &str) {
        let mut state = self.state.lock().unwrap();
        state.locations.remove(arn);
        state.tags.remove(arn);
    }

    fn not_found(arn: &str) -> ResponseTemplate {
        error_response(
            "InvalidRequestException",
            &format!("Location {} is not found.", arn),
        )
    }

    fn create_location_s3(&self, body: &Value) -> ResponseTemplate {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let arn = format!(
            "arn:aws:datasync:{}:{}:location/loc-{:017x}",
            REGION, ACCOUNT_ID, state.next_id
        );
        let bucket = body["S3BucketArn"]
            .as_str()
            .and_then(|b| b.rsplit(":::").next())
            .unwrap_or_default()
            .to_string();
        let mut subdirectory = body["Subdirectory"].as_str().unwrap_or("/").to_string();
        if !subdirectory.starts_with('/') {
            subdirectory.insert(0, '/');
        }
        if !subdirectory.ends_with('/') {
            subdirectory.push('/');
        }
        let location = FakeLocation {
            uri: format!("s3://{}{}", bucket, subdirectory),
            s3_config: body["S3Config"].clone(),
            storage_class: body["S3StorageClass"]
                .as_str()
                .unwrap_or("STANDARD")
                .to_string(),
            agent_arns: body["AgentArns"]
                .as_array()
                .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
                .unwrap_or_default(),
            creation_time: 1_700_000_000.0 + state.next_id as f64,
        };
        let tags = tag_entries(&body["Tags"]);
        state.locations.insert(arn.clone(), location);
        state.tags.insert(arn.clone(), tags);
        json_response(200, json!({"LocationArn": arn}))
    }

    fn describe_location_s3(&self, body: &Value) -> ResponseTemplate {
        let arn = body["LocationArn"].as_str().unwrap_or_default();
        match self.location(arn) {
            Some(location) => json_response(
                200,
                json!({
                    "LocationArn": arn,
                    "LocationUri": location.uri,
                    "S3Config": location.s3_config,
                    "S3StorageClass": location.storage_class,
                    "AgentArns": location.agent_arns,
                    "CreationTime": location.creation_time,
                }),
            ),
            None => Self::not_found(arn),
        }
    }

    fn delete_location(&self, body: &Value) -> ResponseTemplate {
        let arn = body["LocationArn"].as_str().unwrap_or_default();
        if self.location(arn).is_none() {
            return Self::not_found(arn);
        }
        self.forget(arn);
        json_response(200, json!({}))
    }

    fn list_tags_for_resource(&self, body: &Value) -> ResponseTemplate {
        let arn = body["ResourceArn"].as_str().unwrap_or_default();
        if self.location(arn).is_none() {
            return Self::not_found(arn);
        }
        let tags: Vec<Value> = self
            .tags(arn)
            .into_iter()
            .map(|(key, value)| json!({"Key": key, "Value": value}))
            .collect();
        json_response(200, json!({"Tags": tags}))
    }

    fn tag_resource(&self, body: &Value) -> ResponseTemplate {
        let arn = body["ResourceArn"].as_str().unwrap_or_default();
        let mut state = self.state.lock().unwrap();
        if !state.locations.contains_key(arn) {
            return Self::not_found(arn);
        }
        state
            .tags
            .entry(arn.to_string())
            .or_default()
            .extend(tag_entries(&body["Tags"]));
        json_response(200, json!({}))
    }

    fn untag_resource(&self, body: &Value) -> ResponseTemplate {
        let arn = body["ResourceArn"].as_str().unwrap_or_default();
        let mut state = self.state.lock().unwrap();
        if !state.locations.contains_key(arn) {
            return Self::not_found(arn);
        }
        let tags = state.tags.entry(arn.to_string()).or_default();
        for key in body["Keys"].as_array().into_iter().flatten() {
            if let Some(key) = key.as_str() {
                tags.remove(key);
            }
        }
        json_response(200, json!({}))
    }
}

fn tag_entries(value: &Value) -> BTreeMap<String, String> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            Some((
                entry["Key"].as_str()?.to_string(),
                entry["Value"].as_str().unwrap_or_default().to_string(),
            ))
        })
        .collect()
}

impl Respond for FakeDataSync {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        match target(request).as_deref() {
            Some("FmrsService.CreateLocationS3") => self.create_location_s3(&body),
            Some("FmrsService.DescribeLocationS3") => self.describe_location_s3(&body),
            Some("FmrsService.DeleteLocation") => self.delete_location(&body),
            Some("FmrsService.ListTagsForResource") => self.list_tags_for_resource(&body),
            Some("FmrsService.TagResource") => self.tag_resource(&body),
            Some("FmrsService.UntagResource") => self.untag_resource(&body),
            other => error_response(
                "InvalidRequestException",
                &format!("unsupported operation {:?}", other),
            ),
        }
    }
}
