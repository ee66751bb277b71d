use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use serde_json::{json, Value};
use wiremock::{matchers::method, Mock, Request, Respond, ResponseTemplate};

use super::{error_response, json_response, target, TestEnv, ACCOUNT_ID, REGION};

#[derive(Debug, Clone)]
pub struct FakeLogGroup {
    pub class: String,
    pub retention_in_days: Option<i64>,
    pub kms_key_id: Option<String>,
    pub creation_time: i64,
    pub tags: BTreeMap<String, String>,
}

#[derive(Default)]
struct FakeState {
    clock: i64,
    groups: BTreeMap<String, FakeLogGroup>,
}

/// Log groups as CloudWatch Logs keeps them, keyed by name.
#[derive(Clone, Default)]
pub struct FakeLogs {
    state: Arc<Mutex<FakeState>>,
}

fn group_arn(name: &str) -> String {
    format!("arn:aws:logs:{}:{}:log-group:{}", REGION, ACCOUNT_ID, name)
}

fn group_name(resource_arn: &str) -> Option<String> {
    let name = resource_arn.strip_prefix(&group_arn(""))?;
    (!name.ends_with(":*")).then(|| name.to_string())
}

fn not_found(what: &str) -> ResponseTemplate {
    error_response(
        "ResourceNotFoundException",
        &format!("The specified log group does not exist: {}", what),
    )
}

fn string_map(value: &Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .into_iter()
        .flatten()
        .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
        .collect()
}

impl FakeLogs {
    pub fn mount(&self, env: &TestEnv) {
        env.mount(Mock::given(method("POST")).respond_with(self.clone()));
    }

    pub fn names(&self) -> Vec<String> {
        self.state.lock().unwrap().groups.keys().cloned().collect()
    }

    pub fn group(&self, name: &str) -> Option<FakeLogGroup> {
        self.state.lock().unwrap().groups.get(name).cloned()
    }

    /// Deletes a log group behind the provider's back.
    pub fn forget(&self, name: &str) {
        self.state.lock().unwrap().groups.remove(name);
    }

    fn with_group(&self, name: &str, f: impl FnOnce(&mut FakeLogGroup)) -> ResponseTemplate {
        match self.state.lock().unwrap().groups.get_mut(name) {
            Some(group) => {
                f(group);
                json_response(200, json!({}))
            }
            None => not_found(name),
        }
    }

    fn create_log_group(&self, body: &Value) -> ResponseTemplate {
        let name = body["logGroupName"].as_str().unwrap_or_default().to_string();
        let mut state = self.state.lock().unwrap();
        if state.groups.contains_key(&name) {
            return error_response(
                "ResourceAlreadyExistsException",
                "The specified log group already exists",
            );
        }
        state.clock += 1;
        let group = FakeLogGroup {
            class: body["logGroupClass"]
                .as_str()
                .unwrap_or("STANDARD")
                .to_string(),
            retention_in_days: None,
            kms_key_id: body["kmsKeyId"].as_str().map(str::to_string),
            creation_time: 1_700_000_000_000 + state.clock,
            tags: string_map(&body["tags"]),
        };
        state.groups.insert(name, group);
        json_response(200, json!({}))
    }

    fn describe_log_groups(&self, body: &Value) -> ResponseTemplate {
        let prefix = body["logGroupNamePrefix"].as_str().unwrap_or_default();
        let state = self.state.lock().unwrap();
        let groups: Vec<Value> = state
            .groups
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, group)| {
                let mut entry = json!({
                    "logGroupName": name,
                    "arn": format!("{}:*", group_arn(name)),
                    "logGroupClass": group.class,
                    "creationTime": group.creation_time,
                    "storedBytes": 0,
                });
                if let Some(days) = group.retention_in_days {
                    entry["retentionInDays"] = json!(days);
                }
                if let Some(key) = &group.kms_key_id {
                    entry["kmsKeyId"] = json!(key);
                }
                entry
            })
            .collect();
        json_response(200, json!({"logGroups": groups}))
    }

    fn delete_log_group(&self, body: &Value) -> ResponseTemplate {
        let name = body["logGroupName"].as_str().unwrap_or_default();
        match self.state.lock().unwrap().groups.remove(name) {
            Some(_) => json_response(200, json!({})),
            None => not_found(name),
        }
    }

    fn tagged(
        &self,
        body: &Value,
        f: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> ResponseTemplate {
        let arn = body["resourceArn"].as_str().unwrap_or_default();
        match group_name(arn) {
            Some(name) => self.with_group(&name, |group| f(&mut group.tags)),
            None => error_response("InvalidParameterException", "invalid resource ARN"),
        }
    }

    fn list_tags_for_resource(&self, body: &Value) -> ResponseTemplate {
        let arn = body["resourceArn"].as_str().unwrap_or_default();
        let Some(name) = group_name(arn) else {
            return error_response("InvalidParameterException", "invalid resource ARN");
        };
        match self.group(&name) {
            Some(group) => json_response(200, json!({"tags": group.tags})),
            None => not_found(&name),
        }
    }
}

impl Respond for FakeLogs {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let name = body["logGroupName"].as_str().unwrap_or_default().to_string();
        match target(request).as_deref() {
            Some("Logs_20140328.CreateLogGroup") => self.create_log_group(&body),
            Some("Logs_20140328.DescribeLogGroups") => self.describe_log_groups(&body),
            Some("Logs_20140328.DeleteLogGroup") => self.delete_log_group(&body),
            Some("Logs_20140328.PutRetentionPolicy") => {
                let days = body["retentionInDays"].as_i64();
                self.with_group(&name, |group| group.retention_in_days = days)
            }
            Some("Logs_20140328.DeleteRetentionPolicy") => {
                self.with_group(&name, |group| group.retention_in_days = None)
            }
            Some("Logs_20140328.ListTagsForResource") => self.list_tags_for_resource(&body),
            Some("Logs_20140328.TagResource") => {
                let tags = string_map(&body["tags"]);
                self.tagged(&body, |current| current.extend(tags))
            }
            Some("Logs_20140328.UntagResource") => {
                let keys: Vec<String> = body["tagKeys"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect();
                self.tagged(&body, |current| {
                    for key in keys {
                        current.remove(&key);
                    }
                })
            }
            other => error_response(
                "InvalidParameterException",
                &format!("unsupported operation {:?}", other),
            ),
        }
    }
}
