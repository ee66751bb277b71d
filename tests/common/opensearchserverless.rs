use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use serde_json::{json, Value};
use wiremock::{matchers::method, Mock, Request, Respond, ResponseTemplate};

use super::{error_response, json_response, target, TestEnv, ACCOUNT_ID, REGION};

#[derive(Debug, Clone)]
pub struct FakeCollection {
    pub name: String,
    pub arn: String,
    pub r#type: String,
    pub standby_replicas: String,
    pub description: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl FakeCollection {
    fn detail(&self, id: &str) -> Value {
        json!({
            "id": id,
            "name": self.name,
            "arn": self.arn,
            "type": self.r#type,
            "standbyReplicas": self.standby_replicas,
            "description": self.description.clone().unwrap_or_default(),
            "status": "ACTIVE",
            "collectionEndpoint": endpoint(id),
            "dashboardEndpoint": format!("{}/_dashboards", endpoint(id)),
        })
    }
}

#[derive(Default)]
struct FakeState {
    next_id: u64,
    collections: BTreeMap<String, FakeCollection>,
}

/// Collections as OpenSearch Serverless keeps them, keyed by id.
#[derive(Clone, Default)]
pub struct FakeOpenSearchServerless {
    state: Arc<Mutex<FakeState>>,
}

fn endpoint(id: &str) -> String {
    format!("https://{}.{}.aoss.amazonaws.com", id, REGION)
}

fn not_found(what: &str) -> ResponseTemplate {
    error_response(
        "ResourceNotFoundException",
        &format!("Resource {} not found", what),
    )
}

fn tag_list(value: &Value) -> BTreeMap<String, String> {
    value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|tag| {
            Some((
                tag["key"].as_str()?.to_string(),
                tag["value"].as_str().unwrap_or_default().to_string(),
            ))
        })
        .collect()
}

impl FakeOpenSearchServerless {
    pub fn mount(&self, env: &TestEnv) {
        env.mount(Mock::given(method("POST")).respond_with(self.clone()));
    }

    pub fn ids(&self) -> Vec<String> {
        self.state.lock().unwrap().collections.keys().cloned().collect()
    }

    pub fn collection(&self, id: &str) -> Option<FakeCollection> {
        self.state.lock().unwrap().collections.get(id).cloned()
    }

    /// Deletes a collection behind the provider's back.
    pub fn forget(&self, id: &str) {
        self.state.lock().unwrap().collections.remove(id);
    }

    fn create_collection(&self, body: &Value) -> ResponseTemplate {
        let name = body["name"].as_str().unwrap_or_default().to_string();
        let mut state = self.state.lock().unwrap();
        if state.collections.values().any(|c| c.name == name) {
            return error_response(
                "ConflictException",
                &format!("A collection named {} already exists", name),
            );
        }
        state.next_id += 1;
        let id = format!("{:020x}", state.next_id);
        let collection = FakeCollection {
            arn: format!("arn:aws:aoss:{}:{}:collection/{}", REGION, ACCOUNT_ID, id),
            name,
            r#type: body["type"].as_str().unwrap_or("SEARCH").to_string(),
            standby_replicas: body["standbyReplicas"]
                .as_str()
                .unwrap_or("ENABLED")
                .to_string(),
            description: body["description"].as_str().map(str::to_string),
            tags: tag_list(&body["tags"]),
        };
        let mut detail = collection.detail(&id);
        detail["status"] = json!("CREATING");
        state.collections.insert(id, collection);
        json_response(200, json!({"createCollectionDetail": detail}))
    }

    fn batch_get_collection(&self, body: &Value) -> ResponseTemplate {
        let state = self.state.lock().unwrap();
        let mut details = Vec::new();
        let mut errors = Vec::new();
        for id in body["ids"].as_array().into_iter().flatten() {
            let id = id.as_str().unwrap_or_default();
            match state.collections.get(id) {
                Some(collection) => details.push(collection.detail(id)),
                None => errors.push(json!({
                    "id": id,
                    "errorCode": "NOT_FOUND",
                    "errorMessage": "The collection does not exist",
                })),
            }
        }
        json_response(
            200,
            json!({"collectionDetails": details, "collectionErrorDetails": errors}),
        )
    }

    fn delete_collection(&self, body: &Value) -> ResponseTemplate {
        let id = body["id"].as_str().unwrap_or_default();
        match self.state.lock().unwrap().collections.remove(id) {
            Some(collection) => json_response(
                200,
                json!({"deleteCollectionDetail": {
                    "id": id,
                    "name": collection.name,
                    "status": "DELETING",
                }}),
            ),
            None => not_found(id),
        }
    }

    fn update_collection(&self, body: &Value) -> ResponseTemplate {
        let id = body["id"].as_str().unwrap_or_default();
        let mut state = self.state.lock().unwrap();
        let Some(collection) = state.collections.get_mut(id) else {
            return not_found(id);
        };
        collection.description = body["description"]
            .as_str()
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        json_response(
            200,
            json!({"updateCollectionDetail": collection.detail(id)}),
        )
    }

    fn tagged(
        &self,
        body: &Value,
        f: impl FnOnce(&mut BTreeMap<String, String>) -> Value,
    ) -> ResponseTemplate {
        let arn = body["resourceArn"].as_str().unwrap_or_default();
        let mut state = self.state.lock().unwrap();
        match state.collections.values_mut().find(|c| c.arn == arn) {
            Some(collection) => json_response(200, f(&mut collection.tags)),
            None => not_found(arn),
        }
    }
}

impl Respond for FakeOpenSearchServerless {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        match target(request).as_deref() {
            Some("OpenSearchServerless.CreateCollection") => self.create_collection(&body),
            Some("OpenSearchServerless.BatchGetCollection") => self.batch_get_collection(&body),
            Some("OpenSearchServerless.DeleteCollection") => self.delete_collection(&body),
            Some("OpenSearchServerless.UpdateCollection") => self.update_collection(&body),
            Some("OpenSearchServerless.ListTagsForResource") => self.tagged(&body, |tags| {
                let tags: Vec<Value> = tags
                    .iter()
                    .map(|(key, value)| json!({"key": key, "value": value}))
                    .collect();
                json!({"tags": tags})
            }),
            Some("OpenSearchServerless.TagResource") => {
                let added = tag_list(&body["tags"]);
                self.tagged(&body, |tags| {
                    tags.extend(added);
                    json!({})
                })
            }
            Some("OpenSearchServerless.UntagResource") => {
                let keys: Vec<String> = body["tagKeys"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect();
                self.tagged(&body, |tags| {
                    for key in keys {
                        tags.remove(&key);
                    }
                    json!({})
                })
            }
            other => error_response(
                "ValidationException",
                &format!("unsupported operation {:?}", other),
            ),
        }
    }
}
